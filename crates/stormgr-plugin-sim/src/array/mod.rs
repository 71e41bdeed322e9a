//! In-memory model of a simulated storage array.
//!
//! The array starts with one system, two pools, a shelf of disks and a few
//! target ports. Volumes, access groups, file systems, snapshots and exports
//! are created through the mutating operations. Every listing is a fresh
//! copy; callers never hold references into the model.

mod block;
mod files;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use enumflags2::BitFlags;
use stormgr_types::{
    AccessGroup, Capabilities, Disk, DiskStatus, DiskType, ErrorCode, FileSystem, FsSnapshot,
    NfsExport, Pool, PoolElementType, PoolStatus, PoolUnsupportedAction, PortType, RaidInfo,
    RaidType, StorageError, System, SystemStatus, TargetPort, Volume,
};

pub use files::{EXPORT_AUTH, ExportRequest};

/// Identifier of the single simulated system.
pub const SYSTEM_ID: &str = "sim-01";

/// Logical block size of every simulated volume and disk.
pub const BLOCK_SIZE: u64 = 512;

const GIB: u64 = 1 << 30;
const TIB: u64 = 1 << 40;
const STRIP_SIZE: u64 = 128 * 1024;

/// RAID layout backing one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    raid_type: RaidType,
    disk_count: u64,
    data_disks: u64,
}

/// iSCSI CHAP credentials recorded for one initiator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapCredentials {
    /// Inbound user and secret.
    pub inbound: Option<(String, String)>,
    /// Outbound user and secret.
    pub outbound: Option<(String, String)>,
}

/// State of one simulated array.
#[derive(Debug)]
pub struct SimArray {
    system: System,
    pools: Vec<Pool>,
    layouts: BTreeMap<String, Layout>,
    disks: Vec<Disk>,
    target_ports: Vec<TargetPort>,
    volumes: Vec<Volume>,
    // Replica id -> source id for replicas that still share blocks.
    dependencies: BTreeMap<String, String>,
    access_groups: Vec<AccessGroup>,
    // (access group id, volume id)
    masks: BTreeSet<(String, String)>,
    chap: BTreeMap<String, ChapCredentials>,
    file_systems: Vec<FileSystem>,
    snapshots: BTreeMap<String, Vec<FsSnapshot>>,
    exports: Vec<NfsExport>,
    last_id: u64,
}

impl Default for SimArray {
    fn default() -> Self {
        Self::new()
    }
}

impl SimArray {
    /// Builds the array with its factory inventory.
    #[must_use]
    pub fn new() -> Self {
        let mut array = Self {
            system: System {
                id: SYSTEM_ID.to_owned(),
                name: "Simulated storage array".to_owned(),
                status: SystemStatus::Ok.into(),
                status_info: String::new(),
                plugin_data: None,
            },
            pools: Vec::new(),
            layouts: BTreeMap::new(),
            disks: Vec::new(),
            target_ports: Vec::new(),
            volumes: Vec::new(),
            dependencies: BTreeMap::new(),
            access_groups: Vec::new(),
            masks: BTreeSet::new(),
            chap: BTreeMap::new(),
            file_systems: Vec::new(),
            snapshots: BTreeMap::new(),
            exports: Vec::new(),
            last_id: 0,
        };
        array.seed();
        array
    }

    fn seed(&mut self) {
        self.add_pool(
            "POOL_0001",
            "pool-raid6",
            PoolElementType::Volume
                | PoolElementType::VolumeFull
                | PoolElementType::VolumeThin
                | PoolElementType::Fs,
            BitFlags::empty(),
            Layout {
                raid_type: RaidType::Raid6,
                disk_count: 8,
                data_disks: 6,
            },
        );
        self.add_pool(
            "POOL_0002",
            "pool-raid10",
            PoolElementType::Volume | PoolElementType::VolumeFull,
            PoolUnsupportedAction::VolumeShrink.into(),
            Layout {
                raid_type: RaidType::Raid10,
                disk_count: 4,
                data_disks: 2,
            },
        );
        for slot in 1..=14_u64 {
            let (disk_type, size) = if slot <= 8 {
                (DiskType::Sas, TIB)
            } else {
                (DiskType::Ssd, 512 * GIB)
            };
            let status = if slot > 12 {
                DiskStatus::Ok | DiskStatus::Free
            } else {
                DiskStatus::Ok.into()
            };
            self.disks.push(Disk {
                id: format!("DISK_{slot:04}"),
                name: format!("Simulated disk {slot}"),
                disk_type,
                block_size: BLOCK_SIZE,
                num_of_blocks: size.div_ceil(BLOCK_SIZE),
                status,
                system_id: SYSTEM_ID.to_owned(),
                plugin_data: Some(format!("enclosure=1,bay={slot}")),
            });
        }
        for (index, port_type) in [PortType::Iscsi, PortType::Iscsi, PortType::Fc]
            .into_iter()
            .enumerate()
        {
            let number = index + 1;
            let (service, network, physical) = match port_type {
                PortType::Fc => (
                    format!("50:0a:09:80:00:00:00:{number:02x}"),
                    String::new(),
                    format!("50:0a:09:81:00:00:00:{number:02x}"),
                ),
                _ => (
                    "iqn.2024-01.org.stormgr:sim-01".to_owned(),
                    format!("192.0.2.{number}:3260"),
                    format!("52:54:00:00:00:{number:02x}"),
                ),
            };
            self.target_ports.push(TargetPort {
                id: format!("TGT_PORT_{number:04}"),
                port_type,
                service_address: service,
                network_address: network,
                physical_address: physical,
                physical_name: format!("port{number}"),
                system_id: SYSTEM_ID.to_owned(),
                plugin_data: None,
            });
        }
    }

    fn add_pool(
        &mut self,
        id: &str,
        name: &str,
        element_type: BitFlags<PoolElementType>,
        unsupported_actions: BitFlags<PoolUnsupportedAction>,
        layout: Layout,
    ) {
        let per_disk = if layout.raid_type == RaidType::Raid10 {
            512 * GIB
        } else {
            TIB
        };
        let total_space = per_disk.saturating_mul(layout.data_disks);
        self.pools.push(Pool {
            id: id.to_owned(),
            name: name.to_owned(),
            element_type,
            unsupported_actions,
            total_space,
            free_space: total_space,
            status: PoolStatus::Ok.into(),
            status_info: String::new(),
            system_id: SYSTEM_ID.to_owned(),
            plugin_data: None,
        });
        self.layouts.insert(id.to_owned(), layout);
    }

    fn allocate(&mut self, prefix: &str) -> String {
        self.last_id = self.last_id.saturating_add(1);
        format!("{prefix}_{:04}", self.last_id)
    }

    /// Lists systems.
    #[must_use]
    pub fn systems(&self) -> Vec<System> {
        vec![self.system.clone()]
    }

    /// Lists pools with their current free space.
    #[must_use]
    pub fn pools(&self) -> Vec<Pool> {
        self.pools
            .iter()
            .map(|pool| Pool {
                free_space: pool.total_space.saturating_sub(self.used_space(&pool.id)),
                ..pool.clone()
            })
            .collect()
    }

    /// Lists disks.
    #[must_use]
    pub fn disks(&self) -> Vec<Disk> {
        self.disks.clone()
    }

    /// Lists target ports.
    #[must_use]
    pub fn target_ports(&self) -> Vec<TargetPort> {
        self.target_ports.clone()
    }

    /// Capabilities of `system_id`; the simulator supports everything.
    ///
    /// # Errors
    ///
    /// `NotFoundSystem` for any other system.
    pub fn capabilities(&self, system_id: &str) -> Result<Capabilities, StorageError> {
        self.check_system(system_id)?;
        Ok(Capabilities::all())
    }

    fn check_system(&self, system_id: &str) -> Result<(), StorageError> {
        if system_id == self.system.id {
            Ok(())
        } else {
            Err(StorageError::new(
                ErrorCode::NotFoundSystem,
                format!("system {system_id} not found"),
            ))
        }
    }

    fn pool(&self, pool_id: &str) -> Result<&Pool, StorageError> {
        self.pools
            .iter()
            .find(|pool| pool.id == pool_id)
            .ok_or_else(|| not_found(ErrorCode::NotFoundPool, "pool", pool_id))
    }

    fn used_space(&self, pool_id: &str) -> u64 {
        let volumes = self
            .volumes
            .iter()
            .filter(|volume| volume.pool_id == pool_id)
            .map(Volume::size_bytes);
        let file_systems = self
            .file_systems
            .iter()
            .filter(|fs| fs.pool_id == pool_id)
            .map(|fs| fs.total_space);
        volumes.chain(file_systems).fold(0, u64::saturating_add)
    }

    // Fails unless `pool_id` can host `element` with `extra` more bytes.
    fn reserve(
        &self,
        pool_id: &str,
        element: PoolElementType,
        extra: u64,
    ) -> Result<(), StorageError> {
        let pool = self.pool(pool_id)?;
        if !pool.element_type.contains(element) {
            return Err(StorageError::no_support(format!(
                "pool {pool_id} cannot host {element:?} elements"
            )));
        }
        let free = pool.total_space.saturating_sub(self.used_space(pool_id));
        if extra > free {
            return Err(StorageError::new(
                ErrorCode::NotEnoughSpace,
                format!("pool {pool_id} has {free} bytes free, {extra} requested"),
            ));
        }
        Ok(())
    }

    fn check_name(&self, kind: &str, taken: bool, name: &str) -> Result<(), StorageError> {
        if name.is_empty() {
            return Err(StorageError::invalid_argument(format!(
                "{kind} name must not be empty"
            )));
        }
        if taken {
            return Err(StorageError::new(
                ErrorCode::NameConflict,
                format!("{kind} name {name:?} is already in use"),
            ));
        }
        Ok(())
    }

    fn layout(&self, pool_id: &str) -> Option<Layout> {
        self.layouts.get(pool_id).copied()
    }

    fn raid_info_for_pool(&self, pool_id: &str) -> RaidInfo {
        self.layout(pool_id).map_or_else(RaidInfo::unknown, |layout| RaidInfo {
            raid_type: layout.raid_type,
            strip_size: STRIP_SIZE,
            disk_count: layout.disk_count,
            min_io_size: STRIP_SIZE,
            opt_io_size: STRIP_SIZE.saturating_mul(layout.data_disks),
        })
    }
}

fn not_found(code: ErrorCode, kind: &str, id: &str) -> StorageError {
    StorageError::new(code, format!("{kind} {id} not found"))
}

fn no_state_change(message: impl Into<String>) -> StorageError {
    StorageError::new(ErrorCode::NoStateChange, message)
}

/// Array shared by every session of one plugin process.
///
/// Sessions run on their own threads; the mutex serializes mutation the way
/// a real controller would.
#[derive(Debug, Clone, Default)]
pub struct SharedArray(Arc<Mutex<SimArray>>);

impl SharedArray {
    /// Wraps an array for sharing.
    #[must_use]
    pub fn new(array: SimArray) -> Self {
        Self(Arc::new(Mutex::new(array)))
    }

    /// Locks the array.
    ///
    /// # Errors
    ///
    /// `PluginBug` if a previous session panicked while holding the lock.
    pub fn lock(&self) -> Result<MutexGuard<'_, SimArray>, StorageError> {
        self.0
            .lock()
            .map_err(|_| StorageError::plugin_bug("simulated array state is poisoned"))
    }
}
