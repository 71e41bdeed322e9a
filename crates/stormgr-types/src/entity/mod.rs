//! Canonical entities reported by plugins.
//!
//! Each entity serializes with a `class` field naming its kind so a reply
//! can be checked against the shape the caller expected. `plugin_data` is an
//! opaque token minted by the plugin; clients hand it back untouched.

use enumflags2::BitFlags;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::search::SearchKey;
use crate::status::{
    AdminState, DiskStatus, DiskType, InitiatorType, PoolElementType, PoolStatus,
    PoolUnsupportedAction, PortType, RaidType, SystemStatus,
};

/// Behaviour shared by every listable entity.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Value of the `class` field on the wire.
    const CLASS: &'static str;

    /// Search keys accepted when listing this entity.
    const SEARCH_KEYS: &'static [SearchKey];

    /// Stable identifier, unique within a plugin session.
    fn id(&self) -> &str;

    /// Field value compared by a search on `key`.
    ///
    /// Returns `None` for keys the entity does not carry.
    fn search_field(&self, key: SearchKey) -> Option<&str>;
}

/// A storage array or controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct System {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Health bits.
    pub status: BitFlags<SystemStatus>,
    /// Free-form detail accompanying `status`.
    pub status_info: String,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Record for System {
    const CLASS: &'static str = "System";
    const SEARCH_KEYS: &'static [SearchKey] = &[];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, _key: SearchKey) -> Option<&str> {
        None
    }
}

/// A capacity pool from which volumes and file systems are carved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct Pool {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Element kinds the pool can host.
    pub element_type: BitFlags<PoolElementType>,
    /// Actions the pool refuses.
    pub unsupported_actions: BitFlags<PoolUnsupportedAction>,
    /// Total capacity in bytes.
    pub total_space: u64,
    /// Free capacity in bytes.
    pub free_space: u64,
    /// Health bits.
    pub status: BitFlags<PoolStatus>,
    /// Free-form detail accompanying `status`.
    pub status_info: String,
    /// Owning system.
    pub system_id: String,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Record for Pool {
    const CLASS: &'static str = "Pool";
    const SEARCH_KEYS: &'static [SearchKey] = &[SearchKey::Id, SearchKey::SystemId];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, key: SearchKey) -> Option<&str> {
        match key {
            SearchKey::Id => Some(&self.id),
            SearchKey::SystemId => Some(&self.system_id),
            _ => None,
        }
    }
}

/// A block volume (LUN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct Volume {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// SCSI VPD page 0x83 identifier.
    pub vpd83: String,
    /// Logical block size in bytes.
    pub block_size: u64,
    /// Number of logical blocks.
    pub num_of_blocks: u64,
    /// Administrative state.
    pub admin_state: AdminState,
    /// Owning system.
    pub system_id: String,
    /// Pool the volume is carved from.
    pub pool_id: String,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Volume {
    /// Capacity in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.block_size.saturating_mul(self.num_of_blocks)
    }
}

impl Record for Volume {
    const CLASS: &'static str = "Volume";
    const SEARCH_KEYS: &'static [SearchKey] =
        &[SearchKey::Id, SearchKey::SystemId, SearchKey::PoolId];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, key: SearchKey) -> Option<&str> {
        match key {
            SearchKey::Id => Some(&self.id),
            SearchKey::SystemId => Some(&self.system_id),
            SearchKey::PoolId => Some(&self.pool_id),
            SearchKey::FsId => None,
        }
    }
}

/// A physical disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct Disk {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Interface or media type.
    pub disk_type: DiskType,
    /// Logical block size in bytes.
    pub block_size: u64,
    /// Number of logical blocks.
    pub num_of_blocks: u64,
    /// Health and role bits.
    pub status: BitFlags<DiskStatus>,
    /// Owning system.
    pub system_id: String,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Record for Disk {
    const CLASS: &'static str = "Disk";
    const SEARCH_KEYS: &'static [SearchKey] = &[SearchKey::Id, SearchKey::SystemId];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, key: SearchKey) -> Option<&str> {
        match key {
            SearchKey::Id => Some(&self.id),
            SearchKey::SystemId => Some(&self.system_id),
            _ => None,
        }
    }
}

/// A named set of host initiators that volumes are masked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct AccessGroup {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Member initiator identifiers.
    pub init_ids: Vec<String>,
    /// Identifier family of the members.
    pub init_type: InitiatorType,
    /// Owning system.
    pub system_id: String,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Record for AccessGroup {
    const CLASS: &'static str = "AccessGroup";
    const SEARCH_KEYS: &'static [SearchKey] = &[SearchKey::Id, SearchKey::SystemId];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, key: SearchKey) -> Option<&str> {
        match key {
            SearchKey::Id => Some(&self.id),
            SearchKey::SystemId => Some(&self.system_id),
            _ => None,
        }
    }
}

/// A network file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct FileSystem {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Total capacity in bytes.
    pub total_space: u64,
    /// Free capacity in bytes.
    pub free_space: u64,
    /// Pool the file system is carved from.
    pub pool_id: String,
    /// Owning system.
    pub system_id: String,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Record for FileSystem {
    const CLASS: &'static str = "FileSystem";
    const SEARCH_KEYS: &'static [SearchKey] =
        &[SearchKey::Id, SearchKey::SystemId, SearchKey::PoolId];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, key: SearchKey) -> Option<&str> {
        match key {
            SearchKey::Id => Some(&self.id),
            SearchKey::SystemId => Some(&self.system_id),
            SearchKey::PoolId => Some(&self.pool_id),
            SearchKey::FsId => None,
        }
    }
}

/// A point-in-time snapshot of a [`FileSystem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct FsSnapshot {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Creation time in seconds since the Unix epoch.
    pub ts: u64,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Record for FsSnapshot {
    const CLASS: &'static str = "FsSnapshot";
    const SEARCH_KEYS: &'static [SearchKey] = &[];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, _key: SearchKey) -> Option<&str> {
        None
    }
}

/// An NFS export of a [`FileSystem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct NfsExport {
    /// Stable identifier.
    pub id: String,
    /// Exported file system.
    pub fs_id: String,
    /// Path clients mount.
    pub export_path: String,
    /// Authentication flavour, for example `sys`.
    pub auth: String,
    /// Hosts granted root access.
    pub root: Vec<String>,
    /// Hosts granted read-write access.
    pub rw: Vec<String>,
    /// Hosts granted read-only access.
    pub ro: Vec<String>,
    /// Uid anonymous users map to, or [`crate::ANON_ID_UNSET`].
    pub anonuid: i64,
    /// Gid anonymous users map to, or [`crate::ANON_ID_UNSET`].
    pub anongid: i64,
    /// Extra vendor options.
    pub options: Option<String>,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Record for NfsExport {
    const CLASS: &'static str = "NfsExport";
    const SEARCH_KEYS: &'static [SearchKey] = &[SearchKey::Id, SearchKey::FsId];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, key: SearchKey) -> Option<&str> {
        match key {
            SearchKey::Id => Some(&self.id),
            SearchKey::FsId => Some(&self.fs_id),
            _ => None,
        }
    }
}

/// A front-end port hosts reach the array through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct TargetPort {
    /// Stable identifier.
    pub id: String,
    /// Protocol served.
    pub port_type: PortType,
    /// Address hosts connect to, for example a target IQN or WWPN.
    pub service_address: String,
    /// Network address, for example an IP and port.
    pub network_address: String,
    /// Hardware address, for example a MAC or WWNN.
    pub physical_address: String,
    /// Hardware port name.
    pub physical_name: String,
    /// Owning system.
    pub system_id: String,
    /// Opaque plugin correlation token.
    pub plugin_data: Option<String>,
}

impl Record for TargetPort {
    const CLASS: &'static str = "TargetPort";
    const SEARCH_KEYS: &'static [SearchKey] = &[SearchKey::Id, SearchKey::SystemId];

    fn id(&self) -> &str {
        &self.id
    }

    fn search_field(&self, key: SearchKey) -> Option<&str> {
        match key {
            SearchKey::Id => Some(&self.id),
            SearchKey::SystemId => Some(&self.system_id),
            _ => None,
        }
    }
}

/// RAID geometry of a volume.
///
/// Sizes are in bytes; zero means the plugin could not determine the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaidInfo {
    /// RAID layout.
    pub raid_type: RaidType,
    /// Bytes written to one disk before moving to the next.
    pub strip_size: u64,
    /// Number of disks holding data.
    pub disk_count: u64,
    /// Minimum efficient I/O size.
    pub min_io_size: u64,
    /// Optimal I/O size, usually a full stripe.
    pub opt_io_size: u64,
}

impl RaidInfo {
    /// Reply for a volume whose geometry is unknown.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            raid_type: RaidType::Unknown,
            strip_size: 0,
            disk_count: 0,
            min_io_size: 0,
            opt_io_size: 0,
        }
    }
}
