//! [`Plugin`] implementation over the controller CLI.
//!
//! Every call shells out to the tool, parses its indented output and maps
//! the result onto canonical entities. Nothing is cached between calls, so
//! listings always reflect the controller's current state. The plugin
//! issues no jobs.

use std::fs;
use std::path::{Path, PathBuf};

use stormgr_ipc::{JobProgress, PluginDescription, ops};
use stormgr_plugin::{Plugin, PluginResult};
use stormgr_types::{
    Capabilities, Capability, Disk, ErrorCode, Pool, RaidInfo, StorageError, StorageUri, System,
    Volume, search,
};
use tracing::{debug, info};

use crate::SmartArrayError;
use crate::parser::{Block, parse};
use crate::runner::{CommandRunner, SystemRunner};
use crate::sysfs::Sysfs;
use crate::translate::{
    self, arrays, logical_drives, physical_drives, pool_id, raid_type, size_bytes, unassigned,
};

const PLUGIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::plugin");

/// URI query parameter naming the tool explicitly.
pub const TOOL_QUERY: &str = "hpssacli";

/// Install locations probed, in order, when the URI names no tool.
pub const DEFAULT_CANDIDATES: [&str; 3] = [
    "/usr/sbin/hpssacli",
    "/opt/hp/hpssacli/bld/hpssacli",
    "/usr/sbin/ssacli",
];

const DATA_DRIVE: &str = "Data Drive";

const SUPPORTED: [Capability; 3] = [
    Capability::Volumes,
    Capability::Disks,
    Capability::VolumeRaidInfo,
];

fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// One session's connection to the local controllers.
#[derive(Debug)]
pub struct SmartArrayPlugin<R = SystemRunner> {
    runner: R,
    binary: Option<PathBuf>,
    candidates: Vec<PathBuf>,
    sysfs: Sysfs,
    is_privileged: fn() -> bool,
}

impl SmartArrayPlugin {
    /// Creates a session that runs the real tool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_runner(SystemRunner)
    }
}

impl Default for SmartArrayPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> SmartArrayPlugin<R> {
    /// Creates a session that runs the tool through `runner`.
    #[must_use]
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            binary: None,
            candidates: DEFAULT_CANDIDATES.iter().map(PathBuf::from).collect(),
            sysfs: Sysfs::default(),
            is_privileged: running_as_root,
        }
    }

    /// Replaces the install locations probed during registration.
    #[must_use]
    pub fn with_candidates<I, P>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    /// Reads logical drive geometry below `root` instead of `/sys`.
    #[must_use]
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs = Sysfs::new(root);
        self
    }

    /// Replaces the root-privilege check.
    #[must_use]
    pub fn with_privilege_check(mut self, check: fn() -> bool) -> Self {
        self.is_privileged = check;
        self
    }

    /// Tool chosen at registration.
    #[must_use]
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    fn locate(&self, uri: &StorageUri) -> Result<PathBuf, SmartArrayError> {
        if let Some(path) = uri.query(TOOL_QUERY) {
            return Ok(PathBuf::from(path));
        }
        self.candidates
            .iter()
            .find(|candidate| fs::symlink_metadata(candidate).is_ok())
            .cloned()
            .ok_or_else(|| SmartArrayError::ToolNotInstalled {
                candidates: self
                    .candidates
                    .iter()
                    .map(|candidate| candidate.display().to_string())
                    .collect(),
            })
    }

    fn exec_raw(&self, args: &[&str]) -> PluginResult<String> {
        let Some(binary) = self.binary.as_deref() else {
            return Err(StorageError::invalid_argument(
                "the smartarray plugin is not registered",
            ));
        };
        let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        Ok(self.runner.run(binary, &args)?)
    }

    fn exec(&self, args: &[&str]) -> PluginResult<Block> {
        let output = self.exec_raw(args)?;
        Ok(parse(&output)?)
    }

    fn config(&self) -> PluginResult<Block> {
        self.exec(&["ctrl", "all", "show", "config", "detail"])
    }

    fn all_systems(&self) -> PluginResult<Vec<System>> {
        let detail = self.exec(&["ctrl", "all", "show", "detail"])?;
        let status = self.exec(&["ctrl", "all", "show", "status"])?;
        let empty = Block::default();
        let mut systems = Vec::new();
        for (name, controller) in detail.blocks() {
            let health = status.block(name).unwrap_or(&empty);
            systems.push(translate::system(name, controller, health)?);
        }
        Ok(systems)
    }

    fn all_pools(&self) -> PluginResult<Vec<Pool>> {
        let config = self.config()?;
        let mut pools = Vec::new();
        for (name, controller) in config.blocks() {
            let (system_id, slot) = identity(name, controller)?;
            for (key, letter, array) in arrays(controller) {
                pools.push(translate::pool(key, letter, array, system_id, slot)?);
            }
        }
        Ok(pools)
    }

    fn all_volumes(&self) -> PluginResult<Vec<Volume>> {
        let config = self.config()?;
        let mut volumes = Vec::new();
        for (name, controller) in config.blocks() {
            let (system_id, slot) = identity(name, controller)?;
            for (array_key, letter, array) in arrays(controller) {
                let pool = pool_id(system_id, array_key);
                for (key, number, drive) in logical_drives(array) {
                    volumes.push(translate::volume(
                        key,
                        number,
                        drive,
                        &pool,
                        system_id,
                        (slot, letter),
                        &self.sysfs,
                    )?);
                }
            }
        }
        Ok(volumes)
    }

    fn all_disks(&self) -> PluginResult<Vec<Disk>> {
        let config = self.config()?;
        let mut disks = Vec::new();
        for (name, controller) in config.blocks() {
            let (system_id, slot) = identity(name, controller)?;
            for (_, _, array) in arrays(controller) {
                for (address, drive) in physical_drives(array) {
                    disks.push(translate::disk(address, drive, system_id, slot, false)?);
                }
            }
            if let Some(spare) = unassigned(controller) {
                for (address, drive) in physical_drives(spare) {
                    disks.push(translate::disk(address, drive, system_id, slot, true)?);
                }
            }
        }
        Ok(disks)
    }

    fn raid_info(&self, volume: &Volume) -> PluginResult<RaidInfo> {
        let parts: Vec<&str> = volume
            .plugin_data
            .as_deref()
            .map(|token| token.split(':').collect())
            .unwrap_or_default();
        let &[slot, letter, number] = parts.as_slice() else {
            return Err(SmartArrayError::InvalidPluginData {
                value: volume.plugin_data.clone(),
            }
            .into());
        };

        let selector = format!("slot={slot}");
        let config = self.exec(&["ctrl", &selector, "show", "config", "detail"])?;
        let not_found = || SmartArrayError::LogicalDriveNotFound {
            slot: slot.to_owned(),
            array: letter.to_owned(),
            drive: number.to_owned(),
        };
        let (_, controller) = config
            .blocks()
            .next()
            .ok_or(SmartArrayError::NoControllers)?;
        let (_, _, array) = arrays(controller)
            .find(|(_, found, _)| *found == letter)
            .ok_or_else(not_found)?;
        let (drive_key, _, drive) = logical_drives(array)
            .find(|(_, found, _)| *found == number)
            .ok_or_else(not_found)?;

        let data_drives = physical_drives(array)
            .filter(|(_, disk)| disk.value("Drive Type") == Some(DATA_DRIVE))
            .count();
        if data_drives == 0 {
            return Err(SmartArrayError::NoDataDrives {
                array: letter.to_owned(),
                drive: number.to_owned(),
            }
            .into());
        }

        let strip_size = size_bytes(drive.require("Strip Size", drive_key)?)?;
        let opt_io_size = size_bytes(drive.require("Full Stripe Size", drive_key)?)?;
        Ok(RaidInfo {
            raid_type: raid_type(drive.require("Fault Tolerance", drive_key)?),
            strip_size,
            disk_count: u64::try_from(data_drives).unwrap_or(u64::MAX),
            min_io_size: strip_size,
            opt_io_size,
        })
    }
}

// Serial number and slot of one controller block.
fn identity<'a>(name: &str, controller: &'a Block) -> Result<(&'a str, &'a str), SmartArrayError> {
    Ok((
        controller.require("Serial Number", name)?,
        controller.require("Slot", name)?,
    ))
}

fn no_jobs(id: &str) -> StorageError {
    StorageError::new(
        ErrorCode::NotFoundJob,
        format!("job {id} not found; the smartarray plugin runs no jobs"),
    )
}

impl<R: CommandRunner> Plugin for SmartArrayPlugin<R> {
    fn plugin_register(&mut self, request: ops::PluginRegister) -> PluginResult<()> {
        if !(self.is_privileged)() {
            return Err(SmartArrayError::NotRoot.into());
        }
        let uri = StorageUri::parse(&request.uri)?;
        let binary = self.locate(&uri)?;
        debug!(target: PLUGIN_TARGET, binary = %binary.display(), "using controller tool");
        self.binary = Some(binary);
        let version = self.exec_raw(&["version"])?;
        info!(target: PLUGIN_TARGET, version = version.trim(), "session registered");
        Ok(())
    }

    fn plugin_unregister(&mut self, _request: ops::PluginUnregister) -> PluginResult<()> {
        debug!(target: PLUGIN_TARGET, "session unregistered");
        Ok(())
    }

    fn plugin_info(&mut self, _request: ops::PluginInfo) -> PluginResult<PluginDescription> {
        Ok(PluginDescription {
            description: "SmartArray RAID controller plugin".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        })
    }

    fn capabilities(&mut self, request: ops::Capabilities) -> PluginResult<Capabilities> {
        let known = self
            .all_systems()?
            .iter()
            .any(|system| system.id == request.system.id);
        if !known {
            return Err(StorageError::new(
                ErrorCode::NotFoundSystem,
                format!("system {} not found", request.system.id),
            ));
        }
        let mut capabilities = Capabilities::new();
        for capability in SUPPORTED {
            capabilities.set(capability);
        }
        Ok(capabilities)
    }

    fn systems(&mut self, _request: ops::Systems) -> PluginResult<Vec<System>> {
        self.all_systems()
    }

    fn job_status(&mut self, request: ops::JobStatus) -> PluginResult<JobProgress> {
        Err(no_jobs(request.job_id.as_str()))
    }

    fn job_free(&mut self, request: ops::JobFree) -> PluginResult<()> {
        Err(no_jobs(request.job_id.as_str()))
    }

    fn pools(&mut self, request: ops::Pools) -> PluginResult<Vec<Pool>> {
        search(
            self.all_pools()?,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn volumes(&mut self, request: ops::Volumes) -> PluginResult<Vec<Volume>> {
        search(
            self.all_volumes()?,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn disks(&mut self, request: ops::Disks) -> PluginResult<Vec<Disk>> {
        search(
            self.all_disks()?,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn volume_raid_info(&mut self, request: ops::VolumeRaidInfo) -> PluginResult<RaidInfo> {
        self.raid_info(&request.volume)
    }
}
