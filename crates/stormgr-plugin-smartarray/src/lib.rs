//! SmartArray RAID controller plugin.
//!
//! The plugin drives the vendor's `hpssacli`/`ssacli` tool on the local
//! host and translates its indented text reports into canonical systems,
//! pools, volumes and disks. It is read-only apart from reporting RAID
//! geometry through `volume_raid_info`, and it must run as root because the
//! tool does.

mod errors;
pub mod parser;
mod plugin;
mod runner;
mod sysfs;
mod translate;

pub use errors::SmartArrayError;
pub use plugin::{DEFAULT_CANDIDATES, SmartArrayPlugin, TOOL_QUERY};
pub use runner::{CommandRunner, SystemRunner};
pub use sysfs::{BlockGeometry, DEFAULT_SYSFS_ROOT, Sysfs};

/// URI scheme and socket name of the plugin.
pub const SCHEME: &str = "smartarray";
