//! Canonical storage data model shared by clients and plugins.
//!
//! Every vendor plugin translates its own control surface into the entities
//! defined here, and every client consumes them without knowing which vendor
//! produced them. The crate also owns the numbered error taxonomy that
//! crosses the wire, the capability enumeration and the search-key filtering
//! applied to listings.
//!
//! Status fields are bit-flag sets built on `enumflags2`, so a pool that is
//! both degraded and reconstructing reports both bits. Exclusive
//! enumerations (admin state, disk type, RAID type and friends) serialize as
//! plain integers.

mod capability;
mod entity;
mod error;
mod job;
mod search;
mod status;
mod uri;

pub use capability::{Capabilities, Capability};
pub use entity::{
    AccessGroup, Disk, FileSystem, FsSnapshot, NfsExport, Pool, RaidInfo, Record, System,
    TargetPort, Volume,
};
pub use error::{ErrorCode, StorageError, UnknownValue};
pub use job::{JobId, JobStatus};
pub use search::{SearchFilter, SearchKey, search};
pub use status::{
    AdminState, DiskStatus, DiskType, InitiatorType, PoolElementType, PoolStatus,
    PoolUnsupportedAction, PortType, Provisioning, RaidType, ReplicationType, SystemStatus,
};
pub use uri::StorageUri;

/// Sentinel used by [`NfsExport`] when no anonymous uid or gid applies.
pub const ANON_ID_UNSET: i64 = -1;
