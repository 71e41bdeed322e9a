//! Status bit-flag sets and exclusive enumerations.
//!
//! Bit-flag sets serialize as their numeric bit pattern through the
//! `enumflags2` serde support, which rejects undefined bits on decode.
//! Exclusive enumerations serialize as plain integers via `From`/`TryFrom`.

use enumflags2::bitflags;
use serde::{Deserialize, Serialize};
use strum::FromRepr;

use crate::error::UnknownValue;

/// Health bits of a [`crate::System`].
#[bitflags]
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    /// Health could not be determined.
    Unknown = 1 << 0,
    /// Healthy.
    Ok = 1 << 1,
    /// Failed.
    Error = 1 << 2,
    /// Running with reduced redundancy or performance.
    Degraded = 1 << 3,
    /// A failure is predicted.
    PredictiveFailure = 1 << 4,
    /// Vendor-specific condition described by `status_info`.
    Other = 1 << 5,
}

/// Element kinds a [`crate::Pool`] can host.
#[bitflags]
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolElementType {
    /// Sub-pools.
    Pool = 1 << 1,
    /// Volumes of any provisioning.
    Volume = 1 << 2,
    /// File systems.
    Fs = 1 << 3,
    /// Delta (snapshot) storage.
    Delta = 1 << 4,
    /// Fully provisioned volumes.
    VolumeFull = 1 << 5,
    /// Thinly provisioned volumes.
    VolumeThin = 1 << 6,
    /// Reserved for the system.
    SysReserved = 1 << 10,
}

/// Actions a [`crate::Pool`] cannot perform on its volumes.
#[bitflags]
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolUnsupportedAction {
    /// Volumes cannot grow.
    VolumeGrow = 1 << 0,
    /// Volumes cannot shrink.
    VolumeShrink = 1 << 1,
}

/// Health bits of a [`crate::Pool`].
#[bitflags]
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Health could not be determined.
    Unknown = 1 << 0,
    /// Healthy.
    Ok = 1 << 1,
    /// Vendor-specific condition described by `status_info`.
    Other = 1 << 2,
    /// Running with reduced redundancy.
    Degraded = 1 << 4,
    /// Failed.
    Error = 1 << 5,
    /// Stopped by an administrator or the array.
    Stopped = 1 << 9,
    /// Rebuilding redundancy.
    Reconstructing = 1 << 12,
    /// Verifying data.
    Verifying = 1 << 13,
    /// Initialising.
    Initializing = 1 << 14,
    /// Growing.
    Growing = 1 << 15,
}

/// Health and role bits of a [`crate::Disk`].
#[bitflags]
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskStatus {
    /// Health could not be determined.
    Unknown = 1 << 0,
    /// Healthy.
    Ok = 1 << 1,
    /// Vendor-specific condition.
    Other = 1 << 2,
    /// A failure is predicted.
    PredictiveFailure = 1 << 3,
    /// Failed.
    Error = 1 << 4,
    /// Physically removed.
    Removed = 1 << 5,
    /// Spinning up.
    Starting = 1 << 6,
    /// Spinning down.
    Stopping = 1 << 7,
    /// Stopped.
    Stopped = 1 << 8,
    /// Initialising.
    Initializing = 1 << 9,
    /// In maintenance mode.
    MaintenanceMode = 1 << 10,
    /// Configured as a spare.
    SpareDisk = 1 << 11,
    /// Being reconstructed.
    Reconstruct = 1 << 12,
    /// Not assigned to any pool.
    Free = 1 << 13,
}

macro_rules! impl_wire_number {
    ($ty:ty, $repr:ty, $kind:literal) => {
        impl From<$ty> for $repr {
            fn from(value: $ty) -> Self {
                value as $repr
            }
        }

        impl TryFrom<$repr> for $ty {
            type Error = UnknownValue;

            fn try_from(value: $repr) -> Result<Self, UnknownValue> {
                Self::from_repr(value).ok_or(UnknownValue {
                    kind: $kind,
                    value: i64::from(value),
                })
            }
        }
    };
}

/// Administrative state of a [`crate::Volume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum AdminState {
    /// Volume is disabled.
    Disabled = 0,
    /// Volume is enabled.
    Enabled = 1,
}

impl_wire_number!(AdminState, i32, "admin state");

/// Physical interface or media type of a [`crate::Disk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum DiskType {
    /// Type unknown.
    Unknown = 0,
    /// Vendor-specific type.
    Other = 1,
    /// Parallel ATA.
    Ata = 3,
    /// Serial ATA.
    Sata = 4,
    /// Serial attached SCSI.
    Sas = 5,
    /// Fibre channel.
    Fc = 6,
    /// SCSI over PCIe.
    Sop = 7,
    /// Parallel SCSI.
    Scsi = 8,
    /// A LUN exported by another array.
    Lun = 9,
    /// Near-line SAS.
    NlSas = 51,
    /// Generic spinning disk.
    Hdd = 52,
    /// Solid-state disk.
    Ssd = 53,
    /// Hybrid disk.
    Hybrid = 54,
}

impl_wire_number!(DiskType, i32, "disk type");

/// Identifier family of the initiators in an [`crate::AccessGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum InitiatorType {
    /// Type unknown.
    Unknown = 0,
    /// Vendor-specific type.
    Other = 1,
    /// Fibre channel world wide port name.
    Wwpn = 2,
    /// iSCSI qualified name.
    IscsiIqn = 5,
    /// Both iSCSI and WWPN initiators.
    IscsiWwpnMixed = 7,
}

impl_wire_number!(InitiatorType, i32, "initiator type");

/// Protocol served by a [`crate::TargetPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum PortType {
    /// Vendor-specific protocol.
    Other = 1,
    /// Fibre channel.
    Fc = 2,
    /// Fibre channel over ethernet.
    Fcoe = 3,
    /// iSCSI.
    Iscsi = 4,
}

impl_wire_number!(PortType, i32, "port type");

/// RAID layout reported by `volume_raid_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum RaidType {
    /// Layout unknown.
    Unknown = -1,
    /// Striping.
    Raid0 = 0,
    /// Mirroring.
    Raid1 = 1,
    /// Byte-level striping with dedicated parity.
    Raid3 = 3,
    /// Block-level striping with dedicated parity.
    Raid4 = 4,
    /// Block-level striping with distributed parity.
    Raid5 = 5,
    /// Block-level striping with double distributed parity.
    Raid6 = 6,
    /// Striped mirrors.
    Raid10 = 10,
    /// Mirrored RAID 5 sets.
    Raid15 = 15,
    /// Mirrored RAID 6 sets.
    Raid16 = 16,
    /// Concatenated disks.
    Jbod = 20,
    /// Several layouts at once.
    Mixed = 21,
    /// Vendor-specific layout.
    Other = 22,
    /// Striped RAID 5 sets.
    Raid50 = 50,
    /// Mirrored RAID 5 sets, vendor variant.
    Raid51 = 51,
    /// Striped RAID 6 sets.
    Raid60 = 60,
    /// Mirrored RAID 6 sets, vendor variant.
    Raid61 = 61,
}

impl_wire_number!(RaidType, i32, "raid type");

/// Provisioning requested by `volume_create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum Provisioning {
    /// Provisioning unknown.
    Unknown = -1,
    /// Thin provisioning.
    Thin = 1,
    /// Full provisioning.
    Full = 2,
    /// Whatever the array prefers.
    Default = 3,
}

impl_wire_number!(Provisioning, i32, "provisioning");

/// Replica kind requested by `volume_replicate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum ReplicationType {
    /// Replica kind unknown.
    Unknown = -1,
    /// Point-in-time space-efficient clone.
    PointInTimeClone = 2,
    /// Full copy.
    FullCopy = 3,
    /// Synchronous mirror.
    MirrorSync = 4,
    /// Asynchronous mirror.
    MirrorAsync = 5,
}

impl_wire_number!(ReplicationType, i32, "replication type");
