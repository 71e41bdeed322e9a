//! Capability enumeration and per-system capability sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, FromRepr, IntoEnumIterator};

use crate::error::UnknownValue;

/// Operation a plugin may support for a system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, FromRepr,
    Serialize, Deserialize,
)]
#[serde(into = "u32", try_from = "u32")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum Capability {
    /// List volumes.
    Volumes = 20,
    /// Create volumes.
    VolumeCreate = 21,
    /// Resize volumes.
    VolumeResize = 22,
    /// Replicate volumes.
    VolumeReplicate = 23,
    /// Delete volumes.
    VolumeDelete = 33,
    /// Enable volumes.
    VolumeEnable = 34,
    /// Disable volumes.
    VolumeDisable = 35,
    /// Mask volumes to access groups.
    VolumeMask = 36,
    /// Unmask volumes from access groups.
    VolumeUnmask = 37,
    /// List access groups.
    AccessGroups = 38,
    /// Create access groups.
    AccessGroupCreate = 39,
    /// Delete access groups.
    AccessGroupDelete = 40,
    /// Add initiators to access groups.
    AccessGroupInitiatorAdd = 41,
    /// Remove initiators from access groups.
    AccessGroupInitiatorDelete = 42,
    /// List the volumes an access group can reach.
    VolumesAccessibleByAccessGroup = 43,
    /// List the access groups a volume is masked to.
    AccessGroupsGrantedToVolume = 44,
    /// Query volume child dependencies.
    VolumeChildDependency = 45,
    /// Remove volume child dependencies.
    VolumeChildDependencyRm = 46,
    /// Configure iSCSI CHAP authentication.
    VolumeIscsiChapAuthentication = 53,
    /// Report volume RAID geometry.
    VolumeRaidInfo = 54,
    /// List file systems.
    Fs = 100,
    /// Delete file systems.
    FsDelete = 101,
    /// Resize file systems.
    FsResize = 102,
    /// Create file systems.
    FsCreate = 103,
    /// Clone file systems.
    FsClone = 104,
    /// List file-system snapshots.
    FsSnapshots = 106,
    /// Create file-system snapshots.
    FsSnapshotCreate = 107,
    /// Delete file-system snapshots.
    FsSnapshotDelete = 109,
    /// List supported NFS authentication flavours.
    ExportAuth = 120,
    /// List NFS exports.
    Exports = 121,
    /// Export file systems over NFS.
    ExportFs = 122,
    /// Remove NFS exports.
    ExportRemove = 123,
    /// Filter pools on the plugin side.
    PoolsQuickSearch = 210,
    /// Filter volumes on the plugin side.
    VolumesQuickSearch = 211,
    /// Filter disks on the plugin side.
    DisksQuickSearch = 212,
    /// Filter access groups on the plugin side.
    AccessGroupsQuickSearch = 213,
    /// Filter file systems on the plugin side.
    FsQuickSearch = 214,
    /// Filter NFS exports on the plugin side.
    NfsExportsQuickSearch = 215,
    /// List target ports.
    TargetPorts = 216,
    /// Filter target ports on the plugin side.
    TargetPortsQuickSearch = 217,
    /// List disks.
    Disks = 220,
}

impl From<Capability> for u32 {
    fn from(value: Capability) -> Self {
        value as Self
    }
}

impl TryFrom<u32> for Capability {
    type Error = UnknownValue;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_repr(value).ok_or(UnknownValue {
            kind: "capability",
            value: i64::from(value),
        })
    }
}

/// Capabilities a plugin supports for one system.
///
/// Serialized as the ascending list of supported capability numbers.
/// Numbers unknown to this build are dropped on decode so newer plugins stay
/// readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub struct Capabilities {
    #[serde(deserialize_with = "known_capabilities")]
    supported: BTreeSet<Capability>,
}

impl Capabilities {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            supported: BTreeSet::new(),
        }
    }

    /// Reports whether `capability` is supported.
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.supported.contains(&capability)
    }

    /// Marks `capability` as supported.
    pub fn set(&mut self, capability: Capability) {
        self.supported.insert(capability);
    }

    /// Marks `capability` as unsupported.
    pub fn unset(&mut self, capability: Capability) {
        self.supported.remove(&capability);
    }

    /// Iterates the supported capabilities in ascending wire order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.supported.iter().copied()
    }

    /// Builds a set containing every capability.
    #[must_use]
    pub fn all() -> Self {
        Capability::iter().collect()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            supported: iter.into_iter().collect(),
        }
    }
}

fn known_capabilities<'de, D>(deserializer: D) -> Result<BTreeSet<Capability>, D::Error>
where
    D: Deserializer<'de>,
{
    let numbers = Vec::<u32>::deserialize(deserializer)?;
    Ok(numbers
        .into_iter()
        .filter_map(Capability::from_repr)
        .collect())
}

#[cfg(test)]
mod tests;
