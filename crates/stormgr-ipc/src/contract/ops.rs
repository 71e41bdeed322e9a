//! Argument structs for every wire method.
//!
//! Field names are the wire argument names. `flags` is reserved for future
//! use and defaults to zero when absent.

use serde::{Deserialize, Serialize};
use stormgr_types::{
    self as types, AccessGroup, Disk, FileSystem, FsSnapshot, InitiatorType, JobId, NfsExport,
    Pool, Provisioning, RaidInfo, ReplicationType, SearchFilter, StorageError, System,
    TargetPort, Volume,
};

use super::{JobOr, JobProgress, Operation, PluginDescription};

macro_rules! operation {
    ($name:ident, $method:literal, $output:ty) => {
        impl Operation for $name {
            const METHOD: &'static str = $method;
            type Output = $output;
        }
    };
}

macro_rules! listing {
    ($(#[$meta:meta])* $name:ident, $method:literal, $record:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            /// Field to filter on, or `None` for everything.
            #[serde(default)]
            pub search_key: Option<String>,
            /// Value the field must equal.
            #[serde(default)]
            pub search_value: Option<String>,
            /// Reserved.
            #[serde(default)]
            pub flags: u64,
        }

        impl $name {
            /// Lists everything.
            #[must_use]
            pub const fn all() -> Self {
                Self {
                    search_key: None,
                    search_value: None,
                    flags: 0,
                }
            }

            /// Lists the entities whose `key` field equals `value`.
            #[must_use]
            pub fn matching(key: impl Into<String>, value: impl Into<String>) -> Self {
                Self {
                    search_key: Some(key.into()),
                    search_value: Some(value.into()),
                    flags: 0,
                }
            }

            /// Validated filter, or `None` for an unfiltered listing.
            ///
            /// # Errors
            ///
            /// Rejects unsupported keys and keys without values.
            pub fn filter(&self) -> Result<Option<SearchFilter>, StorageError> {
                SearchFilter::for_record::<$record>(
                    self.search_key.as_deref(),
                    self.search_value.as_deref(),
                )
            }
        }

        impl Operation for $name {
            const METHOD: &'static str = $method;
            type Output = Vec<$record>;

            fn validate(&self) -> Result<(), StorageError> {
                self.filter().map(|_| ())
            }
        }
    };
}

/// Opens a plugin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRegister {
    /// Full connection URI, query and transport suffix included.
    pub uri: String,
    /// Array credential, passed through untouched.
    #[serde(default)]
    pub password: Option<String>,
    /// Request bound in milliseconds.
    pub timeout: u32,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(PluginRegister, "plugin_register", ());

/// Ends a plugin session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginUnregister {
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(PluginUnregister, "plugin_unregister", ());

/// Describes the plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(PluginInfo, "plugin_info", PluginDescription);

/// Sets the plugin's array-side timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOutSet {
    /// New timeout in milliseconds.
    pub ms: u32,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(TimeOutSet, "time_out_set", ());

/// Reads the plugin's array-side timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOutGet {
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(TimeOutGet, "time_out_get", u32);

/// Reports which operations a system supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// System to query.
    pub system: System,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(Capabilities, "capabilities", types::Capabilities);

/// Lists systems.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Systems {
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(Systems, "systems", Vec<System>);

listing!(
    /// Lists pools.
    Pools, "pools", Pool
);
listing!(
    /// Lists volumes.
    Volumes, "volumes", Volume
);
listing!(
    /// Lists disks.
    Disks, "disks", Disk
);
listing!(
    /// Lists access groups.
    AccessGroups, "access_groups", AccessGroup
);
listing!(
    /// Lists file systems.
    Fs, "fs", FileSystem
);
listing!(
    /// Lists NFS exports.
    Exports, "exports", NfsExport
);
listing!(
    /// Lists target ports.
    TargetPorts, "target_ports", TargetPort
);

/// Lists the snapshots of a file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsSnapshots {
    /// File system whose snapshots are listed.
    pub fs: FileSystem,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(FsSnapshots, "fs_snapshots", Vec<FsSnapshot>);

/// Polls a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job to poll.
    pub job_id: JobId,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(JobStatus, "job_status", JobProgress);

/// Releases a job id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFree {
    /// Job to release.
    pub job_id: JobId,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(JobFree, "job_free", ());

/// Creates a volume in a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeCreate {
    /// Pool to carve from.
    pub pool: Pool,
    /// Name of the new volume.
    pub volume_name: String,
    /// Requested capacity in bytes.
    pub size_bytes: u64,
    /// Requested provisioning.
    pub provisioning: Provisioning,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeCreate, "volume_create", JobOr<Volume>);

/// Grows or shrinks a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeResize {
    /// Volume to resize.
    pub volume: Volume,
    /// New capacity in bytes.
    pub new_size_bytes: u64,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeResize, "volume_resize", JobOr<Volume>);

/// Deletes a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDelete {
    /// Volume to delete.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeDelete, "volume_delete", Option<JobId>);

/// Replicates a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeReplicate {
    /// Destination pool, or `None` for the source volume's pool.
    #[serde(default)]
    pub pool: Option<Pool>,
    /// Kind of replica.
    pub rep_type: ReplicationType,
    /// Volume to replicate.
    pub volume_src: Volume,
    /// Name of the replica.
    pub name: String,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeReplicate, "volume_replicate", JobOr<Volume>);

/// Enables a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeEnable {
    /// Volume to enable.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeEnable, "volume_enable", ());

/// Disables a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDisable {
    /// Volume to disable.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeDisable, "volume_disable", ());

/// Grants an access group access to a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMask {
    /// Group receiving access.
    pub access_group: AccessGroup,
    /// Volume being exposed.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeMask, "volume_mask", ());

/// Revokes an access group's access to a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeUnmask {
    /// Group losing access.
    pub access_group: AccessGroup,
    /// Volume being hidden.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeUnmask, "volume_unmask", ());

/// Reports a volume's RAID geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRaidInfo {
    /// Volume to inspect.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeRaidInfo, "volume_raid_info", RaidInfo);

/// Reports whether other volumes depend on a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeChildDependency {
    /// Volume to inspect.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(VolumeChildDependency, "volume_child_dependency", bool);

/// Breaks the dependencies of other volumes on a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeChildDependencyRm {
    /// Volume whose dependants are detached.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(
    VolumeChildDependencyRm,
    "volume_child_dependency_rm",
    Option<JobId>
);

/// Lists the volumes an access group can reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumesAccessibleByAccessGroup {
    /// Group to inspect.
    pub access_group: AccessGroup,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(
    VolumesAccessibleByAccessGroup,
    "volumes_accessible_by_access_group",
    Vec<Volume>
);

/// Lists the access groups a volume is masked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroupsGrantedToVolume {
    /// Volume to inspect.
    pub volume: Volume,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(
    AccessGroupsGrantedToVolume,
    "access_groups_granted_to_volume",
    Vec<AccessGroup>
);

/// Creates an access group with one initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroupCreate {
    /// Name of the new group.
    pub name: String,
    /// First member.
    pub init_id: String,
    /// Identifier family of `init_id`.
    pub init_type: InitiatorType,
    /// System owning the group.
    pub system: System,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(AccessGroupCreate, "access_group_create", AccessGroup);

/// Deletes an access group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroupDelete {
    /// Group to delete.
    pub access_group: AccessGroup,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(AccessGroupDelete, "access_group_delete", ());

/// Adds an initiator to an access group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroupInitiatorAdd {
    /// Group to extend.
    pub access_group: AccessGroup,
    /// Initiator to add.
    pub init_id: String,
    /// Identifier family of `init_id`.
    pub init_type: InitiatorType,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(
    AccessGroupInitiatorAdd,
    "access_group_initiator_add",
    AccessGroup
);

/// Removes an initiator from an access group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGroupInitiatorDelete {
    /// Group to shrink.
    pub access_group: AccessGroup,
    /// Initiator to remove.
    pub init_id: String,
    /// Identifier family of `init_id`.
    pub init_type: InitiatorType,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(
    AccessGroupInitiatorDelete,
    "access_group_initiator_delete",
    AccessGroup
);

/// Configures iSCSI CHAP credentials for an initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IscsiChapAuth {
    /// Initiator being configured.
    pub init_id: String,
    /// Inbound user.
    #[serde(default)]
    pub in_user: Option<String>,
    /// Inbound secret.
    #[serde(default)]
    pub in_password: Option<String>,
    /// Outbound user.
    #[serde(default)]
    pub out_user: Option<String>,
    /// Outbound secret.
    #[serde(default)]
    pub out_password: Option<String>,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(IscsiChapAuth, "iscsi_chap_auth", ());

/// Creates a file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsCreate {
    /// Pool to carve from.
    pub pool: Pool,
    /// Name of the new file system.
    pub name: String,
    /// Requested capacity in bytes.
    pub size_bytes: u64,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(FsCreate, "fs_create", JobOr<FileSystem>);

/// Resizes a file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsResize {
    /// File system to resize.
    pub fs: FileSystem,
    /// New capacity in bytes.
    pub new_size_bytes: u64,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(FsResize, "fs_resize", JobOr<FileSystem>);

/// Deletes a file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsDelete {
    /// File system to delete.
    pub fs: FileSystem,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(FsDelete, "fs_delete", Option<JobId>);

/// Clones a file system, optionally from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsClone {
    /// File system to clone.
    pub src_fs: FileSystem,
    /// Name of the clone.
    pub dest_fs_name: String,
    /// Snapshot to clone from, or `None` for the live file system.
    #[serde(default)]
    pub snapshot: Option<FsSnapshot>,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(FsClone, "fs_clone", JobOr<FileSystem>);

/// Snapshots a file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsSnapshotCreate {
    /// File system to snapshot.
    pub fs: FileSystem,
    /// Name of the snapshot.
    pub snapshot_name: String,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(FsSnapshotCreate, "fs_snapshot_create", JobOr<FsSnapshot>);

/// Deletes a file-system snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsSnapshotDelete {
    /// File system owning the snapshot.
    pub fs: FileSystem,
    /// Snapshot to delete.
    pub snapshot: FsSnapshot,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(FsSnapshotDelete, "fs_snapshot_delete", Option<JobId>);

/// Exports a file system over NFS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFs {
    /// File system to export.
    pub fs_id: String,
    /// Export path, or `None` to let the plugin choose.
    #[serde(default)]
    pub export_path: Option<String>,
    /// Hosts granted root access.
    #[serde(default)]
    pub root_list: Vec<String>,
    /// Hosts granted read-write access.
    #[serde(default)]
    pub rw_list: Vec<String>,
    /// Hosts granted read-only access.
    #[serde(default)]
    pub ro_list: Vec<String>,
    /// Uid anonymous users map to.
    #[serde(default = "anon_id_unset")]
    pub anon_uid: i64,
    /// Gid anonymous users map to.
    #[serde(default = "anon_id_unset")]
    pub anon_gid: i64,
    /// Authentication flavour, or `None` for the plugin default.
    #[serde(default)]
    pub auth_type: Option<String>,
    /// Extra vendor options.
    #[serde(default)]
    pub options: Option<String>,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(ExportFs, "export_fs", NfsExport);

const fn anon_id_unset() -> i64 {
    types::ANON_ID_UNSET
}

/// Removes an NFS export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRemove {
    /// Export to remove.
    pub export: NfsExport,
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(ExportRemove, "export_remove", ());

/// Lists supported NFS authentication flavours.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportAuth {
    /// Reserved.
    #[serde(default)]
    pub flags: u64,
}
operation!(ExportAuth, "export_auth", Vec<String>);

/// Every wire method name, in declaration order.
pub const METHODS: &[&str] = &[
    PluginRegister::METHOD,
    PluginUnregister::METHOD,
    PluginInfo::METHOD,
    TimeOutSet::METHOD,
    TimeOutGet::METHOD,
    Capabilities::METHOD,
    Systems::METHOD,
    Pools::METHOD,
    Volumes::METHOD,
    Disks::METHOD,
    AccessGroups::METHOD,
    Fs::METHOD,
    FsSnapshots::METHOD,
    Exports::METHOD,
    TargetPorts::METHOD,
    JobStatus::METHOD,
    JobFree::METHOD,
    VolumeCreate::METHOD,
    VolumeResize::METHOD,
    VolumeDelete::METHOD,
    VolumeReplicate::METHOD,
    VolumeEnable::METHOD,
    VolumeDisable::METHOD,
    VolumeMask::METHOD,
    VolumeUnmask::METHOD,
    VolumeRaidInfo::METHOD,
    VolumeChildDependency::METHOD,
    VolumeChildDependencyRm::METHOD,
    VolumesAccessibleByAccessGroup::METHOD,
    AccessGroupsGrantedToVolume::METHOD,
    AccessGroupCreate::METHOD,
    AccessGroupDelete::METHOD,
    AccessGroupInitiatorAdd::METHOD,
    AccessGroupInitiatorDelete::METHOD,
    IscsiChapAuth::METHOD,
    FsCreate::METHOD,
    FsResize::METHOD,
    FsDelete::METHOD,
    FsClone::METHOD,
    FsSnapshotCreate::METHOD,
    FsSnapshotDelete::METHOD,
    ExportFs::METHOD,
    ExportRemove::METHOD,
    ExportAuth::METHOD,
];
