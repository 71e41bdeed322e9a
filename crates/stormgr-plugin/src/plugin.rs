//! The trait every storage plugin implements.

use stormgr_ipc::{JobOr, JobProgress, Operation, PluginDescription, ops};
use stormgr_types::{
    AccessGroup, Capabilities, Disk, FileSystem, FsSnapshot, JobId, NfsExport, Pool, RaidInfo,
    StorageError, System, TargetPort, Volume,
};

/// Outcome of one plugin call.
pub type PluginResult<T> = Result<T, StorageError>;

fn unsupported<O: Operation>() -> StorageError {
    StorageError::no_support(format!("{} is not supported by this plugin", O::METHOD))
}

/// One vendor's translation of the canonical operations.
///
/// A session owns its plugin exclusively, so every method takes
/// `&mut self`. The session-management methods, `capabilities`, `systems`
/// and the job methods are required; everything else defaults to a
/// `NoSupport` failure so a plugin only implements what its array can do.
/// A plugin must still report unsupported work as an error rather than
/// silently doing nothing.
pub trait Plugin {
    /// Opens the session. `request.uri` carries the full connection URI.
    ///
    /// # Errors
    ///
    /// Authentication or reachability failures of the array.
    fn plugin_register(&mut self, request: ops::PluginRegister) -> PluginResult<()>;

    /// Ends the session; the router closes the connection afterwards.
    ///
    /// # Errors
    ///
    /// Failures releasing vendor resources.
    fn plugin_unregister(&mut self, request: ops::PluginUnregister) -> PluginResult<()>;

    /// Describes the plugin.
    ///
    /// # Errors
    ///
    /// Rarely; implementations usually return a constant.
    fn plugin_info(&mut self, request: ops::PluginInfo) -> PluginResult<PluginDescription>;

    /// Reports the operations `request.system` supports.
    ///
    /// # Errors
    ///
    /// `NotFoundSystem` when the system is unknown.
    fn capabilities(&mut self, request: ops::Capabilities) -> PluginResult<Capabilities>;

    /// Lists systems.
    ///
    /// # Errors
    ///
    /// Vendor query failures.
    fn systems(&mut self, request: ops::Systems) -> PluginResult<Vec<System>>;

    /// Polls a job started by this session.
    ///
    /// # Errors
    ///
    /// `NotFoundJob` for unknown ids, or the job's own failure the first
    /// time it is observed.
    fn job_status(&mut self, request: ops::JobStatus) -> PluginResult<JobProgress>;

    /// Releases a job id.
    ///
    /// # Errors
    ///
    /// `NotFoundJob` for unknown ids.
    fn job_free(&mut self, request: ops::JobFree) -> PluginResult<()>;

    /// Sets the array-side timeout.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn time_out_set(&mut self, _request: ops::TimeOutSet) -> PluginResult<()> {
        Err(unsupported::<ops::TimeOutSet>())
    }

    /// Reads the array-side timeout.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn time_out_get(&mut self, _request: ops::TimeOutGet) -> PluginResult<u32> {
        Err(unsupported::<ops::TimeOutGet>())
    }

    /// Lists pools.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn pools(&mut self, _request: ops::Pools) -> PluginResult<Vec<Pool>> {
        Err(unsupported::<ops::Pools>())
    }

    /// Lists volumes.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volumes(&mut self, _request: ops::Volumes) -> PluginResult<Vec<Volume>> {
        Err(unsupported::<ops::Volumes>())
    }

    /// Lists disks.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn disks(&mut self, _request: ops::Disks) -> PluginResult<Vec<Disk>> {
        Err(unsupported::<ops::Disks>())
    }

    /// Lists access groups.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn access_groups(&mut self, _request: ops::AccessGroups) -> PluginResult<Vec<AccessGroup>> {
        Err(unsupported::<ops::AccessGroups>())
    }

    /// Lists file systems.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn fs(&mut self, _request: ops::Fs) -> PluginResult<Vec<FileSystem>> {
        Err(unsupported::<ops::Fs>())
    }

    /// Lists the snapshots of a file system.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn fs_snapshots(&mut self, _request: ops::FsSnapshots) -> PluginResult<Vec<FsSnapshot>> {
        Err(unsupported::<ops::FsSnapshots>())
    }

    /// Lists NFS exports.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn exports(&mut self, _request: ops::Exports) -> PluginResult<Vec<NfsExport>> {
        Err(unsupported::<ops::Exports>())
    }

    /// Lists target ports.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn target_ports(&mut self, _request: ops::TargetPorts) -> PluginResult<Vec<TargetPort>> {
        Err(unsupported::<ops::TargetPorts>())
    }

    /// Creates a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_create(&mut self, _request: ops::VolumeCreate) -> PluginResult<JobOr<Volume>> {
        Err(unsupported::<ops::VolumeCreate>())
    }

    /// Resizes a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_resize(&mut self, _request: ops::VolumeResize) -> PluginResult<JobOr<Volume>> {
        Err(unsupported::<ops::VolumeResize>())
    }

    /// Deletes a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_delete(&mut self, _request: ops::VolumeDelete) -> PluginResult<Option<JobId>> {
        Err(unsupported::<ops::VolumeDelete>())
    }

    /// Replicates a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_replicate(
        &mut self,
        _request: ops::VolumeReplicate,
    ) -> PluginResult<JobOr<Volume>> {
        Err(unsupported::<ops::VolumeReplicate>())
    }

    /// Enables a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_enable(&mut self, _request: ops::VolumeEnable) -> PluginResult<()> {
        Err(unsupported::<ops::VolumeEnable>())
    }

    /// Disables a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_disable(&mut self, _request: ops::VolumeDisable) -> PluginResult<()> {
        Err(unsupported::<ops::VolumeDisable>())
    }

    /// Grants an access group access to a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_mask(&mut self, _request: ops::VolumeMask) -> PluginResult<()> {
        Err(unsupported::<ops::VolumeMask>())
    }

    /// Revokes an access group's access to a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_unmask(&mut self, _request: ops::VolumeUnmask) -> PluginResult<()> {
        Err(unsupported::<ops::VolumeUnmask>())
    }

    /// Reports a volume's RAID geometry.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_raid_info(&mut self, _request: ops::VolumeRaidInfo) -> PluginResult<RaidInfo> {
        Err(unsupported::<ops::VolumeRaidInfo>())
    }

    /// Reports whether other volumes depend on a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_child_dependency(
        &mut self,
        _request: ops::VolumeChildDependency,
    ) -> PluginResult<bool> {
        Err(unsupported::<ops::VolumeChildDependency>())
    }

    /// Detaches the volumes depending on a volume.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volume_child_dependency_rm(
        &mut self,
        _request: ops::VolumeChildDependencyRm,
    ) -> PluginResult<Option<JobId>> {
        Err(unsupported::<ops::VolumeChildDependencyRm>())
    }

    /// Lists the volumes an access group can reach.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn volumes_accessible_by_access_group(
        &mut self,
        _request: ops::VolumesAccessibleByAccessGroup,
    ) -> PluginResult<Vec<Volume>> {
        Err(unsupported::<ops::VolumesAccessibleByAccessGroup>())
    }

    /// Lists the access groups a volume is masked to.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn access_groups_granted_to_volume(
        &mut self,
        _request: ops::AccessGroupsGrantedToVolume,
    ) -> PluginResult<Vec<AccessGroup>> {
        Err(unsupported::<ops::AccessGroupsGrantedToVolume>())
    }

    /// Creates an access group.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn access_group_create(
        &mut self,
        _request: ops::AccessGroupCreate,
    ) -> PluginResult<AccessGroup> {
        Err(unsupported::<ops::AccessGroupCreate>())
    }

    /// Deletes an access group.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn access_group_delete(&mut self, _request: ops::AccessGroupDelete) -> PluginResult<()> {
        Err(unsupported::<ops::AccessGroupDelete>())
    }

    /// Adds an initiator to an access group.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn access_group_initiator_add(
        &mut self,
        _request: ops::AccessGroupInitiatorAdd,
    ) -> PluginResult<AccessGroup> {
        Err(unsupported::<ops::AccessGroupInitiatorAdd>())
    }

    /// Removes an initiator from an access group.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn access_group_initiator_delete(
        &mut self,
        _request: ops::AccessGroupInitiatorDelete,
    ) -> PluginResult<AccessGroup> {
        Err(unsupported::<ops::AccessGroupInitiatorDelete>())
    }

    /// Configures iSCSI CHAP credentials.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn iscsi_chap_auth(&mut self, _request: ops::IscsiChapAuth) -> PluginResult<()> {
        Err(unsupported::<ops::IscsiChapAuth>())
    }

    /// Creates a file system.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn fs_create(&mut self, _request: ops::FsCreate) -> PluginResult<JobOr<FileSystem>> {
        Err(unsupported::<ops::FsCreate>())
    }

    /// Resizes a file system.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn fs_resize(&mut self, _request: ops::FsResize) -> PluginResult<JobOr<FileSystem>> {
        Err(unsupported::<ops::FsResize>())
    }

    /// Deletes a file system.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn fs_delete(&mut self, _request: ops::FsDelete) -> PluginResult<Option<JobId>> {
        Err(unsupported::<ops::FsDelete>())
    }

    /// Clones a file system.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn fs_clone(&mut self, _request: ops::FsClone) -> PluginResult<JobOr<FileSystem>> {
        Err(unsupported::<ops::FsClone>())
    }

    /// Snapshots a file system.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn fs_snapshot_create(
        &mut self,
        _request: ops::FsSnapshotCreate,
    ) -> PluginResult<JobOr<FsSnapshot>> {
        Err(unsupported::<ops::FsSnapshotCreate>())
    }

    /// Deletes a file-system snapshot.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn fs_snapshot_delete(
        &mut self,
        _request: ops::FsSnapshotDelete,
    ) -> PluginResult<Option<JobId>> {
        Err(unsupported::<ops::FsSnapshotDelete>())
    }

    /// Exports a file system over NFS.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn export_fs(&mut self, _request: ops::ExportFs) -> PluginResult<NfsExport> {
        Err(unsupported::<ops::ExportFs>())
    }

    /// Removes an NFS export.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn export_remove(&mut self, _request: ops::ExportRemove) -> PluginResult<()> {
        Err(unsupported::<ops::ExportRemove>())
    }

    /// Lists supported NFS authentication flavours.
    ///
    /// # Errors
    ///
    /// `NoSupport` unless overridden.
    fn export_auth(&mut self, _request: ops::ExportAuth) -> PluginResult<Vec<String>> {
        Err(unsupported::<ops::ExportAuth>())
    }
}
