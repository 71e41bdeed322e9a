//! Typed wrappers for every wire method.
//!
//! Each method builds the operation struct and hands it to
//! [`Client::invoke`]. Errors are those of `invoke`: local validation,
//! transport, the plugin's fault, or a reply of the wrong shape.

use std::time::Duration;

use stormgr_ipc::{JobOr, JobProgress, PluginDescription, ops};
use stormgr_types::{
    AccessGroup, Capabilities, Disk, FileSystem, FsSnapshot, InitiatorType, JobId, JobStatus,
    NfsExport, Pool, Provisioning, RaidInfo, ReplicationType, StorageError, System, TargetPort,
    Volume,
};

use super::Client;

type Outcome<T> = Result<T, StorageError>;

macro_rules! listing {
    ($(#[$meta:meta])* $method:ident, $op:ident, $record:ty) => {
        $(#[$meta])*
        ///
        /// `search_key` must be one of the entity's searchable fields; an
        /// unsupported key fails with `UnsupportedSearchKey` before anything
        /// is sent.
        ///
        /// # Errors
        ///
        /// As for [`Client::invoke`].
        pub fn $method(
            &mut self,
            search_key: Option<&str>,
            search_value: Option<&str>,
        ) -> Outcome<Vec<$record>> {
            self.invoke(&ops::$op {
                search_key: search_key.map(str::to_owned),
                search_value: search_value.map(str::to_owned),
                flags: 0,
            })
        }
    };
}

impl Client {
    /// Plugin description and version.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn plugin_info(&mut self) -> Outcome<PluginDescription> {
        self.invoke(&ops::PluginInfo::default())
    }

    /// Sets the plugin's array-side timeout and the local request bound.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn time_out_set(&mut self, ms: u32) -> Outcome<()> {
        self.invoke(&ops::TimeOutSet { ms, flags: 0 })?;
        self.timeout = Duration::from_millis(u64::from(ms));
        self.transport.set_timeout(Some(self.timeout))
    }

    /// Plugin's array-side timeout in milliseconds.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn time_out_get(&mut self) -> Outcome<u32> {
        self.invoke(&ops::TimeOutGet::default())
    }

    /// Operations `system` supports.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn capabilities(&mut self, system: &System) -> Outcome<Capabilities> {
        self.invoke(&ops::Capabilities {
            system: system.clone(),
            flags: 0,
        })
    }

    /// Systems the plugin manages.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn systems(&mut self) -> Outcome<Vec<System>> {
        self.invoke(&ops::Systems::default())
    }

    listing!(
        /// Storage pools.
        pools, Pools, Pool
    );
    listing!(
        /// Volumes.
        volumes, Volumes, Volume
    );
    listing!(
        /// Physical disks.
        disks, Disks, Disk
    );
    listing!(
        /// Access groups.
        access_groups, AccessGroups, AccessGroup
    );
    listing!(
        /// File systems.
        fs, Fs, FileSystem
    );
    listing!(
        /// NFS exports.
        exports, Exports, NfsExport
    );
    listing!(
        /// Target ports.
        target_ports, TargetPorts, TargetPort
    );

    /// Snapshots of `fs`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn fs_snapshots(&mut self, fs: &FileSystem) -> Outcome<Vec<FsSnapshot>> {
        self.invoke(&ops::FsSnapshots {
            fs: fs.clone(),
            flags: 0,
        })
    }

    /// Polls a job once.
    ///
    /// # Errors
    ///
    /// The job's failure on the first poll that observes it; `NotFoundJob`
    /// for unknown ids.
    pub fn job_status(&mut self, job: &JobId) -> Outcome<JobProgress> {
        self.invoke(&ops::JobStatus {
            job_id: job.clone(),
            flags: 0,
        })
    }

    /// Releases a job's resources.
    ///
    /// # Errors
    ///
    /// `NotFoundJob` for unknown ids.
    pub fn job_free(&mut self, job: &JobId) -> Outcome<()> {
        self.invoke(&ops::JobFree {
            job_id: job.clone(),
            flags: 0,
        })
    }

    /// Polls a volume-producing job once.
    ///
    /// # Errors
    ///
    /// As for [`Client::job_result`].
    pub fn job_status_volume(&mut self, job: &JobId) -> Outcome<(JobStatus, u8, Option<Volume>)> {
        self.job_result(job)
    }

    /// Polls a file-system-producing job once.
    ///
    /// # Errors
    ///
    /// As for [`Client::job_result`].
    pub fn job_status_fs(&mut self, job: &JobId) -> Outcome<(JobStatus, u8, Option<FileSystem>)> {
        self.job_result(job)
    }

    /// Polls a snapshot-producing job once.
    ///
    /// # Errors
    ///
    /// As for [`Client::job_result`].
    pub fn job_status_fs_snapshot(
        &mut self,
        job: &JobId,
    ) -> Outcome<(JobStatus, u8, Option<FsSnapshot>)> {
        self.job_result(job)
    }

    /// Creates a volume in `pool`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_create(
        &mut self,
        pool: &Pool,
        volume_name: &str,
        size_bytes: u64,
        provisioning: Provisioning,
    ) -> Outcome<JobOr<Volume>> {
        self.invoke(&ops::VolumeCreate {
            pool: pool.clone(),
            volume_name: volume_name.to_owned(),
            size_bytes,
            provisioning,
            flags: 0,
        })
    }

    /// Grows or shrinks `volume`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_resize(&mut self, volume: &Volume, new_size_bytes: u64) -> Outcome<JobOr<Volume>> {
        self.invoke(&ops::VolumeResize {
            volume: volume.clone(),
            new_size_bytes,
            flags: 0,
        })
    }

    /// Deletes `volume`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_delete(&mut self, volume: &Volume) -> Outcome<Option<JobId>> {
        self.invoke(&ops::VolumeDelete {
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// Replicates `source` into `pool`, or into its own pool when `None`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_replicate(
        &mut self,
        pool: Option<&Pool>,
        rep_type: ReplicationType,
        source: &Volume,
        name: &str,
    ) -> Outcome<JobOr<Volume>> {
        self.invoke(&ops::VolumeReplicate {
            pool: pool.cloned(),
            rep_type,
            volume_src: source.clone(),
            name: name.to_owned(),
            flags: 0,
        })
    }

    /// Brings `volume` online.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_enable(&mut self, volume: &Volume) -> Outcome<()> {
        self.invoke(&ops::VolumeEnable {
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// Takes `volume` offline.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_disable(&mut self, volume: &Volume) -> Outcome<()> {
        self.invoke(&ops::VolumeDisable {
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// Grants `access_group` access to `volume`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_mask(&mut self, access_group: &AccessGroup, volume: &Volume) -> Outcome<()> {
        self.invoke(&ops::VolumeMask {
            access_group: access_group.clone(),
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// Revokes `access_group`'s access to `volume`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_unmask(&mut self, access_group: &AccessGroup, volume: &Volume) -> Outcome<()> {
        self.invoke(&ops::VolumeUnmask {
            access_group: access_group.clone(),
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// RAID layout behind `volume`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_raid_info(&mut self, volume: &Volume) -> Outcome<RaidInfo> {
        self.invoke(&ops::VolumeRaidInfo {
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// Reports whether replicas still depend on `volume`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_child_dependency(&mut self, volume: &Volume) -> Outcome<bool> {
        self.invoke(&ops::VolumeChildDependency {
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// Breaks every replica's dependency on `volume`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volume_child_dependency_rm(&mut self, volume: &Volume) -> Outcome<Option<JobId>> {
        self.invoke(&ops::VolumeChildDependencyRm {
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// Volumes `access_group` can reach.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn volumes_accessible_by_access_group(
        &mut self,
        access_group: &AccessGroup,
    ) -> Outcome<Vec<Volume>> {
        self.invoke(&ops::VolumesAccessibleByAccessGroup {
            access_group: access_group.clone(),
            flags: 0,
        })
    }

    /// Access groups granted `volume`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn access_groups_granted_to_volume(&mut self, volume: &Volume) -> Outcome<Vec<AccessGroup>> {
        self.invoke(&ops::AccessGroupsGrantedToVolume {
            volume: volume.clone(),
            flags: 0,
        })
    }

    /// Creates an access group holding one initiator.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn access_group_create(
        &mut self,
        name: &str,
        init_id: &str,
        init_type: InitiatorType,
        system: &System,
    ) -> Outcome<AccessGroup> {
        self.invoke(&ops::AccessGroupCreate {
            name: name.to_owned(),
            init_id: init_id.to_owned(),
            init_type,
            system: system.clone(),
            flags: 0,
        })
    }

    /// Deletes `access_group`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn access_group_delete(&mut self, access_group: &AccessGroup) -> Outcome<()> {
        self.invoke(&ops::AccessGroupDelete {
            access_group: access_group.clone(),
            flags: 0,
        })
    }

    /// Adds an initiator to `access_group`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn access_group_initiator_add(
        &mut self,
        access_group: &AccessGroup,
        init_id: &str,
        init_type: InitiatorType,
    ) -> Outcome<AccessGroup> {
        self.invoke(&ops::AccessGroupInitiatorAdd {
            access_group: access_group.clone(),
            init_id: init_id.to_owned(),
            init_type,
            flags: 0,
        })
    }

    /// Removes an initiator from `access_group`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn access_group_initiator_delete(
        &mut self,
        access_group: &AccessGroup,
        init_id: &str,
        init_type: InitiatorType,
    ) -> Outcome<AccessGroup> {
        self.invoke(&ops::AccessGroupInitiatorDelete {
            access_group: access_group.clone(),
            init_id: init_id.to_owned(),
            init_type,
            flags: 0,
        })
    }

    /// Sets iSCSI CHAP credentials for `init_id`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn iscsi_chap_auth(
        &mut self,
        init_id: &str,
        inbound: Option<(&str, &str)>,
        outbound: Option<(&str, &str)>,
    ) -> Outcome<()> {
        self.invoke(&ops::IscsiChapAuth {
            init_id: init_id.to_owned(),
            in_user: inbound.map(|(user, _)| user.to_owned()),
            in_password: inbound.map(|(_, password)| password.to_owned()),
            out_user: outbound.map(|(user, _)| user.to_owned()),
            out_password: outbound.map(|(_, password)| password.to_owned()),
            flags: 0,
        })
    }

    /// Creates a file system in `pool`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn fs_create(
        &mut self,
        pool: &Pool,
        name: &str,
        size_bytes: u64,
    ) -> Outcome<JobOr<FileSystem>> {
        self.invoke(&ops::FsCreate {
            pool: pool.clone(),
            name: name.to_owned(),
            size_bytes,
            flags: 0,
        })
    }

    /// Grows or shrinks `fs`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn fs_resize(&mut self, fs: &FileSystem, new_size_bytes: u64) -> Outcome<JobOr<FileSystem>> {
        self.invoke(&ops::FsResize {
            fs: fs.clone(),
            new_size_bytes,
            flags: 0,
        })
    }

    /// Deletes `fs`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn fs_delete(&mut self, fs: &FileSystem) -> Outcome<Option<JobId>> {
        self.invoke(&ops::FsDelete {
            fs: fs.clone(),
            flags: 0,
        })
    }

    /// Clones `source`, optionally from one of its snapshots.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn fs_clone(
        &mut self,
        source: &FileSystem,
        dest_fs_name: &str,
        snapshot: Option<&FsSnapshot>,
    ) -> Outcome<JobOr<FileSystem>> {
        self.invoke(&ops::FsClone {
            src_fs: source.clone(),
            dest_fs_name: dest_fs_name.to_owned(),
            snapshot: snapshot.cloned(),
            flags: 0,
        })
    }

    /// Snapshots `fs`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn fs_snapshot_create(
        &mut self,
        fs: &FileSystem,
        snapshot_name: &str,
    ) -> Outcome<JobOr<FsSnapshot>> {
        self.invoke(&ops::FsSnapshotCreate {
            fs: fs.clone(),
            snapshot_name: snapshot_name.to_owned(),
            flags: 0,
        })
    }

    /// Deletes `snapshot` of `fs`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn fs_snapshot_delete(
        &mut self,
        fs: &FileSystem,
        snapshot: &FsSnapshot,
    ) -> Outcome<Option<JobId>> {
        self.invoke(&ops::FsSnapshotDelete {
            fs: fs.clone(),
            snapshot: snapshot.clone(),
            flags: 0,
        })
    }

    /// Exports a file system over NFS.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn export_fs(&mut self, request: &ops::ExportFs) -> Outcome<NfsExport> {
        self.invoke(request)
    }

    /// Removes `export`.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn export_remove(&mut self, export: &NfsExport) -> Outcome<()> {
        self.invoke(&ops::ExportRemove {
            export: export.clone(),
            flags: 0,
        })
    }

    /// NFS authentication types the plugin accepts.
    ///
    /// # Errors
    ///
    /// As for [`Client::invoke`].
    pub fn export_auth(&mut self) -> Outcome<Vec<String>> {
        self.invoke(&ops::ExportAuth::default())
    }
}
