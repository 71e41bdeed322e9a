//! [`Plugin`] implementation over the simulated array.
//!
//! Mutations are validated and applied synchronously. Their results are then
//! handed out through the job registry, so clients exercise the same polling
//! path a slow array would force on them. With `job_steps=0` in the URI
//! every mutation completes inline instead.

use serde_json::Value;
use stormgr_ipc::{JobOr, JobProgress, PluginDescription, WireValue, ops};
use stormgr_plugin::{JobRegistry, Plugin, PluginResult};
use stormgr_types::{
    AccessGroup, AdminState, Capabilities, Disk, FileSystem, FsSnapshot, JobId, NfsExport, Pool,
    RaidInfo, StorageError, StorageUri, System, TargetPort, Volume, search,
};
use tracing::{debug, info};

use crate::array::{EXPORT_AUTH, ExportRequest, SharedArray};

const PLUGIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::plugin");

/// Polls a job needs before completing when the URI does not say.
pub const DEFAULT_JOB_STEPS: u32 = 1;

/// Default array-side timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 30_000;

/// One session's view of the simulated array.
#[derive(Debug)]
pub struct SimPlugin {
    array: SharedArray,
    jobs: JobRegistry,
    job_steps: u32,
    timeout_ms: u32,
}

impl SimPlugin {
    /// Creates a session over `array`.
    #[must_use]
    pub fn with_array(array: SharedArray) -> Self {
        Self {
            array,
            jobs: JobRegistry::new(),
            job_steps: DEFAULT_JOB_STEPS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Polls each job takes before completing; zero means synchronous.
    #[must_use]
    pub const fn job_steps(&self) -> u32 {
        self.job_steps
    }

    // Hands a finished mutation back either inline or through a job.
    fn deliver<T: WireValue>(&mut self, value: T) -> PluginResult<JobOr<T>> {
        if self.job_steps == 0 {
            return Ok(JobOr::Done(value));
        }
        let encoded = value.to_wire()?;
        let id = self.jobs.submit_staged(self.job_steps, Ok(encoded));
        debug!(target: PLUGIN_TARGET, job = %id, "job started");
        Ok(JobOr::Job(id))
    }

    fn deliver_unit(&mut self) -> Option<JobId> {
        (self.job_steps > 0).then(|| self.jobs.submit_staged(self.job_steps, Ok(Value::Null)))
    }
}

fn parse_job_steps(uri: &StorageUri) -> PluginResult<u32> {
    uri.query("job_steps").map_or(Ok(DEFAULT_JOB_STEPS), |raw| {
        raw.parse().map_err(|_| {
            StorageError::invalid_argument(format!(
                "job_steps must be a non-negative integer, got {raw:?}"
            ))
        })
    })
}

impl Plugin for SimPlugin {
    fn plugin_register(&mut self, request: ops::PluginRegister) -> PluginResult<()> {
        let uri = StorageUri::parse(&request.uri)?;
        self.job_steps = parse_job_steps(&uri)?;
        self.timeout_ms = request.timeout;
        info!(
            target: PLUGIN_TARGET,
            uri = %uri,
            job_steps = self.job_steps,
            timeout_ms = self.timeout_ms,
            "session registered"
        );
        Ok(())
    }

    fn plugin_unregister(&mut self, _request: ops::PluginUnregister) -> PluginResult<()> {
        debug!(target: PLUGIN_TARGET, open_jobs = self.jobs.len(), "session unregistered");
        Ok(())
    }

    fn plugin_info(&mut self, _request: ops::PluginInfo) -> PluginResult<PluginDescription> {
        Ok(PluginDescription {
            description: "Simulated storage array".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        })
    }

    fn time_out_set(&mut self, request: ops::TimeOutSet) -> PluginResult<()> {
        self.timeout_ms = request.ms;
        Ok(())
    }

    fn time_out_get(&mut self, _request: ops::TimeOutGet) -> PluginResult<u32> {
        Ok(self.timeout_ms)
    }

    fn capabilities(&mut self, request: ops::Capabilities) -> PluginResult<Capabilities> {
        self.array.lock()?.capabilities(&request.system.id)
    }

    fn systems(&mut self, _request: ops::Systems) -> PluginResult<Vec<System>> {
        Ok(self.array.lock()?.systems())
    }

    fn job_status(&mut self, request: ops::JobStatus) -> PluginResult<JobProgress> {
        self.jobs.status(&request.job_id)
    }

    fn job_free(&mut self, request: ops::JobFree) -> PluginResult<()> {
        self.jobs.free(&request.job_id)
    }

    fn pools(&mut self, request: ops::Pools) -> PluginResult<Vec<Pool>> {
        let pools = self.array.lock()?.pools();
        search(
            pools,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn volumes(&mut self, request: ops::Volumes) -> PluginResult<Vec<Volume>> {
        let volumes = self.array.lock()?.volumes();
        search(
            volumes,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn disks(&mut self, request: ops::Disks) -> PluginResult<Vec<Disk>> {
        let disks = self.array.lock()?.disks();
        search(
            disks,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn access_groups(&mut self, request: ops::AccessGroups) -> PluginResult<Vec<AccessGroup>> {
        let groups = self.array.lock()?.access_groups();
        search(
            groups,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn fs(&mut self, request: ops::Fs) -> PluginResult<Vec<FileSystem>> {
        let file_systems = self.array.lock()?.file_systems();
        search(
            file_systems,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn fs_snapshots(&mut self, request: ops::FsSnapshots) -> PluginResult<Vec<FsSnapshot>> {
        self.array.lock()?.fs_snapshots(&request.fs.id)
    }

    fn exports(&mut self, request: ops::Exports) -> PluginResult<Vec<NfsExport>> {
        let exports = self.array.lock()?.exports();
        search(
            exports,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn target_ports(&mut self, request: ops::TargetPorts) -> PluginResult<Vec<TargetPort>> {
        let ports = self.array.lock()?.target_ports();
        search(
            ports,
            request.search_key.as_deref(),
            request.search_value.as_deref(),
        )
    }

    fn volume_create(&mut self, request: ops::VolumeCreate) -> PluginResult<JobOr<Volume>> {
        let volume = self.array.lock()?.volume_create(
            &request.pool.id,
            &request.volume_name,
            request.size_bytes,
            request.provisioning,
        )?;
        info!(target: PLUGIN_TARGET, volume = %volume.id, "volume created");
        self.deliver(volume)
    }

    fn volume_resize(&mut self, request: ops::VolumeResize) -> PluginResult<JobOr<Volume>> {
        let volume = self
            .array
            .lock()?
            .volume_resize(&request.volume.id, request.new_size_bytes)?;
        self.deliver(volume)
    }

    fn volume_delete(&mut self, request: ops::VolumeDelete) -> PluginResult<Option<JobId>> {
        self.array.lock()?.volume_delete(&request.volume.id)?;
        info!(target: PLUGIN_TARGET, volume = %request.volume.id, "volume deleted");
        Ok(self.deliver_unit())
    }

    fn volume_replicate(
        &mut self,
        request: ops::VolumeReplicate,
    ) -> PluginResult<JobOr<Volume>> {
        let replica = self.array.lock()?.volume_replicate(
            request.pool.as_ref().map(|pool| pool.id.as_str()),
            request.rep_type,
            &request.volume_src.id,
            &request.name,
        )?;
        self.deliver(replica)
    }

    fn volume_enable(&mut self, request: ops::VolumeEnable) -> PluginResult<()> {
        self.array
            .lock()?
            .volume_set_state(&request.volume.id, AdminState::Enabled)
    }

    fn volume_disable(&mut self, request: ops::VolumeDisable) -> PluginResult<()> {
        self.array
            .lock()?
            .volume_set_state(&request.volume.id, AdminState::Disabled)
    }

    fn volume_mask(&mut self, request: ops::VolumeMask) -> PluginResult<()> {
        self.array
            .lock()?
            .volume_mask(&request.access_group.id, &request.volume.id)
    }

    fn volume_unmask(&mut self, request: ops::VolumeUnmask) -> PluginResult<()> {
        self.array
            .lock()?
            .volume_unmask(&request.access_group.id, &request.volume.id)
    }

    fn volume_raid_info(&mut self, request: ops::VolumeRaidInfo) -> PluginResult<RaidInfo> {
        self.array.lock()?.volume_raid_info(&request.volume.id)
    }

    fn volume_child_dependency(
        &mut self,
        request: ops::VolumeChildDependency,
    ) -> PluginResult<bool> {
        self.array
            .lock()?
            .volume_child_dependency(&request.volume.id)
    }

    fn volume_child_dependency_rm(
        &mut self,
        request: ops::VolumeChildDependencyRm,
    ) -> PluginResult<Option<JobId>> {
        self.array
            .lock()?
            .volume_child_dependency_rm(&request.volume.id)?;
        Ok(self.deliver_unit())
    }

    fn volumes_accessible_by_access_group(
        &mut self,
        request: ops::VolumesAccessibleByAccessGroup,
    ) -> PluginResult<Vec<Volume>> {
        self.array
            .lock()?
            .volumes_accessible_by_access_group(&request.access_group.id)
    }

    fn access_groups_granted_to_volume(
        &mut self,
        request: ops::AccessGroupsGrantedToVolume,
    ) -> PluginResult<Vec<AccessGroup>> {
        self.array
            .lock()?
            .access_groups_granted_to_volume(&request.volume.id)
    }

    fn access_group_create(
        &mut self,
        request: ops::AccessGroupCreate,
    ) -> PluginResult<AccessGroup> {
        self.array.lock()?.access_group_create(
            &request.name,
            &request.init_id,
            request.init_type,
            &request.system.id,
        )
    }

    fn access_group_delete(&mut self, request: ops::AccessGroupDelete) -> PluginResult<()> {
        self.array
            .lock()?
            .access_group_delete(&request.access_group.id)
    }

    fn access_group_initiator_add(
        &mut self,
        request: ops::AccessGroupInitiatorAdd,
    ) -> PluginResult<AccessGroup> {
        self.array.lock()?.access_group_initiator_add(
            &request.access_group.id,
            &request.init_id,
            request.init_type,
        )
    }

    fn access_group_initiator_delete(
        &mut self,
        request: ops::AccessGroupInitiatorDelete,
    ) -> PluginResult<AccessGroup> {
        self.array.lock()?.access_group_initiator_delete(
            &request.access_group.id,
            &request.init_id,
            request.init_type,
        )
    }

    fn iscsi_chap_auth(&mut self, request: ops::IscsiChapAuth) -> PluginResult<()> {
        self.array.lock()?.iscsi_chap_auth(
            &request.init_id,
            (request.in_user, request.in_password),
            (request.out_user, request.out_password),
        )
    }

    fn fs_create(&mut self, request: ops::FsCreate) -> PluginResult<JobOr<FileSystem>> {
        let fs = self
            .array
            .lock()?
            .fs_create(&request.pool.id, &request.name, request.size_bytes)?;
        info!(target: PLUGIN_TARGET, fs = %fs.id, "file system created");
        self.deliver(fs)
    }

    fn fs_resize(&mut self, request: ops::FsResize) -> PluginResult<JobOr<FileSystem>> {
        let fs = self
            .array
            .lock()?
            .fs_resize(&request.fs.id, request.new_size_bytes)?;
        self.deliver(fs)
    }

    fn fs_delete(&mut self, request: ops::FsDelete) -> PluginResult<Option<JobId>> {
        self.array.lock()?.fs_delete(&request.fs.id)?;
        Ok(self.deliver_unit())
    }

    fn fs_clone(&mut self, request: ops::FsClone) -> PluginResult<JobOr<FileSystem>> {
        let clone = self.array.lock()?.fs_clone(
            &request.src_fs.id,
            &request.dest_fs_name,
            request.snapshot.as_ref().map(|snapshot| snapshot.id.as_str()),
        )?;
        self.deliver(clone)
    }

    fn fs_snapshot_create(
        &mut self,
        request: ops::FsSnapshotCreate,
    ) -> PluginResult<JobOr<FsSnapshot>> {
        let snapshot = self
            .array
            .lock()?
            .fs_snapshot_create(&request.fs.id, &request.snapshot_name)?;
        self.deliver(snapshot)
    }

    fn fs_snapshot_delete(
        &mut self,
        request: ops::FsSnapshotDelete,
    ) -> PluginResult<Option<JobId>> {
        self.array
            .lock()?
            .fs_snapshot_delete(&request.fs.id, &request.snapshot.id)?;
        Ok(self.deliver_unit())
    }

    fn export_fs(&mut self, request: ops::ExportFs) -> PluginResult<NfsExport> {
        let export = ExportRequest {
            path: request.export_path,
            root: request.root_list,
            rw: request.rw_list,
            ro: request.ro_list,
            anon_uid: request.anon_uid,
            anon_gid: request.anon_gid,
            auth: request.auth_type,
            options: request.options,
        };
        self.array.lock()?.export_fs(&request.fs_id, export)
    }

    fn export_remove(&mut self, request: ops::ExportRemove) -> PluginResult<()> {
        self.array.lock()?.export_remove(&request.export.id)
    }

    fn export_auth(&mut self, _request: ops::ExportAuth) -> PluginResult<Vec<String>> {
        Ok(EXPORT_AUTH.iter().map(|&auth| auth.to_owned()).collect())
    }
}

#[cfg(test)]
mod tests;
