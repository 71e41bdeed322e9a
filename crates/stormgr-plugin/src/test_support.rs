//! Plugin doubles shared by the unit tests.

use serde_json::Value;
use stormgr_ipc::{JobProgress, PluginDescription, ops};
use stormgr_types::{
    Capabilities, ErrorCode, JobStatus, Pool, StorageError, System, SystemStatus,
};

use crate::{Plugin, PluginResult};

#[derive(Debug, Default)]
pub(crate) struct ProbePlugin {
    pub(crate) registered_uri: Option<String>,
    pub(crate) calls: usize,
}

impl Plugin for ProbePlugin {
    fn plugin_register(&mut self, request: ops::PluginRegister) -> PluginResult<()> {
        self.calls += 1;
        self.registered_uri = Some(request.uri);
        Ok(())
    }

    fn plugin_unregister(&mut self, _request: ops::PluginUnregister) -> PluginResult<()> {
        self.calls += 1;
        Ok(())
    }

    fn plugin_info(&mut self, _request: ops::PluginInfo) -> PluginResult<PluginDescription> {
        Ok(PluginDescription {
            description: "probe".to_owned(),
            version: "1.0".to_owned(),
        })
    }

    fn capabilities(&mut self, _request: ops::Capabilities) -> PluginResult<Capabilities> {
        Ok(Capabilities::new())
    }

    fn systems(&mut self, _request: ops::Systems) -> PluginResult<Vec<System>> {
        self.calls += 1;
        Ok(vec![System {
            id: "sys-1".to_owned(),
            name: "Probe".to_owned(),
            status: SystemStatus::Ok.into(),
            status_info: String::new(),
            plugin_data: None,
        }])
    }

    fn job_status(&mut self, request: ops::JobStatus) -> PluginResult<JobProgress> {
        if request.job_id.as_str() == "done" {
            Ok(JobProgress {
                status: JobStatus::Complete,
                percent: 100,
                result: Value::Null,
            })
        } else {
            Err(StorageError::new(ErrorCode::NotFoundJob, "no such job"))
        }
    }

    fn job_free(&mut self, _request: ops::JobFree) -> PluginResult<()> {
        Ok(())
    }

    fn pools(&mut self, _request: ops::Pools) -> PluginResult<Vec<Pool>> {
        panic!("vendor tool exploded");
    }
}

