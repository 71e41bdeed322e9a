//! Per-connection request routing.
//!
//! A [`Session`] owns one plugin instance for the lifetime of one client
//! connection. Each request is decoded into the operation's argument
//! struct, handed to the plugin and its typed result encoded with the
//! operation's declared shape. Failures the plugin reports travel back as
//! faults; a panic inside the plugin is caught here and reported as a
//! plugin bug so the connection stays usable.

use std::any::Any;
use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};

use serde_json::{Map, Value};
use stormgr_ipc::{
    FrameError, Framed, Operation, Request, Response, WireValue, decode_arguments, ops,
};
use stormgr_types::StorageError;
use tracing::{debug, error, warn};

use crate::Plugin;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Id used when replying to a request whose own id could not be read.
const UNKNOWN_REQUEST_ID: u64 = 0;

/// Routes wire requests to one plugin instance.
#[derive(Debug)]
pub struct Session<P> {
    plugin: P,
}

macro_rules! route {
    ($plugin:expr, $method:expr, $arguments:expr, { $($op:ident => $handler:ident),+ $(,)? }) => {
        match $method {
            $(<ops::$op as Operation>::METHOD => {
                call::<P, ops::$op, _>($plugin, $arguments, P::$handler)
            })+
            other => Err(StorageError::no_support(format!("unknown method {other}"))),
        }
    };
}

impl<P: Plugin> Session<P> {
    /// Wraps a freshly constructed plugin.
    #[must_use]
    pub const fn new(plugin: P) -> Self {
        Self { plugin }
    }

    /// Borrows the plugin.
    #[must_use]
    pub const fn plugin(&self) -> &P {
        &self.plugin
    }

    /// Runs one call and returns the encoded result.
    ///
    /// # Errors
    ///
    /// `NoSupport` for unknown methods, `InvalidArgument` for undecodable
    /// arguments, `PluginBug` for plugin panics or unencodable results, and
    /// whatever the plugin itself reports.
    pub fn dispatch(
        &mut self,
        method: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, StorageError> {
        let plugin = &mut self.plugin;
        route!(plugin, method, arguments, {
            PluginRegister => plugin_register,
            PluginUnregister => plugin_unregister,
            PluginInfo => plugin_info,
            TimeOutSet => time_out_set,
            TimeOutGet => time_out_get,
            Capabilities => capabilities,
            Systems => systems,
            Pools => pools,
            Volumes => volumes,
            Disks => disks,
            AccessGroups => access_groups,
            Fs => fs,
            FsSnapshots => fs_snapshots,
            Exports => exports,
            TargetPorts => target_ports,
            JobStatus => job_status,
            JobFree => job_free,
            VolumeCreate => volume_create,
            VolumeResize => volume_resize,
            VolumeDelete => volume_delete,
            VolumeReplicate => volume_replicate,
            VolumeEnable => volume_enable,
            VolumeDisable => volume_disable,
            VolumeMask => volume_mask,
            VolumeUnmask => volume_unmask,
            VolumeRaidInfo => volume_raid_info,
            VolumeChildDependency => volume_child_dependency,
            VolumeChildDependencyRm => volume_child_dependency_rm,
            VolumesAccessibleByAccessGroup => volumes_accessible_by_access_group,
            AccessGroupsGrantedToVolume => access_groups_granted_to_volume,
            AccessGroupCreate => access_group_create,
            AccessGroupDelete => access_group_delete,
            AccessGroupInitiatorAdd => access_group_initiator_add,
            AccessGroupInitiatorDelete => access_group_initiator_delete,
            IscsiChapAuth => iscsi_chap_auth,
            FsCreate => fs_create,
            FsResize => fs_resize,
            FsDelete => fs_delete,
            FsClone => fs_clone,
            FsSnapshotCreate => fs_snapshot_create,
            FsSnapshotDelete => fs_snapshot_delete,
            ExportFs => export_fs,
            ExportRemove => export_remove,
            ExportAuth => export_auth,
        })
    }

    /// Serves requests from `stream` until the client unregisters or
    /// hangs up.
    ///
    /// A request that cannot be decoded is answered with a protocol fault
    /// and ends the session, since the stream can no longer be trusted.
    ///
    /// # Errors
    ///
    /// Returns the frame error that ended the session abnormally.
    pub fn serve<S: Read + Write>(&mut self, stream: S) -> Result<(), FrameError> {
        let mut framed = Framed::new(stream);
        loop {
            let request = match framed.recv().and_then(Request::from_value) {
                Ok(request) => request,
                Err(FrameError::Closed) => {
                    debug!(target: SESSION_TARGET, "client hung up");
                    return Ok(());
                }
                Err(failure) if failure.is_transport() => return Err(failure),
                Err(failure) => {
                    warn!(target: SESSION_TARGET, error = %failure, "undecodable request");
                    let fault = StorageError::from(failure.clone());
                    framed.send(&Response::failure(UNKNOWN_REQUEST_ID, &fault).to_value()?)?;
                    return Err(failure);
                }
            };

            let Request {
                method,
                arguments,
                id,
            } = request;
            let outcome = self.dispatch(&method, arguments);
            let unregistered = method == ops::PluginUnregister::METHOD && outcome.is_ok();
            let response = match outcome {
                Ok(result) => Response::success(id, result),
                Err(failure) => {
                    debug!(
                        target: SESSION_TARGET,
                        method = %method,
                        code = %failure.code(),
                        "call failed"
                    );
                    Response::failure(id, &failure)
                }
            };
            framed.send(&response.to_value()?)?;
            if unregistered {
                debug!(target: SESSION_TARGET, "client unregistered");
                return Ok(());
            }
        }
    }
}

fn call<P, O, F>(
    plugin: &mut P,
    arguments: Map<String, Value>,
    handler: F,
) -> Result<Value, StorageError>
where
    O: Operation,
    F: FnOnce(&mut P, O) -> Result<O::Output, StorageError>,
{
    let request = decode_arguments::<O>(arguments)?;
    let outcome =
        panic::catch_unwind(AssertUnwindSafe(|| handler(plugin, request))).map_err(|payload| {
            let reason = panic_reason(payload.as_ref());
            error!(target: SESSION_TARGET, method = O::METHOD, reason, "plugin panicked");
            StorageError::plugin_bug(format!("plugin panicked during {}: {reason}", O::METHOD))
        })?;
    outcome?.to_wire()
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}

#[cfg(test)]
mod tests;
