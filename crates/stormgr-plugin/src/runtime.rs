//! Process lifecycle shared by the plugin binaries.
//!
//! A plugin process loads its configuration, installs logging, binds
//! `<uds_path>/<scheme>` and serves until told to stop.

use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use stormgr_config::Config;
use thiserror::Error;
use tracing::{error, info};

use crate::shutdown::{ShutdownError, ShutdownSignal, TerminationSignals};
use crate::telemetry::{self, TelemetryError};
use crate::{ListenerError, Plugin, PluginServer};

const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

/// Source of the process configuration.
pub trait ConfigLoader {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Whatever the layered loader reports.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loads defaults, the config file, `STORMGR_*` variables and the process
/// arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Errors that stop a plugin process.
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Logging could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The plugin socket could not be served.
    #[error("plugin socket failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
    /// Waiting for termination failed.
    #[error("shutdown handling failed: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

/// Serves `scheme` until `signal` fires, then stops accepting and removes
/// the socket.
///
/// # Errors
///
/// Returns the first lifecycle step that failed.
pub fn run_with<F, P>(
    scheme: &str,
    factory: F,
    loader: &dyn ConfigLoader,
    signal: &dyn ShutdownSignal,
) -> Result<(), RunError>
where
    F: Fn() -> P + Send + Sync + 'static,
    P: Plugin,
{
    let config = loader
        .load()
        .map_err(|source| RunError::Configuration { source })?;
    telemetry::initialise(&config).map_err(|source| RunError::Telemetry { source })?;

    let socket = config.plugin_socket(scheme);
    let handle = PluginServer::bind(socket.as_std_path())
        .and_then(|server| server.start(factory))
        .map_err(|source| RunError::Listener { source })?;
    info!(target: RUNTIME_TARGET, scheme, socket = %socket, "plugin ready");

    let waited = signal.wait();
    handle.shutdown();
    handle
        .join()
        .map_err(|source| RunError::Listener { source })?;
    info!(target: RUNTIME_TARGET, scheme, "plugin stopped");
    waited.map_err(|source| RunError::Shutdown { source })
}

/// Entry point for plugin binaries.
#[must_use]
pub fn run<F, P>(scheme: &str, factory: F) -> ExitCode
where
    F: Fn() -> P + Send + Sync + 'static,
    P: Plugin,
{
    match run_with(scheme, factory, &SystemConfigLoader, &TerminationSignals) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            // Configuration errors happen before logging is set up.
            if telemetry::initialise(&Config::default()).is_ok() {
                error!(target: RUNTIME_TARGET, scheme, error = %failure, "plugin failed");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
