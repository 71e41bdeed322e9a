//! Resolution of plugin URIs to listening sockets.
//!
//! Every plugin process listens on `<root>/<scheme>`. A missing socket is
//! reported in two tiers: when nothing under the root answers at all the
//! plugin daemons are not running, otherwise the requested plugin is simply
//! not installed.

mod errors;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use socket2::{Domain, SockAddr, Socket, Type};
use stormgr_config::Config;
use stormgr_ipc::{
    CONNECT_TIMEOUT, Operation, PluginDescription, Transport, WireValue, encode_arguments, ops,
};
use stormgr_types::{StorageError, StorageUri};
use tracing::debug;

pub use errors::LocatorError;

const LOCATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::locator");

const LIVENESS_TIMEOUT: Duration = Duration::from_secs(1);

/// Maps plugin schemes to sockets under one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    root: PathBuf,
}

impl Locator {
    /// Creates a locator over `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a locator over the configured socket root.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.uds_path().as_std_path())
    }

    /// Directory searched for plugin sockets.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Socket path a plugin named `plugin` would listen on.
    #[must_use]
    pub fn socket_path(&self, plugin: &str) -> PathBuf {
        self.root.join(plugin)
    }

    /// Finds the socket serving `uri`'s plugin.
    ///
    /// # Errors
    ///
    /// [`LocatorError::PluginNotExist`] when other plugins are running but
    /// this one is not, [`LocatorError::DaemonNotRunning`] when nothing under
    /// the root answers.
    pub fn resolve(&self, uri: &StorageUri) -> Result<PathBuf, LocatorError> {
        let path = self.socket_path(uri.plugin());
        if path.exists() {
            debug!(target: LOCATOR_TARGET, path = %path.display(), "resolved plugin socket");
            return Ok(path);
        }
        if self.is_daemon_running()? {
            Err(LocatorError::PluginNotExist {
                plugin: uri.plugin().to_owned(),
                path: path.display().to_string(),
            })
        } else {
            Err(self.not_running())
        }
    }

    /// Every file under the root, recursively, sorted by path.
    ///
    /// A missing root yields an empty list.
    ///
    /// # Errors
    ///
    /// [`LocatorError::Scan`] if a directory cannot be listed.
    pub fn plugins(&self) -> Result<Vec<PathBuf>, LocatorError> {
        let mut found = Vec::new();
        if !self.root.exists() {
            return Ok(found);
        }
        collect(&self.root, &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Reports whether any socket under the root accepts connections.
    ///
    /// Sockets that refuse or fail a connection count as not running.
    ///
    /// # Errors
    ///
    /// [`LocatorError::Scan`] when the root cannot be scanned.
    pub fn is_daemon_running(&self) -> Result<bool, LocatorError> {
        Ok(self.plugins()?.iter().any(|path| is_live(path)))
    }

    /// Describes every running plugin as `"<description><separator><version>"`.
    ///
    /// Plugins are queried without registering, in socket path order.
    /// Sockets that cannot be connected to are skipped.
    ///
    /// # Errors
    ///
    /// `DaemonNotRunning` when no plugin answers; otherwise the first error
    /// raised while querying a live plugin.
    pub fn available_plugins(&self, separator: &str) -> Result<Vec<String>, StorageError> {
        let mut descriptions = Vec::new();
        for path in self.plugins()? {
            if !is_live(&path) {
                continue;
            }
            let info = describe(&path)?;
            descriptions.push(format!("{}{separator}{}", info.description, info.version));
        }
        if descriptions.is_empty() {
            return Err(self.not_running().into());
        }
        Ok(descriptions)
    }

    fn not_running(&self) -> LocatorError {
        LocatorError::DaemonNotRunning {
            root: self.root.display().to_string(),
        }
    }
}

fn collect(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), LocatorError> {
    let scan_error = |source| LocatorError::Scan {
        path: dir.display().to_string(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        let path = entry.path();
        if entry.file_type().map_err(scan_error)?.is_dir() {
            collect(&path, found)?;
        } else {
            found.push(path);
        }
    }
    Ok(())
}

fn is_live(path: &Path) -> bool {
    match connect_unix(path) {
        Ok(()) => true,
        Err(error) => {
            debug!(
                target: LOCATOR_TARGET,
                path = %path.display(),
                error = %error,
                "socket does not accept connections"
            );
            false
        }
    }
}

fn connect_unix(path: &Path) -> io::Result<()> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, LIVENESS_TIMEOUT)
}

fn describe(path: &Path) -> Result<PluginDescription, StorageError> {
    let mut transport = Transport::connect(path, CONNECT_TIMEOUT)?;
    let arguments = encode_arguments(&ops::PluginInfo::default())?;
    let reply = transport.send_request(ops::PluginInfo::METHOD, arguments)?;
    transport.close();
    PluginDescription::from_wire(reply)
}

#[cfg(test)]
mod tests;
