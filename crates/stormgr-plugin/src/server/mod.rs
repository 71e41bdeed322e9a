//! Unix socket server hosting one plugin.
//!
//! The server binds `<root>/<scheme>`, accepts connections on a background
//! thread and serves each connection on its own thread with a fresh plugin
//! instance, so sessions never share state.

mod errors;

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{Plugin, Session};

pub use errors::ListenerError;

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Bound plugin socket that has not started accepting yet.
#[derive(Debug)]
pub struct PluginServer {
    path: PathBuf,
    listener: UnixListener,
}

impl PluginServer {
    /// Binds the socket at `path`, creating its directory if needed.
    ///
    /// A stale socket left by a dead process is removed; a socket another
    /// process still answers on is refused.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] describing the failed step.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, ListenerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ListenerError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let listener = bind_unix(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            listener,
        })
    }

    /// Socket path being served.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Starts accepting connections; each one gets a plugin from `factory`.
    ///
    /// # Errors
    ///
    /// Fails if the listener cannot be made non-blocking or the accept
    /// thread cannot be spawned. The socket file is removed on failure.
    pub fn start<F, P>(self, factory: F) -> Result<ServerHandle, ListenerError>
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Plugin,
    {
        if let Err(source) = self.listener.set_nonblocking(true) {
            remove_socket(&self.path);
            return Err(ListenerError::NonBlocking { source });
        }
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let path = self.path.clone();
        let factory = Arc::new(factory);
        let handle = thread::Builder::new()
            .name("stormgr-accept".to_owned())
            .spawn(move || run_accept_loop(&self, &shutdown_flag, &factory))
            .map_err(|source| {
                remove_socket(&path);
                ListenerError::Spawn { source }
            })?;
        Ok(ServerHandle {
            path,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to a running server.
#[derive(Debug)]
pub struct ServerHandle {
    path: PathBuf,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Socket path being served.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Asks the accept loop to stop. Sessions already running finish on
    /// their own.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept loop to exit; the socket file is gone once
    /// this returns.
    ///
    /// # Errors
    ///
    /// [`ListenerError::ThreadPanic`] if the accept thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop<F, P>(server: &PluginServer, shutdown: &AtomicBool, factory: &Arc<F>)
where
    F: Fn() -> P + Send + Sync + 'static,
    P: Plugin,
{
    info!(
        target: SERVER_TARGET,
        path = %server.path.display(),
        "plugin socket listening"
    );
    let sessions = AtomicU64::new(0);
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept(&server.listener) {
            Ok(Some(stream)) => {
                last_error = None;
                let number = sessions.fetch_add(1, Ordering::Relaxed);
                spawn_session(stream, number, Arc::clone(factory));
            }
            Ok(None) => thread::sleep(ACCEPT_BACKOFF),
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(target: SERVER_TARGET, error = %error, "accept failed");
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    remove_socket(&server.path);
    info!(target: SERVER_TARGET, "plugin socket closed");
}

fn spawn_session<F, P>(stream: UnixStream, number: u64, factory: Arc<F>)
where
    F: Fn() -> P + Send + Sync + 'static,
    P: Plugin,
{
    let spawned = thread::Builder::new()
        .name(format!("stormgr-session-{number}"))
        .spawn(move || {
            debug!(target: SERVER_TARGET, session = number, "session started");
            match Session::new(factory()).serve(stream) {
                Ok(()) => debug!(target: SERVER_TARGET, session = number, "session ended"),
                Err(error) => warn!(
                    target: SERVER_TARGET,
                    session = number,
                    error = %error,
                    "session ended abnormally"
                ),
            }
        });
    if let Err(error) = spawned {
        warn!(target: SERVER_TARGET, error = %error, "failed to spawn session thread");
    }
}

fn accept(listener: &UnixListener) -> Result<Option<UnixStream>, io::Error> {
    match listener.accept() {
        Ok((stream, _)) => {
            stream.set_nonblocking(false)?;
            Ok(Some(stream))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    let display = || path.display().to_string();
    if path.exists() {
        let metadata = fs::symlink_metadata(path).map_err(|source| ListenerError::Metadata {
            path: display(),
            source,
        })?;
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::NotSocket { path: display() });
        }
        match UnixStream::connect(path) {
            Ok(_live) => return Err(ListenerError::InUse { path: display() }),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                ) =>
            {
                debug!(target: SERVER_TARGET, path = %path.display(), "removing stale socket");
                fs::remove_file(path).map_err(|source| ListenerError::Cleanup {
                    path: display(),
                    source,
                })?;
            }
            Err(source) => {
                return Err(ListenerError::Probe {
                    path: display(),
                    source,
                });
            }
        }
    }
    UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        path: display(),
        source,
    })
}

fn remove_socket(path: &Path) {
    if let Err(error) = fs::remove_file(path)
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: SERVER_TARGET,
            error = %error,
            path = %path.display(),
            "failed to remove plugin socket"
        );
    }
}
