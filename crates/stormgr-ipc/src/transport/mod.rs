//! Client side of one plugin connection.
//!
//! A [`Transport`] owns a connected Unix stream and performs strictly
//! sequential request/response exchanges. Any failure of the byte stream or
//! of the envelope poisons the connection: the stream is dropped and every
//! later call fails with a transport error. Faults reported by the plugin do
//! not poison; they are ordinary error replies.

use std::net::Shutdown;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};
use socket2::{Domain, SockAddr, Socket, Type};
use stormgr_types::StorageError;
use tracing::{debug, warn};

use crate::frame::{FrameError, Framed};
use crate::message::{Request, Response};

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Default bound on establishing a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

enum State {
    Open(Framed<UnixStream>),
    Poisoned { reason: String },
    Closed,
}

/// Synchronous request/response channel to one plugin.
pub struct Transport {
    state: State,
    next_id: u64,
    endpoint: PathBuf,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::Open(_) => "open",
            State::Poisoned { .. } => "poisoned",
            State::Closed => "closed",
        };
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint)
            .field("state", &state)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Transport {
    /// Connects to the plugin socket at `path`.
    ///
    /// # Errors
    ///
    /// Fails with a transport error when the socket is absent, refuses the
    /// connection or does not answer within `connect_timeout`.
    pub fn connect(path: &Path, connect_timeout: Duration) -> Result<Self, StorageError> {
        let stream = connect_unix(path, connect_timeout).map_err(|source| {
            StorageError::transport(format!(
                "failed to connect to plugin socket {}: {source}",
                path.display()
            ))
        })?;
        debug!(
            target: TRANSPORT_TARGET,
            endpoint = %path.display(),
            "connected to plugin socket"
        );
        Ok(Self::from_stream(stream, path))
    }

    /// Wraps an already connected stream.
    #[must_use]
    pub fn from_stream(stream: UnixStream, endpoint: impl Into<PathBuf>) -> Self {
        Self {
            state: State::Open(Framed::new(stream)),
            next_id: 1,
            endpoint: endpoint.into(),
        }
    }

    /// Bounds every later read and write; `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Fails with a transport error when the connection is not open or the
    /// socket rejects the option.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), StorageError> {
        let timeout = timeout.filter(|bound| !bound.is_zero());
        let stream = self.open_stream()?;
        stream
            .get_ref()
            .set_read_timeout(timeout)
            .and_then(|()| stream.get_ref().set_write_timeout(timeout))
            .map_err(|source| StorageError::transport(format!("failed to set timeout: {source}")))
    }

    /// Socket path this transport was connected to.
    #[must_use]
    pub fn endpoint(&self) -> &Path {
        &self.endpoint
    }

    /// Reports whether calls can still be issued.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Sends one request and waits for its reply.
    ///
    /// # Errors
    ///
    /// Returns the plugin's fault verbatim when it replies with an error.
    /// Stream failures surface as transport errors and envelope violations
    /// as protocol errors; both poison the connection.
    pub fn send_request(
        &mut self,
        method: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, StorageError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let request = Request {
            method: method.to_owned(),
            arguments,
            id,
        };
        debug!(target: TRANSPORT_TARGET, method, id, "sending request");

        let exchanged = {
            let framed = self.open_stream()?;
            exchange(framed, &request)
        };
        let response = match exchanged {
            Ok(response) => response,
            Err(error) => return Err(self.poison(method, error)),
        };
        if response.id != id {
            let error = FrameError::envelope(format!(
                "response id {} does not match request id {id}",
                response.id
            ));
            return Err(self.poison(method, error));
        }
        response.outcome.map_err(StorageError::from)
    }

    /// Closes the connection. Closing twice is a no-op.
    pub fn close(&mut self) {
        if let State::Open(framed) = std::mem::replace(&mut self.state, State::Closed) {
            let stream = framed.into_inner();
            if let Err(error) = stream.shutdown(Shutdown::Both) {
                debug!(
                    target: TRANSPORT_TARGET,
                    error = %error,
                    "socket shutdown failed during close"
                );
            }
        }
    }

    fn open_stream(&mut self) -> Result<&mut Framed<UnixStream>, StorageError> {
        match &mut self.state {
            State::Open(framed) => Ok(framed),
            State::Poisoned { reason } => Err(StorageError::transport(format!(
                "connection unusable after earlier failure: {reason}"
            ))),
            State::Closed => Err(StorageError::transport("connection closed")),
        }
    }

    fn poison(&mut self, method: &str, error: FrameError) -> StorageError {
        warn!(
            target: TRANSPORT_TARGET,
            method,
            error = %error,
            "connection poisoned"
        );
        self.state = State::Poisoned {
            reason: error.to_string(),
        };
        StorageError::from(error)
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

fn exchange(framed: &mut Framed<UnixStream>, request: &Request) -> Result<Response, FrameError> {
    framed.send(&request.to_value()?)?;
    Response::from_value(framed.recv()?)
}

fn connect_unix(path: &Path, timeout: Duration) -> std::io::Result<UnixStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    Ok(UnixStream::from(OwnedFd::from(socket)))
}
