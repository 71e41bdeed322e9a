//! Registered session with one plugin.
//!
//! [`Client::invoke`] is the single path every call takes: arguments are
//! checked locally, encoded from the operation struct, sent, and the reply
//! is decoded against the operation's declared result shape. The typed
//! methods in this module are thin wrappers around it.

mod methods;

use std::thread;
use std::time::{Duration, Instant};

use stormgr_config::Config;
use stormgr_ipc::{CONNECT_TIMEOUT, Operation, Transport, WireValue, encode_arguments, ops};
use stormgr_types::{
    Capabilities, Capability, ErrorCode, JobId, JobStatus, StorageError, StorageUri, System,
};
use tracing::{debug, info, warn};

use crate::Locator;

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

/// Checks `capability` against an already fetched set.
///
/// # Errors
///
/// `NoSupport` naming the capability when it is absent.
pub fn ensure(capabilities: &Capabilities, capability: Capability) -> Result<(), StorageError> {
    if capabilities.supports(capability) {
        Ok(())
    } else {
        Err(StorageError::no_support(format!(
            "capability {capability} is not supported"
        )))
    }
}

/// Session with one plugin process.
#[derive(Debug)]
pub struct Client {
    transport: Transport,
    uri: StorageUri,
    timeout: Duration,
}

impl Client {
    /// Resolves `uri` through `locator`, connects and registers.
    ///
    /// `timeout_ms` bounds every request and is passed to the plugin; zero
    /// waits indefinitely.
    ///
    /// # Errors
    ///
    /// Locator failures (`DaemonNotRunning`, `PluginNotExist`), connection
    /// failures, or the plugin's registration error verbatim.
    pub fn connect(
        locator: &Locator,
        uri: &str,
        password: Option<&str>,
        timeout_ms: u32,
    ) -> Result<Self, StorageError> {
        let uri = StorageUri::parse(uri)?;
        let path = locator.resolve(&uri)?;
        let transport = Transport::connect(&path, CONNECT_TIMEOUT)?;
        Self::register(transport, uri, password, timeout_ms)
    }

    /// Connects using the socket root and timeout from `config`.
    ///
    /// # Errors
    ///
    /// As for [`Client::connect`].
    pub fn from_config(
        config: &Config,
        uri: &str,
        password: Option<&str>,
    ) -> Result<Self, StorageError> {
        Self::connect(
            &Locator::from_config(config),
            uri,
            password,
            config.timeout_ms(),
        )
    }

    /// Registers a session over an already connected transport.
    ///
    /// The transport is closed when registration fails.
    ///
    /// # Errors
    ///
    /// The plugin's registration error, unchanged.
    pub fn register(
        transport: Transport,
        uri: StorageUri,
        password: Option<&str>,
        timeout_ms: u32,
    ) -> Result<Self, StorageError> {
        let mut client = Self {
            transport,
            uri,
            timeout: Duration::from_millis(u64::from(timeout_ms)),
        };
        client.transport.set_timeout(Some(client.timeout))?;
        let request = ops::PluginRegister {
            uri: client.uri.as_str().to_owned(),
            password: password.map(str::to_owned),
            timeout: timeout_ms,
            flags: 0,
        };
        if let Err(error) = client.invoke(&request) {
            warn!(
                target: CLIENT_TARGET,
                plugin = client.uri.plugin(),
                error = %error,
                "plugin registration failed"
            );
            client.transport.close();
            return Err(error);
        }
        info!(target: CLIENT_TARGET, plugin = client.uri.plugin(), "plugin session registered");
        Ok(client)
    }

    /// URI the session was registered with.
    #[must_use]
    pub const fn uri(&self) -> &StorageUri {
        &self.uri
    }

    /// Bound applied to each request.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Reports whether the session can still issue calls.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Sends one operation and decodes its reply.
    ///
    /// # Errors
    ///
    /// Local validation failures (such as `UnsupportedSearchKey`) before
    /// anything is sent; transport and protocol errors; the plugin's fault
    /// verbatim; `PluginBug` when the reply does not have the declared
    /// shape.
    pub fn invoke<O: Operation>(&mut self, operation: &O) -> Result<O::Output, StorageError> {
        operation.validate()?;
        let arguments = encode_arguments(operation)?;
        let reply = self.transport.send_request(O::METHOD, arguments)?;
        O::Output::from_wire(reply)
    }

    /// Fails with `NoSupport` unless `system` supports `capability`.
    ///
    /// # Errors
    ///
    /// `NoSupport`, or any error raised fetching the capabilities.
    pub fn require(&mut self, system: &System, capability: Capability) -> Result<(), StorageError> {
        let capabilities = self.capabilities(system)?;
        ensure(&capabilities, capability)
    }

    /// Polls `job` every `interval` until it finishes, then frees it.
    ///
    /// Returns the job's result decoded as `T`; use `()` for jobs that
    /// carry none. The wait is bounded by the session timeout.
    ///
    /// # Errors
    ///
    /// The job's failure, `Timeout` when the session timeout elapses first,
    /// `PluginBug` when the completed job's result is missing or of the
    /// wrong shape, or any error raised while polling.
    pub fn wait_for_job<T: WireValue>(
        &mut self,
        job: &JobId,
        interval: Duration,
    ) -> Result<T, StorageError> {
        let deadline = (!self.timeout.is_zero()).then(|| Instant::now() + self.timeout);
        loop {
            let progress = match self.job_status(job) {
                Ok(progress) => progress,
                Err(error) => {
                    self.release(job);
                    return Err(error);
                }
            };
            match progress.status {
                JobStatus::Complete => {
                    let result = progress.into_result::<T>();
                    self.job_free(job)?;
                    return result;
                }
                JobStatus::Error => {
                    self.release(job);
                    return Err(StorageError::plugin_bug(format!(
                        "job {job} failed without reporting an error"
                    )));
                }
                JobStatus::InProgress => {
                    debug!(target: CLIENT_TARGET, job = %job, percent = progress.percent, "job running");
                }
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(StorageError::new(
                    ErrorCode::Timeout,
                    format!("job {job} did not finish within {:?}", self.timeout),
                ));
            }
            thread::sleep(interval);
        }
    }

    /// Polls `job` once and decodes its result as `T`.
    ///
    /// # Errors
    ///
    /// The job's failure on the first poll that observes it, `NotFoundJob`
    /// for unknown or freed ids, or `PluginBug` for a result of the wrong
    /// shape.
    pub fn job_result<T: WireValue>(
        &mut self,
        job: &JobId,
    ) -> Result<(JobStatus, u8, Option<T>), StorageError> {
        let progress = self.job_status(job)?;
        let result = progress.result_as::<T>()?;
        Ok((progress.status, progress.percent, result))
    }

    /// Unregisters and closes the session. Later calls are no-ops.
    ///
    /// # Errors
    ///
    /// The plugin's unregister error; the connection is closed regardless.
    pub fn close(&mut self) -> Result<(), StorageError> {
        if !self.transport.is_open() {
            return Ok(());
        }
        let outcome = self.invoke(&ops::PluginUnregister::default());
        self.transport.close();
        debug!(target: CLIENT_TARGET, plugin = self.uri.plugin(), "plugin session closed");
        outcome
    }

    fn release(&mut self, job: &JobId) {
        if let Err(error) = self.job_free(job) {
            debug!(target: CLIENT_TARGET, job = %job, error = %error, "job free failed");
        }
    }
}
