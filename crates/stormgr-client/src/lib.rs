//! Client library for stormgr storage plugins.
//!
//! A [`Locator`] maps a connection URI such as `sim://localhost/` to the
//! plugin socket under the configured root. [`Client`] connects to it,
//! registers a session and exposes every plugin operation as a typed
//! method. Long-running operations return a [`JobId`] that is polled with
//! [`Client::job_status`] or [`Client::wait_for_job`].

mod client;
mod locator;

pub use client::{Client, ensure};
pub use locator::{Locator, LocatorError};
pub use stormgr_ipc::{JobOr, JobProgress, PluginDescription, ops};
pub use stormgr_types::{
    Capabilities, Capability, ErrorCode, JobId, JobStatus, StorageError, StorageUri,
};
