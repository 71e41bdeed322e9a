//! Plugin-side runtime for stormgr storage plugins.
//!
//! A plugin implements [`Plugin`] for one vendor's array. The runtime
//! takes care of everything else: [`PluginServer`] listens on the plugin's
//! socket, each connection gets its own [`Session`] with a fresh plugin
//! instance, and [`JobRegistry`] tracks long-running work so plugins can
//! answer `job_status` and `job_free`. Binaries call [`run`] from `main`.

mod jobs;
mod plugin;
mod runtime;
mod server;
mod session;
pub mod shutdown;
pub mod telemetry;
#[cfg(test)]
mod test_support;

pub use jobs::{JobPoll, JobRegistry, JobTask, StagedTask};
pub use plugin::{Plugin, PluginResult};
pub use runtime::{ConfigLoader, RunError, SystemConfigLoader, run, run_with};
pub use server::{ListenerError, PluginServer, ServerHandle};
pub use session::Session;
