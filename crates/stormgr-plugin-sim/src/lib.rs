//! Simulated storage array plugin.
//!
//! The simulator keeps a whole array in memory and implements the full
//! mutating surface on top of it. It backs end-to-end tests and lets
//! client tooling be developed without hardware. All connections to one
//! plugin process share the same array; each connection keeps its own jobs.

mod array;
mod plugin;

pub use array::{
    BLOCK_SIZE, ChapCredentials, EXPORT_AUTH, ExportRequest, SYSTEM_ID, SharedArray, SimArray,
};
pub use plugin::{DEFAULT_JOB_STEPS, DEFAULT_TIMEOUT_MS, SimPlugin};

/// URI scheme and socket name of the simulator.
pub const SCHEME: &str = "sim";
