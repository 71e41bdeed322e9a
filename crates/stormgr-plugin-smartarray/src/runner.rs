//! Execution of the controller CLI.

use std::io;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tracing::debug;

use crate::SmartArrayError;

const RUNNER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runner");
const NO_CONTROLLERS: &str = "No controllers detected";

/// Runs the controller tool; abstracted so tests can replay captured output.
pub trait CommandRunner {
    /// Runs `program` with `args` and returns its standard output.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be started or exits unsuccessfully.
    fn run(&self, program: &Path, args: &[String]) -> Result<String, SmartArrayError>;
}

/// Runner that spawns the real tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<String, SmartArrayError> {
        debug!(target: RUNNER_TARGET, program = %program.display(), ?args, "running controller tool");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    SmartArrayError::ToolMissing {
                        path: program.to_path_buf(),
                    }
                }
                _ => SmartArrayError::Spawn {
                    path: program.to_path_buf(),
                    source: Arc::new(source),
                },
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }
        if stdout.contains(NO_CONTROLLERS) {
            return Err(SmartArrayError::NoControllers);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        let stdout = stdout.trim();
        Err(SmartArrayError::ToolFailed {
            status: output.status.to_string(),
            message: if stdout.is_empty() {
                stderr
            } else {
                stdout.to_owned()
            },
        })
    }
}
