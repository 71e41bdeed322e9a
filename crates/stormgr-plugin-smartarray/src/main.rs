//! Entry point for the SmartArray plugin.

use std::process::ExitCode;

use stormgr_plugin_smartarray::{SCHEME, SmartArrayPlugin};

fn main() -> ExitCode {
    stormgr_plugin::run(SCHEME, SmartArrayPlugin::new)
}
