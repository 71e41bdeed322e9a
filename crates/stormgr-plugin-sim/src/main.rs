//! Entry point for the simulated array plugin.

use std::process::ExitCode;

use stormgr_plugin_sim::{SCHEME, SharedArray, SimPlugin};

fn main() -> ExitCode {
    let array = SharedArray::default();
    stormgr_plugin::run(SCHEME, move || SimPlugin::with_array(array.clone()))
}
