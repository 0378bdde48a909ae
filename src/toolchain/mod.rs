//! Toolchain detection.
//!
//! Produces a [`Detection`] value describing which compilers and build tools
//! the machine offers. Nothing here decides what to use; that is the
//! resolver's job.

pub mod types;
pub mod windows;

pub use types::{Compiler, Detection, VsInstall};

use crate::platform::Platform;
use std::process::Command;

/// Probes the machine for the tools relevant to `platform`.
pub fn detect(platform: Platform) -> Detection {
    let has_ninja = Command::new("ninja")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    let detection = match platform {
        Platform::Windows => Detection {
            has_ninja,
            visual_studio: windows::find_activation_script(&windows::candidate_roots()),
            ..Default::default()
        },
        Platform::Linux | Platform::MacOs => Detection {
            has_ninja,
            gcc_version: first_version_line("gcc"),
            clang_version: first_version_line("clang"),
            visual_studio: None,
        },
    };

    log::debug!("detected environment: {:?}", detection);
    detection
}

/// First line of `<cmd> --version`, or `None` when the command does not run
/// or prints nothing.
fn first_version_line(cmd: &str) -> Option<String> {
    let output = Command::new(cmd).arg("--version").output().ok()?;
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}
