//! Checks the host for the tools and libraries the workspace needs and
//! writes `scripts/environment_report.json`.

use clap::Parser;
use colored::*;
use std::process::ExitCode;

use autobuild::commands::verify;
use autobuild::logging;
use autobuild::platform::Platform;
use autobuild::ui;
use autobuild::workspace::Workspace;

#[derive(Parser)]
#[command(name = "autobuild-verify")]
#[command(about = "Verify the C++ build environment", version = env!("CARGO_PKG_VERSION"))]
struct Cli {}

fn main() -> ExitCode {
    ui::enable_utf8_console();
    logging::init();
    Cli::parse();

    let result = Workspace::locate().and_then(|ws| verify::run(&ws, Platform::current()));
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", format!("\nError during verification: {:#}", e).red());
            ExitCode::FAILURE
        }
    }
}
