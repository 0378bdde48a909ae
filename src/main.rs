//! # autobuild CLI Entry Point
//!
//! Parses the verb and hands it to the build manager or one of the
//! generators.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::process::ExitCode;

use autobuild::build::BuildManager;
use autobuild::commands::generate;
use autobuild::ide;
use autobuild::logging;
use autobuild::platform::Platform;
use autobuild::ui;
use autobuild::workspace::Workspace;

#[derive(Parser)]
#[command(name = "autobuild")]
#[command(about = "Adaptive CMake build wrapper", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the CMake configure step
    Configure,
    /// Configure, then build with the tuned job count
    Build,
    /// Remove build outputs
    Clean,
    /// Write a Makefile (auto_make.bat on Windows) that calls this tool
    GenerateMakefile,
    /// Write VSCode build tasks for this tool
    SetupVscode,
}

fn main() -> ExitCode {
    ui::enable_utf8_console();
    logging::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<bool> {
    let workspace = Workspace::locate()?;
    log::debug!("workspace root: {}", workspace.root.display());

    match command {
        Commands::Configure => BuildManager::open(&workspace)?.configure(),
        Commands::Build => BuildManager::open(&workspace)?.build(),
        Commands::Clean => {
            BuildManager::open(&workspace)?.clean()?;
            Ok(true)
        }
        Commands::GenerateMakefile => {
            let exe = current_exe()?;
            generate::generate_makefile(&workspace, Platform::current(), &exe)?;
            Ok(true)
        }
        Commands::SetupVscode => {
            let exe = current_exe()?;
            ide::setup_vscode(&workspace, &exe)?;
            Ok(true)
        }
    }
}

fn current_exe() -> Result<std::path::PathBuf> {
    std::env::current_exe().context("Failed to locate the autobuild executable")
}
