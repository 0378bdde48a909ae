//! Running external commands.
//!
//! On Windows every command goes through a throwaway batch file that first
//! calls the Visual Studio activation script, so `cl.exe` and friends are on
//! `PATH` for CMake. The batch file is removed once the command finishes.

use super::command::CommandLine;
use super::resolve::EffectiveConfig;
use colored::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};

/// Exit code recorded when a process could not be started at all.
pub const SPAWN_FAILURE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Execution {
    pub exit_code: i32,
    pub elapsed: Duration,
}

impl Execution {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes a command to completion, streaming its output to the terminal.
pub trait Runner {
    fn run(&mut self, command: &CommandLine) -> Execution;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    activation_script: Option<PathBuf>,
    scratch_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(config: &EffectiveConfig) -> Self {
        Self {
            activation_script: config.activation_script.clone(),
            scratch_dir: config.build_dir.clone(),
        }
    }
}

impl Runner for ProcessRunner {
    fn run(&mut self, command: &CommandLine) -> Execution {
        let start = Instant::now();
        let status = match &self.activation_script {
            Some(script) => run_activated(script, &self.scratch_dir, command),
            None => command.to_command().status(),
        };

        let exit_code = match status {
            Ok(status) => status.code().unwrap_or(SPAWN_FAILURE),
            Err(e) => {
                println!("{} Failed to start {}: {}", "x".red(), command.program, e);
                SPAWN_FAILURE
            }
        };

        Execution {
            exit_code,
            elapsed: start.elapsed(),
        }
    }
}

fn run_activated(script: &Path, dir: &Path, command: &CommandLine) -> io::Result<ExitStatus> {
    std::fs::create_dir_all(dir)?;
    let mut wrapper = tempfile::Builder::new()
        .prefix("autobuild_")
        .suffix(".bat")
        .tempfile_in(dir)?;
    wrapper.write_all(activation_wrapper(script, command).as_bytes())?;
    let wrapper = wrapper.into_temp_path();

    log::debug!("running via {}", wrapper.display());
    Command::new("cmd").arg("/C").arg(&*wrapper).status()
}

/// Batch file body that activates the toolchain and runs `command`,
/// propagating its exit code.
pub fn activation_wrapper(script: &Path, command: &CommandLine) -> String {
    let mut line = quote_for_cmd(&command.program);
    for arg in &command.args {
        line.push(' ');
        line.push_str(&quote_for_cmd(arg));
    }

    format!(
        "@echo off\r\ncall \"{}\" x64\r\n{}\r\nexit /b %ERRORLEVEL%\r\n",
        script.display(),
        line
    )
}

/// cmd.exe has no backslash escape; a quote inside a quoted argument is
/// written twice.
fn quote_for_cmd(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\"\""))
}
