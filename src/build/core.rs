use super::clean::clear_build_dir;
use super::command::{self, CommandLine};
use super::executor::{ProcessRunner, Runner};
use super::resolve::{self, EffectiveConfig, ResolveInputs};
use super::tuning;
use crate::config;
use crate::platform::Platform;
use crate::state::{AttemptKind, BuildAttempt, HistoryEntry, Optimizations, StateStore};
use crate::toolchain;
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use colored::*;

/// Drives configure, build and clean for one workspace and keeps the
/// persisted state in step.
pub struct BuildManager<R: Runner> {
    config: EffectiveConfig,
    store: StateStore,
    history: Vec<HistoryEntry>,
    optimizations: Optimizations,
    runner: R,
}

impl BuildManager<ProcessRunner> {
    /// Loads state, detects the toolchain and resolves the configuration for
    /// the current platform.
    pub fn open(workspace: &Workspace) -> Result<Self> {
        workspace.ensure_dirs()?;
        let platform = Platform::current();
        let store = workspace.state();
        let optimizations = store.load_optimizations();
        let settings = config::load_settings(&workspace.root)?;
        let detection = toolchain::detect(platform);
        let cores = num_cpus::get();
        let persisted = store.platform_record(&optimizations, platform, cores);

        let config = resolve::resolve(&ResolveInputs {
            platform,
            source_dir: &workspace.root,
            build_dir: &workspace.build_dir(),
            persisted: persisted.as_ref(),
            settings: &settings,
            detection: &detection,
            cores,
        });
        log::debug!("effective configuration: {:?}", config);

        let runner = ProcessRunner::new(&config);
        Ok(Self {
            config,
            history: store.load_history(),
            optimizations,
            store,
            runner,
        })
    }
}

impl<R: Runner> BuildManager<R> {
    pub fn with_runner(config: EffectiveConfig, store: StateStore, runner: R) -> Self {
        let history = store.load_history();
        let optimizations = store.load_optimizations();
        Self {
            config,
            store,
            history,
            optimizations,
            runner,
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn configure(&mut self) -> Result<bool> {
        let cmd = command::configure_command(&self.config);
        println!("{} Running CMake configuration: {}", "⚙️".cyan(), cmd);
        self.execute(AttemptKind::Configure, &cmd)
    }

    /// Configures, then builds. A failed configure skips the build.
    pub fn build(&mut self) -> Result<bool> {
        if !self.configure()? {
            return Ok(false);
        }

        let cmd = command::build_command(&self.config);
        println!("{} Running build: {}", "🔨".cyan(), cmd);
        if !self.execute(AttemptKind::Build, &cmd)? {
            return Ok(false);
        }

        self.tune_and_persist()?;
        Ok(true)
    }

    pub fn clean(&mut self) -> Result<()> {
        let build_dir = &self.config.build_dir;
        if build_dir.join("CMakeCache.txt").exists() {
            let cmd = command::clean_command(&self.config);
            println!("{} Cleaning: {}", "🧹".cyan(), cmd);
            let result = self.runner.run(&cmd);
            if !result.success() {
                println!(
                    "{} Clean exited with code {}",
                    "!".yellow(),
                    result.exit_code
                );
            }
        } else {
            let removed = clear_build_dir(build_dir)?;
            println!(
                "{} Removed {} item(s) from {}",
                "🗑️".red(),
                removed,
                build_dir.display()
            );
        }
        Ok(())
    }

    fn execute(&mut self, kind: AttemptKind, cmd: &CommandLine) -> Result<bool> {
        let result = self.runner.run(cmd);
        self.history.push(
            BuildAttempt::new(kind, cmd.to_string(), result.exit_code, result.elapsed).into(),
        );
        self.store
            .save_history(&self.history)
            .context("Failed to save build history")?;

        let label = match kind {
            AttemptKind::Configure => "Configure",
            AttemptKind::Build => "Build",
        };
        if result.success() {
            println!(
                "{} {} finished in {:.2}s",
                "✓".green(),
                label,
                result.elapsed.as_secs_f64()
            );
        } else {
            println!(
                "{} {} failed (exit code {})",
                "x".red(),
                label,
                result.exit_code
            );
        }
        Ok(result.success())
    }

    fn tune_and_persist(&mut self) -> Result<()> {
        let jobs = tuning::tune_jobs(&self.history, self.config.jobs, self.config.max_jobs);
        if jobs != self.config.jobs {
            println!(
                "{} Parallel jobs: {} -> {}",
                "⚡".yellow(),
                self.config.jobs,
                jobs
            );
        }

        let record = serde_json::to_value(self.config.to_record(jobs))
            .context("Failed to encode build optimizations")?;
        self.optimizations
            .insert(self.config.platform.key().to_string(), record);
        self.store
            .save_optimizations(&self.optimizations)
            .context("Failed to save build optimizations")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::executor::Execution;
    use crate::toolchain::{Compiler, Detection};
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    /// Replays scripted exit codes and remembers what it was asked to run.
    struct ScriptedRunner {
        outcomes: Vec<(i32, f64)>,
        calls: Vec<String>,
    }

    impl ScriptedRunner {
        fn new(outcomes: &[(i32, f64)]) -> Self {
            Self {
                outcomes: outcomes.iter().rev().copied().collect(),
                calls: Vec::new(),
            }
        }
    }

    impl Runner for ScriptedRunner {
        fn run(&mut self, command: &CommandLine) -> Execution {
            self.calls.push(command.to_string());
            let (exit_code, secs) = self.outcomes.pop().unwrap_or((0, 1.0));
            Execution {
                exit_code,
                elapsed: Duration::from_secs_f64(secs),
            }
        }
    }

    fn config_in(root: &Path, jobs: usize) -> EffectiveConfig {
        EffectiveConfig {
            platform: Platform::Linux,
            source_dir: root.to_path_buf(),
            build_dir: root.join("build"),
            generator: Some("Ninja".to_string()),
            compiler: Compiler::Gcc,
            jobs,
            max_jobs: 16,
            optimization_level: "O3".to_string(),
            toolchain_file: None,
            extra_args: Vec::new(),
            activation_script: None,
            detection: Detection {
                has_ninja: true,
                gcc_version: Some("gcc 13.2.0".to_string()),
                ..Default::default()
            },
        }
    }

    fn manager(root: &Path, jobs: usize, outcomes: &[(i32, f64)]) -> BuildManager<ScriptedRunner> {
        let store = StateStore::new(root.join("scripts"));
        BuildManager::with_runner(config_in(root, jobs), store, ScriptedRunner::new(outcomes))
    }

    #[test]
    fn test_failed_configure_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(dir.path(), 4, &[(1, 0.5)]);

        assert!(!manager.build().unwrap());
        assert_eq!(manager.runner().calls.len(), 1);
        assert!(manager.runner().calls[0].starts_with("cmake -S"));

        let saved = manager.store.load_history();
        assert_eq!(saved.len(), 1);
        let configure = saved[0].attempt().unwrap();
        assert_eq!(configure.kind, AttemptKind::Configure);
        assert!(!configure.success);
        assert_eq!(configure.returncode, 1);
        assert!(!manager.store.optimizations_path().exists());
    }

    #[test]
    fn test_successful_build_records_both_attempts_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(dir.path(), 4, &[(0, 2.0), (0, 30.0)]);

        assert!(manager.build().unwrap());
        let saved = manager.store.load_history();
        assert_eq!(saved.len(), 2);
        let build = saved[1].attempt().unwrap();
        assert_eq!(build.kind, AttemptKind::Build);
        assert_eq!(
            build.command,
            format!("cmake --build {} --parallel 4", dir.path().join("build").display())
        );

        let records = manager.store.load_optimizations();
        assert_eq!(records["linux"]["parallel_jobs"], 4);
        assert_eq!(records["linux"]["has_ninja"], true);
    }

    #[test]
    fn test_failed_build_does_not_persist_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(dir.path(), 4, &[(0, 2.0), (2, 5.0)]);

        assert!(!manager.build().unwrap());
        assert_eq!(manager.history().len(), 2);
        assert!(!manager.store.optimizations_path().exists());
    }

    #[test]
    fn test_faster_build_raises_persisted_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("scripts"));
        let previous: Vec<HistoryEntry> = [100.0, 100.0, 100.0]
            .iter()
            .map(|&secs| {
                BuildAttempt::new(
                    AttemptKind::Build,
                    "cmake --build build --parallel 4".to_string(),
                    0,
                    Duration::from_secs_f64(secs),
                )
                .into()
            })
            .collect();
        store.save_history(&previous).unwrap();

        let mut manager = manager(dir.path(), 4, &[(0, 1.0), (0, 80.0)]);
        assert!(manager.build().unwrap());
        assert_eq!(manager.history().len(), 5);
        assert_eq!(manager.store.load_optimizations()["linux"]["parallel_jobs"], 5);
    }

    #[test]
    fn test_incomplete_history_entry_is_not_erased() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("scripts"));
        let legacy = json!({
            "timestamp": "2025-03-03T23:40:30.000000",
            "type": "build",
            "command": "cmake --build build --parallel 4",
            "success": true,
            "duration": 40.0
        });
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        fs::write(store.history_path(), json!([legacy.clone()]).to_string()).unwrap();

        let mut manager = manager(dir.path(), 4, &[(0, 1.0)]);
        assert!(manager.configure().unwrap());

        let saved = manager.store.load_history();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0], HistoryEntry::Raw(legacy));
    }

    #[test]
    fn test_build_leaves_other_platform_records_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("scripts"));
        let mut stored = Optimizations::new();
        stored.insert("windows".to_string(), json!({"parallel_jobs": 6}));
        store.save_optimizations(&stored).unwrap();

        let mut manager = manager(dir.path(), 4, &[(0, 1.0), (0, 20.0)]);
        assert!(manager.build().unwrap());

        let records = manager.store.load_optimizations();
        assert_eq!(records["windows"], json!({"parallel_jobs": 6}));
        assert_eq!(records["linux"]["compiler"], "gcc");
    }

    #[test]
    fn test_clean_without_cache_clears_directory() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("stale.o"), "").unwrap();

        let mut manager = manager(dir.path(), 4, &[]);
        manager.clean().unwrap();
        assert!(manager.runner().calls.is_empty());
        assert_eq!(fs::read_dir(&build).unwrap().count(), 0);
        assert!(manager.history().is_empty());
    }

    #[test]
    fn test_clean_with_cache_runs_cmake() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("CMakeCache.txt"), "").unwrap();

        let mut manager = manager(dir.path(), 4, &[(0, 0.1)]);
        manager.clean().unwrap();
        assert_eq!(manager.runner().calls.len(), 1);
        assert!(manager.runner().calls[0].ends_with("--target clean"));
        assert!(build.join("CMakeCache.txt").exists());
        assert!(manager.store.load_history().is_empty());
    }
}
