//! Configuration resolution.
//!
//! Combines the persisted record for the current platform (or the built-in
//! defaults), the optional `autobuild.toml` overrides and the detection
//! results into one immutable [`EffectiveConfig`].

use crate::config::{PlatformConfig, ProjectSettings};
use crate::platform::Platform;
use crate::toolchain::{Compiler, Detection};
use std::path::{Path, PathBuf};

/// Everything a configure, build or clean command needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub platform: Platform,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    /// `None` lets CMake pick its platform default.
    pub generator: Option<String>,
    pub compiler: Compiler,
    /// Always within `1..=max_jobs`.
    pub jobs: usize,
    pub max_jobs: usize,
    /// Level without the leading dash, e.g. `O3`.
    pub optimization_level: String,
    pub toolchain_file: Option<String>,
    pub extra_args: Vec<String>,
    /// `vcvarsall.bat` to run before every command, Windows only.
    pub activation_script: Option<PathBuf>,
    pub detection: Detection,
}

pub struct ResolveInputs<'a> {
    pub platform: Platform,
    pub source_dir: &'a Path,
    pub build_dir: &'a Path,
    pub persisted: Option<&'a PlatformConfig>,
    pub settings: &'a ProjectSettings,
    pub detection: &'a Detection,
    pub cores: usize,
}

/// Upper bound for the job count on a machine with `cores` logical cores.
pub fn max_jobs(cores: usize) -> usize {
    cores.max(1) * 2
}

pub fn resolve(inputs: &ResolveInputs<'_>) -> EffectiveConfig {
    let platform = inputs.platform;
    let detection = inputs.detection;
    let base = inputs
        .persisted
        .cloned()
        .unwrap_or_else(|| PlatformConfig::defaults_for(platform, inputs.cores));
    let record = inputs.settings.apply(&base);

    let max_jobs = max_jobs(inputs.cores);
    let jobs = record.parallel_jobs.clamp(1, max_jobs);

    let compiler = select_compiler(platform, &record.compiler, detection);
    let (generator, extra_args) = select_generator(platform, &record, detection);

    let toolchain_file = Some(record.toolchain.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let activation_script = if platform.needs_activation() {
        detection
            .visual_studio
            .as_ref()
            .map(|vs| vs.activation_script.clone())
    } else {
        None
    };

    EffectiveConfig {
        platform,
        source_dir: inputs.source_dir.to_path_buf(),
        build_dir: inputs.build_dir.to_path_buf(),
        generator,
        compiler,
        jobs,
        max_jobs,
        optimization_level: record.optimization_level.trim_start_matches('-').to_string(),
        toolchain_file,
        extra_args,
        activation_script,
        detection: detection.clone(),
    }
}

fn select_compiler(platform: Platform, requested: &str, detection: &Detection) -> Compiler {
    let compiler = Compiler::from_key(requested).unwrap_or_else(|| {
        let fallback = platform.default_compiler();
        log::warn!("unknown compiler '{}', using {}", requested, fallback);
        fallback
    });

    if !platform.selects_compiler_via_cmake() || detection.has(compiler) {
        return compiler;
    }

    let alternate = match compiler {
        Compiler::Gcc => Compiler::Clang,
        Compiler::Clang => Compiler::Gcc,
        Compiler::Msvc => return compiler,
    };
    if detection.has(alternate) {
        log::info!("{} not found, switching to {}", compiler, alternate);
        alternate
    } else {
        compiler
    }
}

fn select_generator(
    platform: Platform,
    record: &PlatformConfig,
    detection: &Detection,
) -> (Option<String>, Vec<String>) {
    let mut extra_args = record.cmake_extra_args.clone();
    let requested = record.generator.trim();
    if requested.is_empty() {
        return (None, extra_args);
    }

    if !requested.starts_with("Ninja") || detection.has_ninja {
        return (Some(requested.to_string()), extra_args);
    }

    let fallback = match (platform, &detection.visual_studio) {
        (Platform::Windows, Some(vs)) => vs.generator(),
        _ => platform.makefile_generator(),
    };
    log::info!("ninja not found, falling back to '{}'", fallback);
    extra_args.retain(|arg| !arg.starts_with("-DCMAKE_MAKE_PROGRAM="));
    (Some(fallback.to_string()), extra_args)
}

impl EffectiveConfig {
    /// Record persisted after a successful build, carrying `jobs` as the
    /// job count for the next run.
    pub fn to_record(&self, jobs: usize) -> PlatformConfig {
        let detection = &self.detection;
        let unix = self.platform.selects_compiler_via_cmake();
        let vs = detection.visual_studio.as_ref();

        PlatformConfig {
            generator: self.generator.clone().unwrap_or_default(),
            compiler: self.compiler.key().to_string(),
            parallel_jobs: jobs,
            optimization_level: self.optimization_level.clone(),
            toolchain: self.toolchain_file.clone().unwrap_or_default(),
            cmake_extra_args: self.extra_args.clone(),
            has_ninja: Some(detection.has_ninja),
            has_gcc: unix.then(|| detection.gcc_version.is_some()),
            has_clang: unix.then(|| detection.clang_version.is_some()),
            gcc_version: detection.gcc_version.clone(),
            clang_version: detection.clang_version.clone(),
            vs_path: vs.map(|v| v.root.to_string_lossy().to_string()),
            vcvars_path: vs.map(|v| v.activation_script.to_string_lossy().to_string()),
            vs_edition: vs.map(|v| v.edition.clone()),
        }
    }
}
