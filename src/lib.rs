//! # autobuild - adaptive CMake build wrapper
//!
//! Picks a CMake generator, compiler and parallel job count for the current
//! host, runs configure and build, records how long every attempt took and
//! nudges the job count after each successful build.
//!
//! ## Module Organization
//!
//! - [`build`] - resolution, command lines, execution and the build manager
//! - [`state`] - `build_history.json` and `build_optimizations.json`
//! - [`probe`] - tool and library checks used by `autobuild-verify`
//! - [`toolchain`] - compiler and generator detection
//! - [`commands`] - `generate-makefile` and the verification report

/// Configure, build and clean, plus the job-count heuristic.
pub mod build;

/// Makefile generation and environment verification.
pub mod commands;

/// Platform defaults and `autobuild.toml` overrides.
pub mod config;

/// VSCode task generation.
pub mod ide;

pub mod logging;

/// Host platform model and per-platform tables.
pub mod platform;

/// Tool and library probes.
pub mod probe;

/// Persisted history and per-platform configuration.
pub mod state;

/// Compiler, Ninja and Visual Studio detection.
pub mod toolchain;

/// Terminal UI utilities (tables, colors).
pub mod ui;

pub mod workspace;
