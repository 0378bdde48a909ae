//! Environment probing.
//!
//! Runs version-check commands for required tools and scans library
//! directories. Every probe returns a plain value: a missing tool is a
//! negative [`ToolCheck`], never an error.

use crate::platform::Platform;
use glob::{MatchOptions, Pattern};
use regex::Regex;
use semver::Version;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use walkdir::WalkDir;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(\.\d+)?").expect("version pattern is valid"));

/// A tool the workspace needs, with the command used to query it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    /// Stable identifier used as the report key.
    pub key: &'static str,
    pub command: &'static [&'static str],
    pub min_version: Option<&'static str>,
    /// Human readable name for terminal output.
    pub name: &'static str,
}

impl Dependency {
    pub const fn new(
        key: &'static str,
        command: &'static [&'static str],
        min_version: Option<&'static str>,
        name: &'static str,
    ) -> Self {
        Self {
            key,
            command,
            min_version,
            name,
        }
    }

    pub fn program(&self) -> &'static str {
        self.command.first().copied().unwrap_or(self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCheck {
    pub available: bool,
    pub message: String,
}

impl ToolCheck {
    fn found(message: impl Into<String>) -> Self {
        Self {
            available: true,
            message: message.into(),
        }
    }

    fn missing(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: message.into(),
        }
    }
}

/// A shared library located by file name pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibrarySpec {
    pub name: &'static str,
    /// Shell-style glob, matched case-insensitively.
    pub pattern: &'static str,
}

impl LibrarySpec {
    pub const fn new(name: &'static str, pattern: &'static str) -> Self {
        Self { name, pattern }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryCheck {
    pub available: bool,
    pub path: Option<PathBuf>,
}

impl LibraryCheck {
    pub fn message(&self) -> String {
        match &self.path {
            Some(path) => format!("Found at {}", path.display()),
            None => "Not found in library paths".to_string(),
        }
    }
}

/// Extracts the first dotted version from `text`, padded to three components.
///
/// Text without a version, or with components that overflow, yields `0.0.0`.
pub fn parse_version(text: &str) -> Version {
    let Some(found) = VERSION_RE.find(text) else {
        return Version::new(0, 0, 0);
    };

    let mut parts = [0u64; 3];
    for (slot, component) in parts.iter_mut().zip(found.as_str().split('.')) {
        match component.parse() {
            Ok(value) => *slot = value,
            Err(_) => return Version::new(0, 0, 0),
        }
    }
    Version::new(parts[0], parts[1], parts[2])
}

/// Returns true when `found` is at least `minimum`.
pub fn compare_versions(found: &str, minimum: &str) -> bool {
    parse_version(found) >= parse_version(minimum)
}

/// Checks that a tool is installed and new enough.
pub fn check_tool(dep: &Dependency) -> ToolCheck {
    let program = dep.program();

    // cl.exe only works inside an activated Visual Studio shell and prints
    // its banner to stderr, so it is not executed.
    if program == "cl" && Platform::current() == Platform::Windows {
        if env::var_os("VSCMD_ARG_TGT_ARCH").is_none() {
            return ToolCheck::missing("Visual Studio environment not activated");
        }
        if which::which(program).is_err() {
            return ToolCheck::missing("Not found in PATH");
        }
        return ToolCheck::found("Visual Studio environment detected");
    }

    if which::which(program).is_err() {
        return ToolCheck::missing("Not found in PATH");
    }

    let output = match Command::new(program).args(&dep.command[1..]).output() {
        Ok(output) => output,
        Err(e) => return ToolCheck::missing(format!("Error running command: {}", e)),
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    log::debug!("{} reported: {}", program, text.trim());

    evaluate_output(dep, &text)
}

/// Turns captured tool output into a verdict.
fn evaluate_output(dep: &Dependency, output: &str) -> ToolCheck {
    if dep.key == "vcpkg" {
        return ToolCheck::found("Available in PATH");
    }

    if let Some(minimum) = dep.min_version
        && !compare_versions(output, minimum)
    {
        return ToolCheck::missing(format!("Version too old (need {}+)", minimum));
    }

    ToolCheck::found(output.lines().next().unwrap_or_default().trim())
}

/// Directories scanned for libraries: the platform's search variable first,
/// then the fixed fallbacks. Empty entries and repeats are skipped.
pub fn library_search_dirs(platform: Platform, search_var: Option<&str>) -> Vec<PathBuf> {
    let from_var = search_var
        .unwrap_or_default()
        .split(platform.path_separator())
        .map(str::trim);

    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in from_var.chain(platform.fallback_library_dirs().iter().copied()) {
        if entry.is_empty() {
            continue;
        }
        let dir = PathBuf::from(entry);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// Prepends the platform's well-known library directories to a search-path
/// value when they exist and are not listed yet.
///
/// Returns the new value and the directories that were added.
pub fn augment_search_path(
    platform: Platform,
    current: Option<&str>,
    exists: impl Fn(&Path) -> bool,
) -> (String, Vec<String>) {
    let separator = platform.path_separator();
    let mut value = current.unwrap_or_default().to_string();
    let mut added = Vec::new();

    for dir in platform.preferred_library_dirs() {
        let listed = value.split(separator).any(|entry| entry == *dir);
        if listed || !exists(Path::new(dir)) {
            continue;
        }
        value = if value.is_empty() {
            dir.to_string()
        } else {
            format!("{}{}{}", dir, separator, value)
        };
        added.push(dir.to_string());
    }

    (value, added)
}

/// Library file names are compared case-insensitively.
fn name_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: false,
        ..Default::default()
    }
}

/// Scans `dirs` (non-recursively) for a file name matching `pattern`.
pub fn find_library(pattern: &str, dirs: &[PathBuf]) -> LibraryCheck {
    let not_found = LibraryCheck {
        available: false,
        path: None,
    };

    let matcher = match Pattern::new(pattern) {
        Ok(matcher) => matcher,
        Err(e) => {
            log::warn!("invalid library pattern '{}': {}", pattern, e);
            return not_found;
        }
    };

    for dir in dirs.iter().filter(|dir| dir.is_dir()) {
        let hit = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|entry| {
                matcher.matches_with(&entry.file_name().to_string_lossy(), name_options())
            });

        if let Some(entry) = hit {
            return LibraryCheck {
                available: true,
                path: Some(entry.into_path()),
            };
        }
    }

    not_found
}
