//! Environment verification (`autobuild-verify`).
//!
//! Checks the workspace bootstrap files, required tools, shared libraries and
//! the packages CMake can locate, prints one table per section and saves the
//! results to `scripts/environment_report.json`.

use crate::platform::{PackageManager, Platform};
use crate::probe::{self, LibraryCheck, ToolCheck};
use crate::state;
use crate::ui::{self, Status, Table};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub const REPORT_FILE: &str = "environment_report.json";

/// Packages probed through `find_package`, with the variable each one sets.
pub const CMAKE_PACKAGES: &[(&str, &str)] = &[
    ("OpenSSL", "OPENSSL_FOUND"),
    ("ZLIB", "ZLIB_FOUND"),
    ("jsoncpp", "jsoncpp_FOUND"),
    ("UUID", "UUID_FOUND"),
];

const VSCODE_FILES: &[&str] = &["settings.json", "tasks.json", "launch.json"];
const VCPKG_TOOLCHAIN: &str = "C:/vcpkg/scripts/buildsystems/vcpkg.cmake";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSetup {
    pub scripts_setup: bool,
    pub vscode_integration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentReport {
    pub timestamp: String,
    pub platform: String,
    pub tools: BTreeMap<String, ToolCheck>,
    pub libraries: BTreeMap<String, LibraryCheck>,
    pub cmake_packages: BTreeMap<String, bool>,
    pub environment_setup: EnvironmentSetup,
}

impl EnvironmentReport {
    pub fn tools_ok(&self) -> bool {
        self.tools.values().all(|t| t.available)
    }

    /// Libraries on disk and packages visible to CMake.
    pub fn libraries_ok(&self) -> bool {
        self.libraries.values().all(|l| l.available) && self.cmake_packages.values().all(|&p| p)
    }
}

/// Runs every check and writes the report. Returns whether all tools and
/// libraries were found.
pub fn run(workspace: &Workspace, platform: Platform) -> Result<bool> {
    ui::section("ENVIRONMENT VERIFICATION");

    let var = platform.library_path_var();
    let current = env::var(var).ok();
    let (search_path, added) = probe::augment_search_path(platform, current.as_deref(), Path::exists);
    for dir in &added {
        println!("Added to {}: {}", var, dir);
    }
    println!("Detected platform: {}", platform.to_string().bold());

    ui::section("CHECKING ENVIRONMENT SETUP");
    let environment_setup = check_environment_setup(workspace, platform);

    ui::section("CHECKING REQUIRED TOOLS");
    let tools = check_tools(platform);

    ui::section("CHECKING REQUIRED LIBRARIES");
    let dirs = probe::library_search_dirs(platform, Some(&search_path));
    let libraries = check_libraries(platform, &dirs);

    ui::section("CHECKING CMAKE MODULES");
    let cmake_packages = check_cmake_packages(workspace, platform);

    let report = EnvironmentReport {
        timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        platform: platform.key().to_string(),
        tools,
        libraries,
        cmake_packages,
        environment_setup,
    };

    ui::section("SUMMARY");
    let ok = report.tools_ok() && report.libraries_ok();
    if ok {
        println!("{}", "✓ All dependencies are properly set up!".green());
        println!("{}", "✓ Your environment is ready for development.".green());
    } else {
        println!("{}", "⚠ Some dependencies are missing or not correctly set up.".yellow());
        println!(
            "{}",
            "  Please install the missing dependencies and update your environment paths.".yellow()
        );
        print_remediation(platform);
    }

    let report_path = workspace.scripts_dir().join(REPORT_FILE);
    state::save_json(&report_path, &report).context("Failed to write environment report")?;
    println!("\nDetailed report saved to: {}", report_path.display());

    Ok(ok)
}

fn check_environment_setup(workspace: &Workspace, platform: Platform) -> EnvironmentSetup {
    let script = platform.setup_script_name();
    let scripts_setup = workspace.root.join(script).exists();
    let missing = missing_vscode_files(&workspace.vscode_dir());

    let mut table = Table::new(&["Check", "Status", "Details"]);
    table.add_row(vec![
        "Environment scripts".to_string(),
        setup_status(scripts_setup).cell(),
        if scripts_setup {
            "Setup scripts found".to_string()
        } else {
            format!("{} not found", script)
        },
    ]);
    table.add_row(vec![
        "VSCode integration".to_string(),
        setup_status(missing.is_empty()).cell(),
        if missing.is_empty() {
            "VSCode settings found".to_string()
        } else {
            format!("Missing: {}", missing.join(", "))
        },
    ]);
    table.print();

    EnvironmentSetup {
        scripts_setup,
        vscode_integration: missing.is_empty(),
    }
}

fn setup_status(present: bool) -> Status {
    if present { Status::Pass } else { Status::Warn }
}

/// `.vscode` files that do not exist yet.
pub fn missing_vscode_files(vscode_dir: &Path) -> Vec<&'static str> {
    VSCODE_FILES
        .iter()
        .copied()
        .filter(|file| !vscode_dir.join(file).exists())
        .collect()
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn check_tools(platform: Platform) -> BTreeMap<String, ToolCheck> {
    let mut table = Table::new(&["Tool", "Status", "Details"]);
    let mut results = BTreeMap::new();

    for dep in platform.required_tools() {
        let pb = spinner(format!("Checking {}...", dep.name));
        let check = probe::check_tool(dep);
        pb.finish_and_clear();

        table.add_row(vec![
            dep.name.to_string(),
            Status::from_available(check.available).cell(),
            check.message.clone(),
        ]);
        results.insert(dep.key.to_string(), check);
    }

    table.print();
    results
}

fn check_libraries(platform: Platform, dirs: &[PathBuf]) -> BTreeMap<String, LibraryCheck> {
    let mut table = Table::new(&["Library", "Status", "Details"]);
    let mut results = BTreeMap::new();

    for lib in platform.required_libraries() {
        let check = probe::find_library(lib.pattern, dirs);
        table.add_row(vec![
            lib.name.to_string(),
            Status::from_available(check.available).cell(),
            check.message(),
        ]);
        results.insert(lib.name.to_string(), check);
    }

    table.print();
    results
}

/// Throwaway CMake project that reports what `find_package` located.
pub fn probe_project() -> String {
    let mut text = String::from("cmake_minimum_required(VERSION 3.5)\nproject(DependencyProbe)\n\n");
    for (name, _) in CMAKE_PACKAGES {
        text.push_str(&format!("find_package({} QUIET)\n", name));
    }
    text.push('\n');
    for (name, var) in CMAKE_PACKAGES {
        text.push_str(&format!("message(STATUS \"{} found: ${{{}}}\")\n", name, var));
    }
    text
}

/// CMake's truthy constants as printed by `message()`.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_uppercase().as_str(),
        "1" | "TRUE" | "ON" | "YES" | "Y"
    )
}

/// Reads the `<name> found: <value>` lines emitted by [`probe_project`].
pub fn parse_package_output(output: &str) -> BTreeMap<String, bool> {
    CMAKE_PACKAGES
        .iter()
        .map(|(name, _)| {
            let marker = format!("{} found:", name);
            let found = output
                .lines()
                .find_map(|line| line.split_once(&marker).map(|(_, value)| is_truthy(value)))
                .unwrap_or(false);
            (name.to_string(), found)
        })
        .collect()
}

fn check_cmake_packages(workspace: &Workspace, platform: Platform) -> BTreeMap<String, bool> {
    let pb = spinner("Asking CMake for packages...".to_string());
    let result = run_package_probe(&workspace.build_dir(), platform);
    pb.finish_and_clear();

    let packages = match result {
        Ok(packages) => packages,
        Err(e) => {
            println!("{} Error running CMake test: {:#}", "x".red(), e);
            CMAKE_PACKAGES
                .iter()
                .map(|(name, _)| (name.to_string(), false))
                .collect()
        }
    };

    let mut table = Table::new(&["Package", "Status", "Details"]);
    for (name, &found) in &packages {
        table.add_row(vec![
            name.clone(),
            Status::from_available(found).cell(),
            if found {
                "CMake can find package".to_string()
            } else {
                "Package not found by CMake".to_string()
            },
        ]);
    }
    table.print();
    packages
}

fn run_package_probe(build_dir: &Path, platform: Platform) -> Result<BTreeMap<String, bool>> {
    fs::create_dir_all(build_dir)
        .with_context(|| format!("Failed to create {}", build_dir.display()))?;
    let project = tempfile::Builder::new()
        .prefix("cmake_test")
        .tempdir_in(build_dir)
        .context("Failed to create probe directory")?;
    fs::write(project.path().join("CMakeLists.txt"), probe_project())
        .context("Failed to write probe project")?;

    let mut cmd = Command::new("cmake");
    cmd.arg(".").current_dir(project.path());
    if platform == Platform::Windows && Path::new(VCPKG_TOOLCHAIN).exists() {
        cmd.arg(format!("-DCMAKE_TOOLCHAIN_FILE={}", VCPKG_TOOLCHAIN));
    }

    let output = cmd.output().context("Failed to run cmake")?;
    log::debug!("cmake probe exited with {}", output.status);
    Ok(parse_package_output(&String::from_utf8_lossy(&output.stdout)))
}

fn print_remediation(platform: Platform) {
    println!("\nTo fix missing dependencies on {}, try running:", platform);
    for line in platform.remediation_commands(PackageManager::detect()) {
        println!("  {}", line.cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_output() {
        let output = "\
-- The CXX compiler identification is GNU 13.2.0
-- OpenSSL found: TRUE
-- ZLIB found: 1
-- jsoncpp found: 0
-- UUID found:
-- Configuring done";
        let packages = parse_package_output(output);
        assert!(packages["OpenSSL"]);
        assert!(packages["ZLIB"]);
        assert!(!packages["jsoncpp"]);
        assert!(!packages["UUID"]);
    }

    #[test]
    fn test_parse_without_output() {
        let packages = parse_package_output("");
        assert_eq!(packages.len(), CMAKE_PACKAGES.len());
        assert!(packages.values().all(|found| !found));
    }

    #[test]
    fn test_probe_project_reports_every_package() {
        let text = probe_project();
        assert!(text.contains("find_package(ZLIB QUIET)"));
        assert!(text.contains("message(STATUS \"jsoncpp found: ${jsoncpp_FOUND}\")"));
    }

    #[test]
    fn test_missing_vscode_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(missing_vscode_files(dir.path()), VSCODE_FILES.to_vec());

        fs::write(dir.path().join("tasks.json"), "{}").unwrap();
        assert_eq!(
            missing_vscode_files(dir.path()),
            vec!["settings.json", "launch.json"]
        );
    }

    #[test]
    fn test_report_shape() {
        let mut libraries = BTreeMap::new();
        libraries.insert(
            "zlib".to_string(),
            LibraryCheck {
                available: false,
                path: None,
            },
        );
        let report = EnvironmentReport {
            timestamp: "2025-03-03T23:40:30.000000".to_string(),
            platform: "linux".to_string(),
            tools: BTreeMap::new(),
            libraries,
            cmake_packages: parse_package_output("-- ZLIB found: ON"),
            environment_setup: EnvironmentSetup {
                scripts_setup: true,
                vscode_integration: false,
            },
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["libraries"]["zlib"]["path"], serde_json::Value::Null);
        assert_eq!(value["cmake_packages"]["ZLIB"], true);
        assert_eq!(value["environment_setup"]["vscode_integration"], false);
        assert!(report.tools_ok());
        assert!(!report.libraries_ok());
    }
}
