//! Visual Studio activation script discovery.
//!
//! The build runs inside a `vcvarsall.bat` environment on Windows. The search
//! walks a fixed list of install roots and editions; the first combination
//! that contains the script wins.

use super::types::VsInstall;
use std::path::{Path, PathBuf};

/// Known roots where Visual Studio is installed.
const VS_ROOTS: &[&str] = &[
    r"C:\Program Files\Microsoft Visual Studio\2022",
    r"C:\Program Files\Microsoft Visual Studio\2019",
    r"C:\Program Files (x86)\Microsoft Visual Studio\2019",
];

/// Editions accepted below a root, in preference order.
pub const VS_EDITIONS: &[&str] = &["Community", "Professional", "Enterprise", "BuildTools"];

/// Roots to search: `VS_PATH` first when set, then the well-known locations.
pub fn candidate_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(custom) = std::env::var_os("VS_PATH").filter(|v| !v.is_empty()) {
        roots.push(PathBuf::from(custom));
    }
    roots.extend(VS_ROOTS.iter().map(PathBuf::from));
    roots
}

fn activation_script_path(root: &Path, edition: &str) -> PathBuf {
    root.join(edition)
        .join("VC")
        .join("Auxiliary")
        .join("Build")
        .join("vcvarsall.bat")
}

/// Finds the first (root, edition) pair with an activation script.
pub fn find_activation_script(roots: &[PathBuf]) -> Option<VsInstall> {
    for root in roots.iter().filter(|r| r.exists()) {
        for edition in VS_EDITIONS {
            let script = activation_script_path(root, edition);
            if script.exists() {
                return Some(VsInstall {
                    root: root.clone(),
                    edition: edition.to_string(),
                    activation_script: script,
                });
            }
        }
    }
    None
}
