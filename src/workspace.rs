//! Workspace root discovery.

use crate::state::StateStore;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides root discovery when set.
pub const ROOT_ENV: &str = "AUTOBUILD_WORKSPACE_ROOT";

/// The CMake project being driven plus the directories derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `AUTOBUILD_WORKSPACE_ROOT`, else the nearest ancestor of the running
    /// executable that holds a `CMakeLists.txt`, else the current directory.
    pub fn locate() -> Result<Self> {
        if let Some(root) = env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
            log::debug!("workspace root from {}", ROOT_ENV);
            return Ok(Self::new(root));
        }

        if let Ok(exe) = env::current_exe()
            && let Some(root) = exe.parent().and_then(find_project_root)
        {
            log::debug!("workspace root from executable location");
            return Ok(Self::new(root));
        }

        let cwd = env::current_dir().context("Failed to determine current directory")?;
        Ok(Self::new(cwd))
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    pub fn vscode_dir(&self) -> PathBuf {
        self.root.join(".vscode")
    }

    pub fn state(&self) -> StateStore {
        StateStore::new(self.scripts_dir())
    }

    /// Creates `build/` and `scripts/` if they are missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.build_dir(), self.scripts_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Nearest directory at or above `start` containing `CMakeLists.txt`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("CMakeLists.txt").is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_is_nearest_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tools").join("bin");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("CMakeLists.txt"), "project(demo)\n").unwrap();

        assert_eq!(find_project_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_derived_directories() {
        let ws = Workspace::new("/ws");
        assert_eq!(ws.build_dir(), PathBuf::from("/ws/build"));
        assert_eq!(ws.scripts_dir(), PathBuf::from("/ws/scripts"));
        assert_eq!(
            ws.state().history_path(),
            PathBuf::from("/ws/scripts/build_history.json")
        );
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.ensure_dirs().unwrap();
        assert!(ws.build_dir().is_dir());
        assert!(ws.scripts_dir().is_dir());
    }
}
