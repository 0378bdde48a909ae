//! Build directory cleanup when CMake has not configured the tree yet.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Removes everything inside `build_dir` but keeps the directory itself.
/// Returns the number of entries removed.
pub fn clear_build_dir(build_dir: &Path) -> Result<usize> {
    if !build_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    let entries = fs::read_dir(build_dir)
        .with_context(|| format!("Failed to read {}", build_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        }
        .with_context(|| format!("Failed to remove {}", path.display()))?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_removed_directory_kept() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(build.join("CMakeFiles")).unwrap();
        fs::write(build.join("CMakeFiles").join("a.o"), "").unwrap();
        fs::write(build.join("app"), "").unwrap();

        assert_eq!(clear_build_dir(&build).unwrap(), 2);
        assert!(build.is_dir());
        assert_eq!(fs::read_dir(&build).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(clear_build_dir(&dir.path().join("build")).unwrap(), 0);
    }
}
