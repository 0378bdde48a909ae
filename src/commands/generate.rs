//! `autobuild generate-makefile`

use crate::platform::Platform;
use crate::workspace::{ROOT_ENV, Workspace};
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the generated wrapper for `platform`.
pub fn script_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => "auto_make.bat",
        Platform::Linux | Platform::MacOs => "Makefile",
    }
}

/// Wrapper contents that call `exe` with the workspace root pinned.
pub fn script_contents(platform: Platform, root: &Path, exe: &Path) -> String {
    let root = root.display();
    let exe = exe.display();
    match platform {
        Platform::Windows => format!(
            "@echo off\r\n\
             echo Running autobuild\r\n\
             set \"{ROOT_ENV}={root}\"\r\n\
             \"{exe}\" build\r\n\
             if %ERRORLEVEL% NEQ 0 (\r\n\
             \x20   echo Build failed!\r\n\
             \x20   exit /b %ERRORLEVEL%\r\n\
             )\r\n"
        ),
        Platform::Linux | Platform::MacOs => format!(
            "# Auto-generated by autobuild\n\
             \n\
             .PHONY: all clean\n\
             \n\
             all:\n\
             \t{ROOT_ENV}=\"{root}\" \"{exe}\" build\n\
             \n\
             clean:\n\
             \t{ROOT_ENV}=\"{root}\" \"{exe}\" clean\n"
        ),
    }
}

pub fn generate_makefile(workspace: &Workspace, platform: Platform, exe: &Path) -> Result<PathBuf> {
    let path = workspace.root.join(script_name(platform));
    fs::write(&path, script_contents(platform, &workspace.root, exe))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    make_executable(&path);

    println!("{} Generated build script at {}", "✓".green(), path.display());
    Ok(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o755)) {
        log::debug!("could not mark {} executable: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_makefile_targets() {
        let text = script_contents(
            Platform::Linux,
            Path::new("/ws"),
            Path::new("/usr/local/bin/autobuild"),
        );
        assert!(text.contains(".PHONY: all clean"));
        assert!(text.contains(
            "all:\n\tAUTOBUILD_WORKSPACE_ROOT=\"/ws\" \"/usr/local/bin/autobuild\" build\n"
        ));
        assert!(text.contains("clean:\n\t"));
        assert!(text.trim_end().ends_with("clean"));
    }

    #[test]
    fn test_batch_propagates_failure() {
        let text = script_contents(
            Platform::Windows,
            Path::new(r"C:\ws"),
            Path::new(r"C:\tools\autobuild.exe"),
        );
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "@echo off");
        assert!(lines.contains(&r#""C:\tools\autobuild.exe" build"#));
        assert!(lines.contains(&"    exit /b %ERRORLEVEL%"));
    }

    #[test]
    fn test_generate_writes_into_root() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let path = generate_makefile(&ws, Platform::Linux, Path::new("autobuild")).unwrap();
        assert_eq!(path, dir.path().join("Makefile"));
        assert!(fs::read_to_string(path).unwrap().contains("all:"));
    }
}
