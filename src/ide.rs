use crate::workspace::{ROOT_ENV, Workspace};
use anyhow::{Context, Result};
use colored::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

pub const BUILD_TASK_LABEL: &str = "Auto-Build (Intelligent)";
pub const CLEAN_TASK_LABEL: &str = "Clean Build";

/// Writes `.vscode/tasks.json` (always) plus `settings.json` and
/// `launch.json` when they do not exist yet.
pub fn setup_vscode(workspace: &Workspace, exe: &Path) -> Result<()> {
    println!("{} Setting up IDE configuration (VSCode)...", "⚙️".cyan());

    let vscode_dir = workspace.vscode_dir();
    fs::create_dir_all(&vscode_dir).context("Failed to create .vscode directory")?;

    write_json(&vscode_dir.join("tasks.json"), &tasks_json(exe))?;
    write_json_if_missing(&vscode_dir.join("settings.json"), &settings_json())?;
    write_json_if_missing(&vscode_dir.join("launch.json"), &launch_json())?;

    println!("{} VSCode configuration generated in .vscode/", "✓".green());
    Ok(())
}

fn task(label: &str, exe: &str, verb: &str) -> Value {
    json!({
        "label": label,
        "type": "shell",
        "command": exe,
        "args": [verb],
        "options": {
            "env": { ROOT_ENV: "${workspaceFolder}" }
        },
        "problemMatcher": []
    })
}

pub fn tasks_json(exe: &Path) -> Value {
    let exe = exe.to_string_lossy().replace('\\', "/");

    let mut build = task(BUILD_TASK_LABEL, &exe, "build");
    build["group"] = json!({ "kind": "build", "isDefault": true });
    build["problemMatcher"] = json!(["$gcc", "$msCompile"]);
    build["presentation"] = json!({ "reveal": "always", "panel": "shared" });
    build["runOptions"] = json!({ "runOn": "folderOpen" });

    json!({
        "version": "2.0.0",
        "tasks": [build, task(CLEAN_TASK_LABEL, &exe, "clean")]
    })
}

fn settings_json() -> Value {
    json!({
        "cmake.buildDirectory": "${workspaceFolder}/build",
        "cmake.configureOnOpen": false,
        "C_Cpp.default.compileCommands": "${workspaceFolder}/build/compile_commands.json"
    })
}

fn launch_json() -> Value {
    json!({
        "version": "0.2.0",
        "configurations": []
    })
}

fn write_json(path: &Path, content: &Value) -> Result<()> {
    let formatted = serde_json::to_string_pretty(content)?;
    fs::write(path, formatted + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("   {} Wrote {}", "+".green(), file_name(path));
    Ok(())
}

fn write_json_if_missing(path: &Path, content: &Value) -> Result<()> {
    if path.exists() {
        println!("   {} Skipping existing {}", "!".yellow(), file_name(path));
        return Ok(());
    }
    write_json(path, content)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_task_is_default() {
        let tasks = tasks_json(Path::new("/opt/bin/autobuild"));
        let build = &tasks["tasks"][0];
        assert_eq!(build["label"], BUILD_TASK_LABEL);
        assert_eq!(build["command"], "/opt/bin/autobuild");
        assert_eq!(build["args"], json!(["build"]));
        assert_eq!(build["group"]["isDefault"], true);
        assert_eq!(build["options"]["env"][ROOT_ENV], "${workspaceFolder}");
        assert_eq!(tasks["tasks"][1]["args"], json!(["clean"]));
    }

    #[test]
    fn test_existing_settings_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        fs::create_dir_all(ws.vscode_dir()).unwrap();
        fs::write(ws.vscode_dir().join("settings.json"), "{\"mine\": 1}").unwrap();
        fs::write(ws.vscode_dir().join("tasks.json"), "{}").unwrap();

        setup_vscode(&ws, Path::new("autobuild")).unwrap();

        let settings = fs::read_to_string(ws.vscode_dir().join("settings.json")).unwrap();
        assert_eq!(settings, "{\"mine\": 1}");
        let tasks: Value =
            serde_json::from_str(&fs::read_to_string(ws.vscode_dir().join("tasks.json")).unwrap())
                .unwrap();
        assert_eq!(tasks["version"], "2.0.0");
        assert!(ws.vscode_dir().join("launch.json").exists());
    }
}
