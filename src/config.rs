use crate::platform::Platform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const SETTINGS_FILE: &str = "autobuild.toml";

/// Per-platform build configuration as stored in `build_optimizations.json`.
///
/// Stored records may omit any key; [`PlatformConfig::from_stored`] fills the
/// gaps from the defaults of the platform the record belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub generator: String,
    pub compiler: String,
    pub parallel_jobs: usize,
    pub optimization_level: String,
    /// CMake toolchain file; empty when unused.
    pub toolchain: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmake_extra_args: Vec<String>,

    // Detection results from the run that last saved this record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_ninja: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_gcc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_clang: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcc_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clang_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcvars_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_edition: Option<String>,
}

impl PlatformConfig {
    /// Hard-coded starting point used until a run has persisted a record.
    pub fn defaults_for(platform: Platform, cores: usize) -> Self {
        let (optimization_level, toolchain) = match platform {
            Platform::Windows => ("O2", "C:/vcpkg/scripts/buildsystems/vcpkg.cmake"),
            Platform::Linux => ("O3", ""),
            Platform::MacOs => ("O2", ""),
        };

        Self {
            generator: "Ninja".to_string(),
            compiler: platform.default_compiler().key().to_string(),
            parallel_jobs: cores.clamp(1, platform.default_jobs_cap()),
            optimization_level: optimization_level.to_string(),
            toolchain: toolchain.to_string(),
            cmake_extra_args: Vec::new(),
            has_ninja: None,
            has_gcc: None,
            has_clang: None,
            gcc_version: None,
            clang_version: None,
            vs_path: None,
            vcvars_path: None,
            vs_edition: None,
        }
    }

    /// Decodes a stored record, taking missing keys from `platform`'s
    /// defaults rather than the host's.
    pub fn from_stored(
        platform: Platform,
        cores: usize,
        stored: &Value,
    ) -> Result<Self, serde_json::Error> {
        let Value::Object(overrides) = stored else {
            return serde_json::from_value(stored.clone());
        };
        let mut merged = match serde_json::to_value(Self::defaults_for(platform, cores))? {
            Value::Object(defaults) => defaults,
            other => return serde_json::from_value(other),
        };
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        serde_json::from_value(Value::Object(merged))
    }
}

/// Optional project-level overrides read from `autobuild.toml`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ProjectSettings {
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct BuildSettings {
    pub generator: Option<String>,
    pub compiler: Option<String>,
    pub optimization_level: Option<String>,
    pub toolchain: Option<String>,
    pub extra_args: Option<Vec<String>>,
}

impl ProjectSettings {
    /// Applies the overrides on top of a stored or default record.
    pub fn apply(&self, base: &PlatformConfig) -> PlatformConfig {
        let mut merged = base.clone();
        let build = &self.build;
        if let Some(generator) = &build.generator {
            merged.generator = generator.clone();
        }
        if let Some(compiler) = &build.compiler {
            merged.compiler = compiler.clone();
        }
        if let Some(level) = &build.optimization_level {
            merged.optimization_level = level.trim_start_matches('-').to_string();
        }
        if let Some(toolchain) = &build.toolchain {
            merged.toolchain = toolchain.clone();
        }
        if let Some(args) = &build.extra_args {
            merged.cmake_extra_args = args.clone();
        }
        merged
    }
}

/// Loads `autobuild.toml` from the workspace root. A missing file means no
/// overrides.
pub fn load_settings(root: &Path) -> Result<ProjectSettings> {
    let path = root.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(ProjectSettings::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
            path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_platform() {
        let linux = PlatformConfig::defaults_for(Platform::Linux, 32);
        assert_eq!(linux.generator, "Ninja");
        assert_eq!(linux.compiler, "gcc");
        assert_eq!(linux.parallel_jobs, 16);
        assert_eq!(linux.optimization_level, "O3");
        assert!(linux.toolchain.is_empty());

        let mac = PlatformConfig::defaults_for(Platform::MacOs, 12);
        assert_eq!(mac.parallel_jobs, 8);
        assert_eq!(mac.compiler, "clang");

        let windows = PlatformConfig::defaults_for(Platform::Windows, 4);
        assert_eq!(windows.parallel_jobs, 4);
        assert_eq!(windows.toolchain, "C:/vcpkg/scripts/buildsystems/vcpkg.cmake");
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let stored = serde_json::json!({"parallel_jobs": 3});
        let partial = PlatformConfig::from_stored(Platform::Linux, 8, &stored).unwrap();
        assert_eq!(partial.parallel_jobs, 3);
        assert_eq!(partial.generator, "Ninja");
        assert_eq!(partial.compiler, "gcc");
        assert!(partial.cmake_extra_args.is_empty());

        let windows = PlatformConfig::from_stored(Platform::Windows, 8, &stored).unwrap();
        assert_eq!(windows.compiler, "msvc");
        assert_eq!(windows.optimization_level, "O2");
    }

    #[test]
    fn test_stored_record_must_be_an_object() {
        let stored = serde_json::json!([1, 2]);
        assert!(PlatformConfig::from_stored(Platform::Linux, 8, &stored).is_err());
        let wrong_type = serde_json::json!({"toolchain": 7});
        assert!(PlatformConfig::from_stored(Platform::Linux, 8, &wrong_type).is_err());
    }

    #[test]
    fn test_settings_override_static_fields() {
        let settings: ProjectSettings = toml::from_str(
            r#"
[build]
compiler = "clang"
optimization_level = "-O1"
extra_args = ["-DBUILD_EXAMPLES=OFF"]
"#,
        )
        .unwrap();

        let base = PlatformConfig::defaults_for(Platform::Linux, 8);
        let merged = settings.apply(&base);
        assert_eq!(merged.compiler, "clang");
        assert_eq!(merged.optimization_level, "O1");
        assert_eq!(merged.cmake_extra_args, vec!["-DBUILD_EXAMPLES=OFF"]);
        assert_eq!(merged.generator, base.generator);
        assert_eq!(merged.parallel_jobs, base.parallel_jobs);
    }

    #[test]
    fn test_load_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(dir.path()).unwrap();
        assert_eq!(settings, ProjectSettings::default());
    }

    #[test]
    fn test_load_settings_reports_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[build\ncompiler = ").unwrap();
        let err = load_settings(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
