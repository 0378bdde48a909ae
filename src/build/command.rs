//! CMake command lines derived from an [`EffectiveConfig`].

use super::resolve::EffectiveConfig;
use crate::platform::Platform;
use crate::toolchain::Compiler;
use std::fmt;
use std::process::Command;

/// A program plus its arguments, kept as data until it is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// True when the generator builds several configurations from one tree and
/// so needs `--config` at build time.
pub fn is_multi_config(platform: Platform, generator: Option<&str>) -> bool {
    match generator {
        Some(g) => g.starts_with("Visual Studio") || g == "Xcode" || g == "Ninja Multi-Config",
        None => platform.implicit_generator_is_multi_config(),
    }
}

pub fn configure_command(config: &EffectiveConfig) -> CommandLine {
    let mut cmd = CommandLine::new("cmake")
        .arg("-S")
        .arg(config.source_dir.to_string_lossy())
        .arg("-B")
        .arg(config.build_dir.to_string_lossy());

    if let Some(generator) = &config.generator {
        cmd = cmd.arg("-G").arg(generator);
    }
    if let Some(toolchain) = &config.toolchain_file {
        cmd = cmd.arg(format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain));
    }
    if config.platform.selects_compiler_via_cmake() && config.compiler != Compiler::Msvc {
        let (cc, cxx) = config.compiler.drivers();
        cmd = cmd
            .arg(format!("-DCMAKE_C_COMPILER={}", cc))
            .arg(format!("-DCMAKE_CXX_COMPILER={}", cxx));
    }

    cmd.arg(format!("-DCMAKE_CXX_FLAGS=-{}", config.optimization_level))
        .arg("-DCMAKE_BUILD_TYPE=Release")
        .args(config.extra_args.iter().cloned())
}

pub fn build_command(config: &EffectiveConfig) -> CommandLine {
    let cmd = CommandLine::new("cmake")
        .arg("--build")
        .arg(config.build_dir.to_string_lossy())
        .arg("--parallel")
        .arg(config.jobs.to_string());
    with_release_config(cmd, config)
}

pub fn clean_command(config: &EffectiveConfig) -> CommandLine {
    let cmd = CommandLine::new("cmake")
        .arg("--build")
        .arg(config.build_dir.to_string_lossy())
        .arg("--target")
        .arg("clean");
    with_release_config(cmd, config)
}

fn with_release_config(cmd: CommandLine, config: &EffectiveConfig) -> CommandLine {
    if is_multi_config(config.platform, config.generator.as_deref()) {
        cmd.arg("--config").arg("Release")
    } else {
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::Detection;
    use std::path::PathBuf;

    fn linux_config() -> EffectiveConfig {
        EffectiveConfig {
            platform: Platform::Linux,
            source_dir: PathBuf::from("/ws"),
            build_dir: PathBuf::from("/ws/build"),
            generator: Some("Ninja".to_string()),
            compiler: Compiler::Gcc,
            jobs: 8,
            max_jobs: 16,
            optimization_level: "O3".to_string(),
            toolchain_file: None,
            extra_args: Vec::new(),
            activation_script: None,
            detection: Detection::default(),
        }
    }

    #[test]
    fn test_linux_configure_line() {
        let cmd = configure_command(&linux_config());
        assert_eq!(
            cmd.to_string(),
            "cmake -S /ws -B /ws/build -G Ninja -DCMAKE_C_COMPILER=gcc \
             -DCMAKE_CXX_COMPILER=g++ -DCMAKE_CXX_FLAGS=-O3 -DCMAKE_BUILD_TYPE=Release"
        );
    }

    #[test]
    fn test_generator_with_spaces_stays_one_argument() {
        let mut config = linux_config();
        config.generator = Some("Unix Makefiles".to_string());
        config.extra_args = vec!["-DBUILD_TESTING=OFF".to_string()];
        let cmd = configure_command(&config);

        let g = cmd.args.iter().position(|a| a == "-G").unwrap();
        assert_eq!(cmd.args[g + 1], "Unix Makefiles");
        assert_eq!(cmd.args.last().unwrap(), "-DBUILD_TESTING=OFF");
    }

    #[test]
    fn test_windows_configure_has_toolchain_and_no_compiler_flags() {
        let mut config = linux_config();
        config.platform = Platform::Windows;
        config.compiler = Compiler::Msvc;
        config.generator = None;
        config.optimization_level = "O2".to_string();
        config.toolchain_file = Some("C:/vcpkg/scripts/buildsystems/vcpkg.cmake".to_string());

        let line = configure_command(&config).to_string();
        assert!(line.contains("-DCMAKE_TOOLCHAIN_FILE=C:/vcpkg/scripts/buildsystems/vcpkg.cmake"));
        assert!(!line.contains("-G"));
        assert!(!line.contains("CMAKE_C_COMPILER"));
        assert!(line.contains("-DCMAKE_CXX_FLAGS=-O2"));
    }

    #[test]
    fn test_build_line_single_config() {
        let cmd = build_command(&linux_config());
        assert_eq!(cmd.to_string(), "cmake --build /ws/build --parallel 8");
    }

    #[test]
    fn test_build_line_multi_config() {
        let mut config = linux_config();
        config.generator = Some("Ninja Multi-Config".to_string());
        assert!(build_command(&config).to_string().ends_with("--config Release"));

        config.platform = Platform::Windows;
        config.generator = None;
        assert!(build_command(&config).to_string().ends_with("--config Release"));
    }

    #[test]
    fn test_multi_config_detection() {
        assert!(is_multi_config(Platform::Linux, Some("Visual Studio 17 2022")));
        assert!(is_multi_config(Platform::MacOs, Some("Xcode")));
        assert!(!is_multi_config(Platform::Windows, Some("NMake Makefiles")));
        assert!(!is_multi_config(Platform::Linux, None));
        assert!(is_multi_config(Platform::Windows, None));
    }

    #[test]
    fn test_clean_line() {
        assert_eq!(
            clean_command(&linux_config()).to_string(),
            "cmake --build /ws/build --target clean"
        );
    }
}
