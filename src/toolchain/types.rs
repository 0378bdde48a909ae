use std::fmt;
use std::path::PathBuf;

/// Supported compiler families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compiler {
    /// Microsoft Visual C++ (cl.exe)
    Msvc,
    /// GNU Compiler Collection
    Gcc,
    /// Clang/LLVM
    Clang,
}

impl Compiler {
    /// Identifier stored in `build_optimizations.json`.
    pub fn key(self) -> &'static str {
        match self {
            Compiler::Msvc => "msvc",
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "msvc" | "cl" | "cl.exe" => Some(Compiler::Msvc),
            "gcc" | "g++" => Some(Compiler::Gcc),
            "clang" | "clang++" => Some(Compiler::Clang),
            _ => None,
        }
    }

    /// C and C++ driver names passed to CMake.
    pub fn drivers(self) -> (&'static str, &'static str) {
        match self {
            Compiler::Msvc => ("cl", "cl"),
            Compiler::Gcc => ("gcc", "g++"),
            Compiler::Clang => ("clang", "clang++"),
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A Visual Studio installation with a usable activation script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsInstall {
    /// Versioned root, e.g. `C:\Program Files\Microsoft Visual Studio\2022`.
    pub root: PathBuf,
    /// Edition directory below the root (`Community`, `BuildTools`, ...).
    pub edition: String,
    /// Path to `vcvarsall.bat`.
    pub activation_script: PathBuf,
}

impl VsInstall {
    /// CMake generator matching this installation's release year.
    pub fn generator(&self) -> &'static str {
        if self.root.to_string_lossy().contains("2022") {
            "Visual Studio 17 2022"
        } else {
            "Visual Studio 16 2019"
        }
    }
}

/// What the current machine offers, gathered once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub has_ninja: bool,
    /// First line of `gcc --version`, when gcc runs.
    pub gcc_version: Option<String>,
    /// First line of `clang --version`, when clang runs.
    pub clang_version: Option<String>,
    pub visual_studio: Option<VsInstall>,
}

impl Detection {
    pub fn has(&self, compiler: Compiler) -> bool {
        match compiler {
            Compiler::Gcc => self.gcc_version.is_some(),
            Compiler::Clang => self.clang_version.is_some(),
            Compiler::Msvc => self.visual_studio.is_some(),
        }
    }
}
