//! Host platform model.
//!
//! The workspace only distinguishes three hosts. Everything that differs between
//! them (persisted key, library search locations, required tools, fallback
//! generators) is answered by a method on [`Platform`], so the rest of the
//! crate matches on the enum once instead of comparing strings.

use crate::probe::{Dependency, LibrarySpec};
use crate::toolchain::Compiler;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
}

/// Tools every platform needs.
const COMMON_TOOLS: &[Dependency] = &[
    Dependency::new("cmake", &["cmake", "--version"], Some("3.5.0"), "CMake"),
    Dependency::new("git", &["git", "--version"], Some("2.0.0"), "Git"),
];

const WINDOWS_TOOLS: &[Dependency] = &[
    Dependency::new("ninja", &["ninja", "--version"], Some("1.8.0"), "Ninja Build"),
    Dependency::new("cl", &["cl", "/?"], None, "MSVC Compiler"),
    Dependency::new("vcpkg", &["vcpkg", "version"], None, "vcpkg Package Manager"),
];

const LINUX_TOOLS: &[Dependency] = &[
    Dependency::new("g++", &["g++", "--version"], Some("7.0.0"), "GCC C++ Compiler"),
    Dependency::new("make", &["make", "--version"], Some("4.0"), "GNU Make"),
];

const MACOS_TOOLS: &[Dependency] = &[Dependency::new(
    "clang++",
    &["clang++", "--version"],
    Some("9.0.0"),
    "Clang C++ Compiler",
)];

const WINDOWS_LIBRARIES: &[LibrarySpec] = &[
    LibrarySpec::new("JsonCpp", "jsoncpp*.dll"),
    LibrarySpec::new("OpenSSL", "libssl*.dll"),
    LibrarySpec::new("OpenSSL Crypto", "libcrypto*.dll"),
    LibrarySpec::new("zlib", "zlib*.dll"),
    LibrarySpec::new("Brotli", "brotli*.dll"),
    LibrarySpec::new("UUID", "uuid*.dll"),
];

const LINUX_LIBRARIES: &[LibrarySpec] = &[
    LibrarySpec::new("JsonCpp", "libjsoncpp.so*"),
    LibrarySpec::new("OpenSSL", "libssl.so*"),
    LibrarySpec::new("OpenSSL Crypto", "libcrypto.so*"),
    LibrarySpec::new("zlib", "libz.so*"),
    LibrarySpec::new("Brotli", "libbrotli*.so*"),
    LibrarySpec::new("UUID", "libuuid.so*"),
];

const MACOS_LIBRARIES: &[LibrarySpec] = &[
    LibrarySpec::new("JsonCpp", "libjsoncpp*.dylib"),
    LibrarySpec::new("OpenSSL", "libssl*.dylib"),
    LibrarySpec::new("OpenSSL Crypto", "libcrypto*.dylib"),
    LibrarySpec::new("zlib", "libz*.dylib"),
    LibrarySpec::new("Brotli", "libbrotli*.dylib"),
    LibrarySpec::new("UUID", "libuuid*.dylib"),
];

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Key used in `build_optimizations.json` and the environment report.
    pub fn key(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOs => "darwin",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "windows" => Some(Platform::Windows),
            "linux" => Some(Platform::Linux),
            "darwin" | "macos" => Some(Platform::MacOs),
            _ => None,
        }
    }

    pub fn default_compiler(self) -> Compiler {
        match self {
            Platform::Windows => Compiler::Msvc,
            Platform::Linux => Compiler::Gcc,
            Platform::MacOs => Compiler::Clang,
        }
    }

    /// Upper bound for the default job count before any tuning happened.
    pub fn default_jobs_cap(self) -> usize {
        match self {
            Platform::MacOs => 8,
            Platform::Windows | Platform::Linux => 16,
        }
    }

    /// Whether compilers are selected through `CMAKE_<LANG>_COMPILER`.
    ///
    /// On Windows the compiler comes from the activated Visual Studio
    /// environment instead.
    pub fn selects_compiler_via_cmake(self) -> bool {
        !matches!(self, Platform::Windows)
    }

    /// Whether tools only work after running a vendor activation script.
    pub fn needs_activation(self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Whether CMake picks a multi-configuration generator when `-G` is omitted.
    pub fn implicit_generator_is_multi_config(self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Single-configuration makefile generator that ships with the platform.
    pub fn makefile_generator(self) -> &'static str {
        match self {
            Platform::Windows => "NMake Makefiles",
            Platform::Linux | Platform::MacOs => "Unix Makefiles",
        }
    }

    pub fn library_path_var(self) -> &'static str {
        match self {
            Platform::Windows => "PATH",
            Platform::MacOs => "DYLD_LIBRARY_PATH",
            Platform::Linux => "LD_LIBRARY_PATH",
        }
    }

    pub fn path_separator(self) -> char {
        match self {
            Platform::Windows => ';',
            Platform::Linux | Platform::MacOs => ':',
        }
    }

    /// Directories always searched after the library path variable.
    pub fn fallback_library_dirs(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => &[
                r"C:\Windows\System32",
                r"C:\vcpkg\installed\x64-windows\bin",
            ],
            Platform::MacOs => &["/usr/local/lib", "/usr/lib"],
            Platform::Linux => &["/usr/local/lib", "/usr/lib", "/usr/lib/x86_64-linux-gnu"],
        }
    }

    /// Well-known install locations prepended to the library search path
    /// when they exist.
    pub fn preferred_library_dirs(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => &[r"C:\vcpkg\installed\x64-windows\bin"],
            Platform::MacOs => &[
                "/usr/local/lib",
                "/usr/local/opt/openssl/lib",
                "/usr/local/opt/jsoncpp/lib",
            ],
            Platform::Linux => &["/usr/local/lib", "/usr/lib", "/usr/lib/x86_64-linux-gnu"],
        }
    }

    /// Tools the verification report checks, common ones first.
    pub fn required_tools(self) -> Vec<&'static Dependency> {
        let specific = match self {
            Platform::Windows => WINDOWS_TOOLS,
            Platform::Linux => LINUX_TOOLS,
            Platform::MacOs => MACOS_TOOLS,
        };
        COMMON_TOOLS.iter().chain(specific.iter()).collect()
    }

    pub fn required_libraries(self) -> &'static [LibrarySpec] {
        match self {
            Platform::Windows => WINDOWS_LIBRARIES,
            Platform::Linux => LINUX_LIBRARIES,
            Platform::MacOs => MACOS_LIBRARIES,
        }
    }

    /// Shell commands suggested when verification finds something missing.
    /// `package_manager` only matters on Linux.
    pub fn remediation_commands(self, package_manager: PackageManager) -> &'static [&'static str] {
        match (self, package_manager) {
            (Platform::Windows, _) => &[
                r"cd C:\vcpkg",
                r".\vcpkg install jsoncpp:x64-windows zlib:x64-windows openssl:x64-windows uuid:x64-windows",
                r".\vcpkg install brotli:x64-windows sqlite3:x64-windows libpq:x64-windows libmysql:x64-windows",
                r".\vcpkg integrate install",
            ],
            (Platform::MacOs, _) => &[
                "brew install cmake jsoncpp ossp-uuid zlib openssl brotli",
                "brew install sqlite3 postgresql mysql hiredis yaml-cpp",
            ],
            (Platform::Linux, PackageManager::Apt) => &[
                "sudo apt update",
                "sudo apt install -y libjsoncpp-dev uuid-dev zlib1g-dev openssl libssl-dev",
                "sudo apt install -y libsqlite3-dev libpq-dev libmysqlclient-dev libhiredis-dev",
            ],
            (Platform::Linux, PackageManager::Yum) => &[
                "sudo yum install -y jsoncpp-devel uuid-devel zlib-devel openssl-devel",
                "sudo yum install -y sqlite-devel postgresql-devel mysql-devel",
            ],
            (Platform::Linux, PackageManager::Unknown) => &[
                "Please install the required dependencies using your system's package manager.",
            ],
        }
    }

    /// Environment bootstrap script expected in the workspace root.
    pub fn setup_script_name(self) -> &'static str {
        match self {
            Platform::Windows => "setup_env.ps1",
            Platform::Linux | Platform::MacOs => "setup_env.sh",
        }
    }
}

/// Linux package manager found on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Yum,
    Unknown,
}

impl PackageManager {
    pub fn detect() -> Self {
        if std::path::Path::new("/usr/bin/apt").exists() {
            PackageManager::Apt
        } else if std::path::Path::new("/usr/bin/yum").exists() {
            PackageManager::Yum
        } else {
            PackageManager::Unknown
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
            Platform::MacOs => "macOS",
        };
        f.write_str(name)
    }
}
