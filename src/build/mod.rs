mod clean;
pub mod command;
mod core;
pub mod executor;
pub mod resolve;
pub mod tuning;

pub use command::{CommandLine, build_command, clean_command, configure_command};
pub use self::core::BuildManager;
pub use executor::{Execution, ProcessRunner, Runner};
pub use resolve::{EffectiveConfig, ResolveInputs, resolve};
