//! Logger setup shared by both binaries.

use env_logger::Env;

/// Filter variable, e.g. `AUTOBUILD_LOG=debug`.
pub const LOG_ENV: &str = "AUTOBUILD_LOG";

pub fn init() {
    env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, "warn"))
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .try_init()
        .ok();
}
