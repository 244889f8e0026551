//! Environment variable naming for the gym booking configuration.
//!
//! Configuration keys map onto environment variables as
//! `<PREFIX>__<SECTION>__<KEY>`, e.g. `GYMBOOK__SERVER__PORT`.

use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "GYMBOOK";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to an environment variable name
///
/// # Arguments
///
/// * `path` - The configuration path (e.g., "server.host")
///
/// # Returns
///
/// The environment variable name (e.g., "GYMBOOK__SERVER__HOST")
pub fn config_path_to_env_var(path: &str) -> String {
    format_env_var(&get_config_prefix(), path)
}

fn format_env_var(prefix: &str, path: &str) -> String {
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Directory holding `default.*` and `<RUN_ENV>.*` config files.
pub fn config_dir() -> String {
    env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string())
}

/// The active run environment, `debug` unless `RUN_ENV` says otherwise.
pub fn run_env() -> String {
    env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_env_var() {
        assert_eq!(
            format_env_var(DEFAULT_PREFIX, "server.host"),
            "GYMBOOK__SERVER__HOST"
        );
        assert_eq!(
            format_env_var(DEFAULT_PREFIX, "booking.cancellation_notice_hours"),
            "GYMBOOK__BOOKING__CANCELLATION_NOTICE_HOURS"
        );
    }

    #[test]
    fn test_custom_prefix_is_uppercased() {
        assert_eq!(format_env_var("gym", "database.url"), "GYM__DATABASE__URL");
    }
}
