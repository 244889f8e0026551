use config::{Config, ConfigError, Environment, File, FileFormat};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use tracing::debug;

pub mod env_vars;
pub mod models;
pub use env_vars::config_path_to_env_var;
pub use models::*;

/// Loads the layered application configuration.
///
/// Sources, later ones winning:
///
/// 1. `<CONFIG_DIR>/default.*`
/// 2. `<CONFIG_DIR>/<RUN_ENV>.*`
/// 3. `<PREFIX>__SECTION__KEY` environment variables
///
/// All file sources are optional, so an empty environment yields the defaults.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let config_dir = PathBuf::from(env_vars::config_dir());
    let default_path = config_dir.join("default");
    let env_path = config_dir.join(env_vars::run_env());
    let prefix = env_vars::get_config_prefix();

    debug!(
        "Loading config from {} and {} (env prefix {})",
        default_path.display(),
        env_path.display(),
        prefix
    );

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    builder.build()?.try_deserialize()
}

/// Parses a configuration from an in-memory TOML document, without consulting
/// files or the environment.
pub fn config_from_toml(document: &str) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(File::from_str(document, FileFormat::Toml))
        .build()?
        .try_deserialize()
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The file is `DOTENV_OVERRIDE` if set, else the first command line argument
/// when it starts with `.env`, else `.env`. Loading happens at most once per
/// process; the chosen path is returned either way.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = config_from_toml("").unwrap();
        assert_eq!(config.server.port, 8086);
        assert!(!config.use_database);
        assert!(config.database.is_none());
        assert!(config.booking.member_overlap_check);
        assert_eq!(config.booking.cancellation_notice_hours, 24);
        assert_eq!(config.booking.max_insert_attempts, 3);
        assert!(config.catalog.services.is_empty());
    }

    #[test]
    fn booking_section_and_catalog_are_parsed() {
        let config = config_from_toml(
            r#"
            use_database = true

            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "sqlite:data/gym.db"

            [booking]
            member_overlap_check = false
            cancellation_notice_hours = 0
            time_zone = "Europe/Istanbul"

            [[catalog.services]]
            id = 1
            name = "Personal training"
            duration_minutes = 60
            price = 50000

            [[catalog.availability]]
            trainer_id = 7
            day_of_week = "Mon"
            start_time = "09:00"
            end_time = "18:00"
            "#,
        )
        .unwrap();

        assert!(config.use_database);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.unwrap().url, "sqlite:data/gym.db");
        assert!(!config.booking.member_overlap_check);
        assert_eq!(config.booking.cancellation_notice_hours, 0);
        assert_eq!(config.booking.time_zone.as_deref(), Some("Europe/Istanbul"));
        assert_eq!(config.catalog.services.len(), 1);
        assert!(config.catalog.services[0].is_active);
        assert_eq!(config.catalog.availability[0].day_of_week, "Mon");
    }
}
