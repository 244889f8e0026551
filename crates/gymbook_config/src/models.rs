use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/gymbook.db, overridable via GYMBOOK__DATABASE__URL
}

// --- Booking Policy ---
/// Policy knobs for the booking guard.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// Reject a booking when the member already holds an overlapping live appointment.
    #[serde(default = "default_true")]
    pub member_overlap_check: bool,
    /// Minimum notice, in hours, for a member-initiated cancellation. `0` disables the guard.
    #[serde(default = "default_notice_hours")]
    pub cancellation_notice_hours: u32,
    /// IANA zone name used to decide "today" and "now", e.g. `Europe/Istanbul`.
    #[serde(default)]
    pub time_zone: Option<String>,
    /// How often the guard retries an insert that lost to storage contention.
    #[serde(default = "default_insert_attempts")]
    pub max_insert_attempts: u32,
}

fn default_true() -> bool {
    true
}

fn default_notice_hours() -> u32 {
    24
}

fn default_insert_attempts() -> u32 {
    3
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            member_overlap_check: default_true(),
            cancellation_notice_hours: default_notice_hours(),
            time_zone: None,
            max_insert_attempts: default_insert_attempts(),
        }
    }
}

// --- Logging ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`. Defaults to `info`.
    pub level: Option<String>,
    /// When set, logs are additionally written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

// --- Catalog seeding ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceSeed {
    pub id: i64,
    pub name: String,
    /// Length of one session in minutes (15-180).
    pub duration_minutes: u32,
    /// Price in the smallest currency unit (e.g. kuruş, cents).
    pub price: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AvailabilitySeed {
    pub trainer_id: i64,
    /// "Mon" .. "Sun"
    pub day_of_week: String,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub services: Vec<ServiceSeed>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySeed>,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_database: bool,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}
