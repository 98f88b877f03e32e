use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// SQLite connection string
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Maximum number of one job's images processed at once
    #[serde(default = "default_max_concurrent_images")]
    pub max_concurrent_images: usize,

    /// Per-image processing timeout; expiry counts as a failed image
    #[serde(default = "default_image_timeout_ms")]
    pub image_timeout_ms: u64,

    /// Lower bound of the simulated analysis latency
    #[serde(default = "default_analyzer_min_delay_ms")]
    pub analyzer_min_delay_ms: u64,

    /// Upper bound of the simulated analysis latency
    #[serde(default = "default_analyzer_max_delay_ms")]
    pub analyzer_max_delay_ms: u64,

    /// Probability in [0, 1] that a simulated analysis succeeds
    #[serde(default = "default_analyzer_success_rate")]
    pub analyzer_success_rate: f64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_url() -> String {
    "sqlite://visit_jobs.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_max_concurrent_images() -> usize {
    64
}

fn default_image_timeout_ms() -> u64 {
    30_000
}

fn default_analyzer_min_delay_ms() -> u64 {
    100
}

fn default_analyzer_max_delay_ms() -> u64 {
    400
}

fn default_analyzer_success_rate() -> f64 {
    0.9
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_images == 0 {
            return Err(ConfigError::Invalid(
                "MAX_CONCURRENT_IMAGES must be at least 1".to_string(),
            ));
        }
        if self.image_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "IMAGE_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }
        if self.analyzer_min_delay_ms > self.analyzer_max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "ANALYZER_MIN_DELAY_MS ({}) exceeds ANALYZER_MAX_DELAY_MS ({})",
                self.analyzer_min_delay_ms, self.analyzer_max_delay_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.analyzer_success_rate) {
            return Err(ConfigError::Invalid(format!(
                "ANALYZER_SUCCESS_RATE must be within [0, 1], got {}",
                self.analyzer_success_rate
            )));
        }
        Ok(())
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
