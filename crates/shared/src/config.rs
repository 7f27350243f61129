//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Upload limits.
    #[serde(default)]
    pub upload: UploadSettings,
    /// Leakage detection thresholds.
    #[serde(default)]
    pub detection: DetectionSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
///
/// Tokens are minted by an external identity service sharing this secret;
/// the backend only validates them.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for verifying token signatures.
    pub secret: String,
    /// Access token expiration in seconds (used by the dev seeder).
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    86400 // 24 hours
}

/// Upload limits applied before any parsing work begins.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024 // 10 MB
}

/// Thresholds for the leakage detection rules.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSettings {
    /// Absolute amount above which a transaction is flagged as anomalous.
    #[serde(default = "default_amount_ceiling")]
    pub amount_ceiling: Decimal,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            amount_ceiling: default_amount_ceiling(),
        }
    }
}

fn default_amount_ceiling() -> Decimal {
    Decimal::new(10_000, 0)
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("REVGUARD").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_settings_default() {
        let settings = UploadSettings::default();
        assert_eq!(settings.max_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_detection_settings_default() {
        let settings = DetectionSettings::default();
        assert_eq!(settings.amount_ceiling, Decimal::new(10_000, 0));
    }
}
