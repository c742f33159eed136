//! Configuration management for the brewery directory server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with BREWERY_ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// MapQuest geocoding
    pub geocoding: GeocodingConfig,

    /// TimeZoneDB lookup by position
    pub timezone: TimezoneConfig,

    /// Region and optional static keys shared by S3 and SES
    pub aws: AwsConfig,

    /// S3 bucket holding location and avatar images
    pub storage: StorageConfig,

    /// Outbound mail for password resets
    pub email: EmailConfig,

    pub search: SearchConfig,

    /// Limits applied to every outbound call
    pub external: ExternalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL (PostGIS enabled)
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    pub api_key: String,
    pub base_url: String,
    /// Country hint appended to postal-code lookups
    pub country: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimezoneConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    /// Lifetime of presigned URLs in seconds
    pub url_expiry_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub from_address: String,
    /// Lifetime of a password reset code in seconds
    pub reset_code_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Radius used when a search gives none
    pub default_radius_miles: f64,
    /// Minimum fuzzy score (0-100) for a name match
    pub fuzzy_threshold: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExternalConfig {
    pub timeout_ms: u64,
}

impl ExternalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("BREWERY_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("geocoding.base_url", "https://www.mapquestapi.com/geocoding/v1")?
            .set_default("geocoding.country", "US")?
            .set_default("timezone.base_url", "https://api.timezonedb.com/v2.1")?
            .set_default("aws.region", "us-east-1")?
            .set_default("aws.access_key_id", "")?
            .set_default("aws.secret_access_key", "")?
            .set_default("storage.url_expiry_secs", 3600)?
            .set_default("email.reset_code_expiry", 3600)?
            .set_default("search.default_radius_miles", 25.0)?
            .set_default("search.fuzzy_threshold", 70)?
            .set_default("external.timeout_ms", 5000)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BREWERY_ prefix)
            .add_source(
                Environment::with_prefix("BREWERY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
