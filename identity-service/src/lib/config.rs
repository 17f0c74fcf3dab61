use std::env;
use std::path::PathBuf;

use auth::TokenIssuerConfig;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Database url that selects the in-process credential store.
pub const IN_MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    pub cookies: CookieConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url == IN_MEMORY_DATABASE_URL
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub access_expiration_minutes: i64,
    pub refresh_secret: String,
    pub refresh_expiration_days: i64,
    pub leeway_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    pub api_base_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
    pub upload_timeout_seconds: u64,
    pub temp_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieConfig {
    pub secure: bool,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__ACCESS_SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: MEDIA__CLOUD_NAME=acme overrides media.cloud_name
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }
}

impl JwtConfig {
    /// Token issuer settings; secret length and distinctness are checked by the issuer.
    pub fn token_issuer_config(&self) -> TokenIssuerConfig {
        TokenIssuerConfig::new(
            self.access_secret.as_bytes().to_vec(),
            self.refresh_secret.as_bytes().to_vec(),
        )
        .with_access_ttl(chrono::Duration::minutes(self.access_expiration_minutes))
        .with_refresh_ttl(chrono::Duration::days(self.refresh_expiration_days))
        .with_leeway_seconds(self.leeway_seconds)
    }
}
