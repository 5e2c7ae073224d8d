use config::builder::DefaultState;
use config::ConfigBuilder;
use farewatch_core::RetryPolicy;
use farewatch_offer::TrendConfig;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub trend: TrendSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Connection to the external flight offers API
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_max_offers")]
    pub max_offers: u32,
    #[serde(default = "default_reauth_attempts")]
    pub reauth_attempts: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String { "https://test.api.amadeus.com".to_string() }
fn default_max_offers() -> u32 { 50 }
fn default_reauth_attempts() -> u32 { 1 }
fn default_request_timeout() -> u64 { 30 }

impl SourceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy { reauth_attempts: self.reauth_attempts }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrendSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_inter_batch_delay")]
    pub inter_batch_delay_ms: u64,
    #[serde(default = "default_range_padding")]
    pub range_padding_days: u64,
    pub gap_fill_timeout_ms: Option<u64>,
}

fn default_batch_size() -> usize { 5 }
fn default_inter_batch_delay() -> u64 { 200 }
fn default_range_padding() -> u64 { 5 }

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            inter_batch_delay_ms: default_inter_batch_delay(),
            range_padding_days: default_range_padding(),
            gap_fill_timeout_ms: None,
        }
    }
}

impl TrendSettings {
    pub fn trend_config(&self) -> TrendConfig {
        TrendConfig {
            batch_size: self.batch_size,
            inter_batch_delay: Duration::from_millis(self.inter_batch_delay_ms),
            range_padding_days: self.range_padding_days,
            gap_fill_timeout: self.gap_fill_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file, if any
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `FAREWATCH__SOURCE__CLIENT_SECRET=...` sets `source.client_secret`
            .add_source(config::Environment::with_prefix("FAREWATCH").separator("__"));

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Result<Config, config::ConfigError> {
        Config::from_builder(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn test_defaults_apply() {
        let config = parse(
            r#"
            [server]
            port = 8080

            [source]
            client_id = "id"
            client_secret = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.base_url, "https://test.api.amadeus.com");
        assert_eq!(config.source.retry_policy(), RetryPolicy { reauth_attempts: 1 });
        assert_eq!(config.trend.trend_config(), TrendConfig::default());
    }

    #[test]
    fn test_trend_overrides() {
        let config = parse(
            r#"
            [server]
            port = 8080

            [source]
            client_id = "id"
            client_secret = "secret"

            [trend]
            batch_size = 3
            inter_batch_delay_ms = 500
            gap_fill_timeout_ms = 15000
            "#,
        )
        .unwrap();

        let trend = config.trend.trend_config();
        assert_eq!(trend.batch_size, 3);
        assert_eq!(trend.inter_batch_delay, Duration::from_millis(500));
        assert_eq!(trend.range_padding_days, 5);
        assert_eq!(trend.gap_fill_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        assert!(parse("[server]\nport = 8080\n[source]\n").is_err());
    }
}
