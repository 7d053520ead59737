use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::{env, process};
use tracing::error;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpConfig {
    pub address: String,
    pub port: String,
}

/// Marketplace credentials and identity, threaded explicitly into the
/// gateway constructor. Call sites never read these from the process
/// environment.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AvinodeConfig {
    pub base_url: String,
    pub api_token: String,
    pub auth_token: String,
    pub act_as_account: String,
    pub product: String,
    pub api_version: String,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DbConfig {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebhookConfig {
    /// Shared secret for the `v1=<hex>` signature header; unset skips
    /// verification (sandbox webhooks arrive unsigned).
    #[serde(default)]
    pub secret: Option<String>,
    /// Minimum spacing between webhook-triggered refreshes of one trip.
    pub throttle_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobSchedule {
    pub seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CronConfig {
    pub refresh_sessions: JobSchedule,
    /// Sessions idle longer than this are left alone by the refresh.
    pub active_window_secs: u64,
    pub batch_limit: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub debug: bool,
    pub http: HttpConfig,
    pub avinode: AvinodeConfig,
    pub redis: RedisConfig,
    pub db: DbConfig,
    pub webhook: WebhookConfig,
    pub cron: CronConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let args: Vec<String> = env::args().collect();
        if args.len() < 2 {
            error!("❌ Error: Configuration path not provided. Usage: cargo run -- <config_path>");
            process::exit(1);
        }
        let config_path = &args[1];

        let config = Config::builder()
            .add_source(File::with_name(config_path))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}
