/// Service configuration loader - floodwatch.toml with environment overrides
///
/// Separates scraping parameters from code so the source URL, timeouts, and
/// pool sizing can be tuned per deployment without recompiling. Precedence:
/// baked-in defaults < floodwatch.toml < environment variables.

use serde::Deserialize;
use std::env;
use std::fs;
use std::time::Duration;

/// Default source page. The PAGASA flood forecasting site renders the
/// station table client-side, which is why a plain HTTP fetch is useless.
pub const DEFAULT_SOURCE_URL: &str =
    "https://pasig-marikina-tullahanffws.pagasa.dost.gov.ph/water/table.do";

/// Readiness selector: the station table the page script populates.
pub const DEFAULT_READY_SELECTOR: &str = "table.table-type1";

/// Runtime configuration for the whole service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Page to scrape.
    pub source_url: String,
    /// CSS selector whose presence signals the table has rendered.
    pub ready_selector: String,
    /// Extra wait after the selector appears, for late row population.
    pub settle_secs: u64,
    /// Hard wall-clock deadline for one render attempt.
    pub render_timeout_secs: u64,
    /// Render+extract attempts before falling back to the cache.
    pub retry_attempts: u32,
    /// Pause between attempts.
    pub retry_backoff_secs: u64,
    /// Concurrent headless browser sessions (minimum 1).
    pub pool_size: usize,
    /// HTTP API port.
    pub endpoint_port: u16,
    /// HTTP worker threads.
    pub endpoint_workers: usize,
    /// Background refresh interval; None disables the poller.
    pub poll_interval_minutes: Option<u64>,
    /// Per-IP request budget per minute on API routes.
    pub rate_limit_per_minute: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            ready_selector: DEFAULT_READY_SELECTOR.to_string(),
            settle_secs: 15,
            render_timeout_secs: 90,
            retry_attempts: 3,
            retry_backoff_secs: 10,
            pool_size: 1,
            endpoint_port: 8080,
            endpoint_workers: 4,
            poll_interval_minutes: Some(5),
            rate_limit_per_minute: 100,
        }
    }
}

impl ServiceConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

/// On-disk shape of floodwatch.toml. Every field is optional; anything left
/// out keeps its default.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    source_url: Option<String>,
    ready_selector: Option<String>,
    settle_secs: Option<u64>,
    render_timeout_secs: Option<u64>,
    retry_attempts: Option<u32>,
    retry_backoff_secs: Option<u64>,
    pool_size: Option<usize>,
    endpoint_port: Option<u16>,
    endpoint_workers: Option<usize>,
    poll_interval_minutes: Option<u64>,
    rate_limit_per_minute: Option<u32>,
}

/// Loads configuration from `floodwatch.toml` in the working directory plus
/// `FLOODWATCH_*` environment variables.
///
/// # Panics
/// Panics if the file exists but is malformed, or an override variable fails
/// to parse. This is intentional — silently running with a half-applied
/// configuration is worse than refusing to start.
pub fn load_config() -> ServiceConfig {
    // .env is honored so DATABASE_URL and overrides ride along together.
    dotenv::dotenv().ok();

    let mut config = ServiceConfig::default();

    let config_path = "floodwatch.toml";
    if let Ok(contents) = fs::read_to_string(config_path) {
        let file: FileConfig = toml::from_str(&contents)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {}", config_path, e));
        apply_file(&mut config, file);
    }

    apply_env(&mut config);

    if config.pool_size == 0 {
        panic!("pool_size must be at least 1");
    }
    if config.retry_attempts == 0 {
        panic!("retry_attempts must be at least 1");
    }

    config
}

fn apply_file(config: &mut ServiceConfig, file: FileConfig) {
    if let Some(v) = file.source_url {
        config.source_url = v;
    }
    if let Some(v) = file.ready_selector {
        config.ready_selector = v;
    }
    if let Some(v) = file.settle_secs {
        config.settle_secs = v;
    }
    if let Some(v) = file.render_timeout_secs {
        config.render_timeout_secs = v;
    }
    if let Some(v) = file.retry_attempts {
        config.retry_attempts = v;
    }
    if let Some(v) = file.retry_backoff_secs {
        config.retry_backoff_secs = v;
    }
    if let Some(v) = file.pool_size {
        config.pool_size = v;
    }
    if let Some(v) = file.endpoint_port {
        config.endpoint_port = v;
    }
    if let Some(v) = file.endpoint_workers {
        config.endpoint_workers = v;
    }
    if let Some(v) = file.poll_interval_minutes {
        config.poll_interval_minutes = if v == 0 { None } else { Some(v) };
    }
    if let Some(v) = file.rate_limit_per_minute {
        config.rate_limit_per_minute = v;
    }
}

fn apply_env(config: &mut ServiceConfig) {
    if let Ok(v) = env::var("FLOODWATCH_SOURCE_URL") {
        config.source_url = v;
    }
    if let Ok(v) = env::var("FLOODWATCH_READY_SELECTOR") {
        config.ready_selector = v;
    }
    if let Ok(v) = env::var("FLOODWATCH_SETTLE_SECS") {
        config.settle_secs = parse_env("FLOODWATCH_SETTLE_SECS", &v);
    }
    if let Ok(v) = env::var("FLOODWATCH_RENDER_TIMEOUT_SECS") {
        config.render_timeout_secs = parse_env("FLOODWATCH_RENDER_TIMEOUT_SECS", &v);
    }
    if let Ok(v) = env::var("FLOODWATCH_RETRY_ATTEMPTS") {
        config.retry_attempts = parse_env("FLOODWATCH_RETRY_ATTEMPTS", &v);
    }
    if let Ok(v) = env::var("FLOODWATCH_RETRY_BACKOFF_SECS") {
        config.retry_backoff_secs = parse_env("FLOODWATCH_RETRY_BACKOFF_SECS", &v);
    }
    if let Ok(v) = env::var("FLOODWATCH_POOL_SIZE") {
        config.pool_size = parse_env("FLOODWATCH_POOL_SIZE", &v);
    }
    if let Ok(v) = env::var("FLOODWATCH_PORT") {
        config.endpoint_port = parse_env("FLOODWATCH_PORT", &v);
    }
    if let Ok(v) = env::var("FLOODWATCH_WORKERS") {
        config.endpoint_workers = parse_env("FLOODWATCH_WORKERS", &v);
    }
    if let Ok(v) = env::var("FLOODWATCH_POLL_INTERVAL_MINUTES") {
        let minutes: u64 = parse_env("FLOODWATCH_POLL_INTERVAL_MINUTES", &v);
        config.poll_interval_minutes = if minutes == 0 { None } else { Some(minutes) };
    }
    if let Ok(v) = env::var("FLOODWATCH_RATE_LIMIT_PER_MINUTE") {
        config.rate_limit_per_minute = parse_env("FLOODWATCH_RATE_LIMIT_PER_MINUTE", &v);
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> T {
    value
        .parse()
        .unwrap_or_else(|_| panic!("Invalid value for {}: {:?}", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_pagasa_water_table() {
        let config = ServiceConfig::default();
        assert!(
            config.source_url.contains("pagasa.dost.gov.ph"),
            "default source must be the PAGASA site, got {}",
            config.source_url
        );
        assert!(config.source_url.contains("/water/table.do"));
        assert_eq!(config.ready_selector, "table.table-type1");
    }

    #[test]
    fn test_default_budgets_are_sane() {
        let config = ServiceConfig::default();
        assert!(config.pool_size >= 1, "pool must hold at least one slot");
        assert!(config.retry_attempts >= 1);
        assert!(
            config.render_timeout_secs > config.settle_secs,
            "settle delay must fit inside the render deadline"
        );
    }

    #[test]
    fn test_file_values_override_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            render_timeout_secs = 30
            pool_size = 2
            poll_interval_minutes = 0
            "#,
        )
        .expect("valid toml should parse");

        let mut config = ServiceConfig::default();
        apply_file(&mut config, file);

        assert_eq!(config.render_timeout_secs, 30);
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.poll_interval_minutes, None, "0 disables the poller");
        // Untouched fields keep their defaults.
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn test_unknown_file_keys_are_tolerated() {
        // Extra keys in the file must not stop the service from starting.
        let file: Result<FileConfig, _> = toml::from_str("unrelated_key = 5\n");
        assert!(file.is_ok(), "extra keys should be tolerated");
    }

    #[test]
    fn test_duration_accessors() {
        let config = ServiceConfig::default();
        assert_eq!(config.render_timeout(), Duration::from_secs(90));
        assert_eq!(config.settle(), Duration::from_secs(15));
        assert_eq!(config.retry_backoff(), Duration::from_secs(10));
    }
}
