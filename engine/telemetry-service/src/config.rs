//! Service configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use telemetry_engine::SimulationConfig;
use telemetry_stream::StreamConfig;

/// Main service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// TelemetryEngine configuration
    pub simulation: SimulationConfig,

    /// StreamDriver configuration
    pub stream: StreamConfig,

    /// Service-level configuration
    pub service: ServiceSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// JSON device catalog (if None, the built-in catalog is used)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_file: Option<PathBuf>,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { catalog_file: None, shutdown_timeout_secs: 5 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

/// Load configuration from an optional file and the process environment
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => {
            tracing::debug!("Loading configuration from file: {:?}", path);
            load_from_file(path)?
        }
        None => ServiceConfig::default(),
    };

    // Override with environment variables
    load_from_env(&mut config, |key| std::env::var(key).ok())?;

    // Validate configuration
    validate_config(&config)?;

    Ok(config)
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path) -> Result<ServiceConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse configuration file: {:?}", path))
}

/// Apply `TELEMETRY_*` overrides read through `lookup`
pub fn load_from_env<F>(config: &mut ServiceConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(level) = lookup("TELEMETRY_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = lookup("TELEMETRY_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Some(interval) = lookup("TELEMETRY_STREAM_INTERVAL_MS") {
        config.stream.interval_ms = interval
            .parse()
            .with_context(|| format!("Invalid TELEMETRY_STREAM_INTERVAL_MS: {interval}"))?;
    }

    if let Some(seed) = lookup("TELEMETRY_SEED") {
        let seed = seed.parse().with_context(|| format!("Invalid TELEMETRY_SEED: {seed}"))?;
        config.simulation.seed = Some(seed);
    }

    if let Some(catalog) = lookup("TELEMETRY_CATALOG_FILE") {
        config.service.catalog_file = Some(PathBuf::from(catalog));
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    // Validate log level
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    // Validate log format
    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    config.simulation.validate().context("Invalid simulation configuration")?;
    config.stream.validate().context("Invalid stream configuration")?;

    if let Some(catalog) = &config.service.catalog_file {
        if !catalog.exists() {
            return Err(anyhow::anyhow!("Catalog file not found: {:?}", catalog));
        }
    }

    Ok(())
}

/// Save configuration to a TOML file
pub fn save_config(config: &ServiceConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write configuration file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert_ok!(validate_config(&config));
        assert_eq!(config.stream.interval_ms, 5000);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServiceConfig::default();
        let lookup = env(&[
            ("TELEMETRY_LOG_LEVEL", "debug"),
            ("TELEMETRY_LOG_FORMAT", "json"),
            ("TELEMETRY_STREAM_INTERVAL_MS", "250"),
            ("TELEMETRY_SEED", "17"),
        ]);

        assert_ok!(load_from_env(&mut config, lookup));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.stream.interval_ms, 250);
        assert_eq!(config.simulation.seed, Some(17));
        assert_ok!(validate_config(&config));
    }

    #[test]
    fn test_malformed_env_value() {
        let mut config = ServiceConfig::default();
        assert_err!(load_from_env(&mut config, env(&[("TELEMETRY_SEED", "abc")])));
        assert_err!(load_from_env(&mut config, env(&[("TELEMETRY_STREAM_INTERVAL_MS", "-5")])));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = ServiceConfig::default();
        config.logging.level = "verbose".to_string();
        assert_err!(validate_config(&config));

        let mut config = ServiceConfig::default();
        config.stream.interval_ms = 0;
        assert_err!(validate_config(&config));

        let mut config = ServiceConfig::default();
        config.simulation.transition.flip_probability = 2.0;
        assert_err!(validate_config(&config));

        let mut config = ServiceConfig::default();
        config.service.catalog_file = Some(PathBuf::from("/nonexistent/catalog.json"));
        assert_err!(validate_config(&config));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");

        let mut config = ServiceConfig::default();
        config.stream.interval_ms = 1000;
        config.simulation.seed = Some(5);
        config.logging.format = "pretty".to_string();

        assert_ok!(save_config(&config, &path));
        let loaded = assert_ok!(load_from_file(&path));
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        let content = "[stream]\ninterval_ms = 750\n\n[simulation.transition]\nmax_drift = 1.5\n";
        std::fs::write(&path, content).unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.stream.interval_ms, 750);
        assert_eq!(loaded.simulation.transition.max_drift, 1.5);
        assert_eq!(loaded.logging, LoggingConfig::default());
    }
}
