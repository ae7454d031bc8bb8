// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Measurement and server settings are validated at boot-up time and any
//! invalid field results in a HardValidationError. Client timeouts are the
//! exception: they are resolved leniently from environment, then file, then
//! defaults, and an unusable value simply falls through to the next source.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HardValidationError, VerbenchError, VerbenchResult};

pub const CONNECT_TIMEOUT_ENV: &str = "VERBENCH_CONNECT_TIMEOUT_MS";
pub const READ_TIMEOUT_ENV: &str = "VERBENCH_READ_TIMEOUT_MS";
pub const WRITE_TIMEOUT_ENV: &str = "VERBENCH_WRITE_TIMEOUT_MS";

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 120_000;

/// Raw client section. Timeouts stay untyped so bad values can be ignored.
#[derive(Debug, Deserialize)]
struct RawClientConfig {
    #[serde(default)]
    connect_timeout_ms: Option<serde_yaml::Value>,
    #[serde(default)]
    read_timeout_ms: Option<serde_yaml::Value>,
    #[serde(default)]
    write_timeout_ms: Option<serde_yaml::Value>,
    #[serde(default = "default_retry")]
    retry_on_connection_failure: bool,
    #[serde(default = "default_connection_retries")]
    connection_retries: u32,
}

fn default_retry() -> bool {
    true
}

fn default_connection_retries() -> u32 {
    1
}

impl Default for RawClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            read_timeout_ms: None,
            write_timeout_ms: None,
            retry_on_connection_failure: default_retry(),
            connection_retries: default_connection_retries(),
        }
    }
}

/// Raw measurement section.
#[derive(Debug, Deserialize)]
struct RawMeasurementConfig {
    #[serde(default)]
    threads: Option<usize>,
    #[serde(default = "default_warmup_ms")]
    warmup_ms: u64,
    #[serde(default = "default_measurement_ms")]
    measurement_ms: u64,
}

fn default_warmup_ms() -> u64 {
    1_000
}

fn default_measurement_ms() -> u64 {
    5_000
}

impl Default for RawMeasurementConfig {
    fn default() -> Self {
        Self {
            threads: None,
            warmup_ms: default_warmup_ms(),
            measurement_ms: default_measurement_ms(),
        }
    }
}

/// Raw server section.
#[derive(Debug, Default, Deserialize)]
struct RawServerConfig {
    #[serde(default)]
    port: u16,
    #[serde(default)]
    trace_requests: bool,
}

/// Raw root configuration file.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    client: RawClientConfig,
    #[serde(default)]
    measurement: RawMeasurementConfig,
    #[serde(default)]
    server: RawServerConfig,
    #[serde(default)]
    versions: Vec<String>,
}

/// Resolved HTTP client settings. Timeouts are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub retry_on_connection_failure: bool,
    pub connection_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
            retry_on_connection_failure: true,
            connection_retries: 1,
        }
    }
}

impl ClientSettings {
    /// Resolve timeouts from the process environment over the defaults.
    pub fn from_env() -> Self {
        Self::resolve(env_lookup, &RawClientConfig::default())
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>, raw: &RawClientConfig) -> Self {
        let timeout = |env: &str, file: &Option<serde_yaml::Value>, default: u64| {
            Duration::from_millis(resolve_timeout_ms(
                [lookup(env), file.as_ref().and_then(yaml_scalar)],
                default,
            ))
        };

        Self {
            connect_timeout: timeout(
                CONNECT_TIMEOUT_ENV,
                &raw.connect_timeout_ms,
                DEFAULT_CONNECT_TIMEOUT_MS,
            ),
            read_timeout: timeout(READ_TIMEOUT_ENV, &raw.read_timeout_ms, DEFAULT_READ_TIMEOUT_MS),
            write_timeout: timeout(
                WRITE_TIMEOUT_ENV,
                &raw.write_timeout_ms,
                DEFAULT_WRITE_TIMEOUT_MS,
            ),
            retry_on_connection_failure: raw.retry_on_connection_failure,
            connection_retries: raw.connection_retries,
        }
    }
}

/// First candidate that parses to a positive integer, else `default`.
pub fn resolve_timeout_ms<I>(candidates: I, default: u64) -> u64
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .find_map(|raw| match raw.trim().parse::<i64>() {
            Ok(value) if value > 0 => Some(value as u64),
            _ => None,
        })
        .unwrap_or(default)
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Validated measurement settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementSettings {
    /// Worker threads; `None` lets the runner pick one per CPU.
    pub threads: Option<usize>,
    pub warmup: Duration,
    pub measurement: Duration,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            threads: None,
            warmup: Duration::from_millis(default_warmup_ms()),
            measurement: Duration::from_millis(default_measurement_ms()),
        }
    }
}

/// Validated server settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerSettings {
    /// Listening port; 0 picks an ephemeral one.
    pub port: u16,
    pub trace_requests: bool,
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientSettings,
    pub measurement: MeasurementSettings,
    pub server: ServerSettings,
    pub versions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientSettings::from_env(),
            measurement: MeasurementSettings::default(),
            server: ServerSettings::default(),
            versions: Vec::new(),
        }
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> VerbenchResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(VerbenchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| VerbenchError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> VerbenchResult<Config> {
        Self::load_string_with(content, env_lookup)
    }

    /// Same as [`ConfigLoader::load_string`] with an explicit environment.
    pub fn load_string_with(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> VerbenchResult<Config> {
        let raw: RawConfig = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| VerbenchError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?
        };

        Self::validate(raw, lookup)
    }

    fn validate(raw: RawConfig, lookup: impl Fn(&str) -> Option<String>) -> VerbenchResult<Config> {
        let client = ClientSettings::resolve(lookup, &raw.client);
        let measurement = Self::validate_measurement(raw.measurement)?;

        if raw.server.port != 0 && raw.server.port < 1024 {
            return Err(HardValidationError::InvalidPort {
                port: raw.server.port,
                reason: "Privileged ports are not used for benchmarks".to_string(),
            }
            .into());
        }

        let versions = raw
            .versions
            .iter()
            .flat_map(|v| parse_version_tokens(v))
            .collect();

        Ok(Config {
            client,
            measurement,
            server: ServerSettings {
                port: raw.server.port,
                trace_requests: raw.server.trace_requests,
            },
            versions,
        })
    }

    fn validate_measurement(raw: RawMeasurementConfig) -> VerbenchResult<MeasurementSettings> {
        const MAX_THREADS: usize = 1024;

        if let Some(threads) = raw.threads {
            if threads == 0 || threads > MAX_THREADS {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "threads",
                    value: threads.to_string(),
                    reason: format!("Must be between 1 and {}", MAX_THREADS),
                }
                .into());
            }
        }

        if raw.measurement_ms == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "measurement_ms",
                value: "0".to_string(),
                reason: "Measurement time must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(MeasurementSettings {
            threads: raw.threads,
            warmup: Duration::from_millis(raw.warmup_ms),
            measurement: Duration::from_millis(raw.measurement_ms),
        })
    }
}

/// Split a raw version list on commas and whitespace.
pub fn parse_version_tokens(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const VALID_CONFIG: &str = r#"
client:
  connect_timeout_ms: 2000
  read_timeout_ms: "30000"
  retry_on_connection_failure: false

measurement:
  threads: 8
  warmup_ms: 500
  measurement_ms: 2000

server:
  port: 0
  trace_requests: true

versions:
  - v3
  - "v4, v5"
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string_with(VALID_CONFIG, no_env).unwrap();
        assert_eq!(config.client.connect_timeout, Duration::from_millis(2000));
        assert_eq!(config.client.read_timeout, Duration::from_millis(30000));
        assert_eq!(
            config.client.write_timeout,
            Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS)
        );
        assert!(!config.client.retry_on_connection_failure);
        assert_eq!(config.measurement.threads, Some(8));
        assert!(config.server.trace_requests);
        assert_eq!(config.versions, vec!["v3", "v4", "v5"]);
    }

    #[test]
    fn test_defaults_applied() {
        let config = ConfigLoader::load_string_with("", no_env).unwrap();
        assert_eq!(config.client, ClientSettings::default());
        assert_eq!(config.measurement.threads, None);
        assert_eq!(config.measurement.measurement, Duration::from_millis(5000));
        assert!(config.versions.is_empty());
    }

    #[test]
    fn test_bad_timeouts_fall_back_to_defaults() {
        let yaml = r#"
client:
  connect_timeout_ms: -5
  read_timeout_ms: soon
  write_timeout_ms: 0
"#;
        let config = ConfigLoader::load_string_with(yaml, no_env).unwrap();
        assert_eq!(config.client, ClientSettings::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        let yaml = r#"
client:
  connect_timeout_ms: 2000
  read_timeout_ms: 3000
"#;
        let lookup = |key: &str| match key {
            CONNECT_TIMEOUT_ENV => Some("750".to_string()),
            READ_TIMEOUT_ENV => Some("not-a-number".to_string()),
            _ => None,
        };
        let config = ConfigLoader::load_string_with(yaml, lookup).unwrap();
        assert_eq!(config.client.connect_timeout, Duration::from_millis(750));
        // Unusable env value falls through to the file value.
        assert_eq!(config.client.read_timeout, Duration::from_millis(3000));
    }

    #[test]
    fn test_resolve_timeout_ms() {
        assert_eq!(resolve_timeout_ms([Some("250".to_string())], 15_000), 250);
        assert_eq!(resolve_timeout_ms([Some("-1".to_string())], 15_000), 15_000);
        assert_eq!(resolve_timeout_ms([Some("abc".to_string()), None], 15_000), 15_000);
        assert_eq!(resolve_timeout_ms([None, Some(" 42 ".to_string())], 1), 42);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let yaml = r#"
measurement:
  threads: 0
"#;
        assert!(ConfigLoader::load_string_with(yaml, no_env).is_err());
    }

    #[test]
    fn test_zero_measurement_rejected() {
        let yaml = r#"
measurement:
  measurement_ms: 0
"#;
        assert!(ConfigLoader::load_string_with(yaml, no_env).is_err());
    }

    #[test]
    fn test_privileged_port_rejected() {
        let yaml = r#"
server:
  port: 80
"#;
        assert!(ConfigLoader::load_string_with(yaml, no_env).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load_file("/nonexistent/verbench.yaml");
        assert!(matches!(result, Err(VerbenchError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("verbench.yaml");
        std::fs::write(&path, "versions: [v5]\n").unwrap();
        let config = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(config.versions, vec!["v5"]);
    }

    #[test]
    fn test_parse_version_tokens() {
        assert_eq!(parse_version_tokens("v3, v4\tv5,,"), vec!["v3", "v4", "v5"]);
        assert!(parse_version_tokens("  ").is_empty());
    }
}
