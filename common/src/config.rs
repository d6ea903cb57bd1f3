// Configuration management with layered configuration (defaults, file, env)

use crate::errors::ValidationError;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables used by earlier deployments, mapped onto settings keys
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("WHAPI_API_KEY", "gateway.api_key"),
    ("GOOGLE_API_KEY", "source.api_key"),
    ("GOOGLE_SPREADSHEET_ID", "source.spreadsheet_id"),
];

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub source: SourceConfig,
    pub scheduler: SchedulerConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: String,
    pub api_key: String,
    /// Per-request timeout; transport defaults apply when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub spreadsheet_id: String,
    pub api_key: String,
    pub range: String,
    #[serde(default)]
    pub columns: ColumnLayout,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Zero-based column positions of record fields within a sheet row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub name: usize,
    pub agent_number: usize,
    pub address: usize,
    #[serde(default)]
    pub agent_name: Option<usize>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            name: 0,
            agent_number: 1,
            address: 2,
            agent_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub poll_interval_seconds: u64,
    #[serde(default)]
    pub invalid_number_policy: InvalidNumberPolicy,
}

/// What a cycle does after a record's agent number fails normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidNumberPolicy {
    /// Stop processing the remaining new records of the cycle
    #[default]
    AbortCycle,
    /// Skip only the offending record
    SkipRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env → legacy env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        Self::load_with_env(config_dir, |key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to resolve legacy environment variables
    pub fn load_with_env<P, F>(config_dir: P, lookup: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let config_dir = config_dir.as_ref();

        let mut builder = Config::builder()
            // Start with built-in defaults
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV_OVERRIDES {
            let value = lookup(var).filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.gateway.url.is_empty() {
            return Err(ValidationError::MissingField("gateway.url".to_string()));
        }
        if self.gateway.api_key.is_empty() {
            return Err(ValidationError::MissingField("gateway.api_key".to_string()));
        }
        check_timeout("gateway.timeout_seconds", self.gateway.timeout_seconds)?;

        if self.source.base_url.is_empty() {
            return Err(ValidationError::MissingField("source.base_url".to_string()));
        }
        if self.source.spreadsheet_id.is_empty() {
            return Err(ValidationError::MissingField(
                "source.spreadsheet_id".to_string(),
            ));
        }
        if self.source.api_key.is_empty() {
            return Err(ValidationError::MissingField("source.api_key".to_string()));
        }
        if self.source.range.is_empty() {
            return Err(ValidationError::MissingField("source.range".to_string()));
        }
        check_timeout("source.timeout_seconds", self.source.timeout_seconds)?;

        let columns = &self.source.columns;
        if columns.name == columns.agent_number
            || columns.name == columns.address
            || columns.agent_number == columns.address
        {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.columns".to_string(),
                reason: "name, agent_number and address must use distinct columns".to_string(),
            });
        }

        if self.scheduler.poll_interval_seconds == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "scheduler.poll_interval_seconds".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn check_timeout(field: &str, timeout_seconds: Option<u64>) -> Result<(), ValidationError> {
    if timeout_seconds == Some(0) {
        return Err(ValidationError::InvalidFieldValue {
            field: field.to_string(),
            reason: "must be greater than 0 when set".to_string(),
        });
    }
    Ok(())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig {
                url: "https://gate.whapi.cloud/messages/text".to_string(),
                api_key: String::new(),
                timeout_seconds: None,
            },
            source: SourceConfig {
                base_url: "https://sheets.googleapis.com".to_string(),
                spreadsheet_id: String::new(),
                api_key: String::new(),
                range: "NOTIFICAÇÕES (NÃO MEXER)!A2:C".to_string(),
                columns: ColumnLayout::default(),
                timeout_seconds: None,
            },
            scheduler: SchedulerConfig {
                poll_interval_seconds: 120,
                invalid_number_policy: InvalidNumberPolicy::AbortCycle,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: None,
            },
        }
    }
}
