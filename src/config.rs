use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("gateway settings validation failed: {0}")]
    Validation(String),
}

/// Everything the gateway needs at construction time. Nothing is read from
/// ambient process state once this struct exists.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub worker: WorkerConfig,
    pub store: StoreConfig,
    /// Append-only invocation log. Logging is best-effort when unset or on
    /// write failure.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    pub script_dir: PathBuf,
    #[serde(default = "default_growth_script")]
    pub growth_script: String,
    #[serde(default = "default_chat_script")]
    pub chat_script: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub api_base: String,
    pub api_key: String,
    #[serde(default = "default_recommendations_table")]
    pub recommendations_table: String,
    #[serde(default = "default_checks_table")]
    pub checks_table: String,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_growth_script() -> String {
    "model_wrapper.py".to_string()
}

fn default_chat_script() -> String {
    "chatbot_wrapper.py".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

fn default_recommendations_table() -> String {
    "recommendations".to_string()
}

fn default_checks_table() -> String {
    "stunting_checks".to_string()
}

impl GatewayConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.interpreter.trim().is_empty() {
            return Err(ConfigError::Validation(
                "worker.interpreter must not be empty".to_string(),
            ));
        }
        if self.worker.growth_script.trim().is_empty()
            || self.worker.chat_script.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "worker scripts must not be empty".to_string(),
            ));
        }
        if self.worker.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "worker.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.worker.max_concurrent == 0 {
            return Err(ConfigError::Validation(
                "worker.max_concurrent must be greater than zero".to_string(),
            ));
        }
        if self.store.api_base.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store.api_base must not be empty".to_string(),
            ));
        }
        if self.store.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store.api_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
