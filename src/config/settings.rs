use super::{database_path, default_state_root, ConfigError};
use crate::memory::MemoryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const BASE_URL_ENV_OVERRIDE: &str = "BOTSMITH_OLLAMA_BASE_URL";

fn default_model() -> String {
    "qwen2.5-coder:7b".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl BackendConfig {
    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Settings(format!(
                "`backends.{label}.model` must be non-empty"
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Settings(format!(
                "`backends.{label}.base_url` must be non-empty"
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Settings(format!(
                "`backends.{label}.timeout_seconds` must be >= 1"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BackendsConfig {
    #[serde(default)]
    pub local: BackendConfig,
    #[serde(default)]
    pub code: Option<BackendConfig>,
}

impl BackendsConfig {
    /// Code-generation agents fall back to the local backend when no
    /// dedicated code backend is configured.
    pub fn code_or_local(&self) -> &BackendConfig {
        self.code.as_ref().unwrap_or(&self.local)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub state_root: Option<PathBuf>,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw, path)
    }

    pub fn from_yaml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.state_root {
            if !root.is_absolute() {
                return Err(ConfigError::Settings(
                    "`state_root` must be an absolute path".to_string(),
                ));
            }
        }
        self.backends.local.validate("local")?;
        if let Some(code) = &self.backends.code {
            code.validate("code")?;
        }
        self.memory.validate().map_err(ConfigError::Settings)
    }

    pub fn resolve_state_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.state_root {
            Some(root) => Ok(root.clone()),
            None => default_state_root(),
        }
    }

    pub fn resolve_database_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(database_path(&self.resolve_state_root()?))
    }

    pub fn apply_env_overrides(&mut self) {
        let Some(base_url) = std::env::var(BASE_URL_ENV_OVERRIDE)
            .ok()
            .filter(|value| !value.trim().is_empty())
        else {
            return;
        };
        self.backends.local.base_url = base_url.clone();
        if let Some(code) = self.backends.code.as_mut() {
            code.base_url = base_url;
        }
    }
}
