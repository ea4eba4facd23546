//! Configuration management

use anyhow::{bail, Result};
use directories::ProjectDirs;
use pagechat_core::llm::{self, LlmConfig, Model, GROQ_ENDPOINT};
use pagechat_core::FetchConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page fetching
    #[serde(default)]
    pub fetch: FetchSection,

    /// Model settings
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Overrides the browser user agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub model: Model,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Used only when GROQ_API_KEY is not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: Model::default(),
            endpoint: default_endpoint(),
            timeout_secs: default_llm_timeout(),
            api_key: None,
        }
    }
}

// Default value functions
fn default_fetch_timeout() -> u64 {
    30
}
fn default_llm_timeout() -> u64 {
    120
}
fn default_endpoint() -> String {
    GROQ_ENDPOINT.to_string()
}

impl Config {
    /// Load `.env`, then the config file (or defaults), then apply the
    /// `GROQ_API_KEY` environment variable on top
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_toml(&fs::read_to_string(&path)?)?,
            _ => Self::default(),
        };

        if let Some(key) = llm::api_key_from_env() {
            config.llm.api_key = Some(key);
        }
        Ok(config)
    }

    fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to file. The API key is never written.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut on_disk = self.clone();
            on_disk.llm.api_key = None;
            fs::write(path, toml::to_string_pretty(&on_disk)?)?;
        }
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "pagechat", "pagechat")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Set a configuration value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "model" => {
                self.llm.model = value.parse().map_err(anyhow::Error::msg)?;
            }
            "endpoint" => {
                self.llm.endpoint = value.to_string();
            }
            "timeout" | "fetch.timeout" => {
                self.fetch.timeout_secs = value.parse()?;
            }
            "llm.timeout" => {
                self.llm.timeout_secs = value.parse()?;
            }
            "user_agent" => {
                self.fetch.user_agent = Some(value.to_string()).filter(|v| !v.is_empty());
            }
            _ => bail!("Unknown setting: {}", key),
        }
        Ok(())
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig {
            timeout_secs: self.fetch.timeout_secs,
            ..Default::default()
        };
        if let Some(user_agent) = &self.fetch.user_agent {
            config.user_agent = user_agent.clone();
        }
        config
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.llm.api_key.clone(),
            model: self.llm.model,
            endpoint: self.llm.endpoint.clone(),
            timeout_secs: self.llm.timeout_secs,
        }
    }

    /// Human-readable summary with the API key redacted
    pub fn describe(&self) -> String {
        let path = Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no config directory)".to_string());
        format!(
            "config file:   {}\nmodel:         {}\nendpoint:      {}\nfetch timeout: {}s\nllm timeout:   {}s\napi key:       {}",
            path,
            self.llm.model,
            self.llm.endpoint,
            self.fetch.timeout_secs,
            self.llm.timeout_secs,
            if self.llm.api_key.is_some() { "set" } else { "missing" }
        )
    }
}
