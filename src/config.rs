//! Configuration management
//!
//! Manages LLM provider settings, server binding and panel defaults.

use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::orchestrator::agent_types::{MAX_ROUNDS, MIN_ROUNDS};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Model provider settings shared by every panel member
    #[serde(default)]
    pub llm: LlmSettings,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Panel defaults
    #[serde(default)]
    pub panel: PanelConfig,
}

/// Supported chat-completions providers
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini through its OpenAI-compatible endpoint
    #[default]
    Gemini,
    OpenRouter,
    /// Any OpenAI-compatible server; requires `base_url`
    Custom,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenRouter => "openrouter",
            Provider::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(Provider::Gemini),
            "openrouter" => Some(Provider::OpenRouter),
            "custom" => Some(Provider::Custom),
            _ => None,
        }
    }

    /// Provider names accepted by `parse`
    pub fn names() -> &'static [&'static str] {
        &["gemini", "openrouter", "custom"]
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model configuration for one consultation.
///
/// The API key is never part of this struct: it arrives with each request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Overrides the provider's default endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            temperature: default_temperature(),
            base_url: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PanelConfig {
    /// Initial value of the rounds slider
    #[serde(default = "default_max_rounds")]
    pub default_max_rounds: u32,
}

fn default_max_rounds() -> u32 {
    5
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            default_max_rounds: default_max_rounds(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it on first use
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Reject values the rest of the crate cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.llm.provider == Provider::Custom && self.llm.base_url.is_none() {
            anyhow::bail!("llm.base_url is required when llm.provider = \"custom\"");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be between 0.0 and 2.0, got {}", self.llm.temperature);
        }
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&self.panel.default_max_rounds) {
            anyhow::bail!(
                "panel.default_max_rounds must be between {} and {}, got {}",
                MIN_ROUNDS, MAX_ROUNDS, self.panel.default_max_rounds
            );
        }
        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "clinical-panel", "clinical-panel")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration ({})", config_path()?.display());
    println!("  llm.provider:              {}", config.llm.provider);
    println!("  llm.model:                 {}", config.llm.model);
    println!("  llm.temperature:           {}", config.llm.temperature);
    println!("  llm.base_url:              {}", config.llm.base_url.as_deref().unwrap_or("(provider default)"));
    println!("  llm.max_tokens:            {}", config.llm.max_tokens.map(|t| t.to_string()).unwrap_or_else(|| "(unset)".to_string()));
    println!("  server:                    {}:{}", config.server.host, config.server.port);
    println!("  panel.default_max_rounds:  {}", config.panel.default_max_rounds);

    Ok(())
}

/// Set the model used by every panel member
pub fn set_model(model: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.llm.model = model.to_string();
    config.save()?;
    println!("Model set to: {}", model);
    Ok(())
}

/// Set the chat-completions provider
pub fn set_provider(name: &str) -> Result<()> {
    let provider = Provider::parse(name).with_context(|| {
        format!("Unknown provider '{}'. Available providers: {}", name, Provider::names().join(", "))
    })?;
    let mut config = Config::load()?;
    config.llm.provider = provider;
    config.validate()?;
    config.save()?;
    println!("Provider set to: {}", provider);
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}
