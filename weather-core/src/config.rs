use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{ReplyStyle, Units, provider::ProviderId};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const ENV_IPINFO_TOKEN: &str = "IPINFO_TOKEN";
pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const ENV_UNITS: &str = "WEATHER_UNITS";

/// Credentials and endpoint for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider's public endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Settings for the AI weather tips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub style: ReplyStyle,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            style: ReplyStyle::default(),
        }
    }
}

fn default_model() -> String {
    crate::provider::ollama::DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_suggestion_limit() -> usize {
    crate::provider::openweather::DEFAULT_SUGGESTION_LIMIT
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// units = "metric"
///
/// [providers.openweather]
/// api_key = "..."
///
/// [providers.ollama]
/// base_url = "http://localhost:11434"
///
/// [recommendation]
/// model = "llama3.1"
/// style = "bilingual"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub units: Units,

    /// Per-request timeout for every HTTP call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How many geocoding hits to ask for per keystroke.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub recommendation: RecommendationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: Units::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            suggestion_limit: default_suggestion_limit(),
            providers: HashMap::new(),
            recommendation: RecommendationConfig::default(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, id: ProviderId) -> Option<&str> {
        self.provider_config(id)
            .and_then(|cfg| cfg.api_key.as_deref())
            .filter(|key| !key.is_empty())
    }

    /// Configured endpoint, or the provider's public one.
    pub fn provider_base_url(&self, id: ProviderId) -> &str {
        self.provider_config(id)
            .and_then(|cfg| cfg.base_url.as_deref())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| id.default_base_url())
    }

    /// API key for a provider, or an error telling the user how to add one.
    pub fn require_api_key(&self, id: ProviderId) -> Result<&str> {
        self.provider_api_key(id).ok_or_else(|| {
            anyhow!(
                "No API key configured for provider '{id}'.\n\
                 Hint: run `weather configure {id}` and enter your API key."
            )
        })
    }

    /// Set/replace a provider API key, keeping any configured endpoint.
    pub fn upsert_provider_api_key(&mut self, id: ProviderId, api_key: String) {
        self.providers
            .entry(id.as_str().to_string())
            .or_default()
            .api_key = Some(api_key);
    }

    pub fn set_provider_base_url(&mut self, id: ProviderId, base_url: String) {
        self.providers
            .entry(id.as_str().to_string())
            .or_default()
            .base_url = Some(base_url);
    }

    /// Apply `OPENWEATHER_API_KEY`, `IPINFO_TOKEN`, `OLLAMA_HOST` and
    /// `WEATHER_UNITS` from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::with_env_overrides`] with an explicit lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_OPENWEATHER_API_KEY) {
            self.upsert_provider_api_key(ProviderId::OpenWeather, key);
        }
        if let Some(token) = non_empty(ENV_IPINFO_TOKEN) {
            self.upsert_provider_api_key(ProviderId::IpInfo, token);
        }
        if let Some(host) = non_empty(ENV_OLLAMA_HOST) {
            self.set_provider_base_url(ProviderId::Ollama, host);
        }
        if let Some(units) = non_empty(ENV_UNITS) {
            self.units = Units::try_from(units.as_str())
                .with_context(|| format!("Invalid {ENV_UNITS} value"))?;
        }

        Ok(self)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-lookup", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }
}
