//! Credentials and endpoints for the external services.
//!
//! Stored as JSON at `~/.cleovent/settings.json`; environment variables
//! override the file. Presence of credentials is checked per call, before
//! any network activity.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

pub const ENV_LLM_PROVIDER: &str = "CLEOVENT_LLM_PROVIDER";
pub const ENV_LLM_MODEL: &str = "CLEOVENT_LLM_MODEL";
pub const ENV_LLM_API_KEY: &str = "CLEOVENT_LLM_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_WAQI_TOKEN: &str = "WAQI_API_TOKEN";

pub const DEFAULT_WAQI_BASE_URL: &str = "https://api.waqi.info";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelSettings {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl ModelSettings {
    /// Local providers run without a key.
    pub fn needs_api_key(&self) -> bool {
        self.provider != "ollama"
    }

    pub fn ensure_configured(&self) -> Result<(), FlowError> {
        if self.provider.is_empty() || self.model.is_empty() {
            return Err(FlowError::configuration(
                "language model provider and model must be set",
            ));
        }
        if self.needs_api_key() && self.api_key.is_empty() {
            return Err(FlowError::configuration(format!(
                "API key for language model provider '{}' is missing (set {ENV_LLM_API_KEY})",
                self.provider
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AirQualitySettings {
    pub token: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for AirQualitySettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: DEFAULT_WAQI_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl AirQualitySettings {
    pub fn require_token(&self) -> Result<&str, FlowError> {
        if self.token.is_empty() {
            Err(FlowError::configuration(format!(
                "API token for WAQI is missing (set {ENV_WAQI_TOKEN})"
            )))
        } else {
            Ok(&self.token)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub model: ModelSettings,
    pub air_quality: AirQualitySettings,
}

impl Settings {
    /// Settings file merged with environment overrides.
    pub fn load() -> Settings {
        let mut settings = read_settings_from(&settings_path());
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    /// Overlay values from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_LLM_PROVIDER) {
            self.model.provider = v;
        }
        if let Some(v) = get(ENV_LLM_MODEL) {
            self.model.model = v;
        }
        if let Some(v) = get(ENV_LLM_API_KEY).or_else(|| get(ENV_GEMINI_API_KEY)) {
            self.model.api_key = v;
        }
        if let Some(v) = get(ENV_WAQI_TOKEN) {
            self.air_quality.token = v;
        }
    }
}

/// Resolve the settings directory (~/.cleovent/).
pub fn cleovent_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cleovent")
}

pub fn settings_path() -> PathBuf {
    cleovent_dir().join("settings.json")
}

/// Missing or unreadable files yield defaults.
pub fn read_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    match fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

pub fn write_settings_to(path: &Path, settings: &Settings) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| e.to_string())
}
