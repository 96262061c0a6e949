//! User settings
//!
//! Settings live in a YAML file (default `<config dir>/xliker/config.yaml`).
//! A missing file means defaults. API keys may also come from the
//! environment, which takes precedence over the file.

use crate::article::RenderFetcher;
use crate::summarize::Provider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Bounds accepted for `max_items`
pub const MIN_MAX_ITEMS: i64 = 1;
pub const MAX_MAX_ITEMS: i64 = 200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Headless renderer used as the fallback article fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            program: "chromium".to_string(),
            args: vec![
                "--headless".to_string(),
                "--disable-gpu".to_string(),
                "--dump-dom".to_string(),
            ],
            timeout_secs: 20,
        }
    }
}

impl RenderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn to_fetcher(&self) -> RenderFetcher {
        RenderFetcher::new(self.program.clone(), self.args.clone(), self.timeout())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: Provider,
    /// Model name; the provider's default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Output language of summaries (`zh*` gives Chinese, anything else English)
    pub language: String,
    /// Records kept in history
    pub max_items: i64,
    /// Endpoint base URL; the provider's default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub http_timeout_secs: u64,
    pub render: RenderSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            language: "zh-CN".to_string(),
            max_items: 1,
            base_url: None,
            api_key: None,
            http_timeout_secs: 20,
            render: RenderSettings::default(),
        }
    }
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
        config_dir.join("xliker").join("config.yaml")
    }

    /// Load settings from `path`; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse settings and clamp out-of-range values.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = if text.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(text)?
        };
        Ok(settings.normalized())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Clamp `max_items` into the accepted range and drop blank strings.
    pub fn normalized(mut self) -> Self {
        self.max_items = self.max_items.clamp(MIN_MAX_ITEMS, MAX_MAX_ITEMS);
        self.model = self.model.filter(|m| !m.trim().is_empty());
        self.base_url = self.base_url.filter(|u| !u.trim().is_empty());
        self.api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }

    /// Copy safe to print. A stored API key is masked; long keys keep their last four characters.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api_key = self.api_key.as_deref().map(mask_secret);
        copy
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Resolve the API key from the environment, then the file.
    ///
    /// The provider's own variable wins; the other provider's variable is
    /// accepted for compatibility with older setups.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    pub(crate) fn api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        [self.provider, self.provider.other()]
            .iter()
            .filter_map(|p| env(p.api_key_env()))
            .map(|k| k.trim().to_string())
            .find(|k| !k.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len().max(4));
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
