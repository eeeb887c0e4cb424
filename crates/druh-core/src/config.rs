use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::session::UserProfile;

pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

pub const DEFAULT_SYSTEM_PROMPT: &str = "Ти — AI Друг, корисний та ввічливий асистент. \
Ти завжди відповідаєш українською мовою. Твоє завдання — допомагати користувачеві з його запитами.";

/// How the "thinking" indicator is drawn while a reply is pending.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoaderStyle {
    #[default]
    Dots,
    Text,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    /// Gate the chat behind the sign-in collaborator.
    pub require_sign_in: bool,
    pub loader: LoaderStyle,
    /// Identity the local session gate signs in as.
    pub profile: Option<UserProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            require_sign_in: false,
            loader: LoaderStyle::default(),
            profile: None,
        }
    }

    /// Loads the config file, writing a default one on first run, then
    /// applies `GEMINI_API_KEY` / `GEMINI_API_URL` from the environment.
    pub fn load() -> Result<Self> {
        let config = Self::load_or_init(&Self::get_config_path()?)?;
        Ok(config.with_overrides(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("GEMINI_API_URL").ok(),
        ))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Like `load_from`, but a missing file is created with the defaults so
    /// there is something to put the API key into. A failed write only logs.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }

        let config = Self::new();
        match config.save_to(path) {
            Ok(()) => info!(path = %path.display(), "wrote default config"),
            Err(err) => warn!(path = %path.display(), error = %err, "could not write default config"),
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Non-empty override values win over what the file said.
    pub fn with_overrides(mut self, api_key: Option<String>, api_url: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(anyhow!(
                "No Gemini API key configured. Set GEMINI_API_KEY or add \"api_key\" to {}",
                Self::get_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.json".to_string())
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(anyhow!("api_url must not be empty"));
        }
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ai-druh").join("config.json"))
    }
}
