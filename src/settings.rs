use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FeeError, Result};
use crate::store::DEFAULT_STORE_NAME;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory uploads and the default store are written to.
    pub data_dir: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_school_name")]
    pub school_name: String,
    #[serde(default = "default_phone_prefix")]
    pub phone_prefix: String,
    #[serde(default = "default_messaging_api_base")]
    pub messaging_api_base: String,
    #[serde(default)]
    pub notify_timeout_secs: Option<u64>,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_school_name() -> String {
    "Kunjeer Public School".to_string()
}

fn default_phone_prefix() -> String {
    "whatsapp:+91".to_string()
}

fn default_messaging_api_base() -> String {
    "https://api.twilio.com".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            bind: default_bind(),
            school_name: default_school_name(),
            phone_prefix: default_phone_prefix(),
            messaging_api_base: default_messaging_api_base(),
            notify_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn default_store_path(&self) -> PathBuf {
        self.upload_dir().join(DEFAULT_STORE_NAME)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("feebook")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("feebook")
        .join("uploaded_excels")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unparsable files fall back to defaults.
fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| FeeError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
