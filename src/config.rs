use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

const CONFIG_FILE: &str = ".sysaid.json";
const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
const DEFAULT_MAX_TOKENS: u32 = 1500;
const DEFAULT_COMMAND_TIMEOUT: u64 = 300;
const DEFAULT_WEB_SEARCH_MAX_USES: u32 = 5;

/// Runtime settings, loaded once at startup and passed by reference into
/// each component. Missing fields fall back to defaults so old config
/// files keep working after upgrades.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    pub max_tokens: u32,
    pub auto_confirm: bool,
    pub log_commands: bool,
    pub safe_mode: bool,
    pub command_timeout: u64,
    pub enable_web_search: bool,
    pub web_search_max_uses: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            auto_confirm: false,
            log_commands: true,
            safe_mode: true,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            enable_web_search: true,
            web_search_max_uses: DEFAULT_WEB_SEARCH_MAX_USES,
        }
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE)
}

/// Load the config file, falling back to defaults when the file is missing
/// or malformed. A broken file is reported but never fatal.
pub fn load_config() -> Config {
    let path = get_config_path();
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => return config,
                Err(e) => eprintln!("warning: ignoring malformed {}: {}", path.display(), e),
            },
            Err(e) => eprintln!("warning: failed to read {}: {}", path.display(), e),
        }
    }
    Config::default()
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path();
    let content =
        serde_json::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    fs::write(&path, content)?;
    Ok(())
}
