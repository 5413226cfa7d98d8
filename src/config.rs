use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::task::Priority;
use crate::{tlog_debug, Error, Result};

fn default_category() -> String {
    "Personal".to_string()
}

fn default_voice_keywords() -> Vec<String> {
    ["add task", "create task", "new task", "add"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the task list is stored. Defaults to ~/.taskgate/tasks.json.
    pub store_path: Option<String>,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default)]
    pub default_priority: Priority,
    /// Refuse edits that would close a dependency cycle.
    #[serde(default)]
    pub reject_cycles: bool,
    /// Leading phrases stripped from voice transcripts, longest match wins.
    #[serde(default = "default_voice_keywords")]
    pub voice_keywords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            default_category: default_category(),
            default_priority: Priority::default(),
            reject_cycles: false,
            voice_keywords: default_voice_keywords(),
        }
    }
}

impl Config {
    pub fn taskgate_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".taskgate"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::taskgate_dir()?.join("config.toml"))
    }

    pub fn effective_store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(expand_tilde(path)),
            None => Ok(Self::taskgate_dir()?.join("tasks.json")),
        }
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        tlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            tlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        tlog_debug!(
            "Config loaded: store_path={:?}, reject_cycles={}",
            config.store_path,
            config.reject_cycles
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::taskgate_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?)?;
        tlog_debug!("Config saved to {}", path.display());
        Ok(())
    }
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
