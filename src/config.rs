use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::session::SessionSettings;
use crate::typing_policy::TypingPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub text: TextConfig,
    pub ui: UiConfig,
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    /// `dummy` or `llm`.
    pub source: String,
    pub llm: LlmConfig,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            source: "dummy".to_string(),
            llm: LlmConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_base: Option<String>,
    /// Request a continuation once this many characters remain.
    pub pregenerate_threshold: usize,
    pub fallback_to_dummy: bool,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

impl LlmConfig {
    /// Upper bound on one continuation request, retries included.
    pub fn generation_deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1) * (u64::from(self.max_retries) + 1))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-5-haiku-latest".to_string(),
            api_base: None,
            pregenerate_threshold: 20,
            fallback_to_dummy: true,
            timeout_seconds: 5,
            max_retries: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub theme: String,
    pub block_on_typo: bool,
    pub typo_flash_enabled: bool,
    pub typo_flash_duration_ms: u64,
    pub default_duration_minutes: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            block_on_typo: false,
            typo_flash_enabled: false,
            typo_flash_duration_ms: 150,
            default_duration_minutes: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// History file; the data directory is used when unset.
    pub file: Option<PathBuf>,
}

impl StatsConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(AppDirs::stats_path)
    }
}

impl Config {
    /// Session knobs taken from the file. Whether the session is generative
    /// depends on the source and is left off here.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            duration_minutes: self.ui.default_duration_minutes,
            policy: TypingPolicy {
                block_on_typo: self.ui.block_on_typo,
                typo_flash: self.ui.typo_flash_enabled,
                flash_duration: Duration::from_millis(self.ui.typo_flash_duration_ms),
            },
            generative: false,
            pregenerate_threshold: self.text.llm.pregenerate_threshold,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<Config, ConfigError>;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve and load the configuration.
    ///
    /// An explicit path must exist. Otherwise the config directory and then
    /// the working directory are searched; if neither has a file, defaults are
    /// written to the config directory. If that write fails the defaults are
    /// used in memory and no path is returned.
    pub fn load_or_create(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            let store = Self::with_path(path);
            return Ok((store.load()?, Some(store.path)));
        }

        if let Some(path) = AppDirs::config_search_paths().into_iter().find(|p| p.exists()) {
            let store = Self::with_path(&path);
            return Ok((store.load()?, Some(path)));
        }

        let store = Self::new();
        let cfg = Config::default();
        match store.save(&cfg) {
            Ok(()) => {
                info!(path = %store.path.display(), "created default config");
                Ok((cfg, Some(store.path)))
            }
            Err(err) => {
                warn!(error = %err, "could not write default config, using defaults");
                Ok((cfg, None))
            }
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Config, ConfigError> {
        let bytes = fs::read(&self.path)?;
        let cfg = serde_json::from_slice::<Config>(&bytes)?;
        debug!(path = %self.path.display(), "loaded config");
        Ok(cfg)
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
