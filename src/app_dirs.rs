use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typecoach";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_dir() -> PathBuf {
        Self::project()
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Locations checked for an existing config, in order.
    pub fn config_search_paths() -> Vec<PathBuf> {
        vec![Self::config_path(), PathBuf::from("config.json")]
    }

    pub fn data_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else {
            Self::project()
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn stats_path() -> PathBuf {
        Self::data_dir().join("user_stats.json")
    }

    pub fn log_path() -> PathBuf {
        Self::data_dir().join("typecoach.log")
    }

    pub fn api_key_paths() -> Vec<PathBuf> {
        vec![Self::config_dir().join("api-key"), PathBuf::from("api-key")]
    }
}
