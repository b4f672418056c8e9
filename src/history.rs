//! Persisted record of finished sessions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HistoryError;
use crate::metrics::mean;
use crate::session::TypingSession;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub sessions: Vec<TypingSession>,
}

/// Aggregates over every stored session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub avg_wpm: f64,
    pub best_wpm: f64,
    pub avg_accuracy: f64,
    pub sessions: usize,
}

impl UserStats {
    pub fn summary(&self) -> Option<HistorySummary> {
        let wpms: Vec<f64> = self.sessions.iter().map(|s| f64::from(s.wpm)).collect();
        let accuracies: Vec<f64> = self
            .sessions
            .iter()
            .map(|s| f64::from(s.accuracy))
            .collect();

        Some(HistorySummary {
            avg_wpm: mean(&wpms)?,
            best_wpm: wpms.iter().copied().fold(f64::MIN, f64::max),
            avg_accuracy: mean(&accuracies)?,
            sessions: self.sessions.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or blank file is an empty history.
    pub fn load(&self) -> Result<UserStats, HistoryError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UserStats::default())
            }
            Err(err) => return Err(err.into()),
        };
        if data.trim().is_empty() {
            return Ok(UserStats::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, stats: &UserStats) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(stats)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Load, push `session`, save. Returns the updated history.
    pub fn append(&self, session: TypingSession) -> Result<UserStats, HistoryError> {
        let mut stats = self.load()?;
        stats.sessions.push(session);
        self.save(&stats)?;
        debug!(path = %self.path.display(), sessions = stats.sessions.len(), "history saved");
        Ok(stats)
    }
}
