//! Where practice text comes from.
//!
//! A [`TextSource`] produces an opening passage and, if it is generative,
//! continuations tailored to the user's recent mistakes. The factory picks a
//! source from configuration and falls back to the offline passage when the
//! LLM source cannot be built.

mod dummy;
mod llm;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::config::TextConfig;
use crate::error::SourceError;

pub use dummy::{DummySource, DUMMY_PASSAGE};
pub use llm::{
    continuation_prompt, opening_prompt, resolve_api_key, LlmSource, Provider, API_KEY_ENV,
};

// Needed by `assert_matches!` in tests on `Result<Arc<dyn TextSource>, _>`.
#[cfg(test)]
impl std::fmt::Debug for dyn TextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextSource").field("name", &self.name()).finish()
    }
}

pub trait TextSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Text shown when a session begins.
    fn opening_text(&self) -> Result<String, SourceError>;

    fn supports_continuation(&self) -> bool {
        false
    }

    /// Produce the next sentence after `previous`, aimed at the given problem
    /// characters and words.
    fn continuation(
        &self,
        _previous: &str,
        _error_chars: &[char],
        _error_words: &[String],
    ) -> Result<String, SourceError> {
        Err(SourceError::ContinuationUnsupported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Dummy,
    Llm,
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dummy" | "Dummy" | "dummy_source" | "DummySource" => Ok(SourceKind::Dummy),
            "llm" | "LLM" | "llm_source" | "LLMSource" => Ok(SourceKind::Llm),
            other => Err(SourceError::UnknownSource(other.to_string())),
        }
    }
}

/// Build the source named in `config`, reading the API key from the
/// environment or the usual key files.
pub fn new_text_source(config: &TextConfig) -> Result<Arc<dyn TextSource>, SourceError> {
    new_text_source_with_key_files(config, &AppDirs::api_key_paths())
}

pub fn new_text_source_with_key_files(
    config: &TextConfig,
    key_files: &[PathBuf],
) -> Result<Arc<dyn TextSource>, SourceError> {
    match config.source.parse::<SourceKind>()? {
        SourceKind::Dummy => Ok(Arc::new(DummySource)),
        SourceKind::Llm => {
            let api_key = resolve_api_key(key_files);
            match LlmSource::new(&config.llm, api_key) {
                Ok(source) => {
                    info!(provider = %source.provider(), model = %config.llm.model, "using LLM text source");
                    Ok(Arc::new(source))
                }
                Err(err) if config.llm.fallback_to_dummy => {
                    warn!(error = %err, "LLM source unavailable, falling back to dummy text");
                    Ok(Arc::new(DummySource))
                }
                Err(err) => Err(err),
            }
        }
    }
}

/// Fetch the opening passage. When `fallback_to_dummy` is set a failure swaps
/// in the dummy source, which is returned alongside the text.
pub fn fetch_opening(
    source: Arc<dyn TextSource>,
    fallback_to_dummy: bool,
) -> Result<(Arc<dyn TextSource>, String), SourceError> {
    match source.opening_text() {
        Ok(text) if !text.trim().is_empty() => Ok((source, text)),
        Ok(_) | Err(SourceError::EmptyResponse) if fallback_to_dummy => {
            warn!(source = source.name(), "empty opening text, using dummy passage");
            Ok((Arc::new(DummySource), DUMMY_PASSAGE.to_string()))
        }
        Ok(_) => Err(SourceError::EmptyResponse),
        Err(err) if fallback_to_dummy => {
            warn!(source = source.name(), error = %err, "opening text failed, using dummy passage");
            Ok((Arc::new(DummySource), DUMMY_PASSAGE.to_string()))
        }
        Err(err) => Err(err),
    }
}
