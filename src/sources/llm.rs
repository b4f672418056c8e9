use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::SourceError;

use super::TextSource;

pub const API_KEY_ENV: &str = "TYPECOACH_LLM_API_KEY";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
    Ollama,
}

impl Provider {
    fn default_base_url(self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    fn requires_api_key(self) -> bool {
        !matches!(self, Provider::Ollama)
    }
}

impl FromStr for Provider {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            _ => Err(SourceError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
            Provider::Ollama => "ollama",
        };
        f.write_str(name)
    }
}

/// API key from `TYPECOACH_LLM_API_KEY`, else the first non-empty key file.
pub fn resolve_api_key(key_files: &[PathBuf]) -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let key = key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }

    key_files.iter().find_map(|path| {
        let key = fs::read_to_string(path).ok()?;
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            debug!(path = %path.display(), "read API key from file");
            Some(key.to_string())
        }
    })
}

pub fn opening_prompt(letter: char) -> String {
    format!(
        "Generate a single interesting sentence for typing practice.\n\
         Make it varied content (quotes, facts, or creative).\n\
         Length: 50-80 characters.\n\
         IMPORTANT: Start the sentence with the letter \"{letter}\".\n\
         Only output the sentence, nothing else."
    )
}

pub fn continuation_prompt(previous: &str, error_chars: &[char], error_words: &[String]) -> String {
    let mut prompt = format!("Previous sentence: \"{previous}\"\n\n");

    if !error_chars.is_empty() {
        let chars = error_chars
            .iter()
            .map(|c| format!("'{c}'"))
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!("User made mistakes typing these characters: {chars}\n"));
    }
    if !error_words.is_empty() {
        prompt.push_str(&format!(
            "User had trouble with these words: {}\n",
            error_words.join(", ")
        ));
    }

    prompt.push_str(
        "\nGenerate ONE sentence (50-80 characters) that:\n\
         1. Continues naturally from the previous sentence\n\
         2. Helps practice the problem characters and similar words\n\
         3. Maintains topic coherence with the previous sentence\n\
         4. Is interesting and natural to read\n\
         \n\
         Only output the sentence, nothing else.",
    );
    prompt
}

/// Generative source backed by a hosted or local language model.
pub struct LlmSource {
    client: Client,
    provider: Provider,
    model: String,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
}

// Needed by `assert_matches!` in tests; omits the API key.
#[cfg(test)]
impl std::fmt::Debug for LlmSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSource")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl LlmSource {
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self, SourceError> {
        let provider: Provider = config.provider.parse()?;
        if provider.requires_api_key() && api_key.is_none() {
            return Err(SourceError::MissingApiKey);
        }

        let timeout = Duration::from_secs(config.timeout_seconds.max(1));
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = config
            .api_base
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .unwrap_or(provider.default_base_url())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            provider,
            model: config.model.clone(),
            base_url,
            api_key,
            timeout,
            max_retries: config.max_retries,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    fn generate(&self, prompt: &str) -> Result<String, SourceError> {
        let mut attempt = 0;
        loop {
            match self.request(prompt) {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(error = %err, attempt, "LLM request failed, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn request(&self, prompt: &str) -> Result<String, SourceError> {
        debug!(provider = %self.provider, model = %self.model, "sending LLM request");
        let text = match self.provider {
            Provider::Anthropic => self.request_anthropic(prompt),
            Provider::OpenAi => self.request_openai(prompt),
            Provider::Ollama => self.request_ollama(prompt),
        }
        .map_err(|err| match err {
            SourceError::Http(inner) if inner.is_timeout() => SourceError::Timeout(self.timeout),
            other => other,
        })?;

        let text = text.trim().trim_matches('"').trim();
        if text.is_empty() {
            return Err(SourceError::EmptyResponse);
        }
        Ok(text.to_string())
    }

    fn request_anthropic(&self, prompt: &str) -> Result<String, SourceError> {
        let payload = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status()));
        }

        let body: AnthropicResponse = response.json()?;
        body.content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(SourceError::EmptyResponse)
    }

    fn request_openai(&self, prompt: &str) -> Result<String, SourceError> {
        let payload = OpenAiRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.9,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.as_deref().unwrap_or_default())
            .json(&payload)
            .send()?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status()));
        }

        let body: OpenAiResponse = response.json()?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(SourceError::EmptyResponse)
    }

    fn request_ollama(&self, prompt: &str) -> Result<String, SourceError> {
        let payload = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status()));
        }

        let body: OllamaResponse = response.json()?;
        Ok(body.response)
    }
}

impl TextSource for LlmSource {
    fn name(&self) -> &'static str {
        "llm"
    }

    fn opening_text(&self) -> Result<String, SourceError> {
        let letter = rand::thread_rng().gen_range(b'A'..=b'Z') as char;
        self.generate(&opening_prompt(letter))
    }

    fn supports_continuation(&self) -> bool {
        true
    }

    fn continuation(
        &self,
        previous: &str,
        error_chars: &[char],
        error_words: &[String],
    ) -> Result<String, SourceError> {
        self.generate(&continuation_prompt(previous, error_chars, error_words))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}
