use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::analysis::prompts::TurnMarkers;
use crate::llm_client::GenerationParams;

const DEFAULT_HF_API_URL: &str =
    "https://api-inference.huggingface.co/models/deepseek-ai/DeepSeek-R1-Distill-Qwen-32B";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    pub hf_api_url: String,
    pub hf_api_key: String,
    /// Local inference server tried when the hosted endpoint fails.
    pub fallback_inference_url: Option<String>,
    /// Persistence is disabled when unset.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub generation: GenerationParams,
    pub llm_max_retries: u32,
    pub turn_markers: TurnMarkers,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hf_api_url", &self.hf_api_url)
            .field("hf_api_key", &"<redacted>")
            .field("fallback_inference_url", &self.fallback_inference_url)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .field("generation", &self.generation)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("turn_markers", &self.turn_markers)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GenerationParams::default();
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            hf_api_url: optional("HF_API_URL").unwrap_or_else(|| DEFAULT_HF_API_URL.to_string()),
            hf_api_key: optional("HF_API_KEY")
                .context("Required environment variable 'HF_API_KEY' is not set")?,
            fallback_inference_url: optional("FALLBACK_INFERENCE_URL"),
            database_url: optional("DATABASE_URL"),
            port: parse_or("PORT", optional("PORT"), 8080)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            generation: GenerationParams {
                max_new_tokens: parse_or(
                    "LLM_MAX_NEW_TOKENS",
                    optional("LLM_MAX_NEW_TOKENS"),
                    defaults.max_new_tokens,
                )?,
                temperature: parse_or(
                    "LLM_TEMPERATURE",
                    optional("LLM_TEMPERATURE"),
                    defaults.temperature,
                )?,
                top_p: parse_or("LLM_TOP_P", optional("LLM_TOP_P"), defaults.top_p)?,
                return_full_text: parse_or(
                    "LLM_RETURN_FULL_TEXT",
                    optional("LLM_RETURN_FULL_TEXT"),
                    defaults.return_full_text,
                )?,
                ..defaults
            },
            llm_max_retries: parse_or("LLM_MAX_RETRIES", optional("LLM_MAX_RETRIES"), 3)?,
            turn_markers: parse_markers(optional("CHAT_TURN_MARKERS").as_deref())?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| match key {
            "HF_API_KEY" => Some("test-key".to_string()),
            _ => None,
        })
        .expect("test config is valid")
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

fn parse_markers(value: Option<&str>) -> Result<TurnMarkers> {
    match value.map(str::trim) {
        None | Some("private") => Ok(TurnMarkers::private()),
        Some("legacy") => Ok(TurnMarkers::legacy()),
        Some(other) => bail!("CHAT_TURN_MARKERS must be 'private' or 'legacy', got '{other}'"),
    }
}
