// src/config.rs

use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

pub const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";
pub const DEFAULT_CREDENTIALS_PATH: &str = "config/credentials.json";
pub const DEFAULT_SHEET_TITLE: &str = "Conceptos";
pub const DEFAULT_ROW_LIMIT: usize = 1000;
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1100;

pub const PROMPT_TEMPLATE: &str =
    "Write a twenty word opinion on how well the first concept matches the argument, written in spanish:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing env var: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("reading credentials from {path:?}: {source}")]
    CredentialsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing credentials in {path:?}: {source}")]
    CredentialsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub sheet_id: String,
    pub gemini_api_key: String,
    pub credentials_path: PathBuf,
    pub sheet_title: String,
    pub row_limit: usize,
    pub rate_limit: Duration,
    pub gemini_endpoint: String,
    pub prompt_template: String,
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let sheet_id = get("GOOGLE_SHEET_ID").ok_or(ConfigError::MissingEnv("GOOGLE_SHEET_ID"))?;
        let gemini_api_key =
            get("GEMINI_API_KEY").ok_or(ConfigError::MissingEnv("GEMINI_API_KEY"))?;

        let row_limit = match get("ROW_LIMIT") {
            Some(v) => v.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                name: "ROW_LIMIT",
                value: v.clone(),
            })?,
            None => DEFAULT_ROW_LIMIT,
        };

        let rate_limit_ms = match get("RATE_LIMIT_MS") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                name: "RATE_LIMIT_MS",
                value: v.clone(),
            })?,
            None => DEFAULT_RATE_LIMIT_MS,
        };

        Ok(Self {
            sheet_id,
            gemini_api_key,
            credentials_path: get("GOOGLE_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH)),
            sheet_title: get("SHEET_TITLE").unwrap_or_else(|| DEFAULT_SHEET_TITLE.to_string()),
            row_limit,
            rate_limit: Duration::from_millis(rate_limit_ms),
            gemini_endpoint: get("GEMINI_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
            prompt_template: PROMPT_TEMPLATE.to_string(),
        })
    }
}
