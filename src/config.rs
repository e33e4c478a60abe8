//! Run configuration, resolved once at startup.

use std::{
    fmt,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use thiserror::Error;

use crate::queries::QuerySource;

pub const API_KEY_VAR: &str = "OPENCAGE_USER_KEY";

/// An OpenCage API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "no OpenCage API key: set OPENCAGE_USER_KEY or pass --key \
         (get a key here: https://opencagedata.com/users/sign_up)"
    )]
    MissingApiKey,
    #[error("failed to read API key: {0}")]
    Prompt(#[from] io::Error),
}

#[derive(Debug)]
pub struct Config {
    pub input: QuerySource,
    pub output: PathBuf,
    pub geojson: Option<PathBuf>,
    pub zoom: u8,
    pub endpoint: String,
    pub api_key: ApiKey,
}

/// Pick the API key: the environment wins over the flag, and the prompt is
/// the last resort. Blank values count as missing.
pub fn resolve_api_key<P>(
    env: Option<String>,
    flag: Option<String>,
    prompt: Option<P>,
) -> Result<ApiKey, ConfigError>
where
    P: FnOnce() -> io::Result<String>,
{
    let non_blank = |value: String| {
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    };

    if let Some(key) = env.and_then(non_blank).or_else(|| flag.and_then(non_blank)) {
        return Ok(ApiKey(key));
    }
    match prompt {
        Some(prompt) => non_blank(prompt()?).map(ApiKey).ok_or(ConfigError::MissingApiKey),
        None => Err(ConfigError::MissingApiKey),
    }
}

/// Ask for the key on stderr and read one line from stdin.
pub fn prompt_api_key() -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "OpenCage API key: ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
