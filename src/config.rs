// Runtime configuration.
// Reads settings from environment variables, optionally seeded from a .env file.

use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SmallTalkError};

pub const DEFAULT_CACHE_NAME: &str = "small-talk";
pub const DEFAULT_CACHE_SECRET: &str = "momento-api-key";
pub const DEFAULT_WEATHER_SECRET: &str = "smalltalk-weather";
pub const DEFAULT_NEWS_URL: &str = "https://news.ycombinator.com/";
pub const DEFAULT_WEATHER_API_BASE: &str = "https://api.openweathermap.org";
pub const DEFAULT_SECRETS_EXTENSION_PORT: u16 = 2773;

/// News listing changes quickly: 5 minutes.
pub const DEFAULT_NEWS_TTL: Duration = Duration::from_secs(5 * 60);
/// Current conditions: 15 minutes.
pub const DEFAULT_WEATHER_TTL: Duration = Duration::from_secs(15 * 60);

/// Which cache service backs the cache-aside layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    #[default]
    Momento,
    Memory,
    Disabled,
}

/// Where secrets are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretsBackend {
    /// The Lambda parameters and secrets extension on localhost.
    #[default]
    Extension,
    /// `SMALL_TALK_SECRET_*` environment variables.
    Env,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_name: String,
    pub cache_backend: CacheBackend,
    pub cache_secret: String,
    /// Overrides the endpoint carried inside a Momento API key.
    pub momento_endpoint: Option<String>,
    pub secrets_backend: SecretsBackend,
    pub secrets_extension_port: u16,
    pub session_token: Option<String>,
    pub news_url: String,
    pub news_ttl: Duration,
    pub top_stories: usize,
    pub weather_api_base: String,
    pub weather_secret: String,
    pub weather_units: String,
    pub weather_ttl: Duration,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            cache_backend: CacheBackend::default(),
            cache_secret: DEFAULT_CACHE_SECRET.to_string(),
            momento_endpoint: None,
            secrets_backend: SecretsBackend::default(),
            secrets_extension_port: DEFAULT_SECRETS_EXTENSION_PORT,
            session_token: None,
            news_url: DEFAULT_NEWS_URL.to_string(),
            news_ttl: DEFAULT_NEWS_TTL,
            top_stories: 5,
            weather_api_base: DEFAULT_WEATHER_API_BASE.to_string(),
            weather_secret: DEFAULT_WEATHER_SECRET.to_string(),
            weather_units: "imperial".to_string(),
            weather_ttl: DEFAULT_WEATHER_TTL,
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from the process environment, after applying an
    /// optional .env file. Variables already set in the environment win.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    SmallTalkError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
            }
            None => {
                // A missing .env is normal outside local development.
                let _ = dotenvy::dotenv();
            }
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let cache_backend = match get("SMALL_TALK_CACHE_BACKEND") {
            Some(raw) => parse_cache_backend(&raw)?,
            None => defaults.cache_backend,
        };
        let secrets_backend = match get("SMALL_TALK_SECRETS_BACKEND") {
            Some(raw) => parse_secrets_backend(&raw)?,
            None => defaults.secrets_backend,
        };
        let secrets_extension_port = match get("PARAMETERS_SECRETS_EXTENSION_HTTP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                SmallTalkError::Config(
                    "PARAMETERS_SECRETS_EXTENSION_HTTP_PORT must be a port number".into(),
                )
            })?,
            None => defaults.secrets_extension_port,
        };

        let top_stories = match get("SMALL_TALK_TOP_STORIES") {
            Some(raw) => parse_positive(&raw, "SMALL_TALK_TOP_STORIES")? as usize,
            None => defaults.top_stories,
        };

        Ok(Self {
            cache_name: get("SMALL_TALK_CACHE_NAME").unwrap_or(defaults.cache_name),
            cache_backend,
            cache_secret: get("SMALL_TALK_CACHE_SECRET").unwrap_or(defaults.cache_secret),
            momento_endpoint: get("MOMENTO_HTTP_ENDPOINT"),
            secrets_backend,
            secrets_extension_port,
            session_token: get("AWS_SESSION_TOKEN"),
            news_url: get("SMALL_TALK_NEWS_URL").unwrap_or(defaults.news_url),
            news_ttl: secs_or(get("SMALL_TALK_NEWS_TTL_SECS"), "SMALL_TALK_NEWS_TTL_SECS", defaults.news_ttl)?,
            top_stories,
            weather_api_base: get("SMALL_TALK_WEATHER_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.weather_api_base),
            weather_secret: get("SMALL_TALK_WEATHER_SECRET").unwrap_or(defaults.weather_secret),
            weather_units: get("SMALL_TALK_WEATHER_UNITS").unwrap_or(defaults.weather_units),
            weather_ttl: secs_or(
                get("SMALL_TALK_WEATHER_TTL_SECS"),
                "SMALL_TALK_WEATHER_TTL_SECS",
                defaults.weather_ttl,
            )?,
            http_timeout: secs_or(
                get("SMALL_TALK_HTTP_TIMEOUT_SECS"),
                "SMALL_TALK_HTTP_TIMEOUT_SECS",
                defaults.http_timeout,
            )?,
        })
    }
}

fn parse_cache_backend(raw: &str) -> Result<CacheBackend> {
    match raw.to_ascii_lowercase().as_str() {
        "momento" => Ok(CacheBackend::Momento),
        "memory" => Ok(CacheBackend::Memory),
        "disabled" | "none" | "off" => Ok(CacheBackend::Disabled),
        other => Err(SmallTalkError::Config(format!(
            "SMALL_TALK_CACHE_BACKEND must be one of momento, memory, disabled (got {other})"
        ))),
    }
}

fn parse_secrets_backend(raw: &str) -> Result<SecretsBackend> {
    match raw.to_ascii_lowercase().as_str() {
        "extension" => Ok(SecretsBackend::Extension),
        "env" => Ok(SecretsBackend::Env),
        other => Err(SmallTalkError::Config(format!(
            "SMALL_TALK_SECRETS_BACKEND must be one of extension, env (got {other})"
        ))),
    }
}

fn parse_positive(raw: &str, env_name: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(SmallTalkError::Config(format!(
            "{env_name} must be an integer > 0"
        ))),
    }
}

fn secs_or(raw: Option<String>, env_name: &str, default: Duration) -> Result<Duration> {
    match raw {
        Some(raw) => parse_positive(&raw, env_name).map(Duration::from_secs),
        None => Ok(default),
    }
}
