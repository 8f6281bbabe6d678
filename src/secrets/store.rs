// Secret store backends.
// Talks to the Lambda parameters and secrets extension, or reads local env vars.

use async_trait::async_trait;
use reqwest::{Client, header::HeaderValue};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SmallTalkError};

const SECRETS_TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";
const ENV_SECRET_PREFIX: &str = "SMALL_TALK_SECRET_";

/// A source of named secret strings.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn fetch_secret(&self, name: &str) -> Result<String>;
}

/// Response body of the extension's `secretsmanager/get` endpoint.
#[derive(Debug, Deserialize)]
struct GetSecretValueResponse {
    #[serde(rename = "SecretString")]
    secret_string: Option<String>,
}

/// Secrets Manager, reached through the extension's localhost HTTP endpoint.
#[derive(Debug, Clone)]
pub struct ExtensionSecretStore {
    client: Client,
    base_url: String,
    token: HeaderValue,
}

impl ExtensionSecretStore {
    pub fn new(client: Client, port: u16, session_token: Option<&str>) -> Result<Self> {
        let token = session_token.ok_or_else(|| {
            SmallTalkError::Config("AWS_SESSION_TOKEN is required for the secrets extension".into())
        })?;
        let token = HeaderValue::from_str(token)
            .map_err(|e| SmallTalkError::Config(format!("invalid AWS_SESSION_TOKEN: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("http://localhost:{port}"),
            token,
        })
    }

    /// Point the store at a different extension address.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SecretStore for ExtensionSecretStore {
    fn name(&self) -> &'static str {
        "secrets-extension"
    }

    async fn fetch_secret(&self, name: &str) -> Result<String> {
        let url = format!("{}/secretsmanager/get", self.base_url);
        debug!(secret = name, "Requesting secret from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("secretId", name)])
            .header(SECRETS_TOKEN_HEADER, self.token.clone())
            .send()
            .await
            .map_err(|e| SmallTalkError::SecretStore(format!("request for {name} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SmallTalkError::SecretStore(format!(
                "request for {name} returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: GetSecretValueResponse = response
            .json()
            .await
            .map_err(|e| SmallTalkError::SecretStore(format!("bad response for {name}: {e}")))?;

        body.secret_string
            .ok_or_else(|| SmallTalkError::SecretStore(format!("{name} has no SecretString")))
    }
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads secrets from `SMALL_TALK_SECRET_<NAME>` variables, for local runs.
pub struct EnvSecretStore {
    lookup: Lookup,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Environment variable holding the secret `name`.
    pub fn var_name(name: &str) -> String {
        let suffix: String = name
            .chars()
            .map(|c| match c {
                '-' | '.' | '/' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{ENV_SECRET_PREFIX}{suffix}")
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn fetch_secret(&self, name: &str) -> Result<String> {
        let var = Self::var_name(name);
        (self.lookup)(&var)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| SmallTalkError::SecretStore(format!("{var} is not set")))
    }
}
