// Hacker News HTTP client.
// Downloads the front page listing.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{Result, SmallTalkError};

/// A source of front page HTML.
#[async_trait]
pub trait StorySource: Send + Sync {
    async fn front_page(&self) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HackerNewsClient {
    client: Client,
    url: String,
}

impl HackerNewsClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl StorySource for HackerNewsClient {
    async fn front_page(&self) -> Result<String> {
        debug!("Fetching {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SmallTalkError::Upstream {
                service: "Hacker News",
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_failure_is_upstream_error() {
        let client = HackerNewsClient::new(Client::new(), "http://127.0.0.1:9/");

        let err = client.front_page().await.unwrap_err();
        assert!(err.is_upstream());
    }
}
