// Top stories handler.
// Serves the Hacker News front page stories through the cache.

use tracing::info;

use crate::cache::{CacheHandle, with_cache};
use crate::error::Result;
use crate::news::{Story, StorySource, parse_front_page};

use super::Response;

/// The front page is a singleton resource.
pub const TOP_STORIES_KEY: &str = "top-stories";
pub const FETCH_FAILED: &str = "Failed to fetch Hacker News page";

pub struct NewsHandler<'a> {
    pub source: &'a dyn StorySource,
    pub cache_name: &'a str,
    /// How many story rows to read from the top of the page.
    pub limit: usize,
}

impl NewsHandler<'_> {
    pub async fn handle(&self, cache: &CacheHandle) -> Response<Vec<Story>> {
        match with_cache(cache, self.cache_name, TOP_STORIES_KEY, || self.fetch()).await {
            Ok(stories) => Response::ok(stories),
            Err(e) => Response::from_error(&e, FETCH_FAILED),
        }
    }

    async fn fetch(&self) -> Result<Vec<Story>> {
        let html = self.source.front_page().await?;
        let stories = parse_front_page(&html, self.limit)?;
        info!(count = stories.len(), "Extracted stories");
        Ok(stories)
    }
}
