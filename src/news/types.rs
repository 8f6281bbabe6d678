// News types.
// Story records as returned to callers and stored in the cache.

use serde::{Deserialize, Serialize};

/// Author shown when a story row has no user link (job posts).
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A front-page story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    /// Absolute URL of the story (or its discussion page for Ask/Show HN).
    pub link: String,
    pub author: String,
    pub points: u32,
    pub comments: u32,
}
