// News module.
// Fetches and extracts the top stories from the Hacker News front page.

pub mod client;
pub mod scrape;
pub mod types;

pub use client::{HackerNewsClient, StorySource};
pub use scrape::{SITE_ORIGIN, absolute_link, parse_front_page};
pub use types::{Story, UNKNOWN_AUTHOR};
