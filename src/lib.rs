// small-talk: top stories and current weather behind a cache-aside layer.
// Secrets come from a memoizing provider; cache failures never fail a request.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod news;
pub mod secrets;
pub mod weather;

pub use app::{App, Function, Invocation};
pub use config::Config;
pub use error::{Result, SmallTalkError};
