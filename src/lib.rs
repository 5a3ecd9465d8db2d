//! shortvid - random short-video plugin for chat bots
//!
//! On `/video 美女` the plugin shuffles its upstream APIs, tries each with
//! retries and linear backoff, and replies with the first video any of them
//! returns.

pub mod config;
pub mod endpoints;
pub mod error;
pub mod fetcher;
pub mod host;
pub mod plugins;

pub use config::FetcherConfig;
pub use endpoints::{parse_video_data, Endpoint, ResponseSchema, VideoResult};
pub use error::{FetchError, Result, ShortvidError};
pub use fetcher::{FallbackFetcher, HttpSource, VideoSource};
pub use plugins::VideoPlugin;
