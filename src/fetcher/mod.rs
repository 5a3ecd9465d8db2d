//! Fallback video fetcher for shortvid
//!
//! [`FallbackFetcher`] shuffles its endpoints, then walks them in order.
//! Each endpoint gets up to `max_retries` attempts with linear backoff
//! (`retry_delay * attempt` after every non-final attempt). The first
//! endpoint whose response normalizes into a [`VideoResult`] wins and the
//! remaining endpoints are never contacted.
//!
//! The transport sits behind [`VideoSource`] so the retry and fallback
//! policy can be exercised without a network.
//!
//! # Example
//!
//! ```rust,no_run
//! use shortvid::config::FetcherConfig;
//! use shortvid::fetcher::FallbackFetcher;
//!
//! # async fn run() -> shortvid::error::Result<()> {
//! let fetcher = FallbackFetcher::from_config(&FetcherConfig::default())?;
//! match fetcher.fetch_random_video().await {
//!     Ok(video) => println!("{} -> {}", video.title, video.url),
//!     Err(e) => println!("{}", e.user_message()),
//! }
//! fetcher.close();
//! # Ok(())
//! # }
//! ```

mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpSource;

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::FetcherConfig;
use crate::endpoints::{parse_video_data, Endpoint, VideoResult};
use crate::error::{FetchError, Result};

// ============================================================================
// VideoSource
// ============================================================================

/// One request/response cycle against an endpoint.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Issue a single GET and decode the body as JSON.
    ///
    /// Non-200 responses, timeouts, transport failures and malformed bodies
    /// map onto the matching [`FetchError`] variant.
    async fn get_json(&self, endpoint: &Endpoint) -> std::result::Result<Value, FetchError>;

    /// Whether the underlying session still accepts requests.
    fn is_open(&self) -> bool {
        true
    }

    /// Release the underlying session. Returns `true` if it was open.
    fn close(&self) -> bool {
        false
    }
}

// ============================================================================
// FallbackFetcher
// ============================================================================

/// Tries endpoints in random order until one yields a video.
pub struct FallbackFetcher<S = HttpSource> {
    source: S,
    endpoints: Vec<Endpoint>,
    max_retries: u32,
    retry_delay: Duration,
}

impl FallbackFetcher<HttpSource> {
    /// Validate the config and open an HTTP session for it.
    pub fn from_config(config: &FetcherConfig) -> Result<Self> {
        config.validate()?;
        let source = HttpSource::new(config)?;
        Ok(Self::new(
            source,
            config.endpoints.clone(),
            config.max_retries,
            config.retry_delay(),
        ))
    }
}

impl<S: VideoSource> FallbackFetcher<S> {
    /// `max_retries` is clamped to at least one attempt.
    pub fn new(
        source: S,
        endpoints: Vec<Endpoint>,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            source,
            endpoints,
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_open(&self) -> bool {
        self.source.is_open()
    }

    /// Release the HTTP session. Safe to call more than once.
    pub fn close(&self) -> bool {
        self.source.close()
    }

    /// Shuffle the endpoints and return the first video any of them yields.
    ///
    /// Fails with [`FetchError::NoEndpointSucceeded`] once every endpoint
    /// has exhausted its retries.
    pub async fn fetch_random_video(&self) -> std::result::Result<VideoResult, FetchError> {
        // ThreadRng is !Send; shuffle before the first await.
        let order = self.shuffled_endpoints(&mut rand::rng());
        self.fetch_in_order(&order).await
    }

    /// Same as [`fetch_random_video`](Self::fetch_random_video), drawing the
    /// order from `rng`.
    pub async fn fetch_random_video_with<R>(
        &self,
        rng: &mut R,
    ) -> std::result::Result<VideoResult, FetchError>
    where
        R: Rng + ?Sized,
    {
        let order = self.shuffled_endpoints(rng);
        self.fetch_in_order(&order).await
    }

    /// A shuffled copy of the configured endpoints.
    pub fn shuffled_endpoints<R>(&self, rng: &mut R) -> Vec<Endpoint>
    where
        R: Rng + ?Sized,
    {
        let mut order = self.endpoints.clone();
        order.shuffle(rng);
        order
    }

    /// Walk `endpoints` in the given order, stopping at the first success.
    pub async fn fetch_in_order(
        &self,
        endpoints: &[Endpoint],
    ) -> std::result::Result<VideoResult, FetchError> {
        let mut last_error = None;

        let mut attempted = 0;

        for endpoint in endpoints {
            attempted += 1;
            match self.fetch_from_endpoint(endpoint).await {
                Ok(video) => {
                    info!(endpoint = %endpoint.url, url = %video.url, "video fetched");
                    return Ok(video);
                }
                Err(FetchError::SessionClosed) => {
                    last_error = Some(Box::new(FetchError::SessionClosed));
                    break;
                }
                Err(e) => {
                    warn!(endpoint = %endpoint.url, "endpoint exhausted: {e}");
                    last_error = Some(Box::new(e));
                }
            }
        }

        Err(FetchError::NoEndpointSucceeded {
            attempted,
            last_error,
        })
    }

    /// Up to `max_retries` attempts against one endpoint.
    ///
    /// Returns the error of the final attempt when all of them fail.
    pub async fn fetch_from_endpoint(
        &self,
        endpoint: &Endpoint,
    ) -> std::result::Result<VideoResult, FetchError> {
        let mut last_error = FetchError::NoUsableVideo;

        for attempt in 1..=self.max_retries {
            match self.attempt(endpoint).await {
                Ok(video) => return Ok(video),
                Err(FetchError::SessionClosed) => return Err(FetchError::SessionClosed),
                Err(e) => {
                    warn!(
                        endpoint = %endpoint.url,
                        attempt,
                        max_retries = self.max_retries,
                        "fetch attempt failed: {e}"
                    );
                    last_error = e;
                }
            }

            if attempt < self.max_retries {
                let delay = self.retry_delay * attempt;
                debug!(endpoint = %endpoint.url, ?delay, "backing off");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error)
    }

    async fn attempt(&self, endpoint: &Endpoint) -> std::result::Result<VideoResult, FetchError> {
        let body = self.source.get_json(endpoint).await?;
        parse_video_data(&body, endpoint).ok_or(FetchError::NoUsableVideo)
    }
}
