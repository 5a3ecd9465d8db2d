//! `reqwest`-backed video source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::FetcherConfig;
use crate::endpoints::Endpoint;
use crate::error::{FetchError, Result};

use super::VideoSource;

/// HTTP session shared by every invocation of the plugin.
///
/// The wrapped [`Client`] owns the connection pool. [`HttpSource::close`]
/// drops it; requests already in flight keep their own handle and finish
/// normally, new attempts fail with [`FetchError::SessionClosed`].
///
/// At most `max_connections_per_host` requests run against one origin at a
/// time. A request holds its slot until the body has been read, or until
/// its future is dropped.
pub struct HttpSource {
    client: RwLock<Option<Client>>,
    limits: Mutex<HashMap<String, Arc<Semaphore>>>,
    max_connections_per_host: usize,
}

impl HttpSource {
    /// Build the session from config timeouts and connection limits.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client: RwLock::new(Some(client)),
            limits: Mutex::new(HashMap::new()),
            max_connections_per_host: config.max_connections_per_host.max(1),
        })
    }

    /// Connection slots for the endpoint's origin (scheme, host and port).
    fn host_limit(&self, endpoint: &Endpoint) -> Arc<Semaphore> {
        let origin = Url::parse(&endpoint.url)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|_| endpoint.url.clone());
        let mut limits = self.limits.lock().unwrap_or_else(PoisonError::into_inner);
        limits
            .entry(origin)
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_connections_per_host)))
            .clone()
    }

    fn client(&self) -> Option<Client> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl VideoSource for HttpSource {
    async fn get_json(&self, endpoint: &Endpoint) -> std::result::Result<Value, FetchError> {
        let client = self.client().ok_or(FetchError::SessionClosed)?;

        // Closed semaphores mean the session was closed while waiting.
        let _permit = self
            .host_limit(endpoint)
            .acquire_owned()
            .await
            .map_err(|_| FetchError::SessionClosed)?;

        let response = client
            .get(&endpoint.url)
            .query(&[("type", "json")])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("json") {
            debug!(endpoint = %endpoint.url, content_type, "non-JSON content type, parsing anyway");
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::JsonDecode(e.to_string()))
    }

    fn is_open(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn close(&self) -> bool {
        let was_open = self
            .client
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        for limit in self
            .limits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
        {
            limit.close();
        }
        if was_open {
            info!("HTTP session closed");
        }
        was_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::ResponseSchema;

    #[test]
    fn test_close_is_idempotent() {
        let source = HttpSource::new(&FetcherConfig::default()).unwrap();
        assert!(source.is_open());
        assert!(source.close());
        assert!(!source.is_open());
        assert!(!source.close());
    }

    #[test]
    fn test_host_limit_is_shared_per_origin() {
        let config = FetcherConfig {
            max_connections_per_host: 2,
            ..Default::default()
        };
        let source = HttpSource::new(&config).unwrap();
        let a = Endpoint::new("https://api.example/a", ResponseSchema::VideoField);
        let b = Endpoint::new("https://api.example/b?x=1", ResponseSchema::UrlField);
        let other = Endpoint::new("https://api.example:8443/a", ResponseSchema::VideoField);

        assert!(Arc::ptr_eq(&source.host_limit(&a), &source.host_limit(&b)));
        assert!(!Arc::ptr_eq(&source.host_limit(&a), &source.host_limit(&other)));
        assert_eq!(source.host_limit(&a).available_permits(), 2);
    }

    #[tokio::test]
    async fn test_close_wakes_requests_waiting_for_a_slot() {
        let config = FetcherConfig {
            max_connections_per_host: 1,
            ..Default::default()
        };
        let source = HttpSource::new(&config).unwrap();
        let endpoint = Endpoint::new("https://unreachable.invalid/v", ResponseSchema::UrlField);

        let held = source.host_limit(&endpoint).acquire_owned().await.unwrap();
        let mut waiting = source.get_json(&endpoint);
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(20), &mut waiting)
                .await
                .is_err()
        );

        source.close();
        assert_eq!(waiting.await, Err(FetchError::SessionClosed));
        drop(held);
    }

    #[tokio::test]
    async fn test_closed_session_skips_network() {
        let source = HttpSource::new(&FetcherConfig::default()).unwrap();
        source.close();
        let endpoint = Endpoint::new("https://unreachable.invalid/v", ResponseSchema::UrlField);
        assert_eq!(
            source.get_json(&endpoint).await,
            Err(FetchError::SessionClosed)
        );
    }
}
