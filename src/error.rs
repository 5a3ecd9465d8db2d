//! Error types for shortvid
//!
//! Two layers live here. [`FetchError`] is the per-attempt taxonomy used
//! inside the fallback fetch flow; every variant is recovered locally (retry
//! or endpoint skip) and ends up, at worst, as a user-facing text message.
//! [`ShortvidError`] covers everything outside that flow: configuration,
//! client construction and I/O.

use thiserror::Error;

/// Why a single fetch attempt (or the whole fetch) failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The endpoint answered with a status other than 200.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Total or connect timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure (DNS, refused, reset, TLS, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The body was not valid JSON.
    #[error("JSON decode error: {0}")]
    JsonDecode(String),

    /// 200 with valid JSON, but nothing usable could be extracted.
    #[error("response contained no usable video URL")]
    NoUsableVideo,

    /// The HTTP session was released by plugin teardown.
    #[error("HTTP session is closed")]
    SessionClosed,

    /// Every endpoint exhausted its retries.
    #[error("no endpoint succeeded after trying {attempted} endpoint(s)")]
    NoEndpointSucceeded {
        attempted: usize,
        /// Failure of the final attempt, if any attempt was made.
        last_error: Option<Box<FetchError>>,
    },
}

impl FetchError {
    /// Classify a `reqwest` transport error.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::JsonDecode(err.to_string())
        } else {
            Self::Network(network_kind(err).to_string())
        }
    }

    /// The plain-text line shown to the chat user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::HttpStatus(status) => format!("请求失败：状态码{}", status),
            Self::Timeout => "视频请求超时，请重试".to_string(),
            Self::Network(kind) => format!("网络请求失败：{}", kind),
            Self::JsonDecode(_) => "视频数据解析错误".to_string(),
            Self::NoUsableVideo => "API返回无效数据：缺少视频URL".to_string(),
            Self::SessionClosed => "插件已停止，HTTP会话已关闭".to_string(),
            Self::NoEndpointSucceeded { last_error, .. } => match last_error {
                Some(last) => format!("{}\n{}", NO_ENDPOINT_MESSAGE, last.user_message()),
                None => NO_ENDPOINT_MESSAGE.to_string(),
            },
        }
    }
}

/// Shown when every endpoint has been exhausted.
pub const NO_ENDPOINT_MESSAGE: &str = "获取视频失败：所有接口均不可用，请稍后再试";

fn network_kind(err: &reqwest::Error) -> &'static str {
    if err.is_connect() {
        "ConnectError"
    } else if err.is_request() {
        "RequestError"
    } else if err.is_body() {
        "BodyError"
    } else if err.is_redirect() {
        "RedirectError"
    } else if err.is_builder() {
        "BuilderError"
    } else {
        "ClientError"
    }
}

/// The primary error type for shortvid operations outside the fetch flow.
#[derive(Error, Debug)]
pub enum ShortvidError {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A fetch that ended without a video.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// A specialized `Result` type for shortvid operations.
pub type Result<T> = std::result::Result<T, ShortvidError>;
