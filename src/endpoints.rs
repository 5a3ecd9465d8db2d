//! Upstream endpoints and their response schemas.
//!
//! Every upstream video API answers with its own JSON shape. Instead of
//! guessing the shape from the URL, each [`Endpoint`] carries the
//! [`ResponseSchema`] it speaks, and [`parse_video_data`] dispatches on that
//! tag.
//!
//! # Schemas
//!
//! ```text
//! video_field   {"video": "https://...", "title": "..."}
//! data_object   {"data": {"url": "https://...", "title": "..."}}
//! url_field     {"url": "https://...", "title": "..."}
//! ```

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Default title for `video_field` and `url_field` responses.
pub const DEFAULT_BEAUTY_TITLE: &str = "美女视频";
/// Default title for `data_object` responses.
pub const DEFAULT_SHORT_TITLE: &str = "短视频";

// ============================================================================
// Response Schema
// ============================================================================

/// JSON shape returned by an upstream endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSchema {
    /// Top-level `video` holds the URL, optional top-level `title`.
    VideoField,
    /// `data` object with `url` and `title`.
    DataObject,
    /// Top-level `url` and `title`.
    UrlField,
    /// A schema name this build does not understand. Never yields a result.
    #[serde(other)]
    Unknown,
}

impl ResponseSchema {
    /// Title used when the response carries none.
    pub fn default_title(&self) -> &'static str {
        match self {
            Self::DataObject => DEFAULT_SHORT_TITLE,
            Self::VideoField | Self::UrlField | Self::Unknown => DEFAULT_BEAUTY_TITLE,
        }
    }

    /// Pull the raw `(url, title)` pair out of a response body.
    ///
    /// The title is `None` when absent, not a string, or blank.
    fn extract<'a>(
        &self,
        body: &'a Value,
    ) -> std::result::Result<(&'a str, Option<&'a str>), String> {
        let (object, url_key) = match self {
            Self::VideoField => (body, "video"),
            Self::UrlField => (body, "url"),
            Self::DataObject => {
                let data = body
                    .get("data")
                    .filter(|d| d.is_object())
                    .ok_or_else(|| "missing 'data' object".to_string())?;
                (data, "url")
            }
            Self::Unknown => return Err("unknown response schema".to_string()),
        };

        if !object.is_object() {
            return Err("response body is not a JSON object".to_string());
        }

        let url = object
            .get(url_key)
            .and_then(Value::as_str)
            .ok_or_else(|| format!("missing string field '{}'", url_key))?;

        let title = object
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty());

        Ok((url, title))
    }
}

impl fmt::Display for ResponseSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VideoField => "video_field",
            Self::DataObject => "data_object",
            Self::UrlField => "url_field",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// One upstream video API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Base URL; `type=json` is appended as a query parameter per request.
    pub url: String,
    /// Shape of the JSON this endpoint returns.
    pub schema: ResponseSchema,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, schema: ResponseSchema) -> Self {
        Self {
            url: url.into(),
            schema,
        }
    }

    /// Host part of the URL, or the full URL if it does not parse.
    pub fn host(&self) -> String {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.url.clone())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.schema)
    }
}

/// The built-in endpoint list.
pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("https://api.qqsuu.cn/api/dm-xjj2", ResponseSchema::VideoField),
        Endpoint::new(
            "https://api.kuleu.com/api/MP4_xiaojiejie",
            ResponseSchema::DataObject,
        ),
        Endpoint::new("https://api.yujn.cn/api/zzxjj.php", ResponseSchema::UrlField),
    ]
}

// ============================================================================
// Normalized result
// ============================================================================

/// Endpoint-agnostic video record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoResult {
    /// Absolute http(s) URL of the video.
    pub url: String,
    pub title: String,
    /// Endpoint that produced this result.
    pub source: Endpoint,
}

/// Returns `true` for absolute `http://` or `https://` URLs.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Normalize a response body from `endpoint` into a [`VideoResult`].
///
/// Returns `None` for unknown schemas, malformed bodies, and URLs that are
/// not absolute http(s).
pub fn parse_video_data(body: &Value, endpoint: &Endpoint) -> Option<VideoResult> {
    let (url, title) = match endpoint.schema.extract(body) {
        Ok(pair) => pair,
        Err(reason) => {
            debug!(endpoint = %endpoint.url, schema = %endpoint.schema, "unusable response: {reason}");
            return None;
        }
    };

    if !is_http_url(url) {
        debug!(endpoint = %endpoint.url, url, "discarding non-http(s) video URL");
        return None;
    }

    Some(VideoResult {
        url: url.to_string(),
        title: title
            .unwrap_or_else(|| endpoint.schema.default_title())
            .to_string(),
        source: endpoint.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint(schema: ResponseSchema) -> Endpoint {
        Endpoint::new("https://api.example.com/v", schema)
    }

    #[test]
    fn test_video_field_with_title() {
        let ep = endpoint(ResponseSchema::VideoField);
        let body = json!({"video": "https://x/a.mp4", "title": "T"});
        let result = parse_video_data(&body, &ep).unwrap();
        assert_eq!(result.url, "https://x/a.mp4");
        assert_eq!(result.title, "T");
        assert_eq!(result.source, ep);
    }

    #[test]
    fn test_video_field_default_title() {
        let ep = endpoint(ResponseSchema::VideoField);
        let body = json!({"video": "https://x/a.mp4"});
        assert_eq!(parse_video_data(&body, &ep).unwrap().title, "美女视频");
    }

    #[test]
    fn test_data_object_default_title() {
        let ep = endpoint(ResponseSchema::DataObject);
        let body = json!({"data": {"url": "http://y/b.mp4"}});
        let result = parse_video_data(&body, &ep).unwrap();
        assert_eq!(result.url, "http://y/b.mp4");
        assert_eq!(result.title, "短视频");
        assert_eq!(result.source, ep);
    }

    #[test]
    fn test_data_object_with_title() {
        let ep = endpoint(ResponseSchema::DataObject);
        let body = json!({"code": 200, "data": {"url": "https://y/b.mp4", "title": "舞蹈"}});
        assert_eq!(parse_video_data(&body, &ep).unwrap().title, "舞蹈");
    }

    #[test]
    fn test_url_field() {
        let ep = endpoint(ResponseSchema::UrlField);
        let body = json!({"url": "https://z/c.mp4"});
        let result = parse_video_data(&body, &ep).unwrap();
        assert_eq!(result.url, "https://z/c.mp4");
        assert_eq!(result.title, "美女视频");
    }

    #[test]
    fn test_blank_title_uses_default() {
        let ep = endpoint(ResponseSchema::UrlField);
        let body = json!({"url": "https://z/c.mp4", "title": "   "});
        assert_eq!(parse_video_data(&body, &ep).unwrap().title, "美女视频");
    }

    #[test]
    fn test_non_http_url_rejected_for_every_schema() {
        let bodies = [
            (ResponseSchema::VideoField, json!({"video": "ftp://x/a.mp4"})),
            (ResponseSchema::DataObject, json!({"data": {"url": "//y/b.mp4"}})),
            (ResponseSchema::UrlField, json!({"url": "/relative/c.mp4"})),
        ];
        for (schema, body) in bodies {
            assert!(parse_video_data(&body, &endpoint(schema)).is_none(), "{schema}");
        }
    }

    #[test]
    fn test_unknown_schema_yields_none() {
        let ep = endpoint(ResponseSchema::Unknown);
        let body = json!({"video": "https://x/a.mp4", "url": "https://x/a.mp4"});
        assert!(parse_video_data(&body, &ep).is_none());
    }

    #[test]
    fn test_malformed_bodies_yield_none() {
        assert!(parse_video_data(&json!([1, 2]), &endpoint(ResponseSchema::UrlField)).is_none());
        assert!(
            parse_video_data(&json!({"video": 42}), &endpoint(ResponseSchema::VideoField))
                .is_none()
        );
        assert!(parse_video_data(
            &json!({"data": "https://y/b.mp4"}),
            &endpoint(ResponseSchema::DataObject)
        )
        .is_none());
    }

    #[test]
    fn test_schema_deserialize_unknown_name() {
        let ep: Endpoint =
            serde_json::from_str(r#"{"url": "https://a/b", "schema": "xml_feed"}"#).unwrap();
        assert_eq!(ep.schema, ResponseSchema::Unknown);

        let ep: Endpoint =
            serde_json::from_str(r#"{"url": "https://a/b", "schema": "data_object"}"#).unwrap();
        assert_eq!(ep.schema, ResponseSchema::DataObject);
    }

    #[test]
    fn test_endpoint_host() {
        assert_eq!(endpoint(ResponseSchema::UrlField).host(), "api.example.com");
        assert_eq!(Endpoint::new("not a url", ResponseSchema::UrlField).host(), "not a url");
    }

    #[test]
    fn test_default_endpoints_cover_every_schema() {
        let endpoints = default_endpoints();
        for schema in [
            ResponseSchema::VideoField,
            ResponseSchema::DataObject,
            ResponseSchema::UrlField,
        ] {
            assert!(endpoints.iter().any(|e| e.schema == schema));
        }
        assert!(endpoints.iter().all(|e| is_http_url(&e.url)));
    }
}
