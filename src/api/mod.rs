//! API clients for the recording server
//!
//! - legacy: EPGStation 1.x (`{recorded, total}` pages, encoded-file ids)
//! - v2: EPGStation 2.x (`{records, total}` pages, video-file ids)
//! - session: the one backend chosen for a screen, over either client

pub mod legacy;
pub mod session;
pub mod v2;

pub use legacy::LegacyClient;
pub use session::{BackendSession, Page, RecordedQuery};
pub use v2::V2Client;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::models::BackendVariant;

/// Recording server API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Authentication rejected ({0})")]
    Unauthorized(u16),

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Query built for {query} sent to a {session} session")]
    VariantMismatch {
        session: BackendVariant,
        query: BackendVariant,
    },

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Basic-auth credentials attached to every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Connection details shared by both clients
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    pub client: reqwest::Client,
}

impl Transport {
    pub fn new(base_url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(url);
        match &self.credentials {
            Some(c) => builder.basic_auth(&c.username, Some(&c.password)),
            None => builder,
        }
    }

    /// GET an endpoint and decode its JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "GET");

        let response = self
            .request(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        check_status(status)?;

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// GET raw bytes (thumbnails)
    pub async fn get_bytes(&self, endpoint: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.url(endpoint);
        tracing::debug!(%url, "GET bytes");

        let response = self.request(&url).send().await?;
        check_status(response.status())?;

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::InvalidResponse("empty body".into()));
        }
        Ok(bytes.to_vec())
    }
}

fn check_status(status: StatusCode) -> Result<(), ApiError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ApiError::Unauthorized(status.as_u16()))
        }
        s => Err(ApiError::ServerError(s.as_u16())),
    }
}

/// Builds a `?a=1&b=2` query string from the fields that are set
#[derive(Debug, Default)]
pub(crate) struct QueryBuilder {
    pairs: Vec<(&'static str, String)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: &'static str, value: impl ToString) -> Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    pub fn push_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    pub fn build(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let joined = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder_skips_unset() {
        let q = QueryBuilder::new()
            .push("offset", 0)
            .push_opt("rule", None::<u64>)
            .push_opt("keyword", Some("ドラマ 2"))
            .build();
        assert_eq!(q, "?offset=0&keyword=%E3%83%89%E3%83%A9%E3%83%9E%202");
    }

    #[test]
    fn test_query_builder_empty() {
        assert_eq!(QueryBuilder::new().build(), "");
    }

    #[test]
    fn test_transport_trims_trailing_slash() {
        let t = Transport::new("http://tv.local:8888/", None);
        assert_eq!(t.url("/api/recorded"), "http://tv.local:8888/api/recorded");
    }
}
