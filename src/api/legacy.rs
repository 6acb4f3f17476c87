//! EPGStation 1.x client
//!
//! Recorded programs live under `/api/recorded`. A program may have its
//! original TS file and any number of encoded files, each with its own
//! `encodedId`.

use serde::{Deserialize, Serialize};

use super::{ApiError, Credentials, QueryBuilder, Transport};

/// Encoded file descriptor attached to a legacy program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedProgram {
    pub encoded_id: u64,
    pub name: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

/// Recorded program as served by EPGStation 1.x
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedProgram {
    pub id: u64,
    pub channel_id: u64,
    #[serde(default)]
    pub channel_type: Option<String>,
    pub start_at: i64,
    pub end_at: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extended: Option<String>,
    #[serde(default)]
    pub genre1: Option<u32>,
    #[serde(default)]
    pub genre2: Option<u32>,
    #[serde(default)]
    pub recording: bool,
    #[serde(default)]
    pub protection: bool,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub has_thumbnail: bool,
    /// Whether the unencoded TS is still on disk
    #[serde(default)]
    pub original: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub encoded: Option<Vec<EncodedProgram>>,
    #[serde(default)]
    pub rule_id: Option<u64>,
}

/// Page of recorded programs
#[derive(Debug, Clone, Deserialize)]
pub struct GetRecordedResponse {
    pub recorded: Vec<RecordedProgram>,
    pub total: u64,
}

/// Query for `/api/recorded`, also carried by continuation placeholders
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecordedParam {
    pub limit: u64,
    pub offset: u64,
    pub reverse: Option<bool>,
    pub rule: Option<u64>,
    pub genre1: Option<u32>,
    pub channel: Option<u64>,
    pub keyword: Option<String>,
    pub has_ts: Option<bool>,
    pub recording: Option<bool>,
}

impl GetRecordedParam {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            offset: 0,
            reverse: None,
            rule: None,
            genre1: None,
            channel: None,
            keyword: None,
            has_ts: None,
            recording: None,
        }
    }

    pub fn query_string(&self) -> String {
        QueryBuilder::new()
            .push("limit", self.limit)
            .push("offset", self.offset)
            .push_opt("reverse", self.reverse)
            .push_opt("rule", self.rule)
            .push_opt("genre1", self.genre1)
            .push_opt("channel", self.channel)
            .push_opt("keyword", self.keyword.as_deref())
            .push_opt("hasTs", self.has_ts)
            .push_opt("recording", self.recording)
            .build()
    }
}

/// EPGStation 1.x API client
#[derive(Debug, Clone)]
pub struct LegacyClient {
    transport: Transport,
}

impl LegacyClient {
    pub fn new(base_url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            transport: Transport::new(base_url, credentials),
        }
    }

    /// Fetch one page of recorded programs
    pub async fn get_recorded(
        &self,
        param: &GetRecordedParam,
    ) -> Result<GetRecordedResponse, ApiError> {
        let endpoint = format!("/api/recorded{}", param.query_string());
        self.transport.get_json(&endpoint).await
    }

    /// Fetch a single recorded program
    pub async fn get_program(&self, id: u64) -> Result<RecordedProgram, ApiError> {
        self.transport.get_json(&format!("/api/recorded/{}", id)).await
    }

    /// Thumbnail bytes for a program
    pub async fn get_thumbnail(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        self.transport
            .get_bytes(&format!("/api/recorded/{}/thumbnail", urlencoding::encode(id)))
            .await
    }

    pub fn thumbnail_url(&self, id: &str) -> String {
        self.transport
            .url(&format!("/api/recorded/{}/thumbnail", urlencoding::encode(id)))
    }

    /// Stream URL of the original TS
    pub fn ts_video_url(&self, id: u64) -> String {
        self.transport.url(&format!("/api/recorded/{}/file", id))
    }

    /// Stream URL of an encoded file
    pub fn encoded_video_url(&self, id: u64, encoded_id: u64) -> String {
        self.transport
            .url(&format!("/api/recorded/{}/file?encodedId={}", id, encoded_id))
    }
}
