//! EPGStation 2.x client
//!
//! Records are served under `/api/recorded`; thumbnails and video files
//! have their own id spaces (`/api/thumbnails/{id}`, `/api/videos/{id}`).

use serde::{Deserialize, Serialize};

use super::{ApiError, Credentials, QueryBuilder, Transport};

/// Video file descriptor attached to a v2 item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub filename: Option<String>,
    /// "ts" or "encoded"
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Recorded item as served by EPGStation 2.x
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedItem {
    pub id: u64,
    #[serde(default)]
    pub rule_id: Option<u64>,
    #[serde(default)]
    pub program_id: Option<u64>,
    pub channel_id: u64,
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
    pub sub_genre1: Option<u32>,
    #[serde(default)]
    pub is_recording: bool,
    #[serde(default)]
    pub is_encoding: bool,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub thumbnails: Option<Vec<u64>>,
    #[serde(default)]
    pub video_files: Option<Vec<VideoFile>>,
}

/// Page of recorded items
#[derive(Debug, Clone, Deserialize)]
pub struct Records {
    pub records: Vec<RecordedItem>,
    pub total: u64,
}

/// Query for `/api/recorded`, also carried by continuation placeholders
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecordedParamV2 {
    pub is_half_width: bool,
    pub offset: u64,
    pub limit: u64,
    pub is_reverse: Option<bool>,
    pub rule_id: Option<u64>,
    pub channel_id: Option<u64>,
    pub genre: Option<u32>,
    pub keyword: Option<String>,
    pub has_original_file: Option<bool>,
}

impl GetRecordedParamV2 {
    pub fn new(limit: u64) -> Self {
        Self {
            is_half_width: true,
            offset: 0,
            limit,
            is_reverse: None,
            rule_id: None,
            channel_id: None,
            genre: None,
            keyword: None,
            has_original_file: None,
        }
    }

    pub fn query_string(&self) -> String {
        QueryBuilder::new()
            .push("isHalfWidth", self.is_half_width)
            .push("offset", self.offset)
            .push("limit", self.limit)
            .push_opt("isReverse", self.is_reverse)
            .push_opt("ruleId", self.rule_id)
            .push_opt("channelId", self.channel_id)
            .push_opt("genre", self.genre)
            .push_opt("keyword", self.keyword.as_deref())
            .push_opt("hasOriginalFile", self.has_original_file)
            .build()
    }
}

/// EPGStation 2.x API client
#[derive(Debug, Clone)]
pub struct V2Client {
    transport: Transport,
}

impl V2Client {
    pub fn new(base_url: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            transport: Transport::new(base_url, credentials),
        }
    }

    /// Fetch one page of recorded items
    pub async fn get_recorded(&self, param: &GetRecordedParamV2) -> Result<Records, ApiError> {
        let endpoint = format!("/api/recorded{}", param.query_string());
        self.transport.get_json(&endpoint).await
    }

    /// Fetch a single recorded item
    pub async fn get_item(&self, id: u64) -> Result<RecordedItem, ApiError> {
        self.transport
            .get_json(&format!("/api/recorded/{}?isHalfWidth=true", id))
            .await
    }

    /// Thumbnail bytes by thumbnail id
    pub async fn get_thumbnail(&self, thumbnail_id: &str) -> Result<Vec<u8>, ApiError> {
        self.transport
            .get_bytes(&format!("/api/thumbnails/{}", urlencoding::encode(thumbnail_id)))
            .await
    }

    pub fn thumbnail_url(&self, thumbnail_id: &str) -> String {
        self.transport
            .url(&format!("/api/thumbnails/{}", urlencoding::encode(thumbnail_id)))
    }

    /// Stream URL of a video file
    pub fn video_url(&self, video_file_id: u64) -> String {
        self.transport.url(&format!("/api/videos/{}", video_file_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_query_string() {
        let mut p = GetRecordedParamV2::new(24);
        p.keyword = Some("news".into());
        assert_eq!(
            p.query_string(),
            "?isHalfWidth=true&offset=0&limit=24&keyword=news"
        );
    }

    #[test]
    fn test_item_video_file_type_field() {
        let json = r#"{
            "id": 9, "channelId": 1, "startAt": 0, "endAt": 60000, "name": "x",
            "videoFiles": [{"id": 40, "name": "TS", "type": "ts"}]
        }"#;
        let item: RecordedItem = serde_json::from_str(json).unwrap();
        let files = item.video_files.unwrap();
        assert_eq!(files[0].file_type.as_deref(), Some("ts"));
        assert!(item.thumbnails.is_none());
    }

    #[test]
    fn test_urls() {
        let c = V2Client::new("http://tv:8888/", None);
        assert_eq!(c.thumbnail_url("77"), "http://tv:8888/api/thumbnails/77");
        assert_eq!(c.video_url(40), "http://tv:8888/api/videos/40");
    }
}
