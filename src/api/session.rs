//! Backend session
//!
//! A screen talks to exactly one server generation for its whole lifetime.
//! `BackendSession` wraps the matching client and speaks in normalized
//! terms: criteria go in, `RecordedWork` pages come out.

use serde::{Deserialize, Serialize};

use super::legacy::{GetRecordedParam, LegacyClient};
use super::v2::{GetRecordedParamV2, V2Client};
use super::{ApiError, Credentials};
use crate::models::{BackendVariant, FileKind, PlayableFile, RecordedWork, SearchCriterion};
use crate::schema::RawRecord;

/// Backend-specific query, re-issuable with a different offset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "variant", content = "param", rename_all = "lowercase")]
pub enum RecordedQuery {
    Legacy(GetRecordedParam),
    V2(GetRecordedParamV2),
}

impl RecordedQuery {
    pub fn variant(&self) -> BackendVariant {
        match self {
            RecordedQuery::Legacy(_) => BackendVariant::Legacy,
            RecordedQuery::V2(_) => BackendVariant::V2,
        }
    }

    pub fn offset(&self) -> u64 {
        match self {
            RecordedQuery::Legacy(p) => p.offset,
            RecordedQuery::V2(p) => p.offset,
        }
    }

    pub fn limit(&self) -> u64 {
        match self {
            RecordedQuery::Legacy(p) => p.limit,
            RecordedQuery::V2(p) => p.limit,
        }
    }

    /// Same query, different page
    pub fn with_offset(&self, offset: u64) -> Self {
        let mut next = self.clone();
        match &mut next {
            RecordedQuery::Legacy(p) => p.offset = offset,
            RecordedQuery::V2(p) => p.offset = offset,
        }
        next
    }

    /// Unfiltered first page, in server order
    pub fn first_page(variant: BackendVariant, limit: u64) -> Self {
        match variant {
            BackendVariant::Legacy => RecordedQuery::Legacy(GetRecordedParam::new(limit)),
            BackendVariant::V2 => RecordedQuery::V2(GetRecordedParamV2::new(limit)),
        }
    }

    /// Translate a criterion into the field names of the given backend
    pub fn for_criterion(variant: BackendVariant, criterion: &SearchCriterion, limit: u64) -> Self {
        let mut query = Self::first_page(variant, limit);
        match (&mut query, criterion) {
            (RecordedQuery::Legacy(p), SearchCriterion::Keyword(k)) => p.keyword = Some(k.clone()),
            (RecordedQuery::Legacy(p), SearchCriterion::RuleId(id)) => p.rule = *id,
            (RecordedQuery::V2(p), SearchCriterion::Keyword(k)) => p.keyword = Some(k.clone()),
            (RecordedQuery::V2(p), SearchCriterion::RuleId(id)) => p.rule_id = *id,
        }
        query
    }
}

/// One page of normalized search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub works: Vec<RecordedWork>,
    /// Total number of matches on the server
    pub total: u64,
}

/// The active backend and its connection context
#[derive(Debug, Clone)]
pub enum BackendSession {
    Legacy(LegacyClient),
    V2(V2Client),
}

impl BackendSession {
    pub fn new(
        variant: BackendVariant,
        base_url: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        match variant {
            BackendVariant::Legacy => BackendSession::Legacy(LegacyClient::new(base_url, credentials)),
            BackendVariant::V2 => BackendSession::V2(V2Client::new(base_url, credentials)),
        }
    }

    pub fn variant(&self) -> BackendVariant {
        match self {
            BackendSession::Legacy(_) => BackendVariant::Legacy,
            BackendSession::V2(_) => BackendVariant::V2,
        }
    }

    /// First-page query for a criterion against this backend
    pub fn query_for(&self, criterion: &SearchCriterion, limit: u64) -> RecordedQuery {
        RecordedQuery::for_criterion(self.variant(), criterion, limit)
    }

    /// Run a query and normalize the results
    pub async fn search(&self, query: &RecordedQuery) -> Result<Page, ApiError> {
        tracing::debug!(variant = %self.variant(), offset = query.offset(), limit = query.limit(), "search");
        match (self, query) {
            (BackendSession::Legacy(client), RecordedQuery::Legacy(param)) => {
                let response = client.get_recorded(param).await?;
                Ok(Page {
                    works: response
                        .recorded
                        .into_iter()
                        .map(|p| RawRecord::Legacy(p).normalize())
                        .collect(),
                    total: response.total,
                })
            }
            (BackendSession::V2(client), RecordedQuery::V2(param)) => {
                let response = client.get_recorded(param).await?;
                Ok(Page {
                    works: response
                        .records
                        .into_iter()
                        .map(|i| RawRecord::V2(i).normalize())
                        .collect(),
                    total: response.total,
                })
            }
            _ => Err(ApiError::VariantMismatch {
                session: self.variant(),
                query: query.variant(),
            }),
        }
    }

    /// Fetch a single record by id, as served
    pub async fn fetch_raw(&self, id: u64) -> Result<RawRecord, ApiError> {
        match self {
            BackendSession::Legacy(client) => client.get_program(id).await.map(RawRecord::Legacy),
            BackendSession::V2(client) => client.get_item(id).await.map(RawRecord::V2),
        }
    }

    /// Fetch a single record by id, normalized
    pub async fn fetch(&self, id: u64) -> Result<RecordedWork, ApiError> {
        self.fetch_raw(id).await.map(|raw| raw.normalize())
    }

    /// Fetchable image URL for a thumbnail reference
    pub fn thumbnail_url(&self, thumbnail_ref: &str) -> String {
        match self {
            BackendSession::Legacy(client) => client.thumbnail_url(thumbnail_ref),
            BackendSession::V2(client) => client.thumbnail_url(thumbnail_ref),
        }
    }

    /// Thumbnail bytes for a thumbnail reference
    pub async fn thumbnail(&self, thumbnail_ref: &str) -> Result<Vec<u8>, ApiError> {
        if thumbnail_ref.is_empty() {
            return Err(ApiError::NotFound);
        }
        match self {
            BackendSession::Legacy(client) => client.get_thumbnail(thumbnail_ref).await,
            BackendSession::V2(client) => client.get_thumbnail(thumbnail_ref).await,
        }
    }

    /// Streaming URL for one of a work's playable files
    pub fn stream_url(&self, work_id: u64, file: &PlayableFile) -> String {
        match (self, file.kind) {
            (BackendSession::Legacy(client), FileKind::LegacyOriginal) => client.ts_video_url(work_id),
            (BackendSession::Legacy(client), _) => client.encoded_video_url(work_id, file.file_id),
            (BackendSession::V2(client), _) => client.video_url(file.file_id),
        }
    }
}
