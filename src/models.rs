//! Data structures and types for recdeck
//!
//! Normalized domain models shared by every screen, organized by concern:
//! - **Works**: recorded programs regardless of which backend produced them
//! - **Files**: playable video files attached to a work
//! - **Search**: criteria and row slots used for related-content rows

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Backend Variant
// =============================================================================

/// Which generation of the recording server API is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendVariant {
    /// EPGStation 1.x (`/api/recorded` returns `{recorded, total}`)
    Legacy,
    /// EPGStation 2.x (`/api/recorded` returns `{records, total}`)
    #[default]
    V2,
}

impl BackendVariant {
    /// Parse from user input ("v1", "1", "legacy", "v2", "2")
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "v1" | "1" | "legacy" => Some(BackendVariant::Legacy),
            "v2" | "2" => Some(BackendVariant::V2),
            _ => None,
        }
    }
}

impl fmt::Display for BackendVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendVariant::Legacy => write!(f, "v1"),
            BackendVariant::V2 => write!(f, "v2"),
        }
    }
}

// =============================================================================
// Playable Files
// =============================================================================

/// Where a playable file comes from, needed to build its stream URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Legacy unencoded TS recording (synthetic entry)
    LegacyOriginal,
    /// Legacy encoded file, addressed by its encoded id
    LegacyEncoded,
    /// V2 video file, addressed by its video file id
    Video,
}

/// File id used for the synthetic "original TS" entry of legacy works
pub const ORIGINAL_FILE_ID: u64 = 0;

/// One playable file of a recorded work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayableFile {
    pub file_id: u64,
    pub display_name: String,
    pub kind: FileKind,
}

impl PlayableFile {
    /// Label shown on the overview action button
    pub fn action_label(&self) -> String {
        format!("Play {}", self.display_name)
    }
}

impl fmt::Display for PlayableFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.display_name, self.file_id)
    }
}

// =============================================================================
// Recorded Work
// =============================================================================

/// A recorded program, normalized from either backend schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordedWork {
    pub id: u64,
    pub name: String,
    /// Absent when the recording was not created by an automatic rule
    pub rule_id: Option<u64>,
    /// Backend-specific thumbnail reference, empty when there is none
    pub thumbnail_ref: String,
    pub is_recording: bool,
    pub playable_files: Vec<PlayableFile>,
    pub description: String,
    pub extended: String,
    pub channel_id: u64,
    /// Unix epoch milliseconds
    pub start_at: i64,
    /// Unix epoch milliseconds
    pub end_at: i64,
}

impl RecordedWork {
    /// Duration in whole minutes
    pub fn duration_minutes(&self) -> i64 {
        ((self.end_at - self.start_at) / 60_000).max(0)
    }

    /// Air time as `HH:MM-HH:MM` (UTC)
    pub fn time_range(&self) -> String {
        format!("{}-{}", clock(self.start_at), clock(self.end_at))
    }
}

fn clock(epoch_ms: i64) -> String {
    let minutes = epoch_ms.div_euclid(60_000).rem_euclid(24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

impl fmt::Display for RecordedWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = if self.is_recording { " [REC]" } else { "" };
        write!(f, "{}{} ({}m)", self.name, rec, self.duration_minutes())
    }
}

// =============================================================================
// Search
// =============================================================================

/// Dimension used to look up related works
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum SearchCriterion {
    /// Series keyword derived from the current title
    Keyword(String),
    /// Automation rule of the current work (`None` leaves the rule filter off)
    RuleId(Option<u64>),
}

impl fmt::Display for SearchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCriterion::Keyword(k) => write!(f, "keyword \"{}\"", k),
            SearchCriterion::RuleId(Some(id)) => write!(f, "rule {}", id),
            SearchCriterion::RuleId(None) => write!(f, "no rule"),
        }
    }
}

/// Related-content row slots on the detail screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSlot {
    SameSeries = 0,
    SameRule = 1,
}

impl RowSlot {
    pub const ALL: [RowSlot; 2] = [RowSlot::SameSeries, RowSlot::SameRule];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(RowSlot::SameSeries),
            1 => Some(RowSlot::SameRule),
            _ => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
