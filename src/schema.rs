//! Schema adapter
//!
//! The two server generations describe the same recording differently.
//! Raw records are wrapped in [`RawRecord`] at the network boundary and
//! converted to [`RecordedWork`] right away; nothing past this module
//! looks at the raw shapes.

use serde::{Deserialize, Serialize};

use crate::api::legacy::RecordedProgram;
use crate::api::v2::RecordedItem;
use crate::models::{BackendVariant, FileKind, PlayableFile, RecordedWork, ORIGINAL_FILE_ID};

/// Display name of the synthetic original-file entry
pub const ORIGINAL_FILE_NAME: &str = "TS";

/// A record exactly as one of the backends served it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", content = "record", rename_all = "lowercase")]
pub enum RawRecord {
    Legacy(RecordedProgram),
    V2(RecordedItem),
}

impl RawRecord {
    pub fn variant(&self) -> BackendVariant {
        match self {
            RawRecord::Legacy(_) => BackendVariant::Legacy,
            RawRecord::V2(_) => BackendVariant::V2,
        }
    }

    pub fn normalize(&self) -> RecordedWork {
        normalize(self)
    }
}

impl From<RecordedProgram> for RawRecord {
    fn from(p: RecordedProgram) -> Self {
        RawRecord::Legacy(p)
    }
}

impl From<RecordedItem> for RawRecord {
    fn from(i: RecordedItem) -> Self {
        RawRecord::V2(i)
    }
}

/// Map a raw record of either schema to the normalized work
pub fn normalize(raw: &RawRecord) -> RecordedWork {
    match raw {
        RawRecord::Legacy(p) => from_legacy(p),
        RawRecord::V2(i) => from_v2(i),
    }
}

fn from_legacy(p: &RecordedProgram) -> RecordedWork {
    let mut files = Vec::new();
    if p.original {
        files.push(PlayableFile {
            file_id: ORIGINAL_FILE_ID,
            display_name: ORIGINAL_FILE_NAME.to_string(),
            kind: FileKind::LegacyOriginal,
        });
    }
    files.extend(p.encoded.iter().flatten().map(|e| PlayableFile {
        file_id: e.encoded_id,
        display_name: e.name.clone(),
        kind: FileKind::LegacyEncoded,
    }));

    RecordedWork {
        id: p.id,
        name: p.name.clone(),
        rule_id: p.rule_id,
        // Legacy thumbnails are addressed by the program id itself
        thumbnail_ref: p.id.to_string(),
        is_recording: p.recording,
        playable_files: files,
        description: p.description.clone().unwrap_or_default(),
        extended: p.extended.clone().unwrap_or_default(),
        channel_id: p.channel_id,
        start_at: p.start_at,
        end_at: p.end_at,
    }
}

fn from_v2(i: &RecordedItem) -> RecordedWork {
    let thumbnail_ref = i
        .thumbnails
        .as_ref()
        .and_then(|t| t.first())
        .map(|id| id.to_string())
        .unwrap_or_default();

    let files = i
        .video_files
        .iter()
        .flatten()
        .map(|v| PlayableFile {
            file_id: v.id,
            display_name: v.name.clone(),
            kind: FileKind::Video,
        })
        .collect();

    RecordedWork {
        id: i.id,
        name: i.name.clone(),
        rule_id: i.rule_id,
        thumbnail_ref,
        is_recording: i.is_recording,
        playable_files: files,
        description: i.description.clone().unwrap_or_default(),
        extended: i.extended.clone().unwrap_or_default(),
        channel_id: i.channel_id,
        start_at: i.start_at,
        end_at: i.end_at,
    }
}
