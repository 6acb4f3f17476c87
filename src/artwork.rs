//! Thumbnail resolution
//!
//! A work's thumbnail is fetched from the server; when that fails the
//! screen shows a static placeholder picked by recording status instead of
//! surfacing an error.

use serde::Serialize;
use std::fmt;

use crate::api::BackendSession;
use crate::models::RecordedWork;

/// What the overview shows in place of a picture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Artwork {
    /// Not resolved yet
    Pending,
    /// Thumbnail fetched from the server
    Thumbnail { url: String, bytes: usize },
    /// Static "recording in progress" image
    OnRecording,
    /// Static "no image" image
    NoImage,
}

impl Artwork {
    /// Static placeholder for a work whose thumbnail can't be shown
    pub fn fallback(is_recording: bool) -> Self {
        if is_recording {
            Artwork::OnRecording
        } else {
            Artwork::NoImage
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Artwork::Pending)
    }
}

impl fmt::Display for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artwork::Pending => write!(f, "loading thumbnail…"),
            Artwork::Thumbnail { url, bytes } => write!(f, "{} ({} KB)", url, bytes / 1024),
            Artwork::OnRecording => write!(f, "● REC"),
            Artwork::NoImage => write!(f, "no image"),
        }
    }
}

/// Fetch a work's thumbnail, falling back silently on any failure
pub async fn resolve(session: &BackendSession, work: &RecordedWork) -> Artwork {
    match session.thumbnail(&work.thumbnail_ref).await {
        Ok(bytes) => Artwork::Thumbnail {
            url: session.thumbnail_url(&work.thumbnail_ref),
            bytes: bytes.len(),
        },
        Err(e) => {
            tracing::debug!(id = work.id, error = %e, "thumbnail unavailable, using placeholder");
            Artwork::fallback(work.is_recording)
        }
    }
}
