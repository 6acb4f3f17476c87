//! recdeck - terminal client for an EPGStation recording server
//!
//! Browse recordings, see what else belongs to the same series or the same
//! automation rule, and play any of a recording's files.
//!
//! # Modules
//!
//! - `models` - Normalized recordings, files, criteria
//! - `title` - Series title extraction from raw program titles
//! - `schema` - Mapping of both server schemas onto `RecordedWork`
//! - `api` - HTTP clients for EPGStation 1.x and 2.x, and the session over them
//! - `related` - Paginated related-content rows
//! - `artwork` - Thumbnails with static fallbacks
//! - `playback` - Internal and external player dispatch
//! - `app` - Screen state and navigation
//! - `ui` - TUI rendering

pub mod api;
pub mod app;
pub mod artwork;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod playback;
pub mod related;
pub mod schema;
pub mod title;
pub mod ui;

// Re-export commonly used types
pub use models::{BackendVariant, FileKind, PlayableFile, RecordedWork, RowSlot, SearchCriterion};

pub use api::{ApiError, BackendSession, Page, RecordedQuery};
pub use app::{App, AppState, Entry, EntryError};
pub use config::Config;
pub use related::{Continuation, DisplayRow, RelatedRows, RowItem, RowSink};
pub use schema::{normalize, RawRecord};
pub use title::extract_series_title;
