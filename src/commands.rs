//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the backend session.
//! Each handler takes CLI args, the loaded config and Output, returns ExitCode.

use std::sync::Arc;

use serde::Serialize;

use crate::api::{ApiError, BackendSession, RecordedQuery};
use crate::app::Entry;
use crate::cli::{ExitCode, ListCmd, Output, PlayCmd, RelatedCmd, ShowCmd, TitleCmd};
use crate::config::Config;
use crate::models::{RecordedWork, RowSlot, SearchCriterion};
use crate::playback::{self, PlaybackOutcome};
use crate::related::{RelatedRows, RowUpdate};
use crate::title::extract_series_title;

/// Exit code for a failed server call
fn api_exit(e: &ApiError) -> ExitCode {
    match e {
        ApiError::NotFound => ExitCode::NotFound,
        _ => ExitCode::NetworkError,
    }
}

async fn fetch_work(
    session: &BackendSession,
    id: u64,
    output: &Output,
) -> Result<RecordedWork, ExitCode> {
    session.fetch(id).await.map_err(|e| {
        output.error(format!("Could not fetch recording {}: {}", id, e), api_exit(&e))
    })
}

// =============================================================================
// List Command
// =============================================================================

pub async fn list_cmd(cmd: ListCmd, config: &Config, output: &Output) -> ExitCode {
    let session = config.default_session();
    let limit = cmd.limit.unwrap_or(config.page_size).max(1);

    let mut query = RecordedQuery::first_page(session.variant(), limit).with_offset(cmd.offset);
    match &mut query {
        RecordedQuery::Legacy(p) => {
            p.keyword = cmd.keyword.clone();
            p.rule = cmd.rule;
        }
        RecordedQuery::V2(p) => {
            p.keyword = cmd.keyword.clone();
            p.rule_id = cmd.rule;
        }
    }

    output.info(format!("Listing recordings from {}...", config.server_url));

    match session.search(&query).await {
        Ok(page) => {
            if !output.json {
                for work in &page.works {
                    println!("{:>8}  {}", work.id, work);
                }
                output.info(format!(
                    "{} of {} (offset {})",
                    page.works.len(),
                    page.total,
                    cmd.offset
                ));
                return ExitCode::Success;
            }
            if let Err(e) = output.print(&page) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("List failed: {}", e), api_exit(&e)),
    }
}

// =============================================================================
// Show Command
// =============================================================================

pub async fn show_cmd(cmd: ShowCmd, config: &Config, output: &Output) -> ExitCode {
    let session = config.default_session();
    let work = match fetch_work(&session, cmd.id, output).await {
        Ok(w) => w,
        Err(code) => return code,
    };
    if let Err(e) = output.print(&work) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Related Command
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RelatedRowOutput {
    pub slot: RowSlot,
    pub title: String,
    pub criterion: Option<SearchCriterion>,
    pub works: Vec<RecordedWork>,
    /// Offset of the next page, when the server has more
    pub next_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RelatedOutput {
    pub id: u64,
    pub name: String,
    pub series_title: String,
    pub rows: Vec<RelatedRowOutput>,
}

pub async fn related_cmd(cmd: RelatedCmd, config: &Config, output: &Output) -> ExitCode {
    let session = Arc::new(config.default_session());
    let work = match fetch_work(&session, cmd.id, output).await {
        Ok(w) => w,
        Err(code) => return code,
    };

    let (mut rows, mut events) = RelatedRows::new(Arc::clone(&session), config.page_size);
    rows.load(&work);

    let mut pending = rows.rows().filter(|(_, r)| r.is_built()).count();
    let mut errors: [Option<String>; 2] = [None, None];
    while pending > 0 {
        let Some(event) = events.recv().await else {
            break;
        };
        match rows.apply(event) {
            RowUpdate::Applied { .. } => pending -= 1,
            RowUpdate::Failed { slot, message } => {
                errors[slot.index()] = Some(message);
                pending -= 1;
            }
            RowUpdate::Stale => {}
        }
    }

    let result = RelatedOutput {
        id: work.id,
        name: work.name.clone(),
        series_title: extract_series_title(&work.name),
        rows: rows
            .rows()
            .filter(|(_, r)| r.is_built())
            .map(|(slot, r)| RelatedRowOutput {
                slot,
                title: r.title.clone(),
                criterion: r.criterion.clone(),
                works: r.works().cloned().collect(),
                next_offset: r.continuation().map(|c| c.offset()),
                error: errors[slot.index()].take(),
            })
            .collect(),
    };

    let failed = result.rows.iter().any(|r| r.error.is_some());

    if !output.json {
        for row in &result.rows {
            println!("== {} ==", row.title);
            for w in &row.works {
                println!("{:>8}  {}", w.id, w);
            }
            if let Some(offset) = row.next_offset {
                println!("          … more from offset {}", offset);
            }
            if let Some(e) = &row.error {
                output.info(e);
            }
        }
    } else if let Err(e) = output.print(&result) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }

    if failed {
        ExitCode::NetworkError
    } else {
        ExitCode::Success
    }
}

// =============================================================================
// Title Command
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TitleOutput {
    pub raw: String,
    pub title: String,
}

pub fn title_cmd(cmd: TitleCmd, output: &Output) -> ExitCode {
    let title = extract_series_title(&cmd.raw);
    let data = TitleOutput {
        raw: cmd.raw,
        title: title.clone(),
    };
    if let Err(e) = output.print_line(&title, data) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Play Command
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PlayOutput {
    pub status: &'static str,
    pub player: String,
    pub url: String,
}

pub async fn play_cmd(cmd: PlayCmd, config: &Config, output: &Output) -> ExitCode {
    let session = config.default_session();
    let work = match fetch_work(&session, cmd.id, output).await {
        Ok(w) => w,
        Err(code) => return code,
    };

    let file = match cmd.file {
        Some(id) => work.playable_files.iter().find(|f| f.file_id == id),
        None => work.playable_files.first(),
    };
    let Some(file) = file.cloned() else {
        return output.error(
            format!("Recording {} has no playable file {:?}", work.id, cmd.file),
            ExitCode::NotFound,
        );
    };

    let request = playback::dispatch(&config.player, &session, &work, &file);
    output.info(format!("{} - {}", work.name, file.action_label()));

    match playback::execute(&request, &session, &config.player_install_url).await {
        Ok(PlaybackOutcome::Started { player, url }) => {
            let data = PlayOutput {
                status: "playing",
                player: player.clone(),
                url: url.clone(),
            };
            if let Err(e) = output.print_line(format!("Playing with {}: {}", player, url), data) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Ok(PlaybackOutcome::PlayerMissing { notice }) => output.error(notice, ExitCode::PlayerFailed),
        Err(e) => output.error(e.to_string(), ExitCode::PlayerFailed),
    }
}

// =============================================================================
// Detail Entry
// =============================================================================

/// Fetch a recording and serialize it as a Detail screen entry
pub async fn detail_entry(id: u64, config: &Config) -> anyhow::Result<Entry> {
    let session = config.default_session();
    let raw = session.fetch_raw(id).await?;
    Ok(Entry::from_record(&raw)?)
}
