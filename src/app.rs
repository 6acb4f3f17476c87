//! App state and core application logic
//!
//! Manages the screen state machine (Home list and a stack of Detail
//! screens), keyboard handling, and the background work feeding both.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::api::{ApiError, BackendSession, Page, RecordedQuery};
use crate::artwork::{self, Artwork};
use crate::config::Config;
use crate::models::{PlayableFile, RecordedWork, RowSlot};
use crate::playback::{self, PlaybackRequest};
use crate::related::{FocusOutcome, PageEvent, RelatedRows, RowItem, RowUpdate};
use crate::schema::RawRecord;

// =============================================================================
// App State Enum
// =============================================================================

/// Application state enum representing current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Recent recordings
    #[default]
    Home,
    /// Detail screen of one recording, with related rows
    Detail,
}

// =============================================================================
// Loading State
// =============================================================================

/// Loading state for async operations
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    /// Idle - no loading in progress
    #[default]
    Idle,
    /// Loading with optional message
    Loading(Option<String>),
    /// Error with message
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadingState::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoadingState::Loading(Some(msg)) => Some(msg),
            LoadingState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

// =============================================================================
// Selection State
// =============================================================================

/// Selection state for list views
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Currently selected index
    pub selected: usize,
    /// Total number of items
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, len }
    }

    /// Move selection up
    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Move selection down
    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    /// Move selection up by a page
    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
    }

    /// Move selection down by a page
    pub fn page_down(&mut self, page_size: usize) {
        if self.len > 0 {
            self.selected = (self.selected + page_size).min(self.len - 1);
        }
    }

    /// Jump to first item
    pub fn first(&mut self) {
        self.selected = 0;
    }

    /// Jump to last item
    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Update length (e.g., when new results come in)
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        // Clamp selected to valid range
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

// =============================================================================
// Entry
// =============================================================================

/// Invalid navigation into a Detail screen
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("No recording was selected")]
    Missing,
    #[error("Could not read the selected recording: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Serialized record a Detail screen is opened with.
///
/// Exactly one of the two is expected; the one supplied decides which
/// backend the screen talks to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Legacy `RecordedProgram` as JSON
    pub program: Option<String>,
    /// V2 `RecordedItem` as JSON
    pub item: Option<String>,
}

impl Entry {
    pub fn from_record(raw: &RawRecord) -> Result<Self, serde_json::Error> {
        Ok(match raw {
            RawRecord::Legacy(p) => Entry {
                program: Some(serde_json::to_string(p)?),
                item: None,
            },
            RawRecord::V2(i) => Entry {
                program: None,
                item: Some(serde_json::to_string(i)?),
            },
        })
    }

    /// Decode the supplied record; the legacy one wins if both are present
    pub fn parse(&self) -> Result<RawRecord, EntryError> {
        match (&self.program, &self.item) {
            (Some(program), _) => Ok(RawRecord::Legacy(serde_json::from_str(program)?)),
            (None, Some(item)) => Ok(RawRecord::V2(serde_json::from_str(item)?)),
            (None, None) => Err(EntryError::Missing),
        }
    }
}

// =============================================================================
// View-Specific State
// =============================================================================

/// Home view state
#[derive(Debug, Default)]
pub struct HomeState {
    pub works: Vec<RecordedWork>,
    /// Total recordings on the server
    pub total: u64,
    pub list: ListState,
    pub loading: LoadingState,
    pending: Option<oneshot::Receiver<Result<Page, ApiError>>>,
}

impl HomeState {
    pub fn set_page(&mut self, page: Page) {
        self.list.set_len(page.works.len());
        self.works = page.works;
        self.total = page.total;
        self.loading = LoadingState::Idle;
    }

    pub fn selected_work(&self) -> Option<&RecordedWork> {
        self.works.get(self.list.selected)
    }
}

/// Which part of the Detail screen has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailFocus {
    /// Play actions of the overview row
    #[default]
    Actions,
    Row(RowSlot),
}

/// Detail screen of one recording
pub struct DetailScreen {
    pub work: RecordedWork,
    pub rows: RelatedRows,
    events: UnboundedReceiver<PageEvent>,
    pub artwork: Artwork,
    artwork_rx: Option<oneshot::Receiver<Artwork>>,
    pub focus: DetailFocus,
    pub actions: ListState,
    /// Cursor per related row
    pub cursors: [usize; 2],
}

impl DetailScreen {
    /// Build the screen and start loading its rows and thumbnail
    pub fn open(session: Arc<BackendSession>, work: RecordedWork, page_size: u64) -> Self {
        let (rows, events) = RelatedRows::new(session, page_size);
        let actions = ListState::new(work.playable_files.len());
        let mut screen = Self {
            work,
            rows,
            events,
            artwork: Artwork::Pending,
            artwork_rx: None,
            focus: DetailFocus::Actions,
            actions,
            cursors: [0; 2],
        };
        screen.refresh();
        screen
    }

    pub fn session(&self) -> &Arc<BackendSession> {
        self.rows.session()
    }

    /// Rebuild both rows from scratch and re-resolve the thumbnail
    pub fn refresh(&mut self) {
        info!(id = self.work.id, name = %self.work.name, "loading detail screen");
        self.rows.load(&self.work);
        self.cursors = [0; 2];
        self.focus = DetailFocus::Actions;

        let (tx, rx) = oneshot::channel();
        let session = Arc::clone(self.session());
        let work = self.work.clone();
        tokio::spawn(async move {
            let art = artwork::resolve(&session, &work).await;
            let _ = tx.send(art);
        });
        self.artwork = Artwork::Pending;
        self.artwork_rx = Some(rx);
    }

    /// Apply every completion received so far, in receipt order
    pub fn poll(&mut self) -> Vec<RowUpdate> {
        let mut updates = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            updates.push(self.rows.apply(event));
        }
        for slot in RowSlot::ALL {
            let len = self.rows.row(slot).len();
            let cursor = &mut self.cursors[slot.index()];
            *cursor = (*cursor).min(len.saturating_sub(1));
        }

        if let Some(rx) = self.artwork_rx.as_mut() {
            match rx.try_recv() {
                Ok(art) => {
                    self.artwork = art;
                    self.artwork_rx = None;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.artwork = Artwork::fallback(self.work.is_recording);
                    self.artwork_rx = None;
                }
            }
        }
        updates
    }

    pub fn selected_file(&self) -> Option<&PlayableFile> {
        self.work.playable_files.get(self.actions.selected)
    }

    pub fn cursor(&self, slot: RowSlot) -> usize {
        self.cursors[slot.index()]
    }

    pub fn selected_item(&self, slot: RowSlot) -> Option<&RowItem> {
        self.rows.row(slot).get(self.cursor(slot))
    }

    /// Focusable parts, top to bottom
    fn focus_order(&self) -> Vec<DetailFocus> {
        let mut order = vec![DetailFocus::Actions];
        order.extend(
            RowSlot::ALL
                .into_iter()
                .filter(|s| !self.rows.row(*s).is_empty())
                .map(DetailFocus::Row),
        );
        order
    }

    pub fn focus_down(&mut self) -> FocusOutcome {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(pos + 1).min(order.len() - 1)];
        self.focus_current()
    }

    pub fn focus_up(&mut self) -> FocusOutcome {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[pos.saturating_sub(1)];
        self.focus_current()
    }

    pub fn move_left(&mut self) -> FocusOutcome {
        match self.focus {
            DetailFocus::Actions => {
                self.actions.up();
                FocusOutcome::Idle
            }
            DetailFocus::Row(slot) => {
                let cursor = &mut self.cursors[slot.index()];
                *cursor = cursor.saturating_sub(1);
                self.focus_current()
            }
        }
    }

    pub fn move_right(&mut self) -> FocusOutcome {
        match self.focus {
            DetailFocus::Actions => {
                self.actions.down();
                FocusOutcome::Idle
            }
            DetailFocus::Row(slot) => {
                let len = self.rows.row(slot).len();
                let cursor = &mut self.cursors[slot.index()];
                if *cursor + 1 < len {
                    *cursor += 1;
                }
                self.focus_current()
            }
        }
    }

    /// Notify the rows that the item under the cursor gained focus
    fn focus_current(&mut self) -> FocusOutcome {
        match self.focus {
            DetailFocus::Actions => FocusOutcome::Idle,
            DetailFocus::Row(slot) => {
                let index = self.cursor(slot);
                self.rows.on_focus(slot, index)
            }
        }
    }
}

/// Playback chosen on a Detail screen, waiting for the event loop
pub struct PendingPlayback {
    pub request: PlaybackRequest,
    pub session: Arc<BackendSession>,
}

// =============================================================================
// Main Application State
// =============================================================================

/// Main application state
pub struct App {
    /// Current state/screen
    pub state: AppState,
    /// Whether the app is running
    pub running: bool,
    /// Transient message, cleared on the next keypress
    pub notice: Option<String>,
    pub config: Config,

    pub home: HomeState,
    /// Navigation stack of Detail screens; the last one is shown
    pub screens: Vec<DetailScreen>,

    home_session: Arc<BackendSession>,
    pending_playback: Option<PendingPlayback>,
}

impl App {
    /// Create a new App instance
    pub fn new(config: Config) -> Self {
        let home_session = Arc::new(config.default_session());
        Self {
            state: AppState::Home,
            running: true,
            notice: None,
            config,
            home: HomeState::default(),
            screens: Vec::new(),
            home_session,
            pending_playback: None,
        }
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
    }

    /// Detail screen currently shown
    pub fn current_screen(&self) -> Option<&DetailScreen> {
        self.screens.last()
    }

    pub fn current_screen_mut(&mut self) -> Option<&mut DetailScreen> {
        self.screens.last_mut()
    }

    /// Request the first page of recent recordings
    pub fn load_home(&mut self) {
        let session = Arc::clone(&self.home_session);
        let query = RecordedQuery::first_page(session.variant(), self.config.page_size);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(session.search(&query).await);
        });
        self.home.loading = LoadingState::Loading(Some("Loading recordings...".into()));
        self.home.pending = Some(rx);
    }

    /// Open a Detail screen from a serialized entry.
    ///
    /// An invalid entry lands on Home with a notice and builds nothing.
    pub fn open_entry(&mut self, entry: &Entry) {
        match entry.parse() {
            Ok(raw) => {
                let session = Arc::new(self.config.session(raw.variant()));
                self.open_detail(session, raw.normalize());
            }
            Err(e) => {
                warn!(error = %e, "invalid detail entry, going home");
                self.screens.clear();
                self.state = AppState::Home;
                self.set_notice(e.to_string());
                if self.home.works.is_empty() && self.home.pending.is_none() {
                    self.load_home();
                }
            }
        }
    }

    /// Push a Detail screen for a work
    pub fn open_detail(&mut self, session: Arc<BackendSession>, work: RecordedWork) {
        let screen = DetailScreen::open(session, work, self.config.page_size);
        self.screens.push(screen);
        self.state = AppState::Detail;
    }

    /// Go back one screen; returning to a Detail screen rebuilds its rows
    pub fn back(&mut self) -> bool {
        if self.screens.pop().is_none() {
            return false;
        }
        match self.screens.last_mut() {
            Some(screen) => screen.refresh(),
            None => self.state = AppState::Home,
        }
        true
    }

    /// Playback chosen since the last call
    pub fn take_playback(&mut self) -> Option<PendingPlayback> {
        self.pending_playback.take()
    }

    /// Apply finished background work. Called by the event loop every tick.
    pub fn poll_background(&mut self) {
        if let Some(rx) = self.home.pending.as_mut() {
            match rx.try_recv() {
                Ok(Ok(page)) => {
                    debug!(count = page.works.len(), total = page.total, "home page loaded");
                    self.home.set_page(page);
                    self.home.pending = None;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "home list failed");
                    self.home.loading = LoadingState::Error(e.to_string());
                    self.home.pending = None;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.home.loading = LoadingState::Idle;
                    self.home.pending = None;
                }
            }
        }

        let mut failures = Vec::new();
        if let Some(screen) = self.screens.last_mut() {
            for update in screen.poll() {
                if let RowUpdate::Failed { message, .. } = update {
                    failures.push(message);
                }
            }
        }
        if let Some(message) = failures.pop() {
            self.set_notice(message);
        }
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle keyboard event, returns true if event was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Clear notice on any keypress
        self.notice = None;

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return true;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return true;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                return self.back();
            }
            _ => {}
        }

        match self.state {
            AppState::Home => self.handle_home_key(key),
            AppState::Detail => self.handle_detail_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.home.list.up();
                true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.home.list.down();
                true
            }
            KeyCode::PageUp => {
                self.home.list.page_up(10);
                true
            }
            KeyCode::PageDown => {
                self.home.list.page_down(10);
                true
            }
            KeyCode::Home => {
                self.home.list.first();
                true
            }
            KeyCode::End => {
                self.home.list.last();
                true
            }
            KeyCode::Enter => {
                if let Some(work) = self.home.selected_work().cloned() {
                    let session = Arc::clone(&self.home_session);
                    self.open_detail(session, work);
                }
                true
            }
            KeyCode::Char('r') => {
                self.load_home();
                true
            }
            _ => false,
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
        let Some(screen) = self.screens.last_mut() else {
            return false;
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                screen.focus_up();
                true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                screen.focus_down();
                true
            }
            KeyCode::Left | KeyCode::Char('h') => {
                screen.move_left();
                true
            }
            KeyCode::Right | KeyCode::Char('l') => {
                screen.move_right();
                true
            }
            KeyCode::Char('r') => {
                screen.refresh();
                true
            }
            KeyCode::Enter => {
                self.select_on_detail();
                true
            }
            _ => false,
        }
    }

    /// Enter on the Detail screen: play, open a related work, or retry a page
    fn select_on_detail(&mut self) {
        let Some(screen) = self.screens.last_mut() else {
            return;
        };
        match screen.focus {
            DetailFocus::Actions => {
                let Some(file) = screen.selected_file().cloned() else {
                    return;
                };
                let session = Arc::clone(screen.session());
                let request = playback::dispatch(&self.config.player, &session, &screen.work, &file);
                info!(id = screen.work.id, file = file.file_id, "playback selected");
                self.pending_playback = Some(PendingPlayback { request, session });
            }
            DetailFocus::Row(slot) => match screen.selected_item(slot).cloned() {
                Some(RowItem::Work(work)) => {
                    let session = Arc::clone(screen.session());
                    self.open_detail(session, work);
                }
                Some(RowItem::More(_)) => {
                    let index = screen.cursor(slot);
                    screen.rows.on_focus(slot, index);
                }
                None => {}
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::legacy::RecordedProgram;
    use crate::models::BackendVariant;
    use crate::related::PageRequest;

    fn offline_config() -> Config {
        Config {
            server_url: "http://127.0.0.1:9".into(),
            ..Config::default()
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn program_json() -> String {
        serde_json::json!({
            "id": 7,
            "channelId": 101,
            "startAt": 0,
            "endAt": 1_800_000,
            "name": "[新]ドラマ第1話",
            "recording": false,
            "protection": false,
            "hasThumbnail": true,
            "original": true,
            "encoded": [{ "encodedId": 2, "name": "H.264" }],
            "ruleId": 5
        })
        .to_string()
    }

    fn item_json() -> String {
        serde_json::json!({
            "id": 9,
            "channelId": 101,
            "startAt": 0,
            "endAt": 1_800_000,
            "name": "ニュース",
            "isRecording": true,
            "isEncoding": false,
            "isProtected": false,
            "thumbnails": [],
            "videoFiles": [{ "id": 30, "name": "TS", "type": "ts" }]
        })
        .to_string()
    }

    // -------------------------------------------------------------------------
    // ListState Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_list_state_navigation() {
        let mut list = ListState::new(5);
        list.down();
        list.down();
        list.down();
        list.down();
        list.down();
        assert_eq!(list.selected, 4);
        list.up();
        assert_eq!(list.selected, 3);
        list.first();
        assert_eq!(list.selected, 0);
        list.page_down(10);
        assert_eq!(list.selected, 4);
    }

    #[test]
    fn test_list_state_set_len() {
        let mut list = ListState::new(10);
        list.selected = 8;
        list.set_len(5);
        assert_eq!(list.selected, 4);
        list.set_len(0);
        assert_eq!(list.selected, 0);
    }

    // -------------------------------------------------------------------------
    // Entry Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_entry_missing() {
        assert!(matches!(Entry::default().parse(), Err(EntryError::Missing)));
    }

    #[test]
    fn test_entry_picks_variant() {
        let legacy = Entry {
            program: Some(program_json()),
            item: None,
        };
        assert_eq!(legacy.parse().unwrap().variant(), BackendVariant::Legacy);

        let v2 = Entry {
            program: None,
            item: Some(item_json()),
        };
        assert_eq!(v2.parse().unwrap().variant(), BackendVariant::V2);

        let both = Entry {
            program: Some(program_json()),
            item: Some(item_json()),
        };
        assert_eq!(both.parse().unwrap().variant(), BackendVariant::Legacy);
    }

    #[test]
    fn test_entry_malformed() {
        let bad = Entry {
            program: Some("{not json".into()),
            item: None,
        };
        assert!(matches!(bad.parse(), Err(EntryError::Malformed(_))));
    }

    #[test]
    fn test_entry_from_record() {
        let program: RecordedProgram = serde_json::from_str(&program_json()).unwrap();
        let raw = RawRecord::Legacy(program);
        let entry = Entry::from_record(&raw).unwrap();
        assert!(entry.item.is_none());
        assert_eq!(entry.parse().unwrap(), raw);
    }

    // -------------------------------------------------------------------------
    // Navigation Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_invalid_entry_goes_home() {
        let mut app = App::new(offline_config());
        app.open_entry(&Entry::default());
        assert_eq!(app.state, AppState::Home);
        assert!(app.screens.is_empty());
        assert_eq!(app.notice.as_deref(), Some("No recording was selected"));
    }

    #[tokio::test]
    async fn test_entry_opens_detail_with_matching_session() {
        let mut app = App::new(offline_config());
        app.open_entry(&Entry {
            program: None,
            item: Some(item_json()),
        });
        assert_eq!(app.state, AppState::Detail);
        let screen = app.current_screen().unwrap();
        assert_eq!(screen.session().variant(), BackendVariant::V2);
        assert_eq!(screen.work.id, 9);
        assert!(screen.rows.row(RowSlot::SameSeries).is_built());
        assert!(screen.rows.row(RowSlot::SameRule).is_built());
        assert!(screen.artwork.is_pending());
    }

    #[tokio::test]
    async fn test_back_returns_home_and_resumes_detail() {
        let mut app = App::new(offline_config());
        let entry = Entry {
            program: Some(program_json()),
            item: None,
        };
        app.open_entry(&entry);
        app.open_entry(&entry);
        assert_eq!(app.screens.len(), 2);
        let generation = app.screens[0].rows.generation(RowSlot::SameRule);

        assert!(app.handle_key(key(KeyCode::Esc)));
        assert_eq!(app.state, AppState::Detail);
        // Resumed screen rebuilt its rows
        assert!(app.screens[0].rows.generation(RowSlot::SameRule) > generation);

        assert!(app.handle_key(key(KeyCode::Esc)));
        assert_eq!(app.state, AppState::Home);
        assert!(!app.back());
    }

    #[tokio::test]
    async fn test_enter_on_action_dispatches_playback() {
        let mut app = App::new(offline_config());
        app.open_entry(&Entry {
            program: Some(program_json()),
            item: None,
        });
        assert_eq!(app.current_screen().unwrap().actions.len, 2);

        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Enter));
        let pending = app.take_playback().expect("playback");
        match pending.request {
            PlaybackRequest::Internal { work_id, file, title } => {
                assert_eq!(work_id, 7);
                assert_eq!(file.file_id, 2);
                assert_eq!(title, "[新]ドラマ第1話");
            }
            other => panic!("Expected internal playback, got {:?}", other),
        }
        assert!(app.take_playback().is_none());
    }

    #[tokio::test]
    async fn test_focusing_placeholder_requests_next_page() {
        let mut app = App::new(offline_config());
        app.open_entry(&Entry {
            program: None,
            item: Some(item_json()),
        });
        let screen = app.current_screen_mut().unwrap();
        let generation = screen.rows.generation(RowSlot::SameRule);
        let criterion = screen.rows.row(RowSlot::SameRule).criterion.clone().unwrap();
        let query = screen.session().query_for(&criterion, 1);

        let mut work = screen.work.clone();
        work.id = 10;
        screen.rows.apply(PageEvent {
            slot: RowSlot::SameRule,
            generation,
            request: PageRequest::Initial { criterion, query },
            result: Ok(Page {
                works: vec![work],
                total: 4,
            }),
        });
        assert_eq!(screen.rows.row(RowSlot::SameRule).len(), 2);

        // Series row is empty, so Down goes straight to the rule row
        assert_eq!(screen.focus_down(), FocusOutcome::Idle);
        assert_eq!(screen.focus, DetailFocus::Row(RowSlot::SameRule));
        assert_eq!(screen.move_right(), FocusOutcome::Loading);
        assert_eq!(screen.move_right(), FocusOutcome::AlreadyLoading);
        assert!(screen.rows.is_loading(RowSlot::SameRule, 1));
    }

    #[tokio::test]
    async fn test_keypress_clears_notice() {
        let mut app = App::new(offline_config());
        app.set_notice("Could not reach the recording server");
        app.handle_key(key(KeyCode::Down));
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::new(offline_config());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);

        let mut app = App::new(offline_config());
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_loading_state() {
        let loading = LoadingState::Loading(Some("Loading...".into()));
        assert!(loading.is_loading());
        assert_eq!(loading.message(), Some("Loading..."));
        let error = LoadingState::Error("Failed".into());
        assert!(error.is_error());
        assert!(!LoadingState::Idle.is_loading());
    }
}
