//! Related-content rows
//!
//! The detail screen shows two rows of related recordings: works of the
//! same series (keyword search on the extracted series title) and works of
//! the same automation rule. Each row shows one page at a time and ends
//! with a [`Continuation`] placeholder while the server reports more
//! matches. Focusing the placeholder loads the next page, which is spliced
//! into the row in place.
//!
//! Fetches run on spawned tasks; completions come back as [`PageEvent`]s
//! over a channel and are applied by [`RelatedRows::apply`] on the UI
//! thread, in the order they were received.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::api::{ApiError, BackendSession, Page, RecordedQuery};
use crate::models::{BackendVariant, RecordedWork, RowSlot, SearchCriterion};
use crate::title::extract_series_title;

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: u64 = 24;

/// Title of the same-rule row
pub const SAME_RULE_TITLE: &str = "Same rule";

// =============================================================================
// Row Items
// =============================================================================

/// "More results exist" marker, carrying everything needed to fetch them
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Continuation {
    pub criterion: SearchCriterion,
    /// Query with its offset already advanced past the shown results
    pub query: RecordedQuery,
}

impl Continuation {
    pub fn offset(&self) -> u64 {
        self.query.offset()
    }

    pub fn limit(&self) -> u64 {
        self.query.limit()
    }

    pub fn variant(&self) -> BackendVariant {
        self.query.variant()
    }
}

/// Entry of a related-content row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowItem {
    Work(RecordedWork),
    More(Continuation),
}

impl RowItem {
    pub fn as_work(&self) -> Option<&RecordedWork> {
        match self {
            RowItem::Work(w) => Some(w),
            RowItem::More(_) => None,
        }
    }
}

// =============================================================================
// Row Mutation
// =============================================================================

/// Mutation surface of a displayed row
pub trait RowSink {
    fn replace_at(&mut self, index: usize, item: RowItem);
    fn append(&mut self, item: RowItem);
    fn index_of(&self, item: &RowItem) -> Option<usize>;
    fn remove_at(&mut self, index: usize);
}

/// A titled row of related works
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayRow {
    pub title: String,
    /// `None` while the row has not been built
    pub criterion: Option<SearchCriterion>,
    pub items: Vec<RowItem>,
}

impl DisplayRow {
    pub fn is_built(&self) -> bool {
        self.criterion.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RowItem> {
        self.items.get(index)
    }

    pub fn works(&self) -> impl Iterator<Item = &RecordedWork> {
        self.items.iter().filter_map(RowItem::as_work)
    }

    /// Trailing placeholder, if any
    pub fn continuation(&self) -> Option<&Continuation> {
        match self.items.last() {
            Some(RowItem::More(c)) => Some(c),
            _ => None,
        }
    }

    fn reset(&mut self, title: String, criterion: Option<SearchCriterion>) {
        self.title = title;
        self.criterion = criterion;
        self.items.clear();
    }
}

impl RowSink for DisplayRow {
    fn replace_at(&mut self, index: usize, item: RowItem) {
        if let Some(slot) = self.items.get_mut(index) {
            *slot = item;
        }
    }

    fn append(&mut self, item: RowItem) {
        self.items.push(item);
    }

    fn index_of(&self, item: &RowItem) -> Option<usize> {
        self.items.iter().position(|i| i == item)
    }

    fn remove_at(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }
}

// =============================================================================
// Page Application
// =============================================================================

/// Placeholder to append after a page, if the server has more
fn next_continuation(
    criterion: &SearchCriterion,
    query: &RecordedQuery,
    page_count: usize,
    total: u64,
) -> Option<Continuation> {
    let seen = page_count as u64 + query.offset();
    (seen < total).then(|| Continuation {
        criterion: criterion.clone(),
        query: query.with_offset(seen),
    })
}

/// Append a first page to a row, in server order
pub fn apply_first_page<R: RowSink>(
    row: &mut R,
    criterion: &SearchCriterion,
    query: &RecordedQuery,
    page: Page,
) {
    let count = page.works.len();
    let more = next_continuation(criterion, query, count, page.total);
    for work in page.works {
        row.append(RowItem::Work(work));
    }
    if let Some(c) = more {
        row.append(RowItem::More(c));
    }
}

/// Splice a continuation page into the row where the placeholder sits.
///
/// The first work replaces the placeholder in place and the rest are
/// appended. Returns `false` when the placeholder is no longer in the row.
pub fn splice_continuation<R: RowSink>(row: &mut R, placeholder: &Continuation, page: Page) -> bool {
    let marker = RowItem::More(placeholder.clone());
    let Some(index) = row.index_of(&marker) else {
        return false;
    };

    let count = page.works.len();
    let more = next_continuation(&placeholder.criterion, &placeholder.query, count, page.total);

    if count == 0 {
        // Nothing to put in its place; keep it only while the server still has more
        if more.is_none() {
            row.remove_at(index);
        }
        return true;
    }

    for (i, work) in page.works.into_iter().enumerate() {
        if i == 0 {
            row.replace_at(index, RowItem::Work(work));
        } else {
            row.append(RowItem::Work(work));
        }
    }
    if let Some(c) = more {
        row.append(RowItem::More(c));
    }
    true
}

// =============================================================================
// Fetch Plumbing
// =============================================================================

/// What a fetch was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page of a freshly built row
    Initial {
        criterion: SearchCriterion,
        query: RecordedQuery,
    },
    /// Next page behind a placeholder
    Continue(Continuation),
}

impl PageRequest {
    pub fn query(&self) -> &RecordedQuery {
        match self {
            PageRequest::Initial { query, .. } => query,
            PageRequest::Continue(c) => &c.query,
        }
    }
}

/// Completion of a page fetch, delivered to the UI thread
#[derive(Debug)]
pub struct PageEvent {
    pub slot: RowSlot,
    /// Row generation the fetch was issued against
    pub generation: u64,
    pub request: PageRequest,
    pub result: Result<Page, ApiError>,
}

/// Result of applying a `PageEvent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowUpdate {
    /// Works were added to the row
    Applied { slot: RowSlot, added: usize },
    /// The row was rebuilt or the placeholder is gone; nothing changed
    Stale,
    /// The fetch failed; the row is left as it was
    Failed { slot: RowSlot, message: String },
}

/// Result of focusing a row item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusOutcome {
    /// Next page requested
    Loading,
    /// Same placeholder already has a fetch in flight
    AlreadyLoading,
    /// Focused item is a work or out of range
    Idle,
}

// =============================================================================
// Engine
// =============================================================================

/// Owns both related rows of a detail screen and the fetches feeding them
pub struct RelatedRows {
    session: Arc<BackendSession>,
    page_size: u64,
    rows: [DisplayRow; 2],
    generations: [u64; 2],
    /// Pending continuations by (slot, generation, offset)
    in_flight: HashSet<(RowSlot, u64, u64)>,
    tx: UnboundedSender<PageEvent>,
}

impl RelatedRows {
    /// Create the engine and the receiving end of its completion channel
    pub fn new(session: Arc<BackendSession>, page_size: u64) -> (Self, UnboundedReceiver<PageEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            session,
            page_size: page_size.max(1),
            rows: [DisplayRow::default(), DisplayRow::default()],
            generations: [0; 2],
            in_flight: HashSet::new(),
            tx,
        };
        (engine, rx)
    }

    pub fn session(&self) -> &Arc<BackendSession> {
        &self.session
    }

    pub fn row(&self, slot: RowSlot) -> &DisplayRow {
        &self.rows[slot.index()]
    }

    pub fn rows(&self) -> impl Iterator<Item = (RowSlot, &DisplayRow)> {
        RowSlot::ALL.into_iter().map(|s| (s, &self.rows[s.index()]))
    }

    pub fn generation(&self, slot: RowSlot) -> u64 {
        self.generations[slot.index()]
    }

    /// Build both rows for a work: series row only when a title can be extracted
    pub fn load(&mut self, work: &RecordedWork) {
        let keyword = extract_series_title(&work.name);
        if keyword.is_empty() {
            debug!(name = %work.name, "no series title, skipping series row");
            self.clear_row(RowSlot::SameSeries);
        } else {
            let title = keyword.clone();
            self.build_row(SearchCriterion::Keyword(keyword), RowSlot::SameSeries, title);
        }
        self.build_row(
            SearchCriterion::RuleId(work.rule_id),
            RowSlot::SameRule,
            SAME_RULE_TITLE.to_string(),
        );
    }

    /// Reset a row and request its first page
    pub fn build_row(&mut self, criterion: SearchCriterion, slot: RowSlot, title: String) {
        let generation = self.bump(slot);
        self.rows[slot.index()].reset(title, Some(criterion.clone()));

        let query = self.session.query_for(&criterion, self.page_size);
        info!(?slot, %criterion, "building related row");
        self.spawn_fetch(slot, generation, PageRequest::Initial { criterion, query });
    }

    /// Empty a row and drop any completion still on its way
    pub fn clear_row(&mut self, slot: RowSlot) {
        self.bump(slot);
        self.rows[slot.index()].reset(String::new(), None);
    }

    /// React to a row item gaining focus; placeholders load the next page
    pub fn on_focus(&mut self, slot: RowSlot, index: usize) -> FocusOutcome {
        let Some(RowItem::More(placeholder)) = self.rows[slot.index()].get(index).cloned() else {
            return FocusOutcome::Idle;
        };

        let generation = self.generation(slot);
        if !self.in_flight.insert((slot, generation, placeholder.offset())) {
            debug!(?slot, offset = placeholder.offset(), "placeholder already loading");
            return FocusOutcome::AlreadyLoading;
        }

        debug!(?slot, offset = placeholder.offset(), "loading next page");
        self.spawn_fetch(slot, generation, PageRequest::Continue(placeholder));
        FocusOutcome::Loading
    }

    pub fn is_loading(&self, slot: RowSlot, offset: u64) -> bool {
        self.in_flight.contains(&(slot, self.generation(slot), offset))
    }

    /// Apply one completion to its row
    pub fn apply(&mut self, event: PageEvent) -> RowUpdate {
        let PageEvent {
            slot,
            generation,
            request,
            result,
        } = event;

        if let PageRequest::Continue(c) = &request {
            self.in_flight.remove(&(slot, generation, c.offset()));
        }

        if generation != self.generation(slot) {
            debug!(?slot, generation, "dropping completion for a rebuilt row");
            return RowUpdate::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(?slot, offset = request.query().offset(), error = %e, "related page fetch failed");
                return RowUpdate::Failed {
                    slot,
                    message: format!("Could not reach the recording server: {}", e),
                };
            }
        };

        let added = page.works.len();
        let row = &mut self.rows[slot.index()];
        match request {
            PageRequest::Initial { criterion, query } => {
                apply_first_page(row, &criterion, &query, page);
            }
            PageRequest::Continue(placeholder) => {
                if !splice_continuation(row, &placeholder, page) {
                    debug!(?slot, "placeholder no longer in row");
                    return RowUpdate::Stale;
                }
            }
        }
        debug!(?slot, added, len = row.len(), "page applied");
        RowUpdate::Applied { slot, added }
    }

    fn bump(&mut self, slot: RowSlot) -> u64 {
        let g = &mut self.generations[slot.index()];
        *g += 1;
        self.in_flight.retain(|(s, _, _)| *s != slot);
        *g
    }

    fn spawn_fetch(&self, slot: RowSlot, generation: u64, request: PageRequest) {
        let session = Arc::clone(&self.session);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = session.search(request.query()).await;
            let event = PageEvent {
                slot,
                generation,
                request,
                result,
            };
            if tx.send(event).is_err() {
                debug!(?slot, "screen closed before page arrived");
            }
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayableFile;

    fn work(id: u64) -> RecordedWork {
        RecordedWork {
            id,
            name: format!("ドラマ第{}話", id),
            rule_id: Some(1),
            thumbnail_ref: String::new(),
            is_recording: false,
            playable_files: Vec::<PlayableFile>::new(),
            description: String::new(),
            extended: String::new(),
            channel_id: 0,
            start_at: 0,
            end_at: 0,
        }
    }

    fn page(ids: std::ops::Range<u64>, total: u64) -> Page {
        Page {
            works: ids.map(work).collect(),
            total,
        }
    }

    fn keyword() -> SearchCriterion {
        SearchCriterion::Keyword("ドラマ".into())
    }

    fn first_query(limit: u64) -> RecordedQuery {
        RecordedQuery::for_criterion(BackendVariant::V2, &keyword(), limit)
    }

    /// Records every mutation so tests can check how a splice was done
    #[derive(Default)]
    struct RecordingSink {
        items: Vec<RowItem>,
        ops: Vec<String>,
    }

    impl RowSink for RecordingSink {
        fn replace_at(&mut self, index: usize, item: RowItem) {
            self.ops.push(format!("replace {}", index));
            self.items[index] = item;
        }
        fn append(&mut self, item: RowItem) {
            self.ops.push("append".into());
            self.items.push(item);
        }
        fn index_of(&self, item: &RowItem) -> Option<usize> {
            self.items.iter().position(|i| i == item)
        }
        fn remove_at(&mut self, index: usize) {
            self.ops.push(format!("remove {}", index));
            self.items.remove(index);
        }
    }

    fn offline_engine() -> (RelatedRows, UnboundedReceiver<PageEvent>) {
        let session = BackendSession::new(BackendVariant::V2, "http://127.0.0.1:9", None);
        RelatedRows::new(Arc::new(session), 3)
    }

    #[test]
    fn test_first_page_with_more_appends_placeholder() {
        let mut row = DisplayRow::default();
        apply_first_page(&mut row, &keyword(), &first_query(3), page(1..4, 10));

        assert_eq!(row.len(), 4);
        let c = row.continuation().expect("placeholder");
        assert_eq!(c.offset(), 3);
        assert_eq!(c.limit(), 3);
        assert_eq!(c.criterion, keyword());
        assert_eq!(c.variant(), BackendVariant::V2);
    }

    #[test]
    fn test_first_page_exhausting_total_has_no_placeholder() {
        let mut row = DisplayRow::default();
        apply_first_page(&mut row, &keyword(), &first_query(3), page(1..4, 3));
        assert_eq!(row.len(), 3);
        assert!(row.continuation().is_none());

        let mut empty = DisplayRow::default();
        apply_first_page(&mut empty, &keyword(), &first_query(3), page(0..0, 0));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_splice_replaces_in_place() {
        let mut sink = RecordingSink::default();
        apply_first_page(&mut sink, &keyword(), &first_query(3), page(1..4, 10));
        sink.ops.clear();

        let placeholder = match sink.items.last() {
            Some(RowItem::More(c)) => c.clone(),
            _ => panic!("Expected placeholder"),
        };
        assert!(splice_continuation(&mut sink, &placeholder, page(4..7, 10)));

        // k = 3, n = 3: length grows by n - 1 plus the new placeholder
        assert_eq!(sink.ops[0], "replace 3");
        assert!(!sink.ops.iter().any(|op| op.starts_with("remove")));
        let ids: Vec<u64> = sink.items.iter().filter_map(|i| i.as_work()).map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        match sink.items.last() {
            Some(RowItem::More(c)) => assert_eq!(c.offset(), 6),
            _ => panic!("Expected new placeholder"),
        }
    }

    #[test]
    fn test_splice_length_grows_by_n_minus_one() {
        let mut row = DisplayRow::default();
        apply_first_page(&mut row, &keyword(), &first_query(3), page(1..4, 5));
        let before = row.len();
        let placeholder = row.continuation().cloned().unwrap();

        assert!(splice_continuation(&mut row, &placeholder, page(4..6, 5)));
        assert_eq!(row.len(), before + 2 - 1);
        assert!(row.continuation().is_none());
        assert_eq!(row.get(3).and_then(|i| i.as_work()).map(|w| w.id), Some(4));
    }

    #[test]
    fn test_splice_missing_placeholder_is_noop() {
        let mut row = DisplayRow::default();
        let stray = Continuation {
            criterion: keyword(),
            query: first_query(3).with_offset(3),
        };
        assert!(!splice_continuation(&mut row, &stray, page(4..6, 10)));
        assert!(row.is_empty());
    }

    #[test]
    fn test_splice_empty_page() {
        let mut row = DisplayRow::default();
        apply_first_page(&mut row, &keyword(), &first_query(3), page(1..4, 10));
        let placeholder = row.continuation().cloned().unwrap();

        // Server still claims more: placeholder stays for a retry
        assert!(splice_continuation(&mut row, &placeholder, page(0..0, 10)));
        assert_eq!(row.len(), 4);
        assert!(row.continuation().is_some());

        // Server has nothing left: placeholder goes away
        assert!(splice_continuation(&mut row, &placeholder, page(0..0, 3)));
        assert_eq!(row.len(), 3);
        assert!(row.continuation().is_none());
    }

    #[tokio::test]
    async fn test_load_skips_series_row_without_title() {
        let (mut engine, _rx) = offline_engine();
        let mut w = work(1);
        w.name = "#1".into();
        engine.load(&w);

        assert!(!engine.row(RowSlot::SameSeries).is_built());
        assert!(engine.row(RowSlot::SameRule).is_built());
        assert_eq!(
            engine.row(RowSlot::SameRule).criterion,
            Some(SearchCriterion::RuleId(Some(1)))
        );
    }

    #[tokio::test]
    async fn test_load_builds_series_row_titled_by_keyword() {
        let (mut engine, _rx) = offline_engine();
        engine.load(&work(3));
        let row = engine.row(RowSlot::SameSeries);
        assert_eq!(row.title, "ドラマ");
        assert_eq!(row.criterion, Some(keyword()));
        assert_eq!(engine.row(RowSlot::SameRule).title, SAME_RULE_TITLE);
    }

    #[tokio::test]
    async fn test_apply_initial_and_failure() {
        let (mut engine, _rx) = offline_engine();
        engine.build_row(keyword(), RowSlot::SameSeries, "ドラマ".into());
        let generation = engine.generation(RowSlot::SameSeries);

        let update = engine.apply(PageEvent {
            slot: RowSlot::SameSeries,
            generation,
            request: PageRequest::Initial {
                criterion: keyword(),
                query: first_query(3),
            },
            result: Ok(page(1..4, 7)),
        });
        assert_eq!(update, RowUpdate::Applied { slot: RowSlot::SameSeries, added: 3 });
        assert_eq!(engine.row(RowSlot::SameSeries).len(), 4);

        let placeholder = engine.row(RowSlot::SameSeries).continuation().cloned().unwrap();
        let update = engine.apply(PageEvent {
            slot: RowSlot::SameSeries,
            generation,
            request: PageRequest::Continue(placeholder),
            result: Err(ApiError::ServerError(500)),
        });
        assert!(matches!(update, RowUpdate::Failed { .. }));
        // Placeholder stays so the user can retry
        assert_eq!(engine.row(RowSlot::SameSeries).len(), 4);
        assert!(engine.row(RowSlot::SameSeries).continuation().is_some());
    }

    #[tokio::test]
    async fn test_stale_completion_is_dropped() {
        let (mut engine, _rx) = offline_engine();
        engine.build_row(keyword(), RowSlot::SameSeries, "ドラマ".into());
        let old = engine.generation(RowSlot::SameSeries);
        engine.build_row(keyword(), RowSlot::SameSeries, "ドラマ".into());

        let update = engine.apply(PageEvent {
            slot: RowSlot::SameSeries,
            generation: old,
            request: PageRequest::Initial {
                criterion: keyword(),
                query: first_query(3),
            },
            result: Ok(page(1..4, 3)),
        });
        assert_eq!(update, RowUpdate::Stale);
        assert!(engine.row(RowSlot::SameSeries).is_empty());
    }

    #[tokio::test]
    async fn test_focus_dedupes_in_flight_placeholder() {
        let (mut engine, _rx) = offline_engine();
        engine.build_row(keyword(), RowSlot::SameSeries, "ドラマ".into());
        let generation = engine.generation(RowSlot::SameSeries);
        engine.apply(PageEvent {
            slot: RowSlot::SameSeries,
            generation,
            request: PageRequest::Initial {
                criterion: keyword(),
                query: first_query(3),
            },
            result: Ok(page(1..4, 9)),
        });

        assert_eq!(engine.on_focus(RowSlot::SameSeries, 0), FocusOutcome::Idle);
        assert_eq!(engine.on_focus(RowSlot::SameSeries, 3), FocusOutcome::Loading);
        assert!(engine.is_loading(RowSlot::SameSeries, 3));
        assert_eq!(engine.on_focus(RowSlot::SameSeries, 3), FocusOutcome::AlreadyLoading);

        // A failed completion releases the guard for a manual retry
        let placeholder = engine.row(RowSlot::SameSeries).continuation().cloned().unwrap();
        engine.apply(PageEvent {
            slot: RowSlot::SameSeries,
            generation,
            request: PageRequest::Continue(placeholder),
            result: Err(ApiError::NotFound),
        });
        assert!(!engine.is_loading(RowSlot::SameSeries, 3));
        assert_eq!(engine.on_focus(RowSlot::SameSeries, 3), FocusOutcome::Loading);
    }

    #[tokio::test]
    async fn test_stale_completion_keeps_rebuilt_row_guard() {
        let (mut engine, _rx) = offline_engine();
        let first_page = |engine: &mut RelatedRows| {
            let generation = engine.generation(RowSlot::SameSeries);
            engine.apply(PageEvent {
                slot: RowSlot::SameSeries,
                generation,
                request: PageRequest::Initial {
                    criterion: keyword(),
                    query: first_query(3),
                },
                result: Ok(page(1..4, 9)),
            });
            generation
        };

        engine.build_row(keyword(), RowSlot::SameSeries, "ドラマ".into());
        let old = first_page(&mut engine);
        let old_placeholder = engine.row(RowSlot::SameSeries).continuation().cloned().unwrap();
        assert_eq!(engine.on_focus(RowSlot::SameSeries, 3), FocusOutcome::Loading);

        engine.build_row(keyword(), RowSlot::SameSeries, "ドラマ".into());
        first_page(&mut engine);
        assert_eq!(engine.on_focus(RowSlot::SameSeries, 3), FocusOutcome::Loading);

        let update = engine.apply(PageEvent {
            slot: RowSlot::SameSeries,
            generation: old,
            request: PageRequest::Continue(old_placeholder),
            result: Ok(page(4..7, 9)),
        });
        assert_eq!(update, RowUpdate::Stale);

        // The rebuilt row's fetch is still pending
        assert!(engine.is_loading(RowSlot::SameSeries, 3));
        assert_eq!(engine.on_focus(RowSlot::SameSeries, 3), FocusOutcome::AlreadyLoading);
        assert_eq!(engine.row(RowSlot::SameSeries).len(), 4);
    }
}
