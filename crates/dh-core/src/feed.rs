//! # Filtered Pagination Engine
//!
//! One parameterized feed serves every listing screen: arm it with a
//! filter/sort spec, then pull pages until exhausted.
//! Previously fetched pages stay accumulated so a session can re-render its
//! full result list at any time.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::Document;
use crate::query::{Cursor, Filter, Query, Sort};
use crate::traits::DocumentStore;

/// Everything that defines one filtered, sorted result sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSpec {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub sort: Sort,
    pub page_size: usize,
}

/// What one [`PagedFeed::fetch_page`] call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Items appended by this call (possibly none) plus the exhausted flag.
    Page { items: Vec<Document>, exhausted: bool },
    /// No spec armed — a required filter is missing. Nothing was queried.
    NotReady,
    /// A previous fetch is still unresolved; this call was dropped without
    /// touching the store.
    Busy,
}

#[derive(Default)]
struct FeedState {
    spec: Option<FeedSpec>,
    cursor: Option<Cursor>,
    exhausted: bool,
    items: Vec<Document>,
}

/// Cursor-resuming feed over a [`DocumentStore`] query.
pub struct PagedFeed {
    store: Arc<dyn DocumentStore>,
    /// Held across the store round-trip, which doubles as the single-flight
    /// guard: a fetch that arrives while another is unresolved is dropped,
    /// so a late page can never append twice.
    state: Mutex<FeedState>,
}

impl PagedFeed {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, state: Mutex::new(FeedState::default()) }
    }

    /// Arms a new spec. Cursor, exhausted flag, and accumulated items are
    /// discarded — a cursor is only meaningful for the filters that made it.
    /// Waits for any in-flight fetch to resolve first (there is no
    /// cancellation), which keeps a stale page from landing after the reset.
    pub async fn reset(&self, spec: FeedSpec) {
        let mut state = self.state.lock().await;
        *state = FeedState { spec: Some(spec), ..FeedState::default() };
    }

    /// Disarms the feed entirely; subsequent fetches are no-ops.
    pub async fn clear(&self) {
        *self.state.lock().await = FeedState::default();
    }

    /// Fetches the next page under the armed spec.
    pub async fn fetch_page(&self) -> PageOutcome {
        let Ok(mut state) = self.state.try_lock() else {
            return PageOutcome::Busy;
        };
        let Some(spec) = state.spec.clone() else {
            return PageOutcome::NotReady;
        };
        if state.exhausted {
            // The previous page already came up short; nothing left to ask.
            return PageOutcome::Page { items: Vec::new(), exhausted: true };
        }

        let query = Query {
            collection: spec.collection.clone(),
            filters: spec.filters.clone(),
            sort: Some(spec.sort.clone()),
            limit: Some(spec.page_size),
            start_after: state.cursor.clone(),
        };

        match self.store.query(&query).await {
            Ok(page) => {
                if let Some(cursor) = page.next_cursor {
                    state.cursor = Some(cursor);
                }
                state.exhausted = page.docs.len() < spec.page_size;
                state.items.extend(page.docs.iter().cloned());
                PageOutcome::Page { items: page.docs, exhausted: state.exhausted }
            }
            Err(err) => {
                // Read failures surface as an empty page, not an error; the
                // caller just keeps showing what it already had.
                log::error!("deal page fetch failed: {err:#}");
                PageOutcome::Page { items: Vec::new(), exhausted: state.exhausted }
            }
        }
    }

    /// Every item fetched since the last reset, in order.
    pub async fn snapshot(&self) -> Vec<Document> {
        self.state.lock().await.items.clone()
    }

    pub async fn is_exhausted(&self) -> bool {
        self.state.lock().await.exhausted
    }
}
