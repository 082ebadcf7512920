//! Per-client search sessions.
//!
//! Every browser session gets its own pagination cursor. The registry hands
//! out (and lazily creates) the `DealSearch` bound to an `x-session-id`
//! header; clients that send none share the `public` feed and lose load-more
//! continuity to each other.

use std::sync::Arc;

use actix_web::HttpRequest;
use dashmap::DashMap;

use dh_core::reference::ReferenceData;
use dh_core::search::{DealSearch, SearchMode};
use dh_core::traits::DocumentStore;

pub const SESSION_HEADER: &str = "x-session-id";

pub struct SessionRegistry {
    store: Arc<dyn DocumentStore>,
    reference: Arc<ReferenceData>,
    mode: SearchMode,
    sessions: DashMap<String, Arc<DealSearch>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, reference: Arc<ReferenceData>, mode: SearchMode) -> Self {
        Self { store, reference, mode, sessions: DashMap::new() }
    }

    pub fn search_for(&self, session_id: &str) -> Arc<DealSearch> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                Arc::new(DealSearch::new(self.store.clone(), self.reference.clone(), self.mode))
            })
            .clone()
    }
}

pub fn session_id(req: &HttpRequest) -> String {
    req.headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("public")
        .to_string()
}
