//! # Deal Search
//!
//! UI-facing search façade: validates the filter inputs, builds the feed
//! spec for the configured catalog shape, and drives the pagination engine.
//! Three shapes exist because two generations of deal documents (plus an
//! experimental per-city subcollection layout) are still live in the store.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::enrich::{self, DealView};
use crate::feed::{FeedSpec, PageOutcome, PagedFeed};
use crate::models::{collections, DealStatus};
use crate::query::{Filter, Sort, SortDirection, MAX_MEMBERSHIP_VALUES};
use crate::reference::ReferenceData;
use crate::traits::DocumentStore;

/// Page size for the public deal listings.
pub const DEALS_PAGE_SIZE: usize = 20;
/// The per-city subcollection layout always paged by ten.
pub const SUBCOLLECTION_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Resolve city and category against reference data, derive the city's
    /// location ids, and filter the normalized collection — including the
    /// date validity window.
    NormalizedJoin,
    /// Filter the denormalized collection by display names; only approved
    /// deals are visible.
    Denormalized,
    /// Read a `cities/{city}/categories/{category}/deals` subcollection.
    Subcollection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub category: String,
    /// Validity-window date (`YYYY-MM-DD`), defaulting to today. Only the
    /// normalized shape filters on it.
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results { deals: Vec<DealView>, exhausted: bool },
    /// City or category not selected: silently do nothing, exactly like the
    /// search form.
    NotReady,
    /// A fetch is already running for this session.
    Busy,
}

/// One user session's search state: the armed filters and their cursor.
pub struct DealSearch {
    reference: Arc<ReferenceData>,
    mode: SearchMode,
    feed: PagedFeed,
}

impl DealSearch {
    pub fn new(store: Arc<dyn DocumentStore>, reference: Arc<ReferenceData>, mode: SearchMode) -> Self {
        Self { reference, mode, feed: PagedFeed::new(store) }
    }

    /// Replaces the active filters and fetches the first page.
    pub async fn search(&self, filters: &SearchFilters) -> SearchOutcome {
        if filters.city.trim().is_empty() || filters.category.trim().is_empty() {
            return SearchOutcome::NotReady;
        }
        match self.build_spec(filters) {
            Some(spec) => {
                self.feed.reset(spec).await;
                self.next_page().await
            }
            // Unknown city or category, or a city with no locations: an
            // empty result, not an error.
            None => {
                self.feed.clear().await;
                SearchOutcome::Results { deals: Vec::new(), exhausted: true }
            }
        }
    }

    /// Fetches the next page under the filters of the last `search`.
    pub async fn load_more(&self) -> SearchOutcome {
        self.next_page().await
    }

    /// Everything fetched since the last `search`, enriched for display.
    pub async fn current(&self) -> Vec<DealView> {
        enrich::enrich_all(&self.feed.snapshot().await, &self.reference)
    }

    async fn next_page(&self) -> SearchOutcome {
        match self.feed.fetch_page().await {
            PageOutcome::Page { items, exhausted } => SearchOutcome::Results {
                deals: enrich::enrich_all(&items, &self.reference),
                exhausted,
            },
            PageOutcome::NotReady => SearchOutcome::NotReady,
            PageOutcome::Busy => SearchOutcome::Busy,
        }
    }

    fn build_spec(&self, filters: &SearchFilters) -> Option<FeedSpec> {
        let city = filters.city.trim();
        let category = filters.category.trim();
        match self.mode {
            SearchMode::NormalizedJoin => {
                let city = self.reference.city_by_name(city)?;
                let category = self.reference.category_by_name(category)?;
                let mut location_ids: Vec<Value> = self
                    .reference
                    .locations_in_city(&city.id)
                    .iter()
                    .map(|location| Value::String(location.id.clone()))
                    .collect();
                if location_ids.is_empty() {
                    return None;
                }
                // The store's membership filter takes at most ten values, so
                // a city with more locations only ever surfaces deals from
                // the first ten.
                location_ids.truncate(MAX_MEMBERSHIP_VALUES);
                let date = filters.date.clone().unwrap_or_else(today);
                Some(FeedSpec {
                    collection: collections::DEALS.to_string(),
                    filters: vec![
                        Filter::eq("category_id", category.id.clone()),
                        Filter::any_of("location_id", location_ids),
                        Filter::le("start_date", date.clone()),
                        Filter::ge("end_date", date),
                    ],
                    sort: Sort { field: "start_date".into(), direction: SortDirection::Descending },
                    page_size: DEALS_PAGE_SIZE,
                })
            }
            SearchMode::Denormalized => Some(FeedSpec {
                collection: collections::DEALS_LIVE.to_string(),
                filters: vec![
                    Filter::eq("city_name", city),
                    Filter::eq("category_name", category),
                    Filter::eq("status", DealStatus::Approved.code()),
                ],
                sort: Sort { field: "start_date".into(), direction: SortDirection::Descending },
                page_size: DEALS_PAGE_SIZE,
            }),
            SearchMode::Subcollection => Some(FeedSpec {
                collection: format!("cities/{city}/categories/{category}/deals"),
                filters: Vec::new(),
                sort: Sort { field: "start_date".into(), direction: SortDirection::Ascending },
                page_size: SUBCOLLECTION_PAGE_SIZE,
            }),
        }
    }
}

fn today() -> String {
    Utc::now().date_naive().to_string()
}
