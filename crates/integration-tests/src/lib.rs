//! Shared fixtures and instrumented store wrappers for the scenario tests.
//!
//! The wrappers decorate any `DocumentStore` so tests can observe traffic
//! (how many queries actually went out), park a fetch mid-flight, or force
//! failures on specific operations.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde_json::{json, Value};
use tokio::sync::Notify;

use dh_core::models::Document;
use dh_core::query::{Query, QueryPage};
use dh_core::traits::DocumentStore;

/// Counts outgoing queries so tests can assert the no-op paths never touch
/// the store.
pub struct CountingStore<S> {
    inner: S,
    queries: AtomicUsize,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, queries: AtomicUsize::new(0) }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for CountingStore<S> {
    async fn query(&self, query: &Query) -> anyhow::Result<QueryPage> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(query).await
    }

    async fn fetch_all(&self, collection: &str) -> anyhow::Result<Vec<Document>> {
        self.inner.fetch_all(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, fields: Value) -> anyhow::Result<Document> {
        self.inner.create(collection, fields).await
    }

    async fn put(&self, collection: &str, id: &str, fields: Value) -> anyhow::Result<()> {
        self.inner.put(collection, id, fields).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> anyhow::Result<()> {
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        self.inner.delete(collection, id).await
    }
}

/// Parks every query on a gate until released, so a test can hold a fetch
/// in flight while it probes the single-flight guard.
pub struct GatedStore<S> {
    inner: S,
    gate: Notify,
    waiting: AtomicUsize,
}

impl<S> GatedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, gate: Notify::new(), waiting: AtomicUsize::new(0) }
    }

    /// How many queries are currently parked on the gate.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Lets exactly one parked (or future) query through.
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for GatedStore<S> {
    async fn query(&self, query: &Query) -> anyhow::Result<QueryPage> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        self.inner.query(query).await
    }

    async fn fetch_all(&self, collection: &str) -> anyhow::Result<Vec<Document>> {
        self.inner.fetch_all(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, fields: Value) -> anyhow::Result<Document> {
        self.inner.create(collection, fields).await
    }

    async fn put(&self, collection: &str, id: &str, fields: Value) -> anyhow::Result<()> {
        self.inner.put(collection, id, fields).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> anyhow::Result<()> {
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        self.inner.delete(collection, id).await
    }
}

/// Fails every status write while letting reads through, for the
/// moderation rollback scenarios.
pub struct FailingUpdates<S> {
    inner: S,
}

impl<S> FailingUpdates<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FailingUpdates<S> {
    async fn query(&self, query: &Query) -> anyhow::Result<QueryPage> {
        self.inner.query(query).await
    }

    async fn fetch_all(&self, collection: &str) -> anyhow::Result<Vec<Document>> {
        self.inner.fetch_all(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, fields: Value) -> anyhow::Result<Document> {
        self.inner.create(collection, fields).await
    }

    async fn put(&self, collection: &str, id: &str, fields: Value) -> anyhow::Result<()> {
        self.inner.put(collection, id, fields).await
    }

    async fn update(&self, _collection: &str, id: &str, _patch: Value) -> anyhow::Result<()> {
        anyhow::bail!("simulated write failure for {id}")
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        self.inner.delete(collection, id).await
    }
}

/// Every operation fails, as if the backend were unreachable.
pub struct BrokenStore;

#[async_trait]
impl DocumentStore for BrokenStore {
    async fn query(&self, _query: &Query) -> anyhow::Result<QueryPage> {
        anyhow::bail!("document store offline")
    }

    async fn fetch_all(&self, _collection: &str) -> anyhow::Result<Vec<Document>> {
        anyhow::bail!("document store offline")
    }

    async fn get(&self, _collection: &str, _id: &str) -> anyhow::Result<Option<Document>> {
        anyhow::bail!("document store offline")
    }

    async fn create(&self, _collection: &str, _fields: Value) -> anyhow::Result<Document> {
        anyhow::bail!("document store offline")
    }

    async fn put(&self, _collection: &str, _id: &str, _fields: Value) -> anyhow::Result<()> {
        anyhow::bail!("document store offline")
    }

    async fn update(&self, _collection: &str, _id: &str, _patch: Value) -> anyhow::Result<()> {
        anyhow::bail!("document store offline")
    }

    async fn delete(&self, _collection: &str, _id: &str) -> anyhow::Result<()> {
        anyhow::bail!("document store offline")
    }
}

/// A denormalized live-collection deal document.
pub fn live_deal(city: &str, category: &str, offer: &str, start_date: &str, status: i64) -> Value {
    json!({
        "city_name": city,
        "category_name": category,
        "description": format!("{offer} special"),
        "offer_code": offer,
        "start_date": start_date,
        "end_date": "2030-12-31",
        "status": status,
        "location": {
            "chain_name": "Slice Bros",
            "branch_name": "Downtown",
            "address": "22 King St W",
            "phone": "416-555-0100"
        }
    })
}

/// Seeds `count` approved deals with start dates one day apart, oldest
/// first; returns the created ids in insertion order.
pub async fn seed_live_deals(
    store: &dyn DocumentStore,
    city: &str,
    category: &str,
    count: usize,
) -> Vec<String> {
    let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let date = (base + Days::new(i as u64)).to_string();
        let doc = store
            .create("deals1", live_deal(city, category, &format!("OFF-{i:03}"), &date, 1))
            .await
            .unwrap();
        ids.push(doc.id);
    }
    ids
}
