//! # Moderation Queue
//!
//! Admin review of pending submissions. `refresh` pulls everything pending;
//! approve and reject write the status and drop the item from the local
//! queue only once the store confirms the write, so a failed update leaves
//! the deal visible for another attempt.
//!
//! The status machine is terminal: pending goes to approved or rejected
//! exactly once. An id that is no longer in the queue cannot be transitioned
//! again without a refresh — and a refresh only ever restores pending deals.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{collections, DealStatus, Document, Identity};
use crate::query::{Filter, Query, SortDirection};
use crate::traits::DocumentStore;

pub struct ModerationQueue {
    store: Arc<dyn DocumentStore>,
    pending: Mutex<Vec<Document>>,
}

impl ModerationQueue {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, pending: Mutex::new(Vec::new()) }
    }

    /// Reloads the pending list: newest submissions first.
    pub async fn refresh(&self, who: &Identity) -> Result<Vec<Document>> {
        require_admin(who)?;
        let query = Query::collection(collections::DEALS_LIVE)
            .filter(Filter::eq("status", DealStatus::Pending.code()))
            .order_by("created_at", SortDirection::Descending);
        let page = self.store.query(&query).await?;
        let mut pending = self.pending.lock().await;
        *pending = page.docs.clone();
        Ok(page.docs)
    }

    /// The queue as of the last refresh, minus anything since transitioned.
    pub async fn pending(&self) -> Vec<Document> {
        self.pending.lock().await.clone()
    }

    pub async fn approve(&self, who: &Identity, id: &str) -> Result<()> {
        self.transition(who, id, DealStatus::Approved).await
    }

    pub async fn reject(&self, who: &Identity, id: &str) -> Result<()> {
        self.transition(who, id, DealStatus::Rejected).await
    }

    async fn transition(&self, who: &Identity, id: &str, status: DealStatus) -> Result<()> {
        require_admin(who)?;
        // Holding the queue lock across the store write serializes admin
        // actions on this queue.
        let mut pending = self.pending.lock().await;
        let position = pending
            .iter()
            .position(|doc| doc.id == id)
            .ok_or_else(|| AppError::NotFound("pending deal".into(), id.into()))?;
        self.store
            .update(collections::DEALS_LIVE, id, json!({ "status": status.code() }))
            .await?;
        pending.remove(position);
        Ok(())
    }
}

fn require_admin(who: &Identity) -> Result<()> {
    if who.admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("moderation requires an admin session".into()))
    }
}
