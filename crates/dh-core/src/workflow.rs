//! # Uploader Submissions
//!
//! Create, edit, and delete for deals, plus the uploader profile that
//! pre-fills them. Every new deal starts pending; public visibility is gated
//! by moderation. `created_at` and `uploader_email` are stamped here, on the
//! client side of the store boundary — the store itself validates nothing.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::models::{collections, DealDraft, DealStatus, Document, Identity, LocationInfo, UploaderProfile};
use crate::query::{Filter, Query};
use crate::traits::DocumentStore;

pub struct Submissions {
    store: Arc<dyn DocumentStore>,
}

impl Submissions {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates a deal in `pending` status on behalf of `who`. An empty
    /// location block falls back to the uploader's profile defaults.
    pub async fn submit(&self, who: &Identity, draft: DealDraft) -> Result<Document> {
        // 1. Minimal validation: the public listings are keyed on these two.
        if draft.city_name.trim().is_empty() || draft.category_name.trim().is_empty() {
            return Err(AppError::Validation("city and category are required".into()));
        }

        // 2. Fill the location block from the profile where the form left it
        //    empty.
        let mut draft = draft;
        if draft.location.as_ref().map_or(true, LocationInfo::is_empty) {
            if let Some(profile) = self.profile(who).await? {
                draft.location = Some(profile.location());
            }
        }

        // 3. Stamp ownership and moderation state, then persist.
        let mut fields = json!({
            "category_name": draft.category_name,
            "city_name": draft.city_name,
            "description": draft.description,
            "offer_code": draft.offer_code,
            "instagram_url": draft.instagram_url,
            "start_date": draft.start_date,
            "end_date": draft.end_date,
            "status": DealStatus::Pending.code(),
            "uploader_email": who.email,
            "created_at": Utc::now().to_rfc3339(),
        });
        if let Some(location) = &draft.location {
            fields["location"] = to_value(location)?;
        }
        let doc = self.store.create(collections::DEALS_LIVE, fields).await?;
        Ok(doc)
    }

    /// Applies the editable fields onto an existing deal. Moderation state is
    /// left untouched, so an edit does not re-surface an approved deal for
    /// review.
    pub async fn edit(&self, who: &Identity, id: &str, draft: DealDraft) -> Result<()> {
        self.authorize(who, id).await?;
        let mut patch = json!({
            "category_name": draft.category_name,
            "city_name": draft.city_name,
            "description": draft.description,
            "offer_code": draft.offer_code,
            "instagram_url": draft.instagram_url,
            "start_date": draft.start_date,
            "end_date": draft.end_date,
        });
        if let Some(location) = &draft.location {
            patch["location"] = to_value(location)?;
        }
        self.store.update(collections::DEALS_LIVE, id, patch).await?;
        Ok(())
    }

    pub async fn delete(&self, who: &Identity, id: &str) -> Result<()> {
        self.authorize(who, id).await?;
        self.store.delete(collections::DEALS_LIVE, id).await?;
        Ok(())
    }

    /// All deals this uploader has submitted, any status, in creation order.
    pub async fn my_deals(&self, who: &Identity) -> Result<Vec<Document>> {
        let query = Query::collection(collections::DEALS_LIVE)
            .filter(Filter::eq("uploader_email", who.email.as_str()));
        Ok(self.store.query(&query).await?.docs)
    }

    pub async fn profile(&self, who: &Identity) -> Result<Option<UploaderProfile>> {
        let doc = self.store.get(collections::UPLOADERS, &who.email).await?;
        Ok(doc.and_then(|doc| serde_json::from_value(doc.fields).ok()))
    }

    /// Saves the uploader's defaults. All five contact fields are required
    /// before a profile counts as complete.
    pub async fn save_profile(&self, who: &Identity, profile: UploaderProfile) -> Result<UploaderProfile> {
        let profile = UploaderProfile { email: who.email.clone(), ..profile };
        if !profile.is_complete() {
            return Err(AppError::Validation("all profile fields are required".into()));
        }
        let mut fields = to_value(&profile)?;
        fields["updated_at"] = Value::String(Utc::now().to_rfc3339());
        self.store.put(collections::UPLOADERS, &who.email, fields).await?;
        Ok(profile)
    }

    /// The store enforces no ownership itself, so this check is the whole
    /// gate: only the deal's uploader or an admin may modify it.
    async fn authorize(&self, who: &Identity, id: &str) -> Result<Document> {
        let doc = self
            .store
            .get(collections::DEALS_LIVE, id)
            .await?
            .ok_or_else(|| AppError::NotFound("deal".into(), id.into()))?;
        if who.admin || doc.str_field("uploader_email") == Some(who.email.as_str()) {
            return Ok(doc);
        }
        Err(AppError::Forbidden("only the uploader or an admin may modify a deal".into()))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|err| AppError::Store(err.into()))
}
