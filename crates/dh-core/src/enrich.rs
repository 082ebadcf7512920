//! # Result Enrichment
//!
//! Turns raw deal documents into display-ready records. Denormalized fields
//! on the document win; otherwise the reference tables are consulted by id.
//! A reference that cannot be resolved becomes an absent block, never an
//! error — the UI simply leaves it out.

use serde::Serialize;

use crate::models::{Document, LocationInfo};
use crate::reference::ReferenceData;

/// A deal ready to render: names resolved, location block assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DealView {
    pub id: String,
    pub description: String,
    pub offer_code: String,
    pub category: String,
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

pub fn enrich(doc: &Document, reference: &ReferenceData) -> DealView {
    let location = doc
        .field("location")
        .and_then(LocationInfo::from_value)
        .filter(|info| !info.is_empty())
        .or_else(|| {
            doc.key_field("location_id")
                .and_then(|id| reference.location_by_id(&id))
                .map(LocationInfo::from)
        });

    let category = doc
        .str_field("category_name")
        .map(str::to_string)
        .or_else(|| {
            doc.key_field("category_id")
                .and_then(|id| reference.category_by_id(&id))
                .map(|category| category.name.clone())
        })
        .unwrap_or_default();

    let city = doc
        .str_field("city_name")
        .map(str::to_string)
        .or_else(|| {
            doc.key_field("city_id")
                .and_then(|id| reference.city_by_id(&id))
                .map(|city| city.name.clone())
        })
        .unwrap_or_default();

    DealView {
        id: doc.id.clone(),
        description: doc.str_field("description").unwrap_or_default().to_string(),
        offer_code: doc.str_field("offer_code").unwrap_or_default().to_string(),
        category,
        city,
        start_date: doc.str_field("start_date").unwrap_or_default().to_string(),
        end_date: doc.str_field("end_date").unwrap_or_default().to_string(),
        instagram_url: doc
            .str_field("instagram_url")
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        location,
        status: doc.field("status").and_then(serde_json::Value::as_i64),
        uploader_email: doc.str_field("uploader_email").map(str::to_string),
        created_at: doc.str_field("created_at").map(str::to_string),
    }
}

pub fn enrich_all(docs: &[Document], reference: &ReferenceData) -> Vec<DealView> {
    docs.iter().map(|doc| enrich(doc, reference)).collect()
}
