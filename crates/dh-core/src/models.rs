//! # Domain Models
//!
//! Core entities of Dealhub. Cities, categories, and locations are read-only
//! reference data; deals flow through the submission and moderation workflow.
//!
//! Deals themselves stay schemaless ([`Document`]): two generations of deal
//! documents coexist in the store — one keyed by reference-table ids, one
//! fully denormalized with an embedded location block — and no migration ever
//! reconciled them. The enrichment layer absorbs the difference.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection names in the document store.
pub mod collections {
    pub const CITIES: &str = "cities";
    pub const CATEGORIES: &str = "categories";
    pub const LOCATIONS: &str = "locations";
    /// Normalized deals, keyed by reference-table ids.
    pub const DEALS: &str = "deals";
    /// Denormalized deals with embedded location and display names. The odd
    /// name is what the production store actually contains.
    pub const DEALS_LIVE: &str = "deals1";
    /// Uploader profiles, keyed by email.
    pub const UPLOADERS: &str = "uploaders";
}

/// A schemaless record as the document store hands it back: the
/// store-assigned identifier plus the raw JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        Self { id: id.into(), fields }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Canonical join key of a field (see [`id_key`]).
    pub fn key_field(&self, name: &str) -> Option<String> {
        self.field(name).and_then(id_key)
    }
}

/// Reference documents carry their identifier either as a number or a string
/// depending on which generation of the dashboard wrote them; join keys are
/// always compared in canonical string form.
pub fn id_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// RFC 7396-style merge of `patch` into `target`: objects merge recursively,
/// `null` removes a key, everything else replaces. Both store adapters use
/// this for partial-field updates.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(entries) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in entries {
            if value.is_null() {
                existing.remove(key);
            } else {
                merge_patch(existing.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

/// Moderation status codes as persisted on deal documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealStatus {
    Pending,
    Approved,
    Rejected,
}

impl DealStatus {
    pub fn code(self) -> i64 {
        match self {
            DealStatus::Pending => 0,
            DealStatus::Approved => 1,
            DealStatus::Rejected => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DealStatus::Pending),
            1 => Some(DealStatus::Approved),
            -1 => Some(DealStatus::Rejected),
            _ => None,
        }
    }
}

/// Immutable reference data: a city users filter by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub province: String,
    pub country: String,
}

impl City {
    pub fn from_doc(doc: &Document) -> Option<Self> {
        Some(Self {
            id: doc.key_field("id").unwrap_or_else(|| doc.id.clone()),
            name: doc.str_field("name")?.to_string(),
            province: doc.str_field("province").unwrap_or_default().to_string(),
            country: doc.str_field("country").unwrap_or_default().to_string(),
        })
    }
}

/// Immutable reference data: a deal category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn from_doc(doc: &Document) -> Option<Self> {
        Some(Self {
            id: doc.key_field("id").unwrap_or_else(|| doc.id.clone()),
            name: doc.str_field("name")?.to_string(),
        })
    }
}

/// A physical store branch inside a city; normalized deals reference it by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: String,
    pub city_id: String,
    pub chain_name: String,
    pub branch_name: String,
    pub address: String,
    pub phone: String,
}

impl Location {
    pub fn from_doc(doc: &Document) -> Option<Self> {
        Some(Self {
            id: doc.key_field("id").unwrap_or_else(|| doc.id.clone()),
            city_id: doc.key_field("city_id").unwrap_or_default(),
            chain_name: doc.str_field("chain_name").unwrap_or_default().to_string(),
            branch_name: doc.str_field("branch_name").unwrap_or_default().to_string(),
            address: doc.str_field("address").unwrap_or_default().to_string(),
            phone: doc.str_field("phone").unwrap_or_default().to_string(),
        })
    }
}

/// Contact block embedded on denormalized deals and copied from uploader
/// profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    #[serde(default)]
    pub chain_name: String,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

impl LocationInfo {
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.chain_name.is_empty()
            && self.branch_name.is_empty()
            && self.address.is_empty()
            && self.phone.is_empty()
    }
}

impl From<&Location> for LocationInfo {
    fn from(location: &Location) -> Self {
        Self {
            chain_name: location.chain_name.clone(),
            branch_name: location.branch_name.clone(),
            address: location.address.clone(),
            phone: location.phone.clone(),
        }
    }
}

/// Defaults an uploader saves once and has copied onto every new deal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploaderProfile {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub chain_name: String,
    #[serde(default)]
    pub phone: String,
}

impl UploaderProfile {
    /// The dashboard insists on every contact field before a profile counts.
    pub fn is_complete(&self) -> bool {
        !self.city_name.is_empty()
            && !self.address.is_empty()
            && !self.branch_name.is_empty()
            && !self.chain_name.is_empty()
            && !self.phone.is_empty()
    }

    pub fn location(&self) -> LocationInfo {
        LocationInfo {
            chain_name: self.chain_name.clone(),
            branch_name: self.branch_name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Fields an uploader submits for a new or edited deal. Dates are ISO
/// `YYYY-MM-DD` strings; `start_date <= end_date` is assumed, not enforced —
/// the dashboards have never validated it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealDraft {
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub offer_code: String,
    #[serde(default)]
    pub instagram_url: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub location: Option<LocationInfo>,
}

/// Who is acting: an authenticated uploader, possibly with admin rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub admin: bool,
}

/// An open session with the auth service: the bearer token plus who it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub identity: Identity,
}
