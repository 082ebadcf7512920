//! # Core Ports
//!
//! Contracts the plugin crates implement. The document store and the auth
//! service are external collaborators; everything the rest of the system
//! knows about them lives in these two traits.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{AuthSession, Document, Identity};
use crate::query::{Query, QueryPage};

/// Collection-scoped document persistence and querying.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Filtered, sorted, limited read with optional cursor resume.
    async fn query(&self, query: &Query) -> anyhow::Result<QueryPage>;

    /// Unfiltered full-collection read, in insertion order.
    async fn fetch_all(&self, collection: &str) -> anyhow::Result<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>>;

    /// Create with a store-assigned identifier.
    async fn create(&self, collection: &str, fields: Value) -> anyhow::Result<Document>;

    /// Create or replace under a caller-chosen identifier.
    async fn put(&self, collection: &str, id: &str, fields: Value) -> anyhow::Result<()>;

    /// Partial-field merge into an existing document; fails if the document
    /// does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> anyhow::Result<()>;

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()>;
}

/// Credential verification and session identity, backed by the auth service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity>;

    /// Exchanges credentials for a bearer token.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn sign_out(&self, token: &str) -> Result<()>;

    /// Resolves a bearer token to the identity that opened it, if any.
    async fn identity(&self, token: &str) -> Result<Option<Identity>>;
}
