//! # dh-store-memory
//!
//! DashMap-backed `DocumentStore`: a zero-setup backend for tests and local
//! development. Query semantics must stay in lockstep with the SQLite
//! adapter — same canonical equality, same `(sort value, id)` ordering, same
//! strict resume-after cursors.

use std::cmp::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use dh_core::models::{merge_patch, Document};
use dh_core::query::{compare_values, Cursor, FilterOp, Query, QueryPage, SortDirection, MAX_MEMBERSHIP_VALUES};
use dh_core::traits::DocumentStore;

#[derive(Default)]
pub struct MemoryDocumentStore {
    // Vectors keep insertion order, which is the unsorted read order.
    collections: DashMap<String, Vec<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, query: &Query) -> anyhow::Result<QueryPage> {
        for filter in &query.filters {
            if filter.op == FilterOp::In {
                let width = filter.value.as_array().map_or(0, Vec::len);
                anyhow::ensure!(
                    width <= MAX_MEMBERSHIP_VALUES,
                    "membership filter on {} exceeds the {MAX_MEMBERSHIP_VALUES}-value limit",
                    filter.field
                );
            }
        }

        let mut docs: Vec<Document> = self
            .collections
            .get(&query.collection)
            .map(|collection| collection.iter().filter(|doc| query.matches(doc)).cloned().collect())
            .unwrap_or_default();

        let null = Value::Null;
        match &query.sort {
            Some(sort) => docs.sort_by(|a, b| {
                let va = a.field(&sort.field).unwrap_or(&null);
                let vb = b.field(&sort.field).unwrap_or(&null);
                let ordering = match sort.direction {
                    SortDirection::Ascending => compare_values(va, vb),
                    SortDirection::Descending => compare_values(vb, va),
                };
                // Document id breaks ties so cursors can resume mid-tie.
                ordering.then_with(|| a.id.cmp(&b.id))
            }),
            None => docs.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        if let Some(cursor) = &query.start_after {
            let strictly_after = |doc: &Document| -> bool {
                match &query.sort {
                    Some(sort) => {
                        let value = doc.field(&sort.field).unwrap_or(&null);
                        match compare_values(value, &cursor.sort_value) {
                            Ordering::Equal => doc.id > cursor.doc_id,
                            ordering => match sort.direction {
                                SortDirection::Descending => ordering == Ordering::Less,
                                SortDirection::Ascending => ordering == Ordering::Greater,
                            },
                        }
                    }
                    None => doc.id > cursor.doc_id,
                }
            };
            docs.retain(|doc| strictly_after(doc));
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }

        let next_cursor = docs.last().map(|doc| Cursor {
            sort_value: query
                .sort
                .as_ref()
                .and_then(|sort| doc.field(&sort.field).cloned())
                .unwrap_or(Value::Null),
            doc_id: doc.id.clone(),
        });
        Ok(QueryPage { docs, next_cursor })
    }

    async fn fetch_all(&self, collection: &str) -> anyhow::Result<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|collection| collection.value().clone())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|collection| collection.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn create(&self, collection: &str, fields: Value) -> anyhow::Result<Document> {
        let doc = Document::new(Uuid::now_v7().to_string(), fields);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn put(&self, collection: &str, id: &str, fields: Value) -> anyhow::Result<()> {
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        match entry.iter_mut().find(|doc| doc.id == id) {
            // A replaced document keeps its slot, so insertion order holds.
            Some(doc) => doc.fields = fields,
            None => entry.push(Document::new(id, fields)),
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> anyhow::Result<()> {
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        let doc = entry
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| anyhow::anyhow!("no document {id} in {collection}"))?;
        merge_patch(&mut doc.fields, &patch);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        if let Some(mut entry) = self.collections.get_mut(collection) {
            entry.retain(|doc| doc.id != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dh_core::query::Filter;
    use serde_json::json;

    #[tokio::test]
    async fn filters_sort_and_paginate() {
        let store = MemoryDocumentStore::new();
        for (code, date) in [("A", "2025-01-03"), ("B", "2025-01-01"), ("C", "2025-01-02")] {
            store
                .create("deals1", json!({ "offer_code": code, "start_date": date, "status": 1 }))
                .await
                .unwrap();
        }
        store
            .create("deals1", json!({ "offer_code": "X", "start_date": "2025-01-04", "status": 0 }))
            .await
            .unwrap();

        let first = store
            .query(
                &Query::collection("deals1")
                    .filter(Filter::eq("status", 1))
                    .order_by("start_date", SortDirection::Descending)
                    .limit(2),
            )
            .await
            .unwrap();
        let codes: Vec<_> = first.docs.iter().map(|d| d.str_field("offer_code").unwrap().to_string()).collect();
        assert_eq!(codes, ["A", "C"]);

        let rest = store
            .query(
                &Query::collection("deals1")
                    .filter(Filter::eq("status", 1))
                    .order_by("start_date", SortDirection::Descending)
                    .limit(2)
                    .start_after(first.next_cursor),
            )
            .await
            .unwrap();
        let codes: Vec<_> = rest.docs.iter().map(|d| d.str_field("offer_code").unwrap().to_string()).collect();
        assert_eq!(codes, ["B"]);
    }

    #[tokio::test]
    async fn membership_width_is_enforced() {
        let store = MemoryDocumentStore::new();
        let too_wide: Vec<_> = (0..11).map(|i| json!(i.to_string())).collect();
        let result = store
            .query(&Query::collection("deals").filter(Filter::any_of("location_id", too_wide)))
            .await;
        assert!(result.is_err());
    }
}
