//! # dh-store-sqlite Implementation
//!
//! `DocumentStore` over SQLite: every document is a JSON text row in one
//! `documents` table, and queries compile to `json_extract` expressions.
//! This is the durable stand-in for the hosted document store, so it has to
//! honor the same contract — canonical-form equality (a numeric `3` joins a
//! string `"3"`), stable `(sort value, id)` ordering, and strict
//! resume-after cursors.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use dh_core::models::Document;
use dh_core::query::{canonical, Cursor, FilterOp, Query, QueryPage, SortDirection, MAX_MEMBERSHIP_VALUES};
use dh_core::traits::DocumentStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    data       TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)";

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let mut pool_options = SqlitePoolOptions::new();
        // A ":memory:" database lives and dies with its connection; pin the
        // pool to one long-lived connection so the schema survives.
        if url.contains(":memory:") || url.contains("mode=memory") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

/// Owned bind values collected while the SQL text is assembled.
enum Bind {
    Text(String),
    Int(i64),
    Real(f64),
    Null,
}

fn bind_for(value: &Value) -> Bind {
    match value {
        Value::String(s) => Bind::Text(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Bind::Int(i),
            None => Bind::Real(n.as_f64().unwrap_or_default()),
        },
        Value::Bool(b) => Bind::Int(i64::from(*b)),
        Value::Null => Bind::Null,
        other => Bind::Text(other.to_string()),
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

fn apply_bind(query: SqliteQuery<'_>, bind: Bind) -> SqliteQuery<'_> {
    match bind {
        Bind::Text(s) => query.bind(s),
        Bind::Int(i) => query.bind(i),
        Bind::Real(f) => query.bind(f),
        Bind::Null => query.bind(Option::<String>::None),
    }
}

fn json_path(field: &str) -> String {
    format!("$.{field}")
}

fn row_to_doc(row: &SqliteRow) -> anyhow::Result<Document> {
    let id: String = row.get("id");
    let data: String = row.get("data");
    Ok(Document::new(id, serde_json::from_str(&data)?))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn query(&self, query: &Query) -> anyhow::Result<QueryPage> {
        let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?");
        let mut binds: Vec<Bind> = vec![Bind::Text(query.collection.clone())];

        for filter in &query.filters {
            let path = json_path(&filter.field);
            match filter.op {
                // Equality casts to TEXT on both sides so that numeric and
                // string spellings of the same identifier keep joining.
                FilterOp::Eq => {
                    sql.push_str(" AND CAST(json_extract(data, ?) AS TEXT) = ?");
                    binds.push(Bind::Text(path));
                    binds.push(Bind::Text(canonical(&filter.value)));
                }
                FilterOp::Le => {
                    sql.push_str(" AND json_extract(data, ?) <= ?");
                    binds.push(Bind::Text(path));
                    binds.push(bind_for(&filter.value));
                }
                FilterOp::Ge => {
                    sql.push_str(" AND json_extract(data, ?) >= ?");
                    binds.push(Bind::Text(path));
                    binds.push(bind_for(&filter.value));
                }
                FilterOp::In => {
                    let values = filter.value.as_array().cloned().unwrap_or_default();
                    anyhow::ensure!(
                        values.len() <= MAX_MEMBERSHIP_VALUES,
                        "membership filter on {} exceeds the {MAX_MEMBERSHIP_VALUES}-value limit",
                        filter.field
                    );
                    if values.is_empty() {
                        return Ok(QueryPage { docs: Vec::new(), next_cursor: None });
                    }
                    let placeholders = vec!["?"; values.len()].join(", ");
                    sql.push_str(&format!(
                        " AND CAST(json_extract(data, ?) AS TEXT) IN ({placeholders})"
                    ));
                    binds.push(Bind::Text(path));
                    for value in &values {
                        binds.push(Bind::Text(canonical(value)));
                    }
                }
            }
        }

        match &query.sort {
            Some(sort) => {
                let path = json_path(&sort.field);
                if let Some(cursor) = &query.start_after {
                    // Strictly after (sort value, id); `IS` instead of `=`
                    // keeps the tie clause meaningful for null sort values.
                    let strict = match sort.direction {
                        SortDirection::Descending => "<",
                        SortDirection::Ascending => ">",
                    };
                    sql.push_str(&format!(
                        " AND (json_extract(data, ?) {strict} ? OR (json_extract(data, ?) IS ? AND id > ?))"
                    ));
                    binds.push(Bind::Text(path.clone()));
                    binds.push(bind_for(&cursor.sort_value));
                    binds.push(Bind::Text(path.clone()));
                    binds.push(bind_for(&cursor.sort_value));
                    binds.push(Bind::Text(cursor.doc_id.clone()));
                }
                let direction = match sort.direction {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                sql.push_str(&format!(" ORDER BY json_extract(data, ?) {direction}, id ASC"));
                binds.push(Bind::Text(path));
            }
            None => {
                if let Some(cursor) = &query.start_after {
                    sql.push_str(" AND id > ?");
                    binds.push(Bind::Text(cursor.doc_id.clone()));
                }
                sql.push_str(" ORDER BY id ASC");
            }
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Bind::Int(limit as i64));
        }

        let mut prepared = sqlx::query(&sql);
        for bind in binds {
            prepared = apply_bind(prepared, bind);
        }
        let rows = prepared.fetch_all(&self.pool).await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in &rows {
            docs.push(row_to_doc(row)?);
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
        let rows = sqlx::query("SELECT id, data FROM documents WHERE collection = ? ORDER BY rowid")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_doc).collect()
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_doc).transpose()
    }

    async fn create(&self, collection: &str, fields: Value) -> anyhow::Result<Document> {
        let id = Uuid::now_v7().to_string();
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(&id)
            .bind(serde_json::to_string(&fields)?)
            .execute(&self.pool)
            .await?;
        Ok(Document::new(id, fields))
    }

    async fn put(&self, collection: &str, id: &str, fields: Value) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)
             ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data",
        )
        .bind(collection)
        .bind(id)
        .bind(serde_json::to_string(&fields)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> anyhow::Result<()> {
        // json_patch is the RFC 7396 merge: objects merge, null removes.
        let result =
            sqlx::query("UPDATE documents SET data = json_patch(data, ?) WHERE collection = ? AND id = ?")
                .bind(serde_json::to_string(&patch)?)
                .bind(collection)
                .bind(id)
                .execute(&self.pool)
                .await?;
        anyhow::ensure!(result.rows_affected() > 0, "no document {id} in {collection}");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dh_core::query::Filter;
    use serde_json::json;

    async fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store().await;
        let doc = store
            .create("deals1", json!({ "description": "free refill", "status": 0 }))
            .await
            .unwrap();

        let fetched = store.get("deals1", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.str_field("description"), Some("free refill"));
        assert_eq!(fetched.field("status"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existence() {
        let store = store().await;
        let doc = store
            .create("deals1", json!({ "description": "old", "status": 0 }))
            .await
            .unwrap();

        store
            .update("deals1", &doc.id, json!({ "status": 1 }))
            .await
            .unwrap();
        let fetched = store.get("deals1", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.field("status"), Some(&json!(1)));
        assert_eq!(fetched.str_field("description"), Some("old"));

        assert!(store.update("deals1", "missing", json!({ "status": 1 })).await.is_err());
    }

    #[tokio::test]
    async fn test_cursor_resumes_through_ties() {
        let store = store().await;
        for i in 0..5 {
            store
                .create(
                    "deals1",
                    json!({ "start_date": "2025-03-01", "offer_code": format!("T{i}") }),
                )
                .await
                .unwrap();
        }

        let first = store
            .query(
                &Query::collection("deals1")
                    .order_by("start_date", SortDirection::Descending)
                    .limit(2),
            )
            .await
            .unwrap();
        assert_eq!(first.docs.len(), 2);

        let second = store
            .query(
                &Query::collection("deals1")
                    .order_by("start_date", SortDirection::Descending)
                    .limit(2)
                    .start_after(first.next_cursor),
            )
            .await
            .unwrap();
        let third = store
            .query(
                &Query::collection("deals1")
                    .order_by("start_date", SortDirection::Descending)
                    .limit(2)
                    .start_after(second.next_cursor),
            )
            .await
            .unwrap();

        let mut seen: Vec<String> = first
            .docs
            .iter()
            .chain(&second.docs)
            .chain(&third.docs)
            .map(|doc| doc.id.clone())
            .collect();
        assert_eq!(seen.len(), 5);
        seen.dedup();
        assert_eq!(seen.len(), 5, "cursor must not revisit tied rows");
    }

    #[tokio::test]
    async fn test_numeric_and_string_ids_join() {
        let store = store().await;
        store
            .create("deals", json!({ "location_id": 3, "description": "numeric id" }))
            .await
            .unwrap();
        store
            .create("deals", json!({ "location_id": "3", "description": "string id" }))
            .await
            .unwrap();

        let page = store
            .query(&Query::collection("deals").filter(Filter::any_of("location_id", vec![json!("3")])))
            .await
            .unwrap();
        assert_eq!(page.docs.len(), 2);
    }
}
