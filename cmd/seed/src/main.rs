//! Seeds the reference collections (cities, categories, locations) from JSON
//! files so the search dropdowns have something to offer.
//!
//! Usage: `seed [data-dir]` — defaults to `./data`, honors `DATABASE_URL`.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

use dh_core::models::{collections, id_key};
use dh_core::traits::DocumentStore;
use dh_store_sqlite::SqliteDocumentStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let dir = PathBuf::from(env::args().nth(1).unwrap_or_else(|| "data".to_string()));
    let url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:dealhub.db".to_string());
    let store = SqliteDocumentStore::new(&url).await?;

    for collection in [collections::CITIES, collections::CATEGORIES, collections::LOCATIONS] {
        let path = dir.join(format!("{collection}.json"));
        if !path.exists() {
            log::warn!("{} missing, skipping {collection}", path.display());
            continue;
        }
        let count = seed_collection(&store, collection, &path).await?;
        log::info!("seeded {count} documents into {collection}");
    }
    Ok(())
}

async fn seed_collection(
    store: &SqliteDocumentStore,
    collection: &str,
    path: &Path,
) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let entries: Vec<Value> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let mut count = 0;
    for entry in entries {
        let id = entry
            .get("id")
            .and_then(id_key)
            .with_context(|| format!("{collection} entry without an id field"))?;
        store.put(collection, &id, entry).await?;
        count += 1;
    }
    Ok(count)
}
