//! The normalized-join search shape: reference resolution, the derived
//! location-id set, the ten-value membership ceiling, and the date validity
//! window.

use std::sync::Arc;

use dh_core::reference::ReferenceData;
use dh_core::search::{DealSearch, SearchFilters, SearchMode, SearchOutcome};
use dh_core::traits::DocumentStore;
use dh_store_memory::MemoryDocumentStore;
use serde_json::json;

async fn seed_reference(store: &dyn DocumentStore, location_count: usize) {
    store
        .put("cities", "1", json!({ "id": 1, "name": "Toronto", "province": "ON", "country": "Canada" }))
        .await
        .unwrap();
    store.put("categories", "2", json!({ "id": 2, "name": "Pizza" })).await.unwrap();
    for i in 1..=location_count {
        store
            .put(
                "locations",
                &i.to_string(),
                json!({
                    "id": i,
                    "city_id": 1,
                    "chain_name": "Slice Bros",
                    "branch_name": format!("Branch {i}"),
                    "address": format!("{i} King St W"),
                    "phone": "416-555-0100"
                }),
            )
            .await
            .unwrap();
    }
}

fn normalized_deal(location_id: usize, start_date: &str, end_date: &str) -> serde_json::Value {
    json!({
        "category_id": 2,
        "location_id": location_id,
        "description": format!("deal at location {location_id}"),
        "offer_code": format!("LOC-{location_id:02}"),
        "start_date": start_date,
        "end_date": end_date
    })
}

fn searched(outcome: SearchOutcome) -> Vec<String> {
    match outcome {
        SearchOutcome::Results { deals, .. } => deals.into_iter().map(|d| d.offer_code).collect(),
        other => panic!("expected results, got {other:?}"),
    }
}

#[tokio::test]
async fn a_city_with_twelve_locations_only_covers_the_first_ten() {
    let store = Arc::new(MemoryDocumentStore::new());
    seed_reference(store.as_ref(), 12).await;
    for i in 1..=12 {
        store
            .create("deals", normalized_deal(i, "2026-01-01", "2030-12-31"))
            .await
            .unwrap();
    }

    let reference = Arc::new(ReferenceData::load(store.as_ref()).await);
    assert_eq!(reference.locations_in_city("1").len(), 12);

    let search = DealSearch::new(store.clone(), reference, SearchMode::NormalizedJoin);
    let codes = searched(
        search
            .search(&SearchFilters {
                city: "Toronto".into(),
                category: "Pizza".into(),
                date: Some("2026-06-15".into()),
            })
            .await,
    );

    // Only the first ten locations' deals are reachable; eleven and twelve
    // fall past the membership ceiling.
    assert_eq!(codes.len(), 10);
    for i in 1..=10 {
        assert!(codes.contains(&format!("LOC-{i:02}")), "location {i} missing");
    }
    assert!(!codes.contains(&"LOC-11".to_string()));
    assert!(!codes.contains(&"LOC-12".to_string()));
}

#[tokio::test]
async fn the_validity_window_excludes_expired_and_future_deals() {
    let store = Arc::new(MemoryDocumentStore::new());
    seed_reference(store.as_ref(), 2).await;
    store.create("deals", normalized_deal(1, "2026-01-01", "2026-12-31")).await.unwrap(); // live
    store.create("deals", normalized_deal(1, "2025-01-01", "2025-12-31")).await.unwrap(); // expired
    store.create("deals", normalized_deal(2, "2027-01-01", "2027-12-31")).await.unwrap(); // not started

    let reference = Arc::new(ReferenceData::load(store.as_ref()).await);
    let search = DealSearch::new(store.clone(), reference, SearchMode::NormalizedJoin);
    let codes = searched(
        search
            .search(&SearchFilters {
                city: "Toronto".into(),
                category: "Pizza".into(),
                date: Some("2026-06-15".into()),
            })
            .await,
    );
    assert_eq!(codes, vec!["LOC-01".to_string()]);
}

#[tokio::test]
async fn an_unknown_city_or_empty_location_set_yields_empty_results() {
    let store = Arc::new(MemoryDocumentStore::new());
    seed_reference(store.as_ref(), 0).await;

    let reference = Arc::new(ReferenceData::load(store.as_ref()).await);
    let search = DealSearch::new(store.clone(), reference, SearchMode::NormalizedJoin);

    // Known city, but no locations in it.
    let outcome = search
        .search(&SearchFilters { city: "Toronto".into(), category: "Pizza".into(), date: None })
        .await;
    assert_eq!(outcome, SearchOutcome::Results { deals: Vec::new(), exhausted: true });

    // Unknown city.
    let outcome = search
        .search(&SearchFilters { city: "Atlantis".into(), category: "Pizza".into(), date: None })
        .await;
    assert_eq!(outcome, SearchOutcome::Results { deals: Vec::new(), exhausted: true });
}
