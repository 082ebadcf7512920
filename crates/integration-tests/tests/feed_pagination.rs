//! End-to-end behavior of the filtered pagination engine: page walks,
//! exhaustion, cursor resets, and the single-flight guard.

use std::sync::Arc;

use dh_core::reference::ReferenceData;
use dh_core::search::{DealSearch, SearchFilters, SearchMode, SearchOutcome};
use dh_core::traits::DocumentStore;
use dh_store_memory::MemoryDocumentStore;
use integration_tests::{live_deal, seed_live_deals, BrokenStore, CountingStore, GatedStore};

fn filters(city: &str, category: &str) -> SearchFilters {
    SearchFilters { city: city.into(), category: category.into(), date: None }
}

fn denormalized_search(store: Arc<dyn DocumentStore>) -> DealSearch {
    DealSearch::new(store, Arc::new(ReferenceData::default()), SearchMode::Denormalized)
}

fn deal_ids(outcome: &SearchOutcome) -> Vec<String> {
    match outcome {
        SearchOutcome::Results { deals, .. } => deals.iter().map(|d| d.id.clone()).collect(),
        other => panic!("expected results, got {other:?}"),
    }
}

fn exhausted(outcome: &SearchOutcome) -> bool {
    match outcome {
        SearchOutcome::Results { exhausted, .. } => *exhausted,
        other => panic!("expected results, got {other:?}"),
    }
}

#[tokio::test]
async fn forty_five_matches_page_out_as_20_20_5() {
    let store = Arc::new(CountingStore::new(MemoryDocumentStore::new()));
    let ids = seed_live_deals(store.as_ref(), "Toronto", "Pizza", 45).await;
    // Noise the filters must exclude.
    store.create("deals1", live_deal("Ottawa", "Pizza", "NO-1", "2025-06-01", 1)).await.unwrap();
    store.create("deals1", live_deal("Toronto", "Coffee", "NO-2", "2025-06-01", 1)).await.unwrap();
    store.create("deals1", live_deal("Toronto", "Pizza", "NO-3", "2025-06-01", 0)).await.unwrap();

    // Newest start date first: the reverse of insertion order.
    let expected: Vec<String> = ids.iter().rev().cloned().collect();

    let search = denormalized_search(store.clone());
    let first = search.search(&filters("Toronto", "Pizza")).await;
    assert_eq!(deal_ids(&first), expected[..20].to_vec());
    assert!(!exhausted(&first));

    let second = search.load_more().await;
    assert_eq!(deal_ids(&second), expected[20..40].to_vec());
    assert!(!exhausted(&second));

    let third = search.load_more().await;
    assert_eq!(deal_ids(&third), expected[40..].to_vec());
    assert!(exhausted(&third));

    // The accumulated view covers all 45, unique and in order.
    let all = search.current().await;
    assert_eq!(all.len(), 45);
    let mut seen: Vec<&str> = all.iter().map(|d| d.id.as_str()).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 45);
    assert!(all.windows(2).all(|w| w[0].start_date >= w[1].start_date));

    // Once exhausted, further load-more calls are answered locally.
    assert_eq!(store.query_count(), 3);
    let after = search.load_more().await;
    assert!(exhausted(&after));
    assert!(deal_ids(&after).is_empty());
    assert_eq!(store.query_count(), 3);
}

#[tokio::test]
async fn tied_sort_values_resume_without_duplicates() {
    let store = Arc::new(MemoryDocumentStore::new());
    for i in 0..25 {
        store
            .create("deals1", live_deal("Toronto", "Pizza", &format!("TIE-{i:02}"), "2025-03-01", 1))
            .await
            .unwrap();
    }

    let search = denormalized_search(store.clone());
    let first = search.search(&filters("Toronto", "Pizza")).await;
    let second = search.load_more().await;
    assert_eq!(deal_ids(&first).len(), 20);
    assert_eq!(deal_ids(&second).len(), 5);
    assert!(exhausted(&second));

    let mut all = deal_ids(&first);
    all.extend(deal_ids(&second));
    let total = all.len();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), total, "cursor must not revisit tied documents");
}

#[tokio::test]
async fn a_new_search_never_resumes_the_old_cursor() {
    let store = Arc::new(MemoryDocumentStore::new());
    seed_live_deals(store.as_ref(), "Toronto", "Pizza", 25).await;
    let coffee_ids = seed_live_deals(store.as_ref(), "Toronto", "Coffee", 5).await;

    let search = denormalized_search(store.clone());
    let first = search.search(&filters("Toronto", "Pizza")).await;
    assert_eq!(deal_ids(&first).len(), 20);

    // Changing the category replaces the filter set and the cursor.
    let switched = search.search(&filters("Toronto", "Coffee")).await;
    let expected: Vec<String> = coffee_ids.iter().rev().cloned().collect();
    assert_eq!(deal_ids(&switched), expected);
    assert!(exhausted(&switched));

    let more = search.load_more().await;
    assert!(deal_ids(&more).is_empty());
    assert!(exhausted(&more));
}

#[tokio::test]
async fn missing_filters_never_touch_the_store() {
    let store = Arc::new(CountingStore::new(MemoryDocumentStore::new()));
    let search = denormalized_search(store.clone());

    assert_eq!(search.search(&filters("", "Pizza")).await, SearchOutcome::NotReady);
    assert_eq!(search.search(&filters("Toronto", "")).await, SearchOutcome::NotReady);
    assert_eq!(search.search(&SearchFilters::default()).await, SearchOutcome::NotReady);
    // Nothing armed, so load-more has nothing to resume either.
    assert_eq!(search.load_more().await, SearchOutcome::NotReady);

    assert_eq!(store.query_count(), 0);
}

#[tokio::test]
async fn a_fetch_in_flight_drops_concurrent_calls() {
    let store = Arc::new(GatedStore::new(MemoryDocumentStore::new()));
    seed_live_deals(store.as_ref(), "Toronto", "Pizza", 3).await;

    let search = Arc::new(denormalized_search(store.clone()));
    let background = tokio::spawn({
        let search = search.clone();
        async move { search.search(&filters("Toronto", "Pizza")).await }
    });

    // Wait for the first fetch to park inside the store call.
    while store.waiting() == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(search.load_more().await, SearchOutcome::Busy);
    assert_eq!(search.load_more().await, SearchOutcome::Busy);

    store.release();
    let outcome = background.await.unwrap();
    assert_eq!(deal_ids(&outcome).len(), 3);
    assert!(exhausted(&outcome));
}

#[tokio::test]
async fn the_subcollection_shape_pages_by_ten_ascending() {
    let store = Arc::new(MemoryDocumentStore::new());
    for i in 0..12 {
        store
            .create(
                "cities/1/categories/2/deals",
                serde_json::json!({
                    "description": format!("deal {i:02}"),
                    "start_date": format!("2025-01-{:02}", i + 1),
                    "end_date": "2030-12-31"
                }),
            )
            .await
            .unwrap();
    }

    let search = DealSearch::new(
        store.clone(),
        Arc::new(ReferenceData::default()),
        SearchMode::Subcollection,
    );
    // City and category are path segments (document ids) in this shape.
    let first = search.search(&filters("1", "2")).await;
    assert_eq!(deal_ids(&first).len(), 10);
    assert!(!exhausted(&first));
    match &first {
        SearchOutcome::Results { deals, .. } => {
            assert_eq!(deals[0].start_date, "2025-01-01");
            assert!(deals.windows(2).all(|w| w[0].start_date <= w[1].start_date));
        }
        other => panic!("expected results, got {other:?}"),
    }

    let second = search.load_more().await;
    assert_eq!(deal_ids(&second).len(), 2);
    assert!(exhausted(&second));
}

#[tokio::test]
async fn a_store_failure_surfaces_as_an_empty_page() {
    let search = denormalized_search(Arc::new(BrokenStore));
    let outcome = search.search(&filters("Toronto", "Pizza")).await;
    assert_eq!(outcome, SearchOutcome::Results { deals: Vec::new(), exhausted: false });
}
