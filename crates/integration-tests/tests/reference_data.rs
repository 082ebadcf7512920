//! Reference data loading: full-collection reads, id canonicalization, and
//! the degrade-to-empty failure path.

use dh_core::reference::ReferenceData;
use dh_core::traits::DocumentStore;
use dh_store_memory::MemoryDocumentStore;
use integration_tests::BrokenStore;
use serde_json::json;

#[tokio::test]
async fn loads_all_three_collections_and_joins_by_canonical_id() {
    let store = MemoryDocumentStore::new();
    store
        .put("cities", "1", json!({ "id": 1, "name": "Toronto", "province": "ON", "country": "Canada" }))
        .await
        .unwrap();
    // A newer-generation document with a string id and no embedded id field.
    store.put("cities", "yyz", json!({ "name": "Mississauga", "province": "ON" })).await.unwrap();
    store.put("categories", "2", json!({ "id": "2", "name": "Pizza" })).await.unwrap();
    store
        .put("locations", "3", json!({ "id": 3, "city_id": 1, "chain_name": "Slice Bros" }))
        .await
        .unwrap();
    store
        .put("locations", "4", json!({ "id": 4, "city_id": 2, "chain_name": "Grind House" }))
        .await
        .unwrap();

    let reference = ReferenceData::load(&store).await;
    assert_eq!(reference.cities().len(), 2);
    assert_eq!(reference.categories().len(), 1);
    assert_eq!(reference.locations().len(), 2);

    let toronto = reference.city_by_name("Toronto").unwrap();
    assert_eq!(toronto.id, "1");
    // Documents without an embedded id fall back to the store-assigned one.
    assert_eq!(reference.city_by_name("Mississauga").unwrap().id, "yyz");

    assert_eq!(reference.category_by_name("Pizza").unwrap().id, "2");
    let in_toronto = reference.locations_in_city("1");
    assert_eq!(in_toronto.len(), 1);
    assert_eq!(in_toronto[0].chain_name, "Slice Bros");
    assert!(reference.location_by_id("404").is_none());
}

#[tokio::test]
async fn an_unreachable_store_degrades_to_empty_tables() {
    let reference = ReferenceData::load(&BrokenStore).await;
    assert!(reference.cities().is_empty());
    assert!(reference.categories().is_empty());
    assert!(reference.locations().is_empty());
    // Lookups degrade to "not found" rather than failing.
    assert!(reference.city_by_name("Toronto").is_none());
    assert!(reference.locations_in_city("1").is_empty());
}

#[tokio::test]
async fn documents_missing_required_fields_are_skipped() {
    let store = MemoryDocumentStore::new();
    store.put("cities", "1", json!({ "id": 1, "name": "Toronto" })).await.unwrap();
    store.put("cities", "2", json!({ "id": 2 })).await.unwrap(); // no name

    let reference = ReferenceData::load(&store).await;
    assert_eq!(reference.cities().len(), 1);
}
