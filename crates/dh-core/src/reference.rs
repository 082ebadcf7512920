//! # Reference Data
//!
//! Cities, categories, and locations are small and change rarely, so each
//! collection is loaded in full once per process and kept in memory for
//! lookups and dropdowns. There is no refresh; staleness is an accepted
//! tradeoff. Read-only after load, safe to share without locking.

use serde::Serialize;

use crate::models::{collections, Category, City, Document, Location};
use crate::traits::DocumentStore;

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReferenceData {
    cities: Vec<City>,
    categories: Vec<Category>,
    locations: Vec<Location>,
}

impl ReferenceData {
    /// Loads all three collections unconditionally. A collection that fails
    /// to load is logged and left empty; lookups against it degrade to
    /// "not found" instead of blocking anything.
    pub async fn load(store: &dyn DocumentStore) -> Self {
        Self {
            cities: fetch(store, collections::CITIES, City::from_doc).await,
            categories: fetch(store, collections::CATEGORIES, Category::from_doc).await,
            locations: fetch(store, collections::LOCATIONS, Location::from_doc).await,
        }
    }

    pub fn from_parts(cities: Vec<City>, categories: Vec<Category>, locations: Vec<Location>) -> Self {
        Self { cities, categories, locations }
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn city_by_name(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.name == name)
    }

    pub fn city_by_id(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn category_by_id(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn location_by_id(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|location| location.id == id)
    }

    /// All locations belonging to a city, in load order.
    pub fn locations_in_city(&self, city_id: &str) -> Vec<&Location> {
        self.locations.iter().filter(|location| location.city_id == city_id).collect()
    }
}

async fn fetch<T>(
    store: &dyn DocumentStore,
    collection: &str,
    parse: impl Fn(&Document) -> Option<T>,
) -> Vec<T> {
    match store.fetch_all(collection).await {
        Ok(docs) => docs.iter().filter_map(parse).collect(),
        Err(err) => {
            log::error!("failed to load {collection}: {err:#}");
            Vec::new()
        }
    }
}
