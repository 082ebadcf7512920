//! # Dealhub Binary
//!
//! The entry point that assembles the application based on compile-time
//! features.

use std::env;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dh_api::{handlers::AppState, middleware};
use dh_core::reference::ReferenceData;
use dh_core::search::SearchMode;
use dh_core::traits::{AuthProvider, DocumentStore};

// Feature-gated imports: swap the backends without touching the code below.
#[cfg(feature = "store-sqlite")]
use dh_store_sqlite::SqliteDocumentStore;

#[cfg(all(feature = "store-memory", not(feature = "store-sqlite")))]
use dh_store_memory::MemoryDocumentStore;

#[cfg(feature = "auth-simple")]
use dh_auth_simple::SimpleAuthProvider;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // 1. Document store implementation.
    #[cfg(feature = "store-sqlite")]
    let store: Arc<dyn DocumentStore> = {
        let url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:dealhub.db".to_string());
        Arc::new(
            SqliteDocumentStore::new(&url)
                .await
                .expect("failed to open the document store"),
        )
    };
    #[cfg(all(feature = "store-memory", not(feature = "store-sqlite")))]
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());

    // 2. Auth implementation. Without admin credentials the service still
    //    runs; there is just nobody who can moderate.
    #[cfg(feature = "auth-simple")]
    let auth: Arc<dyn AuthProvider> = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
        (Ok(email), Ok(password)) => Arc::new(
            SimpleAuthProvider::with_admin(&email, &password)
                .expect("failed to register the admin account"),
        ),
        _ => {
            log::warn!("ADMIN_EMAIL / ADMIN_PASSWORD not set; moderation is unavailable");
            Arc::new(SimpleAuthProvider::new())
        }
    };

    // 3. Reference data, loaded once for the lifetime of the process.
    let reference = Arc::new(ReferenceData::load(store.as_ref()).await);
    log::info!(
        "reference data: {} cities, {} categories, {} locations",
        reference.cities().len(),
        reference.categories().len(),
        reference.locations().len()
    );

    // 4. Shared state behind the handlers.
    let state = web::Data::new(AppState::new(
        store,
        auth,
        reference,
        SearchMode::Denormalized,
    ));

    let addr = env::var("DEALHUB_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("🚀 dealhub listening on http://{addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::request_logger())
            .wrap(middleware::cors_policy())
            .configure(dh_api::configure_routes)
    })
    .bind(addr)?
    .run()
    .await
}
