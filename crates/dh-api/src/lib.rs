//! # dh-api
//!
//! The JSON routing and orchestration layer for Dealhub.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use actix_web::web;

pub use handlers::AppState;

/// Configures the API routes.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under a different prefix if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/auth/signup", web::post().to(handlers::signup))
            .route("/auth/login", web::post().to(handlers::login))
            .route("/auth/logout", web::post().to(handlers::logout))
            .route("/reference", web::get().to(handlers::reference))
            .route("/deals/search", web::post().to(handlers::search))
            .route("/deals/more", web::post().to(handlers::load_more))
            .route("/deals/mine", web::get().to(handlers::my_deals))
            .route("/deals", web::post().to(handlers::submit_deal))
            .route("/deals/{id}", web::put().to(handlers::edit_deal))
            .route("/deals/{id}", web::delete().to(handlers::delete_deal))
            .route("/profile", web::get().to(handlers::get_profile))
            .route("/profile", web::put().to(handlers::save_profile))
            .route("/moderation/pending", web::get().to(handlers::pending_deals))
            .route("/moderation/{id}/approve", web::post().to(handlers::approve_deal))
            .route("/moderation/{id}/reject", web::post().to(handlers::reject_deal)),
    );
}
