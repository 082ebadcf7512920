//! Middleware for request logging and cross-origin policy.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Standard access logger:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn request_logger() -> Logger {
    Logger::default()
}

/// The browser UI may be served from a different origin than the API.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_header()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .max_age(3600)
}
