//! # AppError
//!
//! Centralized error handling for the Dealhub ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all dh-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., deal, uploader profile)
    #[error("{0} not found with id {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., missing required deal fields)
    #[error("validation error: {0}")]
    Validation(String),

    /// Credential failure (bad password, expired session)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed (ownership, admin gates)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate account)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Document store failure surfaced by an adapter
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// A specialized Result type for Dealhub logic.
pub type Result<T> = std::result::Result<T, AppError>;
