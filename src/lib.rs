//! Shop backend
//!
//! Storefront API behind a jewellery shop front-end.
//!
//! ## Features
//! - Product and category catalog
//! - Carts for signed-in users and guest sessions
//! - Discount coupons and loyalty bonuses
//! - Checkout with signed payment-provider payloads and callback reconciliation
//! - Delivery cost quotes
//! - Abandoned-cart reminders

pub mod config;
pub mod domain;
pub mod http;
pub mod repository;
pub mod services;

use thiserror::Error;

use crate::repository::RepositoryError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl EcommerceError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

impl From<RepositoryError> for EcommerceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Database(msg) => Self::Storage(msg),
        }
    }
}

impl From<sqlx::Error> for EcommerceError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::from(err).into()
    }
}

impl From<validator::ValidationErrors> for EcommerceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_taxonomy() {
        let err: EcommerceError = RepositoryError::Conflict("category name taken".into()).into();
        assert!(matches!(err, EcommerceError::Conflict(ref m) if m == "category name taken"));

        let err: EcommerceError = RepositoryError::Database("connection reset".into()).into();
        assert!(matches!(err, EcommerceError::Storage(_)));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(EcommerceError::not_found("product").to_string(), "product not found");
    }
}
