//! # Services Module
//!
//! This module contains the business logic services for the
//! marketplace backend. Each service handles a specific domain.
//!
//! ## Services Overview
//!
//! | Service | Responsibility |
//! |---------|---------------|
//! | `AuthService` | Sign-in nonces, wallet profiles |
//! | `MarketplaceService` | NFT, rental and loan documents, stats |
//!
//! ## Service Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SERVICES LAYER                            │
//! │                                                                  │
//! │  ┌───────────────────────┐      ┌───────────────────────────┐   │
//! │  │     AuthService       │      │    MarketplaceService     │   │
//! │  │  • issue_nonce()      │      │  • available_nfts()       │   │
//! │  │  • get_profile()      │      │  • available_rentals()    │   │
//! │  │  • update_profile()   │      │  • loan_requests()        │   │
//! │  └───────────────────────┘      └───────────────────────────┘   │
//! │              │                               │                   │
//! │              └───────────────┬───────────────┘                   │
//! │                              ▼                                   │
//! │                       db::queries                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth_service;
pub mod marketplace;

pub use auth_service::AuthService;
pub use marketplace::MarketplaceService;

use crate::db::DatabaseError;

/// Errors shared by the marketplace services.
///
/// Handlers map each variant to an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    /// Request failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// The requested document doesn't exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A document with the same identity already exists.
    #[error("{0}")]
    Conflict(String),

    /// Database operation failed.
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for MarketplaceError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Duplicate(what) => MarketplaceError::Conflict(what),
            other => MarketplaceError::Database(other),
        }
    }
}
