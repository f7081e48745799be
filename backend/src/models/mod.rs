//! # API Models
//!
//! This module defines the request and response structures for the REST API.
//! Document shapes (NFT, rental, loan, user) come from `db::models`; these
//! types wrap them for the wire.
//!
//! ## Organization
//!
//! - `requests.rs` - Incoming request bodies and query strings
//! - `responses.rs` - Outgoing response bodies
//!
//! ## Serialization
//!
//! All models use Serde for JSON serialization/deserialization.
//! Field names are converted to camelCase for JavaScript clients.

pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
