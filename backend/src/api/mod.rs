//! # REST API Module
//!
//! This module defines all HTTP endpoints for the NFT Rental Marketplace API.
//!
//! ## Endpoint Overview
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | API information |
//! | GET | `/health` | Health check |
//! | GET | `/api/{service}/health` | Per-service health check |
//! | GET | `/api/nft/available` | Rentable NFTs (paged) |
//! | GET | `/api/nft/trending` | Top NFTs by trending score |
//! | GET | `/api/nft/search` | Text search (paged) |
//! | POST | `/api/nft` | Register an NFT |
//! | GET | `/api/nft/:id` | One NFT |
//! | POST | `/api/auth/nonce` | Sign-in nonce |
//! | GET/PUT | `/api/auth/user/:address` | Wallet profile |
//! | GET | `/api/rental/available` | Active rental listings (paged) |
//! | POST | `/api/rental` | Create a rental listing |
//! | GET | `/api/rental/:id` | Listing with its NFT |
//! | GET/POST | `/api/lending/requests` | Pending loan requests |
//! | GET | `/api/lending/:id` | One loan |
//! | GET | `/api/stats` | Document counts |
//! | GET | `/api/db/test` | Database round trip |
//!
//! ## Request/Response Format
//!
//! All requests and responses use JSON:
//!
//! ```json
//! // Success response
//! {
//!     "success": true,
//!     "data": { ... }
//! }
//!
//! // Error response
//! {
//!     "success": false,
//!     "error": "Human readable message"
//! }
//! ```

pub mod routes;
pub mod handlers;

pub use routes::configure_routes;
