//! # API Route Configuration
//!
//! This module sets up all the HTTP routes for the API.

use actix_web::web;

use super::handlers;

/// Configure all API routes.
///
/// This function is called from main.rs to set up
/// all the endpoint routes. The 404 fallback is attached to the `App`
/// itself (`handlers::not_found`).
///
/// ## Route Structure
///
/// ```text
/// /
/// ├── /health                    GET  - API health
/// └── /api
///     ├── /{service}/health      GET  - Per-service health
///     ├── /stats                 GET  - Document counts
///     ├── /db/test               GET  - Database round trip
///     ├── /nft
///     │   ├── /available         GET  - Rentable NFTs (paged)
///     │   ├── /trending          GET  - Top NFTs by trending score
///     │   ├── /search            GET  - Text search (paged)
///     │   ├── (root)             POST - Register NFT
///     │   └── /{id}              GET  - One NFT
///     ├── /auth
///     │   ├── /nonce             POST - Sign-in nonce
///     │   └── /user/{address}    GET/PUT - Wallet profile
///     ├── /rental
///     │   ├── /available         GET  - Active listings (paged)
///     │   ├── (root)             POST - Create listing
///     │   └── /{id}              GET  - Listing with its NFT
///     └── /lending
///         ├── /requests          GET/POST - Pending loan requests
///         └── /{id}              GET  - One loan
/// ```
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Malformed bodies and query strings get the standard error envelope
        .app_data(web::JsonConfig::default().error_handler(handlers::json_error))
        .app_data(web::QueryConfig::default().error_handler(handlers::query_error))

        // Root endpoint - API information
        .route("/", web::get().to(handlers::api_info))

        // Health checks; must precede the scopes so `/api/nft/health`
        // is not taken for an NFT id
        .route("/health", web::get().to(handlers::health_check))
        .route("/api/{service}/health", web::get().to(handlers::service_health))

        // Diagnostics
        .route("/api/stats", web::get().to(handlers::get_stats))
        .route("/api/db/test", web::get().to(handlers::db_test))

        // NFT endpoints
        .service(
            web::scope("/api/nft")
                .route("/available", web::get().to(handlers::get_available_nfts))
                .route("/trending", web::get().to(handlers::get_trending_nfts))
                .route("/search", web::get().to(handlers::search_nfts))
                .route("", web::post().to(handlers::create_nft))
                .route("/{id}", web::get().to(handlers::get_nft))
        )

        // Wallet auth and profiles
        .service(
            web::scope("/api/auth")
                .route("/nonce", web::post().to(handlers::request_nonce))
                .route("/user/{address}", web::get().to(handlers::get_user_profile))
                .route("/user/{address}", web::put().to(handlers::update_user_profile))
        )

        // Rental listings
        .service(
            web::scope("/api/rental")
                .route("/available", web::get().to(handlers::get_available_rentals))
                .route("", web::post().to(handlers::create_rental))
                .route("/{id}", web::get().to(handlers::get_rental))
        )

        // Loan requests
        .service(
            web::scope("/api/lending")
                .route("/requests", web::get().to(handlers::get_loan_requests))
                .route("/requests", web::post().to(handlers::create_loan_request))
                .route("/{id}", web::get().to(handlers::get_loan))
        );
}
