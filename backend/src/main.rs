//! # NFT Rental Marketplace Backend
//!
//! This is the main entry point for the backend service behind the NFT
//! rental and lending marketplace demo. It provides:
//!
//! - REST API for browsing NFTs, rental listings and loan requests
//! - Wallet sign-in nonces and user profiles
//! - Health, stats and database diagnostics
//! - Optional seeding of demo documents
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        BACKEND SERVICE                           │
//! │                                                                  │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                  REST API (Actix)                          │  │
//! │  │   /api/nft   /api/auth   /api/rental   /api/lending        │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                          │                                       │
//! │  ┌───────────────────────┴───────────────────────────────────┐  │
//! │  │                    SERVICE LAYER                           │  │
//! │  │       ┌──────────────┐        ┌────────────────────┐      │  │
//! │  │       │ AuthService  │        │ MarketplaceService │      │  │
//! │  │       └──────────────┘        └────────────────────┘      │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                          │                                       │
//! │                   ┌──────┴──────┐                                │
//! │                   │  PostgreSQL │                                │
//! │                   │  (JSONB)    │                                │
//! │                   └─────────────┘                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! 1. Set up PostgreSQL and create the database
//! 2. Put `DATABASE_URL` (and any overrides) in `.env`
//! 3. Start the server: `cargo run`; the schema is applied on startup
//! 4. Set `SEED_DEMO_DATA=true` for a populated demo
//!
//! ## Environment Variables
//!
//! See `config/mod.rs` for the full list and defaults.

use std::sync::Arc;
use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer, middleware};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api;
mod config;
mod db;
mod models;
mod services;
mod utils;

use config::AppConfig;
use db::Database;
use services::{AuthService, MarketplaceService};

/// Application state shared across all handlers.
///
/// Wrapped in `Arc` so every worker thread shares one pool and one
/// set of services.
pub struct AppState {
    /// Database connection pool for PostgreSQL
    pub db: Database,

    /// Nonces and wallet profiles
    pub auth: AuthService,

    /// NFT, rental and loan documents
    pub marketplace: MarketplaceService,

    /// Application configuration
    pub config: AppConfig,
}

/// Main entry point for the backend service.
///
/// This function:
/// 1. Loads configuration from environment
/// 2. Initializes database connection and schema
/// 3. Optionally seeds demo data
/// 4. Launches the HTTP server
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // =========================================
    // STEP 1: Load .env and initialize logging
    // =========================================
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("🚀 Starting NFT Rental Marketplace Backend");

    // =========================================
    // STEP 2: Load Configuration
    // =========================================
    let config = AppConfig::from_env()
        .expect("Failed to load configuration");

    info!("📋 Configuration loaded");
    info!("   Environment: {}", config.environment);
    info!("   CORS origin: {}", config.cors_origin);

    // =========================================
    // STEP 3: Initialize Database
    // =========================================
    let db = Database::connect(&config.database_url, config.db_pool_size)
        .await
        .expect("Failed to connect to database");

    info!("🗄️  Database connected (pool size: {})", config.db_pool_size);

    db.run_migrations()
        .await
        .expect("Failed to run migrations");

    info!("📦 Database schema ready");

    // =========================================
    // STEP 4: Seed Demo Data
    // =========================================
    if config.seed_demo_data {
        match db::seed::seed_demo_data(&db).await {
            Ok(Some(summary)) => info!(
                "🌱 Seeded {} users, {} NFTs, {} rentals, {} loans",
                summary.users, summary.nfts, summary.rentals, summary.loans
            ),
            Ok(None) => info!("🌱 NFTs already present, skipping seed"),
            Err(e) => warn!("Demo seed failed: {}", e),
        }
    }

    // =========================================
    // STEP 5: Create Application State
    // =========================================
    let app_state = Arc::new(AppState {
        auth: AuthService::new(db.clone(), &config),
        marketplace: MarketplaceService::new(db.clone()),
        db,
        config: config.clone(),
    });

    info!("🔧 Services initialized");

    // =========================================
    // STEP 6: Start HTTP Server
    // =========================================
    let server_host = config.server_host.clone();
    let server_port = config.server_port;
    let cors_origin = config.cors_origin.clone();

    info!("🌐 Starting HTTP server on {}:{}", server_host, server_port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allow_any_method()
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        App::new()
            // Attach shared application state
            .app_data(web::Data::new(app_state.clone()))

            .wrap(cors)
            .wrap(middleware::Logger::default())

            // Configure API routes
            .configure(api::configure_routes)

            // Unmatched paths get the JSON 404
            .default_service(web::to(api::handlers::not_found))
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
