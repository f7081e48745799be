//! # API Request Handlers
//!
//! This module contains the handler functions for each API endpoint.
//! Each handler:
//! 1. Extracts request data
//! 2. Validates input
//! 3. Calls the appropriate service
//! 4. Returns a formatted response
//!
//! ## Error Handling
//!
//! All errors are caught and returned as JSON:
//!
//! ```json
//! {
//!     "success": false,
//!     "error": "NFT not found"
//! }
//! ```
//!
//! | Failure | Status |
//! |---------|--------|
//! | Malformed body, query or id; failed validation | 400 |
//! | Document or route not found | 404 |
//! | Duplicate NFT identity | 409 |
//! | Database failure | 500 |

use std::sync::Arc;
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{info, error, warn};

use crate::AppState;
use crate::models::{
    ApiResponse,
    CreateLoanRequest,
    CreateNftRequest,
    CreateRentalRequest,
    DbTestResponse,
    HealthResponse,
    LimitQuery,
    NonceRequest,
    PageQuery,
    SearchQuery,
    TrendingNftsResponse,
    UpdateProfileRequest,
};
use crate::services::MarketplaceError;
use crate::utils;

/// Services that answer `GET /api/{service}/health`, with display names.
const SERVICES: &[(&str, &str)] = &[
    ("nft", "NFT"),
    ("auth", "Auth"),
    ("rental", "Rental"),
    ("lending", "Lending"),
];

// ============================================
// ERROR HELPERS
// ============================================

/// Convert a service error into the standard error response.
fn service_error(context: &str, e: MarketplaceError) -> HttpResponse {
    let status = match &e {
        MarketplaceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
        MarketplaceError::Conflict(_) => StatusCode::CONFLICT,
        MarketplaceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("{} failed: {}", context, e);
    } else {
        warn!("{} rejected: {}", context, e);
    }

    HttpResponse::build(status).json(ApiResponse::<()>::error(&e.to_string()))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()>::error(message))
}

/// Wrap an extractor error in a 400 with the standard envelope.
fn extractor_error<E>(err: E) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let message = err.to_string();
    warn!("Rejected request: {}", message);
    InternalError::from_response(err, bad_request(&message)).into()
}

/// Error handler for `web::Json` extraction.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    extractor_error(err)
}

/// Error handler for `web::Query` extraction.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    extractor_error(err)
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    warn!("No route for {} {}", req.method(), req.path());
    HttpResponse::NotFound().json(ApiResponse::<()>::error(&format!(
        "Route {} not found",
        req.path()
    )))
}

// ============================================
// INFO & HEALTH
// ============================================

/// API information endpoint (root).
///
/// ## Endpoint
///
/// `GET /`
pub async fn api_info() -> HttpResponse {
    let info = json!({
        "name": "NFT Rental Marketplace API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Rent, lend and borrow against NFTs",
        "endpoints": {
            "health": "GET /health",
            "nft": {
                "available": "GET /api/nft/available?page&limit",
                "trending": "GET /api/nft/trending?limit",
                "search": "GET /api/nft/search?q&page&limit",
                "create": "POST /api/nft",
                "detail": "GET /api/nft/{id}"
            },
            "auth": {
                "nonce": "POST /api/auth/nonce",
                "profile": "GET|PUT /api/auth/user/{address}"
            },
            "rental": {
                "available": "GET /api/rental/available?page&limit",
                "create": "POST /api/rental",
                "detail": "GET /api/rental/{id}"
            },
            "lending": {
                "requests": "GET|POST /api/lending/requests",
                "detail": "GET /api/lending/{id}"
            },
            "stats": "GET /api/stats",
            "dbTest": "GET /api/db/test"
        }
    });

    HttpResponse::Ok().json(ApiResponse::success(info))
}

fn health_response(state: &AppState, service: &str, message: String) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        success: true,
        message,
        service: service.to_string(),
        environment: state.config.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Health check endpoint.
///
/// Answers without touching the database; use `/api/db/test` for that.
///
/// ## Endpoint
///
/// `GET /health`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "message": "NFT Rental Marketplace API is running",
///     "service": "api",
///     "environment": "development",
///     "version": "0.1.0",
///     "timestamp": "2026-01-15T12:00:00Z"
/// }
/// ```
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    health_response(&state, "api", "NFT Rental Marketplace API is running".to_string())
}

/// Per-service health check.
///
/// ## Endpoint
///
/// `GET /api/{nft|auth|rental|lending}/health`
pub async fn service_health(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> HttpResponse {
    let service = path.into_inner();

    match SERVICES.iter().find(|(key, _)| *key == service) {
        Some((key, name)) => health_response(&state, key, format!("{} service is running", name)),
        None => HttpResponse::NotFound().json(ApiResponse::<()>::error(&format!(
            "Unknown service: {}",
            service
        ))),
    }
}

/// Document counts.
///
/// ## Endpoint
///
/// `GET /api/stats`
pub async fn get_stats(state: web::Data<Arc<AppState>>) -> HttpResponse {
    match state.marketplace.stats().await {
        Ok(stats) => HttpResponse::Ok().json(ApiResponse::success(stats)),
        Err(e) => service_error("Stats", e),
    }
}

/// Database round trip.
///
/// ## Endpoint
///
/// `GET /api/db/test`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": { "connected": true, "latencyMs": 3, "timestamp": "..." }
/// }
/// ```
pub async fn db_test(state: web::Data<Arc<AppState>>) -> HttpResponse {
    match state.db.ping().await {
        Ok(latency) => HttpResponse::Ok().json(ApiResponse::success(DbTestResponse {
            connected: true,
            latency_ms: latency.as_millis() as u64,
            timestamp: Utc::now(),
        })),
        Err(e) => {
            error!("Database test failed: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error(&e.to_string()))
        }
    }
}

// ============================================
// NFT
// ============================================

/// NFTs available for rent.
///
/// ## Endpoint
///
/// `GET /api/nft/available?page=1&limit=20`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "nfts": [...],
///         "pagination": { "page": 1, "limit": 20, "total": 42, "pages": 3 }
///     }
/// }
/// ```
pub async fn get_available_nfts(
    state: web::Data<Arc<AppState>>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let page = query.resolve();
    info!("Available NFTs request (page: {}, limit: {})", page.page, page.limit);

    match state.marketplace.available_nfts(page).await {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(e) => service_error("Available NFTs", e),
    }
}

/// NFTs ordered by their stored trending score.
///
/// ## Endpoint
///
/// `GET /api/nft/trending?limit=10`
pub async fn get_trending_nfts(
    state: web::Data<Arc<AppState>>,
    query: web::Query<LimitQuery>,
) -> HttpResponse {
    let limit = query.resolve();
    info!("Trending NFTs request (limit: {})", limit);

    match state.marketplace.trending_nfts(limit).await {
        Ok(nfts) => HttpResponse::Ok().json(ApiResponse::success(TrendingNftsResponse { nfts })),
        Err(e) => service_error("Trending NFTs", e),
    }
}

/// Text search over NFTs.
///
/// ## Endpoint
///
/// `GET /api/nft/search?q=guardian&page=1&limit=20`
///
/// A missing or blank `q` is a 400.
pub async fn search_nfts(
    state: web::Data<Arc<AppState>>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let Some(term) = query.term() else {
        return bad_request("Search query is required");
    };
    let page = query.resolve();
    info!("NFT search: {:?} (page: {}, limit: {})", term, page.page, page.limit);

    match state.marketplace.search_nfts(term, page).await {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(e) => service_error("NFT search", e),
    }
}

/// One NFT by id.
///
/// ## Endpoint
///
/// `GET /api/nft/{id}`
pub async fn get_nft(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = match utils::parse_document_id(&path) {
        Ok(id) => id,
        Err(msg) => return bad_request(&msg),
    };

    match state.marketplace.get_nft(id).await {
        Ok(nft) => HttpResponse::Ok().json(ApiResponse::success(nft)),
        Err(e) => service_error("Get NFT", e),
    }
}

/// Register an NFT.
///
/// ## Endpoint
///
/// `POST /api/nft`
///
/// Returns 201 with the stored document, 409 if the
/// `(contractAddress, tokenId, chainId)` triple already exists.
pub async fn create_nft(
    state: web::Data<Arc<AppState>>,
    body: web::Json<CreateNftRequest>,
) -> HttpResponse {
    info!("Create NFT request: {}#{}", body.contract_address, body.token_id);

    match state.marketplace.create_nft(body.into_inner()).await {
        Ok(nft) => HttpResponse::Created().json(ApiResponse::success(nft)),
        Err(e) => service_error("Create NFT", e),
    }
}

// ============================================
// AUTH
// ============================================

/// Issue a wallet sign-in nonce.
///
/// ## Endpoint
///
/// `POST /api/auth/nonce`
///
/// ## Example
///
/// ```bash
/// curl -X POST http://127.0.0.1:5000/api/auth/nonce \
///   -H "Content-Type: application/json" \
///   -d '{ "walletAddress": "0x71c7656ec7ab88b098defb751b7401b5f6d8976f" }'
/// ```
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "walletAddress": "0x71c7656ec7ab88b098defb751b7401b5f6d8976f",
///         "nonce": "q8Xc2LmT...",
///         "message": "Welcome to the NFT Rental Marketplace! ...",
///         "expiresAt": "2026-01-15T12:15:00Z"
///     }
/// }
/// ```
///
/// A missing `walletAddress` is a 400.
pub async fn request_nonce(
    state: web::Data<Arc<AppState>>,
    body: web::Json<NonceRequest>,
) -> HttpResponse {
    match state.auth.issue_nonce(body.wallet_address.as_deref()).await {
        Ok(nonce) => HttpResponse::Ok().json(ApiResponse::success(nonce)),
        Err(e) => service_error("Nonce request", e),
    }
}

/// Wallet profile; created with defaults on first fetch.
///
/// ## Endpoint
///
/// `GET /api/auth/user/{address}`
pub async fn get_user_profile(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> HttpResponse {
    match state.auth.get_profile(&path).await {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success(user)),
        Err(e) => service_error("Get profile", e),
    }
}

/// Update profile fields and preferences.
///
/// ## Endpoint
///
/// `PUT /api/auth/user/{address}`
pub async fn update_user_profile(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    match state.auth.update_profile(&path, body.into_inner()).await {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success(user)),
        Err(e) => service_error("Update profile", e),
    }
}

// ============================================
// RENTAL
// ============================================

/// Active rental listings.
///
/// ## Endpoint
///
/// `GET /api/rental/available?page=1&limit=20`
pub async fn get_available_rentals(
    state: web::Data<Arc<AppState>>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let page = query.resolve();
    info!("Available rentals request (page: {}, limit: {})", page.page, page.limit);

    match state.marketplace.available_rentals(page).await {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(e) => service_error("Available rentals", e),
    }
}

/// One rental listing with its NFT.
///
/// ## Endpoint
///
/// `GET /api/rental/{id}`
pub async fn get_rental(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = match utils::parse_document_id(&path) {
        Ok(id) => id,
        Err(msg) => return bad_request(&msg),
    };

    match state.marketplace.get_rental(id).await {
        Ok(rental) => HttpResponse::Ok().json(ApiResponse::success(rental)),
        Err(e) => service_error("Get rental", e),
    }
}

/// Create a rental listing.
///
/// ## Endpoint
///
/// `POST /api/rental`
pub async fn create_rental(
    state: web::Data<Arc<AppState>>,
    body: web::Json<CreateRentalRequest>,
) -> HttpResponse {
    info!("Create rental request for NFT: {}", body.nft_id);

    match state.marketplace.create_rental(body.into_inner()).await {
        Ok(rental) => HttpResponse::Created().json(ApiResponse::success(rental)),
        Err(e) => service_error("Create rental", e),
    }
}

// ============================================
// LENDING
// ============================================

/// Pending loan requests.
///
/// ## Endpoint
///
/// `GET /api/lending/requests?page=1&limit=20`
pub async fn get_loan_requests(
    state: web::Data<Arc<AppState>>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    let page = query.resolve();
    info!("Loan requests request (page: {}, limit: {})", page.page, page.limit);

    match state.marketplace.loan_requests(page).await {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(e) => service_error("Loan requests", e),
    }
}

/// One loan by id.
///
/// ## Endpoint
///
/// `GET /api/lending/{id}`
pub async fn get_loan(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = match utils::parse_document_id(&path) {
        Ok(id) => id,
        Err(msg) => return bad_request(&msg),
    };

    match state.marketplace.get_loan(id).await {
        Ok(loan) => HttpResponse::Ok().json(ApiResponse::success(loan)),
        Err(e) => service_error("Get loan", e),
    }
}

/// Open a loan request.
///
/// ## Endpoint
///
/// `POST /api/lending/requests`
pub async fn create_loan_request(
    state: web::Data<Arc<AppState>>,
    body: web::Json<CreateLoanRequest>,
) -> HttpResponse {
    info!("Loan request from: {}", utils::truncate_string(&body.borrower, 13));

    match state.marketplace.create_loan(body.into_inner()).await {
        Ok(loan) => HttpResponse::Created().json(ApiResponse::success(loan)),
        Err(e) => service_error("Create loan request", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use futures::future::join_all;
    use serde_json::Value;

    use crate::api::configure_routes;
    use crate::config::AppConfig;
    use crate::db::Database;
    use crate::services::{AuthService, MarketplaceService};

    /// State wired to a database that refuses connections.
    fn test_state() -> web::Data<Arc<AppState>> {
        let config = AppConfig::for_tests();
        let db = Database::new(&config.database_url, config.db_pool_size).unwrap();

        web::Data::new(Arc::new(AppState {
            auth: AuthService::new(db.clone(), &config),
            marketplace: MarketplaceService::new(db.clone()),
            db,
            config,
        }))
    }

    macro_rules! test_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(test_state())
                    .configure(configure_routes)
                    .default_service(web::to(not_found)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health_endpoints_report_message() {
        let app = test_app!();

        for path in [
            "/health",
            "/api/nft/health",
            "/api/auth/health",
            "/api/rental/health",
            "/api/lending/health",
        ] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK, "{}", path);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], true);
            assert!(body["message"].as_str().unwrap().contains("running"), "{}", path);
            assert_eq!(body["environment"], "test");
        }
    }

    #[actix_web::test]
    async fn test_unknown_service_health() {
        let app = test_app!();
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/payments/health").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_concurrent_gets_all_succeed() {
        let app = test_app!();
        let paths = [
            "/",
            "/health",
            "/api/nft/health",
            "/api/auth/health",
            "/api/rental/health",
            "/api/lending/health",
        ];

        let responses = join_all(paths.iter().map(|path| {
            test::call_service(&app, test::TestRequest::get().uri(path).to_request())
        }))
        .await;

        assert_eq!(responses.len(), paths.len());
        for resp in responses {
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }

    #[actix_web::test]
    async fn test_nonce_requires_wallet_address() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/api/auth/nonce")
            .set_json(json!({}))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "success": false, "error": "Wallet address is required" }));
    }

    #[actix_web::test]
    async fn test_nonce_rejects_malformed_address_and_body() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/api/auth/nonce")
            .set_json(json!({ "walletAddress": "0xnot-an-address" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/auth/nonce")
            .insert_header(("content-type", "application/json"))
            .set_payload("{ not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_unmatched_route_names_path() {
        let app = test_app!();
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/does/not/exist").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("/api/does/not/exist"));
    }

    #[actix_web::test]
    async fn test_database_failure_is_500_with_message() {
        let app = test_app!();
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/nft/available?page=1&limit=5").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Database connection failed"));
    }

    #[actix_web::test]
    async fn test_db_test_reports_failure() {
        let app = test_app!();
        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/db/test").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_bad_inputs_rejected_before_database() {
        let app = test_app!();

        for (uri, expected) in [
            ("/api/nft/not-a-uuid", "Invalid id: not-a-uuid"),
            ("/api/rental/123", "Invalid id: 123"),
            ("/api/lending/xyz", "Invalid id: xyz"),
            ("/api/nft/search", "Search query is required"),
            ("/api/nft/search?q=%20%20", "Search query is required"),
        ] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], expected, "{}", uri);
        }

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/nft/available?page=abc").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_create_loan_validation() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/api/lending/requests")
            .set_json(json!({
                "borrower": "0x71c7656ec7ab88b098defb751b7401b5f6d8976f",
                "collateral": [],
                "terms": { "principal": 5.0 }
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "At least one collateral NFT is required");
    }

    #[actix_web::test]
    async fn test_api_info() {
        let app = test_app!();
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["endpoints"]["auth"]["nonce"], "POST /api/auth/nonce");
    }

    #[actix_web::test]
    async fn test_service_error_status_codes() {
        use crate::db::DatabaseError;

        let conflict: MarketplaceError =
            DatabaseError::Duplicate("NFT 0xabc#1 on chain 1 already exists".into()).into();
        let cases = [
            (MarketplaceError::InvalidInput("Daily rate must be greater than 0".into()), StatusCode::BAD_REQUEST),
            (MarketplaceError::NotFound("Rental".into()), StatusCode::NOT_FOUND),
            (conflict, StatusCode::CONFLICT),
            (
                DatabaseError::ConnectionError("refused".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let message = err.to_string();
            let resp = service_error("Test", err);
            assert_eq!(resp.status(), expected);

            let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(body, json!({ "success": false, "error": message }));
        }
    }
}
