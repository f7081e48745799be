//! # API Response Models
//!
//! Structures for outgoing API response bodies.
//! All responses are wrapped in a standard format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{LoanRecord, NftRecord, RentalRecord};

/// Standard API response wrapper.
///
/// ## Success Response
///
/// ```json
/// {
///     "success": true,
///     "data": { ... }
/// }
/// ```
///
/// ## Error Response
///
/// ```json
/// {
///     "success": false,
///     "error": "NFT not found"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response data (omitted on error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Error message (omitted on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

/// Pagination block attached to every paged list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    /// `pages` is `ceil(total / limit)`; an empty result has 0 pages.
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 && total > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self { page, limit, total, pages }
    }
}

/// Returned by `GET /api/nft/available` and `GET /api/nft/search`.
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "nfts": [ ... ],
///         "pagination": { "page": 1, "limit": 20, "total": 42, "pages": 3 }
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftListResponse {
    pub nfts: Vec<NftRecord>,
    pub pagination: Pagination,
}

/// Returned by `GET /api/nft/trending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingNftsResponse {
    pub nfts: Vec<NftRecord>,
}

/// Returned by `GET /api/rental/available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalListResponse {
    pub rentals: Vec<RentalRecord>,
    pub pagination: Pagination,
}

/// Returned by `GET /api/rental/:id`: the listing plus its NFT.
///
/// `nft` is `null` when the referenced document is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalDetailResponse {
    #[serde(flatten)]
    pub rental: RentalRecord,
    pub nft: Option<NftRecord>,
}

/// Returned by `GET /api/lending/requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanListResponse {
    pub requests: Vec<LoanRecord>,
    pub pagination: Pagination,
}

/// Returned by `POST /api/auth/nonce`.
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "walletAddress": "0x71c7...",
///         "nonce": "q8Xc2...",
///         "message": "Welcome to the NFT Rental Marketplace! ...",
///         "expiresAt": "2026-01-15T12:15:00Z"
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceResponse {
    pub wallet_address: String,
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Returned by `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub users: i64,
    pub nfts: i64,
    pub available_nfts: i64,
    pub active_rentals: i64,
    pub pending_loans: i64,
    pub timestamp: DateTime<Utc>,
}

/// Returned by `GET /api/db/test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTestResponse {
    pub connected: bool,
    pub latency_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Health check response.
///
/// Not wrapped in `data`; clients read `message` at the top level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,

    /// Human-readable status line.
    pub message: String,

    /// Which service answered: "api", "nft", "auth", ...
    pub service: String,

    pub environment: String,

    /// Service version.
    pub version: String,

    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_pages() {
        assert_eq!(Pagination::new(1, 20, 0).pages, 0);
        assert_eq!(Pagination::new(1, 20, 1).pages, 1);
        assert_eq!(Pagination::new(1, 20, 20).pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).pages, 2);
        assert_eq!(Pagination::new(2, 7, 50).pages, 8);
    }

    #[test]
    fn test_error_response_shape() {
        let value = serde_json::to_value(ApiResponse::<()>::error("NFT not found")).unwrap();
        assert_eq!(value, serde_json::json!({ "success": false, "error": "NFT not found" }));
    }

    #[test]
    fn test_nft_list_shape() {
        let response = ApiResponse::success(NftListResponse {
            nfts: Vec::new(),
            pagination: Pagination::new(1, 20, 0),
        });

        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["success"], true);
        assert!(value["data"]["nfts"].as_array().unwrap().is_empty());
        assert_eq!(value["data"]["pagination"]["page"], 1);
        assert_eq!(value["data"]["pagination"]["limit"], 20);
        assert_eq!(value["data"]["pagination"]["total"], 0);
        assert_eq!(value["data"]["pagination"]["pages"], 0);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_rental_detail_flattens_listing_and_nulls_missing_nft() {
        use crate::db::models::{RentalDuration, RentalPricing, RentalSettings, RentalTerms};
        use uuid::Uuid;

        let nft_id = Uuid::new_v4();
        let now = Utc::now();
        let rental = RentalRecord {
            id: Uuid::new_v4(),
            nft_id,
            lender: "0x8ba1f109551bd432803012645ac136ddd64dba72".to_string(),
            renter: None,
            pricing: RentalPricing {
                daily_rate: 0.05,
                currency: "ETH".to_string(),
                collateral_amount: 1.0,
                platform_fee_percent: 2.5,
            },
            duration: RentalDuration::default(),
            settings: RentalSettings::default(),
            terms: RentalTerms::default(),
            status: "active".to_string(),
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(RentalDetailResponse { rental, nft: None }).unwrap();
        assert_eq!(value["nftId"], nft_id.to_string());
        assert_eq!(value["status"], "active");
        assert_eq!(value["pricing"]["dailyRate"], 0.05);
        assert!(value.get("rental").is_none());
        assert_eq!(value["nft"], serde_json::Value::Null);
        assert!(value.as_object().unwrap().contains_key("nft"));
    }
}
