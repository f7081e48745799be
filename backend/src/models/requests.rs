//! # API Request Models
//!
//! Structures for incoming API request bodies and query strings.
//! Each struct represents the expected JSON body or query for an endpoint.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{
    default_chain_id, CollectionInfo, LoanCollateral, LoanTerms, NftAnalytics, NftMetadata,
    NftPricing, NftRentalInfo, PreferencesPatch, RentalDuration, RentalPricing, RentalSettings,
    RentalTerms,
};

/// Upper bound on any page size.
pub const MAX_LIMIT: i64 = 100;

/// Page size used when the client doesn't send one.
pub const DEFAULT_LIMIT: i64 = 20;

/// Result count for `trending` when the client doesn't send one.
pub const DEFAULT_TRENDING_LIMIT: i64 = 10;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn default_trending_limit() -> i64 {
    DEFAULT_TRENDING_LIMIT
}

/// A resolved page window: 1-based page, clamped limit, row offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    /// Clamp raw values: `page >= 1`, `1 <= limit <= MAX_LIMIT`.
    pub fn new(page: i64, limit: i64) -> Self {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_LIMIT);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

/// Pagination query parameters.
///
/// ## Example URL
///
/// ```text
/// GET /api/nft/available?page=2&limit=12
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageQuery {
    /// 1-based page number. Default: 1
    #[serde(default = "default_page")]
    pub page: i64,

    /// Items per page. Default: 20, Max: 100
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl PageQuery {
    pub fn resolve(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Query for endpoints that only take a result count.
///
/// ```text
/// GET /api/nft/trending?limit=5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitQuery {
    /// Default: 10, Max: 100
    #[serde(default = "default_trending_limit")]
    pub limit: i64,
}

impl LimitQuery {
    pub fn resolve(&self) -> i64 {
        self.limit.clamp(1, MAX_LIMIT)
    }
}

/// Text search query.
///
/// ```text
/// GET /api/nft/search?q=guardian&page=1&limit=20
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Search term. Required; blank counts as missing.
    pub q: Option<String>,

    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl SearchQuery {
    /// The trimmed search term, if there is one.
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn resolve(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Request a sign-in nonce.
///
/// ## Example JSON
///
/// ```json
/// {
///     "walletAddress": "0x71c7656ec7ab88b098defb751b7401b5f6d8976f"
/// }
/// ```
///
/// The field is optional at the type level so a missing address gets
/// the API's own 400 message instead of a deserializer error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceRequest {
    pub wallet_address: Option<String>,
}

/// Partial profile update. Omitted fields keep their stored value,
/// including individual `preferences` flags.
///
/// ## Example JSON
///
/// ```json
/// {
///     "username": "pixelcollector",
///     "preferences": { "emailNotifications": false }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub preferences: Option<PreferencesPatch>,
}

/// Register an NFT.
///
/// ## Example JSON
///
/// ```json
/// {
///     "contractAddress": "0x2f1a6c1f6a1d3c2d7b1e8e5c9a0b4d3e2f1a6c1f",
///     "tokenId": "1042",
///     "chainId": 1,
///     "owner": "0x8ba1f109551bd432803012645ac136ddd64dba72",
///     "metadata": { "name": "Pixel Guardian #1042", "image": "https://..." },
///     "rental": { "isAvailable": true, "dailyPrice": 0.08 }
/// }
/// ```
///
/// Omitted blocks take their document defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNftRequest {
    pub contract_address: String,
    pub token_id: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: i64,
    pub owner: String,
    pub metadata: NftMetadata,
    #[serde(default)]
    pub collection: CollectionInfo,
    #[serde(default)]
    pub pricing: NftPricing,
    #[serde(default)]
    pub rental: NftRentalInfo,
    #[serde(default)]
    pub analytics: NftAnalytics,
}

/// List an NFT for rent.
///
/// ## Example JSON
///
/// ```json
/// {
///     "nftId": "550e8400-e29b-41d4-a716-446655440000",
///     "lender": "0x8ba1f109551bd432803012645ac136ddd64dba72",
///     "pricing": { "dailyRate": 0.05, "collateralAmount": 2.0 },
///     "duration": { "minDays": 1, "maxDays": 14 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalRequest {
    pub nft_id: Uuid,
    pub lender: String,
    pub pricing: RentalPricing,
    #[serde(default)]
    pub duration: RentalDuration,
    #[serde(default)]
    pub settings: RentalSettings,
    #[serde(default)]
    pub terms: RentalTerms,
}

/// Open a loan request.
///
/// ## Example JSON
///
/// ```json
/// {
///     "borrower": "0x71c7656ec7ab88b098defb751b7401b5f6d8976f",
///     "collateral": [
///         { "contractAddress": "0x2f1a...", "tokenId": "1042", "estimatedValue": 12.5 }
///     ],
///     "terms": { "principal": 5.0, "interestRate": 8.5, "durationDays": 30, "ltv": 40.0 }
/// }
/// ```
///
/// `terms` are stored as given; nothing is derived from the collateral.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub borrower: String,
    pub collateral: Vec<LoanCollateral>,
    pub terms: LoanTerms,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(1, 20), PageRequest { page: 1, limit: 20, offset: 0 });
        assert_eq!(PageRequest::new(3, 10), PageRequest { page: 3, limit: 10, offset: 20 });
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, limit: 1, offset: 0 });
        assert_eq!(PageRequest::new(-4, 5000).limit, MAX_LIMIT);
    }

    #[test]
    fn test_limit_query_clamps() {
        assert_eq!(LimitQuery { limit: 0 }.resolve(), 1);
        assert_eq!(LimitQuery { limit: 7 }.resolve(), 7);
        assert_eq!(LimitQuery { limit: 900 }.resolve(), MAX_LIMIT);
    }

    #[test]
    fn test_search_term_blank_is_missing() {
        let query = SearchQuery { q: Some("   ".to_string()), page: 1, limit: 20 };
        assert_eq!(query.term(), None);

        let query = SearchQuery { q: Some(" guardian ".to_string()), page: 1, limit: 20 };
        assert_eq!(query.term(), Some("guardian"));
    }

    #[test]
    fn test_nonce_request_missing_address() {
        let req: NonceRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.wallet_address.is_none());
    }

    #[test]
    fn test_create_nft_request_defaults() {
        let req: CreateNftRequest = serde_json::from_value(json!({
            "contractAddress": "0x2f1a6c1f6a1d3c2d7b1e8e5c9a0b4d3e2f1a6c1f",
            "tokenId": "1",
            "owner": "0x8ba1f109551bd432803012645ac136ddd64dba72",
            "metadata": { "name": "Solo" }
        }))
        .unwrap();

        assert_eq!(req.chain_id, 1);
        assert_eq!(req.pricing.currency, "ETH");
        assert!(!req.rental.is_available);
        assert_eq!(req.analytics.trending_score, 0.0);
    }

    #[test]
    fn test_profile_update_keeps_preferences_partial() {
        let req: UpdateProfileRequest = serde_json::from_value(json!({
            "username": "pixelcollector",
            "preferences": { "emailNotifications": false }
        }))
        .unwrap();

        let prefs = req.preferences.unwrap();
        assert_eq!(prefs.email_notifications, Some(false));
        assert_eq!(prefs.push_notifications, None);
        assert_eq!(prefs.show_activity, None);
    }
}
