//! # Database Models
//!
//! This module defines the data structures that map to database tables.
//! Each record struct represents a row; the nested blocks (metadata,
//! pricing, reputation, ...) live in `JSONB` columns and keep their
//! document shape on the wire.
//!
//! ## Table Overview
//!
//! | Table | Description |
//! |-------|-------------|
//! | `users` | Wallet profiles, sign-in nonce, reputation, preferences |
//! | `nfts` | Tokens keyed by `(contract_address, token_id, chain_id)` |
//! | `rentals` | Rental listings referencing an NFT |
//! | `loans` | Loan requests backed by NFT collateral |
//!
//! ## Relationship Diagram
//!
//! ```text
//! ┌─────────────┐       ┌──────────────────┐
//! │    nfts     │──────<│     rentals      │
//! │             │       │                  │
//! │ id (PK)     │       │ nft_id           │
//! │ owner       │       │ lender           │
//! │ rental{}    │       │ status           │
//! └─────────────┘       └──────────────────┘
//!
//! ┌─────────────┐       ┌──────────────────┐
//! │    users    │       │      loans       │
//! │             │       │                  │
//! │ wallet (UQ) │       │ borrower         │
//! │ nonce       │       │ collateral[]     │
//! └─────────────┘       └──────────────────┘
//! ```
//!
//! References between tables are plain values. Nothing enforces them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default rental status for new listings.
pub const RENTAL_STATUS_ACTIVE: &str = "active";

/// Default loan status for new requests.
pub const LOAN_STATUS_PENDING: &str = "pending";

fn default_currency() -> String {
    "ETH".to_string()
}

fn default_true() -> bool {
    true
}

// ============================================
// USERS
// ============================================

/// A marketplace user, keyed by wallet address.
///
/// Created on the first nonce request or profile fetch for an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,

    /// Lowercase `0x`-prefixed wallet address. Unique.
    pub wallet_address: String,

    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,

    /// Last issued sign-in nonce. Never sent back in profile responses.
    #[serde(skip_serializing)]
    pub nonce: Option<String>,

    #[serde(skip_serializing)]
    pub nonce_issued_at: Option<DateTime<Utc>>,

    pub reputation: Reputation,
    pub preferences: Preferences,

    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// A fresh profile with default reputation and preferences.
    pub fn new(wallet_address: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.to_string(),
            username: None,
            email: None,
            bio: None,
            avatar: None,
            nonce: None,
            nonce_issued_at: None,
            reputation: Reputation::default(),
            preferences: Preferences::default(),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Counters and ratings accumulated from completed rentals and loans.
///
/// Nothing in the service updates these yet; they are stored as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reputation {
    pub score: f64,
    pub total_rentals: i64,
    pub total_loans: i64,
    pub successful_transactions: i64,
    pub ratings_count: i64,
    pub average_rating: f64,
}

/// Notification and privacy flags. Everything is on by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_true")]
    pub email_notifications: bool,
    #[serde(default = "default_true")]
    pub push_notifications: bool,
    #[serde(default = "default_true")]
    pub public_profile: bool,
    #[serde(default = "default_true")]
    pub show_activity: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            public_profile: true,
            show_activity: true,
        }
    }
}

/// A partial `Preferences` update. Only the flags that are present are
/// serialized, so the JSON merges onto the stored block key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_profile: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_activity: Option<bool>,
}

impl PreferencesPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ============================================
// NFTS
// ============================================

/// An NFT document.
///
/// Identity is the `(contract_address, token_id, chain_id)` triple;
/// `id` is the surrogate key used in URLs and references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftRecord {
    pub id: Uuid,
    pub contract_address: String,

    /// Token ids can exceed 64 bits, so they are kept as decimal strings.
    pub token_id: String,

    pub chain_id: i64,
    pub owner: String,
    pub metadata: NftMetadata,
    pub collection: CollectionInfo,
    pub pricing: NftPricing,
    pub rental: NftRentalInfo,
    pub analytics: NftAnalytics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub attributes: Vec<NftAttribute>,
}

/// A single trait. Values are strings or numbers depending on the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftAttribute {
    pub trait_type: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionInfo {
    pub name: String,
    pub slug: Option<String>,
    pub verified: bool,
    pub floor_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftPricing {
    #[serde(default)]
    pub estimated_value: f64,
    #[serde(default)]
    pub last_sale_price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for NftPricing {
    fn default() -> Self {
        Self {
            estimated_value: 0.0,
            last_sale_price: None,
            currency: default_currency(),
        }
    }
}

/// Rental availability block embedded in an NFT.
///
/// `is_available` is written directly by whoever lists or rents the
/// token; it is not tied to the `rentals` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NftRentalInfo {
    pub is_available: bool,
    pub daily_price: Option<f64>,
    pub min_duration_days: i32,
    pub max_duration_days: i32,
    pub collateral_required: Option<f64>,
    pub current_renter: Option<String>,
    pub rental_ends_at: Option<DateTime<Utc>>,
}

impl Default for NftRentalInfo {
    fn default() -> Self {
        Self {
            is_available: false,
            daily_price: None,
            min_duration_days: 1,
            max_duration_days: 30,
            collateral_required: None,
            current_renter: None,
            rental_ends_at: None,
        }
    }
}

/// Static popularity figures. Seeded, never recalculated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NftAnalytics {
    pub views: i64,
    pub favorites: i64,
    pub total_rentals: i64,
    pub trending_score: f64,
    pub demand_score: f64,
}

// ============================================
// RENTALS
// ============================================

/// A rental listing for one NFT.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalRecord {
    pub id: Uuid,

    /// The listed NFT. May point at a document that no longer exists.
    pub nft_id: Uuid,

    pub lender: String,
    pub renter: Option<String>,
    pub pricing: RentalPricing,
    pub duration: RentalDuration,
    pub settings: RentalSettings,
    pub terms: RentalTerms,

    /// Free text: "active", "rented", "completed", "cancelled", ...
    pub status: String,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalPricing {
    pub daily_rate: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub collateral_amount: f64,
    #[serde(default = "default_platform_fee")]
    pub platform_fee_percent: f64,
}

fn default_platform_fee() -> f64 {
    2.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RentalDuration {
    pub min_days: i32,
    pub max_days: i32,
}

impl Default for RentalDuration {
    fn default() -> Self {
        Self { min_days: 1, max_days: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RentalSettings {
    pub auto_accept: bool,
    pub require_collateral: bool,
    pub allowed_uses: Vec<String>,
}

impl Default for RentalSettings {
    fn default() -> Self {
        Self {
            auto_accept: false,
            require_collateral: true,
            allowed_uses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RentalTerms {
    pub description: Option<String>,
    pub cancellation_policy: String,
    pub late_fee_percent: f64,
}

impl Default for RentalTerms {
    fn default() -> Self {
        Self {
            description: None,
            cancellation_policy: "flexible".to_string(),
            late_fee_percent: 10.0,
        }
    }
}

// ============================================
// LOANS
// ============================================

/// A loan request backed by one or more NFTs.
///
/// The numbers in `terms` are stored exactly as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: Uuid,
    pub borrower: String,
    pub lender: Option<String>,
    pub collateral: Vec<LoanCollateral>,
    pub terms: LoanTerms,

    /// Free text: "pending", "funded", "repaid", "defaulted", ...
    pub status: String,

    pub funded_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanCollateral {
    pub contract_address: String,
    pub token_id: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: i64,
    #[serde(default)]
    pub estimated_value: f64,
    #[serde(default)]
    pub nft_id: Option<Uuid>,
}

pub(crate) fn default_chain_id() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub principal: f64,
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default = "default_loan_days")]
    pub duration_days: i32,
    #[serde(default)]
    pub ltv: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_loan_days() -> i32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_defaults() {
        let user = UserRecord::new("0xabc");
        assert_eq!(user.reputation, Reputation::default());
        assert!(user.preferences.email_notifications);
        assert!(user.preferences.show_activity);
        assert!(user.nonce.is_none());
    }

    #[test]
    fn test_user_serialization_hides_nonce() {
        let mut user = UserRecord::new("0xabc");
        user.nonce = Some("secret".to_string());
        user.nonce_issued_at = Some(Utc::now());

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["walletAddress"], "0xabc");
        assert!(value.get("nonce").is_none());
        assert!(value.get("nonceIssuedAt").is_none());
        assert_eq!(value["preferences"]["publicProfile"], true);
    }

    #[test]
    fn test_empty_documents_take_defaults() {
        let rental: NftRentalInfo = serde_json::from_value(json!({})).unwrap();
        assert!(!rental.is_available);
        assert_eq!(rental.min_duration_days, 1);
        assert_eq!(rental.max_duration_days, 30);

        let prefs: Preferences = serde_json::from_value(json!({ "showActivity": false })).unwrap();
        assert!(prefs.email_notifications);
        assert!(!prefs.show_activity);

        let analytics: NftAnalytics = serde_json::from_value(json!({ "trendingScore": 87.5 })).unwrap();
        assert_eq!(analytics.trending_score, 87.5);
        assert_eq!(analytics.views, 0);
    }

    #[test]
    fn test_rental_blocks_defaults() {
        let pricing: RentalPricing = serde_json::from_value(json!({ "dailyRate": 0.05 })).unwrap();
        assert_eq!(pricing.currency, "ETH");
        assert_eq!(pricing.platform_fee_percent, 2.5);
        assert_eq!(pricing.collateral_amount, 0.0);

        let terms = RentalTerms::default();
        assert_eq!(terms.cancellation_policy, "flexible");
        assert_eq!(terms.late_fee_percent, 10.0);

        assert!(RentalSettings::default().require_collateral);
    }

    #[test]
    fn test_loan_blocks_defaults() {
        let collateral: LoanCollateral = serde_json::from_value(json!({
            "contractAddress": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d",
            "tokenId": "1234"
        }))
        .unwrap();
        assert_eq!(collateral.chain_id, 1);
        assert!(collateral.nft_id.is_none());

        let terms: LoanTerms = serde_json::from_value(json!({ "principal": 10.0, "ltv": 40.0 })).unwrap();
        assert_eq!(terms.duration_days, 30);
        assert_eq!(terms.ltv, 40.0);
        assert_eq!(terms.currency, "ETH");
    }

    #[test]
    fn test_nft_attribute_keeps_value_type() {
        let attr: NftAttribute =
            serde_json::from_value(json!({ "traitType": "Level", "value": 7 })).unwrap();
        assert_eq!(attr.value, json!(7));
    }

    #[test]
    fn test_preferences_patch_serializes_only_given_flags() {
        let patch: PreferencesPatch =
            serde_json::from_value(json!({ "pushNotifications": false })).unwrap();
        assert_eq!(patch.push_notifications, Some(false));
        assert!(patch.email_notifications.is_none());
        assert!(!patch.is_empty());

        // Unset flags must not reach the JSONB merge
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "pushNotifications": false }));

        let empty: PreferencesPatch = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({}));
    }
}
