//! # Auth Service
//!
//! Issues wallet sign-in challenges and manages wallet profiles.
//!
//! ## Flow: Sign-in Nonce
//!
//! ```text
//! 1. Client POSTs its wallet address to /api/auth/nonce
//!                ↓
//! 2. Address validated and lowercased
//!                ↓
//! 3. Random nonce generated and stored on the user (created if new)
//!                ↓
//! 4. Nonce, sign-in message and advertised expiry returned
//! ```
//!
//! The wallet signs the message client-side. This service never
//! verifies that signature and never checks the expiry.

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::db::{queries, Database, UserRecord};
use crate::models::{NonceResponse, UpdateProfileRequest};
use crate::utils;

use super::MarketplaceError;

/// Length of a generated nonce.
pub const NONCE_LENGTH: usize = 32;

/// Wallet authentication and profile service.
#[derive(Clone)]
pub struct AuthService {
    /// Database connection for user documents.
    db: Database,

    /// Advertised nonce lifetime.
    nonce_ttl: Duration,
}

impl AuthService {
    /// Create a new AuthService instance.
    pub fn new(db: Database, config: &AppConfig) -> Self {
        Self {
            db,
            nonce_ttl: Duration::minutes(config.nonce_ttl_minutes),
        }
    }

    /// Generate a random alphanumeric nonce.
    pub fn generate_nonce() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LENGTH)
            .map(char::from)
            .collect()
    }

    /// The human-readable message the wallet is asked to sign.
    pub fn sign_in_message(wallet_address: &str, nonce: &str, issued_at: DateTime<Utc>) -> String {
        format!(
            "Welcome to the NFT Rental Marketplace!\n\n\
             Sign this message to prove you own this wallet. \
             It does not send a transaction or cost any gas.\n\n\
             Wallet: {}\n\
             Nonce: {}\n\
             Issued At: {}",
            wallet_address,
            nonce,
            issued_at.to_rfc3339()
        )
    }

    /// Issue a sign-in nonce for a wallet.
    ///
    /// Creates the user on first contact; otherwise replaces the
    /// stored nonce.
    ///
    /// ## Returns
    ///
    /// * `Ok(NonceResponse)` - Nonce, message and advertised expiry
    /// * `Err(MarketplaceError::InvalidInput)` - Missing or malformed address
    pub async fn issue_nonce(
        &self,
        wallet_address: Option<&str>,
    ) -> Result<NonceResponse, MarketplaceError> {
        let raw = wallet_address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| MarketplaceError::InvalidInput("Wallet address is required".to_string()))?;

        let address = utils::normalize_address(raw).map_err(MarketplaceError::InvalidInput)?;

        let nonce = Self::generate_nonce();
        let issued_at = Utc::now();

        let user = queries::upsert_user_nonce(self.db.pool(), &address, &nonce, issued_at).await?;

        info!("Issued sign-in nonce for {}", utils::truncate_string(&user.wallet_address, 13));

        Ok(NonceResponse {
            message: Self::sign_in_message(&user.wallet_address, &nonce, issued_at),
            wallet_address: user.wallet_address,
            nonce,
            expires_at: issued_at + self.nonce_ttl,
        })
    }

    /// Fetch a wallet's profile, creating a default one on first fetch.
    pub async fn get_profile(&self, wallet_address: &str) -> Result<UserRecord, MarketplaceError> {
        let address = utils::normalize_address(wallet_address).map_err(MarketplaceError::InvalidInput)?;
        debug!("Profile request for: {}", address);

        if let Some(user) = queries::get_user_by_wallet(self.db.pool(), &address).await? {
            return Ok(user);
        }

        let user = queries::insert_user_if_missing(self.db.pool(), &UserRecord::new(&address)).await?;
        Ok(user)
    }

    /// Update profile fields and preferences.
    ///
    /// The user must already exist. Text fields are stored trimmed;
    /// preference flags left out of the patch keep their stored value.
    pub async fn update_profile(
        &self,
        wallet_address: &str,
        update: UpdateProfileRequest,
    ) -> Result<UserRecord, MarketplaceError> {
        let address = utils::normalize_address(wallet_address).map_err(MarketplaceError::InvalidInput)?;
        let update = clean_profile_update(update)?;

        queries::update_user_profile(
            self.db.pool(),
            &address,
            update.username.as_deref(),
            update.email.as_deref(),
            update.bio.as_deref(),
            update.avatar.as_deref(),
            update.preferences.as_ref().filter(|p| !p.is_empty()),
        )
        .await?
        .ok_or_else(|| MarketplaceError::NotFound("User".to_string()))
    }
}

/// Trim the text fields of a profile update, then check them.
fn clean_profile_update(
    mut update: UpdateProfileRequest,
) -> Result<UpdateProfileRequest, MarketplaceError> {
    for field in [&mut update.username, &mut update.email, &mut update.bio, &mut update.avatar] {
        if let Some(value) = field.as_mut() {
            *value = value.trim().to_string();
        }
    }

    if let Some(username) = &update.username {
        let len = username.chars().count();
        if !(3..=30).contains(&len) {
            return Err(MarketplaceError::InvalidInput(
                "Username must be between 3 and 30 characters".to_string(),
            ));
        }
    }
    if let Some(email) = &update.email {
        if !email.contains('@') {
            return Err(MarketplaceError::InvalidInput("Invalid email address".to_string()));
        }
    }
    if let Some(bio) = &update.bio {
        if bio.chars().count() > 500 {
            return Err(MarketplaceError::InvalidInput(
                "Bio must be at most 500 characters".to_string(),
            ));
        }
    }
    Ok(update)
}
