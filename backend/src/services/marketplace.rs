//! # Marketplace Service
//!
//! Reads and writes the NFT, rental and loan documents behind the
//! listing endpoints.
//!
//! Every list is a filtered, paginated read. Scores, collateral values
//! and loan terms are returned exactly as stored; nothing here derives
//! or enforces them.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{
    queries, Database, LoanRecord, NftRecord, RentalRecord, LOAN_STATUS_PENDING,
    RENTAL_STATUS_ACTIVE,
};
use crate::models::{
    CreateLoanRequest, CreateNftRequest, CreateRentalRequest, LoanListResponse, NftListResponse,
    PageRequest, Pagination, RentalDetailResponse, RentalListResponse, StatsResponse,
};
use crate::utils;

use super::MarketplaceError;

/// Service for the marketplace documents.
#[derive(Clone)]
pub struct MarketplaceService {
    /// Database connection.
    db: Database,
}

impl MarketplaceService {
    /// Create a new MarketplaceService instance.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ==========================================
    // NFTS
    // ==========================================

    /// NFTs flagged available for rent, in insertion order.
    pub async fn available_nfts(&self, page: PageRequest) -> Result<NftListResponse, MarketplaceError> {
        let pool = self.db.pool();

        let (nfts, total) = tokio::try_join!(
            queries::list_available_nfts(pool, page.limit, page.offset),
            queries::count_available_nfts(pool),
        )?;

        Ok(NftListResponse {
            nfts,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    /// Top NFTs by stored trending score.
    pub async fn trending_nfts(&self, limit: i64) -> Result<Vec<NftRecord>, MarketplaceError> {
        Ok(queries::list_trending_nfts(self.db.pool(), limit).await?)
    }

    /// Case-insensitive search on name, description and collection.
    pub async fn search_nfts(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<NftListResponse, MarketplaceError> {
        let pattern = utils::contains_pattern(term);
        let pool = self.db.pool();
        debug!("NFT search: {:?}", term);

        let (nfts, total) = tokio::try_join!(
            queries::search_nfts(pool, &pattern, page.limit, page.offset),
            queries::count_search_nfts(pool, &pattern),
        )?;

        Ok(NftListResponse {
            nfts,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    pub async fn get_nft(&self, id: Uuid) -> Result<NftRecord, MarketplaceError> {
        queries::get_nft_by_id(self.db.pool(), id)
            .await?
            .ok_or_else(|| MarketplaceError::NotFound("NFT".to_string()))
    }

    /// Register an NFT. Fails with `Conflict` if the
    /// `(contract, token, chain)` triple is taken.
    pub async fn create_nft(&self, request: CreateNftRequest) -> Result<NftRecord, MarketplaceError> {
        let nft = build_nft(request)?;
        queries::create_nft(self.db.pool(), &nft).await?;

        info!("NFT registered: {} ({})", nft.metadata.name, nft.id);
        Ok(nft)
    }

    // ==========================================
    // RENTALS
    // ==========================================

    /// Rentals whose status is `active`.
    pub async fn available_rentals(
        &self,
        page: PageRequest,
    ) -> Result<RentalListResponse, MarketplaceError> {
        let pool = self.db.pool();

        let (rentals, total) = tokio::try_join!(
            queries::list_rentals_by_status(pool, RENTAL_STATUS_ACTIVE, page.limit, page.offset),
            queries::count_rentals_by_status(pool, RENTAL_STATUS_ACTIVE),
        )?;

        Ok(RentalListResponse {
            rentals,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    /// A rental listing with its NFT attached.
    pub async fn get_rental(&self, id: Uuid) -> Result<RentalDetailResponse, MarketplaceError> {
        let rental = queries::get_rental_by_id(self.db.pool(), id)
            .await?
            .ok_or_else(|| MarketplaceError::NotFound("Rental".to_string()))?;

        let nft = queries::get_nft_by_id(self.db.pool(), rental.nft_id).await?;
        if nft.is_none() {
            debug!("Rental {} references missing NFT {}", rental.id, rental.nft_id);
        }

        Ok(RentalDetailResponse { rental, nft })
    }

    /// List an NFT for rent.
    ///
    /// The NFT must exist. Its `rental.isAvailable` flag is left as is.
    pub async fn create_rental(
        &self,
        request: CreateRentalRequest,
    ) -> Result<RentalRecord, MarketplaceError> {
        let rental = build_rental(request)?;

        if queries::get_nft_by_id(self.db.pool(), rental.nft_id).await?.is_none() {
            return Err(MarketplaceError::NotFound("NFT".to_string()));
        }

        queries::create_rental(self.db.pool(), &rental).await?;

        info!("Rental listed: {} for NFT {}", rental.id, rental.nft_id);
        Ok(rental)
    }

    // ==========================================
    // LOANS
    // ==========================================

    /// Loan requests whose status is `pending`.
    pub async fn loan_requests(&self, page: PageRequest) -> Result<LoanListResponse, MarketplaceError> {
        let pool = self.db.pool();

        let (requests, total) = tokio::try_join!(
            queries::list_loans_by_status(pool, LOAN_STATUS_PENDING, page.limit, page.offset),
            queries::count_loans_by_status(pool, LOAN_STATUS_PENDING),
        )?;

        Ok(LoanListResponse {
            requests,
            pagination: Pagination::new(page.page, page.limit, total),
        })
    }

    pub async fn get_loan(&self, id: Uuid) -> Result<LoanRecord, MarketplaceError> {
        queries::get_loan_by_id(self.db.pool(), id)
            .await?
            .ok_or_else(|| MarketplaceError::NotFound("Loan".to_string()))
    }

    /// Open a loan request with the terms exactly as submitted.
    pub async fn create_loan(&self, request: CreateLoanRequest) -> Result<LoanRecord, MarketplaceError> {
        let loan = build_loan(request)?;
        queries::create_loan(self.db.pool(), &loan).await?;

        info!(
            "Loan requested: {} by {} ({} {})",
            loan.id,
            utils::truncate_string(&loan.borrower, 13),
            loan.terms.principal,
            loan.terms.currency
        );
        Ok(loan)
    }

    // ==========================================
    // STATS
    // ==========================================

    /// Document counts across the marketplace.
    pub async fn stats(&self) -> Result<StatsResponse, MarketplaceError> {
        let pool = self.db.pool();

        let (users, nfts, available_nfts, active_rentals, pending_loans) = tokio::try_join!(
            queries::count_users(pool),
            queries::count_nfts(pool),
            queries::count_available_nfts(pool),
            queries::count_rentals_by_status(pool, RENTAL_STATUS_ACTIVE),
            queries::count_loans_by_status(pool, LOAN_STATUS_PENDING),
        )?;

        Ok(StatsResponse {
            users,
            nfts,
            available_nfts,
            active_rentals,
            pending_loans,
            timestamp: Utc::now(),
        })
    }
}

// ============================================
// DOCUMENT BUILDERS
// ============================================

fn invalid(message: impl Into<String>) -> MarketplaceError {
    MarketplaceError::InvalidInput(message.into())
}

/// Validate a create request and build the NFT document.
fn build_nft(request: CreateNftRequest) -> Result<NftRecord, MarketplaceError> {
    let contract_address = utils::normalize_address(&request.contract_address).map_err(invalid)?;
    let owner = utils::normalize_address(&request.owner).map_err(invalid)?;

    let token_id = request.token_id.trim().to_string();
    if token_id.is_empty() || !token_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("Token id must be a non-negative integer"));
    }
    if request.chain_id <= 0 {
        return Err(invalid("Chain id must be positive"));
    }
    if request.metadata.name.trim().is_empty() {
        return Err(invalid("NFT name is required"));
    }
    if let Some(price) = request.rental.daily_price {
        if price < 0.0 {
            return Err(invalid("Daily price cannot be negative"));
        }
    }

    let now = Utc::now();
    Ok(NftRecord {
        id: Uuid::new_v4(),
        contract_address,
        token_id,
        chain_id: request.chain_id,
        owner,
        metadata: request.metadata,
        collection: request.collection,
        pricing: request.pricing,
        rental: request.rental,
        analytics: request.analytics,
        created_at: now,
        updated_at: now,
    })
}

/// Validate a create request and build the rental document.
fn build_rental(request: CreateRentalRequest) -> Result<RentalRecord, MarketplaceError> {
    let lender = utils::normalize_address(&request.lender).map_err(invalid)?;

    if !(request.pricing.daily_rate > 0.0) {
        return Err(invalid("Daily rate must be greater than 0"));
    }
    if request.pricing.collateral_amount < 0.0 {
        return Err(invalid("Collateral amount cannot be negative"));
    }
    if request.duration.min_days < 1 {
        return Err(invalid("Minimum duration must be at least 1 day"));
    }
    if request.duration.min_days > request.duration.max_days {
        return Err(invalid("Minimum duration cannot exceed maximum duration"));
    }

    let now = Utc::now();
    Ok(RentalRecord {
        id: Uuid::new_v4(),
        nft_id: request.nft_id,
        lender,
        renter: None,
        pricing: request.pricing,
        duration: request.duration,
        settings: request.settings,
        terms: request.terms,
        status: RENTAL_STATUS_ACTIVE.to_string(),
        start_date: None,
        end_date: None,
        created_at: now,
        updated_at: now,
    })
}

/// Validate a create request and build the loan document.
fn build_loan(request: CreateLoanRequest) -> Result<LoanRecord, MarketplaceError> {
    let borrower = utils::normalize_address(&request.borrower).map_err(invalid)?;

    if request.collateral.is_empty() {
        return Err(invalid("At least one collateral NFT is required"));
    }
    if !(request.terms.principal > 0.0) {
        return Err(invalid("Principal must be greater than 0"));
    }
    if request.terms.duration_days < 1 {
        return Err(invalid("Loan duration must be at least 1 day"));
    }

    let mut collateral = request.collateral;
    for item in &mut collateral {
        item.contract_address = utils::normalize_address(&item.contract_address).map_err(invalid)?;
    }

    let now = Utc::now();
    Ok(LoanRecord {
        id: Uuid::new_v4(),
        borrower,
        lender: None,
        collateral,
        terms: request.terms,
        status: LOAN_STATUS_PENDING.to_string(),
        funded_at: None,
        due_date: None,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LENDER: &str = "0x8BA1f109551bD432803012645Ac136ddd64DBA72";
    const CONTRACT: &str = "0x2f1a6c1f6a1d3c2d7b1e8e5c9a0b4d3e2f1a6c1f";

    fn nft_request() -> CreateNftRequest {
        serde_json::from_value(json!({
            "contractAddress": CONTRACT,
            "tokenId": "1042",
            "owner": LENDER,
            "metadata": { "name": "Pixel Guardian #1042" },
            "rental": { "isAvailable": true, "dailyPrice": 0.08 }
        }))
        .unwrap()
    }

    fn rental_request() -> CreateRentalRequest {
        serde_json::from_value(json!({
            "nftId": Uuid::new_v4(),
            "lender": LENDER,
            "pricing": { "dailyRate": 0.05 }
        }))
        .unwrap()
    }

    fn loan_request() -> CreateLoanRequest {
        serde_json::from_value(json!({
            "borrower": LENDER,
            "collateral": [{ "contractAddress": CONTRACT, "tokenId": "1042", "estimatedValue": 12.5 }],
            "terms": { "principal": 5.0, "interestRate": 8.5, "durationDays": 30, "ltv": 40.0 }
        }))
        .unwrap()
    }

    #[test]
    fn test_build_nft_normalizes_addresses() {
        let nft = build_nft(nft_request()).unwrap();
        assert_eq!(nft.owner, LENDER.to_ascii_lowercase());
        assert_eq!(nft.contract_address, CONTRACT);
        assert_eq!(nft.chain_id, 1);
        assert!(nft.rental.is_available);
        assert_eq!(nft.created_at, nft.updated_at);
    }

    #[test]
    fn test_build_nft_rejects_bad_input() {
        let mut request = nft_request();
        request.token_id = "abc".to_string();
        assert!(matches!(build_nft(request), Err(MarketplaceError::InvalidInput(_))));

        let mut request = nft_request();
        request.metadata.name = "  ".to_string();
        assert!(build_nft(request).is_err());

        let mut request = nft_request();
        request.owner = "nobody".to_string();
        assert!(build_nft(request).is_err());

        let mut request = nft_request();
        request.chain_id = 0;
        assert!(build_nft(request).is_err());
    }

    #[test]
    fn test_build_rental_applies_defaults() {
        let rental = build_rental(rental_request()).unwrap();
        assert_eq!(rental.status, RENTAL_STATUS_ACTIVE);
        assert_eq!(rental.duration.min_days, 1);
        assert_eq!(rental.duration.max_days, 30);
        assert_eq!(rental.terms.cancellation_policy, "flexible");
        assert!(rental.renter.is_none());
    }

    #[test]
    fn test_build_rental_validation() {
        let mut request = rental_request();
        request.pricing.daily_rate = 0.0;
        assert!(build_rental(request).is_err());

        let mut request = rental_request();
        request.duration.min_days = 10;
        request.duration.max_days = 5;
        let err = build_rental(request).unwrap_err();
        assert_eq!(err.to_string(), "Minimum duration cannot exceed maximum duration");
    }

    #[test]
    fn test_build_loan_keeps_terms_verbatim() {
        let loan = build_loan(loan_request()).unwrap();
        assert_eq!(loan.status, LOAN_STATUS_PENDING);
        assert_eq!(loan.terms.principal, 5.0);
        assert_eq!(loan.terms.ltv, 40.0);
        assert_eq!(loan.collateral.len(), 1);
        assert!(loan.lender.is_none());
    }

    #[test]
    fn test_build_loan_validation() {
        let mut request = loan_request();
        request.collateral.clear();
        assert_eq!(
            build_loan(request).unwrap_err().to_string(),
            "At least one collateral NFT is required"
        );

        let mut request = loan_request();
        request.terms.principal = -1.0;
        assert!(build_loan(request).is_err());

        let mut request = loan_request();
        request.collateral[0].contract_address = "0xnope".to_string();
        assert!(build_loan(request).is_err());
    }
}
