//! # Database Queries
//!
//! This module contains all the SQL queries for interacting with the database.
//! Each function performs a specific database operation.
//!
//! ## Query Organization
//!
//! Queries are grouped by the table they operate on:
//! - `user_*` / `*_user` - Users table operations
//! - `*_nft*` - NFT table operations
//! - `*_rental*` - Rental table operations
//! - `*_loan*` - Loan table operations
//!
//! ## Error Handling
//!
//! All queries return `Result<T, DatabaseError>`. Lookups by key return
//! `Ok(None)` when nothing matches; inserts that hit a unique key return
//! `DatabaseError::Duplicate`.
//!
//! The `insert_*` functions take any `GenericClient` so the seeder can run
//! them inside one transaction; the `create_*` wrappers take the pool.

use chrono::{DateTime, Utc};
use deadpool_postgres::{Client, GenericClient, Pool};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::Json;
use tokio_postgres::Row;
use tracing::{debug, info};
use uuid::Uuid;

use super::models::*;
use super::DatabaseError;

const USER_COLUMNS: &str = "id, wallet_address, username, email, bio, avatar, \
    nonce, nonce_issued_at, reputation, preferences, last_login, created_at, updated_at";

const NFT_COLUMNS: &str = "id, contract_address, token_id, chain_id, owner, \
    metadata, collection, pricing, rental, analytics, created_at, updated_at";

const RENTAL_COLUMNS: &str = "id, nft_id, lender, renter, pricing, duration, settings, \
    terms, status, start_date, end_date, created_at, updated_at";

const LOAN_COLUMNS: &str = "id, borrower, lender, collateral, terms, status, \
    funded_at, due_date, created_at, updated_at";

const NFT_AVAILABLE: &str = "(rental->>'isAvailable')::boolean = TRUE";

const NFT_SEARCH: &str = "(metadata->>'name' ILIKE $1 \
    OR metadata->>'description' ILIKE $1 \
    OR collection->>'name' ILIKE $1)";

// ============================================
// HELPER FUNCTIONS
// ============================================

pub(super) async fn client(pool: &Pool) -> Result<Client, DatabaseError> {
    pool.get().await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))
}

/// Map a unique-key violation to `Duplicate`, anything else to `QueryError`.
fn insert_error(e: tokio_postgres::Error, what: String) -> DatabaseError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        DatabaseError::Duplicate(what)
    } else {
        DatabaseError::QueryError(e)
    }
}

/// Helper to convert a database row to UserRecord
fn row_to_user(row: &Row) -> Result<UserRecord, DatabaseError> {
    let reputation: Json<Reputation> = row.try_get("reputation")?;
    let preferences: Json<Preferences> = row.try_get("preferences")?;

    Ok(UserRecord {
        id: row.try_get("id")?,
        wallet_address: row.try_get("wallet_address")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        bio: row.try_get("bio")?,
        avatar: row.try_get("avatar")?,
        nonce: row.try_get("nonce")?,
        nonce_issued_at: row.try_get("nonce_issued_at")?,
        reputation: reputation.0,
        preferences: preferences.0,
        last_login: row.try_get("last_login")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Helper to convert a database row to NftRecord
fn row_to_nft(row: &Row) -> Result<NftRecord, DatabaseError> {
    let metadata: Json<NftMetadata> = row.try_get("metadata")?;
    let collection: Json<CollectionInfo> = row.try_get("collection")?;
    let pricing: Json<NftPricing> = row.try_get("pricing")?;
    let rental: Json<NftRentalInfo> = row.try_get("rental")?;
    let analytics: Json<NftAnalytics> = row.try_get("analytics")?;

    Ok(NftRecord {
        id: row.try_get("id")?,
        contract_address: row.try_get("contract_address")?,
        token_id: row.try_get("token_id")?,
        chain_id: row.try_get("chain_id")?,
        owner: row.try_get("owner")?,
        metadata: metadata.0,
        collection: collection.0,
        pricing: pricing.0,
        rental: rental.0,
        analytics: analytics.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Helper to convert a database row to RentalRecord
fn row_to_rental(row: &Row) -> Result<RentalRecord, DatabaseError> {
    let pricing: Json<RentalPricing> = row.try_get("pricing")?;
    let duration: Json<RentalDuration> = row.try_get("duration")?;
    let settings: Json<RentalSettings> = row.try_get("settings")?;
    let terms: Json<RentalTerms> = row.try_get("terms")?;

    Ok(RentalRecord {
        id: row.try_get("id")?,
        nft_id: row.try_get("nft_id")?,
        lender: row.try_get("lender")?,
        renter: row.try_get("renter")?,
        pricing: pricing.0,
        duration: duration.0,
        settings: settings.0,
        terms: terms.0,
        status: row.try_get("status")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Helper to convert a database row to LoanRecord
fn row_to_loan(row: &Row) -> Result<LoanRecord, DatabaseError> {
    let collateral: Json<Vec<LoanCollateral>> = row.try_get("collateral")?;
    let terms: Json<LoanTerms> = row.try_get("terms")?;

    Ok(LoanRecord {
        id: row.try_get("id")?,
        borrower: row.try_get("borrower")?,
        lender: row.try_get("lender")?,
        collateral: collateral.0,
        terms: terms.0,
        status: row.try_get("status")?,
        funded_at: row.try_get("funded_at")?,
        due_date: row.try_get("due_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn collect<T>(
    rows: Vec<Row>,
    map: fn(&Row) -> Result<T, DatabaseError>,
) -> Result<Vec<T>, DatabaseError> {
    rows.iter().map(map).collect()
}

// ============================================
// USER QUERIES
// ============================================

/// Get a user by wallet address.
pub async fn get_user_by_wallet(
    pool: &Pool,
    wallet_address: &str,
) -> Result<Option<UserRecord>, DatabaseError> {
    debug!("Fetching user: {}", wallet_address);

    let client = client(pool).await?;
    let sql = format!("SELECT {} FROM users WHERE wallet_address = $1", USER_COLUMNS);
    let row = client.query_opt(sql.as_str(), &[&wallet_address]).await?;

    row.as_ref().map(row_to_user).transpose()
}

/// Insert a user unless the wallet address is already known.
///
/// Returns the stored row either way.
pub async fn insert_user_if_missing(
    pool: &Pool,
    user: &UserRecord,
) -> Result<UserRecord, DatabaseError> {
    let client = client(pool).await?;

    if insert_user(&client, user).await? {
        info!("User created: {}", user.wallet_address);
    }

    let sql = format!("SELECT {} FROM users WHERE wallet_address = $1", USER_COLUMNS);
    let row = client.query_one(sql.as_str(), &[&user.wallet_address]).await?;
    row_to_user(&row)
}

/// Insert a user row, leaving an existing wallet untouched.
///
/// Returns `true` if a row was written.
pub async fn insert_user<C: GenericClient>(
    client: &C,
    user: &UserRecord,
) -> Result<bool, DatabaseError> {
    let inserted = client.execute(
        r#"
        INSERT INTO users (
            id, wallet_address, reputation, preferences, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (wallet_address) DO NOTHING
        "#,
        &[
            &user.id,
            &user.wallet_address,
            &Json(&user.reputation),
            &Json(&user.preferences),
            &user.created_at,
            &user.updated_at,
        ],
    ).await?;

    Ok(inserted > 0)
}

/// Store a fresh sign-in nonce, creating the user on first contact.
pub async fn upsert_user_nonce(
    pool: &Pool,
    wallet_address: &str,
    nonce: &str,
    issued_at: DateTime<Utc>,
) -> Result<UserRecord, DatabaseError> {
    debug!("Storing nonce for: {}", wallet_address);

    let client = client(pool).await?;
    let fresh = UserRecord::new(wallet_address);

    let sql = format!(
        r#"
        INSERT INTO users (
            id, wallet_address, nonce, nonce_issued_at,
            reputation, preferences, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $4, $4)
        ON CONFLICT (wallet_address) DO UPDATE SET
            nonce = EXCLUDED.nonce,
            nonce_issued_at = EXCLUDED.nonce_issued_at,
            updated_at = EXCLUDED.updated_at
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    let row = client.query_one(
        sql.as_str(),
        &[
            &fresh.id,
            &wallet_address,
            &nonce,
            &issued_at,
            &Json(&fresh.reputation),
            &Json(&fresh.preferences),
        ],
    ).await?;

    row_to_user(&row)
}

/// Partially update a user's profile.
///
/// `None` fields keep their stored value. `preferences` is merged into
/// the stored block key by key, so flags the patch leaves out survive.
pub async fn update_user_profile(
    pool: &Pool,
    wallet_address: &str,
    username: Option<&str>,
    email: Option<&str>,
    bio: Option<&str>,
    avatar: Option<&str>,
    preferences: Option<&PreferencesPatch>,
) -> Result<Option<UserRecord>, DatabaseError> {
    debug!("Updating profile for: {}", wallet_address);

    let client = client(pool).await?;
    let sql = format!(
        r#"
        UPDATE users
        SET
            username = COALESCE($2, username),
            email = COALESCE($3, email),
            bio = COALESCE($4, bio),
            avatar = COALESCE($5, avatar),
            preferences = preferences || COALESCE($6::jsonb, '{{}}'::jsonb),
            updated_at = NOW()
        WHERE wallet_address = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    let row = client.query_opt(
        sql.as_str(),
        &[
            &wallet_address,
            &username,
            &email,
            &bio,
            &avatar,
            &preferences.map(Json),
        ],
    ).await?;

    row.as_ref().map(row_to_user).transpose()
}

/// Count all users.
pub async fn count_users(pool: &Pool) -> Result<i64, DatabaseError> {
    let client = client(pool).await?;
    let row = client.query_one("SELECT COUNT(*) AS count FROM users", &[]).await?;
    Ok(row.try_get("count")?)
}

// ============================================
// NFT QUERIES
// ============================================

/// Get an NFT by id.
pub async fn get_nft_by_id(
    pool: &Pool,
    id: Uuid,
) -> Result<Option<NftRecord>, DatabaseError> {
    debug!("Fetching NFT: {}", id);

    let client = client(pool).await?;
    let sql = format!("SELECT {} FROM nfts WHERE id = $1", NFT_COLUMNS);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    row.as_ref().map(row_to_nft).transpose()
}

/// List NFTs flagged available for rent, in insertion order.
pub async fn list_available_nfts(
    pool: &Pool,
    limit: i64,
    offset: i64,
) -> Result<Vec<NftRecord>, DatabaseError> {
    debug!("Fetching available NFTs (limit: {}, offset: {})", limit, offset);

    let client = client(pool).await?;
    let sql = format!(
        "SELECT {} FROM nfts WHERE {} ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
        NFT_COLUMNS, NFT_AVAILABLE
    );
    let rows = client.query(sql.as_str(), &[&limit, &offset]).await?;

    collect(rows, row_to_nft)
}

/// Count NFTs flagged available for rent.
pub async fn count_available_nfts(pool: &Pool) -> Result<i64, DatabaseError> {
    let client = client(pool).await?;
    let sql = format!("SELECT COUNT(*) AS count FROM nfts WHERE {}", NFT_AVAILABLE);
    let row = client.query_one(sql.as_str(), &[]).await?;
    Ok(row.try_get("count")?)
}

/// List NFTs ordered by their stored trending score.
pub async fn list_trending_nfts(
    pool: &Pool,
    limit: i64,
) -> Result<Vec<NftRecord>, DatabaseError> {
    debug!("Fetching trending NFTs (limit: {})", limit);

    let client = client(pool).await?;
    let sql = format!(
        r#"
        SELECT {} FROM nfts
        ORDER BY COALESCE((analytics->>'trendingScore')::double precision, 0) DESC,
                 created_at ASC
        LIMIT $1
        "#,
        NFT_COLUMNS
    );
    let rows = client.query(sql.as_str(), &[&limit]).await?;

    collect(rows, row_to_nft)
}

/// Case-insensitive match on name, description and collection name.
///
/// `pattern` is an `ILIKE` pattern; callers escape user input first.
pub async fn search_nfts(
    pool: &Pool,
    pattern: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<NftRecord>, DatabaseError> {
    debug!("Searching NFTs: {} (limit: {}, offset: {})", pattern, limit, offset);

    let client = client(pool).await?;
    let sql = format!(
        "SELECT {} FROM nfts WHERE {} ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3",
        NFT_COLUMNS, NFT_SEARCH
    );
    let rows = client.query(sql.as_str(), &[&pattern, &limit, &offset]).await?;

    collect(rows, row_to_nft)
}

/// Count the matches of a search pattern.
pub async fn count_search_nfts(pool: &Pool, pattern: &str) -> Result<i64, DatabaseError> {
    let client = client(pool).await?;
    let sql = format!("SELECT COUNT(*) AS count FROM nfts WHERE {}", NFT_SEARCH);
    let row = client.query_one(sql.as_str(), &[&pattern]).await?;
    Ok(row.try_get("count")?)
}

/// Count all NFTs.
pub async fn count_nfts(pool: &Pool) -> Result<i64, DatabaseError> {
    let client = client(pool).await?;
    let row = client.query_one("SELECT COUNT(*) AS count FROM nfts", &[]).await?;
    Ok(row.try_get("count")?)
}

/// Insert a new NFT.
pub async fn create_nft(pool: &Pool, nft: &NftRecord) -> Result<Uuid, DatabaseError> {
    let client = client(pool).await?;
    insert_nft(&client, nft).await
}

pub async fn insert_nft<C: GenericClient>(client: &C, nft: &NftRecord) -> Result<Uuid, DatabaseError> {
    debug!(
        "Creating NFT: {}#{} on chain {}",
        nft.contract_address, nft.token_id, nft.chain_id
    );

    client.execute(
        r#"
        INSERT INTO nfts (
            id, contract_address, token_id, chain_id, owner,
            metadata, collection, pricing, rental, analytics,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
        &[
            &nft.id,
            &nft.contract_address,
            &nft.token_id,
            &nft.chain_id,
            &nft.owner,
            &Json(&nft.metadata),
            &Json(&nft.collection),
            &Json(&nft.pricing),
            &Json(&nft.rental),
            &Json(&nft.analytics),
            &nft.created_at,
            &nft.updated_at,
        ],
    ).await
    .map_err(|e| insert_error(e, format!(
        "NFT {}#{} on chain {} already exists",
        nft.contract_address, nft.token_id, nft.chain_id
    )))?;

    info!("NFT created: {}", nft.id);
    Ok(nft.id)
}

// ============================================
// RENTAL QUERIES
// ============================================

/// Get a rental listing by id.
pub async fn get_rental_by_id(
    pool: &Pool,
    id: Uuid,
) -> Result<Option<RentalRecord>, DatabaseError> {
    debug!("Fetching rental: {}", id);

    let client = client(pool).await?;
    let sql = format!("SELECT {} FROM rentals WHERE id = $1", RENTAL_COLUMNS);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    row.as_ref().map(row_to_rental).transpose()
}

/// List rentals with the given status, in insertion order.
pub async fn list_rentals_by_status(
    pool: &Pool,
    status: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<RentalRecord>, DatabaseError> {
    debug!("Fetching {} rentals (limit: {}, offset: {})", status, limit, offset);

    let client = client(pool).await?;
    let sql = format!(
        "SELECT {} FROM rentals WHERE status = $1 ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3",
        RENTAL_COLUMNS
    );
    let rows = client.query(sql.as_str(), &[&status, &limit, &offset]).await?;

    collect(rows, row_to_rental)
}

/// Count rentals with the given status.
pub async fn count_rentals_by_status(pool: &Pool, status: &str) -> Result<i64, DatabaseError> {
    let client = client(pool).await?;
    let row = client.query_one(
        "SELECT COUNT(*) AS count FROM rentals WHERE status = $1",
        &[&status],
    ).await?;
    Ok(row.try_get("count")?)
}

/// Insert a new rental listing.
pub async fn create_rental(pool: &Pool, rental: &RentalRecord) -> Result<Uuid, DatabaseError> {
    let client = client(pool).await?;
    insert_rental(&client, rental).await
}

pub async fn insert_rental<C: GenericClient>(
    client: &C,
    rental: &RentalRecord,
) -> Result<Uuid, DatabaseError> {
    debug!("Creating rental for NFT: {}", rental.nft_id);

    client.execute(
        r#"
        INSERT INTO rentals (
            id, nft_id, lender, renter, pricing, duration, settings, terms,
            status, start_date, end_date, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
        &[
            &rental.id,
            &rental.nft_id,
            &rental.lender,
            &rental.renter,
            &Json(&rental.pricing),
            &Json(&rental.duration),
            &Json(&rental.settings),
            &Json(&rental.terms),
            &rental.status,
            &rental.start_date,
            &rental.end_date,
            &rental.created_at,
            &rental.updated_at,
        ],
    ).await
    .map_err(|e| insert_error(e, format!("Rental {} already exists", rental.id)))?;

    info!("Rental created: {}", rental.id);
    Ok(rental.id)
}

// ============================================
// LOAN QUERIES
// ============================================

/// Get a loan by id.
pub async fn get_loan_by_id(
    pool: &Pool,
    id: Uuid,
) -> Result<Option<LoanRecord>, DatabaseError> {
    debug!("Fetching loan: {}", id);

    let client = client(pool).await?;
    let sql = format!("SELECT {} FROM loans WHERE id = $1", LOAN_COLUMNS);
    let row = client.query_opt(sql.as_str(), &[&id]).await?;

    row.as_ref().map(row_to_loan).transpose()
}

/// List loans with the given status, in insertion order.
pub async fn list_loans_by_status(
    pool: &Pool,
    status: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<LoanRecord>, DatabaseError> {
    debug!("Fetching {} loans (limit: {}, offset: {})", status, limit, offset);

    let client = client(pool).await?;
    let sql = format!(
        "SELECT {} FROM loans WHERE status = $1 ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3",
        LOAN_COLUMNS
    );
    let rows = client.query(sql.as_str(), &[&status, &limit, &offset]).await?;

    collect(rows, row_to_loan)
}

/// Count loans with the given status.
pub async fn count_loans_by_status(pool: &Pool, status: &str) -> Result<i64, DatabaseError> {
    let client = client(pool).await?;
    let row = client.query_one(
        "SELECT COUNT(*) AS count FROM loans WHERE status = $1",
        &[&status],
    ).await?;
    Ok(row.try_get("count")?)
}

/// Insert a new loan request.
pub async fn create_loan(pool: &Pool, loan: &LoanRecord) -> Result<Uuid, DatabaseError> {
    let client = client(pool).await?;
    insert_loan(&client, loan).await
}

pub async fn insert_loan<C: GenericClient>(client: &C, loan: &LoanRecord) -> Result<Uuid, DatabaseError> {
    debug!("Creating loan request for borrower: {}", loan.borrower);

    client.execute(
        r#"
        INSERT INTO loans (
            id, borrower, lender, collateral, terms, status,
            funded_at, due_date, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
        &[
            &loan.id,
            &loan.borrower,
            &loan.lender,
            &Json(&loan.collateral),
            &Json(&loan.terms),
            &loan.status,
            &loan.funded_at,
            &loan.due_date,
            &loan.created_at,
            &loan.updated_at,
        ],
    ).await
    .map_err(|e| insert_error(e, format!("Loan {} already exists", loan.id)))?;

    info!("Loan request created: {}", loan.id);
    Ok(loan.id)
}
