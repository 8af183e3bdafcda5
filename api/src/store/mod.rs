//! Database store module for the Fun Banking API
//!
//! ## Design Decisions
//!
//! ### Derived balances
//! - Accounts have no balance column. A balance is always
//!   `SUM(amount)` over the account's transactions, computed in the same
//!   query that reads the account, so it can never drift from the ledger.
//!
//! ### Numeric ids
//! - Every table uses a `BIGINT` identity key, wrapped in a payloads newtype
//!   (`AccountId`, `TransactionId`, ...) that implements `sqlx::Type`, so
//!   ids of different tables can't be mixed up at bind sites.
//!
//! ### Bank scoping
//! - A user has authority over at most one bank (`users.bank_id`). Every
//!   operation that acts on a customer, account or transaction checks that
//!   the acting user belongs to the owning bank and fails with
//!   `StoreError::Forbidden` otherwise.
//!
//! ### Time Source Dependency
//! - Functions that write timestamps accept a `TimeSource` so that time can
//!   be mocked during tests.
//!
//! ### Multi-row writes
//! - Customer onboarding, bulk transfers and status changes run inside one
//!   `sqlx::Transaction`. Ledger helpers that take an executor or an open
//!   transaction leave commit/rollback to the caller.

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use payloads::{BankId, TransactionStatus, UserId};
use sqlx::{FromRow, PgExecutor};

pub mod approval;
pub mod bank;
pub mod ledger;
pub mod transfer;
pub mod user;

/// A complete user row that stays in the backend.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub bank_id: Option<BankId>,
    #[sqlx(try_from = "SqlxTs")]
    pub created_at: Timestamp,
    #[sqlx(try_from = "SqlxTs")]
    pub updated_at: Timestamp,
}

impl From<User> for payloads::responses::UserProfile {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            bank_id: user.bank_id,
        }
    }
}

/// Fail with `Forbidden` unless `user_id` has authority over `bank_id`.
pub(crate) async fn require_bank_member<'e>(
    user_id: &UserId,
    bank_id: &BankId,
    executor: impl PgExecutor<'e>,
) -> Result<(), StoreError> {
    let is_member: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND bank_id = $2)",
    )
    .bind(user_id)
    .bind(bank_id)
    .fetch_one(executor)
    .await?;

    if !is_member {
        return Err(StoreError::Forbidden);
    }
    Ok(())
}

/// Fail with `FieldTooLong` if `value` exceeds `max_len` characters.
pub(crate) fn check_len(value: &str, max_len: usize) -> Result<(), StoreError> {
    if value.chars().count() > max_len {
        return Err(StoreError::FieldTooLong);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User not found")]
    UserNotFound,
    #[error("Bank not found")]
    BankNotFound,
    #[error("Customer not found")]
    CustomerNotFound,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Transaction not found")]
    TransactionNotFound,
    #[error("Invalid amount '{0}': expected a positive number of at most two decimal places")]
    InvalidAmount(String),
    #[error("Cannot move transaction from {from} to {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },
    #[error("User does not have access to this bank")]
    Forbidden,
    #[error("A bulk transfer needs at least one customer")]
    EmptyTargetSet,
    #[error("User already belongs to a bank")]
    AlreadyBankMember,
    #[error("Field too long")]
    FieldTooLong,
    #[error("Invalid username: {0}")]
    InvalidUsername(String),
    #[error("Unique constraint violation")]
    NotUnique(#[source] sqlx::Error),
    #[error("Database error")]
    Database(#[source] sqlx::Error),
    #[error("Unexpected error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return StoreError::NotUnique(e);
        }
        StoreError::Database(e)
    }
}
