//! Ledger operations on accounts and transactions.
//!
//! Transactions are append-only rows carrying a signed amount:
//! - positive amounts are deposits, negative amounts withdrawals
//! - amounts never change after insertion (enforced by a database trigger)
//! - a transaction is inserted `pending` and resolved at most once
//!
//! An account's balance is `SUM(amount)` over all of its transactions,
//! whatever their status, so the balance is derived and never cached.

use jiff::Timestamp;
use jiff_sqlx::{Timestamp as SqlxTs, ToSqlx};
use payloads::{
    AccountId, BankId, CustomerId, TransactionId, TransactionStatus, UserId,
    responses::Transaction,
};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor, PgPool};

use super::{StoreError, require_bank_member};
use crate::time::TimeSource;

/// Largest page accepted by `list_account_transactions`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// An account along with the bank it belongs to (via its customer).
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: AccountId,
    pub customer_id: CustomerId,
    pub bank_id: BankId,
    #[sqlx(try_from = "SqlxTs")]
    pub created_at: Timestamp,
}

/// A transaction to be recorded. Status always starts as pending.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub description: String,
    pub user_id: Option<UserId>,
}

pub async fn find_account<'e>(
    id: &AccountId,
    executor: impl PgExecutor<'e>,
) -> Result<Account, StoreError> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT a.id, a.customer_id, c.bank_id, a.created_at
        FROM accounts a
        JOIN customers c ON c.id = a.customer_id
        WHERE a.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(StoreError::AccountNotFound)
}

/// Get the account belonging to a customer.
///
/// Fails with `CustomerNotFound` since every existing customer has an
/// account.
pub async fn find_customer_account<'e>(
    customer_id: &CustomerId,
    executor: impl PgExecutor<'e>,
) -> Result<Account, StoreError> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT a.id, a.customer_id, c.bank_id, a.created_at
        FROM accounts a
        JOIN customers c ON c.id = a.customer_id
        WHERE c.id = $1
        "#,
    )
    .bind(customer_id)
    .fetch_optional(executor)
    .await?
    .ok_or(StoreError::CustomerNotFound)
}

/// Sum of every transaction amount recorded against the account.
pub async fn account_balance<'e>(
    account_id: &AccountId,
    executor: impl PgExecutor<'e>,
) -> Result<Decimal, StoreError> {
    let balance: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_one(executor)
    .await?;
    Ok(balance)
}

/// Insert a pending transaction.
///
/// Must be called within a transaction when it is one write among several;
/// the caller is responsible for committing or rolling back.
pub async fn create_transaction<'e>(
    new_transaction: NewTransaction,
    time_source: &TimeSource,
    executor: impl PgExecutor<'e>,
) -> Result<Transaction, StoreError> {
    let now = time_source.now();
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            account_id,
            amount,
            description,
            status,
            user_id,
            created_at,
            updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING *
        "#,
    )
    .bind(new_transaction.account_id)
    .bind(new_transaction.amount)
    .bind(&new_transaction.description)
    .bind(TransactionStatus::Pending)
    .bind(new_transaction.user_id)
    .bind(now.to_sqlx())
    .fetch_one(executor)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::AccountNotFound
        }
        e => e.into(),
    })?;
    Ok(transaction)
}

/// Resolve a pending transaction on behalf of `acting_user_id`.
///
/// Checks, in order:
/// 1. the transaction exists (`TransactionNotFound`)
/// 2. the acting user belongs to the bank owning the transaction's account
///    (`Forbidden`)
/// 3. the status change is allowed (`InvalidTransition`)
///
/// The row is locked with `SELECT ... FOR UPDATE` and the update itself only
/// applies while the row is still pending, so of two concurrent resolutions
/// exactly one succeeds and the other sees the terminal status.
///
/// The resolving user replaces the creator in `user_id`. Must be called
/// within a transaction; the caller commits.
pub async fn update_transaction_status(
    transaction_id: &TransactionId,
    acting_user_id: &UserId,
    new_status: TransactionStatus,
    time_source: &TimeSource,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<Transaction, StoreError> {
    #[derive(FromRow)]
    struct LockedTransaction {
        status: TransactionStatus,
        bank_id: BankId,
    }

    let locked = sqlx::query_as::<_, LockedTransaction>(
        r#"
        SELECT t.status, c.bank_id
        FROM transactions t
        JOIN accounts a ON a.id = t.account_id
        JOIN customers c ON c.id = a.customer_id
        WHERE t.id = $1
        FOR UPDATE OF t
        "#,
    )
    .bind(transaction_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(StoreError::TransactionNotFound)?;

    require_bank_member(acting_user_id, &locked.bank_id, &mut **tx).await?;

    let invalid_transition = StoreError::InvalidTransition {
        from: locked.status,
        to: new_status,
    };
    if !locked.status.can_transition_to(new_status) {
        return Err(invalid_transition);
    }

    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = $2, user_id = $3, updated_at = $4
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(transaction_id)
    .bind(new_status)
    .bind(acting_user_id)
    .bind(time_source.now().to_sqlx())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(invalid_transition)
}

/// Every pending transaction on accounts of the user's bank, newest first.
///
/// Users without a bank have no pending transactions.
pub async fn find_pending_transactions_for_user<'e>(
    user_id: &UserId,
    executor: impl PgExecutor<'e>,
) -> Result<Vec<Transaction>, StoreError> {
    let transactions = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT t.*
        FROM transactions t
        JOIN accounts a ON a.id = t.account_id
        JOIN customers c ON c.id = a.customer_id
        JOIN users u ON u.bank_id = c.bank_id
        WHERE u.id = $1 AND t.status = 'pending'
        ORDER BY t.created_at DESC, t.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;
    Ok(transactions)
}

/// Page through an account's transactions, newest first.
///
/// `limit` is clamped to `1..=MAX_PAGE_SIZE` and negative offsets are
/// treated as zero.
pub async fn list_account_transactions(
    actor: &UserId,
    account_id: &AccountId,
    limit: i64,
    offset: i64,
    pool: &PgPool,
) -> Result<Vec<Transaction>, StoreError> {
    let account = find_account(account_id, pool).await?;
    require_bank_member(actor, &account.bank_id, pool).await?;

    let transactions = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT *
        FROM transactions
        WHERE account_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(account.id)
    .bind(limit.clamp(1, MAX_PAGE_SIZE))
    .bind(offset.max(0))
    .fetch_all(pool)
    .await?;
    Ok(transactions)
}
