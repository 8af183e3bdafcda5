//! Approval workflow for pending transactions.

use payloads::{TransactionId, TransactionStatus, UserId, responses::Transaction};
use sqlx::PgPool;

use super::{StoreError, ledger};
use crate::time::TimeSource;

/// Move a pending transaction to `status` and return the acting user's
/// refreshed pending set.
///
/// The status change commits before the pending set is read, so the
/// returned list never contains the resolved transaction.
#[tracing::instrument(skip(time_source, pool))]
pub async fn set_status(
    transaction_id: &TransactionId,
    acting_user: &UserId,
    status: TransactionStatus,
    time_source: &TimeSource,
    pool: &PgPool,
) -> Result<Vec<Transaction>, StoreError> {
    let mut tx = pool.begin().await?;
    let transaction = ledger::update_transaction_status(
        transaction_id,
        acting_user,
        status,
        time_source,
        &mut tx,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        transaction_id = %transaction.id,
        status = %transaction.status,
        "Resolved transaction"
    );

    ledger::find_pending_transactions_for_user(acting_user, pool).await
}

pub async fn approve(
    transaction_id: &TransactionId,
    acting_user: &UserId,
    time_source: &TimeSource,
    pool: &PgPool,
) -> Result<Vec<Transaction>, StoreError> {
    set_status(
        transaction_id,
        acting_user,
        TransactionStatus::Approved,
        time_source,
        pool,
    )
    .await
}

pub async fn decline(
    transaction_id: &TransactionId,
    acting_user: &UserId,
    time_source: &TimeSource,
    pool: &PgPool,
) -> Result<Vec<Transaction>, StoreError> {
    set_status(
        transaction_id,
        acting_user,
        TransactionStatus::Declined,
        time_source,
        pool,
    )
    .await
}

/// The pending transactions across the user's bank, newest first.
pub async fn pending_for_user(
    user_id: &UserId,
    pool: &PgPool,
) -> Result<Vec<Transaction>, StoreError> {
    ledger::find_pending_transactions_for_user(user_id, pool).await
}
