//! Single-account transfers and bulk fan-out transfers.
//!
//! Both record `pending` transactions only; nothing here approves or
//! declines anything.

use std::collections::HashSet;
use std::str::FromStr;

use payloads::{
    TransferType, UserId,
    requests::{self, DESCRIPTION_MAX_LEN},
    responses::{BulkTransferResult, TransferResult},
};
use rust_decimal::{Decimal, dec};
use sqlx::PgPool;

use super::{
    StoreError, bank, check_len,
    ledger::{self, NewTransaction},
    require_bank_member,
};
use crate::time::TimeSource;

/// Amounts must stay below this to fit `NUMERIC(14, 2)`.
const AMOUNT_LIMIT: Decimal = dec!(1000000000000);

/// Parse a user-entered transfer amount.
///
/// Accepts a positive decimal with at most two fractional digits, such as
/// `"25"`, `"25.5"` or `" 0.01 "`. Trailing zeros don't count towards the
/// two digits, so `"1.500"` is fine.
pub fn parse_amount(raw: &str) -> Result<Decimal, StoreError> {
    let invalid = || StoreError::InvalidAmount(raw.to_string());
    let amount = Decimal::from_str(raw.trim()).map_err(|_| invalid())?;
    let amount = amount.normalize();
    if amount <= Decimal::ZERO || amount.scale() > 2 || amount >= AMOUNT_LIMIT
    {
        return Err(invalid());
    }
    Ok(amount)
}

/// Apply the transfer direction to a positive magnitude.
pub fn signed_amount(magnitude: Decimal, transfer_type: TransferType) -> Decimal {
    match transfer_type {
        TransferType::Deposit => magnitude,
        TransferType::Withdraw => -magnitude,
    }
}

/// Record a pending transfer against one account.
///
/// Checks, in order: the account exists (`AccountNotFound`), the acting user
/// belongs to its bank (`Forbidden`), then the amount parses
/// (`InvalidAmount`). Nothing is written unless every check passes.
///
/// When `acting_user` is given they must belong to the account's bank; the
/// transaction is attributed to them.
#[tracing::instrument(
    skip(details, time_source, pool),
    fields(account_id = %details.account_id, transfer_type = %details.transfer_type)
)]
pub async fn create_transfer(
    details: &requests::CreateTransfer,
    acting_user: Option<&UserId>,
    time_source: &TimeSource,
    pool: &PgPool,
) -> Result<TransferResult, StoreError> {
    let mut tx = pool.begin().await?;

    let account = ledger::find_account(&details.account_id, &mut *tx).await?;
    if let Some(user_id) = acting_user {
        require_bank_member(user_id, &account.bank_id, &mut *tx).await?;
    }

    let magnitude = parse_amount(&details.amount)?;
    check_len(&details.description, DESCRIPTION_MAX_LEN)?;

    let transaction = ledger::create_transaction(
        NewTransaction {
            account_id: account.id,
            amount: signed_amount(magnitude, details.transfer_type),
            description: details.description.clone(),
            user_id: acting_user.copied(),
        },
        time_source,
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    let customer = bank::find_customer(&account.customer_id, pool).await?;
    tracing::info!(transaction_id = %transaction.id, "Recorded transfer");
    Ok(TransferResult {
        transaction,
        customer,
    })
}

/// Record the same pending transfer for every listed customer.
///
/// All transactions are written in one database transaction: if any
/// customer is missing or belongs to a bank the user can't act for, none
/// are recorded. Duplicated customer ids produce one transaction each.
#[tracing::instrument(
    skip(details, time_source, pool),
    fields(targets = details.customer_ids.len(), transfer_type = %details.transfer_type)
)]
pub async fn bulk_transfer(
    details: &requests::BulkTransfer,
    acting_user: &UserId,
    time_source: &TimeSource,
    pool: &PgPool,
) -> Result<BulkTransferResult, StoreError> {
    let Some(first_customer_id) = details.customer_ids.first() else {
        return Err(StoreError::EmptyTargetSet);
    };
    let magnitude = parse_amount(&details.amount)?;
    check_len(&details.description, DESCRIPTION_MAX_LEN)?;
    let amount = signed_amount(magnitude, details.transfer_type);

    let mut tx = pool.begin().await?;

    let mut checked_banks = HashSet::new();
    let mut transactions = Vec::with_capacity(details.customer_ids.len());
    for customer_id in &details.customer_ids {
        let account =
            ledger::find_customer_account(customer_id, &mut *tx).await?;
        if !checked_banks.contains(&account.bank_id) {
            require_bank_member(acting_user, &account.bank_id, &mut *tx)
                .await?;
            checked_banks.insert(account.bank_id);
        }

        let transaction = ledger::create_transaction(
            NewTransaction {
                account_id: account.id,
                amount,
                description: details.description.clone(),
                user_id: Some(*acting_user),
            },
            time_source,
            &mut *tx,
        )
        .await?;
        transactions.push(transaction);
    }

    tx.commit().await?;

    tracing::info!(count = transactions.len(), "Recorded bulk transfer");

    let customer = bank::find_customer(first_customer_id, pool).await?;
    let bank = bank::find_bank(&customer.bank_id, pool).await?;
    Ok(BulkTransferResult {
        customer,
        bank,
        transactions,
    })
}
