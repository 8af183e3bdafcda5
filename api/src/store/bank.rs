//! Bank and customer onboarding.
//!
//! A customer is always created together with their account, so every
//! customer row has exactly one account row.

use jiff::Timestamp;
use jiff_sqlx::{Timestamp as SqlxTs, ToSqlx};
use payloads::{
    AccountId, BankId, CustomerId, UserId,
    requests::{self, BANK_NAME_MAX_LEN, CUSTOMER_NAME_MAX_LEN},
    responses::{self, Bank},
};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor, PgPool};

use super::{StoreError, check_len, require_bank_member};
use crate::time::TimeSource;

/// A customer joined with their account and its derived balance.
#[derive(Debug, Clone, FromRow)]
struct DbCustomer {
    id: CustomerId,
    bank_id: BankId,
    first_name: String,
    last_name: String,
    #[sqlx(try_from = "SqlxTs")]
    created_at: Timestamp,
    account_id: AccountId,
    #[sqlx(try_from = "SqlxTs")]
    account_created_at: Timestamp,
    balance: Decimal,
}

impl From<DbCustomer> for responses::Customer {
    fn from(db: DbCustomer) -> Self {
        Self {
            id: db.id,
            bank_id: db.bank_id,
            first_name: db.first_name,
            last_name: db.last_name,
            created_at: db.created_at,
            account: responses::Account {
                id: db.account_id,
                customer_id: db.id,
                balance: db.balance,
                created_at: db.account_created_at,
            },
        }
    }
}

const CUSTOMER_QUERY: &str = r#"
    SELECT
        c.id,
        c.bank_id,
        c.first_name,
        c.last_name,
        c.created_at,
        a.id AS account_id,
        a.created_at AS account_created_at,
        COALESCE(SUM(t.amount), 0) AS balance
    FROM customers c
    JOIN accounts a ON a.customer_id = c.id
    LEFT JOIN transactions t ON t.account_id = a.id
"#;

/// Create a bank and give the creating user authority over it.
///
/// A user administers at most one bank, so this fails with
/// `AlreadyBankMember` if the user already has one.
#[tracing::instrument(skip(details, time_source, pool))]
pub async fn create_bank(
    actor: &UserId,
    details: &requests::CreateBank,
    time_source: &TimeSource,
    pool: &PgPool,
) -> Result<Bank, StoreError> {
    check_len(&details.name, BANK_NAME_MAX_LEN)?;
    if let Some(description) = &details.description {
        check_len(description, BANK_NAME_MAX_LEN)?;
    }

    let mut tx = pool.begin().await?;

    // Lock the user row so two concurrent requests can't both attach a bank
    let current_bank: Option<Option<BankId>> =
        sqlx::query_scalar("SELECT bank_id FROM users WHERE id = $1 FOR UPDATE")
            .bind(actor)
            .fetch_optional(&mut *tx)
            .await?;
    match current_bank {
        None => return Err(StoreError::UserNotFound),
        Some(Some(_)) => return Err(StoreError::AlreadyBankMember),
        Some(None) => {}
    }

    let now = time_source.now();
    let bank = sqlx::query_as::<_, Bank>(
        r#"
        INSERT INTO banks (name, description, created_at, updated_at)
        VALUES ($1, $2, $3, $3)
        RETURNING *
        "#,
    )
    .bind(&details.name)
    .bind(&details.description)
    .bind(now.to_sqlx())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET bank_id = $2, updated_at = $3 WHERE id = $1")
        .bind(actor)
        .bind(bank.id)
        .bind(now.to_sqlx())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(bank_id = %bank.id, "Created bank");
    Ok(bank)
}

pub async fn find_bank<'e>(
    id: &BankId,
    executor: impl PgExecutor<'e>,
) -> Result<Bank, StoreError> {
    sqlx::query_as::<_, Bank>("SELECT * FROM banks WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(StoreError::BankNotFound)
}

/// Read a bank on behalf of one of its users.
pub async fn read_bank(
    actor: &UserId,
    id: &BankId,
    pool: &PgPool,
) -> Result<Bank, StoreError> {
    let bank = find_bank(id, pool).await?;
    require_bank_member(actor, &bank.id, pool).await?;
    Ok(bank)
}

/// Onboard a customer and open their account in one database transaction.
#[tracing::instrument(skip(details, time_source, pool), fields(bank_id = %details.bank_id))]
pub async fn create_customer(
    actor: &UserId,
    details: &requests::CreateCustomer,
    time_source: &TimeSource,
    pool: &PgPool,
) -> Result<responses::Customer, StoreError> {
    check_len(&details.first_name, CUSTOMER_NAME_MAX_LEN)?;
    check_len(&details.last_name, CUSTOMER_NAME_MAX_LEN)?;

    let mut tx = pool.begin().await?;

    let bank = find_bank(&details.bank_id, &mut *tx).await?;
    require_bank_member(actor, &bank.id, &mut *tx).await?;

    let now = time_source.now();
    let customer_id: CustomerId = sqlx::query_scalar(
        r#"
        INSERT INTO customers (
            bank_id,
            first_name,
            last_name,
            created_at,
            updated_at
        )
        VALUES ($1, $2, $3, $4, $4)
        RETURNING id
        "#,
    )
    .bind(bank.id)
    .bind(&details.first_name)
    .bind(&details.last_name)
    .bind(now.to_sqlx())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO accounts (customer_id, created_at) VALUES ($1, $2)")
        .bind(customer_id)
        .bind(now.to_sqlx())
        .execute(&mut *tx)
        .await?;

    let customer = find_customer(&customer_id, &mut *tx).await?;

    tx.commit().await?;

    tracing::info!(customer_id = %customer.id, "Created customer");
    Ok(customer)
}

/// Get a customer with their account and current balance.
pub async fn find_customer<'e>(
    id: &CustomerId,
    executor: impl PgExecutor<'e>,
) -> Result<responses::Customer, StoreError> {
    let query = format!("{CUSTOMER_QUERY} WHERE c.id = $1 GROUP BY c.id, a.id");
    let customer = sqlx::query_as::<_, DbCustomer>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(StoreError::CustomerNotFound)?;
    Ok(customer.into())
}

/// Read a customer on behalf of a user of the customer's bank.
pub async fn read_customer(
    actor: &UserId,
    id: &CustomerId,
    pool: &PgPool,
) -> Result<responses::Customer, StoreError> {
    let customer = find_customer(id, pool).await?;
    require_bank_member(actor, &customer.bank_id, pool).await?;
    Ok(customer)
}

/// The bank's customer roster with balances, ordered by name.
pub async fn list_customers(
    actor: &UserId,
    bank_id: &BankId,
    pool: &PgPool,
) -> Result<Vec<responses::Customer>, StoreError> {
    let bank = find_bank(bank_id, pool).await?;
    require_bank_member(actor, &bank.id, pool).await?;

    let query = format!(
        "{CUSTOMER_QUERY} WHERE c.bank_id = $1 GROUP BY c.id, a.id
        ORDER BY c.last_name, c.first_name, c.id"
    );
    let customers = sqlx::query_as::<_, DbCustomer>(&query)
        .bind(bank.id)
        .fetch_all(pool)
        .await?;
    Ok(customers.into_iter().map(Into::into).collect())
}
