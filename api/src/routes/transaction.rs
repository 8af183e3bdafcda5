use actix_identity::Identity;
use actix_web::{HttpResponse, get, post, web};
use sqlx::PgPool;

use crate::store;
use crate::time::TimeSource;

use super::{APIError, get_user_id};

/// Record a pending transfer against one account.
///
/// A logged in user must belong to the account's bank and is recorded as
/// the creator.
///
/// Anonymous requests are accepted. Anyone who knows or guesses an account
/// id can add a pending transaction to it, and a missing account answers 404
/// where an existing one answers 200, so ids can be enumerated. Such a
/// transaction has no `user_id`, counts toward the balance like any other
/// row, and shows up in the bank's pending list until a member declines it.
/// Declining keeps it in the balance: the ledger never deletes or zeroes a
/// row.
#[tracing::instrument(
    skip(user, pool, time_source),
    fields(user_id=tracing::field::Empty),
    ret
)]
#[post("/create_transfer")]
pub async fn create_transfer(
    user: Option<Identity>,
    details: web::Json<payloads::requests::CreateTransfer>,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let user_id = user.as_ref().map(get_user_id).transpose()?;
    let result = store::transfer::create_transfer(
        &details,
        user_id.as_ref(),
        &time_source,
        &pool,
    )
    .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[tracing::instrument(
    skip(user, pool, time_source),
    fields(user_id=tracing::field::Empty),
    ret
)]
#[post("/bulk_transfer")]
pub async fn bulk_transfer(
    user: Identity,
    details: web::Json<payloads::requests::BulkTransfer>,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let result =
        store::transfer::bulk_transfer(&details, &user_id, &time_source, &pool)
            .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Approve a pending transaction, responding with the user's remaining
/// pending transactions.
#[tracing::instrument(
    skip(user, pool, time_source),
    fields(user_id=tracing::field::Empty)
)]
#[post("/approve_transaction")]
pub async fn approve_transaction(
    user: Identity,
    transaction_id: web::Json<payloads::TransactionId>,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let pending = store::approval::approve(
        &transaction_id,
        &user_id,
        &time_source,
        &pool,
    )
    .await?;
    Ok(HttpResponse::Ok().json(pending))
}

/// Decline a pending transaction, responding with the user's remaining
/// pending transactions.
#[tracing::instrument(
    skip(user, pool, time_source),
    fields(user_id=tracing::field::Empty)
)]
#[post("/decline_transaction")]
pub async fn decline_transaction(
    user: Identity,
    transaction_id: web::Json<payloads::TransactionId>,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let pending = store::approval::decline(
        &transaction_id,
        &user_id,
        &time_source,
        &pool,
    )
    .await?;
    Ok(HttpResponse::Ok().json(pending))
}

#[tracing::instrument(skip(user, pool), fields(user_id=tracing::field::Empty))]
#[get("/pending_transactions")]
pub async fn pending_transactions(
    user: Identity,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let pending = store::approval::pending_for_user(&user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(pending))
}

#[tracing::instrument(skip(user, pool), fields(user_id=tracing::field::Empty))]
#[post("/list_account_transactions")]
pub async fn list_account_transactions(
    user: Identity,
    details: web::Json<payloads::requests::ListAccountTransactions>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let transactions = store::ledger::list_account_transactions(
        &user_id,
        &details.account_id,
        details.limit,
        details.offset,
        &pool,
    )
    .await?;
    Ok(HttpResponse::Ok().json(transactions))
}
