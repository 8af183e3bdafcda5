use actix_identity::Identity;
use actix_web::{HttpResponse, post, web};
use sqlx::PgPool;

use crate::store;
use crate::time::TimeSource;

use super::{APIError, get_user_id};

#[tracing::instrument(
    skip(user, pool, time_source),
    fields(user_id=tracing::field::Empty),
    ret
)]
#[post("/create_bank")]
pub async fn create_bank(
    user: Identity,
    details: web::Json<payloads::requests::CreateBank>,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let bank =
        store::bank::create_bank(&user_id, &details, &time_source, &pool)
            .await?;
    Ok(HttpResponse::Ok().json(bank))
}

#[tracing::instrument(skip(user, pool), fields(user_id=tracing::field::Empty))]
#[post("/get_bank")]
pub async fn get_bank(
    user: Identity,
    bank_id: web::Json<payloads::BankId>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let bank = store::bank::read_bank(&user_id, &bank_id, &pool).await?;
    Ok(HttpResponse::Ok().json(bank))
}

#[tracing::instrument(
    skip(user, pool, time_source),
    fields(user_id=tracing::field::Empty),
    ret
)]
#[post("/create_customer")]
pub async fn create_customer(
    user: Identity,
    details: web::Json<payloads::requests::CreateCustomer>,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let customer =
        store::bank::create_customer(&user_id, &details, &time_source, &pool)
            .await?;
    Ok(HttpResponse::Ok().json(customer))
}

#[tracing::instrument(skip(user, pool), fields(user_id=tracing::field::Empty))]
#[post("/get_customer")]
pub async fn get_customer(
    user: Identity,
    customer_id: web::Json<payloads::CustomerId>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let customer =
        store::bank::read_customer(&user_id, &customer_id, &pool).await?;
    Ok(HttpResponse::Ok().json(customer))
}

#[tracing::instrument(skip(user, pool), fields(user_id=tracing::field::Empty))]
#[post("/list_customers")]
pub async fn list_customers(
    user: Identity,
    bank_id: web::Json<payloads::BankId>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let customers =
        store::bank::list_customers(&user_id, &bank_id, &pool).await?;
    Ok(HttpResponse::Ok().json(customers))
}
