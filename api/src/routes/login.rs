use actix_identity::Identity;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, get, post, web};
use sqlx::PgPool;

use crate::password::{
    AuthError, Credentials, NewPassword, NewUserDetails, change_password,
    create_user, validate_credentials,
};
use crate::store;
use crate::time::TimeSource;

use super::{APIError, get_user_id};

#[tracing::instrument(
    skip(request, credentials, pool),
    fields(username=tracing::field::Empty, user_id=tracing::field::Empty),
    ret
)]
#[post("/login")]
pub async fn login(
    request: HttpRequest,
    credentials: web::Json<Credentials>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    tracing::Span::current()
        .record("username", tracing::field::display(&credentials.username));
    match validate_credentials(credentials.0, &pool).await {
        Ok(user_id) => {
            tracing::Span::current()
                .record("user_id", tracing::field::display(&user_id));
            Identity::login(&request.extensions(), user_id.to_string())
                .map_err(|e| APIError::UnexpectedError(e.into()))?;
            Ok(HttpResponse::Ok().finish())
        }
        Err(e) => Err(match e {
            AuthError::InvalidCredentials(_) => APIError::AuthError(e.into()),
            AuthError::UnexpectedError(_) => {
                APIError::UnexpectedError(e.into())
            }
        }),
    }
}

#[tracing::instrument(skip(user))]
#[post("/login_check")]
pub async fn login_check(user: Identity) -> Result<HttpResponse, APIError> {
    get_user_id(&user)?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(user))]
#[post("/logout")]
pub async fn logout(user: Identity) -> Result<HttpResponse, APIError> {
    let _ = get_user_id(&user); // to instrument the user_id, if exists
    user.logout();
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(new_user_details, pool, time_source))]
#[post("/create_account")]
pub async fn create_account(
    new_user_details: web::Json<NewUserDetails>,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    create_user(new_user_details.0, &pool, &time_source).await?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(
    skip(user, new_password, pool, time_source),
    fields(user_id=tracing::field::Empty)
)]
#[post("/update_password")]
pub async fn update_password(
    user: Identity,
    new_password: web::Json<NewPassword>,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    change_password(user_id, new_password.0, &pool, &time_source).await?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(user, pool), fields(user_id=tracing::field::Empty))]
#[get("/user_profile")]
pub async fn user_profile(
    user: Identity,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    let user_id = get_user_id(&user)?;
    let user = store::user::read_user(&user_id, &pool).await?;
    Ok(HttpResponse::Ok().json(payloads::responses::UserProfile::from(user)))
}
