use actix_web::{post, web, HttpResponse};
use serde::Serialize;

use crate::auth_token::{now_ms, TokenService};
use crate::db::models::User;
use crate::db::MongoDbContext;
use crate::error::{ApiError, Result};
use crate::validation::{validate_login, validate_register, LoginPayload, RegisterPayload};

use super::users::UserResponse;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
}

#[post("/register")]
pub async fn register(
    payload: web::Json<RegisterPayload>,
    db: web::Data<MongoDbContext>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse> {
    let data = validate_register(&payload)?;

    if db.users().find_by_email(&data.email).await?.is_some() {
        return Err(ApiError::EmailTaken);
    }

    let user = User::new(data.email, data.username, &data.password)?;
    let user = db.users().insert(user).await?;

    let id = user
        .id
        .ok_or_else(|| ApiError::Internal("Inserted user has no id".to_string()))?;

    let token = tokens
        .issue(&id.to_hex(), user.is_admin, now_ms())
        .map_err(|err| ApiError::Internal(format!("Failed to issue token: {err}")))?;

    log::info!("Registered new user: {}", user.email);

    Ok(HttpResponse::Created().json(AuthResponse {
        user: user.into(),
        token,
    }))
}

#[post("/login")]
pub async fn login(
    payload: web::Json<LoginPayload>,
    db: web::Data<MongoDbContext>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse> {
    let data = validate_login(&payload)?;

    // Unknown email and wrong password take the same exit so a caller
    // cannot probe which one it was.
    let user = db
        .users()
        .find_by_email(&data.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !user.verify_password(&data.password)? {
        log::warn!("Failed login attempt for {}", data.email);
        return Err(ApiError::InvalidCredentials);
    }

    let id = user
        .id
        .ok_or_else(|| ApiError::Internal("Stored user has no id".to_string()))?;

    let token = tokens
        .issue(&id.to_hex(), user.is_admin, now_ms())
        .map_err(|err| ApiError::Internal(format!("Failed to issue token: {err}")))?;

    log::info!("Successful login for {}", user.email);

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: user.into(),
        token,
    }))
}
