use actix_web::{delete, get, middleware::from_fn, put, web, HttpResponse};
use chrono::{DateTime, Utc};
use mongodb::bson::{DateTime as BsonDateTime, Document};
use serde::Serialize;

use crate::auth_token::TokenClaims;
use crate::db::models::User;
use crate::db::MongoDbContext;
use crate::error::{ApiError, Result};
use crate::middleware::{require_admin, require_self_or_admin};
use crate::validation::{validate_update_user, UpdateUserPayload};

use super::{parse_object_id, MessageResponse};

/// User as it leaves the API. There is deliberately no password field; the
/// hash never crosses this boundary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: user.email,
            username: user.username,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[get("/users", wrap = "from_fn(require_admin)")]
pub async fn list_users(db: web::Data<MongoDbContext>) -> Result<HttpResponse> {
    let users = db.users().find_all().await?;
    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(users))
}

#[get("/users/{id}", wrap = "from_fn(require_self_or_admin)")]
pub async fn get_user(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "User not found")?;

    let user = db
        .users()
        .find_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[put("/users/{id}", wrap = "from_fn(require_self_or_admin)")]
pub async fn update_user(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserPayload>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "User not found")?;
    let update = validate_update_user(&payload)?;

    let mut set = Document::new();
    if let Some(email) = update.email {
        set.insert("email", email);
    }
    if let Some(username) = update.username {
        set.insert("username", username);
    }
    if let Some(password) = update.password {
        // Profile updates carry a new plaintext; it is re-hashed before
        // anything is written.
        set.insert("password", bcrypt::hash(password, bcrypt::DEFAULT_COST)?);
    }
    set.insert("updatedAt", BsonDateTime::now());

    let user = db
        .users()
        .update(&id, set)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    log::info!("Updated user {}", id.to_hex());

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[delete("/users/{id}", wrap = "from_fn(require_admin)")]
pub async fn delete_user(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
    claims: web::ReqData<TokenClaims>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "User not found")?;

    if db.users().find_by_id(&id).await?.is_none() {
        return Err(ApiError::NotFound("User not found"));
    }

    db.users().delete(&id).await?;
    log::info!("User {} deleted by admin {}", id.to_hex(), claims.subject);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "User has been deleted".to_string(),
    }))
}
