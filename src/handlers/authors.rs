use actix_web::{delete, get, middleware::from_fn, post, put, web, HttpResponse};
use chrono::{DateTime, Utc};
use mongodb::bson::{DateTime as BsonDateTime, Document};
use serde::Serialize;

use crate::auth_token::TokenClaims;
use crate::db::models::Author;
use crate::db::MongoDbContext;
use crate::error::{ApiError, Result};
use crate::middleware::require_admin;
use crate::validation::{
    validate_create_author, validate_update_author, CreateAuthorPayload, UpdateAuthorPayload,
};

use super::{parse_object_id, MessageResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        Self {
            id: author.id.map(|id| id.to_hex()).unwrap_or_default(),
            first_name: author.first_name,
            last_name: author.last_name,
            nationality: author.nationality,
            image: author.image,
            created_at: author.created_at,
            updated_at: author.updated_at,
        }
    }
}

#[get("/authors")]
pub async fn list_authors(db: web::Data<MongoDbContext>) -> Result<HttpResponse> {
    let authors = db.authors().find_all().await?;
    let authors: Vec<AuthorResponse> = authors.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(authors))
}

#[get("/authors/{id}")]
pub async fn get_author(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "Author not found")?;

    let author = db
        .authors()
        .find_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound("Author not found"))?;

    Ok(HttpResponse::Ok().json(AuthorResponse::from(author)))
}

#[post("/authors", wrap = "from_fn(require_admin)")]
pub async fn create_author(
    payload: web::Json<CreateAuthorPayload>,
    db: web::Data<MongoDbContext>,
) -> Result<HttpResponse> {
    let data = validate_create_author(&payload)?;

    let author = Author::new(data.first_name, data.last_name, data.nationality, data.image);
    let author = db.authors().insert(author).await?;

    log::info!("Created author {} {}", author.first_name, author.last_name);

    Ok(HttpResponse::Ok().json(AuthorResponse::from(author)))
}

#[put("/authors/{id}", wrap = "from_fn(require_admin)")]
pub async fn update_author(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
    payload: web::Json<UpdateAuthorPayload>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "Author not found")?;
    let update = validate_update_author(&payload)?;

    let mut set = Document::new();
    if let Some(first_name) = update.first_name {
        set.insert("firstName", first_name);
    }
    if let Some(last_name) = update.last_name {
        set.insert("lastName", last_name);
    }
    if let Some(nationality) = update.nationality {
        set.insert("nationality", nationality);
    }
    if let Some(image) = update.image {
        set.insert("image", image);
    }
    set.insert("updatedAt", BsonDateTime::now());

    let author = db
        .authors()
        .update(&id, set)
        .await?
        .ok_or(ApiError::NotFound("Author not found"))?;

    Ok(HttpResponse::Ok().json(AuthorResponse::from(author)))
}

#[delete("/authors/{id}", wrap = "from_fn(require_admin)")]
pub async fn delete_author(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
    claims: web::ReqData<TokenClaims>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "Author not found")?;

    if db.authors().find_by_id(&id).await?.is_none() {
        return Err(ApiError::NotFound("Author not found"));
    }

    // Books referencing this author keep their dangling id; expansion
    // renders null for them.
    db.authors().delete(&id).await?;
    log::info!("Author {} deleted by admin {}", id.to_hex(), claims.subject);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Author has been deleted".to_string(),
    }))
}
