use actix_web::HttpResponse;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::error::{ApiError, Result};

pub mod auth;
pub mod authors;
pub mod books;
pub mod health;
pub mod users;

pub use auth::{login, register};
pub use authors::{create_author, delete_author, get_author, list_authors, update_author};
pub use books::{create_book, delete_book, get_book, list_books, update_book};
pub use health::health_check;
pub use users::{delete_user, get_user, list_users, update_user};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// A path id that is not a well-formed ObjectId gets the same 404 as a
/// missing document; the two cases are indistinguishable to a caller.
pub(crate) fn parse_object_id(raw: &str, not_found: &'static str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::NotFound(not_found))
}

/// Fallback for unmatched routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(MessageResponse {
        message: "Not found".to_string(),
    })
}
