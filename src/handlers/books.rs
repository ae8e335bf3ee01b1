use std::collections::{HashMap, HashSet};

use actix_web::{delete, get, middleware::from_fn, post, put, web, HttpResponse};
use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime, Document};
use serde::Serialize;

use crate::auth_token::TokenClaims;
use crate::db::models::{Author, Book};
use crate::db::MongoDbContext;
use crate::error::{ApiError, Result};
use crate::middleware::require_admin;
use crate::validation::{
    validate_create_book, validate_update_book, CreateBookPayload, UpdateBookPayload,
};

use super::authors::AuthorResponse;
use super::{parse_object_id, MessageResponse};

/// Author projection used when listing books.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<Author> for AuthorSummary {
    fn from(author: Author) -> Self {
        Self {
            id: author.id.map(|id| id.to_hex()).unwrap_or_default(),
            first_name: author.first_name,
            last_name: author.last_name,
        }
    }
}

/// Book as stored, author as a plain id. Returned by create and update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub cover: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookRecord {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: book.title,
            description: book.description,
            price: book.price,
            cover: book.cover,
            author: book.author.to_hex(),
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// List item with the author reference expanded to a projection. A
/// dangling reference serializes as null.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub cover: String,
    pub author: Option<AuthorSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single book with the author fully expanded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub cover: String,
    pub author: Option<AuthorResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[get("/books")]
pub async fn list_books(db: web::Data<MongoDbContext>) -> Result<HttpResponse> {
    let books = db.books().find_all().await?;

    // One batch lookup instead of a query per book.
    let author_ids: Vec<ObjectId> = books
        .iter()
        .map(|book| book.author)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors = db.authors().find_by_ids(&author_ids).await?;
    let authors_by_id: HashMap<ObjectId, Author> = authors
        .into_iter()
        .filter_map(|author| {
            let id = author.id?;
            Some((id, author))
        })
        .collect();

    let items: Vec<BookListItem> = books
        .into_iter()
        .map(|book| BookListItem {
            id: book.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: book.title,
            description: book.description,
            price: book.price,
            cover: book.cover,
            author: authors_by_id.get(&book.author).cloned().map(Into::into),
            created_at: book.created_at,
            updated_at: book.updated_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(items))
}

#[get("/books/{id}")]
pub async fn get_book(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "Book not found")?;

    let book = db
        .books()
        .find_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound("Book not found"))?;

    let author = db.authors().find_by_id(&book.author).await?;

    let detail = BookDetail {
        id: book.id.map(|id| id.to_hex()).unwrap_or_default(),
        title: book.title,
        description: book.description,
        price: book.price,
        cover: book.cover,
        author: author.map(Into::into),
        created_at: book.created_at,
        updated_at: book.updated_at,
    };

    Ok(HttpResponse::Ok().json(detail))
}

#[post("/books", wrap = "from_fn(require_admin)")]
pub async fn create_book(
    payload: web::Json<CreateBookPayload>,
    db: web::Data<MongoDbContext>,
) -> Result<HttpResponse> {
    let data = validate_create_book(&payload)?;

    // A book cannot be created against an author that does not exist.
    if db.authors().find_by_id(&data.author).await?.is_none() {
        return Err(ApiError::Validation(
            "author must reference an existing author".to_string(),
        ));
    }

    let book = Book::new(
        data.title,
        data.description,
        data.price,
        data.cover,
        data.author,
    );
    let book = db.books().insert(book).await?;

    log::info!("Created book {}", book.title);

    Ok(HttpResponse::Created().json(BookRecord::from(book)))
}

#[put("/books/{id}", wrap = "from_fn(require_admin)")]
pub async fn update_book(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
    payload: web::Json<UpdateBookPayload>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "Book not found")?;
    let update = validate_update_book(&payload)?;

    let mut set = Document::new();
    if let Some(title) = update.title {
        set.insert("title", title);
    }
    if let Some(description) = update.description {
        set.insert("description", description);
    }
    if let Some(price) = update.price {
        set.insert("price", price);
    }
    if let Some(cover) = update.cover {
        set.insert("cover", cover);
    }
    if let Some(author) = update.author {
        set.insert("author", author);
    }
    set.insert("updatedAt", BsonDateTime::now());

    let book = db
        .books()
        .update(&id, set)
        .await?
        .ok_or(ApiError::NotFound("Book not found"))?;

    Ok(HttpResponse::Ok().json(BookRecord::from(book)))
}

#[delete("/books/{id}", wrap = "from_fn(require_admin)")]
pub async fn delete_book(
    db: web::Data<MongoDbContext>,
    path: web::Path<String>,
    claims: web::ReqData<TokenClaims>,
) -> Result<HttpResponse> {
    let id = parse_object_id(&path, "Book not found")?;

    if db.books().find_by_id(&id).await?.is_none() {
        return Err(ApiError::NotFound("Book not found"));
    }

    db.books().delete(&id).await?;
    log::info!("Book {} deleted by admin {}", id.to_hex(), claims.subject);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Book has been deleted".to_string(),
    }))
}
