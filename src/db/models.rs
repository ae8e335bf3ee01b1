use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_AUTHOR_IMAGE: &str = "default-img.png";

/// The two cover kinds a book may carry. Stored as plain strings; the
/// validation layer enforces membership before anything reaches the
/// database.
pub const COVER_VALUES: [&str; 2] = ["Soft Cover", "Hard Cover"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub username: String,
    /// bcrypt hash. The plaintext is discarded at construction and this
    /// field never appears in a response body.
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, username: String, password: &str) -> Result<Self> {
        let password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        let now = Utc::now();

        Ok(Self {
            id: None,
            email,
            username,
            password,
            is_admin: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn verify_password(&self, password: &str) -> Result<bool> {
        Ok(bcrypt::verify(password, &self.password)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub image: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Author {
    pub fn new(
        first_name: String,
        last_name: String,
        nationality: String,
        image: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: None,
            first_name,
            last_name,
            nationality,
            image: image.unwrap_or_else(|| DEFAULT_AUTHOR_IMAGE.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub cover: String,
    /// Reference to the Author collection. Not cascade-protected: deleting
    /// an author leaves this id dangling and expansion renders null.
    pub author: ObjectId,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn new(
        title: String,
        description: String,
        price: f64,
        cover: String,
        author: ObjectId,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: None,
            title,
            description,
            price,
            cover,
            author,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_new_hashes_password() {
        let user = User::new(
            "a@x.com".to_string(),
            "ann".to_string(),
            "secret1",
        )
        .unwrap();

        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password, "secret1");
        assert!(!user.is_admin);
        assert!(user.id.is_none());
    }

    #[test]
    fn verify_password_correct() {
        let user = User::new("a@x.com".to_string(), "ann".to_string(), "secret1").unwrap();
        assert!(user.verify_password("secret1").unwrap());
    }

    #[test]
    fn verify_password_incorrect() {
        let user = User::new("a@x.com".to_string(), "ann".to_string(), "secret1").unwrap();
        assert!(!user.verify_password("wrong").unwrap());
    }

    #[test]
    fn author_image_defaults() {
        let author = Author::new(
            "Gabriel".to_string(),
            "Marquez".to_string(),
            "Colombian".to_string(),
            None,
        );
        assert_eq!(author.image, DEFAULT_AUTHOR_IMAGE);

        let author = Author::new(
            "Gabriel".to_string(),
            "Marquez".to_string(),
            "Colombian".to_string(),
            Some("gabo.png".to_string()),
        );
        assert_eq!(author.image, "gabo.png");
    }

    #[test]
    fn book_new_keeps_reference() {
        let author_id = ObjectId::new();
        let book = Book::new(
            "Solitude".to_string(),
            "A hundred years of it".to_string(),
            19.5,
            "Hard Cover".to_string(),
            author_id,
        );

        assert_eq!(book.author, author_id);
        assert_eq!(book.created_at, book.updated_at);
    }
}
