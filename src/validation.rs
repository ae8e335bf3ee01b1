//! Per-entity payload validation. Every function here is pure: untrusted
//! payload in, validated values (trimmed, parsed) or the first violation
//! out. Field names in messages are the wire names.

use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

use crate::db::models::COVER_VALUES;
use crate::error::{ApiError, Result};

const EMAIL_MIN: usize = 5;
const EMAIL_MAX: usize = 100;
const USERNAME_MIN: usize = 2;
const USERNAME_MAX: usize = 200;
const PASSWORD_MIN: usize = 6;
const NAME_MIN: usize = 3;
const NAME_MAX: usize = 200;
const NATIONALITY_MIN: usize = 2;
const NATIONALITY_MAX: usize = 100;
const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 250;
const DESCRIPTION_MIN: usize = 5;

// ---------------------------------------------------------------------------
// Untrusted payloads. All fields are optional so that required-ness is a
// validation rule with its own message, not a deserialization failure.

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserPayload {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthorPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nationality: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthorPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nationality: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub cover: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub cover: Option<String>,
    pub author: Option<String>,
}

// ---------------------------------------------------------------------------
// Validated values.

#[derive(Debug)]
pub struct RegisterData {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub image: Option<String>,
}

#[derive(Debug, Default)]
pub struct AuthorUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nationality: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub cover: String,
    pub author: ObjectId,
}

#[derive(Debug, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub cover: Option<String>,
    pub author: Option<ObjectId>,
}

// ---------------------------------------------------------------------------
// Validators.

pub fn validate_register(payload: &RegisterPayload) -> Result<RegisterData> {
    Ok(RegisterData {
        email: email_field(required(&payload.email, "email")?)?,
        username: bounded(required(&payload.username, "username")?, "username", USERNAME_MIN, USERNAME_MAX)?,
        password: password_field(required(&payload.password, "password")?)?,
    })
}

pub fn validate_login(payload: &LoginPayload) -> Result<LoginData> {
    Ok(LoginData {
        email: email_field(required(&payload.email, "email")?)?,
        password: password_field(required(&payload.password, "password")?)?,
    })
}

pub fn validate_update_user(payload: &UpdateUserPayload) -> Result<UserUpdate> {
    let mut update = UserUpdate::default();

    if let Some(email) = payload.email.as_deref() {
        update.email = Some(email_field(email)?);
    }
    if let Some(username) = payload.username.as_deref() {
        update.username = Some(bounded(username, "username", USERNAME_MIN, USERNAME_MAX)?);
    }
    if let Some(password) = payload.password.as_deref() {
        update.password = Some(password_field(password)?);
    }

    Ok(update)
}

pub fn validate_create_author(payload: &CreateAuthorPayload) -> Result<NewAuthor> {
    Ok(NewAuthor {
        first_name: bounded(required(&payload.first_name, "firstName")?, "firstName", NAME_MIN, NAME_MAX)?,
        last_name: bounded(required(&payload.last_name, "lastName")?, "lastName", NAME_MIN, NAME_MAX)?,
        nationality: bounded(
            required(&payload.nationality, "nationality")?,
            "nationality",
            NATIONALITY_MIN,
            NATIONALITY_MAX,
        )?,
        image: payload.image.clone(),
    })
}

pub fn validate_update_author(payload: &UpdateAuthorPayload) -> Result<AuthorUpdate> {
    let mut update = AuthorUpdate::default();

    if let Some(first_name) = payload.first_name.as_deref() {
        update.first_name = Some(bounded(first_name, "firstName", NAME_MIN, NAME_MAX)?);
    }
    if let Some(last_name) = payload.last_name.as_deref() {
        update.last_name = Some(bounded(last_name, "lastName", NAME_MIN, NAME_MAX)?);
    }
    if let Some(nationality) = payload.nationality.as_deref() {
        update.nationality = Some(bounded(
            nationality,
            "nationality",
            NATIONALITY_MIN,
            NATIONALITY_MAX,
        )?);
    }
    update.image = payload.image.clone();

    Ok(update)
}

pub fn validate_create_book(payload: &CreateBookPayload) -> Result<NewBook> {
    Ok(NewBook {
        title: bounded(required(&payload.title, "title")?, "title", TITLE_MIN, TITLE_MAX)?,
        description: min_len(
            required(&payload.description, "description")?,
            "description",
            DESCRIPTION_MIN,
        )?,
        price: price_field(payload.price.ok_or_else(|| missing("price"))?)?,
        cover: cover_field(required(&payload.cover, "cover")?)?,
        author: author_ref(required(&payload.author, "author")?)?,
    })
}

pub fn validate_update_book(payload: &UpdateBookPayload) -> Result<BookUpdate> {
    let mut update = BookUpdate::default();

    if let Some(title) = payload.title.as_deref() {
        update.title = Some(bounded(title, "title", TITLE_MIN, TITLE_MAX)?);
    }
    if let Some(description) = payload.description.as_deref() {
        update.description = Some(min_len(description, "description", DESCRIPTION_MIN)?);
    }
    if let Some(price) = payload.price {
        update.price = Some(price_field(price)?);
    }
    if let Some(cover) = payload.cover.as_deref() {
        update.cover = Some(cover_field(cover)?);
    }
    if let Some(author) = payload.author.as_deref() {
        update.author = Some(author_ref(author)?);
    }

    Ok(update)
}

// ---------------------------------------------------------------------------
// Field rules.

fn missing(field: &str) -> ApiError {
    ApiError::Validation(format!("{field} is required"))
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

fn bounded(value: &str, field: &str, min: usize, max: usize) -> Result<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(value.to_string())
}

fn min_len(value: &str, field: &str, min: usize) -> Result<String> {
    let value = value.trim();
    if value.chars().count() < min {
        return Err(ApiError::Validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(value.to_string())
}

fn email_field(value: &str) -> Result<String> {
    let value = bounded(value, "email", EMAIL_MIN, EMAIL_MAX)?;
    if !is_email(&value) {
        return Err(ApiError::Validation(
            "email must be a valid email address".to_string(),
        ));
    }
    Ok(value)
}

fn password_field(value: &str) -> Result<String> {
    min_len(value, "password", PASSWORD_MIN)
}

fn price_field(value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::Validation(
            "price must be greater than or equal to 0".to_string(),
        ));
    }
    Ok(value)
}

fn cover_field(value: &str) -> Result<String> {
    let value = value.trim();
    if !COVER_VALUES.contains(&value) {
        return Err(ApiError::Validation(format!(
            "cover must be one of: {}",
            COVER_VALUES.join(", ")
        )));
    }
    Ok(value.to_string())
}

fn author_ref(value: &str) -> Result<ObjectId> {
    let value = value.trim();
    let is_hex_24 = value.len() == 24 && value.chars().all(|c| c.is_ascii_hexdigit());
    if !is_hex_24 {
        return Err(ApiError::Validation(
            "author must be a valid 24 character hex id".to_string(),
        ));
    }
    ObjectId::parse_str(value).map_err(|_| {
        ApiError::Validation("author must be a valid 24 character hex id".to_string())
    })
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}
