pub mod models;
pub mod repository;

pub use models::{Author, Book, User};
pub use repository::MongoDbContext;
