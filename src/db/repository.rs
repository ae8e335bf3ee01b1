use futures_util::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::ReturnDocument,
    Client, Collection, Database,
};

use super::models::{Author, Book, User};
use crate::error::Result;

#[derive(Clone)]
pub struct MongoDbContext {
    db: Database,
}

impl MongoDbContext {
    pub fn new(client: Client, database_name: &str) -> Self {
        Self {
            db: client.database(database_name),
        }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository {
            collection: self.db.collection("users"),
        }
    }

    pub fn authors(&self) -> AuthorRepository {
        AuthorRepository {
            collection: self.db.collection("authors"),
        }
    }

    pub fn books(&self) -> BookRepository {
        BookRepository {
            collection: self.db.collection("books"),
        }
    }

    pub async fn init_indexes(&self) -> Result<()> {
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        // Email uniqueness is enforced here, not in application code.
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.db
            .collection::<User>("users")
            .create_index(email_index)
            .await?;

        let author_ref_index = IndexModel::builder().keys(doc! { "author": 1 }).build();

        self.db
            .collection::<Book>("books")
            .create_index(author_ref_index)
            .await?;

        log::info!("Database indexes created successfully");
        Ok(())
    }
}

#[derive(Clone)]
pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub async fn find_all(&self) -> Result<Vec<User>> {
        let mut cursor = self.collection.find(doc! {}).await?;

        let mut users = Vec::new();
        while let Some(user) = cursor.try_next().await? {
            users.push(user);
        }

        Ok(users)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self.collection.find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>> {
        let user = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(user)
    }

    pub async fn insert(&self, mut user: User) -> Result<User> {
        let result = self.collection.insert_one(&user).await?;
        user.id = result.inserted_id.as_object_id();
        Ok(user)
    }

    /// Applies `$set` fields and returns the document as it looks after the
    /// update, or None when the id does not exist.
    pub async fn update(&self, id: &ObjectId, set: Document) -> Result<Option<User>> {
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<()> {
        self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AuthorRepository {
    collection: Collection<Author>,
}

impl AuthorRepository {
    pub async fn find_all(&self) -> Result<Vec<Author>> {
        let mut cursor = self.collection.find(doc! {}).await?;

        let mut authors = Vec::new();
        while let Some(author) = cursor.try_next().await? {
            authors.push(author);
        }

        Ok(authors)
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Author>> {
        let author = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(author)
    }

    /// Batch lookup for reference expansion.
    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Author>> {
        let mut cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .await?;

        let mut authors = Vec::new();
        while let Some(author) = cursor.try_next().await? {
            authors.push(author);
        }

        Ok(authors)
    }

    pub async fn insert(&self, mut author: Author) -> Result<Author> {
        let result = self.collection.insert_one(&author).await?;
        author.id = result.inserted_id.as_object_id();
        Ok(author)
    }

    pub async fn update(&self, id: &ObjectId, set: Document) -> Result<Option<Author>> {
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<()> {
        self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct BookRepository {
    collection: Collection<Book>,
}

impl BookRepository {
    pub async fn find_all(&self) -> Result<Vec<Book>> {
        let mut cursor = self.collection.find(doc! {}).await?;

        let mut books = Vec::new();
        while let Some(book) = cursor.try_next().await? {
            books.push(book);
        }

        Ok(books)
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Book>> {
        let book = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(book)
    }

    pub async fn insert(&self, mut book: Book) -> Result<Book> {
        let result = self.collection.insert_one(&book).await?;
        book.id = result.inserted_id.as_object_id();
        Ok(book)
    }

    pub async fn update(&self, id: &ObjectId, set: Document) -> Result<Option<Book>> {
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<()> {
        self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }
}
