use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewProduct, Product, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const BARCODE_CONSTRAINT: &str = "products_barcode_key";
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unique constraint `{0}` violated")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                RepositoryError::Conflict(constraint)
            }
            other => RepositoryError::Database(other),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;

    /// Ordered by name.
    async fn find_all_for_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Product>>;

    /// First save; the store assigns the id and timestamps.
    async fn insert(&self, product: NewProduct) -> RepositoryResult<Product>;

    async fn update(&self, product: &Product) -> RepositoryResult<Product>;

    async fn delete(&self, id: i32) -> RepositoryResult<()>;
}

/// Hands out barcodes atomically so concurrent creates never race.
#[async_trait]
pub trait BarcodeSequence: Send + Sync {
    async fn next_barcode(&self) -> RepositoryResult<String>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    async fn insert(&self, email: &str, password_hash: &str) -> RepositoryResult<User>;

    /// Removes the user together with every product they own.
    async fn delete(&self, id: i32) -> RepositoryResult<()>;
}

pub(crate) fn format_barcode(sequence: i64) -> String {
    format!("{:013}", sequence)
}
