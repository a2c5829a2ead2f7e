use crate::models::Mapping;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    DuplicateCode,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create table and indexes)
    async fn init(&self) -> Result<()>;

    /// Find the mapping for an exact original URL.
    /// When a creation race left several rows for one URL, the oldest wins.
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<Mapping>>;

    /// Find the mapping for a short code
    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<Mapping>>;

    /// Insert a new mapping with zero clicks.
    /// Fails with [`StorageError::DuplicateCode`] if the code is taken.
    async fn insert(&self, short_code: &str, original_url: &str) -> StorageResult<Mapping>;

    /// Atomically add one click to the mapping for `short_code`
    async fn increment_clicks(&self, short_code: &str) -> Result<()>;
}
