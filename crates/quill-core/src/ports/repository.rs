use async_trait::async_trait;

use crate::domain::{LoginAttemptState, Post};
use crate::error::RepoError;

/// Generic repository trait over a single key-value style table.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity, replacing any stored entity with the same ID.
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Returns `RepoError::NotFound` if nothing was stored.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Post repository, keyed by the post's timestamp id.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    /// Every stored post, oldest id first. Used to rebuild the cache at startup.
    async fn find_all(&self) -> Result<Vec<Post>, RepoError>;
}

/// Login attempt repository, keyed by username.
pub trait LoginAttemptRepository: BaseRepository<LoginAttemptState, String> {}
