//! In-memory repositories - used when no database is configured.
//!
//! Data is lost on process restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::domain::{LoginAttemptState, Post};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, LoginAttemptRepository, PostRepository};

/// Posts keyed by id, kept in id order.
#[derive(Default)]
pub struct InMemoryPostRepository {
    rows: RwLock<BTreeMap<i64, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for InMemoryPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }
}

/// Login attempt records keyed by username.
#[derive(Default)]
pub struct InMemoryLoginAttemptRepository {
    rows: RwLock<HashMap<String, LoginAttemptState>>,
}

impl InMemoryLoginAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<LoginAttemptState, String> for InMemoryLoginAttemptRepository {
    async fn find_by_id(&self, id: String) -> Result<Option<LoginAttemptState>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: LoginAttemptState) -> Result<LoginAttemptState, RepoError> {
        self.rows
            .write()
            .await
            .insert(entity.username.clone(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: String) -> Result<(), RepoError> {
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

impl LoginAttemptRepository for InMemoryLoginAttemptRepository {}
