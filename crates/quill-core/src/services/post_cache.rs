//! In-process mirror of the posts table.
//!
//! Every mutation writes to the repository first and only touches the local
//! collection once that write has succeeded. Mutations are serialized: each
//! holds the writer guard from its existence check through the repository
//! call to the reflect step, so storage and cache see them in the same order.
//! Readers only take the collection lock and are never blocked by a slow
//! repository call.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use super::{DEFAULT_STORAGE_TIMEOUT, within};
use crate::domain::{self, Post};
use crate::error::{DomainError, RepoError};
use crate::ports::PostRepository;

pub struct PostCache {
    repo: Arc<dyn PostRepository>,
    posts: RwLock<Vec<Post>>,
    /// Held by create, update and delete for their whole check-write-reflect run.
    writer: Mutex<()>,
    /// Highest id handed out or seen, for `next_id`.
    last_id: AtomicI64,
    storage_timeout: Duration,
}

impl PostCache {
    /// Build a cache around posts that are already known to be stored.
    pub fn new(repo: Arc<dyn PostRepository>, posts: Vec<Post>) -> Self {
        let last_id = posts.iter().map(|p| p.id).max().unwrap_or(0);
        Self {
            repo,
            posts: RwLock::new(posts),
            writer: Mutex::new(()),
            last_id: AtomicI64::new(last_id),
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Rebuild the cache from everything in the repository.
    pub async fn load(
        repo: Arc<dyn PostRepository>,
        storage_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let posts = within(storage_timeout, repo.find_all()).await?;
        tracing::info!(count = posts.len(), "Post cache loaded");
        Ok(Self::new(repo, posts).with_storage_timeout(storage_timeout))
    }

    /// Allocate an id for a new post: the current second, or the next free
    /// second if that one is already taken.
    pub fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp();
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(candidate.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        candidate.max(previous + 1)
    }

    pub async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let id = post.id;
        let _writer = self.writer.lock().await;
        if self.contains(id).await {
            return Err(DomainError::Duplicate(format!("post {id} already exists")));
        }

        let saved = within(self.storage_timeout, self.repo.save(post)).await?;

        self.posts.write().await.push(saved.clone());
        self.last_id.fetch_max(saved.id, Ordering::SeqCst);

        tracing::info!(post_id = saved.id, "Post created");
        Ok(saved)
    }

    /// Replace every editable field of post `id`.
    ///
    /// The post must already be cached; an unknown id fails before anything
    /// is written to storage.
    pub async fn update(&self, id: i64, post: Post) -> Result<Post, DomainError> {
        if post.id != id {
            return Err(DomainError::Validation(format!(
                "post id {} does not match target {id}",
                post.id
            )));
        }
        let _writer = self.writer.lock().await;
        if !self.contains(id).await {
            return Err(DomainError::post_not_found(id));
        }

        let saved = within(self.storage_timeout, self.repo.save(post)).await?;

        let mut posts = self.posts.write().await;
        if let Some(slot) = posts.iter_mut().find(|p| p.id == id) {
            *slot = saved.clone();
        }

        tracing::info!(post_id = id, "Post updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let _writer = self.writer.lock().await;
        if !self.contains(id).await {
            return Err(DomainError::post_not_found(id));
        }

        match within(self.storage_timeout, self.repo.delete(id)).await {
            // Already gone from storage: the cache entry is stale either way.
            Ok(()) | Err(RepoError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let mut posts = self.posts.write().await;
        if let Some(pos) = posts.iter().position(|p| p.id == id) {
            posts.remove(pos);
        }

        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    /// Snapshot of the collection in insertion order.
    pub async fn list(&self) -> Vec<Post> {
        self.posts.read().await.clone()
    }

    pub async fn list_newest_first(&self) -> Vec<Post> {
        domain::sort_newest_first(&self.posts.read().await)
    }

    pub async fn tags(&self) -> BTreeSet<String> {
        domain::aggregate_tags(&self.posts.read().await)
    }

    pub async fn with_tag(&self, tag: &str) -> Vec<Post> {
        domain::filter_by_tag(&self.posts.read().await, tag)
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }

    async fn contains(&self, id: i64) -> bool {
        self.posts.read().await.iter().any(|p| p.id == id)
    }
}
