//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{EntityTrait, QueryOrder};

use quill_core::domain::Post;
use quill_core::error::RepoError;
use quill_core::ports::{LoginAttemptRepository, PostRepository};

use super::entity::login_attempt::Entity as LoginAttemptEntity;
use super::entity::post::{self, Entity as PostEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL login attempt repository.
pub type PostgresLoginAttemptRepository = PostgresBaseRepository<LoginAttemptEntity>;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(count = result.len(), "Loaded posts");
        Ok(result.into_iter().map(Into::into).collect())
    }
}

impl LoginAttemptRepository for PostgresLoginAttemptRepository {}
