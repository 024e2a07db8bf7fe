use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel, Iterable, PrimaryKeyTrait,
};

use quill_core::error::RepoError;
use quill_core::ports::BaseRepository;

/// Generic PostgreSQL repository over one SeaORM entity.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    match err {
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync + Send,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + 'static,
    T: From<E::Model> + Into<E::ActiveModel> + Clone + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id).one(&self.db).await.map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    /// Upsert: insert, or overwrite every column when the key already exists.
    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let active_model: E::ActiveModel = entity.clone().into();
        let on_conflict = OnConflict::columns(<E::PrimaryKey as Iterable>::iter())
            .update_columns(<E::Column as Iterable>::iter())
            .to_owned();

        E::insert(active_model)
            .on_conflict(on_conflict)
            .exec_without_returning(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(entity)
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
