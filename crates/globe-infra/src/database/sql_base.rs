use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel,
    PrimaryKeyTrait,
};

use globe_core::error::RepoError;
use globe_core::ports::BaseRepository;

use super::persistence::SqlPersistence;

/// Generic SQL repository implementation.
///
/// Holds the persistence layer rather than a connection so the database is
/// brought up lazily by whichever request touches it first.
pub struct SqlBaseRepository<E>
where
    E: EntityTrait,
{
    persistence: Arc<SqlPersistence>,
    _entity: PhantomData<E>,
}

impl<E> SqlBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(persistence: Arc<SqlPersistence>) -> Self {
        Self {
            persistence,
            _entity: PhantomData,
        }
    }

    pub(crate) async fn db(&self) -> Result<DbConn, RepoError> {
        self.persistence.connection().await
    }
}

pub(crate) fn query_err(e: DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

#[async_trait]
impl<E, T> BaseRepository<T> for SqlBaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = String>,
    T: From<E::Model> + Into<E::ActiveModel> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, RepoError> {
        let db = self.db().await?;
        let result = E::find_by_id(id.to_string())
            .one(&db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn insert(&self, entity: T) -> Result<T, RepoError> {
        let db = self.db().await?;
        let active_model: E::ActiveModel = entity.into();
        let model = active_model.insert(&db).await.map_err(query_err)?;
        Ok(model.into())
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let db = self.db().await?;
        let active_model: E::ActiveModel = entity.into();
        let model = active_model.update(&db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => RepoError::NotFound,
            other => query_err(other),
        })?;
        Ok(model.into())
    }

    async fn delete(&self, id: &str) -> Result<(), RepoError> {
        let db = self.db().await?;
        let result = E::delete_by_id(id.to_string())
            .exec(&db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
