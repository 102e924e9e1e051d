use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DatabaseTransaction, EntityTrait, FromQueryResult, IntoActiveModel,
    ModelTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};

use crate::errors::ApiError;
use crate::filtering::{ApplyWhere, FieldComparator, apply_order_by, apply_skip, apply_take};
use crate::models::{FindManyArgs, MetadataDto};
use crate::optimistic::save_if_unchanged;

pub trait MergeIntoActiveModel<ActiveModelType> {
    /// Overwrite the fields of `existing` that this patch sets, leaving the rest untouched.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` if a patched value is not storable.
    fn merge_into_activemodel(self, existing: ActiveModelType) -> Result<ActiveModelType, ApiError>;
}

/// Relation-valued part of an update patch that replaces a child collection.
pub trait ChildPatch {
    /// Take the child ids the patch wants attached, if it touches the collection.
    fn take_child_ids(&mut self) -> Option<Vec<String>> {
        None
    }
}

/// The per-entity service contract: list, get, create, update, delete and count.
///
/// Only `create`, `project` and the column/field descriptions are entity
/// specific; every other operation is provided here and shared by all entities.
#[async_trait]
pub trait CRUDResource: Sized + Send + Sync {
    type EntityType: EntityTrait<Model = Self::ModelType> + Sync;
    type ModelType: ModelTrait<Entity = Self::EntityType>
        + FromQueryResult
        + IntoActiveModel<Self::ActiveModelType>
        + Clone
        + Send
        + Sync;
    type ColumnType: ColumnTrait + Copy + Send + Sync + std::fmt::Debug;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>
        + ActiveModelBehavior
        + Send
        + Sync;
    type CreateModel: Send + Sync;
    type UpdateModel: MergeIntoActiveModel<Self::ActiveModelType> + ChildPatch + Send + Sync;
    type WhereModel: ApplyWhere + Default + Send + Sync;

    const ID_COLUMN: Self::ColumnType;
    /// Optimistic concurrency token, bumped by every engine write to the row.
    const REVISION_COLUMN: Self::ColumnType;
    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;

    fn model_id(model: &Self::ModelType) -> &str;

    fn model_revision(model: &Self::ModelType) -> i64;

    /// Field name to comparison used by `sort_by`.
    #[must_use]
    fn sortable_fields() -> Vec<(&'static str, FieldComparator<Self::ModelType>)>;

    /// Turn stored rows into their external shape, relations flattened to ids.
    async fn project(
        db: &DatabaseConnection,
        models: Vec<Self::ModelType>,
    ) -> Result<Vec<Self>, ApiError>;

    async fn create(
        db: &DatabaseConnection,
        create_model: Self::CreateModel,
    ) -> Result<Self, ApiError>;

    /// Replace the child collection named by an update patch.
    ///
    /// Entities without a child collection keep the default, which does nothing.
    async fn replace_children(
        _txn: &DatabaseTransaction,
        _id: &str,
        _child_ids: &[String],
    ) -> Result<(), ApiError> {
        Ok(())
    }

    #[must_use]
    fn not_found(id: &str) -> ApiError {
        ApiError::not_found(Self::RESOURCE_NAME_SINGULAR, Some(id.to_string()))
    }

    /// List rows under a mandatory `scope` plus the caller's filter, then
    /// skip, take and finally order the window.
    async fn find_scoped(
        db: &DatabaseConnection,
        scope: Condition,
        args: &FindManyArgs<Self::WhereModel>,
    ) -> Result<Vec<Self>, ApiError> {
        let condition = scope.add(args.filter.condition());
        let query = Self::EntityType::find().filter(condition);
        let query = apply_take(apply_skip(query, args.skip), args.take);

        let mut models = query.all(db).await?;
        apply_order_by(&mut models, args.sort_by.as_deref(), &Self::sortable_fields());

        tracing::debug!(
            resource = Self::RESOURCE_NAME_PLURAL,
            rows = models.len(),
            "Listed rows"
        );
        Self::project(db, models).await
    }

    async fn get_all(
        db: &DatabaseConnection,
        args: &FindManyArgs<Self::WhereModel>,
    ) -> Result<Vec<Self>, ApiError> {
        Self::find_scoped(db, Condition::all(), args).await
    }

    async fn get_one(db: &DatabaseConnection, id: &str) -> Result<Self, ApiError> {
        let scope = Condition::all().add(Self::ID_COLUMN.eq(id));
        Self::find_scoped(db, scope, &FindManyArgs::default())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(id))
    }

    /// Count rows matching `filter`, ignoring pagination.
    async fn total_count(
        db: &DatabaseConnection,
        filter: &Self::WhereModel,
    ) -> Result<MetadataDto, ApiError> {
        let query = Self::EntityType::find().filter(filter.condition());
        let count = PaginatorTrait::count(query, db).await?;
        Ok(MetadataDto { count })
    }

    /// Partial update: only the fields the patch sets are written.
    ///
    /// # Errors
    ///
    /// `NotFound` if the row is absent (or vanished during the write), `Conflict`
    /// if another writer changed it between the read and the write.
    async fn update(
        db: &DatabaseConnection,
        id: &str,
        update_model: Self::UpdateModel,
    ) -> Result<(), ApiError> {
        let existing = Self::EntityType::find()
            .filter(Self::ID_COLUMN.eq(id))
            .one(db)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        Self::update_if_unchanged(db, &existing, update_model).await
    }

    /// Apply a patch to the row as it was when `before` was read.
    ///
    /// The field write and any child replacement share one transaction, so a
    /// rejected write leaves the children untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` if the row has been deleted since, `Conflict` if it has been
    /// changed since.
    async fn update_if_unchanged(
        db: &DatabaseConnection,
        before: &Self::ModelType,
        update_model: Self::UpdateModel,
    ) -> Result<(), ApiError> {
        let mut update_model = update_model;
        let child_ids = update_model.take_child_ids();
        let id = Self::model_id(before);

        let merged = update_model.merge_into_activemodel(before.clone().into_active_model())?;

        let txn = db.begin().await?;
        save_if_unchanged::<Self, _>(&txn, before, merged).await?;

        if let Some(child_ids) = child_ids {
            Self::replace_children(&txn, id, &child_ids).await?;
        }
        txn.commit().await?;

        tracing::debug!(resource = Self::RESOURCE_NAME_SINGULAR, id, "Updated row");
        Ok(())
    }

    async fn delete(db: &DatabaseConnection, id: &str) -> Result<(), ApiError> {
        let res = Self::EntityType::delete_many()
            .filter(Self::ID_COLUMN.eq(id))
            .exec(db)
            .await?;
        match res.rows_affected {
            0 => Err(Self::not_found(id)),
            _ => {
                tracing::debug!(resource = Self::RESOURCE_NAME_SINGULAR, id, "Deleted row");
                Ok(())
            }
        }
    }
}

/// Fail with `NotFound` unless a row with `id` exists.
pub async fn ensure_exists<R, C>(conn: &C, id: &str) -> Result<(), ApiError>
where
    R: CRUDResource,
    C: ConnectionTrait,
{
    let count = R::EntityType::find()
        .filter(R::ID_COLUMN.eq(id))
        .count(conn)
        .await?;
    if count == 0 {
        return Err(R::not_found(id));
    }
    Ok(())
}

/// `Some(id)` when a row with `id` exists, `None` otherwise.
pub async fn resolve_id<R, C>(conn: &C, id: &str) -> Result<Option<String>, ApiError>
where
    R: CRUDResource,
    C: ConnectionTrait,
{
    match ensure_exists::<R, C>(conn, id).await {
        Ok(()) => Ok(Some(id.to_string())),
        Err(ApiError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
