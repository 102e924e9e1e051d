//! Optimistic concurrency for updates.
//!
//! A write carries the revision the row had when it was read and only lands if
//! the stored revision still matches. When it does not land the row is looked up
//! again: if it is gone the failure is a `NotFound`, otherwise a `Conflict` the
//! caller may retry with a fresh read.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, sea_query::Expr,
};

use crate::core::CRUDResource;
use crate::errors::ApiError;

/// Write `merged` over the row `before` was read from, if nobody changed it since.
///
/// Only the fields `merged` marks as set are written, and the row's revision is
/// bumped in the same statement.
///
/// # Errors
///
/// `NotFound` if the row no longer exists, `Conflict` if its revision moved on,
/// or the store fault unchanged.
pub async fn save_if_unchanged<R, C>(
    conn: &C,
    before: &R::ModelType,
    merged: R::ActiveModelType,
) -> Result<(), ApiError>
where
    R: CRUDResource,
    C: ConnectionTrait,
{
    let id = R::model_id(before);
    let result = R::EntityType::update_many()
        .set(merged)
        .col_expr(R::REVISION_COLUMN, Expr::col(R::REVISION_COLUMN).add(1))
        .filter(R::ID_COLUMN.eq(id))
        .filter(R::REVISION_COLUMN.eq(R::model_revision(before)))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(reclassify_conflict::<R, C>(conn, id).await);
    }
    Ok(())
}

/// Decide what a write that matched no row means.
pub async fn reclassify_conflict<R, C>(conn: &C, id: &str) -> ApiError
where
    R: CRUDResource,
    C: ConnectionTrait,
{
    let still_there = R::EntityType::find()
        .filter(R::ID_COLUMN.eq(id))
        .count(conn)
        .await;

    match still_there {
        Ok(0) => R::not_found(id),
        Ok(_) => {
            tracing::debug!(resource = R::RESOURCE_NAME_SINGULAR, id, "Concurrent modification");
            ApiError::conflict(format!(
                "{} '{id}' was modified concurrently",
                R::RESOURCE_NAME_SINGULAR
            ))
        }
        Err(e) => ApiError::from(e),
    }
}
