//! # Relationship Association Engine
//!
//! Parent/child collections that are stored as a single nullable foreign key on
//! the child but managed as a set on the parent.
//!
//! Because a child can point at one parent only, connecting a child that
//! currently belongs to another parent moves it: the old parent silently loses
//! it. Disconnecting clears the key and replacing the collection clears it for
//! every child left out. No child row is ever deleted.
//!
//! ```rust,ignore
//! use relation::association::{Association, CustomerOrders};
//!
//! CustomerOrders::connect(&db, "c1", &["o1".into(), "o2".into()]).await?;
//! CustomerOrders::disconnect(&db, "c1", &["o2".into()]).await?;
//! let orders = CustomerOrders::find_children(&db, "c1", &FindManyArgs::default()).await?;
//! ```

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, TransactionTrait, sea_query::Expr,
};
use std::collections::{HashMap, HashSet};

use crate::core::{CRUDResource, ensure_exists};
use crate::entities::{OrderColumn, OrderItemColumn};
use crate::errors::ApiError;
use crate::models::FindManyArgs;
use crate::services::{Customer, Order, OrderItem};

/// Ids bound per statement, below the smallest backend parameter limit.
pub const ID_CHUNK: usize = 500;

type ChildColumn<A> = <<A as Association>::Child as CRUDResource>::ColumnType;

/// A one-to-many relation exposed as a managed set of children.
#[async_trait]
pub trait Association: Sized + Send + Sync {
    type Parent: CRUDResource;
    type Child: CRUDResource;

    /// Column on the child table holding the parent id.
    const FOREIGN_KEY: ChildColumn<Self>;

    /// Add the existing rows among `child_ids` to the parent's collection.
    ///
    /// Children already attached are left alone. A child attached to a
    /// different parent is moved to this one.
    ///
    /// # Errors
    ///
    /// `NotFound` if the parent does not exist or none of `child_ids` does.
    async fn connect(
        db: &DatabaseConnection,
        parent_id: &str,
        child_ids: &[String],
    ) -> Result<(), ApiError> {
        let txn = db.begin().await?;
        ensure_exists::<Self::Parent, _>(&txn, parent_id).await?;

        let resolved = resolve_children::<Self, _>(&txn, child_ids).await?;
        if resolved.is_empty() {
            return Err(ApiError::not_found(
                <Self::Child as CRUDResource>::RESOURCE_NAME_SINGULAR,
                None,
            ));
        }

        log_reparents::<Self>(parent_id, &resolved);
        let to_connect = not_attached_to(parent_id, resolved);

        let connected = set_parent::<Self, _>(&txn, Some(parent_id), &to_connect).await?;
        txn.commit().await?;

        tracing::debug!(
            parent = <Self::Parent as CRUDResource>::RESOURCE_NAME_SINGULAR,
            id = parent_id,
            connected,
            "Connected children"
        );
        Ok(())
    }

    /// Remove `child_ids` from the parent's collection.
    ///
    /// Ids that do not exist or belong elsewhere are ignored.
    ///
    /// # Errors
    ///
    /// `NotFound` if the parent does not exist.
    async fn disconnect(
        db: &DatabaseConnection,
        parent_id: &str,
        child_ids: &[String],
    ) -> Result<(), ApiError> {
        let txn = db.begin().await?;
        ensure_exists::<Self::Parent, _>(&txn, parent_id).await?;

        let mut disconnected = 0;
        for chunk in child_ids.chunks(ID_CHUNK) {
            let res = <Self::Child as CRUDResource>::EntityType::update_many()
                .col_expr(Self::FOREIGN_KEY, Expr::value(Option::<String>::None))
                .col_expr(
                    <Self::Child as CRUDResource>::REVISION_COLUMN,
                    Expr::col(<Self::Child as CRUDResource>::REVISION_COLUMN).add(1),
                )
                .filter(<Self::Child as CRUDResource>::ID_COLUMN.is_in(chunk.iter().cloned()))
                .filter(Self::FOREIGN_KEY.eq(parent_id))
                .exec(&txn)
                .await?;
            disconnected += res.rows_affected;
        }
        txn.commit().await?;

        tracing::debug!(
            parent = <Self::Parent as CRUDResource>::RESOURCE_NAME_SINGULAR,
            id = parent_id,
            disconnected,
            "Disconnected children"
        );
        Ok(())
    }

    /// Make the parent's collection exactly the existing rows among `child_ids`.
    ///
    /// Children left out lose their parent; they are not deleted.
    ///
    /// # Errors
    ///
    /// `NotFound` if the parent does not exist or none of `child_ids` does.
    async fn replace(
        db: &DatabaseConnection,
        parent_id: &str,
        child_ids: &[String],
    ) -> Result<(), ApiError> {
        let txn = db.begin().await?;
        ensure_exists::<Self::Parent, _>(&txn, parent_id).await?;

        let resolved = resolve_children::<Self, _>(&txn, child_ids).await?;
        if resolved.is_empty() {
            return Err(ApiError::not_found(
                <Self::Child as CRUDResource>::RESOURCE_NAME_SINGULAR,
                None,
            ));
        }

        write_children::<Self, _>(&txn, parent_id, resolved).await?;
        txn.commit().await?;
        Ok(())
    }

    /// List the parent's children, narrowed further by the caller's filter.
    ///
    /// An unknown parent simply has no children.
    async fn find_children(
        db: &DatabaseConnection,
        parent_id: &str,
        args: &FindManyArgs<<Self::Child as CRUDResource>::WhereModel>,
    ) -> Result<Vec<Self::Child>, ApiError> {
        let scope = Condition::all().add(Self::FOREIGN_KEY.eq(parent_id));
        <Self::Child as CRUDResource>::find_scoped(db, scope, args).await
    }

    /// The parent the child `child_id` currently belongs to.
    ///
    /// # Errors
    ///
    /// `NotFound` for the child if it does not exist, or for the parent if the
    /// child has none.
    async fn get_parent(db: &DatabaseConnection, child_id: &str) -> Result<Self::Parent, ApiError> {
        let parent_id: Option<Option<String>> = <Self::Child as CRUDResource>::EntityType::find()
            .select_only()
            .column(Self::FOREIGN_KEY)
            .filter(<Self::Child as CRUDResource>::ID_COLUMN.eq(child_id))
            .into_tuple()
            .one(db)
            .await?;

        match parent_id {
            None => Err(<Self::Child as CRUDResource>::not_found(child_id)),
            Some(None) => Err(ApiError::not_found(
                <Self::Parent as CRUDResource>::RESOURCE_NAME_SINGULAR,
                None,
            )),
            Some(Some(parent_id)) => <Self::Parent as CRUDResource>::get_one(db, &parent_id).await,
        }
    }
}

/// A customer's orders, keyed by `orders.customer_id`.
pub struct CustomerOrders;

impl Association for CustomerOrders {
    type Parent = Customer;
    type Child = Order;

    const FOREIGN_KEY: OrderColumn = OrderColumn::CustomerId;
}

/// An order's items, keyed by `order_items.order_id`.
pub struct OrderOrderItems;

impl Association for OrderOrderItems {
    type Parent = Order;
    type Child = OrderItem;

    const FOREIGN_KEY: OrderItemColumn = OrderItemColumn::OrderId;
}

/// Existing children among `child_ids`, each with the parent it points at now.
///
/// Duplicate ids resolve once.
async fn resolve_children<A, C>(
    conn: &C,
    child_ids: &[String],
) -> Result<Vec<(String, Option<String>)>, ApiError>
where
    A: Association,
    C: ConnectionTrait,
{
    let mut wanted = child_ids.to_vec();
    wanted.sort();
    wanted.dedup();

    let mut resolved = Vec::with_capacity(wanted.len());
    for chunk in wanted.chunks(ID_CHUNK) {
        let rows: Vec<(String, Option<String>)> = <A::Child as CRUDResource>::EntityType::find()
            .select_only()
            .column(<A::Child as CRUDResource>::ID_COLUMN)
            .column(A::FOREIGN_KEY)
            .filter(<A::Child as CRUDResource>::ID_COLUMN.is_in(chunk.iter().cloned()))
            .into_tuple()
            .all(conn)
            .await?;
        resolved.extend(rows);
    }
    Ok(resolved)
}

/// Log every resolved child that currently belongs to a parent other than `parent_id`.
fn log_reparents<A: Association>(parent_id: &str, resolved: &[(String, Option<String>)]) {
    for (child_id, current) in resolved {
        if let Some(current) = current.as_deref().filter(|current| *current != parent_id) {
            tracing::info!(
                child = <A::Child as CRUDResource>::RESOURCE_NAME_SINGULAR,
                id = %child_id,
                from = current,
                to = parent_id,
                "Reparenting child"
            );
        }
    }
}

/// Ids among `resolved` whose foreign key is not already `parent_id`.
fn not_attached_to(parent_id: &str, resolved: Vec<(String, Option<String>)>) -> Vec<String> {
    resolved
        .into_iter()
        .filter(|(_, current)| current.as_deref() != Some(parent_id))
        .map(|(child_id, _)| child_id)
        .collect()
}

/// Point every child in `child_ids` at `parent_id` (or at nothing).
async fn set_parent<A, C>(
    conn: &C,
    parent_id: Option<&str>,
    child_ids: &[String],
) -> Result<u64, ApiError>
where
    A: Association,
    C: ConnectionTrait,
{
    let mut updated = 0;
    for chunk in child_ids.chunks(ID_CHUNK) {
        let res = <A::Child as CRUDResource>::EntityType::update_many()
            .col_expr(A::FOREIGN_KEY, Expr::value(parent_id.map(str::to_string)))
            .col_expr(
                <A::Child as CRUDResource>::REVISION_COLUMN,
                Expr::col(<A::Child as CRUDResource>::REVISION_COLUMN).add(1),
            )
            .filter(<A::Child as CRUDResource>::ID_COLUMN.is_in(chunk.iter().cloned()))
            .exec(conn)
            .await?;
        updated += res.rows_affected;
    }
    Ok(updated)
}

/// Attach the existing rows among `child_ids` to a freshly created parent.
///
/// Unknown ids are skipped without error.
pub async fn attach_children<A, C>(
    conn: &C,
    parent_id: &str,
    child_ids: &[String],
) -> Result<(), ApiError>
where
    A: Association,
    C: ConnectionTrait,
{
    let resolved = resolve_children::<A, _>(conn, child_ids).await?;
    log_reparents::<A>(parent_id, &resolved);
    let to_attach = not_attached_to(parent_id, resolved);

    let attached = set_parent::<A, _>(conn, Some(parent_id), &to_attach).await?;
    tracing::debug!(
        parent = <A::Parent as CRUDResource>::RESOURCE_NAME_SINGULAR,
        id = parent_id,
        attached,
        "Attached children on create"
    );
    Ok(())
}

/// Set the parent's collection to exactly the existing rows among `child_ids`.
///
/// Does not require any id to resolve: an empty resolution detaches every child.
pub async fn overwrite_children<A, C>(
    conn: &C,
    parent_id: &str,
    child_ids: &[String],
) -> Result<(), ApiError>
where
    A: Association,
    C: ConnectionTrait,
{
    let resolved = resolve_children::<A, _>(conn, child_ids).await?;
    write_children::<A, _>(conn, parent_id, resolved).await
}

/// Make `resolved` the parent's whole collection.
///
/// Current children missing from `resolved` are detached, and children owned
/// by another parent are moved here.
async fn write_children<A, C>(
    conn: &C,
    parent_id: &str,
    resolved: Vec<(String, Option<String>)>,
) -> Result<(), ApiError>
where
    A: Association,
    C: ConnectionTrait,
{
    let current: Vec<String> = <A::Child as CRUDResource>::EntityType::find()
        .select_only()
        .column(<A::Child as CRUDResource>::ID_COLUMN)
        .filter(A::FOREIGN_KEY.eq(parent_id))
        .into_tuple()
        .all(conn)
        .await?;

    let keep: HashSet<&str> = resolved.iter().map(|(id, _)| id.as_str()).collect();
    let to_detach: Vec<String> = current
        .into_iter()
        .filter(|id| !keep.contains(id.as_str()))
        .collect();

    log_reparents::<A>(parent_id, &resolved);
    let to_attach = not_attached_to(parent_id, resolved);

    let detached = set_parent::<A, _>(conn, None, &to_detach).await?;
    let attached = set_parent::<A, _>(conn, Some(parent_id), &to_attach).await?;

    tracing::debug!(
        parent = <A::Parent as CRUDResource>::RESOURCE_NAME_SINGULAR,
        id = parent_id,
        detached,
        attached,
        "Replaced children"
    );
    Ok(())
}

/// Child ids per parent id, for flattening a collection into the projection.
///
/// Every parent in `parent_ids` gets an entry, sorted by child id.
pub async fn load_child_ids<A, C>(
    conn: &C,
    parent_ids: &[String],
) -> Result<HashMap<String, Vec<String>>, ApiError>
where
    A: Association,
    C: ConnectionTrait,
{
    let mut children: HashMap<String, Vec<String>> = parent_ids
        .iter()
        .map(|id| (id.clone(), Vec::new()))
        .collect();

    for chunk in parent_ids.chunks(ID_CHUNK) {
        let rows: Vec<(String, Option<String>)> = <A::Child as CRUDResource>::EntityType::find()
            .select_only()
            .column(<A::Child as CRUDResource>::ID_COLUMN)
            .column(A::FOREIGN_KEY)
            .filter(A::FOREIGN_KEY.is_in(chunk.iter().cloned()))
            .into_tuple()
            .all(conn)
            .await?;

        for (child_id, parent_id) in rows {
            if let Some(parent_id) = parent_id {
                children.entry(parent_id).or_default().push(child_id);
            }
        }
    }
    for ids in children.values_mut() {
        ids.sort();
    }
    Ok(children)
}
