use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, Condition, DatabaseConnection, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::cmp::Ordering;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::association::{Association, OrderOrderItems};
use crate::core::{CRUDResource, ChildPatch, MergeIntoActiveModel, resolve_id};
use crate::entities::order_item::{ActiveModel, Column, Entity, Model, NAME_MAX_LENGTH};
use crate::errors::ApiError;
use crate::filtering::{ApplyWhere, FieldComparator, eq_opt, in_ids};

use super::Order;

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date: Option<DateTime<Utc>>,
    pub name: Option<String>,
    /// Id of the owning order
    pub order: Option<String>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct OrderItemCreate {
    pub id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date: Option<DateTime<Utc>>,
    #[schema(max_length = 1000)]
    pub name: Option<String>,
    /// Owning order; left unset if no such order exists
    pub order: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct OrderItemUpdate {
    /// Ignored: the row is always targeted by the id passed to `update`
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub date: Option<DateTime<Utc>>,
    #[schema(max_length = 1000)]
    pub name: Option<String>,
    /// Reassigns the owning order
    pub order: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct OrderItemWhereInput {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub date: Option<DateTime<Utc>>,
    pub name: Option<String>,
    /// Items belonging to any of these orders
    pub order: Option<Vec<String>>,
}

impl ApplyWhere for OrderItemWhereInput {
    fn condition(&self) -> Condition {
        Condition::all()
            .add_option(eq_opt(Column::Id, self.id.as_ref()))
            .add_option(eq_opt(Column::CreatedAt, self.created_at.as_ref()))
            .add_option(eq_opt(Column::UpdatedAt, self.updated_at.as_ref()))
            .add_option(eq_opt(Column::Date, self.date.as_ref()))
            .add_option(eq_opt(Column::Name, self.name.as_ref()))
            .add_option(in_ids(Column::OrderId, self.order.as_ref()))
    }
}

fn check_name(name: Option<&String>) -> Result<(), ApiError> {
    match name {
        Some(name) if name.chars().count() > NAME_MAX_LENGTH => Err(ApiError::bad_request(
            format!("name must be at most {NAME_MAX_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

impl MergeIntoActiveModel<ActiveModel> for OrderItemUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, ApiError> {
        check_name(self.name.as_ref())?;

        if let Some(created_at) = self.created_at {
            existing.created_at = Set(created_at);
        }
        if let Some(updated_at) = self.updated_at {
            existing.updated_at = Set(updated_at);
        }
        if let Some(date) = self.date {
            existing.date = Set(Some(date));
        }
        if let Some(name) = self.name {
            existing.name = Set(Some(name));
        }
        if let Some(order) = self.order {
            existing.order_id = Set(Some(order));
        }
        Ok(existing)
    }
}

impl ChildPatch for OrderItemUpdate {}

fn by_id(a: &Model, b: &Model) -> Ordering {
    a.id.cmp(&b.id)
}

fn by_created_at(a: &Model, b: &Model) -> Ordering {
    a.created_at.cmp(&b.created_at)
}

fn by_updated_at(a: &Model, b: &Model) -> Ordering {
    a.updated_at.cmp(&b.updated_at)
}

fn by_date(a: &Model, b: &Model) -> Ordering {
    a.date.cmp(&b.date)
}

fn by_name(a: &Model, b: &Model) -> Ordering {
    a.name.cmp(&b.name)
}

fn by_order(a: &Model, b: &Model) -> Ordering {
    a.order_id.cmp(&b.order_id)
}

#[async_trait]
impl CRUDResource for OrderItem {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = OrderItemCreate;
    type UpdateModel = OrderItemUpdate;
    type WhereModel = OrderItemWhereInput;

    const ID_COLUMN: Self::ColumnType = Column::Id;
    const REVISION_COLUMN: Self::ColumnType = Column::Revision;
    const RESOURCE_NAME_SINGULAR: &'static str = "OrderItem";
    const RESOURCE_NAME_PLURAL: &'static str = "OrderItems";

    fn model_id(model: &Model) -> &str {
        &model.id
    }

    fn model_revision(model: &Model) -> i64 {
        model.revision
    }

    fn sortable_fields() -> Vec<(&'static str, FieldComparator<Model>)> {
        vec![
            ("id", by_id as FieldComparator<Model>),
            ("created_at", by_created_at),
            ("updated_at", by_updated_at),
            ("date", by_date),
            ("name", by_name),
            ("order", by_order),
        ]
    }

    async fn project(_db: &DatabaseConnection, models: Vec<Model>) -> Result<Vec<Self>, ApiError> {
        Ok(models
            .into_iter()
            .map(|model| Self {
                id: model.id,
                created_at: model.created_at,
                updated_at: model.updated_at,
                date: model.date,
                name: model.name,
                order: model.order_id,
            })
            .collect())
    }

    async fn create(
        db: &DatabaseConnection,
        create_model: OrderItemCreate,
    ) -> Result<Self, ApiError> {
        check_name(create_model.name.as_ref())?;
        let id = create_model
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let txn = db.begin().await?;
        let order_id = match &create_model.order {
            Some(order) => resolve_id::<Order, _>(&txn, order).await?,
            None => None,
        };
        let active_model = ActiveModel {
            id: Set(id.clone()),
            created_at: Set(create_model.created_at),
            updated_at: Set(create_model.updated_at),
            date: Set(create_model.date),
            name: Set(create_model.name),
            order_id: Set(order_id),
            revision: Set(0),
        };
        Entity::insert(active_model).exec_without_returning(&txn).await?;
        txn.commit().await?;

        tracing::debug!(resource = Self::RESOURCE_NAME_SINGULAR, id = %id, "Created row");
        Self::get_one(db, &id).await
    }
}

impl OrderItem {
    /// The order this item belongs to.
    pub async fn get_order(db: &DatabaseConnection, id: &str) -> Result<Order, ApiError> {
        OrderOrderItems::get_parent(db, id).await
    }
}
