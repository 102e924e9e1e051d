use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::cmp::Ordering;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::association::{
    Association, CustomerOrders, OrderOrderItems, attach_children, load_child_ids,
    overwrite_children,
};
use crate::core::{CRUDResource, ChildPatch, MergeIntoActiveModel, resolve_id};
use crate::entities::order::{ActiveModel, Column, Entity, Model};
use crate::entities::{OrderItemColumn, OrderItemEntity};
use crate::errors::ApiError;
use crate::filtering::{ApplyWhere, FieldComparator, contains_child, eq_opt, in_ids};
use crate::models::FindManyArgs;

use super::{Customer, OrderItem};

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date: Option<DateTime<Utc>>,
    /// Id of the owning customer
    pub customer: Option<String>,
    pub order_items: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct OrderCreate {
    pub id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date: Option<DateTime<Utc>>,
    /// Owning customer; left unset if no such customer exists
    pub customer: Option<String>,
    pub order_items: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct OrderUpdate {
    /// Ignored: the row is always targeted by the id passed to `update`
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub date: Option<DateTime<Utc>>,
    /// Reassigns the owning customer
    pub customer: Option<String>,
    pub order_items: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct OrderWhereInput {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub date: Option<DateTime<Utc>>,
    /// Orders owned by any of these customers
    pub customer: Option<Vec<String>>,
    /// Orders containing any of these items
    pub order_items: Option<Vec<String>>,
}

impl ApplyWhere for OrderWhereInput {
    fn condition(&self) -> Condition {
        Condition::all()
            .add_option(eq_opt(Column::Id, self.id.as_ref()))
            .add_option(eq_opt(Column::CreatedAt, self.created_at.as_ref()))
            .add_option(eq_opt(Column::UpdatedAt, self.updated_at.as_ref()))
            .add_option(eq_opt(Column::Date, self.date.as_ref()))
            .add_option(in_ids(Column::CustomerId, self.customer.as_ref()))
            .add_option(contains_child(
                Column::Id,
                OrderItemEntity,
                OrderItemColumn::Id,
                OrderItemColumn::OrderId,
                self.order_items.as_ref(),
            ))
    }
}

impl MergeIntoActiveModel<ActiveModel> for OrderUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, ApiError> {
        if let Some(created_at) = self.created_at {
            existing.created_at = Set(created_at);
        }
        if let Some(updated_at) = self.updated_at {
            existing.updated_at = Set(updated_at);
        }
        if let Some(date) = self.date {
            existing.date = Set(Some(date));
        }
        if let Some(customer) = self.customer {
            existing.customer_id = Set(Some(customer));
        }
        Ok(existing)
    }
}

impl ChildPatch for OrderUpdate {
    fn take_child_ids(&mut self) -> Option<Vec<String>> {
        self.order_items.take()
    }
}

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

fn by_customer(a: &Model, b: &Model) -> Ordering {
    a.customer_id.cmp(&b.customer_id)
}

#[async_trait]
impl CRUDResource for Order {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = OrderCreate;
    type UpdateModel = OrderUpdate;
    type WhereModel = OrderWhereInput;

    const ID_COLUMN: Self::ColumnType = Column::Id;
    const REVISION_COLUMN: Self::ColumnType = Column::Revision;
    const RESOURCE_NAME_SINGULAR: &'static str = "Order";
    const RESOURCE_NAME_PLURAL: &'static str = "Orders";

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
            ("customer", by_customer),
        ]
    }

    async fn project(db: &DatabaseConnection, models: Vec<Model>) -> Result<Vec<Self>, ApiError> {
        let ids: Vec<String> = models.iter().map(|model| model.id.clone()).collect();
        let mut order_items = load_child_ids::<OrderOrderItems, _>(db, &ids).await?;

        Ok(models
            .into_iter()
            .map(|model| Self {
                order_items: order_items.remove(&model.id).unwrap_or_default(),
                id: model.id,
                created_at: model.created_at,
                updated_at: model.updated_at,
                date: model.date,
                customer: model.customer_id,
            })
            .collect())
    }

    async fn create(db: &DatabaseConnection, create_model: OrderCreate) -> Result<Self, ApiError> {
        let id = create_model
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let txn = db.begin().await?;
        let customer_id = match &create_model.customer {
            Some(customer) => resolve_id::<Customer, _>(&txn, customer).await?,
            None => None,
        };
        let active_model = ActiveModel {
            id: Set(id.clone()),
            created_at: Set(create_model.created_at),
            updated_at: Set(create_model.updated_at),
            customer_id: Set(customer_id),
            date: Set(create_model.date),
            revision: Set(0),
        };
        Entity::insert(active_model).exec_without_returning(&txn).await?;

        if let Some(order_items) = &create_model.order_items {
            attach_children::<OrderOrderItems, _>(&txn, &id, order_items).await?;
        }
        txn.commit().await?;

        tracing::debug!(resource = Self::RESOURCE_NAME_SINGULAR, id = %id, "Created row");
        Self::get_one(db, &id).await
    }

    async fn replace_children(
        txn: &DatabaseTransaction,
        id: &str,
        child_ids: &[String],
    ) -> Result<(), ApiError> {
        overwrite_children::<OrderOrderItems, _>(txn, id, child_ids).await
    }
}

impl Order {
    /// The customer this order belongs to.
    pub async fn get_customer(db: &DatabaseConnection, id: &str) -> Result<Customer, ApiError> {
        CustomerOrders::get_parent(db, id).await
    }

    pub async fn connect_order_items(
        db: &DatabaseConnection,
        id: &str,
        order_item_ids: &[String],
    ) -> Result<(), ApiError> {
        OrderOrderItems::connect(db, id, order_item_ids).await
    }

    pub async fn disconnect_order_items(
        db: &DatabaseConnection,
        id: &str,
        order_item_ids: &[String],
    ) -> Result<(), ApiError> {
        OrderOrderItems::disconnect(db, id, order_item_ids).await
    }

    pub async fn update_order_items(
        db: &DatabaseConnection,
        id: &str,
        order_item_ids: &[String],
    ) -> Result<(), ApiError> {
        OrderOrderItems::replace(db, id, order_item_ids).await
    }

    pub async fn find_order_items(
        db: &DatabaseConnection,
        id: &str,
        args: &FindManyArgs<<OrderItem as CRUDResource>::WhereModel>,
    ) -> Result<Vec<OrderItem>, ApiError> {
        OrderOrderItems::find_children(db, id, args).await
    }
}
