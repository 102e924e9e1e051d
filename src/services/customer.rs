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
    Association, CustomerOrders, attach_children, load_child_ids, overwrite_children,
};
use crate::core::{CRUDResource, ChildPatch, MergeIntoActiveModel};
use crate::entities::customer::{ActiveModel, Column, Entity, Model};
use crate::entities::{OrderColumn, OrderEntity};
use crate::errors::ApiError;
use crate::filtering::{ApplyWhere, FieldComparator, contains_child, eq_opt};
use crate::models::FindManyArgs;

use super::Order;

#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Ids of the customer's orders
    pub orders: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct CustomerCreate {
    /// Caller-assigned id; a UUID is generated when absent
    pub id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Existing orders to attach; unknown ids are skipped
    pub orders: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct CustomerUpdate {
    /// Ignored: the row is always targeted by the id passed to `update`
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Replaces the order collection with the existing rows among these ids
    pub orders: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct CustomerWhereInput {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// Customers owning any of these orders
    pub orders: Option<Vec<String>>,
}

impl ApplyWhere for CustomerWhereInput {
    fn condition(&self) -> Condition {
        Condition::all()
            .add_option(eq_opt(Column::Id, self.id.as_ref()))
            .add_option(eq_opt(Column::CreatedAt, self.created_at.as_ref()))
            .add_option(eq_opt(Column::UpdatedAt, self.updated_at.as_ref()))
            .add_option(eq_opt(Column::Name, self.name.as_ref()))
            .add_option(eq_opt(Column::Phone, self.phone.as_ref()))
            .add_option(contains_child(
                Column::Id,
                OrderEntity,
                OrderColumn::Id,
                OrderColumn::CustomerId,
                self.orders.as_ref(),
            ))
    }
}

impl MergeIntoActiveModel<ActiveModel> for CustomerUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, ApiError> {
        if let Some(created_at) = self.created_at {
            existing.created_at = Set(created_at);
        }
        if let Some(updated_at) = self.updated_at {
            existing.updated_at = Set(updated_at);
        }
        if let Some(name) = self.name {
            existing.name = Set(Some(name));
        }
        if let Some(phone) = self.phone {
            existing.phone = Set(Some(phone));
        }
        Ok(existing)
    }
}

impl ChildPatch for CustomerUpdate {
    fn take_child_ids(&mut self) -> Option<Vec<String>> {
        self.orders.take()
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

fn by_name(a: &Model, b: &Model) -> Ordering {
    a.name.cmp(&b.name)
}

fn by_phone(a: &Model, b: &Model) -> Ordering {
    a.phone.cmp(&b.phone)
}

#[async_trait]
impl CRUDResource for Customer {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type CreateModel = CustomerCreate;
    type UpdateModel = CustomerUpdate;
    type WhereModel = CustomerWhereInput;

    const ID_COLUMN: Self::ColumnType = Column::Id;
    const REVISION_COLUMN: Self::ColumnType = Column::Revision;
    const RESOURCE_NAME_SINGULAR: &'static str = "Customer";
    const RESOURCE_NAME_PLURAL: &'static str = "Customers";

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
            ("name", by_name),
            ("phone", by_phone),
        ]
    }

    async fn project(db: &DatabaseConnection, models: Vec<Model>) -> Result<Vec<Self>, ApiError> {
        let ids: Vec<String> = models.iter().map(|model| model.id.clone()).collect();
        let mut orders = load_child_ids::<CustomerOrders, _>(db, &ids).await?;

        Ok(models
            .into_iter()
            .map(|model| Self {
                orders: orders.remove(&model.id).unwrap_or_default(),
                id: model.id,
                created_at: model.created_at,
                updated_at: model.updated_at,
                name: model.name,
                phone: model.phone,
            })
            .collect())
    }

    async fn create(
        db: &DatabaseConnection,
        create_model: CustomerCreate,
    ) -> Result<Self, ApiError> {
        let id = create_model
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let txn = db.begin().await?;
        let active_model = ActiveModel {
            id: Set(id.clone()),
            created_at: Set(create_model.created_at),
            updated_at: Set(create_model.updated_at),
            name: Set(create_model.name),
            phone: Set(create_model.phone),
            revision: Set(0),
        };
        Entity::insert(active_model).exec_without_returning(&txn).await?;

        if let Some(orders) = &create_model.orders {
            attach_children::<CustomerOrders, _>(&txn, &id, orders).await?;
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
        overwrite_children::<CustomerOrders, _>(txn, id, child_ids).await
    }
}

impl Customer {
    pub async fn connect_orders(
        db: &DatabaseConnection,
        id: &str,
        order_ids: &[String],
    ) -> Result<(), ApiError> {
        CustomerOrders::connect(db, id, order_ids).await
    }

    pub async fn disconnect_orders(
        db: &DatabaseConnection,
        id: &str,
        order_ids: &[String],
    ) -> Result<(), ApiError> {
        CustomerOrders::disconnect(db, id, order_ids).await
    }

    pub async fn update_orders(
        db: &DatabaseConnection,
        id: &str,
        order_ids: &[String],
    ) -> Result<(), ApiError> {
        CustomerOrders::replace(db, id, order_ids).await
    }

    pub async fn find_orders(
        db: &DatabaseConnection,
        id: &str,
        args: &FindManyArgs<<Order as CRUDResource>::WhereModel>,
    ) -> Result<Vec<Order>, ApiError> {
        CustomerOrders::find_children(db, id, args).await
    }
}
