#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use relation::CRUDResource;
use relation::database::DatabaseConfig;
use relation::entities::{
    CustomerColumn, CustomerEntity, OrderColumn, OrderEntity, OrderItemColumn, OrderItemEntity,
    customer, order,
};
use relation::services::{Customer, CustomerCreate, Order, OrderCreate, OrderItem, OrderItemCreate};
use sea_orm::{ActiveValue::Set, DatabaseConnection, DbErr, EntityTrait};
use sea_orm_migration::prelude::*;
use std::io;
use std::sync::{Arc, Mutex};

/// Rows per bulk insert when seeding, well under any bind-parameter limit.
const SEED_BATCH: usize = 100;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("relation=debug")
        .with_test_writer()
        .try_init();

    let db = DatabaseConfig::default().connect().await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Fixed instant `secs` seconds after 2024-01-01T00:00:00Z.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200 + secs, 0).unwrap()
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| (*id).to_string()).collect()
}

pub async fn create_customer(db: &DatabaseConnection, id: &str, name: &str) -> Customer {
    Customer::create(
        db,
        CustomerCreate {
            id: Some(id.to_string()),
            created_at: ts(0),
            updated_at: ts(0),
            name: Some(name.to_string()),
            phone: None,
            orders: None,
        },
    )
    .await
    .expect("Failed to create customer")
}

pub async fn create_order(db: &DatabaseConnection, id: &str, customer: Option<&str>) -> Order {
    Order::create(
        db,
        OrderCreate {
            id: Some(id.to_string()),
            created_at: ts(0),
            updated_at: ts(0),
            date: None,
            customer: customer.map(str::to_string),
            order_items: None,
        },
    )
    .await
    .expect("Failed to create order")
}

pub async fn create_item(db: &DatabaseConnection, id: &str, order: Option<&str>) -> OrderItem {
    OrderItem::create(
        db,
        OrderItemCreate {
            id: Some(id.to_string()),
            created_at: ts(0),
            updated_at: ts(0),
            date: None,
            name: Some(format!("item {id}")),
            order: order.map(str::to_string),
        },
    )
    .await
    .expect("Failed to create order item")
}

/// Insert customers `{prefix}0` .. `{prefix}{count - 1}` directly, bypassing the service.
pub async fn seed_customers(db: &DatabaseConnection, prefix: &str, count: usize) {
    let rows: Vec<customer::ActiveModel> = (0..count)
        .map(|n| customer::ActiveModel {
            id: Set(format!("{prefix}{n}")),
            created_at: Set(ts(0)),
            updated_at: Set(ts(0)),
            name: Set(None),
            phone: Set(None),
            revision: Set(0),
        })
        .collect();
    for batch in rows.chunks(SEED_BATCH) {
        CustomerEntity::insert_many(batch.to_vec())
            .exec_without_returning(db)
            .await
            .expect("Failed to seed customers");
    }
}

/// Insert orders `{prefix}0` .. `{prefix}{count - 1}` owned by `customer`.
pub async fn seed_orders(
    db: &DatabaseConnection,
    prefix: &str,
    count: usize,
    customer: Option<&str>,
) -> Vec<String> {
    let ids: Vec<String> = (0..count).map(|n| format!("{prefix}{n}")).collect();
    let rows: Vec<order::ActiveModel> = ids
        .iter()
        .map(|id| order::ActiveModel {
            id: Set(id.clone()),
            created_at: Set(ts(0)),
            updated_at: Set(ts(0)),
            customer_id: Set(customer.map(str::to_string)),
            date: Set(None),
            revision: Set(0),
        })
        .collect();
    for batch in rows.chunks(SEED_BATCH) {
        OrderEntity::insert_many(batch.to_vec())
            .exec_without_returning(db)
            .await
            .expect("Failed to seed orders");
    }
    ids
}

/// Formatted log output collected from the current thread.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route `info` and above from this crate into a buffer until the guard drops.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("relation=info")
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(CreateCustomerTable),
            Box::new(CreateOrderTable),
            Box::new(CreateOrderItemTable),
        ]
    }
}

pub struct CreateCustomerTable;

#[async_trait::async_trait]
impl MigrationName for CreateCustomerTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_customer_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateCustomerTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(CustomerEntity)
            .if_not_exists()
            .col(
                ColumnDef::new(CustomerColumn::Id)
                    .string()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(CustomerColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(CustomerColumn::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(ColumnDef::new(CustomerColumn::Name).string().null())
            .col(ColumnDef::new(CustomerColumn::Phone).string().null())
            .col(
                ColumnDef::new(CustomerColumn::Revision)
                    .big_integer()
                    .not_null()
                    .default(0),
            )
            .to_owned();

        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerEntity).to_owned())
            .await
    }
}

pub struct CreateOrderTable;

#[async_trait::async_trait]
impl MigrationName for CreateOrderTable {
    fn name(&self) -> &'static str {
        "m20240101_000002_create_order_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateOrderTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(OrderEntity)
            .if_not_exists()
            .col(
                ColumnDef::new(OrderColumn::Id)
                    .string()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(OrderColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(OrderColumn::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(ColumnDef::new(OrderColumn::CustomerId).string().null())
            .col(
                ColumnDef::new(OrderColumn::Date)
                    .timestamp_with_time_zone()
                    .null(),
            )
            .col(
                ColumnDef::new(OrderColumn::Revision)
                    .big_integer()
                    .not_null()
                    .default(0),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_orders_customer_id")
                    .from(OrderEntity, OrderColumn::CustomerId)
                    .to(CustomerEntity, CustomerColumn::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();

        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderEntity).to_owned())
            .await
    }
}

pub struct CreateOrderItemTable;

#[async_trait::async_trait]
impl MigrationName for CreateOrderItemTable {
    fn name(&self) -> &'static str {
        "m20240101_000003_create_order_item_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateOrderItemTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(OrderItemEntity)
            .if_not_exists()
            .col(
                ColumnDef::new(OrderItemColumn::Id)
                    .string()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(OrderItemColumn::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(OrderItemColumn::UpdatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(OrderItemColumn::Date)
                    .timestamp_with_time_zone()
                    .null(),
            )
            .col(ColumnDef::new(OrderItemColumn::Name).string_len(1000).null())
            .col(ColumnDef::new(OrderItemColumn::OrderId).string().null())
            .col(
                ColumnDef::new(OrderItemColumn::Revision)
                    .big_integer()
                    .not_null()
                    .default(0),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_order_items_order_id")
                    .from(OrderItemEntity, OrderItemColumn::OrderId)
                    .to(OrderEntity, OrderColumn::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            )
            .to_owned();

        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItemEntity).to_owned())
            .await
    }
}
