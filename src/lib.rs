//! # relation
//!
//! Data access for Customers, their Orders and the Orders' OrderItems.
//!
//! Each entity is served by a [`CRUDResource`] implementation that lists with
//! filter, skip, take and sort, and gets, creates, updates (with optimistic
//! concurrency) and deletes single rows. The two one-to-many relations are managed
//! as sets through [`association::Association`]: connect, disconnect, replace,
//! find children and get parent.
//!
//! ```rust,ignore
//! use relation::{CRUDResource, database::DatabaseConfig, models::FindManyArgs};
//! use relation::services::{Customer, CustomerWhereInput};
//!
//! let db = DatabaseConfig::from_env().connect().await?;
//! let args = FindManyArgs::filtered(CustomerWhereInput {
//!     name: Some("Ada".into()),
//!     ..Default::default()
//! })
//! .take(10)
//! .sort_by(["created_at:desc"]);
//! let customers = Customer::get_all(&db, &args).await?;
//! ```

pub mod association;
pub mod core;
pub mod database;
pub mod entities;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod optimistic;
pub mod services;

pub use crate::core::CRUDResource;
pub use crate::errors::ApiError;
