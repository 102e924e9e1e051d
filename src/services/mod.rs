//! Per-entity services: the external projections, their create, update and
//! where inputs, and the `CRUDResource` implementations tying them to the
//! shared query and association engines.

pub mod customer;
pub mod order;
pub mod order_item;

pub use customer::{Customer, CustomerCreate, CustomerUpdate, CustomerWhereInput};
pub use order::{Order, OrderCreate, OrderUpdate, OrderWhereInput};
pub use order_item::{OrderItem, OrderItemCreate, OrderItemUpdate, OrderItemWhereInput};
