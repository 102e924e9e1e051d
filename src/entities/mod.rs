pub mod customer;
pub mod order;
pub mod order_item;

pub use customer::{Column as CustomerColumn, Entity as CustomerEntity, Model as CustomerModel};
pub use order::{Column as OrderColumn, Entity as OrderEntity, Model as OrderModel};
pub use order_item::{
    Column as OrderItemColumn, Entity as OrderItemEntity, Model as OrderItemModel,
};
