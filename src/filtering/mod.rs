//! # Filtering, Pagination & Ordering
//!
//! The three stateless operators every list query is built from:
//!
//! - [`ApplyWhere`]: turns a sparse where-input into a conjunction of predicates.
//! - [`apply_skip`] / [`apply_take`]: the paginated window.
//! - [`apply_order_by`]: orders the window by the caller's `sort_by` entries.
//!
//! Services compose them as filter → skip → take → order. Ordering runs on the
//! window that pagination already cut, never before it.

pub mod conditions;
pub mod pagination;
pub mod sort;

pub use conditions::{ApplyWhere, contains_child, eq_opt, in_ids};
pub use pagination::{apply_skip, apply_take};
pub use sort::{FieldComparator, SortField, apply_order_by, parse_sort_by};
