// Per-entity service contract and the helpers shared by every entity

pub mod traits;

pub use traits::{
    CRUDResource, ChildPatch, MergeIntoActiveModel, ensure_exists, resolve_id,
};
