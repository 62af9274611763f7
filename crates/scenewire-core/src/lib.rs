//! Core vocabulary for the scenewire scene-update protocol.
//!
//! This crate contains:
//! - Path keys naming positions in the nested record schema
//! - Wire value primitives carried alongside each path key
//! - The per-category identifier interner and its registry seam

pub mod interner;
#[cfg(test)]
mod interner_tests;
pub mod path_key;
pub mod registry;
pub mod value;

// Re-export commonly used items at crate root
pub use interner::{BASE_ID, Category, IdError, IdTable, ObjectId, SharedIdTable};
pub use path_key::{PathKey, Scope};
pub use registry::{IdentityRegistry, NullRegistry, canonical_key};
pub use value::{ByteOrder, Matrix3, Rgba, Value, WireType};
