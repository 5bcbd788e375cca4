//! Schema metadata consumed by the query builder
//!
//! Classes carry typed properties with optional casts and controlled
//! vocabularies. [`SchemaProvider`] abstracts where that metadata comes from;
//! [`Schema`] is the in-memory implementation.

pub mod cast;
pub mod model;
pub mod provider;
pub mod snapshot;

pub use cast::{cast_boolean, cast_range_int, looks_like_rid, Cast, Rid};
pub use model::{ClassModel, Property, PropertyType};
pub use provider::SchemaProvider;
pub use snapshot::Schema;
