//! Parameterised query construction over a schema
//!
//! A JSON filter is checked against the class models of a [`SchemaProvider`]
//! and rendered to a statement whose values travel separately as named
//! parameters (`:param0`, `:param1`, ...).
//!
//! [`SchemaProvider`]: crate::schema::SchemaProvider

pub mod comparison;
pub mod constants;
pub mod follow;
pub mod neighborhood;
pub mod selection;
pub mod traversal;

pub use comparison::{is_condition_object, BoolOp, Clause, Comparison, Condition, Operator, Params};
pub use constants::Direction;
pub use follow::Follow;
pub use neighborhood::{ancestors, descendants, neighborhood};
pub use selection::{QueryOptions, QueryStatement, SelectionQuery};
pub use traversal::{parse_compound_attr, Traversal, TraversalKind, TraversalSpec};
