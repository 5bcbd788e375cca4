// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-kb: variant notation parser and knowledge-base query builder
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! # Example
//!
//! ```
//! use ferro_kb::notation::{parse, EventSubtype};
//! use ferro_kb::query::{QueryOptions, SelectionQuery};
//! use ferro_kb::schema::Schema;
//! use serde_json::json;
//!
//! // Parse compact variant notation
//! let variant = parse("c.3+1_5-2del").unwrap();
//! assert_eq!(variant.subtype, EventSubtype::Deletion);
//!
//! // Build a parameterised query against a schema snapshot
//! let schema = Schema::with_test_data();
//! let query = SelectionQuery::parse(
//!     &schema,
//!     "Person",
//!     &json!({"name": "Bob"}),
//!     &QueryOptions::default(),
//! )
//! .unwrap();
//! println!("{}", query.display_string());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod notation;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use config::KbConfig;
pub use error::{ErrorCode, FerroError};
pub use notation::{parse, parse_histone, parse_multi_feature, EventSubtype, VariantDescription};
pub use query::{QueryOptions, QueryStatement, SelectionQuery};
pub use schema::{Schema, SchemaProvider};

/// Result type alias for ferro-kb operations
pub type Result<T> = std::result::Result<T, FerroError>;
