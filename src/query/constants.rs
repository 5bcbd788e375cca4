//! Query builder constants

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FerroError;

pub const DEFAULT_NEIGHBORS: u32 = 3;
pub const MAX_NEIGHBORS: u32 = 4;
pub const MAX_TRAVEL_DEPTH: u32 = 50;
pub const MAX_LIMIT: u64 = 1000;
pub const PARAM_PREFIX: &str = "param";
pub const SIZE_COMPUTATION: &str = "size()";

/// Edge classes followed by fuzzy matching
pub const FUZZY_CLASSES: [&str; 2] = ["AliasOf", "DeprecatedBy"];

/// Edge classes followed when expanding a neighborhood
pub const NEIGHBORHOOD_EDGES: [&str; 5] = [
    "AliasOf",
    "GeneralizationOf",
    "DeprecatedBy",
    "CrossReferenceOf",
    "ElementOf",
];

/// Default edge class for ancestor/descendant trees
pub const TREE_EDGES: [&str; 1] = ["SubclassOf"];

/// Input keys that configure the query rather than filter it
pub const SPECIAL_QUERY_ARGS: [&str; 9] = [
    "fuzzyMatch",
    "ancestors",
    "descendants",
    "returnProperties",
    "limit",
    "skip",
    "neighbors",
    "activeOnly",
    "or",
];

/// Keys that turn a query into a MATCH traversal
pub const CLOSURE_ARGS: [&str; 3] = ["fuzzyMatch", "ancestors", "descendants"];

pub fn is_special_arg(key: &str) -> bool {
    SPECIAL_QUERY_ARGS.contains(&key)
}

/// Edge traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    #[default]
    Both,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Both => "both",
        }
    }

    /// Vertex method reached by following an edge in this direction
    pub fn vertex(&self) -> &'static str {
        match self {
            Direction::Out => "inV()",
            Direction::In => "outV()",
            Direction::Both => "bothV()",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = FerroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            "both" => Ok(Direction::Both),
            _ => Err(FerroError::attribute(format!("Invalid direction ({})", s))),
        }
    }
}

/// Single-quote a class name for an edge list
pub(crate) fn quote_wrap(name: &str) -> String {
    format!("'{}'", name)
}

/// Render `'A', 'B'`
pub(crate) fn edge_list<S: AsRef<str>>(edges: &[S]) -> String {
    edges
        .iter()
        .map(|e| quote_wrap(e.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
