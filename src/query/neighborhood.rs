//! Neighborhood and ancestor/descendant tree statements
//!
//! These start from the records matched by a [`SelectionQuery`] and expand
//! outwards along edge classes, returning every vertex on the visited paths.

use crate::error::FerroError;
use crate::schema::cast_range_int;

use super::constants::{
    edge_list, Direction, DEFAULT_NEIGHBORS, MAX_NEIGHBORS, MAX_TRAVEL_DEPTH, NEIGHBORHOOD_EDGES,
    TREE_EDGES,
};
use super::selection::{QueryStatement, SelectionQuery};

fn checked_depth(depth: Option<u32>, default: u32, min: u32, max: u32) -> Result<u32, FerroError> {
    // zero means unset
    let depth = depth.filter(|d| *d > 0).unwrap_or(default);
    cast_range_int(
        &serde_json::Value::from(depth),
        Some(i64::from(min)),
        Some(i64::from(max)),
    )
    .map(|d| d as u32)
    .map_err(|cause| FerroError::attribute(format!("invalid depth: {}", cause)))
}

fn match_root(query: &SelectionQuery) -> (String, super::Params) {
    let (conditions, params) = query.where_clause(0);
    if conditions.is_empty() {
        (format!("{{class: {}}}", query.class_name()), params)
    } else {
        (
            format!("{{class: {}, WHERE: ({})}}", query.class_name(), conditions),
            params,
        )
    }
}

fn edge_names(edges: Option<&[String]>, default: &[&str]) -> String {
    match edges {
        Some(edges) => edge_list(edges),
        None => edge_list(default),
    }
}

/// Expand the matched records to everything within `depth` hops
///
/// Edges default to the neighborhood edge classes and depth to 3 (at most 4).
pub fn neighborhood(
    query: &SelectionQuery,
    edges: Option<&[String]>,
    depth: Option<u32>,
) -> Result<QueryStatement, FerroError> {
    let depth = checked_depth(depth, DEFAULT_NEIGHBORS, 0, MAX_NEIGHBORS)?;
    let (root, params) = match_root(query);
    let edges = edge_names(edges, &NEIGHBORHOOD_EDGES);
    Ok(QueryStatement {
        query: format!(
            "SELECT * FROM (MATCH {}.both({}){{WHILE: ($depth < {})}} RETURN $pathElements)",
            root, edges, depth
        ),
        params,
    })
}

fn tree(
    query: &SelectionQuery,
    direction: Direction,
    edges: Option<&[String]>,
    depth: Option<u32>,
) -> Result<QueryStatement, FerroError> {
    let depth = checked_depth(depth, MAX_TRAVEL_DEPTH, 1, MAX_TRAVEL_DEPTH)?;
    let (root, params) = match_root(query);
    let edges = edge_names(edges, &TREE_EDGES);
    Ok(QueryStatement {
        query: format!(
            "SELECT * FROM (MATCH {root}.{dir}({edges}){{WHILE: ({dir}({edges}).size() > 0 AND $depth < {depth})}} RETURN $pathElements)",
            root = root,
            dir = direction,
            edges = edges,
            depth = depth
        ),
        params,
    })
}

/// Follow incoming edges (default `SubclassOf`) up to `depth` hops
pub fn ancestors(
    query: &SelectionQuery,
    edges: Option<&[String]>,
    depth: Option<u32>,
) -> Result<QueryStatement, FerroError> {
    tree(query, Direction::In, edges, depth)
}

/// Follow outgoing edges (default `SubclassOf`) up to `depth` hops
pub fn descendants(
    query: &SelectionQuery,
    edges: Option<&[String]>,
    depth: Option<u32>,
) -> Result<QueryStatement, FerroError> {
    tree(query, Direction::Out, edges, depth)
}
