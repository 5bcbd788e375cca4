//! Selection query builder
//!
//! Translates a nested JSON filter over one class into a parameterised
//! statement. Plain filters render as `SELECT ... FROM Class WHERE ...`;
//! fuzzy matching and ancestor/descendant closures render as `MATCH`
//! expressions.
//!
//! # Example
//!
//! ```
//! use ferro_kb::query::{QueryOptions, SelectionQuery};
//! use ferro_kb::schema::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::with_test_data();
//! let query = SelectionQuery::parse(
//!     &schema,
//!     "Parent",
//!     &json!({"name": "Bob", "AliasOf": {"direction": "out", "size": 3}}),
//!     &QueryOptions::default().with_active_only(false),
//! )
//! .unwrap();
//! let statement = query.to_statement();
//! assert_eq!(
//!     statement.query,
//!     "SELECT * FROM Parent WHERE name = :param0 AND outE('AliasOf').size() = :param1"
//! );
//! assert_eq!(statement.params["param0"], "bob");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorCode, FerroError};
use crate::schema::{
    cast_boolean, cast_range_int, looks_like_rid, Cast, ClassModel, Property, SchemaProvider,
};

use super::comparison::{
    is_condition_object, value_text, Clause, Comparison, Condition, Operator, Params,
};
use super::constants::{
    is_special_arg, Direction, CLOSURE_ARGS, MAX_LIMIT, MAX_NEIGHBORS, MAX_TRAVEL_DEPTH,
    SIZE_COMPUTATION,
};
use super::follow::Follow;
use super::traversal::{is_compound_attr, Traversal};

/// Caller-level defaults for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct QueryOptions {
    /// Inject `deletedAt IS NULL` unless the query overrides it
    pub active_only: bool,
    /// Condition keys rendered as one OR group
    pub or: Vec<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    /// Upper bound for `fuzzyMatch`
    pub fuzzy_depth: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            active_only: true,
            or: Vec::new(),
            skip: None,
            limit: None,
            fuzzy_depth: MAX_TRAVEL_DEPTH,
        }
    }
}

impl QueryOptions {
    pub fn with_active_only(mut self, active_only: bool) -> Self {
        self.active_only = active_only;
        self
    }

    pub fn with_or<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.or = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Options handed to a nested query
    fn nested(&self, active_only: bool) -> Self {
        Self {
            active_only,
            fuzzy_depth: self.fuzzy_depth,
            ..Self::default()
        }
    }
}

/// A rendered statement and its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStatement {
    pub query: String,
    pub params: Params,
}

impl QueryStatement {
    /// Statement with parameters substituted, for logging only
    pub fn display_string(&self) -> String {
        let mut keys: Vec<&String> = self.params.keys().collect();
        // longest names first so `:param1` never clobbers `:param10`
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| b.cmp(a)));
        let mut statement = self.query.clone();
        for key in keys {
            let value = match &self.params[key] {
                Value::String(s) => format!("'{}'", s),
                other => other.to_string(),
            };
            statement = statement.replace(&format!(":{}", key), &value);
        }
        statement
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Condition(Condition),
    Subquery(Box<SelectionQuery>),
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    predicate: Predicate,
    iterable: bool,
}

impl Entry {
    fn condition(condition: Condition, iterable: bool) -> Self {
        Self {
            predicate: Predicate::Condition(condition),
            iterable,
        }
    }

    fn subquery(query: SelectionQuery) -> Self {
        Self {
            predicate: Predicate::Subquery(Box::new(query)),
            iterable: false,
        }
    }

    fn render(&self, field: &str, start: usize) -> (String, Params) {
        match &self.predicate {
            Predicate::Condition(condition) => condition.render(field, start, self.iterable),
            Predicate::Subquery(query) => {
                let statement = query.statement_from(start);
                (
                    format!("{} IN (SELECT @rid FROM ({}))", field, statement.query),
                    statement.params,
                )
            }
        }
    }
}

fn reserved_error(key: &str, cause: impl std::fmt::Display) -> FerroError {
    FerroError::attribute_with_code(
        ErrorCode::ReservedKey,
        format!("invalid value for '{}': {}", key, cause),
    )
}

fn reserved_int(
    query: &Map<String, Value>,
    key: &str,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<Option<i64>, FerroError> {
    query
        .get(key)
        .filter(|v| !v.is_null())
        .map(|v| cast_range_int(v, min, max).map_err(|cause| reserved_error(key, cause)))
        .transpose()
}

fn reserved_names(query: &Map<String, Value>, key: &str) -> Result<Option<Vec<String>>, FerroError> {
    let invalid = |found: &Value| reserved_error(key, format!("expected a list of names but found {}", found));
    match query.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(
            s.split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| invalid(item))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(invalid(other)),
    }
}

fn edge_names<S: SchemaProvider + ?Sized>(
    schema: &S,
    names: Option<Vec<String>>,
) -> Result<Option<Vec<String>>, FerroError> {
    names
        .map(|names| {
            names
                .iter()
                .map(|name| {
                    schema
                        .edge_class(name)
                        .map(|edge| edge.name.clone())
                        .ok_or_else(|| FerroError::attribute(format!("Invalid Edge class: {}", name)))
                })
                .collect()
        })
        .transpose()
}

/// Lowercase strings and normalise record IDs for vertex predicates, which
/// have no model to supply casts
fn vertex_value_cast(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(s) => {
            let text = s.trim().to_lowercase();
            if looks_like_rid(&text, true) {
                Cast::Rid.apply(&Value::String(text))
            } else {
                Ok(Value::String(text))
            }
        }
        other => Ok(other.clone()),
    }
}

/// Apply a cast, link RID normalisation and choice validation to a condition
fn prepare(
    field: &str,
    mut condition: Condition,
    property: Option<&Property>,
    cast: Option<Cast>,
) -> Result<Condition, FerroError> {
    if let Some(cast) = cast.or_else(|| property.and_then(|p| p.cast)) {
        condition.apply_cast(field, &|v| cast.apply(v))?;
    }
    if let Some(property) = property {
        if property.kind.is_link() {
            condition.apply_cast(field, &|v| {
                Cast::Rid
                    .apply(v)
                    .map_err(|_| format!("'{}' expects an RID or null but saw '{}'", field, value_text(v)))
            })?;
        }
        if let Some(choices) = &property.choices {
            condition.validate_choices(field, choices)?;
        }
    }
    Ok(condition)
}

fn in_group(name: &str, key: &str) -> bool {
    name == key || (name.starts_with(key) && name[key.len()..].starts_with('.'))
}

/// A filter over one class
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionQuery {
    class_name: String,
    conditions: BTreeMap<String, Entry>,
    or_group: Vec<String>,
    follow: Vec<Vec<Follow>>,
    skip: Option<u64>,
    limit: Option<u64>,
    neighbors: Option<u32>,
    return_properties: Option<Vec<String>>,
    active_only: bool,
}

impl SelectionQuery {
    /// Build a query over the class named `class`
    pub fn parse<S: SchemaProvider + ?Sized>(
        schema: &S,
        class: &str,
        input: &Value,
        options: &QueryOptions,
    ) -> Result<Self, FerroError> {
        let model = schema.require_class(class)?;
        Self::from_model(schema, model, input, options)
    }

    pub fn from_model<S: SchemaProvider + ?Sized>(
        schema: &S,
        model: &ClassModel,
        input: &Value,
        options: &QueryOptions,
    ) -> Result<Self, FerroError> {
        let query = input.as_object().ok_or_else(|| {
            FerroError::attribute(format!(
                "query for class '{}' must be an object but found {}",
                model.name, input
            ))
        })?;

        let active_only = match query.get("activeOnly") {
            Some(value) => cast_boolean(value).map_err(|cause| reserved_error("activeOnly", cause))?,
            None => options.active_only,
        };
        let max_depth = i64::from(options.fuzzy_depth.min(MAX_TRAVEL_DEPTH));
        let fuzzy_match = reserved_int(query, "fuzzyMatch", Some(0), Some(max_depth))?
            .map(|depth| depth as u32);
        let skip = reserved_int(query, "skip", Some(0), None)?
            .map(|skip| skip as u64)
            .or(options.skip);
        let limit = reserved_int(query, "limit", Some(1), Some(MAX_LIMIT as i64))?
            .map(|limit| limit as u64)
            .or(options.limit);
        let neighbors = reserved_int(query, "neighbors", Some(0), Some(i64::from(MAX_NEIGHBORS)))?
            .map(|n| n as u32);
        let ancestors = edge_names(schema, reserved_names(query, "ancestors")?)?;
        let descendants = edge_names(schema, reserved_names(query, "descendants")?)?;
        let return_properties = reserved_names(query, "returnProperties")?;
        let or_group = reserved_names(query, "or")?.unwrap_or_else(|| options.or.clone());

        let closure = fuzzy_match.is_some_and(|d| d > 0) || ancestors.is_some() || descendants.is_some();
        if model.is_edge && closure {
            return Err(FerroError::attribute_with_code(
                ErrorCode::ReservedKey,
                format!(
                    "cannot specify MATCH properties (fuzzyMatch, ancestors, descendants) on the edge class '{}'",
                    model.name
                ),
            ));
        }

        if let Some(returned) = &return_properties {
            let known = schema.query_properties(model);
            for name in returned {
                let root = name.split('.').next().unwrap_or(name);
                if !root.starts_with('@') && !known.contains_key(root) {
                    return Err(FerroError::attribute_with_code(
                        ErrorCode::InvalidReturnProperty,
                        format!(
                            "invalid return property '{}' is not a valid member of class '{}'",
                            name, model.name
                        ),
                    ));
                }
            }
        }

        let mut selection = SelectionQuery {
            class_name: model.name.clone(),
            conditions: BTreeMap::new(),
            or_group,
            follow: Vec::new(),
            skip,
            limit,
            neighbors,
            return_properties,
            active_only,
        };
        if active_only {
            selection.insert("deletedAt", Entry::condition(Condition::from(Comparison::is_null()), false));
        }

        for (key, value) in query {
            if is_special_arg(key) {
                continue;
            }
            if let Some(edge) = schema.edge_class(key) {
                selection.add_edge_predicate(schema, edge, value, options)?;
            } else if key == "deletedAt" {
                selection.insert(key, Entry::condition(Condition::from_json(value)?, false));
            } else if is_compound_attr(key) {
                selection.add_traversal(schema, model, key, value)?;
            } else {
                let property = schema
                    .query_property(model, key)
                    .ok_or_else(|| Self::unknown_attribute(schema, model, key))?;
                if is_condition_object(value) {
                    let condition = prepare(key, Condition::from_json(value)?, Some(property), None)?;
                    selection.insert(key, Entry::condition(condition, property.kind.is_iterable()));
                } else {
                    selection.add_subquery(schema, key, property, value, active_only, options)?;
                }
            }
        }

        selection.follow = Follow::from_options(
            ancestors.as_deref(),
            descendants.as_deref(),
            fuzzy_match,
            active_only,
        );

        for key in &selection.or_group {
            if !selection.conditions.keys().any(|name| in_group(name, key)) {
                return Err(FerroError::attribute(format!(
                    "the or group names '{}' which is not a condition of this query",
                    key
                )));
            }
        }
        Ok(selection)
    }

    fn unknown_attribute<S: SchemaProvider + ?Sized>(
        schema: &S,
        model: &ClassModel,
        key: &str,
    ) -> FerroError {
        let valid: Vec<&str> = schema.query_properties(model).into_keys().collect();
        FerroError::attribute(format!(
            "unexpected attribute '{}' is not defined on this class model '{}'. Valid attributes: {}",
            key,
            model.name,
            valid.join(", ")
        ))
    }

    fn insert(&mut self, key: impl Into<String>, entry: Entry) {
        self.conditions.insert(key.into(), entry);
    }

    fn add_traversal<S: SchemaProvider + ?Sized>(
        &mut self,
        schema: &S,
        model: &ClassModel,
        key: &str,
        value: &Value,
    ) -> Result<(), FerroError> {
        let traversal = Traversal::parse_str(schema, Some(model), key)?;
        if !is_condition_object(value) {
            return Err(FerroError::attribute(format!(
                "cannot nest queries after the traversal '{}'",
                key
            )));
        }
        let field = traversal.to_string();
        let condition = prepare(
            &field,
            Condition::from_json(value)?,
            traversal.terminal_property(),
            traversal.terminal_cast(),
        )?;
        self.insert(field, Entry::condition(condition, traversal.is_iterable()));
        Ok(())
    }

    fn add_subquery<S: SchemaProvider + ?Sized>(
        &mut self,
        schema: &S,
        key: &str,
        property: &Property,
        value: &Value,
        active_only: bool,
        options: &QueryOptions,
    ) -> Result<(), FerroError> {
        let linked = property.linked_class.as_deref().ok_or_else(|| {
            FerroError::attribute(format!("cannot subquery the non-linked attribute '{}'", key))
        })?;
        let mut input = value.as_object().cloned().unwrap_or_default();
        let target = match input.remove("@class") {
            None => linked.to_string(),
            Some(Value::String(class)) if schema.is_subclass_of(&class, linked) => class,
            Some(other) => {
                return Err(FerroError::attribute(format!(
                    "'{}' is not a subclass of '{}'",
                    value_text(&other),
                    linked
                )))
            }
        };
        let model = schema.require_class(&target)?;
        let subquery = Self::from_model(schema, model, &Value::Object(input), &options.nested(active_only))?;

        if subquery.is_flat() {
            log::debug!("flattening {} subquery into '{}'", target, key);
            for (name, entry) in subquery.conditions {
                let iterable = entry.iterable || property.kind.is_iterable();
                self.insert(format!("{}.{}", key, name), Entry { iterable, ..entry });
            }
        } else {
            log::debug!("keeping {} subquery on '{}' nested", target, key);
            self.insert(key, Entry::subquery(subquery));
        }
        Ok(())
    }

    fn add_edge_predicate<S: SchemaProvider + ?Sized>(
        &mut self,
        schema: &S,
        edge: &ClassModel,
        value: &Value,
        options: &QueryOptions,
    ) -> Result<(), FerroError> {
        let predicate = value.as_object().ok_or_else(|| {
            FerroError::attribute(format!(
                "the edge predicate '{}' must be an object but found {}",
                edge.name, value
            ))
        })?;
        let direction = match predicate.get("direction") {
            None => Direction::Both,
            Some(Value::String(direction)) => direction.parse()?,
            Some(other) => return Err(FerroError::attribute(format!("Invalid direction ({})", other))),
        };
        let prefix = format!("{}E('{}')", direction, edge.name);

        if let Some(size) = predicate.get("size") {
            let field = format!("{}.{}", prefix, SIZE_COMPUTATION);
            let condition = prepare(&field, Condition::from_json(size)?, None, Some(Cast::Integer))?;
            self.insert(field, Entry::condition(condition, false));
        }
        if let Some(vertex) = predicate.get("v") {
            let target = format!("{}.{}", prefix, direction.vertex());
            self.add_vertex_predicate(schema, &edge.name, &target, vertex, options)?;
        }

        let mut remaining = predicate.clone();
        for key in ["v", "direction", "size", "activeOnly"] {
            remaining.remove(key);
        }
        if let Some(key) = remaining
            .keys()
            .find(|k| is_special_arg(k) && !CLOSURE_ARGS.contains(&k.as_str()))
        {
            return Err(FerroError::attribute_with_code(
                ErrorCode::ReservedKey,
                format!("'{}' is not supported inside the edge predicate '{}'", key, edge.name),
            ));
        }
        if !remaining.is_empty() {
            let own = Self::from_model(schema, edge, &Value::Object(remaining), &options.nested(false))?;
            for (name, entry) in own.conditions {
                self.insert(
                    format!("{}.{}", prefix, name),
                    Entry {
                        iterable: true,
                        ..entry
                    },
                );
            }
        }
        Ok(())
    }

    fn add_vertex_predicate<S: SchemaProvider + ?Sized>(
        &mut self,
        schema: &S,
        edge: &str,
        target: &str,
        vertex: &Value,
        options: &QueryOptions,
    ) -> Result<(), FerroError> {
        let rid = |v: &Value| Cast::Rid.apply(v);
        match vertex {
            Value::Array(items) => {
                let clause = Clause::or(
                    items
                        .iter()
                        .map(|item| {
                            Comparison::new(item.clone(), Operator::Contains, false)
                                .map(Condition::from)
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                );
                let mut condition = Condition::from(clause);
                condition.apply_cast(target, &rid)?;
                self.insert(target, Entry::condition(condition, true));
            }
            Value::Object(map) if !is_condition_object(vertex) => {
                if map.keys().any(|k| CLOSURE_ARGS.contains(&k.as_str())) {
                    let model = schema.require_class("V")?;
                    let subquery =
                        Self::from_model(schema, model, vertex, &options.nested(false))?;
                    self.insert(target, Entry::subquery(subquery));
                    return Ok(());
                }
                for (name, value) in map {
                    if !is_condition_object(value) {
                        return Err(FerroError::attribute(format!(
                            "cannot nest queries after an edge-based selection: {}.v.{}",
                            edge, name
                        )));
                    }
                    let field = format!("{}.{}", target, name);
                    let mut condition = Condition::from_json(value)?;
                    condition.apply_cast(&field, &vertex_value_cast)?;
                    self.insert(field, Entry::condition(condition, true));
                }
            }
            other => {
                let mut condition = Condition::from_json(other)?;
                condition.apply_cast(target, &rid)?;
                self.insert(target, Entry::condition(condition, true));
            }
        }
        Ok(())
    }

    /// No closure and nothing that would be lost by merging into a parent
    fn is_flat(&self) -> bool {
        self.follow.is_empty()
            && self.or_group.is_empty()
            && self.skip.is_none()
            && self.limit.is_none()
            && self.return_properties.is_none()
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Condition keys in render order
    pub fn condition_keys(&self) -> Vec<&str> {
        self.conditions.keys().map(String::as_str).collect()
    }

    pub fn follow(&self) -> &[Vec<Follow>] {
        &self.follow
    }

    pub fn is_match(&self) -> bool {
        !self.follow.is_empty()
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Neighborhood depth requested for the fetched records
    pub fn neighbors(&self) -> Option<u32> {
        self.neighbors
    }

    pub fn active_only(&self) -> bool {
        self.active_only
    }

    pub fn return_properties(&self) -> Option<&[String]> {
        self.return_properties.as_deref()
    }

    pub fn or_group(&self) -> &[String] {
        &self.or_group
    }

    /// AND-joined conditions with parameters numbered from `start`
    pub fn where_clause(&self, start: usize) -> (String, Params) {
        let (parts, params) = self.render_conditions(start);
        (parts.join(" AND "), params)
    }

    fn render_conditions(&self, start: usize) -> (Vec<String>, Params) {
        let mut params = Params::new();
        let mut parts = Vec::new();
        let grouped = |name: &str| self.or_group.iter().any(|key| in_group(name, key));

        for (name, entry) in &self.conditions {
            if grouped(name) {
                continue;
            }
            let (mut query, entry_params) = entry.render(name, start + params.len());
            // empty AND/OR clauses and empty vertex lists render nothing
            if query.is_empty() {
                continue;
            }
            if matches!(&entry.predicate, Predicate::Condition(c) if c.needs_parens()) {
                query = format!("({})", query);
            }
            params.extend(entry_params);
            parts.push(query);
        }

        if !self.or_group.is_empty() {
            let mut keys = self.or_group.clone();
            keys.sort();
            keys.dedup();
            let mut members = Vec::with_capacity(keys.len());
            for key in &keys {
                let mut member = Vec::new();
                for (name, entry) in self.conditions.iter().filter(|(name, _)| in_group(name, key)) {
                    let (mut query, entry_params) = entry.render(name, start + params.len());
                    if query.is_empty() {
                        continue;
                    }
                    if matches!(&entry.predicate, Predicate::Condition(c) if c.is_compound()) {
                        query = format!("({})", query);
                    }
                    params.extend(entry_params);
                    member.push(query);
                }
                match member.len() {
                    0 => {}
                    1 => members.append(&mut member),
                    _ => members.push(format!("({})", member.join(" AND "))),
                }
            }
            match members.len() {
                0 => {}
                1 => parts.append(&mut members),
                _ => parts.push(format!("({})", members.join(" OR "))),
            }
        }
        (parts, params)
    }

    /// Render with parameters numbered from zero
    pub fn to_statement(&self) -> QueryStatement {
        self.statement_from(0)
    }

    /// Render with parameters numbered from `start`
    pub fn statement_from(&self, start: usize) -> QueryStatement {
        let (conditions, params) = self.render_conditions(start);
        let columns = self
            .return_properties
            .as_ref()
            .map(|names| names.join(", "))
            .unwrap_or_else(|| "*".to_string());

        let mut query = if self.follow.is_empty() {
            let mut query = format!("SELECT {} FROM {}", columns, self.class_name);
            if !conditions.is_empty() {
                query.push_str(&format!(" WHERE {}", conditions.join(" AND ")));
            }
            query
        } else {
            let prefix = if conditions.is_empty() {
                format!("{{class: {}}}", self.class_name)
            } else {
                format!(
                    "{{class: {}, where: ({})}}",
                    self.class_name,
                    conditions.join(" AND ")
                )
            };
            let expressions: Vec<String> = self
                .follow
                .iter()
                .map(|steps| {
                    let steps: String = steps.iter().map(|step| step.to_string()).collect();
                    format!("{}{}", prefix, steps)
                })
                .collect();
            let matched = format!("MATCH {} RETURN $pathElements", expressions.join(", "));
            if self.return_properties.is_some() {
                format!("SELECT {} FROM ({})", columns, matched)
            } else {
                matched
            }
        };
        if let Some(skip) = self.skip {
            query.push_str(&format!(" SKIP {}", skip));
        }
        if let Some(limit) = self.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }
        QueryStatement { query, params }
    }

    /// Statement with parameters substituted, for logging only
    pub fn display_string(&self) -> String {
        self.to_statement().display_string()
    }
}
