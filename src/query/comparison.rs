//! Comparison and clause algebra
//!
//! A [`Comparison`] tests one field against a value; a [`Clause`] joins
//! comparisons (or nested clauses) with AND/OR. Both render against a field
//! name and a starting parameter index, returning the expression and the
//! parameters it introduced.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::FerroError;

use super::constants::PARAM_PREFIX;

/// Named query parameters
pub type Params = BTreeMap<String, Value>;

pub(crate) fn param_name(index: usize) -> String {
    format!("{}{}", PARAM_PREFIX, index)
}

/// Text of a value for error messages
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    #[default]
    Eq,
    Contains,
    ContainsAll,
    ContainsText,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Contains => "CONTAINS",
            Operator::ContainsAll => "CONTAINSALL",
            Operator::ContainsText => "CONTAINSTEXT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = FerroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" => Ok(Operator::Eq),
            "CONTAINS" => Ok(Operator::Contains),
            "CONTAINSALL" => Ok(Operator::ContainsAll),
            "CONTAINSTEXT" => Ok(Operator::ContainsText),
            _ => Err(FerroError::usage(format!(
                "Invalid operator ({}). Only =, CONTAINSTEXT, CONTAINS, CONTAINSALL are supported operators",
                s
            ))),
        }
    }
}

/// A single field test
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    value: Value,
    operator: Operator,
    negate: bool,
}

impl Comparison {
    pub fn new(value: Value, operator: Operator, negate: bool) -> Result<Self, FerroError> {
        if value.is_null() && operator != Operator::Eq {
            return Err(FerroError::usage(format!(
                "cannot compare null using the {} operator",
                operator
            )));
        }
        Ok(Self {
            value,
            operator,
            negate,
        })
    }

    /// Equality comparison
    pub fn equals(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            operator: Operator::Eq,
            negate: false,
        }
    }

    pub fn is_null() -> Self {
        Self::equals(Value::Null)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn negate(&self) -> bool {
        self.negate
    }

    /// Cast every non-null value, element-wise for lists
    pub fn apply_cast<F>(&mut self, field: &str, cast: &F) -> Result<(), FerroError>
    where
        F: Fn(&Value) -> Result<Value, String>,
    {
        let cast_one = |value: &Value| -> Result<Value, FerroError> {
            if value.is_null() {
                return Ok(Value::Null);
            }
            cast(value).map_err(|cause| FerroError::Cast {
                field: field.to_string(),
                value: value_text(value),
                cause,
            })
        };
        self.value = match &self.value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(cast_one)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => cast_one(other)?,
        };
        Ok(())
    }

    /// Check values against a controlled vocabulary; null always passes
    pub fn validate_choices(&self, field: &str, choices: &[String]) -> Result<(), FerroError> {
        let check = |value: &Value| -> Result<(), FerroError> {
            if value.is_null() {
                return Ok(());
            }
            let text = value_text(value);
            if choices.iter().any(|c| *c == text) {
                Ok(())
            } else {
                Err(FerroError::ControlledVocabulary {
                    field: field.to_string(),
                    value: text,
                    choices: choices.join(", "),
                })
            }
        };
        match &self.value {
            Value::Array(items) => items.iter().try_for_each(check),
            other => check(other),
        }
    }

    /// Render against `field`, numbering parameters from `start`
    ///
    /// ```
    /// use ferro_kb::query::Comparison;
    ///
    /// let (query, params) = Comparison::equals("bob").render("name", 2, false);
    /// assert_eq!(query, "name = :param2");
    /// assert_eq!(params["param2"], "bob");
    ///
    /// let (query, _) = Comparison::equals("bob").render("aliases", 0, true);
    /// assert_eq!(query, "aliases CONTAINS :param0");
    /// ```
    pub fn render(&self, field: &str, start: usize, iterable: bool) -> (String, Params) {
        let mut params = Params::new();
        let mut query = match &self.value {
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for (offset, item) in items.iter().enumerate() {
                    let name = param_name(start + offset);
                    names.push(format!(":{}", name));
                    params.insert(name, item.clone());
                }
                let operator = if self.operator == Operator::Eq && !iterable {
                    "IN"
                } else {
                    self.operator.as_str()
                };
                format!("{} {} [{}]", field, operator, names.join(", "))
            }
            Value::Null if iterable => format!("{} CONTAINS NULL", field),
            Value::Null => format!("{} IS NULL", field),
            value => {
                let name = param_name(start);
                let operator = if iterable && self.operator == Operator::Eq {
                    Operator::Contains
                } else {
                    self.operator
                };
                let query = format!("{} {} :{}", field, operator, name);
                params.insert(name, value.clone());
                query
            }
        };
        if self.negate {
            query = format!("NOT ({})", query);
        }
        (query, params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// Comparisons joined by one boolean operator
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    op: BoolOp,
    items: Vec<Condition>,
}

impl Clause {
    pub fn new(op: BoolOp, items: Vec<Condition>) -> Self {
        Self { op, items }
    }

    pub fn and(items: Vec<Condition>) -> Self {
        Self::new(BoolOp::And, items)
    }

    pub fn or(items: Vec<Condition>) -> Self {
        Self::new(BoolOp::Or, items)
    }

    pub fn op(&self) -> BoolOp {
        self.op
    }

    pub fn items(&self) -> &[Condition] {
        &self.items
    }

    pub fn push(&mut self, item: impl Into<Condition>) {
        self.items.push(item.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render each item, wrapping multi-element child clauses in parentheses
    pub fn render(&self, field: &str, start: usize, iterable: bool) -> (String, Params) {
        let mut params = Params::new();
        let mut parts = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let (mut query, item_params) = item.render(field, start + params.len(), iterable);
            // empty child clauses contribute nothing
            if query.is_empty() {
                continue;
            }
            if matches!(item, Condition::Clause(c) if c.len() > 1) {
                query = format!("({})", query);
            }
            params.extend(item_params);
            parts.push(query);
        }
        (parts.join(&format!(" {} ", self.op.as_str())), params)
    }
}

/// A comparison or a clause
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison(Comparison),
    Clause(Clause),
}

impl From<Comparison> for Condition {
    fn from(comparison: Comparison) -> Self {
        Condition::Comparison(comparison)
    }
}

impl From<Clause> for Condition {
    fn from(clause: Clause) -> Self {
        Condition::Clause(clause)
    }
}

impl Condition {
    /// Decode the JSON condition encoding
    ///
    /// Scalars, `null` and arrays compare for equality; `{"value", "operator",
    /// "negate"}` builds a comparison; `{"AND": [...]}` and `{"OR": [...]}`
    /// build clauses.
    pub fn from_json(value: &Value) -> Result<Self, FerroError> {
        match value {
            Value::Object(map) => {
                if let Some((op, items)) = clause_parts(map) {
                    let items = items
                        .iter()
                        .map(Condition::from_json)
                        .collect::<Result<Vec<_>, _>>()?;
                    return Ok(Clause::new(op, items).into());
                }
                if is_comparison_object(map) {
                    let operator = match map.get("operator") {
                        Some(Value::String(op)) => op.parse()?,
                        Some(other) => {
                            return Err(FerroError::usage(format!(
                                "operator must be a string but found {}",
                                other
                            )))
                        }
                        None => Operator::Eq,
                    };
                    let negate = match map.get("negate") {
                        Some(Value::Bool(b)) => *b,
                        None => false,
                        Some(other) => {
                            return Err(FerroError::usage(format!(
                                "negate must be a boolean but found {}",
                                other
                            )))
                        }
                    };
                    let value = map.get("value").cloned().unwrap_or(Value::Null);
                    return Ok(Comparison::new(value, operator, negate)?.into());
                }
                Err(FerroError::attribute(format!(
                    "expected a comparison or clause but found {}",
                    value
                )))
            }
            other => Ok(Comparison::equals(other.clone()).into()),
        }
    }

    pub fn render(&self, field: &str, start: usize, iterable: bool) -> (String, Params) {
        match self {
            Condition::Comparison(c) => c.render(field, start, iterable),
            Condition::Clause(c) => c.render(field, start, iterable),
        }
    }

    /// Multi-element OR clauses need parentheses inside an AND list
    pub fn needs_parens(&self) -> bool {
        matches!(self, Condition::Clause(c) if c.op == BoolOp::Or && c.len() > 1)
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Condition::Clause(c) if c.len() > 1)
    }

    pub fn apply_cast<F>(&mut self, field: &str, cast: &F) -> Result<(), FerroError>
    where
        F: Fn(&Value) -> Result<Value, String>,
    {
        match self {
            Condition::Comparison(c) => c.apply_cast(field, cast),
            Condition::Clause(c) => c
                .items
                .iter_mut()
                .try_for_each(|item| item.apply_cast(field, cast)),
        }
    }

    pub fn validate_choices(&self, field: &str, choices: &[String]) -> Result<(), FerroError> {
        match self {
            Condition::Comparison(c) => c.validate_choices(field, choices),
            Condition::Clause(c) => c
                .items
                .iter()
                .try_for_each(|item| item.validate_choices(field, choices)),
        }
    }
}

fn clause_parts(map: &Map<String, Value>) -> Option<(BoolOp, &Vec<Value>)> {
    if map.len() != 1 {
        return None;
    }
    match map.iter().next() {
        Some((key, Value::Array(items))) if key == "AND" => Some((BoolOp::And, items)),
        Some((key, Value::Array(items))) if key == "OR" => Some((BoolOp::Or, items)),
        _ => None,
    }
}

fn is_comparison_object(map: &Map<String, Value>) -> bool {
    map.contains_key("value")
        && map
            .keys()
            .all(|k| matches!(k.as_str(), "value" | "operator" | "negate"))
}

/// Whether a JSON value uses the comparison/clause encoding rather than
/// describing a nested query
pub fn is_condition_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => clause_parts(map).is_some() || is_comparison_object(map),
        _ => true,
    }
}
