//! Typed graph traversals
//!
//! A traversal addresses a value reachable from the queried class: a direct
//! property, a property reached through a link, or the far side of an edge.
//! They are written either as compound strings (`out(AliasOf).vertex.name`)
//! or as nested JSON descriptors.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FerroError;
use crate::schema::{Cast, ClassModel, Property, SchemaProvider};

use super::constants::{edge_list, Direction, SIZE_COMPUTATION};

static EDGE_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(in|out|both)(?:E?\(([^)]*)\)|E)$").expect("valid regex")
});

static BUILTIN_VERTEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(in|out|both)V?(?:\(\))?$").expect("valid regex"));

/// Whether a condition key addresses a traversal rather than a property
pub(crate) fn is_compound_attr(key: &str) -> bool {
    key.contains('.') || EDGE_STEP.is_match(key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TraversalKind {
    Link,
    Edge,
    Direct,
}

/// Unresolved traversal descriptor
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TraversalSpec {
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<TraversalKind>,
    #[serde(default)]
    pub edges: Option<Vec<String>>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "deserialize_child")]
    pub child: Option<Box<TraversalSpec>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChildSpec {
    Name(String),
    Spec(TraversalSpec),
}

fn deserialize_child<'de, D>(deserializer: D) -> Result<Option<Box<TraversalSpec>>, D::Error>
where
    D: Deserializer<'de>,
{
    let child = Option::<ChildSpec>::deserialize(deserializer)?;
    Ok(child.map(|c| {
        Box::new(match c {
            ChildSpec::Name(attr) => TraversalSpec::named(attr),
            ChildSpec::Spec(spec) => spec,
        })
    }))
}

impl TraversalSpec {
    pub fn named(attr: impl Into<String>) -> Self {
        Self {
            attr: Some(attr.into()),
            ..Self::default()
        }
    }

    fn is_edge(&self) -> bool {
        self.kind == Some(TraversalKind::Edge) || self.edges.is_some() || self.direction.is_some()
    }
}

/// Expand dotted shorthand into a nested descriptor
///
/// ```
/// use ferro_kb::query::traversal::parse_compound_attr;
///
/// let spec = parse_compound_attr("out(AliasOf).vertex.name").unwrap();
/// assert_eq!(spec.direction.as_deref(), Some("out"));
/// let child = spec.child.unwrap();
/// assert_eq!(child.attr.as_deref(), Some("inV()"));
/// ```
pub fn parse_compound_attr(compound: &str) -> Result<TraversalSpec, FerroError> {
    let mut steps: Vec<TraversalSpec> = Vec::new();
    for attr in compound.split('.') {
        if attr.is_empty() {
            return Err(FerroError::attribute(format!(
                "empty step in traversal '{}'",
                compound
            )));
        }
        if let Some(caps) = EDGE_STEP.captures(attr) {
            let edges = caps.get(2).map(|m| {
                m.as_str()
                    .split(',')
                    .map(|e| e.trim().trim_matches('\'').trim_matches('"').to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            });
            steps.push(TraversalSpec {
                kind: Some(TraversalKind::Edge),
                direction: Some(caps[1].to_string()),
                edges,
                ..TraversalSpec::default()
            });
        } else if attr == "vertex" {
            let direction = match steps.last() {
                Some(previous) if previous.kind == Some(TraversalKind::Edge) => {
                    previous.direction.as_deref().unwrap_or("both").parse::<Direction>()?
                }
                _ => {
                    return Err(FerroError::attribute(
                        "vertex may only follow an edge traversal",
                    ))
                }
            };
            steps.push(TraversalSpec::named(direction.vertex()));
        } else {
            steps.push(TraversalSpec::named(attr));
        }
    }

    let mut spec = steps
        .pop()
        .ok_or_else(|| FerroError::attribute("empty traversal"))?;
    while let Some(mut parent) = steps.pop() {
        if parent.kind.is_none() {
            parent.kind = Some(TraversalKind::Link);
        }
        parent.child = Some(Box::new(spec));
        spec = parent;
    }
    Ok(spec)
}

/// A schema-resolved traversal
#[derive(Debug, Clone, PartialEq)]
pub enum Traversal {
    Direct {
        attr: String,
        property: Option<Property>,
        cast: Option<Cast>,
    },
    Link {
        attr: String,
        property: Option<Property>,
        child: Box<Traversal>,
    },
    Edge {
        edges: Vec<String>,
        direction: Direction,
        child: Option<Box<Traversal>>,
    },
}

impl Traversal {
    /// Parse a compound string or JSON descriptor against `model`
    ///
    /// Without a model, names resolve against every class in the schema.
    pub fn parse<S: SchemaProvider + ?Sized>(
        schema: &S,
        model: Option<&ClassModel>,
        attr: &Value,
    ) -> Result<Self, FerroError> {
        let spec = match attr {
            Value::String(compound) => parse_compound_attr(compound)?,
            other => serde_json::from_value(other.clone()).map_err(|e| {
                FerroError::attribute(format!("invalid traversal descriptor: {}", e))
            })?,
        };
        Self::resolve(schema, model, &spec)
    }

    pub fn parse_str<S: SchemaProvider + ?Sized>(
        schema: &S,
        model: Option<&ClassModel>,
        compound: &str,
    ) -> Result<Self, FerroError> {
        Self::resolve(schema, model, &parse_compound_attr(compound)?)
    }

    pub fn resolve<S: SchemaProvider + ?Sized>(
        schema: &S,
        model: Option<&ClassModel>,
        spec: &TraversalSpec,
    ) -> Result<Self, FerroError> {
        if spec.is_edge() {
            return Self::resolve_edge(schema, model, spec);
        }
        let name = spec.attr.as_deref().ok_or_else(|| {
            FerroError::attribute("attr is a required property for link-type traversals")
        })?;
        let builtin = BUILTIN_VERTEX
            .captures(name)
            .map(|caps| format!("{}V()", &caps[1]));
        let property = match model {
            Some(model) => schema.query_property(model, name),
            None => schema.any_property(name),
        }
        .cloned();

        if let Some(child) = &spec.child {
            let attr = builtin.clone().unwrap_or_else(|| name.to_string());
            let child = match (&property, &builtin) {
                (Some(property), _) => {
                    let linked = property.linked_class.as_deref().ok_or_else(|| {
                        FerroError::attribute(format!(
                            "The traversal ({}) was defined as a link but the property ({}) does not have a linkedClass",
                            name, property.name
                        ))
                    })?;
                    let linked = schema.require_class(linked)?;
                    Self::resolve(schema, Some(linked), child)?
                }
                (None, Some(_)) => Self::resolve(schema, None, child)?,
                (None, None) => {
                    return Err(FerroError::attribute(format!(
                        "The expected property ({}) has no definition",
                        name
                    )))
                }
            };
            return Ok(Traversal::Link {
                attr,
                property,
                child: Box::new(child),
            });
        }

        if property.is_some() {
            Ok(Traversal::Direct {
                attr: name.to_string(),
                property,
                cast: None,
            })
        } else if name == SIZE_COMPUTATION {
            Ok(Traversal::Direct {
                attr: name.to_string(),
                property: None,
                cast: Some(Cast::Integer),
            })
        } else if let Some(attr) = builtin {
            Ok(Traversal::Direct {
                attr,
                property: None,
                cast: Some(Cast::Rid),
            })
        } else {
            Err(FerroError::attribute(format!(
                "The expected property ({}) has no property on the current model ({})",
                name,
                model.map(|m| m.name.as_str()).unwrap_or("any")
            )))
        }
    }

    fn resolve_edge<S: SchemaProvider + ?Sized>(
        schema: &S,
        model: Option<&ClassModel>,
        spec: &TraversalSpec,
    ) -> Result<Self, FerroError> {
        if spec.attr.is_some() {
            return Err(FerroError::attribute(
                "Edges do not require the attr property since they are not named",
            ));
        }
        if let Some(model) = model.filter(|m| m.is_edge) {
            return Err(FerroError::attribute(format!(
                "cannot traverse edges from the edge class '{}'",
                model.name
            )));
        }
        let direction: Direction = spec.direction.as_deref().unwrap_or("both").parse()?;
        let edges = spec
            .edges
            .iter()
            .flatten()
            .map(|name| {
                schema
                    .edge_class(name)
                    .map(|edge| edge.name.clone())
                    .ok_or_else(|| FerroError::attribute(format!("Invalid Edge class: {}", name)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let child = match &spec.child {
            Some(child) => {
                let mut child = child.as_ref().clone();
                if child.attr.as_deref() == Some("vertex") {
                    child.attr = Some(direction.vertex().to_string());
                }
                Some(Box::new(Self::resolve(schema, None, &child)?))
            }
            None => None,
        };
        Ok(Traversal::Edge {
            edges,
            direction,
            child,
        })
    }

    /// Property at the end of the chain
    pub fn terminal_property(&self) -> Option<&Property> {
        match self {
            Traversal::Direct { property, .. } => property.as_ref(),
            Traversal::Link { child, .. } => child.terminal_property(),
            Traversal::Edge { child, .. } => child.as_ref().and_then(|c| c.terminal_property()),
        }
    }

    /// Cast applied to values compared against this traversal
    pub fn terminal_cast(&self) -> Option<Cast> {
        match self {
            Traversal::Direct { property, cast, .. } => {
                cast.or_else(|| property.as_ref().and_then(|p| p.cast))
            }
            Traversal::Link { child, .. } => child.terminal_cast(),
            Traversal::Edge { child: None, .. } => Some(Cast::Rid),
            Traversal::Edge {
                child: Some(child), ..
            } => child.terminal_cast(),
        }
    }

    fn is_size(&self) -> bool {
        matches!(self, Traversal::Direct { attr, .. } if attr == SIZE_COMPUTATION)
    }

    /// Whether the traversal yields a collection of values
    pub fn is_iterable(&self) -> bool {
        match self {
            Traversal::Direct { property, .. } => {
                !self.is_size() && property.as_ref().is_some_and(|p| p.kind.is_iterable())
            }
            Traversal::Link {
                property, child, ..
            } => property.as_ref().is_some_and(|p| p.kind.is_iterable()) || child.is_iterable(),
            Traversal::Edge { child, .. } => child.as_ref().map_or(true, |c| !c.is_size()),
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Traversal::Direct { attr, .. } => f.write_str(attr),
            Traversal::Link { attr, child, .. } => write!(f, "{}.{}", attr, child),
            Traversal::Edge {
                edges,
                direction,
                child,
            } => {
                write!(f, "{}E({})", direction, edge_list(edges))?;
                if let Some(child) = child {
                    write!(f, ".{}", child)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_compound_edge_vertex() {
        let schema = Schema::with_test_data();
        let traversal = Traversal::parse_str(&schema, None, "out(AliasOf).vertex.name").unwrap();
        assert_eq!(traversal.to_string(), "outE('AliasOf').inV().name");
        assert!(traversal.is_iterable());
        assert_eq!(traversal.terminal_cast(), Some(Cast::String));
    }

    #[test]
    fn test_compound_edge_list_normalises_names() {
        let schema = Schema::with_test_data();
        let traversal =
            Traversal::parse_str(&schema, None, "inE(aliasof, 'DeprecatedBy').size()").unwrap();
        assert_eq!(
            traversal.to_string(),
            "inE('AliasOf', 'DeprecatedBy').size()"
        );
        assert!(!traversal.is_iterable());
        assert_eq!(traversal.terminal_cast(), Some(Cast::Integer));
    }

    #[test]
    fn test_bare_edge_casts_to_rid() {
        let schema = Schema::with_test_data();
        let traversal = Traversal::parse_str(&schema, None, "bothE").unwrap();
        assert_eq!(traversal.to_string(), "bothE()");
        assert_eq!(traversal.terminal_cast(), Some(Cast::Rid));
        assert!(traversal.is_iterable());
    }

    #[test]
    fn test_link_traversal() {
        let schema = Schema::with_test_data();
        let model = schema.class("RestrictiveModel").unwrap();
        let traversal = Traversal::parse_str(&schema, Some(model), "linkVar.thing").unwrap();
        assert_eq!(traversal.to_string(), "linkVar.thing");
        assert!(!traversal.is_iterable());
        assert_eq!(traversal.terminal_property().unwrap().name, "thing");

        let traversal = Traversal::parse_str(&schema, Some(model), "linkListVar.name").unwrap();
        assert!(traversal.is_iterable());
    }

    #[test]
    fn test_link_without_linked_class() {
        let schema = Schema::with_test_data();
        let model = schema.class("RestrictiveModel").unwrap();
        let err = Traversal::parse_str(&schema, Some(model), "requiredVar.name").unwrap_err();
        assert!(err.message().contains("does not have a linkedClass"));

        let err = Traversal::parse_str(&schema, Some(model), "bogus.name").unwrap_err();
        assert!(err.message().contains("has no definition"));
    }

    #[test]
    fn test_vertex_must_follow_edge() {
        let err = parse_compound_attr("name.vertex").unwrap_err();
        assert_eq!(err.message(), "vertex may only follow an edge traversal");
    }

    #[test]
    fn test_unknown_edge_class() {
        let schema = Schema::with_test_data();
        let err = Traversal::parse_str(&schema, None, "out(Nope).vertex").unwrap_err();
        assert_eq!(err.message(), "Invalid Edge class: Nope");
    }

    #[test]
    fn test_json_descriptor() {
        let schema = Schema::with_test_data();
        let traversal = Traversal::parse(
            &schema,
            None,
            &json!({"type": "EDGE", "edges": ["AliasOf"], "direction": "in", "child": "vertex"}),
        )
        .unwrap();
        assert_eq!(traversal.to_string(), "inE('AliasOf').outV()");

        let err = Traversal::parse(
            &schema,
            None,
            &json!({"type": "EDGE", "attr": "name", "edges": ["AliasOf"]}),
        )
        .unwrap_err();
        assert!(err.message().starts_with("Edges do not require the attr property"));

        let err = Traversal::parse(&schema, None, &json!({"direction": "sideways"})).unwrap_err();
        assert_eq!(err.message(), "Invalid direction (sideways)");
    }

    #[test]
    fn test_edge_from_edge_model_rejected() {
        let schema = Schema::with_test_data();
        let model = schema.class("AliasOf").unwrap();
        let err = Traversal::parse_str(&schema, Some(model), "out(AliasOf)").unwrap_err();
        assert!(err.message().contains("AliasOf"));
    }

    #[test]
    fn test_unknown_direct_property() {
        let schema = Schema::with_test_data();
        let model = schema.class("Person").unwrap();
        let err = Traversal::parse_str(&schema, Some(model), "shoeSize").unwrap_err();
        assert_eq!(
            err.message(),
            "The expected property (shoeSize) has no property on the current model (Person)"
        );
    }
}
