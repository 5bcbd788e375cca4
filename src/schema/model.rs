//! Class and property metadata

use serde::{Deserialize, Serialize};

use super::cast::Cast;

/// Storage type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Any,
    String,
    Integer,
    Long,
    Boolean,
    Link,
    LinkList,
    LinkSet,
    LinkMap,
    LinkBag,
    Embedded,
    EmbeddedList,
    EmbeddedSet,
    EmbeddedMap,
}

impl PropertyType {
    /// Lists, sets, maps and bags hold more than one value
    pub fn is_iterable(&self) -> bool {
        matches!(
            self,
            PropertyType::LinkList
                | PropertyType::LinkSet
                | PropertyType::LinkMap
                | PropertyType::LinkBag
                | PropertyType::EmbeddedList
                | PropertyType::EmbeddedSet
                | PropertyType::EmbeddedMap
        )
    }

    /// Values are record IDs
    pub fn is_link(&self) -> bool {
        matches!(
            self,
            PropertyType::Link
                | PropertyType::LinkList
                | PropertyType::LinkSet
                | PropertyType::LinkMap
                | PropertyType::LinkBag
        )
    }
}

/// A property of a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<Cast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub mandatory: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyType) -> Self {
        Self {
            name: name.into(),
            kind,
            linked_class: None,
            cast: None,
            choices: None,
            mandatory: false,
        }
    }

    pub fn linked_to(mut self, class: impl Into<String>) -> Self {
        self.linked_class = Some(class.into());
        self
    }

    pub fn with_cast(mut self, cast: Cast) -> Self {
        self.cast = Some(cast);
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }
}

/// A vertex or edge class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassModel {
    pub name: String,
    #[serde(default)]
    pub is_edge: bool,
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Parent class names
    #[serde(default)]
    pub inherits: Vec<String>,
    /// Child class names
    #[serde(default)]
    pub subclasses: Vec<String>,
}

impl ClassModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_edge: false,
            properties: Vec::new(),
            inherits: Vec::new(),
            subclasses: Vec::new(),
        }
    }

    pub fn edge(name: impl Into<String>) -> Self {
        Self {
            is_edge: true,
            ..Self::new(name)
        }
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_subclass(mut self, name: impl Into<String>) -> Self {
        self.subclasses.push(name.into());
        self
    }

    pub fn inheriting(mut self, name: impl Into<String>) -> Self {
        self.inherits.push(name.into());
        self
    }

    /// Own property by name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}
