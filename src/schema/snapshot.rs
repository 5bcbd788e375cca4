//! In-memory schema loaded from JSON

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::FerroError;

use super::cast::Cast;
use super::model::{ClassModel, Property, PropertyType};
use super::provider::SchemaProvider;

/// Class metadata keyed by class name
#[derive(Debug, Clone, Default)]
pub struct Schema {
    classes: BTreeMap<String, ClassModel>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of class models
    pub fn from_json(path: &Path) -> Result<Self, FerroError> {
        let content = std::fs::read_to_string(path)?;
        let schema = Self::from_json_str(&content)?;
        log::debug!(
            "loaded {} class models from {}",
            schema.classes.len(),
            path.display()
        );
        Ok(schema)
    }

    pub fn from_json_str(content: &str) -> Result<Self, FerroError> {
        let models: Vec<ClassModel> = serde_json::from_str(content)?;
        let mut schema = Self::new();
        for model in models {
            schema.add_class(model);
        }
        Ok(schema)
    }

    pub fn add_class(&mut self, model: ClassModel) {
        self.classes.insert(model.name.clone(), model);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Schema with the classes used throughout the test suite
    pub fn with_test_data() -> Self {
        let mut schema = Self::new();

        schema.add_class(
            ClassModel::new("V")
                .with_subclass("Source")
                .with_subclass("Person"),
        );
        schema.add_class(
            ClassModel::new("Source")
                .inheriting("V")
                .with_property(Property::new("name", PropertyType::String).with_cast(Cast::String))
                .with_property(Property::new("sourceId", PropertyType::String)),
        );
        schema.add_class(
            ClassModel::new("Person")
                .inheriting("V")
                .with_subclass("Parent")
                .with_property(Property::new("name", PropertyType::String).with_cast(Cast::String))
                .with_property(
                    Property::new("birthYear", PropertyType::Integer).with_cast(Cast::Integer),
                ),
        );
        schema.add_class(
            ClassModel::new("Parent")
                .inheriting("Person")
                .with_property(
                    Property::new("child", PropertyType::Link).linked_to("LinkedModel"),
                ),
        );
        schema.add_class(
            ClassModel::new("LinkedModel")
                .with_property(Property::new("thing", PropertyType::String))
                .with_property(Property::new("name", PropertyType::String).with_cast(Cast::String)),
        );
        schema.add_class(
            ClassModel::new("RestrictiveModel")
                .with_property(Property::new("requiredVar", PropertyType::String).mandatory())
                .with_property(Property::new("defaultVar", PropertyType::String))
                .with_property(
                    Property::new("linkVar", PropertyType::Link).linked_to("LinkedModel"),
                )
                .with_property(
                    Property::new("linkListVar", PropertyType::LinkList).linked_to("LinkedModel"),
                )
                .with_property(Property::new("embeddedSetVar", PropertyType::EmbeddedSet))
                .with_property(
                    Property::new("status", PropertyType::String)
                        .with_cast(Cast::String)
                        .with_choices(["pending", "accepted", "rejected"]),
                )
                .with_property(Property::new("rank", PropertyType::Integer).with_cast(Cast::Integer)),
        );
        schema.add_class(
            ClassModel::new("Statement")
                .with_property(Property::new("description", PropertyType::String))
                .with_property(Property::new("subject", PropertyType::Link).linked_to("V"))
                .with_property(
                    Property::new("reviewStatus", PropertyType::String)
                        .with_choices(["initial", "mixed", "passed", "failed"]),
                ),
        );

        schema.add_class(
            ClassModel::edge("AliasOf")
                .with_property(Property::new("source", PropertyType::Link).linked_to("Source"))
                .with_property(Property::new("basicProp", PropertyType::String)),
        );
        schema.add_class(
            ClassModel::edge("DeprecatedBy")
                .with_property(Property::new("source", PropertyType::Link).linked_to("Source")),
        );
        schema.add_class(ClassModel::edge("SubclassOf"));
        schema.add_class(ClassModel::edge("SupportedBy"));
        schema
    }
}

impl SchemaProvider for Schema {
    fn class(&self, name: &str) -> Option<&ClassModel> {
        self.classes.get(name)
    }

    fn classes(&self) -> Vec<&ClassModel> {
        self.classes.values().collect()
    }
}
