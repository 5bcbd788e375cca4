//! Schema provider trait

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::error::FerroError;

use super::model::{ClassModel, Property};

/// Read access to class metadata
///
/// Implementors supply class lookup; property resolution through the class
/// hierarchy is provided.
pub trait SchemaProvider {
    /// Class by exact name
    fn class(&self, name: &str) -> Option<&ClassModel>;

    /// All classes
    fn classes(&self) -> Vec<&ClassModel>;

    /// Edge class by case-insensitive name
    fn edge_class(&self, name: &str) -> Option<&ClassModel> {
        self.classes()
            .into_iter()
            .find(|model| model.is_edge && model.name.eq_ignore_ascii_case(name))
    }

    /// Class by exact name, or an error naming it
    fn require_class(&self, name: &str) -> Result<&ClassModel, FerroError> {
        self.class(name)
            .ok_or_else(|| FerroError::unknown_class(name))
    }

    /// Whether `name` is `ancestor` or one of its subclasses
    fn is_subclass_of(&self, name: &str, ancestor: &str) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![ancestor];
        while let Some(current) = pending.pop() {
            if current == name {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(model) = self.class(current) {
                pending.extend(model.subclasses.iter().map(String::as_str));
            }
        }
        false
    }

    /// Properties queryable on a class
    ///
    /// Own properties win over inherited ones, which win over properties
    /// contributed by subclasses.
    fn query_properties<'a>(&'a self, model: &'a ClassModel) -> BTreeMap<&'a str, &'a Property> {
        let mut found: BTreeMap<&str, &Property> = BTreeMap::new();
        let mut visited = HashSet::new();

        let mut ancestry = vec![model];
        while let Some(current) = ancestry.pop() {
            if !visited.insert(current.name.as_str()) {
                continue;
            }
            for property in &current.properties {
                found.entry(property.name.as_str()).or_insert(property);
            }
            ancestry.extend(current.inherits.iter().filter_map(|name| self.class(name)));
        }

        let mut descendants: Vec<&ClassModel> = model
            .subclasses
            .iter()
            .filter_map(|name| self.class(name))
            .collect();
        while let Some(current) = descendants.pop() {
            if !visited.insert(current.name.as_str()) {
                continue;
            }
            for property in &current.properties {
                found.entry(property.name.as_str()).or_insert(property);
            }
            descendants.extend(current.subclasses.iter().filter_map(|name| self.class(name)));
        }
        found
    }

    /// Single queryable property
    fn query_property<'a>(&'a self, model: &'a ClassModel, name: &str) -> Option<&'a Property> {
        self.query_properties(model).get(name).copied()
    }

    /// First property with this name on any class
    fn any_property(&self, name: &str) -> Option<&Property> {
        self.classes()
            .into_iter()
            .find_map(|model| model.property(name))
    }
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for Box<T> {
    fn class(&self, name: &str) -> Option<&ClassModel> {
        (**self).class(name)
    }

    fn classes(&self) -> Vec<&ClassModel> {
        (**self).classes()
    }
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for Arc<T> {
    fn class(&self, name: &str) -> Option<&ClassModel> {
        (**self).class(name)
    }

    fn classes(&self) -> Vec<&ClassModel> {
        (**self).classes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn test_edge_class_case_insensitive() {
        let schema = Schema::with_test_data();
        assert_eq!(schema.edge_class("aliasof").unwrap().name, "AliasOf");
        assert_eq!(schema.edge_class("SUPPORTEDBY").unwrap().name, "SupportedBy");
        assert!(schema.edge_class("parent").is_none());
    }

    #[test]
    fn test_require_class() {
        let schema = Schema::with_test_data();
        assert!(schema.require_class("Parent").is_ok());
        let err = schema.require_class("Nope").unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn test_subclass_properties_are_queryable() {
        let schema = Schema::with_test_data();
        let vertex = schema.class("V").unwrap();
        let properties = schema.query_properties(vertex);
        assert!(properties.contains_key("name"));
        assert!(schema.query_property(vertex, "sourceId").is_some());
    }

    #[test]
    fn test_inherited_properties() {
        let schema = Schema::with_test_data();
        let parent = schema.class("Parent").unwrap();
        assert!(schema.query_property(parent, "name").is_some());
        assert!(schema.query_property(parent, "child").is_some());
        assert!(schema.query_property(parent, "bogus").is_none());
    }

    #[test]
    fn test_is_subclass_of() {
        let schema = Schema::with_test_data();
        assert!(schema.is_subclass_of("Source", "V"));
        assert!(schema.is_subclass_of("V", "V"));
        assert!(!schema.is_subclass_of("V", "Source"));
    }

    #[test]
    fn test_boxed_provider() {
        let boxed: Box<dyn SchemaProvider> = Box::new(Schema::with_test_data());
        assert!(boxed.edge_class("deprecatedby").is_some());
        let shared = Arc::new(Schema::with_test_data());
        assert!(shared.class("Person").is_some());
    }
}
