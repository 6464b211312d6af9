//! Property definitions for schemas.

use super::handle::{DataSetTypeKey, PropertyKey};
use super::types::PropertyType;

/// A named, typed attribute of a schema (a column).
///
/// Constraints and indexes refer to a property through its [`PropertyKey`],
/// never through a copy. Cloning a property yields a new property with a
/// fresh key and no parent.
#[derive(Debug)]
pub struct Property {
    key: PropertyKey,
    id: u32,
    name: String,
    data_type: PropertyType,
    required: bool,
    auto_number: bool,
    default_value: Option<String>,
    parent: Option<DataSetTypeKey>,
}

impl Property {
    /// Create a new optional property with id 0.
    pub fn new(name: impl Into<String>, data_type: PropertyType) -> Self {
        Self {
            key: PropertyKey::next(),
            id: 0,
            name: name.into(),
            data_type,
            required: false,
            auto_number: false,
            default_value: None,
            parent: None,
        }
    }

    /// Create a new required (NOT NULL) property.
    pub fn required(name: impl Into<String>, data_type: PropertyType) -> Self {
        Self::new(name, data_type).with_required(true)
    }

    /// Set the id.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Set whether the property is required.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Mark the property as auto-numbered (backed by a sequence).
    pub fn with_auto_number(mut self) -> Self {
        self.auto_number = true;
        self
    }

    /// Set the default value expression.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Identity handle.
    pub fn key(&self) -> PropertyKey {
        self.key
    }

    /// User-facing id. Only uniqueness is meaningful, not the value.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Set the user-facing id.
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data type.
    pub fn data_type(&self) -> PropertyType {
        self.data_type
    }

    /// Whether the property is required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the property is auto-numbered.
    pub fn is_auto_number(&self) -> bool {
        self.auto_number
    }

    /// Default value expression, if any.
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// The schema that currently owns this property.
    pub fn parent(&self) -> Option<DataSetTypeKey> {
        self.parent
    }

    // Renaming goes through the owning schema, which keeps names unique.
    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_parent(&mut self, parent: Option<DataSetTypeKey>) {
        self.parent = parent;
    }
}

impl Clone for Property {
    fn clone(&self) -> Self {
        Self {
            key: PropertyKey::next(),
            id: self.id,
            name: self.name.clone(),
            data_type: self.data_type,
            required: self.required,
            auto_number: self.auto_number,
            default_value: self.default_value.clone(),
            parent: None,
        }
    }
}
