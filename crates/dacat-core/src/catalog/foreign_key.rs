//! Foreign key definitions between schemas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::handle::{ConstraintKey, DataSetTypeKey, PropertyKey};
use crate::error::Error;

/// Referential action run when a referenced row is deleted or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FkAction {
    /// Defer the check to the end of the statement.
    #[default]
    NoAction,
    /// Prevent the change if dependent rows exist.
    Restrict,
    /// Propagate the change to dependent rows.
    Cascade,
    /// Set the referencing columns to null.
    SetNull,
    /// Set the referencing columns to their defaults.
    SetDefault,
}

impl fmt::Display for FkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FkAction::NoAction => write!(f, "NO ACTION"),
            FkAction::Restrict => write!(f, "RESTRICT"),
            FkAction::Cascade => write!(f, "CASCADE"),
            FkAction::SetNull => write!(f, "SET NULL"),
            FkAction::SetDefault => write!(f, "SET DEFAULT"),
        }
    }
}

impl FromStr for FkAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .split(|c: char| c.is_whitespace() || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        match normalized.as_str() {
            "NO ACTION" => Ok(FkAction::NoAction),
            "RESTRICT" => Ok(FkAction::Restrict),
            "CASCADE" => Ok(FkAction::Cascade),
            "SET NULL" => Ok(FkAction::SetNull),
            "SET DEFAULT" => Ok(FkAction::SetDefault),
            _ => Err(Error::InvalidArgument(format!(
                "unknown foreign key action '{s}'"
            ))),
        }
    }
}

/// A foreign key: local columns referencing columns of another (or the same) schema.
///
/// `properties()` and `referenced_properties()` are parallel lists; the i-th
/// local property references the i-th referenced property.
#[derive(Debug)]
pub struct ForeignKey {
    key: ConstraintKey,
    id: u32,
    name: String,
    data_set_type: Option<DataSetTypeKey>,
    referenced: Option<DataSetTypeKey>,
    properties: Vec<PropertyKey>,
    ref_properties: Vec<PropertyKey>,
    on_delete: FkAction,
    on_update: FkAction,
}

impl ForeignKey {
    /// Create an empty foreign key with `NO ACTION` on delete and update.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            key: ConstraintKey::next(),
            id: 0,
            name: name.into(),
            data_set_type: None,
            referenced: None,
            properties: Vec::new(),
            ref_properties: Vec::new(),
            on_delete: FkAction::NoAction,
            on_update: FkAction::NoAction,
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Set the referenced schema.
    pub fn referencing(mut self, data_set_type: DataSetTypeKey) -> Self {
        self.referenced = Some(data_set_type);
        self
    }

    /// Append a (local, referenced) column pair.
    pub fn with_pair(mut self, local: PropertyKey, referenced: PropertyKey) -> Self {
        self.add_pair(local, referenced);
        self
    }

    /// Set the delete action.
    pub fn with_on_delete(mut self, action: FkAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Set the update action.
    pub fn with_on_update(mut self, action: FkAction) -> Self {
        self.on_update = action;
        self
    }

    /// Identity handle.
    pub fn key(&self) -> ConstraintKey {
        self.key
    }

    /// User-facing id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Set the user-facing id.
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Constraint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the constraint.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The schema owning this foreign key, if attached.
    pub fn data_set_type(&self) -> Option<DataSetTypeKey> {
        self.data_set_type
    }

    pub(crate) fn set_data_set_type(&mut self, data_set_type: Option<DataSetTypeKey>) {
        self.data_set_type = data_set_type;
    }

    /// The referenced schema.
    pub fn referenced_data_set_type(&self) -> Option<DataSetTypeKey> {
        self.referenced
    }

    /// Set the referenced schema.
    pub fn set_referenced_data_set_type(&mut self, data_set_type: Option<DataSetTypeKey>) {
        self.referenced = data_set_type;
    }

    /// Local columns.
    pub fn properties(&self) -> &[PropertyKey] {
        &self.properties
    }

    /// Replace the local column list.
    pub fn set_properties(&mut self, properties: Vec<PropertyKey>) {
        self.properties = properties;
    }

    /// Referenced columns.
    pub fn referenced_properties(&self) -> &[PropertyKey] {
        &self.ref_properties
    }

    /// Replace the referenced column list.
    pub fn set_referenced_properties(&mut self, properties: Vec<PropertyKey>) {
        self.ref_properties = properties;
    }

    /// Append a local column.
    pub fn add(&mut self, property: PropertyKey) {
        self.properties.push(property);
    }

    /// Append a referenced column.
    pub fn add_ref_property(&mut self, property: PropertyKey) {
        self.ref_properties.push(property);
    }

    /// Append a (local, referenced) column pair.
    pub fn add_pair(&mut self, local: PropertyKey, referenced: PropertyKey) {
        self.properties.push(local);
        self.ref_properties.push(referenced);
    }

    /// Check if the property is one of the local columns.
    pub fn has(&self, property: PropertyKey) -> bool {
        self.properties.contains(&property)
    }

    /// Check if the property is one of the referenced columns.
    pub fn is_referenced(&self, property: PropertyKey) -> bool {
        self.ref_properties.contains(&property)
    }

    /// Substitute `new` for `old` in both column lists independently.
    pub fn replace(&mut self, old: PropertyKey, new: PropertyKey) {
        for slot in self.properties.iter_mut().filter(|p| **p == old) {
            *slot = new;
        }
        for slot in self.ref_properties.iter_mut().filter(|p| **p == old) {
            *slot = new;
        }
    }

    /// Delete action.
    pub fn on_delete(&self) -> FkAction {
        self.on_delete
    }

    /// Set the delete action.
    pub fn set_on_delete(&mut self, action: FkAction) {
        self.on_delete = action;
    }

    /// Update action.
    pub fn on_update(&self) -> FkAction {
        self.on_update
    }

    /// Set the update action.
    pub fn set_on_update(&mut self, action: FkAction) {
        self.on_update = action;
    }

    /// Check if both column lists have the same length.
    pub fn is_balanced(&self) -> bool {
        self.properties.len() == self.ref_properties.len()
    }
}

impl Clone for ForeignKey {
    /// Shallow copy: property handles and the referenced schema are shared,
    /// the copy is detached from any owning schema.
    fn clone(&self) -> Self {
        Self {
            key: ConstraintKey::next(),
            id: self.id,
            name: self.name.clone(),
            data_set_type: None,
            referenced: self.referenced,
            properties: self.properties.clone(),
            ref_properties: self.ref_properties.clone(),
            on_delete: self.on_delete,
            on_update: self.on_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_and_is_referenced() {
        let customer_id = PropertyKey::next();
        let id = PropertyKey::next();

        let fk = ForeignKey::new("fk_orders_customer")
            .referencing(DataSetTypeKey::next())
            .with_pair(customer_id, id);

        assert!(fk.has(customer_id));
        assert!(!fk.has(id));
        assert!(fk.is_referenced(id));
        assert!(!fk.is_referenced(customer_id));
        assert!(fk.is_balanced());
    }

    #[test]
    fn test_replace_targets_each_list() {
        let local = PropertyKey::next();
        let remote = PropertyKey::next();
        let new_local = PropertyKey::next();
        let new_remote = PropertyKey::next();

        let mut fk = ForeignKey::new("fk").with_pair(local, remote);

        fk.replace(remote, new_remote);
        assert_eq!(fk.properties(), &[local]);
        assert_eq!(fk.referenced_properties(), &[new_remote]);

        fk.replace(local, new_local);
        assert_eq!(fk.properties(), &[new_local]);
        assert_eq!(fk.referenced_properties(), &[new_remote]);
    }

    #[test]
    fn test_clone_is_shallow_and_detached() {
        let referenced = DataSetTypeKey::next();
        let mut fk = ForeignKey::new("fk")
            .referencing(referenced)
            .with_pair(PropertyKey::next(), PropertyKey::next())
            .with_on_delete(FkAction::Cascade)
            .with_on_update(FkAction::SetNull);
        fk.set_data_set_type(Some(DataSetTypeKey::next()));

        let copy = fk.clone();
        assert_ne!(copy.key(), fk.key());
        assert!(copy.data_set_type().is_none());
        assert_eq!(copy.referenced_data_set_type(), Some(referenced));
        assert_eq!(copy.properties(), fk.properties());
        assert_eq!(copy.referenced_properties(), fk.referenced_properties());
        assert_eq!(copy.on_delete(), FkAction::Cascade);
        assert_eq!(copy.on_update(), FkAction::SetNull);
    }

    #[test]
    fn test_action_display_and_parse() {
        assert_eq!(FkAction::SetNull.to_string(), "SET NULL");
        assert_eq!("no action".parse::<FkAction>().unwrap(), FkAction::NoAction);
        assert_eq!("SET_DEFAULT".parse::<FkAction>().unwrap(), FkAction::SetDefault);
        assert_eq!(" cascade ".parse::<FkAction>().unwrap(), FkAction::Cascade);
        assert!("explode".parse::<FkAction>().is_err());
    }
}
