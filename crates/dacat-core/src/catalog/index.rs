//! Index definitions.

use super::handle::{DataSetTypeKey, IndexKey, PropertyKey};
use super::types::IndexType;

/// A physical index over an ordered list of properties of one schema.
#[derive(Debug)]
pub struct Index {
    key: IndexKey,
    id: u32,
    name: String,
    index_type: IndexType,
    data_set_type: Option<DataSetTypeKey>,
    properties: Vec<PropertyKey>,
}

impl Index {
    /// Create an empty index.
    pub fn new(name: impl Into<String>, index_type: IndexType) -> Self {
        Self {
            key: IndexKey::next(),
            id: 0,
            name: name.into(),
            index_type,
            data_set_type: None,
            properties: Vec::new(),
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Append a property.
    pub fn with_property(mut self, property: PropertyKey) -> Self {
        self.properties.push(property);
        self
    }

    /// Identity handle.
    pub fn key(&self) -> IndexKey {
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

    /// Index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the index.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Access method.
    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Set the access method.
    pub fn set_index_type(&mut self, index_type: IndexType) {
        self.index_type = index_type;
    }

    /// The owning schema, if attached.
    pub fn data_set_type(&self) -> Option<DataSetTypeKey> {
        self.data_set_type
    }

    pub(crate) fn set_data_set_type(&mut self, data_set_type: Option<DataSetTypeKey>) {
        self.data_set_type = data_set_type;
    }

    /// Indexed properties in key order.
    pub fn properties(&self) -> &[PropertyKey] {
        &self.properties
    }

    /// Replace the indexed property list.
    pub fn set_properties(&mut self, properties: Vec<PropertyKey>) {
        self.properties = properties;
    }

    /// Append a property.
    pub fn add(&mut self, property: PropertyKey) {
        self.properties.push(property);
    }

    /// Check if the property is indexed.
    pub fn has(&self, property: PropertyKey) -> bool {
        self.properties.contains(&property)
    }

    /// Substitute `new` for `old`.
    pub fn replace(&mut self, old: PropertyKey, new: PropertyKey) {
        if let Some(slot) = self.properties.iter_mut().find(|p| **p == old) {
            *slot = new;
        }
    }

    /// Check if this index covers exactly the given properties, in any order.
    pub fn covers(&self, properties: &[PropertyKey]) -> bool {
        self.properties.len() == properties.len()
            && properties.iter().all(|p| self.properties.contains(p))
    }
}

impl Clone for Index {
    fn clone(&self) -> Self {
        Self {
            key: IndexKey::next(),
            id: self.id,
            name: self.name.clone(),
            index_type: self.index_type,
            data_set_type: None,
            properties: self.properties.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_members() {
        let a = PropertyKey::next();
        let b = PropertyKey::next();

        let mut index = Index::new("idx_orders", IndexType::BTree)
            .with_property(a)
            .with_property(b);

        assert!(index.has(a));
        assert!(index.covers(&[b, a]));
        assert!(!index.covers(&[a]));

        let c = PropertyKey::next();
        index.replace(a, c);
        assert_eq!(index.properties(), &[c, b]);
    }

    #[test]
    fn test_clone_is_detached() {
        let mut index = Index::new("idx_geom", IndexType::RTree).with_id(4);
        index.set_data_set_type(Some(DataSetTypeKey::next()));

        let copy = index.clone();
        assert_ne!(copy.key(), index.key());
        assert_eq!(copy.index_type(), IndexType::RTree);
        assert_eq!(copy.id(), 4);
        assert!(copy.data_set_type().is_none());
    }
}
