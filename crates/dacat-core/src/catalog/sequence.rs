//! Sequence (number generator) definitions.
//!
//! Only the generator configuration is modeled here. Value generation is
//! delegated to the backing store.

use super::handle::{CatalogKey, DataSetTypeKey, PropertyKey, SequenceKey};
use super::property::Property;

/// The property a sequence feeds, together with the schema it was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceOwner {
    /// The owning property.
    pub property: PropertyKey,
    /// The schema the property belonged to when ownership was assigned.
    pub data_set_type: Option<DataSetTypeKey>,
}

impl SequenceOwner {
    /// Create an owner from explicit handles.
    pub fn new(data_set_type: DataSetTypeKey, property: PropertyKey) -> Self {
        Self {
            property,
            data_set_type: Some(data_set_type),
        }
    }

    /// Capture a property and its current parent.
    pub fn of(property: &Property) -> Self {
        Self {
            property: property.key(),
            data_set_type: property.parent(),
        }
    }
}

/// A named number generator.
#[derive(Debug)]
pub struct Sequence {
    key: SequenceKey,
    id: u32,
    name: String,
    increment: i64,
    min_value: i64,
    max_value: i64,
    start_value: i64,
    cached_values: i64,
    cycled: bool,
    owner: Option<SequenceOwner>,
    catalog: Option<CatalogKey>,
}

impl Sequence {
    /// Create a sequence with increment 1, start 1, cache 1, no cycling and
    /// the full signed 64-bit range.
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self {
            key: SequenceKey::next(),
            id,
            name: name.into(),
            increment: 1,
            min_value: i64::MIN,
            max_value: i64::MAX,
            start_value: 1,
            cached_values: 1,
            cycled: false,
            owner: None,
            catalog: None,
        }
    }

    /// Set the increment.
    pub fn with_increment(mut self, increment: i64) -> Self {
        self.increment = increment;
        self
    }

    /// Set the minimum value.
    pub fn with_min_value(mut self, value: i64) -> Self {
        self.min_value = value;
        self
    }

    /// Set the maximum value.
    pub fn with_max_value(mut self, value: i64) -> Self {
        self.max_value = value;
        self
    }

    /// Set the start value.
    pub fn with_start_value(mut self, value: i64) -> Self {
        self.start_value = value;
        self
    }

    /// Set how many values are preallocated.
    pub fn with_cached_values(mut self, value: i64) -> Self {
        self.cached_values = value;
        self
    }

    /// Make the sequence wrap around at its bounds.
    pub fn with_cycle(mut self) -> Self {
        self.cycled = true;
        self
    }

    /// Make `property` the owner of this sequence.
    pub fn owned_by(mut self, property: &Property) -> Self {
        self.owner = Some(SequenceOwner::of(property));
        self
    }

    /// Identity handle.
    pub fn key(&self) -> SequenceKey {
        self.key
    }

    /// User-facing id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Sequence name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the user-facing id.
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Rename the sequence.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Increment between values.
    pub fn increment(&self) -> i64 {
        self.increment
    }

    /// Set the increment.
    pub fn set_increment(&mut self, increment: i64) {
        self.increment = increment;
    }

    /// Minimum value.
    pub fn min_value(&self) -> i64 {
        self.min_value
    }

    /// Set the minimum value.
    pub fn set_min_value(&mut self, value: i64) {
        self.min_value = value;
    }

    /// Maximum value.
    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    /// Set the maximum value.
    pub fn set_max_value(&mut self, value: i64) {
        self.max_value = value;
    }

    /// Start value.
    pub fn start_value(&self) -> i64 {
        self.start_value
    }

    /// Set the start value.
    pub fn set_start_value(&mut self, value: i64) {
        self.start_value = value;
    }

    /// Number of preallocated values.
    pub fn cached_values(&self) -> i64 {
        self.cached_values
    }

    /// Set the number of preallocated values.
    pub fn set_cached_values(&mut self, value: i64) {
        self.cached_values = value;
    }

    /// Whether the sequence wraps around.
    pub fn is_cycled(&self) -> bool {
        self.cycled
    }

    /// Set whether the sequence wraps around.
    pub fn set_cycled(&mut self, cycled: bool) {
        self.cycled = cycled;
    }

    /// Owner, if any.
    pub fn owner(&self) -> Option<&SequenceOwner> {
        self.owner.as_ref()
    }

    /// The owning property, if any.
    pub fn owner_property(&self) -> Option<PropertyKey> {
        self.owner.map(|o| o.property)
    }

    /// The catalog this sequence is registered in.
    pub fn catalog(&self) -> Option<CatalogKey> {
        self.catalog
    }

    /// Set or clear the owner.
    pub fn set_owner(&mut self, owner: Option<SequenceOwner>) {
        self.owner = owner;
    }

    pub(crate) fn set_catalog(&mut self, catalog: Option<CatalogKey>) {
        self.catalog = catalog;
    }
}

impl Clone for Sequence {
    /// The copy is free-standing: it keeps the id, owner and every numeric
    /// setting but is not registered in any catalog.
    fn clone(&self) -> Self {
        Self {
            key: SequenceKey::next(),
            id: self.id,
            name: self.name.clone(),
            increment: self.increment,
            min_value: self.min_value,
            max_value: self.max_value,
            start_value: self.start_value,
            cached_values: self.cached_values,
            cycled: self.cycled,
            owner: self.owner,
            catalog: None,
        }
    }
}
