//! Dataset schema (table / feature type) definitions.
//!
//! A [`DataSetType`] owns its properties, its primary key, unique keys,
//! check constraints, indexes and foreign keys. Members refer to properties
//! by [`PropertyKey`], so removing or replacing a property has to be
//! propagated through every member that mentions it. The methods here do
//! that for the schema itself; when the schema is registered in a
//! [`DataSourceCatalog`](super::DataSourceCatalog) the catalog wraps them
//! and additionally repairs foreign keys held by other schemas and the
//! sequences owned by the property.
//!
//! The catalog never lends out a mutable reference to a registered schema,
//! so every `&mut self` method below operates on a free-standing schema.

use std::collections::HashMap;

use super::constraint::{
    CheckConstraint, Constraint, ConstraintRef, ConstraintType, PrimaryKey, UniqueKey,
};
use super::foreign_key::ForeignKey;
use super::handle::{CatalogKey, ConstraintKey, DataSetTypeKey, IndexKey, PropertyKey};
use super::index::Index;
use super::property::Property;
use super::types::{DataSetCategory, PropertyType};
use crate::config::ValidationMode;
use crate::error::{Error, ObjectKind, Result};

/// The structural description of a dataset.
#[derive(Debug)]
pub struct DataSetType {
    key: DataSetTypeKey,
    id: u32,
    name: String,
    title: String,
    category: DataSetCategory,
    properties: Vec<Property>,
    primary_key: Option<PrimaryKey>,
    unique_keys: Vec<UniqueKey>,
    check_constraints: Vec<CheckConstraint>,
    indexes: Vec<Index>,
    foreign_keys: Vec<ForeignKey>,
    catalog: Option<CatalogKey>,
}

impl DataSetType {
    /// Create an empty schema.
    pub fn new(name: impl Into<String>, id: u32) -> Self {
        Self {
            key: DataSetTypeKey::next(),
            id,
            name: name.into(),
            title: String::new(),
            category: DataSetCategory::Unknown,
            properties: Vec::new(),
            primary_key: None,
            unique_keys: Vec::new(),
            check_constraints: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            catalog: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: DataSetCategory) -> Self {
        self.category = category;
        self
    }

    /// Identity handle.
    pub fn key(&self) -> DataSetTypeKey {
        self.key
    }

    /// User-facing id, unique within a catalog.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Set the id.
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Schema name, unique within a catalog.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the schema.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// A brief description.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Dataset category.
    pub fn category(&self) -> DataSetCategory {
        self.category
    }

    /// Set the category.
    pub fn set_category(&mut self, category: DataSetCategory) {
        self.category = category;
    }

    /// The catalog this schema is registered in.
    pub fn catalog(&self) -> Option<CatalogKey> {
        self.catalog
    }

    pub(crate) fn set_catalog(&mut self, catalog: Option<CatalogKey>) {
        self.catalog = catalog;
    }

    /// Check if any property is a geometry.
    pub fn has_geometry(&self) -> bool {
        self.has_property_of_type(PropertyType::Geometry)
    }

    /// Check if any property is a raster.
    pub fn has_raster(&self) -> bool {
        self.has_property_of_type(PropertyType::Raster)
    }

    fn has_property_of_type(&self, data_type: PropertyType) -> bool {
        self.properties.iter().any(|p| p.data_type() == data_type)
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Add a property. Fails if the name is empty or already taken.
    pub fn add_property(&mut self, mut property: Property) -> Result<PropertyKey> {
        self.check_new_property_name(property.name(), None)?;
        property.set_parent(Some(self.key));
        let key = property.key();
        self.properties.push(property);
        Ok(key)
    }

    /// Add several properties; either all are added or none.
    pub fn add_properties(
        &mut self,
        properties: impl IntoIterator<Item = Property>,
    ) -> Result<Vec<PropertyKey>> {
        let properties: Vec<Property> = properties.into_iter().collect();
        for (i, property) in properties.iter().enumerate() {
            self.check_new_property_name(property.name(), None)?;
            if properties[..i].iter().any(|p| p.name() == property.name()) {
                return Err(Error::duplicate_name(ObjectKind::Property, property.name()));
            }
        }

        let mut keys = Vec::with_capacity(properties.len());
        for mut property in properties {
            property.set_parent(Some(self.key));
            keys.push(property.key());
            self.properties.push(property);
        }
        Ok(keys)
    }

    fn check_new_property_name(&self, name: &str, replacing: Option<PropertyKey>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "a property name cannot be empty".to_string(),
            ));
        }
        if self
            .properties
            .iter()
            .any(|p| p.name() == name && Some(p.key()) != replacing)
        {
            return Err(Error::duplicate_name(ObjectKind::Property, name));
        }
        Ok(())
    }

    /// Number of properties.
    pub fn number_of_properties(&self) -> usize {
        self.properties.len()
    }

    /// All properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// The i-th property.
    pub fn property_at(&self, i: usize) -> Option<&Property> {
        self.properties.get(i)
    }

    /// Look up a property by handle.
    pub fn property(&self, key: PropertyKey) -> Option<&Property> {
        self.properties.iter().find(|p| p.key() == key)
    }

    /// Look up a property by name.
    pub fn property_by_name(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Position of the named property.
    pub fn property_position(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name() == name)
    }

    /// Check if the property belongs to this schema.
    pub fn has_property(&self, key: PropertyKey) -> bool {
        self.properties.iter().any(|p| p.key() == key)
    }

    /// Rename a property. Members refer to it by handle, so nothing else changes.
    pub fn rename_property(&mut self, key: PropertyKey, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let position = self
            .properties
            .iter()
            .position(|p| p.key() == key)
            .ok_or_else(|| Error::not_found(ObjectKind::Property, key))?;
        self.check_new_property_name(&name, Some(key))?;
        self.properties[position].set_name(name);
        Ok(())
    }

    /// Remove a property and everything in this schema that depends on it.
    ///
    /// Drops the primary key if it contains the property, every unique key
    /// and index containing it, and every foreign key of this schema that
    /// uses it as a local column or (self reference) as a referenced column.
    /// Returns `None` if the property is not part of this schema.
    pub fn remove_property(&mut self, key: PropertyKey) -> Option<Property> {
        if !self.has_property(key) {
            return None;
        }
        self.strip_property_dependents(key);
        self.take_property(key)
    }

    /// Substitute `new` for the property `old` here and in every member.
    ///
    /// Fails with `NotFound` if `old` is not part of this schema and with
    /// `DuplicateName` if `new` would collide with another property. Returns
    /// the replaced property, detached.
    pub fn replace_property(&mut self, old: PropertyKey, new: Property) -> Result<Property> {
        let position = self
            .properties
            .iter()
            .position(|p| p.key() == old)
            .ok_or_else(|| Error::not_found(ObjectKind::Property, old))?;
        self.check_new_property_name(new.name(), Some(old))?;

        self.replace_in_members(old, new.key());

        let mut new = new;
        new.set_parent(Some(self.key));
        let mut replaced = std::mem::replace(&mut self.properties[position], new);
        replaced.set_parent(None);
        Ok(replaced)
    }

    /// Drop the primary key, unique keys, indexes and own foreign keys that
    /// mention the property. Returns the dropped foreign keys so the caller
    /// can withdraw them from any reverse index.
    pub(crate) fn strip_property_dependents(&mut self, property: PropertyKey) -> Vec<ForeignKey> {
        if self.primary_key.as_ref().is_some_and(|pk| pk.has(property)) {
            self.set_primary_key(None);
        }
        self.remove_unique_keys_with(property);
        self.remove_indexes_with(property);
        self.remove_foreign_keys_with(property)
    }

    pub(crate) fn take_property(&mut self, key: PropertyKey) -> Option<Property> {
        let position = self.properties.iter().position(|p| p.key() == key)?;
        let mut property = self.properties.remove(position);
        property.set_parent(None);
        Some(property)
    }

    pub(crate) fn replace_in_members(&mut self, old: PropertyKey, new: PropertyKey) {
        if let Some(pk) = self.primary_key.as_mut() {
            pk.replace(old, new);
        }
        for uk in &mut self.unique_keys {
            uk.replace(old, new);
        }
        for index in &mut self.indexes {
            index.replace(old, new);
        }
        for fk in &mut self.foreign_keys {
            fk.replace(old, new);
        }
    }

    /// Unique keys containing the property are deleted, not shrunk.
    fn remove_unique_keys_with(&mut self, property: PropertyKey) {
        self.unique_keys.retain(|uk| !uk.has(property));
    }

    fn remove_indexes_with(&mut self, property: PropertyKey) {
        let doomed: Vec<IndexKey> = self
            .indexes
            .iter()
            .filter(|idx| idx.has(property))
            .map(|idx| idx.key())
            .collect();
        for index in doomed {
            self.release_index(index, false);
            self.indexes.retain(|idx| idx.key() != index);
        }
    }

    fn remove_foreign_keys_with(&mut self, property: PropertyKey) -> Vec<ForeignKey> {
        let key = self.key;
        let (dropped, kept): (Vec<ForeignKey>, Vec<ForeignKey>) =
            std::mem::take(&mut self.foreign_keys)
                .into_iter()
                .partition(|fk| {
                    fk.has(property)
                        || (fk.referenced_data_set_type() == Some(key) && fk.is_referenced(property))
                });
        self.foreign_keys = kept;
        dropped
    }

    // ------------------------------------------------------------------
    // Constraints
    // ------------------------------------------------------------------

    /// The primary key, if any.
    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    /// Set or clear the primary key, returning the previous one.
    pub fn set_primary_key(&mut self, pk: Option<PrimaryKey>) -> Option<PrimaryKey> {
        let pk = pk.map(|mut pk| {
            pk.set_data_set_type(Some(self.key));
            pk
        });
        let mut old = std::mem::replace(&mut self.primary_key, pk);
        if let Some(old) = old.as_mut() {
            old.set_data_set_type(None);
        }
        old
    }

    /// Attach a constraint of any kind. A primary key replaces the current one.
    pub fn add_constraint(&mut self, constraint: impl Into<Constraint>) -> ConstraintKey {
        match constraint.into() {
            Constraint::PrimaryKey(pk) => {
                let key = pk.key();
                self.set_primary_key(Some(pk));
                key
            }
            Constraint::ForeignKey(fk) => self.add_foreign_key(fk),
            Constraint::UniqueKey(uk) => self.add_unique_key(uk),
            Constraint::Check(cc) => self.add_check_constraint(cc),
        }
    }

    /// Detach and return the constraint with the given handle, whatever its kind.
    ///
    /// Returns `None` if no constraint of this schema has that handle.
    pub fn remove_constraint(&mut self, key: ConstraintKey) -> Option<Constraint> {
        match self.constraint(key)?.constraint_type() {
            ConstraintType::PrimaryKey => {
                self.set_primary_key(None).map(Constraint::PrimaryKey)
            }
            ConstraintType::ForeignKey => {
                self.remove_foreign_key(key).ok().map(Constraint::ForeignKey)
            }
            ConstraintType::UniqueKey => {
                self.remove_unique_key(key).map(Constraint::UniqueKey)
            }
            ConstraintType::Check => {
                self.remove_check_constraint(key).map(Constraint::Check)
            }
        }
    }

    /// Look up any constraint by handle.
    pub fn constraint(&self, key: ConstraintKey) -> Option<ConstraintRef<'_>> {
        self.constraints().find(|c| c.key() == key)
    }

    /// Iterate over all constraints: primary key, unique keys, check
    /// constraints, then foreign keys.
    pub fn constraints(&self) -> impl Iterator<Item = ConstraintRef<'_>> {
        self.primary_key
            .iter()
            .map(ConstraintRef::PrimaryKey)
            .chain(self.unique_keys.iter().map(ConstraintRef::UniqueKey))
            .chain(self.check_constraints.iter().map(ConstraintRef::Check))
            .chain(self.foreign_keys.iter().map(ConstraintRef::ForeignKey))
    }

    // Unique keys

    /// Attach a unique key.
    pub fn add_unique_key(&mut self, mut uk: UniqueKey) -> ConstraintKey {
        uk.set_data_set_type(Some(self.key));
        let key = uk.key();
        self.unique_keys.push(uk);
        key
    }

    /// Attach several unique keys.
    pub fn add_unique_keys(&mut self, uks: impl IntoIterator<Item = UniqueKey>) {
        for uk in uks {
            self.add_unique_key(uk);
        }
    }

    /// Number of unique keys.
    pub fn number_of_unique_keys(&self) -> usize {
        self.unique_keys.len()
    }

    /// All unique keys.
    pub fn unique_keys(&self) -> &[UniqueKey] {
        &self.unique_keys
    }

    /// The i-th unique key.
    pub fn unique_key_at(&self, i: usize) -> Option<&UniqueKey> {
        self.unique_keys.get(i)
    }

    /// Look up a unique key by name.
    pub fn unique_key(&self, name: &str) -> Option<&UniqueKey> {
        self.unique_keys.iter().find(|uk| uk.name() == name)
    }

    /// Detach a unique key.
    pub fn remove_unique_key(&mut self, key: ConstraintKey) -> Option<UniqueKey> {
        let position = self.unique_keys.iter().position(|uk| uk.key() == key)?;
        let mut uk = self.unique_keys.remove(position);
        uk.set_data_set_type(None);
        Some(uk)
    }

    /// Drop every unique key.
    pub fn clear_unique_keys(&mut self) {
        self.unique_keys.clear();
    }

    // Check constraints

    /// Attach a check constraint.
    pub fn add_check_constraint(&mut self, mut cc: CheckConstraint) -> ConstraintKey {
        cc.set_data_set_type(Some(self.key));
        let key = cc.key();
        self.check_constraints.push(cc);
        key
    }

    /// Attach several check constraints.
    pub fn add_check_constraints(&mut self, ccs: impl IntoIterator<Item = CheckConstraint>) {
        for cc in ccs {
            self.add_check_constraint(cc);
        }
    }

    /// Number of check constraints.
    pub fn number_of_check_constraints(&self) -> usize {
        self.check_constraints.len()
    }

    /// All check constraints.
    pub fn check_constraints(&self) -> &[CheckConstraint] {
        &self.check_constraints
    }

    /// The i-th check constraint.
    pub fn check_constraint_at(&self, i: usize) -> Option<&CheckConstraint> {
        self.check_constraints.get(i)
    }

    /// Look up a check constraint by name.
    pub fn check_constraint(&self, name: &str) -> Option<&CheckConstraint> {
        self.check_constraints.iter().find(|cc| cc.name() == name)
    }

    /// Detach a check constraint.
    pub fn remove_check_constraint(&mut self, key: ConstraintKey) -> Option<CheckConstraint> {
        let position = self.check_constraints.iter().position(|cc| cc.key() == key)?;
        let mut cc = self.check_constraints.remove(position);
        cc.set_data_set_type(None);
        Some(cc)
    }

    /// Drop every check constraint.
    pub fn clear_check_constraints(&mut self) {
        self.check_constraints.clear();
    }

    // ------------------------------------------------------------------
    // Indexes
    // ------------------------------------------------------------------

    /// Attach an index.
    pub fn add_index(&mut self, mut index: Index) -> IndexKey {
        index.set_data_set_type(Some(self.key));
        let key = index.key();
        self.indexes.push(index);
        key
    }

    /// Attach several indexes.
    pub fn add_indexes(&mut self, indexes: impl IntoIterator<Item = Index>) {
        for index in indexes {
            self.add_index(index);
        }
    }

    /// Number of indexes.
    pub fn number_of_indexes(&self) -> usize {
        self.indexes.len()
    }

    /// All indexes.
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// The i-th index.
    pub fn index_at(&self, i: usize) -> Option<&Index> {
        self.indexes.get(i)
    }

    /// Look up an index by name.
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|idx| idx.name() == name)
    }

    /// Look up an index by handle.
    pub fn index_by_key(&self, key: IndexKey) -> Option<&Index> {
        self.indexes.iter().find(|idx| idx.key() == key)
    }

    /// Drop an index.
    ///
    /// A primary key backed by it loses the association; a unique key
    /// backed by it is dropped together with the index.
    pub fn remove_index(&mut self, key: IndexKey) -> Option<Index> {
        let position = self.indexes.iter().position(|idx| idx.key() == key)?;
        self.release_index(key, true);
        let mut index = self.indexes.remove(position);
        index.set_data_set_type(None);
        Some(index)
    }

    /// Drop every index, clearing the associations of keys backed by them.
    pub fn clear_indexes(&mut self) {
        let keys: Vec<IndexKey> = self.indexes.iter().map(|idx| idx.key()).collect();
        for key in keys {
            self.release_index(key, false);
        }
        self.indexes.clear();
    }

    /// Drop every property, key, check constraint, index and foreign key.
    /// Identity, name, title and category are kept.
    pub fn clear(&mut self) {
        self.properties.clear();
        self.primary_key = None;
        self.unique_keys.clear();
        self.check_constraints.clear();
        self.indexes.clear();
        self.foreign_keys.clear();
    }

    // Every index removal path goes through here before the index is dropped.
    fn release_index(&mut self, index: IndexKey, drop_unique_keys: bool) {
        if let Some(pk) = self.primary_key.as_mut() {
            if pk.associated_index() == Some(index) {
                pk.set_associated_index(None);
            }
        }
        if drop_unique_keys {
            self.unique_keys
                .retain(|uk| uk.associated_index() != Some(index));
        } else {
            for uk in &mut self.unique_keys {
                if uk.associated_index() == Some(index) {
                    uk.set_associated_index(None);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Foreign keys
    // ------------------------------------------------------------------

    /// Attach a foreign key.
    pub fn add_foreign_key(&mut self, mut fk: ForeignKey) -> ConstraintKey {
        fk.set_data_set_type(Some(self.key));
        let key = fk.key();
        self.foreign_keys.push(fk);
        key
    }

    /// Number of foreign keys.
    pub fn number_of_foreign_keys(&self) -> usize {
        self.foreign_keys.len()
    }

    /// All foreign keys.
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// The i-th foreign key.
    pub fn foreign_key_at(&self, i: usize) -> Option<&ForeignKey> {
        self.foreign_keys.get(i)
    }

    /// Look up a foreign key by name.
    pub fn foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.name() == name)
    }

    /// Look up a foreign key by handle.
    pub fn foreign_key_by_key(&self, key: ConstraintKey) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.key() == key)
    }

    pub(crate) fn foreign_key_mut(&mut self, key: ConstraintKey) -> Option<&mut ForeignKey> {
        self.foreign_keys.iter_mut().find(|fk| fk.key() == key)
    }

    /// Detach a foreign key.
    ///
    /// Fails with `AssociationMismatch` if the foreign key is not owned by
    /// this schema.
    pub fn remove_foreign_key(&mut self, key: ConstraintKey) -> Result<ForeignKey> {
        let position = self
            .foreign_keys
            .iter()
            .position(|fk| fk.key() == key)
            .ok_or_else(|| {
                Error::AssociationMismatch(format!(
                    "foreign key {key} is not associated with data set type '{}'",
                    self.name
                ))
            })?;
        let mut fk = self.foreign_keys.remove(position);
        fk.set_data_set_type(None);
        Ok(fk)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check the structural invariants of every member.
    ///
    /// Permissive mode accepts anything. Strict mode requires that member
    /// properties belong to this schema, that foreign key column lists have
    /// equal length, and that associated indexes exist here and cover the
    /// same properties as the key they back. Referenced columns of foreign
    /// keys pointing at other schemas are checked by the catalog.
    pub fn validate(&self, mode: ValidationMode) -> Result<()> {
        if !mode.is_strict() {
            return Ok(());
        }
        for index in &self.indexes {
            self.check_index(index)?;
        }
        for constraint in self.constraints() {
            self.validate_constraint(constraint)?;
        }
        Ok(())
    }

    pub(crate) fn check_index(&self, index: &Index) -> Result<()> {
        self.check_members(ObjectKind::Index, index.name(), index.properties())
    }

    /// Strict-mode checks for a single constraint, attached or candidate.
    pub(crate) fn validate_constraint(&self, constraint: ConstraintRef<'_>) -> Result<()> {
        match constraint {
            ConstraintRef::PrimaryKey(pk) => {
                self.check_members(ObjectKind::Constraint, pk.name(), pk.properties())?;
                self.check_association(pk.name(), pk.properties(), pk.associated_index())
            }
            ConstraintRef::UniqueKey(uk) => {
                self.check_members(ObjectKind::Constraint, uk.name(), uk.properties())?;
                self.check_association(uk.name(), uk.properties(), uk.associated_index())
            }
            ConstraintRef::Check(_) => Ok(()),
            ConstraintRef::ForeignKey(fk) => {
                self.check_members(ObjectKind::ForeignKey, fk.name(), fk.properties())?;
                if !fk.is_balanced() {
                    return Err(Error::Validation(format!(
                        "foreign key '{}' has {} local and {} referenced columns",
                        fk.name(),
                        fk.properties().len(),
                        fk.referenced_properties().len()
                    )));
                }
                if fk.referenced_data_set_type() == Some(self.key) {
                    self.check_members(
                        ObjectKind::ForeignKey,
                        fk.name(),
                        fk.referenced_properties(),
                    )?;
                }
                Ok(())
            }
        }
    }

    fn check_members(&self, kind: ObjectKind, name: &str, members: &[PropertyKey]) -> Result<()> {
        if let Some(missing) = members.iter().find(|p| !self.has_property(**p)) {
            return Err(Error::Validation(format!(
                "{kind} '{name}' refers to {missing}, which is not a property of '{}'",
                self.name
            )));
        }
        Ok(())
    }

    fn check_association(
        &self,
        name: &str,
        members: &[PropertyKey],
        associated: Option<IndexKey>,
    ) -> Result<()> {
        let Some(index_key) = associated else {
            return Ok(());
        };
        match self.index_by_key(index_key) {
            Some(index) if index.covers(members) => Ok(()),
            Some(index) => Err(Error::Validation(format!(
                "key '{name}' and its associated index '{}' cover different properties",
                index.name()
            ))),
            None => Err(Error::Validation(format!(
                "key '{name}' is associated with {index_key}, which is not an index of '{}'",
                self.name
            ))),
        }
    }
}

impl Clone for DataSetType {
    /// Deep copy with fresh handles and no catalog attachment.
    ///
    /// Indexes, keys and local foreign key columns are remapped onto the
    /// copied properties. Foreign keys keep their referenced schema and
    /// referenced columns as they are.
    fn clone(&self) -> Self {
        let mut copy = DataSetType::new(self.name.clone(), self.id);
        copy.title = self.title.clone();
        copy.category = self.category;

        let mut property_map: HashMap<PropertyKey, PropertyKey> = HashMap::new();
        for property in &self.properties {
            let mut duplicate = property.clone();
            duplicate.set_parent(Some(copy.key));
            property_map.insert(property.key(), duplicate.key());
            copy.properties.push(duplicate);
        }
        let remap = |members: &[PropertyKey]| -> Vec<PropertyKey> {
            members
                .iter()
                .filter_map(|p| property_map.get(p).copied())
                .collect()
        };

        let mut index_map: HashMap<IndexKey, IndexKey> = HashMap::new();
        for index in &self.indexes {
            let mut duplicate = index.clone();
            duplicate.set_properties(remap(index.properties()));
            index_map.insert(index.key(), duplicate.key());
            copy.add_index(duplicate);
        }
        let reassociate = |associated: Option<IndexKey>| associated.and_then(|k| index_map.get(&k).copied());

        if let Some(pk) = &self.primary_key {
            let mut duplicate = PrimaryKey::new(pk.name())
                .with_id(pk.id())
                .with_properties(remap(pk.properties()));
            duplicate.set_associated_index(reassociate(pk.associated_index()));
            copy.set_primary_key(Some(duplicate));
        }

        for uk in &self.unique_keys {
            let mut duplicate = UniqueKey::new(uk.name())
                .with_id(uk.id())
                .with_properties(remap(uk.properties()));
            duplicate.set_associated_index(reassociate(uk.associated_index()));
            copy.add_unique_key(duplicate);
        }

        for cc in &self.check_constraints {
            copy.add_check_constraint(cc.clone());
        }

        for fk in &self.foreign_keys {
            let mut duplicate = ForeignKey::new(fk.name())
                .with_id(fk.id())
                .with_on_delete(fk.on_delete())
                .with_on_update(fk.on_update());
            duplicate.set_referenced_data_set_type(fk.referenced_data_set_type());
            duplicate.set_referenced_properties(fk.referenced_properties().to_vec());
            duplicate.set_properties(remap(fk.properties()));
            copy.add_foreign_key(duplicate);
        }

        copy
    }
}
