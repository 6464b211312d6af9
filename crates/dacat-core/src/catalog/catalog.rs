//! Data source catalog: the registry of schemas and sequences.
//!
//! Besides the schemas and sequences themselves the catalog maintains two
//! reverse indexes keyed by [`DataSetTypeKey`]:
//!
//! - the foreign keys (anywhere in the catalog) that reference a schema;
//! - the sequences owned by a property of a schema.
//!
//! Both are updated in the same call that mutates the object graph, and
//! every mutator validates before it mutates.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use super::constraint::{Constraint, ConstraintRef, PrimaryKey};
use super::dataset_type::DataSetType;
use super::foreign_key::ForeignKey;
use super::handle::{CatalogKey, ConstraintKey, DataSetTypeKey, IndexKey, PropertyKey, SequenceKey};
use super::index::Index;
use super::property::Property;
use super::sequence::{Sequence, SequenceOwner};
use super::types::DataSetCategory;
use crate::config::CatalogConfig;
use crate::error::{Error, ObjectKind, Rejected, Result};

/// A reverse-index entry: a foreign key together with the schema owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForeignKeyRef {
    /// Schema owning the foreign key.
    pub data_set_type: DataSetTypeKey,
    /// The foreign key.
    pub foreign_key: ConstraintKey,
}

/// The authoritative registry of schemas and sequences for one data source.
///
/// Not internally synchronized. Wrap it in a [`SharedCatalog`] when several
/// threads need access, and hold the lock for the whole of any compound
/// operation.
#[derive(Debug)]
pub struct DataSourceCatalog {
    key: CatalogKey,
    id: u32,
    config: CatalogConfig,
    data_sets: HashMap<DataSetTypeKey, DataSetType>,
    data_set_order: Vec<DataSetTypeKey>,
    data_sets_by_name: HashMap<String, DataSetTypeKey>,
    data_sets_by_id: HashMap<u32, DataSetTypeKey>,
    sequences: HashMap<SequenceKey, Sequence>,
    sequence_order: Vec<SequenceKey>,
    sequences_by_name: HashMap<String, SequenceKey>,
    sequences_by_id: HashMap<u32, SequenceKey>,
    /// Referenced schema -> foreign keys referencing it.
    dependent_fks: HashMap<DataSetTypeKey, Vec<ForeignKeyRef>>,
    /// Owning schema -> sequences owned by one of its properties.
    dependent_sequences: HashMap<DataSetTypeKey, Vec<SequenceKey>>,
}

impl DataSourceCatalog {
    /// Create an empty catalog with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    /// Create an empty catalog.
    pub fn with_config(config: CatalogConfig) -> Self {
        Self {
            key: CatalogKey::next(),
            id: 0,
            config,
            data_sets: HashMap::new(),
            data_set_order: Vec::new(),
            data_sets_by_name: HashMap::new(),
            data_sets_by_id: HashMap::new(),
            sequences: HashMap::new(),
            sequence_order: Vec::new(),
            sequences_by_name: HashMap::new(),
            sequences_by_id: HashMap::new(),
            dependent_fks: HashMap::new(),
            dependent_sequences: HashMap::new(),
        }
    }

    /// Identity handle.
    pub fn key(&self) -> CatalogKey {
        self.key
    }

    /// Catalog id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Set the catalog id.
    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Active configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Drop every schema and sequence.
    pub fn clear(&mut self) {
        self.data_sets.clear();
        self.data_set_order.clear();
        self.data_sets_by_name.clear();
        self.data_sets_by_id.clear();
        self.sequences.clear();
        self.sequence_order.clear();
        self.sequences_by_name.clear();
        self.sequences_by_id.clear();
        self.dependent_fks.clear();
        self.dependent_sequences.clear();
        debug!(catalog = %self.key, "Cleared catalog");
    }

    // ------------------------------------------------------------------
    // Schemas
    // ------------------------------------------------------------------

    /// Register a schema.
    ///
    /// Fails if the name or id is taken, or if one of its foreign keys
    /// references a schema that is not registered yet. Referenced schemas
    /// therefore have to be added first. Foreign keys of already registered
    /// schemas that point at this one (left behind by a non-cascading
    /// detach) are indexed again, as are sequences owned by its properties.
    ///
    /// On failure the catalog is untouched and the schema is handed back
    /// inside the [`Rejected`] error.
    pub fn add(&mut self, dt: DataSetType) -> std::result::Result<DataSetTypeKey, Rejected<DataSetType>> {
        match self.check_new_data_set_type(&dt, &[]) {
            Ok(()) => Ok(self.register(dt)),
            Err(error) => Err(Rejected::new(error, dt)),
        }
    }

    /// Register schemas in the given order.
    ///
    /// The whole batch is checked before anything is registered: names and
    /// ids must be free in the catalog and within the batch, and every
    /// foreign key must reference a registered schema or one earlier in the
    /// batch. On failure nothing is registered and the batch is handed back.
    pub fn add_all(
        &mut self,
        data_sets: impl IntoIterator<Item = DataSetType>,
    ) -> std::result::Result<Vec<DataSetTypeKey>, Rejected<Vec<DataSetType>>> {
        let batch: Vec<DataSetType> = data_sets.into_iter().collect();
        for (i, dt) in batch.iter().enumerate() {
            if let Err(error) = self.check_new_data_set_type(dt, &batch[..i]) {
                return Err(Rejected::new(error, batch));
            }
        }
        Ok(batch.into_iter().map(|dt| self.register(dt)).collect())
    }

    fn register(&mut self, mut dt: DataSetType) -> DataSetTypeKey {
        let key = dt.key();
        let entries: Vec<(ForeignKeyRef, Option<DataSetTypeKey>)> = dt
            .foreign_keys()
            .iter()
            .map(|fk| {
                (
                    ForeignKeyRef {
                        data_set_type: key,
                        foreign_key: fk.key(),
                    },
                    fk.referenced_data_set_type(),
                )
            })
            .collect();

        dt.set_catalog(Some(self.key));
        self.data_sets_by_name.insert(dt.name().to_string(), key);
        self.data_sets_by_id.insert(dt.id(), key);
        self.data_set_order.push(key);
        debug!(
            data_set_type = %dt.name(),
            id = dt.id(),
            foreign_keys = entries.len(),
            "Added data set type"
        );
        self.data_sets.insert(key, dt);

        for (entry, referenced) in entries {
            if let Some(referenced) = referenced {
                self.add_ref(entry, referenced);
            }
        }
        self.reindex_dependents(key);
        key
    }

    /// `staged` holds schemas of the same batch that will be registered
    /// before `dt`.
    fn check_new_data_set_type(&self, dt: &DataSetType, staged: &[DataSetType]) -> Result<()> {
        if dt.name().is_empty() {
            return Err(Error::InvalidArgument(
                "a data set type name cannot be empty".to_string(),
            ));
        }
        if self.data_sets_by_name.contains_key(dt.name())
            || staged.iter().any(|s| s.name() == dt.name())
        {
            return Err(Error::duplicate_name(ObjectKind::DataSetType, dt.name()));
        }
        if self.data_sets_by_id.contains_key(&dt.id()) || staged.iter().any(|s| s.id() == dt.id()) {
            return Err(Error::DuplicateId {
                kind: ObjectKind::DataSetType,
                id: dt.id(),
            });
        }
        for fk in dt.foreign_keys() {
            self.check_reference(dt, fk, staged)?;
        }
        if self.config.validation.is_strict() {
            dt.validate(self.config.validation)?;
            for fk in dt.foreign_keys() {
                self.check_referenced_columns(fk, staged)?;
            }
        }
        Ok(())
    }

    fn lookup_staged<'a>(&'a self, key: DataSetTypeKey, staged: &'a [DataSetType]) -> Option<&'a DataSetType> {
        self.data_sets
            .get(&key)
            .or_else(|| staged.iter().find(|s| s.key() == key))
    }

    fn reindex_dependents(&mut self, key: DataSetTypeKey) {
        let Some(dt) = self.data_sets.get(&key) else {
            return;
        };

        let mut entries = Vec::new();
        for owner_key in self.data_set_order.iter().filter(|k| **k != key) {
            if let Some(owner) = self.data_sets.get(owner_key) {
                entries.extend(
                    owner
                        .foreign_keys()
                        .iter()
                        .filter(|fk| fk.referenced_data_set_type() == Some(key))
                        .map(|fk| ForeignKeyRef {
                            data_set_type: *owner_key,
                            foreign_key: fk.key(),
                        }),
                );
            }
        }

        let owned: Vec<SequenceKey> = self
            .sequence_order
            .iter()
            .copied()
            .filter(|s| {
                self.sequences
                    .get(s)
                    .and_then(|seq| seq.owner())
                    .is_some_and(|o| o.data_set_type == Some(key) && dt.has_property(o.property))
            })
            .collect();

        for entry in entries {
            self.add_ref(entry, key);
        }
        if !owned.is_empty() {
            let bucket = self.dependent_sequences.entry(key).or_default();
            for seq in owned {
                if !bucket.contains(&seq) {
                    bucket.push(seq);
                }
            }
        }
    }

    /// Unregister a schema and hand it back.
    ///
    /// With `cascade` the sequences owned by its properties are dropped and
    /// every foreign key of another schema that references it is removed
    /// from that schema. Without `cascade` only the reverse-index buckets
    /// are erased; those foreign keys and sequences are left in place.
    /// Either way the schema's own foreign keys leave the buckets of the
    /// schemas they reference.
    #[instrument(skip(self))]
    pub fn detach(&mut self, key: DataSetTypeKey, cascade: bool) -> Result<DataSetType> {
        let mut dt = self
            .data_sets
            .remove(&key)
            .ok_or_else(|| Error::not_found(ObjectKind::DataSetType, key))?;

        if cascade {
            self.drop_dependent_sequences(key);
            self.drop_dependent_foreign_keys(key);
        }
        self.dependent_sequences.remove(&key);
        self.dependent_fks.remove(&key);

        for fk in dt.foreign_keys() {
            if let Some(referenced) = fk.referenced_data_set_type().filter(|r| *r != key) {
                self.forget_ref(
                    ForeignKeyRef {
                        data_set_type: key,
                        foreign_key: fk.key(),
                    },
                    referenced,
                );
            }
        }

        self.data_sets_by_name.remove(dt.name());
        self.data_sets_by_id.remove(&dt.id());
        self.data_set_order.retain(|k| *k != key);
        dt.set_catalog(None);

        debug!(data_set_type = %dt.name(), cascade, "Detached data set type");
        Ok(dt)
    }

    /// Unregister a schema and drop it.
    pub fn remove(&mut self, key: DataSetTypeKey, cascade: bool) -> Result<()> {
        self.detach(key, cascade).map(drop)
    }

    /// Rename a registered schema. Only the name map changes.
    pub fn rename(&mut self, key: DataSetTypeKey, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "a data set type name cannot be empty".to_string(),
            ));
        }
        let current = self.registered(key)?.name().to_string();
        if current == name {
            return Ok(());
        }
        if self.data_sets_by_name.contains_key(&name) {
            return Err(Error::duplicate_name(ObjectKind::DataSetType, name));
        }

        self.data_sets_by_name.remove(&current);
        self.data_sets_by_name.insert(name.clone(), key);
        self.registered_mut(key)?.set_name(name.clone());
        debug!(from = %current, to = %name, "Renamed data set type");
        Ok(())
    }

    /// Change the id of a registered schema. Only the id map changes.
    pub fn set_data_set_type_id(&mut self, key: DataSetTypeKey, id: u32) -> Result<()> {
        let current = self.registered(key)?.id();
        if current == id {
            return Ok(());
        }
        if self.data_sets_by_id.contains_key(&id) {
            return Err(Error::DuplicateId {
                kind: ObjectKind::DataSetType,
                id,
            });
        }

        self.data_sets_by_id.remove(&current);
        self.data_sets_by_id.insert(id, key);
        self.registered_mut(key)?.set_id(id);
        debug!(from = current, to = id, "Changed data set type id");
        Ok(())
    }

    /// Look up a schema by handle.
    pub fn data_set_type(&self, key: DataSetTypeKey) -> Option<&DataSetType> {
        self.data_sets.get(&key)
    }

    /// Look up a schema by name.
    pub fn data_set_type_by_name(&self, name: &str) -> Option<&DataSetType> {
        self.data_sets_by_name
            .get(name)
            .and_then(|key| self.data_sets.get(key))
    }

    /// Look up a schema by id.
    pub fn data_set_type_by_id(&self, id: u32) -> Option<&DataSetType> {
        self.data_sets_by_id
            .get(&id)
            .and_then(|key| self.data_sets.get(key))
    }

    /// The i-th schema in registration order.
    pub fn data_set_type_at(&self, i: usize) -> Option<&DataSetType> {
        self.data_set_order
            .get(i)
            .and_then(|key| self.data_sets.get(key))
    }

    /// Schemas in registration order.
    pub fn data_set_types(&self) -> impl Iterator<Item = &DataSetType> {
        self.data_set_order
            .iter()
            .filter_map(|key| self.data_sets.get(key))
    }

    /// Number of registered schemas.
    pub fn number_of_data_sets(&self) -> usize {
        self.data_set_order.len()
    }

    /// Check if a schema with this name is registered.
    pub fn data_set_type_exists(&self, name: &str) -> bool {
        self.data_sets_by_name.contains_key(name)
    }

    fn registered(&self, key: DataSetTypeKey) -> Result<&DataSetType> {
        self.data_sets
            .get(&key)
            .ok_or_else(|| Error::not_found(ObjectKind::DataSetType, key))
    }

    fn registered_mut(&mut self, key: DataSetTypeKey) -> Result<&mut DataSetType> {
        self.data_sets
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(ObjectKind::DataSetType, key))
    }

    // ------------------------------------------------------------------
    // Registered schema mutation
    // ------------------------------------------------------------------

    /// Set the title of a registered schema.
    pub fn set_title(&mut self, key: DataSetTypeKey, title: impl Into<String>) -> Result<()> {
        self.registered_mut(key)?.set_title(title);
        Ok(())
    }

    /// Set the category of a registered schema.
    pub fn set_category(&mut self, key: DataSetTypeKey, category: DataSetCategory) -> Result<()> {
        self.registered_mut(key)?.set_category(category);
        Ok(())
    }

    /// Add a property to a registered schema.
    pub fn add_property(&mut self, key: DataSetTypeKey, property: Property) -> Result<PropertyKey> {
        let dt = self.registered_mut(key)?;
        let property_key = dt.add_property(property)?;
        debug!(data_set_type = %dt.name(), property = %property_key, "Added property");
        Ok(property_key)
    }

    /// Rename a property of a registered schema.
    pub fn rename_property(
        &mut self,
        key: DataSetTypeKey,
        property: PropertyKey,
        name: impl Into<String>,
    ) -> Result<()> {
        self.registered_mut(key)?.rename_property(property, name)
    }

    /// Remove a property of a registered schema with full cascade.
    ///
    /// In addition to the schema-local cascade of
    /// [`DataSetType::remove_property`], every foreign key of another schema
    /// that references the property is removed from its owner, and every
    /// sequence owned by the property is dropped.
    #[instrument(skip(self))]
    pub fn remove_property(&mut self, key: DataSetTypeKey, property: PropertyKey) -> Result<Property> {
        let external: Vec<ForeignKeyRef> = self
            .foreign_key_refs(key)
            .iter()
            .copied()
            .filter(|entry| {
                entry.data_set_type != key
                    && self
                        .data_sets
                        .get(&entry.data_set_type)
                        .and_then(|owner| owner.foreign_key_by_key(entry.foreign_key))
                        .is_some_and(|fk| fk.is_referenced(property))
            })
            .collect();

        let dt = self.registered_mut(key)?;
        let Some(removed) = dt.take_property(property) else {
            return Err(Error::not_found(ObjectKind::Property, property));
        };
        let dropped = dt.strip_property_dependents(property);

        for fk in &dropped {
            if let Some(referenced) = fk.referenced_data_set_type() {
                self.forget_ref(
                    ForeignKeyRef {
                        data_set_type: key,
                        foreign_key: fk.key(),
                    },
                    referenced,
                );
            }
        }
        for entry in &external {
            self.forget_ref(*entry, key);
            if let Some(owner) = self.data_sets.get_mut(&entry.data_set_type) {
                if let Err(e) = owner.remove_foreign_key(entry.foreign_key) {
                    warn!(error = %e, "Dangling reverse index entry");
                }
            }
        }
        self.drop_dependent_sequences_of(key, property);

        debug!(
            property = %removed.name(),
            local_foreign_keys = dropped.len(),
            external_foreign_keys = external.len(),
            "Removed property"
        );
        Ok(removed)
    }

    /// Substitute `new` for the property `old` of a registered schema.
    ///
    /// The substitution reaches the schema's own members, foreign keys of
    /// other schemas referencing `old`, and sequences owned by `old`.
    pub fn replace_property(
        &mut self,
        key: DataSetTypeKey,
        old: PropertyKey,
        new: Property,
    ) -> Result<Property> {
        let new_key = new.key();
        let replaced = self.registered_mut(key)?.replace_property(old, new)?;

        let entries: Vec<ForeignKeyRef> = self.foreign_key_refs(key).to_vec();
        for entry in entries.iter().filter(|e| e.data_set_type != key) {
            if let Some(fk) = self
                .data_sets
                .get_mut(&entry.data_set_type)
                .and_then(|owner| owner.foreign_key_mut(entry.foreign_key))
            {
                fk.replace(old, new_key);
            }
        }

        let owned: Vec<SequenceKey> = self
            .dependent_sequences
            .get(&key)
            .cloned()
            .unwrap_or_default();
        for seq_key in owned {
            if let Some(seq) = self.sequences.get_mut(&seq_key) {
                if seq.owner_property() == Some(old) {
                    seq.set_owner(Some(SequenceOwner::new(key, new_key)));
                }
            }
        }

        debug!(property = %replaced.name(), replacement = %new_key, "Replaced property");
        Ok(replaced)
    }

    /// Set or clear the primary key of a registered schema.
    pub fn set_primary_key(
        &mut self,
        key: DataSetTypeKey,
        pk: Option<PrimaryKey>,
    ) -> Result<Option<PrimaryKey>> {
        let dt = self.registered(key)?;
        if let Some(pk) = &pk {
            self.check_new_constraint(dt, ConstraintRef::PrimaryKey(pk))?;
        }
        Ok(self.registered_mut(key)?.set_primary_key(pk))
    }

    /// Attach a constraint to a registered schema.
    ///
    /// A foreign key must reference a registered schema (or, if allowed,
    /// its own schema) and is indexed under it.
    pub fn add_constraint(
        &mut self,
        key: DataSetTypeKey,
        constraint: impl Into<Constraint>,
    ) -> Result<ConstraintKey> {
        let constraint = constraint.into();
        let dt = self.registered(key)?;
        self.check_new_constraint(dt, constraint.as_view())?;

        let referenced = match &constraint {
            Constraint::ForeignKey(fk) => fk.referenced_data_set_type(),
            _ => None,
        };
        let constraint_type = constraint.constraint_type();
        let constraint_key = self.registered_mut(key)?.add_constraint(constraint);
        if let Some(referenced) = referenced {
            self.add_ref(
                ForeignKeyRef {
                    data_set_type: key,
                    foreign_key: constraint_key,
                },
                referenced,
            );
        }

        debug!(
            constraint = %constraint_key,
            constraint_type = %constraint_type,
            "Added constraint"
        );
        Ok(constraint_key)
    }

    /// Detach a constraint from a registered schema.
    ///
    /// Returns `Ok(None)` if nothing matches, and `AssociationMismatch` if
    /// the handle names a foreign key owned by another registered schema.
    pub fn remove_constraint(
        &mut self,
        key: DataSetTypeKey,
        constraint: ConstraintKey,
    ) -> Result<Option<Constraint>> {
        let dt = self.registered(key)?;
        let referenced = match dt.constraint(constraint) {
            Some(ConstraintRef::ForeignKey(fk)) => fk.referenced_data_set_type(),
            Some(_) => None,
            None => {
                if let Some(owner) = self.owner_of_foreign_key(constraint) {
                    return Err(Error::AssociationMismatch(format!(
                        "foreign key {constraint} belongs to {owner}, not to '{}'",
                        dt.name()
                    )));
                }
                return Ok(None);
            }
        };

        let entry = ForeignKeyRef {
            data_set_type: key,
            foreign_key: constraint,
        };
        match referenced {
            Some(r) if self.data_sets.contains_key(&r) => self.remove_ref(entry, r)?,
            Some(r) => self.forget_ref(entry, r),
            None => {}
        }

        let removed = self.registered_mut(key)?.remove_constraint(constraint);
        debug!(constraint = %constraint, "Removed constraint");
        Ok(removed)
    }

    /// Attach an index to a registered schema.
    pub fn add_index(&mut self, key: DataSetTypeKey, index: Index) -> Result<IndexKey> {
        let dt = self.registered(key)?;
        if self.config.validation.is_strict() {
            dt.check_index(&index)?;
        }
        Ok(self.registered_mut(key)?.add_index(index))
    }

    /// Drop an index of a registered schema.
    pub fn remove_index(&mut self, key: DataSetTypeKey, index: IndexKey) -> Result<Option<Index>> {
        Ok(self.registered_mut(key)?.remove_index(index))
    }

    /// Drop every index of a registered schema.
    pub fn clear_indexes(&mut self, key: DataSetTypeKey) -> Result<()> {
        self.registered_mut(key)?.clear_indexes();
        Ok(())
    }

    /// Empty a registered schema.
    ///
    /// Its own foreign keys leave the reverse index. Foreign keys of other
    /// schemas that reference it and sequences owned by its properties are
    /// dropped, since the properties they name are gone.
    pub fn clear_data_set_type(&mut self, key: DataSetTypeKey) -> Result<()> {
        let own: Vec<(ForeignKeyRef, DataSetTypeKey)> = self
            .registered(key)?
            .foreign_keys()
            .iter()
            .filter_map(|fk| {
                fk.referenced_data_set_type().map(|referenced| {
                    (
                        ForeignKeyRef {
                            data_set_type: key,
                            foreign_key: fk.key(),
                        },
                        referenced,
                    )
                })
            })
            .collect();
        for (entry, referenced) in own {
            self.forget_ref(entry, referenced);
        }
        self.drop_dependent_foreign_keys(key);
        self.drop_dependent_sequences(key);

        let dt = self.registered_mut(key)?;
        dt.clear();
        debug!(data_set_type = %dt.name(), "Cleared data set type");
        Ok(())
    }

    fn check_new_constraint(&self, dt: &DataSetType, constraint: ConstraintRef<'_>) -> Result<()> {
        if let ConstraintRef::ForeignKey(fk) = constraint {
            self.check_reference(dt, fk, &[])?;
        }
        if self.config.validation.is_strict() {
            dt.validate_constraint(constraint)?;
            if let ConstraintRef::ForeignKey(fk) = constraint {
                self.check_referenced_columns(fk, &[])?;
            }
        }
        Ok(())
    }

    fn check_reference(&self, dt: &DataSetType, fk: &ForeignKey, staged: &[DataSetType]) -> Result<()> {
        match fk.referenced_data_set_type() {
            None => Err(Error::DependencyMissing(format!(
                "foreign key '{}' of '{}' does not reference a data set type",
                fk.name(),
                dt.name()
            ))),
            Some(r) if r == dt.key() => {
                if self.config.allow_self_references {
                    Ok(())
                } else {
                    Err(Error::Validation(format!(
                        "foreign key '{}' references its own data set type '{}'",
                        fk.name(),
                        dt.name()
                    )))
                }
            }
            Some(r) if self.lookup_staged(r, staged).is_some() => Ok(()),
            Some(r) => Err(Error::DependencyMissing(format!(
                "foreign key '{}' of '{}' references {r}, which is not registered",
                fk.name(),
                dt.name()
            ))),
        }
    }

    fn check_referenced_columns(&self, fk: &ForeignKey, staged: &[DataSetType]) -> Result<()> {
        let Some(referenced) = fk
            .referenced_data_set_type()
            .and_then(|r| self.lookup_staged(r, staged))
        else {
            return Ok(());
        };
        match fk
            .referenced_properties()
            .iter()
            .find(|p| !referenced.has_property(**p))
        {
            Some(missing) => Err(Error::Validation(format!(
                "foreign key '{}' references {missing}, which is not a property of '{}'",
                fk.name(),
                referenced.name()
            ))),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Foreign key reverse index
    // ------------------------------------------------------------------

    /// Reverse-index entries for the foreign keys referencing a schema.
    pub fn foreign_key_refs(&self, key: DataSetTypeKey) -> &[ForeignKeyRef] {
        self.dependent_fks
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every foreign key in the catalog that references the schema.
    pub fn referencing_foreign_keys(&self, key: DataSetTypeKey) -> Vec<&ForeignKey> {
        self.foreign_key_refs(key)
            .iter()
            .filter_map(|entry| self.foreign_key(entry.data_set_type, entry.foreign_key))
            .collect()
    }

    /// Look up a foreign key of a registered schema.
    pub fn foreign_key(&self, owner: DataSetTypeKey, key: ConstraintKey) -> Option<&ForeignKey> {
        self.data_sets
            .get(&owner)
            .and_then(|dt| dt.foreign_key_by_key(key))
    }

    fn owner_of_foreign_key(&self, key: ConstraintKey) -> Option<DataSetTypeKey> {
        self.data_set_types()
            .find(|dt| dt.foreign_key_by_key(key).is_some())
            .map(|dt| dt.key())
    }

    /// Index a foreign key under the schema it references.
    fn add_ref(&mut self, entry: ForeignKeyRef, referenced: DataSetTypeKey) {
        let bucket = self.dependent_fks.entry(referenced).or_default();
        if !bucket.contains(&entry) {
            bucket.push(entry);
        }
    }

    /// Withdraw a foreign key from the bucket of a registered schema.
    /// Fails, without mutating, if the schema is not registered or the
    /// bucket does not hold the entry.
    fn remove_ref(&mut self, entry: ForeignKeyRef, referenced: DataSetTypeKey) -> Result<()> {
        if !self.data_sets.contains_key(&referenced) {
            return Err(Error::DependencyMissing(format!(
                "foreign key {} references {referenced}, which is not registered",
                entry.foreign_key
            )));
        }
        let bucket = self
            .dependent_fks
            .get_mut(&referenced)
            .filter(|bucket| bucket.contains(&entry))
            .ok_or_else(|| Error::not_found(ObjectKind::ForeignKey, entry.foreign_key))?;
        bucket.retain(|e| *e != entry);
        if bucket.is_empty() {
            self.dependent_fks.remove(&referenced);
        }
        Ok(())
    }

    /// Lenient variant of `remove_ref` for cascades.
    fn forget_ref(&mut self, entry: ForeignKeyRef, referenced: DataSetTypeKey) {
        let mut found = false;
        let mut emptied = false;
        if let Some(bucket) = self.dependent_fks.get_mut(&referenced) {
            let before = bucket.len();
            bucket.retain(|e| *e != entry);
            found = bucket.len() != before;
            emptied = bucket.is_empty();
        }
        if emptied {
            self.dependent_fks.remove(&referenced);
        }
        if !found && self.data_sets.contains_key(&referenced) {
            warn!(
                foreign_key = %entry.foreign_key,
                referenced = %referenced,
                "Foreign key missing from reverse index"
            );
        }
    }

    /// Remove from their owners every foreign key of another schema that
    /// references `key`. Self references stay with their schema.
    pub fn drop_dependent_foreign_keys(&mut self, key: DataSetTypeKey) {
        let Some(entries) = self.dependent_fks.remove(&key) else {
            return;
        };

        let mut own = Vec::new();
        for entry in entries {
            if entry.data_set_type == key {
                own.push(entry);
                continue;
            }
            match self
                .data_sets
                .get_mut(&entry.data_set_type)
                .map(|owner| owner.remove_foreign_key(entry.foreign_key))
            {
                Some(Ok(fk)) => {
                    debug!(foreign_key = %fk.name(), "Dropped dependent foreign key")
                }
                _ => warn!(
                    foreign_key = %entry.foreign_key,
                    owner = %entry.data_set_type,
                    "Dangling reverse index entry"
                ),
            }
        }
        if !own.is_empty() {
            self.dependent_fks.insert(key, own);
        }
    }

    // ------------------------------------------------------------------
    // Sequences
    // ------------------------------------------------------------------

    /// Register a sequence.
    ///
    /// Fails if the name or id is taken. An owned sequence additionally
    /// requires the owning property to belong to a registered schema; the
    /// owner is resolved once, either through the schema captured in the
    /// owner or by searching the registered schemas for the property.
    ///
    /// On failure the sequence is handed back inside the [`Rejected`] error.
    pub fn add_sequence(&mut self, seq: Sequence) -> std::result::Result<SequenceKey, Rejected<Sequence>> {
        match self.check_new_sequence(&seq, &[]) {
            Ok(owner) => Ok(self.register_sequence(seq, owner)),
            Err(error) => Err(Rejected::new(error, seq)),
        }
    }

    /// Register sequences in the given order. The whole batch is checked
    /// first; on failure nothing is registered and the batch is handed back.
    pub fn add_sequences(
        &mut self,
        sequences: impl IntoIterator<Item = Sequence>,
    ) -> std::result::Result<Vec<SequenceKey>, Rejected<Vec<Sequence>>> {
        let batch: Vec<Sequence> = sequences.into_iter().collect();
        let mut owners = Vec::with_capacity(batch.len());
        for (i, seq) in batch.iter().enumerate() {
            match self.check_new_sequence(seq, &batch[..i]) {
                Ok(owner) => owners.push(owner),
                Err(error) => return Err(Rejected::new(error, batch)),
            }
        }
        Ok(batch
            .into_iter()
            .zip(owners)
            .map(|(seq, owner)| self.register_sequence(seq, owner))
            .collect())
    }

    /// Returns the resolved owner.
    fn check_new_sequence(&self, seq: &Sequence, staged: &[Sequence]) -> Result<Option<SequenceOwner>> {
        if seq.name().is_empty() {
            return Err(Error::InvalidArgument(
                "a sequence name cannot be empty".to_string(),
            ));
        }
        if self.sequences_by_name.contains_key(seq.name())
            || staged.iter().any(|s| s.name() == seq.name())
        {
            return Err(Error::duplicate_name(ObjectKind::Sequence, seq.name()));
        }
        if self.sequences_by_id.contains_key(&seq.id()) || staged.iter().any(|s| s.id() == seq.id()) {
            return Err(Error::DuplicateId {
                kind: ObjectKind::Sequence,
                id: seq.id(),
            });
        }
        seq.owner()
            .map(|owner| self.resolve_sequence_owner(seq.name(), owner))
            .transpose()
    }

    fn register_sequence(&mut self, mut seq: Sequence, owner: Option<SequenceOwner>) -> SequenceKey {
        let key = seq.key();
        seq.set_owner(owner);
        seq.set_catalog(Some(self.key));
        self.sequences_by_name.insert(seq.name().to_string(), key);
        self.sequences_by_id.insert(seq.id(), key);
        self.sequence_order.push(key);
        if let Some(owner) = owner.and_then(|o| o.data_set_type) {
            self.dependent_sequences.entry(owner).or_default().push(key);
        }

        debug!(sequence = %seq.name(), id = seq.id(), "Added sequence");
        self.sequences.insert(key, seq);
        key
    }

    fn resolve_sequence_owner(&self, sequence: &str, owner: &SequenceOwner) -> Result<SequenceOwner> {
        match owner.data_set_type {
            Some(dt_key) => match self.data_sets.get(&dt_key) {
                Some(dt) if dt.has_property(owner.property) => Ok(*owner),
                Some(dt) => Err(Error::DependencyMissing(format!(
                    "owner {} of sequence '{sequence}' is not a property of '{}'",
                    owner.property,
                    dt.name()
                ))),
                None => Err(Error::DependencyMissing(format!(
                    "owner of sequence '{sequence}' belongs to {dt_key}, which is not registered"
                ))),
            },
            None => self
                .data_set_types()
                .find(|dt| dt.has_property(owner.property))
                .map(|dt| SequenceOwner::new(dt.key(), owner.property))
                .ok_or_else(|| {
                    Error::DependencyMissing(format!(
                        "owner {} of sequence '{sequence}' is not part of a registered data set type",
                        owner.property
                    ))
                }),
        }
    }

    /// Unregister a sequence and hand it back.
    pub fn detach_sequence(&mut self, key: SequenceKey) -> Result<Sequence> {
        let mut seq = self
            .unregister_sequence(key)
            .ok_or_else(|| Error::not_found(ObjectKind::Sequence, key))?;

        if let Some(owner) = seq.owner().and_then(|o| o.data_set_type) {
            self.forget_sequence(key, owner);
        }
        seq.set_catalog(None);
        debug!(sequence = %seq.name(), "Detached sequence");
        Ok(seq)
    }

    /// Unregister a sequence and drop it.
    pub fn remove_sequence(&mut self, key: SequenceKey) -> Result<()> {
        self.detach_sequence(key).map(drop)
    }

    /// Rename a registered sequence.
    pub fn rename_sequence(&mut self, key: SequenceKey, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "a sequence name cannot be empty".to_string(),
            ));
        }
        let current = self.registered_sequence(key)?.name().to_string();
        if current == name {
            return Ok(());
        }
        if self.sequences_by_name.contains_key(&name) {
            return Err(Error::duplicate_name(ObjectKind::Sequence, name));
        }

        self.sequences_by_name.remove(&current);
        self.sequences_by_name.insert(name.clone(), key);
        self.registered_sequence_mut(key)?.set_name(name.clone());
        debug!(from = %current, to = %name, "Renamed sequence");
        Ok(())
    }

    /// Change the id of a registered sequence.
    pub fn set_sequence_id(&mut self, key: SequenceKey, id: u32) -> Result<()> {
        let current = self.registered_sequence(key)?.id();
        if current == id {
            return Ok(());
        }
        if self.sequences_by_id.contains_key(&id) {
            return Err(Error::DuplicateId {
                kind: ObjectKind::Sequence,
                id,
            });
        }

        self.sequences_by_id.remove(&current);
        self.sequences_by_id.insert(id, key);
        self.registered_sequence_mut(key)?.set_id(id);
        debug!(from = current, to = id, "Changed sequence id");
        Ok(())
    }

    /// Set or clear the owner of a registered sequence, moving it between
    /// reverse-index buckets.
    pub fn set_sequence_owner(&mut self, key: SequenceKey, owner: Option<SequenceOwner>) -> Result<()> {
        let seq = self.registered_sequence(key)?;
        let resolved = match &owner {
            Some(owner) => Some(self.resolve_sequence_owner(seq.name(), owner)?),
            None => None,
        };
        let previous = seq.owner().and_then(|o| o.data_set_type);

        if let Some(previous) = previous {
            self.forget_sequence(key, previous);
        }
        if let Some(dt) = resolved.and_then(|o| o.data_set_type) {
            self.dependent_sequences.entry(dt).or_default().push(key);
        }
        self.registered_sequence_mut(key)?.set_owner(resolved);
        debug!(sequence = %key, "Changed sequence owner");
        Ok(())
    }

    /// Look up a sequence by handle.
    pub fn sequence(&self, key: SequenceKey) -> Option<&Sequence> {
        self.sequences.get(&key)
    }

    /// Look up a sequence by name.
    pub fn sequence_by_name(&self, name: &str) -> Option<&Sequence> {
        self.sequences_by_name
            .get(name)
            .and_then(|key| self.sequences.get(key))
    }

    /// Look up a sequence by id.
    pub fn sequence_by_id(&self, id: u32) -> Option<&Sequence> {
        self.sequences_by_id
            .get(&id)
            .and_then(|key| self.sequences.get(key))
    }

    /// The i-th sequence in registration order.
    pub fn sequence_at(&self, i: usize) -> Option<&Sequence> {
        self.sequence_order
            .get(i)
            .and_then(|key| self.sequences.get(key))
    }

    /// Sequences in registration order.
    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.sequence_order
            .iter()
            .filter_map(|key| self.sequences.get(key))
    }

    /// Number of registered sequences.
    pub fn number_of_sequences(&self) -> usize {
        self.sequence_order.len()
    }

    /// Sequences owned by a property of the schema.
    pub fn dependent_sequences(&self, key: DataSetTypeKey) -> Vec<&Sequence> {
        self.dependent_sequences
            .get(&key)
            .map(|bucket| bucket.iter().filter_map(|s| self.sequences.get(s)).collect())
            .unwrap_or_default()
    }

    /// Drop every sequence owned by a property of the schema.
    pub fn drop_dependent_sequences(&mut self, key: DataSetTypeKey) {
        let Some(bucket) = self.dependent_sequences.remove(&key) else {
            return;
        };
        for seq_key in bucket {
            match self.unregister_sequence(seq_key) {
                Some(seq) => debug!(sequence = %seq.name(), "Dropped dependent sequence"),
                None => warn!(sequence = %seq_key, "Dangling reverse index entry"),
            }
        }
    }

    /// Drop every sequence owned by exactly this property of the schema.
    pub fn drop_dependent_sequences_of(&mut self, key: DataSetTypeKey, property: PropertyKey) {
        let Some(bucket) = self.dependent_sequences.get_mut(&key) else {
            return;
        };
        let sequences = &self.sequences;
        let mut doomed = Vec::new();
        bucket.retain(|s| {
            let owned = sequences
                .get(s)
                .and_then(|seq| seq.owner_property())
                .is_some_and(|p| p == property);
            if owned {
                doomed.push(*s);
            }
            !owned
        });
        if bucket.is_empty() {
            self.dependent_sequences.remove(&key);
        }

        for seq_key in doomed {
            if let Some(seq) = self.unregister_sequence(seq_key) {
                debug!(sequence = %seq.name(), "Dropped dependent sequence");
            }
        }
    }

    fn registered_sequence(&self, key: SequenceKey) -> Result<&Sequence> {
        self.sequences
            .get(&key)
            .ok_or_else(|| Error::not_found(ObjectKind::Sequence, key))
    }

    fn registered_sequence_mut(&mut self, key: SequenceKey) -> Result<&mut Sequence> {
        self.sequences
            .get_mut(&key)
            .ok_or_else(|| Error::not_found(ObjectKind::Sequence, key))
    }

    /// Remove a sequence from the primary maps; reverse-index buckets are
    /// left to the caller.
    fn unregister_sequence(&mut self, key: SequenceKey) -> Option<Sequence> {
        let mut seq = self.sequences.remove(&key)?;
        self.sequences_by_name.remove(seq.name());
        self.sequences_by_id.remove(&seq.id());
        self.sequence_order.retain(|k| *k != key);
        seq.set_catalog(None);
        Some(seq)
    }

    fn forget_sequence(&mut self, key: SequenceKey, owner: DataSetTypeKey) {
        let mut found = false;
        let mut emptied = false;
        if let Some(bucket) = self.dependent_sequences.get_mut(&owner) {
            let before = bucket.len();
            bucket.retain(|s| *s != key);
            found = bucket.len() != before;
            emptied = bucket.is_empty();
        }
        if emptied {
            self.dependent_sequences.remove(&owner);
        }
        if !found && self.data_sets.contains_key(&owner) {
            warn!(sequence = %key, owner = %owner, "Sequence missing from reverse index");
        }
    }
}

impl Default for DataSourceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared catalog handle.
pub type SharedCatalog = Arc<RwLock<DataSourceCatalog>>;

/// Create a new shared catalog.
pub fn new_shared_catalog(config: CatalogConfig) -> SharedCatalog {
    Arc::new(RwLock::new(DataSourceCatalog::with_config(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FkAction, IndexType, PropertyType, UniqueKey};

    fn customers() -> (DataSetType, PropertyKey) {
        let mut dt = DataSetType::new("customers", 2);
        let id = dt
            .add_property(Property::required("id", PropertyType::Int32).with_id(20))
            .unwrap();
        (dt, id)
    }

    fn orders() -> (DataSetType, PropertyKey, PropertyKey) {
        let mut dt = DataSetType::new("orders", 1);
        let id = dt
            .add_property(Property::required("id", PropertyType::Int32).with_id(10))
            .unwrap();
        let customer_id = dt
            .add_property(Property::new("customer_id", PropertyType::Int32).with_id(11))
            .unwrap();
        (dt, id, customer_id)
    }

    fn linked() -> (DataSourceCatalog, DataSetTypeKey, PropertyKey, DataSetTypeKey, ConstraintKey) {
        let mut catalog = DataSourceCatalog::new();
        let (customers, customer_pk) = customers();
        let (orders, _, customer_id) = orders();
        let c = catalog.add(customers).unwrap();
        let o = catalog.add(orders).unwrap();
        let fk = catalog
            .add_constraint(
                o,
                ForeignKey::new("fk_orders_customer")
                    .referencing(c)
                    .with_pair(customer_id, customer_pk),
            )
            .unwrap();
        (catalog, c, customer_pk, o, fk)
    }

    #[test]
    fn test_add_and_lookup() {
        let mut catalog = DataSourceCatalog::new();
        let (dt, _) = customers();
        let key = catalog.add(dt).unwrap();

        assert_eq!(catalog.number_of_data_sets(), 1);
        assert!(catalog.data_set_type_exists("customers"));
        assert_eq!(catalog.data_set_type_by_name("customers").unwrap().key(), key);
        assert_eq!(catalog.data_set_type_by_id(2).unwrap().key(), key);
        assert_eq!(catalog.data_set_type_at(0).unwrap().key(), key);
        assert_eq!(catalog.data_set_type(key).unwrap().catalog(), Some(catalog.key()));
    }

    #[test]
    fn test_add_rejects_duplicates_without_side_effects() {
        let mut catalog = DataSourceCatalog::new();
        catalog.add(DataSetType::new("a", 1)).unwrap();

        let err = catalog.add(DataSetType::new("a", 2)).unwrap_err();
        assert!(matches!(err.error(), Error::DuplicateName { kind: ObjectKind::DataSetType, .. }));
        assert_eq!(err.value().id(), 2);
        let err = catalog.add(DataSetType::new("b", 1)).unwrap_err();
        assert!(matches!(err.error(), Error::DuplicateId { id: 1, .. }));
        let err = catalog.add(DataSetType::new("", 3)).unwrap_err();
        assert!(matches!(err.error(), Error::InvalidArgument(_)));

        assert_eq!(catalog.number_of_data_sets(), 1);
        assert!(catalog.data_set_type_by_name("b").is_none());
        assert!(catalog.data_set_type_by_id(2).is_none());
    }

    #[test]
    fn test_add_requires_referenced_schema() {
        let mut catalog = DataSourceCatalog::new();
        let (customers, customer_pk) = customers();
        let (mut orders, _, customer_id) = orders();
        orders.add_foreign_key(
            ForeignKey::new("fk")
                .referencing(customers.key())
                .with_pair(customer_id, customer_pk),
        );

        let orders_key = orders.key();
        let (err, orders) = catalog.add(orders).unwrap_err().into_parts();
        assert!(matches!(err, Error::DependencyMissing(_)));
        assert_eq!(catalog.number_of_data_sets(), 0);
        assert_eq!(orders.key(), orders_key);
        assert!(orders.catalog().is_none());

        let c = catalog.add(customers).unwrap();
        let o = catalog.add(orders).unwrap();
        assert_eq!(o, orders_key);
        let refs = catalog.referencing_foreign_keys(c);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].data_set_type(), Some(o));
    }

    #[test]
    fn test_add_all_is_atomic() {
        let mut catalog = DataSourceCatalog::new();
        let (customers, customer_pk) = customers();
        let (mut orders, _, customer_id) = orders();
        let mut lines = DataSetType::new("lines", 3);
        let line_order = lines
            .add_property(Property::new("order_id", PropertyType::Int32))
            .unwrap();
        // References a schema that is neither registered nor in the batch.
        lines.add_foreign_key(
            ForeignKey::new("fk_nowhere")
                .referencing(DataSetTypeKey::next())
                .with_pair(line_order, PropertyKey::next()),
        );
        orders.add_foreign_key(
            ForeignKey::new("fk_orders_customer")
                .referencing(customers.key())
                .with_pair(customer_id, customer_pk),
        );

        let rejected = catalog.add_all(vec![customers, orders, lines]).unwrap_err();
        assert!(matches!(rejected.error(), Error::DependencyMissing(_)));
        assert_eq!(catalog.number_of_data_sets(), 0);
        assert!(catalog.dependent_fks.is_empty());

        // The whole batch comes back and can be registered once fixed.
        let mut batch = rejected.into_inner();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[2].name(), "lines");
        batch.pop();
        let keys = catalog.add_all(batch).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(catalog.referencing_foreign_keys(keys[0]).len(), 1);
    }

    #[test]
    fn test_add_all_rejects_duplicates_within_batch() {
        let mut catalog = DataSourceCatalog::new();

        let err = catalog
            .add_all(vec![DataSetType::new("a", 1), DataSetType::new("a", 2)])
            .unwrap_err();
        assert!(matches!(err.error(), Error::DuplicateName { .. }));
        let err = catalog
            .add_all(vec![DataSetType::new("a", 1), DataSetType::new("b", 1)])
            .unwrap_err();
        assert!(matches!(err.error(), Error::DuplicateId { id: 1, .. }));
        assert_eq!(catalog.number_of_data_sets(), 0);
    }

    #[test]
    fn test_add_sequences_is_atomic() {
        let mut catalog = DataSourceCatalog::new();
        catalog.add_sequence(Sequence::new("existing", 1)).unwrap();

        let err = catalog
            .add_sequences(vec![Sequence::new("s1", 2), Sequence::new("s2", 2)])
            .unwrap_err();
        assert!(matches!(err.error(), Error::DuplicateId { id: 2, .. }));
        let err = catalog
            .add_sequences(vec![Sequence::new("s1", 2), Sequence::new("existing", 3)])
            .unwrap_err();
        assert!(matches!(err.error(), Error::DuplicateName { .. }));
        assert_eq!(catalog.number_of_sequences(), 1);
        assert_eq!(err.into_inner().len(), 2);
    }

    #[test]
    fn test_clear_data_set_type() {
        let (mut catalog, c, customer_pk, o, _) = linked();
        let seq = Sequence::new("customers_id_seq", 1)
            .owned_by(catalog.data_set_type(c).unwrap().property(customer_pk).unwrap());
        catalog.add_sequence(seq).unwrap();

        catalog.clear_data_set_type(c).unwrap();

        let customers = catalog.data_set_type(c).unwrap();
        assert_eq!(customers.number_of_properties(), 0);
        assert_eq!(catalog.data_set_type_by_name("customers").unwrap().key(), c);
        assert_eq!(catalog.data_set_type(o).unwrap().number_of_foreign_keys(), 0);
        assert!(catalog.foreign_key_refs(c).is_empty());
        assert_eq!(catalog.number_of_sequences(), 0);

        // The dependent side clears its own references.
        let (mut catalog, c, _, o, _) = linked();
        catalog.clear_data_set_type(o).unwrap();
        assert!(catalog.foreign_key_refs(c).is_empty());
        assert!(catalog.clear_data_set_type(DataSetTypeKey::next()).is_err());
    }

    fn employees() -> DataSetType {
        let mut dt = DataSetType::new("employees", 1);
        let id = dt.add_property(Property::required("id", PropertyType::Int32)).unwrap();
        let manager = dt.add_property(Property::new("manager_id", PropertyType::Int32)).unwrap();
        let key = dt.key();
        dt.add_foreign_key(ForeignKey::new("fk_manager").referencing(key).with_pair(manager, id));
        dt
    }

    #[test]
    fn test_self_reference_accepted_by_default() {
        let mut no_self =
            DataSourceCatalog::with_config(CatalogConfig::default().allow_self_references(false));
        let err = no_self.add(employees()).unwrap_err();
        assert!(matches!(err.error(), Error::Validation(_)));

        let mut catalog = DataSourceCatalog::new();
        let key = catalog.add(employees()).unwrap();
        assert_eq!(catalog.referencing_foreign_keys(key).len(), 1);

        // A self reference survives a cascading detach of its own schema.
        let dt = catalog.detach(key, true).unwrap();
        assert_eq!(dt.number_of_foreign_keys(), 1);
        assert!(catalog.foreign_key_refs(key).is_empty());
    }

    #[test]
    fn test_add_constraint_indexes_foreign_key() {
        let (catalog, c, _, o, fk) = linked();

        let refs = catalog.referencing_foreign_keys(c);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].key(), fk);
        assert_eq!(refs[0].data_set_type(), Some(o));
        assert!(catalog.referencing_foreign_keys(o).is_empty());
    }

    #[test]
    fn test_add_constraint_rejects_unregistered_reference() {
        let mut catalog = DataSourceCatalog::new();
        let (orders, _, customer_id) = orders();
        let o = catalog.add(orders).unwrap();

        let err = catalog
            .add_constraint(
                o,
                ForeignKey::new("fk")
                    .referencing(DataSetTypeKey::next())
                    .with_pair(customer_id, PropertyKey::next()),
            )
            .unwrap_err();
        assert!(matches!(err, Error::DependencyMissing(_)));

        let err = catalog.add_constraint(o, ForeignKey::new("fk_nowhere")).unwrap_err();
        assert!(matches!(err, Error::DependencyMissing(_)));
        assert_eq!(catalog.data_set_type(o).unwrap().number_of_foreign_keys(), 0);
    }

    #[test]
    fn test_remove_constraint() {
        let (mut catalog, c, _, o, fk) = linked();

        let err = catalog.remove_constraint(c, fk).unwrap_err();
        assert!(matches!(err, Error::AssociationMismatch(_)));
        assert_eq!(catalog.referencing_foreign_keys(c).len(), 1);

        let removed = catalog.remove_constraint(o, fk).unwrap().unwrap();
        assert_eq!(removed.name(), "fk_orders_customer");
        assert!(catalog.referencing_foreign_keys(c).is_empty());

        assert!(catalog.remove_constraint(o, fk).unwrap().is_none());
    }

    #[test]
    fn test_detach_without_cascade_keeps_foreign_key() {
        let (mut catalog, c, _, o, _) = linked();

        let customers = catalog.detach(c, false).unwrap();
        assert!(customers.catalog().is_none());
        assert!(catalog.data_set_type_by_name("customers").is_none());
        assert!(catalog.foreign_key_refs(c).is_empty());

        let orders = catalog.data_set_type(o).unwrap();
        assert!(orders.foreign_key("fk_orders_customer").is_some());

        // Re-registering picks the dangling foreign key up again.
        catalog.add(customers).unwrap();
        assert_eq!(catalog.referencing_foreign_keys(c).len(), 1);
    }

    #[test]
    fn test_detach_with_cascade_drops_foreign_key() {
        let (mut catalog, c, _, o, _) = linked();

        catalog.remove(c, true).unwrap();
        assert_eq!(catalog.data_set_type(o).unwrap().number_of_foreign_keys(), 0);
        assert!(matches!(catalog.remove(c, true), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_detach_withdraws_own_foreign_keys() {
        let (mut catalog, c, _, o, _) = linked();

        let orders = catalog.detach(o, false).unwrap();
        assert_eq!(orders.number_of_foreign_keys(), 1);
        assert!(catalog.foreign_key_refs(c).is_empty());
    }

    #[test]
    fn test_rename_and_set_id() {
        let mut catalog = DataSourceCatalog::new();
        let a = catalog.add(DataSetType::new("a", 1)).unwrap();
        catalog.add(DataSetType::new("b", 2)).unwrap();

        let err = catalog.rename(a, "b").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert_eq!(catalog.data_set_type(a).unwrap().name(), "a");
        assert_eq!(catalog.data_set_type_by_name("a").unwrap().key(), a);

        catalog.rename(a, "c").unwrap();
        assert!(catalog.data_set_type_by_name("a").is_none());
        assert_eq!(catalog.data_set_type_by_name("c").unwrap().key(), a);
        assert_eq!(catalog.data_set_type_at(0).unwrap().key(), a);

        assert!(matches!(
            catalog.set_data_set_type_id(a, 2),
            Err(Error::DuplicateId { id: 2, .. })
        ));
        catalog.set_data_set_type_id(a, 7).unwrap();
        assert!(catalog.data_set_type_by_id(1).is_none());
        assert_eq!(catalog.data_set_type_by_id(7).unwrap().key(), a);

        let stale = DataSetTypeKey::next();
        assert!(matches!(catalog.rename(stale, "z"), Err(Error::NotFound { .. })));
        assert!(matches!(catalog.set_data_set_type_id(stale, 9), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_sequence_lifecycle() {
        let mut catalog = DataSourceCatalog::new();
        let (orders, id, _) = orders();
        let owner = orders.property(id).unwrap();
        let seq = Sequence::new("orders_id_seq", 1).owned_by(owner);
        let o = catalog.add(orders).unwrap();

        let s = catalog.add_sequence(seq).unwrap();
        assert_eq!(catalog.sequence_by_name("orders_id_seq").unwrap().key(), s);
        assert_eq!(catalog.sequence_by_id(1).unwrap().catalog(), Some(catalog.key()));
        assert_eq!(catalog.dependent_sequences(o).len(), 1);

        assert!(matches!(
            catalog.add_sequence(Sequence::new("orders_id_seq", 2)).map_err(Error::from),
            Err(Error::DuplicateName { kind: ObjectKind::Sequence, .. })
        ));
        assert!(matches!(
            catalog.add_sequence(Sequence::new("other", 1)).map_err(Error::from),
            Err(Error::DuplicateId { kind: ObjectKind::Sequence, id: 1 })
        ));

        catalog.rename_sequence(s, "orders_seq").unwrap();
        catalog.set_sequence_id(s, 5).unwrap();
        assert_eq!(catalog.sequence_by_name("orders_seq").unwrap().id(), 5);
        assert!(catalog.sequence_by_id(1).is_none());

        let detached = catalog.detach_sequence(s).unwrap();
        assert!(detached.catalog().is_none());
        assert_eq!(catalog.number_of_sequences(), 0);
        assert!(catalog.dependent_sequences(o).is_empty());
    }

    #[test]
    fn test_sequence_owner_must_be_registered() {
        let mut catalog = DataSourceCatalog::new();
        let (orders, id, _) = orders();

        let owned = Sequence::new("s", 1).owned_by(orders.property(id).unwrap());
        let (err, owned) = catalog.add_sequence(owned).unwrap_err().into_parts();
        assert!(matches!(err, Error::DependencyMissing(_)));

        // An owner that was never attached to a schema resolves to nothing.
        let free = Property::new("free", PropertyType::Int64);
        let err = catalog
            .add_sequence(Sequence::new("t", 2).owned_by(&free))
            .unwrap_err();
        assert!(matches!(err.error(), Error::DependencyMissing(_)));
        assert_eq!(catalog.number_of_sequences(), 0);

        let o = catalog.add(orders).unwrap();
        catalog.add_sequence(owned).unwrap();
        assert_eq!(catalog.dependent_sequences(o).len(), 1);
    }

    #[test]
    fn test_set_sequence_owner_moves_bucket() {
        let mut catalog = DataSourceCatalog::new();
        let (customers, customer_pk) = customers();
        let (orders, order_pk, _) = orders();
        let c = catalog.add(customers).unwrap();
        let o = catalog.add(orders).unwrap();

        let s = catalog.add_sequence(Sequence::new("s", 1)).unwrap();
        catalog
            .set_sequence_owner(s, Some(SequenceOwner::new(o, order_pk)))
            .unwrap();
        assert_eq!(catalog.dependent_sequences(o).len(), 1);

        catalog
            .set_sequence_owner(s, Some(SequenceOwner::new(c, customer_pk)))
            .unwrap();
        assert!(catalog.dependent_sequences(o).is_empty());
        assert_eq!(catalog.dependent_sequences(c).len(), 1);

        // A property of another schema is rejected and nothing moves.
        let err = catalog
            .set_sequence_owner(s, Some(SequenceOwner::new(o, customer_pk)))
            .unwrap_err();
        assert!(matches!(err, Error::DependencyMissing(_)));
        assert_eq!(catalog.sequence(s).unwrap().owner_property(), Some(customer_pk));

        catalog.set_sequence_owner(s, None).unwrap();
        assert!(catalog.dependent_sequences(c).is_empty());
    }

    #[test]
    fn test_remove_property_drops_owned_sequence() {
        let mut catalog = DataSourceCatalog::new();
        let (orders, id, customer_id) = orders();
        let keep = Sequence::new("keep", 2).owned_by(orders.property(customer_id).unwrap());
        let drop_me = Sequence::new("drop", 1).owned_by(orders.property(id).unwrap());
        let o = catalog.add(orders).unwrap();
        catalog.add_sequences(vec![drop_me, keep]).unwrap();

        let removed = catalog.remove_property(o, id).unwrap();
        assert_eq!(removed.name(), "id");
        assert!(removed.parent().is_none());
        assert!(catalog.sequence_by_name("drop").is_none());
        assert!(catalog.sequence_by_name("keep").is_some());
        assert_eq!(catalog.dependent_sequences(o).len(), 1);

        assert!(matches!(
            catalog.remove_property(o, id),
            Err(Error::NotFound { kind: ObjectKind::Property, .. })
        ));
    }

    #[test]
    fn test_replace_property_reaches_other_schemas_and_sequences() {
        let (mut catalog, c, customer_pk, o, fk) = linked();
        let seq = Sequence::new("customers_id_seq", 1)
            .owned_by(catalog.data_set_type(c).unwrap().property(customer_pk).unwrap());
        let s = catalog.add_sequence(seq).unwrap();

        let replacement = Property::required("id", PropertyType::Int64);
        let new_key = replacement.key();
        catalog.replace_property(c, customer_pk, replacement).unwrap();

        let fk = catalog.foreign_key(o, fk).unwrap();
        assert_eq!(fk.referenced_properties(), &[new_key]);
        assert_eq!(catalog.sequence(s).unwrap().owner_property(), Some(new_key));
    }

    #[test]
    fn test_strict_mode_checks_referenced_columns_and_indexes() {
        let mut catalog = DataSourceCatalog::with_config(CatalogConfig::strict());
        let (customers, customer_pk) = customers();
        let (orders, order_pk, customer_id) = orders();
        let c = catalog.add(customers).unwrap();
        let o = catalog.add(orders).unwrap();

        let err = catalog
            .add_constraint(
                o,
                ForeignKey::new("fk_bad")
                    .referencing(c)
                    .with_pair(customer_id, order_pk),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        catalog
            .add_constraint(
                o,
                ForeignKey::new("fk_ok")
                    .referencing(c)
                    .with_pair(customer_id, customer_pk)
                    .with_on_delete(FkAction::Cascade),
            )
            .unwrap();

        let index = catalog
            .add_index(o, Index::new("orders_customer_idx", IndexType::BTree).with_property(customer_id))
            .unwrap();
        let err = catalog
            .add_constraint(
                o,
                UniqueKey::new("uk_id").with_property(order_pk).with_associated_index(index),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = catalog
            .add_index(o, Index::new("bad_idx", IndexType::BTree).with_property(customer_pk))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_clear() {
        let (mut catalog, c, ..) = linked();
        catalog.add_sequence(Sequence::new("s", 1)).unwrap();

        catalog.clear();
        assert_eq!(catalog.number_of_data_sets(), 0);
        assert_eq!(catalog.number_of_sequences(), 0);
        assert!(catalog.foreign_key_refs(c).is_empty());
    }

    #[test]
    fn test_shared_catalog() {
        let shared = new_shared_catalog(CatalogConfig::default());
        shared.write().add(DataSetType::new("a", 1)).unwrap();

        let reader = Arc::clone(&shared);
        assert_eq!(reader.read().number_of_data_sets(), 1);
    }
}
