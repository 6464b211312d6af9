//! Catalog snapshot - a name-based, serializable description of a catalog.
//!
//! Handles are process-local, so a snapshot refers to schemas and
//! properties by name. Restoring rebuilds the object graph through the
//! public catalog operations: every schema without its foreign keys first,
//! then the foreign keys, then the sequences.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::DataSourceCatalog;
use super::constraint::{CheckConstraint, PrimaryKey, UniqueKey};
use super::dataset_type::DataSetType;
use super::foreign_key::{FkAction, ForeignKey};
use super::handle::{IndexKey, PropertyKey};
use super::index::Index;
use super::property::Property;
use super::sequence::{Sequence, SequenceOwner};
use super::types::{DataSetCategory, IndexType, PropertyType};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};

/// Serializable description of a whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Catalog id.
    pub id: u32,
    /// Schemas in registration order.
    pub data_sets: Vec<DataSetTypeSnapshot>,
    /// Sequences in registration order.
    pub sequences: Vec<SequenceSnapshot>,
}

/// Serializable description of one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSetTypeSnapshot {
    /// Schema name.
    pub name: String,
    /// User-facing id.
    pub id: u32,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Kind of dataset.
    #[serde(default)]
    pub category: DataSetCategory,
    /// Properties in declaration order.
    pub properties: Vec<PropertySnapshot>,
    /// The primary key, if any.
    #[serde(default)]
    pub primary_key: Option<KeySnapshot>,
    /// Unique keys.
    #[serde(default)]
    pub unique_keys: Vec<KeySnapshot>,
    /// Check constraints.
    #[serde(default)]
    pub check_constraints: Vec<CheckSnapshot>,
    /// Indexes.
    #[serde(default)]
    pub indexes: Vec<IndexSnapshot>,
    /// Foreign keys, restored after every schema is registered.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySnapshot>,
}

/// A property of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// Property name, unique within its schema.
    pub name: String,
    /// User-facing id.
    pub id: u32,
    /// Data type.
    pub data_type: PropertyType,
    /// Whether a value is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Whether values are generated by the store.
    #[serde(default)]
    pub auto_number: bool,
    /// Default value expression.
    #[serde(default)]
    pub default_value: Option<String>,
}

/// A primary or unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySnapshot {
    /// Constraint name.
    pub name: String,
    /// User-facing id.
    pub id: u32,
    /// Names of the member properties.
    pub properties: Vec<String>,
    /// Name of the backing index.
    #[serde(default)]
    pub associated_index: Option<String>,
}

/// A check constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSnapshot {
    /// Constraint name.
    pub name: String,
    /// User-facing id.
    pub id: u32,
    /// Boolean expression, stored verbatim.
    pub expression: String,
}

/// An index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Index name.
    pub name: String,
    /// User-facing id.
    pub id: u32,
    /// Index structure.
    pub index_type: IndexType,
    /// Names of the indexed properties.
    pub properties: Vec<String>,
}

/// A foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeySnapshot {
    /// Constraint name.
    pub name: String,
    /// User-facing id.
    pub id: u32,
    /// Name of the referenced schema.
    pub referenced: String,
    /// Names of the local properties.
    pub properties: Vec<String>,
    /// Names of the referenced properties, paired by position.
    pub referenced_properties: Vec<String>,
    /// Action on delete of the referenced row.
    #[serde(default)]
    pub on_delete: FkAction,
    /// Action on update of the referenced row.
    #[serde(default)]
    pub on_update: FkAction,
}

/// Serializable description of one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSnapshot {
    /// Sequence name.
    pub name: String,
    /// User-facing id.
    pub id: u32,
    /// Increment between values.
    pub increment: i64,
    /// Minimum value.
    pub min_value: i64,
    /// Maximum value.
    pub max_value: i64,
    /// Start value.
    pub start_value: i64,
    /// Number of preallocated values.
    pub cached_values: i64,
    /// Whether the sequence wraps around.
    pub cycled: bool,
    /// `(schema name, property name)` of the owning property.
    #[serde(default)]
    pub owner: Option<(String, String)>,
}

impl CatalogSnapshot {
    /// Describe a catalog.
    ///
    /// Members that refer to something no longer present (for instance a
    /// foreign key left dangling by a non-cascading detach) are skipped.
    pub fn capture(catalog: &DataSourceCatalog) -> Self {
        let data_sets = catalog
            .data_set_types()
            .map(|dt| DataSetTypeSnapshot::capture(dt, catalog))
            .collect();

        let sequences = catalog
            .sequences()
            .map(|seq| SequenceSnapshot::capture(seq, catalog))
            .collect();

        Self {
            id: catalog.id(),
            data_sets,
            sequences,
        }
    }

    /// Rebuild a catalog.
    pub fn restore(&self, config: CatalogConfig) -> Result<DataSourceCatalog> {
        let mut catalog = DataSourceCatalog::with_config(config);
        catalog.set_id(self.id);

        for snapshot in &self.data_sets {
            catalog.add(snapshot.build()?)?;
        }
        for snapshot in &self.data_sets {
            for fk in &snapshot.foreign_keys {
                let owner = lookup_data_set(&catalog, &snapshot.name)?;
                let owner_key = owner.key();
                let fk = fk.build(&catalog, owner)?;
                catalog.add_constraint(owner_key, fk)?;
            }
        }
        for snapshot in &self.sequences {
            catalog.add_sequence(snapshot.build(&catalog)?)?;
        }

        Ok(catalog)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

fn lookup_data_set<'a>(catalog: &'a DataSourceCatalog, name: &str) -> Result<&'a DataSetType> {
    catalog
        .data_set_type_by_name(name)
        .ok_or_else(|| Error::Deserialization(format!("unknown data set type '{name}'")))
}

fn property_names(dt: &DataSetType, keys: &[PropertyKey]) -> Option<Vec<String>> {
    keys.iter()
        .map(|k| dt.property(*k).map(|p| p.name().to_string()))
        .collect()
}

fn property_keys(dt: &DataSetType, names: &[String]) -> Result<Vec<PropertyKey>> {
    names
        .iter()
        .map(|name| {
            dt.property_by_name(name).map(|p| p.key()).ok_or_else(|| {
                Error::Deserialization(format!(
                    "unknown property '{name}' of data set type '{}'",
                    dt.name()
                ))
            })
        })
        .collect()
}

impl DataSetTypeSnapshot {
    fn capture(dt: &DataSetType, catalog: &DataSourceCatalog) -> Self {
        let index_name = |key: Option<IndexKey>| {
            key.and_then(|k| dt.index_by_key(k))
                .map(|idx| idx.name().to_string())
        };
        let key_snapshot = |name: &str, id: u32, members: &[PropertyKey], index: Option<IndexKey>| {
            let snapshot = property_names(dt, members).map(|properties| KeySnapshot {
                name: name.to_string(),
                id,
                properties,
                associated_index: index_name(index),
            });
            if snapshot.is_none() {
                warn!(data_set_type = %dt.name(), key = %name, "Skipping key with unknown members");
            }
            snapshot
        };

        let properties = dt
            .properties()
            .iter()
            .map(|p| PropertySnapshot {
                name: p.name().to_string(),
                id: p.id(),
                data_type: p.data_type(),
                required: p.is_required(),
                auto_number: p.is_auto_number(),
                default_value: p.default_value().map(str::to_string),
            })
            .collect();

        let primary_key = dt
            .primary_key()
            .and_then(|pk| key_snapshot(pk.name(), pk.id(), pk.properties(), pk.associated_index()));

        let unique_keys = dt
            .unique_keys()
            .iter()
            .filter_map(|uk| key_snapshot(uk.name(), uk.id(), uk.properties(), uk.associated_index()))
            .collect();

        let check_constraints = dt
            .check_constraints()
            .iter()
            .map(|cc| CheckSnapshot {
                name: cc.name().to_string(),
                id: cc.id(),
                expression: cc.expression().to_string(),
            })
            .collect();

        let indexes = dt
            .indexes()
            .iter()
            .filter_map(|idx| {
                property_names(dt, idx.properties()).map(|properties| IndexSnapshot {
                    name: idx.name().to_string(),
                    id: idx.id(),
                    index_type: idx.index_type(),
                    properties,
                })
            })
            .collect();

        let foreign_keys = dt
            .foreign_keys()
            .iter()
            .filter_map(|fk| {
                let snapshot = ForeignKeySnapshot::capture(fk, dt, catalog);
                if snapshot.is_none() {
                    warn!(
                        data_set_type = %dt.name(),
                        foreign_key = %fk.name(),
                        "Skipping dangling foreign key"
                    );
                }
                snapshot
            })
            .collect();

        Self {
            name: dt.name().to_string(),
            id: dt.id(),
            title: dt.title().to_string(),
            category: dt.category(),
            properties,
            primary_key,
            unique_keys,
            check_constraints,
            indexes,
            foreign_keys,
        }
    }

    /// Build the schema without its foreign keys.
    fn build(&self) -> Result<DataSetType> {
        let mut dt = DataSetType::new(self.name.clone(), self.id)
            .with_title(self.title.clone())
            .with_category(self.category);

        for p in &self.properties {
            let mut property = Property::new(p.name.clone(), p.data_type)
                .with_id(p.id)
                .with_required(p.required);
            if p.auto_number {
                property = property.with_auto_number();
            }
            if let Some(default) = &p.default_value {
                property = property.with_default(default.clone());
            }
            dt.add_property(property)?;
        }

        for idx in &self.indexes {
            let mut index = Index::new(idx.name.clone(), idx.index_type).with_id(idx.id);
            index.set_properties(property_keys(&dt, &idx.properties)?);
            dt.add_index(index);
        }

        if let Some(pk) = &self.primary_key {
            let mut primary_key = PrimaryKey::new(pk.name.clone())
                .with_id(pk.id)
                .with_properties(property_keys(&dt, &pk.properties)?);
            primary_key.set_associated_index(associated_index(&dt, pk)?);
            dt.set_primary_key(Some(primary_key));
        }

        for uk in &self.unique_keys {
            let mut unique_key = UniqueKey::new(uk.name.clone())
                .with_id(uk.id)
                .with_properties(property_keys(&dt, &uk.properties)?);
            unique_key.set_associated_index(associated_index(&dt, uk)?);
            dt.add_unique_key(unique_key);
        }

        for cc in &self.check_constraints {
            dt.add_check_constraint(
                CheckConstraint::new(cc.name.clone(), cc.expression.clone()).with_id(cc.id),
            );
        }

        Ok(dt)
    }
}

fn associated_index(dt: &DataSetType, key: &KeySnapshot) -> Result<Option<IndexKey>> {
    key.associated_index
        .as_deref()
        .map(|name| {
            dt.index(name).map(|idx| idx.key()).ok_or_else(|| {
                Error::Deserialization(format!(
                    "key '{}' is associated with unknown index '{name}'",
                    key.name
                ))
            })
        })
        .transpose()
}

impl ForeignKeySnapshot {
    fn capture(fk: &ForeignKey, owner: &DataSetType, catalog: &DataSourceCatalog) -> Option<Self> {
        let referenced = match fk.referenced_data_set_type()? {
            key if key == owner.key() => owner,
            key => catalog.data_set_type(key)?,
        };
        Some(Self {
            name: fk.name().to_string(),
            id: fk.id(),
            referenced: referenced.name().to_string(),
            properties: property_names(owner, fk.properties())?,
            referenced_properties: property_names(referenced, fk.referenced_properties())?,
            on_delete: fk.on_delete(),
            on_update: fk.on_update(),
        })
    }

    fn build(&self, catalog: &DataSourceCatalog, owner: &DataSetType) -> Result<ForeignKey> {
        let referenced = lookup_data_set(catalog, &self.referenced)?;
        let mut fk = ForeignKey::new(self.name.clone())
            .with_id(self.id)
            .referencing(referenced.key())
            .with_on_delete(self.on_delete)
            .with_on_update(self.on_update);
        fk.set_properties(property_keys(owner, &self.properties)?);
        fk.set_referenced_properties(property_keys(referenced, &self.referenced_properties)?);
        Ok(fk)
    }
}

impl SequenceSnapshot {
    fn capture(seq: &Sequence, catalog: &DataSourceCatalog) -> Self {
        let owner = seq.owner().and_then(|owner| {
            let dt = catalog.data_set_type(owner.data_set_type?)?;
            let property = dt.property(owner.property)?;
            Some((dt.name().to_string(), property.name().to_string()))
        });

        Self {
            name: seq.name().to_string(),
            id: seq.id(),
            increment: seq.increment(),
            min_value: seq.min_value(),
            max_value: seq.max_value(),
            start_value: seq.start_value(),
            cached_values: seq.cached_values(),
            cycled: seq.is_cycled(),
            owner,
        }
    }

    fn build(&self, catalog: &DataSourceCatalog) -> Result<Sequence> {
        let mut seq = Sequence::new(self.name.clone(), self.id)
            .with_increment(self.increment)
            .with_min_value(self.min_value)
            .with_max_value(self.max_value)
            .with_start_value(self.start_value)
            .with_cached_values(self.cached_values);
        seq.set_cycled(self.cycled);

        if let Some((data_set, property)) = &self.owner {
            let dt = lookup_data_set(catalog, data_set)?;
            let keys = property_keys(dt, std::slice::from_ref(property))?;
            seq.set_owner(keys.first().map(|p| SequenceOwner::new(dt.key(), *p)));
        }
        Ok(seq)
    }
}
