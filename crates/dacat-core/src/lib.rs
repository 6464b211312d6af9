//! dacat core - data source catalog and schema metadata.
//!
//! This crate models the schemas (properties, keys, indexes, foreign keys)
//! and sequences of one data source, and keeps the dependency indexes
//! between them consistent as they are added, renamed and removed.

pub mod catalog;
pub mod config;
pub mod error;

pub use catalog::{
    new_shared_catalog, CatalogKey, CatalogSnapshot, CheckConstraint, Constraint, ConstraintKey,
    ConstraintRef, ConstraintType, DataSetCategory, DataSetType, DataSetTypeKey,
    DataSourceCatalog, FkAction, ForeignKey, ForeignKeyRef, Index, IndexKey, IndexType,
    PrimaryKey, Property, PropertyKey, PropertyType, Sequence, SequenceKey, SequenceOwner,
    SharedCatalog, UniqueKey,
};
pub use config::{CatalogConfig, ValidationMode};
pub use error::{Error, ObjectKind, Rejected, Result};
