//! Data source catalog for dacat.
//!
//! The catalog registers dataset schemas and sequences and keeps the reverse
//! dependency indexes (foreign keys by referenced schema, sequences by owning
//! schema) consistent with them.

mod catalog;
mod constraint;
mod dataset_type;
mod foreign_key;
mod handle;
mod index;
mod property;
mod sequence;
mod snapshot;
mod types;

pub use catalog::{new_shared_catalog, DataSourceCatalog, ForeignKeyRef, SharedCatalog};
pub use constraint::{CheckConstraint, Constraint, ConstraintRef, ConstraintType, PrimaryKey, UniqueKey};
pub use dataset_type::DataSetType;
pub use foreign_key::{FkAction, ForeignKey};
pub use handle::{CatalogKey, ConstraintKey, DataSetTypeKey, IndexKey, PropertyKey, SequenceKey};
pub use index::Index;
pub use property::Property;
pub use sequence::{Sequence, SequenceOwner};
pub use snapshot::{
    CatalogSnapshot, CheckSnapshot, DataSetTypeSnapshot, ForeignKeySnapshot, IndexSnapshot,
    KeySnapshot, PropertySnapshot, SequenceSnapshot,
};
pub use types::{DataSetCategory, IndexType, PropertyType};
