//! Core type definitions for the catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Data type of a property.
///
/// Geometry and raster are opaque tags; their structure is modeled elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Boolean value.
    Boolean,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Fixed-precision decimal.
    Numeric {
        /// Total number of digits.
        precision: u8,
        /// Number of digits after decimal point.
        scale: u8,
    },
    /// Character string, optionally bounded.
    String {
        /// Maximum length, if any.
        size: Option<u32>,
    },
    /// Date and time.
    DateTime,
    /// Binary data.
    ByteArray,
    /// Geometry column.
    Geometry,
    /// Raster column.
    Raster,
}

impl PropertyType {
    /// Unbounded string type.
    pub fn string() -> Self {
        PropertyType::String { size: None }
    }

    /// Bounded string type.
    pub fn varchar(size: u32) -> Self {
        PropertyType::String { size: Some(size) }
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PropertyType::Int16
                | PropertyType::Int32
                | PropertyType::Int64
                | PropertyType::Float
                | PropertyType::Double
                | PropertyType::Numeric { .. }
        )
    }

    /// Check if this type is an integer type (usable with a sequence).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PropertyType::Int16 | PropertyType::Int32 | PropertyType::Int64
        )
    }
}

/// Category of a dataset, as reported by the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataSetCategory {
    /// Not reported.
    #[default]
    Unknown,
    /// Regular table.
    Table,
    /// System table.
    SystemTable,
    /// View.
    View,
    /// Stored query.
    Query,
    /// Index relation.
    Index,
    /// Sequence relation.
    Sequence,
    /// Trigger.
    Trigger,
    /// Plain file.
    RegularFile,
}

/// Physical structure of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexType {
    /// B-tree.
    #[default]
    BTree,
    /// R-tree (spatial).
    RTree,
    /// Quad-tree (spatial).
    QuadTree,
    /// Hash.
    Hash,
}

impl IndexType {
    /// Check if this is a spatial access method.
    pub fn is_spatial(&self) -> bool {
        matches!(self, IndexType::RTree | IndexType::QuadTree)
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexType::BTree => write!(f, "B-TREE"),
            IndexType::RTree => write!(f, "R-TREE"),
            IndexType::QuadTree => write!(f, "QUAD-TREE"),
            IndexType::Hash => write!(f, "HASH"),
        }
    }
}
