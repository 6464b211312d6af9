//! Core error types.

use std::fmt;

use thiserror::Error;

/// Kind of catalog object an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A dataset schema.
    DataSetType,
    /// A number generator.
    Sequence,
    /// A schema attribute.
    Property,
    /// A primary key, unique key or check constraint.
    Constraint,
    /// A physical index.
    Index,
    /// A foreign key constraint.
    ForeignKey,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::DataSetType => write!(f, "data set type"),
            ObjectKind::Sequence => write!(f, "sequence"),
            ObjectKind::Property => write!(f, "property"),
            ObjectKind::Constraint => write!(f, "constraint"),
            ObjectKind::Index => write!(f, "index"),
            ObjectKind::ForeignKey => write!(f, "foreign key"),
        }
    }
}

/// Catalog errors.
///
/// Every mutating operation validates before it mutates, so an `Err` always
/// leaves the object graph exactly as it was.
#[derive(Debug, Error)]
pub enum Error {
    /// Another object of the same kind already uses this name.
    #[error("a {kind} named '{name}' already exists")]
    DuplicateName {
        /// Kind of the conflicting object.
        kind: ObjectKind,
        /// The conflicting name.
        name: String,
    },

    /// Another object of the same kind already uses this id.
    #[error("a {kind} with id {id} already exists")]
    DuplicateId {
        /// Kind of the conflicting object.
        kind: ObjectKind,
        /// The conflicting id.
        id: u32,
    },

    /// A referenced schema (or the schema owning a sequence) is not registered.
    #[error("missing dependency: {0}")]
    DependencyMissing(String),

    /// The target object could not be located.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Kind of the missing object.
        kind: ObjectKind,
        /// Name or handle used for the lookup.
        name: String,
    },

    /// A member was handed to a schema that does not own it.
    #[error("association mismatch: {0}")]
    AssociationMismatch(String),

    /// Operation intentionally unsupported.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Malformed argument (empty name and the like).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Structural validation failed under strict mode.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    pub(crate) fn not_found(kind: ObjectKind, name: impl fmt::Display) -> Self {
        Error::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub(crate) fn duplicate_name(kind: ObjectKind, name: impl Into<String>) -> Self {
        Error::DuplicateName {
            kind,
            name: name.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A value the catalog refused to take ownership of, handed back together
/// with the reason.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Rejected<T: fmt::Debug> {
    error: Error,
    value: Box<T>,
}

impl<T: fmt::Debug> Rejected<T> {
    pub(crate) fn new(error: Error, value: T) -> Self {
        Self {
            error,
            value: Box::new(value),
        }
    }

    /// Why the value was rejected.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// The rejected value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Take the rejected value back.
    pub fn into_inner(self) -> T {
        *self.value
    }

    /// Split into the reason and the rejected value.
    pub fn into_parts(self) -> (Error, T) {
        (self.error, *self.value)
    }
}

impl<T: fmt::Debug> From<Rejected<T>> for Error {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::duplicate_name(ObjectKind::DataSetType, "orders");
        assert_eq!(err.to_string(), "a data set type named 'orders' already exists");

        let err = Error::DuplicateId {
            kind: ObjectKind::Sequence,
            id: 7,
        };
        assert_eq!(err.to_string(), "a sequence with id 7 already exists");

        let err = Error::not_found(ObjectKind::ForeignKey, "fk_orders_customer");
        assert!(err.to_string().contains("foreign key not found"));
    }

    #[test]
    fn test_rejected_hands_value_back() {
        let rejected = Rejected::new(Error::InvalidArgument("empty name".to_string()), vec![1, 2]);
        assert_eq!(rejected.to_string(), "invalid argument: empty name");
        assert_eq!(rejected.value(), &vec![1, 2]);

        let (error, value) = rejected.into_parts();
        assert!(matches!(error, Error::InvalidArgument(_)));
        assert_eq!(value, vec![1, 2]);

        let err: Error = Rejected::new(Error::Validation("x".to_string()), 5u8).into();
        assert!(matches!(err, Error::Validation(_)));
    }
}
