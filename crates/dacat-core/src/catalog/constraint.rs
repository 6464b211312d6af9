//! Constraint definitions for schemas.

use std::fmt;

use super::foreign_key::ForeignKey;
use super::handle::{ConstraintKey, DataSetTypeKey, IndexKey, PropertyKey};

/// Tag identifying the kind of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    /// Primary key.
    PrimaryKey,
    /// Foreign key.
    ForeignKey,
    /// Unique key.
    UniqueKey,
    /// Check constraint.
    Check,
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::PrimaryKey => write!(f, "PRIMARY KEY"),
            ConstraintType::ForeignKey => write!(f, "FOREIGN KEY"),
            ConstraintType::UniqueKey => write!(f, "UNIQUE"),
            ConstraintType::Check => write!(f, "CHECK"),
        }
    }
}

// Primary and unique keys share their whole shape: an ordered property list
// plus an advisory link to the index backing them.
macro_rules! key_constraint {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            key: ConstraintKey,
            id: u32,
            name: String,
            data_set_type: Option<DataSetTypeKey>,
            properties: Vec<PropertyKey>,
            associated_index: Option<IndexKey>,
        }

        impl $name {
            /// Create an empty constraint with id 0.
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    key: ConstraintKey::next(),
                    id: 0,
                    name: name.into(),
                    data_set_type: None,
                    properties: Vec::new(),
                    associated_index: None,
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

            /// Append several properties.
            pub fn with_properties(mut self, properties: impl IntoIterator<Item = PropertyKey>) -> Self {
                self.properties.extend(properties);
                self
            }

            /// Set the associated index.
            pub fn with_associated_index(mut self, index: IndexKey) -> Self {
                self.associated_index = Some(index);
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

            /// Constraint name (may be empty until assigned).
            pub fn name(&self) -> &str {
                &self.name
            }

            /// Rename the constraint.
            pub fn set_name(&mut self, name: impl Into<String>) {
                self.name = name.into();
            }

            /// The owning schema, if attached.
            pub fn data_set_type(&self) -> Option<DataSetTypeKey> {
                self.data_set_type
            }

            pub(crate) fn set_data_set_type(&mut self, data_set_type: Option<DataSetTypeKey>) {
                self.data_set_type = data_set_type;
            }

            /// Member properties in declaration order.
            pub fn properties(&self) -> &[PropertyKey] {
                &self.properties
            }

            /// Replace the member list.
            pub fn set_properties(&mut self, properties: Vec<PropertyKey>) {
                self.properties = properties;
            }

            /// Append a property. Duplicates are not checked.
            pub fn add(&mut self, property: PropertyKey) {
                self.properties.push(property);
            }

            /// Check if the property is a member.
            pub fn has(&self, property: PropertyKey) -> bool {
                self.properties.contains(&property)
            }

            /// Substitute `new` for `old` in the member list.
            pub fn replace(&mut self, old: PropertyKey, new: PropertyKey) {
                if let Some(slot) = self.properties.iter_mut().find(|p| **p == old) {
                    *slot = new;
                }
            }

            /// The index physically backing this key, if any.
            pub fn associated_index(&self) -> Option<IndexKey> {
                self.associated_index
            }

            /// Set or clear the associated index. No validation is done here.
            pub fn set_associated_index(&mut self, index: Option<IndexKey>) {
                self.associated_index = index;
            }
        }

        impl Clone for $name {
            fn clone(&self) -> Self {
                Self {
                    key: ConstraintKey::next(),
                    id: self.id,
                    name: self.name.clone(),
                    data_set_type: None,
                    properties: self.properties.clone(),
                    associated_index: self.associated_index,
                }
            }
        }
    };
}

key_constraint!(
    /// Primary key: ordered, duplicate-free list of properties. At most one per schema.
    PrimaryKey
);

key_constraint!(
    /// Unique key: ordered, duplicate-free list of properties.
    UniqueKey
);

/// Check constraint holding a free-form boolean expression.
#[derive(Debug)]
pub struct CheckConstraint {
    key: ConstraintKey,
    id: u32,
    name: String,
    data_set_type: Option<DataSetTypeKey>,
    expression: String,
}

impl CheckConstraint {
    /// Create a check constraint.
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            key: ConstraintKey::next(),
            id: 0,
            name: name.into(),
            data_set_type: None,
            expression: expression.into(),
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
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

    /// The owning schema, if attached.
    pub fn data_set_type(&self) -> Option<DataSetTypeKey> {
        self.data_set_type
    }

    pub(crate) fn set_data_set_type(&mut self, data_set_type: Option<DataSetTypeKey>) {
        self.data_set_type = data_set_type;
    }

    /// The boolean expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Set the expression.
    pub fn set_expression(&mut self, expression: impl Into<String>) {
        self.expression = expression.into();
    }
}

impl Clone for CheckConstraint {
    fn clone(&self) -> Self {
        Self {
            key: ConstraintKey::next(),
            id: self.id,
            name: self.name.clone(),
            data_set_type: None,
            expression: self.expression.clone(),
        }
    }
}

/// Any of the four constraint kinds, owned.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Primary key.
    PrimaryKey(PrimaryKey),
    /// Foreign key.
    ForeignKey(ForeignKey),
    /// Unique key.
    UniqueKey(UniqueKey),
    /// Check constraint.
    Check(CheckConstraint),
}

/// Any of the four constraint kinds, borrowed from a schema.
#[derive(Debug, Clone, Copy)]
pub enum ConstraintRef<'a> {
    /// Primary key.
    PrimaryKey(&'a PrimaryKey),
    /// Foreign key.
    ForeignKey(&'a ForeignKey),
    /// Unique key.
    UniqueKey(&'a UniqueKey),
    /// Check constraint.
    Check(&'a CheckConstraint),
}

impl Constraint {
    /// Borrow as a [`ConstraintRef`].
    pub fn as_view(&self) -> ConstraintRef<'_> {
        match self {
            Constraint::PrimaryKey(c) => ConstraintRef::PrimaryKey(c),
            Constraint::ForeignKey(c) => ConstraintRef::ForeignKey(c),
            Constraint::UniqueKey(c) => ConstraintRef::UniqueKey(c),
            Constraint::Check(c) => ConstraintRef::Check(c),
        }
    }

    /// Get the constraint kind.
    pub fn constraint_type(&self) -> ConstraintType {
        self.as_view().constraint_type()
    }

    /// Get the identity handle.
    pub fn key(&self) -> ConstraintKey {
        self.as_view().key()
    }

    /// Get the constraint name.
    pub fn name(&self) -> &str {
        match self {
            Constraint::PrimaryKey(c) => c.name(),
            Constraint::ForeignKey(c) => c.name(),
            Constraint::UniqueKey(c) => c.name(),
            Constraint::Check(c) => c.name(),
        }
    }

    /// Get the user-facing id.
    pub fn id(&self) -> u32 {
        self.as_view().id()
    }

    /// Get the owning schema.
    pub fn data_set_type(&self) -> Option<DataSetTypeKey> {
        self.as_view().data_set_type()
    }
}

impl<'a> ConstraintRef<'a> {
    /// Get the constraint kind.
    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            ConstraintRef::PrimaryKey(_) => ConstraintType::PrimaryKey,
            ConstraintRef::ForeignKey(_) => ConstraintType::ForeignKey,
            ConstraintRef::UniqueKey(_) => ConstraintType::UniqueKey,
            ConstraintRef::Check(_) => ConstraintType::Check,
        }
    }

    /// Get the identity handle.
    pub fn key(&self) -> ConstraintKey {
        match self {
            ConstraintRef::PrimaryKey(c) => c.key(),
            ConstraintRef::ForeignKey(c) => c.key(),
            ConstraintRef::UniqueKey(c) => c.key(),
            ConstraintRef::Check(c) => c.key(),
        }
    }

    /// Get the constraint name.
    pub fn name(&self) -> &'a str {
        match *self {
            ConstraintRef::PrimaryKey(c) => c.name(),
            ConstraintRef::ForeignKey(c) => c.name(),
            ConstraintRef::UniqueKey(c) => c.name(),
            ConstraintRef::Check(c) => c.name(),
        }
    }

    /// Get the user-facing id.
    pub fn id(&self) -> u32 {
        match self {
            ConstraintRef::PrimaryKey(c) => c.id(),
            ConstraintRef::ForeignKey(c) => c.id(),
            ConstraintRef::UniqueKey(c) => c.id(),
            ConstraintRef::Check(c) => c.id(),
        }
    }

    /// Get the owning schema.
    pub fn data_set_type(&self) -> Option<DataSetTypeKey> {
        match self {
            ConstraintRef::PrimaryKey(c) => c.data_set_type(),
            ConstraintRef::ForeignKey(c) => c.data_set_type(),
            ConstraintRef::UniqueKey(c) => c.data_set_type(),
            ConstraintRef::Check(c) => c.data_set_type(),
        }
    }
}

impl From<PrimaryKey> for Constraint {
    fn from(pk: PrimaryKey) -> Self {
        Constraint::PrimaryKey(pk)
    }
}

impl From<ForeignKey> for Constraint {
    fn from(fk: ForeignKey) -> Self {
        Constraint::ForeignKey(fk)
    }
}

impl From<UniqueKey> for Constraint {
    fn from(uk: UniqueKey) -> Self {
        Constraint::UniqueKey(uk)
    }
}

impl From<CheckConstraint> for Constraint {
    fn from(cc: CheckConstraint) -> Self {
        Constraint::Check(cc)
    }
}
