//! Stable identity handles.
//!
//! Every schema, property, constraint, index, sequence and catalog gets a
//! process-unique key when it is constructed. Keys never change and are
//! never reused, so they can be stored in reverse indexes without being
//! invalidated by container mutation. They are unrelated to the user-facing
//! `id` attributes, which remain freely assignable.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

fn next_key() -> u64 {
    NEXT_KEY.fetch_add(1, Ordering::Relaxed)
}

macro_rules! define_key {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub(crate) fn next() -> Self {
                Self(next_key())
            }

            /// Raw handle value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

define_key!(
    /// Identity of a [`DataSetType`](super::DataSetType).
    DataSetTypeKey,
    "data_set_type"
);
define_key!(
    /// Identity of a [`Property`](super::Property).
    PropertyKey,
    "property"
);
define_key!(
    /// Identity of a primary key, unique key, check constraint or foreign key.
    ConstraintKey,
    "constraint"
);
define_key!(
    /// Identity of an [`Index`](super::Index).
    IndexKey,
    "index"
);
define_key!(
    /// Identity of a [`Sequence`](super::Sequence).
    SequenceKey,
    "sequence"
);
define_key!(
    /// Identity of a [`DataSourceCatalog`](super::DataSourceCatalog).
    CatalogKey,
    "catalog"
);
