//! Catalog configuration.

/// How much structural checking the catalog performs on insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Only the dependency checks every catalog performs (unique names/ids,
    /// registered referenced schemas, registered sequence owners).
    #[default]
    Permissive,
    /// Additionally reject foreign keys whose column lists are inconsistent
    /// and primary/unique keys whose associated index is missing or covers
    /// different properties.
    Strict,
}

impl ValidationMode {
    /// Check if strict validation is enabled.
    pub fn is_strict(&self) -> bool {
        matches!(self, ValidationMode::Strict)
    }
}

/// Configuration for a [`DataSourceCatalog`](crate::catalog::DataSourceCatalog).
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Validation strictness applied by `add` and the schema mutators.
    pub validation: ValidationMode,

    /// Accept foreign keys that reference the schema that owns them.
    pub allow_self_references: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            validation: ValidationMode::Permissive,
            allow_self_references: true,
        }
    }
}

impl CatalogConfig {
    /// Permissive configuration (the default).
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Strict configuration.
    pub fn strict() -> Self {
        Self {
            validation: ValidationMode::Strict,
            ..Default::default()
        }
    }

    /// Set the validation mode.
    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    /// Set whether self-referencing foreign keys are accepted.
    pub fn allow_self_references(mut self, allow: bool) -> Self {
        self.allow_self_references = allow;
        self
    }
}
