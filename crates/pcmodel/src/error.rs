// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for model construction.
//!
//! Every error that can escape `ModelCache::get_or_create`, `Model::class` or
//! the builder carries the class, field or type name needed to diagnose it
//! without re-running introspection.

use thiserror::Error;

/// Errors produced while resolving types, classifying relationships or
/// building persistent classes.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A raw type reference was empty or malformed.
    #[error("invalid type reference '{reference}': {reason}")]
    InvalidTypeReference { reference: String, reason: String },

    /// A declared element/key/value hint conflicts with the field's static shape.
    #[error("inconsistent relationship declaration: {reason}")]
    InconsistentRelationshipDeclaration { reason: String },

    /// The superclass named by introspection cannot be resolved.
    #[error("class '{class}': unresolved superclass '{superclass}' ({reason})")]
    UnresolvedSuperclass {
        class: String,
        superclass: String,
        reason: String,
    },

    /// The host environment does not know the class.
    #[error("class not found: {class}")]
    ClassNotFound { class: String },

    /// No metadata descriptor exists for the class. Recovered locally by the
    /// builder, which falls back to introspection-only defaults.
    #[error("no metadata found for class {class}")]
    MetadataNotFound { class: String },

    /// A key is already bound to a different live model.
    #[error("cache key '{key}' is already bound to a different model")]
    CacheKeyConflict { key: String },

    /// Failure raised while resolving a single field.
    #[error("{class}.{field}: {source}")]
    InField {
        class: String,
        field: String,
        #[source]
        source: Box<ModelError>,
    },
}

impl ModelError {
    pub(crate) fn invalid_type(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTypeReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn inconsistent(reason: impl Into<String>) -> Self {
        Self::InconsistentRelationshipDeclaration {
            reason: reason.into(),
        }
    }

    /// Attach the owning class and field to an error raised during field resolution.
    #[must_use]
    pub fn in_field(self, class: &str, field: &str) -> Self {
        match self {
            // already carries its own context
            err @ Self::InField { .. } => err,
            other => Self::InField {
                class: class.to_string(),
                field: field.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// True for errors the builder recovers from locally.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::MetadataNotFound { .. })
    }

    /// Innermost error, skipping field-context wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::InField { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ModelError>;
