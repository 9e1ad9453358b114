// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Persistent class and field metadata.
//!
//! A `PersistentClass` holds its own declared fields only. The superclass is
//! kept by name and resolved through the owning [`Model`](super::Model), so
//! inherited fields are reached by walking the chain, never copied.

use super::modifier::PersistenceModifier;
use super::relationship::RelationshipMetadata;
use crate::types::TypeDescriptor;
use std::sync::Arc;

/// One declared field of a persistent class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentField {
    pub(crate) name: Arc<str>,
    pub(crate) declaring_class: Arc<str>,
    pub(crate) field_number: usize,
    pub(crate) ty: Arc<TypeDescriptor>,
    pub(crate) modifier: PersistenceModifier,
    pub(crate) relationship: Option<RelationshipMetadata>,
    pub(crate) embedded: bool,
    pub(crate) key_field: bool,
}

impl PersistentField {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the class declaring this field.
    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    /// Position among the declaring class's own fields.
    pub fn field_number(&self) -> usize {
        self.field_number
    }

    pub fn ty(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    pub fn persistence_modifier(&self) -> PersistenceModifier {
        self.modifier
    }

    /// Present exactly when the modifier is persistent or possibly-persistent.
    pub fn relationship(&self) -> Option<&RelationshipMetadata> {
        self.relationship.as_ref()
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn is_key(&self) -> bool {
        self.key_field
    }

    pub fn is_managed(&self) -> bool {
        !matches!(
            self.modifier,
            PersistenceModifier::None | PersistenceModifier::Unspecified
        )
    }

    pub fn is_relationship(&self) -> bool {
        self.relationship
            .as_ref()
            .is_some_and(RelationshipMetadata::is_relationship)
    }
}

/// Fully resolved metadata of one persistence-capable class.
#[derive(Debug, PartialEq, Eq)]
pub struct PersistentClass {
    pub(crate) name: Arc<str>,
    pub(crate) superclass: Option<Arc<str>>,
    pub(crate) fields: Vec<PersistentField>,
    pub(crate) key_fields: Vec<Arc<str>>,
    pub(crate) load_external_metadata: bool,
    pub(crate) metadata_found: bool,
}

impl PersistentClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Persistence-capable superclass, by name.
    pub fn superclass_name(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Own fields in declaration order.
    pub fn declared_fields(&self) -> &[PersistentField] {
        &self.fields
    }

    pub fn declared_field(&self, name: &str) -> Option<&PersistentField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Own fields participating in persistence.
    pub fn managed_fields(&self) -> impl Iterator<Item = &PersistentField> {
        self.fields.iter().filter(|f| f.is_managed())
    }

    pub fn relationship_fields(&self) -> impl Iterator<Item = &PersistentField> {
        self.fields.iter().filter(|f| f.is_relationship())
    }

    /// Own identity fields in key order.
    pub fn key_field_names(&self) -> impl Iterator<Item = &str> {
        self.key_fields.iter().map(|k| k.as_ref())
    }

    /// Whether the metadata source was consulted for this class.
    pub fn load_external_metadata(&self) -> bool {
        self.load_external_metadata
    }

    /// Whether the metadata source had a descriptor for this class.
    pub fn has_declared_metadata(&self) -> bool {
        self.metadata_found
    }
}
