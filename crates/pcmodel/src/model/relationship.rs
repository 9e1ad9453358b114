// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Relationship metadata and its classifier.
//!
//! The classifier decides, for one field, whether it is non-relational, a
//! single reference, a collection (arrays included) or a map, and which
//! element/key/value types and related classes apply. Rules are applied in
//! order and the first match wins:
//!
//! 1. embedded fields are non-relational
//! 2. references to persistence-capable classes
//! 3. collections and arrays
//! 4. maps
//! 5. everything else is non-relational
//!
//! Declared hints override the static element/key/value types, but must be
//! compatible with them and may only appear on fields of the matching shape.

use crate::error::{ModelError, Result};
use crate::source::{DeclaredField, RawType};
use crate::types::{TypeDescriptor, TypeRegistry};
use std::sync::Arc;

// Bound on superclass walks; inheritance chains are far shorter in practice.
const MAX_HIERARCHY_DEPTH: usize = 256;

/// How a persistent field relates to other persistence-capable classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipMetadata {
    /// Persistent but non-relational.
    None,
    SingleReference {
        related_class: Arc<str>,
    },
    CollectionOf {
        element: Arc<TypeDescriptor>,
        related_class: Option<Arc<str>>,
    },
    MapOf {
        key: Arc<TypeDescriptor>,
        value: Arc<TypeDescriptor>,
        related_key_class: Option<Arc<str>>,
        related_value_class: Option<Arc<str>>,
    },
}

impl RelationshipMetadata {
    pub const fn is_relationship(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Every persistence-capable class this relationship points at.
    pub fn related_classes(&self) -> Vec<&str> {
        match self {
            Self::None => Vec::new(),
            Self::SingleReference { related_class } => vec![related_class.as_ref()],
            Self::CollectionOf { related_class, .. } => {
                related_class.iter().map(|c| c.as_ref()).collect()
            }
            Self::MapOf {
                related_key_class,
                related_value_class,
                ..
            } => related_key_class
                .iter()
                .chain(related_value_class.iter())
                .map(|c| c.as_ref())
                .collect(),
        }
    }
}

fn related(ty: &TypeDescriptor) -> Option<Arc<str>> {
    match ty {
        TypeDescriptor::Reference { class_name } => Some(Arc::clone(class_name)),
        _ => None,
    }
}

/// Classifies fields against one registry.
pub struct RelationshipClassifier<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> RelationshipClassifier<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Classify a field given its raw declared type.
    pub fn classify_raw(
        &self,
        raw: &RawType,
        facts: Option<&DeclaredField>,
    ) -> Result<RelationshipMetadata> {
        let ty = self.registry.resolve(raw)?;
        self.classify(&ty, facts)
    }

    /// Classify a field whose type is already resolved.
    pub fn classify(
        &self,
        ty: &Arc<TypeDescriptor>,
        facts: Option<&DeclaredField>,
    ) -> Result<RelationshipMetadata> {
        let default_facts = DeclaredField::default();
        let facts = facts.unwrap_or(&default_facts);

        if facts.embedded {
            return Ok(RelationshipMetadata::None);
        }

        match ty.as_ref() {
            TypeDescriptor::Reference { class_name } => {
                Self::reject_hints(ty, facts, true, true)?;
                Ok(RelationshipMetadata::SingleReference {
                    related_class: Arc::clone(class_name),
                })
            }
            TypeDescriptor::Array { element } => {
                Self::reject_hints(ty, facts, false, true)?;
                // array components keep their primitive-ness
                let element =
                    self.hinted(facts.element_type_hint.as_deref(), element, false, "element")?;
                Ok(RelationshipMetadata::CollectionOf {
                    related_class: related(&element),
                    element,
                })
            }
            TypeDescriptor::Collection { element, .. } => {
                Self::reject_hints(ty, facts, false, true)?;
                let element =
                    self.hinted(facts.element_type_hint.as_deref(), element, true, "element")?;
                Ok(RelationshipMetadata::CollectionOf {
                    related_class: related(&element),
                    element,
                })
            }
            TypeDescriptor::Map { key, value, .. } => {
                Self::reject_hints(ty, facts, true, false)?;
                let key = self.hinted(facts.key_type_hint.as_deref(), key, true, "key")?;
                let value = self.hinted(facts.value_type_hint.as_deref(), value, true, "value")?;
                Ok(RelationshipMetadata::MapOf {
                    related_key_class: related(&key),
                    related_value_class: related(&value),
                    key,
                    value,
                })
            }
            TypeDescriptor::Primitive(_)
            | TypeDescriptor::Wrapper { .. }
            | TypeDescriptor::ValueClass { .. } => {
                Self::reject_hints(ty, facts, true, true)?;
                Ok(RelationshipMetadata::None)
            }
            TypeDescriptor::Unknown => Err(ModelError::invalid_type(
                ty.to_string(),
                "type was not resolved before classification",
            )),
        }
    }

    // Hints that make no sense for the field's shape are a declaration conflict.
    fn reject_hints(
        ty: &TypeDescriptor,
        facts: &DeclaredField,
        reject_element: bool,
        reject_key_value: bool,
    ) -> Result<()> {
        if reject_element {
            if let Some(hint) = &facts.element_type_hint {
                return Err(ModelError::inconsistent(format!(
                    "element type '{}' declared for non-collection type {}",
                    hint, ty
                )));
            }
        }
        if reject_key_value {
            if let Some(hint) = facts.key_type_hint.as_ref().or(facts.value_type_hint.as_ref()) {
                return Err(ModelError::inconsistent(format!(
                    "key/value type '{}' declared for non-map type {}",
                    hint, ty
                )));
            }
        }
        Ok(())
    }

    fn hinted(
        &self,
        hint: Option<&str>,
        declared: &Arc<TypeDescriptor>,
        boxed: bool,
        role: &str,
    ) -> Result<Arc<TypeDescriptor>> {
        let Some(hint) = hint else {
            return Ok(Arc::clone(declared));
        };

        let mut hinted = self.registry.resolve_name(hint)?;
        if boxed {
            hinted = self.registry.boxed(&hinted);
        }

        if !self.compatible(&hinted, declared) {
            return Err(ModelError::inconsistent(format!(
                "{} type '{}' is incompatible with declared {} type {}",
                role, hinted, role, declared
            )));
        }
        // a boxed restatement of the declared type keeps the declared form
        let same = self.registry.boxed(&hinted);
        let declared_boxed = self.registry.boxed(declared);
        if Arc::ptr_eq(&same, &declared_boxed) || same == declared_boxed {
            return Ok(Arc::clone(declared));
        }
        Ok(hinted)
    }

    fn compatible(&self, hint: &Arc<TypeDescriptor>, declared: &Arc<TypeDescriptor>) -> bool {
        let hint = self.registry.boxed(hint);
        let declared = self.registry.boxed(declared);
        if Arc::ptr_eq(&hint, &declared) || hint == declared {
            return true;
        }

        match declared.as_ref() {
            // Opaque static types (Object, interfaces) accept any object type.
            TypeDescriptor::ValueClass { known: false, .. } => hint.is_terminal(),
            TypeDescriptor::Reference { class_name } => hint
                .related_class()
                .is_some_and(|sub| self.is_subclass(sub, class_name)),
            _ => false,
        }
    }

    /// Whether `class` equals `ancestor` or inherits from it.
    pub fn is_subclass(&self, class: &str, ancestor: &str) -> bool {
        let introspection = self.registry.introspection();
        let mut current = Some(class.to_string());
        for _ in 0..MAX_HIERARCHY_DEPTH {
            match current {
                Some(name) if name == ancestor => return true,
                Some(name) => current = introspection.superclass_of(&name),
                None => return false,
            }
        }
        false
    }
}
