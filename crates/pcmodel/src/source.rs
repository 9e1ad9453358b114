// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collaborator interfaces feeding the model.
//!
//! The core never reflects over classes itself. It consumes two kinds of
//! facts:
//!
//! - [`ClassIntrospection`]: structural facts (superclass, declared fields
//!   and their raw types) as the host environment sees them.
//! - [`MetadataSource`]: declared persistence facts (modifiers, embedding,
//!   element/key/value hints, identity fields) read from annotations or
//!   descriptor files.
//!
//! [`StaticClassSource`] implements both over in-memory tables and is what
//! tests and simple embedders use.

use crate::error::{ModelError, Result};
use crate::model::PersistenceModifier;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// RawType
// ---------------------------------------------------------------------------

/// A raw type reference as produced by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawType {
    /// A plain (possibly erased) type name: `int`, `java.lang.String`, `java.util.List`.
    Named(String),
    /// An array of the component type.
    Array(Box<RawType>),
    /// A generic type with its actual type arguments.
    Parameterized { base: String, args: Vec<RawType> },
}

impl RawType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn array_of(component: RawType) -> Self {
        Self::Array(Box::new(component))
    }

    pub fn generic(base: impl Into<String>, args: Vec<RawType>) -> Self {
        Self::Parameterized {
            base: base.into(),
            args,
        }
    }

    /// Parse the textual notation used by descriptors and hints:
    /// `"int[]"`, `"java.util.List<com.acme.Emp>"`,
    /// `"java.util.Map<java.lang.String, java.lang.Integer[]>"`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ModelError::invalid_type(text, "empty type reference"));
        }
        parse_type(trimmed).map_err(|reason| ModelError::invalid_type(text, reason))
    }

    /// Erased name of the outermost type; `None` for arrays.
    pub fn erased_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Parameterized { base, .. } => Some(base),
            Self::Array(_) => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Actual type arguments; empty for non-generic references.
    pub fn generic_args(&self) -> &[RawType] {
        match self {
            Self::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    /// Check that every name in the reference is well formed.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Named(name) => check_name(name).map_err(|r| ModelError::invalid_type(name, r)),
            Self::Array(component) => component.validate(),
            Self::Parameterized { base, args } => {
                check_name(base).map_err(|r| ModelError::invalid_type(base, r))?;
                if args.is_empty() {
                    return Err(ModelError::invalid_type(
                        self.to_string(),
                        "generic reference without type arguments",
                    ));
                }
                args.iter().try_for_each(RawType::validate)
            }
        }
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Array(component) => write!(f, "{}[]", component),
            Self::Parameterized { base, args } => {
                write!(f, "{}<", base)?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

fn parse_type(text: &str) -> std::result::Result<RawType, String> {
    let text = text.trim();
    if let Some(component) = text.strip_suffix("[]") {
        return Ok(RawType::array_of(parse_type(component)?));
    }

    let Some(open) = text.find('<') else {
        check_name(text)?;
        return Ok(RawType::named(text));
    };

    let Some(inner) = text[open + 1..].strip_suffix('>') else {
        return Err("unbalanced '<'".to_string());
    };
    let base = text[..open].trim();
    check_name(base)?;

    let args = split_top_level(inner)?
        .into_iter()
        .map(parse_type)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if args.is_empty() {
        return Err("generic reference without type arguments".to_string());
    }

    Ok(RawType::generic(base, args))
}

// Split on commas that are not nested inside angle brackets.
fn split_top_level(text: &str) -> std::result::Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (idx, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced '>'".to_string())?;
            }
            ',' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '<'".to_string());
    }

    let last = &text[start..];
    if !last.trim().is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    Ok(parts)
}

fn check_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("empty type name".to_string());
    }
    for segment in name.split('.') {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return Err(format!("empty segment in '{}'", name));
        };
        if !(first.is_alphabetic() || first == '_' || first == '$') {
            return Err(format!("segment '{}' must start with a letter", segment));
        }
        if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            return Err(format!("segment '{}' contains invalid characters", segment));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Introspection facts
// ---------------------------------------------------------------------------

/// Language-level modifiers of a declared field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldModifiers {
    pub is_static: bool,
    pub is_final: bool,
    pub is_transient: bool,
}

/// A declared field as introspection reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub raw_type: RawType,
    pub modifiers: FieldModifiers,
}

impl RawField {
    pub fn new(name: impl Into<String>, raw_type: RawType) -> Self {
        Self {
            name: name.into(),
            raw_type,
            modifiers: FieldModifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: FieldModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn is_array(&self) -> bool {
        self.raw_type.is_array()
    }

    pub fn generic_args(&self) -> &[RawType] {
        self.raw_type.generic_args()
    }
}

/// Structural facts about one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawClassFacts {
    pub name: String,
    pub superclass: Option<String>,
    /// Whether the host marks this class persistence-capable.
    pub persistence_capable: bool,
    /// Own fields in declaration order.
    pub fields: Vec<RawField>,
}

impl RawClassFacts {
    /// Facts for a persistence-capable class without fields.
    pub fn persistence_capable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            persistence_capable: true,
            fields: Vec::new(),
        }
    }

    /// Facts for a plain (non persistence-capable) class.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            persistence_capable: false,
            ..Self::persistence_capable(name)
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, raw_type: RawType) -> Self {
        self.fields.push(RawField::new(name, raw_type));
        self
    }

    pub fn raw_field(mut self, field: RawField) -> Self {
        self.fields.push(field);
        self
    }
}

/// Host-environment class introspection.
pub trait ClassIntrospection: Send + Sync {
    /// Structural facts for `class_name`, or [`ModelError::ClassNotFound`].
    fn raw_facts(&self, class_name: &str) -> Result<RawClassFacts>;

    /// Whether `class_name` names a persistence-capable class.
    fn is_persistence_capable(&self, class_name: &str) -> bool {
        self.raw_facts(class_name)
            .map(|facts| facts.persistence_capable)
            .unwrap_or(false)
    }

    /// Superclass name, or `None` for roots and unknown classes.
    fn superclass_of(&self, class_name: &str) -> Option<String> {
        self.raw_facts(class_name)
            .ok()
            .and_then(|facts| facts.superclass)
    }
}

// ---------------------------------------------------------------------------
// Declared metadata facts
// ---------------------------------------------------------------------------

/// Declared persistence facts for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredField {
    pub persistence_modifier: PersistenceModifier,
    pub embedded: bool,
    pub element_type_hint: Option<String>,
    pub key_type_hint: Option<String>,
    pub value_type_hint: Option<String>,
    /// Member of the object identifier.
    pub key_field: bool,
    /// Explicit position among identifier fields.
    pub key_ordinal: Option<u32>,
}

impl DeclaredField {
    pub fn with_modifier(modifier: PersistenceModifier) -> Self {
        Self {
            persistence_modifier: modifier,
            ..Self::default()
        }
    }

    pub fn persistent() -> Self {
        Self::with_modifier(PersistenceModifier::Persistent)
    }

    pub fn key(mut self) -> Self {
        self.key_field = true;
        self
    }

    pub fn key_ordinal(mut self, ordinal: u32) -> Self {
        self.key_field = true;
        self.key_ordinal = Some(ordinal);
        self
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn element_type(mut self, hint: impl Into<String>) -> Self {
        self.element_type_hint = Some(hint.into());
        self
    }

    pub fn key_type(mut self, hint: impl Into<String>) -> Self {
        self.key_type_hint = Some(hint.into());
        self
    }

    pub fn value_type(mut self, hint: impl Into<String>) -> Self {
        self.value_type_hint = Some(hint.into());
        self
    }
}

/// Declared persistence facts for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredFacts {
    /// Whether the descriptor was read from an external metadata file
    /// (as opposed to in-code annotations only).
    pub load_external_metadata: bool,
    pub fields: HashMap<String, DeclaredField>,
}

impl Default for DeclaredFacts {
    fn default() -> Self {
        Self {
            load_external_metadata: true,
            fields: HashMap::new(),
        }
    }
}

impl DeclaredFacts {
    pub fn field(mut self, name: impl Into<String>, field: DeclaredField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }
}

/// Source of declared persistence metadata.
pub trait MetadataSource: Send + Sync {
    /// Declared facts for `class_name`, or [`ModelError::MetadataNotFound`].
    fn declared_facts(&self, class_name: &str) -> Result<DeclaredFacts>;
}

// ---------------------------------------------------------------------------
// StaticClassSource
// ---------------------------------------------------------------------------

/// In-memory class and metadata tables.
#[derive(Debug, Default)]
pub struct StaticClassSource {
    classes: RwLock<HashMap<String, RawClassFacts>>,
    metadata: RwLock<HashMap<String, DeclaredFacts>>,
}

impl StaticClassSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) structural facts for a class.
    pub fn with_class(self, facts: RawClassFacts) -> Self {
        self.insert_class(facts);
        self
    }

    /// Add (or replace) declared facts for a class.
    pub fn with_metadata(self, class_name: impl Into<String>, facts: DeclaredFacts) -> Self {
        self.insert_metadata(class_name, facts);
        self
    }

    pub fn insert_class(&self, facts: RawClassFacts) {
        self.classes.write().insert(facts.name.clone(), facts);
    }

    pub fn insert_metadata(&self, class_name: impl Into<String>, facts: DeclaredFacts) {
        self.metadata.write().insert(class_name.into(), facts);
    }

    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }
}

impl ClassIntrospection for StaticClassSource {
    fn raw_facts(&self, class_name: &str) -> Result<RawClassFacts> {
        self.classes
            .read()
            .get(class_name)
            .cloned()
            .ok_or_else(|| ModelError::ClassNotFound {
                class: class_name.to_string(),
            })
    }

    fn is_persistence_capable(&self, class_name: &str) -> bool {
        self.classes
            .read()
            .get(class_name)
            .is_some_and(|facts| facts.persistence_capable)
    }
}

impl MetadataSource for StaticClassSource {
    fn declared_facts(&self, class_name: &str) -> Result<DeclaredFacts> {
        self.metadata
            .read()
            .get(class_name)
            .cloned()
            .ok_or_else(|| ModelError::MetadataNotFound {
                class: class_name.to_string(),
            })
    }
}
