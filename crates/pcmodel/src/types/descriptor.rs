// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Closed taxonomy of field types as the persistence layer sees them.

use super::kind::PrimitiveKind;
use std::fmt;
use std::sync::Arc;

/// Name used for element/key/value types that cannot be determined.
pub const OBJECT_CLASS: &str = "java.lang.Object";

/// A field type classified for persistence.
///
/// Descriptors are handed out as `Arc<TypeDescriptor>` by the
/// [`TypeRegistry`](super::TypeRegistry); within one registry each distinct
/// raw type maps to exactly one allocation, so `Arc::ptr_eq` is a valid
/// identity test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// Boxed counterpart of a primitive. `primitive` is always
    /// `Primitive(kind)`.
    Wrapper {
        kind: PrimitiveKind,
        primitive: Arc<TypeDescriptor>,
    },
    /// Immutable non persistence-capable type. `known` is set for types on
    /// the built-in or configured allow-lists.
    ValueClass {
        name: Arc<str>,
        orderable: bool,
        known: bool,
    },
    Array {
        element: Arc<TypeDescriptor>,
    },
    Collection {
        name: Arc<str>,
        element: Arc<TypeDescriptor>,
    },
    Map {
        name: Arc<str>,
        key: Arc<TypeDescriptor>,
        value: Arc<TypeDescriptor>,
    },
    /// Single-valued link to a persistence-capable class, by name only.
    Reference {
        class_name: Arc<str>,
    },
    /// Not yet determined. Never escapes the registry.
    Unknown,
}

impl TypeDescriptor {
    /// Canonical type name, generic arguments included.
    pub fn name(&self) -> String {
        self.to_string()
    }

    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    pub const fn is_wrapper(&self) -> bool {
        matches!(self, Self::Wrapper { .. })
    }

    /// Primitive, wrapper or value class.
    pub const fn is_value(&self) -> bool {
        matches!(
            self,
            Self::Primitive(_) | Self::Wrapper { .. } | Self::ValueClass { .. }
        )
    }

    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    /// Collection, array or map.
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Array { .. } | Self::Collection { .. } | Self::Map { .. }
        )
    }

    pub fn is_orderable(&self) -> bool {
        match self {
            Self::Primitive(kind) | Self::Wrapper { kind, .. } => kind.is_orderable(),
            Self::ValueClass { orderable, .. } => *orderable,
            Self::Array { .. }
            | Self::Collection { .. }
            | Self::Map { .. }
            | Self::Reference { .. }
            | Self::Unknown => false,
        }
    }

    /// Name of the persistence-capable class this descriptor links to.
    pub fn related_class(&self) -> Option<&str> {
        match self {
            Self::Reference { class_name } => Some(class_name),
            _ => None,
        }
    }

    /// Whether a field of this type can link to a persistence-capable class,
    /// directly or through its element, key or value type.
    pub fn is_relationship_target(&self) -> bool {
        match self {
            Self::Reference { .. } => true,
            Self::Array { element } | Self::Collection { element, .. } => element.is_reference(),
            Self::Map { key, value, .. } => key.is_reference() || value.is_reference(),
            _ => false,
        }
    }

    /// Element type of arrays and collections, value type of maps.
    pub fn element(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::Array { element } | Self::Collection { element, .. } => Some(element),
            Self::Map { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The primitive a wrapper boxes.
    pub fn wrapped_primitive(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::Wrapper { primitive, .. } => Some(primitive),
            _ => None,
        }
    }

    /// True when neither this descriptor nor any nested one is `Unknown`.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Unknown => false,
            Self::Primitive(_) | Self::ValueClass { .. } | Self::Reference { .. } => true,
            Self::Wrapper { primitive, .. } => primitive.is_terminal(),
            Self::Array { element } | Self::Collection { element, .. } => element.is_terminal(),
            Self::Map { key, value, .. } => key.is_terminal() && value.is_terminal(),
        }
    }

    /// Whether a field of this type is persistent unless declared otherwise.
    pub fn is_default_persistent(&self) -> bool {
        match self {
            Self::Primitive(_)
            | Self::Wrapper { .. }
            | Self::Reference { .. }
            | Self::Collection { .. }
            | Self::Map { .. } => true,
            Self::ValueClass { known, .. } => *known,
            Self::Array { element } => element.is_default_persistent(),
            Self::Unknown => false,
        }
    }

    /// The value class standing in for an undetermined type.
    pub(crate) fn object() -> Self {
        Self::ValueClass {
            name: Arc::from(OBJECT_CLASS),
            orderable: false,
            known: false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => f.write_str(kind.keyword()),
            Self::Wrapper { kind, .. } => f.write_str(kind.wrapper_name()),
            Self::ValueClass { name, .. } => f.write_str(name),
            Self::Array { element } => write!(f, "{}[]", element),
            Self::Collection { name, element } => write!(f, "{}<{}>", name, element),
            Self::Map { name, key, value } => write!(f, "{}<{}, {}>", name, key, value),
            Self::Reference { class_name } => f.write_str(class_name),
            Self::Unknown => f.write_str("<unknown>"),
        }
    }
}
