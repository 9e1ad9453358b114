// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-field persistence policy.

use crate::source::FieldModifiers;
use crate::types::TypeDescriptor;
use std::fmt;
use std::str::FromStr;

/// Whether and how a field participates in persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PersistenceModifier {
    #[default]
    Unspecified,
    None,
    Transactional,
    Persistent,
    PossiblyPersistent,
}

impl PersistenceModifier {
    /// Parse the descriptor spelling. Unknown or empty text is `Unspecified`.
    pub fn parse(text: &str) -> Self {
        match text {
            "none" => Self::None,
            "transactional" => Self::Transactional,
            "persistent" => Self::Persistent,
            "possibly-persistent" => Self::PossiblyPersistent,
            _ => Self::Unspecified,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::None => "none",
            Self::Transactional => "transactional",
            Self::Persistent => "persistent",
            Self::PossiblyPersistent => "possibly-persistent",
        }
    }

    /// Only these modifiers carry relationship metadata.
    pub const fn may_be_persistent(self) -> bool {
        matches!(self, Self::Persistent | Self::PossiblyPersistent)
    }

    /// Modifier for a field that metadata left unspecified.
    ///
    /// Static, final and transient fields are never persistent by default.
    /// Otherwise a field is persistent when its type is persistent by default.
    pub fn default_for(modifiers: FieldModifiers, ty: &TypeDescriptor) -> Self {
        if modifiers.is_static || modifiers.is_final || modifiers.is_transient {
            return Self::None;
        }
        if ty.is_default_persistent() {
            Self::Persistent
        } else {
            Self::None
        }
    }

    /// Modifier for a field known only through introspection.
    pub const fn introspection_default(modifiers: FieldModifiers) -> Self {
        if modifiers.is_static || modifiers.is_final {
            Self::None
        } else {
            Self::PossiblyPersistent
        }
    }
}

impl FromStr for PersistenceModifier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for PersistenceModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
