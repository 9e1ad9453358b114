// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive kinds and their wrapper class names.

/// The eight primitive kinds.
///
/// Each kind has exactly one wrapper class; [`PrimitiveKind::wrapper_name`]
/// and [`PrimitiveKind::from_wrapper_name`] are inverse of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Boolean,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Char,
        Self::Float,
        Self::Double,
    ];

    /// Source keyword (`"int"`, `"boolean"`, ...).
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Fully-qualified wrapper class name.
    pub const fn wrapper_name(self) -> &'static str {
        match self {
            Self::Boolean => "java.lang.Boolean",
            Self::Byte => "java.lang.Byte",
            Self::Short => "java.lang.Short",
            Self::Int => "java.lang.Integer",
            Self::Long => "java.lang.Long",
            Self::Char => "java.lang.Character",
            Self::Float => "java.lang.Float",
            Self::Double => "java.lang.Double",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }

    pub fn from_wrapper_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wrapper_name() == name)
    }

    /// Booleans have no natural order; every other kind does.
    pub const fn is_orderable(self) -> bool {
        !matches!(self, Self::Boolean)
    }

    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Boolean | Self::Char)
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_and_wrapper_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_keyword(kind.keyword()), Some(kind));
            assert_eq!(PrimitiveKind::from_wrapper_name(kind.wrapper_name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_keyword("Integer"), None);
        assert_eq!(PrimitiveKind::from_wrapper_name("int"), None);
    }

    #[test]
    fn index_matches_declaration_order() {
        for (idx, kind) in PrimitiveKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), idx);
        }
    }

    #[test]
    fn only_boolean_is_unordered() {
        let unordered: Vec<_> = PrimitiveKind::ALL
            .into_iter()
            .filter(|k| !k.is_orderable())
            .collect();
        assert_eq!(unordered, vec![PrimitiveKind::Boolean]);
    }
}
