// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical store of type descriptors.
//!
//! The registry resolves a [`RawType`] to exactly one shared
//! [`TypeDescriptor`] per registry instance. Entries are append-only: a
//! descriptor is never mutated or replaced once published. Concurrent first
//! resolutions of the same raw type may both build a descriptor; the first
//! insert wins and the loser's work is discarded, so every caller observes the
//! same `Arc`.

use super::descriptor::TypeDescriptor;
use super::kind::PrimitiveKind;
use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::source::{ClassIntrospection, RawType, StaticClassSource};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) const ORDERABLE_VALUE_TYPES: &[&str] = &[
    "java.lang.String",
    "java.math.BigDecimal",
    "java.math.BigInteger",
    "java.util.Date",
    "java.sql.Date",
    "java.sql.Time",
    "java.sql.Timestamp",
];

pub(crate) const VALUE_TYPES: &[&str] = &["java.util.Locale", "java.util.Currency"];

pub(crate) const COLLECTION_TYPES: &[&str] = &[
    "java.util.Collection",
    "java.util.List",
    "java.util.Set",
    "java.util.SortedSet",
    "java.util.ArrayList",
    "java.util.LinkedList",
    "java.util.Vector",
    "java.util.Stack",
    "java.util.HashSet",
    "java.util.LinkedHashSet",
    "java.util.TreeSet",
];

pub(crate) const MAP_TYPES: &[&str] = &[
    "java.util.Map",
    "java.util.SortedMap",
    "java.util.HashMap",
    "java.util.LinkedHashMap",
    "java.util.TreeMap",
    "java.util.Hashtable",
    "java.util.Properties",
];

/// Category of an erased type name, before persistence-capability is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameCategory {
    Primitive(PrimitiveKind),
    Wrapper(PrimitiveKind),
    Value { orderable: bool },
    Collection,
    Map,
    Other,
}

/// Per-instance canonical descriptor store.
pub struct TypeRegistry {
    introspection: Arc<dyn ClassIntrospection>,
    primitives: [Arc<TypeDescriptor>; 8],
    wrappers: [Arc<TypeDescriptor>; 8],
    object: Arc<TypeDescriptor>,
    orderable_values: HashSet<String>,
    values: HashSet<String>,
    collections: HashSet<String>,
    maps: HashSet<String>,
    descriptors: DashMap<RawType, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    /// Create a registry that asks `introspection` which classes are
    /// persistence-capable.
    pub fn new(config: &ModelConfig, introspection: Arc<dyn ClassIntrospection>) -> Self {
        let primitives = PrimitiveKind::ALL.map(|kind| Arc::new(TypeDescriptor::Primitive(kind)));
        let wrappers = PrimitiveKind::ALL.map(|kind| {
            Arc::new(TypeDescriptor::Wrapper {
                kind,
                primitive: Arc::clone(&primitives[kind.index()]),
            })
        });

        let table = |builtin: &[&str], extra: &[String]| -> HashSet<String> {
            builtin
                .iter()
                .map(|name| (*name).to_string())
                .chain(extra.iter().map(|name| name.trim().to_string()))
                .collect()
        };

        Self {
            introspection,
            primitives,
            wrappers,
            object: Arc::new(TypeDescriptor::object()),
            orderable_values: table(ORDERABLE_VALUE_TYPES, &config.orderable_value_types),
            values: table(VALUE_TYPES, &config.value_types),
            collections: table(COLLECTION_TYPES, &config.collection_types),
            maps: table(MAP_TYPES, &config.map_types),
            descriptors: DashMap::new(),
        }
    }

    /// Registry with default tables and no persistence-capable classes.
    pub fn standalone() -> Self {
        Self::new(&ModelConfig::default(), Arc::new(StaticClassSource::new()))
    }

    /// Resolve a raw type to its canonical descriptor, creating it on first use.
    pub fn resolve(&self, raw: &RawType) -> Result<Arc<TypeDescriptor>> {
        raw.validate()?;
        self.resolve_validated(raw)
    }

    /// Parse and resolve a textual type reference.
    pub fn resolve_name(&self, text: &str) -> Result<Arc<TypeDescriptor>> {
        self.resolve(&RawType::parse(text)?)
    }

    fn resolve_validated(&self, raw: &RawType) -> Result<Arc<TypeDescriptor>> {
        if let RawType::Named(name) = raw {
            match self.categorize(name) {
                NameCategory::Primitive(kind) => return Ok(self.primitive_of(kind)),
                NameCategory::Wrapper(kind) => return Ok(self.wrapper_of(kind)),
                _ => {}
            }
        }

        if let Some(hit) = self.descriptors.get(raw) {
            return Ok(Arc::clone(hit.value()));
        }

        let built = self.build(raw)?;
        let built = self.normalize(built);
        debug_assert!(built.is_terminal(), "registry must not publish Unknown");
        log::trace!("[TypeRegistry::resolve] miss for {} -> {}", raw, built);

        let entry = self.descriptors.entry(raw.clone()).or_insert(built);
        Ok(Arc::clone(entry.value()))
    }

    fn build(&self, raw: &RawType) -> Result<Arc<TypeDescriptor>> {
        match raw {
            RawType::Named(name) => Ok(self.build_named(name)),
            RawType::Array(component) => {
                let element = self.resolve_validated(component)?;
                Ok(Arc::new(TypeDescriptor::Array { element }))
            }
            RawType::Parameterized { base, args } => match self.categorize(base) {
                NameCategory::Collection => {
                    let [element] = args.as_slice() else {
                        return Err(ModelError::invalid_type(
                            raw.to_string(),
                            format!("collection takes 1 type argument, got {}", args.len()),
                        ));
                    };
                    Ok(Arc::new(TypeDescriptor::Collection {
                        name: Arc::from(base.as_str()),
                        element: self.resolve_validated(element)?,
                    }))
                }
                NameCategory::Map => {
                    let [key, value] = args.as_slice() else {
                        return Err(ModelError::invalid_type(
                            raw.to_string(),
                            format!("map takes 2 type arguments, got {}", args.len()),
                        ));
                    };
                    Ok(Arc::new(TypeDescriptor::Map {
                        name: Arc::from(base.as_str()),
                        key: self.resolve_validated(key)?,
                        value: self.resolve_validated(value)?,
                    }))
                }
                NameCategory::Primitive(_) | NameCategory::Wrapper(_) => Err(
                    ModelError::invalid_type(raw.to_string(), "type arguments on a non-generic type"),
                ),
                // Other generic classes are classified by their erasure.
                NameCategory::Value { .. } | NameCategory::Other => {
                    self.resolve_validated(&RawType::Named(base.clone()))
                }
            },
        }
    }

    fn build_named(&self, name: &str) -> Arc<TypeDescriptor> {
        let unknown = || Arc::new(TypeDescriptor::Unknown);
        let descriptor = match self.categorize(name) {
            NameCategory::Primitive(kind) => return self.primitive_of(kind),
            NameCategory::Wrapper(kind) => return self.wrapper_of(kind),
            NameCategory::Value { orderable } => TypeDescriptor::ValueClass {
                name: Arc::from(name),
                orderable,
                known: true,
            },
            // Erased containers: element types are determined later, if ever.
            NameCategory::Collection => TypeDescriptor::Collection {
                name: Arc::from(name),
                element: unknown(),
            },
            NameCategory::Map => TypeDescriptor::Map {
                name: Arc::from(name),
                key: unknown(),
                value: unknown(),
            },
            NameCategory::Other if name == super::descriptor::OBJECT_CLASS => {
                return Arc::clone(&self.object)
            }
            NameCategory::Other if self.introspection.is_persistence_capable(name) => {
                TypeDescriptor::Reference {
                    class_name: Arc::from(name),
                }
            }
            NameCategory::Other => TypeDescriptor::ValueClass {
                name: Arc::from(name),
                orderable: false,
                known: false,
            },
        };
        Arc::new(descriptor)
    }

    // Replace every Unknown with the canonical Object value class.
    fn normalize(&self, descriptor: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        if descriptor.is_terminal() {
            return descriptor;
        }
        match descriptor.as_ref() {
            TypeDescriptor::Unknown => Arc::clone(&self.object),
            TypeDescriptor::Array { element } => Arc::new(TypeDescriptor::Array {
                element: self.normalize(Arc::clone(element)),
            }),
            TypeDescriptor::Collection { name, element } => {
                Arc::new(TypeDescriptor::Collection {
                    name: Arc::clone(name),
                    element: self.normalize(Arc::clone(element)),
                })
            }
            TypeDescriptor::Map { name, key, value } => Arc::new(TypeDescriptor::Map {
                name: Arc::clone(name),
                key: self.normalize(Arc::clone(key)),
                value: self.normalize(Arc::clone(value)),
            }),
            TypeDescriptor::Primitive(_)
            | TypeDescriptor::Wrapper { .. }
            | TypeDescriptor::ValueClass { .. }
            | TypeDescriptor::Reference { .. } => descriptor,
        }
    }

    fn categorize(&self, name: &str) -> NameCategory {
        if let Some(kind) = PrimitiveKind::from_keyword(name) {
            NameCategory::Primitive(kind)
        } else if let Some(kind) = PrimitiveKind::from_wrapper_name(name) {
            NameCategory::Wrapper(kind)
        } else if self.orderable_values.contains(name) {
            NameCategory::Value { orderable: true }
        } else if self.values.contains(name) {
            NameCategory::Value { orderable: false }
        } else if self.collections.contains(name) {
            NameCategory::Collection
        } else if self.maps.contains(name) {
            NameCategory::Map
        } else {
            NameCategory::Other
        }
    }

    /// Precomputed primitive descriptor.
    pub fn primitive_of(&self, kind: PrimitiveKind) -> Arc<TypeDescriptor> {
        Arc::clone(&self.primitives[kind.index()])
    }

    /// Precomputed wrapper descriptor.
    pub fn wrapper_of(&self, kind: PrimitiveKind) -> Arc<TypeDescriptor> {
        Arc::clone(&self.wrappers[kind.index()])
    }

    /// The `java.lang.Object` value class used for undetermined types.
    pub fn object(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.object)
    }

    /// Wrapper for a primitive descriptor; any other descriptor is returned as is.
    pub fn boxed(&self, descriptor: &Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        match descriptor.as_ref() {
            TypeDescriptor::Primitive(kind) => self.wrapper_of(*kind),
            _ => Arc::clone(descriptor),
        }
    }

    pub fn is_collection_name(&self, name: &str) -> bool {
        self.collections.contains(name)
    }

    pub fn is_map_name(&self, name: &str) -> bool {
        self.maps.contains(name)
    }

    pub(crate) fn introspection(&self) -> &Arc<dyn ClassIntrospection> {
        &self.introspection
    }

    /// Number of cached non-primitive descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("descriptors", &self.descriptors.len())
            .field("collections", &self.collections.len())
            .field("maps", &self.maps.len())
            .finish()
    }
}
