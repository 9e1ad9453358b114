// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//! Tests for TypeRegistry.

use super::*;
use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::source::{RawClassFacts, RawType, StaticClassSource};
use std::sync::{Arc, Barrier};
use std::thread;

fn registry_with_classes() -> TypeRegistry {
    let source = StaticClassSource::new()
        .with_class(RawClassFacts::persistence_capable("com.acme.Employee"))
        .with_class(RawClassFacts::plain("com.acme.Helper"));
    TypeRegistry::new(&ModelConfig::default(), Arc::new(source))
}

#[test]
fn wrapper_primitive_bijection() {
    let registry = TypeRegistry::standalone();

    for kind in PrimitiveKind::ALL {
        let primitive = registry.resolve_name(kind.keyword()).expect("primitive");
        let wrapper = registry.resolve_name(kind.wrapper_name()).expect("wrapper");

        let corresponding = wrapper.wrapped_primitive().expect("wrapper boxes a primitive");
        assert!(Arc::ptr_eq(corresponding, &primitive));
        assert!(Arc::ptr_eq(&registry.boxed(&primitive), &wrapper));
        assert_eq!(*primitive, TypeDescriptor::Primitive(kind));
    }

    // distinct kinds never share a wrapper
    for a in PrimitiveKind::ALL {
        for b in PrimitiveKind::ALL {
            if a != b {
                assert!(!Arc::ptr_eq(&registry.wrapper_of(a), &registry.wrapper_of(b)));
            }
        }
    }
}

#[test]
fn repeated_resolution_returns_same_instance() {
    let registry = registry_with_classes();
    let names = [
        "java.lang.String",
        "com.acme.Employee",
        "com.acme.Helper",
        "java.util.List<java.lang.Short>",
        "java.util.Map<java.lang.String, com.acme.Employee>",
        "int[][]",
        "java.util.Set",
    ];

    for name in names {
        let first = registry.resolve_name(name).unwrap();
        let second = registry.resolve_name(name).unwrap();
        assert!(Arc::ptr_eq(&first, &second), "{name} resolved twice");
    }
}

#[test]
fn nested_types_share_canonical_descriptors() {
    let registry = registry_with_classes();

    let list = registry.resolve_name("java.util.List<java.lang.String>").unwrap();
    let set = registry.resolve_name("java.util.Set<java.lang.String>").unwrap();
    let string = registry.resolve_name("java.lang.String").unwrap();

    assert!(Arc::ptr_eq(list.element().unwrap(), &string));
    assert!(Arc::ptr_eq(set.element().unwrap(), &string));
}

#[test]
fn classifies_value_classes() {
    let registry = registry_with_classes();

    for name in ["java.lang.String", "java.math.BigDecimal", "java.util.Date"] {
        let ty = registry.resolve_name(name).unwrap();
        assert!(
            matches!(*ty, TypeDescriptor::ValueClass { orderable: true, known: true, .. }),
            "{name}"
        );
    }

    let locale = registry.resolve_name("java.util.Locale").unwrap();
    assert!(matches!(
        *locale,
        TypeDescriptor::ValueClass { orderable: false, known: true, .. }
    ));

    let helper = registry.resolve_name("com.acme.Helper").unwrap();
    assert!(matches!(
        *helper,
        TypeDescriptor::ValueClass { orderable: false, known: false, .. }
    ));
    assert_eq!(helper.name(), "com.acme.Helper");
}

#[test]
fn persistence_capable_names_resolve_to_references() {
    let registry = registry_with_classes();

    let employee = registry.resolve_name("com.acme.Employee").unwrap();
    assert_eq!(employee.related_class(), Some("com.acme.Employee"));
    assert!(employee.is_default_persistent());
}

#[test]
fn arrays_resolve_their_element() {
    let registry = registry_with_classes();

    let ty = registry
        .resolve(&RawType::array_of(RawType::named("com.acme.Employee")))
        .unwrap();
    let element = ty.element().expect("array element");
    assert!(element.is_reference());
    assert_eq!(ty.to_string(), "com.acme.Employee[]");

    let matrix = registry.resolve_name("double[][]").unwrap();
    let row = matrix.element().unwrap();
    assert!(Arc::ptr_eq(
        row.element().unwrap(),
        &registry.primitive_of(PrimitiveKind::Double)
    ));
}

#[test]
fn erased_containers_default_to_object() {
    let registry = TypeRegistry::standalone();

    let list = registry.resolve_name("java.util.ArrayList").unwrap();
    assert!(list.is_terminal());
    assert!(Arc::ptr_eq(list.element().unwrap(), &registry.object()));

    let map = registry.resolve_name("java.util.HashMap").unwrap();
    let TypeDescriptor::Map { key, value, .. } = map.as_ref() else {
        panic!("expected map, got {map}");
    };
    assert!(Arc::ptr_eq(key, &registry.object()));
    assert!(Arc::ptr_eq(value, &registry.object()));
    assert_eq!(map.name(), "java.util.HashMap<java.lang.Object, java.lang.Object>");
}

#[test]
fn generic_arity_is_checked() {
    let registry = TypeRegistry::standalone();

    let err = registry
        .resolve_name("java.util.Map<java.lang.String>")
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidTypeReference { .. }));

    let err = registry
        .resolve_name("java.util.List<java.lang.String, java.lang.String>")
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidTypeReference { .. }));

    let err = registry.resolve_name("int<java.lang.String>").unwrap_err();
    assert!(matches!(err, ModelError::InvalidTypeReference { .. }));
}

#[test]
fn empty_references_are_rejected() {
    let registry = TypeRegistry::standalone();

    assert!(matches!(
        registry.resolve(&RawType::named("")),
        Err(ModelError::InvalidTypeReference { .. })
    ));
    assert!(matches!(
        registry.resolve_name(""),
        Err(ModelError::InvalidTypeReference { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn other_generic_classes_use_their_erasure() {
    let registry = registry_with_classes();

    let erased = registry.resolve_name("com.acme.Employee").unwrap();
    let generic = registry
        .resolve_name("com.acme.Employee<java.lang.String>")
        .unwrap();
    assert!(Arc::ptr_eq(&erased, &generic));
}

#[test]
fn configured_types_extend_builtins() {
    let config = ModelConfig::default()
        .with_orderable_value_type("java.time.Instant")
        .with_collection_type("com.acme.Bag")
        .with_map_type("com.acme.Registry");
    let registry = TypeRegistry::new(&config, Arc::new(StaticClassSource::new()));

    let instant = registry.resolve_name("java.time.Instant").unwrap();
    assert!(instant.is_orderable());

    let bag = registry.resolve_name("com.acme.Bag<java.lang.Long>").unwrap();
    assert!(matches!(*bag, TypeDescriptor::Collection { .. }));
    assert!(registry.is_collection_name("java.util.List"));
    assert!(registry.is_map_name("com.acme.Registry"));
}

#[test]
fn concurrent_first_resolution_publishes_one_descriptor() {
    let registry = Arc::new(registry_with_classes());
    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();

    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            registry
                .resolve_name("java.util.Map<java.lang.String, com.acme.Employee>")
                .expect("resolve")
        }));
    }

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread should succeed"))
        .collect();
    for other in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], other));
    }
}
