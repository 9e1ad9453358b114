// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Persistent class construction.
//!
//! A [`PersistentClassBuilder`] runs one build session. The requested class
//! and every persistence-capable class it needs (superclasses, classes named
//! by relationship fields) are reserved as placeholders before their fields
//! are resolved, then built from a work queue. A field that names a class
//! already reserved in the session only records the name, which is how
//! self-references and mutually referencing classes terminate.
//!
//! The session owns its classes until [`build`](PersistentClassBuilder::build)
//! returns. Nothing is visible to other readers until the caller publishes
//! the returned classes, and any error discards the whole session.

use super::class::{PersistentClass, PersistentField};
use super::modifier::PersistenceModifier;
use super::relationship::RelationshipClassifier;
use crate::error::{ModelError, Result};
use crate::source::{ClassIntrospection, DeclaredFacts, MetadataSource, RawClassFacts};
use crate::types::TypeRegistry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

const MAX_HIERARCHY_DEPTH: usize = 256;

/// Lookup of classes already published in the owning model.
pub type PublishedLookup<'a> = &'a dyn Fn(&str) -> Option<Arc<PersistentClass>>;

enum Slot {
    /// Reserved name; fields not resolved yet.
    Placeholder,
    Built(Arc<PersistentClass>),
}

/// Classes produced by one successful build session.
#[derive(Debug)]
pub struct BuildOutcome {
    /// The class that was asked for.
    pub requested: Arc<PersistentClass>,
    /// Every class built in the session, requested class first. Empty when
    /// the requested class was already published.
    pub classes: Vec<Arc<PersistentClass>>,
}

/// Builds persistent classes for one model.
pub struct PersistentClassBuilder<'a> {
    registry: &'a TypeRegistry,
    metadata: &'a dyn MetadataSource,
    published: PublishedLookup<'a>,
    load_external: bool,
    slots: HashMap<Arc<str>, Slot>,
    order: Vec<Arc<str>>,
    pending: VecDeque<Arc<str>>,
}

impl<'a> PersistentClassBuilder<'a> {
    /// `load_external` decides whether `metadata` is consulted for every
    /// class built in this session.
    pub fn new(
        registry: &'a TypeRegistry,
        metadata: &'a dyn MetadataSource,
        published: PublishedLookup<'a>,
        load_external: bool,
    ) -> Self {
        Self {
            registry,
            metadata,
            published,
            load_external,
            slots: HashMap::new(),
            order: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Build `class_name` and its closure.
    ///
    /// Returns `Ok(None)` when the class exists but is not
    /// persistence-capable.
    pub fn build(mut self, class_name: &str) -> Result<Option<BuildOutcome>> {
        if let Some(existing) = (self.published)(class_name) {
            return Ok(Some(BuildOutcome {
                requested: existing,
                classes: Vec::new(),
            }));
        }

        let raw = self.introspection().raw_facts(class_name)?;
        if !raw.persistence_capable {
            log::debug!(
                "[PersistentClassBuilder::build] {} is not persistence-capable",
                class_name
            );
            return Ok(None);
        }

        let root: Arc<str> = Arc::from(class_name);
        self.reserve(&root);
        // root is built from the facts already fetched
        self.pending.pop_front();
        self.build_class(&root, raw)?;

        while let Some(name) = self.pending.pop_front() {
            let raw = self.introspection().raw_facts(&name)?;
            self.build_class(&name, raw)?;
        }

        self.check_inheritance()?;

        let mut classes = Vec::with_capacity(self.order.len());
        for name in &self.order {
            match self.slots.remove(name) {
                Some(Slot::Built(class)) => classes.push(class),
                // every reserved name is either built or the session has failed
                Some(Slot::Placeholder) | None => {
                    return Err(ModelError::ClassNotFound {
                        class: name.to_string(),
                    })
                }
            }
        }

        log::debug!(
            "[PersistentClassBuilder::build] {} built with {} class(es) in session",
            class_name,
            classes.len()
        );
        let requested = classes.first().cloned().ok_or_else(|| ModelError::ClassNotFound {
            class: class_name.to_string(),
        })?;
        Ok(Some(BuildOutcome { requested, classes }))
    }

    fn introspection(&self) -> &'a Arc<dyn ClassIntrospection> {
        self.registry.introspection()
    }

    // Reserve a slot unless the class is already published or in this session.
    fn reserve(&mut self, name: &Arc<str>) {
        if self.slots.contains_key(name) || (self.published)(name).is_some() {
            return;
        }
        log::trace!("[PersistentClassBuilder::reserve] placeholder for {}", name);
        self.slots.insert(Arc::clone(name), Slot::Placeholder);
        self.order.push(Arc::clone(name));
        self.pending.push_back(Arc::clone(name));
    }

    fn build_class(&mut self, name: &Arc<str>, raw: RawClassFacts) -> Result<()> {
        let superclass = self.persistent_superclass(name, &raw)?;
        if let Some(superclass) = &superclass {
            self.reserve(superclass);
        }

        let declared = self.declared_facts(name)?;
        let classifier = RelationshipClassifier::new(self.registry);
        let mut fields = Vec::with_capacity(raw.fields.len());
        let mut keys: Vec<(Option<u32>, usize, Arc<str>)> = Vec::new();

        for (number, raw_field) in raw.fields.iter().enumerate() {
            let in_field = |err: ModelError| err.in_field(name, &raw_field.name);
            let ty = self.registry.resolve(&raw_field.raw_type).map_err(in_field)?;
            let facts = declared.as_ref().and_then(|d| d.fields.get(&raw_field.name));

            let key_field = facts.is_some_and(|f| f.key_field || f.key_ordinal.is_some());

            let modifier = match (&declared, facts.map(|f| f.persistence_modifier)) {
                (None, _) => PersistenceModifier::introspection_default(raw_field.modifiers),
                // identifier fields are stored whatever their type
                (Some(_), None | Some(PersistenceModifier::Unspecified)) if key_field => {
                    PersistenceModifier::Persistent
                }
                (Some(_), None | Some(PersistenceModifier::Unspecified)) => {
                    PersistenceModifier::default_for(raw_field.modifiers, &ty)
                }
                (Some(_), Some(explicit)) => explicit,
            };
            if key_field && !modifier.may_be_persistent() {
                return Err(in_field(ModelError::inconsistent(format!(
                    "key field declared {modifier}"
                ))));
            }

            let relationship = if modifier.may_be_persistent() {
                Some(classifier.classify(&ty, facts).map_err(in_field)?)
            } else {
                None
            };

            if let Some(relationship) = &relationship {
                for related in relationship.related_classes() {
                    self.reserve(&Arc::from(related));
                }
            }

            let field_name: Arc<str> = Arc::from(raw_field.name.as_str());
            if key_field {
                keys.push((facts.and_then(|f| f.key_ordinal), number, Arc::clone(&field_name)));
            }

            fields.push(PersistentField {
                name: field_name,
                declaring_class: Arc::clone(name),
                field_number: number,
                ty,
                modifier,
                relationship,
                embedded: facts.is_some_and(|f| f.embedded),
                key_field,
            });
        }

        // explicit ordinals first, then declaration order; equal ordinals
        // keep declaration order
        keys.sort_by_key(|(ordinal, number, _)| (ordinal.is_none(), *ordinal, *number));

        let class = PersistentClass {
            name: Arc::clone(name),
            superclass,
            key_fields: keys.into_iter().map(|(_, _, field)| field).collect(),
            load_external_metadata: declared
                .as_ref()
                .map_or(self.load_external, |d| d.load_external_metadata),
            metadata_found: declared.is_some(),
            fields,
        };

        log::debug!(
            "[PersistentClassBuilder::build_class] {}: {} field(s), {} key field(s)",
            name,
            class.fields.len(),
            class.key_fields.len()
        );
        self.slots.insert(Arc::clone(name), Slot::Built(Arc::new(class)));
        Ok(())
    }

    fn declared_facts(&self, class_name: &str) -> Result<Option<DeclaredFacts>> {
        if !self.load_external {
            return Ok(None);
        }
        match self.metadata.declared_facts(class_name) {
            Ok(facts) => Ok(Some(facts)),
            Err(err) if err.is_recoverable() => {
                log::debug!(
                    "[PersistentClassBuilder::declared_facts] {}, using introspection defaults",
                    err
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    // Nearest persistence-capable ancestor. Plain intermediate classes are skipped.
    fn persistent_superclass(&self, class: &str, raw: &RawClassFacts) -> Result<Option<Arc<str>>> {
        let unresolved = |superclass: &str, reason: String| ModelError::UnresolvedSuperclass {
            class: class.to_string(),
            superclass: superclass.to_string(),
            reason,
        };

        let mut seen: HashSet<String> = HashSet::from([class.to_string()]);
        let mut next = raw.superclass.clone();
        while let Some(name) = next {
            if name.is_empty() {
                return Err(unresolved(&name, "empty superclass name".into()));
            }
            if !seen.insert(name.clone()) {
                return Err(unresolved(&name, "cyclic inheritance".into()));
            }
            if seen.len() > MAX_HIERARCHY_DEPTH {
                return Err(unresolved(&name, "inheritance chain too deep".into()));
            }
            let facts = self
                .introspection()
                .raw_facts(&name)
                .map_err(|err| unresolved(&name, err.to_string()))?;
            if facts.persistence_capable {
                return Ok(Some(Arc::from(name)));
            }
            next = facts.superclass;
        }
        Ok(None)
    }

    fn superclass_name(&self, class: &str) -> Option<Arc<str>> {
        match self.slots.get(class) {
            Some(Slot::Built(built)) => built.superclass.clone(),
            Some(Slot::Placeholder) => None,
            None => (self.published)(class).and_then(|c| c.superclass.clone()),
        }
    }

    // Persistence-capable superclass chains of this session must terminate.
    fn check_inheritance(&self) -> Result<()> {
        for name in &self.order {
            let mut seen: HashSet<Arc<str>> = HashSet::new();
            let mut current = Arc::clone(name);
            while let Some(superclass) = self.superclass_name(&current) {
                if !seen.insert(Arc::clone(&current)) || seen.len() > MAX_HIERARCHY_DEPTH {
                    return Err(ModelError::UnresolvedSuperclass {
                        class: name.to_string(),
                        superclass: superclass.to_string(),
                        reason: "cyclic inheritance".into(),
                    });
                }
                current = superclass;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::model::RelationshipMetadata;
    use crate::source::{DeclaredField, FieldModifiers, RawField, RawType, StaticClassSource};
    use crate::types::PrimitiveKind;

    fn no_published(_: &str) -> Option<Arc<PersistentClass>> {
        None
    }

    fn registry(source: &Arc<StaticClassSource>) -> TypeRegistry {
        TypeRegistry::new(&ModelConfig::default(), Arc::clone(source) as Arc<dyn ClassIntrospection>)
    }

    fn ty(text: &str) -> RawType {
        RawType::parse(text).unwrap()
    }

    fn build(source: &Arc<StaticClassSource>, class: &str, load_external: bool) -> Result<Option<BuildOutcome>> {
        let registry = registry(source);
        PersistentClassBuilder::new(&registry, source.as_ref(), &no_published, load_external).build(class)
    }

    #[test]
    fn self_reference_terminates() {
        let source = Arc::new(StaticClassSource::new().with_class(
            RawClassFacts::persistence_capable("A").field("parent", ty("A")),
        ));

        let outcome = build(&source, "A", true).unwrap().unwrap();
        assert_eq!(outcome.classes.len(), 1);

        let parent = outcome.requested.declared_field("parent").unwrap();
        assert_eq!(
            parent.relationship(),
            Some(&RelationshipMetadata::SingleReference {
                related_class: Arc::from("A")
            })
        );
    }

    #[test]
    fn mutual_references_build_in_one_session() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(RawClassFacts::persistence_capable("A").field("b", ty("B")))
                .with_class(RawClassFacts::persistence_capable("B").field("a", ty("A"))),
        );

        let outcome = build(&source, "A", true).unwrap().unwrap();
        let names: Vec<_> = outcome.classes.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["A", "B"]);

        let b = &outcome.classes[1];
        assert_eq!(
            b.declared_field("a").unwrap().relationship().unwrap().related_classes(),
            vec!["A"]
        );
    }

    #[test]
    fn missing_metadata_falls_back_to_introspection_defaults() {
        let constant = RawField::new("VERSION", ty("int")).with_modifiers(FieldModifiers {
            is_static: true,
            is_final: true,
            ..FieldModifiers::default()
        });
        let source = Arc::new(
            StaticClassSource::new().with_class(
                RawClassFacts::persistence_capable("A")
                    .field("count", ty("int"))
                    .field("tags", ty("java.util.List<java.lang.String>"))
                    .raw_field(constant),
            ),
        );

        let class = build(&source, "A", true).unwrap().unwrap().requested;
        assert!(!class.has_declared_metadata());
        assert!(class.load_external_metadata());

        let count = class.declared_field("count").unwrap();
        assert_eq!(count.persistence_modifier(), PersistenceModifier::PossiblyPersistent);
        assert_eq!(count.relationship(), Some(&RelationshipMetadata::None));

        let tags = class.declared_field("tags").unwrap();
        assert!(matches!(
            tags.relationship(),
            Some(RelationshipMetadata::CollectionOf { related_class: None, .. })
        ));

        let version = class.declared_field("VERSION").unwrap();
        assert_eq!(version.persistence_modifier(), PersistenceModifier::None);
        assert!(version.relationship().is_none());
    }

    #[test]
    fn unspecified_modifiers_get_type_defaults() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(
                    RawClassFacts::persistence_capable("A")
                        .field("id", ty("long"))
                        .field("blob", ty("com.acme.Opaque"))
                        .field("cache", ty("java.lang.String")),
                )
                .with_metadata(
                    "A",
                    DeclaredFacts::default()
                        .field("cache", DeclaredField::with_modifier(PersistenceModifier::Transactional)),
                ),
        );

        let class = build(&source, "A", true).unwrap().unwrap().requested;
        assert!(class.has_declared_metadata());
        assert_eq!(
            class.declared_field("id").unwrap().persistence_modifier(),
            PersistenceModifier::Persistent
        );
        assert_eq!(
            class.declared_field("blob").unwrap().persistence_modifier(),
            PersistenceModifier::None
        );

        let cache = class.declared_field("cache").unwrap();
        assert_eq!(cache.persistence_modifier(), PersistenceModifier::Transactional);
        assert!(cache.relationship().is_none());
        assert!(cache.is_managed());
    }

    #[test]
    fn disabled_external_metadata_skips_the_source() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(RawClassFacts::persistence_capable("A").field("id", ty("long")))
                .with_metadata(
                    "A",
                    DeclaredFacts::default().field("id", DeclaredField::persistent().key()),
                ),
        );

        let class = build(&source, "A", false).unwrap().unwrap().requested;
        assert!(!class.has_declared_metadata());
        assert!(!class.load_external_metadata());
        assert_eq!(class.key_field_names().count(), 0);
        assert_eq!(
            class.declared_field("id").unwrap().persistence_modifier(),
            PersistenceModifier::PossiblyPersistent
        );
    }

    #[test]
    fn key_fields_follow_ordinals_then_declaration() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(
                    RawClassFacts::persistence_capable("A")
                        .field("region", ty("java.lang.String"))
                        .field("serial", ty("long"))
                        .field("branch", ty("int"))
                        .field("name", ty("java.lang.String")),
                )
                .with_metadata(
                    "A",
                    DeclaredFacts::default()
                        .field("region", DeclaredField::persistent().key())
                        .field("serial", DeclaredField::persistent().key_ordinal(0))
                        .field("branch", DeclaredField::persistent().key()),
                ),
        );

        let class = build(&source, "A", true).unwrap().unwrap().requested;
        let keys: Vec<_> = class.key_field_names().collect();
        assert_eq!(keys, vec!["serial", "region", "branch"]);
        assert!(!class.declared_field("name").unwrap().is_key());
    }

    #[test]
    fn equal_key_ordinals_keep_declaration_order() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(
                    RawClassFacts::persistence_capable("A")
                        .field("b", ty("int"))
                        .field("a", ty("int"))
                        .field("c", ty("int")),
                )
                .with_metadata(
                    "A",
                    DeclaredFacts::default()
                        .field("b", DeclaredField::persistent().key_ordinal(1))
                        .field("a", DeclaredField::persistent().key_ordinal(1))
                        .field("c", DeclaredField::persistent().key_ordinal(0)),
                ),
        );

        let class = build(&source, "A", true).unwrap().unwrap().requested;
        let keys: Vec<_> = class.key_field_names().collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
    }

    #[test]
    fn unspecified_key_fields_are_persistent() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(
                    RawClassFacts::persistence_capable("A")
                        .field("handle", ty("com.acme.Opaque"))
                        .field("label", ty("java.lang.String")),
                )
                .with_metadata(
                    "A",
                    DeclaredFacts::default().field("handle", DeclaredField::default().key()),
                ),
        );

        let class = build(&source, "A", true).unwrap().unwrap().requested;
        let handle = class.declared_field("handle").unwrap();
        assert_eq!(handle.persistence_modifier(), PersistenceModifier::Persistent);
        assert!(handle.is_key());
        assert!(handle.relationship().is_some());
        assert_eq!(class.key_field_names().collect::<Vec<_>>(), vec!["handle"]);
    }

    #[test]
    fn non_persistent_key_fields_are_rejected() {
        for modifier in [PersistenceModifier::Transactional, PersistenceModifier::None] {
            let source = Arc::new(
                StaticClassSource::new()
                    .with_class(RawClassFacts::persistence_capable("A").field("id", ty("long")))
                    .with_metadata(
                        "A",
                        DeclaredFacts::default()
                            .field("id", DeclaredField::with_modifier(modifier).key_ordinal(0)),
                    ),
            );

            let err = build(&source, "A", true).unwrap_err();
            assert!(
                matches!(err, ModelError::InField { ref class, ref field, .. } if class == "A" && field == "id"),
                "{modifier}: {err}"
            );
            assert!(matches!(
                err.root(),
                ModelError::InconsistentRelationshipDeclaration { .. }
            ));
        }
    }

    #[test]
    fn superclass_is_built_by_name() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(RawClassFacts::persistence_capable("Base").field("id", ty("long")))
                .with_class(RawClassFacts::plain("Middle").extends("Base"))
                .with_class(
                    RawClassFacts::persistence_capable("Leaf")
                        .extends("Middle")
                        .field("label", ty("java.lang.String")),
                ),
        );

        let outcome = build(&source, "Leaf", true).unwrap().unwrap();
        assert_eq!(outcome.requested.superclass_name(), Some("Base"));
        assert_eq!(outcome.requested.declared_fields().len(), 1);
        assert!(outcome.classes.iter().any(|c| c.name() == "Base"));
    }

    #[test]
    fn missing_superclass_is_unresolved() {
        let source = Arc::new(
            StaticClassSource::new().with_class(RawClassFacts::persistence_capable("A").extends("Gone")),
        );

        let err = build(&source, "A", true).unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnresolvedSuperclass { ref superclass, .. } if superclass == "Gone"
        ));
    }

    #[test]
    fn cyclic_inheritance_is_unresolved() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(RawClassFacts::persistence_capable("A").extends("B"))
                .with_class(RawClassFacts::persistence_capable("B").extends("A")),
        );

        let err = build(&source, "A", true).unwrap_err();
        assert!(matches!(err, ModelError::UnresolvedSuperclass { .. }));
    }

    #[test]
    fn field_errors_carry_context() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(
                    RawClassFacts::persistence_capable("A")
                        .field("ok", ty("int"))
                        .field("bad", RawType::named("")),
                ),
        );

        let err = build(&source, "A", true).unwrap_err();
        assert_eq!(err.to_string(), "A.bad: invalid type reference '': empty type name");
        assert!(matches!(err.root(), ModelError::InvalidTypeReference { .. }));
    }

    #[test]
    fn plain_classes_build_nothing() {
        let source = Arc::new(StaticClassSource::new().with_class(RawClassFacts::plain("P")));
        assert!(build(&source, "P", true).unwrap().is_none());

        let err = build(&source, "Nope", true).unwrap_err();
        assert!(matches!(err, ModelError::ClassNotFound { .. }));
    }

    #[test]
    fn published_classes_are_not_rebuilt() {
        let source = Arc::new(
            StaticClassSource::new()
                .with_class(RawClassFacts::persistence_capable("A").field("b", ty("B")))
                .with_class(RawClassFacts::persistence_capable("B").field("n", ty("short"))),
        );
        let registry = registry(&source);
        let b = PersistentClassBuilder::new(&registry, source.as_ref(), &no_published, true)
            .build("B")
            .unwrap()
            .unwrap()
            .requested;

        let lookup = |name: &str| (name == "B").then(|| Arc::clone(&b));
        let outcome = PersistentClassBuilder::new(&registry, source.as_ref(), &lookup, true)
            .build("A")
            .unwrap()
            .unwrap();
        assert_eq!(outcome.classes.len(), 1);

        let n = b.declared_field("n").unwrap();
        assert!(Arc::ptr_eq(n.ty(), &registry.primitive_of(PrimitiveKind::Short)));
    }
}
