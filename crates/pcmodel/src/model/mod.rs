// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Persistent class model.
//!
//! A [`Model`] maps class names to fully built [`PersistentClass`] entries.
//! It starts empty and is filled lazily: the first request for a class runs a
//! build session under the model's build lock and publishes the whole
//! session at once. Readers never observe a half-built class.
//!
//! # Example
//!
//! ```
//! use pcmodel::model::Model;
//! use pcmodel::source::{RawClassFacts, RawType, StaticClassSource};
//! use pcmodel::ModelConfig;
//! use std::sync::Arc;
//!
//! let source = Arc::new(StaticClassSource::new().with_class(
//!     RawClassFacts::persistence_capable("com.acme.Node")
//!         .field("next", RawType::named("com.acme.Node")),
//! ));
//! let model = Model::new(&ModelConfig::default(), source.clone(), source, true);
//!
//! let node = model.class("com.acme.Node").unwrap().unwrap();
//! let next = node.declared_field("next").unwrap();
//! assert!(next.is_relationship());
//! ```

pub mod builder;
pub mod class;
pub mod modifier;
pub mod relationship;

pub use builder::{BuildOutcome, PersistentClassBuilder};
pub use class::{PersistentClass, PersistentField};
pub use modifier::PersistenceModifier;
pub use relationship::{RelationshipClassifier, RelationshipMetadata};

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::source::{ClassIntrospection, MetadataSource};
use crate::types::TypeRegistry;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Resolved persistent classes for one class source.
pub struct Model {
    registry: TypeRegistry,
    metadata: Arc<dyn MetadataSource>,
    load_external_default: bool,
    classes: RwLock<HashMap<Arc<str>, Arc<PersistentClass>>>,
    build_lock: Mutex<()>,
}

impl Model {
    pub fn new(
        config: &ModelConfig,
        introspection: Arc<dyn ClassIntrospection>,
        metadata: Arc<dyn MetadataSource>,
        load_external_default: bool,
    ) -> Self {
        Self {
            registry: TypeRegistry::new(config, introspection),
            metadata,
            load_external_default,
            classes: RwLock::new(HashMap::new()),
            build_lock: Mutex::new(()),
        }
    }

    /// The class named `name`, built on first request.
    ///
    /// Returns `Ok(None)` when the class exists but is not persistence-capable.
    pub fn class(&self, name: &str) -> Result<Option<Arc<PersistentClass>>> {
        self.class_with(name, self.load_external_default)
    }

    /// Like [`class`](Self::class) but overrides the model's default for
    /// consulting the metadata source. The flag only affects classes built by
    /// this call; classes already published are returned as they are.
    pub fn class_with(
        &self,
        name: &str,
        load_external: bool,
    ) -> Result<Option<Arc<PersistentClass>>> {
        if let Some(hit) = self.loaded_class(name) {
            return Ok(Some(hit));
        }

        let _building = self.build_lock.lock();
        // another caller may have published it while we waited
        if let Some(hit) = self.loaded_class(name) {
            return Ok(Some(hit));
        }

        let published = |class: &str| self.loaded_class(class);
        let Some(outcome) =
            PersistentClassBuilder::new(&self.registry, self.metadata.as_ref(), &published, load_external)
                .build(name)?
        else {
            return Ok(None);
        };

        let mut classes = self.classes.write();
        for class in outcome.classes {
            classes.entry(Arc::clone(&class.name)).or_insert(class);
        }
        log::debug!(
            "[Model::class_with] published {} ({} class(es) loaded)",
            name,
            classes.len()
        );
        Ok(Some(outcome.requested))
    }

    /// Published class, without building.
    pub fn loaded_class(&self, name: &str) -> Option<Arc<PersistentClass>> {
        self.classes.read().get(name).cloned()
    }

    /// Persistence-capable superclass of `class`.
    pub fn superclass(&self, class: &PersistentClass) -> Result<Option<Arc<PersistentClass>>> {
        match class.superclass_name() {
            Some(name) => self.class(name),
            None => Ok(None),
        }
    }

    /// `name` followed by its persistence-capable ancestors, nearest first.
    /// Empty when `name` is not persistence-capable.
    pub fn hierarchy(&self, name: &str) -> Result<Vec<Arc<PersistentClass>>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.class(name)?;

        while let Some(class) = current {
            if !seen.insert(Arc::clone(&class.name)) {
                return Err(ModelError::UnresolvedSuperclass {
                    class: name.to_string(),
                    superclass: class.name().to_string(),
                    reason: "cyclic inheritance".into(),
                });
            }
            current = self.superclass(&class)?;
            chain.push(class);
        }
        Ok(chain)
    }

    /// Managed fields of `name` including inherited ones, superclass fields
    /// first.
    pub fn managed_fields(&self, name: &str) -> Result<Vec<PersistentField>> {
        let chain = self.hierarchy(name)?;
        Ok(chain
            .iter()
            .rev()
            .flat_map(|class| class.managed_fields().cloned())
            .collect())
    }

    /// Field `field` declared by `class` or the nearest ancestor declaring it.
    pub fn find_field(&self, class: &str, field: &str) -> Result<Option<PersistentField>> {
        let chain = self.hierarchy(class)?;
        Ok(chain
            .iter()
            .find_map(|class| class.declared_field(field).cloned()))
    }

    /// Key fields of `name` across the hierarchy, root class keys first.
    pub fn identity_fields(&self, name: &str) -> Result<Vec<PersistentField>> {
        let chain = self.hierarchy(name)?;
        let mut keys = Vec::new();
        for class in chain.iter().rev() {
            for key in class.key_field_names() {
                if let Some(field) = class.declared_field(key) {
                    keys.push(field.clone());
                }
            }
        }
        Ok(keys)
    }

    /// Number of published classes.
    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }

    /// Names of published classes, sorted.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().map(|k| k.to_string()).collect();
        names.sort();
        names
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn load_external_metadata_default(&self) -> bool {
        self.load_external_default
    }

    /// Block until no build session is running, and keep new ones out while
    /// the guard is held.
    pub(crate) fn quiesce(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.build_lock.lock()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("classes", &self.class_count())
            .field("load_external_default", &self.load_external_default)
            .field("registry", &self.registry)
            .finish()
    }
}
