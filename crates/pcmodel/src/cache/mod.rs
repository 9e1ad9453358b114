// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Keyed cache of models.
//!
//! `ModelCache` guarantees at most one live [`Model`] per [`ClassSource`].
//! Lookups take a shared read lock; the first request for a key re-checks
//! under the write lock before inserting, so concurrent first requests all
//! observe the same `Arc<Model>`.
//!
//! A model may be registered under several keys ([`ModelCache::alias`]).
//! [`ModelCache::remove_model`] drops every key bound to that instance.
//! Removal waits for any build session running on the model to finish, then
//! detaches it; later requests for the same key build a fresh model.

use crate::config::{ConfigError, ModelConfig};
use crate::error::{ModelError, Result};
use crate::model::Model;
use crate::source::{ClassIntrospection, MetadataSource, StaticClassSource};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Cache key: a named pair of introspection and metadata collaborators.
///
/// Equality and hashing use `id` only. Two sources with the same id are the
/// same key even if they carry different collaborator instances; the
/// collaborators of the source that created a model are the ones it uses.
#[derive(Clone)]
pub struct ClassSource {
    id: Arc<str>,
    introspection: Arc<dyn ClassIntrospection>,
    metadata: Arc<dyn MetadataSource>,
}

impl ClassSource {
    pub fn new(
        id: impl Into<Arc<str>>,
        introspection: Arc<dyn ClassIntrospection>,
        metadata: Arc<dyn MetadataSource>,
    ) -> Self {
        Self {
            id: id.into(),
            introspection,
            metadata,
        }
    }

    /// Key backed by one in-memory source serving both roles.
    pub fn from_static(id: impl Into<Arc<str>>, source: Arc<StaticClassSource>) -> Self {
        Self::new(id, source.clone(), source)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl PartialEq for ClassSource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassSource {}

impl Hash for ClassSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for ClassSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClassSource").field(&self.id).finish()
    }
}

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
}

/// Process-wide model cache. Create one at startup and share it.
pub struct ModelCache {
    config: ModelConfig,
    models: RwLock<HashMap<ClassSource, Arc<Model>>>,
    stats: RwLock<LookupStats>,
}

impl ModelCache {
    /// Cache using `config`, which is validated first.
    pub fn new(config: ModelConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: ModelConfig) -> Self {
        Self {
            config,
            models: RwLock::new(HashMap::new()),
            stats: RwLock::new(LookupStats::default()),
        }
    }

    /// Model for `source` using the configured metadata default.
    pub fn get(&self, source: &ClassSource) -> Arc<Model> {
        self.get_or_create(source, self.config.load_external_metadata_default)
    }

    /// Model bound to `source`, created empty on first request.
    ///
    /// `load_external_metadata` only applies when the model is created here;
    /// an existing model keeps its own default.
    pub fn get_or_create(&self, source: &ClassSource, load_external_metadata: bool) -> Arc<Model> {
        if let Some(hit) = self.lookup(source) {
            self.record_hit();
            return hit;
        }

        let mut models = self.models.write();
        if let Some(hit) = models.get(source) {
            self.record_hit();
            return Arc::clone(hit);
        }

        let model = Arc::new(self.new_model(source, load_external_metadata));
        models.insert(source.clone(), Arc::clone(&model));
        self.record_miss();
        log::debug!(
            "[ModelCache::get_or_create] created model for {} ({} key(s) cached)",
            source.id(),
            models.len()
        );
        model
    }

    /// Create a fresh model for `source`. Fails with
    /// [`ModelError::CacheKeyConflict`] when the key is already bound.
    pub fn create(&self, source: &ClassSource, load_external_metadata: bool) -> Result<Arc<Model>> {
        let mut models = self.models.write();
        if models.contains_key(source) {
            log::warn!("[ModelCache::create] key {} already bound", source.id());
            return Err(ModelError::CacheKeyConflict {
                key: source.id().to_string(),
            });
        }

        let model = Arc::new(self.new_model(source, load_external_metadata));
        models.insert(source.clone(), Arc::clone(&model));
        log::debug!("[ModelCache::create] created model for {}", source.id());
        Ok(model)
    }

    /// Register `model` under an additional key. Re-aliasing to the same
    /// model is a no-op.
    pub fn alias(&self, source: &ClassSource, model: &Arc<Model>) -> Result<()> {
        let mut models = self.models.write();
        match models.get(source) {
            Some(bound) if Arc::ptr_eq(bound, model) => Ok(()),
            Some(_) => {
                log::warn!(
                    "[ModelCache::alias] key {} is bound to a different model",
                    source.id()
                );
                Err(ModelError::CacheKeyConflict {
                    key: source.id().to_string(),
                })
            }
            None => {
                models.insert(source.clone(), Arc::clone(model));
                log::debug!("[ModelCache::alias] {} aliased", source.id());
                Ok(())
            }
        }
    }

    /// Model bound to `source`, without creating one.
    pub fn lookup(&self, source: &ClassSource) -> Option<Arc<Model>> {
        self.models.read().get(source).cloned()
    }

    /// Unbind `source`. Absent keys are a no-op.
    ///
    /// Waits for a build session running on the bound model before
    /// unbinding. Other aliases of that model stay bound.
    pub fn remove(&self, source: &ClassSource) -> Option<Arc<Model>> {
        let model = self.lookup(source)?;
        let _quiet = model.quiesce();

        let mut models = self.models.write();
        // rebound while we waited: leave the newer binding alone
        match models.get(source) {
            Some(bound) if Arc::ptr_eq(bound, &model) => {
                models.remove(source);
                log::debug!("[ModelCache::remove] removed key {}", source.id());
                Some(Arc::clone(&model))
            }
            _ => None,
        }
    }

    /// Unbind every key mapping to `model`. Returns how many keys were removed.
    ///
    /// Waits for a build session running on `model` first.
    pub fn remove_model(&self, model: &Arc<Model>) -> usize {
        let _quiet = model.quiesce();

        let mut models = self.models.write();
        let before = models.len();
        models.retain(|_, bound| !Arc::ptr_eq(bound, model));
        let removed = before - models.len();
        if removed > 0 {
            log::debug!("[ModelCache::remove_model] removed {} key(s)", removed);
        }
        removed
    }

    /// Drop every binding.
    pub fn clear(&self) {
        let models: Vec<Arc<Model>> = {
            let mut map = self.models.write();
            map.drain().map(|(_, model)| model).collect()
        };
        // let in-flight builds finish before the last handles go away
        for model in &models {
            drop(model.quiesce());
        }
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Number of distinct live models.
    pub fn model_count(&self) -> usize {
        let models = self.models.read();
        let mut distinct: Vec<*const Model> = models.values().map(Arc::as_ptr).collect();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn new_model(&self, source: &ClassSource, load_external_metadata: bool) -> Model {
        Model::new(
            &self.config,
            Arc::clone(&source.introspection),
            Arc::clone(&source.metadata),
            load_external_metadata,
        )
    }

    fn record_hit(&self) {
        let mut stats = self.stats.write();
        stats.hits = stats.hits.saturating_add(1);
    }

    fn record_miss(&self) {
        let mut stats = self.stats.write();
        stats.misses = stats.misses.saturating_add(1);
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::with_valid_config(ModelConfig::default())
    }
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("keys", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}
