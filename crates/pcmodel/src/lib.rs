// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # pcmodel - Persistence-capable class model
//!
//! Builds and caches the persistence-relevant shape of user classes: every
//! field's type classified into a closed taxonomy, its persistence modifier,
//! and whether it is a single reference, a collection or a map of other
//! persistence-capable classes. Query engines, enhancers and datastore
//! mappers read this model instead of re-inspecting raw class structure.
//!
//! ## Quick Start
//!
//! ```rust
//! use pcmodel::{ClassSource, ModelCache, RelationshipMetadata};
//! use pcmodel::source::{RawClassFacts, RawType, StaticClassSource};
//! use std::sync::Arc;
//!
//! # fn main() -> pcmodel::Result<()> {
//! let source = Arc::new(
//!     StaticClassSource::new()
//!         .with_class(
//!             RawClassFacts::persistence_capable("com.acme.Emp")
//!                 .field("dept", RawType::named("com.acme.Dept")),
//!         )
//!         .with_class(
//!             RawClassFacts::persistence_capable("com.acme.Dept")
//!                 .field("staff", RawType::parse("java.util.List<com.acme.Emp>")?),
//!         ),
//! );
//!
//! let cache = ModelCache::default();
//! let model = cache.get(&ClassSource::from_static("app", source));
//!
//! let emp = model.class("com.acme.Emp")?.expect("persistence-capable");
//! let dept = emp.declared_field("dept").expect("declared");
//! assert!(matches!(
//!     dept.relationship(),
//!     Some(RelationshipMetadata::SingleReference { .. })
//! ));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  ModelCache        one Model per ClassSource key              |
//! +---------------------------------------------------------------+
//! |  Model             published PersistentClass map, build lock  |
//! |  Builder           build sessions with placeholders           |
//! +---------------------------------------------------------------+
//! |  Classifier        single reference / collection / map        |
//! |  TypeRegistry      canonical TypeDescriptor per raw type      |
//! +---------------------------------------------------------------+
//! |  ClassIntrospection + MetadataSource (host collaborators)     |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ModelCache`] | Keyed factory guaranteeing one live model per key |
//! | [`Model`] | Lazily built classes of one class source |
//! | [`PersistentClass`] | Own fields, key fields and superclass name of a class |
//! | [`TypeDescriptor`] | Closed taxonomy of field types |
//! | [`RelationshipMetadata`] | How a field links to other persistent classes |

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod source;
pub mod types;

pub use cache::{ClassSource, LookupStats, ModelCache};
pub use config::{ConfigError, ModelConfig};
pub use error::{ModelError, Result};
pub use model::{
    Model, PersistenceModifier, PersistentClass, PersistentField, RelationshipMetadata,
};
pub use source::{ClassIntrospection, MetadataSource};
pub use types::{PrimitiveKind, TypeDescriptor, TypeRegistry};
