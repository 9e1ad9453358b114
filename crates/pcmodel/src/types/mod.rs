// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type taxonomy for persistent fields.
//!
//! Provides `PrimitiveKind`, the closed `TypeDescriptor` variant set, and the
//! `TypeRegistry` that hands out one canonical descriptor per raw type.

pub mod descriptor;
pub mod kind;
pub mod registry;

pub use descriptor::{TypeDescriptor, OBJECT_CLASS};
pub use kind::PrimitiveKind;
pub use registry::TypeRegistry;

#[cfg(test)]
mod tests;
