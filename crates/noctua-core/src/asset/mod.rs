// Copyright 2025 Noctua Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provides the foundational traits and primitive types for Noctua's asset system.
//!
//! This module defines the "common language" for all asset-related operations in the
//! toolkit. It contains the core contracts that other crates implement or consume,
//! but it has no knowledge of how assets are loaded, validated, or stored.
//!
//! The key components are:
//! - The [`LoadedAsset`] trait: the contract for decoded payloads held in memory.
//! - The [`Disposable`] capability: an opt-in hook for releasing external resources.
//! - [`AssetType`] and [`AssetRecord`]: the stable identity and metadata of an asset,
//!   independent of whether it is currently loaded.
//!
//! These low-level primitives are the foundation upon which the registry, cache,
//! and recovery systems are built in other crates.

mod draft;
mod record;
mod types;

pub use draft::*;
pub use record::*;
pub use types::*;

use std::any::Any;

/// An optional capability for payloads that hold external resources.
///
/// Cached or fallback objects may implement this trait to release resources
/// that Rust's ownership model cannot reclaim on its own (GPU buffers, audio
/// device handles, mapped memory). The cache invokes it exactly once per
/// entry, on removal, clearing, or eviction.
///
/// Presence is checked through [`LoadedAsset::as_disposable`], never through
/// ad hoc downcasting.
pub trait Disposable {
    /// Releases any external resources held by this object.
    ///
    /// Implementations must be idempotent: a second call must be a no-op.
    fn dispose(&self);
}

/// The contract for decoded asset payloads held by the in-memory cache.
///
/// The core never inspects payload contents; it moves them around as
/// `Arc<dyn LoadedAsset>`. Consumers that need the concrete type (a mesh, a
/// texture, an audio buffer) recover it through [`LoadedAsset::as_any`].
///
/// The supertraits enforce the safety guarantees the cache relies on:
/// - `Send` + `Sync`: payloads can be shared with background loaders.
/// - `'static`: payloads carry no borrowed data and can outlive their loader.
pub trait LoadedAsset: Send + Sync + 'static {
    /// Returns the payload as [`Any`] so callers can downcast to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Returns the payload's [`Disposable`] capability, if it has one.
    ///
    /// The default implementation reports no capability, which is correct for
    /// plain CPU-side data.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}
