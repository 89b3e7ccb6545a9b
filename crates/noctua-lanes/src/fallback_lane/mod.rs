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

//! Placeholder construction for assets that failed to load.
//!
//! A fallback is the cheapest payload that keeps a scene running: a unit
//! cube where a model should be, a neutral pixel where a texture should be,
//! a silent buffer where audio should be. Factories are registered per
//! asset type in a [`FallbackSet`]; the recovery agent asks the set to build
//! one when retries are exhausted or pointless.
//!
//! There is deliberately no shader fallback: a wrong shader corrupts the
//! whole frame, so absence is safer than substitution.

mod placeholders;

pub use placeholders::*;

use noctua_core::asset::{AssetType, LoadedAsset};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// A failure while constructing a fallback payload.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// No factory is registered for the asset type.
    #[error("no fallback is registered for {asset_type} assets")]
    Unsupported {
        /// The type that has no factory.
        asset_type: AssetType,
    },
    /// The factory ran but could not produce a payload.
    #[error("fallback construction failed: {detail}")]
    Construction {
        /// What went wrong.
        detail: String,
    },
}

/// An opaque key/value bag handed to factories at build time.
///
/// Carries whatever environment a placeholder needs — an audio output's
/// sample rate, a device capability flag — without the lane depending on
/// those systems. Values are stored type-erased and recovered by downcast,
/// the same way the agents keep heterogeneous storages.
#[derive(Clone, Default)]
pub struct FallbackContext {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl FallbackContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Returns the value under `key` if it exists and has type `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.values
            .get(key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }
}

/// A constructor of placeholder payloads for one asset type.
pub trait FallbackFactory: Send + Sync {
    /// Builds the placeholder.
    fn build(&self, ctx: &FallbackContext) -> Result<Arc<dyn LoadedAsset>, FallbackError>;
}

/// The per-type factory table.
#[derive(Default)]
pub struct FallbackSet {
    factories: HashMap<AssetType, Box<dyn FallbackFactory>>,
}

impl FallbackSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set with the built-in placeholders wired up: unit cube for
    /// models and animations, neutral pixel for textures and UI assets,
    /// silence for audio. Shaders stay uncovered.
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        set.register(AssetType::Model3d, PrimitiveMeshFallback);
        set.register(AssetType::Animation, PrimitiveMeshFallback);
        set.register(AssetType::Texture, NeutralTextureFallback);
        set.register(AssetType::UiAsset, NeutralTextureFallback);
        set.register(AssetType::Audio, SilentAudioFallback);
        set
    }

    /// Registers `factory` for `asset_type`, replacing any previous factory.
    pub fn register(&mut self, asset_type: AssetType, factory: impl FallbackFactory + 'static) {
        self.factories.insert(asset_type, Box::new(factory));
    }

    /// True when a factory is registered for the type.
    pub fn supports(&self, asset_type: AssetType) -> bool {
        self.factories.contains_key(&asset_type)
    }

    /// Builds a placeholder for `asset_type`.
    pub fn build_for(
        &self,
        asset_type: AssetType,
        ctx: &FallbackContext,
    ) -> Result<Arc<dyn LoadedAsset>, FallbackError> {
        self.factories
            .get(&asset_type)
            .ok_or(FallbackError::Unsupported { asset_type })?
            .build(ctx)
    }
}
