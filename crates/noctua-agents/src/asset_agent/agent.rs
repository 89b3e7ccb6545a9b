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

//! The AssetAgent is the front door for loading: it consults the cache,
//! guarantees a key is never loaded twice concurrently, and hands failures
//! to the recovery agent. Collaborators call [`AssetAgent::get_or_load`]
//! and receive either a payload or a definitive `None`.

use crate::recovery_agent::{RecoveryAgent, RecoveryContext};
use noctua_core::asset::{AssetType, LoadedAsset};
use noctua_core::cancel::CancelToken;
use noctua_core::loader::AssetLoader;
use noctua_data::assets::{AssetCache, CacheStats};
use noctua_lanes::fallback_lane::FallbackContext;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-load settings handed to [`AssetAgent::get_or_load`].
pub struct LoadOptions<'a> {
    /// The asset's declared type; selects the fallback factory on failure.
    pub asset_type: Option<AssetType>,
    /// Environment for fallback construction.
    pub fallback: FallbackContext,
    /// Cancellation flag for the retry loop.
    pub cancel: Option<&'a CancelToken>,
}

impl Default for LoadOptions<'_> {
    fn default() -> Self {
        Self {
            asset_type: None,
            fallback: FallbackContext::new(),
            cancel: None,
        }
    }
}

impl<'a> LoadOptions<'a> {
    /// Options with nothing set: untyped load, no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the asset type used for fallback selection.
    pub fn with_asset_type(mut self, asset_type: AssetType) -> Self {
        self.asset_type = Some(asset_type);
        self
    }

    /// Sets the fallback environment.
    pub fn with_fallback(mut self, fallback: FallbackContext) -> Self {
        self.fallback = fallback;
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// The load coordinator composing the cache and the recovery agent.
pub struct AssetAgent {
    cache: Mutex<AssetCache>,
    recovery: RecoveryAgent,
    /// One gate per key currently loading. Guarded by a synchronous lock;
    /// the gates themselves are awaited.
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AssetAgent {
    /// Creates an agent over the given cache and recovery agent.
    pub fn new(cache: AssetCache, recovery: RecoveryAgent) -> Self {
        Self {
            cache: Mutex::new(cache),
            recovery,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached payload for `key`, or loads it.
    ///
    /// Concurrent calls for the same key share one loader invocation: the
    /// first caller loads while the rest wait on the key's gate and then hit
    /// the cache. A failed load is delegated to the recovery agent; a
    /// recovered payload (retried or substituted) is cached under the same
    /// key with the caller's `size_hint`.
    pub async fn get_or_load(
        &self,
        key: &str,
        size_hint: u64,
        loader: &dyn AssetLoader,
        options: LoadOptions<'_>,
    ) -> Option<Arc<dyn LoadedAsset>> {
        eprintln!("DBG get_or_load start {key}");
        if let Some(asset) = self.cache.lock().unwrap().get(key) {
            eprintln!("DBG cache hit early {key}");
            return Some(asset);
        }
        eprintln!("DBG after first cache check {key}");

        let gate = {
            let mut in_flight = self.in_flight.lock().unwrap();
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        eprintln!("DBG got gate arc {key}");
        let result = {
            let _guard = gate.lock().await;
            eprintln!("DBG acquired gate {key}");

            // Whoever held the gate before us may have finished the load.
            match self.cache.lock().unwrap().get(key) {
                Some(asset) => Some(asset),
                None => {
                    eprintln!("DBG before loader.load {key}");
                    let loaded = match loader.load(key).await {
                        Ok(asset) => Some(asset),
                        Err(error) => {
                            eprintln!("DBG loader err, handle_error {key}");
                            let ctx = RecoveryContext {
                                asset_type: options.asset_type,
                                loader: Some(loader),
                                fallback: options.fallback,
                                cancel: options.cancel,
                            };
                            self.recovery.handle_error(key, error, ctx).await
                        }
                    };
                    if let Some(asset) = &loaded {
                        self.cache
                            .lock()
                            .unwrap()
                            .insert(key, asset.clone(), size_hint);
                    }
                    loaded
                }
            }
        };

        // Retire the gate once nobody else holds it; stragglers that still
        // do will re-check the cache and find the payload.
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if let Some(current) = in_flight.get(key) {
                if Arc::ptr_eq(current, &gate) && Arc::strong_count(&gate) <= 2 {
                    in_flight.remove(key);
                }
            }
        }

        result
    }

    /// A snapshot of the underlying cache's counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().unwrap().stats()
    }

    /// Removes (and disposes) the cached payload for `key`.
    pub fn remove_cached(&self, key: &str) -> bool {
        self.cache.lock().unwrap().remove(key)
    }

    /// Disposes and drops every cached payload.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear()
    }

    /// The recovery agent, for listener registration and error queries.
    pub fn recovery(&self) -> &RecoveryAgent {
        &self.recovery
    }
}
