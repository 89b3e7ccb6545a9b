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

use async_trait::async_trait;
use noctua_agents::asset_agent::{AssetAgent, LoadOptions};
use noctua_agents::recovery_agent::{RecoveryAgent, RetryPolicy};
use noctua_core::asset::{AssetType, LoadedAsset};
use noctua_core::error::LoadError;
use noctua_core::loader::AssetLoader;
use noctua_data::assets::AssetCache;
use noctua_lanes::fallback_lane::PlaceholderTexture;
use std::any::Any;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

// --- Test setup ---

struct TestPayload;

impl LoadedAsset for TestPayload {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Succeeds after a short (virtual) delay, counting invocations.
struct SlowLoader {
    calls: AtomicU32,
}

#[async_trait]
impl AssetLoader for SlowLoader {
    async fn load(&self, _path: &str) -> Result<Arc<dyn LoadedAsset>, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(Arc::new(TestPayload))
    }
}

/// Always fails with the given constructor, counting invocations.
struct ErrLoader {
    calls: AtomicU32,
    make: fn(&str) -> LoadError,
}

#[async_trait]
impl AssetLoader for ErrLoader {
    async fn load(&self, path: &str) -> Result<Arc<dyn LoadedAsset>, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.make)(path))
    }
}

fn agent() -> AssetAgent {
    AssetAgent::new(
        AssetCache::default(),
        RecoveryAgent::with_defaults(RetryPolicy::default()),
    )
}

// --- Tests ---

#[tokio::test(start_paused = true)]
async fn test_concurrent_loads_share_one_invocation() {
    let agent = agent();
    let loader = SlowLoader {
        calls: AtomicU32::new(0),
    };

    let (first, second) = tokio::join!(
        agent.get_or_load("models/stage.glb", 64, &loader, LoadOptions::new()),
        agent.get_or_load("models/stage.glb", 64, &loader, LoadOptions::new()),
    );

    assert!(first.is_some());
    assert!(second.is_some());
    assert_eq!(
        loader.calls.load(Ordering::SeqCst),
        1,
        "one in-flight load serves every concurrent caller"
    );

    let stats = agent.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.total_size, 64);
}

#[tokio::test]
async fn test_substituted_placeholder_is_cached() {
    let agent = agent();
    let loader = ErrLoader {
        calls: AtomicU32::new(0),
        make: |path| LoadError::Format {
            path: path.to_string(),
            detail: "bad magic".to_string(),
        },
    };
    let options = || LoadOptions::new().with_asset_type(AssetType::Texture);

    let first = agent
        .get_or_load("textures/neon.png", 4, &loader, options())
        .await
        .expect("format failures substitute a placeholder");
    assert!(first.as_any().downcast_ref::<PlaceholderTexture>().is_some());
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

    // The placeholder now serves from the cache.
    let second = agent
        .get_or_load("textures/neon.png", 4, &loader, options())
        .await;
    assert!(second.is_some());
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    assert!(agent.cache_stats().hits >= 1);

    // Dropping the cached entry forces a fresh load.
    assert!(agent.remove_cached("textures/neon.png"));
    agent.get_or_load("textures/neon.png", 4, &loader, options()).await;
    assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_hard_blocked_assets_are_not_cached() {
    let agent = agent();
    let loader = ErrLoader {
        calls: AtomicU32::new(0),
        make: |path| LoadError::Size {
            path: path.to_string(),
            actual: 99_000_000,
            limit: 25_000_000,
        },
    };

    let first = agent
        .get_or_load(
            "models/huge.glb",
            0,
            &loader,
            LoadOptions::new().with_asset_type(AssetType::Model3d),
        )
        .await;
    assert!(first.is_none());
    assert_eq!(agent.cache_stats().entries, 0, "absence is not cached");

    // Each request re-attempts the load; the recovery agent blocks it again.
    let second = agent
        .get_or_load(
            "models/huge.glb",
            0,
            &loader,
            LoadOptions::new().with_asset_type(AssetType::Model3d),
        )
        .await;
    assert!(second.is_none());
    assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    assert!(agent
        .recovery()
        .user_friendly_message("models/huge.glb")
        .is_some());
}
