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

//! The contract between the core and whatever actually fetches bytes.

use crate::asset::LoadedAsset;
use crate::error::LoadError;
use async_trait::async_trait;
use std::sync::Arc;

/// The contract collaborators implement to fetch and decode an asset.
///
/// The core never performs I/O itself; all transport and decoding lives
/// behind this trait. The recovery layer re-invokes the same loader on each
/// retry attempt, and the load coordinator invokes it at most once per key
/// across concurrent callers.
///
/// Implementations report failures as typed [`LoadError`] variants so the
/// recovery layer can route on the kind without inspecting message text.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Fetches and decodes the asset at `path`.
    async fn load(&self, path: &str) -> Result<Arc<dyn LoadedAsset>, LoadError>;
}
