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

//! # Noctua Data
//!
//! Data layouts and storage systems for the asset core: the authoritative
//! metadata [`Registry`](assets::Registry), the bounded LRU
//! [`AssetCache`](assets::AssetCache) of decoded payloads, the read-oriented
//! [`Catalog`](assets::Catalog) façade, and concrete persistence backends.

pub mod assets;
pub mod storage;

pub use assets::{AssetCache, CacheConfig, Catalog, Registry};
