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

//! The authoritative asset metadata store.
//!
//! The registry owns one [`AssetRecord`] per asset identity and keeps three
//! secondary indices (by type, by category, by path) exactly in sync with
//! the record set across every mutation. All metadata mutation goes through
//! the registry so the indices and the persisted document can never drift
//! from the records; callers receive references and clones, never writable
//! records.
//!
//! Durability is delegated to an injected [`StorageBackend`]. The in-memory
//! state is authoritative: a failed persist is logged and does not roll back
//! the mutation, matching the best-effort durability of the original
//! browser-storage design.

use crate::storage::MemoryStorage;
use noctua_core::asset::{AssetRecord, AssetType};
use noctua_core::storage::StorageBackend;
use noctua_core::utils::clock::now_millis;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// The storage key used when callers do not supply one.
pub const DEFAULT_STORAGE_KEY: &str = "noctua.asset-registry";

/// Aggregate statistics over the whole record set.
///
/// Recomputed from scratch on every mutation; never adjusted incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    /// Number of registered assets.
    pub total_assets: usize,
    /// Sum of all declared asset sizes, bytes.
    pub total_size: u64,
    /// Record count per asset type tag.
    #[serde(default)]
    pub by_type: BTreeMap<String, usize>,
    /// When the registry was last mutated, Unix epoch milliseconds.
    pub last_updated: u64,
}

/// The persisted registry document: one JSON blob holding every record plus
/// the aggregate stats.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    assets: Vec<AssetRecord>,
    stats: RegistryStats,
}

/// The metadata supplied when registering an asset.
///
/// The mandatory identity fields (`asset_type`, `path`) are present by
/// construction; everything else defaults.
#[derive(Debug, Clone)]
pub struct RegisterAsset {
    /// The asset's type.
    pub asset_type: AssetType,
    /// The path or URL the asset is loaded from.
    pub path: String,
    /// Classification bucket; `None` becomes the default category.
    pub category: Option<String>,
    /// Size of the source file in bytes.
    pub size: u64,
    /// File-format tag.
    pub format: String,
    /// License identifier.
    pub license: String,
    /// Where the asset came from.
    pub source: String,
    /// Ordered ids of records this asset depends on.
    pub dependencies: Vec<String>,
    /// Semantic tags.
    pub tags: Vec<String>,
    /// Human-readable description.
    pub description: String,
}

impl RegisterAsset {
    /// Creates a registration with the identity fields set and all optional
    /// metadata empty.
    pub fn new(asset_type: AssetType, path: impl Into<String>) -> Self {
        Self {
            asset_type,
            path: path.into(),
            category: None,
            size: 0,
            format: String::new(),
            license: String::new(),
            source: String::new(),
            dependencies: Vec::new(),
            tags: Vec::new(),
            description: String::new(),
        }
    }
}

/// A partial update applied to an existing record. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    /// New asset type, re-indexing the record.
    pub asset_type: Option<AssetType>,
    /// New path, re-indexing the record.
    pub path: Option<String>,
    /// New category, re-indexing the record.
    pub category: Option<String>,
    /// New size in bytes.
    pub size: Option<u64>,
    /// New format tag.
    pub format: Option<String>,
    /// New license identifier.
    pub license: Option<String>,
    /// New source.
    pub source: Option<String>,
    /// Replacement dependency list.
    pub dependencies: Option<Vec<String>>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// New description.
    pub description: Option<String>,
}

/// The error returned when importing a serialized registry document fails.
#[derive(Debug)]
pub enum RegistryError {
    /// The document was not valid JSON or did not match the expected layout.
    Parse {
        /// The deserializer's description of the problem.
        detail: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Parse { detail } => {
                write!(f, "registry document failed to parse: {detail}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// The authoritative metadata store with O(1) lookup by id and path and O(1)
/// membership lookup by type and category.
pub struct Registry {
    backend: Arc<dyn StorageBackend>,
    storage_key: String,
    records: HashMap<String, AssetRecord>,
    by_type: HashMap<AssetType, HashSet<String>>,
    by_category: HashMap<String, HashSet<String>>,
    by_path: HashMap<String, String>,
    stats: RegistryStats,
    revision: u64,
}

impl Registry {
    /// Opens a registry backed by `backend` under `storage_key`, reloading
    /// any previously persisted state.
    ///
    /// A missing blob starts the registry empty; a corrupt blob is logged
    /// and discarded rather than failing startup.
    pub fn open(backend: Arc<dyn StorageBackend>, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let mut registry = Self {
            backend,
            storage_key,
            records: HashMap::new(),
            by_type: HashMap::new(),
            by_category: HashMap::new(),
            by_path: HashMap::new(),
            stats: RegistryStats::default(),
            revision: 0,
        };
        registry.reload();
        registry
    }

    /// Creates a registry with no durability, for tests and ephemeral sessions.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY)
    }

    fn reload(&mut self) {
        let blob = match self.backend.read(&self.storage_key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return,
            Err(e) => {
                log::warn!("registry: failed to read persisted state: {e}");
                return;
            }
        };

        let document: RegistryDocument = match serde_json::from_str(&blob) {
            Ok(document) => document,
            Err(e) => {
                log::warn!("registry: discarding corrupt persisted state: {e}");
                return;
            }
        };

        for record in document.assets {
            self.index_record(&record);
            self.records.insert(record.id.clone(), record);
        }
        self.recompute_stats();
        log::info!(
            "registry: reloaded {} assets from '{}'",
            self.records.len(),
            self.storage_key
        );
    }

    /// Registers or replaces the record under `id` (upsert).
    ///
    /// Returns `false` without mutating anything when `id` or the metadata's
    /// `path` is empty. Re-registering an existing id updates the record in
    /// place, moving it between index buckets as needed.
    pub fn register(&mut self, id: &str, meta: RegisterAsset) -> bool {
        if id.trim().is_empty() {
            log::warn!("registry: refusing to register an empty id");
            return false;
        }
        if meta.path.trim().is_empty() {
            log::warn!("registry: refusing to register '{id}' without a path");
            return false;
        }

        let now = now_millis();
        let (created_at, used_in) = match self.records.remove(id) {
            Some(existing) => {
                self.unindex_record(&existing);
                (existing.created_at, existing.used_in)
            }
            None => (now, Vec::new()),
        };

        let record = AssetRecord {
            id: id.to_string(),
            asset_type: meta.asset_type,
            path: meta.path,
            category: meta
                .category
                .unwrap_or_else(|| AssetRecord::DEFAULT_CATEGORY.to_string()),
            size: meta.size,
            format: meta.format,
            license: meta.license,
            source: meta.source,
            dependencies: meta.dependencies,
            used_in,
            tags: meta.tags,
            description: meta.description,
            created_at,
            updated_at: now,
        };

        self.index_record(&record);
        self.records.insert(record.id.clone(), record);
        self.commit();
        true
    }

    /// Returns the record for `id`, if registered.
    pub fn get(&self, id: &str) -> Option<&AssetRecord> {
        self.records.get(id)
    }

    /// Returns the record owning `path`, if any.
    pub fn get_by_path(&self, path: &str) -> Option<&AssetRecord> {
        self.by_path.get(path).and_then(|id| self.records.get(id))
    }

    /// Returns every record of the given type, ordered by id.
    pub fn get_by_type(&self, asset_type: AssetType) -> Vec<&AssetRecord> {
        self.collect_ids(self.by_type.get(&asset_type))
    }

    /// Returns every record in the given category, ordered by id.
    pub fn get_by_category(&self, category: &str) -> Vec<&AssetRecord> {
        self.collect_ids(self.by_category.get(category))
    }

    fn collect_ids(&self, ids: Option<&HashSet<String>>) -> Vec<&AssetRecord> {
        let mut records: Vec<&AssetRecord> = ids
            .map(|ids| ids.iter().filter_map(|id| self.records.get(id)).collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Case-insensitive substring search over id, path, category,
    /// description, source, and tags. Results are ordered by id.
    pub fn search(&self, query: &str) -> Vec<&AssetRecord> {
        let needle = query.to_lowercase();
        let mut records: Vec<&AssetRecord> = self
            .records
            .values()
            .filter(|r| {
                r.id.to_lowercase().contains(&needle)
                    || r.path.to_lowercase().contains(&needle)
                    || r.category.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
                    || r.source.to_lowercase().contains(&needle)
                    || r.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Merges `patch` into the record under `id`.
    ///
    /// Returns `false` when `id` is unknown. Changing `asset_type`,
    /// `category`, or `path` moves the record between index buckets.
    pub fn update(&mut self, id: &str, patch: AssetPatch) -> bool {
        let Some(mut record) = self.records.remove(id) else {
            log::warn!("registry: cannot update unknown id '{id}'");
            return false;
        };
        self.unindex_record(&record);

        if let Some(asset_type) = patch.asset_type {
            record.asset_type = asset_type;
        }
        if let Some(path) = patch.path {
            record.path = path;
        }
        if let Some(category) = patch.category {
            record.category = category;
        }
        if let Some(size) = patch.size {
            record.size = size;
        }
        if let Some(format) = patch.format {
            record.format = format;
        }
        if let Some(license) = patch.license {
            record.license = license;
        }
        if let Some(source) = patch.source {
            record.source = source;
        }
        if let Some(dependencies) = patch.dependencies {
            record.dependencies = dependencies;
        }
        if let Some(tags) = patch.tags {
            record.tags = tags;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        record.updated_at = now_millis();

        self.index_record(&record);
        self.records.insert(record.id.clone(), record);
        self.commit();
        true
    }

    /// Records that the asset is used at `location`.
    ///
    /// Idempotent: a location already present is not appended again and does
    /// not touch the persisted state. Returns `false` for an unknown id.
    pub fn add_usage(&mut self, id: &str, location: &str) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if record.used_in.iter().any(|l| l == location) {
            return true;
        }
        record.used_in.push(location.to_string());
        record.updated_at = now_millis();
        self.commit();
        true
    }

    /// Removes the record under `id` and all of its index entries.
    pub fn unregister(&mut self, id: &str) -> bool {
        let Some(record) = self.records.remove(id) else {
            return false;
        };
        self.unindex_record(&record);
        self.commit();
        true
    }

    /// Every record, ordered by id.
    pub fn get_all(&self) -> Vec<&AssetRecord> {
        let mut records: Vec<&AssetRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Number of registered assets.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no assets are registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The current aggregate statistics.
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// A counter bumped by every successful mutation. Derived views use it
    /// to detect staleness cheaply.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Serializes the full registry document (records plus stats).
    pub fn export(&self) -> String {
        let document = RegistryDocument {
            assets: self.get_all().into_iter().cloned().collect(),
            stats: self.stats.clone(),
        };
        // The document always serializes: it is plain data with no maps
        // keyed by non-strings.
        serde_json::to_string_pretty(&document).unwrap_or_else(|e| {
            log::error!("registry: export serialization failed: {e}");
            String::from("{}")
        })
    }

    /// Replaces the entire registry state with the given document.
    ///
    /// Records are re-inserted one by one, rebuilding every index; their
    /// original timestamps are preserved. Returns the number of records
    /// imported.
    pub fn import(&mut self, json: &str) -> Result<usize, RegistryError> {
        let document: RegistryDocument =
            serde_json::from_str(json).map_err(|e| RegistryError::Parse {
                detail: e.to_string(),
            })?;

        self.records.clear();
        self.by_type.clear();
        self.by_category.clear();
        self.by_path.clear();

        let count = document.assets.len();
        for record in document.assets {
            self.index_record(&record);
            self.records.insert(record.id.clone(), record);
        }
        self.commit();
        Ok(count)
    }

    /// Adds `record` to all three indices. The path index is last-writer-wins:
    /// a path already owned by a different id is re-pointed at the new record,
    /// with a warning naming both owners.
    fn index_record(&mut self, record: &AssetRecord) {
        self.by_type
            .entry(record.asset_type)
            .or_default()
            .insert(record.id.clone());
        self.by_category
            .entry(record.category.clone())
            .or_default()
            .insert(record.id.clone());
        if let Some(previous) = self
            .by_path
            .insert(record.path.clone(), record.id.clone())
        {
            if previous != record.id {
                log::warn!(
                    "registry: path '{}' moved from '{previous}' to '{}'",
                    record.path,
                    record.id
                );
            }
        }
    }

    /// Removes `record` from all three indices, dropping empty buckets.
    fn unindex_record(&mut self, record: &AssetRecord) {
        if let Some(ids) = self.by_type.get_mut(&record.asset_type) {
            ids.remove(&record.id);
            if ids.is_empty() {
                self.by_type.remove(&record.asset_type);
            }
        }
        if let Some(ids) = self.by_category.get_mut(&record.category) {
            ids.remove(&record.id);
            if ids.is_empty() {
                self.by_category.remove(&record.category);
            }
        }
        // Only clear the path index if this record still owns the entry; a
        // later registration may have taken the path over.
        if self.by_path.get(&record.path) == Some(&record.id) {
            self.by_path.remove(&record.path);
        }
    }

    fn recompute_stats(&mut self) {
        let mut by_type = BTreeMap::new();
        let mut total_size = 0u64;
        for record in self.records.values() {
            *by_type.entry(record.asset_type.as_str().to_string()).or_insert(0) += 1;
            total_size += record.size;
        }
        self.stats = RegistryStats {
            total_assets: self.records.len(),
            total_size,
            by_type,
            last_updated: now_millis(),
        };
    }

    /// Finishes a mutation: fresh stats, revision bump, best-effort persist.
    fn commit(&mut self) {
        self.recompute_stats();
        self.revision += 1;
        let blob = self.export();
        if let Err(e) = self.backend.write(&self.storage_key, &blob) {
            log::error!("registry: failed to persist state: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(asset_type: AssetType, path: &str) -> RegisterAsset {
        RegisterAsset {
            size: 1024,
            format: "glb".to_string(),
            ..RegisterAsset::new(asset_type, path)
        }
    }

    #[test]
    fn test_register_rejects_empty_identity() {
        let mut registry = Registry::in_memory();
        assert!(!registry.register("", sample(AssetType::Model3d, "a.glb")));
        assert!(!registry.register("a", sample(AssetType::Model3d, "  ")));
        assert!(registry.is_empty());
        assert_eq!(registry.revision(), 0);
    }

    #[test]
    fn test_register_is_an_upsert() {
        let mut registry = Registry::in_memory();
        assert!(registry.register("stage", sample(AssetType::Model3d, "stage.glb")));
        let first_created = registry.get("stage").unwrap().created_at;

        assert!(registry.register("stage", sample(AssetType::Model3d, "stage.glb")));
        assert_eq!(registry.len(), 1, "re-registering must not duplicate");

        let record = registry.get("stage").unwrap();
        assert_eq!(record.created_at, first_created);
        assert!(record.updated_at >= first_created);
    }

    #[test]
    fn test_indices_follow_type_and_category_changes() {
        let mut registry = Registry::in_memory();
        registry.register("x", sample(AssetType::Texture, "x.png"));
        assert_eq!(registry.get_by_type(AssetType::Texture).len(), 1);

        let moved = registry.update(
            "x",
            AssetPatch {
                asset_type: Some(AssetType::UiAsset),
                category: Some("ui".to_string()),
                ..AssetPatch::default()
            },
        );
        assert!(moved);
        assert!(registry.get_by_type(AssetType::Texture).is_empty());
        assert_eq!(registry.get_by_type(AssetType::UiAsset).len(), 1);
        assert!(registry.get_by_category("uncategorized").is_empty());
        assert_eq!(registry.get_by_category("ui").len(), 1);
    }

    #[test]
    fn test_path_lookup_and_last_writer_wins() {
        let mut registry = Registry::in_memory();
        registry.register("a", sample(AssetType::Audio, "shared/path.ogg"));
        registry.register("b", sample(AssetType::Audio, "shared/path.ogg"));
        // Documented semantics: the path index now points at the most recent
        // registration; both records still exist.
        assert_eq!(registry.get_by_path("shared/path.ogg").unwrap().id, "b");
        assert_eq!(registry.len(), 2);

        // Unregistering the non-owner must not clear the index entry.
        registry.unregister("a");
        assert_eq!(registry.get_by_path("shared/path.ogg").unwrap().id, "b");
    }

    #[test]
    fn test_add_usage_is_idempotent() {
        let mut registry = Registry::in_memory();
        registry.register("kick", sample(AssetType::Audio, "kick.wav"));
        let before = registry.revision();

        assert!(registry.add_usage("kick", "intro-scene"));
        assert!(registry.add_usage("kick", "intro-scene"));
        assert_eq!(registry.get("kick").unwrap().used_in, vec!["intro-scene"]);
        // Second call was a no-op: exactly one revision bump.
        assert_eq!(registry.revision(), before + 1);

        assert!(!registry.add_usage("ghost", "nowhere"));
    }

    #[test]
    fn test_search_matches_tags_case_insensitively() {
        let mut registry = Registry::in_memory();
        let mut meta = sample(AssetType::Texture, "neon.png");
        meta.tags = vec!["Neon".to_string(), "glow".to_string()];
        registry.register("neon-sign", meta);

        assert_eq!(registry.search("NEON").len(), 1);
        assert_eq!(registry.search("glow").len(), 1);
        assert!(registry.search("absent").is_empty());
    }

    #[test]
    fn test_stats_recompute_on_every_mutation() {
        let mut registry = Registry::in_memory();
        registry.register("a", sample(AssetType::Model3d, "a.glb"));
        registry.register("b", sample(AssetType::Texture, "b.png"));
        assert_eq!(registry.stats().total_assets, 2);
        assert_eq!(registry.stats().total_size, 2048);
        assert_eq!(registry.stats().by_type.get("3d-model"), Some(&1));

        registry.unregister("a");
        assert_eq!(registry.stats().total_assets, 1);
        assert_eq!(registry.stats().total_size, 1024);
        assert_eq!(registry.stats().by_type.get("3d-model"), None);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut registry = Registry::in_memory();
        let mut meta = sample(AssetType::Model3d, "stage.glb");
        meta.dependencies = vec!["stage-diffuse".to_string()];
        registry.register("stage", meta);
        registry.register("stage-diffuse", sample(AssetType::Texture, "stage.png"));
        registry.add_usage("stage", "main-scene");

        let exported = registry.export();
        let mut restored = Registry::in_memory();
        assert_eq!(restored.import(&exported).unwrap(), 2);

        let before: Vec<AssetRecord> = registry.get_all().into_iter().cloned().collect();
        let after: Vec<AssetRecord> = restored.get_all().into_iter().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(restored.get_by_path("stage.glb").unwrap().id, "stage");
    }

    #[test]
    fn test_import_rejects_garbage() {
        let mut registry = Registry::in_memory();
        registry.register("keep", sample(AssetType::Shader, "glow.wgsl"));
        assert!(registry.import("not json").is_err());
        // A failed import must leave the previous state untouched.
        assert_eq!(registry.len(), 1);
    }
}
