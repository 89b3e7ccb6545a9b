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

use anyhow::Result;
use noctua_core::asset::{AssetRecord, AssetType};
use noctua_core::storage::StorageBackend;
use noctua_data::assets::{AssetPatch, RegisterAsset, Registry};
use noctua_data::storage::FileStorage;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_registry_survives_a_restart_on_disk() -> Result<()> {
    // --- 1. Setup: a file-backed registry in a temp directory ---
    let dir = tempdir()?;
    let backend: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(dir.path().join("state"))?);

    // --- 2. First "session": register and mutate ---
    {
        let mut registry = Registry::open(backend.clone(), "assets");
        assert!(registry.register(
            "club-stage",
            RegisterAsset {
                category: Some("environment".to_string()),
                size: 4_200_000,
                format: "glb".to_string(),
                license: "CC-BY".to_string(),
                source: "PolyBazaar".to_string(),
                dependencies: vec!["stage-diffuse".to_string()],
                tags: vec!["stage".to_string()],
                description: "Main stage geometry".to_string(),
                ..RegisterAsset::new(AssetType::Model3d, "models/club-stage.glb")
            },
        ));
        assert!(registry.register(
            "stage-diffuse",
            RegisterAsset {
                size: 900_000,
                format: "png".to_string(),
                ..RegisterAsset::new(AssetType::Texture, "textures/stage-diffuse.png")
            },
        ));
        assert!(registry.add_usage("club-stage", "main-scene"));
        assert!(registry.update(
            "stage-diffuse",
            AssetPatch {
                category: Some("environment".to_string()),
                ..AssetPatch::default()
            },
        ));
    }

    // --- 3. Second "session": reload from the same backend ---
    let registry = Registry::open(backend.clone(), "assets");
    assert_eq!(registry.len(), 2);

    let stage = registry.get("club-stage").expect("record survived");
    assert_eq!(stage.used_in, vec!["main-scene"]);
    assert_eq!(stage.dependencies, vec!["stage-diffuse"]);

    let diffuse = registry.get_by_path("textures/stage-diffuse.png").unwrap();
    assert_eq!(diffuse.id, "stage-diffuse");
    assert_eq!(diffuse.category, "environment");

    // Indices were rebuilt from the persisted records.
    assert_eq!(registry.get_by_type(AssetType::Model3d).len(), 1);
    assert_eq!(registry.get_by_category("environment").len(), 2);

    // Stats were persisted alongside the records.
    assert_eq!(registry.stats().total_assets, 2);
    assert_eq!(registry.stats().total_size, 5_100_000);
    Ok(())
}

#[test]
fn test_corrupt_blob_starts_empty() -> Result<()> {
    let dir = tempdir()?;
    let backend: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(dir.path())?);
    backend
        .write("assets", "{ this is not a registry document")
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let registry = Registry::open(backend, "assets");
    assert!(registry.is_empty(), "corrupt state is discarded, not fatal");
    Ok(())
}

#[test]
fn test_export_import_across_backends() -> Result<()> {
    let dir = tempdir()?;
    let backend: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(dir.path())?);

    let mut source = Registry::open(backend, "assets");
    source.register(
        "kick",
        RegisterAsset {
            size: 120_000,
            format: "wav".to_string(),
            ..RegisterAsset::new(AssetType::Audio, "audio/kick.wav")
        },
    );

    let mut target = Registry::in_memory();
    target.import(&source.export())?;

    let before: Vec<AssetRecord> = source.get_all().into_iter().cloned().collect();
    let after: Vec<AssetRecord> = target.get_all().into_iter().cloned().collect();
    assert_eq!(before, after);
    Ok(())
}
