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

use super::AssetType;
use serde::{Deserialize, Serialize};

/// Serializable metadata that describes an asset and its relationship to other assets.
///
/// This structure contains everything the registry, catalog, and recovery layers
/// need to manage an external resource without loading the actual data from disk
/// or network. It serves as the "identity card" for each asset and is the unit of
/// persistence in the registry document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// The unique, stable identifier for this asset. Caller-assigned, or
    /// derived from the source filename by tooling.
    pub id: String,

    /// The asset's category in the fixed type enumeration.
    #[serde(rename = "type")]
    pub asset_type: AssetType,

    /// The path or URL the asset is loaded from. Treated as a unique hint,
    /// not an enforced key; the registry documents the collision semantics.
    pub path: String,

    /// A free-form classification bucket (e.g. "environment", "sfx").
    #[serde(default = "default_category")]
    pub category: String,

    /// Size of the source file in bytes.
    #[serde(default)]
    pub size: u64,

    /// File-format tag (usually the lowercase extension, e.g. "glb").
    #[serde(default)]
    pub format: String,

    /// License identifier, as declared by the asset's source.
    #[serde(default)]
    pub license: String,

    /// Where the asset came from (marketplace, artist, tool).
    #[serde(default)]
    pub source: String,

    /// Ordered ids of other records this asset depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Locations in the product where the asset is used. Append-only and
    /// de-duplicated by the registry.
    #[serde(default)]
    pub used_in: Vec<String>,

    /// Semantic tags for querying and organization.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Creation timestamp, Unix epoch milliseconds.
    #[serde(default)]
    pub created_at: u64,

    /// Last-mutation timestamp, Unix epoch milliseconds.
    #[serde(default)]
    pub updated_at: u64,
}

fn default_category() -> String {
    "uncategorized".to_string()
}

impl AssetRecord {
    /// The category assigned when a caller does not provide one.
    pub const DEFAULT_CATEGORY: &'static str = "uncategorized";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serde_round_trip() {
        let record = AssetRecord {
            id: "club-stage".to_string(),
            asset_type: AssetType::Model3d,
            path: "models/club-stage.glb".to_string(),
            category: "environment".to_string(),
            size: 4_200_000,
            format: "glb".to_string(),
            license: "CC-BY".to_string(),
            source: "PolyBazaar".to_string(),
            dependencies: vec!["stage-diffuse".to_string()],
            used_in: vec!["main-scene".to_string()],
            tags: vec!["stage".to_string(), "night".to_string()],
            description: "Main stage geometry".to_string(),
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"3d-model\""), "wire tag missing: {json}");
        assert!(json.contains("\"usedIn\""), "camelCase field missing: {json}");

        let back: AssetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_missing_optional_fields_take_defaults() {
        let json = r#"{"id":"kick","type":"audio","path":"audio/kick.wav"}"#;
        let record: AssetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.category, AssetRecord::DEFAULT_CATEGORY);
        assert!(record.used_in.is_empty());
        assert_eq!(record.size, 0);
    }
}
