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

//! The configurable rule tables driving the validation lane.
//!
//! Defaults cover the formats and ceilings the toolkit ships with; projects
//! override them from a TOML manifest:
//!
//! ```toml
//! [formats.texture]
//! allowed = ["png", "webp"]
//!
//! [formats.texture.advisories]
//! jpg = "lossy compression and no alpha channel"
//!
//! [[size_ceilings.texture]]
//! category = "default"
//! limit_bytes = 8388608
//!
//! [licenses]
//! families = ["CC0", "MIT"]
//! attribution_required = []
//! ```

use noctua_core::asset::AssetType;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// The error returned when a rules manifest cannot be parsed.
#[derive(Debug, Error)]
pub enum RulesError {
    /// The TOML text did not match the rules layout.
    #[error("failed to parse validation rules: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Allowed formats for one asset type, plus advisory notes for formats that
/// are permitted but carry a known drawback.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatRule {
    /// Lowercase format tags that pass the gate.
    pub allowed: Vec<String>,
    /// Advisory text per allowed format (e.g. "lossy, no alpha channel").
    #[serde(default)]
    pub advisories: HashMap<String, String>,
}

/// One named size ceiling. The first ceiling listed for a type is the
/// default when a draft's category matches none of them.
#[derive(Debug, Clone, Deserialize)]
pub struct SizeRule {
    /// The category this ceiling applies to.
    pub category: String,
    /// The ceiling, in bytes.
    pub limit_bytes: u64,
}

/// License policy. License checks only ever warn, so these lists tune the
/// advice, not the gate.
#[derive(Debug, Clone, Deserialize)]
pub struct LicenseRules {
    /// License families considered reviewed; matched case-insensitively as
    /// substrings of the declared license.
    pub families: Vec<String>,
    /// Families that always need an attribution reminder.
    pub attribution_required: Vec<String>,
}

/// The full rule set consumed by the validation lane.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationRules {
    /// Format gate per asset type.
    #[serde(default = "default_formats")]
    pub formats: HashMap<AssetType, FormatRule>,
    /// Size ceilings per asset type, in declaration order.
    #[serde(default = "default_size_ceilings")]
    pub size_ceilings: HashMap<AssetType, Vec<SizeRule>>,
    /// License policy.
    #[serde(default = "default_licenses")]
    pub licenses: LicenseRules,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            size_ceilings: default_size_ceilings(),
            licenses: default_licenses(),
        }
    }
}

impl ValidationRules {
    /// Parses rules from a TOML manifest. Sections left out keep their
    /// defaults.
    pub fn from_toml_str(manifest: &str) -> Result<Self, RulesError> {
        Ok(toml::from_str(manifest)?)
    }
}

fn format_rule(allowed: &[&str], advisories: &[(&str, &str)]) -> FormatRule {
    FormatRule {
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
        advisories: advisories
            .iter()
            .map(|(format, note)| (format.to_string(), note.to_string()))
            .collect(),
    }
}

fn default_formats() -> HashMap<AssetType, FormatRule> {
    HashMap::from([
        (
            AssetType::Model3d,
            format_rule(
                &["glb", "gltf", "obj", "fbx"],
                &[
                    ("obj", "OBJ stores no embedded materials or textures"),
                    ("fbx", "FBX needs proprietary tooling to re-export"),
                ],
            ),
        ),
        (
            AssetType::Texture,
            format_rule(
                &["png", "jpg", "jpeg", "webp", "ktx2"],
                &[
                    ("jpg", "lossy compression and no alpha channel"),
                    ("jpeg", "lossy compression and no alpha channel"),
                ],
            ),
        ),
        (
            AssetType::Audio,
            format_rule(
                &["ogg", "wav", "mp3", "m4a"],
                &[("mp3", "decoder licensing friction on some platforms")],
            ),
        ),
        (
            AssetType::Animation,
            format_rule(&["glb", "gltf", "json"], &[]),
        ),
        (
            AssetType::Shader,
            format_rule(&["wgsl", "glsl", "vert", "frag"], &[]),
        ),
        (
            AssetType::UiAsset,
            format_rule(&["png", "svg", "webp"], &[]),
        ),
    ])
}

const MIB: u64 = 1024 * 1024;

fn size_rules(rules: &[(&str, u64)]) -> Vec<SizeRule> {
    rules
        .iter()
        .map(|(category, limit_bytes)| SizeRule {
            category: category.to_string(),
            limit_bytes: *limit_bytes,
        })
        .collect()
}

fn default_size_ceilings() -> HashMap<AssetType, Vec<SizeRule>> {
    HashMap::from([
        (
            AssetType::Model3d,
            size_rules(&[("hero", 25 * MIB), ("environment", 50 * MIB), ("prop", 10 * MIB)]),
        ),
        (
            AssetType::Texture,
            size_rules(&[("default", 8 * MIB), ("environment", 16 * MIB), ("ui", 2 * MIB)]),
        ),
        (
            AssetType::Audio,
            size_rules(&[("music", 12 * MIB), ("sfx", 2 * MIB)]),
        ),
        (AssetType::Animation, size_rules(&[("default", 5 * MIB)])),
        (AssetType::Shader, size_rules(&[("default", 256 * 1024)])),
        (AssetType::UiAsset, size_rules(&[("default", MIB)])),
    ])
}

fn default_licenses() -> LicenseRules {
    LicenseRules {
        families: [
            "CC0",
            "CC-BY",
            "CC-BY-SA",
            "MIT",
            "Apache-2.0",
            "public-domain",
            "royalty-free",
            "proprietary-licensed",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        attribution_required: vec!["CC-BY".to_string(), "CC-BY-SA".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_type() {
        let rules = ValidationRules::default();
        for asset_type in AssetType::ALL {
            assert!(rules.formats.contains_key(&asset_type), "{asset_type}");
            assert!(
                !rules.size_ceilings[&asset_type].is_empty(),
                "{asset_type} has no ceiling"
            );
        }
    }

    #[test]
    fn test_toml_overrides_one_section() {
        let rules = ValidationRules::from_toml_str(
            r#"
            [formats.texture]
            allowed = ["png"]
            "#,
        )
        .unwrap();
        // The overridden map replaces the whole section...
        assert_eq!(rules.formats.len(), 1);
        assert_eq!(rules.formats[&AssetType::Texture].allowed, vec!["png"]);
        // ...while untouched sections keep their defaults.
        assert!(!rules.size_ceilings.is_empty());
        assert!(!rules.licenses.families.is_empty());
    }

    #[test]
    fn test_rejects_malformed_manifest() {
        assert!(ValidationRules::from_toml_str("formats = 3").is_err());
    }
}
