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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of asset categories the core manages.
///
/// The serialized form uses the wire tags shared with manifests and the
/// persisted registry document (`"3d-model"`, `"texture"`, ...), which
/// [`AssetType::as_str`] and the [`FromStr`] impl round-trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Meshes and full scenes (glTF, OBJ, FBX).
    #[serde(rename = "3d-model")]
    Model3d,
    /// Images sampled by materials or post-processing.
    #[serde(rename = "texture")]
    Texture,
    /// Music tracks and sound effects.
    #[serde(rename = "audio")]
    Audio,
    /// Skeletal or property animation clips.
    #[serde(rename = "animation")]
    Animation,
    /// GPU shader sources.
    #[serde(rename = "shader")]
    Shader,
    /// Icons, fonts rendered to bitmaps, and other interface imagery.
    #[serde(rename = "ui-asset")]
    UiAsset,
}

impl AssetType {
    /// Every asset type, in declaration order.
    pub const ALL: [AssetType; 6] = [
        AssetType::Model3d,
        AssetType::Texture,
        AssetType::Audio,
        AssetType::Animation,
        AssetType::Shader,
        AssetType::UiAsset,
    ];

    /// Returns the stable wire tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Model3d => "3d-model",
            AssetType::Texture => "texture",
            AssetType::Audio => "audio",
            AssetType::Animation => "animation",
            AssetType::Shader => "shader",
            AssetType::UiAsset => "ui-asset",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when parsing a string that is not a known asset type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAssetType {
    /// The tag that failed to parse.
    pub tag: String,
}

impl fmt::Display for UnknownAssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown asset type tag '{}'", self.tag)
    }
}

impl std::error::Error for UnknownAssetType {}

impl FromStr for AssetType {
    type Err = UnknownAssetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownAssetType { tag: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tags_round_trip() {
        for t in AssetType::ALL {
            assert_eq!(t.as_str().parse::<AssetType>(), Ok(t));
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = "sprite".parse::<AssetType>().unwrap_err();
        assert_eq!(err.tag, "sprite");
    }

    #[test]
    fn test_serde_uses_wire_tags() {
        let json = serde_json::to_string(&AssetType::Model3d).unwrap();
        assert_eq!(json, "\"3d-model\"");
        let back: AssetType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AssetType::Model3d);
    }
}
