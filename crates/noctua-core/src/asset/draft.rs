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
use serde::Deserialize;

/// Proposed asset metadata, as it arrives from a manifest or an import tool
/// *before* any record exists.
///
/// Unlike [`AssetRecord`](super::AssetRecord), identity fields are optional
/// here: a draft is exactly what validation inspects, and "required field
/// missing" is one of the conditions it reports rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDraft {
    /// The declared asset type, if any.
    #[serde(rename = "type")]
    pub asset_type: Option<AssetType>,
    /// The path or URL the asset would be loaded from.
    pub path: Option<String>,
    /// Size of the source file in bytes.
    #[serde(default)]
    pub size: u64,
    /// File-format tag (lowercase extension).
    pub format: Option<String>,
    /// Declared license identifier.
    pub license: Option<String>,
    /// Classification bucket used to select a size ceiling.
    pub category: Option<String>,
    /// Where the asset came from.
    pub source: Option<String>,
    /// The asset's author, for attribution.
    pub author: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
}

impl AssetDraft {
    /// Creates a draft with the identity fields set and everything else empty.
    ///
    /// Convenience for programmatic callers; manifest-driven callers
    /// deserialize drafts instead.
    pub fn new(asset_type: AssetType, path: impl Into<String>, size: u64) -> Self {
        Self {
            asset_type: Some(asset_type),
            path: Some(path.into()),
            size,
            ..Self::default()
        }
    }

    /// Sets the format tag.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the license identifier.
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    /// Sets the category bucket.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
