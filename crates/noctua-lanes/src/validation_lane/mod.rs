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

//! The policy gate proposed assets pass before loading or caching.
//!
//! Only two rule groups can block an asset: the per-type format allow-list
//! and the per-type size ceilings. License and metadata-completeness checks
//! are compliance aids and only ever warn, so they can never stall a
//! production workflow.
//!
//! `validate` is a pure function of the draft: same input, same result.
//! Callers that re-validate unchanged assets repeatedly can sit a
//! [`ValidationMemo`] in front of the lane.

mod memo;
mod rules;

pub use memo::*;
pub use rules::*;

use noctua_core::asset::{AssetDraft, AssetType};
use noctua_core::validation::ValidationResult;
use std::future::Future;

/// Sizes at or above this fraction of a ceiling draw a warning.
const SIZE_WARN_RATIO: f64 = 0.8;

/// The validation pipeline. Stateless; cheap to share by reference.
#[derive(Debug, Default)]
pub struct ValidationLane {
    rules: ValidationRules,
}

impl ValidationLane {
    /// Creates a lane with the given rule tables.
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    /// The rule tables this lane applies.
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Checks a proposed asset against every rule group and merges the
    /// findings.
    pub fn validate(&self, draft: &AssetDraft) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if draft.asset_type.is_none() {
            result.push_error("asset is missing its required 'type' field");
        }
        if draft.path.as_deref().is_none_or(|p| p.trim().is_empty()) {
            result.push_error("asset is missing its required 'path' field");
        }
        let Some(asset_type) = draft.asset_type else {
            return result;
        };

        self.check_format(asset_type, draft, &mut result);
        self.check_size(asset_type, draft, &mut result);
        self.check_license(draft, &mut result);
        self.check_completeness(draft, &mut result);
        result
    }

    /// Confirms the asset is reachable through the caller's existence probe.
    ///
    /// Transport lives with the collaborator; the lane only shapes the
    /// outcome into a [`ValidationResult`].
    pub async fn check_availability<F, Fut>(&self, path: &str, probe: F) -> ValidationResult
    where
        F: FnOnce(&str) -> Fut,
        Fut: Future<Output = bool>,
    {
        let mut result = ValidationResult::ok();
        if !probe(path).await {
            result.push_error(format!("asset at '{path}' is not reachable"));
        }
        result
    }

    /// Confirms every declared dependency exists, via the caller's per-id
    /// predicate.
    pub async fn check_dependencies<F, Fut>(
        &self,
        dependencies: &[String],
        exists: F,
    ) -> ValidationResult
    where
        F: Fn(&str) -> Fut,
        Fut: Future<Output = bool>,
    {
        let mut result = ValidationResult::ok();
        for dependency in dependencies {
            if !exists(dependency).await {
                result.push_error(format!("missing dependency '{dependency}'"));
            }
        }
        result
    }

    fn check_format(&self, asset_type: AssetType, draft: &AssetDraft, result: &mut ValidationResult) {
        let Some(format) = draft.format.as_deref() else {
            return;
        };
        let format = format.to_lowercase();
        let Some(rule) = self.rules.formats.get(&asset_type) else {
            return;
        };

        if !rule.allowed.iter().any(|f| *f == format) {
            result.push_error(format!(
                "format '{format}' is not allowed for {asset_type} assets (allowed: {})",
                rule.allowed.join(", ")
            ));
            return;
        }
        if let Some(note) = rule.advisories.get(&format) {
            result.push_warning(format!("format '{format}': {note}"));
        }
    }

    fn check_size(&self, asset_type: AssetType, draft: &AssetDraft, result: &mut ValidationResult) {
        let Some(ceilings) = self.rules.size_ceilings.get(&asset_type) else {
            return;
        };
        // The first ceiling defined for a type doubles as its default.
        let Some(ceiling) = draft
            .category
            .as_deref()
            .and_then(|category| ceilings.iter().find(|c| c.category == category))
            .or_else(|| ceilings.first())
        else {
            return;
        };

        if draft.size > ceiling.limit_bytes {
            result.push_error(format!(
                "size {} exceeds the '{}' ceiling of {}",
                fmt_mb(draft.size),
                ceiling.category,
                fmt_mb(ceiling.limit_bytes)
            ));
        } else if draft.size as f64 >= ceiling.limit_bytes as f64 * SIZE_WARN_RATIO {
            result.push_warning(format!(
                "size {} is close to the '{}' ceiling of {}",
                fmt_mb(draft.size),
                ceiling.category,
                fmt_mb(ceiling.limit_bytes)
            ));
        }
    }

    fn check_license(&self, draft: &AssetDraft, result: &mut ValidationResult) {
        let licenses = &self.rules.licenses;
        let Some(license) = draft.license.as_deref().filter(|l| !l.trim().is_empty()) else {
            result.push_warning("no license declared; confirm usage rights before release");
            return;
        };
        let lower = license.to_lowercase();

        let in_family = |family: &String| lower.contains(&family.to_lowercase());
        if !licenses.families.iter().any(in_family) {
            result.push_warning(format!(
                "license '{license}' is not in the reviewed allow-list; record explicit attribution"
            ));
        }
        if licenses.attribution_required.iter().any(in_family) {
            result.push_warning(format!(
                "license '{license}' requires attribution; credit the author in the release notes"
            ));
        }
    }

    fn check_completeness(&self, draft: &AssetDraft, result: &mut ValidationResult) {
        let missing = |value: &Option<String>| {
            value.as_deref().is_none_or(|v| v.trim().is_empty())
        };
        if missing(&draft.source) {
            result.push_warning("no source recorded for this asset");
        }
        if missing(&draft.author) {
            result.push_warning("no author recorded for this asset");
        }
        if missing(&draft.description) {
            result.push_warning("no description recorded for this asset");
        }
    }
}

/// Renders a byte count as megabytes with two decimals, for rule messages.
fn fmt_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use noctua_core::asset::AssetType;

    const MIB: u64 = 1024 * 1024;

    fn lane() -> ValidationLane {
        ValidationLane::default()
    }

    #[test]
    fn test_missing_identity_fields_block() {
        let result = lane().validate(&AssetDraft::default());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);
    }

    #[test]
    fn test_audio_format_gate() {
        // flac is outside the allow-list.
        let flac = AssetDraft::new(AssetType::Audio, "a.flac", 1024).with_format("flac");
        assert!(!lane().validate(&flac).valid);

        // ogg passes with no format warning.
        let ogg = AssetDraft::new(AssetType::Audio, "a.ogg", 1024).with_format("ogg");
        let result = lane().validate(&ogg);
        assert!(result.valid);
        assert!(
            !result.warnings.iter().any(|w| w.contains("format")),
            "{:?}",
            result.warnings
        );

        // mp3 passes but carries the advisory.
        let mp3 = AssetDraft::new(AssetType::Audio, "a.mp3", 1024).with_format("mp3");
        let result = lane().validate(&mp3);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("mp3")));
    }

    #[test]
    fn test_format_matching_ignores_case() {
        let draft = AssetDraft::new(AssetType::Texture, "t.PNG", 1024).with_format("PNG");
        assert!(lane().validate(&draft).valid);
    }

    #[test]
    fn test_size_boundary_is_inclusive() {
        // Exactly the ui ceiling (2 MiB): valid, no size error.
        let at_limit =
            AssetDraft::new(AssetType::Texture, "t.png", 2 * MIB).with_category("ui");
        let result = lane().validate(&at_limit);
        assert!(result.valid, "{:?}", result.errors);

        // One byte over: blocked, with both sizes rendered in MB.
        let over = AssetDraft::new(AssetType::Texture, "t.png", 2 * MIB + 1).with_category("ui");
        let result = lane().validate(&over);
        assert!(!result.valid);
        let error = &result.errors[0];
        assert!(error.contains("2.00 MB"), "{error}");
        assert!(error.contains("MB exceeds") || error.contains("exceeds"), "{error}");
    }

    #[test]
    fn test_size_warning_at_eighty_percent() {
        // 7 MiB is 87.5% of the 8 MiB default texture ceiling.
        let draft = AssetDraft::new(AssetType::Texture, "t.png", 7 * MIB);
        let result = lane().validate(&draft);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("close to")), "{:?}", result.warnings);
    }

    #[test]
    fn test_unknown_category_uses_first_ceiling() {
        // "hero" (25 MiB) is the first 3d-model ceiling; an unknown category
        // falls back to it.
        let draft = AssetDraft::new(AssetType::Model3d, "m.glb", 30 * MIB)
            .with_category("totally-new-bucket");
        let result = lane().validate(&draft);
        assert!(!result.valid);
        assert!(result.errors[0].contains("hero"), "{}", result.errors[0]);
    }

    #[test]
    fn test_license_checks_never_block() {
        let missing = AssetDraft::new(AssetType::Texture, "t.png", 1024);
        let result = lane().validate(&missing);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("license")));

        let exotic = AssetDraft::new(AssetType::Texture, "t.png", 1024)
            .with_license("HandshakeWare-1.0");
        let result = lane().validate(&exotic);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("allow-list")));

        // Attribution reminder fires even for an allow-listed family.
        let ccby = AssetDraft::new(AssetType::Texture, "t.png", 1024).with_license("CC-BY-4.0");
        let result = lane().validate(&ccby);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("attribution")));
    }

    #[test]
    fn test_completeness_warnings() {
        let draft = AssetDraft::new(AssetType::Shader, "glow.wgsl", 1024);
        let result = lane().validate(&draft);
        assert!(result.valid);
        let text = result.warnings.join("\n");
        assert!(text.contains("source"));
        assert!(text.contains("author"));
        assert!(text.contains("description"));
    }

    #[test]
    fn test_validate_is_deterministic() {
        let draft = AssetDraft::new(AssetType::Audio, "a.mp3", 1024).with_format("mp3");
        let first = lane().validate(&draft);
        let second = lane().validate(&draft);
        assert_eq!(first.valid, second.valid);
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.warnings, second.warnings);
    }

    #[tokio::test]
    async fn test_availability_probe_shapes_the_result() {
        let lane = lane();
        let ok = lane.check_availability("a.png", |_| async { true }).await;
        assert!(ok.valid);

        let gone = lane.check_availability("a.png", |_| async { false }).await;
        assert!(!gone.valid);
        assert!(gone.errors[0].contains("a.png"));
    }

    #[tokio::test]
    async fn test_dependency_check_reports_each_missing_id() {
        let lane = lane();
        let deps = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let result = lane
            .check_dependencies(&deps, |id| {
                let present = id == "b";
                async move { present }
            })
            .await;
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
    }
}
