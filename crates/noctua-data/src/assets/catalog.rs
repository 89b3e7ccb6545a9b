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

//! A read-oriented façade over the [`Registry`].
//!
//! The catalog owns no records; it keeps two derived view indices (by
//! license, by source) and rebuilds them lazily whenever the registry's
//! revision counter has moved. Everything else is computed per query
//! against registry state.

use super::Registry;
use noctua_core::asset::{AssetRecord, AssetType};
use noctua_core::utils::clock::now_millis;
use serde::Serialize;
use std::collections::BTreeMap;

/// The bucket label for records with no declared license.
const UNSPECIFIED_LICENSE: &str = "unspecified";
/// The bucket label for records with no declared source.
const UNKNOWN_SOURCE: &str = "unknown";

/// Conjunctive filter criteria for catalog queries. `None` fields match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Match records of this type.
    pub asset_type: Option<AssetType>,
    /// Match records in this category.
    pub category: Option<String>,
    /// Match records with this exact license.
    pub license: Option<String>,
    /// Match records with this exact source.
    pub source: Option<String>,
    /// Match records carrying this tag.
    pub tag: Option<String>,
}

/// One asset's line in a by-license grouping.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseEntry {
    /// The record id.
    pub id: String,
    /// Display name (the record id).
    pub name: String,
    /// Where the asset came from.
    pub source: String,
    /// The asset's path.
    pub path: String,
}

/// One asset's line in a by-source grouping.
#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    /// The record id.
    pub id: String,
    /// Display name (the record id).
    pub name: String,
    /// The asset's license.
    pub license: String,
    /// The asset's path.
    pub path: String,
}

/// One asset's line in the flat report listing.
#[derive(Debug, Clone, Serialize)]
pub struct ReportAsset {
    /// The record id.
    pub id: String,
    /// The asset's type tag.
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// The asset's license.
    pub license: String,
    /// Where the asset came from.
    pub source: String,
    /// The asset's path.
    pub path: String,
    /// Human-readable description.
    pub description: String,
}

/// A compliance/documentation summary of every registered asset, grouped by
/// license and by source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionReport {
    /// When the report was generated, Unix epoch milliseconds.
    pub generated_at: u64,
    /// Number of assets covered.
    pub total_assets: usize,
    /// Assets grouped by license (sorted for stable output).
    pub by_license: BTreeMap<String, Vec<LicenseEntry>>,
    /// Assets grouped by source (sorted for stable output).
    pub by_source: BTreeMap<String, Vec<SourceEntry>>,
    /// The flat listing of every asset.
    pub assets: Vec<ReportAsset>,
}

/// The read façade. Cheap to create; view indices are built on first use.
#[derive(Debug, Default)]
pub struct Catalog {
    by_license: BTreeMap<String, Vec<String>>,
    by_source: BTreeMap<String, Vec<String>>,
    seen_revision: Option<u64>,
}

impl Catalog {
    /// Creates a catalog with empty views.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record matching all of the filter's criteria, ordered
    /// by id.
    pub fn filter<'r>(&self, registry: &'r Registry, filter: &CatalogFilter) -> Vec<&'r AssetRecord> {
        registry
            .get_all()
            .into_iter()
            .filter(|r| filter.asset_type.is_none_or(|t| r.asset_type == t))
            .filter(|r| filter.category.as_deref().is_none_or(|c| r.category == c))
            .filter(|r| filter.license.as_deref().is_none_or(|l| r.license == l))
            .filter(|r| filter.source.as_deref().is_none_or(|s| r.source == s))
            .filter(|r| {
                filter
                    .tag
                    .as_deref()
                    .is_none_or(|tag| r.tags.iter().any(|t| t == tag))
            })
            .collect()
    }

    /// The records `id` directly depends on. Unregistered dependency ids are
    /// skipped.
    pub fn dependencies_of<'r>(&self, registry: &'r Registry, id: &str) -> Vec<&'r AssetRecord> {
        registry
            .get(id)
            .map(|record| {
                record
                    .dependencies
                    .iter()
                    .filter_map(|dep| registry.get(dep))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The records that directly depend on `id`, ordered by id.
    pub fn dependents_of<'r>(&self, registry: &'r Registry, id: &str) -> Vec<&'r AssetRecord> {
        registry
            .get_all()
            .into_iter()
            .filter(|r| r.dependencies.iter().any(|dep| dep == id))
            .collect()
    }

    /// Every record carrying the given license, via the cached view.
    pub fn assets_by_license<'r>(
        &mut self,
        registry: &'r Registry,
        license: &str,
    ) -> Vec<&'r AssetRecord> {
        self.ensure_views(registry);
        self.by_license
            .get(license)
            .map(|ids| ids.iter().filter_map(|id| registry.get(id)).collect())
            .unwrap_or_default()
    }

    /// Every record from the given source, via the cached view.
    pub fn assets_by_source<'r>(
        &mut self,
        registry: &'r Registry,
        source: &str,
    ) -> Vec<&'r AssetRecord> {
        self.ensure_views(registry);
        self.by_source
            .get(source)
            .map(|ids| ids.iter().filter_map(|id| registry.get(id)).collect())
            .unwrap_or_default()
    }

    /// Builds the attribution report covering every registered asset.
    pub fn attribution_report(&mut self, registry: &Registry) -> AttributionReport {
        self.ensure_views(registry);

        let mut by_license: BTreeMap<String, Vec<LicenseEntry>> = BTreeMap::new();
        for (license, ids) in &self.by_license {
            let entries = ids
                .iter()
                .filter_map(|id| registry.get(id))
                .map(|r| LicenseEntry {
                    id: r.id.clone(),
                    name: r.id.clone(),
                    source: r.source.clone(),
                    path: r.path.clone(),
                })
                .collect();
            by_license.insert(license.clone(), entries);
        }

        let mut by_source: BTreeMap<String, Vec<SourceEntry>> = BTreeMap::new();
        for (source, ids) in &self.by_source {
            let entries = ids
                .iter()
                .filter_map(|id| registry.get(id))
                .map(|r| SourceEntry {
                    id: r.id.clone(),
                    name: r.id.clone(),
                    license: license_label(r).to_string(),
                    path: r.path.clone(),
                })
                .collect();
            by_source.insert(source.clone(), entries);
        }

        let assets = registry
            .get_all()
            .into_iter()
            .map(|r| ReportAsset {
                id: r.id.clone(),
                asset_type: r.asset_type,
                license: license_label(r).to_string(),
                source: source_label(r).to_string(),
                path: r.path.clone(),
                description: r.description.clone(),
            })
            .collect();

        AttributionReport {
            generated_at: now_millis(),
            total_assets: registry.len(),
            by_license,
            by_source,
            assets,
        }
    }

    /// Renders an attribution report as markdown, grouped by license and
    /// then by source.
    pub fn render_markdown(report: &AttributionReport) -> String {
        let mut out = String::new();
        out.push_str("# Asset Attribution Report\n\n");
        out.push_str(&format!(
            "{} assets. Generated at epoch-ms {}.\n\n",
            report.total_assets, report.generated_at
        ));

        out.push_str("## By License\n\n");
        for (license, entries) in &report.by_license {
            out.push_str(&format!("### {license}\n\n"));
            for entry in entries {
                out.push_str(&format!(
                    "- **{}** — {} (`{}`)\n",
                    entry.name, entry.source, entry.path
                ));
            }
            out.push('\n');
        }

        out.push_str("## By Source\n\n");
        for (source, entries) in &report.by_source {
            out.push_str(&format!("### {source}\n\n"));
            for entry in entries {
                out.push_str(&format!(
                    "- **{}** — {} (`{}`)\n",
                    entry.name, entry.license, entry.path
                ));
            }
            out.push('\n');
        }

        out
    }

    /// Rebuilds the license/source views when the registry has moved on.
    fn ensure_views(&mut self, registry: &Registry) {
        if self.seen_revision == Some(registry.revision()) {
            return;
        }

        self.by_license.clear();
        self.by_source.clear();
        for record in registry.get_all() {
            self.by_license
                .entry(license_label(record).to_string())
                .or_default()
                .push(record.id.clone());
            self.by_source
                .entry(source_label(record).to_string())
                .or_default()
                .push(record.id.clone());
        }
        self.seen_revision = Some(registry.revision());
        log::debug!(
            "catalog: rebuilt views over {} assets at revision {}",
            registry.len(),
            registry.revision()
        );
    }
}

fn license_label(record: &AssetRecord) -> &str {
    if record.license.is_empty() {
        UNSPECIFIED_LICENSE
    } else {
        &record.license
    }
}

fn source_label(record: &AssetRecord) -> &str {
    if record.source.is_empty() {
        UNKNOWN_SOURCE
    } else {
        &record.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::RegisterAsset;

    fn seeded_registry() -> Registry {
        let mut registry = Registry::in_memory();
        registry.register(
            "stage",
            RegisterAsset {
                category: Some("environment".to_string()),
                license: "CC-BY".to_string(),
                source: "PolyBazaar".to_string(),
                dependencies: vec!["stage-diffuse".to_string()],
                tags: vec!["night".to_string()],
                ..RegisterAsset::new(AssetType::Model3d, "stage.glb")
            },
        );
        registry.register(
            "stage-diffuse",
            RegisterAsset {
                license: "CC-BY".to_string(),
                source: "PolyBazaar".to_string(),
                ..RegisterAsset::new(AssetType::Texture, "stage.png")
            },
        );
        registry.register(
            "kick",
            RegisterAsset {
                license: String::new(),
                ..RegisterAsset::new(AssetType::Audio, "kick.wav")
            },
        );
        registry
    }

    #[test]
    fn test_filter_is_conjunctive() {
        let registry = seeded_registry();
        let catalog = Catalog::new();

        let hits = catalog.filter(
            &registry,
            &CatalogFilter {
                license: Some("CC-BY".to_string()),
                asset_type: Some(AssetType::Model3d),
                ..CatalogFilter::default()
            },
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "stage");

        let all = catalog.filter(&registry, &CatalogFilter::default());
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_one_hop_graph_queries() {
        let registry = seeded_registry();
        let catalog = Catalog::new();

        let deps = catalog.dependencies_of(&registry, "stage");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].id, "stage-diffuse");

        let dependents = catalog.dependents_of(&registry, "stage-diffuse");
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].id, "stage");

        assert!(catalog.dependencies_of(&registry, "ghost").is_empty());
    }

    #[test]
    fn test_views_rebuild_when_registry_changes() {
        let mut registry = seeded_registry();
        let mut catalog = Catalog::new();

        assert_eq!(catalog.assets_by_license(&registry, "CC-BY").len(), 2);

        registry.register(
            "flyer",
            RegisterAsset {
                license: "CC-BY".to_string(),
                ..RegisterAsset::new(AssetType::UiAsset, "flyer.png")
            },
        );
        assert_eq!(
            catalog.assets_by_license(&registry, "CC-BY").len(),
            3,
            "view must follow the registry revision"
        );
    }

    #[test]
    fn test_attribution_report_buckets_missing_fields() {
        let registry = seeded_registry();
        let mut catalog = Catalog::new();

        let report = catalog.attribution_report(&registry);
        assert_eq!(report.total_assets, 3);
        assert_eq!(report.by_license.get("CC-BY").map(Vec::len), Some(2));
        assert_eq!(report.by_license.get("unspecified").map(Vec::len), Some(1));
        assert_eq!(report.by_source.get("unknown").map(Vec::len), Some(1));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"byLicense\""));

        let markdown = Catalog::render_markdown(&report);
        assert!(markdown.contains("# Asset Attribution Report"));
        assert!(markdown.contains("### CC-BY"));
        assert!(markdown.contains("`stage.glb`"));
    }
}
