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

use super::ValidationLane;
use noctua_core::asset::AssetDraft;
use noctua_core::validation::ValidationResult;
use std::collections::HashMap;

/// A memo of validation results keyed by `(path, size)`.
///
/// `validate` is pure, so an unchanged `(path, size)` pair always produces
/// the same result; import tooling that sweeps the same manifests repeatedly
/// uses this to skip re-validation. Drafts without a path are passed through
/// uncached.
#[derive(Default)]
pub struct ValidationMemo {
    results: HashMap<(String, u64), ValidationResult>,
}

impl ValidationMemo {
    /// Creates an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates through the memo, reusing a stored result when the draft's
    /// `(path, size)` has been seen before.
    pub fn validate(&mut self, lane: &ValidationLane, draft: &AssetDraft) -> ValidationResult {
        let Some(path) = draft.path.clone() else {
            return lane.validate(draft);
        };
        self.results
            .entry((path, draft.size))
            .or_insert_with(|| lane.validate(draft))
            .clone()
    }

    /// Number of memoized results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True when nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Drops every memoized result, e.g. after the rule tables change.
    pub fn clear(&mut self) {
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noctua_core::asset::AssetType;

    #[test]
    fn test_memo_reuses_results_per_path_and_size() {
        let lane = ValidationLane::default();
        let mut memo = ValidationMemo::new();

        let draft = AssetDraft::new(AssetType::Texture, "t.png", 1024);
        let first = memo.validate(&lane, &draft);
        let again = memo.validate(&lane, &draft);
        assert_eq!(memo.len(), 1);
        assert_eq!(first.valid, again.valid);

        // A changed size is a different asset revision.
        let grown = AssetDraft::new(AssetType::Texture, "t.png", 2048);
        memo.validate(&lane, &grown);
        assert_eq!(memo.len(), 2);

        memo.clear();
        assert!(memo.is_empty());
    }

    #[test]
    fn test_pathless_drafts_bypass_the_memo() {
        let lane = ValidationLane::default();
        let mut memo = ValidationMemo::new();
        let result = memo.validate(&lane, &AssetDraft::default());
        assert!(!result.valid);
        assert!(memo.is_empty());
    }
}
