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

//! The result type shared by every validation check.
//!
//! Errors make an asset unusable and block it from entering the system;
//! warnings are advisory and never block. The distinction is load-bearing:
//! license and metadata-completeness checks may only ever produce warnings.

use serde::Serialize;

/// The outcome of validating proposed asset metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Whether the asset may enter the system. `false` iff `errors` is non-empty.
    pub valid: bool,
    /// Conditions that block the asset.
    pub errors: Vec<String>,
    /// Advisory findings that do not block the asset.
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// A passing result with no findings.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Records a blocking condition and marks the result invalid.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    /// Records an advisory finding.
    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Folds another result into this one. The merged result is valid only
    /// if both inputs were.
    pub fn merge(&mut self, other: ValidationResult) {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// True when the result is valid *and* carries no warnings.
    pub fn is_clean(&self) -> bool {
        self.valid && self.warnings.is_empty()
    }
}
