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

//! Defines the typed failure taxonomy for asset loading.
//!
//! Loaders produce a [`LoadError`] variant directly, so the recovery layer
//! routes on the variant rather than sniffing message text. For failure
//! sources that only surface a string (a JS bridge, a third-party fetch
//! wrapper), [`LoadError::classify`] adapts the text into the taxonomy.

use serde::Serialize;
use std::fmt;

/// A failure raised while fetching or decoding an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The transport failed: timeout, unreachable host, 404-like absence.
    Network {
        /// The path that was being loaded.
        path: String,
        /// The underlying transport error text.
        detail: String,
    },
    /// The payload arrived but could not be parsed as its declared format.
    Format {
        /// The path that was being loaded.
        path: String,
        /// What the decoder objected to.
        detail: String,
    },
    /// The payload exceeds the configured ceiling for its type.
    Size {
        /// The path that was being loaded.
        path: String,
        /// Observed size in bytes.
        actual: u64,
        /// The ceiling that was exceeded, in bytes.
        limit: u64,
    },
    /// The asset may not be used for licensing or attribution reasons.
    License {
        /// The path that was being loaded.
        path: String,
        /// The compliance condition that failed.
        detail: String,
    },
    /// A related asset this one requires is absent.
    Dependency {
        /// The path that was being loaded.
        path: String,
        /// The id of the missing dependency.
        missing: String,
    },
    /// Anything the loader could not attribute to a more specific cause.
    Other {
        /// The path that was being loaded.
        path: String,
        /// The raw failure text.
        detail: String,
    },
}

impl LoadError {
    /// The classified kind of this failure, used to select a recovery strategy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Network { .. } => ErrorKind::Network,
            LoadError::Format { .. } => ErrorKind::Format,
            LoadError::Size { .. } => ErrorKind::Size,
            LoadError::License { .. } => ErrorKind::License,
            LoadError::Dependency { .. } => ErrorKind::Dependency,
            LoadError::Other { .. } => ErrorKind::Unknown,
        }
    }

    /// The path the failure refers to.
    pub fn path(&self) -> &str {
        match self {
            LoadError::Network { path, .. }
            | LoadError::Format { path, .. }
            | LoadError::Size { path, .. }
            | LoadError::License { path, .. }
            | LoadError::Dependency { path, .. }
            | LoadError::Other { path, .. } => path,
        }
    }

    /// Adapts untyped failure text into the taxonomy by keyword family.
    ///
    /// This exists only for failure sources that cannot produce a typed
    /// variant themselves. Loaders written against this crate should
    /// construct the variant directly; keyword matching is inherently
    /// sensitive to the wording of the underlying message.
    pub fn classify(path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        let message = message.into();
        let lower = message.to_lowercase();

        let matches_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if matches_any(&["timeout", "timed out", "fetch", "network", "404", "not found", "connection"]) {
            LoadError::Network { path, detail: message }
        } else if matches_any(&["parse", "invalid", "malformed", "corrupt", "decode", "unsupported format"]) {
            LoadError::Format { path, detail: message }
        } else if matches_any(&["too large", "exceeds", "size limit"]) {
            LoadError::Size { path, actual: 0, limit: 0 }
        } else if matches_any(&["license", "attribution", "copyright"]) {
            LoadError::License { path, detail: message }
        } else if matches_any(&["dependency", "requires"]) {
            let missing = message
                .rsplit('\'')
                .nth(1)
                .unwrap_or_default()
                .to_string();
            LoadError::Dependency { path, missing }
        } else {
            LoadError::Other { path, detail: message }
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Network { path, detail } => {
                write!(f, "network failure loading '{path}': {detail}")
            }
            LoadError::Format { path, detail } => {
                write!(f, "invalid or unsupported data for '{path}': {detail}")
            }
            LoadError::Size { path, actual, limit } => {
                write!(f, "asset '{path}' is too large: {actual} bytes (limit {limit})")
            }
            LoadError::License { path, detail } => {
                write!(f, "license restriction on '{path}': {detail}")
            }
            LoadError::Dependency { path, missing } => {
                write!(f, "asset '{path}' requires missing dependency '{missing}'")
            }
            LoadError::Other { path, detail } => {
                write!(f, "failed to load '{path}': {detail}")
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// The fixed set of failure kinds the recovery layer routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Transient transport failure; eligible for retry.
    Network,
    /// Undecodable payload; eligible for fallback substitution.
    Format,
    /// Oversized payload; skipped entirely.
    Size,
    /// Compliance violation; blocked entirely.
    License,
    /// Missing related asset; eligible for fallback substitution.
    Dependency,
    /// Unclassified failure; eligible for fallback substitution.
    Unknown,
}

impl ErrorKind {
    /// Returns the stable lowercase tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Format => "format",
            ErrorKind::Size => "size",
            ErrorKind::License => "license",
            ErrorKind::Dependency => "dependency",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The recorded state of an asset path that is currently failed.
///
/// One record exists per failed path; a newer failure supersedes it, and
/// recovery clears it on success.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// The failed path.
    pub path: String,
    /// The classified kind of the most recent failure.
    pub kind: ErrorKind,
    /// The most recent failure's message.
    pub message: String,
    /// When the most recent failure was recorded, Unix epoch milliseconds.
    pub timestamp: u64,
    /// Cumulative load attempts made for this path.
    pub attempts: u32,
}

/// The notification payload delivered to error listeners on every terminal
/// recovery outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    /// The failed path.
    pub path: String,
    /// The failure's message.
    pub message: String,
    /// The classified kind.
    pub kind: ErrorKind,
    /// When the outcome was recorded, Unix epoch milliseconds.
    pub timestamp: u64,
}

/// An observer of terminal recovery outcomes.
///
/// This is the sole structured reporting path out of the recovery layer; the
/// UI subscribes here rather than scraping logs. A listener that panics is
/// isolated by the notifier and never affects other listeners or the
/// recovery result.
pub trait ErrorListener: Send + Sync {
    /// Called once per terminal outcome.
    fn on_error(&self, event: &ErrorEvent);
}

/// Adapts a closure into an [`ErrorListener`].
pub struct FnListener<F>(pub F);

impl<F> ErrorListener for FnListener<F>
where
    F: Fn(&ErrorEvent) + Send + Sync,
{
    fn on_error(&self, event: &ErrorEvent) {
        (self.0)(event)
    }
}
