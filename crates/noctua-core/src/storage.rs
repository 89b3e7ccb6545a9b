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

//! The persistence contract used by the registry for durability.
//!
//! Backends expose string-keyed blob storage, nothing more. The registry is
//! constructed with a backend instance — there is no well-known global
//! store, and tests inject an in-memory backend.

use std::fmt;

/// A failure raised by a storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// The underlying medium failed (filesystem, database, bridge).
    Io {
        /// The backend's own description of the failure.
        detail: String,
    },
    /// The stored blob exists but could not be handled as text.
    Data {
        /// What was wrong with the blob.
        detail: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io { detail } => write!(f, "storage I/O failure: {detail}"),
            StorageError::Data { detail } => write!(f, "stored data is unusable: {detail}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// String-keyed blob storage used for registry durability.
///
/// Implementations must tolerate concurrent readers; the registry serializes
/// its own writes.
pub trait StorageBackend: Send + Sync {
    /// Returns the blob stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous blob.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
