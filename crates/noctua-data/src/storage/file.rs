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

use noctua_core::storage::{StorageBackend, StorageError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A storage backend that keeps one file per key under a root directory.
///
/// Keys are sanitized into filenames, so distinct keys that differ only in
/// punctuation may collide; registry storage keys are chosen to avoid that.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates the backend, ensuring the root directory exists.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::Io {
            detail: format!("failed to create '{}': {e}", root.display()),
        })?;
        Ok(Self { root })
    }

    /// The directory blobs are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.blob_path(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io {
                detail: format!("failed to read blob for '{key}': {e}"),
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.blob_path(key), value).map_err(|e| StorageError::Io {
            detail: format!("failed to write blob for '{key}': {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("blobs")).unwrap();
        assert!(storage.read("registry").unwrap().is_none());
        storage.write("registry", "{}").unwrap();
        assert_eq!(storage.read("registry").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_keys_are_sanitized_into_filenames() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        storage.write("noctua/assets:v1", "blob").unwrap();
        assert_eq!(
            storage.read("noctua/assets:v1").unwrap().as_deref(),
            Some("blob")
        );
    }
}
