// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blob storage for submitted forms.
//!
//! Objects are addressed by slash-separated keys such as
//! `forms/jo@example.com-final.json`. [`FsBlobStore`] maps keys onto files
//! under a root directory; [`InMemoryBlobStore`] keeps them in a map.
//!
//! ## Key rules
//!
//! Keys must be relative, non-empty, and free of `..`, empty or `.`
//! segments, and backslashes. Anything else is rejected with
//! [`StorageError::InvalidKey`] before touching the filesystem.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use uuid::Uuid;

use super::{StorageError, StorageResult};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Capability for object storage.
pub trait BlobStore: Send + Sync {
    /// Write (or overwrite) the object at `key`.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> StorageResult<()>;

    /// Read the object at `key`.
    fn get(&self, key: &str) -> StorageResult<StoredBlob>;
}

/// Validate a blob key.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if invalid {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// Filesystem-backed blob store.
///
/// The content type is not persisted; every object is served as JSON,
/// which is the only thing the form relay writes.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create the store, creating `root` if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Each write gets its own temp file; concurrent puts to one key race
        // only on the final rename.
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let written = write_file(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<StoredBlob> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(StoredBlob {
                content_type: "application/json".to_string(),
                bytes,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("Blob {key}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.blobs.write()?.insert(
            key.to_string(),
            StoredBlob {
                content_type: content_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<StoredBlob> {
        validate_key(key)?;
        self.blobs
            .read()?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("Blob {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn key_validation() {
        assert!(validate_key("forms/jo@example.com-final.json").is_ok());
        assert!(validate_key("a.json").is_ok());
        for bad in ["", "/etc/passwd", "forms/../x", "forms//x", "./x", "a\\b", "forms/"] {
            assert!(
                matches!(validate_key(bad), Err(StorageError::InvalidKey(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn fs_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path()).unwrap();

        store
            .put("forms/jo-final.json", br#"{"a":1}"#, "application/json")
            .unwrap();
        let blob = store.get("forms/jo-final.json").unwrap();
        assert_eq!(blob.bytes, br#"{"a":1}"#);
        assert_eq!(blob.content_type, "application/json");
        assert!(temp.path().join("forms").join("jo-final.json").exists());
        let leftovers = fs::read_dir(temp.path().join("forms")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn fs_store_concurrent_puts_to_one_key() {
        let temp = TempDir::new().unwrap();
        let store = std::sync::Arc::new(FsBlobStore::new(temp.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let body = format!(r#"{{"writer":{i}}}"#);
                    store.put("forms/jo-final.json", body.as_bytes(), "application/json")
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let blob = store.get("forms/jo-final.json").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&blob.bytes).unwrap();
        assert!(value["writer"].as_u64().unwrap() < 8);
        let files = fs::read_dir(temp.path().join("forms")).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn fs_store_overwrites() {
        let temp = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path()).unwrap();
        store.put("k.json", b"1", "application/json").unwrap();
        store.put("k.json", b"2", "application/json").unwrap();
        assert_eq!(store.get("k.json").unwrap().bytes, b"2");
    }

    #[test]
    fn fs_store_missing_and_invalid() {
        let temp = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp.path()).unwrap();
        assert!(matches!(store.get("nope.json"), Err(StorageError::NotFound(_))));
        assert!(matches!(
            store.put("../escape.json", b"x", "application/json"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = InMemoryBlobStore::new();
        store.put("forms/x.json", b"{}", "application/json").unwrap();
        assert_eq!(store.get("forms/x.json").unwrap().bytes, b"{}");
        assert!(matches!(store.get("forms/y.json"), Err(StorageError::NotFound(_))));
    }
}
