//! Key-value storage backend.
//!
//! Models a flash key-value namespace: string keys inside named namespaces,
//! values are small byte strings. Scalars are stored little-endian through
//! the typed helpers so the on-flash contract is byte-stable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::StoreError;

/// Maximum key length imposed by the embedded key-value backend; longer ids
/// are truncated with [`nvs_key`] before use.
pub const KEY_MAX_LEN: usize = 15;

/// Truncates an identifier to the backend's key limit.
pub fn nvs_key(id: &str) -> String {
    id.chars().take(KEY_MAX_LEN).collect()
}

/// A namespaced key-value backend. Handles are opened per operation; nothing
/// is held across calls.
pub trait KvStore: Send {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StoreError>;
    /// Deleting a missing key is a successful no-op.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StoreError>;

    fn get_u8(&self, namespace: &str, key: &str) -> Result<Option<u8>, StoreError> {
        Ok(self.get(namespace, key)?.and_then(|b| b.first().copied()))
    }

    fn put_u8(&mut self, namespace: &str, key: &str, value: u8) -> Result<(), StoreError> {
        self.put(namespace, key, &[value])
    }

    fn get_i32(&self, namespace: &str, key: &str) -> Result<Option<i32>, StoreError> {
        Ok(self
            .get(namespace, key)?
            .and_then(|b| b.try_into().ok())
            .map(i32::from_le_bytes))
    }

    fn put_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<(), StoreError> {
        self.put(namespace, key, &value.to_le_bytes())
    }

    fn get_u32(&self, namespace: &str, key: &str) -> Result<Option<u32>, StoreError> {
        Ok(self
            .get(namespace, key)?
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes))
    }

    fn put_u32(&mut self, namespace: &str, key: &str, value: u32) -> Result<(), StoreError> {
        self.put(namespace, key, &value.to_le_bytes())
    }

    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        match self.get(namespace, key)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Corrupt(format!("{namespace}/{key} is not UTF-8"))),
            None => Ok(None),
        }
    }

    fn put_string(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.put(namespace, key, value.as_bytes())
    }
}

/// In-memory backend; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemKv(Arc<Mutex<HashMap<String, Vec<u8>>>>);

impl MemKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn full_key(namespace: &str, key: &str) -> String {
        format!("{namespace}/{key}")
    }
}

impl KvStore for MemKv {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.0.lock().get(&Self::full_key(namespace, key)).cloned())
    }

    fn put(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.0
            .lock()
            .insert(Self::full_key(namespace, key), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StoreError> {
        self.0.lock().remove(&Self::full_key(namespace, key));
        Ok(())
    }
}

/// Directory-tree backend: one file per key under `root/<namespace>/<key>`.
#[derive(Debug, Clone)]
pub struct DirKv {
    root: PathBuf,
}

impl DirKv {
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(namespace).join(key)
    }
}

impl KvStore for DirKv {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(self.path(namespace, key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&mut self, namespace: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path(namespace, key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, value)?;
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path(namespace, key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nvs_key_truncation() {
        assert_eq!(nvs_key("short"), "short");
        assert_eq!(nvs_key("a_rather_long_profile_id"), "a_rather_long_p");
        assert_eq!(nvs_key("a_rather_long_p").len(), KEY_MAX_LEN);
    }

    #[test]
    fn test_mem_kv_clones_share_state() {
        let mut a = MemKv::new();
        let b = a.clone();
        a.put_i32("pid", "kp", 20_000).unwrap();
        assert_eq!(b.get_i32("pid", "kp").unwrap(), Some(20_000));
    }

    #[test]
    fn test_scalar_roundtrips() {
        let mut kv = MemKv::new();
        kv.put_u8("settings", "unit", b'F').unwrap();
        kv.put_i32("settings", "tc_offset", -250).unwrap();
        kv.put_u32("element", "on_seconds", 3600).unwrap();
        kv.put_string("settings", "webhook", "http://example").unwrap();

        assert_eq!(kv.get_u8("settings", "unit").unwrap(), Some(b'F'));
        assert_eq!(kv.get_i32("settings", "tc_offset").unwrap(), Some(-250));
        assert_eq!(kv.get_u32("element", "on_seconds").unwrap(), Some(3600));
        assert_eq!(
            kv.get_string("settings", "webhook").unwrap().as_deref(),
            Some("http://example")
        );
        assert_eq!(kv.get_i32("settings", "missing").unwrap(), None);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut kv = MemKv::new();
        kv.delete("ns", "nothing").unwrap();
    }
}
