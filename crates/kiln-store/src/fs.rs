//! Flat file storage backend for the history blob and trace files.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::StoreError;

/// A flat namespace of small files.
pub trait TraceFs: Send {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError>;
    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError>;
    /// Removing a missing file is a successful no-op.
    fn remove(&mut self, name: &str) -> Result<(), StoreError>;
    fn exists(&self, name: &str) -> Result<bool, StoreError>;
}

/// In-memory backend; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemFs(Arc<Mutex<HashMap<String, Vec<u8>>>>);

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceFs for MemFs {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.0.lock().get(name).cloned())
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        self.0.lock().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        self.0
            .lock()
            .entry(name.to_string())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        self.0.lock().remove(name);
        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.0.lock().contains_key(name))
    }
}

/// Directory backend: one file per name under the root.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl TraceFs for DirFs {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(self.path(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        std::fs::write(self.path(name), data)?;
        Ok(())
    }

    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(name))?;
        file.write_all(data)?;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.path(name).exists())
    }
}
