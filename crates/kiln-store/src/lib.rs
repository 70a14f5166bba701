//! # Kiln Persistence
//!
//! Storage for everything the controller keeps across power cycles:
//!
//! * **Profiles** — opaque blobs keyed by sanitized id plus an index blob,
//!   mirroring a key-value flash namespace.
//! * **Firing history** — a bounded, newest-first record list persisted as
//!   one JSON blob, with a minute-resolution CSV trace file per firing.
//! * **Settings** — per-value scalar entries; floats are stored as scaled
//!   integers so flash never holds a floating-point representation.
//! * **PID gains and the element-hours counter** — via the engine's
//!   [`kiln_core::persist::Persistence`] capability.
//!
//! [`Store`] is generic over a key-value backend ([`kv::KvStore`]) and a
//! flat file backend ([`fs::TraceFs`]). The in-memory backends share state
//! between clones, so a simulation harness can hand one clone to the engine
//! and inspect the other; the directory backends map each key to a file.

pub mod errors;
pub mod fs;
pub mod history;
pub mod kv;
pub mod persist;
pub mod profiles;
pub mod settings;

pub use errors::StoreError;
pub use fs::{DirFs, MemFs, TraceFs};
pub use kv::{DirKv, KvStore, MemKv};

use std::path::Path;

/// Facade over the two storage backends.
///
/// Clones of a `Store` built on the in-memory backends observe each other's
/// writes; clones of a directory store simply reopen the same tree.
#[derive(Debug, Clone)]
pub struct Store<K, F> {
    pub(crate) kv: K,
    pub(crate) fs: F,
}

impl<K: KvStore, F: TraceFs> Store<K, F> {
    pub fn new(kv: K, fs: F) -> Self {
        Self { kv, fs }
    }
}

/// Store backed by shared in-memory maps.
pub type MemStore = Store<MemKv, MemFs>;

impl MemStore {
    pub fn in_memory() -> Self {
        Store::new(MemKv::new(), MemFs::new())
    }
}

/// Store backed by a directory tree.
pub type DirStore = Store<DirKv, DirFs>;

impl DirStore {
    /// Opens (creating if needed) a store rooted at `root`: key-value pairs
    /// under `root/kv/`, trace and history files under `root/files/`.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        Ok(Store::new(
            DirKv::open(&root.join("kv"))?,
            DirFs::open(&root.join("files"))?,
        ))
    }
}
