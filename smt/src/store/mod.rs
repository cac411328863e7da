//! Key-value stores backing the tree.
//!
//! The tree uses two independent stores: one for nodes, keyed by node hash, and one for values,
//! keyed by key path. Anything implementing [`KVStore`] will do; [`Store`] picks between the
//! bundled in-memory and on-disk implementations based on [`Options`].

use crate::Options;
use anyhow::Result;
use smt_core::cursor::NodeReader;

pub use self::{file::FileStore, mem::MemStore};

mod file;
mod flock;
mod mem;

/// A generic byte-oriented key-value store.
///
/// Implementations synchronize internally; handles are shared by reference. After
/// [`KVStore::stop`] returns, every further operation fails.
pub trait KVStore: Send + Sync {
    /// Load the value stored under the given key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    /// Store a value under the given key, replacing any previous value.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;
    /// Remove the value under the given key. Removing an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<()>;
    /// Release the resources held by the store.
    fn stop(&self) -> Result<()>;
}

impl<S: KVStore + ?Sized> KVStore for &S {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    fn stop(&self) -> Result<()> {
        (**self).stop()
    }
}

/// Either of the bundled stores.
///
/// This is a lightweight handle and can be cloned cheaply. Clones refer to the same data.
#[derive(Clone)]
pub enum Store {
    /// An ephemeral store.
    Memory(MemStore),
    /// A store persisted in a directory.
    File(FileStore),
}

impl Store {
    /// Open the store with the provided `Options`. An empty path opens an in-memory store.
    pub fn open(o: &Options) -> Result<Self> {
        if o.is_ephemeral() {
            Ok(Store::Memory(MemStore::new()))
        } else {
            Ok(Store::File(FileStore::open(o)?))
        }
    }

    /// Open an in-memory store.
    pub fn memory() -> Self {
        Store::Memory(MemStore::new())
    }
}

impl KVStore for Store {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            Store::Memory(s) => s.get(key),
            Store::File(s) => s.get(key),
        }
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        match self {
            Store::Memory(s) => s.set(key, value),
            Store::File(s) => s.set(key, value),
        }
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        match self {
            Store::Memory(s) => s.delete(key),
            Store::File(s) => s.delete(key),
        }
    }

    fn stop(&self) -> Result<()> {
        match self {
            Store::Memory(s) => s.stop(),
            Store::File(s) => s.stop(),
        }
    }
}

/// Exposes a node store to the core algorithms.
pub(crate) struct NodeStoreReader<'a, S>(pub(crate) &'a S);

impl<S: KVStore> NodeReader for NodeStoreReader<'_, S> {
    type Error = anyhow::Error;

    fn read_node(&self, hash: &[u8]) -> Result<Option<Vec<u8>>> {
        self.0.get(hash)
    }
}
