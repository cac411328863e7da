use super::KVStore;
use anyhow::{bail, Result};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// An ephemeral store keeping everything in a hash map.
///
/// This is a lightweight handle and can be cloned cheaply. Clones refer to the same map.
#[derive(Clone)]
pub struct MemStore {
    // `None` once stopped.
    map: Arc<RwLock<Option<FxHashMap<Vec<u8>, Vec<u8>>>>>,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemStore {
            map: Arc::new(RwLock::new(Some(FxHashMap::default()))),
        }
    }

    /// The number of entries in the store. Zero once stopped.
    pub fn len(&self) -> usize {
        self.map.read().as_ref().map_or(0, |map| map.len())
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KVStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.map.read().as_ref() {
            Some(map) => Ok(map.get(key).cloned()),
            None => bail!("store stopped"),
        }
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        match self.map.write().as_mut() {
            Some(map) => {
                map.insert(key.to_vec(), value.to_vec());
                Ok(())
            }
            None => bail!("store stopped"),
        }
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        match self.map.write().as_mut() {
            Some(map) => {
                map.remove(key);
                Ok(())
            }
            None => bail!("store stopped"),
        }
    }

    fn stop(&self) -> Result<()> {
        self.map.write().take();
        Ok(())
    }
}
