use std::path::{Path, PathBuf};

/// Options when opening a [`crate::store::Store`].
#[derive(Debug, Clone)]
pub struct Options {
    /// The directory where the store keeps its data. Empty means the store lives in memory.
    pub(crate) path: PathBuf,
    /// Whether every write is synced to disk before it is acknowledged.
    pub(crate) fsync: bool,
}

impl Options {
    /// Create a new `Options` instance with the default values: an in-memory store.
    pub fn new() -> Self {
        Self {
            path: PathBuf::new(),
            fsync: true,
        }
    }

    /// Set the directory where the store keeps its data.
    ///
    /// An empty path selects an ephemeral, in-memory store.
    pub fn path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    /// Set whether every write is synced to disk before it returns.
    ///
    /// Only relevant for on-disk stores. Turning this off trades durability of the most recent
    /// writes for speed; a torn record at the end of the log is discarded on the next open.
    ///
    /// Default: `true`.
    pub fn fsync(&mut self, fsync: bool) {
        self.fsync = fsync;
    }

    /// Whether these options describe an in-memory store.
    pub fn is_ephemeral(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.path
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}
