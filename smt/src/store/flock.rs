//! Keeps a store directory to a single open [`FileStore`](super::FileStore).
//!
//! The lock is an exclusive advisory lock on a file inside the directory. The process holding it
//! writes its id into the file so that a refused open can say who has the directory.

use anyhow::{bail, Context as _, Result};
use fs2::FileExt as _;
use std::{
    fs::{File, OpenOptions},
    io::{Read as _, Write as _},
    path::{Path, PathBuf},
};

/// The lock on a store directory. Released on drop.
pub struct DirLock {
    file: File,
    dir: PathBuf,
}

impl DirLock {
    /// Lock `dir` through the file `name` inside it.
    ///
    /// Does not wait: fails right away if another store has the directory open.
    pub fn acquire(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(name);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("opening lock file {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            let mut holder = String::new();
            let _ = file.read_to_string(&mut holder);
            let holder = match holder.trim() {
                "" => "another process".to_owned(),
                pid => format!("process {pid}"),
            };
            bail!(
                "store directory {} is in use by {holder}: {}",
                dir.display(),
                fs2::lock_contended_error(),
            );
        }

        file.set_len(0)?;
        file.write_all(std::process::id().to_string().as_bytes())?;

        Ok(DirLock {
            file,
            dir: dir.to_path_buf(),
        })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(dir = %self.dir.display(), "failed to unlock store directory: {e}");
        }
    }
}
