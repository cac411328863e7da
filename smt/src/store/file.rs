//! A store persisted as a single append-only log.
//!
//! Every mutation appends one record:
//!
//! ```text
//! [checksum: u64][kind: u8][key_len: u32][value_len: u32][key][value]
//! ```
//!
//! All integers are little-endian. The checksum is XXH64 over everything following it. A `kind`
//! of [`KIND_SET`] stores the value under the key; [`KIND_DELETE`] is a tombstone and carries an
//! empty value.
//!
//! On open the whole log is replayed into an in-memory map. Replay stops at the first record that
//! is incomplete or fails its checksum; that record and anything after it are truncated away, as
//! they can only be the remains of a write that was interrupted.
//!
//! The log is never compacted. Overwritten values, tombstones and nodes no longer reachable from
//! any root stay in it, so it grows without bound for as long as the store is written to.
//!
//! Records are always written at the end of the confirmed prefix of the log. A write or sync that
//! fails is cut back off the file before the error is returned; if even that fails, the cut is
//! retried before the next write, and every write fails until it succeeds.

use super::{flock::DirLock, KVStore};
use crate::Options;
use anyhow::{bail, Context as _, Result};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::{
    fs::{File, OpenOptions},
    io::{self, Read as _, Seek as _, SeekFrom, Write as _},
    path::{Path, PathBuf},
    sync::Arc,
};
use twox_hash::XxHash64;

const LOG_FILENAME: &str = "store.log";
const LOCK_FILENAME: &str = ".lock";

const KIND_SET: u8 = 0;
const KIND_DELETE: u8 = 1;

const CHECKSUM_SIZE: usize = 8;
const HEADER_SIZE: usize = CHECKSUM_SIZE + 1 + 4 + 4;

/// A store persisted in a directory.
///
/// This is a lightweight handle and can be cloned cheaply. Clones refer to the same open log.
#[derive(Clone)]
pub struct FileStore {
    shared: Arc<RwLock<Option<Shared>>>,
    dir: Arc<PathBuf>,
}

struct Shared {
    map: FxHashMap<Vec<u8>, Vec<u8>>,
    log: File,
    fsync: bool,
    /// Length of the log made of confirmed records.
    len: u64,
    /// Set while bytes past `len` may remain from a failed write.
    torn: bool,
    _lock: DirLock,
}

impl FileStore {
    /// Open the store in the directory given by `o`, creating the directory if needed.
    ///
    /// Fails if the directory is locked by another open store.
    pub fn open(o: &Options) -> Result<Self> {
        let dir = o.dir();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating store directory {}", dir.display()))?;
        let lock = DirLock::acquire(dir, LOCK_FILENAME)?;

        let log_path = dir.join(LOG_FILENAME);
        let mut log = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&log_path)
            .with_context(|| format!("opening {}", log_path.display()))?;

        let mut contents = Vec::new();
        log.read_to_end(&mut contents)?;
        let Replay { map, valid_len } = replay(&contents);

        if valid_len < contents.len() {
            tracing::warn!(
                path = %log_path.display(),
                discarded = contents.len() - valid_len,
                "truncating torn record at the end of the store log",
            );
            log.set_len(valid_len as u64)?;
            log.sync_data()?;
        }

        tracing::info!(dir = %dir.display(), entries = map.len(), "opened file store");

        Ok(FileStore {
            shared: Arc::new(RwLock::new(Some(Shared {
                map,
                log,
                fsync: o.fsync,
                len: valid_len as u64,
                torn: false,
                _lock: lock,
            }))),
            dir: Arc::new(dir.to_path_buf()),
        })
    }

    /// The directory this store lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append(&self, kind: u8, key: &[u8], value: &[u8]) -> Result<()> {
        let mut shared = self.shared.write();
        let Some(shared) = shared.as_mut() else {
            bail!("store stopped");
        };

        let record = encode_record(kind, key, value)?;
        shared.append_record(&record)?;

        match kind {
            KIND_SET => {
                shared.map.insert(key.to_vec(), value.to_vec());
            }
            _ => {
                shared.map.remove(key);
            }
        }
        Ok(())
    }
}

impl Shared {
    fn append_record(&mut self, record: &[u8]) -> Result<()> {
        if self.torn {
            self.log
                .set_len(self.len)
                .context("store log has a failed write that could not be cut off")?;
            self.torn = false;
        }

        if let Err(e) = write_at(&mut self.log, self.len, record, self.fsync) {
            self.cut_failed_write();
            return Err(e.into());
        }
        self.len += record.len() as u64;
        Ok(())
    }

    fn cut_failed_write(&mut self) {
        if let Err(e) = self.log.set_len(self.len) {
            tracing::warn!(len = self.len, "failed to cut a failed write off the store log: {e}");
            self.torn = true;
        }
    }
}

fn write_at(log: &mut File, pos: u64, record: &[u8], fsync: bool) -> io::Result<()> {
    log.seek(SeekFrom::Start(pos))?;
    log.write_all(record)?;
    if fsync {
        log.sync_data()?;
    }
    Ok(())
}

impl KVStore for FileStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.shared.read().as_ref() {
            Some(shared) => Ok(shared.map.get(key).cloned()),
            None => bail!("store stopped"),
        }
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.append(KIND_SET, key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        // no tombstone is needed for a key the log never mentions, or mentions as deleted.
        match self.shared.read().as_ref() {
            Some(shared) if !shared.map.contains_key(key) => return Ok(()),
            Some(_) => {}
            None => bail!("store stopped"),
        }
        self.append(KIND_DELETE, key, &[])
    }

    fn stop(&self) -> Result<()> {
        let Some(shared) = self.shared.write().take() else {
            return Ok(());
        };
        if shared.torn {
            shared.log.set_len(shared.len)?;
        }
        shared.log.sync_all()?;
        tracing::info!(dir = %self.dir.display(), "stopped file store");
        Ok(())
    }
}

fn checksum(data: &[u8]) -> u64 {
    XxHash64::oneshot(0, data)
}

fn encode_record(kind: u8, key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    let key_len = u32::try_from(key.len()).context("key too large")?;
    let value_len = u32::try_from(value.len()).context("value too large")?;

    let mut record = Vec::with_capacity(HEADER_SIZE + key.len() + value.len());
    record.extend_from_slice(&[0; CHECKSUM_SIZE]);
    record.push(kind);
    record.extend_from_slice(&key_len.to_le_bytes());
    record.extend_from_slice(&value_len.to_le_bytes());
    record.extend_from_slice(key);
    record.extend_from_slice(value);

    let sum = checksum(&record[CHECKSUM_SIZE..]);
    record[..CHECKSUM_SIZE].copy_from_slice(&sum.to_le_bytes());
    Ok(record)
}

struct Replay {
    map: FxHashMap<Vec<u8>, Vec<u8>>,
    /// The length of the prefix of the log made of intact records.
    valid_len: usize,
}

fn replay(log: &[u8]) -> Replay {
    let mut map = FxHashMap::default();
    let mut pos = 0;

    while let Some(record) = decode_record(&log[pos..]) {
        match record.kind {
            KIND_SET => {
                map.insert(record.key.to_vec(), record.value.to_vec());
            }
            _ => {
                map.remove(record.key);
            }
        }
        pos += record.len;
    }

    Replay {
        map,
        valid_len: pos,
    }
}

struct Record<'a> {
    kind: u8,
    key: &'a [u8],
    value: &'a [u8],
    /// Total encoded length, header included.
    len: usize,
}

/// Decode the record at the start of `buf`. `None` if there is no intact record there.
fn decode_record(buf: &[u8]) -> Option<Record<'_>> {
    let header = buf.get(..HEADER_SIZE)?;
    let expected = u64::from_le_bytes(header[..CHECKSUM_SIZE].try_into().ok()?);
    let kind = header[CHECKSUM_SIZE];
    let key_len = u32::from_le_bytes(header[9..13].try_into().ok()?) as usize;
    let value_len = u32::from_le_bytes(header[13..17].try_into().ok()?) as usize;

    let len = HEADER_SIZE.checked_add(key_len)?.checked_add(value_len)?;
    let body = buf.get(CHECKSUM_SIZE..len)?;
    if checksum(body) != expected || (kind != KIND_SET && kind != KIND_DELETE) {
        return None;
    }

    let key = &buf[HEADER_SIZE..HEADER_SIZE + key_len];
    let value = &buf[HEADER_SIZE + key_len..len];
    Some(Record {
        kind,
        key,
        value,
        len,
    })
}
