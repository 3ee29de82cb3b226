//! File-backed append-only logs
//!
//! Each log lives in its own directory under the store root:
//! `{base_dir}/{hex(identity)}/entries.bin`.
//!
//! Appends are atomic: the complete new state is written to a temporary file,
//! synced, then renamed over the previous file. A crash mid-append leaves
//! either the old or the new state on disk, never a mix.
//!
//! Writers are serialized per log by an exclusive advisory lock on
//! `{base_dir}/{hex(identity)}/lock`, so separate handles and separate
//! processes observe one total order of appends.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use multisig_core::merkle::tree_hash;
use multisig_core::{Entry, Hash32, Identity};
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{LogError, Result};
use crate::traits::{check_range, AppendLog};
use crate::tree::LogTree;

const ENTRIES_FILE: &str = "entries.bin";
const LOCK_FILE: &str = "lock";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A log persisted as a single atomically replaced file
pub struct FileLog {
    identity: Identity,
    dir: PathBuf,
    poll_interval: Duration,
    write_lock: Mutex<()>,
}

impl FileLog {
    /// Open the log stored in `dir`; a missing file reads as an empty log
    pub fn open(dir: impl AsRef<Path>, identity: Identity) -> Self {
        Self {
            identity,
            dir: dir.as_ref().to_path_buf(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_lock: Mutex::new(()),
        }
    }

    /// Override how often `await_length` re-reads the file
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn entries_path(&self) -> PathBuf {
        self.dir.join(ENTRIES_FILE)
    }

    /// Take the cross-process write lock for this log
    async fn lock(&self) -> Result<DirLock> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(LOCK_FILE);
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(path)?;
            lock_exclusive(&file)?;
            Ok(file)
        })
        .await
        .map_err(|e| LogError::Io(std::io::Error::other(e)))??;
        Ok(DirLock { _file: file })
    }

    async fn load(&self) -> Result<Vec<Entry>> {
        match tokio::fs::read(self.entries_path()).await {
            Ok(bytes) => Ok(bincode::deserialize(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(LogError::Io(e)),
        }
    }

    async fn persist(&self, entries: &[Entry]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = bincode::serialize(entries)?;

        // Each writer gets its own temp file in the same directory.
        let path = self.entries_path();
        let tmp_path = self
            .dir
            .join(format!("{ENTRIES_FILE}.{:016x}.tmp", OsRng.next_u64()));
        if let Err(e) = write_synced(&tmp_path, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(LogError::Io(e));
        }
        sync_dir(&self.dir).await
    }
}

/// Held for the duration of an append; dropping the file releases the lock
struct DirLock {
    _file: std::fs::File,
}

#[cfg(unix)]
fn lock_exclusive(file: &std::fs::File) -> std::io::Result<()> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    flock(file.as_raw_fd(), FlockArg::LockExclusive).map_err(std::io::Error::from)
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

/// Make a completed rename durable
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl AppendLog for FileLog {
    fn identity(&self) -> Identity {
        self.identity
    }

    async fn length(&self) -> Result<u64> {
        Ok(self.load().await?.len() as u64)
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<Entry>> {
        let entries = self.load().await?;
        let (start, end) = check_range(start, end, entries.len() as u64)?;
        Ok(entries[start..end].to_vec())
    }

    async fn tree_hash_at(&self, length: u64) -> Result<Hash32> {
        let entries = self.load().await?;
        let (_, end) = check_range(0, length, entries.len() as u64)?;
        Ok(tree_hash(&entries[..end]))
    }

    async fn append(&self, at: u64, entries: Vec<Entry>) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let _dir_lock = self.lock().await?;
        let mut current = self.load().await?;
        let actual = current.len() as u64;
        if actual != at {
            return Err(LogError::LengthConflict {
                expected: at,
                actual,
            });
        }

        let count = entries.len();
        current.extend(entries);
        self.persist(&current).await?;

        let length = current.len() as u64;
        debug!(identity = %self.identity, appended = count, length, "Appended to file log");
        Ok(length)
    }

    async fn await_length(&self, length: u64, timeout: Duration) -> Result<()> {
        let poll = async {
            loop {
                if self.length().await? >= length {
                    return Ok::<(), LogError>(());
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(LogError::Timeout {
                length,
                have: self.length().await?,
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

/// Directory of file-backed logs addressed by identity
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed
    pub async fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    fn log_dir(&self, identity: &Identity) -> PathBuf {
        self.base_dir.join(identity.to_hex())
    }

    /// Open (or lazily create) the log for `identity`
    pub fn log(&self, identity: Identity) -> FileLog {
        FileLog::open(self.log_dir(&identity), identity)
    }

    /// Open the log for `identity`, failing if the store has never held it
    pub async fn existing_log(&self, identity: Identity) -> Result<FileLog> {
        let dir = self.log_dir(&identity);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(FileLog::open(dir, identity)),
            Ok(_) => Err(LogError::NotFound(identity)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LogError::NotFound(identity))
            }
            Err(e) => Err(LogError::Io(e)),
        }
    }

    /// Create a new empty log with a random identity
    pub async fn create_log(&self) -> Result<FileLog> {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let identity = Identity::from_bytes(bytes);

        let log = self.log(identity);
        log.persist(&[]).await?;
        info!(%identity, "Created local log");
        Ok(log)
    }

    /// Both logs of the tree whose metadata log is `metadata`
    pub fn tree(&self, metadata: Identity) -> LogTree<FileLog> {
        LogTree::new(self.log(metadata), self.log(metadata.content_companion()))
    }

    /// Both logs of an existing tree
    pub async fn existing_tree(&self, metadata: Identity) -> Result<LogTree<FileLog>> {
        let metadata_log = self.existing_log(metadata).await?;
        // A tree may not have written any content yet.
        let content_log = self.log(metadata.content_companion());
        Ok(LogTree::new(metadata_log, content_log))
    }
}
