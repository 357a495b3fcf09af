//! # Activity File Store
//!
//! `ActivityStore` over a JSON file of `{category, minute, count}` records.
//!
//! Every operation takes an exclusive lock on a sibling `.lock` file, then
//! re-reads, updates and rewrites the buckets before releasing it. Consumer
//! processes sharing one file therefore never lose each other's increments.
//! Rewrites go through a staging file and a rename.

use async_trait::async_trait;
use ec_02_activity_log::{ActivityBucket, ActivityError, ActivityStore, BucketRecord};
use fs2::FileExt;
use shared_types::EventCategory;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

type Buckets = BTreeMap<(EventCategory, i64), u64>;

#[derive(Debug, Error)]
pub enum ActivityFileError {
    #[error("cannot access activity file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("activity file {path} is not valid: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("activity file task failed: {0}")]
    Task(String),
}

impl From<ActivityFileError> for ActivityError {
    fn from(err: ActivityFileError) -> Self {
        ActivityError::Store(err.to_string())
    }
}

/// File-backed activity buckets shared by every process that opens the path.
#[derive(Debug, Clone)]
pub struct FileActivityStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileActivityStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable one is rejected up front.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ActivityFileError> {
        let path = path.into();
        let store = Self {
            lock_path: path.with_extension("lock"),
            path,
        };
        let buckets = store.locked(false, |buckets| buckets.len())?;
        debug!(path = %store.path.display(), buckets, "opened activity file");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every bucket, ordered by category then minute.
    pub fn snapshot(&self) -> Result<Vec<BucketRecord>, ActivityFileError> {
        self.locked(false, |buckets| {
            buckets
                .iter()
                .map(|(&(category, minute), &count)| BucketRecord {
                    category,
                    minute,
                    count,
                })
                .collect()
        })
    }

    /// Count in one bucket, 0 when absent.
    pub fn count(&self, category: EventCategory, minute: i64) -> Result<u64, ActivityFileError> {
        self.locked(false, |buckets| {
            buckets.get(&(category, minute)).copied().unwrap_or(0)
        })
    }

    /// Run `f` over the current buckets while holding the file lock. When
    /// `write` is set the buckets are saved before the lock is released.
    fn locked<T>(
        &self,
        write: bool,
        f: impl FnOnce(&mut Buckets) -> T,
    ) -> Result<T, ActivityFileError> {
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|source| self.io_error(&self.lock_path, source))?;
        lock.lock_exclusive()
            .map_err(|source| self.io_error(&self.lock_path, source))?;

        let mut buckets = self.read_buckets()?;
        let result = f(&mut buckets);
        if write {
            self.write_buckets(&buckets)?;
        }
        // lock released when `lock` is closed
        Ok(result)
    }

    fn read_buckets(&self) -> Result<Buckets, ActivityFileError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Buckets::new()),
            Err(source) => return Err(self.io_error(&self.path, source)),
        };

        let records: Vec<BucketRecord> =
            serde_json::from_slice(&raw).map_err(|source| ActivityFileError::Format {
                path: self.path.clone(),
                source,
            })?;
        let mut buckets = Buckets::new();
        for record in records {
            let count = buckets.entry((record.category, record.minute)).or_insert(0);
            *count = count.saturating_add(record.count);
        }
        Ok(buckets)
    }

    fn write_buckets(&self, buckets: &Buckets) -> Result<(), ActivityFileError> {
        let records: Vec<BucketRecord> = buckets
            .iter()
            .map(|(&(category, minute), &count)| BucketRecord {
                category,
                minute,
                count,
            })
            .collect();
        let encoded =
            serde_json::to_vec_pretty(&records).map_err(|source| ActivityFileError::Format {
                path: self.path.clone(),
                source,
            })?;

        let staging = self.path.with_extension("tmp");
        fs::write(&staging, encoded).map_err(|source| self.io_error(&staging, source))?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(&self.path, source))?;
        Ok(())
    }

    fn io_error(&self, path: &Path, source: io::Error) -> ActivityFileError {
        ActivityFileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Run blocking file work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, ActivityError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ActivityFileError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ActivityFileError::Task(e.to_string()))?;
    Ok(result?)
}

#[async_trait]
impl ActivityStore for FileActivityStore {
    async fn increment(
        &self,
        category: EventCategory,
        minute: i64,
        by: u64,
    ) -> Result<u64, ActivityError> {
        let store = self.clone();
        blocking(move || {
            store.locked(true, |buckets| {
                let count = buckets.entry((category, minute)).or_insert(0);
                *count = count.saturating_add(by);
                *count
            })
        })
        .await
    }

    async fn prune_before(
        &self,
        category: EventCategory,
        before: i64,
    ) -> Result<usize, ActivityError> {
        let store = self.clone();
        blocking(move || {
            store.locked(true, |buckets| {
                let size = buckets.len();
                buckets.retain(|(c, minute), _| *c != category || *minute >= before);
                size - buckets.len()
            })
        })
        .await
    }

    async fn range(
        &self,
        category: EventCategory,
        start: i64,
        end: i64,
    ) -> Result<Vec<ActivityBucket>, ActivityError> {
        if start > end {
            return Ok(Vec::new());
        }
        let store = self.clone();
        blocking(move || {
            store.locked(false, |buckets| {
                buckets
                    .range((category, start)..=(category, end))
                    .map(|(&(_, minute), &count)| ActivityBucket { minute, count })
                    .collect()
            })
        })
        .await
    }
}
