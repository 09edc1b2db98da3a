//! BITLOG - Shared Engine Handle
//! Cloneable, thread-safe handle around one `BitLog` engine.
//!
//! ## Concurrency Model
//! - **Reads** (`get`, `scan`) take the index read lock briefly, then read
//!   the log with positioned I/O; they run in parallel with each other and
//!   with appends.
//! - **Writes** (`set`, `delete`) are serialized through the log store's
//!   writer lock, or through the write worker when `Config::write_worker`
//!   is set.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::types::{Entity, Key, Value};

use super::metrics::EngineMetrics;
use super::recovery::RecoveryStats;
use super::worker::WriteWorker;
use super::BitLog;

/// Thread-safe handle to a recovered BitLog engine.
///
/// ## Example
/// ```no_run
/// use bitlog::engine::concurrent::SharedBitLog;
/// use bitlog::config::Config;
/// use std::thread;
///
/// let (engine, _stats) = SharedBitLog::open(Config::new("./data/bitlog.db")).unwrap();
///
/// let writer = engine.clone();
/// thread::spawn(move || {
///     writer.set("key", b"value".to_vec()).unwrap();
/// })
/// .join()
/// .unwrap();
///
/// assert!(engine.get("key").unwrap().is_some());
/// ```
#[derive(Clone)]
pub struct SharedBitLog {
    inner: Arc<BitLog>,
    worker: Option<Arc<WriteWorker>>,
}

impl SharedBitLog {
    /// Open the engine, replay the log and start the write worker if
    /// configured. The returned handle is ready to serve.
    pub fn open(config: Config) -> Result<(Self, RecoveryStats)> {
        let engine = BitLog::open(config)?;
        let stats = engine.recover()?;
        let inner = Arc::new(engine);

        let worker = if inner.config().write_worker {
            let depth = inner.config().worker_queue_depth;
            Some(Arc::new(WriteWorker::spawn(inner.clone(), depth)?))
        } else {
            None
        };

        Ok((Self { inner, worker }, stats))
    }

    /// Store `value` under `key`.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<u64> {
        match &self.worker {
            Some(worker) => worker.submit(Entity::live(key, value)),
            None => self.inner.set(key, value),
        }
    }

    /// Append a tombstone for `key`.
    pub fn delete(&self, key: impl Into<Key>) -> Result<u64> {
        match &self.worker {
            Some(worker) => worker.submit(Entity::tombstone(key)),
            None => self.inner.delete(key),
        }
    }

    /// Latest live entity for `key`.
    pub fn get(&self, key: &str) -> Result<Option<Entity>> {
        self.inner.get(key)
    }

    /// All live entries, sorted by key.
    pub fn scan(&self) -> Result<Vec<(Key, Value)>> {
        self.inner.scan()
    }

    /// Number of indexed keys, deleted ones included.
    pub fn key_count(&self) -> usize {
        self.inner.key_count()
    }

    /// Size of the log in bytes.
    pub fn log_size(&self) -> u64 {
        self.inner.log_size()
    }

    /// Engine operation counters.
    pub fn metrics(&self) -> &EngineMetrics {
        self.inner.metrics()
    }

    /// Borrow the underlying engine.
    pub fn engine(&self) -> &BitLog {
        &self.inner
    }

    /// Drain and stop the write worker, if any. Writes issued afterwards
    /// through this handle (or its clones) fail with `WorkerClosed`.
    pub fn close(&self) {
        if let Some(worker) = &self.worker {
            worker.close();
        }
    }
}
