//! BITLOG - Storage Engine Module
//! Composes the record codec, log store and offset index into the engine.

pub mod codec;
pub mod concurrent;
pub mod index;
pub mod log_store;
pub mod metrics;
pub mod recovery;
pub mod worker;

use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::config::Config;
use crate::error::{BitLogError, Result};
use crate::types::{Entity, Key, Value};

use self::index::OffsetIndex;
use self::log_store::{LogStore, FRAME_HEADER_LEN};
use self::metrics::EngineMetrics;
use self::recovery::RecoveryStats;

/// Lifecycle of an engine: `Uninitialized -> Recovering -> Ready`.
///
/// Only `Ready` serves `set`, `get` and `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    Uninitialized = 0,
    Recovering = 1,
    Ready = 2,
}

impl EngineState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => EngineState::Recovering,
            2 => EngineState::Ready,
            _ => EngineState::Uninitialized,
        }
    }
}

/// The core BitLog storage engine.
///
/// Writes go codec -> log store -> index. Reads go index -> log store ->
/// codec. The engine is `Sync`: share it behind an `Arc` (or use
/// [`concurrent::SharedBitLog`]) to serve many threads.
pub struct BitLog {
    /// Append-only data file.
    store: LogStore,
    /// Key -> offset of the latest frame.
    index: OffsetIndex,
    /// Current `EngineState`.
    state: AtomicU8,
    /// Operation counters.
    metrics: EngineMetrics,
    /// Engine configuration.
    config: Config,
}

impl BitLog {
    /// Open or create the data file. The engine starts `Uninitialized`;
    /// call [`BitLog::recover`] before serving requests.
    pub fn open(config: Config) -> Result<Self> {
        config.ensure_dirs()?;
        let store = LogStore::open(config.data_file.clone(), config.sync_writes)?;

        log::info!(
            "BitLog opened at {:?} ({} bytes of log)",
            store.path(),
            store.len()
        );

        Ok(Self {
            store,
            index: OffsetIndex::new(),
            state: AtomicU8::new(EngineState::Uninitialized as u8),
            metrics: EngineMetrics::new(),
            config,
        })
    }

    /// Rebuild the index by replaying the whole log, then become `Ready`.
    ///
    /// Calling it again on a `Ready` engine replays from scratch. On failure
    /// the engine drops back to `Uninitialized`.
    pub fn recover(&self) -> Result<RecoveryStats> {
        let current = self.state();
        if current == EngineState::Recovering
            || self
                .state
                .compare_exchange(
                    current as u8,
                    EngineState::Recovering as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
        {
            return Err(BitLogError::RecoveryInProgress);
        }

        let result = {
            let _writer = self.store.lock_writer();
            recovery::replay(&self.store, &self.index)
        };

        match result {
            Ok(stats) => {
                self.metrics.record_recovery(stats.records);
                self.set_state(EngineState::Ready);
                log::info!(
                    "Recovered {} records ({} tombstones, {} keys) from {:?}",
                    stats.records,
                    stats.tombstones,
                    stats.keys,
                    self.store.path()
                );
                Ok(stats)
            }
            Err(e) => {
                self.index.clear();
                self.set_state(EngineState::Uninitialized);
                Err(e)
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Store `value` under `key`. Returns the offset of the new frame.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<u64> {
        self.set_entity(Entity::live(key, value))
    }

    /// Store a live entity. The tombstone flag is forced off.
    pub fn set_entity(&self, mut entity: Entity) -> Result<u64> {
        self.ensure_ready()?;
        entity.tombstone = false;
        self.write_entity(entity)
    }

    /// Append a tombstone for `key`. Deleting an absent key still succeeds
    /// and leaves the key present-but-deleted in the index.
    pub fn delete(&self, key: impl Into<Key>) -> Result<u64> {
        self.ensure_ready()?;
        self.write_entity(Entity::tombstone(key))
    }

    /// Latest live entity for `key`, or `None` if absent or deleted.
    ///
    /// A frame that cannot be read or decoded at the indexed offset is an
    /// error, never a miss.
    pub fn get(&self, key: &str) -> Result<Option<Entity>> {
        self.ensure_ready()?;

        let Some(offset) = self.index.lookup(key) else {
            self.metrics.record_get(false);
            return Ok(None);
        };

        let entity = self.read_at(offset)?;
        if entity.key != key {
            return Err(BitLogError::CorruptRecord(format!(
                "index points {key:?} at offset {offset}, which holds {:?}",
                entity.key
            )));
        }

        if entity.is_tombstone() {
            self.metrics.record_get(false);
            Ok(None)
        } else {
            self.metrics.record_get(true);
            Ok(Some(entity))
        }
    }

    /// All live entries, sorted by key.
    pub fn scan(&self) -> Result<Vec<(Key, Value)>> {
        self.ensure_ready()?;
        let mut live = Vec::new();
        for (key, offset) in self.index.snapshot() {
            let entity = self.read_at(offset)?;
            if !entity.is_tombstone() {
                live.push((key, entity.value));
            }
        }
        Ok(live)
    }

    /// Number of indexed keys, deleted ones included.
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Size of the log in bytes.
    pub fn log_size(&self) -> u64 {
        self.store.len()
    }

    /// Path of the data file.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Engine configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Engine operation counters.
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Encode, append and index one entity.
    ///
    /// The index is updated while the writer lock is still held, so index
    /// order always matches log order.
    pub(crate) fn write_entity(&self, entity: Entity) -> Result<u64> {
        if entity.key.is_empty() {
            return Err(BitLogError::InvalidKey("key must not be empty".into()));
        }
        let payload = codec::encode(&entity)?;
        let frame_len = FRAME_HEADER_LEN + payload.len() as u64;
        let tombstone = entity.is_tombstone();
        let key = entity.key;

        let offset = self
            .store
            .append_then(&payload, |offset| self.index.upsert(key, offset))?;

        if tombstone {
            self.metrics.record_delete(frame_len);
        } else {
            self.metrics.record_set(frame_len);
        }
        Ok(offset)
    }

    pub(crate) fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            EngineState::Ready => Ok(()),
            other => Err(BitLogError::NotReady(other)),
        }
    }

    fn read_at(&self, offset: u64) -> Result<Entity> {
        let payload = self.store.read_frame(offset)?;
        codec::decode(&payload)
    }

    fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::Release);
    }
}
