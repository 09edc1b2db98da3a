//! BITLOG - Engine Metrics
//! Atomic operation counters, readable from any thread without locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic operation counters for the BitLog engine.
///
/// All counters use `Ordering::Relaxed`: they are for observability only
/// and never used for synchronization.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Total number of `set` operations.
    pub sets: AtomicU64,
    /// Total number of `delete` operations.
    pub deletes: AtomicU64,
    /// Total number of `get` operations.
    pub gets: AtomicU64,
    /// `get` calls that returned not-found (absent or tombstoned).
    pub misses: AtomicU64,
    /// Total bytes appended to the log, frame headers included.
    pub bytes_appended: AtomicU64,
    /// Number of completed recoveries.
    pub recoveries: AtomicU64,
    /// Frames replayed across all recoveries.
    pub records_replayed: AtomicU64,
    /// Timestamp when the engine was opened.
    engine_started: Instant,
}

impl EngineMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            bytes_appended: AtomicU64::new(0),
            recoveries: AtomicU64::new(0),
            records_replayed: AtomicU64::new(0),
            engine_started: Instant::now(),
        }
    }

    /// Record a set that appended `frame_len` bytes.
    pub fn record_set(&self, frame_len: u64) {
        self.sets.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended.fetch_add(frame_len, Ordering::Relaxed);
    }

    /// Record a delete that appended `frame_len` bytes.
    pub fn record_delete(&self, frame_len: u64) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended.fetch_add(frame_len, Ordering::Relaxed);
    }

    /// Record a get and whether it found a live value.
    pub fn record_get(&self, hit: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a completed recovery.
    pub fn record_recovery(&self, records: u64) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
        self.records_replayed.fetch_add(records, Ordering::Relaxed);
    }

    /// Engine uptime in seconds.
    pub fn uptime_secs(&self) -> f64 {
        self.engine_started.elapsed().as_secs_f64()
    }

    /// Total number of request operations (sets + deletes + gets).
    pub fn total_ops(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
            + self.deletes.load(Ordering::Relaxed)
            + self.gets.load(Ordering::Relaxed)
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ BITLOG Engine Metrics ═══\n\
             Operations:\n\
               sets:      {}\n\
               deletes:   {}\n\
               gets:      {}\n\
               misses:    {}\n\
             I/O:\n\
               appended:  {} bytes\n\
             Recovery:\n\
               recoveries:       {}\n\
               records replayed: {}\n\
             Uptime: {:.2}s",
            self.sets.load(Ordering::Relaxed),
            self.deletes.load(Ordering::Relaxed),
            self.gets.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.bytes_appended.load(Ordering::Relaxed),
            self.recoveries.load(Ordering::Relaxed),
            self.records_replayed.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
