//! BITLOG - Engine Configuration
//! Defines tunable parameters for the storage engine and loads them
//! from the process environment.

use std::path::{Path, PathBuf};

use crate::error::{BitLogError, Result};

/// Environment variable naming the data file.
pub const ENV_DB_FILENAME: &str = "DB_FILENAME";
/// Environment variable toggling fsync per write.
pub const ENV_SYNC_WRITES: &str = "DB_SYNC_WRITES";
/// Environment variable toggling the serializing write worker.
pub const ENV_WRITE_WORKER: &str = "DB_WRITE_WORKER";
/// Environment variable for the write worker's queue depth.
pub const ENV_WORKER_QUEUE_DEPTH: &str = "DB_WORKER_QUEUE_DEPTH";

/// Configuration for the BitLog storage engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// The single append-only data file.
    pub data_file: PathBuf,

    /// Whether to sync each append to disk before acknowledging it.
    pub sync_writes: bool,

    /// Route writes through a dedicated worker thread instead of
    /// letting callers take the writer lock themselves.
    pub write_worker: bool,

    /// Bounded queue size for the write worker.
    pub worker_queue_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./data/bitlog.db"),
            sync_writes: true,
            write_worker: false,
            worker_queue_depth: 1024,
        }
    }
}

impl Config {
    /// Create a new Config with a custom data file.
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            ..Default::default()
        }
    }

    /// Enable or disable fsync per write.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Enable or disable the write worker.
    pub fn with_write_worker(mut self, enabled: bool) -> Self {
        self.write_worker = enabled;
        self
    }

    /// Load configuration from the environment.
    ///
    /// `DB_FILENAME` is required; the other variables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_file = lookup(ENV_DB_FILENAME)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                BitLogError::Config(format!(
                    "missing required environment variable: {ENV_DB_FILENAME}"
                ))
            })?;

        let mut config = Config::new(data_file);
        if let Some(raw) = lookup(ENV_SYNC_WRITES) {
            config.sync_writes = parse_bool(ENV_SYNC_WRITES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_WRITE_WORKER) {
            config.write_worker = parse_bool(ENV_WRITE_WORKER, &raw)?;
        }
        if let Some(raw) = lookup(ENV_WORKER_QUEUE_DEPTH) {
            let depth: usize = raw.trim().parse().map_err(|_| {
                BitLogError::Config(format!("{ENV_WORKER_QUEUE_DEPTH}: not a number: {raw:?}"))
            })?;
            if depth == 0 {
                return Err(BitLogError::Config(format!(
                    "{ENV_WORKER_QUEUE_DEPTH} must be greater than 0"
                )));
            }
            config.worker_queue_depth = depth;
        }
        Ok(config)
    }

    /// Ensure the directory holding the data file exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        match self.data_file.parent() {
            Some(dir) if dir != Path::new("") => std::fs::create_dir_all(dir),
            _ => Ok(()),
        }
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BitLogError::Config(format!(
            "{name}: expected a boolean, got {raw:?}"
        ))),
    }
}
