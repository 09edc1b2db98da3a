//! BITLOG - Append-Only Key-Value Storage Engine
//!
//! A single-file, Bitcask-style storage engine: every write is appended to
//! one log, an in-memory index maps each key to the offset of its latest
//! record, and reads go straight to that offset.
//!
//! ## Features
//! - **Log Store**: length-prefixed frames, positioned reads and writes
//! - **Offset Index**: `RwLock`-guarded hash map, last write wins
//! - **Tombstones**: deletes are appended records, never in-place erasure
//! - **Recovery**: full log replay rebuilds the index after restart
//! - **Write Worker**: optional single-thread write serialization
//! - **Metrics**: lock-free atomic counters
//!
//! ## Example
//! ```no_run
//! use bitlog::{config::Config, engine::BitLog};
//!
//! let engine = BitLog::open(Config::new("./data/bitlog.db")).unwrap();
//! engine.recover().unwrap();
//!
//! engine.set("key", b"value".to_vec()).unwrap();
//! let entity = engine.get("key").unwrap().unwrap();
//! assert_eq!(&entity.value[..], b"value");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use config::Config;
pub use engine::{BitLog, EngineState};
pub use error::{BitLogError, Result};
pub use types::Entity;
