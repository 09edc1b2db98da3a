//! BITLOG - Integration Tests
//! End-to-end tests validating the full engine lifecycle:
//! open → recover → set → get → delete → reopen → recover.

use std::io::{Seek, SeekFrom, Write};

use bitlog::config::Config;
use bitlog::engine::{codec, BitLog, EngineState};
use bitlog::error::BitLogError;
use bitlog::types::Entity;

mod common {
    use std::path::Path;

    /// Config pointing at a data file inside a temporary directory.
    pub fn temp_config(dir: &Path) -> bitlog::config::Config {
        bitlog::config::Config::new(dir.join("db.bin"))
    }

    /// Open and recover an engine.
    pub fn ready(config: bitlog::config::Config) -> bitlog::engine::BitLog {
        let engine = bitlog::engine::BitLog::open(config).unwrap();
        engine.recover().unwrap();
        engine
    }
}

fn value_of(engine: &BitLog, key: &str) -> Option<Vec<u8>> {
    engine.get(key).unwrap().map(|e| e.value.to_vec())
}

#[test]
fn test_documented_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));

    let first = engine.set("k1", b"v1".to_vec()).unwrap();
    assert_eq!(first, 0);

    let second = engine.set("k2", b"v2".to_vec()).unwrap();
    let k1_len = codec::encoded_len(&Entity::live("k1", b"v1".to_vec())).unwrap();
    assert_eq!(second, 8 + k1_len);
    assert_eq!(second, 29);

    assert_eq!(value_of(&engine, "k1"), Some(b"v1".to_vec()));
    engine.delete("k1").unwrap();
    assert_eq!(value_of(&engine, "k1"), None);

    engine.recover().unwrap();
    assert_eq!(value_of(&engine, "k1"), None);
    assert_eq!(value_of(&engine, "k2"), Some(b"v2".to_vec()));
}

#[test]
fn test_last_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));

    engine.set("key", b"old".to_vec()).unwrap();
    engine.set("key", b"new".to_vec()).unwrap();
    assert_eq!(value_of(&engine, "key"), Some(b"new".to_vec()));
    assert_eq!(engine.key_count(), 1);
}

#[test]
fn test_tombstone_then_set_again() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));

    engine.set("k", b"v".to_vec()).unwrap();
    engine.delete("k").unwrap();
    assert_eq!(value_of(&engine, "k"), None);

    engine.set("k", b"v3".to_vec()).unwrap();
    assert_eq!(value_of(&engine, "k"), Some(b"v3".to_vec()));
}

#[test]
fn test_delete_absent_key() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));

    let offset = engine.delete("never-written").unwrap();
    assert_eq!(offset, 0);
    assert!(engine.log_size() > 0);
    assert_eq!(engine.key_count(), 1);
    assert_eq!(value_of(&engine, "never-written"), None);

    // Still succeeds the second time.
    engine.delete("never-written").unwrap();
}

#[test]
fn test_offsets_strictly_increase() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()).with_sync_writes(false));

    let mut last = None;
    for i in 0..100 {
        let offset = if i % 3 == 0 {
            engine.delete(format!("key_{}", i % 10)).unwrap()
        } else {
            engine.set(format!("key_{}", i % 10), vec![i as u8; i]).unwrap()
        };
        if let Some(prev) = last {
            assert!(offset > prev);
        }
        last = Some(offset);
    }
}

#[test]
fn test_crash_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path());

    // Phase 1: write and drop without any shutdown step
    {
        let engine = common::ready(config.clone());
        engine.set("persistent_key", b"persistent_value".to_vec()).unwrap();
        engine.set("ephemeral", b"data".to_vec()).unwrap();
        engine.delete("ephemeral").unwrap();
    }

    // Phase 2: reopen and replay
    {
        let engine = BitLog::open(config).unwrap();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        let stats = engine.recover().unwrap();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.tombstones, 1);
        assert_eq!(stats.keys, 2);

        assert_eq!(
            value_of(&engine, "persistent_key"),
            Some(b"persistent_value".to_vec())
        );
        assert_eq!(value_of(&engine, "ephemeral"), None);
    }
}

#[test]
fn test_recovery_matches_live_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path()).with_sync_writes(false);
    let keys: Vec<String> = (0..20).map(|i| format!("key_{i:02}")).collect();

    let live: Vec<Option<Vec<u8>>> = {
        let engine = common::ready(config.clone());
        for round in 0..5 {
            for (i, key) in keys.iter().enumerate() {
                if (i + round) % 4 == 0 {
                    engine.delete(key.as_str()).unwrap();
                } else {
                    engine.set(key.as_str(), format!("{key}@{round}")).unwrap();
                }
            }
        }
        keys.iter().map(|k| value_of(&engine, k)).collect()
    };

    let engine = common::ready(config);
    let recovered: Vec<Option<Vec<u8>>> = keys.iter().map(|k| value_of(&engine, k)).collect();
    assert_eq!(live, recovered);
}

#[test]
fn test_recover_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));
    engine.set("a", b"1".to_vec()).unwrap();
    engine.set("b", b"2".to_vec()).unwrap();

    let first = engine.recover().unwrap();
    let second = engine.recover().unwrap();
    assert_eq!(first, second);
    assert_eq!(value_of(&engine, "a"), Some(b"1".to_vec()));
}

#[test]
fn test_on_disk_format() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path());
    let path = config.data_file.clone();
    let engine = common::ready(config);
    engine.set("k1", b"v1".to_vec()).unwrap();

    let raw = std::fs::read(&path).unwrap();
    let payload = codec::encode(&Entity::live("k1", b"v1".to_vec())).unwrap();
    assert_eq!(&raw[..8], &(payload.len() as u64).to_le_bytes());
    assert_eq!(&raw[8..], &payload[..]);
}

#[test]
fn test_corruption_at_indexed_offset_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path());
    let path = config.data_file.clone();
    let engine = common::ready(config);
    engine.set("k1", b"v1".to_vec()).unwrap();

    // Smash the key length inside the first payload.
    {
        let mut f = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        f.seek(SeekFrom::Start(8)).unwrap();
        f.write_all(&[0xff; 8]).unwrap();
    }

    let err = engine.get("k1").unwrap_err();
    assert!(matches!(err, BitLogError::CorruptRecord(_)));
    assert!(err.is_corruption());
}

#[test]
fn test_recovery_refuses_torn_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path());
    let path = config.data_file.clone();
    {
        let engine = common::ready(config.clone());
        engine.set("ok", b"fine".to_vec()).unwrap();
    }
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&1000u64.to_le_bytes()).unwrap();
        f.write_all(b"half a record").unwrap();
    }

    let engine = BitLog::open(config).unwrap();
    assert!(matches!(engine.recover(), Err(BitLogError::Recovery { .. })));
    assert_eq!(engine.state(), EngineState::Uninitialized);
}

#[test]
fn test_empty_engine() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));

    assert_eq!(engine.key_count(), 0);
    assert_eq!(engine.log_size(), 0);
    assert_eq!(value_of(&engine, "anything"), None);
    assert!(engine.scan().unwrap().is_empty());
}

#[test]
fn test_scan_live_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));

    engine.set("charlie", b"3".to_vec()).unwrap();
    engine.set("alpha", b"1".to_vec()).unwrap();
    engine.set("bravo", b"2".to_vec()).unwrap();
    engine.delete("bravo").unwrap();

    let entries = engine.scan().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "alpha");
    assert_eq!(entries[1].0, "charlie");
    assert_eq!(&entries[1].1[..], b"3");
}

#[test]
fn test_large_and_empty_values() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));

    let large_value = vec![0xABu8; 1 << 20];
    engine.set("big", large_value.clone()).unwrap();
    engine.set("empty", Vec::<u8>::new()).unwrap();

    assert_eq!(value_of(&engine, "big"), Some(large_value));
    assert_eq!(value_of(&engine, "empty"), Some(Vec::new()));
}

#[test]
fn test_unicode_keys() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path());
    {
        let engine = common::ready(config.clone());
        engine.set("café", b"coffee".to_vec()).unwrap();
        engine.set("日本語", b"japanese".to_vec()).unwrap();
        engine.set("🦀", b"crab".to_vec()).unwrap();
    }

    let engine = common::ready(config);
    assert_eq!(value_of(&engine, "café"), Some(b"coffee".to_vec()));
    assert_eq!(value_of(&engine, "日本語"), Some(b"japanese".to_vec()));
    assert_eq!(value_of(&engine, "🦀"), Some(b"crab".to_vec()));
}

#[test]
fn test_get_returns_full_entity() {
    let dir = tempfile::tempdir().unwrap();
    let engine = common::ready(common::temp_config(dir.path()));

    engine.set("foo-key", b"foo-value".to_vec()).unwrap();
    assert_eq!(
        engine.get("foo-key").unwrap(),
        Some(Entity::live("foo-key", b"foo-value".to_vec()))
    );
}

#[test]
fn test_from_lookup_config_opens_engine() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sub/env.db").to_string_lossy().into_owned();
    let config = Config::from_lookup(|name| match name {
        "DB_FILENAME" => Some(file.clone()),
        "DB_SYNC_WRITES" => Some("false".into()),
        _ => None,
    })
    .unwrap();

    let engine = common::ready(config);
    engine.set("k", b"v".to_vec()).unwrap();
    assert!(dir.path().join("sub/env.db").exists());
}
