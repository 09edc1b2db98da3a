//! BITLOG - Interactive Shell
//! Thin front-end over the storage engine. Configuration comes from the
//! environment (`DB_FILENAME`, `DB_SYNC_WRITES`, `DB_WRITE_WORKER`).

use std::io::{self, BufRead, Write};

use bitlog::config::{Config, ENV_DB_FILENAME};
use bitlog::engine::concurrent::SharedBitLog;

fn main() {
    env_logger::init();

    let config = if std::env::var_os(ENV_DB_FILENAME).is_some() {
        match Config::from_env() {
            Ok(c) => c,
            Err(err) => {
                eprintln!("[ERROR] Invalid configuration: {}", err);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Recovery must succeed before any request is served.
    let (engine, stats) = match SharedBitLog::open(config) {
        Ok(opened) => opened,
        Err(err) => {
            eprintln!("[ERROR] Failed to open engine: {}", err);
            std::process::exit(1);
        }
    };

    println!();
    println!("  BITLOG append-only key-value store");
    println!("  data file: {:?}", engine.engine().path());
    println!(
        "  recovered {} records, {} keys",
        stats.records, stats.keys
    );
    println!();
    println!("  Commands:");
    println!("    set <key> <value>  - Store a key-value pair");
    println!("    get <key>          - Retrieve a value by key");
    println!("    del <key>          - Delete a key");
    println!("    scan               - List all live key-value pairs");
    println!("    info               - Show engine statistics");
    println!("    exit               - Shutdown engine");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("bitlog> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "set" | "put" => {
                if parts.len() < 3 {
                    println!("  Usage: set <key> <value>");
                    continue;
                }
                let value = parts[2..].join(" ").into_bytes();
                match engine.set(parts[1], value) {
                    Ok(offset) => println!("  OK (offset {})", offset),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "get" => {
                if parts.len() < 2 {
                    println!("  Usage: get <key>");
                    continue;
                }
                match engine.get(parts[1]) {
                    Ok(Some(entity)) => match std::str::from_utf8(&entity.value) {
                        Ok(s) => println!("  \"{}\"", s),
                        Err(_) => println!("  <{} bytes of binary data>", entity.value.len()),
                    },
                    Ok(None) => println!("  (nil)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "del" | "delete" => {
                if parts.len() < 2 {
                    println!("  Usage: del <key>");
                    continue;
                }
                match engine.delete(parts[1]) {
                    Ok(_) => println!("  OK (deleted)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "scan" | "list" => match engine.scan() {
                Ok(entries) if entries.is_empty() => println!("  (empty)"),
                Ok(entries) => {
                    for (key, value) in &entries {
                        println!("  {} -> {}", key, String::from_utf8_lossy(value));
                    }
                    println!("  ({} entries)", entries.len());
                }
                Err(e) => println!("  ERROR: {}", e),
            },
            "info" | "stats" => {
                println!("  Indexed keys:  {}", engine.key_count());
                println!("  Log size:      {} bytes", engine.log_size());
                println!("{}", engine.metrics().report());
            }
            "exit" | "quit" | "q" => {
                println!("  Shutting down BITLOG...");
                break;
            }
            _ => {
                println!("  Unknown command: '{}'. Type 'exit' to quit.", parts[0]);
            }
        }
    }

    engine.close();
}
