//! BITLOG - Log Store
//! Owns the single append-only data file. Appends frames at the tail and
//! reads frames back at arbitrary offsets.
//!
//! ## Frame Format
//! ```text
//! [length: 8 bytes (LE)][payload: length bytes]
//! ```
//! No file header, no footer, no checksum.
//!
//! All I/O is positioned (explicit offset per call), so concurrent readers
//! never disturb the writer and one file handle serves both.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{BitLogError, Result};

/// Size of the little-endian length prefix.
pub const FRAME_HEADER_LEN: u64 = 8;

/// Append-only frame log on one file.
pub struct LogStore {
    /// Path to the data file on disk.
    path: PathBuf,
    /// Shared handle used with positioned reads and writes.
    file: File,
    /// Byte length of fully written frames. Readers never look past it.
    end: AtomicU64,
    /// Writer exclusion: exactly one append in flight.
    writer: Mutex<()>,
    /// Whether to fsync each append.
    sync_writes: bool,
}

impl LogStore {
    /// Open or create the data file.
    pub fn open(path: impl Into<PathBuf>, sync_writes: bool) -> Result<Self> {
        let path = path.into();
        // Not `append(true)`: positioned writes must land at the offset we pick.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            end: AtomicU64::new(len),
            writer: Mutex::new(()),
            sync_writes,
        })
    }

    /// Returns the path to the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the log in bytes.
    pub fn len(&self) -> u64 {
        self.end.load(Ordering::Acquire)
    }

    /// Returns true if no frame has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one frame and return the offset it starts at.
    pub fn append(&self, payload: &[u8]) -> Result<u64> {
        self.append_then(payload, |_| ())
    }

    /// Append one frame, then run `on_durable` with its offset while the
    /// writer lock is still held.
    ///
    /// The callback only runs once the frame is fully written (and synced,
    /// when configured). If the write or sync fails the tail does not move
    /// and the file is cut back to it, so no unacknowledged bytes survive
    /// as a torn tail.
    pub fn append_then<F>(&self, payload: &[u8], on_durable: F) -> Result<u64>
    where
        F: FnOnce(u64),
    {
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN as usize + payload.len());
        frame.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        frame.extend_from_slice(payload);

        let offset = {
            let _guard = self.lock_writer();
            let offset = self.end.load(Ordering::Acquire);
            if let Err(e) = self.write_frame(&frame, offset) {
                self.discard_from(offset);
                return Err(e.into());
            }
            self.end
                .store(offset + frame.len() as u64, Ordering::Release);
            on_durable(offset);
            offset
        };

        log::debug!("appended {} byte frame at offset {}", frame.len(), offset);
        Ok(offset)
    }

    fn write_frame(&self, frame: &[u8], offset: u64) -> io::Result<()> {
        write_all_at(&self.file, frame, offset)?;
        if self.sync_writes {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Truncate the file back to `offset`, dropping bytes of a failed append.
    /// Best effort: a failure is logged and the original error wins.
    fn discard_from(&self, offset: u64) {
        if let Err(e) = self.file.set_len(offset) {
            log::warn!(
                "could not truncate {:?} back to {} after failed append: {}",
                self.path,
                offset,
                e
            );
        }
    }

    /// Open an existing data file without write access.
    #[cfg(test)]
    pub(crate) fn open_read_only(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            end: AtomicU64::new(len),
            writer: Mutex::new(()),
            sync_writes: false,
        })
    }

    /// Read the payload of the frame starting at `offset`.
    pub fn read_frame(&self, offset: u64) -> Result<Vec<u8>> {
        let end = self.len();
        if offset >= end {
            return Err(BitLogError::Eof { offset });
        }

        let available = end - offset;
        if available < FRAME_HEADER_LEN {
            return Err(short_read(offset, FRAME_HEADER_LEN, available));
        }
        let mut header = [0u8; FRAME_HEADER_LEN as usize];
        read_exact_at(&self.file, &mut header, offset)?;
        let length = u64::from_le_bytes(header);

        let available = available - FRAME_HEADER_LEN;
        if length > available {
            return Err(short_read(offset, length, available));
        }
        let mut payload = vec![0u8; length as usize];
        read_exact_at(&self.file, &mut payload, offset + FRAME_HEADER_LEN)?;
        Ok(payload)
    }

    /// Iterate over every frame from offset 0 in ascending order.
    ///
    /// The end of the log is captured when the scan starts.
    pub fn scan(&self) -> Scan<'_> {
        Scan {
            store: self,
            position: 0,
            end: self.len(),
            done: false,
        }
    }

    /// Block other appenders until the guard is dropped.
    pub(crate) fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lazy, finite iterator over `(offset, payload)` pairs.
///
/// Stops at the end of the log. After yielding an error it yields nothing.
pub struct Scan<'a> {
    store: &'a LogStore,
    position: u64,
    end: u64,
    done: bool,
}

impl Scan<'_> {
    /// Offset of the next frame the scan will read.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<(u64, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.position >= self.end {
            return None;
        }
        let offset = self.position;
        match self.store.read_frame(offset) {
            Ok(payload) => {
                self.position = offset + FRAME_HEADER_LEN + payload.len() as u64;
                Some(Ok((offset, payload)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn short_read(offset: u64, wanted: u64, available: u64) -> BitLogError {
    BitLogError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("short read at offset {offset}: wanted {wanted} bytes, {available} available"),
    ))
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, offset)
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::write_all_at(file, buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                let rest = buf;
                buf = &mut rest[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
