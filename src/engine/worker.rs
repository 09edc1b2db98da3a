//! BITLOG - Write Worker
//! A dedicated thread that performs every write, one at a time.
//!
//! Callers hand an entity over a bounded channel together with a reply
//! channel and block until the worker answers with the frame offset.
//! Closing the worker stops new submissions, lets queued requests drain,
//! then joins the thread.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::{BitLogError, Result};
use crate::types::Entity;

use super::BitLog;

/// One write request and where to send its outcome.
struct WriteRequest {
    entity: Entity,
    reply: SyncSender<Result<u64>>,
}

/// Handle to the write worker thread.
pub struct WriteWorker {
    /// `None` once closed; new submissions fail with `WorkerClosed`.
    sender: Mutex<Option<SyncSender<WriteRequest>>>,
    /// Join handle for the worker thread (Some until joined).
    join: Mutex<Option<JoinHandle<()>>>,
}

impl WriteWorker {
    /// Spawn the worker with a queue of `queue_depth` pending requests.
    pub fn spawn(engine: Arc<BitLog>, queue_depth: usize) -> Result<Self> {
        let (sender, receiver) = mpsc::sync_channel(queue_depth.max(1));
        let join = thread::Builder::new()
            .name("bitlog-writer".into())
            .spawn(move || run(engine, receiver))?;

        log::info!("write worker started (queue depth {})", queue_depth);
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            join: Mutex::new(Some(join)),
        })
    }

    /// Queue `entity` and wait for the offset it was written at.
    pub fn submit(&self, entity: Entity) -> Result<u64> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(BitLogError::WorkerClosed)?;

        let (reply, outcome) = mpsc::sync_channel(1);
        sender
            .send(WriteRequest { entity, reply })
            .map_err(|_| BitLogError::WorkerClosed)?;
        drop(sender);

        outcome.recv().map_err(|_| BitLogError::WorkerClosed)?
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Stop accepting requests, drain the queue and join the thread.
    pub fn close(&self) {
        // Dropping the last sender ends the worker loop once the queue is empty.
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        let join = self.join.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = join {
            if handle.join().is_err() {
                log::error!("write worker panicked");
            }
            log::info!("write worker stopped");
        }
    }
}

impl Drop for WriteWorker {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(engine: Arc<BitLog>, receiver: Receiver<WriteRequest>) {
    for request in receiver {
        let outcome = engine
            .ensure_ready()
            .and_then(|()| engine.write_entity(request.entity));
        // The caller may have given up waiting; nothing to do then.
        let _ = request.reply.send(outcome);
    }
}
