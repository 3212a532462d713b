//! Fixed two-worker pool for parallel digest computation.
//!
//! The pool exists only to overlap the source and destination digests of a
//! single file pair; the control thread always blocks on both results before
//! moving on. It is owned by the caller: created before the walk and shut
//! down after it completes.

use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::debug;

/// Number of workers; one per side of a file pair.
const WORKERS: usize = 2;

type DigestJob = Box<dyn FnOnce() -> Option<Vec<u8>> + Send>;

/// Two worker threads fed over a channel.
///
/// `shutdown` is idempotent and also runs on drop. A shut-down pool rejects
/// new work; the engine detects this at walk start and falls back to
/// sequential digesting.
pub struct DigestPool {
    sender: Mutex<Option<Sender<(DigestJob, Sender<Option<Vec<u8>>>)>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl DigestPool {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded::<(DigestJob, Sender<Option<Vec<u8>>>)>();

        let workers = (0..WORKERS)
            .map(|_| {
                let receiver = receiver.clone();
                thread::spawn(move || {
                    while let Ok((job, reply)) = receiver.recv() {
                        // A dropped reply receiver is not the worker's problem.
                        let _ = reply.send(job());
                    }
                })
            })
            .collect();

        DigestPool {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    /// Submit a digest job; returns the receiver for its result, or `None`
    /// if the pool has been shut down.
    pub fn submit(
        &self,
        job: impl FnOnce() -> Option<Vec<u8>> + Send + 'static,
    ) -> Option<Receiver<Option<Vec<u8>>>> {
        let guard = self.sender.lock().ok()?;
        let sender = guard.as_ref()?;
        let (reply_sender, reply_receiver) = bounded(1);
        sender.send((Box::new(job), reply_sender)).ok()?;
        Some(reply_receiver)
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender.lock().map(|guard| guard.is_none()).unwrap_or(true)
    }

    /// Drop the job channel and join both workers. Safe to call repeatedly.
    pub fn shutdown(&self) {
        let sender = self.sender.lock().ok().and_then(|mut guard| guard.take());
        if sender.is_none() {
            return;
        }
        debug!("shutting down digest pool");
        drop(sender);

        if let Ok(mut workers) = self.workers.lock() {
            for handle in workers.drain(..) {
                let _ = handle.join();
            }
        }
    }
}

impl Default for DigestPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DigestPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
