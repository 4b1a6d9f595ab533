use core::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

use crossbeam_channel::{Receiver, Sender};

use crate::error::Error;

/// Cancellation token shared between a worker thread and its handle.
///
/// Besides the flag it carries a wake-up signal, so a thread suspended in
/// [`Cancel::wait`] observes a stop request immediately instead of at the
/// end of its delay.
#[derive(Debug, Clone)]
pub struct Cancel {
    is_running: Arc<AtomicBool>,
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Default for Cancel {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancel {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);

        Self {
            is_running: Arc::new(AtomicBool::new(true)),
            tx,
            rx,
        }
    }

    /// Clears the flag and wakes a pending [`Cancel::wait`].
    #[inline]
    pub fn stop(&self) {
        self.is_running.store(false, Ordering::SeqCst);
        // A full slot means a wake-up is already pending.
        let _ = self.tx.try_send(());
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Suspends the current thread for up to `timeout`, returning early on
    /// stop.
    ///
    /// Returns whether the worker is still running afterwards.
    pub fn wait(&self, timeout: Duration) -> bool {
        if !self.is_running() {
            return false;
        }

        // Both a wake-up and a timeout end up re-reading the flag.
        let _ = self.rx.recv_timeout(timeout);
        self.is_running()
    }
}

/// Handle to a running generator or consumer thread.
#[derive(Debug)]
pub struct Worker {
    name: String,
    cancel: Cancel,
    thread: JoinHandle<()>,
}

impl Worker {
    pub(crate) fn new(name: String, cancel: Cancel, thread: JoinHandle<()>) -> Self {
        Self { name, cancel, thread }
    }

    /// Requests this worker to stop.
    ///
    /// Does not block. The thread observes the request at its next
    /// suspension point.
    #[inline]
    pub fn stop(&self) {
        self.cancel.stop();
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.cancel.is_running()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits up to `grace` for the thread to finish.
    ///
    /// A thread still alive after the deadline is detached and left to
    /// finish on its own; its resources are discarded by the caller.
    pub fn join_within(self, grace: Duration) -> Result<(), Error> {
        let deadline = Instant::now() + grace;

        while !self.thread.is_finished() {
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::ShutdownTimeout { thread: self.name, grace });
            }

            thread::sleep((deadline - now).min(Duration::from_millis(1)));
        }

        if self.thread.join().is_err() {
            // Worker bodies catch their own panics; reaching here means the
            // panic came from outside of them, e.g. from logging.
            log::error!("thread {} panicked", self.name);
        }

        Ok(())
    }
}
