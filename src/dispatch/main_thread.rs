//! The main-thread dispatcher.
//!
//! The thread that constructs a [`MainThread`] becomes its owner. Any other
//! thread may call [`MainThread::invoke`] to run a closure on the owner and
//! block until it has finished. The owner periodically calls
//! [`MainThread::drain`] (or hands its life to [`MainThread::run`]).

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;

/// Errors surfaced by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The enqueued work panicked on the owning thread.
    #[error("dispatched work panicked: {0}")]
    JobPanicked(String),

    /// The dispatcher went away before the work completed.
    #[error("main-thread dispatcher stopped")]
    Stopped,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Job>,
    /// Set when the drain loop has exited; no further jobs are accepted.
    stopped: bool,
}

/// FIFO hand-off queue owned by a single thread.
pub struct MainThread {
    owner: ThreadId,
    queue: Mutex<Queue>,
}

impl MainThread {
    /// Bind the dispatcher to the calling thread. The caller is now the
    /// owning thread and is responsible for draining the queue.
    pub fn new() -> Self {
        Self {
            owner: thread::current().id(),
            queue: Mutex::new(Queue::default()),
        }
    }

    /// Spawn a dedicated owner thread that drains the queue at `poll`
    /// cadence until the shutdown signal fires. Used when the host has no
    /// tick of its own to hook [`MainThread::drain`] into.
    pub fn spawn(
        poll: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Arc<MainThread>, DispatchError> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("console-main".into())
            .spawn(move || {
                let main = Arc::new(MainThread::new());
                if tx.send(Arc::clone(&main)).is_err() {
                    return;
                }
                main.run(poll, shutdown);
            })
            .map_err(|_| DispatchError::Stopped)?;
        rx.recv().map_err(|_| DispatchError::Stopped)
    }

    /// True if the calling thread is the owning thread.
    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Run `work` on the owning thread and block until it completes.
    ///
    /// Called from the owning thread itself, the work runs inline with no
    /// queueing. Work items from other threads execute in strict FIFO
    /// enqueue order. A panic inside the work is caught at the queue
    /// boundary and returned as [`DispatchError::JobPanicked`]; the owning
    /// loop itself keeps running. Once the drain loop has exited,
    /// [`DispatchError::Stopped`] is returned instead of queueing work
    /// that nothing will ever run.
    pub fn invoke<T, F>(&self, work: F) -> Result<T, DispatchError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_owner() {
            return catch_unwind(AssertUnwindSafe(work))
                .map_err(|payload| DispatchError::JobPanicked(panic_message(payload.as_ref())));
        }

        let (tx, rx) = mpsc::channel();
        let job: Job = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(work));
            let _ = tx.send(result);
        });

        {
            let mut queue = self.lock_queue();
            if queue.stopped {
                return Err(DispatchError::Stopped);
            }
            queue.jobs.push_back(job);
        }

        match rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(DispatchError::JobPanicked(panic_message(payload.as_ref()))),
            Err(_) => Err(DispatchError::Stopped),
        }
    }

    /// Execute every job currently queued, in enqueue order.
    ///
    /// The host's main loop calls this once per tick. The queue lock is not
    /// held while a job runs, so jobs may themselves call `invoke` (which
    /// executes inline on the owner).
    pub fn drain(&self) {
        loop {
            let job = self.lock_queue().jobs.pop_front();
            match job {
                Some(job) => job(),
                None => break,
            }
        }
    }

    /// Drain loop for hosts without their own tick.
    ///
    /// Polls at `poll` cadence, sleeping between polls (an empty queue must
    /// not busy-spin), until the shutdown signal fires. On the way out the
    /// queue is marked stopped before the final drain, so no job can land
    /// behind it; late `invoke` callers get [`DispatchError::Stopped`]
    /// instead of blocking forever.
    pub fn run(&self, poll: Duration, mut shutdown: broadcast::Receiver<()>) {
        loop {
            match shutdown.try_recv() {
                Err(broadcast::error::TryRecvError::Empty) => {}
                _ => break,
            }
            self.drain();
            thread::sleep(poll);
        }
        self.lock_queue().stopped = true;
        self.drain();
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MainThread {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
