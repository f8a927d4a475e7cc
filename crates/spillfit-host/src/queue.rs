//! Single-consumer macro task queue.
//!
//! Models the host's macro-execution context as one dedicated worker thread
//! draining an in-order channel: rewrites queued concurrently from several
//! recalculation threads execute one at a time, in submission order. A real
//! add-in binds the worker to whatever callback the host offers for "run
//! this when it is safe to mutate the sheet"; embeddings without such a
//! callback can use this queue as-is.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::traits::{MacroTask, SpreadsheetHost};

/// Error returned when enqueueing after [`MacroQueue::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("macro queue is shut down")]
pub struct QueueClosed;

struct Inner {
    tx: Option<Sender<MacroTask>>,
    worker: Option<JoinHandle<()>>,
}

pub struct MacroQueue {
    inner: Mutex<Inner>,
}

impl MacroQueue {
    /// Start the consumer thread bound to `host`.
    pub fn start(host: Arc<dyn SpreadsheetHost>) -> std::io::Result<Self> {
        let (tx, rx) = channel::<MacroTask>();
        let worker = std::thread::Builder::new()
            .name("spillfit-macro".into())
            .spawn(move || {
                for task in rx {
                    // A panicking task must not take the macro context down
                    // with it; later rewrites still have to run.
                    if catch_unwind(AssertUnwindSafe(|| task(host.as_ref()))).is_err() {
                        tracing::warn!("macro task panicked; continuing with next task");
                    }
                }
                tracing::debug!("macro queue worker exiting");
            })?;
        Ok(Self {
            inner: Mutex::new(Inner {
                tx: Some(tx),
                worker: Some(worker),
            }),
        })
    }

    /// Submit a task. Returns immediately; the task runs on the worker
    /// after every previously submitted task has finished.
    pub fn enqueue(&self, task: MacroTask) -> Result<(), QueueClosed> {
        let guard = self.inner.lock();
        match guard.tx.as_ref() {
            Some(tx) => tx.send(task).map_err(|_| QueueClosed),
            None => Err(QueueClosed),
        }
    }

    /// Drain outstanding tasks and join the worker. Idempotent.
    pub fn shutdown(&self) {
        let (tx, worker) = {
            let mut guard = self.inner.lock();
            (guard.tx.take(), guard.worker.take())
        };
        drop(tx);
        if let Some(handle) = worker
            && handle.join().is_err()
        {
            tracing::warn!("macro queue worker panicked during shutdown");
        }
    }
}

impl Drop for MacroQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedHost;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn tasks_run_in_submission_order() {
        let host: Arc<dyn SpreadsheetHost> = Arc::new(ScriptedHost::new());
        let queue = MacroQueue::start(host).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..16 {
            let log = Arc::clone(&log);
            queue
                .enqueue(Box::new(move |_| log.lock().push(i)))
                .unwrap();
        }
        queue.shutdown();
        assert_eq!(*log.lock(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn tasks_never_overlap() {
        let host: Arc<dyn SpreadsheetHost> = Arc::new(ScriptedHost::new());
        let queue = MacroQueue::start(host).unwrap();

        let active = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicUsize::new(0));
        for _ in 0..32 {
            let active = Arc::clone(&active);
            let overlapped = Arc::clone(&overlapped);
            queue
                .enqueue(Box::new(move |_| {
                    if active.fetch_add(1, Ordering::SeqCst) != 0 {
                        overlapped.fetch_add(1, Ordering::SeqCst);
                    }
                    std::thread::yield_now();
                    active.fetch_sub(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        queue.shutdown();
        assert_eq!(overlapped.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panicking_task_does_not_kill_the_worker() {
        let host: Arc<dyn SpreadsheetHost> = Arc::new(ScriptedHost::new());
        let queue = MacroQueue::start(host).unwrap();

        let ran = Arc::new(AtomicUsize::new(0));
        queue.enqueue(Box::new(|_| panic!("boom"))).unwrap();
        {
            let ran = Arc::clone(&ran);
            queue
                .enqueue(Box::new(move |_| {
                    ran.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        queue.shutdown();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn enqueue_after_shutdown_fails() {
        let host: Arc<dyn SpreadsheetHost> = Arc::new(ScriptedHost::new());
        let queue = MacroQueue::start(host).unwrap();
        queue.shutdown();
        assert_eq!(queue.enqueue(Box::new(|_| {})), Err(QueueClosed));
    }
}
