// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Asynchronous change delivery.
//!
//! Listeners never run on the thread that mutated a store. Every
//! [`ChangeEvent`] is handed to a [`NotificationQueue`], a single dedicated
//! worker thread fed through a channel, so events submitted by one store are
//! delivered in submission order while the mutating thread returns immediately.

use std::fmt;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::change::ChangeEvent;

/// A change listener.
pub type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

type Job = Box<dyn FnOnce() + Send>;

/// A single-worker queue that delivers change events off the caller's thread.
///
/// The queue is shared by reference (`Arc`) between every store of a rendering
/// session. Dropping the last reference drains the pending events and joins
/// the worker.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use geostyle_param::{ChangeSource, NotificationQueue, ParamValue, ParameterStore, ParameterValue};
///
/// let queue = Arc::new(NotificationQueue::spawn("geostyle-notify").unwrap());
/// let store = ParameterStore::new(Arc::clone(&queue));
/// store.define(ParameterValue::new("size", "Size", ParamValue::Float(1.0)));
///
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// store.subscribe(move |event| {
///     counter.fetch_add(event.changes.len(), Ordering::SeqCst);
/// });
///
/// store.set("size", ParamValue::Float(2.0), ChangeSource::Api).unwrap();
/// queue.flush();
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct NotificationQueue {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationQueue {
    /// Spawns the worker thread under the given thread name.
    pub fn spawn(name: &str) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                for job in receiver {
                    job();
                }
            })?;
        tracing::debug!(queue = name, "notification worker started");
        Ok(Self {
            name: name.to_owned(),
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Returns the worker thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues delivery of `event` to `listeners`.
    pub(crate) fn submit(&self, listeners: Vec<Listener>, event: ChangeEvent) {
        if listeners.is_empty() {
            return;
        }
        let queue = self.name.clone();
        self.push(Box::new(move || {
            for listener in &listeners {
                let delivered = catch_unwind(AssertUnwindSafe(|| listener(&event)));
                if delivered.is_err() {
                    tracing::error!(
                        queue = %queue,
                        store = event.store.0,
                        changes = event.changes.len(),
                        "change listener panicked"
                    );
                }
            }
        }));
    }

    /// Blocks until every event submitted before this call has been delivered.
    ///
    /// Must not be called from inside a listener: the worker would wait on itself.
    pub fn flush(&self) {
        let (done, wait) = mpsc::sync_channel::<()>(1);
        self.push(Box::new(move || {
            // The flusher may have given up; nothing to report then.
            let _ = done.send(());
        }));
        // A closed channel means the worker is gone and nothing is pending.
        let _ = wait.recv();
    }

    fn push(&self, job: Job) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => {
                if sender.send(job).is_err() {
                    tracing::warn!(queue = %self.name, "notification worker exited; event dropped");
                }
            }
            None => tracing::warn!(queue = %self.name, "notification queue shut down; event dropped"),
        }
    }
}

impl Drop for NotificationQueue {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once pending jobs are drained.
        self.sender
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker
            && worker.thread().id() != thread::current().id()
            && worker.join().is_err()
        {
            tracing::error!(queue = %self.name, "notification worker panicked");
        }
    }
}

impl fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeSet, ChangeSource, StoreId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(store: u64) -> ChangeEvent {
        ChangeEvent {
            store: StoreId(store),
            source: ChangeSource::Api,
            changes: ChangeSet::new(),
        }
    }

    #[test]
    fn delivers_in_submission_order() {
        let queue = NotificationQueue::spawn("test-order").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: Listener = Arc::new(move |e: &ChangeEvent| sink.lock().unwrap().push(e.store.0));

        for i in 0..50 {
            queue.submit(vec![Arc::clone(&listener)], event(i));
        }
        queue.flush();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn runs_off_the_calling_thread() {
        let queue = NotificationQueue::spawn("test-thread").unwrap();
        let caller = thread::current().id();
        let other = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&other);
        let listener: Listener = Arc::new(move |_: &ChangeEvent| {
            *sink.lock().unwrap() = Some(thread::current().id());
        });
        queue.submit(vec![listener], event(0));
        queue.flush();
        let delivered_on = other.lock().unwrap().unwrap();
        assert_ne!(delivered_on, caller);
    }

    #[test]
    fn panicking_listener_does_not_kill_worker() {
        let queue = NotificationQueue::spawn("test-panic").unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let bad: Listener = Arc::new(|_: &ChangeEvent| panic!("listener failure"));
        let good: Listener = Arc::new(move |_: &ChangeEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        queue.submit(vec![bad, Arc::clone(&good)], event(0));
        queue.submit(vec![good], event(1));
        queue.flush();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn drop_drains_pending_events() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let queue = NotificationQueue::spawn("test-drop").unwrap();
            let counter = Arc::clone(&count);
            let listener: Listener = Arc::new(move |_: &ChangeEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            for i in 0..10 {
                queue.submit(vec![Arc::clone(&listener)], event(i));
            }
        }
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }
}
