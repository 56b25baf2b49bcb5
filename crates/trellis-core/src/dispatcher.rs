//! Single-threaded dispatcher for UI-owned state.
//!
//! A [`Dispatcher`] is bound to the thread that creates it (the UI thread).
//! Any thread may hand it work with [`Dispatcher::post`]; the work runs only
//! when the owning thread drains the queue with
//! [`process_pending`](Dispatcher::process_pending) or
//! [`run_for`](Dispatcher::run_for).
//!
//! # How It Works
//!
//! 1. A closure posted from a worker thread is wrapped in a
//!    [`QueuedInvocation`] and sent over an unbounded channel. The channel
//!    hand-off gives the memory ordering needed for the closure's captures to
//!    be visible on the owning thread.
//!
//! 2. The owning thread drains the channel in FIFO order. Invocations posted
//!    while draining are left for the next drain, so a slot that re-posts
//!    itself cannot starve the caller.
//!
//! # Example
//!
//! ```
//! use trellis_core::Dispatcher;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let dispatcher = Dispatcher::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let remote = dispatcher.clone();
//! let hits_clone = hits.clone();
//! std::thread::spawn(move || {
//!     remote
//!         .post(move || {
//!             hits_clone.fetch_add(1, Ordering::SeqCst);
//!         })
//!         .unwrap();
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(dispatcher.process_pending(), 1);
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::error::DispatchError;
use crate::logging::targets;
use crate::thread_check::ThreadAffinity;

/// Configuration for creating a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Name used in log output.
    pub name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name: "trellis-ui".to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Create a configuration with the given dispatcher name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A type-erased invocation waiting to run on the owning thread.
pub struct QueuedInvocation {
    id: u64,
    invoke: Box<dyn FnOnce() + Send>,
}

impl QueuedInvocation {
    fn new(id: u64, invoke: Box<dyn FnOnce() + Send>) -> Self {
        Self { id, invoke }
    }

    /// Sequence number assigned when the invocation was queued.
    pub fn id(&self) -> u64 {
        self.id
    }

    fn execute(self) {
        (self.invoke)();
    }
}

struct DispatcherInner {
    config: DispatcherConfig,
    affinity: ThreadAffinity,
    sender: Sender<QueuedInvocation>,
    receiver: Receiver<QueuedInvocation>,
    next_id: AtomicU64,
    pending: AtomicUsize,
    shutdown: AtomicBool,
}

/// A handle to the executor that owns UI state.
///
/// Cloning is cheap; all clones share one queue and one owning thread.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.inner.config.name)
            .field("owner", &self.inner.affinity.thread_id())
            .field("pending", &self.pending_count())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher owned by the calling thread.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Create a dispatcher with custom configuration, owned by the calling thread.
    pub fn with_config(config: DispatcherConfig) -> Self {
        let (sender, receiver) = unbounded();
        tracing::debug!(
            target: targets::DISPATCH,
            name = %config.name,
            "dispatcher created"
        );
        Self {
            inner: Arc::new(DispatcherInner {
                config,
                affinity: ThreadAffinity::current(),
                sender,
                receiver,
                next_id: AtomicU64::new(1),
                pending: AtomicUsize::new(0),
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// The dispatcher's name.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Whether the calling thread owns this dispatcher.
    #[inline]
    pub fn is_owner_thread(&self) -> bool {
        self.inner.affinity.is_current()
    }

    /// Panics unless called on the owning thread.
    #[track_caller]
    pub fn assert_owner_thread(&self) {
        self.inner
            .affinity
            .assert_current("operation must run on the dispatcher's owning thread");
    }

    /// Number of invocations waiting to run.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Stop accepting new work. Already-queued invocations can still be drained.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        tracing::debug!(target: targets::DISPATCH, name = %self.name(), "dispatcher shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Queue a closure to run on the owning thread.
    ///
    /// Safe to call from any thread, including the owning thread itself (the
    /// closure then runs on the next drain, never inline).
    pub fn post<F>(&self, f: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Box::new(f))
    }

    fn enqueue(&self, invoke: Box<dyn FnOnce() + Send>) -> Result<(), DispatchError> {
        if self.is_shutdown() {
            return Err(DispatchError::Shutdown);
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let invocation = QueuedInvocation::new(id, invoke);

        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        // The inner struct owns the receiver, so the channel cannot disconnect.
        if self.inner.sender.send(invocation).is_err() {
            self.inner.pending.fetch_sub(1, Ordering::AcqRel);
            return Err(DispatchError::Shutdown);
        }
        tracing::trace!(target: targets::DISPATCH, invocation_id = id, "invocation queued");
        Ok(())
    }

    fn run(&self, invocation: QueuedInvocation) {
        self.inner.pending.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(
            target: targets::DISPATCH,
            invocation_id = invocation.id(),
            "running invocation"
        );
        invocation.execute();
    }

    /// Run every invocation queued at the time of the call, in order.
    ///
    /// Returns the number of invocations run.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owning thread.
    #[track_caller]
    pub fn process_pending(&self) -> usize {
        self.assert_owner_thread();
        let available = self.inner.receiver.len();
        self.drain(available)
    }

    fn drain(&self, limit: usize) -> usize {
        let mut count = 0;
        while count < limit {
            match self.inner.receiver.try_recv() {
                Ok(invocation) => {
                    self.run(invocation);
                    count += 1;
                }
                Err(_) => break,
            }
        }
        count
    }

    /// Wait for and run invocations until `duration` has elapsed.
    ///
    /// Returns the number of invocations run.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owning thread.
    #[track_caller]
    pub fn run_for(&self, duration: Duration) -> usize {
        self.run_until(duration, || false)
    }

    /// Wait for and run invocations until `done` returns `true` or the
    /// timeout elapses. Returns `true` if `done` was satisfied.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the owning thread.
    #[track_caller]
    pub fn run_until_condition<P>(&self, timeout: Duration, mut done: P) -> bool
    where
        P: FnMut() -> bool,
    {
        let mut satisfied = false;
        self.run_until(timeout, || {
            satisfied = done();
            satisfied
        });
        satisfied
    }

    #[track_caller]
    fn run_until<P>(&self, timeout: Duration, mut done: P) -> usize
    where
        P: FnMut() -> bool,
    {
        self.assert_owner_thread();
        let deadline = Instant::now() + timeout;
        let mut count = 0;

        while !done() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.inner.receiver.recv_timeout(remaining) {
                Ok(invocation) => {
                    self.run(invocation);
                    count += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_post_and_process_in_order() {
        let dispatcher = Dispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = order.clone();
            dispatcher.post(move || order.lock().push(i)).unwrap();
        }

        assert_eq!(dispatcher.pending_count(), 5);
        assert_eq!(dispatcher.process_pending(), 5);
        assert_eq!(dispatcher.pending_count(), 0);
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reposted_work_waits_for_next_drain() {
        let dispatcher = Dispatcher::new();
        let count = Arc::new(AtomicUsize::new(0));

        let inner_dispatcher = dispatcher.clone();
        let count_clone = count.clone();
        dispatcher
            .post(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
                let count_again = count_clone.clone();
                inner_dispatcher
                    .post(move || {
                        count_again.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
            })
            .unwrap();

        assert_eq!(dispatcher.process_pending(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.process_pending(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_named_dispatcher() {
        let dispatcher = Dispatcher::with_config(DispatcherConfig::with_name("picker-ui"));
        assert_eq!(dispatcher.name(), "picker-ui");
        assert!(dispatcher.is_owner_thread());
    }

    #[test]
    fn test_shutdown_rejects_post() {
        let dispatcher = Dispatcher::new();
        dispatcher.shutdown();
        assert!(dispatcher.is_shutdown());
        assert_eq!(dispatcher.post(|| {}), Err(DispatchError::Shutdown));
    }

    #[test]
    fn test_process_pending_from_worker_panics() {
        let dispatcher = Dispatcher::new();
        let remote = dispatcher.clone();

        let result = std::thread::spawn(move || remote.process_pending()).join();
        assert!(result.is_err());
    }

    #[test]
    fn test_run_for_returns_after_timeout() {
        let dispatcher = Dispatcher::new();
        let started = Instant::now();
        assert_eq!(dispatcher.run_for(Duration::from_millis(20)), 0);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
