//! A background producer that keeps appending to an observable list.
//!
//! [`CounterFeed`] is a small view-model: a list of counter values and a
//! status text. Once started it runs a tokio task that waits for the
//! configured initial delay and then appends the next counter value on every
//! timer tick, from a runtime worker thread. A picker bound to
//! [`CounterFeed::stuff`] receives those appends through its dispatcher.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use trellis::feed::{CounterFeed, FeedConfig};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let feed = CounterFeed::new(FeedConfig::default().with_interval(Duration::from_millis(250)));
//! feed.start(runtime.handle());
//!
//! std::thread::sleep(Duration::from_secs(3));
//! println!("{:?}", feed.stuff().to_vec());
//! feed.stop();
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use trellis_core::NotifyProperty;
use trellis_core::logging::targets;

use crate::collection::ObservableList;

/// Status text shown before the feed produces anything.
pub const INITIAL_TEXT: &str = "initializing...";

/// Timing for a [`CounterFeed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Wait before the first tick is scheduled.
    pub initial_delay: Duration,
    /// Period between appended values.
    pub interval: Duration,
    /// The counter starts here; the first appended value is one more.
    pub start_value: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            interval: Duration::from_secs(1),
            start_value: 0,
        }
    }
}

impl FeedConfig {
    /// Set the initial delay.
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Set the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the starting counter value.
    pub fn with_start_value(mut self, start_value: u32) -> Self {
        self.start_value = start_value;
        self
    }
}

/// View-model owning a growing list of counter values.
pub struct CounterFeed {
    config: FeedConfig,
    stuff: Arc<ObservableList<u32>>,
    main_text: Arc<NotifyProperty<String>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for CounterFeed {
    fn default() -> Self {
        Self::new(FeedConfig::default())
    }
}

impl std::fmt::Debug for CounterFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterFeed")
            .field("config", &self.config)
            .field("items", &self.stuff.len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl CounterFeed {
    /// Create a stopped feed with an empty list.
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            stuff: Arc::new(ObservableList::new()),
            main_text: Arc::new(NotifyProperty::new(INITIAL_TEXT.to_string())),
            task: Mutex::new(None),
        }
    }

    /// The feed's timing.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// The list the feed appends to.
    pub fn stuff(&self) -> &Arc<ObservableList<u32>> {
        &self.stuff
    }

    /// The status text property.
    pub fn main_text(&self) -> &Arc<NotifyProperty<String>> {
        &self.main_text
    }

    /// Spawn the producer task on `handle`.
    ///
    /// Returns `false` if the feed is already running.
    pub fn start(&self, handle: &Handle) -> bool {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|running| !running.is_finished()) {
            return false;
        }

        let config = self.config.clone();
        let stuff = self.stuff.clone();
        tracing::debug!(
            target: targets::FEED,
            initial_delay = ?config.initial_delay,
            interval = ?config.interval,
            "feed started"
        );
        *task = Some(handle.spawn(produce(config, stuff)));
        true
    }

    /// Abort the producer task. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        match self.task.lock().take() {
            Some(task) => {
                task.abort();
                tracing::debug!(target: targets::FEED, "feed stopped");
                true
            }
            None => false,
        }
    }

    /// Whether the producer task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for CounterFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn produce(config: FeedConfig, stuff: Arc<ObservableList<u32>>) {
    tokio::time::sleep(config.initial_delay).await;

    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut value = config.start_value;
    loop {
        ticker.tick().await;
        value = value.wrapping_add(1);

        // Observers run inside `push`; a panicking observer must not end the feed.
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| stuff.push(value))) {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(target: targets::FEED, value, %message, "failed to append value");
        } else {
            tracing::trace!(target: targets::FEED, value, "value appended");
        }
    }
}
