//! Core systems for Trellis.
//!
//! This crate provides the foundations the selection adapter is built on:
//!
//! - **Dispatcher**: A single-threaded executor that owns UI state and accepts
//!   work from any thread
//! - **Signal/Slot System**: Type-safe notifications with direct or queued
//!   delivery onto a dispatcher
//! - **Property System**: Values with change detection and change signals
//! - **Thread Affinity**: Runtime checks that UI state is touched only on its
//!   owning thread
//!
//! # Cross-thread Example
//!
//! ```
//! use trellis_core::{Dispatcher, Signal};
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! // Created on the UI thread.
//! let dispatcher = Dispatcher::new();
//! let entries = Arc::new(Mutex::new(Vec::<String>::new()));
//!
//! let item_added = Arc::new(Signal::<u32>::new());
//! let entries_clone = entries.clone();
//! item_added.connect_on(&dispatcher, move |value| {
//!     entries_clone.lock().push(value.to_string());
//! });
//!
//! // A worker emits; the slot is queued to the UI thread.
//! let remote = item_added.clone();
//! std::thread::spawn(move || remote.emit(7)).join().unwrap();
//! assert!(entries.lock().is_empty());
//!
//! dispatcher.process_pending();
//! assert_eq!(*entries.lock(), vec!["7".to_string()]);
//! ```

pub mod dispatcher;
mod error;
pub mod logging;
pub mod property;
pub mod signal;
pub mod thread_check;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{DispatchError, SignalError};
pub use logging::PerfSpan;
pub use property::{NotifyProperty, Property};
pub use signal::{ConnectionGuard, ConnectionId, ConnectionType, Signal};
pub use thread_check::ThreadAffinity;
