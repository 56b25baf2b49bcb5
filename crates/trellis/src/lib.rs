//! Trellis - a bindable selection list over observable collections.
//!
//! This is the main crate: it re-exports the core systems from
//! `trellis-core` and adds the picker and everything it binds to.
//!
//! - [`collection`]: the [`ItemsSource`] trait and the thread-safe
//!   [`ObservableList`]
//! - [`projection`]: turning items into display text, by named field or by a
//!   typed accessor
//! - [`selection_list`]: the flat entries and native index of a list widget
//! - [`picker`]: [`BindablePicker`], which keeps the three in step
//! - [`feed`]: a timer-driven background producer (`tokio` feature)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::{BindablePicker, Dispatcher, ObservableList};
//!
//! let dispatcher = Dispatcher::new();
//! let picker = BindablePicker::<u32>::new(&dispatcher);
//! let values = Arc::new(ObservableList::from_vec(vec![10u32, 20]));
//! picker.set_items_source(Some(values.clone()))?;
//!
//! // A worker appends; the picker catches up when the UI thread drains.
//! let worker = values.clone();
//! std::thread::spawn(move || worker.push(30)).join().unwrap();
//! assert_eq!(picker.entry_count(), 2);
//!
//! dispatcher.process_pending();
//! assert_eq!(picker.entries(), vec!["10", "20", "30"]);
//! # Ok::<(), trellis::PickerError>(())
//! ```

extern crate self as trellis;

pub use trellis_core::*;
pub use trellis_macros::*;

pub mod collection;
mod error;
#[cfg(feature = "tokio")]
pub mod feed;
pub mod picker;
pub mod prelude;
pub mod projection;
pub mod selection_list;

pub use collection::{ChangeAction, CollectionChange, ItemsSource, ObservableList};
pub use error::{PickerError, PickerResult, ProjectionError};
pub use picker::{BindablePicker, SharedSource};
pub use projection::{DisplayAccessor, FieldLookup, FieldText, PickerItem, display_accessor};
pub use selection_list::{NO_SELECTION, SelectionList};
