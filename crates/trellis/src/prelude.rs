//! Prelude module for Trellis.
//!
//! ```ignore
//! use trellis::prelude::*;
//! ```

// ============================================================================
// Dispatcher, Signals and Properties
// ============================================================================

pub use crate::{ConnectionType, Dispatcher, NotifyProperty, Property, Signal};

// ============================================================================
// Binding
// ============================================================================

pub use crate::collection::{ItemsSource, ObservableList};
pub use crate::picker::BindablePicker;
pub use crate::PickerItem;
pub use crate::projection::FieldLookup;
pub use crate::{PickerError, ProjectionError};

#[cfg(feature = "tokio")]
pub use crate::feed::{CounterFeed, FeedConfig};
