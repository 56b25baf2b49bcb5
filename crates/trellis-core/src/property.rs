//! Property system for Trellis.
//!
//! - [`Property<T>`]: a value with change detection (`set` reports whether the
//!   value actually changed)
//! - [`NotifyProperty<T>`]: a property paired with a `changed` signal that is
//!   emitted only on an actual change
//!
//! The "emit only on change" rule is what lets two-way bindings settle: a
//! write that stores an equal value produces no notification, so a binding
//! echoing a value back terminates instead of looping.
//!
//! # Example
//!
//! ```
//! use trellis_core::NotifyProperty;
//!
//! let text = NotifyProperty::new("initializing...".to_string());
//! text.changed().connect(|value| println!("text is now {value}"));
//!
//! assert!(text.set("ready".to_string()));
//! assert!(!text.set("ready".to_string())); // equal: no notification
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::logging::targets;
use crate::signal::Signal;

/// A value with change detection.
///
/// Uses interior mutability with `RwLock` and is `Send + Sync` when `T` is.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if it changed.
    pub fn set(&self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Set the value, returning the previous value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("value", &self.get()).finish()
    }
}

/// A property that emits `changed` whenever its value actually changes.
pub struct NotifyProperty<T: Clone + Send + 'static> {
    value: Property<T>,
    changed: Signal<T>,
}

impl<T: Clone + PartialEq + Send + 'static> NotifyProperty<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: Property::new(value),
            changed: Signal::new(),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Set the value and emit `changed` if it differs from the current one.
    ///
    /// The lock is released before the signal is emitted, so slots may read
    /// or write this property.
    pub fn set(&self, value: T) -> bool {
        if self.value.replace(value.clone()).is_some() {
            tracing::trace!(target: targets::PROPERTY, "property changed");
            self.changed.emit(value);
            true
        } else {
            false
        }
    }

    /// The change notification signal.
    pub fn changed(&self) -> &Signal<T> {
        &self.changed
    }
}

impl<T: Clone + PartialEq + Send + Default + 'static> Default for NotifyProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + Send + fmt::Debug + 'static> fmt::Debug for NotifyProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyProperty")
            .field("value", &self.get())
            .field("connections", &self.changed.connection_count())
            .finish()
    }
}
