//! Thread affinity checks for UI-owned state.
//!
//! Widget state in Trellis (flat entry lists, native selection indices) may
//! only be mutated on the thread that owns it. [`ThreadAffinity`] records that
//! thread and verifies later accesses, producing a detailed panic message when
//! state is touched from a worker thread.
//!
//! ```
//! use trellis_core::thread_check::ThreadAffinity;
//!
//! struct Entries {
//!     affinity: ThreadAffinity,
//!     items: std::cell::RefCell<Vec<String>>,
//! }
//!
//! impl Entries {
//!     fn push(&self, text: &str) {
//!         self.affinity.assert_current("entries are owned by the UI thread");
//!         self.items.borrow_mut().push(text.to_string());
//!     }
//! }
//!
//! let entries = Entries {
//!     affinity: ThreadAffinity::current(),
//!     items: Default::default(),
//! };
//! entries.push("Alice");
//! ```

use std::thread::ThreadId;

/// Records the thread that owns a piece of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Bind to the calling thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// The owning thread.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Whether the calling thread is the owning thread.
    #[inline]
    pub fn is_current(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Panics unless called on the owning thread. Active in all builds.
    #[track_caller]
    pub fn assert_current(&self, operation: &str) {
        if !self.is_current() {
            let location = std::panic::Location::caller();
            self.panic_wrong_thread(operation, location.file(), location.line());
        }
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self, operation: &str, file: &str, line: u32) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();

        panic!(
            "\n\
            ══════════════════════════════════════════════════════════════════════\n\
            THREAD AFFINITY VIOLATION\n\
            ══════════════════════════════════════════════════════════════════════\n\
            \n\
            {operation}\n\
            \n\
            Location: {file}:{line}\n\
            Owning thread: {:?}\n\
            Current thread: \"{current_name}\" (ID: {current_id:?})\n\
            \n\
            UI-bound state must only be mutated on the thread that owns it.\n\
            Mutating it from a worker corrupts the widget's bookkeeping.\n\
            \n\
            POSSIBLE SOLUTIONS:\n\
            \n\
            1. Post the mutation through the owning Dispatcher:\n\
               dispatcher.post(move || {{ let _ = picker.set_selected_index(0); }});\n\
            \n\
            2. Connect change notifications with Signal::connect_on(&dispatcher, ..)\n\
               so cross-thread emissions are queued to the owning thread.\n\
            \n\
            ══════════════════════════════════════════════════════════════════════",
            self.thread_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_affinity_same_thread() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_current());
        affinity.assert_current("same thread");
    }

    #[test]
    fn test_affinity_reports_other_thread() {
        let affinity = ThreadAffinity::current();
        let other = Arc::new(AtomicBool::new(false));

        let other_clone = other.clone();
        std::thread::spawn(move || {
            other_clone.store(!affinity.is_current(), Ordering::SeqCst);
        })
        .join()
        .unwrap();

        assert!(other.load(Ordering::SeqCst));
    }

    #[test]
    fn test_affinity_panics_on_wrong_thread() {
        let affinity = ThreadAffinity::current();

        let result = std::thread::spawn(move || {
            affinity.assert_current("entries mutated off the UI thread");
        })
        .join();

        assert!(result.is_err(), "expected an affinity violation");
    }

    #[test]
    fn test_violation_message_suggests_posting() {
        let affinity = ThreadAffinity::current();

        let payload = std::thread::spawn(move || {
            affinity.assert_current("selection changed off the UI thread");
        })
        .join()
        .unwrap_err();

        let message = payload.downcast_ref::<String>().cloned().unwrap_or_default();
        assert!(message.contains("selection changed off the UI thread"));
        assert!(message.contains("dispatcher.post(move || { let _ = picker.set_selected_index(0); });"));
    }

    #[test]
    fn test_affinity_default_is_current() {
        let affinity = ThreadAffinity::default();
        assert_eq!(affinity.thread_id(), std::thread::current().id());
    }
}
