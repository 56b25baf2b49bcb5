//! The bindable picker: a selection list bound to a collection of domain
//! objects.
//!
//! [`BindablePicker`] keeps three things consistent:
//!
//! - the flat display entries of its [`SelectionList`], one per source item,
//! - the native selection index of that list,
//! - the externally visible selected item.
//!
//! Writes arrive through three setters. Assigning an items source rebuilds
//! the entries and subscribes to the source's change signal. Writing the
//! native index resolves the item at that position. Writing the selected item
//! resolves its position and moves the native index. The last two feed each
//! other; both stop as soon as the value they would write equals the value
//! already stored, which is what settles the loop.
//!
//! All picker state belongs to the thread that owns the picker's
//! [`Dispatcher`]. Setters called from another thread fail with
//! [`DispatchError::WrongThread`]. Change notifications from the source are
//! always queued on the dispatcher, including those emitted on the owning
//! thread, so they reach the entry list in emission order. A worker thread may
//! mutate the bound collection freely; the entry list is only touched when the
//! owning thread drains its queue.
//!
//! A rebuild records the revision of the snapshot it read. Queued changes
//! that the snapshot already contains are skipped when they are drained.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::{BindablePicker, Dispatcher, ObservableList, PickerItem};
//!
//! #[derive(Debug, Clone, PartialEq, PickerItem)]
//! struct Person {
//!     name: String,
//! }
//!
//! let dispatcher = Dispatcher::new();
//! let picker = BindablePicker::<Person>::new(&dispatcher);
//! picker.set_display_field("name")?;
//!
//! let people = Arc::new(ObservableList::from_vec(vec![
//!     Person { name: "Alice".into() },
//!     Person { name: "Bob".into() },
//! ]));
//! picker.set_items_source(Some(people.clone()))?;
//! assert_eq!(picker.entries(), vec!["Alice", "Bob"]);
//!
//! picker.set_selected_index(1)?;
//! assert_eq!(picker.selected_item(), Some(Person { name: "Bob".into() }));
//!
//! picker.set_selected_item(Some(Person { name: "Alice".into() }))?;
//! assert_eq!(picker.selected_index(), 0);
//! # Ok::<(), trellis::PickerError>(())
//! ```

use std::ops::ControlFlow;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use trellis_core::logging::targets;
use trellis_core::{ConnectionGuard, ConnectionType, DispatchError, Dispatcher, PerfSpan, Signal};

use crate::collection::{self, ChangeAction, CollectionChange, ItemsSource};
use crate::error::{PickerResult, ProjectionError};
use crate::projection::{DisplayAccessor, PickerItem, Projection};
use crate::selection_list::{NO_SELECTION, SelectionList};

/// Shared handle to a bound collection.
pub type SharedSource<T> = Arc<dyn ItemsSource<T>>;

/// Notifications produced while the state lock is held, emitted after it is
/// released.
enum PickerEvent<T> {
    SelectedItem(Option<T>),
    SelectedIndex(i32),
    Entries(usize),
    DisplayField(String),
}

struct PickerState<T: PickerItem> {
    source: Option<SharedSource<T>>,
    /// Bumped on every source assignment and on detach. Deltas queued for an
    /// older generation are discarded.
    generation: u64,
    /// Source revision the entries reflect.
    synced_revision: u64,
    subscription: Option<ConnectionGuard<CollectionChange<T>>>,
    projection: Projection<T>,
    list: SelectionList,
    selected_item: Option<T>,
}

impl<T: PickerItem> PickerState<T> {
    fn new() -> Self {
        Self {
            source: None,
            generation: 0,
            synced_revision: 0,
            subscription: None,
            projection: Projection::default(),
            list: SelectionList::new(),
            selected_item: None,
        }
    }

    fn write_selected_item(&mut self, item: Option<T>, events: &mut Vec<PickerEvent<T>>) {
        if self.selected_item == item {
            return;
        }
        self.selected_item = item.clone();
        events.push(PickerEvent::SelectedItem(item));
        self.on_selected_item_changed(events);
    }

    /// Move the native index to the position of the selected item.
    fn on_selected_item_changed(&mut self, events: &mut Vec<PickerEvent<T>>) {
        let index = {
            let Some(source) = &self.source else {
                return;
            };
            self.selected_item
                .as_ref()
                .and_then(|item| collection::position_of(source.as_ref(), item))
                .map_or(NO_SELECTION, |position| position as i32)
        };
        if index == self.list.current_index() {
            return;
        }
        self.write_native_index(index, events);
    }

    fn write_native_index(&mut self, index: i32, events: &mut Vec<PickerEvent<T>>) {
        if !self.list.set_current_index(index) {
            return;
        }
        events.push(PickerEvent::SelectedIndex(self.list.current_index()));
        self.on_selection_changed(events);
    }

    /// Resolve the item under the native index.
    fn on_selection_changed(&mut self, events: &mut Vec<PickerEvent<T>>) {
        let item = match usize::try_from(self.list.current_index()) {
            Ok(index) if index < self.list.count() => self
                .source
                .as_ref()
                .and_then(|source| collection::nth(source.as_ref(), index)),
            _ => None,
        };
        self.write_selected_item(item, events);
    }

    /// Re-project every item of the bound source.
    ///
    /// On failure the entries projected so far are kept and the error is
    /// returned. The native index is kept when it is still in range; if it
    /// falls off the end it becomes `-1` and the item under it is resolved
    /// again.
    fn rebuild(&mut self, events: &mut Vec<PickerEvent<T>>) -> Result<(), ProjectionError> {
        let Some(source) = self.source.clone() else {
            return Ok(());
        };
        let _perf = PerfSpan::new("picker.rebuild");

        let mut entries = Vec::with_capacity(source.len());
        let mut failure = None;
        let projection = &self.projection;
        let revision = source.visit_snapshot(&mut |item| match projection.project(item) {
            Ok(text) => {
                entries.push(text);
                ControlFlow::Continue(())
            }
            Err(error) => {
                failure = Some(error);
                ControlFlow::Break(())
            }
        });

        self.synced_revision = revision;
        let previous_index = self.list.current_index();
        let index_moved = self.list.set_entries(entries);
        tracing::debug!(
            target: targets::PICKER,
            entries = self.list.count(),
            revision,
            previous_index,
            complete = failure.is_none(),
            "entries rebuilt"
        );
        events.push(PickerEvent::Entries(self.list.count()));
        if index_moved {
            events.push(PickerEvent::SelectedIndex(self.list.current_index()));
            self.on_selection_changed(events);
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Apply an incremental change without rebuilding.
    fn apply_change(
        &mut self,
        change: &CollectionChange<T>,
        events: &mut Vec<PickerEvent<T>>,
    ) -> Result<(), ProjectionError> {
        if change.revision != 0 {
            if change.revision <= self.synced_revision {
                tracing::trace!(
                    target: targets::PICKER,
                    revision = change.revision,
                    synced = self.synced_revision,
                    "change already in the entries"
                );
                return Ok(());
            }
            self.synced_revision = change.revision;
        }
        if change.action == ChangeAction::Reset {
            tracing::debug!(target: targets::PICKER, "reset notification ignored");
            return Ok(());
        }

        let previous_index = self.list.current_index();
        let mut touched = false;
        let result = self.apply_entries(change, &mut touched);

        if touched {
            events.push(PickerEvent::Entries(self.list.count()));
        }
        if self.list.current_index() != previous_index {
            events.push(PickerEvent::SelectedIndex(self.list.current_index()));
            self.on_selection_changed(events);
        }
        self.on_selected_item_changed(events);
        result
    }

    /// Added items are appended whatever their reported position. Removed
    /// items take out the first entry with the same text.
    ///
    /// Removed items are compared by their projection under the active
    /// display field rather than their plain display text, so an entry always
    /// matches the text it was built from.
    fn apply_entries(
        &mut self,
        change: &CollectionChange<T>,
        touched: &mut bool,
    ) -> Result<(), ProjectionError> {
        for item in &change.added {
            let text = self.projection.project(item)?;
            self.list.push_entry(text);
            *touched = true;
        }
        for item in &change.removed {
            let text = self.projection.project(item)?;
            match self.list.remove_entry(&text) {
                Some(_) => *touched = true,
                None => {
                    tracing::trace!(target: targets::PICKER, %text, "removed item had no entry")
                }
            }
        }
        Ok(())
    }

    fn release_subscription(&mut self) {
        if let Some(mut guard) = self.subscription.take()
            && let Err(error) = guard.disconnect()
        {
            tracing::trace!(target: targets::PICKER, %error, "subscription already gone");
        }
    }
}

struct PickerInner<T: PickerItem> {
    dispatcher: Dispatcher,
    state: Mutex<PickerState<T>>,
    selected_item_changed: Signal<Option<T>>,
    selected_index_changed: Signal<i32>,
    entries_changed: Signal<usize>,
    display_field_changed: Signal<String>,
    delta_failed: Signal<ProjectionError>,
}

impl<T: PickerItem> PickerInner<T> {
    fn emit(&self, events: Vec<PickerEvent<T>>) {
        for event in events {
            match event {
                PickerEvent::SelectedItem(item) => self.selected_item_changed.emit(item),
                PickerEvent::SelectedIndex(index) => self.selected_index_changed.emit(index),
                PickerEvent::Entries(count) => self.entries_changed.emit(count),
                PickerEvent::DisplayField(field) => self.display_field_changed.emit(field),
            }
        }
    }

    fn on_collection_changed(&self, generation: u64, change: &CollectionChange<T>) {
        let mut events = Vec::new();
        let result = {
            let mut state = self.state.lock();
            if state.generation != generation {
                tracing::trace!(
                    target: targets::PICKER,
                    generation,
                    current = state.generation,
                    "dropping change from a previous source"
                );
                return;
            }
            let _perf = PerfSpan::new("picker.delta");
            state.apply_change(change, &mut events)
        };
        self.emit(events);

        if let Err(error) = result {
            tracing::warn!(
                target: targets::PICKER,
                action = ?change.action,
                %error,
                "failed to apply collection change"
            );
            self.delta_failed.emit(error);
        }
    }
}

/// A selection list bound to a collection of domain objects.
///
/// Cloning yields another handle to the same picker. The subscription to the
/// bound collection is released when the last handle is dropped.
pub struct BindablePicker<T: PickerItem> {
    inner: Arc<PickerInner<T>>,
}

impl<T: PickerItem> Clone for BindablePicker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: PickerItem + std::fmt::Debug> std::fmt::Debug for BindablePicker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BindablePicker")
            .field("dispatcher", &self.inner.dispatcher.name())
            .field("bound", &state.source.is_some())
            .field("projection", &state.projection)
            .field("entries", &state.list.entries())
            .field("selected_index", &state.list.current_index())
            .field("selected_item", &state.selected_item)
            .finish()
    }
}

impl<T: PickerItem> BindablePicker<T> {
    /// Create an unbound picker owned by `dispatcher`'s thread.
    pub fn new(dispatcher: &Dispatcher) -> Self {
        Self {
            inner: Arc::new(PickerInner {
                dispatcher: dispatcher.clone(),
                state: Mutex::new(PickerState::new()),
                selected_item_changed: Signal::new(),
                selected_index_changed: Signal::new(),
                entries_changed: Signal::new(),
                display_field_changed: Signal::new(),
                delta_failed: Signal::new(),
            }),
        }
    }

    /// The dispatcher whose thread owns this picker.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    fn check_thread(&self, operation: &'static str) -> PickerResult<()> {
        if self.inner.dispatcher.is_owner_thread() {
            return Ok(());
        }
        tracing::warn!(
            target: targets::PICKER,
            operation,
            dispatcher = %self.inner.dispatcher.name(),
            "picker touched off its owning thread"
        );
        Err(DispatchError::WrongThread.into())
    }

    fn update<R>(&self, f: impl FnOnce(&mut PickerState<T>, &mut Vec<PickerEvent<T>>) -> R) -> R {
        let mut events = Vec::new();
        let result = {
            let mut state = self.inner.state.lock();
            f(&mut state, &mut events)
        };
        self.inner.emit(events);
        result
    }

    // =========================================================================
    // Items source
    // =========================================================================

    /// Bind a collection.
    ///
    /// `None` is ignored: the current source, its subscription, the entries
    /// and the selection are all kept. Re-assigning the source that is
    /// already bound is also ignored.
    ///
    /// Otherwise the previous subscription is released, the new source is
    /// subscribed if it reports changes, and the entries are rebuilt. Changes
    /// made between subscribing and reading the source are skipped by
    /// revision. The selection is not re-resolved; the native index is kept
    /// while it is still in range.
    ///
    /// A projection failure stops the rebuild. The source stays bound and
    /// the entries projected before the failure remain.
    pub fn set_items_source(&self, source: Option<SharedSource<T>>) -> PickerResult<()> {
        self.check_thread("set_items_source")?;
        let Some(source) = source else {
            tracing::trace!(target: targets::PICKER, "null items source ignored");
            return Ok(());
        };

        let weak = Arc::downgrade(&self.inner);
        let dispatcher = self.inner.dispatcher.clone();
        let result = self.update(|state, events| {
            if let Some(current) = &state.source
                && std::ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(&source))
            {
                return Ok(());
            }

            state.release_subscription();
            state.generation += 1;
            let generation = state.generation;
            state.subscription = source
                .changes()
                .map(|signal| subscribe(&signal, &dispatcher, weak, generation));
            tracing::debug!(
                target: targets::PICKER,
                items = source.len(),
                observable = state.subscription.is_some(),
                generation,
                "items source assigned"
            );

            state.source = Some(source);
            state.rebuild(events)
        });
        Ok(result?)
    }

    /// The bound collection, if any.
    pub fn items_source(&self) -> Option<SharedSource<T>> {
        self.inner.state.lock().source.clone()
    }

    /// Whether a change subscription to the bound collection is active.
    pub fn is_subscribed(&self) -> bool {
        self.inner
            .state
            .lock()
            .subscription
            .as_ref()
            .is_some_and(ConnectionGuard::is_connected)
    }

    /// Stop listening to the bound collection's changes.
    ///
    /// The source stays bound and the entries stay as they are. Changes
    /// already queued on the dispatcher are discarded.
    pub fn detach(&self) -> PickerResult<()> {
        self.check_thread("detach")?;
        let mut state = self.inner.state.lock();
        state.release_subscription();
        state.generation += 1;
        tracing::debug!(target: targets::PICKER, "detached from items source");
        Ok(())
    }

    // =========================================================================
    // Display projection
    // =========================================================================

    /// The display field name (empty when unset).
    pub fn display_field(&self) -> String {
        self.inner.state.lock().projection.display_field().to_string()
    }

    /// Set the display field and re-project the bound source.
    pub fn set_display_field(&self, display_field: impl Into<String>) -> PickerResult<()> {
        self.check_thread("set_display_field")?;
        let display_field = display_field.into();
        let result = self.update(|state, events| {
            if state.projection.display_field() == display_field {
                return Ok(());
            }
            state.projection.set_display_field(display_field.clone());
            events.push(PickerEvent::DisplayField(display_field));
            state.rebuild(events)
        });
        Ok(result?)
    }

    /// Install or clear a typed display accessor and re-project the bound
    /// source. While installed it takes precedence over the display field.
    pub fn set_display_accessor(&self, accessor: Option<DisplayAccessor<T>>) -> PickerResult<()> {
        self.check_thread("set_display_accessor")?;
        let result = self.update(|state, events| {
            state.projection.set_accessor(accessor);
            state.rebuild(events)
        });
        Ok(result?)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// The selected item.
    pub fn selected_item(&self) -> Option<T> {
        self.inner.state.lock().selected_item.clone()
    }

    /// Write the selected item and move the native index to its position.
    ///
    /// An item that is not in the source selects nothing (`-1`). Without a
    /// bound source only the stored value changes.
    pub fn set_selected_item(&self, item: Option<T>) -> PickerResult<()> {
        self.check_thread("set_selected_item")?;
        self.update(|state, events| state.write_selected_item(item, events));
        Ok(())
    }

    /// The native selection index (`-1` if nothing is selected).
    pub fn selected_index(&self) -> i32 {
        self.inner.state.lock().list.current_index()
    }

    /// Write the native index, as user interaction would.
    ///
    /// An index outside the entries selects nothing and clears the selected
    /// item.
    pub fn set_selected_index(&self, index: i32) -> PickerResult<()> {
        self.check_thread("set_selected_index")?;
        self.update(|state, events| state.write_native_index(index, events));
        Ok(())
    }

    /// Text of the selected entry, or an empty string.
    pub fn current_text(&self) -> String {
        self.inner.state.lock().list.current_text()
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Snapshot of the display entries.
    pub fn entries(&self) -> Vec<String> {
        self.inner.state.lock().list.entries().to_vec()
    }

    /// Number of display entries.
    pub fn entry_count(&self) -> usize {
        self.inner.state.lock().list.count()
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Emitted with the new selected item whenever it changes.
    pub fn selected_item_changed(&self) -> &Signal<Option<T>> {
        &self.inner.selected_item_changed
    }

    /// Emitted with the new native index whenever it changes.
    pub fn selected_index_changed(&self) -> &Signal<i32> {
        &self.inner.selected_index_changed
    }

    /// Emitted with the entry count after a rebuild or an applied change.
    pub fn entries_changed(&self) -> &Signal<usize> {
        &self.inner.entries_changed
    }

    /// Emitted with the new display field name.
    pub fn display_field_changed(&self) -> &Signal<String> {
        &self.inner.display_field_changed
    }

    /// Emitted when an incremental change could not be projected.
    pub fn delta_failed(&self) -> &Signal<ProjectionError> {
        &self.inner.delta_failed
    }
}

fn subscribe<T: PickerItem>(
    signal: &Arc<Signal<CollectionChange<T>>>,
    dispatcher: &Dispatcher,
    picker: Weak<PickerInner<T>>,
    generation: u64,
) -> ConnectionGuard<CollectionChange<T>> {
    signal.connect_scoped(
        dispatcher,
        move |change| {
            if let Some(inner) = picker.upgrade() {
                inner.on_collection_changed(generation, change);
            }
        },
        ConnectionType::Queued,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ObservableList;
    use crate::projection::{FieldLookup, FieldText};

    #[derive(Debug, Clone, PartialEq)]
    struct Fruit {
        label: String,
        weight: Option<u32>,
    }

    impl FieldLookup for Fruit {
        fn field_names(&self) -> &'static [&'static str] {
            &["label", "weight"]
        }

        fn read_field(&self, name: &str) -> Result<String, ProjectionError> {
            match name {
                "label" => self.label.field_text(name),
                "weight" => self.weight.field_text(name),
                _ => Err(ProjectionError::UnknownField {
                    field: name.to_string(),
                }),
            }
        }
    }

    impl PickerItem for Fruit {
        fn display_text(&self) -> String {
            format!("fruit:{}", self.label)
        }
    }

    fn fruit(label: &str, weight: Option<u32>) -> Fruit {
        Fruit {
            label: label.to_string(),
            weight,
        }
    }

    fn basket() -> Arc<ObservableList<Fruit>> {
        Arc::new(ObservableList::from_vec(vec![
            fruit("apple", Some(120)),
            fruit("pear", Some(180)),
            fruit("plum", Some(40)),
        ]))
    }

    #[test]
    fn test_rebuild_uses_display_text_without_field() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<Fruit>::new(&dispatcher);
        picker.set_items_source(Some(basket())).unwrap();

        assert_eq!(picker.entries(), vec!["fruit:apple", "fruit:pear", "fruit:plum"]);
        assert_eq!(picker.selected_index(), NO_SELECTION);
        assert!(picker.is_subscribed());
    }

    #[test]
    fn test_display_field_change_reprojects() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<Fruit>::new(&dispatcher);
        picker.set_items_source(Some(basket())).unwrap();

        picker.set_display_field("weight").unwrap();
        assert_eq!(picker.entries(), vec!["120", "180", "40"]);
        assert_eq!(picker.display_field(), "weight");
    }

    #[test]
    fn test_rebuild_failure_keeps_partial_entries() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<Fruit>::new(&dispatcher);
        picker.set_display_field("weight").unwrap();

        let source = Arc::new(ObservableList::from_vec(vec![
            fruit("apple", Some(1)),
            fruit("fig", None),
            fruit("kiwi", Some(3)),
        ]));
        let result = picker.set_items_source(Some(source.clone()));

        assert!(matches!(
            result,
            Err(crate::PickerError::Projection(ProjectionError::NullField { .. }))
        ));
        assert_eq!(picker.entries(), vec!["1"]);
        assert!(picker.items_source().is_some());
        assert!(picker.is_subscribed());
    }

    #[test]
    fn test_index_and_item_stay_in_step() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<Fruit>::new(&dispatcher);
        picker.set_items_source(Some(basket())).unwrap();

        picker.set_selected_index(2).unwrap();
        assert_eq!(picker.selected_item(), Some(fruit("plum", Some(40))));

        picker.set_selected_item(Some(fruit("apple", Some(120)))).unwrap();
        assert_eq!(picker.selected_index(), 0);
        assert_eq!(picker.current_text(), "fruit:apple");

        // Leaving a selected entry clears the item through the index trigger.
        picker.set_selected_item(Some(fruit("durian", None))).unwrap();
        assert_eq!(picker.selected_index(), NO_SELECTION);
        assert_eq!(picker.selected_item(), None);

        picker.set_selected_index(1).unwrap();
        picker.set_selected_index(99).unwrap();
        assert_eq!(picker.selected_item(), None);
    }

    #[test]
    fn test_absent_item_is_kept_without_selection() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<Fruit>::new(&dispatcher);
        picker.set_items_source(Some(basket())).unwrap();
        assert_eq!(picker.selected_index(), NO_SELECTION);

        picker.set_selected_item(Some(fruit("durian", None))).unwrap();
        assert_eq!(picker.selected_index(), NO_SELECTION);
        assert_eq!(picker.selected_item(), Some(fruit("durian", None)));
    }

    #[test]
    fn test_signals_fire_once_per_change() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<Fruit>::new(&dispatcher);
        picker.set_items_source(Some(basket())).unwrap();

        let items = Arc::new(Mutex::new(Vec::new()));
        let indices = Arc::new(Mutex::new(Vec::new()));
        let items_clone = items.clone();
        let indices_clone = indices.clone();
        picker
            .selected_item_changed()
            .connect(move |item: &Option<Fruit>| {
                items_clone.lock().push(item.as_ref().map(|f| f.label.clone()))
            });
        picker
            .selected_index_changed()
            .connect(move |index| indices_clone.lock().push(*index));

        picker.set_selected_index(1).unwrap();
        picker.set_selected_index(1).unwrap();
        picker.set_selected_item(Some(fruit("pear", Some(180)))).unwrap();

        assert_eq!(*items.lock(), vec![Some("pear".to_string())]);
        assert_eq!(*indices.lock(), vec![1]);
    }

    #[test]
    fn test_stale_deltas_are_dropped_after_reassignment() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<Fruit>::new(&dispatcher);
        let first = basket();
        picker.set_items_source(Some(first.clone())).unwrap();

        let worker_list = first.clone();
        std::thread::spawn(move || worker_list.push(fruit("lime", Some(60))))
            .join()
            .unwrap();
        assert_eq!(dispatcher.pending_count(), 1);

        let second: SharedSource<Fruit> = Arc::new(vec![fruit("date", Some(8))]);
        picker.set_items_source(Some(second)).unwrap();
        dispatcher.process_pending();

        assert_eq!(picker.entries(), vec!["fruit:date"]);
        assert!(!picker.is_subscribed());
        assert_eq!(first.changes().connection_count(), 0);
    }

    #[test]
    fn test_delta_failure_is_reported() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<Fruit>::new(&dispatcher);
        picker.set_display_field("weight").unwrap();
        let source = basket();
        picker.set_items_source(Some(source.clone())).unwrap();

        let failures = Arc::new(Mutex::new(Vec::new()));
        let failures_clone = failures.clone();
        picker
            .delta_failed()
            .connect(move |error| failures_clone.lock().push(error.clone()));

        source.push(fruit("fig", None));
        dispatcher.process_pending();

        assert_eq!(
            *failures.lock(),
            vec![ProjectionError::NullField {
                field: "weight".to_string()
            }]
        );
        assert_eq!(picker.entry_count(), 3);
    }

    #[test]
    fn test_off_thread_setter_is_rejected() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<u32>::new(&dispatcher);

        let remote = picker.clone();
        let result = std::thread::spawn(move || remote.set_selected_index(0))
            .join()
            .unwrap();
        assert_eq!(
            result,
            Err(crate::PickerError::Dispatch(DispatchError::WrongThread))
        );
    }

    #[test]
    fn test_detach_stops_deltas() {
        let dispatcher = Dispatcher::new();
        let picker = BindablePicker::<u32>::new(&dispatcher);
        let source = Arc::new(ObservableList::from_vec(vec![1u32, 2]));
        picker.set_items_source(Some(source.clone())).unwrap();

        source.push(3);
        picker.detach().unwrap();
        source.push(4);
        dispatcher.process_pending();

        assert_eq!(picker.entries(), vec!["1", "2"]);
        assert_eq!(source.changes().connection_count(), 0);
    }

    #[test]
    fn test_dropping_picker_releases_subscription() {
        let dispatcher = Dispatcher::new();
        let source = Arc::new(ObservableList::from_vec(vec![1u32]));
        {
            let picker = BindablePicker::<u32>::new(&dispatcher);
            picker.set_items_source(Some(source.clone())).unwrap();
            assert_eq!(source.changes().connection_count(), 1);
        }
        assert_eq!(source.changes().connection_count(), 0);
    }
}
