//! Backing collections for the picker.
//!
//! A picker reads its items through the [`ItemsSource`] trait, which only
//! requires ordered iteration and a length. Sources that can report
//! incremental changes also expose a change signal; [`ObservableList`] is the
//! thread-safe implementation shipped with this crate, and a plain `Vec<T>`
//! serves as a static, non-notifying source.
//!
//! # Example
//!
//! ```
//! use trellis::collection::{ChangeAction, ObservableList};
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! let list = ObservableList::new();
//! let actions = Arc::new(Mutex::new(Vec::new()));
//!
//! let actions_clone = actions.clone();
//! list.changes().connect(move |change| actions_clone.lock().push(change.action));
//!
//! list.push(1u32);
//! list.push(2);
//! list.remove_item(&1);
//!
//! assert_eq!(list.to_vec(), vec![2]);
//! assert_eq!(
//!     *actions.lock(),
//!     vec![ChangeAction::Add, ChangeAction::Add, ChangeAction::Remove]
//! );
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{ReentrantMutex, RwLock};
use trellis_core::Signal;
use trellis_core::logging::targets;

/// The kind of mutation a [`CollectionChange`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// Items were inserted.
    Add,
    /// Items were removed.
    Remove,
    /// An item was overwritten; `removed` holds the old value, `added` the new.
    Replace,
    /// An item changed position; it appears in both `removed` and `added`.
    Move,
    /// The collection changed drastically (cleared). No item payload.
    Reset,
}

/// An incremental change delivered by an observable collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionChange<T> {
    /// What happened.
    pub action: ChangeAction,
    /// Items that entered the collection, in order.
    pub added: Vec<T>,
    /// Position of the first added item, when known.
    pub added_at: Option<usize>,
    /// Items that left the collection, in order.
    pub removed: Vec<T>,
    /// Position of the first removed item, when known.
    pub removed_at: Option<usize>,
    /// Revision of the collection once this change was applied. Zero when the
    /// source does not track revisions.
    pub revision: u64,
}

impl<T> CollectionChange<T> {
    /// Items inserted starting at `index`.
    pub fn added(items: Vec<T>, index: Option<usize>) -> Self {
        Self {
            action: ChangeAction::Add,
            added: items,
            added_at: index,
            removed: Vec::new(),
            removed_at: None,
            revision: 0,
        }
    }

    /// Items removed starting at `index`.
    pub fn removed(items: Vec<T>, index: Option<usize>) -> Self {
        Self {
            action: ChangeAction::Remove,
            added: Vec::new(),
            added_at: None,
            removed: items,
            removed_at: index,
            revision: 0,
        }
    }

    /// `old` replaced by `new` at `index`.
    pub fn replaced(old: T, new: T, index: usize) -> Self {
        Self {
            action: ChangeAction::Replace,
            added: vec![new],
            added_at: Some(index),
            removed: vec![old],
            removed_at: Some(index),
            revision: 0,
        }
    }

    /// The collection was cleared or rebuilt.
    pub fn reset() -> Self {
        Self {
            action: ChangeAction::Reset,
            added: Vec::new(),
            added_at: None,
            removed: Vec::new(),
            removed_at: None,
            revision: 0,
        }
    }
}

impl<T> CollectionChange<T> {
    /// Stamp the change with the collection revision it produced.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }
}

impl<T: Clone> CollectionChange<T> {
    /// `item` moved from `from` to `to`.
    pub fn moved(item: T, from: usize, to: usize) -> Self {
        Self {
            action: ChangeAction::Move,
            added: vec![item.clone()],
            added_at: Some(to),
            removed: vec![item],
            removed_at: Some(from),
            revision: 0,
        }
    }
}

/// Signal type carrying collection changes.
pub type ChangeSignal<T> = Signal<CollectionChange<T>>;

/// An ordered, externally owned sequence of items.
///
/// The picker never mutates a source; it only reads it.
pub trait ItemsSource<T>: Send + Sync {
    /// Number of items.
    fn len(&self) -> usize;

    /// Whether the source has no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit items in order until the visitor breaks.
    ///
    /// Implementations may hold a read lock while visiting; visitors must not
    /// mutate the source.
    fn visit(&self, visitor: &mut dyn FnMut(&T) -> ControlFlow<()>);

    /// Visit items like [`visit`](Self::visit) and return the revision they
    /// reflect. Changes stamped with a revision at or below it are already
    /// part of what was visited.
    fn visit_snapshot(&self, visitor: &mut dyn FnMut(&T) -> ControlFlow<()>) -> u64 {
        self.visit(visitor);
        0
    }

    /// The change notification signal, if this source reports changes.
    fn changes(&self) -> Option<Arc<ChangeSignal<T>>> {
        None
    }
}

impl<T: Send + Sync> ItemsSource<T> for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn visit(&self, visitor: &mut dyn FnMut(&T) -> ControlFlow<()>) {
        for item in self {
            if visitor(item).is_break() {
                break;
            }
        }
    }
}

/// Position of the first item equal to `item`.
pub fn position_of<T: PartialEq>(source: &dyn ItemsSource<T>, item: &T) -> Option<usize> {
    let mut index = 0;
    let mut found = None;
    source.visit(&mut |candidate| {
        if candidate == item {
            found = Some(index);
            return ControlFlow::Break(());
        }
        index += 1;
        ControlFlow::Continue(())
    });
    found
}

/// The item at `index`, found by walking the source in order.
///
/// Sources are not required to support random access.
pub fn nth<T: Clone>(source: &dyn ItemsSource<T>, index: usize) -> Option<T> {
    let mut count = 0;
    let mut found = None;
    source.visit(&mut |candidate| {
        if count == index {
            found = Some(candidate.clone());
            return ControlFlow::Break(());
        }
        count += 1;
        ControlFlow::Continue(())
    });
    found
}

/// A thread-safe list that reports every mutation.
///
/// Each mutation emits exactly one [`CollectionChange`] on [`changes`](Self::changes).
/// Mutation and emission are serialized, so observers see changes in the
/// order they were applied even when several threads mutate the list.
/// Slots connected directly may themselves mutate the list.
///
/// Every change carries the list's revision, which starts at zero and grows by
/// one per mutation.
pub struct ObservableList<T> {
    items: RwLock<Vec<T>>,
    /// Only written while `items` is write-locked.
    revision: AtomicU64,
    change_lock: ReentrantMutex<()>,
    changed: Arc<ChangeSignal<T>>,
}

impl<T: Clone + Send + Sync + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &*self.items.read())
            .field("revision", &self.revision())
            .field("observers", &self.changed.connection_count())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> ObservableList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create a list holding `items`.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            revision: AtomicU64::new(0),
            change_lock: ReentrantMutex::new(()),
            changed: Arc::new(Signal::new()),
        }
    }

    /// The change notification signal.
    pub fn changes(&self) -> &Arc<ChangeSignal<T>> {
        &self.changed
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    /// Clone of all items.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.read().clone()
    }

    fn apply<R>(&self, mutate: impl FnOnce(&mut Vec<T>) -> Option<(R, CollectionChange<T>)>) -> Option<R> {
        let _serial = self.change_lock.lock();
        let (result, change) = {
            let mut items = self.items.write();
            let (result, change) = mutate(&mut items)?;
            let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
            (result, change.with_revision(revision))
        };
        tracing::trace!(
            target: targets::COLLECTION,
            revision = change.revision,
            action = ?change.action,
            added = change.added.len(),
            removed = change.removed.len(),
            "collection changed"
        );
        self.changed.emit(change);
        Some(result)
    }

    /// Append an item.
    pub fn push(&self, item: T) {
        self.apply(|items| {
            let index = items.len();
            items.push(item.clone());
            Some(((), CollectionChange::added(vec![item], Some(index))))
        });
    }

    /// Append several items as a single change.
    pub fn extend(&self, new_items: impl IntoIterator<Item = T>) {
        let new_items: Vec<T> = new_items.into_iter().collect();
        if new_items.is_empty() {
            return;
        }
        self.apply(|items| {
            let index = items.len();
            items.extend(new_items.iter().cloned());
            Some(((), CollectionChange::added(new_items, Some(index))))
        });
    }

    /// Insert an item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&self, index: usize, item: T) {
        self.apply(|items| {
            items.insert(index, item.clone());
            Some(((), CollectionChange::added(vec![item], Some(index))))
        });
    }

    /// Remove and return the item at `index`.
    pub fn remove_at(&self, index: usize) -> Option<T> {
        self.apply(|items| {
            if index >= items.len() {
                return None;
            }
            let removed = items.remove(index);
            Some((removed.clone(), CollectionChange::removed(vec![removed], Some(index))))
        })
    }

    /// Overwrite the item at `index`, returning the previous item.
    pub fn set(&self, index: usize, item: T) -> Option<T> {
        self.apply(|items| {
            let slot = items.get_mut(index)?;
            let old = std::mem::replace(slot, item.clone());
            Some((old.clone(), CollectionChange::replaced(old, item, index)))
        })
    }

    /// Move the item at `from` so that it ends up at `to`.
    pub fn move_item(&self, from: usize, to: usize) -> bool {
        self.apply(|items| {
            if from >= items.len() || to >= items.len() || from == to {
                return None;
            }
            let item = items.remove(from);
            items.insert(to, item.clone());
            Some(((), CollectionChange::moved(item, from, to)))
        })
        .is_some()
    }

    /// Remove every item. Emits a [`ChangeAction::Reset`] without payload.
    pub fn clear(&self) {
        self.apply(|items| {
            items.clear();
            Some(((), CollectionChange::reset()))
        });
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ObservableList<T> {
    /// Position of the first item equal to `item`.
    pub fn position_of(&self, item: &T) -> Option<usize> {
        self.items.read().iter().position(|candidate| candidate == item)
    }

    /// Whether an equal item is present.
    pub fn contains(&self, item: &T) -> bool {
        self.position_of(item).is_some()
    }

    /// Remove the first item equal to `item`. Returns `true` if one was removed.
    pub fn remove_item(&self, item: &T) -> bool {
        self.apply(|items| {
            let index = items.iter().position(|candidate| candidate == item)?;
            let removed = items.remove(index);
            Some(((), CollectionChange::removed(vec![removed], Some(index))))
        })
        .is_some()
    }
}

impl<T: Clone + Send + Sync + 'static> ItemsSource<T> for ObservableList<T> {
    fn len(&self) -> usize {
        ObservableList::len(self)
    }

    fn visit(&self, visitor: &mut dyn FnMut(&T) -> ControlFlow<()>) {
        self.visit_snapshot(visitor);
    }

    fn visit_snapshot(&self, visitor: &mut dyn FnMut(&T) -> ControlFlow<()>) -> u64 {
        let items = self.items.read();
        for item in items.iter() {
            if visitor(item).is_break() {
                break;
            }
        }
        self.revision.load(Ordering::Acquire)
    }

    fn changes(&self) -> Option<Arc<ChangeSignal<T>>> {
        Some(self.changed.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorded(list: &ObservableList<u32>) -> Arc<Mutex<Vec<CollectionChange<u32>>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        list.changes()
            .connect(move |change| log_clone.lock().push(change.clone()));
        log
    }

    #[test]
    fn test_push_and_insert_report_positions() {
        let list = ObservableList::new();
        let log = recorded(&list);

        list.push(1);
        list.push(3);
        list.insert(1, 2);

        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        let log = log.lock();
        assert_eq!(log[0], CollectionChange::added(vec![1], Some(0)).with_revision(1));
        assert_eq!(log[1], CollectionChange::added(vec![3], Some(1)).with_revision(2));
        assert_eq!(log[2], CollectionChange::added(vec![2], Some(1)).with_revision(3));
    }

    #[test]
    fn test_extend_is_one_change() {
        let list = ObservableList::from_vec(vec![1]);
        let log = recorded(&list);

        list.extend([2, 3]);
        list.extend(Vec::new());

        assert_eq!(
            *log.lock(),
            vec![CollectionChange::added(vec![2, 3], Some(1)).with_revision(1)]
        );
        assert_eq!(list.revision(), 1);
    }

    #[test]
    fn test_remove_variants() {
        let list = ObservableList::from_vec(vec![5, 6, 5]);
        let log = recorded(&list);

        assert!(list.remove_item(&5));
        assert_eq!(list.to_vec(), vec![6, 5]);
        assert_eq!(list.remove_at(1), Some(5));
        assert_eq!(list.remove_at(9), None);
        assert!(!list.remove_item(&42));

        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], CollectionChange::removed(vec![5], Some(0)).with_revision(1));
        assert_eq!(log[1], CollectionChange::removed(vec![5], Some(1)).with_revision(2));
    }

    #[test]
    fn test_set_move_clear() {
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let log = recorded(&list);

        assert_eq!(list.set(0, 10), Some(1));
        assert!(list.move_item(0, 2));
        assert!(!list.move_item(1, 1));
        list.clear();

        let log = log.lock();
        assert_eq!(log[0], CollectionChange::replaced(1, 10, 0).with_revision(1));
        assert_eq!(log[1], CollectionChange::moved(10, 0, 2).with_revision(2));
        assert_eq!(log[2].action, ChangeAction::Reset);
        assert_eq!(log[2].revision, 3);
        assert!(log[2].added.is_empty() && log[2].removed.is_empty());
        assert!(list.is_empty());
    }

    #[test]
    fn test_slot_may_mutate_list() {
        let list = Arc::new(ObservableList::new());
        let list_clone = list.clone();
        list.changes().connect(move |change| {
            if change.added == vec![1] {
                list_clone.push(2);
            }
        });

        list.push(1);
        assert_eq!(list.to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_concurrent_pushes_are_reported_in_order() {
        let list = Arc::new(ObservableList::new());
        let log = recorded(&list);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let list = list.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        list.push(t * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reported: Vec<u32> = log.lock().iter().flat_map(|c| c.added.clone()).collect();
        assert_eq!(reported, list.to_vec());
    }

    #[test]
    fn test_lookup_helpers() {
        let list = ObservableList::from_vec(vec!["a", "b", "c"]);
        let source: &dyn ItemsSource<&str> = &list;

        assert_eq!(position_of(source, &"b"), Some(1));
        assert_eq!(position_of(source, &"z"), None);
        assert_eq!(nth(source, 2), Some("c"));
        assert_eq!(nth(source, 3), None);
        assert!(source.changes().is_some());

        let fixed = vec![1u32, 2];
        let fixed_source: &dyn ItemsSource<u32> = &fixed;
        assert!(fixed_source.changes().is_none());
        assert_eq!(fixed_source.len(), 2);
    }

    #[test]
    fn test_snapshot_reports_revision() {
        let list = ObservableList::from_vec(vec![1u32, 2]);
        let mut seen = Vec::new();
        let revision = list.visit_snapshot(&mut |item| {
            seen.push(*item);
            ControlFlow::Continue(())
        });
        assert_eq!((seen, revision), (vec![1, 2], 0));

        list.push(3);
        list.remove_item(&1);
        assert_eq!(list.visit_snapshot(&mut |_| ControlFlow::Break(())), 2);

        let fixed = vec![1u32];
        assert_eq!(fixed.visit_snapshot(&mut |_| ControlFlow::Continue(())), 0);
    }
}
