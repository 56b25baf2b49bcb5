//! Native state of a single-selection list widget.
//!
//! [`SelectionList`] models what a host toolkit keeps for a drop-down or
//! list box: a flat sequence of display strings and a current index, with
//! `-1` meaning "no selection". It knows nothing about the domain objects
//! behind the strings; [`BindablePicker`](crate::BindablePicker) keeps the
//! two in step.

/// Sentinel index meaning "no selection".
pub const NO_SELECTION: i32 = -1;

/// Flat entry list plus current index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionList {
    entries: Vec<String>,
    current_index: i32,
}

impl SelectionList {
    /// Create an empty list with no selection.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            current_index: NO_SELECTION,
        }
    }

    /// Create a list holding `entries`, with no selection.
    pub fn with_entries(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            current_index: NO_SELECTION,
        }
    }

    /// The display entries in order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry text at `index`.
    pub fn entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Index of the first entry equal to `text`.
    pub fn find_text(&self, text: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry == text)
    }

    /// Append an entry.
    pub fn push_entry(&mut self, text: impl Into<String>) {
        self.entries.push(text.into());
    }

    /// Remove the first entry equal to `text`.
    ///
    /// Returns the position it occupied. The current index follows the entry
    /// it pointed at, or becomes `-1` if that entry was removed.
    pub fn remove_entry(&mut self, text: &str) -> Option<usize> {
        let index = self.find_text(text)?;
        self.entries.remove(index);

        let removed = index as i32;
        if self.current_index == removed {
            self.current_index = NO_SELECTION;
        } else if self.current_index > removed {
            self.current_index -= 1;
        }
        Some(index)
    }

    /// Replace every entry at once.
    ///
    /// The current index is kept while it is still in range and becomes `-1`
    /// otherwise. Returns `true` if the index changed.
    pub fn set_entries(&mut self, entries: Vec<String>) -> bool {
        self.entries = entries;
        if self.current_index >= self.entries.len() as i32 {
            self.current_index = NO_SELECTION;
            return true;
        }
        false
    }

    /// Remove all entries and the selection.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = NO_SELECTION;
    }

    /// The current index (`-1` if nothing is selected).
    pub fn current_index(&self) -> i32 {
        self.current_index
    }

    /// Set the current index.
    ///
    /// Any index outside `0..count()` is stored as `-1`. Returns `true` if the
    /// stored index changed.
    pub fn set_current_index(&mut self, index: i32) -> bool {
        let count = self.entries.len() as i32;
        let new_index = if index < 0 || index >= count {
            NO_SELECTION
        } else {
            index
        };

        if self.current_index == new_index {
            return false;
        }
        self.current_index = new_index;
        true
    }

    /// Text of the current entry, or an empty string.
    pub fn current_text(&self) -> String {
        usize::try_from(self.current_index)
            .ok()
            .and_then(|index| self.entry(index))
            .map(str::to_string)
            .unwrap_or_default()
    }
}

impl Default for SelectionList {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<String>> for SelectionList {
    fn from(entries: Vec<String>) -> Self {
        Self::with_entries(entries)
    }
}

impl From<Vec<&str>> for SelectionList {
    fn from(entries: Vec<&str>) -> Self {
        Self::with_entries(entries)
    }
}
