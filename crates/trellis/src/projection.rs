//! Display projection: turning domain objects into entry text.
//!
//! A selection list only understands strings. Every bound item is projected
//! to its display text in one of three ways, in order of precedence:
//!
//! 1. A typed [`DisplayAccessor`] supplied by the caller.
//! 2. A named-field lookup when a display field is set. Field names are
//!    scanned in declaration order and every name *containing* the display
//!    field matches; the last match wins. No match yields an empty string.
//! 3. The item's own [`PickerItem::display_text`]; a null item yields an
//!    empty string.
//!
//! Named-field lookup goes through the [`FieldLookup`] capability, normally
//! generated with `#[derive(PickerItem)]`:
//!
//! ```
//! use trellis::PickerItem;
//! use trellis::projection::project;
//!
//! #[derive(Debug, Clone, PartialEq, PickerItem)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let alice = Person { name: "Alice".into(), age: 31 };
//! assert_eq!(project(&alice, "name").unwrap(), "Alice");
//! assert_eq!(project(&alice, "age").unwrap(), "31");
//! assert_eq!(project(&alice, "email").unwrap(), "");
//! assert_eq!(project(&alice, "").unwrap(), "Person");
//! ```

use std::sync::Arc;

use crate::error::ProjectionError;

/// Dynamic access to an item's fields by name.
pub trait FieldLookup {
    /// Field names in declaration order.
    fn field_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Read the text form of the named field.
    fn read_field(&self, name: &str) -> Result<String, ProjectionError> {
        Err(ProjectionError::UnknownField {
            field: name.to_string(),
        })
    }
}

/// A domain object that can be bound to a picker.
///
/// Equality is used to resolve a selected item back to its position.
pub trait PickerItem: FieldLookup + Clone + PartialEq + Send + Sync + 'static {
    /// Default text conversion, used when no display field is set.
    fn display_text(&self) -> String;

    /// Whether this item stands for "no object".
    fn is_null(&self) -> bool {
        false
    }
}

/// Text form of a single field value.
pub trait FieldText {
    /// Convert the value; `field` names the field for error reporting.
    fn field_text(&self, field: &str) -> Result<String, ProjectionError>;
}

impl FieldText for str {
    fn field_text(&self, _field: &str) -> Result<String, ProjectionError> {
        Ok(self.to_string())
    }
}

impl<T: FieldText + ?Sized> FieldText for &T {
    fn field_text(&self, field: &str) -> Result<String, ProjectionError> {
        (**self).field_text(field)
    }
}

impl<T: FieldText + ?Sized> FieldText for Box<T> {
    fn field_text(&self, field: &str) -> Result<String, ProjectionError> {
        (**self).field_text(field)
    }
}

impl<T: FieldText + ?Sized> FieldText for Arc<T> {
    fn field_text(&self, field: &str) -> Result<String, ProjectionError> {
        (**self).field_text(field)
    }
}

impl<T: FieldText> FieldText for Option<T> {
    fn field_text(&self, field: &str) -> Result<String, ProjectionError> {
        match self {
            Some(value) => value.field_text(field),
            None => Err(ProjectionError::NullField {
                field: field.to_string(),
            }),
        }
    }
}

macro_rules! display_items {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldText for $ty {
                fn field_text(&self, _field: &str) -> Result<String, ProjectionError> {
                    Ok(self.to_string())
                }
            }

            impl FieldLookup for $ty {}

            impl PickerItem for $ty {
                fn display_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_items!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char, String,
);

// `&str` already has its `FieldText` through the reference impl.
impl FieldLookup for &'static str {}

impl PickerItem for &'static str {
    fn display_text(&self) -> String {
        (*self).to_string()
    }
}

impl<T: PickerItem> FieldLookup for Option<T> {
    fn field_names(&self) -> &'static [&'static str] {
        match self {
            Some(item) => item.field_names(),
            None => &[],
        }
    }

    fn read_field(&self, name: &str) -> Result<String, ProjectionError> {
        match self {
            Some(item) => item.read_field(name),
            None => Err(ProjectionError::NullItem {
                field: name.to_string(),
            }),
        }
    }
}

impl<T: PickerItem> PickerItem for Option<T> {
    fn display_text(&self) -> String {
        self.as_ref().map(PickerItem::display_text).unwrap_or_default()
    }

    fn is_null(&self) -> bool {
        self.as_ref().is_none_or(PickerItem::is_null)
    }
}

impl<T: PickerItem> FieldLookup for Arc<T> {
    fn field_names(&self) -> &'static [&'static str] {
        (**self).field_names()
    }

    fn read_field(&self, name: &str) -> Result<String, ProjectionError> {
        (**self).read_field(name)
    }
}

impl<T: PickerItem> PickerItem for Arc<T> {
    fn display_text(&self) -> String {
        (**self).display_text()
    }

    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

/// Text of an item without a display field; null items become `""`.
pub fn stringify<T: PickerItem>(item: &T) -> String {
    if item.is_null() {
        String::new()
    } else {
        item.display_text()
    }
}

/// Project `item` using the named display field.
///
/// A blank `display_field` falls back to [`stringify`]. Any error reading a
/// matching field is returned immediately.
pub fn project<T: PickerItem>(item: &T, display_field: &str) -> Result<String, ProjectionError> {
    if display_field.trim().is_empty() {
        return Ok(stringify(item));
    }
    if item.is_null() {
        return Err(ProjectionError::NullItem {
            field: display_field.to_string(),
        });
    }

    let mut actual_value = String::new();
    for name in item.field_names() {
        if name.contains(display_field) {
            actual_value = item.read_field(name)?;
        }
    }
    Ok(actual_value)
}

/// A caller-supplied projection that bypasses the named-field lookup.
pub type DisplayAccessor<T> = Arc<dyn Fn(&T) -> Result<String, ProjectionError> + Send + Sync>;

/// Wrap a closure as a [`DisplayAccessor`].
pub fn display_accessor<T, F>(f: F) -> DisplayAccessor<T>
where
    F: Fn(&T) -> Result<String, ProjectionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The active projection settings of a picker.
pub struct Projection<T> {
    display_field: String,
    accessor: Option<DisplayAccessor<T>>,
}

impl<T> Clone for Projection<T> {
    fn clone(&self) -> Self {
        Self {
            display_field: self.display_field.clone(),
            accessor: self.accessor.clone(),
        }
    }
}

impl<T> Default for Projection<T> {
    fn default() -> Self {
        Self {
            display_field: String::new(),
            accessor: None,
        }
    }
}

impl<T> std::fmt::Debug for Projection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("display_field", &self.display_field)
            .field("accessor", &self.accessor.is_some())
            .finish()
    }
}

impl<T: PickerItem> Projection<T> {
    /// Projection by named display field.
    pub fn with_display_field(display_field: impl Into<String>) -> Self {
        Self {
            display_field: display_field.into(),
            accessor: None,
        }
    }

    /// The display field name (possibly empty).
    pub fn display_field(&self) -> &str {
        &self.display_field
    }

    /// Set the display field name.
    pub fn set_display_field(&mut self, display_field: impl Into<String>) {
        self.display_field = display_field.into();
    }

    /// Whether a typed accessor overrides the display field.
    pub fn has_accessor(&self) -> bool {
        self.accessor.is_some()
    }

    /// Install or clear the typed accessor.
    pub fn set_accessor(&mut self, accessor: Option<DisplayAccessor<T>>) {
        self.accessor = accessor;
    }

    /// Project one item to its display text.
    pub fn project(&self, item: &T) -> Result<String, ProjectionError> {
        match &self.accessor {
            Some(accessor) => accessor(item),
            None => project(item, &self.display_field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Contact {
        name: String,
        nickname: Option<String>,
        id: u32,
    }

    impl FieldLookup for Contact {
        fn field_names(&self) -> &'static [&'static str] {
            &["name", "nickname", "id"]
        }

        fn read_field(&self, name: &str) -> Result<String, ProjectionError> {
            match name {
                "name" => self.name.field_text(name),
                "nickname" => self.nickname.field_text(name),
                "id" => self.id.field_text(name),
                _ => Err(ProjectionError::UnknownField {
                    field: name.to_string(),
                }),
            }
        }
    }

    impl PickerItem for Contact {
        fn display_text(&self) -> String {
            format!("Contact#{}", self.id)
        }
    }

    fn contact(name: &str, nickname: Option<&str>) -> Contact {
        Contact {
            name: name.to_string(),
            nickname: nickname.map(str::to_string),
            id: 7,
        }
    }

    #[test]
    fn test_blank_field_uses_display_text() {
        let item = contact("Alice", Some("Al"));
        assert_eq!(project(&item, "").unwrap(), "Contact#7");
        assert_eq!(project(&item, "   ").unwrap(), "Contact#7");
    }

    #[test]
    fn test_null_item_stringifies_empty() {
        let item: Option<u32> = None;
        assert_eq!(project(&item, "").unwrap(), "");
        assert_eq!(stringify(&Some(5u32)), "5");
    }

    #[test]
    fn test_substring_match_last_wins() {
        // "name" is contained in both "name" and "nickname"; the later field wins.
        let item = contact("Alice", Some("Al"));
        assert_eq!(project(&item, "name").unwrap(), "Al");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let item = contact("Alice", Some("Al"));
        assert_eq!(project(&item, "Name").unwrap(), "");
    }

    #[test]
    fn test_no_match_is_empty() {
        let item = contact("Alice", None);
        assert_eq!(project(&item, "email").unwrap(), "");
    }

    #[test]
    fn test_null_field_fails() {
        // Both fields match; the null nickname aborts the projection.
        let item = contact("Alice", None);
        assert_eq!(
            project(&item, "name"),
            Err(ProjectionError::NullField {
                field: "nickname".to_string()
            })
        );
    }

    #[test]
    fn test_null_item_with_field_fails() {
        let item: Option<Contact> = None;
        assert_eq!(
            project(&item, "name"),
            Err(ProjectionError::NullItem {
                field: "name".to_string()
            })
        );
    }

    #[test]
    fn test_primitive_has_no_fields() {
        assert_eq!(project(&42u32, "name").unwrap(), "");
        assert_eq!(project(&42u32, "").unwrap(), "42");
    }

    #[test]
    fn test_accessor_overrides_display_field() {
        let mut projection = Projection::<Contact>::with_display_field("name");
        projection.set_accessor(Some(display_accessor(|c: &Contact| Ok(c.name.to_uppercase()))));

        let item = contact("Alice", None);
        assert!(projection.has_accessor());
        assert_eq!(projection.project(&item).unwrap(), "ALICE");

        projection.set_accessor(None);
        projection.set_display_field("id");
        assert_eq!(projection.project(&item).unwrap(), "7");
    }
}
