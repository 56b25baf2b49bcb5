//! Error types for the selection adapter.

use thiserror::Error;
use trellis_core::DispatchError;

/// Failure while projecting an item to its display text.
///
/// Raised only when a display field is set; the default text conversion
/// cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// The item itself is null while a display field lookup was requested.
    #[error("cannot read field `{field}` of a null item")]
    NullItem {
        /// The requested display field.
        field: String,
    },
    /// A matching field holds a null value and has no text form.
    #[error("field `{field}` is null")]
    NullField {
        /// The field that was read.
        field: String,
    },
    /// The item does not expose a field with this name.
    #[error("item has no field named `{field}`")]
    UnknownField {
        /// The field that was requested.
        field: String,
    },
    /// Reading the field failed for a type-specific reason.
    #[error("failed to read field `{field}`: {message}")]
    Field {
        /// The field that was read.
        field: String,
        /// Description of the failure.
        message: String,
    },
}

impl ProjectionError {
    /// Convenience constructor for [`ProjectionError::Field`].
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by [`BindablePicker`](crate::BindablePicker) setters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    /// Rebuilding the flat entry list failed part-way.
    #[error("display projection failed: {0}")]
    Projection(#[from] ProjectionError),
    /// The owning dispatcher rejected work.
    #[error("dispatcher error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// A specialized Result type for picker operations.
pub type PickerResult<T> = Result<T, PickerError>;
