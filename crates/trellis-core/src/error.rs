//! Error types for Trellis core.

use std::fmt;

/// Errors raised when handing work to a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The dispatcher has been shut down and no longer accepts work.
    Shutdown,
    /// The operation must run on the dispatcher's owning thread.
    WrongThread,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown => write!(f, "Dispatcher has been shut down"),
            Self::WrongThread => {
                write!(f, "Operation must run on the dispatcher's owning thread")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Signal-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    InvalidConnection,
    /// The signal has been dropped and is no longer available.
    SignalDropped,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConnection => write!(f, "Invalid or disconnected connection ID"),
            Self::SignalDropped => write!(f, "Signal has been dropped"),
        }
    }
}

impl std::error::Error for SignalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(DispatchError::Shutdown.to_string(), "Dispatcher has been shut down");
        assert_eq!(SignalError::SignalDropped.to_string(), "Signal has been dropped");
    }
}
