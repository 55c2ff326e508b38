//! Error types for Horizon Progress.

use std::fmt;

/// The main error type for core Horizon Progress operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The UI context has no display, so no window can be created.
    Headless,
    /// Timer-related error.
    Timer(TimerError),
    /// The UI context has been asked to quit and no longer pumps events.
    ContextQuit,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Headless => {
                write!(f, "No display available. Progress dialogs need a UI context with a display")
            }
            Self::Timer(err) => write!(f, "Timer error: {err}"),
            Self::ContextQuit => write!(f, "The UI context has already quit"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timer(err) => Some(err),
            _ => None,
        }
    }
}

/// Timer-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The timer ID is invalid, has already fired, or was stopped.
    InvalidTimerId,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimerId => write!(f, "Invalid or expired timer ID"),
        }
    }
}

impl std::error::Error for TimerError {}

impl From<TimerError> for CoreError {
    fn from(err: TimerError) -> Self {
        Self::Timer(err)
    }
}

/// A specialized Result type for core Horizon Progress operations.
pub type Result<T> = std::result::Result<T, CoreError>;
