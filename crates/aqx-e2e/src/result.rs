//! Result and error types for the suite.

use thiserror::Error;

/// Result type for page and driver operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors raised while driving the trading UI
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Element did not reach the required condition in time
    #[error("Element {locator} not {condition} after {waited_ms}ms")]
    ElementNotReady {
        /// Locator that was waited on
        locator: String,
        /// Condition that was required
        condition: String,
        /// Time spent waiting
        waited_ms: u64,
    },

    /// Label not present in a fixed lookup table
    #[error("Unknown {kind}: {label}")]
    UnknownOption {
        /// What kind of option (order type, expiry, side)
        kind: &'static str,
        /// The label that was rejected
        label: String,
    },

    /// Low-level driver (CDP) failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an unknown option error
    #[must_use]
    pub fn unknown_option(kind: &'static str, label: impl Into<String>) -> Self {
        Self::UnknownOption {
            kind,
            label: label.into(),
        }
    }
}

/// Outcome of a bounded element lookup.
///
/// Separates "the element never showed up" from "it showed up but never
/// reached the required state", which a plain `Option` or `bool` cannot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Condition satisfied
    Found(T),
    /// No matching element was present at any poll
    NotFound,
    /// Element was present but the condition never held
    TimedOut {
        /// Time spent waiting
        waited_ms: u64,
    },
}

impl<T> Lookup<T> {
    /// Whether the condition was satisfied
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Convert to `Option`, dropping the failure cause
    #[must_use]
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::TimedOut { .. } => None,
        }
    }

    /// Map the found value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
            Self::TimedOut { waited_ms } => Lookup::TimedOut { waited_ms },
        }
    }
}
