//! Failure values produced by a phase's unit of work

use std::error::Error;
use std::fmt;

/// A captured unit-of-work failure
///
/// Any `std::error::Error` converts into a `PhaseFailure` carrying its
/// message, so `?` works inside a unit of work. A failure built with
/// [`PhaseFailure::opaque`] has no message and classifies as
/// [`ErrorKind::Unknown`](crate::types::ErrorKind::Unknown).
pub struct PhaseFailure {
    message: Option<String>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl PhaseFailure {
    /// Failure with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            source: None,
        }
    }

    /// Failure without a message
    pub fn opaque() -> Self {
        Self {
            message: None,
            source: None,
        }
    }

    /// Failure built from an `anyhow::Error`, keeping its context chain
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        Self::new(format!("{:#}", error))
    }

    /// The failure message, if there is one
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The original error this failure was converted from
    pub fn source_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl<E> From<E> for PhaseFailure
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self {
            message: Some(error.to_string()),
            source: Some(Box::new(error)),
        }
    }
}

impl fmt::Display for PhaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str("unknown failure"),
        }
    }
}

impl fmt::Debug for PhaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseFailure")
            .field("message", &self.message)
            .field("source", &self.source)
            .finish()
    }
}
