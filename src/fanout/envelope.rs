//! Outcome carrier for one upstream call.

use std::time::Duration;
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Failure of one keyed upstream call.
///
/// Every variant names the key it belongs to so that aggregated error lists
/// stay attributable.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider (or the network in front of it) returned an error.
    #[error("{key}: {source}")]
    Provider {
        key: String,
        #[source]
        source: UpstreamError,
    },

    /// The call did not finish before its deadline.
    #[error("{key}: upstream call timed out after {}ms", elapsed.as_millis())]
    Timeout { key: String, elapsed: Duration },

    /// The provider answered successfully but with nothing usable.
    #[error("{key}: result from {what} was empty")]
    EmptyResult { key: String, what: &'static str },
}

impl FetchError {
    /// The key this failure belongs to.
    pub fn key(&self) -> &str {
        match self {
            FetchError::Provider { key, .. }
            | FetchError::Timeout { key, .. }
            | FetchError::EmptyResult { key, .. } => key,
        }
    }
}

/// Data or error for one upstream call, never both.
#[derive(Debug)]
pub struct Envelope<T> {
    outcome: Result<T, FetchError>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { outcome: Ok(data) }
    }

    pub fn err(error: FetchError) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn into_result(self) -> Result<T, FetchError> {
        self.outcome
    }
}

impl<T> From<Result<T, FetchError>> for Envelope<T> {
    fn from(outcome: Result<T, FetchError>) -> Self {
        Self { outcome }
    }
}
