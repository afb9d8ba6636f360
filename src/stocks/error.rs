//! Service-level error taxonomy.

use thiserror::Error;

use crate::fanout::{AggregateError, Cancelled, CollectError, FetchError};
use crate::favourites::RepositoryError;
use crate::stocks::indicators::IndicatorError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was cancelled or ran out of time; outcome unknown.
    #[error("request cancelled or timed out!")]
    Cancelled,

    /// A single upstream call failed.
    #[error(transparent)]
    Upstream(#[from] FetchError),

    /// A fan-out produced no successes.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("{0}")]
    Validation(String),
}

impl From<Cancelled> for ServiceError {
    fn from(_: Cancelled) -> Self {
        ServiceError::Cancelled
    }
}

impl From<CollectError> for ServiceError {
    fn from(e: CollectError) -> Self {
        match e {
            CollectError::Cancelled => ServiceError::Cancelled,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
