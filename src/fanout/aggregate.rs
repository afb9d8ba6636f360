//! Success/failure policy for a collected fan-out.
//!
//! | successes | failures | result                        |
//! |-----------|----------|-------------------------------|
//! | > 0       | 0        | `Outcome::Complete`           |
//! | > 0       | > 0      | `Outcome::Partial`            |
//! | 0         | > 0      | `AggregateError::AllFailed`   |
//! | 0         | 0        | `AggregateError::NoData`      |

use thiserror::Error;

use crate::fanout::collector::Collected;
use crate::fanout::envelope::FetchError;

/// A fan-out that produced at least one result.
#[derive(Debug)]
pub enum Outcome<T> {
    Complete(Vec<T>),
    /// Some keys failed; their errors ride along as diagnostics.
    Partial { data: Vec<T>, errors: Vec<FetchError> },
}

impl<T> Outcome<T> {
    pub fn data(&self) -> &[T] {
        match self {
            Outcome::Complete(data) | Outcome::Partial { data, .. } => data,
        }
    }

    pub fn errors(&self) -> &[FetchError] {
        match self {
            Outcome::Complete(_) => &[],
            Outcome::Partial { errors, .. } => errors,
        }
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<FetchError>) {
        match self {
            Outcome::Complete(data) => (data, Vec::new()),
            Outcome::Partial { data, errors } => (data, errors),
        }
    }
}

/// A fan-out that produced nothing usable.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("all {} upstream calls failed", .0.len())]
    AllFailed(Vec<FetchError>),

    #[error("no valid responses received")]
    NoData,
}

pub fn aggregate<T>(collected: Collected<T>) -> Result<Outcome<T>, AggregateError> {
    let Collected {
        successes,
        failures,
    } = collected;

    match (successes.is_empty(), failures.is_empty()) {
        (false, true) => Ok(Outcome::Complete(successes)),
        (false, false) => Ok(Outcome::Partial {
            data: successes,
            errors: failures,
        }),
        (true, false) => Err(AggregateError::AllFailed(failures)),
        (true, true) => Err(AggregateError::NoData),
    }
}
