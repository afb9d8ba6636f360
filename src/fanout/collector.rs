//! Drains a fan-out stream within the request's cancellation scope.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::fanout::context::RequestContext;
use crate::fanout::envelope::{Envelope, FetchError};

/// Envelopes split by outcome, each list in completion order.
#[derive(Debug)]
pub struct Collected<T> {
    pub successes: Vec<T>,
    pub failures: Vec<FetchError>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> Collected<T> {
    pub fn push(&mut self, envelope: Envelope<T>) {
        match envelope.into_result() {
            Ok(data) => self.successes.push(data),
            Err(e) => self.failures.push(e),
        }
    }

    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> FromIterator<Envelope<T>> for Collected<T> {
    fn from_iter<I: IntoIterator<Item = Envelope<T>>>(iter: I) -> Self {
        let mut collected = Self::default();
        for envelope in iter {
            collected.push(envelope);
        }
        collected
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    /// The request was cancelled or hit its deadline before the stream closed.
    /// Outcome of the outstanding keys is unknown.
    #[error("request cancelled or timed out")]
    Cancelled,
}

/// Read `stream` until it closes or `ctx` is done.
///
/// On cancellation whatever was gathered so far is discarded; the caller only
/// learns that the request timed out. Workers still running finish on their
/// own and their results are dropped.
pub async fn collect<T>(
    mut stream: mpsc::Receiver<Envelope<T>>,
    ctx: &RequestContext,
) -> Result<Collected<T>, CollectError> {
    let mut collected = Collected::default();
    loop {
        tokio::select! {
            biased;
            _ = ctx.done() => {
                tracing::warn!(
                    received = collected.len(),
                    "Collection abandoned: request cancelled or timed out"
                );
                return Err(CollectError::Cancelled);
            }
            next = stream.recv() => match next {
                Some(envelope) => collected.push(envelope),
                None => return Ok(collected),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_partitions_until_closed() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Envelope::ok(1)).await.unwrap();
        tx.send(Envelope::err(FetchError::EmptyResult { key: "B".into(), what: "test" }))
            .await
            .unwrap();
        tx.send(Envelope::ok(3)).await.unwrap();
        drop(tx);

        let collected = collect(rx, &RequestContext::new()).await.unwrap();
        assert_eq!(collected.successes, vec![1, 3]);
        assert_eq!(collected.failures.len(), 1);
        assert_eq!(collected.failures[0].key(), "B");
    }

    #[tokio::test]
    async fn test_cancellation_discards_partial_results() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Envelope::ok(1)).await.unwrap();

        let ctx = RequestContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        // Sender stays open, so only cancellation can end collection.
        let result = collect(rx, &ctx).await;
        assert_eq!(result.err(), Some(CollectError::Cancelled));
        drop(tx);
    }

    #[tokio::test]
    async fn test_deadline_counts_as_cancellation() {
        let (_tx, rx) = mpsc::channel::<Envelope<u8>>(1);
        let ctx = RequestContext::with_timeout(Duration::from_millis(10));
        assert!(matches!(collect(rx, &ctx).await, Err(CollectError::Cancelled)));
    }
}
