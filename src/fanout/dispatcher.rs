//! Bounded fan-out of keyed upstream calls.
//!
//! # Responsibilities
//! - Spawn one task per key
//! - Gate upstream calls with a semaphore sized `max_parallelism`
//! - Stream envelopes through one bounded channel
//! - Close the channel once, after every worker has finished
//!
//! # Design Decisions
//! - The permit is held from before the upstream call until the publish
//!   attempt is over, so a slow consumer also throttles the provider
//! - Publishing races the request context: a result that cannot be delivered
//!   before cancellation is dropped and counted, never blocks forever
//! - Semaphore and channel are created per dispatch and never shared

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::fanout::context::RequestContext;
use crate::fanout::envelope::Envelope;
use crate::observability::metrics;

/// Fan-out dispatcher with a fixed concurrency ceiling.
#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    max_parallelism: usize,
}

impl FanOut {
    /// Create a dispatcher that allows at most `max_parallelism` upstream calls
    /// at once. Zero is treated as one.
    pub fn new(max_parallelism: usize) -> Self {
        Self {
            max_parallelism: max_parallelism.max(1),
        }
    }

    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    /// Start one worker per key and return the stream of their envelopes.
    ///
    /// Envelopes arrive in completion order. Channel closure means no more
    /// results will ever arrive; it does not mean every key produced one,
    /// since results are dropped once `ctx` is done.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch<T, F, Fut>(
        &self,
        keys: impl IntoIterator<Item = String>,
        ctx: &RequestContext,
        fetch: F,
    ) -> mpsc::Receiver<Envelope<T>>
    where
        T: Send + 'static,
        F: Fn(String, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Envelope<T>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.max_parallelism);
        let permits = Arc::new(Semaphore::new(self.max_parallelism));
        let fetch = Arc::new(fetch);

        let mut workers = JoinSet::new();
        for key in keys {
            workers.spawn(run_worker(
                key,
                ctx.clone(),
                permits.clone(),
                tx.clone(),
                fetch.clone(),
            ));
        }

        let spawned = workers.len();
        tracing::debug!(
            workers = spawned,
            max_parallelism = self.max_parallelism,
            "Fan-out started"
        );

        // Supervisor: the channel closes when its sender drops here, after
        // every worker (and therefore every sender clone) is gone.
        tokio::spawn(async move {
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    if e.is_panic() {
                        tracing::error!(error = %e, "Fan-out worker panicked");
                    }
                }
            }
            drop(tx);
            tracing::debug!(workers = spawned, "Fan-out complete");
        });

        rx
    }
}

/// Holds one slot of the in-flight gauge; released on drop, including unwind.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        metrics::inc_in_flight();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::dec_in_flight();
    }
}

async fn run_worker<T, F, Fut>(
    key: String,
    ctx: RequestContext,
    permits: Arc<Semaphore>,
    tx: mpsc::Sender<Envelope<T>>,
    fetch: Arc<F>,
) where
    F: Fn(String, RequestContext) -> Fut,
    Fut: Future<Output = Envelope<T>>,
{
    let permit: OwnedSemaphorePermit = tokio::select! {
        biased;
        _ = ctx.done() => {
            tracing::warn!(key = %key, "Context done before upstream call started");
            metrics::record_dropped("cancelled_before_start");
            return;
        }
        acquired = permits.acquire_owned() => match acquired {
            Ok(permit) => permit,
            Err(_) => return,
        },
    };

    tracing::info!(key = %key, "Processing key");
    let envelope = {
        let _in_flight = InFlight::enter();
        fetch(key.clone(), ctx.clone()).await
    };

    tokio::select! {
        biased;
        _ = ctx.done() => {
            tracing::warn!(key = %key, "Context cancelled while sending response");
            metrics::record_dropped("cancelled");
        }
        sent = tx.send(envelope) => match sent {
            Ok(()) => tracing::debug!(key = %key, "Sent response"),
            Err(_) => {
                tracing::warn!(key = %key, "Result receiver gone, dropping response");
                metrics::record_dropped("receiver_closed");
            }
        },
    }

    drop(permit);
}
