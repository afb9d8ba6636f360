//! Upstream call wrappers.
//!
//! One function per data kind. Each call is bounded by the context deadline,
//! or by the default timeout when the context has none; that default applies
//! to the single call only. Provider errors and timeouts come back inside the
//! envelope, never as a panic or an early return. Cancellation of the context
//! does not abort a call in progress: it runs until it finishes or its
//! deadline passes.

use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::fanout::context::RequestContext;
use crate::fanout::envelope::{Envelope, FetchError};
use crate::observability::metrics;
use crate::upstream::{
    DailyOpenClose, MarketDataClient, PreviousClose, SimpleMovingAverage, SmaRequest,
    TickerDetails, UpstreamError,
};

/// Bound applied to an upstream call when the caller's context has no deadline.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline-bounded access to a [`MarketDataClient`].
#[derive(Clone)]
pub struct Upstream {
    client: Arc<dyn MarketDataClient>,
    default_timeout: Duration,
}

impl Upstream {
    pub fn new(client: Arc<dyn MarketDataClient>) -> Self {
        Self::with_default_timeout(client, DEFAULT_UPSTREAM_TIMEOUT)
    }

    pub fn with_default_timeout(client: Arc<dyn MarketDataClient>, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.client.id()
    }

    pub async fn ticker_details(&self, ticker: &str, ctx: &RequestContext) -> Envelope<TickerDetails> {
        self.call("ticker_details", ticker, ctx, self.client.ticker_details(ticker))
            .await
            .into()
    }

    /// Previous close; a response with no bars is an error.
    pub async fn previous_close(
        &self,
        ticker: &str,
        adjusted: bool,
        ctx: &RequestContext,
    ) -> Envelope<PreviousClose> {
        self.call(
            "previous_close",
            ticker,
            ctx,
            self.client.previous_close(ticker, adjusted),
        )
        .await
        .and_then(|close| {
            if close.results.is_empty() {
                Err(FetchError::EmptyResult {
                    key: ticker.to_string(),
                    what: "previous close",
                })
            } else {
                Ok(close)
            }
        })
        .into()
    }

    pub async fn daily_open_close(
        &self,
        ticker: &str,
        date: NaiveDate,
        ctx: &RequestContext,
    ) -> Envelope<DailyOpenClose> {
        self.call(
            "daily_open_close",
            ticker,
            ctx,
            self.client.daily_open_close(ticker, date),
        )
        .await
        .into()
    }

    /// Simple moving average; an empty series is an error because nothing
    /// downstream can compute a delta or a trend from it.
    pub async fn simple_moving_average(
        &self,
        request: &SmaRequest,
        ctx: &RequestContext,
    ) -> Envelope<SimpleMovingAverage> {
        self.call(
            "simple_moving_average",
            &request.ticker,
            ctx,
            self.client.simple_moving_average(request),
        )
        .await
        .and_then(|sma| {
            if sma.values.is_empty() {
                Err(FetchError::EmptyResult {
                    key: request.ticker.clone(),
                    what: "simple moving average",
                })
            } else {
                Ok(sma)
            }
        })
        .into()
    }

    async fn call<T, F>(
        &self,
        kind: &'static str,
        key: &str,
        ctx: &RequestContext,
        fut: F,
    ) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, UpstreamError>>,
    {
        let start = Instant::now();
        let deadline = ctx
            .deadline()
            .or_else(|| start.checked_add(self.default_timeout));
        let bounded = match deadline {
            Some(deadline) => timeout_at(deadline, fut).await,
            None => Ok(fut.await),
        };

        let result = match bounded {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(source)) => Err(FetchError::Provider {
                key: key.to_string(),
                source,
            }),
            Err(_) => Err(FetchError::Timeout {
                key: key.to_string(),
                elapsed: start.elapsed(),
            }),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(FetchError::Timeout { .. }) => "timeout",
            Err(_) => "error",
        };
        metrics::record_upstream_call(kind, outcome, start.into_std());

        if let Err(e) = &result {
            tracing::error!(
                provider = self.client.id(),
                kind,
                key,
                error = %e,
                "Upstream call failed"
            );
        }
        result
    }
}
