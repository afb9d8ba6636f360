//! Provider-neutral client trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::upstream::types::{
    DailyOpenClose, PreviousClose, SimpleMovingAverage, SmaRequest, TickerDetails,
};

/// Errors returned by a market data provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider returned HTTP 429.
    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },

    /// Any other non-success HTTP status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    /// The request could not be built (bad ticker, bad URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// One call per logical data kind. Implementations perform exactly one
/// round trip per invocation and never retry.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Short identifier used in logs and metrics.
    fn id(&self) -> &'static str;

    async fn ticker_details(&self, ticker: &str) -> Result<TickerDetails, UpstreamError>;

    async fn previous_close(
        &self,
        ticker: &str,
        adjusted: bool,
    ) -> Result<PreviousClose, UpstreamError>;

    async fn daily_open_close(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<DailyOpenClose, UpstreamError>;

    async fn simple_moving_average(
        &self,
        request: &SmaRequest,
    ) -> Result<SimpleMovingAverage, UpstreamError>;
}
