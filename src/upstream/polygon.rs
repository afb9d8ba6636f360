//! Polygon.io REST client.
//!
//! # Endpoints
//!
//! - Ticker details: `/v3/reference/tickers/{ticker}`
//! - Previous close: `/v2/aggs/ticker/{ticker}/prev`
//! - Daily open/close: `/v1/open-close/{ticker}/{date}`
//! - Simple moving average: `/v1/indicators/sma/{ticker}`
//!
//! Authentication uses a bearer token. The client applies no request timeout
//! of its own; callers bound each call (see `fanout::fetch`).

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::upstream::client::{MarketDataClient, UpstreamError};
use crate::upstream::types::{
    AggregateBar, DailyOpenClose, IndicatorValue, PreviousClose, SimpleMovingAverage, SmaRequest,
    TickerDetails,
};

const PROVIDER_ID: &str = "polygon";

/// Time allowed to establish a TCP/TLS connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: Option<TickerDetails>,
}

#[derive(Debug, Deserialize)]
struct PreviousCloseResponse {
    ticker: String,
    #[serde(default)]
    adjusted: bool,
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
}

#[derive(Debug, Deserialize)]
struct SmaResponse {
    results: SmaResults,
}

#[derive(Debug, Deserialize)]
struct SmaResults {
    #[serde(default)]
    values: Option<Vec<IndicatorValue>>,
    #[serde(default)]
    underlying: Option<Underlying>,
}

#[derive(Debug, Deserialize)]
struct Underlying {
    url: Option<String>,
}

/// Market data client backed by the Polygon.io REST API.
#[derive(Debug, Clone)]
pub struct PolygonClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl PolygonClient {
    /// Create a client for `base_url` (normally `https://api.polygon.io`).
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| UpstreamError::InvalidRequest(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidRequest(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(UpstreamError::Network)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Build an endpoint URL from path segments; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        if segments.iter().any(|s| s.is_empty()) {
            return Err(UpstreamError::InvalidRequest("empty path segment".to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidRequest("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        tracing::debug!(provider = PROVIDER_ID, path = %url.path(), "Calling provider");

        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited {
                provider: PROVIDER_ID,
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Http {
                provider: PROVIDER_ID,
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode {
            provider: PROVIDER_ID,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl MarketDataClient for PolygonClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn ticker_details(&self, ticker: &str) -> Result<TickerDetails, UpstreamError> {
        let url = self.endpoint(&["v3", "reference", "tickers", ticker])?;
        let response: TickerDetailsResponse = self.get_json(url, &[]).await?;
        response.results.ok_or_else(|| UpstreamError::Decode {
            provider: PROVIDER_ID,
            message: "ticker details response has no results".to_string(),
        })
    }

    async fn previous_close(
        &self,
        ticker: &str,
        adjusted: bool,
    ) -> Result<PreviousClose, UpstreamError> {
        let url = self.endpoint(&["v2", "aggs", "ticker", ticker, "prev"])?;
        let response: PreviousCloseResponse = self
            .get_json(url, &[("adjusted", adjusted.to_string())])
            .await?;
        Ok(PreviousClose {
            ticker: response.ticker,
            adjusted: response.adjusted,
            results: response.results.unwrap_or_default(),
        })
    }

    async fn daily_open_close(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<DailyOpenClose, UpstreamError> {
        let date = date.format("%Y-%m-%d").to_string();
        let url = self.endpoint(&["v1", "open-close", ticker, &date])?;
        self.get_json(url, &[("adjusted", "true".to_string())]).await
    }

    async fn simple_moving_average(
        &self,
        request: &SmaRequest,
    ) -> Result<SimpleMovingAverage, UpstreamError> {
        let url = self.endpoint(&["v1", "indicators", "sma", &request.ticker])?;
        let query = [
            ("timestamp.gte", request.from.format("%Y-%m-%d").to_string()),
            ("timespan", request.timespan.to_string()),
            ("window", request.window.to_string()),
            ("series_type", "close".to_string()),
            ("order", "desc".to_string()),
            ("expand_underlying", request.expand_underlying.to_string()),
        ];
        let response: SmaResponse = self.get_json(url, &query).await?;
        Ok(SimpleMovingAverage {
            ticker: request.ticker.clone(),
            values: response.results.values.unwrap_or_default(),
            underlying_url: response.results.underlying.and_then(|u| u.url),
        })
    }
}
