//! Stock operations exposed over HTTP.
//!
//! # Responsibilities
//! - Validate and normalise request parameters
//! - Front single calls and fan-outs with the TTL caches
//! - Turn favourites into a bounded fan-out and apply the aggregation policy
//! - Derive the weekly change and trend for moving averages

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{keys, TtlCache};
use crate::config::GatewayConfig;
use crate::fanout::{aggregate, collect, FanOut, FetchError, RequestContext, Upstream};
use crate::favourites::FavouriteRepository;
use crate::stocks::error::{ServiceError, ServiceResult};
use crate::stocks::indicators::{percentage_change, Trend};
use crate::upstream::{
    DailyOpenClose, MarketDataClient, PreviousClose, SimpleMovingAverage, SmaRequest,
    TickerDetails,
};

/// Daily open/close for a user's favourites.
#[derive(Debug, Clone)]
pub struct FavouritesOpenClose {
    pub data: Arc<Vec<DailyOpenClose>>,
    /// Per-ticker failures that did not prevent a response.
    pub errors: Vec<Arc<FetchError>>,
    pub cached: bool,
}

/// Moving average with the change against last week's close.
#[derive(Debug, Clone, Serialize)]
pub struct MovingAverageReport {
    pub simple_moving_average: SimpleMovingAverage,
    pub last_week_close: f64,
    pub percentage_change_this_week: f64,
    pub invest_indicator: Trend,
}

pub struct StockService {
    upstream: Upstream,
    fanout: FanOut,
    favourites: Arc<dyn FavouriteRepository>,
    profiles: TtlCache<TickerDetails>,
    aggregates: TtlCache<Arc<Vec<DailyOpenClose>>>,
    profile_ttl: Duration,
    aggregate_ttl: Duration,
}

impl StockService {
    pub fn new(
        upstream: Upstream,
        fanout: FanOut,
        favourites: Arc<dyn FavouriteRepository>,
        profile_ttl: Duration,
        aggregate_ttl: Duration,
    ) -> Self {
        Self {
            upstream,
            fanout,
            favourites,
            profiles: TtlCache::new("profile"),
            aggregates: TtlCache::new("aggregate"),
            profile_ttl,
            aggregate_ttl,
        }
    }

    /// Wire the service from configuration.
    pub fn from_config(
        config: &GatewayConfig,
        client: Arc<dyn MarketDataClient>,
        favourites: Arc<dyn FavouriteRepository>,
    ) -> Self {
        Self::new(
            Upstream::with_default_timeout(client, config.timeouts.upstream()),
            FanOut::new(config.fanout.max_parallelism),
            favourites,
            config.cache.profile_ttl(),
            config.cache.aggregate_ttl(),
        )
    }

    /// Entry counts of the profile and aggregate caches.
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.profiles.len(), self.aggregates.len())
    }

    pub async fn ticker_details(
        &self,
        ticker: &str,
        ctx: &RequestContext,
    ) -> ServiceResult<TickerDetails> {
        let ticker = normalise_ticker(ticker)?;
        let key = keys::ticker_details(&ticker);

        if let Some(details) = self.profiles.get(&key) {
            tracing::debug!(key = %key, "Serving ticker details from cache");
            return Ok(details);
        }

        let details = ctx
            .run(self.upstream.ticker_details(&ticker, ctx))
            .await?
            .into_result()?;

        self.profiles.put(key, details.clone(), self.profile_ttl);
        Ok(details)
    }

    pub async fn previous_close(
        &self,
        ticker: &str,
        adjusted: bool,
        ctx: &RequestContext,
    ) -> ServiceResult<PreviousClose> {
        let ticker = normalise_ticker(ticker)?;
        let close = ctx
            .run(self.upstream.previous_close(&ticker, adjusted, ctx))
            .await?
            .into_result()?;
        Ok(close)
    }

    /// Open/close for every favourite of `user_id` on `date` (default: yesterday, UTC).
    ///
    /// Partial failures are returned alongside the data. Only the successes
    /// are cached.
    pub async fn favourites_open_close(
        &self,
        user_id: &str,
        date: Option<NaiveDate>,
        ctx: &RequestContext,
    ) -> ServiceResult<FavouritesOpenClose> {
        let user_id = require("user_id", user_id)?;
        let date = date.unwrap_or_else(default_trading_day);
        let key = keys::favourites_open_close(user_id, date);

        if let Some(data) = self.aggregates.get(&key) {
            tracing::debug!(key = %key, "Serving favourites open/close from cache");
            return Ok(FavouritesOpenClose {
                data,
                errors: Vec::new(),
                cached: true,
            });
        }

        let tickers = ctx.run(self.favourites.tickers(user_id)).await??;

        let upstream = self.upstream.clone();
        let stream = self.fanout.dispatch(tickers, ctx, move |ticker, ctx| {
            let upstream = upstream.clone();
            async move { upstream.daily_open_close(&ticker, date, &ctx).await }
        });

        let collected = collect(stream, ctx).await?;
        let (data, errors) = aggregate(collected)?.into_parts();

        if !errors.is_empty() {
            tracing::warn!(
                user_id,
                succeeded = data.len(),
                failed = errors.len(),
                "Favourites open/close partially failed"
            );
        }

        let data = Arc::new(data);
        self.aggregates.put(key, data.clone(), self.aggregate_ttl);

        Ok(FavouritesOpenClose {
            data,
            errors: errors.into_iter().map(Arc::new).collect(),
            cached: false,
        })
    }

    /// Latest moving average compared with the close one week before `request.from`.
    pub async fn simple_moving_average(
        &self,
        mut request: SmaRequest,
        ctx: &RequestContext,
    ) -> ServiceResult<MovingAverageReport> {
        request.ticker = normalise_ticker(&request.ticker)?;
        if request.window == 0 {
            return Err(ServiceError::Validation("window must be greater than zero".to_string()));
        }
        let week_ago = request
            .from
            .checked_sub_days(Days::new(7))
            .ok_or_else(|| ServiceError::Validation("time_stamp is out of range".to_string()))?;

        let (sma, last_week) = ctx
            .run(async {
                tokio::join!(
                    self.upstream.simple_moving_average(&request, ctx),
                    self.upstream.daily_open_close(&request.ticker, week_ago, ctx),
                )
            })
            .await?;

        let sma = sma.into_result()?;
        let last_week = last_week.into_result()?;

        let latest = sma.latest().ok_or_else(|| FetchError::EmptyResult {
            key: request.ticker.clone(),
            what: "simple moving average",
        })?;
        let change = percentage_change(last_week.close, latest.value)?;

        Ok(MovingAverageReport {
            last_week_close: last_week.close,
            percentage_change_this_week: change,
            invest_indicator: Trend::from_change(change),
            simple_moving_average: sma,
        })
    }

    pub async fn add_favourite(
        &self,
        user_id: &str,
        ticker: &str,
        ctx: &RequestContext,
    ) -> ServiceResult<()> {
        let user_id = require("user_id", user_id)?;
        let ticker = normalise_ticker(ticker)?;
        ctx.run(self.favourites.add(user_id, &ticker)).await??;
        Ok(())
    }

    pub async fn remove_favourite(
        &self,
        user_id: &str,
        ticker: &str,
        ctx: &RequestContext,
    ) -> ServiceResult<()> {
        let user_id = require("user_id", user_id)?;
        let ticker = normalise_ticker(ticker)?;
        ctx.run(self.favourites.remove(user_id, &ticker)).await??;
        Ok(())
    }
}

fn require<'a>(field: &str, value: &'a str) -> ServiceResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(value)
}

/// Upper-case a ticker and reject characters Polygon never uses.
fn normalise_ticker(ticker: &str) -> ServiceResult<String> {
    let ticker = require("ticker", ticker)?;
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '-'))
    {
        return Err(ServiceError::Validation(format!("invalid ticker '{}'", ticker)));
    }
    Ok(ticker.to_ascii_uppercase())
}

fn default_trading_day() -> NaiveDate {
    let today = Utc::now().date_naive();
    today.pred_opt().unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_ticker() {
        assert_eq!(normalise_ticker(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalise_ticker("brk.b").unwrap(), "BRK.B");
        assert_eq!(normalise_ticker("X:BTCUSD").unwrap(), "X:BTCUSD");
        assert!(matches!(normalise_ticker(""), Err(ServiceError::Validation(_))));
        assert!(matches!(normalise_ticker("AA/PL"), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_default_trading_day_is_in_the_past() {
        assert!(default_trading_day() < Utc::now().date_naive());
    }
}
