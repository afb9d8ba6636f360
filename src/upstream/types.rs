//! Typed results returned by the market data provider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference data for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerDetails {
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub primary_exchange: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub currency_name: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub total_employees: Option<u64>,
    #[serde(default)]
    pub list_date: Option<String>,
}

/// One OHLC bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBar {
    #[serde(rename = "T", default)]
    pub ticker: Option<String>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
    /// Bar start, milliseconds since the Unix epoch.
    #[serde(rename = "t")]
    pub timestamp: i64,
    #[serde(rename = "n", default)]
    pub transactions: Option<u64>,
}

/// Previous trading day's bar for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousClose {
    pub ticker: String,
    pub adjusted: bool,
    pub results: Vec<AggregateBar>,
}

/// Open, close and extended-hours prices for one ticker on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOpenClose {
    pub symbol: String,
    /// Trading day, `YYYY-MM-DD`.
    pub from: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(rename = "afterHours", default)]
    pub after_hours: Option<f64>,
    #[serde(rename = "preMarket", default)]
    pub pre_market: Option<f64>,
}

/// Aggregation window of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timespan {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Timespan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timespan::Minute => "minute",
            Timespan::Hour => "hour",
            Timespan::Day => "day",
            Timespan::Week => "week",
            Timespan::Month => "month",
            Timespan::Quarter => "quarter",
            Timespan::Year => "year",
        }
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a simple moving average query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaRequest {
    pub ticker: String,
    /// Only values at or after this day are returned.
    pub from: NaiveDate,
    pub timespan: Timespan,
    pub window: u32,
    /// Ask the provider to include the underlying aggregates URL.
    #[serde(default)]
    pub expand_underlying: bool,
}

/// A single indicator point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub value: f64,
}

/// Simple moving average series, newest value first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleMovingAverage {
    pub ticker: String,
    pub values: Vec<IndicatorValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_url: Option<String>,
}

impl SimpleMovingAverage {
    pub fn latest(&self) -> Option<&IndicatorValue> {
        self.values.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_uses_provider_field_names() {
        let json = r#"{"T":"AAPL","o":1.0,"h":2.0,"l":0.5,"c":1.5,"v":1000,"t":1700000000000}"#;
        let bar: AggregateBar = serde_json::from_str(json).unwrap();
        assert_eq!(bar.ticker.as_deref(), Some("AAPL"));
        assert_eq!(bar.close, 1.5);
        assert!(bar.vwap.is_none());
    }

    #[test]
    fn test_timespan_parses_lowercase() {
        let span: Timespan = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(span, Timespan::Week);
        assert_eq!(span.to_string(), "week");
    }
}
