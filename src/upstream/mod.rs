//! Upstream market data provider.
//!
//! # Data Flow
//! ```text
//! fanout::fetch (deadline, envelope mapping)
//!     → MarketDataClient (one call per data kind)
//!     → PolygonClient (reqwest, bearer auth)
//!     → Polygon REST API
//! ```
//!
//! The trait is the seam tests use to substitute a scripted provider.

pub mod client;
pub mod polygon;
pub mod types;

pub use client::{MarketDataClient, UpstreamError};
pub use polygon::PolygonClient;
pub use types::{
    AggregateBar, DailyOpenClose, IndicatorValue, PreviousClose, SimpleMovingAverage, SmaRequest,
    TickerDetails, Timespan,
};
