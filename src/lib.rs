//! Stock data gateway library.
//!
//! Concurrent fan-out and aggregation over the Polygon market data API, with
//! TTL caching of single lookups and aggregated results.

pub mod cache;
pub mod config;
pub mod fanout;
pub mod favourites;
pub mod http;
pub mod observability;
pub mod stocks;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use stocks::StockService;
