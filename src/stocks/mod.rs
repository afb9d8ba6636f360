//! Stock operations built on the fan-out engine.

pub mod error;
pub mod indicators;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use indicators::{percentage_change, Trend};
pub use service::{FavouritesOpenClose, MovingAverageReport, StockService};
