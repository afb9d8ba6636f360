//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, tracing span)
//!     → extract.rs (query/JSON extraction, JSON rejections)
//!     → handlers.rs (RequestContext per request)
//!     → stocks::StockService
//!     → response.rs (status mapping, JSON bodies)
//!     → Send to client
//! ```

pub mod extract;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer};
