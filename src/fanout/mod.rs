//! Concurrent fan-out engine.
//!
//! # Data Flow
//! ```text
//! keys + RequestContext
//!     → dispatcher.rs (one task per key, semaphore-gated)
//!         → fetch.rs (deadline-bounded upstream call → Envelope)
//!     → bounded mpsc channel (completion order)
//!     → collector.rs (drain or give up on cancellation)
//!     → aggregate.rs (complete / partial / all failed / no data)
//! ```
//!
//! # Design Decisions
//! - Per-key failures travel as values inside envelopes; siblings never abort
//! - Cancellation is a distinct error class from upstream failure
//! - Concurrency limit belongs to the dispatcher, not to call sites

pub mod aggregate;
pub mod collector;
pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod fetch;

pub use aggregate::{aggregate, AggregateError, Outcome};
pub use collector::{collect, CollectError, Collected};
pub use context::{Cancelled, RequestContext};
pub use dispatcher::FanOut;
pub use envelope::{Envelope, FetchError};
pub use fetch::{Upstream, DEFAULT_UPSTREAM_TIMEOUT};
