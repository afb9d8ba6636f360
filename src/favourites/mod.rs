//! Per-user favourite tickers.
//!
//! The fan-out engine only consumes this as a source of keys. The trait is
//! the seam for a relational store; the in-memory implementation backs the
//! default binary and the tests.

pub mod repository;

pub use repository::{FavouriteRepository, InMemoryFavourites, RepositoryError};
