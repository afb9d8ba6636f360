//! Favourite ticker storage.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{ticker} is already a favourite of {user_id}")]
    AlreadyExists { user_id: String, ticker: String },

    #[error("{ticker} is not a favourite of {user_id}")]
    NotFound { user_id: String, ticker: String },

    #[error("no favourite tickers found for {0}")]
    NoFavourites(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Keyed by an opaque user identifier and a ticker symbol.
#[async_trait]
pub trait FavouriteRepository: Send + Sync {
    async fn add(&self, user_id: &str, ticker: &str) -> Result<(), RepositoryError>;

    async fn remove(&self, user_id: &str, ticker: &str) -> Result<(), RepositoryError>;

    /// All favourites of `user_id`, sorted. A user without any is an error.
    async fn tickers(&self, user_id: &str) -> Result<Vec<String>, RepositoryError>;
}

/// Process-local repository; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryFavourites {
    by_user: DashMap<String, BTreeSet<String>>,
}

impl InMemoryFavourites {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavouriteRepository for InMemoryFavourites {
    async fn add(&self, user_id: &str, ticker: &str) -> Result<(), RepositoryError> {
        let inserted = self
            .by_user
            .entry(user_id.to_string())
            .or_default()
            .insert(ticker.to_string());
        if !inserted {
            return Err(RepositoryError::AlreadyExists {
                user_id: user_id.to_string(),
                ticker: ticker.to_string(),
            });
        }
        tracing::info!(user_id, ticker, "Added favourite");
        Ok(())
    }

    async fn remove(&self, user_id: &str, ticker: &str) -> Result<(), RepositoryError> {
        let removed = match self.by_user.get_mut(user_id) {
            Some(mut set) => set.remove(ticker),
            None => false,
        };
        // Drop users whose last favourite went away.
        self.by_user.remove_if(user_id, |_, set| set.is_empty());

        if !removed {
            return Err(RepositoryError::NotFound {
                user_id: user_id.to_string(),
                ticker: ticker.to_string(),
            });
        }
        tracing::info!(user_id, ticker, "Removed favourite");
        Ok(())
    }

    async fn tickers(&self, user_id: &str) -> Result<Vec<String>, RepositoryError> {
        match self.by_user.get(user_id) {
            Some(set) if !set.is_empty() => Ok(set.iter().cloned().collect()),
            _ => Err(RepositoryError::NoFavourites(user_id.to_string())),
        }
    }
}
