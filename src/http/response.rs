//! Response shaping and error mapping.
//!
//! # Responsibilities
//! - Map service errors to HTTP status codes
//! - Render errors as `{"error": ...}` JSON
//! - Render partial fan-out results with their per-ticker errors
//!
//! # Design Decisions
//! - Cancellation and deadline expiry result in 504 Gateway Timeout
//! - Provider failures result in 502, except a provider 404 or 429 which pass through
//! - A partial fan-out is still a 200; failures are listed next to the data

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::fanout::{AggregateError, FetchError};
use crate::favourites::RepositoryError;
use crate::stocks::{FavouritesOpenClose, ServiceError};
use crate::upstream::{DailyOpenClose, UpstreamError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// One failed key of a fan-out.
#[derive(Debug, Serialize)]
pub struct KeyError {
    pub ticker: String,
    pub error: String,
}

impl From<&FetchError> for KeyError {
    fn from(e: &FetchError) -> Self {
        Self {
            ticker: e.key().to_string(),
            error: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpenCloseBody {
    pub data: Arc<Vec<DailyOpenClose>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<KeyError>,
    pub cached: bool,
}

impl From<FavouritesOpenClose> for OpenCloseBody {
    fn from(result: FavouritesOpenClose) -> Self {
        Self {
            errors: result.errors.iter().map(|e| KeyError::from(e.as_ref())).collect(),
            data: result.data,
            cached: result.cached,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

fn fetch_status(error: &FetchError) -> StatusCode {
    match error {
        FetchError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        FetchError::EmptyResult { .. } => StatusCode::NOT_FOUND,
        FetchError::Provider { source, .. } => match source {
            UpstreamError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            UpstreamError::Http { status: 404, .. } => StatusCode::NOT_FOUND,
            UpstreamError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        },
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Upstream(e) => fetch_status(e),
            ServiceError::Aggregate(AggregateError::AllFailed(_)) => StatusCode::BAD_GATEWAY,
            ServiceError::Aggregate(AggregateError::NoData) => StatusCode::NOT_FOUND,
            ServiceError::Repository(e) => match e {
                RepositoryError::AlreadyExists { .. } => StatusCode::CONFLICT,
                RepositoryError::NotFound { .. } | RepositoryError::NoFavourites(_) => {
                    StatusCode::NOT_FOUND
                }
                RepositoryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::Indicator(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
