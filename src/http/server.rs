//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all stock handlers
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener and shut down gracefully on Ctrl+C

use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::fanout::RequestContext;
use crate::http::handlers;
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::stocks::StockService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StockService>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(service: Arc<StockService>, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }

    /// A fresh context bounded by the request timeout.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/stocks/info/tickerdetails", get(handlers::ticker_details))
        .route("/stocks/daily/openclose", get(handlers::favourites_open_close))
        .route(
            "/stocks/daily/changeFromYesterday",
            get(handlers::previous_close),
        )
        .route("/stocks/indicators/sma", get(handlers::simple_moving_average))
        .route("/stocks/favourites/add", post(handlers::add_favourite))
        .route("/stocks/favourites/delete", delete(handlers::remove_favourite))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(propagate_request_id_layer()),
        )
}

/// HTTP server for the stock gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(service: Arc<StockService>, config: &GatewayConfig) -> Self {
        let state = AppState::new(service, config.timeouts.request());
        Self {
            router: build_router(state),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
