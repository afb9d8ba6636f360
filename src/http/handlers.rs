//! Route handlers.
//!
//! Each handler opens a `RequestContext` bounded by the request timeout and
//! cancels it when the handler future is dropped, so a client disconnect
//! stops any fan-out started on its behalf.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::http::extract::{JsonBody, QueryParams};
use crate::http::response::{MessageBody, OpenCloseBody};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::stocks::ServiceResult;
use crate::upstream::{SmaRequest, Timespan};

#[derive(Debug, Deserialize)]
pub struct TickerQuery {
    #[serde(default)]
    pub ticker: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenCloseQuery {
    #[serde(default)]
    pub user_id: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PreviousCloseQuery {
    #[serde(default)]
    pub ticker: String,
    #[serde(default = "default_adjusted")]
    pub adjusted: bool,
}

fn default_adjusted() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SmaQuery {
    #[serde(default)]
    pub ticker: String,
    pub time_stamp: NaiveDate,
    pub time_span: Timespan,
    pub window: u32,
    #[serde(default)]
    pub more_details: bool,
}

impl From<SmaQuery> for SmaRequest {
    fn from(q: SmaQuery) -> Self {
        SmaRequest {
            ticker: q.ticker,
            from: q.time_stamp,
            timespan: q.time_span,
            window: q.window,
            expand_underlying: q.more_details,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FavouriteRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub ticker: String,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub cache: CacheSizes,
}

#[derive(Debug, Serialize)]
pub struct CacheSizes {
    pub profile: usize,
    pub aggregate: usize,
}

fn respond<T: IntoResponse>(route: &'static str, start: Instant, result: ServiceResult<T>) -> Response {
    let response = match result {
        Ok(body) => body.into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_request(route, response.status().as_u16(), start);
    response
}

pub async fn ticker_details(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TickerQuery>,
) -> Response {
    let start = Instant::now();
    let ctx = state.request_context();
    let _guard = ctx.cancel_on_drop();

    let result = state.service.ticker_details(&query.ticker, &ctx).await;
    respond("ticker_details", start, result.map(Json))
}

pub async fn favourites_open_close(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<OpenCloseQuery>,
) -> Response {
    let start = Instant::now();
    let ctx = state.request_context();
    let _guard = ctx.cancel_on_drop();

    let result = state
        .service
        .favourites_open_close(&query.user_id, query.date, &ctx)
        .await;
    respond(
        "favourites_open_close",
        start,
        result.map(|r| Json(OpenCloseBody::from(r))),
    )
}

pub async fn previous_close(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PreviousCloseQuery>,
) -> Response {
    let start = Instant::now();
    let ctx = state.request_context();
    let _guard = ctx.cancel_on_drop();

    let result = state
        .service
        .previous_close(&query.ticker, query.adjusted, &ctx)
        .await;
    respond("previous_close", start, result.map(Json))
}

pub async fn simple_moving_average(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SmaQuery>,
) -> Response {
    let start = Instant::now();
    let ctx = state.request_context();
    let _guard = ctx.cancel_on_drop();

    let result = state
        .service
        .simple_moving_average(query.into(), &ctx)
        .await;
    respond("simple_moving_average", start, result.map(Json))
}

pub async fn add_favourite(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<FavouriteRequest>,
) -> Response {
    let start = Instant::now();
    let ctx = state.request_context();
    let _guard = ctx.cancel_on_drop();

    let result = state
        .service
        .add_favourite(&body.user_id, &body.ticker, &ctx)
        .await
        .map(|()| {
            let message = format!("added {} to favourites", body.ticker.trim().to_ascii_uppercase());
            (StatusCode::CREATED, Json(MessageBody { message }))
        });
    respond("add_favourite", start, result)
}

pub async fn remove_favourite(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FavouriteRequest>,
) -> Response {
    let start = Instant::now();
    let ctx = state.request_context();
    let _guard = ctx.cancel_on_drop();

    let result = state
        .service
        .remove_favourite(&query.user_id, &query.ticker, &ctx)
        .await
        .map(|()| {
            let message = format!("removed {} from favourites", query.ticker.trim().to_ascii_uppercase());
            Json(MessageBody { message })
        });
    respond("remove_favourite", start, result)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let (profile, aggregate) = state.service.cache_sizes();
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache: CacheSizes { profile, aggregate },
    })
}
