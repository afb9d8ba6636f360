//! HTTP routes driven in-process.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::{favourites, service, MockMarketData};
use stock_gateway::http::{build_router, AppState, X_REQUEST_ID};

async fn router_with(client: MockMarketData, user_id: &str, tickers: &[&str]) -> Router {
    let repo = favourites(user_id, tickers).await;
    let svc = service(Arc::new(client), repo, 2);
    build_router(AppState::new(Arc::new(svc), Duration::from_secs(5)))
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_version_and_request_id() {
    let router = router_with(MockMarketData::new(), "u1", &[]).await;

    let response = send(&router, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let id = response
        .headers()
        .get(X_REQUEST_ID)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["cache"]["profile"], 0);
}

#[tokio::test]
async fn test_client_request_id_is_kept() {
    let router = router_with(MockMarketData::new(), "u1", &[]).await;

    let request = Request::builder()
        .uri("/health")
        .header(X_REQUEST_ID, "client-id-1")
        .body(Body::empty())
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.headers().get(X_REQUEST_ID).unwrap(), "client-id-1");
}

#[tokio::test]
async fn test_ticker_details() {
    let router = router_with(MockMarketData::new(), "u1", &[]).await;

    let response = send(&router, get("/stocks/info/tickerdetails?ticker=aapl")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ticker"], "AAPL");
    assert_eq!(body["name"], "AAPL Inc.");
}

#[tokio::test]
async fn test_missing_ticker_is_a_bad_request() {
    let router = router_with(MockMarketData::new(), "u1", &[]).await;

    let response = send(&router, get("/stocks/info/tickerdetails")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("ticker"));
}

#[tokio::test]
async fn test_upstream_failure_is_a_bad_gateway() {
    let router = router_with(MockMarketData::new().failing(&["AAPL"]), "u1", &[]).await;

    let response = send(&router, get("/stocks/info/tickerdetails?ticker=AAPL")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_open_close_partial_result() {
    let router = router_with(
        MockMarketData::new().failing(&["BBB"]),
        "u1",
        &["AAA", "BBB", "CCC"],
    )
    .await;

    let response = send(&router, get("/stocks/daily/openclose?user_id=u1&date=2024-03-08")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["errors"][0]["ticker"], "BBB");
    assert_eq!(body["cached"], false);
}

#[tokio::test]
async fn test_open_close_all_failed() {
    let router = router_with(MockMarketData::new().failing(&["AAA"]), "u1", &["AAA"]).await;

    let response = send(&router, get("/stocks/daily/openclose?user_id=u1&date=2024-03-08")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_open_close_times_out() {
    let repo = favourites("u1", &["AAA", "BBB"]).await;
    let client = MockMarketData::new().with_delay(Duration::from_millis(500));
    let svc = service(Arc::new(client), repo, 2);
    let router = build_router(AppState::new(Arc::new(svc), Duration::from_millis(50)));

    let response = send(&router, get("/stocks/daily/openclose?user_id=u1&date=2024-03-08")).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_previous_close() {
    let router = router_with(MockMarketData::new().with_close(12.5), "u1", &[]).await;

    let response = send(&router, get("/stocks/daily/changeFromYesterday?ticker=tsla")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ticker"], "TSLA");
    assert_eq!(body["adjusted"], true);
    assert_eq!(body["results"][0]["c"], 12.5);
}

#[tokio::test]
async fn test_simple_moving_average() {
    let router = router_with(
        MockMarketData::new().with_close(200.0).with_sma_value(150.0),
        "u1",
        &[],
    )
    .await;

    let response = send(
        &router,
        get("/stocks/indicators/sma?ticker=msft&time_stamp=2024-03-08&time_span=day&window=10"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["last_week_close"], 200.0);
    assert_eq!(body["percentage_change_this_week"], -25.0);
    assert_eq!(body["invest_indicator"], "Bearish");
    assert_eq!(body["simple_moving_average"]["ticker"], "MSFT");
}

#[tokio::test]
async fn test_simple_moving_average_rejects_unknown_timespan() {
    let router = router_with(MockMarketData::new(), "u1", &[]).await;

    let response = send(
        &router,
        get("/stocks/indicators/sma?ticker=msft&time_stamp=2024-03-08&time_span=fortnight&window=10"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("fortnight"));
}

#[tokio::test]
async fn test_missing_query_field_is_a_json_error() {
    let router = router_with(MockMarketData::new(), "u1", &[]).await;

    let response = send(&router, get("/stocks/indicators/sma?ticker=msft")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("time_stamp"));
}

#[tokio::test]
async fn test_malformed_json_body_is_a_json_error() {
    let router = router_with(MockMarketData::new(), "u1", &[]).await;

    let request = Request::builder()
        .method("POST")
        .uri("/stocks/favourites/add")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"user_id": "u2", "ticker": "#))
        .unwrap();
    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_favourite_lifecycle() {
    let router = router_with(MockMarketData::new(), "u1", &[]).await;

    let add = || {
        Request::builder()
            .method("POST")
            .uri("/stocks/favourites/add")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":"u2","ticker":"nvda"}"#))
            .unwrap()
    };

    let response = send(&router, add()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "added NVDA to favourites");

    let response = send(&router, add()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&router, get("/stocks/daily/openclose?user_id=u2&date=2024-03-08")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"][0]["symbol"], "NVDA");

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/stocks/favourites/delete?user_id=u2&ticker=NVDA")
            .body(Body::empty())
            .unwrap()
    };
    let response = send(&router, delete()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&router, delete()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_user_has_no_favourites() {
    let router = router_with(MockMarketData::new(), "u1", &["AAA"]).await;

    let response = send(&router, get("/stocks/daily/openclose?user_id=ghost")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
