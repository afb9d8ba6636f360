//! Shared utilities for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use stock_gateway::fanout::{FanOut, Upstream};
use stock_gateway::favourites::{FavouriteRepository, InMemoryFavourites};
use stock_gateway::upstream::{
    AggregateBar, DailyOpenClose, IndicatorValue, MarketDataClient, PreviousClose,
    SimpleMovingAverage, SmaRequest, TickerDetails, UpstreamError,
};
use stock_gateway::StockService;

/// Scripted market data provider.
///
/// Records how many calls it saw and the highest number running at once.
pub struct MockMarketData {
    delay: Duration,
    slow: HashMap<String, Duration>,
    failing: HashSet<String>,
    close: f64,
    sma_value: f64,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            slow: HashMap::new(),
            failing: HashSet::new(),
            close: 100.0,
            sma_value: 110.0,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Calls for `ticker` sleep `delay` instead of the default.
    pub fn with_slow(mut self, ticker: &str, delay: Duration) -> Self {
        self.slow.insert(ticker.to_string(), delay);
        self
    }

    /// Calls for these tickers fail with HTTP 500.
    pub fn failing(mut self, tickers: &[&str]) -> Self {
        self.failing.extend(tickers.iter().map(|t| t.to_string()));
        self
    }

    pub fn with_close(mut self, close: f64) -> Self {
        self.close = close;
        self
    }

    pub fn with_sma_value(mut self, value: f64) -> Self {
        self.sma_value = value;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, ticker: &str) -> Result<(), UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = self.slow.get(ticker).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(ticker) {
            return Err(UpstreamError::Http {
                provider: "mock",
                status: 500,
                message: format!("scripted failure for {}", ticker),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataClient for MockMarketData {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn ticker_details(&self, ticker: &str) -> Result<TickerDetails, UpstreamError> {
        self.enter(ticker).await?;
        serde_json::from_value(serde_json::json!({
            "ticker": ticker,
            "name": format!("{} Inc.", ticker),
            "market": "stocks",
        }))
        .map_err(|e| UpstreamError::Decode {
            provider: "mock",
            message: e.to_string(),
        })
    }

    async fn previous_close(
        &self,
        ticker: &str,
        adjusted: bool,
    ) -> Result<PreviousClose, UpstreamError> {
        self.enter(ticker).await?;
        Ok(PreviousClose {
            ticker: ticker.to_string(),
            adjusted,
            results: vec![AggregateBar {
                ticker: Some(ticker.to_string()),
                open: self.close - 1.0,
                high: self.close + 1.0,
                low: self.close - 2.0,
                close: self.close,
                volume: 1_000.0,
                vwap: None,
                timestamp: 1_700_000_000_000,
                transactions: None,
            }],
        })
    }

    async fn daily_open_close(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<DailyOpenClose, UpstreamError> {
        self.enter(ticker).await?;
        Ok(DailyOpenClose {
            symbol: ticker.to_string(),
            from: date.format("%Y-%m-%d").to_string(),
            open: self.close - 1.0,
            high: self.close + 1.0,
            low: self.close - 2.0,
            close: self.close,
            volume: 1_000.0,
            after_hours: None,
            pre_market: None,
        })
    }

    async fn simple_moving_average(
        &self,
        request: &SmaRequest,
    ) -> Result<SimpleMovingAverage, UpstreamError> {
        self.enter(&request.ticker).await?;
        Ok(SimpleMovingAverage {
            ticker: request.ticker.clone(),
            values: vec![
                IndicatorValue {
                    timestamp: 1_700_086_400_000,
                    value: self.sma_value,
                },
                IndicatorValue {
                    timestamp: 1_700_000_000_000,
                    value: self.sma_value - 5.0,
                },
            ],
            underlying_url: None,
        })
    }
}

/// Favourites repository pre-loaded for `user_id`.
pub async fn favourites(user_id: &str, tickers: &[&str]) -> Arc<InMemoryFavourites> {
    let repo = Arc::new(InMemoryFavourites::new());
    for ticker in tickers {
        repo.add(user_id, ticker).await.unwrap();
    }
    repo
}

/// Service over `client` with short TTLs and the given parallelism.
pub fn service(
    client: Arc<MockMarketData>,
    favourites: Arc<InMemoryFavourites>,
    max_parallelism: usize,
) -> StockService {
    StockService::new(
        Upstream::with_default_timeout(client, Duration::from_secs(5)),
        FanOut::new(max_parallelism),
        favourites,
        Duration::from_secs(60),
        Duration::from_secs(60),
    )
}

/// A captured request line plus headers, lower-cased header names.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub target: String,
    pub headers: HashMap<String, String>,
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` receives each request's target and headers and returns the status and
/// JSON body to answer with.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(CapturedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines = text.split("\r\n");
    let target = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    Some(CapturedRequest { target, headers })
}
