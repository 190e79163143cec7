/// HTTP endpoint serving the latest water-level snapshot
///
/// Provides a small REST API for dashboards and downstream tooling.
///
/// Endpoints:
/// - GET /water-level - Latest station readings (live or cached)
/// - GET /health - Service health check
///
/// Requests are dispatched to a worker pool; a scrape can hold a worker
/// for the full render deadline, so the pool keeps slow scrapes from
/// blocking health checks behind them. Per-IP rate limiting protects the
/// upstream page from being hammered through us.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use threadpool::ThreadPool;

use crate::config::ServiceConfig;
use crate::model::{ScrapeError, Snapshot, Source, StationReading};
use crate::orchestrator::ScrapeOrchestrator;

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Body of a successful GET /water-level
#[derive(Debug, Serialize)]
pub struct WaterLevelResponse {
    pub stations: Vec<StationReading>,
    pub station_count: usize,
    pub fetched_at: DateTime<Utc>,
    pub source: Source,
}

impl WaterLevelResponse {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            station_count: snapshot.readings.len(),
            stations: snapshot.readings,
            fetched_at: snapshot.fetched_at,
            source: snapshot.source,
        }
    }
}

// ---------------------------------------------------------------------------
// Rate Limiting
// ---------------------------------------------------------------------------

/// Fixed-window per-IP request limiter.
///
/// Each IP gets `limit` requests per window; the window resets rather than
/// slides, which is coarse but cheap and good enough to stop a runaway
/// client from monopolizing the worker pool.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            limit: limit_per_minute,
            window: Duration::from_secs(60),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now())
    }

    fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = windows.entry(ip).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }
        if entry.1 >= self.limit {
            return false;
        }
        entry.1 += 1;
        true
    }
}

// ---------------------------------------------------------------------------
// Request Handling
// ---------------------------------------------------------------------------

/// Handle GET /water-level
fn handle_water_level(
    orchestrator: &ScrapeOrchestrator,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    match orchestrator.get_latest() {
        Ok((snapshot, _from_cache)) => {
            let body = WaterLevelResponse::from_snapshot(snapshot);
            match serde_json::to_value(&body) {
                Ok(json) => create_response(200, json),
                Err(e) => create_response(
                    500,
                    serde_json::json!({ "error": format!("Response encoding failed: {}", e) }),
                ),
            }
        }
        Err(ScrapeError::NoDataAvailable) => create_response(
            503,
            serde_json::json!({
                "error": "NoDataAvailable",
                "detail": "Live scraping failed and no cached snapshot exists yet"
            }),
        ),
        // get_latest absorbs retryable errors internally; anything else
        // surfacing here is unexpected but still gets a clean 503.
        Err(e) => create_response(503, serde_json::json!({ "error": e.to_string() })),
    }
}

/// Handle /health endpoint
fn handle_health() -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    create_response(
        200,
        serde_json::json!({
            "status": "ok",
            "service": "floodwatch_service",
            "version": env!("CARGO_PKG_VERSION")
        }),
    )
}

fn handle_not_found() -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    create_response(
        404,
        serde_json::json!({
            "error": "Not found",
            "available_endpoints": ["/health", "/water-level"]
        }),
    )
}

fn handle_rate_limited() -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    create_response(
        429,
        serde_json::json!({ "error": "Rate limit exceeded, try again later" }),
    )
}

/// Create HTTP response with JSON body
fn create_response(
    status_code: u16,
    json: serde_json::Value,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string());
    let bytes = body.into_bytes();

    tiny_http::Response::from_data(bytes)
        .with_status_code(tiny_http::StatusCode::from(status_code))
        .with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                .expect("static header is valid"),
        )
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start the HTTP endpoint server. Blocks the calling thread.
pub fn start_endpoint_server(
    config: &ServiceConfig,
    orchestrator: Arc<ScrapeOrchestrator>,
) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", config.endpoint_port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    let pool = ThreadPool::new(config.endpoint_workers);
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute));

    println!("📡 HTTP endpoint listening on http://0.0.0.0:{}", config.endpoint_port);
    println!("   GET /water-level - Latest station readings");
    println!("   GET /health - Service health check\n");

    for request in server.incoming_requests() {
        let orchestrator = Arc::clone(&orchestrator);
        let limiter = Arc::clone(&limiter);

        pool.execute(move || {
            let limited = request
                .remote_addr()
                .map(|addr| !limiter.allow(addr.ip()))
                .unwrap_or(false);

            let response = if limited {
                handle_rate_limited()
            } else {
                match request.url() {
                    "/water-level" => handle_water_level(&orchestrator),
                    "/health" => handle_health(),
                    _ => handle_not_found(),
                }
            };

            if let Err(e) = request.respond(response) {
                eprintln!("Failed to send response: {}", e);
            }
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
