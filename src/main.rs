//! FloodWatch Service - Main Daemon
//!
//! A server-side daemon that:
//! 1. Renders the PAGASA Marikina water-level page in headless Chromium
//! 2. Extracts the station table into typed readings
//! 3. Persists the latest snapshot as a last-known-good copy
//! 4. Serves the freshest snapshot over a small HTTP API
//! 5. Optionally polls in the background to keep the cache warm
//!
//! Usage:
//!   cargo run --release                    # Serve with settings from floodwatch.toml
//!   cargo run --release -- --port 9090     # Override the HTTP port
//!   cargo run --release -- --no-poll       # Scrape on demand only
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string (optional; falls back to memory)

use std::env;
use std::sync::Arc;

use floodwatch_service::config;
use floodwatch_service::daemon::Poller;
use floodwatch_service::db;
use floodwatch_service::endpoint;
use floodwatch_service::orchestrator::ScrapeOrchestrator;
use floodwatch_service::render::chromium::ChromiumRenderer;
use floodwatch_service::render::pool::RenderPool;
use floodwatch_service::render::PageRenderer;
use floodwatch_service::store::{MemorySnapshotStore, PostgresSnapshotStore, SnapshotStore};

fn main() {
    println!("🌊 FloodWatch Service");
    println!("=====================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port_override: Option<u16> = None;
    let mut no_poll = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                if i + 1 < args.len() {
                    port_override = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            }
            "--no-poll" => {
                no_poll = true;
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--port PORT] [--no-poll]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let mut config = config::load_config();
    if let Some(port) = port_override {
        config.endpoint_port = port;
    }

    println!("📊 Configuration:");
    println!("   Source page: {}", config.source_url);
    println!("   Render timeout: {}s, settle: {}s", config.render_timeout_secs, config.settle_secs);
    println!("   Render pool size: {}", config.pool_size);
    println!("   Retry budget: {} attempts\n", config.retry_attempts);

    // Snapshot store: Postgres when reachable, otherwise in-memory only.
    // The service still works without a database, it just loses its cache
    // on restart.
    let store: Arc<dyn SnapshotStore> = match db::connect_and_verify(&["floodwatch"]) {
        Ok(client) => {
            println!("✓ Connected to PostgreSQL snapshot store\n");
            Arc::new(PostgresSnapshotStore::new(client))
        }
        Err(e) => {
            eprintln!("✗ Database unavailable: {}", e);
            eprintln!("   Continuing with in-memory snapshot store\n");
            Arc::new(MemorySnapshotStore::new())
        }
    };

    // Rendering: one Chromium session per call, capped by the slot pool.
    let renderer = ChromiumRenderer::new(config.ready_selector.clone(), config.settle());
    let pool: Arc<dyn PageRenderer> =
        Arc::new(RenderPool::new(Arc::new(renderer), config.pool_size));

    let orchestrator = Arc::new(ScrapeOrchestrator::from_config(pool, store, &config));

    // Optional background poller keeps the cached snapshot warm.
    match config.poll_interval_minutes {
        Some(minutes) if !no_poll => {
            let _poller = Poller::new(Arc::clone(&orchestrator), minutes).spawn();
        }
        _ => {
            println!("   Background polling disabled; scraping on demand only\n");
        }
    }

    // The endpoint server blocks the main thread until shutdown.
    if let Err(e) = endpoint::start_endpoint_server(&config, orchestrator) {
        eprintln!("\n❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
