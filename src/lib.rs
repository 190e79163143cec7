/// floodwatch_service: PAGASA Marikina River water-level scraping service.
///
/// # Module structure
///
/// ```text
/// floodwatch_service
/// ├── model        — shared data types (StationReading, Snapshot, ScrapeError, …)
/// ├── config       — service configuration loader (floodwatch.toml + env)
/// ├── render
/// │   ├── chromium — headless Chromium page rendering via chromiumoxide
/// │   └── pool     — bounded render-slot pool wrapped around any renderer
/// ├── extract      — rendered-HTML to station readings (pure, deterministic)
/// │   └── fixtures (test only) — representative rendered-page payloads
/// ├── store        — last-known-good snapshot persistence (Postgres or memory)
/// ├── db           — database connectivity and schema validation
/// ├── orchestrator — scrape pipeline: retry, persist, cached fallback
/// ├── daemon       — optional background polling loop
/// └── endpoint     — HTTP API (/water-level, /health) with rate limiting
/// ```

/// Public modules
pub mod config;
pub mod daemon;
pub mod db;
pub mod endpoint;
pub mod extract;
pub mod model;
pub mod orchestrator;
pub mod render;
pub mod store;
