/// Core data types for the PAGASA water-level scraping service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no external service dependencies — only types and
/// the status derivation rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// Measurement unit for water levels. PAGASA publishes everything in meters;
/// the enum exists so the JSON surface names the unit explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Meters,
}

/// Severity band for a station, derived from its water level against the
/// station's own published thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    Normal,
    Alert,
    Critical,
    /// Level or thresholds missing from the source table.
    Unknown,
}

/// One station row from the PAGASA water-level table.
///
/// The table publishes the current level, the levels 30 minutes and 1 hour
/// ago, and three escalation thresholds (alert < alarm < critical). Any
/// numeric cell may be blank or a placeholder like "(--)" on the live page,
/// so every measurement is optional. Readings are immutable once built; a
/// fresh scrape always produces new readings rather than mutating old ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReading {
    /// Stable identifier derived from the normalized station name.
    pub station_id: String,
    pub station_name: String,
    pub water_level_m: Option<f64>,
    pub change_30min_m: Option<f64>,
    pub change_1hr_m: Option<f64>,
    pub alert_level_m: Option<f64>,
    pub alarm_level_m: Option<f64>,
    pub critical_level_m: Option<f64>,
    /// Observation time published on the page, falling back to render time.
    pub observed_at: DateTime<Utc>,
    pub unit: Unit,
    pub status: LevelStatus,
}

/// Derives the severity band from a level and the alert/critical thresholds.
///
/// The derivation only fires when the level and BOTH outer thresholds are
/// present; a partial threshold set yields `Unknown` rather than a guess.
/// The middle "alarm" threshold is carried as data but does not participate,
/// so the three-band result stays comparable across stations that omit it.
pub fn derive_status(
    water_level_m: Option<f64>,
    alert_level_m: Option<f64>,
    critical_level_m: Option<f64>,
) -> LevelStatus {
    match (water_level_m, alert_level_m, critical_level_m) {
        (Some(level), Some(alert), Some(critical)) => {
            if level >= critical {
                LevelStatus::Critical
            } else if level >= alert {
                LevelStatus::Alert
            } else {
                LevelStatus::Normal
            }
        }
        _ => LevelStatus::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Where a snapshot's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Live,
    Cached,
}

/// The full station set captured at one point in time.
///
/// A live snapshot is never empty: zero extracted stations is treated as an
/// extraction failure upstream, so a persisted snapshot always holds at
/// least one reading with `station_id` unique across the set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub readings: Vec<StationReading>,
    pub fetched_at: DateTime<Utc>,
    pub source: Source,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while producing a snapshot.
///
/// Everything except `NoDataAvailable` is retryable and is absorbed by the
/// orchestrator's retry loop; only retry-budget exhaustion with an empty
/// cache surfaces to the API layer, as a 503.
#[derive(Debug, PartialEq)]
pub enum ScrapeError {
    /// The page did not reach its readiness condition within the deadline.
    RenderTimeout(String),
    /// DNS/connection failure or the navigation itself was rejected.
    Navigation(String),
    /// The rendering engine process died or could not be started.
    EngineCrash(String),
    /// The rendered document had no usable station table — structure
    /// changed, or the page had not finished rendering.
    LowConfidenceExtraction(String),
    /// Live scraping exhausted its retries and no cached snapshot exists.
    NoDataAvailable,
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeError::RenderTimeout(msg) => write!(f, "Render timeout: {}", msg),
            ScrapeError::Navigation(msg) => write!(f, "Navigation error: {}", msg),
            ScrapeError::EngineCrash(msg) => write!(f, "Rendering engine crash: {}", msg),
            ScrapeError::LowConfidenceExtraction(msg) => {
                write!(f, "Low-confidence extraction: {}", msg)
            }
            ScrapeError::NoDataAvailable => write!(f, "No data available (live or cached)"),
        }
    }
}

impl std::error::Error for ScrapeError {}

impl ScrapeError {
    /// Whether the orchestrator should spend another attempt on this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ScrapeError::NoDataAvailable)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_between_alert_and_critical_is_alert() {
        let status = derive_status(Some(5.0), Some(4.0), Some(6.0));
        assert_eq!(status, LevelStatus::Alert);
    }

    #[test]
    fn test_status_at_or_above_critical_is_critical() {
        assert_eq!(derive_status(Some(7.0), Some(4.0), Some(6.0)), LevelStatus::Critical);
        // Boundary: exactly at the critical threshold counts as critical.
        assert_eq!(derive_status(Some(6.0), Some(4.0), Some(6.0)), LevelStatus::Critical);
    }

    #[test]
    fn test_status_below_alert_is_normal() {
        assert_eq!(derive_status(Some(2.0), Some(4.0), Some(6.0)), LevelStatus::Normal);
    }

    #[test]
    fn test_status_unknown_without_both_thresholds() {
        // Either threshold missing means no derivation, regardless of level.
        assert_eq!(derive_status(Some(9.9), None, None), LevelStatus::Unknown);
        assert_eq!(derive_status(Some(9.9), Some(4.0), None), LevelStatus::Unknown);
        assert_eq!(derive_status(Some(9.9), None, Some(6.0)), LevelStatus::Unknown);
    }

    #[test]
    fn test_status_unknown_without_level() {
        assert_eq!(derive_status(None, Some(4.0), Some(6.0)), LevelStatus::Unknown);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ScrapeError::RenderTimeout("t".into()).is_retryable());
        assert!(ScrapeError::Navigation("n".into()).is_retryable());
        assert!(ScrapeError::EngineCrash("c".into()).is_retryable());
        assert!(ScrapeError::LowConfidenceExtraction("l".into()).is_retryable());
        assert!(!ScrapeError::NoDataAvailable.is_retryable());
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let snapshot = Snapshot {
            readings: vec![StationReading {
                station_id: "nangka".to_string(),
                station_name: "Nangka".to_string(),
                water_level_m: Some(17.34),
                change_30min_m: Some(17.30),
                change_1hr_m: Some(17.21),
                alert_level_m: Some(17.0),
                alarm_level_m: Some(17.5),
                critical_level_m: Some(18.0),
                observed_at: Utc::now(),
                unit: Unit::Meters,
                status: LevelStatus::Alert,
            }],
            fetched_at: Utc::now(),
            source: Source::Live,
        };

        let json = serde_json::to_string(&snapshot).expect("snapshot should serialize");
        assert!(json.contains("\"source\":\"live\""), "source must serialize lowercase");
        assert!(json.contains("\"status\":\"alert\""), "status must serialize lowercase");

        let back: Snapshot = serde_json::from_str(&json).expect("snapshot should deserialize");
        assert_eq!(back, snapshot);
    }
}
