/// Rendered-DOM extraction for the PAGASA water-level table.
///
/// Pure functions of the rendered HTML (plus a caller-supplied fallback
/// timestamp) — no network, no I/O, deterministic. The page publishes one
/// `table.table-type1` whose tbody rows carry, in order: station name,
/// current water level, level 30 minutes ago, level 1 hour ago, and the
/// alert / alarm / critical thresholds, all in meters.
///
/// Parsing is defensive per cell: a blank or placeholder cell ("(--)",
/// "n/a") yields `None` for that measurement, never an error for the row.
/// A row without a station name is skipped and counted. Only the table
/// itself going missing is reported as low confidence.

#[cfg(test)]
pub(crate) mod fixtures;

use crate::model::{derive_status, StationReading, Unit};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};

// Structural selectors for the rendered page. Class-based rather than
// positional so cosmetic layout changes upstream do not break extraction.
const TABLE_SELECTOR: &str = "table.table-type1";
const ROW_SELECTOR: &str = "tbody tr";
const CELL_SELECTOR: &str = "th, td";
const SEARCH_TIME_SELECTOR: &str = "div.search-time";

/// PAGASA publishes observation times in Philippine Standard Time.
const PHT_OFFSET_SECONDS: i32 = 8 * 3600;

/// Minimum cells for a usable row: name + current + 30min + 1hr + three
/// thresholds.
const MIN_ROW_CELLS: usize = 7;

// ---------------------------------------------------------------------------
// Extraction result
// ---------------------------------------------------------------------------

/// Extractor-reported signal distinguishing "page structure absent or
/// changed" from "structure present, genuinely no rows".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// The station table was located; readings (possibly zero) are real.
    TableFound,
    /// No station table in the document — partial render or layout change.
    TableMissing,
}

/// Everything extracted from one rendered document.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub readings: Vec<StationReading>,
    pub confidence: Confidence,
    /// Rows present in the table but unusable (no station name, too few
    /// cells, duplicate station).
    pub skipped_rows: usize,
    /// Observation time published on the page, when parseable.
    pub observed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Parses a rendered document into station readings.
///
/// `rendered_at` stamps `observed_at` on every reading when the page's own
/// search-time is absent or unparseable, keeping the function deterministic
/// for a given input pair.
pub fn extract(html: &str, rendered_at: DateTime<Utc>) -> Extraction {
    let document = Html::parse_document(html);

    let table_selector = Selector::parse(TABLE_SELECTOR).expect("static selector");
    let row_selector = Selector::parse(ROW_SELECTOR).expect("static selector");
    let cell_selector = Selector::parse(CELL_SELECTOR).expect("static selector");

    let observed_at = parse_search_time(&document);
    let stamp = observed_at.unwrap_or(rendered_at);

    let table = match document.select(&table_selector).next() {
        Some(t) => t,
        None => {
            return Extraction {
                readings: Vec::new(),
                confidence: Confidence::TableMissing,
                skipped_rows: 0,
                observed_at,
            };
        }
    };

    let mut readings: Vec<StationReading> = Vec::new();
    let mut skipped_rows = 0;

    for row in table.select(&row_selector) {
        let cells: Vec<String> = row.select(&cell_selector).map(cell_text).collect();

        if cells.len() < MIN_ROW_CELLS {
            skipped_rows += 1;
            continue;
        }

        let station_name = normalize_station_name(&cells[0]);
        if station_name.is_empty() {
            skipped_rows += 1;
            continue;
        }

        let station_id = station_id_from_name(&station_name);
        if readings.iter().any(|r| r.station_id == station_id) {
            // station_id is unique per snapshot; keep the first occurrence.
            skipped_rows += 1;
            continue;
        }

        let water_level_m = parse_level_cell(&cells[1]);
        let change_30min_m = parse_level_cell(&cells[2]);
        let change_1hr_m = parse_level_cell(&cells[3]);
        let alert_level_m = parse_level_cell(&cells[4]);
        let alarm_level_m = parse_level_cell(&cells[5]);
        let critical_level_m = parse_level_cell(&cells[6]);

        let status = derive_status(water_level_m, alert_level_m, critical_level_m);

        readings.push(StationReading {
            station_id,
            station_name,
            water_level_m,
            change_30min_m,
            change_1hr_m,
            alert_level_m,
            alarm_level_m,
            critical_level_m,
            observed_at: stamp,
            unit: Unit::Meters,
            status,
        });
    }

    Extraction {
        readings,
        confidence: Confidence::TableFound,
        skipped_rows,
        observed_at,
    }
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>()
}

/// Reads the page's `div.search-time` ("YYYY-MM-DD HH:MM", PHT) as UTC.
fn parse_search_time(document: &Html) -> Option<DateTime<Utc>> {
    let selector = Selector::parse(SEARCH_TIME_SELECTOR).expect("static selector");
    let text = document
        .select(&selector)
        .next()
        .map(|div| div.text().collect::<String>())?;

    let naive = NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M").ok()?;
    let pht = FixedOffset::east_opt(PHT_OFFSET_SECONDS)?;
    naive
        .and_local_timezone(pht)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// Field normalization
// ---------------------------------------------------------------------------

/// Trims and collapses internal whitespace so display reformatting upstream
/// does not shift station identity between scrapes.
pub fn normalize_station_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derives the stable station identifier from a normalized name:
/// lowercased, whitespace runs become single hyphens, punctuation dropped.
pub fn station_id_from_name(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            id.extend(ch.to_lowercase());
            last_was_hyphen = false;
        } else if ch.is_whitespace() && !last_was_hyphen {
            id.push('-');
            last_was_hyphen = true;
        }
    }
    while id.ends_with('-') {
        id.pop();
    }
    id
}

/// Parses one numeric table cell in meters.
///
/// Placeholder markers ("-", "(--)", "n/a", empty) and anything else
/// non-numeric yield `None`. Decorations around the number — parentheses,
/// asterisks, a trailing "m" — are stripped before parsing.
pub fn parse_level_cell(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
        .collect();
    cleaned.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
