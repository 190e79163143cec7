/// Test fixtures: representative rendered-HTML payloads from the PAGASA
/// water-level table page.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the extractor. They reflect the DOM produced after
/// the page's own script has populated the table at:
///   https://pasig-marikina-tullahanffws.pagasa.dost.gov.ph/water/table.do
///
/// Rendered page shape:
///   div.search-time            — observation time, "YYYY-MM-DD HH:MM" (PHT)
///   table.table-type1
///     thead tr                 — column headers (not station data)
///     tbody tr                 — one row per station:
///       th       — station name
///       td ×3    — current / 30-min-ago / 1-hr-ago level, meters
///       td ×3    — alert / alarm / critical thresholds, meters
///
/// Note: level cells on the live page are sometimes wrapped in parentheses
/// or replaced wholesale with "(--)" when a sensor is down. Parsers must
/// handle both.

/// Four stations covering all three severity bands plus one sensor outage.
/// Sto. Nino 8.10 < alert 16.0 (normal); Nangka 17.34 between alert 17.0
/// and critical 18.0 (alert); Tumana 21.60 >= critical 21.5 (critical);
/// Montalban's current level is the "(--)" outage placeholder.
pub(crate) fn fixture_water_level_table() -> &'static str {
    r#"<!DOCTYPE html>
<html>
<body>
  <div class="content">
    <div class="search-time">2024-08-10 14:30</div>
    <table class="table-type1" summary="Water level observation">
      <thead>
        <tr>
          <th>Station</th><th>Water Level</th><th>30min ago</th><th>1hr ago</th>
          <th>Alert</th><th>Alarm</th><th>Critical</th>
        </tr>
      </thead>
      <tbody>
        <tr>
          <th scope="row">Sto. Nino</th>
          <td>8.10</td><td>8.09</td><td>8.05</td>
          <td>16.00</td><td>17.00</td><td>18.00</td>
        </tr>
        <tr>
          <th scope="row">Nangka</th>
          <td>17.34</td><td>17.30</td><td>17.21</td>
          <td>17.00</td><td>17.50</td><td>18.00</td>
        </tr>
        <tr>
          <th scope="row">Tumana</th>
          <td>21.60</td><td>21.48</td><td>21.33</td>
          <td>20.10</td><td>20.90</td><td>21.50</td>
        </tr>
        <tr>
          <th scope="row">Montalban</th>
          <td>(--)</td><td>(--)</td><td>(--)</td>
          <td>20.00</td><td>21.00</td><td>22.00</td>
        </tr>
      </tbody>
    </table>
  </div>
</body>
</html>"#
}

/// Table present but with damaged rows: a row whose name cell is blank, a
/// truncated row with too few cells, and one intact station. Extraction
/// must keep the good row and count the other two as skipped.
pub(crate) fn fixture_malformed_rows() -> &'static str {
    r#"<html><body>
  <div class="search-time">2024-08-10 14:30</div>
  <table class="table-type1">
    <tbody>
      <tr>
        <th scope="row">   </th>
        <td>1.00</td><td>1.00</td><td>1.00</td>
        <td>2.00</td><td>2.50</td><td>3.00</td>
      </tr>
      <tr>
        <th scope="row">Rosario Bridge</th>
        <td>12.70</td><td>12.66</td><td>12.61</td>
        <td>13.00</td><td>13.60</td><td>14.20</td>
      </tr>
      <tr>
        <th scope="row">Truncated</th>
        <td>5.00</td><td>5.00</td>
      </tr>
    </tbody>
  </table>
</body></html>"#
}

/// The same station appearing twice (upstream rendering glitch observed in
/// the wild). The first occurrence wins; the second is counted as skipped.
pub(crate) fn fixture_duplicate_station() -> &'static str {
    r#"<html><body>
  <div class="search-time">2024-08-10 14:30</div>
  <table class="table-type1">
    <tbody>
      <tr>
        <th scope="row">San Mateo</th>
        <td>12.10</td><td>12.08</td><td>12.02</td>
        <td>15.00</td><td>15.70</td><td>16.50</td>
      </tr>
      <tr>
        <th scope="row">San  Mateo</th>
        <td>12.20</td><td>12.10</td><td>12.08</td>
        <td>15.00</td><td>15.70</td><td>16.50</td>
      </tr>
    </tbody>
  </table>
</body></html>"#
}

/// Document without the search-time block; readings must fall back to the
/// caller-supplied render time.
pub(crate) fn fixture_no_search_time() -> &'static str {
    r#"<html><body>
  <table class="table-type1">
    <tbody>
      <tr>
        <th scope="row">Marikina Bridge</th>
        <td>14.10</td><td>14.05</td><td>13.98</td>
        <td>15.00</td><td>15.70</td><td>16.00</td>
      </tr>
    </tbody>
  </table>
</body></html>"#
}

/// Partially rendered page: chrome loaded but the page script never
/// populated the table. Extraction must report TableMissing.
pub(crate) fn fixture_table_missing() -> &'static str {
    r#"<html><body>
  <div class="content">
    <div class="loading-spinner">Loading observation data...</div>
  </div>
</body></html>"#
}

/// Table rendered with an empty tbody — structure intact, zero stations.
/// Distinguished from TableMissing by the confidence flag.
pub(crate) fn fixture_table_empty() -> &'static str {
    r#"<html><body>
  <div class="search-time">2024-08-10 14:30</div>
  <table class="table-type1">
    <thead>
      <tr>
        <th>Station</th><th>Water Level</th><th>30min ago</th><th>1hr ago</th>
        <th>Alert</th><th>Alarm</th><th>Critical</th>
      </tr>
    </thead>
    <tbody></tbody>
  </table>
</body></html>"#
}
