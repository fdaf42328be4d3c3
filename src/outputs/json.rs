//! JSON rendering of comparison records.
//!
//! Uses the same camelCase field names as the HTTP API, so output from
//! `list --json` can be fed to anything that already consumes the API.

use crate::models::ComparisonRecord;

/// Serialize one record as pretty-printed JSON.
///
/// # Arguments
///
/// * `record` - The saved comparison to render
///
/// # Returns
///
/// The JSON text, with the analysis under `geminiComparison` and the
/// timestamp in RFC 3339.
pub fn record_to_json(record: &ComparisonRecord) -> serde_json::Result<String> {
    serde_json::to_string_pretty(record)
}

/// Serialize a listing as a pretty-printed JSON array, keeping the given order.
pub fn records_to_json(records: &[ComparisonRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}
