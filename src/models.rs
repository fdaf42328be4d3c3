//! Data models shared by the pipeline, the store and the HTTP API.
//!
//! - [`SearchResults`]: the normalized pair produced by a search
//! - [`ComparisonRecord`]: a persisted comparison
//!
//! Field names serialize in camelCase to match the JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized content for one topic from both sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// The topic as typed, trimmed.
    pub term: String,
    /// Article body from Grokipedia with absolute links and images.
    pub grokipedia_html: String,
    /// Plain-text extract from Wikipedia.
    pub wikipedia_text: String,
}

/// A saved comparison. Records are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    /// Assigned by the store; never reused.
    pub id: i64,
    pub term: String,
    pub grokipedia_html: String,
    pub wikipedia_text: String,
    /// Markdown analysis returned by Gemini.
    #[serde(rename = "geminiComparison")]
    pub analysis: String,
    /// Creation instant; the sort key for listings.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_api_field_names() {
        let record = ComparisonRecord {
            id: 3,
            term: "Ada Lovelace".to_string(),
            grokipedia_html: "<p>Ada</p>".to_string(),
            wikipedia_text: "Ada".to_string(),
            analysis: "# Analysis".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2025-05-06T20:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["grokipediaHtml"], "<p>Ada</p>");
        assert_eq!(json["wikipediaText"], "Ada");
        assert_eq!(json["geminiComparison"], "# Analysis");
        assert!(json["timestamp"].as_str().unwrap().starts_with("2025-05-06T20:30:00"));
    }

    #[test]
    fn test_search_results_deserialization() {
        let json = r#"{
            "term": "Ada",
            "grokipediaHtml": "<p>x</p>",
            "wikipediaText": "y"
        }"#;

        let results: SearchResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.term, "Ada");
        assert_eq!(results.grokipedia_html, "<p>x</p>");
        assert_eq!(results.wikipedia_text, "y");
    }
}
