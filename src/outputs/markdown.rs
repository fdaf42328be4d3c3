//! Markdown rendering of comparison records.

use crate::models::ComparisonRecord;
use crate::normalizer::strip_markup;
use std::fmt::Write;

/// Full report for one record: analysis first, then both sources.
///
/// The stored Grokipedia markup is reduced to its text so the report reads
/// cleanly in a terminal.
///
/// # Arguments
///
/// * `record` - The saved comparison to render
///
/// # Returns
///
/// A Markdown document headed by the term, with `## Analysis`,
/// `## Grokipedia` and `## Wikipedia` sections in that order.
pub fn record_to_markdown(record: &ComparisonRecord) -> String {
    let mut md = String::new();
    writeln!(md, "# {}\n", record.term).unwrap();
    writeln!(
        md,
        "<small>Comparison #{} saved {}</small>\n",
        record.id,
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    )
    .unwrap();
    writeln!(md, "## Analysis\n\n{}\n", record.analysis.trim_end()).unwrap();
    writeln!(md, "## Grokipedia\n\n{}\n", strip_markup(&record.grokipedia_html).trim()).unwrap();
    writeln!(md, "## Wikipedia\n\n{}", record.wikipedia_text.trim()).unwrap();
    md
}

/// One line per record, newest first as given.
pub fn records_to_markdown(records: &[ComparisonRecord]) -> String {
    if records.is_empty() {
        return "No saved comparisons yet.\n".to_string();
    }
    let mut md = String::from("# Saved comparisons\n\n");
    for record in records {
        writeln!(
            md,
            "- **#{}** {} <small>`{}`</small>",
            record.id,
            record.term,
            record.timestamp.format("%Y-%m-%d %H:%M")
        )
        .unwrap();
    }
    md
}
