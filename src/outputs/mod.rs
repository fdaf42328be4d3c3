//! Rendering of saved comparisons for the terminal.
//!
//! - [`markdown`]: human-readable report of one record, or a listing
//! - [`json`]: the same records as pretty-printed JSON

pub mod json;
pub mod markdown;
