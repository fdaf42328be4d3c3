//! Small helpers for logging and filesystem checks.

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes on a character boundary and
/// suffixed with `"…(+N bytes)"`.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Make sure the directory that will hold the database exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Arguments
///
/// * `db_path` - Path of the SQLite file; a bare file name means the
///   current directory
///
/// # Returns
///
/// `Ok(())` when the directory exists and accepts new files.
#[instrument(level = "info", skip_all, fields(path = %db_path.display()))]
pub async fn ensure_database_dir(db_path: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match db_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe_path = dir.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(dir = %dir.display(), "Database directory is writable");
    Ok(())
}
