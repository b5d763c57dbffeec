//! Diagnostics helpers.
//!
//! - **About info**: build identity plus where logs and the store config live
//! - **Log location**: directory used by the rolling file appender
//! - **Log rotation**: prunes old daily log files before logging starts

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of daily log files to retain.
pub const MAX_LOG_FILES: usize = 10;

/// Prefix of the rolling log files (`receipts.2026-03-01`).
pub const LOG_FILE_PREFIX: &str = "receipts";

/// Overrides the log directory when set and non-empty.
pub const LOG_DIR_ENV: &str = "CAFE_RECEIPTS_LOG_DIR";

const APP_DIR_NAME: &str = "com.cafe.receipts";

// ---------------------------------------------------------------------------
// About info
// ---------------------------------------------------------------------------

/// Summary printed by `cafe-receipts about`.
pub fn about_info(log_dir: &Path, config_path: &Path) -> Value {
    json!({
        "version": version_line(),
        "platform": format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        "logDir": log_dir.display().to_string(),
        "retainedLogFiles": MAX_LOG_FILES,
        "config": config_path.display().to_string(),
        "configPresent": config_path.is_file(),
    })
}

/// One-line version string for `--version` and the startup log line.
pub fn version_line() -> String {
    format!(
        "{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_SHA"),
        env!("BUILD_TIMESTAMP")
    )
}

// ---------------------------------------------------------------------------
// Log rotation
// ---------------------------------------------------------------------------

/// Returns the log directory path (same location used by `init_logging`).
pub fn get_log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    let base = std::env::var("LOCALAPPDATA")
        .or_else(|_| std::env::var("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            {
                PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| ".".into()))
                    .join("AppData")
                    .join("Local")
            }
            #[cfg(not(target_os = "windows"))]
            {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                    .join(".local")
                    .join("share")
            }
        });
    base.join(APP_DIR_NAME).join("logs")
}

/// Keep only the `keep` most recent log files in `log_dir`; returns how many
/// were removed. Files not produced by the appender are left alone.
pub fn prune_logs_in(log_dir: &Path, keep: usize) -> usize {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return 0;
    };

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let name = path.file_name()?.to_str()?;
            let is_log = name == LOG_FILE_PREFIX
                || name.starts_with(&format!("{LOG_FILE_PREFIX}."));
            if !is_log || !path.is_file() {
                return None;
            }
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(std::time::UNIX_EPOCH);
            Some((path, modified))
        })
        .collect();

    // Newest first; daily names break ties
    log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to prune log file {}: {e}", path.display()),
        }
    }
    removed
}
