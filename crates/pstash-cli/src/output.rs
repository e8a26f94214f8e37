//! Output renderers for command results.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::{DateTime, SecondsFormat, Utc};
use pstash_engine::TransferReport;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

/// Result of one `pstash transfer` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TransferSummary {
    pub(crate) source_dir: PathBuf,
    pub(crate) log_path: PathBuf,
    pub(crate) entries_seen: u64,
    pub(crate) files_copied: u64,
    pub(crate) entries_skipped: u64,
    pub(crate) bytes_appended: u64,
}

impl TransferSummary {
    pub(crate) fn new(source_dir: PathBuf, log_path: PathBuf, report: TransferReport) -> Self {
        Self {
            source_dir,
            log_path,
            entries_seen: report.entries_seen,
            files_copied: report.files_copied,
            entries_skipped: report.entries_skipped,
            bytes_appended: report.bytes_appended,
        }
    }
}

/// State of the panic log as seen by `pstash check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CheckReport {
    pub(crate) log_path: PathBuf,
    pub(crate) exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) modified: Option<DateTime<Utc>>,
    pub(crate) removed: bool,
}

fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn render_transfer(
    summary: &TransferSummary,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(summary),
        OutputFormat::Table => Ok(format!(
            "source: {}\nlog: {}\ncopied: {} of {} entries ({} skipped)\nappended: {}",
            summary.source_dir.display(),
            summary.log_path.display(),
            summary.files_copied,
            summary.entries_seen,
            summary.entries_skipped,
            format_bytes(summary.bytes_appended)
        )),
    }
}

pub(crate) fn render_check(report: &CheckReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Table => {
            let mut text = format!("log: {}\n", report.log_path.display());
            if report.exists {
                text.push_str("status: previous boot panicked");
            } else {
                text.push_str("status: clean");
            }
            if let Some(size) = report.size_bytes {
                let _ = write!(text, "\nsize: {}", format_bytes(size));
            }
            if let Some(modified) = report.modified {
                let _ = write!(
                    text,
                    "\nmodified: {}",
                    modified.to_rfc3339_opts(SecondsFormat::Secs, true)
                );
            }
            if report.removed {
                text.push_str("\nremoved: yes");
            }
            Ok(text)
        }
    }
}

#[must_use]
pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut whole = bytes;
    let mut unit = 0;
    while whole >= 1024 * 1024 && unit + 1 < UNITS.len() {
        whole /= 1024;
        unit += 1;
    }
    // Two decimals from integer arithmetic.
    let hundredths = whole * 100 / 1024;
    format!("{}.{:02} {}", hundredths / 100, hundredths % 100, UNITS[unit])
}
