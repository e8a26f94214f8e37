//! Handlers for `pstash transfer` and `pstash check`.

use std::fs;
use std::io;

use anyhow::Context;
use chrono::{DateTime, Utc};
use pstash_config::PstashConfig;
use pstash_engine::transfer_pstore;
use tracing::{info, warn};

use crate::cli::{CheckArgs, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output::{CheckReport, TransferSummary, render_check, render_transfer};

pub(crate) fn handle_transfer(config: &PstashConfig, output: OutputFormat) -> CliResult<String> {
    let paths = config.transfer_paths();
    match transfer_pstore(&paths) {
        Ok(report) => {
            let summary = TransferSummary::new(paths.source_dir, paths.log_path, report);
            render_transfer(&summary, output)
        }
        Err(err) => {
            let context = format!("pstore transfer failed (status {})", err.status_code());
            Err(CliError::failure(anyhow::Error::new(err).context(context)))
        }
    }
}

pub(crate) fn handle_check(
    config: &PstashConfig,
    args: &CheckArgs,
    output: OutputFormat,
) -> CliResult<String> {
    let log_path = &config.log_path;
    let metadata = match fs::metadata(log_path) {
        Ok(metadata) => Some(metadata),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(CliError::failure(
                anyhow::Error::new(err)
                    .context(format!("failed to inspect {}", log_path.display())),
            ));
        }
    };

    let mut report = CheckReport {
        log_path: log_path.clone(),
        exists: metadata.is_some(),
        size_bytes: metadata.as_ref().map(fs::Metadata::len),
        modified: metadata
            .as_ref()
            .and_then(|metadata| metadata.modified().ok())
            .map(DateTime::<Utc>::from),
        removed: false,
    };

    if report.exists {
        warn!(
            log_path = %log_path.display(),
            size = report.size_bytes.unwrap_or_default(),
            "previous boot left a panic log"
        );
        if args.remove {
            fs::remove_file(log_path)
                .with_context(|| format!("failed to remove {}", log_path.display()))
                .map_err(CliError::failure)?;
            info!(log_path = %log_path.display(), "removed panic log");
            report.removed = true;
        }
    } else {
        info!(log_path = %log_path.display(), "no panic log from a previous boot");
    }

    render_check(&report, output)
}
