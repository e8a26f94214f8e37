//! Registration glue that hooks the transfer into the fault chain.

use std::sync::Arc;

use pstash_config::{PstashConfig, TransferPaths};
use tracing::{error, info, warn};

use crate::notifier::{FaultEvent, FaultNotifier, HandlerId, NotifyAction};
use crate::store::{LocalStore, RecordStore};
use crate::transfer::PstoreTransfer;

/// Handler priority used unless overridden.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Settings for the registered fault handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Paths and buffer size for the transfer.
    pub paths: TransferPaths,
    /// Line logged at error level before the transfer runs.
    pub panic_marker: Option<String>,
    /// Position in the fault chain; higher runs earlier.
    pub priority: i32,
}

impl LoggerOptions {
    /// Options with no marker at the default priority.
    #[must_use]
    pub const fn new(paths: TransferPaths) -> Self {
        Self {
            paths,
            panic_marker: None,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl From<&PstashConfig> for LoggerOptions {
    fn from(config: &PstashConfig) -> Self {
        Self {
            paths: config.transfer_paths(),
            panic_marker: config.panic_marker.clone(),
            priority: DEFAULT_PRIORITY,
        }
    }
}

/// A registered crash-record handler; unregisters when dropped.
#[derive(Debug)]
pub struct PstoreLogger {
    notifier: FaultNotifier,
    id: Option<HandlerId>,
}

impl PstoreLogger {
    /// Register a handler that copies local pstore records on fault.
    #[must_use]
    pub fn register(notifier: &FaultNotifier, options: LoggerOptions) -> Self {
        Self::register_with_store(notifier, options, LocalStore)
    }

    /// Register a handler that transfers through `store`.
    #[must_use]
    pub fn register_with_store<S>(
        notifier: &FaultNotifier,
        options: LoggerOptions,
        store: S,
    ) -> Self
    where
        S: RecordStore + Send + Sync + 'static,
    {
        info!(
            source_dir = %options.paths.source_dir.display(),
            log_path = %options.paths.log_path.display(),
            priority = options.priority,
            "registering panic log handler"
        );
        let LoggerOptions {
            paths,
            panic_marker,
            priority,
        } = options;
        let transfer = Arc::new(PstoreTransfer::with_store(paths, store));
        let id = notifier.register(priority, move |event| {
            handle_fault(&transfer, panic_marker.as_deref(), event)
        });
        Self {
            notifier: notifier.clone(),
            id: Some(id),
        }
    }

    /// Whether the handler is still subscribed.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.id.is_some()
    }

    /// Remove the handler from the chain.
    pub fn unregister(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(id) = self.id.take() {
            info!("unregistering panic log handler");
            self.notifier.unregister(id);
        }
    }
}

impl Drop for PstoreLogger {
    fn drop(&mut self) {
        self.detach();
    }
}

fn handle_fault<S: RecordStore>(
    transfer: &PstoreTransfer<S>,
    panic_marker: Option<&str>,
    event: &FaultEvent,
) -> NotifyAction {
    error!(
        message = %event.message,
        location = event.location.as_deref().unwrap_or("unknown"),
        "fault occurred; writing logs to persistent storage"
    );
    if let Some(marker) = panic_marker {
        error!("{marker}");
    }
    let status = transfer.run_status();
    if status == 0 {
        info!("crash records persisted");
    } else {
        warn!(status, "crash record persistence failed");
    }
    NotifyAction::Continue
}
