#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Crash-record persistence: copies the platform's pstore entries into an
//! append-only log when a fatal fault is reported.
//!
//! Layout: `store.rs` (filesystem seam), `copier.rs` (buffered stream copy),
//! `visitor.rs` (per-entry filtering and copy), `transfer.rs` (orchestration),
//! `notifier.rs` (fault notification chain), `logger.rs` (hook registration),
//! `stack_trace.rs` (call-stack ring buffer).

pub mod copier;
pub mod error;
pub mod logger;
pub mod notifier;
pub mod stack_trace;
pub mod store;
pub mod transfer;
pub mod visitor;

pub use copier::copy_stream;
pub use error::{TransferError, TransferResult};
pub use logger::{LoggerOptions, PstoreLogger};
pub use notifier::{FaultEvent, FaultNotifier, HandlerId, NotifyAction, install_panic_hook};
pub use stack_trace::{MAX_FRAMES, StackRecord, StackTracer};
pub use store::{DirEntryRecord, EntryKind, LocalStore, RecordStore};
pub use transfer::{PstoreTransfer, TransferReport, transfer_pstore, write_panic_log};
pub use visitor::{EntryVisitor, VisitOutcome};
