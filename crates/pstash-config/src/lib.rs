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
#![allow(clippy::module_name_repetitions)]

//! Configuration for the pstore crash-log transfer.
//!
//! Layout: `defaults.rs` (fixed paths and sizes), `model.rs` (typed config
//! models), `loader.rs` (YAML file and environment overrides), `validate.rs`
//! (validation helpers).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ENV_BUFFER_SIZE, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_LOG_PATH, ENV_SOURCE_DIR};
pub use model::{LogFormatSetting, PstashConfig, TransferPaths};
