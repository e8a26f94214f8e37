//! Default paths and sizes for the crash-log transfer.
//!
//! # Design
//! - Centralize the platform paths so the engine never hard-codes them.
//! - Keep size bounds next to the defaults they constrain.

/// Directory the platform populates with crash records.
pub const SOURCE_DIR: &str = "/sys/fs/pstore";
/// Durable log that accumulates crash records across restarts.
pub const LOG_PATH: &str = "/var/log/panic.log";
/// Size of the shared transfer buffer (one page).
pub const BUFFER_SIZE: usize = 4096;
/// Smallest accepted transfer buffer.
pub const MIN_BUFFER_SIZE: usize = 512;
/// Largest accepted transfer buffer.
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;
/// Default log level when neither the file nor the environment set one.
pub const LOG_LEVEL: &str = "info";
