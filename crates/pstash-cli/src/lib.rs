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
#![allow(clippy::redundant_pub_crate, clippy::multiple_crate_versions)]

//! Operator CLI for moving crash records into the panic log and checking for
//! a previous boot's crash.
//!
//! Layout:
//! - `cli.rs`: argument parsing, configuration and dispatch
//! - `commands.rs`: `transfer` and `check` handlers
//! - `error.rs`: CLI error type and exit codes
//! - `output.rs`: table and JSON renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod error;
pub(crate) mod output;

pub use cli::run;
