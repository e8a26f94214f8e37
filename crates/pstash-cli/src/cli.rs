//! Argument parsing, configuration resolution and command dispatch.

use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pstash_config::{ConfigError, LogFormatSetting, PstashConfig};
use pstash_telemetry::{LogFormat, LoggingConfig, init_logging};

use crate::commands::{handle_check, handle_transfer};
use crate::error::{CliError, CliResult};

/// Environment variable naming the configuration file.
const ENV_CONFIG: &str = "PSTASH_CONFIG";

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn execute(cli: Cli) -> CliResult<()> {
    let config = resolve_config(&cli.global, |key| env::var(key).ok())?;
    install_logging(&config)?;
    dispatch(cli.command, &config, cli.global.output)
}

fn dispatch(command: Command, config: &PstashConfig, output: OutputFormat) -> CliResult<()> {
    let rendered = match command {
        Command::Transfer => handle_transfer(config, output)?,
        Command::Check(args) => handle_check(config, &args, output)?,
    };
    println!("{rendered}");
    Ok(())
}

#[derive(Parser)]
#[command(
    name = "pstash",
    version,
    about = "Persist crash records from pstore into the panic log"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
pub(crate) struct GlobalArgs {
    #[arg(long, global = true, env = ENV_CONFIG, help = "YAML configuration file")]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, global = true, help = "Directory holding pstore crash records")]
    pub(crate) source_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Append-only panic log")]
    pub(crate) log_path: Option<PathBuf>,
    #[arg(long, global = true, value_enum, help = "Diagnostic log format")]
    pub(crate) log_format: Option<LogFormatArg>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for command results"
    )]
    pub(crate) output: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy every pstore record into the panic log now.
    Transfer,
    /// Report whether a previous boot left a panic log behind.
    Check(CheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct CheckArgs {
    #[arg(long, help = "Delete the panic log after reporting it")]
    pub(crate) remove: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormatArg {
    Json,
    Pretty,
}

impl From<LogFormatArg> for LogFormatSetting {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => Self::Json,
            LogFormatArg::Pretty => Self::Pretty,
        }
    }
}

/// Layer configuration: file, then `PSTASH_*` environment, then flags.
///
/// Validation runs once on the merged result, so a flag may repair a value an
/// earlier layer got wrong.
pub(crate) fn resolve_config<F>(global: &GlobalArgs, lookup: F) -> CliResult<PstashConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let invalid = |err: ConfigError| CliError::validation(describe_config_error(&err));
    let mut config = PstashConfig::layered(global.config.as_deref(), lookup).map_err(invalid)?;
    if let Some(source_dir) = &global.source_dir {
        config.source_dir.clone_from(source_dir);
    }
    if let Some(log_path) = &global.log_path {
        config.log_path.clone_from(log_path);
    }
    if let Some(format) = global.log_format {
        config.log_format = Some(format.into());
    }
    config.validate().map_err(invalid)?;
    Ok(config)
}

fn describe_config_error(err: &ConfigError) -> String {
    match err {
        ConfigError::InvalidField {
            field,
            value: Some(value),
            reason,
        } => format!("invalid configuration: {field} {reason} (got `{value}`)"),
        ConfigError::InvalidField {
            field,
            value: None,
            reason,
        } => format!("invalid configuration: {field} {reason}"),
        ConfigError::Io { path, source } => {
            format!("{err} {}: {source}", path.display())
        }
        ConfigError::Parse { path, source } => {
            format!("{err} {}: {source}", path.display())
        }
    }
}

fn install_logging(config: &PstashConfig) -> CliResult<()> {
    let logging = LoggingConfig {
        level: &config.log_level,
        format: LogFormat::resolve(config.log_format),
        build_sha: option_env!("PSTASH_BUILD_SHA").unwrap_or("dev"),
    };
    init_logging(&logging).map_err(CliError::failure)
}
