//! Command-line interface: argument parsing, exit codes, error rendering.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use depstrap_core::Error;
use miette::Report;

/// Successful run exit code.
pub const EXIT_OK: i32 = 0;
/// Configuration error exit code.
pub const EXIT_CONFIG: i32 = 2;
/// Resolution, transport, or any other runtime failure exit code.
pub const EXIT_FAILURE: i32 = 3;

/// Main CLI entry point for depstrap.
#[derive(Parser, Debug)]
#[command(name = "depstrap")]
#[command(about = "Provision platform-specific binary dependencies for orchestrated processes")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute; `setup` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the orchestrator configuration file.
    #[arg(
        short = 'c',
        long,
        global = true,
        default_value = "orchestrator.json5",
        help = "Path to the orchestrator configuration file"
    )]
    pub config: PathBuf,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        default_value = "info",
        value_enum,
        help = "Set logging level"
    )]
    pub level: LogLevel,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch all declared dependencies and publish the resolved config.
    #[command(about = "Fetch all declared dependencies and publish the resolved config")]
    Setup,
}

/// Logging verbosity, mapped onto a tracing directive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warn,
    /// Informational output (the default).
    #[default]
    Info,
    /// Debug detail.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// The tracing directive string for this level.
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_directive())
    }
}

/// Parse command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Map a run error to its exit code: configuration problems are `2`,
/// everything else is `3`.
#[must_use]
pub const fn exit_code_for(err: &Error) -> i32 {
    match err {
        Error::Configuration { .. } => EXIT_CONFIG,
        Error::Resolution { .. }
        | Error::UnsupportedPlatform { .. }
        | Error::Transport { .. }
        | Error::Extraction { .. }
        | Error::StateCorrupt { .. }
        | Error::Io { .. } => EXIT_FAILURE,
    }
}

/// Render an error for humans via miette.
pub fn render_error(err: Error) {
    let report = Report::new(err);
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}
