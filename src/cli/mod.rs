//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CliOverrides;

pub mod commands;

/// Issue tracker backend (`SQLite` + REST API)
#[derive(Parser, Debug)]
#[command(name = "bugboard", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to ./bugboard.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Project config file (defaults to ./bugboard.yaml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors, unless --json)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),

    /// Show dashboard statistics for a project
    Stats(StatsArgs),

    /// Load the sample dataset
    Seed(SeedArgs),

    /// List projects with issue counts
    Projects,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Disable permissive CORS
    #[arg(long)]
    pub no_cors: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    /// Project ID
    pub project_id: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SeedArgs {
    /// Replace existing data
    #[arg(long)]
    pub force: bool,
}

/// How a command writes its result to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text
    Text,
    /// JSON only
    Json,
    /// Nothing on success
    Quiet,
}

impl OutputMode {
    #[must_use]
    pub const fn from_flags(json: bool, quiet: bool) -> Self {
        if json {
            Self::Json
        } else if quiet {
            Self::Quiet
        } else {
            Self::Text
        }
    }
}

impl Cli {
    #[must_use]
    pub const fn output_mode(&self) -> OutputMode {
        OutputMode::from_flags(self.json, self.quiet)
    }

    /// Collect the flags that override configuration.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            db: self.db.clone(),
            lock_timeout: self.lock_timeout,
            ..CliOverrides::default()
        };

        if let Commands::Serve(args) = &self.command {
            overrides.host.clone_from(&args.host);
            overrides.port = args.port;
            if args.no_cors {
                overrides.cors = Some(false);
            }
        }

        overrides
    }
}
