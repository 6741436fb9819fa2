//! CLI argument parsing using clap v4

use clap::{Parser, Subcommand};

/// graceful-run - run work to completion, cancel it cleanly on SIGINT/SIGTERM
///
/// Diagnostic front end for the graceful-run library: probe how the process
/// reacts to termination signals and verify required environment variables.
#[derive(Parser, Debug)]
#[command(name = "graceful-run")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the probe until it finishes or a termination signal cancels it
    Probe {
        /// Path to configuration file
        #[arg(short, long, env = "GRACEFUL_RUN_CONFIG")]
        config: Option<String>,

        /// Probe duration in milliseconds (0 = until cancelled)
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Interval between progress ticks in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Keep working after cancellation (exercises the grace timeout)
        #[arg(long)]
        ignore_cancel: bool,

        /// Finish with an error instead of success
        #[arg(long)]
        fail: bool,
    },

    /// Required environment variable checks
    Env {
        #[command(subcommand)]
        subcommand: EnvSubcommand,
    },

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Environment subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum EnvSubcommand {
    /// Verify that every KEY is set (values are never printed)
    Check {
        /// Variable names
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}
