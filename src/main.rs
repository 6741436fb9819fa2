//! graceful-run - diagnostic front end for the graceful-run library
//!
//! `probe` runs a ticking unit of work under the cancellable runner so that
//! signal delivery into a host or container can be checked end to end.
//! `env check` validates required environment variables the way a service
//! would at startup.

mod cli;
mod config;
mod logging;
mod probe;
mod version;

use clap::Parser;
use tracing::info;

use graceful_run::error::{Error, Result};
use graceful_run::{CancellableRunner, EnvRequirements};

use crate::cli::{Cli, Commands, ConfigSubcommand, EnvSubcommand};
use crate::config::AppConfig;
use crate::probe::Probe;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            print!("{}", version::BuildInfo::current());
            Ok(())
        }
        Commands::Config { subcommand } => {
            logging::init_simple(logging::cli_level(cli.verbose, cli.quiet))?;
            handle_config_command(subcommand)
        }
        Commands::Env {
            subcommand: EnvSubcommand::Check { keys },
        } => {
            logging::init_simple(logging::cli_level(cli.verbose, cli.quiet))?;
            check_env(&keys)
        }
        Commands::Probe {
            config,
            duration_ms,
            tick_ms,
            ignore_cancel,
            fail,
        } => {
            let mut config = AppConfig::load(config.as_deref())?;

            // CLI flags take precedence over file and environment
            if let Some(ms) = duration_ms {
                config.probe.duration_ms = ms;
            }
            if let Some(ms) = tick_ms {
                config.probe.tick_ms = ms;
            }
            if ignore_cancel {
                config.probe.ignore_cancel = true;
            }
            config.validate()?;

            // Held until the probe finishes so the file writer flushes
            let _log_guard = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

            let build = version::BuildInfo::current();
            info!(
                version = %build.full_version(),
                target = %build.target,
                "Starting graceful-run probe"
            );

            run_probe(Probe::from_settings(&config.probe).failing(fail))
        }
    }
}

/// Run the probe under the cancellable runner on a fresh runtime
fn run_probe(probe: Probe) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(num_cpus::get().clamp(1, 4))
        .thread_name("graceful-run")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    let report = runtime.block_on(async {
        CancellableRunner::new()
            .run(move |token| {
                // Printed once the signal listener is registered
                println!("probe running");
                probe.execute(token)
            })
            .await
    })?;

    println!(
        "probe finished: {} ticks in {:.2}s",
        report.ticks,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

/// Verify that every key is present, naming all missing ones at once
fn check_env(keys: &[String]) -> Result<()> {
    let required = EnvRequirements::new().require_all(keys.iter().cloned()).load()?;

    for key in keys {
        let state = match required.get(key) {
            Some("") => "set (empty)",
            _ => "set",
        };
        println!("{}: {}", key, state);
    }
    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = AppConfig::load(config.as_deref())?;
            cfg.validate()?;
            print!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            AppConfig::load(config.as_deref())?.validate()?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
