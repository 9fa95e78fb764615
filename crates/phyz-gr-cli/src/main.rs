//! # phyz-gr CLI entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use phyz_gr_cli::commands::{Command, run};
use phyz_gr_cli::config::Config;
use phyz_gr_cli::exit_code;

/// Symbolic general relativity toolkit.
#[derive(Parser, Debug)]
#[command(name = "phyz-gr", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to ./phyz-gr.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(1);
        }
    };
    init_tracing(&config.log_level, cli.log_format);
    tracing::debug!(?config, "configuration loaded");

    let result = run(&cli.command, &config).and_then(|value| {
        let text = serde_json::to_string_pretty(&value)?;
        println!("{text}");
        Ok(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
