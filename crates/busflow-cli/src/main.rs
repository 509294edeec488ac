//! `busflow-cli` – command line entry point.
//!
//! `busflow run` loads and validates the configuration, simulates one
//! service day and writes every stop event as a JSON line (to `--output` or
//! stdout).  `busflow init-config` writes the default configuration so it
//! can be edited.
//!
//! Logs go to stderr so stdout stays a clean event stream.  `RUST_LOG`
//! selects the level (default `info`); `BUSFLOW_LOG_FORMAT=json` switches to
//! newline-delimited JSON logs.

mod config;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use busflow_sim::{DaySummary, JsonLinesRecorder, ServiceDay, SimRng, SimulationConfig};
use busflow_types::BusflowError;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "busflow", version, about = "Synthetic passenger-flow and occupancy simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate one service day and write the stop events as JSON lines.
    Run {
        /// Configuration file (defaults to ~/.busflow/config.toml if present).
        #[arg(long, env = "BUSFLOW_CONFIG")]
        config: Option<PathBuf>,
        /// Override the configured random seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Write events here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Write the default configuration as TOML.
    InitConfig {
        /// Destination (defaults to ~/.busflow/config.toml).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            config,
            seed,
            output,
        } => run(config, seed, output),
        Command::InitConfig { path, force } => init_config(path, force),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "busflow failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

fn init_logging() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("BUSFLOW_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .init();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommands
// ─────────────────────────────────────────────────────────────────────────────

fn run(
    config_path: Option<PathBuf>,
    seed: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), BusflowError> {
    let mut cfg = config::resolve(config_path.as_deref())?;
    if let Some(seed) = seed {
        cfg.seed = seed;
    }
    info!(seed = cfg.seed, capacity = cfg.capacity, "configuration resolved");

    let day = ServiceDay::new(cfg)?;

    let sink: Box<dyn Write> = match &output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                BusflowError::Io(format!("failed to create {}: {}", path.display(), e))
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut recorder = JsonLinesRecorder::new(sink);
    let mut rng = SimRng::from_seed_u64(day.config().seed);

    let summary = day.run(&mut rng, &mut recorder)?;
    print_summary(day.config(), &summary, output.as_ref());
    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<(), BusflowError> {
    let path = path.unwrap_or_else(config::config_path);
    config::save_to(&SimulationConfig::default(), &path, force)?;
    eprintln!(
        "  {} Config written to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    Ok(())
}

fn print_summary(cfg: &SimulationConfig, summary: &DaySummary, output: Option<&PathBuf>) {
    eprintln!();
    eprintln!("  {} {}", cfg.vehicle_id.bold(), cfg.service_date.to_string().dimmed());
    eprintln!("  Trips:           {}", summary.trips);
    eprintln!("  Stop events:     {}", summary.events);
    let alerts = summary.alerts.to_string();
    eprintln!(
        "  Overcrowding:    {}",
        if summary.alerts > 0 { alerts.red().bold() } else { alerts.green() }
    );
    eprintln!("  Peak validated:  {}/{}", summary.peak_validated, cfg.capacity);
    if let Some(path) = output {
        eprintln!("  Events written to {}", path.display().to_string().bold());
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_overrides() {
        let cli = Cli::try_parse_from(["busflow", "run", "--seed", "9", "-o", "day.jsonl"]).unwrap();
        match cli.command {
            Command::Run { seed, output, .. } => {
                assert_eq!(seed, Some(9));
                assert_eq!(output, Some(PathBuf::from("day.jsonl")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_init_config() {
        let cli = Cli::try_parse_from(["busflow", "init-config", "--force"]).unwrap();
        assert!(matches!(cli.command, Command::InitConfig { force: true, path: None }));
    }

    #[test]
    fn run_writes_events_to_output_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg_path = dir.path().join("config.toml");
        let out_path = dir.path().join("events.jsonl");
        let cfg = SimulationConfig {
            start_hour: 6,
            end_hour: 7,
            ..Default::default()
        };
        config::save_to(&cfg, &cfg_path, false).unwrap();

        run(Some(cfg_path), Some(11), Some(out_path.clone())).unwrap();

        let written = std::fs::read_to_string(&out_path).unwrap();
        assert!(written.lines().count() >= 12);
        assert!(written.lines().all(|l| l.contains("\"vehicle_id\"")));
    }

    #[test]
    fn run_rejects_invalid_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(&cfg_path, "capacity = 0\n").unwrap();
        let err = run(Some(cfg_path), None, Some(dir.path().join("out.jsonl"))).unwrap_err();
        assert!(matches!(err, BusflowError::InvalidConfig(_)));
    }
}
