use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use decline_eur::config::{EstimatorConfig, CONFIG_ENV};
use decline_eur::{export, ingest, pipeline, report, seed};

#[derive(Parser)]
#[command(name = "decline-eur")]
#[command(about = "Hyperbolic decline-curve EUR estimation per well and operator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate EUR per well and write the result tables
    Estimate {
        #[arg(long)]
        wells: PathBuf,
        #[arg(long)]
        production: PathBuf,
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
        /// Estimator config (TOML); falls back to ./decline_eur.toml
        #[arg(long, env = CONFIG_ENV)]
        config: Option<PathBuf>,
    },
    /// Generate a markdown reserve report
    Report {
        #[arg(long)]
        wells: PathBuf,
        #[arg(long)]
        production: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, env = CONFIG_ENV)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Write a small synthetic well and production dataset
    Seed {
        #[arg(long, default_value = "sample")]
        out_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Estimate {
            wells,
            production,
            out_dir,
            config,
        } => {
            let run = estimate(&wells, &production, config)?;
            print!("{}", report::console_listing(&run));

            let written = export::write_outputs(&run, &out_dir)
                .with_context(|| format!("failed to write results to {}", out_dir.display()))?;
            for path in written {
                info!(path = %path.display(), "Wrote output");
            }
        }
        Commands::Report {
            wells,
            production,
            out,
            config,
            top,
        } => {
            let run = estimate(&wells, &production, config)?;
            let markdown = report::build_report(&run, top);
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Seed { out_dir } => {
            let (wells, production) = seed::write_sample_dataset(&out_dir)?;
            println!(
                "Sample data written to {} and {}.",
                wells.display(),
                production.display()
            );
        }
    }

    Ok(())
}

fn estimate(
    wells: &std::path::Path,
    production: &std::path::Path,
    config: Option<PathBuf>,
) -> anyhow::Result<pipeline::EstimateRun> {
    let config = EstimatorConfig::load(config.as_deref()).context("failed to load config")?;
    let wells = ingest::read_wells(wells)?;
    let production = ingest::read_production(production)?;
    let run = pipeline::run(&wells, production, &config)?;
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn config_flag_falls_back_to_environment() {
        let command = Cli::command();
        for name in ["estimate", "report"] {
            let subcommand = command.find_subcommand(name).unwrap();
            let config = subcommand
                .get_arguments()
                .find(|arg| arg.get_id() == "config")
                .unwrap();
            assert_eq!(config.get_env(), Some(std::ffi::OsStr::new(CONFIG_ENV)));
        }
    }
}
