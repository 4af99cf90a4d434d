use clap::Parser;
use colored::*;
use std::process;
use taxodiff::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // TAXODIFF_LOG wins; otherwise -v/-vv raise the default level.
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_level = std::env::var("TAXODIFF_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<taxodiff::TaxodiffError>() {
            Some(taxodiff::TaxodiffError::Config(_)) => 2,
            Some(taxodiff::TaxodiffError::Io(_)) => 3,
            Some(taxodiff::TaxodiffError::Csv(_))
            | Some(taxodiff::TaxodiffError::Parse(_))
            | Some(taxodiff::TaxodiffError::MissingColumn { .. }) => 4,
            Some(taxodiff::TaxodiffError::Download(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Compare(args) => taxodiff::cli::commands::compare::run(args),
        Commands::Generate(args) => taxodiff::cli::commands::generate::run(args),
        Commands::Filter(args) => taxodiff::cli::commands::filter::run(args),
        Commands::Download(args) => taxodiff::cli::commands::download::run(args),
    }
}
