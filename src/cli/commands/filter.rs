use clap::{Args, Subcommand};
use colored::*;
use std::path::PathBuf;

use crate::core::accepted::{
    load_accepted_tids, select_accepted_authority, select_accepted_repository,
};
use crate::core::config::load_config;
use crate::core::table::{read_rows, write_rows};
use crate::TaxodiffError;

#[derive(Args)]
pub struct FilterArgs {
    #[command(subcommand)]
    pub command: FilterCommand,
}

#[derive(Subcommand)]
pub enum FilterCommand {
    /// Keep authority rows that are their own accepted taxon, collapsing
    /// SPP-coded rows onto their SP sibling
    Authority {
        /// Input authority taxonomy CSV
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Output CSV for the accepted rows
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Keep repository rows whose tid is self-accepted in the status table
    Repository {
        /// Input repository taxonomy CSV
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Taxonomic-status CSV (tid, tidaccepted)
        #[arg(long = "tax-status", value_name = "PATH")]
        tax_status: PathBuf,

        /// Output CSV for the accepted rows
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
    },
}

pub fn run(args: FilterArgs) -> anyhow::Result<()> {
    let config = load_config("taxodiff.toml").unwrap_or_default();

    match args.command {
        FilterCommand::Authority { input, output } => {
            let (fields, rows) = read_rows(&input)?;
            for column in [
                &config.authority.id_column,
                &config.authority.accepted_id_column,
            ] {
                if !fields.iter().any(|f| f == column) {
                    anyhow::bail!(TaxodiffError::MissingColumn {
                        column: column.clone(),
                        path: input.display().to_string(),
                    });
                }
            }

            let (selected, stats) = select_accepted_authority(
                &rows,
                &config.authority.id_column,
                &config.authority.accepted_id_column,
            );
            write_rows(&output, &fields, &selected)?;

            println!(
                "{} {} of {} rows kept after the accepted filter",
                "✓".green().bold(),
                stats.selected,
                stats.processed
            );
            println!("  Output: {}", output.display());
        }

        FilterCommand::Repository {
            input,
            tax_status,
            output,
        } => {
            let accepted = load_accepted_tids(&tax_status)?;
            if accepted.is_empty() {
                eprintln!(
                    "{} no self-accepted tids in {}; output will be empty",
                    "⚠".yellow().bold(),
                    tax_status.display()
                );
            }

            let (fields, rows) = read_rows(&input)?;
            let tid_column = &config.repository.id_column;
            if !fields.iter().any(|f| f == tid_column) {
                anyhow::bail!(TaxodiffError::MissingColumn {
                    column: tid_column.clone(),
                    path: input.display().to_string(),
                });
            }

            let (selected, stats) = select_accepted_repository(&rows, tid_column, &accepted);
            write_rows(&output, &fields, &selected)?;

            println!(
                "{} {} of {} rows kept after the accepted filter",
                "✓".green().bold(),
                stats.selected,
                stats.processed
            );
            println!("  Output: {}", output.display());
        }
    }

    Ok(())
}
