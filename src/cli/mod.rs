pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "taxodiff",
    version,
    about = "Lineage-edge reconciliation for paired biological taxonomy feeds",
    long_about = "Taxodiff reconciles a canonical authority taxonomy feed with a taxonomy \
                  derived from a secondary reference repository: it materializes each \
                  dataset's rank lineage as parent-child edges, measures edge-set overlap, \
                  and emits comparison artifacts per taxon group."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare authority and repository taxonomies for one or more groups
    Compare(commands::compare::CompareArgs),

    /// Generate the repository-side taxonomy file for a group
    Generate(commands::generate::GenerateArgs),

    /// Select accepted rows from a taxonomy file
    Filter(commands::filter::FilterArgs),

    /// Download a group's taxonomy from the authority API
    Download(commands::download::DownloadArgs),
}
