use clap::Args;
use colored::*;
use std::path::PathBuf;

use crate::core::config::load_config;
use crate::core::forest::{RankUnits, TaxaForest, RANK_UNIT_TABLE_ID_COLUMN, TID_COLUMN};
use crate::core::joiner::{TaxonomyJoiner, MAPPING_CODE_COLUMN, MAPPING_GROUP_COLUMN};
use crate::core::rank::GroupCode;
use crate::core::table::{read_rows, write_rows, CompoundKeyTable, RecordTable};
use crate::utils::progress::create_spinner;
use crate::TaxodiffError;

#[derive(Args)]
pub struct GenerateArgs {
    /// Taxon group code; the group half of the mapping's compound key
    #[arg(short, long, value_name = "GROUP")]
    pub group: String,

    /// Authority taxonomy CSV for the group
    #[arg(long, value_name = "PATH")]
    pub authority: PathBuf,

    /// Authority-to-repository mapping CSV (taxonGroup, taxonCode, tid)
    #[arg(long, value_name = "PATH")]
    pub mapping: PathBuf,

    /// Repository taxa CSV (tid, sciName, rankID)
    #[arg(long, value_name = "PATH")]
    pub taxa: PathBuf,

    /// Repository parent-link CSV (tid, parenttid)
    #[arg(long = "enum-tree", value_name = "PATH")]
    pub enum_tree: PathBuf,

    /// Repository rank-unit CSV (rankid, rankname, kingdomName)
    #[arg(long = "rank-units", value_name = "PATH")]
    pub rank_units: PathBuf,

    /// Output CSV path
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let config = load_config("taxodiff.toml").unwrap_or_default();
    let group = GroupCode::new(&args.group);

    let spinner = create_spinner("Loading repository reference tables...");
    let taxa = RecordTable::load(&args.taxa, TID_COLUMN)?;
    let mapping = CompoundKeyTable::load(&args.mapping, (MAPPING_GROUP_COLUMN, MAPPING_CODE_COLUMN))?;
    let forest = TaxaForest::load(&args.enum_tree)?;
    let rank_units = {
        let table = RecordTable::load(&args.rank_units, RANK_UNIT_TABLE_ID_COLUMN)?;
        RankUnits::from_table(&table)
    };
    spinner.finish_and_clear();

    if rank_units.is_empty() {
        anyhow::bail!(TaxodiffError::Parse(format!(
            "no usable Organism rank units in {}",
            args.rank_units.display()
        )));
    }

    let (authority_fields, authority_rows) = read_rows(&args.authority)?;
    let id_column = &config.authority.id_column;
    if !authority_fields.iter().any(|f| f == id_column) {
        anyhow::bail!(TaxodiffError::MissingColumn {
            column: id_column.clone(),
            path: args.authority.display().to_string(),
        });
    }

    let spinner = create_spinner(&format!("Joining {} authority records...", authority_rows.len()));
    let joiner = TaxonomyJoiner::new(taxa, mapping, forest, rank_units);
    let output = joiner.join(&group, &authority_rows, id_column);
    spinner.finish_and_clear();

    write_rows(&args.output, &output.fields, &output.rows)?;

    println!(
        "{} {}: {} rows written ({} mapped, {} unmapped)",
        "✓".green().bold(),
        group,
        output.rows.len(),
        output.mapped_count,
        output.rows.len() - output.mapped_count
    );
    println!("  Output: {}", args.output.display());
    Ok(())
}
