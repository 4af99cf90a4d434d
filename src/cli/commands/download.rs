use clap::Args;
use colored::*;
use std::path::PathBuf;

use crate::core::config::load_config;
use crate::core::rank::GroupCode;
use crate::download::{write_records_csv, AuthorityClient};
use crate::utils::progress::create_spinner;

#[derive(Args)]
pub struct DownloadArgs {
    /// Taxon group code to download (e.g. ALGAE, FISH)
    #[arg(short, long, value_name = "GROUP")]
    pub group: String,

    /// Output CSV path
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Override the API base URL from taxodiff.toml
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

pub fn run(args: DownloadArgs) -> anyhow::Result<()> {
    let config = load_config("taxodiff.toml").unwrap_or_default();
    let group = GroupCode::new(&args.group);
    let base_url = args
        .api_url
        .as_deref()
        .unwrap_or(&config.download.api_base_url);

    let client = AuthorityClient::new(
        base_url,
        config.download.page_limit,
        config.download.timeout_secs,
    )?;

    let spinner = create_spinner(&format!("Downloading {group} taxonomy..."));
    let records = client.fetch_group(&group)?;
    spinner.finish_and_clear();

    if records.is_empty() {
        eprintln!(
            "{} no records for group {}; writing an empty file",
            "⚠".yellow().bold(),
            group
        );
    }
    write_records_csv(&records, &args.output)?;

    println!(
        "{} {} records saved for {}",
        "✓".green().bold(),
        records.len(),
        group
    );
    println!("  Output: {}", args.output.display());
    Ok(())
}
