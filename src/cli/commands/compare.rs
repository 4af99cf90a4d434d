use clap::Args;
use colored::*;
use std::path::{Path, PathBuf};

use crate::core::compare::{write_edge_artifacts, EdgeMetrics, TaxonomyComparer};
use crate::core::config::{load_config, Config};
use crate::core::rank::GroupCode;
use crate::core::summary::append_summary;
use crate::core::table::RecordTable;
use crate::report::text::{generate_comparison_report, generate_failure_report};
use crate::report::ReportOptions;
use crate::utils::progress::create_spinner;
use crate::TaxodiffError;

#[derive(Args)]
pub struct CompareArgs {
    /// Taxon group code (e.g. ALGAE, FISH); repeat for several groups
    #[arg(short, long = "group", value_name = "GROUP", required = true)]
    pub groups: Vec<String>,

    /// Authority taxonomy CSV; a {group} placeholder expands per group
    #[arg(long, value_name = "PATH")]
    pub authority: String,

    /// Repository taxonomy CSV; a {group} placeholder expands per group
    #[arg(long, value_name = "PATH")]
    pub repository: String,

    /// Comparison report path; edge-set files are written alongside
    #[arg(short, long, value_name = "PATH")]
    pub output: String,

    /// Append per-group metrics to this summary CSV
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Maximum example edges listed per side in the report
    #[arg(long, value_name = "N")]
    pub max_examples: Option<usize>,
}

pub fn run(args: CompareArgs) -> anyhow::Result<()> {
    let config = load_config("taxodiff.toml").unwrap_or_default();
    let options = ReportOptions {
        max_edge_examples: args
            .max_examples
            .unwrap_or(config.report.max_edge_examples),
    };

    if args.groups.len() > 1 {
        for template in [&args.authority, &args.repository, &args.output] {
            if !template.contains("{group}") {
                anyhow::bail!(
                    "comparing {} groups needs a {{group}} placeholder in '{}'",
                    args.groups.len(),
                    template
                );
            }
        }
    }

    for raw_group in &args.groups {
        let group = GroupCode::new(raw_group);
        let authority_path = PathBuf::from(expand_group(&args.authority, &group));
        let repository_path = PathBuf::from(expand_group(&args.repository, &group));
        let report_path = PathBuf::from(expand_group(&args.output, &group));

        match compare_group(
            &group,
            &authority_path,
            &repository_path,
            &report_path,
            &config,
            &options,
        ) {
            Ok(metrics) => {
                if let Some(summary) = &args.summary {
                    append_summary(summary, &group, Some(&metrics))?;
                }
                println!(
                    "{} {}: Jaccard {:.4}, match rates {:.4} / {:.4}",
                    "✓".green().bold(),
                    group,
                    metrics.jaccard,
                    metrics.authority_match_rate,
                    metrics.repository_match_rate
                );
                println!("  Report: {}", report_path.display());
            }
            Err(err) => {
                println!("{} {}: comparison failed: {err:#}", "✗".red().bold(), group);
                match &args.summary {
                    // With a summary sink a failed group becomes a sentinel
                    // row and the remaining groups still run.
                    Some(summary) => append_summary(summary, &group, None)?,
                    None => return Err(err),
                }
            }
        }
    }

    Ok(())
}

fn expand_group(template: &str, group: &GroupCode) -> String {
    template.replace("{group}", group.as_str())
}

fn compare_group(
    group: &GroupCode,
    authority_path: &Path,
    repository_path: &Path,
    report_path: &Path,
    config: &Config,
    options: &ReportOptions,
) -> anyhow::Result<EdgeMetrics> {
    let authority = load_side(
        authority_path,
        &config.authority.id_column,
        group,
        authority_path,
        repository_path,
        report_path,
    )?;
    let repository = load_side(
        repository_path,
        &config.repository.id_column,
        group,
        authority_path,
        repository_path,
        report_path,
    )?;

    let spinner = create_spinner(&format!("Extracting lineage edges for {group}..."));
    let result = TaxonomyComparer::new(group).compare(&authority, &repository);
    spinner.finish_and_clear();

    let report = generate_comparison_report(&result, authority_path, repository_path, options)?;
    write_report(report_path, &report)?;
    write_edge_artifacts(&result, report_path)?;

    Ok(result.metrics)
}

/// Load one side of the comparison. A missing required column still leaves a
/// report file naming the failure before the group is abandoned; an
/// unreadable file fails without producing artifacts.
fn load_side(
    path: &Path,
    id_column: &str,
    group: &GroupCode,
    authority_path: &Path,
    repository_path: &Path,
    report_path: &Path,
) -> anyhow::Result<RecordTable> {
    match RecordTable::load(path, id_column) {
        Ok(table) => Ok(table),
        Err(err @ TaxodiffError::MissingColumn { .. }) => {
            let report =
                generate_failure_report(group, authority_path, repository_path, &err.to_string())?;
            write_report(report_path, &report)?;
            Err(err.into())
        }
        Err(err) => Err(anyhow::Error::new(err)
            .context(format!("failed to load {}", path.display()))),
    }
}

fn write_report(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}
