use crate::core::compare::ComparisonResult;
use crate::core::edges::{sorted_edges, EdgeSet};
use crate::core::rank::{GroupCode, Rank};
use crate::report::ReportOptions;
use anyhow::Result;
use chrono::Utc;
use std::fmt::Write;
use std::path::Path;

pub fn generate_comparison_report(
    result: &ComparisonResult,
    authority_path: &Path,
    repository_path: &Path,
    options: &ReportOptions,
) -> Result<String> {
    let mut output = String::new();

    writeln!(&mut output, "Taxonomy Comparison Report: {}", result.group)?;
    writeln!(
        &mut output,
        "{}",
        "=".repeat(28 + result.group.as_str().len())
    )?;
    writeln!(&mut output)?;
    writeln!(
        &mut output,
        "Generated: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(&mut output, "Canonical ranks: {}", rank_list())?;
    writeln!(&mut output)?;

    writeln!(
        &mut output,
        "Authority:  {} ({} records)",
        authority_path.display(),
        result.authority_count
    )?;
    writeln!(
        &mut output,
        "Repository: {} ({} records)",
        repository_path.display(),
        result.repository_count
    )?;
    writeln!(&mut output)?;

    let metrics = &result.metrics;
    writeln!(&mut output, "Lineage Edge Overlap")?;
    writeln!(&mut output, "--------------------")?;
    writeln!(
        &mut output,
        "Authority edges:       {}",
        result.authority_edges.len()
    )?;
    writeln!(
        &mut output,
        "Repository edges:      {}",
        result.repository_edges.len()
    )?;
    writeln!(
        &mut output,
        "Common edges:          {}",
        metrics.intersection_size
    )?;
    writeln!(&mut output, "Union edges:           {}", metrics.union_size)?;
    writeln!(&mut output, "Jaccard index:         {:.4}", metrics.jaccard)?;
    writeln!(
        &mut output,
        "Authority match rate:  {:.4} ({}/{})",
        metrics.authority_match_rate,
        metrics.intersection_size,
        result.authority_edges.len()
    )?;
    writeln!(
        &mut output,
        "Repository match rate: {:.4} ({}/{})",
        metrics.repository_match_rate,
        metrics.intersection_size,
        result.repository_edges.len()
    )?;
    writeln!(&mut output)?;

    write_example_section(
        &mut output,
        "Edges Unique to Authority",
        &result.unique_to_authority(),
        options.max_edge_examples,
    )?;
    write_example_section(
        &mut output,
        "Edges Unique to Repository",
        &result.unique_to_repository(),
        options.max_edge_examples,
    )?;

    Ok(output)
}

/// Report emitted when a group's comparison aborts before any edges are
/// extracted, so the failure reason still lands next to the other artifacts.
pub fn generate_failure_report(
    group: &GroupCode,
    authority_path: &Path,
    repository_path: &Path,
    reason: &str,
) -> Result<String> {
    let mut output = String::new();
    writeln!(&mut output, "Taxonomy Comparison Report: {group}")?;
    writeln!(&mut output, "{}", "=".repeat(28 + group.as_str().len()))?;
    writeln!(&mut output)?;
    writeln!(
        &mut output,
        "Generated: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(&mut output)?;
    writeln!(&mut output, "Authority:  {}", authority_path.display())?;
    writeln!(&mut output, "Repository: {}", repository_path.display())?;
    writeln!(&mut output)?;
    writeln!(&mut output, "Comparison aborted: {reason}")?;
    Ok(output)
}

fn write_example_section(
    output: &mut String,
    title: &str,
    edges: &EdgeSet,
    limit: usize,
) -> Result<()> {
    if edges.is_empty() {
        writeln!(output, "No edges unique to this side: {title}.")?;
        writeln!(output)?;
        return Ok(());
    }

    let shown = limit.min(edges.len());
    writeln!(output, "{title} (Top {shown})")?;
    writeln!(output, "{}", "-".repeat(title.len() + 7 + digits(shown)))?;
    for (index, edge) in sorted_edges(edges).into_iter().take(limit).enumerate() {
        writeln!(output, "  {}. {edge}", index + 1)?;
    }
    if edges.len() > limit {
        writeln!(output, "  ... and {} more", edges.len() - limit)?;
    }
    writeln!(output)?;
    Ok(())
}

fn digits(value: usize) -> usize {
    value.to_string().len()
}

fn rank_list() -> String {
    Rank::ALL
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
