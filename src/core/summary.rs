use crate::core::compare::EdgeMetrics;
use crate::core::rank::GroupCode;
use crate::Result;
use std::fs::OpenOptions;
use std::path::Path;

pub const SUMMARY_FIELDS: [&str; 4] = [
    "group_code",
    "jaccard_index",
    "authority_match_rate",
    "repository_match_rate",
];

/// Metric value recorded when a group's comparison failed.
pub const SUMMARY_ERROR_SENTINEL: &str = "N/A (error)";

/// Append one group's metrics to the summary CSV, writing the header only
/// when the file is new or empty. `None` records a failed comparison.
pub fn append_summary(path: &Path, group: &GroupCode, metrics: Option<&EdgeMetrics>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let needs_header = !path.exists() || std::fs::metadata(path)?.len() == 0;
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::Writer::from_writer(file);

    if needs_header {
        writer.write_record(SUMMARY_FIELDS)?;
    }
    match metrics {
        Some(metrics) => {
            let jaccard = format!("{:.4}", metrics.jaccard);
            let authority = format!("{:.4}", metrics.authority_match_rate);
            let repository = format!("{:.4}", metrics.repository_match_rate);
            writer.write_record([
                group.as_str(),
                jaccard.as_str(),
                authority.as_str(),
                repository.as_str(),
            ])?;
        }
        None => writer.write_record([
            group.as_str(),
            SUMMARY_ERROR_SENTINEL,
            SUMMARY_ERROR_SENTINEL,
            SUMMARY_ERROR_SENTINEL,
        ])?,
    }
    writer.flush()?;
    Ok(())
}
