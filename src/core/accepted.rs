use crate::core::table::{read_rows, TaxonRecord};
use crate::{Result, TaxodiffError};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::Path;

pub const TAX_STATUS_TID_COLUMN: &str = "tid";
pub const TAX_STATUS_ACCEPTED_COLUMN: &str = "tidaccepted";

const SPP_SUFFIX: &str = "SPP";
const SP_SUFFIX: &str = "SP";

/// Row counts of one filtering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub processed: usize,
    pub selected: usize,
}

/// Rows whose own identifier equals their accepted identifier, keyed by
/// identifier in input order (later duplicates replace earlier ones).
pub fn select_self_accepted(
    rows: &[TaxonRecord],
    id_column: &str,
    accepted_column: &str,
) -> IndexMap<String, TaxonRecord> {
    let mut accepted = IndexMap::new();
    for row in rows {
        let id = row.get(id_column).map(|v| v.as_str()).unwrap_or("");
        let accepted_id = row.get(accepted_column).map(|v| v.as_str()).unwrap_or("");
        if !id.is_empty() && id == accepted_id {
            accepted.insert(id.to_string(), row.clone());
        }
    }
    accepted
}

/// Collapse `<BASE>SPP` identifiers onto their `<BASE>SP` sibling when both
/// are self-accepted; the SP row wins. This preserves the upstream feed's
/// policy (see DESIGN.md); SP is not inherently more authoritative.
///
/// Standalone SP or SPP rows, and everything else, pass through in input
/// order; collapsed survivors are appended after them.
pub fn collapse_spp_variants(accepted: &IndexMap<String, TaxonRecord>) -> Vec<TaxonRecord> {
    let mut selected: Vec<TaxonRecord> = Vec::new();
    let mut collapsed: IndexMap<String, TaxonRecord> = IndexMap::new();
    let mut processed: HashSet<String> = HashSet::new();

    for (taxon_id, row) in accepted {
        if processed.contains(taxon_id) {
            continue;
        }
        if let Some(base) = taxon_id.strip_suffix(SPP_SUFFIX) {
            let sp_key = format!("{base}{SP_SUFFIX}");
            if let Some(sp_row) = accepted.get(&sp_key) {
                collapsed.insert(base.to_string(), sp_row.clone());
                processed.insert(taxon_id.clone());
                processed.insert(sp_key);
            } else {
                selected.push(row.clone());
                processed.insert(taxon_id.clone());
            }
        } else if let Some(base) = taxon_id.strip_suffix(SP_SUFFIX) {
            let spp_key = format!("{base}{SPP_SUFFIX}");
            if !accepted.contains_key(&spp_key) {
                selected.push(row.clone());
            }
            // When the SPP sibling exists its branch resolves the pair.
            processed.insert(taxon_id.clone());
        } else {
            selected.push(row.clone());
            processed.insert(taxon_id.clone());
        }
    }

    selected.extend(collapsed.into_values());
    selected
}

/// Authority-side accepted filter: self-accepted rows with the SPP collapse
/// applied.
pub fn select_accepted_authority(
    rows: &[TaxonRecord],
    id_column: &str,
    accepted_column: &str,
) -> (Vec<TaxonRecord>, FilterStats) {
    let accepted = select_self_accepted(rows, id_column, accepted_column);
    let selected = collapse_spp_variants(&accepted);
    let stats = FilterStats {
        processed: rows.len(),
        selected: selected.len(),
    };
    (selected, stats)
}

/// Load the set of self-accepted tids from a taxonomic-status table.
pub fn load_accepted_tids(path: &Path) -> Result<HashSet<String>> {
    let (fields, rows) = read_rows(path)?;
    for column in [TAX_STATUS_TID_COLUMN, TAX_STATUS_ACCEPTED_COLUMN] {
        if !fields.iter().any(|f| f == column) {
            return Err(TaxodiffError::MissingColumn {
                column: column.to_string(),
                path: path.display().to_string(),
            });
        }
    }

    let mut accepted = HashSet::new();
    for row in &rows {
        let tid = row.get(TAX_STATUS_TID_COLUMN).map(|v| v.as_str()).unwrap_or("");
        let tid_accepted = row
            .get(TAX_STATUS_ACCEPTED_COLUMN)
            .map(|v| v.as_str())
            .unwrap_or("");
        if !tid.is_empty() && tid == tid_accepted {
            accepted.insert(tid.to_string());
        }
    }
    Ok(accepted)
}

/// Repository-side accepted filter: rows whose tid is in the accepted set,
/// first occurrence wins.
pub fn select_accepted_repository(
    rows: &[TaxonRecord],
    tid_column: &str,
    accepted: &HashSet<String>,
) -> (Vec<TaxonRecord>, FilterStats) {
    let mut selected = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for row in rows {
        let tid = row.get(tid_column).map(|v| v.as_str()).unwrap_or("");
        if !tid.is_empty() && accepted.contains(tid) && seen.insert(tid.to_string()) {
            selected.push(row.clone());
        }
    }
    let stats = FilterStats {
        processed: rows.len(),
        selected: selected.len(),
    };
    (selected, stats)
}
