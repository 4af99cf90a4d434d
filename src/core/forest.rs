use crate::core::table::RecordTable;
use crate::{Result, TaxodiffError};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use tracing::warn;

pub const TID_COLUMN: &str = "tid";
pub const PARENT_TID_COLUMN: &str = "parenttid";
pub const TAXA_SCI_NAME_COLUMN: &str = "sciName";
pub const TAXA_RANK_ID_COLUMN: &str = "rankID";
pub const RANK_UNIT_TABLE_ID_COLUMN: &str = "taxonunitid";
pub const RANK_UNIT_ID_COLUMN: &str = "rankid";
pub const RANK_UNIT_LABEL_COLUMN: &str = "rankname";
pub const RANK_UNIT_KINGDOM_COLUMN: &str = "kingdomName";

/// The kingdom context whose rank units apply to this dataset.
pub const ORGANISM_CONTEXT: &str = "Organism";

/// Declared parent links of the repository taxa, as published: each node may
/// point at several candidate parents, not all of them taxonomically valid
/// (siblings, duplicates and self-loops occur). The true ancestor chain is a
/// derived relationship, resolved by rank ordering in `resolve_lineage`.
#[derive(Debug, Clone, Default)]
pub struct TaxaForest {
    parents: HashMap<String, Vec<String>>,
}

impl TaxaForest {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TaxodiffError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("enum-tree file not found: {}", path.display()),
            )));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        for column in [TID_COLUMN, PARENT_TID_COLUMN] {
            if !headers.iter().any(|h| h == column) {
                return Err(TaxodiffError::MissingColumn {
                    column: column.to_string(),
                    path: path.display().to_string(),
                });
            }
        }
        let tid_idx = headers.iter().position(|h| h == TID_COLUMN).unwrap_or(0);
        let parent_idx = headers
            .iter()
            .position(|h| h == PARENT_TID_COLUMN)
            .unwrap_or(0);

        let mut forest = Self::default();
        for result in reader.records() {
            let row = result?;
            let tid = row.get(tid_idx).unwrap_or("").trim();
            let parent = row.get(parent_idx).unwrap_or("").trim();
            if !tid.is_empty() && !parent.is_empty() {
                forest.add_link(tid, parent);
            }
        }
        Ok(forest)
    }

    pub fn from_links<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut forest = Self::default();
        for (tid, parent) in links {
            let (tid, parent) = (tid.into(), parent.into());
            forest.add_link(&tid, &parent);
        }
        forest
    }

    fn add_link(&mut self, tid: &str, parent: &str) {
        self.parents
            .entry(tid.to_string())
            .or_default()
            .push(parent.to_string());
    }

    pub fn candidates(&self, tid: &str) -> &[String] {
        self.parents.get(tid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Rank units of the Organism kingdom context: numeric rank id to rank
/// label, with the ascending-id order preserved for report column layout.
#[derive(Debug, Clone, Default)]
pub struct RankUnits {
    labels: HashMap<u32, String>,
    ordered: Vec<(u32, String)>,
}

impl RankUnits {
    /// Extract the Organism-scope units from the rank-unit table. Rows with
    /// unparseable rank ids are skipped with a warning.
    pub fn from_table(table: &RecordTable) -> Self {
        let mut units: Vec<(u32, String)> = Vec::new();
        for row in table.records() {
            let kingdom = row
                .get(RANK_UNIT_KINGDOM_COLUMN)
                .map(|v| v.trim())
                .unwrap_or("");
            let label = row
                .get(RANK_UNIT_LABEL_COLUMN)
                .map(|v| v.trim())
                .unwrap_or("");
            let raw_id = row
                .get(RANK_UNIT_ID_COLUMN)
                .map(|v| v.trim())
                .unwrap_or("");
            if kingdom != ORGANISM_CONTEXT || label.is_empty() || raw_id.is_empty() {
                continue;
            }
            match raw_id.parse::<u32>() {
                Ok(id) => units.push((id, label.to_string())),
                Err(_) => {
                    warn!(rank_id = raw_id, label, "skipping rank unit with unparseable rank id");
                }
            }
        }
        units.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let labels = units.iter().map(|(id, label)| (*id, label.clone())).collect();
        Self {
            labels,
            ordered: units,
        }
    }

    pub fn label(&self, rank_id: u32) -> Option<&str> {
        self.labels.get(&rank_id).map(String::as_str)
    }

    /// Lineage column names in ascending rank-id order, `prefix` + lowercase
    /// label, with the organism column forced to the front when the table
    /// itself does not carry one.
    pub fn lineage_fields(&self, prefix: &str) -> Vec<String> {
        let mut fields: Vec<String> = self
            .ordered
            .iter()
            .map(|(_, label)| format!("{prefix}{}", label.to_lowercase()))
            .collect();
        let organism = format!("{prefix}organism");
        if !fields.contains(&organism) {
            fields.insert(0, organism);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Resolve the full ancestor lineage of `tid` as an ordered map from
/// lowercase rank label to scientific name.
///
/// The walk starts at `tid` and repeatedly steps to the resolved direct
/// parent: the candidate whose rank value is the maximum strictly below the
/// current node's. It stops at the root, at unknown nodes, at nodes whose
/// own rank id cannot be read, and on revisits (the published forest can
/// contain cycles).
pub fn resolve_lineage(
    tid: &str,
    taxa: &RecordTable,
    forest: &TaxaForest,
    rank_units: &RankUnits,
) -> IndexMap<String, String> {
    let mut lineage = IndexMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = tid.to_string();

    while !current.is_empty() && visited.insert(current.clone()) {
        let Some(info) = taxa.get(&current) else {
            break;
        };
        let raw_rank = info.get(TAXA_RANK_ID_COLUMN).map(|v| v.trim()).unwrap_or("");
        let sci_name = info
            .get(TAXA_SCI_NAME_COLUMN)
            .map(|v| v.trim())
            .unwrap_or("");

        let rank_id = match raw_rank.parse::<u32>() {
            Ok(id) => id,
            Err(_) => {
                warn!(
                    tid = current.as_str(),
                    rank_id = raw_rank,
                    "cannot read rank id, stopping ancestor walk"
                );
                break;
            }
        };

        if !sci_name.is_empty() {
            if let Some(label) = rank_units.label(rank_id) {
                lineage.insert(label.to_lowercase(), sci_name.to_string());
            }
        }

        match resolve_direct_parent(&current, rank_id, forest.candidates(&current), taxa) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    lineage
}

/// Pick the direct parent of a node among its declared candidates: the one
/// whose rank value is the largest strictly below `child_rank`. Self-loops,
/// unknown candidates and candidates without a readable rank id never
/// qualify.
pub fn resolve_direct_parent(
    tid: &str,
    child_rank: u32,
    candidates: &[String],
    taxa: &RecordTable,
) -> Option<String> {
    let mut best: Option<(u32, &str)> = None;
    for candidate in candidates {
        if candidate == tid {
            continue;
        }
        let Some(info) = taxa.get(candidate) else {
            continue;
        };
        let raw_rank = info.get(TAXA_RANK_ID_COLUMN).map(|v| v.trim()).unwrap_or("");
        if raw_rank.is_empty() {
            continue;
        }
        let rank = match raw_rank.parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    tid = candidate.as_str(),
                    rank_id = raw_rank,
                    "skipping parent candidate with unparseable rank id"
                );
                continue;
            }
        };
        if rank < child_rank && best.map_or(true, |(current, _)| rank > current) {
            best = Some((rank, candidate));
        }
    }
    best.map(|(_, tid)| tid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::TaxonRecord;
    use pretty_assertions::assert_eq;

    fn taxa_table(rows: &[(&str, &str, &str)]) -> RecordTable {
        let fields = vec![
            TID_COLUMN.to_string(),
            TAXA_SCI_NAME_COLUMN.to_string(),
            TAXA_RANK_ID_COLUMN.to_string(),
        ];
        let rows: Vec<TaxonRecord> = rows
            .iter()
            .map(|(tid, name, rank)| {
                [
                    (TID_COLUMN.to_string(), tid.to_string()),
                    (TAXA_SCI_NAME_COLUMN.to_string(), name.to_string()),
                    (TAXA_RANK_ID_COLUMN.to_string(), rank.to_string()),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        RecordTable::from_rows(TID_COLUMN, fields, rows)
    }

    fn rank_units(rows: &[(&str, &str)]) -> RankUnits {
        let fields = vec![
            RANK_UNIT_ID_COLUMN.to_string(),
            RANK_UNIT_LABEL_COLUMN.to_string(),
            RANK_UNIT_KINGDOM_COLUMN.to_string(),
        ];
        let rows: Vec<TaxonRecord> = rows
            .iter()
            .map(|(id, label)| {
                [
                    (RANK_UNIT_ID_COLUMN.to_string(), id.to_string()),
                    (RANK_UNIT_LABEL_COLUMN.to_string(), label.to_string()),
                    (RANK_UNIT_KINGDOM_COLUMN.to_string(), ORGANISM_CONTEXT.to_string()),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        RankUnits::from_table(&RecordTable::from_rows(RANK_UNIT_ID_COLUMN, fields, rows))
    }

    #[test]
    fn picks_the_closest_strictly_higher_ranked_candidate() {
        let taxa = taxa_table(&[
            ("child", "Child", "220"),
            ("p140", "Order", "140"),
            ("p180", "Family", "180"),
            ("p220", "Sibling", "220"),
        ]);
        let candidates: Vec<String> = ["p140", "p180", "p220"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let parent = resolve_direct_parent("child", 220, &candidates, &taxa);
        assert_eq!(parent.as_deref(), Some("p180"));
    }

    #[test]
    fn equal_rank_candidates_are_rejected() {
        let taxa = taxa_table(&[("child", "Child", "220"), ("p220", "Sibling", "220")]);
        let candidates = vec!["p220".to_string()];
        assert_eq!(resolve_direct_parent("child", 220, &candidates, &taxa), None);
    }

    #[test]
    fn self_loops_and_unknown_candidates_are_skipped() {
        let taxa = taxa_table(&[("child", "Child", "220"), ("p60", "Kingdom", "60")]);
        let candidates: Vec<String> = ["child", "ghost", "p60"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            resolve_direct_parent("child", 220, &candidates, &taxa).as_deref(),
            Some("p60")
        );
    }

    #[test]
    fn unparseable_candidate_ranks_are_skipped_not_fatal() {
        let taxa = taxa_table(&[
            ("child", "Child", "220"),
            ("bad", "Broken", "not-a-number"),
            ("p140", "Order", "140"),
        ]);
        let candidates: Vec<String> = ["bad", "p140"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            resolve_direct_parent("child", 220, &candidates, &taxa).as_deref(),
            Some("p140")
        );
    }

    #[test]
    fn resolves_a_full_lineage_to_the_root() {
        let taxa = taxa_table(&[
            ("1", "Plantae", "10"),
            ("2", "Fagaceae", "140"),
            ("3", "Quercus", "180"),
            ("4", "Quercus alba", "220"),
        ]);
        // Noisy forest: the species also declares its grandparent and a
        // sibling-ranked node as parents.
        let forest = TaxaForest::from_links([
            ("4", "3"),
            ("4", "2"),
            ("3", "2"),
            ("2", "1"),
        ]);
        let units = rank_units(&[
            ("10", "Kingdom"),
            ("140", "Family"),
            ("180", "Genus"),
            ("220", "Species"),
        ]);

        let lineage = resolve_lineage("4", &taxa, &forest, &units);
        let entries: Vec<(String, String)> = lineage.into_iter().collect();
        assert_eq!(
            entries,
            vec![
                ("species".to_string(), "Quercus alba".to_string()),
                ("genus".to_string(), "Quercus".to_string()),
                ("family".to_string(), "Fagaceae".to_string()),
                ("kingdom".to_string(), "Plantae".to_string()),
            ]
        );
    }

    #[test]
    fn cycles_terminate() {
        let taxa = taxa_table(&[("a", "A", "100"), ("b", "B", "60")]);
        let forest = TaxaForest::from_links([("a", "b"), ("b", "a")]);
        let units = rank_units(&[("100", "Genus"), ("60", "Family")]);

        let lineage = resolve_lineage("a", &taxa, &forest, &units);
        assert_eq!(lineage.len(), 2);
    }

    #[test]
    fn unknown_start_node_yields_empty_lineage() {
        let taxa = taxa_table(&[]);
        let forest = TaxaForest::default();
        let units = rank_units(&[]);
        assert!(resolve_lineage("missing", &taxa, &forest, &units).is_empty());
    }

    #[test]
    fn ranks_outside_the_organism_context_are_not_recorded() {
        let fields = vec![
            RANK_UNIT_ID_COLUMN.to_string(),
            RANK_UNIT_LABEL_COLUMN.to_string(),
            RANK_UNIT_KINGDOM_COLUMN.to_string(),
        ];
        let rows: Vec<TaxonRecord> = vec![
            [
                (RANK_UNIT_ID_COLUMN.to_string(), "220".to_string()),
                (RANK_UNIT_LABEL_COLUMN.to_string(), "Species".to_string()),
                (RANK_UNIT_KINGDOM_COLUMN.to_string(), "Fungi".to_string()),
            ]
            .into_iter()
            .collect(),
        ];
        let units = RankUnits::from_table(&RecordTable::from_rows(
            RANK_UNIT_ID_COLUMN,
            fields,
            rows,
        ));
        assert!(units.is_empty());
        assert_eq!(units.label(220), None);
    }

    #[test]
    fn lineage_fields_are_rank_ordered_with_organism_first() {
        let units = rank_units(&[("220", "Species"), ("10", "Kingdom"), ("60", "Division")]);
        assert_eq!(
            units.lineage_fields("repo_"),
            vec![
                "repo_organism".to_string(),
                "repo_kingdom".to_string(),
                "repo_division".to_string(),
                "repo_species".to_string(),
            ]
        );
    }
}
