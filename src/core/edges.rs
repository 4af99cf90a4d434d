use crate::core::lineage::{Lineage, LineageBuilder};
use crate::core::rank::Rank;
use crate::core::table::RecordTable;
use crate::Result;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One "is classified directly under" link between consecutive lineage
/// entries. Names are already lowercased by lineage construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub parent_rank: Rank,
    pub parent_name: String,
    pub child_rank: Rank,
    pub child_name: String,
}

impl Edge {
    pub fn new(
        parent_rank: Rank,
        parent_name: impl Into<String>,
        child_rank: Rank,
        child_name: impl Into<String>,
    ) -> Self {
        Self {
            parent_rank,
            parent_name: parent_name.into(),
            child_rank,
            child_name: child_name.into(),
        }
    }

    /// Lexicographic key over the string 4-tuple; persisted artifacts sort
    /// on this.
    pub fn sort_key(&self) -> (&str, &str, &str, &str) {
        (
            self.parent_rank.as_str(),
            &self.parent_name,
            self.child_rank.as_str(),
            &self.child_name,
        )
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) -> ({}, {})",
            self.parent_rank, self.parent_name, self.child_rank, self.child_name
        )
    }
}

/// Deduplicated edges of one dataset.
pub type EdgeSet = HashSet<Edge>;

/// Edges implied by one lineage: one per adjacent pair, never a skip-edge
/// across an omitted rank.
pub fn lineage_edges(lineage: &Lineage) -> Vec<Edge> {
    lineage
        .entries()
        .windows(2)
        .map(|pair| {
            Edge::new(
                pair[0].0,
                pair[0].1.clone(),
                pair[1].0,
                pair[1].1.clone(),
            )
        })
        .collect()
}

/// Extract the union of lineage edges over every record of a dataset.
pub fn extract_edges(table: &RecordTable, builder: &dyn LineageBuilder) -> EdgeSet {
    let mut edges = EdgeSet::new();
    for record in table.records() {
        let lineage = builder.build(record);
        edges.extend(lineage_edges(&lineage));
    }
    edges
}

/// Edges in deterministic (tuple-lexicographic) order.
pub fn sorted_edges(edges: &EdgeSet) -> Vec<&Edge> {
    let mut ordered: Vec<&Edge> = edges.iter().collect();
    ordered.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    ordered
}

/// Write one edge set as a sorted, line-delimited artifact.
pub fn write_edge_file(edges: &EdgeSet, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for edge in sorted_edges(edges) {
        writeln!(writer, "{edge}")?;
    }
    writer.flush()?;
    Ok(())
}
