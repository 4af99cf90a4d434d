use crate::core::edges::{extract_edges, write_edge_file, EdgeSet};
use crate::core::lineage::builder_for;
use crate::core::rank::{GroupCode, SourceKind};
use crate::core::table::RecordTable;
use crate::Result;
use std::path::{Path, PathBuf};

/// Jaccard index of two edge sets. Two empty sets agree perfectly; this
/// also keeps the metric defined when a group has no lineage data at all.
pub fn jaccard_index(a: &EdgeSet, b: &EdgeSet) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Share of `a`'s edges that also appear in `b` (0.0 for an empty `a`).
pub fn match_rate(a: &EdgeSet, b: &EdgeSet) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    a.intersection(b).count() as f64 / a.len() as f64
}

/// Overlap metrics between the two per-group edge sets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeMetrics {
    pub jaccard: f64,
    pub authority_match_rate: f64,
    pub repository_match_rate: f64,
    pub intersection_size: usize,
    pub union_size: usize,
}

/// Everything a comparison run produced for one group.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub group: GroupCode,
    pub authority_count: usize,
    pub repository_count: usize,
    pub authority_edges: EdgeSet,
    pub repository_edges: EdgeSet,
    pub metrics: EdgeMetrics,
}

impl ComparisonResult {
    pub fn union(&self) -> EdgeSet {
        self.authority_edges
            .union(&self.repository_edges)
            .cloned()
            .collect()
    }

    pub fn intersection(&self) -> EdgeSet {
        self.authority_edges
            .intersection(&self.repository_edges)
            .cloned()
            .collect()
    }

    pub fn unique_to_authority(&self) -> EdgeSet {
        self.authority_edges
            .difference(&self.repository_edges)
            .cloned()
            .collect()
    }

    pub fn unique_to_repository(&self) -> EdgeSet {
        self.repository_edges
            .difference(&self.authority_edges)
            .cloned()
            .collect()
    }
}

/// Compares the authority and repository taxonomies of one group by their
/// lineage edge sets.
#[derive(Debug, Clone)]
pub struct TaxonomyComparer {
    group: GroupCode,
}

impl TaxonomyComparer {
    pub fn new(group: &GroupCode) -> Self {
        Self {
            group: group.clone(),
        }
    }

    pub fn compare(&self, authority: &RecordTable, repository: &RecordTable) -> ComparisonResult {
        let authority_builder = builder_for(SourceKind::Authority, &self.group);
        let repository_builder = builder_for(SourceKind::Repository, &self.group);

        let authority_edges = extract_edges(authority, authority_builder.as_ref());
        let repository_edges = extract_edges(repository, repository_builder.as_ref());

        let metrics = EdgeMetrics {
            jaccard: jaccard_index(&authority_edges, &repository_edges),
            authority_match_rate: match_rate(&authority_edges, &repository_edges),
            repository_match_rate: match_rate(&repository_edges, &authority_edges),
            intersection_size: authority_edges.intersection(&repository_edges).count(),
            union_size: authority_edges.union(&repository_edges).count(),
        };

        ComparisonResult {
            group: self.group.clone(),
            authority_count: authority.len(),
            repository_count: repository.len(),
            authority_edges,
            repository_edges,
            metrics,
        }
    }
}

/// Materialize the six edge-set artifacts next to the report file, named
/// after its basename. Returns the paths written.
pub fn write_edge_artifacts(result: &ComparisonResult, report_path: &Path) -> Result<Vec<PathBuf>> {
    let stem = report_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| result.group.as_str().to_lowercase());
    let dir = report_path.parent().unwrap_or_else(|| Path::new(""));

    let artifacts: [(&str, EdgeSet); 6] = [
        ("union", result.union()),
        ("intersection", result.intersection()),
        ("authority", result.authority_edges.clone()),
        ("repository", result.repository_edges.clone()),
        ("authority_only", result.unique_to_authority()),
        ("repository_only", result.unique_to_repository()),
    ];

    let mut written = Vec::with_capacity(artifacts.len());
    for (label, edges) in &artifacts {
        let path = dir.join(format!("{stem}_{label}_edges.txt"));
        write_edge_file(edges, &path)?;
        written.push(path);
    }
    Ok(written)
}
