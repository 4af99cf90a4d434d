use crate::core::forest::{
    resolve_lineage, RankUnits, TaxaForest, TAXA_RANK_ID_COLUMN, TAXA_SCI_NAME_COLUMN, TID_COLUMN,
};
use crate::core::rank::GroupCode;
use crate::core::table::{CompoundKeyTable, RecordTable, TaxonRecord};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const MAPPING_GROUP_COLUMN: &str = "taxonGroup";
pub const MAPPING_CODE_COLUMN: &str = "taxonCode";
pub const MAPPING_VERBATIM_COLUMN: &str = "verbatimScientificName";

/// Fixed leading columns of the joined output; lineage columns follow in
/// ascending rank-id order, then any leftovers alphabetically.
pub const CORE_OUTPUT_FIELDS: [&str; 7] = [
    "authority_taxon_id",
    "lookup_group",
    "is_mapped",
    "repo_tid",
    "repo_scientific_name",
    "repo_rank",
    "repo_verbatim_name",
];

const LINEAGE_FIELD_PREFIX: &str = "repo_";

/// Joined output: final field order plus one row per authority record.
#[derive(Debug, Clone)]
pub struct JoinOutput {
    pub fields: Vec<String>,
    pub rows: Vec<TaxonRecord>,
    pub mapped_count: usize,
}

/// Joins authority records to the repository reference tables and attaches
/// the resolved repository lineage to each matched row.
#[derive(Debug, Clone)]
pub struct TaxonomyJoiner {
    taxa: RecordTable,
    mapping: CompoundKeyTable,
    forest: TaxaForest,
    rank_units: RankUnits,
}

impl TaxonomyJoiner {
    pub fn new(
        taxa: RecordTable,
        mapping: CompoundKeyTable,
        forest: TaxaForest,
        rank_units: RankUnits,
    ) -> Self {
        Self {
            taxa,
            mapping,
            forest,
            rank_units,
        }
    }

    pub fn join(
        &self,
        group: &GroupCode,
        authority_rows: &[TaxonRecord],
        authority_id_column: &str,
    ) -> JoinOutput {
        let lineage_fields = self.rank_units.lineage_fields(LINEAGE_FIELD_PREFIX);
        let mut rows = Vec::with_capacity(authority_rows.len());
        let mut seen_fields: HashSet<String> = HashSet::new();
        let mut mapped_count = 0;

        for record in authority_rows {
            let taxon_id = record
                .get(authority_id_column)
                .map(String::as_str)
                .unwrap_or("");
            let mut out = TaxonRecord::new();
            out.insert("authority_taxon_id".to_string(), taxon_id.to_string());
            out.insert("lookup_group".to_string(), group.as_str().to_string());
            out.insert("is_mapped".to_string(), "false".to_string());
            for field in &CORE_OUTPUT_FIELDS[3..] {
                out.insert(field.to_string(), String::new());
            }
            for field in &lineage_fields {
                out.insert(field.clone(), String::new());
            }

            if !taxon_id.is_empty() {
                if let Some(entry) = self.mapping.get(group.as_str(), taxon_id) {
                    self.attach_repository_data(&mut out, entry, &lineage_fields, &mut mapped_count);
                } else {
                    debug!(
                        group = group.as_str(),
                        taxon_id, "no repository mapping for authority record"
                    );
                }
            }

            seen_fields.extend(out.keys().cloned());
            rows.push(out);
        }

        JoinOutput {
            fields: output_field_order(&lineage_fields, &seen_fields),
            rows,
            mapped_count,
        }
    }

    fn attach_repository_data(
        &self,
        out: &mut TaxonRecord,
        entry: &TaxonRecord,
        lineage_fields: &[String],
        mapped_count: &mut usize,
    ) {
        let tid = entry.get(TID_COLUMN).map(|v| v.trim()).unwrap_or("");
        let verbatim = entry
            .get(MAPPING_VERBATIM_COLUMN)
            .cloned()
            .unwrap_or_default();

        let taxa_entry = if tid.is_empty() { None } else { self.taxa.get(tid) };
        let Some(taxa_entry) = taxa_entry else {
            if !tid.is_empty() {
                warn!(tid, "mapped tid missing from the taxa table, keeping row unmapped");
                out.insert("repo_tid".to_string(), tid.to_string());
            }
            out.insert("repo_verbatim_name".to_string(), verbatim);
            return;
        };

        *mapped_count += 1;
        let lineage = resolve_lineage(tid, &self.taxa, &self.forest, &self.rank_units);

        out.insert("is_mapped".to_string(), "true".to_string());
        out.insert("repo_tid".to_string(), tid.to_string());
        out.insert(
            "repo_scientific_name".to_string(),
            taxa_entry
                .get(TAXA_SCI_NAME_COLUMN)
                .cloned()
                .unwrap_or_default(),
        );
        if let Some(rank_label) = taxa_entry
            .get(TAXA_RANK_ID_COLUMN)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .and_then(|id| self.rank_units.label(id))
        {
            out.insert("repo_rank".to_string(), rank_label.to_string());
        }
        for (label, name) in lineage {
            let field = format!("{LINEAGE_FIELD_PREFIX}{label}");
            if lineage_fields.contains(&field) {
                out.insert(field, name);
            }
        }
        out.insert("repo_verbatim_name".to_string(), verbatim);
    }
}

/// Final column order: the fixed core fields, the rank-ordered lineage
/// fields, then anything else alphabetically.
fn output_field_order(lineage_fields: &[String], seen: &HashSet<String>) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for field in CORE_OUTPUT_FIELDS {
        if seen.contains(field) {
            fields.push(field.to_string());
        }
    }
    for field in lineage_fields {
        if seen.contains(field) && !fields.contains(field) {
            fields.push(field.clone());
        }
    }
    let mut leftovers: Vec<String> = seen
        .iter()
        .filter(|f| !fields.contains(*f))
        .cloned()
        .collect();
    leftovers.sort();
    fields.extend(leftovers);
    fields
}
