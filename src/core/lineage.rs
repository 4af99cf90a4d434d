use crate::core::rank::{
    authority_column, GroupCode, Rank, SourceKind, AUTHORITY_DIVISION_COLUMN,
    AUTHORITY_EPITHET_COLUMN, AUTHORITY_FORM_COLUMN, AUTHORITY_GENUS_COLUMN,
    AUTHORITY_SCIENTIFIC_NAME_COLUMN, AUTHORITY_SUBSPECIES_COLUMN, AUTHORITY_VARIETY_COLUMN,
    HYBRID_MARKER, PLACEHOLDER_EPITHETS, REPOSITORY_RANK_COLUMNS,
};
use crate::core::table::TaxonRecord;

/// Ordered classification path for one record: `(rank, normalized name)`
/// pairs, most general first. Ranks with empty values are omitted outright,
/// so consecutive entries may span a gap in the vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    entries: Vec<(Rank, String)>,
}

impl Lineage {
    fn push(&mut self, rank: Rank, raw: &str) {
        let name = raw.trim();
        if !name.is_empty() {
            self.entries.push((rank, name.to_lowercase()));
        }
    }

    pub fn entries(&self) -> &[(Rank, String)] {
        &self.entries
    }

    pub fn name_at(&self, rank: Rank) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| *r == rank)
            .map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Source-specific lineage construction strategy. One implementation per
/// source kind; group-gated naming rules are configuration of the authority
/// strategy, not separate types.
pub trait LineageBuilder {
    fn build(&self, record: &TaxonRecord) -> Lineage;
}

pub fn builder_for(source: SourceKind, group: &GroupCode) -> Box<dyn LineageBuilder> {
    match source {
        SourceKind::Authority => Box::new(AuthorityLineage::new(group.clone())),
        SourceKind::Repository => Box::new(RepositoryLineage),
    }
}

/// Builds lineages from authority-feed records. Generic ranks are column
/// lookups; species and below are synthesized from genus/epithet columns,
/// with hybrid-marker and trinomial handling gated by the group code.
#[derive(Debug, Clone)]
pub struct AuthorityLineage {
    group: GroupCode,
}

impl AuthorityLineage {
    pub fn new(group: GroupCode) -> Self {
        Self { group }
    }
}

impl LineageBuilder for AuthorityLineage {
    fn build(&self, record: &TaxonRecord) -> Lineage {
        let mut lineage = Lineage::default();
        for rank in Rank::ALL {
            match rank {
                Rank::Phylum => lineage.push(rank, phylum_value(record)),
                Rank::Species => {
                    if let Some(name) = species_value(record, &self.group) {
                        lineage.push(rank, &name);
                    }
                }
                Rank::Subspecies => {
                    if let Some(name) = subspecies_value(record, &self.group) {
                        lineage.push(rank, &name);
                    }
                }
                Rank::Variety => {
                    if let Some(name) = infraspecific_value(record, AUTHORITY_VARIETY_COLUMN, "var.")
                    {
                        lineage.push(rank, &name);
                    }
                }
                Rank::Form => {
                    if let Some(name) = infraspecific_value(record, AUTHORITY_FORM_COLUMN, "f.") {
                        lineage.push(rank, &name);
                    }
                }
                _ => {
                    if let Some(column) = authority_column(rank) {
                        lineage.push(rank, field(record, column));
                    }
                }
            }
        }
        lineage
    }
}

/// Builds lineages from repository-taxonomy records: every rank is a direct
/// column lookup, no synthesis.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepositoryLineage;

impl LineageBuilder for RepositoryLineage {
    fn build(&self, record: &TaxonRecord) -> Lineage {
        let mut lineage = Lineage::default();
        for (rank, column) in REPOSITORY_RANK_COLUMNS {
            lineage.push(rank, field(record, column));
        }
        lineage
    }
}

fn field<'a>(record: &'a TaxonRecord, column: &str) -> &'a str {
    record.get(column).map(|v| v.trim()).unwrap_or("")
}

/// The specific epithet, with the conventional "unidentified species"
/// placeholders treated as absent.
fn specific_epithet(record: &TaxonRecord) -> &str {
    let epithet = field(record, AUTHORITY_EPITHET_COLUMN);
    if PLACEHOLDER_EPITHETS
        .iter()
        .any(|p| p.eq_ignore_ascii_case(epithet))
    {
        ""
    } else {
        epithet
    }
}

/// Phylum, falling back to the division column when blank.
fn phylum_value(record: &TaxonRecord) -> &str {
    let phylum = field(record, "dwc:phylum");
    if phylum.is_empty() {
        field(record, AUTHORITY_DIVISION_COLUMN)
    } else {
        phylum
    }
}

fn species_value(record: &TaxonRecord, group: &GroupCode) -> Option<String> {
    let genus = field(record, AUTHORITY_GENUS_COLUMN);
    let epithet = specific_epithet(record);
    if genus.is_empty() || epithet.is_empty() {
        return None;
    }

    let scientific_name = field(record, AUTHORITY_SCIENTIFIC_NAME_COLUMN);
    if group.uses_hybrid_markers() && scientific_name.contains(HYBRID_MARKER) {
        if let Some(name) = hybrid_species_name(genus, epithet, scientific_name) {
            return Some(name);
        }
    }
    Some(format!("{genus} {epithet}"))
}

/// Hybrid species naming for groups that carry the `×` marker.
///
/// Intergeneric hybrids lead with the marker (`×Genus epithet`); interspecific
/// hybrids carry it between genus and epithet and are always rendered with
/// surrounding spaces (`Genus × epithet`), whatever the source spacing.
fn hybrid_species_name(genus: &str, epithet: &str, scientific_name: &str) -> Option<String> {
    let lowered = scientific_name.to_lowercase();
    let intergeneric = format!("{HYBRID_MARKER}{}", genus.to_lowercase());
    if lowered.starts_with(&intergeneric) {
        return Some(format!("{HYBRID_MARKER}{genus} {epithet}"));
    }

    let tight = format!("{genus} {HYBRID_MARKER}{epithet}");
    let spaced = format!("{genus} {HYBRID_MARKER} {epithet}");
    if lowered.contains(&tight.to_lowercase()) || lowered.contains(&spaced.to_lowercase()) {
        return Some(spaced);
    }
    None
}

fn subspecies_value(record: &TaxonRecord, group: &GroupCode) -> Option<String> {
    let genus = field(record, AUTHORITY_GENUS_COLUMN);
    let epithet = specific_epithet(record);
    if genus.is_empty() || epithet.is_empty() {
        return None;
    }

    let subspecies = field(record, AUTHORITY_SUBSPECIES_COLUMN);
    let scientific_name = field(record, AUTHORITY_SCIENTIFIC_NAME_COLUMN);

    if !subspecies.is_empty() {
        if group.uses_hybrid_markers() && scientific_name.contains(HYBRID_MARKER) {
            let lowered = scientific_name.to_lowercase();
            let tight = format!("{genus} {epithet} {HYBRID_MARKER}{subspecies}");
            let spaced = format!("{genus} {epithet} {HYBRID_MARKER} {subspecies}");
            if lowered.contains(&tight.to_lowercase()) || lowered.contains(&spaced.to_lowercase()) {
                return Some(spaced);
            }
        }
        return Some(format!("{genus} {epithet} {subspecies}"));
    }

    // No subspecies column: a few groups publish bare trinomials in the
    // free-text name. Accept the third token only when the first two match
    // the genus and epithet we already derived.
    if group.allows_trinomial_fallback() {
        let parts: Vec<&str> = scientific_name.split_whitespace().collect();
        if parts.len() == 3
            && parts[0].to_lowercase() == genus.to_lowercase()
            && parts[1].to_lowercase() == epithet.to_lowercase()
        {
            return Some(format!("{genus} {epithet} {}", parts[2]));
        }
    }
    None
}

/// Variety and form names: species base plus a dedicated epithet column,
/// joined by the rank abbreviation ("var." or "f.").
fn infraspecific_value(record: &TaxonRecord, column: &str, abbreviation: &str) -> Option<String> {
    let genus = field(record, AUTHORITY_GENUS_COLUMN);
    let epithet = specific_epithet(record);
    let value = field(record, column);
    if genus.is_empty() || epithet.is_empty() || value.is_empty() {
        return None;
    }
    Some(format!("{genus} {epithet} {abbreviation} {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> TaxonRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn authority(group: &str) -> AuthorityLineage {
        AuthorityLineage::new(GroupCode::new(group))
    }

    #[test]
    fn plain_species_from_genus_and_epithet() {
        let record = record(&[
            ("dwc:genus", "Quercus"),
            ("dwc:specificEpithet", "alba"),
            ("dwc:scientificName", "Quercus alba L."),
        ]);
        let lineage = authority("BIRD").build(&record);
        assert_eq!(lineage.name_at(Rank::Species), Some("quercus alba"));
    }

    #[test]
    fn placeholder_epithets_produce_no_species_entry() {
        for epithet in ["sp.", "spp.", "SP.", "Spp."] {
            let record = record(&[
                ("dwc:genus", "Quercus"),
                ("dwc:specificEpithet", epithet),
            ]);
            let lineage = authority("BIRD").build(&record);
            assert_eq!(lineage.name_at(Rank::Species), None, "epithet {epithet}");
        }
    }

    #[test]
    fn empty_genus_produces_no_species_entry() {
        let record = record(&[("dwc:specificEpithet", "alba")]);
        let lineage = authority("BIRD").build(&record);
        assert_eq!(lineage.name_at(Rank::Species), None);
    }

    #[test]
    fn interspecific_hybrid_is_spaced_for_plants() {
        let record = record(&[
            ("dwc:genus", "Quercus"),
            ("dwc:specificEpithet", "alba"),
            ("dwc:scientificName", "Quercus \u{d7}alba L."),
        ]);
        let lineage = authority("PLANT").build(&record);
        assert_eq!(lineage.name_at(Rank::Species), Some("quercus \u{d7} alba"));
    }

    #[test]
    fn interspecific_hybrid_already_spaced_stays_spaced() {
        let record = record(&[
            ("dwc:genus", "Quercus"),
            ("dwc:specificEpithet", "rosacea"),
            ("dwc:scientificName", "Quercus \u{d7} rosacea Bechst."),
        ]);
        let lineage = authority("PLANT").build(&record);
        assert_eq!(
            lineage.name_at(Rank::Species),
            Some("quercus \u{d7} rosacea")
        );
    }

    #[test]
    fn intergeneric_hybrid_leads_with_the_marker() {
        let record = record(&[
            ("dwc:genus", "Triticosecale"),
            ("dwc:specificEpithet", "rimpaui"),
            ("dwc:scientificName", "\u{d7}Triticosecale rimpaui Wittm."),
        ]);
        let lineage = authority("PLANT").build(&record);
        assert_eq!(
            lineage.name_at(Rank::Species),
            Some("\u{d7}triticosecale rimpaui")
        );
    }

    #[test]
    fn hybrid_marker_ignored_outside_marker_groups() {
        let record = record(&[
            ("dwc:genus", "Quercus"),
            ("dwc:specificEpithet", "alba"),
            ("dwc:scientificName", "Quercus \u{d7}alba"),
        ]);
        let lineage = authority("FISH").build(&record);
        assert_eq!(lineage.name_at(Rank::Species), Some("quercus alba"));
    }

    #[test]
    fn marker_present_but_pattern_absent_falls_back_to_plain_name() {
        let record = record(&[
            ("dwc:genus", "Quercus"),
            ("dwc:specificEpithet", "alba"),
            ("dwc:scientificName", "Quercus robur \u{d7} petraea"),
        ]);
        let lineage = authority("PLANT").build(&record);
        assert_eq!(lineage.name_at(Rank::Species), Some("quercus alba"));
    }

    #[test]
    fn subspecies_from_dedicated_column() {
        let record = record(&[
            ("dwc:genus", "Canis"),
            ("dwc:specificEpithet", "lupus"),
            ("dwc:subspecies", "arctos"),
        ]);
        let lineage = authority("BIRD").build(&record);
        assert_eq!(
            lineage.name_at(Rank::Subspecies),
            Some("canis lupus arctos")
        );
    }

    #[test]
    fn subspecies_hybrid_marker_is_spaced() {
        let record = record(&[
            ("dwc:genus", "Salix"),
            ("dwc:specificEpithet", "alba"),
            ("dwc:subspecies", "vitellina"),
            ("dwc:scientificName", "Salix alba \u{d7}vitellina"),
        ]);
        let lineage = authority("PLANT").build(&record);
        assert_eq!(
            lineage.name_at(Rank::Subspecies),
            Some("salix alba \u{d7} vitellina")
        );
    }

    #[test]
    fn trinomial_fallback_requires_matching_binomial() {
        let matching = record(&[
            ("dwc:genus", "Thamnophis"),
            ("dwc:specificEpithet", "sirtalis"),
            ("dwc:scientificName", "Thamnophis sirtalis parietalis"),
        ]);
        let lineage = authority("HERPETOLOGY").build(&matching);
        assert_eq!(
            lineage.name_at(Rank::Subspecies),
            Some("thamnophis sirtalis parietalis")
        );

        let mismatched = record(&[
            ("dwc:genus", "Thamnophis"),
            ("dwc:specificEpithet", "sirtalis"),
            ("dwc:scientificName", "Pituophis catenifer sayi"),
        ]);
        let lineage = authority("HERPETOLOGY").build(&mismatched);
        assert_eq!(lineage.name_at(Rank::Subspecies), None);
    }

    #[test]
    fn trinomial_fallback_rejects_names_with_authors() {
        let record = record(&[
            ("dwc:genus", "Thamnophis"),
            ("dwc:specificEpithet", "sirtalis"),
            ("dwc:scientificName", "Thamnophis sirtalis parietalis Say"),
        ]);
        let lineage = authority("SMALL_MAMMAL").build(&record);
        assert_eq!(lineage.name_at(Rank::Subspecies), None);
    }

    #[test]
    fn trinomial_fallback_is_group_gated() {
        let record = record(&[
            ("dwc:genus", "Thamnophis"),
            ("dwc:specificEpithet", "sirtalis"),
            ("dwc:scientificName", "Thamnophis sirtalis parietalis"),
        ]);
        let lineage = authority("FISH").build(&record);
        assert_eq!(lineage.name_at(Rank::Subspecies), None);
    }

    #[test]
    fn variety_and_form_need_the_species_base() {
        let full = record(&[
            ("dwc:genus", "Betula"),
            ("dwc:specificEpithet", "pendula"),
            ("gbif:variety", "carelica"),
            ("gbif:form", "crispa"),
        ]);
        let lineage = authority("PLANT").build(&full);
        assert_eq!(
            lineage.name_at(Rank::Variety),
            Some("betula pendula var. carelica")
        );
        assert_eq!(
            lineage.name_at(Rank::Form),
            Some("betula pendula f. crispa")
        );

        let no_base = record(&[("dwc:genus", "Betula"), ("gbif:variety", "carelica")]);
        let lineage = authority("PLANT").build(&no_base);
        assert_eq!(lineage.name_at(Rank::Variety), None);
    }

    #[test]
    fn phylum_falls_back_to_division() {
        let record = record(&[
            ("dwc:kingdom", "Plantae"),
            ("dwc:phylum", ""),
            ("dwc:division", "Tracheophyta"),
        ]);
        let lineage = authority("PLANT").build(&record);
        assert_eq!(lineage.name_at(Rank::Phylum), Some("tracheophyta"));
    }

    #[test]
    fn phylum_column_wins_over_division() {
        let record = record(&[
            ("dwc:phylum", "Chordata"),
            ("dwc:division", "Tracheophyta"),
        ]);
        let lineage = authority("BIRD").build(&record);
        assert_eq!(lineage.name_at(Rank::Phylum), Some("chordata"));
    }

    #[test]
    fn repository_lineage_is_direct_lookup() {
        let record = record(&[
            ("repo_kingdom", "Plantae"),
            ("repo_division", "Tracheophyta"),
            ("repo_genus", "Quercus"),
            ("repo_species", "Quercus alba"),
        ]);
        let lineage = RepositoryLineage.build(&record);
        assert_eq!(
            lineage.entries(),
            &[
                (Rank::Kingdom, "plantae".to_string()),
                (Rank::Phylum, "tracheophyta".to_string()),
                (Rank::Genus, "quercus".to_string()),
                (Rank::Species, "quercus alba".to_string()),
            ]
        );
    }

    #[test]
    fn names_are_trimmed_and_lowercased() {
        let record = record(&[("repo_kingdom", "  Animalia  ")]);
        let lineage = RepositoryLineage.build(&record);
        assert_eq!(lineage.name_at(Rank::Kingdom), Some("animalia"));
    }
}
