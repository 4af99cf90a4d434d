use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical taxonomic ranks, ordered from most general to most specific.
///
/// This ordering is the backbone of lineage construction: lineages are
/// assembled by probing each rank in `Rank::ALL` order, and edges only ever
/// connect consecutive entries of the resulting sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Subspecies,
    Variety,
    Form,
}

impl Rank {
    pub const ALL: [Rank; 10] = [
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
        Rank::Subspecies,
        Rank::Variety,
        Rank::Form,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
            Rank::Subspecies => "subspecies",
            Rank::Variety => "variety",
            Rank::Form => "form",
        }
    }

    /// Rank depth (lower = higher in the hierarchy).
    pub fn depth(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two taxonomy feeds a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Authority,
    Repository,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Authority => "authority",
            SourceKind::Repository => "repository",
        }
    }
}

/// Taxon group code (e.g. "ALGAE", "FISH"), normalized to upper case.
///
/// A handful of groups gate extra name-construction rules; those predicates
/// live here so the lineage builders stay free of group-name literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupCode(String);

impl GroupCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Botanical groups carry the `×` hybrid marker in free-text names.
    pub fn uses_hybrid_markers(&self) -> bool {
        self.0 == "PLANT"
    }

    /// Groups whose free-text names are reliably `Genus species subspecies`
    /// trinomials when the subspecies column is blank.
    pub fn allows_trinomial_fallback(&self) -> bool {
        matches!(self.0.as_str(), "HERPETOLOGY" | "SMALL_MAMMAL")
    }
}

impl fmt::Display for GroupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The botanical hybrid marker (multiplication sign, not the letter x).
pub const HYBRID_MARKER: char = '\u{d7}';

/// Epithets that stand for "unidentified species" and never name a taxon.
pub const PLACEHOLDER_EPITHETS: [&str; 2] = ["sp.", "spp."];

/// Authority-feed columns holding directly usable rank names.
///
/// `species` and below are synthesized from the columns listed separately;
/// a blank phylum falls back to `AUTHORITY_DIVISION_COLUMN` (botanical
/// records file their phylum under the division term).
pub const AUTHORITY_RANK_COLUMNS: [(Rank, &str); 6] = [
    (Rank::Kingdom, "dwc:kingdom"),
    (Rank::Phylum, "dwc:phylum"),
    (Rank::Class, "dwc:class"),
    (Rank::Order, "dwc:order"),
    (Rank::Family, "dwc:family"),
    (Rank::Genus, "dwc:genus"),
];

pub const AUTHORITY_DIVISION_COLUMN: &str = "dwc:division";
pub const AUTHORITY_GENUS_COLUMN: &str = "dwc:genus";
pub const AUTHORITY_EPITHET_COLUMN: &str = "dwc:specificEpithet";
pub const AUTHORITY_SCIENTIFIC_NAME_COLUMN: &str = "dwc:scientificName";
pub const AUTHORITY_SUBSPECIES_COLUMN: &str = "dwc:subspecies";
pub const AUTHORITY_VARIETY_COLUMN: &str = "gbif:variety";
pub const AUTHORITY_FORM_COLUMN: &str = "gbif:form";

/// Repository-taxonomy columns, one per canonical rank. Every rank is a
/// direct lookup; the repository files its phylum under `repo_division`.
pub const REPOSITORY_RANK_COLUMNS: [(Rank, &str); 10] = [
    (Rank::Kingdom, "repo_kingdom"),
    (Rank::Phylum, "repo_division"),
    (Rank::Class, "repo_class"),
    (Rank::Order, "repo_order"),
    (Rank::Family, "repo_family"),
    (Rank::Genus, "repo_genus"),
    (Rank::Species, "repo_species"),
    (Rank::Subspecies, "repo_subspecies"),
    (Rank::Variety, "repo_variety"),
    (Rank::Form, "repo_form"),
];

pub fn authority_column(rank: Rank) -> Option<&'static str> {
    AUTHORITY_RANK_COLUMNS
        .iter()
        .find(|(r, _)| *r == rank)
        .map(|(_, column)| *column)
}

pub fn repository_column(rank: Rank) -> &'static str {
    // The table lists every rank in `Rank::ALL` order.
    REPOSITORY_RANK_COLUMNS[rank.depth() as usize].1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order_runs_general_to_specific() {
        assert!(Rank::Kingdom < Rank::Phylum);
        assert!(Rank::Genus < Rank::Species);
        assert!(Rank::Species < Rank::Subspecies);
        assert!(Rank::Variety < Rank::Form);
        assert_eq!(Rank::Kingdom.depth(), 0);
        assert_eq!(Rank::Form.depth(), 9);
    }

    #[test]
    fn group_code_normalizes_case_and_whitespace() {
        let group = GroupCode::new("  plant ");
        assert_eq!(group.as_str(), "PLANT");
        assert!(group.uses_hybrid_markers());
        assert!(!group.allows_trinomial_fallback());
    }

    #[test]
    fn trinomial_fallback_groups() {
        assert!(GroupCode::new("HERPETOLOGY").allows_trinomial_fallback());
        assert!(GroupCode::new("small_mammal").allows_trinomial_fallback());
        assert!(!GroupCode::new("FISH").allows_trinomial_fallback());
    }

    #[test]
    fn every_rank_has_a_repository_column() {
        for rank in Rank::ALL {
            assert!(repository_column(rank).starts_with("repo_"));
        }
    }
}
