use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Linnean ranks ordered from most general to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    /// Form used in backbone query parameters.
    pub fn as_query_str(&self) -> &'static str {
        match self {
            Rank::Kingdom => "KINGDOM",
            Rank::Phylum => "PHYLUM",
            Rank::Class => "CLASS",
            Rank::Order => "ORDER",
            Rank::Family => "FAMILY",
            Rank::Genus => "GENUS",
            Rank::Species => "SPECIES",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
        };
        write!(f, "{value}")
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "kingdom" => Ok(Rank::Kingdom),
            "phylum" => Ok(Rank::Phylum),
            "class" => Ok(Rank::Class),
            "order" => Ok(Rank::Order),
            "family" => Ok(Rank::Family),
            "genus" => Ok(Rank::Genus),
            "species" => Ok(Rank::Species),
            other => Err(other.to_string()),
        }
    }
}

/// Partial higher classification used to sharpen backbone matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Classification {
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.lowest_rank().is_none()
    }

    /// The most specific rank that carries a value, species first.
    pub fn lowest_rank(&self) -> Option<Rank> {
        if self.species.is_some() {
            Some(Rank::Species)
        } else if self.genus.is_some() {
            Some(Rank::Genus)
        } else if self.family.is_some() {
            Some(Rank::Family)
        } else if self.order.is_some() {
            Some(Rank::Order)
        } else if self.class.is_some() {
            Some(Rank::Class)
        } else if self.phylum.is_some() {
            Some(Rank::Phylum)
        } else if self.kingdom.is_some() {
            Some(Rank::Kingdom)
        } else {
            None
        }
    }
}

/// One name-verification request. Hashable so verification results can be
/// memoized within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxonQuery {
    pub name: String,
    pub rank: Option<Rank>,
    pub hints: Classification,
}

impl TaxonQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rank: None,
            hints: Classification::default(),
        }
    }
}

/// Confidence signal returned by the backbone. Only `Exact` is trusted to
/// populate taxonomy columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    Fuzzy,
    HigherRank,
    None,
}

impl MatchType {
    pub fn is_exact(&self) -> bool {
        matches!(self, MatchType::Exact)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            MatchType::Exact => "EXACT",
            MatchType::Fuzzy => "FUZZY",
            MatchType::HigherRank => "HIGHERRANK",
            MatchType::None => "NONE",
        };
        write!(f, "{value}")
    }
}

/// One backbone match result; fields are copied into the canonical record
/// immediately after the call.
#[derive(Debug, Clone)]
pub struct TaxonMatch {
    pub match_type: MatchType,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub scientific_name: Option<String>,
    pub rank: Option<Rank>,
    pub status: Option<String>,
    pub usage_key: Option<i64>,
}

impl TaxonMatch {
    pub fn none() -> Self {
        Self {
            match_type: MatchType::None,
            kingdom: None,
            phylum: None,
            class: None,
            order: None,
            family: None,
            genus: None,
            species: None,
            scientific_name: None,
            rank: None,
            status: None,
            usage_key: None,
        }
    }

    /// Second word of the matched species binomial, when one is present.
    pub fn specific_epithet(&self) -> Option<String> {
        let species = self.species.as_deref()?;
        let parts: Vec<&str> = species.split(' ').collect();
        if parts.len() == 2 {
            Some(parts[1].to_string())
        } else {
            None
        }
    }
}

pub const PRESENT: &str = "present";
pub const ABSENT: &str = "absent";
pub const MISAPPLIED: &str = "misapplied";

/// Occurrence status derived from an abundance count.
pub fn occurrence_status(individual_count: i64) -> &'static str {
    if individual_count > 0 { PRESENT } else { ABSENT }
}

/// A name is treated as a binomial species name only when it has exactly
/// two words and is not an open nomenclature placeholder like "Naso spp.".
pub fn is_binomial(name: &str) -> bool {
    name.split(' ').count() == 2 && !name.ends_with("spp.")
}
