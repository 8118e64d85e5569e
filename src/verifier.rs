use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::error;

use crate::backbone::BackboneClient;
use crate::error::RefineError;
use crate::taxonomy::{TaxonMatch, TaxonQuery};

/// Outcome of verifying one scientific name.
#[derive(Debug, Clone)]
pub enum Verification {
    /// Unambiguous backbone match; taxonomy columns may be populated.
    Exact(TaxonMatch),
    /// Name is on the known-valid allow-list; accepted as-is, no lookup.
    Accepted(String),
    /// Anything weaker than an exact match. Taxonomy columns stay absent
    /// and the record's status column gets the misapplied marker.
    Misapplied { name: String, match_type: String },
}

/// Wraps a backbone client with the per-run matching policy: rank
/// inference from classification hints, exact-match gating, an allow-list
/// for names missing from the backbone, once-per-name diagnostics, and a
/// memo cache so repeated names cost one service call.
///
/// State is scoped to a single dataset run; build a fresh verifier per run.
pub struct TaxonVerifier<C: BackboneClient> {
    client: C,
    allow_list: HashSet<String>,
    names_not_found: BTreeSet<String>,
    cache: HashMap<TaxonQuery, TaxonMatch>,
}

impl<C: BackboneClient> TaxonVerifier<C> {
    pub fn new(client: C, allow_list: &[&str]) -> Self {
        Self {
            client,
            allow_list: allow_list.iter().map(|name| name.to_string()).collect(),
            names_not_found: BTreeSet::new(),
            cache: HashMap::new(),
        }
    }

    pub fn verify(&mut self, mut query: TaxonQuery) -> Result<Verification, RefineError> {
        if self.allow_list.contains(&query.name) {
            return Ok(Verification::Accepted(query.name));
        }

        // use the lowest populated hint rank when the caller gave none
        if query.rank.is_none() {
            query.rank = query.hints.lowest_rank();
        }

        let result = match self.cache.get(&query) {
            Some(cached) => cached.clone(),
            None => {
                let fetched = self.client.match_name(&query)?;
                self.cache.insert(query.clone(), fetched.clone());
                fetched
            }
        };

        if result.match_type.is_exact() {
            return Ok(Verification::Exact(result));
        }

        if self.names_not_found.insert(query.name.clone()) {
            error!(
                "{} match for: {} (with rank {}) to: {} (with rank {})",
                result.match_type,
                query.name,
                query
                    .rank
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                result.scientific_name.as_deref().unwrap_or("none"),
                result
                    .rank
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            );
        }

        Ok(Verification::Misapplied {
            name: query.name,
            match_type: result.match_type.to_string(),
        })
    }

    /// Distinct names that failed to match, sorted for reporting.
    pub fn names_not_found(&self) -> Vec<String> {
        self.names_not_found.iter().cloned().collect()
    }
}
