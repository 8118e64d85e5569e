use crate::error::RefineError;
use crate::taxonomy::Rank;

/// Physical shape of one dataset's source file.
#[derive(Debug, Clone, Copy)]
pub struct SourceFormat {
    pub delimiter: u8,
    pub quote: Option<u8>,
    /// WHATWG encoding label, e.g. "utf-8", "latin1", "windows-1252".
    pub encoding: &'static str,
    /// Leading rows to discard (column headers, preamble).
    pub skip_rows: usize,
}

/// One column-level transformation. Rules are applied in declaration order
/// and read the canonical record as built so far, so a rule may observe the
/// output of an earlier rule (e.g. `Lookup` after `Upper` on the same
/// column).
#[derive(Debug, Clone)]
pub enum ColumnRule {
    /// Copy another canonical column.
    Copy { from: usize },
    /// Uppercase a column in place (or into another column).
    Upper { from: usize },
    /// Dataset-wide static value.
    Const(&'static str),
    /// Unit-qualified string, e.g. "12.5" -> "12.5 m".
    WithSuffix { from: usize, suffix: &'static str },
    WithPrefix { from: usize, prefix: &'static str },
    /// Join several columns, absent parts contributing empty strings, e.g.
    /// higher geography from country | realm | ecoregion.
    Concat {
        parts: &'static [usize],
        separator: &'static str,
    },
    /// Value-keyed static constants, e.g. per-station locality names.
    Lookup {
        from: usize,
        table: &'static [(&'static str, &'static str)],
        default: Option<&'static str>,
    },
    /// "present" when the referenced count is > 0, "absent" when it is 0 or
    /// the column is empty. A non-numeric value is a structural skip.
    PresenceStatus { from: usize },
}

#[derive(Debug, Clone)]
pub struct ColumnOverride {
    pub target: usize,
    pub rule: ColumnRule,
}

/// Where a normalized ISO date comes from.
#[derive(Debug, Clone)]
pub enum DateSource {
    /// A 4-digit-year column plus an English month-abbreviation column,
    /// combined into ISO year-month.
    YearAndMonth { year: usize, month: usize },
    /// A verbatim date column parsed with a chrono format string.
    Verbatim {
        from: usize,
        format: &'static str,
        granularity: DateGranularity,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGranularity {
    YearMonth,
    Day,
}

/// Cross-check source: a verbatim date column that must agree with the
/// derived date once both are normalized. Disagreement skips the record.
#[derive(Debug, Clone)]
pub struct VerbatimCheck {
    pub from: usize,
    pub format: &'static str,
    pub granularity: DateGranularity,
}

#[derive(Debug, Clone)]
pub struct DateRule {
    pub source: DateSource,
    pub target: usize,
    pub cross_check: Option<VerbatimCheck>,
}

/// Deterministic identifier synthesis from literals and canonical columns,
/// e.g. `urn:<institution>:<eventDate>:<locationID>`.
#[derive(Debug, Clone)]
pub struct KeyTemplate {
    /// Column the assembled key is written to, when it has one of its own.
    pub target: Option<usize>,
    pub parts: &'static [KeyPart],
}

#[derive(Debug, Clone, Copy)]
pub enum KeyPart {
    Lit(&'static str),
    Col(usize),
}

/// Columns feeding the classification hints of a `TaxonQuery`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintColumns {
    pub kingdom: Option<usize>,
    pub phylum: Option<usize>,
    pub class: Option<usize>,
    pub order: Option<usize>,
    pub family: Option<usize>,
    pub genus: Option<usize>,
}

/// Output columns populated from an exact backbone match. Absent targets
/// are simply not written.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxonTargets {
    pub kingdom: Option<usize>,
    pub phylum: Option<usize>,
    pub class: Option<usize>,
    pub order: Option<usize>,
    pub family: Option<usize>,
    pub genus: Option<usize>,
    pub specific_epithet: Option<usize>,
    pub scientific_name: Option<usize>,
    pub rank: Option<usize>,
    pub usage_key: Option<usize>,
    pub status: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct TaxonRule {
    /// Canonical column holding the scientific name.
    pub name_from: usize,
    /// Optional column carrying a rank word; unparsable values fall through
    /// to `default_rank`.
    pub rank_from: Option<usize>,
    pub default_rank: Option<Rank>,
    pub hints: HintColumns,
    /// Set the species hint only when the name is a clean binomial.
    pub species_hint_if_binomial: bool,
    pub targets: TaxonTargets,
}

/// Declarative description of one dataset: where fields come from, which
/// constants and derivations fill the remaining columns, and how events,
/// occurrences and taxonomy are keyed. Consumed by the generic augmenter.
#[derive(Debug, Clone)]
pub struct DatasetMapping {
    pub name: &'static str,
    pub source: SourceFormat,
    pub events_file: &'static str,
    pub occurrences_file: &'static str,
    pub header: &'static [&'static str],
    /// Raw fields that must be non-empty for a record to survive.
    pub required: &'static [usize],
    pub overrides: Vec<ColumnOverride>,
    pub date: Option<DateRule>,
    pub event_key: KeyTemplate,
    pub occurrence_id: Option<KeyTemplate>,
    pub taxonomy: Option<TaxonRule>,
    /// Names known to be valid but absent from the backbone.
    pub allow_list: &'static [&'static str],
}

impl DatasetMapping {
    /// Rejects mappings referring to columns outside the header.
    pub fn validate(&self) -> Result<(), RefineError> {
        let len = self.header.len();
        let fail = |message: String| RefineError::InvalidMapping {
            dataset: self.name.to_string(),
            message,
        };
        let check = |index: usize, what: &str| {
            if index >= len {
                Err(fail(format!("{what} column {index} out of range (header has {len})")))
            } else {
                Ok(())
            }
        };

        for &index in self.required {
            check(index, "required")?;
        }
        for over in &self.overrides {
            check(over.target, "override target")?;
            match &over.rule {
                ColumnRule::Copy { from }
                | ColumnRule::Upper { from }
                | ColumnRule::WithSuffix { from, .. }
                | ColumnRule::WithPrefix { from, .. }
                | ColumnRule::Lookup { from, .. }
                | ColumnRule::PresenceStatus { from } => check(*from, "override source")?,
                ColumnRule::Concat { parts, .. } => {
                    for &part in *parts {
                        check(part, "concat part")?;
                    }
                }
                ColumnRule::Const(_) => {}
            }
        }
        if let Some(date) = &self.date {
            check(date.target, "date target")?;
            match &date.source {
                DateSource::YearAndMonth { year, month } => {
                    check(*year, "date year")?;
                    check(*month, "date month")?;
                }
                DateSource::Verbatim { from, .. } => check(*from, "date source")?,
            }
            if let Some(cross) = &date.cross_check {
                check(cross.from, "date cross-check")?;
            }
        }
        for template in std::iter::once(&self.event_key).chain(self.occurrence_id.iter()) {
            if let Some(target) = template.target {
                check(target, "key target")?;
            }
            for part in template.parts {
                if let KeyPart::Col(index) = part {
                    check(*index, "key part")?;
                }
            }
        }
        if let Some(taxonomy) = &self.taxonomy {
            check(taxonomy.name_from, "taxon name")?;
            if let Some(index) = taxonomy.rank_from {
                check(index, "taxon rank")?;
            }
            let hints = &taxonomy.hints;
            for index in [
                hints.kingdom,
                hints.phylum,
                hints.class,
                hints.order,
                hints.family,
                hints.genus,
            ]
            .into_iter()
            .flatten()
            {
                check(index, "taxon hint")?;
            }
            let targets = &taxonomy.targets;
            for index in [
                targets.kingdom,
                targets.phylum,
                targets.class,
                targets.order,
                targets.family,
                targets.genus,
                targets.specific_epithet,
                targets.scientific_name,
                targets.rank,
                targets.usage_key,
                targets.status,
            ]
            .into_iter()
            .flatten()
            {
                check(index, "taxon target")?;
            }
        }
        if self.event_key.parts.is_empty() {
            return Err(fail("event key template is empty".to_string()));
        }
        Ok(())
    }
}
