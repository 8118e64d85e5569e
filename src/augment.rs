use chrono::{Datelike, NaiveDate};

use crate::backbone::BackboneClient;
use crate::error::RefineError;
use crate::mapping::{
    ColumnOverride, ColumnRule, DatasetMapping, DateGranularity, DateRule, DateSource, KeyPart,
    KeyTemplate,
};
use crate::row;
use crate::taxonomy::{
    ABSENT, Classification, MISAPPLIED, TaxonQuery, is_binomial, occurrence_status,
};
use crate::verifier::{TaxonVerifier, Verification};

/// Result of one augmentation pass. Structural problems produce `Skipped`;
/// only infrastructural errors (service, I/O) escape as `Err`.
#[derive(Debug)]
pub enum Augmented {
    Record {
        fields: Vec<Option<String>>,
        event_key: String,
    },
    Skipped {
        reason: String,
    },
}

/// Maps one raw record onto the canonical header: pad, check required
/// fields, apply column rules, normalize dates, synthesize the event key,
/// verify taxonomy, synthesize the occurrence id.
pub fn augment<C: BackboneClient>(
    raw: &[String],
    mapping: &DatasetMapping,
    verifier: &mut TaxonVerifier<C>,
) -> Result<Augmented, RefineError> {
    let skipped = |reason: String| Ok(Augmented::Skipped { reason });

    // pad to header length; cleaning early keeps empty-checks consistent
    // with what the codec would emit
    let mut fields: Vec<Option<String>> = (0..mapping.header.len())
        .map(|i| raw.get(i).and_then(|value| row::clean_field(value)))
        .collect();

    for &index in mapping.required {
        if fields[index].is_none() {
            return skipped(format!(
                "required field '{}' is empty",
                mapping.header[index]
            ));
        }
    }

    for over in &mapping.overrides {
        if let Err(reason) = apply_rule(&mut fields, over) {
            return skipped(reason);
        }
    }

    if let Some(rule) = &mapping.date {
        if let Err(reason) = apply_date(&mut fields, rule) {
            return skipped(reason);
        }
    }

    let event_key = render_key(&fields, &mapping.event_key);
    if event_key.is_empty() {
        return skipped("event key is empty".to_string());
    }
    if let Some(target) = mapping.event_key.target {
        fields[target] = Some(event_key.clone());
    }

    if let Some(rule) = &mapping.taxonomy {
        let name = match fields[rule.name_from].clone() {
            Some(name) => name,
            None => return skipped("scientific name is empty".to_string()),
        };

        let explicit_rank = rule
            .rank_from
            .and_then(|index| fields[index].as_deref())
            .and_then(|value| value.parse().ok());
        let rank = explicit_rank.or(rule.default_rank);

        let pick = |index: Option<usize>| index.and_then(|i| fields[i].clone());
        let mut hints = Classification {
            kingdom: pick(rule.hints.kingdom),
            phylum: pick(rule.hints.phylum),
            class: pick(rule.hints.class),
            order: pick(rule.hints.order),
            family: pick(rule.hints.family),
            genus: pick(rule.hints.genus),
            species: None,
        };
        if rule.species_hint_if_binomial && is_binomial(&name) {
            hints.species = Some(name.clone());
        }

        // record the lowest known rank even when the match fails; an exact
        // match overwrites it with the backbone's rank below
        if let Some(target) = rule.targets.rank {
            if let Some(known) = rank.or_else(|| hints.lowest_rank()) {
                fields[target] = Some(known.to_string());
            }
        }

        let query = TaxonQuery {
            name,
            rank,
            hints,
        };
        match verifier.verify(query)? {
            Verification::Exact(matched) => {
                let targets = &rule.targets;
                let writes = [
                    (targets.kingdom, matched.kingdom.clone()),
                    (targets.phylum, matched.phylum.clone()),
                    (targets.class, matched.class.clone()),
                    (targets.order, matched.order.clone()),
                    (targets.family, matched.family.clone()),
                    (targets.genus, matched.genus.clone()),
                    (targets.specific_epithet, matched.specific_epithet()),
                    (targets.scientific_name, matched.scientific_name.clone()),
                    (targets.rank, matched.rank.map(|r| r.to_string())),
                    (targets.usage_key, matched.usage_key.map(|k| k.to_string())),
                    (targets.status, matched.status.clone()),
                ];
                for (target, value) in writes {
                    if let (Some(target), Some(value)) = (target, value) {
                        fields[target] = Some(value);
                    }
                }
            }
            Verification::Accepted(name) => {
                if let Some(target) = rule.targets.scientific_name {
                    fields[target] = Some(name);
                }
            }
            Verification::Misapplied { .. } => {
                if let Some(target) = rule.targets.status {
                    fields[target] = Some(MISAPPLIED.to_string());
                }
            }
        }
    }

    if let Some(template) = &mapping.occurrence_id {
        let id = render_key(&fields, template);
        if let Some(target) = template.target {
            fields[target] = Some(id);
        }
    }

    Ok(Augmented::Record { fields, event_key })
}

fn apply_rule(fields: &mut [Option<String>], over: &ColumnOverride) -> Result<(), String> {
    let value = match &over.rule {
        ColumnRule::Copy { from } => fields[*from].clone(),
        ColumnRule::Upper { from } => fields[*from].as_ref().map(|v| v.to_uppercase()),
        ColumnRule::Const(text) => Some((*text).to_string()),
        ColumnRule::WithSuffix { from, suffix } => {
            fields[*from].as_ref().map(|v| format!("{v}{suffix}"))
        }
        ColumnRule::WithPrefix { from, prefix } => {
            fields[*from].as_ref().map(|v| format!("{prefix}{v}"))
        }
        ColumnRule::Concat { parts, separator } => {
            let joined = parts
                .iter()
                .map(|&index| fields[index].as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(separator);
            Some(joined)
        }
        ColumnRule::Lookup {
            from,
            table,
            default,
        } => {
            let found = fields[*from].as_deref().and_then(|key| {
                table
                    .iter()
                    .find(|(candidate, _)| *candidate == key)
                    .map(|(_, value)| (*value).to_string())
            });
            found.or_else(|| default.map(|value| value.to_string()))
        }
        ColumnRule::PresenceStatus { from } => match fields[*from].as_deref() {
            None => Some(ABSENT.to_string()),
            Some(value) => {
                let count: i64 = value
                    .parse()
                    .map_err(|_| format!("invalid individual count '{value}'"))?;
                Some(occurrence_status(count).to_string())
            }
        },
    };
    fields[over.target] = value;
    Ok(())
}

fn apply_date(fields: &mut [Option<String>], rule: &DateRule) -> Result<(), String> {
    let (date, granularity) = match &rule.source {
        DateSource::YearAndMonth { year, month } => {
            let year = fields[*year].as_deref().unwrap_or("");
            let month = fields[*month].as_deref().unwrap_or("");
            if year.len() != 4 || month.len() != 3 {
                return Err(format!("invalid year ({year}) and month ({month})"));
            }
            let date = NaiveDate::parse_from_str(&format!("{year}-{month}-1"), "%Y-%b-%d")
                .map_err(|_| format!("invalid year ({year}) and month ({month})"))?;
            (date, DateGranularity::YearMonth)
        }
        DateSource::Verbatim {
            from,
            format,
            granularity,
        } => {
            let value = fields[*from]
                .as_deref()
                .ok_or_else(|| "date field is empty".to_string())?;
            (parse_date(value, format, *granularity)?, *granularity)
        }
    };

    if let Some(cross) = &rule.cross_check {
        // an absent verbatim date simply goes unchecked
        if let Some(value) = fields[cross.from].as_deref() {
            let other = parse_date(value, cross.format, cross.granularity)?;
            let coarse = if granularity == DateGranularity::YearMonth
                || cross.granularity == DateGranularity::YearMonth
            {
                DateGranularity::YearMonth
            } else {
                DateGranularity::Day
            };
            let derived = format_date(&date, coarse);
            let verbatim = format_date(&other, coarse);
            if derived != verbatim {
                return Err(format!(
                    "derived date {derived} does not match verbatim date {verbatim}"
                ));
            }
        }
    }

    fields[rule.target] = Some(format_date(&date, granularity));
    Ok(())
}

fn parse_date(
    value: &str,
    format: &str,
    granularity: DateGranularity,
) -> Result<NaiveDate, String> {
    let result = match granularity {
        DateGranularity::Day => NaiveDate::parse_from_str(value, format),
        // the format consumes the whole value; a synthetic first-of-month
        // day satisfies the parser
        DateGranularity::YearMonth => {
            NaiveDate::parse_from_str(&format!("{value}1"), &format!("{format}%d"))
        }
    };
    result.map_err(|_| format!("unparsable date '{value}'"))
}

fn format_date(date: &NaiveDate, granularity: DateGranularity) -> String {
    match granularity {
        DateGranularity::YearMonth => format!("{:04}-{:02}", date.year(), date.month()),
        DateGranularity::Day => date.format("%Y-%m-%d").to_string(),
    }
}

fn render_key(fields: &[Option<String>], template: &KeyTemplate) -> String {
    template
        .parts
        .iter()
        .map(|part| match part {
            KeyPart::Lit(text) => (*text).to_string(),
            KeyPart::Col(index) => fields[*index].clone().unwrap_or_default(),
        })
        .collect()
}
