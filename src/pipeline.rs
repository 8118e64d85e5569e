use camino::Utf8Path;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::augment::{Augmented, augment};
use crate::backbone::BackboneClient;
use crate::error::RefineError;
use crate::mapping::DatasetMapping;
use crate::reader::RecordSource;
use crate::verifier::TaxonVerifier;
use crate::writer::StarWriter;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "message")]
pub enum RunOutcome {
    Completed,
    Failed(String),
}

/// Counters and diagnostics for one dataset run, reported whether the run
/// completed or aborted.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dataset: String,
    pub rows: u64,
    pub skipped: u64,
    pub occurrences: u64,
    pub unique_events: usize,
    pub names_not_found: Vec<String>,
    pub outcome: RunOutcome,
}

/// Drives one dataset start to finish: for each raw record, augment,
/// encode, write the occurrence, and write the event on first sight of its
/// key. Structural problems skip the record; infrastructural failures end
/// the run. Both paths close the output streams and report counters.
pub struct Pipeline<C: BackboneClient> {
    mapping: DatasetMapping,
    verifier: TaxonVerifier<C>,
}

impl<C: BackboneClient> Pipeline<C> {
    pub fn new(mapping: DatasetMapping, client: C) -> Result<Self, RefineError> {
        mapping.validate()?;
        let verifier = TaxonVerifier::new(client, mapping.allow_list);
        Ok(Self { mapping, verifier })
    }

    /// Returns `Err` only when the output streams cannot be opened; any
    /// later failure is folded into the report's outcome so the summary is
    /// always produced. Already-written lines are never rolled back.
    pub fn run<S: RecordSource>(
        mut self,
        mut source: S,
        output: &Utf8Path,
    ) -> Result<RunReport, RefineError> {
        let mut writer = StarWriter::create(
            output,
            self.mapping.header,
            self.mapping.events_file,
            self.mapping.occurrences_file,
        )?;

        let mut rows = 0u64;
        let mut skipped = 0u64;
        let mut occurrences = 0u64;

        let mut failure: Option<String> = None;
        loop {
            let record = match source.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(err) => {
                    failure = Some(err.to_string());
                    break;
                }
            };
            rows += 1;
            if record.is_empty() {
                continue;
            }

            match augment(&record, &self.mapping, &mut self.verifier) {
                Ok(Augmented::Skipped { reason }) => {
                    error!("skipping record {rows}: {reason}");
                    skipped += 1;
                }
                Ok(Augmented::Record { fields, event_key }) => {
                    let written = writer
                        .write_occurrence(&fields)
                        .and_then(|_| writer.write_event_if_new(&fields, &event_key));
                    match written {
                        Ok(_) => occurrences += 1,
                        Err(err) => {
                            failure = Some(err.to_string());
                            break;
                        }
                    }
                }
                Err(err) => {
                    failure = Some(err.to_string());
                    break;
                }
            }
        }

        let unique_events = writer.unique_events();
        if let Err(err) = writer.close() {
            failure.get_or_insert(err.to_string());
        }

        let names_not_found = self.verifier.names_not_found();
        info!("iterated over {rows} rows");
        info!("found {unique_events} unique events");
        if !names_not_found.is_empty() {
            warn!("{} names not found in backbone:", names_not_found.len());
            for name in &names_not_found {
                warn!("{name}");
            }
        }

        let outcome = match failure {
            Some(message) => {
                error!("run aborted for {}: {message}", self.mapping.name);
                RunOutcome::Failed(message)
            }
            None => RunOutcome::Completed,
        };

        Ok(RunReport {
            dataset: self.mapping.name.to_string(),
            rows,
            skipped,
            occurrences,
            unique_events,
            names_not_found,
            outcome,
        })
    }
}
