//! Large-mammal observations from a fixed grid of camera-trap stations.
//! Each source row is one picture sequence in which a mammal was detected;
//! the logger already assigns a per-session event identifier and an ISO
//! event date, so no date normalization is needed. Ranks come from a
//! source column and default to species when missing. A few locally
//! recognized subspecies are absent from the backbone and ride the
//! allow-list instead of being flagged.

use crate::mapping::{
    ColumnOverride, ColumnRule, DatasetMapping, HintColumns, KeyPart, KeyTemplate, SourceFormat,
    TaxonRule, TaxonTargets,
};
use crate::taxonomy::Rank;

// source columns
const EVENT_ID: usize = 8;
const CAMERA_ID: usize = 9;
const SCIENTIFIC_NAME: usize = 10;
const TAXON_RANK: usize = 11;
const INDIVIDUAL_COUNT: usize = 13;

// augmented columns
const OCCURRENCE_STATUS: usize = 14;
const GEODETIC_DATUM: usize = 15;
const BASIS_OF_RECORD: usize = 16;
const LICENSE: usize = 17;
const RIGHTS_HOLDER: usize = 18;
const INSTITUTION_CODE: usize = 19;
const OCCURRENCE_ID: usize = 20;
const KINGDOM: usize = 21;
const PHYLUM: usize = 22;
const CLASS: usize = 23;
const ORDER: usize = 24;
const FAMILY: usize = 25;
const GENUS: usize = 26;
const SPECIFIC_EPITHET: usize = 27;
const SCIENTIFIC_NAME_GBIF: usize = 28;
const TAXONOMIC_STATUS: usize = 29;
const TAXON_ID: usize = 30;

pub fn mapping() -> DatasetMapping {
    DatasetMapping {
        name: "camera-traps",
        source: SourceFormat {
            delimiter: b',',
            quote: Some(b'"'),
            encoding: "latin1",
            skip_rows: 1,
        },
        events_file: "events.txt",
        occurrences_file: "occurrences.txt",
        header: &[
            "campaign",
            "year",
            "site",
            "habitat",
            "decimalLongitude",
            "decimalLatitude",
            "eventDate",
            "recordedBy",
            "eventID",
            "cameraID",
            "scientificName",
            "taxonRank",
            "vernacularName",
            "individualCount",
            "occurrenceStatus",
            "geodeticDatum",
            "basisOfRecord",
            "license",
            "rightsHolder",
            "institutionCode",
            "occurrenceID",
            "kingdom",
            "phylum",
            "class",
            "order",
            "family",
            "genus",
            "specificEpithet",
            "scientificName_gbif",
            "taxonomicStatus",
            "taxonID",
        ],
        required: &[EVENT_ID, SCIENTIFIC_NAME],
        overrides: vec![
            ColumnOverride {
                target: OCCURRENCE_STATUS,
                rule: ColumnRule::PresenceStatus {
                    from: INDIVIDUAL_COUNT,
                },
            },
            ColumnOverride {
                target: GEODETIC_DATUM,
                rule: ColumnRule::Const("WGS84"),
            },
            ColumnOverride {
                target: BASIS_OF_RECORD,
                rule: ColumnRule::Const("MachineObservation"),
            },
            ColumnOverride {
                target: LICENSE,
                rule: ColumnRule::Const(
                    "http://creativecommons.org/licenses/by/4.0/legalcode",
                ),
            },
            ColumnOverride {
                target: RIGHTS_HOLDER,
                rule: ColumnRule::Const("National Wildlife Monitoring Scheme"),
            },
            ColumnOverride {
                target: INSTITUTION_CODE,
                rule: ColumnRule::Const("NWMS"),
            },
        ],
        date: None,
        event_key: KeyTemplate {
            target: None,
            parts: &[KeyPart::Col(EVENT_ID)],
        },
        occurrence_id: Some(KeyTemplate {
            target: Some(OCCURRENCE_ID),
            parts: &[
                KeyPart::Lit("urn:nwms:"),
                KeyPart::Col(EVENT_ID),
                KeyPart::Lit(":"),
                KeyPart::Col(CAMERA_ID),
                KeyPart::Lit(":"),
                KeyPart::Col(SCIENTIFIC_NAME),
            ],
        }),
        taxonomy: Some(TaxonRule {
            name_from: SCIENTIFIC_NAME,
            rank_from: Some(TAXON_RANK),
            default_rank: Some(Rank::Species),
            hints: HintColumns::default(),
            species_hint_if_binomial: false,
            targets: TaxonTargets {
                kingdom: Some(KINGDOM),
                phylum: Some(PHYLUM),
                class: Some(CLASS),
                order: Some(ORDER),
                family: Some(FAMILY),
                genus: Some(GENUS),
                specific_epithet: Some(SPECIFIC_EPITHET),
                scientific_name: Some(SCIENTIFIC_NAME_GBIF),
                status: Some(TAXONOMIC_STATUS),
                usage_key: Some(TAXON_ID),
                ..TaxonTargets::default()
            },
        }),
        allow_list: &["Gazella gazella acaciae", "Canis lupus pallipes"],
    }
}
