//! Monthly fish survey collected from the cooling-water intake screens of
//! two coastal power stations. The source file is tab-delimited with one
//! header row; sampling ran 24 hours per monthly visit, so one station and
//! month form one sampling event. Early survey years recorded
//! presence/absence only, which is why an empty count maps to "absent"
//! rather than being rejected.

use crate::mapping::{
    ColumnOverride, ColumnRule, DatasetMapping, DateGranularity, DateRule, DateSource, HintColumns,
    KeyPart, KeyTemplate, SourceFormat, TaxonRule, TaxonTargets, VerbatimCheck,
};

// source columns
const YEAR: usize = 1;
const MONTH: usize = 2;
const EVENT_DATE: usize = 3;
const LOCATION_ID: usize = 4;
const FAMILY: usize = 5;
const SCIENTIFIC_NAME: usize = 6;
const INDIVIDUAL_COUNT: usize = 8;

// augmented columns
const EVENT_ID: usize = 0;
const ORGANISM_QUANTITY: usize = 9;
const ORGANISM_QUANTITY_TYPE: usize = 10;
const OCCURRENCE_STATUS: usize = 11;
const COUNTRY: usize = 12;
const COUNTRY_CODE: usize = 13;
const LOCALITY: usize = 14;
const DECIMAL_LATITUDE: usize = 15;
const DECIMAL_LONGITUDE: usize = 16;
const SAMPLING_PROTOCOL: usize = 17;
const SAMPLE_SIZE_VALUE: usize = 18;
const SAMPLE_SIZE_UNIT: usize = 19;
const SAMPLING_EFFORT: usize = 20;
const LICENSE: usize = 21;
const TYPE: usize = 22;
const RIGHTS_HOLDER: usize = 23;
const BASIS_OF_RECORD: usize = 24;
const OCCURRENCE_ID: usize = 25;
const KINGDOM_GBIF: usize = 26;
const PHYLUM_GBIF: usize = 27;
const CLASS_GBIF: usize = 28;
const ORDER_GBIF: usize = 29;
const FAMILY_GBIF: usize = 30;
const GENUS_GBIF: usize = 31;
const SCIENTIFIC_NAME_GBIF: usize = 32;
const TAXON_RANK: usize = 33;
const TAXON_ID_GBIF: usize = 34;
const TAXONOMIC_STATUS_GBIF: usize = 35;

pub fn mapping() -> DatasetMapping {
    DatasetMapping {
        name: "intake-fish",
        source: SourceFormat {
            delimiter: b'\t',
            quote: None,
            encoding: "utf-8",
            skip_rows: 1,
        },
        events_file: "events.txt",
        occurrences_file: "occurrences.txt",
        header: &[
            "eventID",
            "year",
            "month",
            "eventDate",
            "locationID",
            "family",
            "scientificName",
            "vernacularName",
            "individualCount",
            "organismQuantity",
            "organismQuantityType",
            "occurrenceStatus",
            "country",
            "countryCode",
            "locality",
            "decimalLatitude",
            "decimalLongitude",
            "samplingProtocol",
            "sampleSizeValue",
            "sampleSizeUnit",
            "samplingEffort",
            "license",
            "type",
            "rightsHolder",
            "basisOfRecord",
            "occurrenceID",
            "kingdom_gbif",
            "phylum_gbif",
            "class_gbif",
            "order_gbif",
            "family_gbif",
            "genus_gbif",
            "scientificName_gbif",
            "taxonRank",
            "taxonID_gbif",
            "taxonomicStatus_gbif",
        ],
        required: &[SCIENTIFIC_NAME],
        overrides: vec![
            ColumnOverride {
                target: LOCATION_ID,
                rule: ColumnRule::Upper { from: LOCATION_ID },
            },
            ColumnOverride {
                target: ORGANISM_QUANTITY,
                rule: ColumnRule::Copy {
                    from: INDIVIDUAL_COUNT,
                },
            },
            ColumnOverride {
                target: ORGANISM_QUANTITY_TYPE,
                rule: ColumnRule::Const("individuals"),
            },
            ColumnOverride {
                target: OCCURRENCE_STATUS,
                rule: ColumnRule::PresenceStatus {
                    from: INDIVIDUAL_COUNT,
                },
            },
            ColumnOverride {
                target: COUNTRY,
                rule: ColumnRule::Const("Taiwan"),
            },
            ColumnOverride {
                target: COUNTRY_CODE,
                rule: ColumnRule::Const("TW"),
            },
            ColumnOverride {
                target: LOCALITY,
                rule: ColumnRule::Lookup {
                    from: LOCATION_ID,
                    table: &[
                        ("S1", "Power station intake at Shihmen"),
                        ("S2", "Power station intake at Yehliu"),
                    ],
                    default: None,
                },
            },
            ColumnOverride {
                target: DECIMAL_LATITUDE,
                rule: ColumnRule::Lookup {
                    from: LOCATION_ID,
                    table: &[("S1", "25.28583"), ("S2", "25.20278")],
                    default: None,
                },
            },
            ColumnOverride {
                target: DECIMAL_LONGITUDE,
                rule: ColumnRule::Lookup {
                    from: LOCATION_ID,
                    table: &[("S1", "121.5861"), ("S2", "121.6625")],
                    default: None,
                },
            },
            ColumnOverride {
                target: SAMPLING_PROTOCOL,
                rule: ColumnRule::Const(
                    "fish collected monthly from the intake screens over a 24 h period, \
                     sampling date chosen by systematic sampling",
                ),
            },
            ColumnOverride {
                target: SAMPLE_SIZE_VALUE,
                rule: ColumnRule::Const("24"),
            },
            ColumnOverride {
                target: SAMPLE_SIZE_UNIT,
                rule: ColumnRule::Const("hour"),
            },
            ColumnOverride {
                target: SAMPLING_EFFORT,
                rule: ColumnRule::Const("24hr"),
            },
            ColumnOverride {
                target: LICENSE,
                rule: ColumnRule::Const(
                    "http://creativecommons.org/publicdomain/zero/1.0/legalcode",
                ),
            },
            ColumnOverride {
                target: TYPE,
                rule: ColumnRule::Const("Event"),
            },
            ColumnOverride {
                target: RIGHTS_HOLDER,
                rule: ColumnRule::Const("Institute of Coastal Ecology"),
            },
            ColumnOverride {
                target: BASIS_OF_RECORD,
                rule: ColumnRule::Const("MaterialSample"),
            },
        ],
        date: Some(DateRule {
            source: DateSource::YearAndMonth {
                year: YEAR,
                month: MONTH,
            },
            target: EVENT_DATE,
            cross_check: Some(VerbatimCheck {
                from: EVENT_DATE,
                format: "%Y/%m/",
                granularity: DateGranularity::YearMonth,
            }),
        }),
        event_key: KeyTemplate {
            target: Some(EVENT_ID),
            parts: &[
                KeyPart::Lit("urn:ice:"),
                KeyPart::Col(EVENT_DATE),
                KeyPart::Lit(":"),
                KeyPart::Col(LOCATION_ID),
            ],
        },
        occurrence_id: Some(KeyTemplate {
            target: Some(OCCURRENCE_ID),
            parts: &[
                KeyPart::Col(EVENT_ID),
                KeyPart::Lit(":"),
                KeyPart::Col(TAXON_ID_GBIF),
            ],
        }),
        taxonomy: Some(TaxonRule {
            name_from: SCIENTIFIC_NAME,
            rank_from: None,
            default_rank: None,
            hints: HintColumns {
                family: Some(FAMILY),
                ..HintColumns::default()
            },
            species_hint_if_binomial: true,
            targets: TaxonTargets {
                kingdom: Some(KINGDOM_GBIF),
                phylum: Some(PHYLUM_GBIF),
                class: Some(CLASS_GBIF),
                order: Some(ORDER_GBIF),
                family: Some(FAMILY_GBIF),
                genus: Some(GENUS_GBIF),
                scientific_name: Some(SCIENTIFIC_NAME_GBIF),
                rank: Some(TAXON_RANK),
                usage_key: Some(TAXON_ID_GBIF),
                status: Some(TAXONOMIC_STATUS_GBIF),
                ..TaxonTargets::default()
            },
        }),
        allow_list: &[],
    }
}
