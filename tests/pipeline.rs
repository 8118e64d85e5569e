use std::fs;

use camino::Utf8PathBuf;

use dwc_refine::backbone::BackboneClient;
use dwc_refine::datasets;
use dwc_refine::error::RefineError;
use dwc_refine::pipeline::{Pipeline, RunOutcome};
use dwc_refine::reader::{DelimitedReader, RecordSource};
use dwc_refine::taxonomy::{MatchType, Rank, TaxonMatch, TaxonQuery};

/// Returns an exact match for names in the fixture list, a fuzzy match for
/// everything else.
struct MockBackbone {
    exact: Vec<(&'static str, i64)>,
}

impl MockBackbone {
    fn new() -> Self {
        Self {
            exact: vec![
                ("Gazella gazella", 2440902),
                ("Canis aureus", 5219234),
                ("Hystrix indica", 2436694),
                ("Naso lituratus", 2372388),
            ],
        }
    }
}

impl BackboneClient for MockBackbone {
    fn match_name(&self, query: &TaxonQuery) -> Result<TaxonMatch, RefineError> {
        let mut result = TaxonMatch::none();
        match self.exact.iter().find(|(name, _)| *name == query.name) {
            Some((name, key)) => {
                result.match_type = MatchType::Exact;
                result.kingdom = Some("Animalia".to_string());
                result.phylum = Some("Chordata".to_string());
                result.species = Some((*name).to_string());
                result.scientific_name = Some((*name).to_string());
                result.rank = Some(Rank::Species);
                result.status = Some("accepted".to_string());
                result.usage_key = Some(*key);
            }
            None => {
                result.match_type = MatchType::Fuzzy;
                result.scientific_name = Some(query.name.clone());
            }
        }
        Ok(result)
    }
}

struct FailingBackbone;

impl BackboneClient for FailingBackbone {
    fn match_name(&self, _query: &TaxonQuery) -> Result<TaxonMatch, RefineError> {
        Err(RefineError::BackboneHttp("connection refused".to_string()))
    }
}

struct VecSource(std::vec::IntoIter<Vec<String>>);

impl VecSource {
    /// Builds a source from comma-joined rows, mirroring what the real
    /// reader would yield.
    fn from_csv(rows: &[String]) -> Self {
        Self(
            rows.iter()
                .map(|row| row.split(',').map(String::from).collect())
                .collect::<Vec<_>>()
                .into_iter(),
        )
    }
}

impl RecordSource for VecSource {
    fn next_record(&mut self) -> Result<Option<Vec<String>>, RefineError> {
        Ok(self.0.next())
    }
}

fn camera_row(event_id: &str, camera_id: &str, name: &str, count: &str) -> String {
    format!(
        "winter-2016,2016,Carmel,woodland,35.0063,32.7419,2016-01-14,M. Dorman,{event_id},{camera_id},{name},species,,{count}"
    )
}

fn temp_output(temp: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join(name)).unwrap()
}

fn data_lines(path: &Utf8PathBuf, file: &str) -> Vec<String> {
    let content = fs::read_to_string(path.join(file)).unwrap();
    content.lines().map(String::from).collect()
}

#[test]
fn star_format_end_to_end() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp_output(&temp, "observations.csv");
    let output = temp_output(&temp, "refined");

    let mut content = String::from("campaign,year,site,habitat,lon,lat,date,recorded_by,event,camera,name,rank,vernacular,count\n");
    content.push_str(&camera_row("E1", "C01", "Gazella gazella", "2"));
    content.push('\n');
    content.push_str(&camera_row("E1", "C01", "Canis aureus", "1"));
    content.push('\n');
    content.push_str(&camera_row("E2", "C07", "Hystrix indica", "1"));
    content.push('\n');
    fs::write(input.as_std_path(), &content).unwrap();

    let mapping = datasets::by_name("camera-traps").unwrap();
    let source = DelimitedReader::open(&input, &mapping.source).unwrap();
    let pipeline = Pipeline::new(mapping, MockBackbone::new()).unwrap();
    let report = pipeline.run(source, &output).unwrap();

    assert!(matches!(report.outcome, RunOutcome::Completed));
    assert_eq!(report.rows, 3);
    assert_eq!(report.occurrences, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.unique_events, 2);
    assert!(report.names_not_found.is_empty());

    let events = data_lines(&output, "events.txt");
    let occurrences = data_lines(&output, "occurrences.txt");

    // header + data rows, header first in both files
    assert_eq!(occurrences.len(), 4);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], occurrences[0]);
    assert!(events[0].starts_with("campaign\tyear\tsite"));

    // the first record bearing E1 is the one in the events file
    assert_eq!(events[1], occurrences[1]);
    assert_eq!(events[2], occurrences[3]);

    // exact matches populated the taxonomy columns
    let fields: Vec<&str> = occurrences[1].split('\t').collect();
    assert_eq!(fields[8], "E1");
    assert_eq!(fields[21], "Animalia");
    assert_eq!(fields[27], "gazella");
    assert_eq!(fields[29], "accepted");
    assert_eq!(fields[30], "2440902");
}

#[test]
fn repeated_bad_name_reported_once_but_emitted_every_time() {
    let temp = tempfile::tempdir().unwrap();
    let output = temp_output(&temp, "refined");

    let rows: Vec<String> = (0..5)
        .map(|i| camera_row(&format!("E{i}"), "C01", "Capra imaginaria", "1"))
        .collect();
    let source = VecSource::from_csv(&rows);

    let mapping = datasets::by_name("camera-traps").unwrap();
    let pipeline = Pipeline::new(mapping, MockBackbone::new()).unwrap();
    let report = pipeline.run(source, &output).unwrap();

    assert_eq!(report.occurrences, 5);
    assert_eq!(report.names_not_found, vec!["Capra imaginaria".to_string()]);

    let occurrences = data_lines(&output, "occurrences.txt");
    assert_eq!(occurrences.len(), 6);
    for line in &occurrences[1..] {
        let fields: Vec<&str> = line.split('\t').collect();
        // taxonomy absent, status flagged
        assert_eq!(fields[21], "");
        assert_eq!(fields[29], "misapplied");
    }
}

#[test]
fn allow_listed_name_is_not_flagged() {
    let temp = tempfile::tempdir().unwrap();
    let output = temp_output(&temp, "refined");

    let source = VecSource::from_csv(&[camera_row("E1", "C01", "Gazella gazella acaciae", "1")]);

    let mapping = datasets::by_name("camera-traps").unwrap();
    let pipeline = Pipeline::new(mapping, MockBackbone::new()).unwrap();
    let report = pipeline.run(source, &output).unwrap();

    assert!(report.names_not_found.is_empty());
    let occurrences = data_lines(&output, "occurrences.txt");
    let fields: Vec<&str> = occurrences[1].split('\t').collect();
    assert_eq!(fields[28], "Gazella gazella acaciae");
    assert_eq!(fields[29], "");
}

#[test]
fn structural_skips_are_counted_and_not_written() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp_output(&temp, "survey.txt");
    let output = temp_output(&temp, "refined");

    // row 2 has a month that cannot be parsed, row 3 disagrees with its
    // verbatim event date, row 4 is fine
    let content = "\
id\tyear\tmonth\tdate\tstation\tfamily\tname\tvernacular\tcount
\t1987\tMar\t1987/03/\ts1\tAcanthuridae\tNaso lituratus\t\t3
\t1987\tMarch\t\ts1\tAcanthuridae\tNaso lituratus\t\t1
\t1987\tMar\t1987/09/\ts2\tAcanthuridae\tNaso lituratus\t\t1
\t1987\tApr\t1987/04/\ts2\tAcanthuridae\tNaso lituratus\t\t
";
    fs::write(input.as_std_path(), content).unwrap();

    let mapping = datasets::by_name("intake-fish").unwrap();
    let source = DelimitedReader::open(&input, &mapping.source).unwrap();
    let pipeline = Pipeline::new(mapping, MockBackbone::new()).unwrap();
    let report = pipeline.run(source, &output).unwrap();

    assert_eq!(report.rows, 4);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.occurrences, 2);
    assert_eq!(report.unique_events, 2);

    let occurrences = data_lines(&output, "occurrences.txt");
    assert_eq!(occurrences.len(), 3);

    let first: Vec<&str> = occurrences[1].split('\t').collect();
    assert_eq!(first[0], "urn:ice:1987-03:S1");
    assert_eq!(first[3], "1987-03");
    assert_eq!(first[11], "present");
    assert_eq!(first[14], "Power station intake at Shihmen");
    assert_eq!(first[25], "urn:ice:1987-03:S1:2372388");

    // empty count means an absence record, not a skip
    let last: Vec<&str> = occurrences[2].split('\t').collect();
    assert_eq!(last[11], "absent");
}

#[test]
fn verifier_outage_fails_the_run_but_still_reports() {
    let temp = tempfile::tempdir().unwrap();
    let output = temp_output(&temp, "refined");

    let source = VecSource::from_csv(&[camera_row("E1", "C01", "Gazella gazella", "1")]);

    let mapping = datasets::by_name("camera-traps").unwrap();
    let pipeline = Pipeline::new(mapping, FailingBackbone).unwrap();
    let report = pipeline.run(source, &output).unwrap();

    assert!(matches!(report.outcome, RunOutcome::Failed(_)));
    assert_eq!(report.rows, 1);
    assert_eq!(report.occurrences, 0);

    // streams were opened, header written, and closed cleanly
    let events = data_lines(&output, "events.txt");
    let occurrences = data_lines(&output, "occurrences.txt");
    assert_eq!(events.len(), 1);
    assert_eq!(occurrences.len(), 1);
}
