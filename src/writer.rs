use std::fs::{self, File};
use std::io::{BufWriter, Write};

use camino::Utf8Path;

use crate::dedup::SeenEvents;
use crate::error::RefineError;
use crate::row;

/// Owns the two output streams of one star-formatted dataset: the core
/// events file and the extension occurrences file. Both are created under
/// the output directory with the shared header as their first line.
///
/// `BufWriter` flushes on drop, so an aborted run still leaves complete
/// lines behind; call `close` on the happy path to surface flush errors.
pub struct StarWriter {
    events: BufWriter<File>,
    occurrences: BufWriter<File>,
    seen: SeenEvents,
}

impl StarWriter {
    pub fn create(
        dir: &Utf8Path,
        header: &[&str],
        events_file: &str,
        occurrences_file: &str,
    ) -> Result<Self, RefineError> {
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| RefineError::Filesystem(err.to_string()))?;

        let header_line = row::encode(
            &header
                .iter()
                .map(|name| Some((*name).to_string()))
                .collect::<Vec<_>>(),
        );

        let mut events = open_stream(&dir.join(events_file))?;
        let mut occurrences = open_stream(&dir.join(occurrences_file))?;
        events
            .write_all(header_line.as_bytes())
            .map_err(|err| RefineError::Filesystem(err.to_string()))?;
        occurrences
            .write_all(header_line.as_bytes())
            .map_err(|err| RefineError::Filesystem(err.to_string()))?;

        Ok(Self {
            events,
            occurrences,
            seen: SeenEvents::new(),
        })
    }

    /// Every record lands in the occurrences stream.
    pub fn write_occurrence(&mut self, record: &[Option<String>]) -> Result<(), RefineError> {
        self.occurrences
            .write_all(row::encode(record).as_bytes())
            .map_err(|err| RefineError::Filesystem(err.to_string()))
    }

    /// Writes the record to the events stream only on first sight of its
    /// key. Returns whether the event was new.
    pub fn write_event_if_new(
        &mut self,
        record: &[Option<String>],
        key: &str,
    ) -> Result<bool, RefineError> {
        if !self.seen.insert_if_new(key) {
            return Ok(false);
        }
        self.events
            .write_all(row::encode(record).as_bytes())
            .map_err(|err| RefineError::Filesystem(err.to_string()))?;
        Ok(true)
    }

    pub fn unique_events(&self) -> usize {
        self.seen.len()
    }

    pub fn close(mut self) -> Result<(), RefineError> {
        self.events
            .flush()
            .map_err(|err| RefineError::Filesystem(err.to_string()))?;
        self.occurrences
            .flush()
            .map_err(|err| RefineError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

fn open_stream(path: &Utf8Path) -> Result<BufWriter<File>, RefineError> {
    let file = File::create(path.as_std_path())
        .map_err(|err| RefineError::Filesystem(format!("create {path}: {err}")))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn header_first_then_routing() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

        let mut writer =
            StarWriter::create(&dir, &["eventID", "scientificName"], "events.txt", "occurrences.txt")
                .unwrap();

        let first = some(&["E1", "Naso lituratus"]);
        let second = some(&["E1", "Naso unicornis"]);
        let third = some(&["E2", "Naso brevirostris"]);
        for record in [&first, &second, &third] {
            writer.write_occurrence(record).unwrap();
        }
        assert!(writer.write_event_if_new(&first, "E1").unwrap());
        assert!(!writer.write_event_if_new(&second, "E1").unwrap());
        assert!(writer.write_event_if_new(&third, "E2").unwrap());
        assert_eq!(writer.unique_events(), 2);
        writer.close().unwrap();

        let events = std::fs::read_to_string(dir.join("events.txt")).unwrap();
        let occurrences = std::fs::read_to_string(dir.join("occurrences.txt")).unwrap();

        let event_lines: Vec<&str> = events.lines().collect();
        let occurrence_lines: Vec<&str> = occurrences.lines().collect();
        assert_eq!(event_lines.len(), 3);
        assert_eq!(occurrence_lines.len(), 4);
        assert_eq!(event_lines[0], "eventID\tscientificName");
        assert_eq!(occurrence_lines[0], "eventID\tscientificName");
        // the first record bearing E1 is the one in the events file
        assert_eq!(event_lines[1], occurrence_lines[1]);
    }
}
