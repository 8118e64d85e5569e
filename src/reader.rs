use std::fs;
use std::io::Cursor;

use camino::Utf8Path;
use encoding_rs::Encoding;

use crate::error::RefineError;
use crate::mapping::SourceFormat;

/// Row iterator over one dataset's source file. `Ok(None)` signals
/// exhaustion, not an error; sources are closed by being dropped.
pub trait RecordSource {
    fn next_record(&mut self) -> Result<Option<Vec<String>>, RefineError>;
}

/// Delimited-text source with dataset-configured delimiter, quoting,
/// encoding and header-skip count. The file is decoded up front; records
/// may vary in length (the augmenter right-pads them).
pub struct DelimitedReader {
    records: csv::StringRecordsIntoIter<Cursor<Vec<u8>>>,
}

impl std::fmt::Debug for DelimitedReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelimitedReader").finish_non_exhaustive()
    }
}

impl DelimitedReader {
    pub fn open(path: &Utf8Path, format: &SourceFormat) -> Result<Self, RefineError> {
        let bytes =
            fs::read(path.as_std_path()).map_err(|_| RefineError::SourceOpen(path.to_owned()))?;
        Self::from_bytes(&bytes, format)
    }

    pub fn from_bytes(bytes: &[u8], format: &SourceFormat) -> Result<Self, RefineError> {
        let encoding = Encoding::for_label(format.encoding.as_bytes())
            .ok_or_else(|| RefineError::SourceEncoding(format.encoding.to_string()))?;
        let (text, _, _) = encoding.decode(bytes);

        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(format.delimiter)
            .has_headers(false)
            .flexible(true);
        match format.quote {
            Some(quote) => builder.quote(quote),
            None => builder.quoting(false),
        };
        let reader = builder.from_reader(Cursor::new(text.into_owned().into_bytes()));

        let mut records = reader.into_records();
        for _ in 0..format.skip_rows {
            match records.next() {
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(RefineError::SourceRead(err.to_string())),
                None => break,
            }
        }
        Ok(Self { records })
    }
}

impl RecordSource for DelimitedReader {
    fn next_record(&mut self) -> Result<Option<Vec<String>>, RefineError> {
        match self.records.next() {
            Some(Ok(record)) => Ok(Some(record.iter().map(String::from).collect())),
            Some(Err(err)) => Err(RefineError::SourceRead(err.to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut reader: DelimitedReader) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        while let Some(record) = reader.next_record().unwrap() {
            rows.push(record);
        }
        rows
    }

    #[test]
    fn skips_configured_header_rows() {
        let format = SourceFormat {
            delimiter: b'\t',
            quote: None,
            encoding: "utf-8",
            skip_rows: 1,
        };
        let reader =
            DelimitedReader::from_bytes(b"col_a\tcol_b\n1987\tMar\n1988\tApr\n", &format).unwrap();
        let rows = drain(reader);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1987".to_string(), "Mar".to_string()]);
    }

    #[test]
    fn decodes_latin1_bytes() {
        let format = SourceFormat {
            delimiter: b';',
            quote: Some(b'"'),
            encoding: "latin1",
            skip_rows: 0,
        };
        // "Chaetodon f\xe9" -> é in latin1
        let reader = DelimitedReader::from_bytes(b"site;Chaetodon f\xe9lix\n", &format).unwrap();
        let rows = drain(reader);
        assert_eq!(rows[0][1], "Chaetodon f\u{e9}lix");
    }

    #[test]
    fn unquoted_mode_keeps_quote_characters() {
        let format = SourceFormat {
            delimiter: b'\t',
            quote: None,
            encoding: "utf-8",
            skip_rows: 0,
        };
        let reader = DelimitedReader::from_bytes(b"a\t\"b\"\n", &format).unwrap();
        let rows = drain(reader);
        assert_eq!(rows[0][1], "\"b\"");
    }

    #[test]
    fn ragged_rows_are_allowed() {
        let format = SourceFormat {
            delimiter: b',',
            quote: Some(b'"'),
            encoding: "utf-8",
            skip_rows: 0,
        };
        let reader = DelimitedReader::from_bytes(b"a,b,c\nd,e\n", &format).unwrap();
        let rows = drain(reader);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 2);
    }

    #[test]
    fn unknown_encoding_label_rejected() {
        let format = SourceFormat {
            delimiter: b',',
            quote: None,
            encoding: "ebcdic",
            skip_rows: 0,
        };
        let err = DelimitedReader::from_bytes(b"a,b\n", &format).unwrap_err();
        assert!(matches!(err, RefineError::SourceEncoding(_)));
    }
}
