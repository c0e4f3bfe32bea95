//! CSV statement source
//!
//! Reads a statement export lazily, one row per `next()`, so the engine never
//! reads ahead of the row it is resolving. Header lines are not special: they
//! fail date parsing and get skipped like any other malformed row.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder, StringRecord};

use crate::domain::result::{Error, Result};
use crate::domain::RawRow;

/// Failure to produce a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// The row has a different number of fields than the first row;
    /// recoverable
    FieldCount {
        row: usize,
        expected: u64,
        found: u64,
    },
    /// The source itself failed; fatal
    Read(String),
}

/// Iterator of statement rows from delimited text
pub struct CsvStatementSource<R: Read> {
    reader: csv::Reader<R>,
    record: StringRecord,
    row: usize,
    done: bool,
}

impl CsvStatementSource<File> {
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_reader(file, delimiter))
    }
}

impl<R: Read> CsvStatementSource<R> {
    pub fn from_reader(reader: R, delimiter: u8) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .from_reader(reader);
        Self {
            reader,
            record: StringRecord::new(),
            row: 0,
            done: false,
        }
    }
}

impl<R: Read> Iterator for CsvStatementSource<R> {
    type Item = std::result::Result<RawRow, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.row += 1;
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(RawRow {
                row: self.row,
                fields: self.record.iter().map(str::to_string).collect(),
            })),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => match e.kind() {
                ErrorKind::UnequalLengths { expected_len, len, .. } => {
                    Some(Err(RowError::FieldCount {
                        row: self.row,
                        expected: *expected_len,
                        found: *len,
                    }))
                }
                _ => {
                    self.done = true;
                    Some(Err(RowError::Read(e.to_string())))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rows_in_order() {
        let data = "Date,Description,Amount\n01 Jan 24,TESCO,-12.50\n02 Jan 24,SALARY,1000\n";
        let rows: Vec<_> = CsvStatementSource::from_reader(data.as_bytes(), b',').collect();
        assert_eq!(rows.len(), 3);
        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.row, 2);
        assert_eq!(second.fields, vec!["01 Jan 24", "TESCO", "-12.50"]);
    }

    #[test]
    fn test_field_count_mismatch_is_recoverable() {
        let data = "a,b,c\nd,e\nf,g,h\n";
        let rows: Vec<_> = CsvStatementSource::from_reader(data.as_bytes(), b',').collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            Err(RowError::FieldCount {
                row: 2,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(rows[2].as_ref().unwrap().row, 3);
    }

    #[test]
    fn test_pipe_delimiter() {
        let data = "01 Jan 24|TESCO|12.50\n";
        let mut source = CsvStatementSource::from_reader(data.as_bytes(), b'|');
        let row = source.next().unwrap().unwrap();
        assert_eq!(row.fields[1], "TESCO");
        assert!(source.next().is_none());
    }
}
