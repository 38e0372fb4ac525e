//! CSV table reader with missing-value detection and column kind inference.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use cerrado_prep::{Column, ColumnKind, Table};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Cell texts read as a missing value, compared after trimming.
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "-", "#N/A",
];

/// Reads a delimited text file into a [`Table`].
///
/// The first row is the header. Every other row is one record and must have
/// as many cells as the header. Cells are trimmed; [`MISSING_TOKENS`] become
/// missing cells. A column is numeric when every present cell parses as a
/// finite number, otherwise categorical, unless its kind is declared with
/// [`TableReader::with_column_kind`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::InvalidFormat`] | delimiter equals the decimal marker |
/// | [`IoError::FileNotFound`] | file doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | malformed CSV record |
/// | [`IoError::DuplicateColumn`] | a header name repeats |
/// | [`IoError::UnknownColumn`] | a declared kind names a column not in the header |
/// | [`IoError::InconsistentRowLength`] | row has a different cell count than the header |
/// | [`IoError::EmptyDataset`] | zero data rows after the header |
/// | [`IoError::InvalidNumber`] | a declared-numeric cell does not parse |
/// | [`IoError::NonFiniteValue`] | a declared-numeric cell is infinite |
#[derive(Debug, Clone)]
pub struct TableReader {
    path: PathBuf,
    delimiter: u8,
    decimal: u8,
    kinds: Vec<(String, ColumnKind)>,
}

impl TableReader {
    /// Create a reader for `path` with `,` as delimiter and `.` as decimal marker.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: b',',
            decimal: b'.',
            kinds: Vec::new(),
        }
    }

    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the decimal marker used in numeric cells.
    #[must_use]
    pub fn with_decimal(mut self, decimal: u8) -> Self {
        self.decimal = decimal;
        self
    }

    /// Force the kind of a column instead of inferring it.
    #[must_use]
    pub fn with_column_kind(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.kinds.push((name.into(), kind));
        self
    }

    /// Return the path this reader reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Table, IoError> {
        if self.delimiter == self.decimal {
            return Err(IoError::InvalidFormat {
                marker: self.delimiter as char,
            });
        }

        let file = std::fs::File::open(&self.path).map_err(|source| IoError::FileNotFound {
            path: self.path.clone(),
            source,
        })?;

        // flexible(true) so that a short row reports InconsistentRowLength
        // rather than a bare CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let names: Vec<String> = rdr
            .headers()
            .map_err(|e| self.csv_error(e))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(IoError::DuplicateColumn {
                path: self.path.clone(),
                name: dup.clone(),
            });
        }
        if let Some((name, _)) = self.kinds.iter().find(|(n, _)| !names.contains(n)) {
            return Err(IoError::UnknownColumn {
                name: name.clone(),
                available: names,
            });
        }
        debug!(n_columns = names.len(), "read CSV header");

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != names.len() {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: names.len(),
                    got: record.len(),
                });
            }
            for (column, raw) in cells.iter_mut().zip(record.iter()) {
                column.push((!MISSING_TOKENS.contains(&raw)).then(|| raw.to_string()));
            }
        }
        let n_rows = cells.first().map_or(0, Vec::len);
        if n_rows == 0 {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| {
                let column = self.build_column(&name, raw)?;
                debug!(column = %name, kind = %column.kind(), missing = column.n_missing(), "column parsed");
                Ok((name, column))
            })
            .collect::<Result<Vec<_>, IoError>>()?;
        let table = Table::new(columns)?;

        info!(
            n_rows = table.n_rows(),
            n_columns = table.n_columns(),
            "table loaded"
        );
        Ok(table)
    }

    fn build_column(&self, name: &str, raw: Vec<Option<String>>) -> Result<Column, IoError> {
        let declared = self
            .kinds
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|&(_, kind)| kind);

        match declared {
            Some(ColumnKind::Categorical) => Ok(Column::Categorical(raw)),
            Some(ColumnKind::Numeric) => raw
                .iter()
                .enumerate()
                .map(|(row_index, cell)| {
                    cell.as_deref()
                        .map(|text| self.parse_declared(name, row_index, text))
                        .transpose()
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Column::Numeric),
            None => {
                let parsed: Option<Vec<Option<f64>>> = raw
                    .iter()
                    .map(|cell| match cell {
                        None => Some(None),
                        Some(text) => parse_number(text, self.decimal)
                            .filter(|v| v.is_finite())
                            .map(Some),
                    })
                    .collect();
                Ok(parsed.map_or(Column::Categorical(raw), Column::Numeric))
            }
        }
    }

    fn parse_declared(&self, column: &str, row_index: usize, raw: &str) -> Result<f64, IoError> {
        let value = parse_number(raw, self.decimal).ok_or_else(|| IoError::InvalidNumber {
            path: self.path.clone(),
            row_index,
            column: column.to_string(),
            raw: raw.to_string(),
        })?;
        if !value.is_finite() {
            return Err(IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                column: column.to_string(),
                raw: raw.to_string(),
            });
        }
        Ok(value)
    }

    fn csv_error(&self, source: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: source.position().map_or(0, |p| p.byte()),
            source,
        }
    }
}

fn parse_number(text: &str, decimal: u8) -> Option<f64> {
    if decimal == b'.' {
        text.parse().ok()
    } else {
        text.replace(decimal as char, ".").parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn infers_kinds_and_missing_cells() {
        let f = write_csv("N,Vegetation,P\n1.5,Campo,NA\n2.0, Mata ,0.3\n,Cerrado,0.4\n");
        let table = TableReader::new(f.path()).read().unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column_names(), ["N", "Vegetation", "P"]);
        assert_eq!(table.kind("N").unwrap(), ColumnKind::Numeric);
        assert_eq!(table.kind("Vegetation").unwrap(), ColumnKind::Categorical);
        assert_eq!(table.numeric("N").unwrap(), &[Some(1.5), Some(2.0), None]);
        assert_eq!(table.numeric("P").unwrap(), &[None, Some(0.3), Some(0.4)]);
        let veg = table.column("Vegetation").unwrap().as_categorical().unwrap();
        assert_eq!(veg[1].as_deref(), Some("Mata"));
    }

    #[test]
    fn semicolon_and_decimal_comma() {
        let f = write_csv("N;K\n1,5;2\n3,25;4\n");
        let table = TableReader::new(f.path())
            .with_delimiter(b';')
            .with_decimal(b',')
            .read()
            .unwrap();
        assert_eq!(table.numeric("N").unwrap(), &[Some(1.5), Some(3.25)]);
        assert_eq!(table.numeric("K").unwrap(), &[Some(2.0), Some(4.0)]);
    }

    #[test]
    fn same_delimiter_and_decimal_rejected() {
        let f = write_csv("a\n1\n");
        let err = TableReader::new(f.path())
            .with_decimal(b',')
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::InvalidFormat { marker: ',' }));
    }

    #[test]
    fn infinite_cell_makes_column_categorical() {
        let f = write_csv("x\n1.0\ninf\n");
        let table = TableReader::new(f.path()).read().unwrap();
        assert_eq!(table.kind("x").unwrap(), ColumnKind::Categorical);
    }

    #[test]
    fn declared_numeric_rejects_text() {
        let f = write_csv("x,y\n1.0,a\n2.0,b\n");
        let err = TableReader::new(f.path())
            .with_column_kind("y", ColumnKind::Numeric)
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::InvalidNumber { row_index: 0, .. }));
    }

    #[test]
    fn declared_numeric_rejects_infinity() {
        let f = write_csv("x\n1.0\n-inf\n");
        let err = TableReader::new(f.path())
            .with_column_kind("x", ColumnKind::Numeric)
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { row_index: 1, .. }));
    }

    #[test]
    fn declared_categorical_keeps_numbers_as_text() {
        let f = write_csv("class\n1\n2\n");
        let table = TableReader::new(f.path())
            .with_column_kind("class", ColumnKind::Categorical)
            .read()
            .unwrap();
        assert_eq!(table.kind("class").unwrap(), ColumnKind::Categorical);
    }

    #[test]
    fn declared_kind_for_absent_column() {
        let f = write_csv("x\n1\n");
        let err = TableReader::new(f.path())
            .with_column_kind("nope", ColumnKind::Numeric)
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::UnknownColumn { .. }));
    }

    #[test]
    fn duplicate_header_rejected() {
        let f = write_csv("N,N\n1,2\n");
        let err = TableReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::DuplicateColumn { ref name, .. } if name == "N"));
    }

    #[test]
    fn short_row_rejected() {
        let f = write_csv("a,b\n1,2\n3\n");
        let err = TableReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InconsistentRowLength {
                row_index: 1,
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn header_only_is_empty() {
        let f = write_csv("a,b\n");
        let err = TableReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = TableReader::new(dir.path().join("absent.csv")).read().unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
