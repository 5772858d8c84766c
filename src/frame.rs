//! In-memory tabular data loaded from and written to CSV
//!
//! Columns are stored in file order (`IndexMap`) as vectors of optional
//! cells; an empty CSV field is a null. Values stay as strings, with numeric
//! interpretation applied on demand, so a round trip through a frame never
//! invents formatting changes in untouched columns.

use crate::error::{PreplineError, Result};
use indexmap::IndexMap;
use std::collections::HashSet;

type Column = Vec<Option<String>>;

#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    columns: IndexMap<String, Column>,
    n_rows: usize,
}

impl DataFrame {
    /// Parse a frame from CSV bytes. The first record is the header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| PreplineError::invalid_input("CSV must be valid UTF-8"))?;

        let mut header_reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
        let width = header_reader.headers()?.len();

        if width == 1 {
            // A null row in single-column data is a blank line, which the
            // csv reader silently skips. Quote those lines so they survive
            // as empty cells.
            let patched: Vec<&str> = text
                .lines()
                .map(|line| if line.is_empty() { "\"\"" } else { line })
                .collect();
            Self::read_csv(patched.join("\n").as_bytes())
        } else {
            Self::read_csv(text.as_bytes())
        }
    }

    fn read_csv(bytes: &[u8]) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().from_reader(bytes);

        let headers = csv_reader.headers()?.clone();
        let mut columns: IndexMap<String, Column> = IndexMap::new();
        for name in headers.iter() {
            if columns.contains_key(name) {
                return Err(PreplineError::invalid_input(format!(
                    "Duplicate column name: {}",
                    name
                )));
            }
            columns.insert(name.to_string(), Vec::new());
        }

        let mut n_rows = 0;
        for record in csv_reader.records() {
            let record = record?;
            for (i, column) in columns.values_mut().enumerate() {
                let cell = record.get(i).unwrap_or("");
                column.push(if cell.is_empty() {
                    None
                } else {
                    Some(cell.to_string())
                });
            }
            n_rows += 1;
        }

        Ok(Self { columns, n_rows })
    }

    /// Serialize back to CSV bytes; nulls become empty fields.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(self.columns.keys())?;
        for row in 0..self.n_rows {
            let record: Vec<&str> = self
                .columns
                .values()
                .map(|col| col[row].as_deref().unwrap_or(""))
                .collect();
            writer.write_record(record)?;
        }

        writer
            .into_inner()
            .map_err(|e| PreplineError::invalid_input(format!("CSV write failed: {}", e)))
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Replace a column's cells. The column must exist and the length must
    /// match the frame's row count.
    pub fn set_column(&mut self, name: &str, values: Column) -> Result<()> {
        if values.len() != self.n_rows {
            return Err(PreplineError::invalid_input(format!(
                "Column length {} does not match row count {}",
                values.len(),
                self.n_rows
            )));
        }
        match self.columns.get_mut(name) {
            Some(column) => {
                *column = values;
                Ok(())
            }
            None => Err(PreplineError::invalid_parameter(format!(
                "No such column: {}",
                name
            ))),
        }
    }

    /// Remove a column, preserving the order of the rest
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        self.columns
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| PreplineError::invalid_parameter(format!("No such column: {}", name)))
    }

    /// Non-null values of a column parsed as f64, in row order.
    /// Non-numeric cells are skipped; use `is_numeric_column` to gate
    /// operations that require a fully numeric column.
    pub fn numeric_values(&self, name: &str) -> Vec<f64> {
        self.columns
            .get(name)
            .map(|col| {
                col.iter()
                    .flatten()
                    .filter_map(|v| v.trim().parse::<f64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A column is numeric when every non-null cell parses as f64.
    /// An all-null column counts as numeric.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.columns
            .get(name)
            .is_some_and(|col| col.iter().flatten().all(|v| v.trim().parse::<f64>().is_ok()))
    }

    pub fn null_count(&self, name: &str) -> usize {
        self.columns
            .get(name)
            .map(|col| col.iter().filter(|v| v.is_none()).count())
            .unwrap_or(0)
    }

    pub fn total_null_count(&self) -> usize {
        self.columns
            .values()
            .map(|col| col.iter().filter(|v| v.is_none()).count())
            .sum()
    }

    /// Total number of cells (rows x columns)
    pub fn cell_count(&self) -> usize {
        self.n_rows * self.columns.len()
    }

    /// Number of distinct non-null values in a column
    pub fn distinct_count(&self, name: &str) -> usize {
        self.columns
            .get(name)
            .map(|col| col.iter().flatten().collect::<HashSet<_>>().len())
            .unwrap_or(0)
    }

    /// Rows identical to an earlier row, counted once per repeat
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen = HashSet::new();
        let mut duplicates = 0;

        for row in 0..self.n_rows {
            let key: Vec<Option<&str>> = self
                .columns
                .values()
                .map(|col| col[row].as_deref())
                .collect();
            if !seen.insert(key) {
                duplicates += 1;
            }
        }

        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "name,age,city\nAlice,30,NYC\nBob,,LA\nCara,41,\n";

    #[test]
    fn test_load_shape_and_nulls() {
        let frame = DataFrame::from_bytes(SAMPLE.as_bytes()).unwrap();

        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.n_cols(), 3);
        assert_eq!(frame.column_names(), vec!["name", "age", "city"]);
        assert_eq!(frame.null_count("age"), 1);
        assert_eq!(frame.null_count("city"), 1);
        assert_eq!(frame.total_null_count(), 2);
    }

    #[test]
    fn test_numeric_detection() {
        let frame = DataFrame::from_bytes(SAMPLE.as_bytes()).unwrap();

        assert!(frame.is_numeric_column("age"));
        assert!(!frame.is_numeric_column("name"));
        assert_eq!(frame.numeric_values("age"), vec![30.0, 41.0]);
    }

    #[test]
    fn test_drop_column_preserves_order() {
        let mut frame = DataFrame::from_bytes(SAMPLE.as_bytes()).unwrap();

        frame.drop_column("age").unwrap();
        assert_eq!(frame.column_names(), vec!["name", "city"]);
        assert!(frame.drop_column("age").is_err());
    }

    #[test]
    fn test_round_trip_keeps_nulls_empty() {
        let frame = DataFrame::from_bytes(SAMPLE.as_bytes()).unwrap();
        let bytes = frame.to_csv_bytes().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), SAMPLE);
    }

    #[test]
    fn test_duplicate_rows() {
        let csv = "a,b\n1,x\n1,x\n2,y\n1,x\n";
        let frame = DataFrame::from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(frame.duplicate_row_count(), 2);
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let csv = "a,a\n1,2\n";
        assert!(DataFrame::from_bytes(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_single_column_null_rows_survive() {
        let frame = DataFrame::from_bytes(b"x\n1\n\n3\n").unwrap();
        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.null_count("x"), 1);
        assert_eq!(frame.numeric_values("x"), vec![1.0, 3.0]);

        // The writer quotes a lone empty field, so the shape reparses intact
        let bytes = frame.to_csv_bytes().unwrap();
        let reparsed = DataFrame::from_bytes(&bytes).unwrap();
        assert_eq!(reparsed.n_rows(), 3);
        assert_eq!(reparsed.null_count("x"), 1);
    }

    #[test]
    fn test_distinct_count_ignores_nulls() {
        let frame = DataFrame::from_bytes("x,y\n1,a\n1,b\n,c\n2,d\n".as_bytes()).unwrap();
        assert_eq!(frame.distinct_count("x"), 2);
        assert_eq!(frame.null_count("x"), 1);
    }
}
