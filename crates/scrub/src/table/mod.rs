//! In-memory table model.

mod cell;
mod profile;
pub(crate) mod stats;

use indexmap::IndexMap;

use crate::error::TableError;

pub use cell::CellValue;
pub use profile::{ColumnProfile, NumericSummary, TableProfile};

/// Ordered collection of named columns.
///
/// All columns are expected to share one row count. Constructors check this;
/// [`Table::column_mut`] hands out raw access, so [`Table::check_shape`] is
/// run again before any rule application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Vec<CellValue>>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs, in order.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Vec<CellValue>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            let name = name.into();
            if table.columns.contains_key(&name) {
                return Err(TableError::DuplicateColumn(name));
            }
            table.columns.insert(name, values);
        }
        table.check_shape()?;
        Ok(table)
    }

    /// Build a table from a header row and row-major records.
    ///
    /// Short records are padded with missing cells; long records are truncated.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, TableError> {
        let mut columns: Vec<Vec<CellValue>> = headers
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.push(cells.next().unwrap_or_default());
            }
        }

        Self::from_columns(headers.into_iter().zip(columns))
    }

    /// Verify that every column has the same length.
    ///
    /// Returns the row count.
    pub fn check_shape(&self) -> Result<usize, TableError> {
        let expected = self.row_count();
        for (name, values) in &self.columns {
            if values.len() != expected {
                return Err(TableError::RaggedColumns {
                    column: name.clone(),
                    expected,
                    found: values.len(),
                });
            }
        }
        Ok(expected)
    }

    /// Number of rows (length of the first column).
    pub fn row_count(&self) -> usize {
        self.columns
            .first()
            .map(|(_, values)| values.len())
            .unwrap_or(0)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Returns true if the table has a column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Values of a column.
    pub fn column(&self, name: &str) -> Option<&[CellValue]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Mutable values of a column.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<CellValue>> {
        self.columns.get_mut(name)
    }

    /// Iterate `(name, values)` in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[CellValue])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Get a single cell.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.columns.get(column).and_then(|values| values.get(row))
    }

    /// Set a single cell. Returns false if the cell does not exist.
    pub fn set(&mut self, row: usize, column: &str, value: CellValue) -> bool {
        match self.columns.get_mut(column).and_then(|values| values.get_mut(row)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Insert a column, replacing an existing one with the same name in place.
    ///
    /// New columns are appended at the end. Returns true if the column is new.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<CellValue>) -> bool {
        self.columns.insert(name.into(), values).is_none()
    }

    /// Named access to one row.
    pub fn row_ref(&self, index: usize) -> RowRef<'_> {
        RowRef { table: self, index }
    }

    /// One row as cells in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.row_count() {
            return None;
        }
        self.columns.values().map(|values| values.get(index)).collect()
    }
}

/// Read access to the cells of one row, by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    /// Row index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell in the named column.
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.table.get(self.index, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            ("id", vec![CellValue::from(1.0), CellValue::from(2.0)]),
            ("name", vec![CellValue::from("a"), CellValue::Missing]),
        ])
        .unwrap()
    }

    #[test]
    fn test_shape() {
        let table = sample();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = Table::from_columns(vec![
            ("a", vec![CellValue::Missing]),
            ("b", vec![CellValue::Missing, CellValue::Missing]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TableError::RaggedColumns {
                column: "b".to_string(),
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = Table::from_columns(vec![("a", vec![]), ("a", vec![])]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".to_string()));
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let table = Table::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![CellValue::from("x")], vec![CellValue::from("y"), CellValue::from("z")]],
        )
        .unwrap();
        assert_eq!(table.get(0, "b"), Some(&CellValue::Missing));
        assert_eq!(table.get(1, "b"), Some(&CellValue::from("z")));
    }

    #[test]
    fn test_insert_column_appends_or_replaces() {
        let mut table = sample();
        assert!(table.insert_column("flag", vec![CellValue::Bool(false); 2]));
        assert!(!table.insert_column("id", vec![CellValue::Missing; 2]));
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["id", "name", "flag"]);
        assert_eq!(table.get(0, "id"), Some(&CellValue::Missing));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.check_shape(), Ok(0));
    }
}
