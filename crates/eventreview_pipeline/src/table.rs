//! In-memory record table and Polars input adapters.

use std::io::Cursor;

use eventreview_io_xlsx::{EnumCellValue, validate_unique_columns};
use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::spec::ReportError;

/// Rectangular working copy of the constituent export.
///
/// Columns are uniquely named and ordered; every row is exactly as wide as the
/// column list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<EnumCellValue>>,
}

impl RecordTable {
    /// Build a table, validating column names and row widths.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<EnumCellValue>>) -> Result<Self, ReportError> {
        if columns.is_empty() {
            return Err(ReportError::InvalidTable(
                "table has no columns".to_string(),
            ));
        }
        validate_unique_columns(&columns).map_err(ReportError::InvalidTable)?;
        if let Some((n_idx_row, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ReportError::InvalidTable(format!(
                "row {n_idx_row} has {} cells; expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Convert a Polars dataframe.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, ReportError> {
        let l_colnames: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let l_cols = df.get_columns();

        let mut l_rows = Vec::with_capacity(df.height());
        for n_idx_row in 0..df.height() {
            let mut v_row = Vec::with_capacity(l_cols.len());
            for col in l_cols {
                let value = col.get(n_idx_row).map_err(|err| {
                    ReportError::InvalidTable(format!("Failed to access cell value: {err}"))
                })?;
                v_row.push(derive_cell_value_from_any_value(value));
            }
            l_rows.push(v_row);
        }

        Self::new(l_colnames, l_rows)
    }

    /// Convert IPC-serialized dataframe bytes.
    pub fn from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Self, ReportError> {
        let df = IpcReader::new(Cursor::new(v_ipc_df))
            .finish()
            .map_err(|err| {
                ReportError::InvalidTable(format!("Failed to read IPC DataFrame bytes: {err}"))
            })?;
        Self::from_dataframe(&df)
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<EnumCellValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Current position of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Current position of `name`, or a missing-column error.
    pub fn require_position(&self, name: &str) -> Result<usize, ReportError> {
        self.position(name)
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    }

    /// Cell at `(row, col)`.
    pub fn value(&self, n_idx_row: usize, n_idx_col: usize) -> &EnumCellValue {
        &self.rows[n_idx_row][n_idx_col]
    }

    /// Replace column `name` with `values`, appending it when absent.
    pub fn upsert_column(
        &mut self,
        name: &str,
        values: Vec<EnumCellValue>,
    ) -> Result<(), ReportError> {
        if values.len() != self.rows.len() {
            return Err(ReportError::InvalidTable(format!(
                "column {name:?} has {} values; table has {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        match self.position(name) {
            Some(n_idx_col) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[n_idx_col] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Remove columns `first..=last` by position.
    pub fn drop_column_span(&mut self, n_idx_first: usize, n_idx_last: usize) {
        if n_idx_first > n_idx_last || n_idx_first >= self.columns.len() {
            return;
        }
        let n_idx_end = usize::min(n_idx_last + 1, self.columns.len());
        self.columns.drain(n_idx_first..n_idx_end);
        for row in &mut self.rows {
            row.drain(n_idx_first..n_idx_end);
        }
    }

    /// Copy without the named columns; absent names are ignored.
    pub fn without_columns(&self, names: &[&str]) -> RecordTable {
        let l_keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !names.contains(&c.as_str()))
            .map(|(n_idx, _)| n_idx)
            .collect();
        RecordTable {
            columns: l_keep.iter().map(|&n| self.columns[n].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| l_keep.iter().map(|&n| row[n].clone()).collect())
                .collect(),
        }
    }

    /// Copy holding the rows at `indices`, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> RecordTable {
        RecordTable {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&n| self.rows[n].clone()).collect(),
        }
    }

    /// Indices of rows satisfying `predicate`, in input order.
    pub fn find_rows<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&[EnumCellValue]) -> bool,
    {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| predicate(row))
            .map(|(n_idx, _)| n_idx)
            .collect()
    }
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}
