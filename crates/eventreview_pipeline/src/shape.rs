//! Column Shaper: format-dependent removal of named column ranges.

use tracing::debug;

use crate::spec::{ReportError, SpecColumnRange};
use crate::table::RecordTable;

/// Remove each inclusive `start..=end` range from a working copy of `table`.
///
/// Boundaries are resolved against the current column positions right before
/// each removal, so ranges apply in order over the already-shaped columns.
pub fn shape_columns(
    table: &RecordTable,
    ranges: &[SpecColumnRange],
) -> Result<RecordTable, ReportError> {
    let mut table_shaped = table.clone();
    for range in ranges {
        let n_idx_start = resolve_boundary(&table_shaped, range, &range.start)?;
        let n_idx_end = resolve_boundary(&table_shaped, range, &range.end)?;
        if n_idx_start > n_idx_end {
            return Err(ReportError::MalformedColumnRange {
                start: range.start.clone(),
                end: range.end.clone(),
                reason: format!(
                    "start column is at position {n_idx_start}, after end column at {n_idx_end}"
                ),
            });
        }
        debug!(
            start = %range.start,
            end = %range.end,
            n_cols_removed = n_idx_end - n_idx_start + 1,
            "removing column range"
        );
        table_shaped.drop_column_span(n_idx_start, n_idx_end);
    }
    Ok(table_shaped)
}

fn resolve_boundary(
    table: &RecordTable,
    range: &SpecColumnRange,
    name: &str,
) -> Result<usize, ReportError> {
    if name.trim().is_empty() {
        return Err(ReportError::MalformedColumnRange {
            start: range.start.clone(),
            end: range.end.clone(),
            reason: "boundary column name is blank".to_string(),
        });
    }
    table.require_position(name)
}

#[cfg(test)]
mod tests {
    use eventreview_io_xlsx::EnumCellValue;

    use super::*;

    fn table(names: &[&str]) -> RecordTable {
        RecordTable::new(
            names.iter().map(ToString::to_string).collect(),
            vec![names.iter().map(|n| EnumCellValue::from(*n)).collect()],
        )
        .expect("table")
    }

    #[test]
    fn test_removes_exactly_the_named_ranges() {
        let source = table(&["id", "a", "b", "c", "name", "x", "y", "z"]);
        let shaped = shape_columns(
            &source,
            &[SpecColumnRange::new("a", "c"), SpecColumnRange::new("y", "y")],
        )
        .expect("shape");

        assert_eq!(shaped.columns(), ["id", "name", "x", "z"]);
        assert_eq!(shaped.rows()[0][1], EnumCellValue::from("name"));
        // input untouched
        assert_eq!(source.width(), 8);
    }

    #[test]
    fn test_absent_boundary_is_fatal() {
        let source = table(&["id", "a", "b"]);
        assert!(matches!(
            shape_columns(&source, &[SpecColumnRange::new("a", "missing")]),
            Err(ReportError::MissingColumn(c)) if c == "missing"
        ));
    }

    #[test]
    fn test_reversed_boundaries_are_malformed() {
        let source = table(&["id", "a", "b"]);
        assert!(matches!(
            shape_columns(&source, &[SpecColumnRange::new("b", "a")]),
            Err(ReportError::MalformedColumnRange { .. })
        ));
    }

    #[test]
    fn test_later_ranges_resolve_after_earlier_removals() {
        let source = table(&["a", "b", "c", "d"]);
        assert!(matches!(
            shape_columns(
                &source,
                &[SpecColumnRange::new("a", "b"), SpecColumnRange::new("b", "d")]
            ),
            Err(ReportError::MissingColumn(c)) if c == "b"
        ));
    }
}
