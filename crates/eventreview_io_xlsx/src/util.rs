//! Stateless helper utilities used by the XLSX writer kernel.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::conf::{
    C_XLSX_EXTENSION, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, XlsxWriteError};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Convert zero-based column index to Excel letters (`0 -> A`, `27 -> AB`).
pub fn derive_column_letter(col_idx: usize) -> String {
    let mut n_rest = col_idx + 1;
    let mut l_chars = Vec::new();
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_rem as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

pub(crate) fn cast_row_num(value: usize) -> Result<u32, XlsxWriteError> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(XlsxWriteError::IndexOverflow(format!(
            "row index overflow: {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| XlsxWriteError::IndexOverflow(format!("row index overflow: {value}")))
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16, XlsxWriteError> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(XlsxWriteError::IndexOverflow(format!(
            "column index overflow: {value}"
        )));
    }
    u16::try_from(value)
        .map_err(|_| XlsxWriteError::IndexOverflow(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Comparison key for sheet names; Excel treats names case-insensitively.
pub fn derive_sheet_name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Normalize an output path to the workbook extension.
pub fn normalize_xlsx_path(path: &Path) -> PathBuf {
    path.with_extension(C_XLSX_EXTENSION)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region KeyRunUtils

/// Blank repeated leading key cells, pivot-style.
///
/// A cell in key column `c` is cleared when it equals the cell above and every
/// key column left of `c` was equal as well, so only the first row of each
/// nested run keeps its label.
pub fn apply_key_run_blankout(rows: &mut [Vec<EnumCellValue>], n_cols_key: usize) {
    if rows.len() < 2 || n_cols_key == 0 {
        return;
    }

    let l_rows_orig: Vec<Vec<EnumCellValue>> = rows
        .iter()
        .map(|row| row.iter().take(n_cols_key).cloned().collect())
        .collect();

    for n_idx_row in 1..rows.len() {
        let v_prev = &l_rows_orig[n_idx_row - 1];
        let v_curr = &l_rows_orig[n_idx_row];
        let n_width = usize::min(n_cols_key, usize::min(v_prev.len(), v_curr.len()));
        for n_idx_col in 0..n_width {
            if v_prev[n_idx_col] != v_curr[n_idx_col] {
                break;
            }
            rows[n_idx_row][n_idx_col] = EnumCellValue::None;
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name_replaces_illegal_and_truncates() {
        assert_eq!(sanitize_sheet_name("ME/CE [x]", "_"), "ME_CE _x_");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(
            sanitize_sheet_name(&"A".repeat(40), "_").chars().count(),
            N_LEN_EXCEL_SHEET_NAME_MAX
        );
    }

    #[test]
    fn test_derive_column_letter() {
        assert_eq!(derive_column_letter(0), "A");
        assert_eq!(derive_column_letter(17), "R");
        assert_eq!(derive_column_letter(25), "Z");
        assert_eq!(derive_column_letter(26), "AA");
        assert_eq!(derive_column_letter(27), "AB");
        assert_eq!(derive_column_letter(701), "ZZ");
        assert_eq!(derive_column_letter(702), "AAA");
    }

    #[test]
    fn test_validate_unique_columns_reports_duplicates() {
        let cols = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let err = validate_unique_columns(&cols).unwrap_err();
        assert!(err.contains("\"a\" x2 at indices [0, 2]"));
        assert!(validate_unique_columns(&cols[..2]).is_ok());
    }

    #[test]
    fn test_apply_key_run_blankout_is_hierarchical() {
        let s = |v: &str| EnumCellValue::String(v.to_string());
        let mut rows = vec![
            vec![s("Lee"), s("Ann"), EnumCellValue::Number(1.0)],
            vec![s("Lee"), s("Bo"), EnumCellValue::Number(2.0)],
            vec![s("Ng"), s("Bo"), EnumCellValue::Number(3.0)],
            vec![s("Ng"), s("Bo"), EnumCellValue::Number(4.0)],
        ];

        apply_key_run_blankout(&mut rows, 2);

        assert_eq!(rows[0][0], s("Lee"));
        assert_eq!(rows[1][0], EnumCellValue::None);
        assert_eq!(rows[1][1], s("Bo"));
        assert_eq!(rows[2][0], s("Ng"));
        assert_eq!(rows[2][1], s("Bo"));
        assert_eq!(rows[3][0], EnumCellValue::None);
        assert_eq!(rows[3][1], EnumCellValue::None);
        assert_eq!(rows[3][2], EnumCellValue::Number(4.0));
    }

    #[test]
    fn test_normalize_xlsx_path() {
        assert_eq!(
            normalize_xlsx_path(Path::new("/tmp/Gala_20240105.csv")),
            PathBuf::from("/tmp/Gala_20240105.xlsx")
        );
    }
}
