//! Management Tagger: composite manager label per record.

use eventreview_io_xlsx::EnumCellValue;

use crate::conf::C_TOKEN_SEPARATOR;
use crate::spec::{ReportError, SpecColumnNames};
use crate::table::RecordTable;

/// Pipe-join the distinct non-missing values of `sources`, in source order.
///
/// Returns an empty string when every source is missing.
pub fn derive_management_label(sources: &[&EnumCellValue]) -> String {
    let mut l_parts: Vec<String> = Vec::with_capacity(sources.len());
    for value in sources {
        if let Some(c_text) = value.as_text()
            && !l_parts.contains(&c_text)
        {
            l_parts.push(c_text);
        }
    }
    l_parts.join(C_TOKEN_SEPARATOR.to_string().as_str())
}

/// Split a pipe-delimited label into trimmed non-empty tokens.
pub fn split_label_tokens(label: &str) -> impl Iterator<Item = &str> {
    label
        .split(C_TOKEN_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Exact token membership; `"Lee"` does not match `"Leeds|Kim"`.
pub fn label_has_token(label: &str, token: &str) -> bool {
    split_label_tokens(label).any(|t| t == token)
}

/// Write the `Management` column from the primary-manager and plan-type fields.
///
/// An existing `Management` column is overwritten, so reapplying is a no-op.
pub fn apply_management_tags(
    table: &mut RecordTable,
    names: &SpecColumnNames,
) -> Result<(), ReportError> {
    let n_idx_manager = table.require_position(&names.primary_manager)?;
    let n_idx_plan_type = table.require_position(&names.plan_manager_type)?;

    let l_labels: Vec<EnumCellValue> = table
        .rows()
        .iter()
        .map(|row| {
            EnumCellValue::String(derive_management_label(&[
                &row[n_idx_manager],
                &row[n_idx_plan_type],
            ]))
        })
        .collect();

    table.upsert_column(&names.management, l_labels)
}
