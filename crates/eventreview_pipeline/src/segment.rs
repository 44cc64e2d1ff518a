//! Manager and department segmentation.

use std::collections::{BTreeMap, HashSet};

use eventreview_io_xlsx::EnumCellValue;
use tracing::{debug, warn};

use crate::conf::C_TOKEN_SEPARATOR;
use crate::directory::ManagerDirectory;
use crate::spec::{ReportError, SpecColumnNames};
use crate::tag::{label_has_token, split_label_tokens};
use crate::table::RecordTable;

/// Result of manager segmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecManagerSegments {
    /// Records matching at least one known manager, in input order, once each.
    pub managed: RecordTable,
    /// Department-affiliated records absent from `managed` (by identity).
    pub unmanaged_affiliated: RecordTable,
    /// Per-manager matches in directory order; managers without rows are left out.
    pub by_manager: Vec<(String, RecordTable)>,
    /// Known managers that matched no record.
    pub managers_empty: Vec<String>,
}

/// Whether a department cell is recorded and is not the "no degree" sentinel.
pub fn is_department_affiliated(value: &EnumCellValue, department_none_sentinel: &str) -> bool {
    value
        .as_text()
        .is_some_and(|c_text| c_text != department_none_sentinel)
}

/// Split a pipe-delimited department field into distinct codes, in field order.
pub fn split_department_codes(
    value: &EnumCellValue,
    department_none_sentinel: &str,
) -> Vec<String> {
    let Some(c_text) = value.as_text() else {
        return Vec::new();
    };
    let mut l_codes: Vec<String> = Vec::new();
    for c_code in split_label_tokens(&c_text) {
        if c_code != department_none_sentinel && !l_codes.iter().any(|c| c == c_code) {
            l_codes.push(c_code.to_string());
        }
    }
    l_codes
}

/// Partition records by known-manager coverage.
///
/// Matching is by exact pipe token of the `Management` label. The residual set
/// is an anti-join on the identity column followed by the department filter, so
/// a record with neither a manager nor a department lands in neither set.
pub fn segment_by_manager(
    table: &RecordTable,
    directory: &ManagerDirectory,
    names: &SpecColumnNames,
    department_none_sentinel: &str,
) -> Result<SpecManagerSegments, ReportError> {
    let n_idx_label = table.require_position(&names.management)?;
    let n_idx_id = table.require_position(&names.prospect_id)?;
    let n_idx_dept = table.require_position(&names.departments)?;

    let l_labels: Vec<String> = table
        .rows()
        .iter()
        .map(|row| row[n_idx_label].as_text().unwrap_or_default())
        .collect();

    let mut l_if_managed = vec![false; table.height()];
    let mut by_manager = Vec::new();
    let mut managers_empty = Vec::new();
    for c_manager in directory.names() {
        let l_idx: Vec<usize> = l_labels
            .iter()
            .enumerate()
            .filter(|(_, c_label)| label_has_token(c_label, c_manager))
            .map(|(n_idx, _)| n_idx)
            .collect();
        if l_idx.is_empty() {
            warn!(manager = c_manager, "known manager matched no records");
            managers_empty.push(c_manager.to_string());
            continue;
        }
        debug!(manager = c_manager, n_rows = l_idx.len(), "manager segment");
        for &n_idx in &l_idx {
            l_if_managed[n_idx] = true;
        }
        by_manager.push((c_manager.to_string(), table.select_rows(&l_idx)));
    }

    let l_idx_managed: Vec<usize> = (0..table.height()).filter(|&n| l_if_managed[n]).collect();

    let mut set_ids_managed: HashSet<String> = HashSet::new();
    for &n_idx in &l_idx_managed {
        set_ids_managed.insert(require_identity(table, n_idx, n_idx_id, names)?);
    }

    let mut l_idx_unmanaged = Vec::new();
    for n_idx in 0..table.height() {
        let c_id = require_identity(table, n_idx, n_idx_id, names)?;
        if set_ids_managed.contains(&c_id) {
            continue;
        }
        if is_department_affiliated(table.value(n_idx, n_idx_dept), department_none_sentinel) {
            l_idx_unmanaged.push(n_idx);
        }
    }

    debug!(
        n_managed = l_idx_managed.len(),
        n_unmanaged_affiliated = l_idx_unmanaged.len(),
        "manager segmentation"
    );

    Ok(SpecManagerSegments {
        managed: table.select_rows(&l_idx_managed),
        unmanaged_affiliated: table.select_rows(&l_idx_unmanaged),
        by_manager,
        managers_empty,
    })
}

/// Rewrite each `Management` label to the directory tokens it holds.
///
/// Token order follows the original label; unknown tokens are dropped.
pub fn relabel_management_to_directory(
    table: &RecordTable,
    directory: &ManagerDirectory,
    names: &SpecColumnNames,
) -> Result<RecordTable, ReportError> {
    let n_idx_label = table.require_position(&names.management)?;
    let c_sep = C_TOKEN_SEPARATOR.to_string();

    let l_labels: Vec<EnumCellValue> = table
        .rows()
        .iter()
        .map(|row| {
            let c_label = row[n_idx_label].as_text().unwrap_or_default();
            let l_known: Vec<&str> = split_label_tokens(&c_label)
                .filter(|token| directory.contains(token))
                .collect();
            EnumCellValue::String(l_known.join(c_sep.as_str()))
        })
        .collect();

    let mut table_relabeled = table.clone();
    table_relabeled.upsert_column(&names.management, l_labels)?;
    Ok(table_relabeled)
}

/// One table per distinct department code, sorted by code.
///
/// A record holding several codes appears in each of their groups; records
/// without an affiliation appear in none.
pub fn segment_by_department(
    table: &RecordTable,
    names: &SpecColumnNames,
    department_none_sentinel: &str,
) -> Result<Vec<(String, RecordTable)>, ReportError> {
    let n_idx_dept = table.require_position(&names.departments)?;

    let mut dict_codes: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (n_idx, row) in table.rows().iter().enumerate() {
        if !is_department_affiliated(&row[n_idx_dept], department_none_sentinel) {
            continue;
        }
        for c_code in split_department_codes(&row[n_idx_dept], department_none_sentinel) {
            dict_codes.entry(c_code).or_default().push(n_idx);
        }
    }

    debug!(n_departments = dict_codes.len(), "department segmentation");
    Ok(dict_codes
        .into_iter()
        .map(|(c_code, l_idx)| {
            let table_code = table.select_rows(&l_idx);
            (c_code, table_code)
        })
        .collect())
}

fn require_identity(
    table: &RecordTable,
    n_idx_row: usize,
    n_idx_id: usize,
    names: &SpecColumnNames,
) -> Result<String, ReportError> {
    table
        .value(n_idx_row, n_idx_id)
        .as_text()
        .ok_or_else(|| ReportError::MissingValue {
            column: names.prospect_id.clone(),
            row: n_idx_row,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> RecordTable {
        let names = SpecColumnNames::default();
        RecordTable::new(
            vec![
                names.prospect_id.clone(),
                names.management.clone(),
                names.departments.clone(),
            ],
            vec![
                vec!["A".into(), "Smith".into(), EnumCellValue::None],
                vec!["B".into(), "".into(), "ME".into()],
                vec!["C".into(), "Smith|Jones".into(), "ME|CE".into()],
                vec!["D".into(), "".into(), "0".into()],
                vec!["E".into(), "Leeds".into(), "CE".into()],
            ],
        )
        .expect("table")
    }

    fn ids(table: &RecordTable) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|row| row[0].as_text().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_manager_segments_partition_affiliated_records() {
        let directory = ManagerDirectory::from_names(["Smith", "Lee"]).expect("directory");
        let segments =
            segment_by_manager(&scenario(), &directory, &SpecColumnNames::default(), "0")
                .expect("segments");

        assert_eq!(ids(&segments.managed), vec!["A", "C"]);
        // D carries the sentinel; E's "Leeds" is not "Lee".
        assert_eq!(ids(&segments.unmanaged_affiliated), vec!["B", "E"]);
        assert_eq!(segments.by_manager.len(), 1);
        assert_eq!(segments.by_manager[0].0, "Smith");
        assert_eq!(segments.managers_empty, vec!["Lee"]);

        let managed: HashSet<_> = ids(&segments.managed).into_iter().collect();
        assert!(
            ids(&segments.unmanaged_affiliated)
                .iter()
                .all(|id| !managed.contains(id))
        );
    }

    #[test]
    fn test_department_segments_explode_codes() {
        let segments =
            segment_by_department(&scenario(), &SpecColumnNames::default(), "0").expect("depts");

        let summary: Vec<(String, Vec<String>)> = segments
            .iter()
            .map(|(code, table)| (code.clone(), ids(table)))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("CE".to_string(), vec!["C".to_string(), "E".to_string()]),
                ("ME".to_string(), vec!["B".to_string(), "C".to_string()]),
            ]
        );
    }

    #[test]
    fn test_relabel_keeps_only_directory_tokens_in_label_order() {
        let directory = ManagerDirectory::from_names(["Jones", "Smith"]).expect("directory");
        let names = SpecColumnNames::default();
        let table = RecordTable::new(
            vec![names.management.clone()],
            vec![vec!["Smith|Vance|Jones".into()], vec!["Vance".into()]],
        )
        .expect("table");

        let relabeled = relabel_management_to_directory(&table, &directory, &names).expect("ok");
        assert_eq!(relabeled.value(0, 0), &EnumCellValue::from("Smith|Jones"));
        assert_eq!(relabeled.value(1, 0), &EnumCellValue::from(""));
    }

    #[test]
    fn test_missing_identity_is_a_data_error() {
        let names = SpecColumnNames::default();
        let table = RecordTable::new(
            vec![
                names.prospect_id.clone(),
                names.management.clone(),
                names.departments.clone(),
            ],
            vec![vec![EnumCellValue::None, "Smith".into(), "ME".into()]],
        )
        .expect("table");
        let directory = ManagerDirectory::from_names(["Smith"]).expect("directory");

        assert!(matches!(
            segment_by_manager(&table, &directory, &names, "0"),
            Err(ReportError::MissingValue { row: 0, .. })
        ));
    }

    #[test]
    fn test_sentinel_is_not_an_affiliation() {
        assert!(!is_department_affiliated(&EnumCellValue::from("0"), "0"));
        assert!(!is_department_affiliated(&EnumCellValue::None, "0"));
        assert!(is_department_affiliated(&EnumCellValue::from("ME"), "0"));
        assert_eq!(
            split_department_codes(&EnumCellValue::from("ME|CE|ME"), "0"),
            vec!["ME", "CE"]
        );
    }
}
