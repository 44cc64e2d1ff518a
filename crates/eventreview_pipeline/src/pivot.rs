//! Pivot Builder: giving totals grouped by manager or department.

use std::collections::BTreeMap;

use eventreview_io_xlsx::EnumCellValue;

use crate::spec::{ReportError, SpecColumnNames};
use crate::table::RecordTable;

/// One pivot group: `(key, prospect name)` with summed measures.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPivotRow {
    /// Outer grouping key (management label or department codes).
    pub key: String,
    /// Prospect display name; empty when the record has none.
    pub prospect_name: String,
    /// Summed giving measures: engineering, campus, lifetime.
    pub measures: [f64; 3],
}

/// Grouped sums ordered by `(key, prospect name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPivotTable {
    /// Header labels: key, prospect name, then the three measures.
    pub header: Vec<String>,
    /// Groups in key order.
    pub rows: Vec<SpecPivotRow>,
}

impl SpecPivotTable {
    /// Measures summed across every group sharing `key`.
    pub fn total_for_key(&self, key: &str) -> [f64; 3] {
        self.rows
            .iter()
            .filter(|row| row.key == key)
            .fold([0.0; 3], |mut acc, row| {
                for (n_idx, value) in row.measures.iter().enumerate() {
                    acc[n_idx] += value;
                }
                acc
            })
    }

    /// Distinct keys in order.
    pub fn keys(&self) -> Vec<&str> {
        let mut l_keys: Vec<&str> = self.rows.iter().map(|row| row.key.as_str()).collect();
        l_keys.dedup();
        l_keys
    }

    /// Body rows as cells, in header order.
    pub fn to_cell_rows(&self) -> Vec<Vec<EnumCellValue>> {
        self.rows
            .iter()
            .map(|row| {
                let mut v_row = vec![
                    EnumCellValue::String(row.key.clone()),
                    EnumCellValue::String(row.prospect_name.clone()),
                ];
                v_row.extend(row.measures.iter().map(|&v| EnumCellValue::Number(v)));
                v_row
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Totals by `(Management, ProspectName)` over records with a non-empty label.
pub fn build_pivot_by_manager(
    table: &RecordTable,
    names: &SpecColumnNames,
) -> Result<SpecPivotTable, ReportError> {
    build_pivot(table, names, &names.management, |_| true)
}

/// Totals by `(DepartmentCodes, ProspectName)` over department-affiliated records.
///
/// Records holding the "no degree" sentinel are excluded like missing ones.
pub fn build_pivot_by_department(
    table: &RecordTable,
    names: &SpecColumnNames,
    department_none_sentinel: &str,
) -> Result<SpecPivotTable, ReportError> {
    build_pivot(table, names, &names.departments, |c_key| {
        c_key != department_none_sentinel
    })
}

fn build_pivot<F>(
    table: &RecordTable,
    names: &SpecColumnNames,
    key_column: &str,
    if_keep_key: F,
) -> Result<SpecPivotTable, ReportError>
where
    F: Fn(&str) -> bool,
{
    let n_idx_key = table.require_position(key_column)?;
    let n_idx_name = table.require_position(&names.prospect_name)?;
    let l_idx_measures = names
        .giving_measures()
        .iter()
        .map(|c_name| table.require_position(c_name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut dict_groups: BTreeMap<(String, String), [f64; 3]> = BTreeMap::new();
    for row in table.rows() {
        let Some(c_key) = row[n_idx_key].as_text() else {
            continue;
        };
        if !if_keep_key(&c_key) {
            continue;
        }
        let c_name = row[n_idx_name].as_text().unwrap_or_default();
        let acc = dict_groups.entry((c_key, c_name)).or_insert([0.0; 3]);
        for (n_slot, &n_idx_col) in l_idx_measures.iter().enumerate() {
            acc[n_slot] += row[n_idx_col].as_f64().unwrap_or(0.0);
        }
    }

    // Measure columns follow the giving order, not grouping order.
    let mut l_header = vec![key_column.to_string(), names.prospect_name.clone()];
    l_header.extend(names.giving_measures().iter().map(ToString::to_string));

    Ok(SpecPivotTable {
        header: l_header,
        rows: dict_groups
            .into_iter()
            .map(|((key, prospect_name), measures)| SpecPivotRow {
                key,
                prospect_name,
                measures,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RecordTable {
        let names = SpecColumnNames::default();
        let columns = vec![
            names.prospect_name.clone(),
            names.management.clone(),
            names.departments.clone(),
            names.lifetime_giving.clone(),
            names.eng_giving.clone(),
            names.campus_giving.clone(),
        ];
        let row = |name: &str, mgmt: &str, dept: Option<&str>, life: f64, eng: Option<f64>| {
            vec![
                EnumCellValue::from(name),
                EnumCellValue::from(mgmt),
                EnumCellValue::from(dept),
                EnumCellValue::from(life),
                EnumCellValue::from(eng),
                EnumCellValue::Number(1.0),
            ]
        };
        RecordTable::new(
            columns,
            vec![
                row("Alpha", "Smith", None, 10.0, Some(100.0)),
                row("Beta", "", Some("ME"), 20.0, Some(50.0)),
                row("Gamma", "Smith|Jones", Some("ME|CE"), 30.0, Some(0.0)),
                row("Alpha", "Smith", Some("0"), 5.0, None),
            ],
        )
        .expect("table")
    }

    #[test]
    fn test_manager_pivot_groups_labels_and_orders_measures() {
        let names = SpecColumnNames::default();
        let pivot = build_pivot_by_manager(&table(), &names).expect("pivot");

        assert_eq!(
            pivot.header,
            vec!["Management", "PROSPECTNAME", "EngHHGiving", "UrbanaHHGiving", "LifeHHGiving"]
        );
        assert_eq!(pivot.keys(), vec!["Smith", "Smith|Jones"]);
        assert_eq!(pivot.rows[0].prospect_name, "Alpha");
        // missing engineering giving counts as zero
        assert_eq!(pivot.rows[0].measures, [100.0, 2.0, 15.0]);
        assert_eq!(pivot.total_for_key("Smith|Jones"), [0.0, 1.0, 30.0]);
    }

    #[test]
    fn test_department_pivot_skips_sentinel_and_missing() {
        let names = SpecColumnNames::default();
        let pivot = build_pivot_by_department(&table(), &names, "0").expect("pivot");

        assert_eq!(pivot.keys(), vec!["ME", "ME|CE"]);
        assert_eq!(pivot.total_for_key("ME"), [50.0, 1.0, 20.0]);
        assert_eq!(pivot.to_cell_rows()[1][0], EnumCellValue::from("ME|CE"));
    }

    #[test]
    fn test_missing_measure_column_is_reported() {
        let table = RecordTable::new(
            vec!["PROSPECTNAME".to_string(), "Management".to_string()],
            vec![],
        )
        .expect("table");
        assert!(matches!(
            build_pivot_by_manager(&table, &SpecColumnNames::default()),
            Err(ReportError::MissingColumn(_))
        ));
    }
}
