//! End-to-end event report run.

use eventreview_io_xlsx::XlsxWriter;
use tracing::{debug, info, warn};

use crate::assemble::{SpecAssembledReport, plan_workbook};
use crate::conf::derive_report_styles;
use crate::directory::ManagerDirectory;
use crate::report::ReportRun;
use crate::shape::shape_columns;
use crate::spec::{ReportError, SpecReportOptions, SpecRunParams};
use crate::table::RecordTable;
use crate::tag::apply_management_tags;

/// Tag, shape and assemble the report without touching the filesystem.
///
/// Every configuration and data-shape error surfaces here, before a writer
/// exists.
pub fn plan_event_report(
    table: &RecordTable,
    directory: &ManagerDirectory,
    params: &SpecRunParams,
    options: &SpecReportOptions,
) -> Result<SpecAssembledReport, ReportError> {
    if table.is_empty() {
        return Err(ReportError::InvalidTable("input table has no rows".to_string()));
    }
    let names = &options.column_names;
    let n_idx_id = table.require_position(&names.prospect_id)?;
    if let Some(n_idx_row) = table.find_rows(|row| row[n_idx_id].is_missing()).first() {
        return Err(ReportError::MissingValue {
            column: names.prospect_id.clone(),
            row: *n_idx_row,
        });
    }

    let mut table_tagged = table.clone();
    apply_management_tags(&mut table_tagged, names)?;

    let table_shaped = shape_columns(&table_tagged, options.column_ranges(params.format))?;
    debug!(
        n_cols_in = table_tagged.width(),
        n_cols_shaped = table_shaped.width(),
        "columns shaped"
    );

    plan_workbook(&table_shaped, directory, params, options)
}

/// Run one report and write it to `params.path_destination` (as `.xlsx`).
///
/// The workbook appears at the destination only when every sheet was
/// rendered and persisted.
pub fn run_event_report(
    table: &RecordTable,
    directory: &ManagerDirectory,
    params: &SpecRunParams,
    options: &SpecReportOptions,
) -> Result<ReportRun, ReportError> {
    info!(
        format = %params.format,
        n_records = table.height(),
        n_managers = directory.len(),
        destination = %params.path_destination.display(),
        "event report started"
    );

    let assembled = plan_event_report(table, directory, params, options)?;
    for c_manager in &assembled.managers_empty {
        warn!(manager = %c_manager, "manager sheet skipped");
    }
    if let Some(n_unmanaged) = assembled.n_unmanaged_affiliated {
        info!(n_unmanaged_affiliated = n_unmanaged, "unmanaged affiliated records");
    }

    let mut writer = XlsxWriter::new(&params.path_destination, &derive_report_styles());
    for sheet in &assembled.plan.sheets {
        writer.write_sheet(sheet)?;
    }
    let path_output = writer.close()?;
    let report_xlsx = writer.report();

    let report = ReportRun {
        format: params.format,
        path_output,
        cnt_records_in: table.height() as u64,
        cnt_records_listed: assembled.n_records_listed as u64,
        cnt_managed: assembled.n_managed.unwrap_or(0) as u64,
        cnt_unmanaged_affiliated: assembled.n_unmanaged_affiliated.unwrap_or(0) as u64,
        sheets: report_xlsx.sheets,
        managers_skipped: assembled.managers_empty,
        warnings: report_xlsx.warnings,
    };
    info!("{report}");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use eventreview_io_xlsx::EnumCellValue;
    use polars::prelude::*;
    use tempfile::tempdir;

    use super::*;
    use crate::pivot::build_pivot_by_manager;
    use crate::spec::{EnumReportFormat, SpecColumnRange};
    use crate::tag::label_has_token;

    /// Three-record export with a removable `ZIPCODE..Email` block.
    fn scenario_frame() -> DataFrame {
        df!(
            "PROSPECTLOOKUPID" => ["A", "B", "C"],
            "PROSPECTNAME" => ["Alpha", "Beta", "Gamma"],
            "PGLname" => [Some("Smith"), None, Some("Smith")],
            "PLANMANAGERPLANTYPE" => [None, None, Some("Jones")],
            "ZIPCODE" => ["61801", "61820", "60601"],
            "City" => ["Urbana", "Champaign", "Chicago"],
            "Email" => ["a@x", "b@x", "c@x"],
            "EngHHGiving" => [100.0, 50.0, 0.0],
            "UrbanaHHGiving" => [Some(10.0), None, Some(1.0)],
            "LifeHHGiving" => [1000.0, 500.0, 2.0],
            "ENGDegreeDeptsConcat" => [None, Some("ME"), Some("ME|CE")],
            "Rating" => [Some("K"), Some("A"), None],
            "METROREGION" => ["Chicago", "Peoria", "Chicago"],
            "PRESIDENTSCOUNCIL" => [None::<&str>, None, None],
            "EVSFundDonor" => [Some(0.0), Some(5.0), None],
        )
        .expect("frame")
    }

    fn options() -> SpecReportOptions {
        SpecReportOptions {
            ranges_broad_full: vec![SpecColumnRange::new("ZIPCODE", "Email")],
            ranges_flagged: vec![SpecColumnRange::new("City", "City")],
            ..Default::default()
        }
    }

    fn table() -> RecordTable {
        RecordTable::from_dataframe(&scenario_frame()).expect("table")
    }

    fn sheet_names(path: &std::path::Path) -> Vec<String> {
        let workbook: Xlsx<_> = open_workbook(path).expect("open");
        workbook.sheet_names().to_vec()
    }

    #[test]
    fn test_broad_run_writes_four_sheets_in_order() {
        let dir = tempdir().expect("tempdir");
        let params = SpecRunParams::new(
            EnumReportFormat::Broad,
            dir.path().join("Gala_20240105.csv"),
            "EVT-1",
        );
        let directory = ManagerDirectory::from_names(["Smith"]).expect("directory");

        let report = run_event_report(&table(), &directory, &params, &options()).expect("run");

        let path_out = dir.path().join("Gala_20240105.xlsx");
        assert_eq!(report.path_output, path_out);
        assert_eq!(
            sheet_names(&path_out),
            vec!["Summary Stats", "Full List", "Pivot Tables - PM", "Pivot Tables - Dept"]
        );
        assert_eq!(report.cnt_managed, 2);
        assert_eq!(report.cnt_unmanaged_affiliated, 1);

        let mut workbook: Xlsx<_> = open_workbook(&path_out).expect("open");
        let range = workbook.worksheet_range("Full List").expect("full list");
        assert_eq!(
            range.get_value((7, 0)),
            Some(&Data::String("PROSPECTLOOKUPID".to_string()))
        );
        // shaped: ZIPCODE..Email is gone
        let row_header: Vec<String> = (0..range.width() as u32)
            .filter_map(|n_col| match range.get_value((7, n_col)) {
                Some(Data::String(s)) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert!(!row_header.iter().any(|c| c == "City"));
        assert!(!row_header.iter().any(|c| c == "METROREGION"));

        let range = workbook.worksheet_range("Summary Stats").expect("summary");
        assert_eq!(
            range.get_value((1, 1)),
            Some(&Data::String("Gala (EVT-1)".to_string()))
        );
        assert_eq!(range.get_value((7, 1)), Some(&Data::Float(3.0)));
    }

    #[test]
    fn test_full_run_writes_manager_and_department_sheets() {
        let dir = tempdir().expect("tempdir");
        let params = SpecRunParams::new(
            EnumReportFormat::Full,
            dir.path().join("Gala_20240105.xlsx"),
            "EVT-1",
        );
        let directory = ManagerDirectory::from_names(["Smith"]).expect("directory");

        let report = run_event_report(&table(), &directory, &params, &options()).expect("run");

        assert_eq!(
            sheet_names(&report.path_output),
            vec!["Full List", "Summary Stats", "CE", "ME", "Smith"]
        );
        assert_eq!(report.cnt_records_listed, 3);

        let mut workbook: Xlsx<_> = open_workbook(&report.path_output).expect("open");
        let range = workbook.worksheet_range("ME").expect("ME");
        assert_eq!(range.get_value((8, 0)), Some(&Data::String("B".to_string())));
        assert_eq!(range.get_value((9, 0)), Some(&Data::String("C".to_string())));
    }

    #[test]
    fn test_flagged_run_keeps_positive_donors_only() {
        let directory = ManagerDirectory::default();
        let params = SpecRunParams::new(EnumReportFormat::Flagged, "/unused/Gala_1.xlsx", "E");
        let assembled =
            plan_event_report(&table(), &directory, &params, &options()).expect("plan");

        assert_eq!(assembled.plan.sheet_names(), vec!["Full List"]);
        assert_eq!(assembled.n_records_listed, 1);
        let sheet = assembled.plan.sheet("Full List").expect("sheet");
        assert_eq!(sheet.value_at(8, 0), Some(&EnumCellValue::from("B")));
    }

    #[test]
    fn test_missing_boundary_aborts_without_output() {
        let dir = tempdir().expect("tempdir");
        let params = SpecRunParams::new(
            EnumReportFormat::Broad,
            dir.path().join("Gala_20240105.xlsx"),
            "EVT-1",
        );
        let options = SpecReportOptions {
            ranges_broad_full: vec![SpecColumnRange::new("ZIPCODE", "NOPE")],
            ..Default::default()
        };

        let err = run_event_report(&table(), &ManagerDirectory::default(), &params, &options)
            .expect_err("must fail");
        assert!(matches!(err, ReportError::MissingColumn(c) if c == "NOPE"));
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn test_empty_input_is_rejected_before_transformation() {
        let table = RecordTable::new(vec!["PROSPECTLOOKUPID".to_string()], vec![]).expect("table");
        let params = SpecRunParams::new(EnumReportFormat::Broad, "/unused/x.xlsx", "E");
        assert!(matches!(
            plan_event_report(&table, &ManagerDirectory::default(), &params, &options()),
            Err(ReportError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_manager_pivot_totals_match_raw_token_totals() {
        let options = options();
        let names = &options.column_names;
        let mut tagged = table();
        apply_management_tags(&mut tagged, names).expect("tag");
        let pivot = build_pivot_by_manager(&tagged, names).expect("pivot");

        let n_idx_label = tagged.position(&names.management).expect("label");
        let l_idx_measures: Vec<usize> = names
            .giving_measures()
            .iter()
            .map(|c| tagged.position(c).expect("measure"))
            .collect();

        for c_manager in ["Smith", "Jones"] {
            let mut raw = [0.0; 3];
            for row in tagged.rows() {
                let c_label = row[n_idx_label].as_text().unwrap_or_default();
                if label_has_token(&c_label, c_manager) {
                    for (n_slot, &n_idx) in l_idx_measures.iter().enumerate() {
                        raw[n_slot] += row[n_idx].as_f64().unwrap_or(0.0);
                    }
                }
            }
            let mut grouped = [0.0; 3];
            for row in pivot.rows.iter().filter(|r| label_has_token(&r.key, c_manager)) {
                for n_slot in 0..3 {
                    grouped[n_slot] += row.measures[n_slot];
                }
            }
            assert_eq!(raw, grouped, "manager {c_manager}");
        }
    }

    #[test]
    fn test_repeated_plans_are_identical() {
        let directory = ManagerDirectory::from_names(["Smith", "Jones"]).expect("directory");
        let params = SpecRunParams::new(EnumReportFormat::Full, "/unused/Gala_20240105.xlsx", "E");
        let first = plan_event_report(&table(), &directory, &params, &options()).expect("plan");
        let second = plan_event_report(&table(), &directory, &params, &options()).expect("plan");
        assert_eq!(first, second);
    }

    #[test]
    fn test_ipc_bytes_feed_the_pipeline() {
        let mut df = scenario_frame();
        let mut v_bytes = Vec::new();
        IpcWriter::new(&mut v_bytes).finish(&mut df).expect("ipc");

        let table = RecordTable::from_ipc_bytes(&v_bytes).expect("table");
        assert_eq!(table.height(), 3);
        assert_eq!(table.value(1, 2), &EnumCellValue::None);
    }
}
