//! Workbook Assembler: turns shaped records into an ordered sheet plan.
//!
//! Everything here is pure. The returned [`SpecWorkbookPlan`] holds every
//! cell of the report, so a run can be validated (and compared) before any
//! byte reaches the destination.

use std::collections::{BTreeMap, BTreeSet};

use eventreview_io_xlsx::{
    EnumCellValue, SpecConditionalFormula, SpecSheetPlan, SpecTableBlock, SpecWorkbookPlan,
    apply_key_run_blankout, derive_column_letter, derive_sheet_name_key, sanitize_sheet_name,
};
use tracing::debug;

use crate::conf::{
    C_SHEET_FULL_LIST, C_SHEET_PIVOT_DEPARTMENT, C_SHEET_PIVOT_MANAGER, C_SHEET_SUMMARY,
    C_STYLE_AS_OF_LABEL, C_STYLE_AS_OF_VALUE, C_STYLE_BANNER, C_STYLE_HIGHLIGHT,
    C_STYLE_LIST_BODY, C_STYLE_LIST_TITLE, C_STYLE_METRIC_HEADING, C_STYLE_METRIC_VALUE,
    C_STYLE_PIVOT_BODY, C_STYLE_SECTION_HEADING, C_STYLE_SUMMARY_SUBTITLE, C_STYLE_SUMMARY_TITLE,
    C_STYLE_TABLE_CONTENTS, C_STYLE_TABLE_HEADER, N_COL_BANNER, N_ROW_LIST_TITLE,
    N_ROW_TABLE_START, TUP_LIST_WIDTH_BANDS, TUP_PIVOT_WIDTH_BANDS, TUP_SUMMARY_SPACER_COLS,
    TUP_SUMMARY_VALUE_COLS,
};
use crate::directory::ManagerDirectory;
use crate::pivot::{SpecPivotTable, build_pivot_by_department, build_pivot_by_manager};
use crate::segment::{relabel_management_to_directory, segment_by_department, segment_by_manager};
use crate::spec::{EnumReportFormat, ReportError, SpecReportOptions, SpecRunParams};
use crate::summary::{SpecSummaryStats, compute_summary_stats};
use crate::table::RecordTable;

const C_SHEET_NAME_REPLACEMENT: &str = "_";

/// Workbook plan plus the counts reported for the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecAssembledReport {
    /// Sheets in tab order.
    pub plan: SpecWorkbookPlan,
    /// Rows on the Full List sheet.
    pub n_records_listed: usize,
    /// Records covered by a known manager (Broad and Full only).
    pub n_managed: Option<usize>,
    /// Department-affiliated records without a known manager (Broad and Full only).
    pub n_unmanaged_affiliated: Option<usize>,
    /// Known managers with no matching record.
    pub managers_empty: Vec<String>,
}

/// Build the workbook plan for the selected format.
///
/// `table_shaped` is the tagged, column-shaped record set.
pub fn plan_workbook(
    table_shaped: &RecordTable,
    directory: &ManagerDirectory,
    params: &SpecRunParams,
    options: &SpecReportOptions,
) -> Result<SpecAssembledReport, ReportError> {
    match params.format {
        EnumReportFormat::Broad => plan_broad(table_shaped, directory, params, options),
        EnumReportFormat::Full => plan_full(table_shaped, directory, params, options),
        EnumReportFormat::Flagged => plan_flagged(table_shaped, params, options),
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region FormatModes

fn plan_broad(
    table_shaped: &RecordTable,
    directory: &ManagerDirectory,
    params: &SpecRunParams,
    options: &SpecReportOptions,
) -> Result<SpecAssembledReport, ReportError> {
    let names = &options.column_names;
    let stats = compute_summary_stats(table_shaped, options)?;
    let table_list = table_shaped.without_columns(&[names.metro_region.as_str()]);

    let segments = segment_by_manager(
        &table_list,
        directory,
        names,
        &options.department_none_sentinel,
    )?;
    let table_managed = relabel_management_to_directory(&segments.managed, directory, names)?;
    let pivot_manager = build_pivot_by_manager(&table_managed, names)?;
    let pivot_department =
        build_pivot_by_department(&table_list, names, &options.department_none_sentinel)?;
    debug!(
        n_groups_manager = pivot_manager.len(),
        n_groups_department = pivot_department.len(),
        "pivots built"
    );

    let table_full_list = table_list.without_columns(&[names.management.as_str()]);
    let mut namer = SheetNamer::default();
    let sheets = vec![
        build_summary_sheet(namer.register(C_SHEET_SUMMARY)?, &stats, params, options),
        build_content_sheet(
            namer.register(C_SHEET_FULL_LIST)?,
            &table_full_list,
            params,
            options,
            true,
        ),
        build_pivot_sheet(namer.register(C_SHEET_PIVOT_MANAGER)?, &pivot_manager),
        build_pivot_sheet(namer.register(C_SHEET_PIVOT_DEPARTMENT)?, &pivot_department),
    ];

    Ok(SpecAssembledReport {
        plan: SpecWorkbookPlan { sheets },
        n_records_listed: table_full_list.height(),
        n_managed: Some(segments.managed.height()),
        n_unmanaged_affiliated: Some(segments.unmanaged_affiliated.height()),
        managers_empty: segments.managers_empty,
    })
}

fn plan_full(
    table_shaped: &RecordTable,
    directory: &ManagerDirectory,
    params: &SpecRunParams,
    options: &SpecReportOptions,
) -> Result<SpecAssembledReport, ReportError> {
    let names = &options.column_names;
    let stats = compute_summary_stats(table_shaped, options)?;
    let table_list = table_shaped.without_columns(&[names.metro_region.as_str()]);

    let segments = segment_by_manager(
        &table_list,
        directory,
        names,
        &options.department_none_sentinel,
    )?;
    let departments = segment_by_department(&table_list, names, &options.department_none_sentinel)?;

    let mut namer = SheetNamer::default();
    let table_full_list = table_list.without_columns(&[names.management.as_str()]);
    let sheet_full_list = build_content_sheet(
        namer.register(C_SHEET_FULL_LIST)?,
        &table_full_list,
        params,
        options,
        false,
    );
    let sheet_summary =
        build_summary_sheet(namer.register(C_SHEET_SUMMARY)?, &stats, params, options);

    let mut l_sheets_rest = Vec::new();
    for (c_manager, table_manager) in &segments.by_manager {
        l_sheets_rest.push(build_content_sheet(
            namer.register(c_manager)?,
            table_manager,
            params,
            options,
            false,
        ));
    }
    for (c_code, table_code) in &departments {
        l_sheets_rest.push(build_content_sheet(
            namer.register(c_code)?,
            &table_code.without_columns(&[names.management.as_str()]),
            params,
            options,
            false,
        ));
    }
    l_sheets_rest.sort_by(|a, b| a.name.cmp(&b.name));

    let mut sheets = vec![sheet_full_list, sheet_summary];
    sheets.extend(l_sheets_rest);

    Ok(SpecAssembledReport {
        plan: SpecWorkbookPlan { sheets },
        n_records_listed: table_full_list.height(),
        n_managed: Some(segments.managed.height()),
        n_unmanaged_affiliated: Some(segments.unmanaged_affiliated.height()),
        managers_empty: segments.managers_empty,
    })
}

fn plan_flagged(
    table_shaped: &RecordTable,
    params: &SpecRunParams,
    options: &SpecReportOptions,
) -> Result<SpecAssembledReport, ReportError> {
    let table_flagged = filter_flagged(table_shaped, options)?
        .without_columns(&[options.column_names.management.as_str()]);

    let mut namer = SheetNamer::default();
    let sheets = vec![build_content_sheet(
        namer.register(C_SHEET_FULL_LIST)?,
        &table_flagged,
        params,
        options,
        false,
    )];

    Ok(SpecAssembledReport {
        plan: SpecWorkbookPlan { sheets },
        n_records_listed: table_flagged.height(),
        n_managed: None,
        n_unmanaged_affiliated: None,
        managers_empty: Vec::new(),
    })
}

/// Keep records in the top-tier society or with a positive donor flag.
pub fn filter_flagged(
    table: &RecordTable,
    options: &SpecReportOptions,
) -> Result<RecordTable, ReportError> {
    let names = &options.column_names;
    let n_idx_society = table.require_position(&names.society)?;
    let n_idx_donor = table.require_position(&names.donor_flag)?;

    let l_idx = table.find_rows(|row| {
        !row[n_idx_society].is_missing() || row[n_idx_donor].as_f64().is_some_and(|v| v > 0.0)
    });
    debug!(n_rows_in = table.height(), n_rows_kept = l_idx.len(), "flagged filter");
    Ok(table.select_rows(&l_idx))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNames

/// Sanitizes sheet names and rejects case-insensitive collisions.
#[derive(Debug, Default)]
struct SheetNamer {
    dict_sources: BTreeMap<String, (String, String)>,
}

impl SheetNamer {
    fn register(&mut self, source: &str) -> Result<String, ReportError> {
        let c_sheet = sanitize_sheet_name(source, C_SHEET_NAME_REPLACEMENT);
        let c_key = derive_sheet_name_key(&c_sheet);
        if let Some((c_sheet_first, c_source_first)) = self.dict_sources.get(&c_key) {
            return Err(ReportError::SheetNameCollision {
                sheet: c_sheet_first.clone(),
                first: c_source_first.clone(),
                second: source.to_string(),
            });
        }
        self.dict_sources
            .insert(c_key, (c_sheet.clone(), source.to_string()));
        Ok(c_sheet)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetBuilders

fn build_summary_sheet(
    name: String,
    stats: &SpecSummaryStats,
    params: &SpecRunParams,
    options: &SpecReportOptions,
) -> SpecSheetPlan {
    let mut sheet = SpecSheetPlan::new(name);
    sheet.if_landscape = true;
    sheet.set_width(0, 0, 1.0);
    sheet.row_heights.push((0, 9.0));
    for &n_col in &TUP_SUMMARY_VALUE_COLS {
        sheet.set_width(n_col, n_col, 22.0);
    }
    for &n_col in &TUP_SUMMARY_SPACER_COLS {
        sheet.set_width(n_col, n_col, 2.0);
    }

    sheet.put(
        1,
        1,
        EnumCellValue::String(format!(
            "{} ({})",
            params.event_name(),
            params.event_identifier
        )),
        C_STYLE_SUMMARY_TITLE,
    );
    sheet.put(1, 8, EnumCellValue::from("As of"), C_STYLE_AS_OF_LABEL);
    let as_of = match (params.as_of_date(), params.date_token()) {
        (Some(date), _) => EnumCellValue::Date(date),
        (None, c_token) => EnumCellValue::from(c_token),
    };
    sheet.put(1, 9, as_of, C_STYLE_AS_OF_VALUE);
    sheet.put(
        2,
        1,
        EnumCellValue::String(options.summary_subtitle.clone()),
        C_STYLE_SUMMARY_SUBTITLE,
    );

    put_section_band(&mut sheet, 4, 1, 9, "SUMMARY");
    for (&n_col, (metric, n_count)) in TUP_SUMMARY_VALUE_COLS.iter().zip(&stats.metrics) {
        sheet.put(6, n_col, EnumCellValue::from(metric.label()), C_STYLE_METRIC_HEADING);
        sheet.put(7, n_col, EnumCellValue::Number(*n_count as f64), C_STYLE_METRIC_VALUE);
    }

    let c_regions = format!("TOP {} METRO REGIONS", options.n_top_regions);
    put_section_band(&mut sheet, 9, 1, 3, &c_regions);
    put_section_band(&mut sheet, 9, 7, 9, "RATINGS");
    put_count_rows(&mut sheet, 10, 1, 3, &stats.top_regions);
    put_count_rows(&mut sheet, 10, 7, 9, &stats.ratings);

    sheet
}

fn put_section_band(
    sheet: &mut SpecSheetPlan,
    row: usize,
    col_first: usize,
    col_last: usize,
    text: &str,
) {
    sheet.put(row, col_first, EnumCellValue::from(text), C_STYLE_SECTION_HEADING);
    for n_col in col_first + 1..=col_last {
        sheet.put(row, n_col, EnumCellValue::None, C_STYLE_SECTION_HEADING);
    }
}

fn put_count_rows(
    sheet: &mut SpecSheetPlan,
    row_first: usize,
    col_label: usize,
    col_count: usize,
    counts: &[(String, usize)],
) {
    for (n_offset, (c_label, n_count)) in counts.iter().enumerate() {
        let n_row = row_first + n_offset;
        sheet.put(
            n_row,
            col_label,
            EnumCellValue::from(c_label.as_str()),
            C_STYLE_TABLE_CONTENTS,
        );
        sheet.put(
            n_row,
            col_count,
            EnumCellValue::Number(*n_count as f64),
            C_STYLE_TABLE_CONTENTS,
        );
    }
}

/// List sheet with banner, title, width bands and the record table.
///
/// With `if_mark_comparison`, the comparison column is hidden and, when it
/// holds more than one distinct value, rows with a blank marker are filled.
fn build_content_sheet(
    name: String,
    table: &RecordTable,
    params: &SpecRunParams,
    options: &SpecReportOptions,
    if_mark_comparison: bool,
) -> SpecSheetPlan {
    let mut sheet = SpecSheetPlan::new(name);
    for (n_offset, c_line) in options.banner_lines.iter().enumerate() {
        sheet.put(
            n_offset,
            N_COL_BANNER,
            EnumCellValue::from(c_line.as_str()),
            C_STYLE_BANNER,
        );
    }
    sheet.put(
        N_ROW_LIST_TITLE,
        0,
        EnumCellValue::String(params.file_stem()),
        C_STYLE_LIST_TITLE,
    );
    for &(n_first, n_last, n_width) in &TUP_LIST_WIDTH_BANDS {
        sheet.set_width(n_first, n_last, n_width);
    }

    let block = SpecTableBlock {
        row_start: N_ROW_TABLE_START,
        col_start: 0,
        header: table.columns().to_vec(),
        rows: derive_display_rows(table),
        style_header: C_STYLE_TABLE_HEADER.to_string(),
        style_body: C_STYLE_LIST_BODY.to_string(),
    };

    if if_mark_comparison
        && let Some(n_idx_cmp) = table.position(&options.column_names.comparison)
    {
        sheet.cols_hidden.push(n_idx_cmp);
        let set_markers: BTreeSet<Option<String>> = table
            .rows()
            .iter()
            .map(|row| row[n_idx_cmp].as_text())
            .collect();
        if set_markers.len() > 1
            && let Some(n_row_last) = block.row_body_end()
        {
            let n_row_first = block.row_body_start();
            sheet.conditional_formulas.push(SpecConditionalFormula {
                row_first: n_row_first,
                col_first: 0,
                row_last: n_row_last,
                col_last: table.width() - 1,
                formula: format!(
                    "=ISBLANK(${}{})",
                    derive_column_letter(n_idx_cmp),
                    n_row_first + 1
                ),
                style: C_STYLE_HIGHLIGHT.to_string(),
            });
        }
    }

    sheet.tables.push(block);
    sheet
}

/// Pivot sheet: table at the top-left, outer key shown once per run.
fn build_pivot_sheet(name: String, pivot: &SpecPivotTable) -> SpecSheetPlan {
    let mut sheet = SpecSheetPlan::new(name);
    for &(n_first, n_last, n_width) in &TUP_PIVOT_WIDTH_BANDS {
        sheet.set_width(n_first, n_last, n_width);
    }

    let mut l_rows = pivot.to_cell_rows();
    apply_key_run_blankout(&mut l_rows, 1);
    sheet.tables.push(SpecTableBlock {
        row_start: 0,
        col_start: 0,
        header: pivot.header.clone(),
        rows: l_rows,
        style_header: C_STYLE_TABLE_HEADER.to_string(),
        style_body: C_STYLE_PIVOT_BODY.to_string(),
    });
    sheet
}

/// Table cells with every missing value written as a blank.
fn derive_display_rows(table: &RecordTable) -> Vec<Vec<EnumCellValue>> {
    table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|value| {
                    if value.is_missing() {
                        EnumCellValue::None
                    } else {
                        value.clone()
                    }
                })
                .collect()
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
