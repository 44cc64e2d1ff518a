//! XLSX writer kernel that renders sheet plans into workbook output.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use rust_xlsxwriter::{
    ConditionalFormatFormula, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook,
    Worksheet,
};

use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecSheetPlan, SpecStyleRegistry, SpecTableBlock,
    SpecXlsxReport, XlsxWriteError,
};
use crate::util::{cast_col_num, cast_row_num, derive_sheet_name_key, normalize_xlsx_path};

const C_DATE_NUM_FORMAT: &str = "mm/dd/yyyy";

/// Stateful workbook writer.
///
/// Sheets are buffered in memory; nothing touches the destination until
/// [`Self::close`] stages and atomically renames the finished file.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    dict_formats: BTreeMap<String, Format>,
    dict_formats_date: BTreeMap<String, Format>,
    set_sheet_names_existing: BTreeSet<String>,
    report: SpecXlsxReport,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and an immutable style registry.
    ///
    /// The path extension is normalized to `.xlsx`.
    pub fn new(path_file_out: impl AsRef<Path>, styles: &SpecStyleRegistry) -> Self {
        let mut dict_formats = BTreeMap::new();
        let mut dict_formats_date = BTreeMap::new();
        for (c_name, spec_fmt) in styles.iter() {
            dict_formats.insert(c_name.clone(), derive_rust_xlsx_format(spec_fmt));
            let spec_fmt_date = if spec_fmt.num_format.is_some() {
                spec_fmt.clone()
            } else {
                spec_fmt.with_(SpecCellFormat {
                    num_format: Some(C_DATE_NUM_FORMAT.to_string()),
                    ..Default::default()
                })
            };
            dict_formats_date.insert(c_name.clone(), derive_rust_xlsx_format(&spec_fmt_date));
        }

        Self {
            path_file_out: normalize_xlsx_path(path_file_out.as_ref()),
            workbook: Workbook::new(),
            dict_formats,
            dict_formats_date,
            set_sheet_names_existing: BTreeSet::new(),
            report: SpecXlsxReport::default(),
            if_closed: false,
        }
    }

    /// Return the normalized output path.
    pub fn file_out(&self) -> &Path {
        &self.path_file_out
    }

    /// Return snapshot of the write report.
    pub fn report(&self) -> SpecXlsxReport {
        self.report.clone()
    }

    /// Render one sheet plan as a new worksheet.
    pub fn write_sheet(&mut self, plan: &SpecSheetPlan) -> Result<(), XlsxWriteError> {
        if self.if_closed {
            return Err(XlsxWriteError::Closed);
        }

        let c_key = derive_sheet_name_key(&plan.name);
        if self.set_sheet_names_existing.contains(&c_key) {
            return Err(XlsxWriteError::DuplicateSheetName(plan.name.clone()));
        }

        let dict_formats = &self.dict_formats;
        let dict_formats_date = &self.dict_formats_date;

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&plan.name)?;
        if plan.if_landscape {
            worksheet.set_landscape();
        }

        for width in &plan.column_widths {
            for n_idx_col in width.col_first..=width.col_last {
                worksheet.set_column_width(cast_col_num(n_idx_col)?, width.width)?;
            }
        }
        for (n_idx_row, n_height) in &plan.row_heights {
            worksheet.set_row_height(cast_row_num(*n_idx_row)?, *n_height)?;
        }

        for cell in &plan.cells {
            let fmt = derive_style(dict_formats, &cell.style)?;
            let fmt_date = derive_style(dict_formats_date, &cell.style)?;
            write_cell_with_format(worksheet, cell.row, cell.col, &cell.value, fmt, fmt_date)?;
        }

        for table in &plan.tables {
            write_table(worksheet, &plan.name, table, dict_formats, dict_formats_date)?;
        }

        for cond in &plan.conditional_formulas {
            let fmt = derive_style(dict_formats, &cond.style)?.clone();
            let cfg_cond = ConditionalFormatFormula::new()
                .set_rule(cond.formula.as_str())
                .set_format(fmt);
            worksheet.add_conditional_format(
                cast_row_num(cond.row_first)?,
                cast_col_num(cond.col_first)?,
                cast_row_num(cond.row_last)?,
                cast_col_num(cond.col_last)?,
                &cfg_cond,
            )?;
        }

        for n_idx_col in &plan.cols_hidden {
            worksheet.set_column_hidden(cast_col_num(*n_idx_col)?)?;
        }

        self.set_sheet_names_existing.insert(c_key);
        self.report.sheets.push(plan.name.clone());
        tracing::debug!(sheet = %plan.name, tables = plan.tables.len(), "sheet rendered");
        Ok(())
    }

    /// Serialize the workbook and move it onto the destination path. Idempotent.
    ///
    /// The bytes are staged in a temporary file next to the destination and
    /// renamed only after a successful flush; on failure the staged file is
    /// removed and the destination is left untouched.
    pub fn close(&mut self) -> Result<PathBuf, XlsxWriteError> {
        if self.if_closed {
            return Ok(self.path_file_out.clone());
        }
        if self.report.sheets.is_empty() {
            self.report.warn("Workbook closed without any sheet.");
        }

        let v_bytes = self.workbook.save_to_buffer()?;
        persist_bytes_atomically(&self.path_file_out, &v_bytes)?;

        self.if_closed = true;
        tracing::info!(
            path = %self.path_file_out.display(),
            sheets = self.report.sheets.len(),
            bytes = v_bytes.len(),
            "workbook saved"
        );
        Ok(self.path_file_out.clone())
    }
}

fn persist_bytes_atomically(path_file_out: &Path, v_bytes: &[u8]) -> Result<(), XlsxWriteError> {
    let path_dir_parent = match path_file_out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let err_io = |source: std::io::Error| XlsxWriteError::Io {
        path: path_file_out.to_path_buf(),
        source,
    };

    let mut file_tmp = tempfile::Builder::new()
        .prefix(".eventreview-")
        .suffix(".xlsx.part")
        .tempfile_in(&path_dir_parent)
        .map_err(err_io)?;
    file_tmp.write_all(v_bytes).map_err(err_io)?;
    file_tmp.as_file().sync_all().map_err(err_io)?;
    file_tmp
        .persist(path_file_out)
        .map_err(|err| XlsxWriteError::Persist {
            path: path_file_out.to_path_buf(),
            source: err.error,
        })?;
    Ok(())
}

fn derive_style<'a>(
    dict_formats: &'a BTreeMap<String, Format>,
    name: &str,
) -> Result<&'a Format, XlsxWriteError> {
    dict_formats
        .get(name)
        .ok_or_else(|| XlsxWriteError::UnknownStyle(name.to_string()))
}

fn write_table(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    table: &SpecTableBlock,
    dict_formats: &BTreeMap<String, Format>,
    dict_formats_date: &BTreeMap<String, Format>,
) -> Result<(), XlsxWriteError> {
    let fmt_header = derive_style(dict_formats, &table.style_header)?;
    let fmt_body = derive_style(dict_formats, &table.style_body)?;
    let fmt_body_date = derive_style(dict_formats_date, &table.style_body)?;
    let n_width_header = table.header.len();

    for (n_idx_col, c_label) in table.header.iter().enumerate() {
        worksheet.write_string_with_format(
            cast_row_num(table.row_start)?,
            cast_col_num(table.col_start + n_idx_col)?,
            c_label,
            fmt_header,
        )?;
    }

    for (n_idx_row, row) in table.rows.iter().enumerate() {
        if row.len() != n_width_header {
            return Err(XlsxWriteError::RaggedTable {
                sheet: sheet_name.to_string(),
                row: n_idx_row,
                width: row.len(),
                width_header: n_width_header,
            });
        }
        for (n_idx_col, value) in row.iter().enumerate() {
            write_cell_with_format(
                worksheet,
                table.row_body_start() + n_idx_row,
                table.col_start + n_idx_col,
                value,
                fmt_body,
                fmt_body_date,
            )?;
        }
    }

    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
    format_date: &Format,
) -> Result<(), XlsxWriteError> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) if val.is_finite() => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Number(_) => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::Date(val) => {
            let n_year = u16::try_from(val.year()).map_err(|_| {
                XlsxWriteError::IndexOverflow(format!("date out of Excel range: {val}"))
            })?;
            let dt_excel = ExcelDateTime::from_ymd(n_year, val.month() as u8, val.day() as u8)?;
            worksheet.write_datetime_with_format(n_row, n_col, &dt_excel, format_date)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(align) = spec.align.as_deref().and_then(derive_format_align_horizontal) {
        format = format.set_align(align);
    }
    if let Some(align) = spec.valign.as_deref().and_then(derive_format_align_vertical) {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    // Side overrides are applied after the all-sides border.
    let l_borders: [(Option<i64>, fn(Format, FormatBorder) -> Format); 5] = [
        (spec.border, Format::set_border),
        (spec.top, Format::set_border_top),
        (spec.bottom, Format::set_border_bottom),
        (spec.left, Format::set_border_left),
        (spec.right, Format::set_border_right),
    ];
    for (n_code, apply_side) in l_borders {
        if let Some(n_code) = n_code {
            format = apply_side(format, derive_format_border(n_code));
        }
    }
    if let Some(val) = &spec.border_color {
        format = format.set_border_color(val.as_str());
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

/// Excel border style codes; `0` and unknown codes draw no border.
fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        8 => FormatBorder::MediumDashed,
        9 => FormatBorder::DashDot,
        10 => FormatBorder::MediumDashDot,
        11 => FormatBorder::DashDotDot,
        12 => FormatBorder::MediumDashDotDot,
        13 => FormatBorder::SlantDashDot,
        _ => FormatBorder::None,
    }
}

fn derive_format_align_horizontal(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        _ => None,
    }
}

fn derive_format_align_vertical(valign: &str) -> Option<FormatAlign> {
    match valign.trim().to_ascii_lowercase().as_str() {
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "center" | "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        "justify" | "vjustify" | "vertical_justify" => Some(FormatAlign::VerticalJustify),
        "distributed" | "vdistributed" | "vertical_distributed" => {
            Some(FormatAlign::VerticalDistributed)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use chrono::NaiveDate;

    use super::*;
    use crate::conf::{C_STYLE_HEADER, C_STYLE_TEXT, derive_default_xlsx_styles};
    use crate::spec::{SpecConditionalFormula, SpecTableBlock};

    fn sample_plan(name: &str) -> SpecSheetPlan {
        let mut plan = SpecSheetPlan::new(name);
        plan.put(0, 0, EnumCellValue::from("Title"), C_STYLE_TEXT);
        plan.put(
            1,
            0,
            EnumCellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 5).expect("date")),
            C_STYLE_TEXT,
        );
        plan.tables.push(SpecTableBlock {
            row_start: 3,
            col_start: 0,
            header: vec!["Name".to_string(), "Amount".to_string()],
            rows: vec![
                vec![EnumCellValue::from("Ann"), EnumCellValue::Number(10.0)],
                vec![EnumCellValue::from("Bo"), EnumCellValue::None],
            ],
            style_header: C_STYLE_HEADER.to_string(),
            style_body: C_STYLE_TEXT.to_string(),
        });
        plan.set_width(0, 1, 20.0);
        plan.cols_hidden.push(1);
        plan.conditional_formulas.push(SpecConditionalFormula {
            row_first: 4,
            col_first: 0,
            row_last: 5,
            col_last: 1,
            formula: "=ISBLANK($B5)".to_string(),
            style: C_STYLE_HEADER.to_string(),
        });
        plan
    }

    #[test]
    fn test_write_and_close_persists_sheets_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Gala_20240105.csv");

        let mut writer = XlsxWriter::new(&path, &derive_default_xlsx_styles());
        writer.write_sheet(&sample_plan("First")).expect("first");
        writer.write_sheet(&sample_plan("Second")).expect("second");
        let path_out = writer.close().expect("close");

        assert_eq!(path_out, dir.path().join("Gala_20240105.xlsx"));
        assert!(!path.exists());

        let mut workbook: Xlsx<_> = open_workbook(&path_out).expect("open");
        assert_eq!(workbook.sheet_names(), vec!["First", "Second"]);
        let range = workbook.worksheet_range("First").expect("range");
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Title".to_string())));
        assert_eq!(range.get_value((4, 0)), Some(&Data::String("Ann".to_string())));
        assert_eq!(range.get_value((4, 1)), Some(&Data::Float(10.0)));

        let l_leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(l_leftovers.is_empty());
    }

    #[test]
    fn test_duplicate_sheet_names_are_rejected_case_insensitively() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(dir.path().join("x.xlsx"), &derive_default_xlsx_styles());
        writer.write_sheet(&sample_plan("ME")).expect("first");
        let err = writer.write_sheet(&sample_plan("me")).unwrap_err();
        assert!(matches!(err, XlsxWriteError::DuplicateSheetName(name) if name == "me"));
    }

    #[test]
    fn test_unknown_style_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(dir.path().join("x.xlsx"), &derive_default_xlsx_styles());
        let mut plan = SpecSheetPlan::new("S");
        plan.put(0, 0, EnumCellValue::from("x"), "no_such_style");
        let err = writer.write_sheet(&plan).unwrap_err();
        assert!(matches!(err, XlsxWriteError::UnknownStyle(_)));
    }

    #[test]
    fn test_ragged_table_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(dir.path().join("x.xlsx"), &derive_default_xlsx_styles());
        let mut plan = SpecSheetPlan::new("S");
        plan.tables.push(SpecTableBlock {
            row_start: 0,
            col_start: 0,
            header: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![EnumCellValue::None]],
            style_header: C_STYLE_HEADER.to_string(),
            style_body: C_STYLE_TEXT.to_string(),
        });
        assert!(matches!(
            writer.write_sheet(&plan),
            Err(XlsxWriteError::RaggedTable { width: 1, width_header: 2, .. })
        ));
    }

    #[test]
    fn test_write_after_close_fails_and_close_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = XlsxWriter::new(dir.path().join("x.xlsx"), &derive_default_xlsx_styles());
        writer.write_sheet(&sample_plan("S")).expect("write");
        let path_first = writer.close().expect("close");
        let path_second = writer.close().expect("close again");
        assert_eq!(path_first, path_second);
        assert!(matches!(
            writer.write_sheet(&sample_plan("T")),
            Err(XlsxWriteError::Closed)
        ));
    }

    #[test]
    fn test_failed_persist_leaves_no_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path_missing_dir = dir.path().join("missing").join("out.xlsx");
        let mut writer = XlsxWriter::new(&path_missing_dir, &derive_default_xlsx_styles());
        writer.write_sheet(&sample_plan("S")).expect("write");
        assert!(matches!(writer.close(), Err(XlsxWriteError::Io { .. })));
        assert!(!path_missing_dir.exists());
    }

    #[test]
    fn test_alignment_keywords_map_to_their_axis() {
        assert_eq!(derive_format_align_horizontal("Center"), Some(FormatAlign::Center));
        assert_eq!(derive_format_align_horizontal("top"), None);
        assert_eq!(derive_format_align_vertical("top"), Some(FormatAlign::Top));
        assert_eq!(derive_format_align_vertical("center"), Some(FormatAlign::VerticalCenter));
        assert_eq!(derive_format_align_vertical("vcenter"), Some(FormatAlign::VerticalCenter));
        assert_eq!(derive_format_align_vertical("left"), None);
        assert_eq!(derive_format_border(0), FormatBorder::None);
        assert_eq!(derive_format_border(2), FormatBorder::Medium);
    }
}
