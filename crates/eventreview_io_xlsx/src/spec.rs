//! Shared XLSX specification models.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
///
/// Every field is optional so that presets can be layered with [`Self::with_`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Top border override.
    pub top: Option<i64>,
    /// Bottom border override.
    pub bottom: Option<i64>,
    /// Left border override.
    pub left: Option<i64>,
    /// Right border override.
    pub right: Option<i64>,
    /// Border color for all sides.
    pub border_color: Option<String>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            border_color: other
                .border_color
                .clone()
                .or_else(|| self.border_color.clone()),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Immutable named style registry.
///
/// Built once per run and handed to [`crate::writer::XlsxWriter`]; sheet plans
/// refer to styles by name only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecStyleRegistry {
    dict_styles: BTreeMap<String, SpecCellFormat>,
}

impl SpecStyleRegistry {
    /// Create a registry from a name -> format map.
    pub fn new(dict_styles: BTreeMap<String, SpecCellFormat>) -> Self {
        Self { dict_styles }
    }

    /// Return a new registry with `name` added (or replaced).
    pub fn with_style(mut self, name: &str, fmt: SpecCellFormat) -> Self {
        self.dict_styles.insert(name.to_string(), fmt);
        self
    }

    /// Look up a named style.
    pub fn get(&self, name: &str) -> Option<&SpecCellFormat> {
        self.dict_styles.get(name)
    }

    /// Iterate `(name, format)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SpecCellFormat)> {
        self.dict_styles.iter()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Normalized cell value during conversion/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
}

impl EnumCellValue {
    /// Whether the value counts as missing.
    ///
    /// `None`, non-finite numbers and blank strings are all missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::None => true,
            Self::Number(n) => !n.is_finite(),
            Self::String(s) => s.trim().is_empty(),
            Self::Date(_) => false,
        }
    }

    /// Text view of a non-missing value.
    pub fn as_text(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        match self {
            Self::String(s) => Some(s.trim().to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::None => None,
        }
    }

    /// Numeric view; numeric-looking strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<T> From<Option<T>> for EnumCellValue
where
    T: Into<EnumCellValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetPlanSpecification

/// One free-standing cell write.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecCellWrite {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
    /// Value (`None` writes a formatted blank).
    pub value: EnumCellValue,
    /// Registry style name.
    pub style: String,
}

/// Header + body grid written at an anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTableBlock {
    /// Header row index.
    pub row_start: usize,
    /// First column index.
    pub col_start: usize,
    /// Header labels.
    pub header: Vec<String>,
    /// Body rows, each as wide as `header`.
    pub rows: Vec<Vec<EnumCellValue>>,
    /// Registry style for header cells.
    pub style_header: String,
    /// Registry style for body cells.
    pub style_body: String,
}

impl SpecTableBlock {
    /// First body row index.
    pub fn row_body_start(&self) -> usize {
        self.row_start + 1
    }

    /// Last body row index, if any body row exists.
    pub fn row_body_end(&self) -> Option<usize> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.row_start + self.rows.len())
        }
    }
}

/// Width applied to an inclusive column band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecColumnWidth {
    /// First column (inclusive).
    pub col_first: usize,
    /// Last column (inclusive).
    pub col_last: usize,
    /// Width in character units.
    pub width: f64,
}

/// Formula-driven conditional format over a cell range.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecConditionalFormula {
    /// First row (inclusive).
    pub row_first: usize,
    /// First column (inclusive).
    pub col_first: usize,
    /// Last row (inclusive).
    pub row_last: usize,
    /// Last column (inclusive).
    pub col_last: usize,
    /// Excel formula, relative to the top-left cell.
    pub formula: String,
    /// Registry style applied when the formula holds.
    pub style: String,
}

/// Declarative content of one worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetPlan {
    /// Sheet name (already sanitized by the caller).
    pub name: String,
    /// Free-standing cell writes.
    pub cells: Vec<SpecCellWrite>,
    /// Tabular blocks.
    pub tables: Vec<SpecTableBlock>,
    /// Column width bands.
    pub column_widths: Vec<SpecColumnWidth>,
    /// Row heights `(row, height)`.
    pub row_heights: Vec<(usize, f64)>,
    /// Hidden columns (data kept).
    pub cols_hidden: Vec<usize>,
    /// Conditional formats.
    pub conditional_formulas: Vec<SpecConditionalFormula>,
    /// Landscape page orientation.
    pub if_landscape: bool,
}

impl SpecSheetPlan {
    /// Create an empty plan for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a cell write.
    pub fn put(&mut self, row: usize, col: usize, value: EnumCellValue, style: &str) {
        self.cells.push(SpecCellWrite {
            row,
            col,
            value,
            style: style.to_string(),
        });
    }

    /// Set width for an inclusive column band.
    pub fn set_width(&mut self, col_first: usize, col_last: usize, width: f64) {
        self.column_widths.push(SpecColumnWidth {
            col_first,
            col_last,
            width,
        });
    }

    /// Look up the value written at `(row, col)` by cells or tables.
    ///
    /// Later writes win, matching the order the writer applies them.
    pub fn value_at(&self, row: usize, col: usize) -> Option<&EnumCellValue> {
        for table in self.tables.iter().rev() {
            if col < table.col_start || col >= table.col_start + table.header.len() {
                continue;
            }
            if row == table.row_start {
                continue;
            }
            if row > table.row_start && row <= table.row_start + table.rows.len() {
                return table.rows[row - table.row_start - 1].get(col - table.col_start);
            }
        }
        self.cells
            .iter()
            .rev()
            .find(|cell| cell.row == row && cell.col == col)
            .map(|cell| &cell.value)
    }
}

/// Ordered sheet plans for one workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecWorkbookPlan {
    /// Sheets in final tab order.
    pub sheets: Vec<SpecSheetPlan>,
}

impl SpecWorkbookPlan {
    /// Sheet names in tab order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Find a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&SpecSheetPlan> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndErrors

/// Per-writer report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet names written, in order.
    pub sheets: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Workbook write failures.
#[derive(Debug, Error)]
pub enum XlsxWriteError {
    /// Error raised by `rust_xlsxwriter`.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    /// Filesystem error while staging the output.
    #[error("failed to stage workbook at {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Atomic rename onto the destination failed.
    #[error("failed to persist workbook to {path}: {source}")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Plan references a style missing from the registry.
    #[error("unknown style {0:?}")]
    UnknownStyle(String),
    /// Sheet name already used in this workbook.
    #[error("duplicate sheet name {0:?}")]
    DuplicateSheetName(String),
    /// Row/column outside Excel limits.
    #[error("{0}")]
    IndexOverflow(String),
    /// Table row width disagrees with its header.
    #[error("table row {row} in sheet {sheet:?} has {width} cells; header has {width_header}")]
    RaggedTable {
        /// Sheet name.
        sheet: String,
        /// Zero-based body row.
        row: usize,
        /// Body row width.
        width: usize,
        /// Header width.
        width_header: usize,
    },
    /// Writer used after `close()`.
    #[error("Cannot write after close().")]
    Closed,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
