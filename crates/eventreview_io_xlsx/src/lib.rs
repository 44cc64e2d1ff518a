//! `eventreview_io_xlsx` v1:
//! XLSX writer kernel for event review workbooks.
//!
//! - `conf`   : constants and default presets
//! - `spec`   : cell formats, style registry, sheet plans, errors
//! - `util`   : pure helper functions
//! - `writer` : plan renderer with atomic persistence
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_STYLE_HEADER, C_STYLE_TEXT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL, derive_default_xlsx_styles,
};
pub use spec::{
    EnumCellValue, SpecCellFormat, SpecCellWrite, SpecColumnWidth, SpecConditionalFormula,
    SpecSheetPlan, SpecStyleRegistry, SpecTableBlock, SpecWorkbookPlan, SpecXlsxReport,
    XlsxWriteError,
};
pub use util::{
    apply_key_run_blankout, derive_column_letter, derive_sheet_name_key, normalize_xlsx_path,
    sanitize_sheet_name, validate_unique_columns,
};
pub use writer::XlsxWriter;
