//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{SpecCellFormat, SpecStyleRegistry};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Workbook file extension.
pub const C_XLSX_EXTENSION: &str = "xlsx";

/// Canonical style keys every registry built by [`derive_default_xlsx_styles`] carries.
pub const C_STYLE_TEXT: &str = "text";
/// Table header style key.
pub const C_STYLE_HEADER: &str = "header";

/// Build default named format presets used by [`crate::writer::XlsxWriter`].
pub fn derive_default_xlsx_styles() -> SpecStyleRegistry {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(C_STYLE_TEXT.to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        C_STYLE_HEADER.to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            border: Some(1),
            align: Some("center".to_string()),
            ..Default::default()
        }),
    );

    SpecStyleRegistry::new(dict_fmt)
}
