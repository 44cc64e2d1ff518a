//! Report constants, default column layout and the style registry.

use eventreview_io_xlsx::{
    C_STYLE_HEADER, SpecCellFormat, SpecStyleRegistry, derive_default_xlsx_styles,
};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnNames

/// Identity column.
pub const C_COL_PROSPECT_ID: &str = "PROSPECTLOOKUPID";
/// Display name column.
pub const C_COL_PROSPECT_NAME: &str = "PROSPECTNAME";
/// Primary relationship manager column.
pub const C_COL_PRIMARY_MANAGER: &str = "PGLname";
/// Plan-manager type column.
pub const C_COL_PLAN_MANAGER_TYPE: &str = "PLANMANAGERPLANTYPE";
/// Engineering household giving.
pub const C_COL_ENG_GIVING: &str = "EngHHGiving";
/// Campus household giving.
pub const C_COL_CAMPUS_GIVING: &str = "UrbanaHHGiving";
/// Lifetime household giving.
pub const C_COL_LIFETIME_GIVING: &str = "LifeHHGiving";
/// Pipe-delimited degree department codes.
pub const C_COL_DEPARTMENTS: &str = "ENGDegreeDeptsConcat";
/// Rating tier.
pub const C_COL_RATING: &str = "Rating";
/// Top-tier society membership.
pub const C_COL_SOCIETY: &str = "PRESIDENTSCOUNCIL";
/// Event fund donor flag.
pub const C_COL_DONOR_FLAG: &str = "EVSFundDonor";
/// Metro region.
pub const C_COL_METRO_REGION: &str = "METROREGION";
/// Prior-run comparison marker.
pub const C_COL_COMPARISON: &str = "Old";
/// Derived management label.
pub const C_COL_MANAGEMENT: &str = "Management";

/// Separator inside management labels and department code sets.
pub const C_TOKEN_SEPARATOR: char = '|';
/// Department value recorded for constituents without an engineering degree.
pub const C_DEPARTMENT_NONE_SENTINEL: &str = "0";
/// Ratings strictly below this tier count as "rated".
pub const C_RATING_THRESHOLD: &str = "M";

/// Broad/Full removal ranges (inclusive name pairs, applied in order).
pub const TUP_RANGES_BROAD_FULL: [(&str, &str); 5] = [
    ("PRESIDENTSCOUNCIL", "PRESIDENTSCOUNCILFY"),
    ("totaluidegrees", "majordescription3"),
    ("ZIPCODE", "Email"),
    ("ISDECEASED", "SPOUSEDECEASED"),
    ("HOUSEHOLDLOOKUPID", "HOUSEHOLDDISPLAYNAME"),
];

/// Flagged removal ranges; membership and donor fields survive.
pub const TUP_RANGES_FLAGGED: [(&str, &str); 3] = [
    ("PRESIDENTSCOUNCILFY", "ENGDegree3Concat"),
    ("ISDECEASED", "EngHHGiving"),
    ("HOUSEHOLDLOOKUPID", "HOUSEHOLDDISPLAYNAME"),
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetLayout

/// Summary sheet name.
pub const C_SHEET_SUMMARY: &str = "Summary Stats";
/// Full list sheet name.
pub const C_SHEET_FULL_LIST: &str = "Full List";
/// By-manager pivot sheet name.
pub const C_SHEET_PIVOT_MANAGER: &str = "Pivot Tables - PM";
/// By-department pivot sheet name.
pub const C_SHEET_PIVOT_DEPARTMENT: &str = "Pivot Tables - Dept";

/// Header row of every list table (leaves room for banner and title).
pub const N_ROW_TABLE_START: usize = 7;
/// Title row on list sheets.
pub const N_ROW_LIST_TITLE: usize = 5;
/// Banner column on list sheets (`E`).
pub const N_COL_BANNER: usize = 4;
/// Regions shown on the summary sheet.
pub const N_TOP_REGIONS: usize = 10;

/// Confidentiality banner, one line per row.
pub const TUP_BANNER_LINES: [&str; 3] = [
    "** C O N F I D E N T I A L   I N F O R M A T I O N **",
    "This information is proprietary, privileged, and confidential. The disclosure of this information would cause competitive",
    "harm to the Foundation and/or Alumni Association and any unauthorized disclosure or distribution is prohibited.",
];

/// Summary sheet subtitle.
pub const C_SUMMARY_SUBTITLE: &str = "College of Engineering Affiliates";

/// List sheet width bands `(first, last, width)`.
pub const TUP_LIST_WIDTH_BANDS: [(usize, usize, f64); 9] = [
    (0, 0, 10.0),
    (2, 3, 10.0),
    (6, 8, 10.0),
    (1, 1, 20.0),
    (4, 5, 20.0),
    (9, 12, 20.0),
    (14, 16, 20.0),
    (13, 13, 15.0),
    (17, 18, 5.0),
];

/// Pivot sheet width bands.
pub const TUP_PIVOT_WIDTH_BANDS: [(usize, usize, f64); 2] = [(0, 1, 25.0), (2, 4, 10.0)];

/// Summary value columns (`B`, `D`, `F`, `H`, `J`).
pub const TUP_SUMMARY_VALUE_COLS: [usize; 5] = [1, 3, 5, 7, 9];
/// Summary spacer columns (`C`, `E`, `G`, `I`, `K`).
pub const TUP_SUMMARY_SPACER_COLS: [usize; 5] = [2, 4, 6, 8, 10];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Styles

/// Confidentiality banner line.
pub const C_STYLE_BANNER: &str = "banner";
/// List sheet title.
pub const C_STYLE_LIST_TITLE: &str = "list_title";
/// List sheet body.
pub const C_STYLE_LIST_BODY: &str = "list_body";
/// Pivot sheet body.
pub const C_STYLE_PIVOT_BODY: &str = "pivot_body";
/// Comparison highlight fill.
pub const C_STYLE_HIGHLIGHT: &str = "highlight";
/// Summary title.
pub const C_STYLE_SUMMARY_TITLE: &str = "summary_title";
/// Summary subtitle.
pub const C_STYLE_SUMMARY_SUBTITLE: &str = "summary_subtitle";
/// "As of" label.
pub const C_STYLE_AS_OF_LABEL: &str = "as_of_label";
/// "As of" value.
pub const C_STYLE_AS_OF_VALUE: &str = "as_of_value";
/// Summary section band.
pub const C_STYLE_SECTION_HEADING: &str = "section_heading";
/// Summary metric heading.
pub const C_STYLE_METRIC_HEADING: &str = "metric_heading";
/// Summary metric value.
pub const C_STYLE_METRIC_VALUE: &str = "metric_value";
/// Summary table rows.
pub const C_STYLE_TABLE_CONTENTS: &str = "table_contents";

const C_FONT_HEADING: &str = "Cambria";
const C_FONT_BODY: &str = "Calibri";
const C_COLOR_ACCENT: &str = "#4F81BD";
const C_COLOR_MUTED: &str = "#A6A6A6";
const C_COLOR_WHITE: &str = "#FFFFFF";
const C_COLOR_RULE: &str = "#D9D9D9";
const C_COLOR_HIGHLIGHT: &str = "#FFFF00";
const N_BORDER_MEDIUM: i64 = 2;

/// Build the immutable style registry shared by every sheet of a run.
pub fn derive_report_styles() -> SpecStyleRegistry {
    let fmt_heading = SpecCellFormat {
        font_name: Some(C_FONT_HEADING.to_string()),
        ..Default::default()
    };
    let fmt_body = SpecCellFormat {
        font_name: Some(C_FONT_BODY.to_string()),
        ..Default::default()
    };

    derive_default_xlsx_styles()
        .with_style(
            C_STYLE_BANNER,
            SpecCellFormat {
                align: Some("center".to_string()),
                ..Default::default()
            },
        )
        .with_style(
            C_STYLE_LIST_TITLE,
            SpecCellFormat {
                bold: Some(true),
                font_size: Some(12),
                ..Default::default()
            },
        )
        .with_style(C_STYLE_LIST_BODY, SpecCellFormat::default())
        .with_style(
            C_STYLE_PIVOT_BODY,
            SpecCellFormat {
                valign: Some("top".to_string()),
                ..Default::default()
            },
        )
        .with_style(
            C_STYLE_HIGHLIGHT,
            SpecCellFormat {
                bg_color: Some(C_COLOR_HIGHLIGHT.to_string()),
                ..Default::default()
            },
        )
        .with_style(
            C_STYLE_SUMMARY_TITLE,
            fmt_heading.with_(SpecCellFormat {
                font_size: Some(24),
                font_color: Some(C_COLOR_ACCENT.to_string()),
                ..Default::default()
            }),
        )
        .with_style(
            C_STYLE_SUMMARY_SUBTITLE,
            fmt_body.with_(SpecCellFormat {
                font_size: Some(18),
                font_color: Some(C_COLOR_MUTED.to_string()),
                ..Default::default()
            }),
        )
        .with_style(
            C_STYLE_AS_OF_LABEL,
            fmt_body.with_(SpecCellFormat {
                italic: Some(true),
                font_size: Some(11),
                font_color: Some(C_COLOR_MUTED.to_string()),
                align: Some("right".to_string()),
                ..Default::default()
            }),
        )
        .with_style(
            C_STYLE_AS_OF_VALUE,
            fmt_heading.with_(SpecCellFormat {
                num_format: Some("mm/dd/yyyy".to_string()),
                font_size: Some(20),
                font_color: Some(C_COLOR_MUTED.to_string()),
                top: Some(N_BORDER_MEDIUM),
                bottom: Some(N_BORDER_MEDIUM),
                border_color: Some(C_COLOR_MUTED.to_string()),
                ..Default::default()
            }),
        )
        .with_style(
            C_STYLE_SECTION_HEADING,
            fmt_heading.with_(SpecCellFormat {
                font_size: Some(14),
                font_color: Some(C_COLOR_MUTED.to_string()),
                top: Some(N_BORDER_MEDIUM),
                bottom: Some(N_BORDER_MEDIUM),
                border_color: Some(C_COLOR_MUTED.to_string()),
                ..Default::default()
            }),
        )
        .with_style(
            C_STYLE_METRIC_HEADING,
            fmt_heading.with_(SpecCellFormat {
                font_size: Some(9),
                font_color: Some(C_COLOR_WHITE.to_string()),
                bold: Some(true),
                align: Some("center".to_string()),
                valign: Some("vcenter".to_string()),
                text_wrap: Some(true),
                bg_color: Some(C_COLOR_ACCENT.to_string()),
                top: Some(N_BORDER_MEDIUM),
                left: Some(N_BORDER_MEDIUM),
                right: Some(N_BORDER_MEDIUM),
                border_color: Some(C_COLOR_ACCENT.to_string()),
                ..Default::default()
            }),
        )
        .with_style(
            C_STYLE_METRIC_VALUE,
            fmt_body.with_(SpecCellFormat {
                font_size: Some(20),
                font_color: Some(C_COLOR_MUTED.to_string()),
                num_format: Some("0".to_string()),
                align: Some("center".to_string()),
                valign: Some("vcenter".to_string()),
                left: Some(N_BORDER_MEDIUM),
                right: Some(N_BORDER_MEDIUM),
                bottom: Some(N_BORDER_MEDIUM),
                border_color: Some(C_COLOR_MUTED.to_string()),
                ..Default::default()
            }),
        )
        .with_style(
            C_STYLE_TABLE_CONTENTS,
            fmt_body.with_(SpecCellFormat {
                font_size: Some(10),
                text_wrap: Some(true),
                top: Some(1),
                bottom: Some(1),
                border_color: Some(C_COLOR_RULE.to_string()),
                ..Default::default()
            }),
        )
}

/// Header style used by list and pivot tables.
pub const C_STYLE_TABLE_HEADER: &str = C_STYLE_HEADER;

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_styles_cover_every_style_key() {
        let styles = derive_report_styles();
        for c_name in [
            C_STYLE_BANNER,
            C_STYLE_LIST_TITLE,
            C_STYLE_LIST_BODY,
            C_STYLE_PIVOT_BODY,
            C_STYLE_HIGHLIGHT,
            C_STYLE_SUMMARY_TITLE,
            C_STYLE_SUMMARY_SUBTITLE,
            C_STYLE_AS_OF_LABEL,
            C_STYLE_AS_OF_VALUE,
            C_STYLE_SECTION_HEADING,
            C_STYLE_METRIC_HEADING,
            C_STYLE_METRIC_VALUE,
            C_STYLE_TABLE_CONTENTS,
            C_STYLE_TABLE_HEADER,
        ] {
            assert!(styles.get(c_name).is_some(), "missing style {c_name}");
        }
    }
}
