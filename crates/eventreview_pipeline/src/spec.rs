//! Report specification models and top-level error types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use eventreview_io_xlsx::XlsxWriteError;
use serde::Deserialize;
use thiserror::Error;

use crate::conf::{
    C_COL_CAMPUS_GIVING, C_COL_COMPARISON, C_COL_DEPARTMENTS, C_COL_DONOR_FLAG, C_COL_ENG_GIVING,
    C_COL_LIFETIME_GIVING, C_COL_MANAGEMENT, C_COL_METRO_REGION, C_COL_PLAN_MANAGER_TYPE,
    C_COL_PRIMARY_MANAGER, C_COL_PROSPECT_ID, C_COL_PROSPECT_NAME, C_COL_RATING, C_COL_SOCIETY,
    C_DEPARTMENT_NONE_SENTINEL, C_RATING_THRESHOLD, C_SUMMARY_SUBTITLE, N_TOP_REGIONS,
    TUP_BANNER_LINES, TUP_RANGES_BROAD_FULL, TUP_RANGES_FLAGGED,
};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Report format mode, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumReportFormat {
    /// Broad-audience report: summary, full list and two pivot sheets.
    Broad,
    /// Detailed report: summary, full list, per-manager and per-department sheets.
    Full,
    /// Flagged-event report: one filtered list, no summary.
    Flagged,
}

impl EnumReportFormat {
    /// Whether the format emits the Summary Stats sheet.
    pub fn if_has_summary(self) -> bool {
        !matches!(self, Self::Flagged)
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Broad => "broad",
            Self::Full => "full",
            Self::Flagged => "flagged",
        }
    }
}

impl fmt::Display for EnumReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnumReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broad" | "uif" => Ok(Self::Broad),
            "full" | "eng" => Ok(Self::Full),
            "flagged" | "event flag" | "event-flag" => Ok(Self::Flagged),
            _ => Err(ReportError::InvalidFormat(s.to_string())),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Inclusive column range named by its boundary columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpecColumnRange {
    /// First column removed.
    pub start: String,
    /// Last column removed.
    pub end: String,
}

impl SpecColumnRange {
    /// Create a range from boundary names.
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// Names of every field the core reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecColumnNames {
    /// Unique constituent identity.
    pub prospect_id: String,
    /// Constituent display name.
    pub prospect_name: String,
    /// Primary relationship manager.
    pub primary_manager: String,
    /// Plan-manager type.
    pub plan_manager_type: String,
    /// Engineering household giving.
    pub eng_giving: String,
    /// Campus household giving.
    pub campus_giving: String,
    /// Lifetime household giving.
    pub lifetime_giving: String,
    /// Pipe-delimited department codes.
    pub departments: String,
    /// Rating tier.
    pub rating: String,
    /// Top-tier society membership.
    pub society: String,
    /// Donor flag.
    pub donor_flag: String,
    /// Metro region.
    pub metro_region: String,
    /// Prior-run comparison marker.
    pub comparison: String,
    /// Derived management label.
    pub management: String,
}

impl SpecColumnNames {
    /// Giving measures in output order: engineering, campus, lifetime.
    pub fn giving_measures(&self) -> [&str; 3] {
        [
            self.eng_giving.as_str(),
            self.campus_giving.as_str(),
            self.lifetime_giving.as_str(),
        ]
    }
}

impl Default for SpecColumnNames {
    fn default() -> Self {
        Self {
            prospect_id: C_COL_PROSPECT_ID.to_string(),
            prospect_name: C_COL_PROSPECT_NAME.to_string(),
            primary_manager: C_COL_PRIMARY_MANAGER.to_string(),
            plan_manager_type: C_COL_PLAN_MANAGER_TYPE.to_string(),
            eng_giving: C_COL_ENG_GIVING.to_string(),
            campus_giving: C_COL_CAMPUS_GIVING.to_string(),
            lifetime_giving: C_COL_LIFETIME_GIVING.to_string(),
            departments: C_COL_DEPARTMENTS.to_string(),
            rating: C_COL_RATING.to_string(),
            society: C_COL_SOCIETY.to_string(),
            donor_flag: C_COL_DONOR_FLAG.to_string(),
            metro_region: C_COL_METRO_REGION.to_string(),
            comparison: C_COL_COMPARISON.to_string(),
            management: C_COL_MANAGEMENT.to_string(),
        }
    }
}

/// Run-independent report options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecReportOptions {
    /// Field names.
    pub column_names: SpecColumnNames,
    /// Removal ranges for Broad and Full formats.
    pub ranges_broad_full: Vec<SpecColumnRange>,
    /// Removal ranges for the Flagged format.
    pub ranges_flagged: Vec<SpecColumnRange>,
    /// Department value meaning "no degree".
    pub department_none_sentinel: String,
    /// Ratings strictly below this tier are counted as rated.
    pub rating_threshold: String,
    /// Number of metro regions listed on the summary sheet.
    pub n_top_regions: usize,
    /// Summary sheet subtitle.
    pub summary_subtitle: String,
    /// Confidentiality banner lines.
    pub banner_lines: Vec<String>,
}

impl SpecReportOptions {
    /// Removal ranges for `format`.
    pub fn column_ranges(&self, format: EnumReportFormat) -> &[SpecColumnRange] {
        match format {
            EnumReportFormat::Broad | EnumReportFormat::Full => &self.ranges_broad_full,
            EnumReportFormat::Flagged => &self.ranges_flagged,
        }
    }

    /// Parse options from a JSON document; absent keys keep their defaults.
    pub fn from_json_str(txt: &str) -> Result<Self, ReportError> {
        serde_json::from_str(txt).map_err(|err| ReportError::InvalidOptions(err.to_string()))
    }
}

impl Default for SpecReportOptions {
    fn default() -> Self {
        Self {
            column_names: SpecColumnNames::default(),
            ranges_broad_full: TUP_RANGES_BROAD_FULL
                .iter()
                .map(|(start, end)| SpecColumnRange::new(start, end))
                .collect(),
            ranges_flagged: TUP_RANGES_FLAGGED
                .iter()
                .map(|(start, end)| SpecColumnRange::new(start, end))
                .collect(),
            department_none_sentinel: C_DEPARTMENT_NONE_SENTINEL.to_string(),
            rating_threshold: C_RATING_THRESHOLD.to_string(),
            n_top_regions: N_TOP_REGIONS,
            summary_subtitle: C_SUMMARY_SUBTITLE.to_string(),
            banner_lines: TUP_BANNER_LINES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Per-run parameters handed over by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRunParams {
    /// Output format.
    pub format: EnumReportFormat,
    /// Destination path; its basename is `<event>_<date token>`.
    pub path_destination: PathBuf,
    /// Event identifier shown in the summary title.
    pub event_identifier: String,
}

impl SpecRunParams {
    /// Create run parameters.
    pub fn new(
        format: EnumReportFormat,
        path_destination: impl AsRef<Path>,
        event_identifier: &str,
    ) -> Self {
        Self {
            format,
            path_destination: path_destination.as_ref().to_path_buf(),
            event_identifier: event_identifier.to_string(),
        }
    }

    /// Destination file stem, used as the list-sheet title.
    pub fn file_stem(&self) -> String {
        self.path_destination
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Event name part of the stem (before the first `_`).
    pub fn event_name(&self) -> String {
        let c_stem = self.file_stem();
        match c_stem.split_once('_') {
            Some((c_name, _)) => c_name.to_string(),
            None => c_stem,
        }
    }

    /// Date token part of the stem (after the first `_`), if any.
    pub fn date_token(&self) -> Option<String> {
        self.file_stem()
            .split_once('_')
            .map(|(_, c_token)| c_token.to_string())
            .filter(|c_token| !c_token.is_empty())
    }

    /// Date token parsed as a calendar date, if it looks like one.
    pub fn as_of_date(&self) -> Option<NaiveDate> {
        let c_token = self.date_token()?;
        ["%Y%m%d", "%m%d%Y", "%Y-%m-%d", "%m-%d-%Y", "%m.%d.%Y", "%m%d%y"]
            .iter()
            .find_map(|c_fmt| NaiveDate::parse_from_str(&c_token, c_fmt).ok())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Pipeline failures; every variant aborts the run before any output exists.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A column the selected format reads is absent.
    #[error("Required column not found: {0:?}")]
    MissingColumn(String),
    /// A removal range cannot be honored.
    #[error("Malformed column range {start:?}..={end:?}: {reason}")]
    MalformedColumnRange {
        /// Start boundary name.
        start: String,
        /// End boundary name.
        end: String,
        /// Why the range is unusable.
        reason: String,
    },
    /// Two sheets normalize to the same name.
    #[error("Sheet name collision: {first:?} and {second:?} both map to sheet {sheet:?}")]
    SheetNameCollision {
        /// Sanitized sheet name.
        sheet: String,
        /// Source name already holding the sheet.
        first: String,
        /// Colliding source name.
        second: String,
    },
    /// Non-tabular or empty input.
    #[error("Invalid input table: {0}")]
    InvalidTable(String),
    /// A required field holds no value.
    #[error("Missing required value in column {column:?} at row {row}")]
    MissingValue {
        /// Column name.
        column: String,
        /// Zero-based data row.
        row: usize,
    },
    /// Manager directory could not be built.
    #[error("Invalid manager directory: {0}")]
    InvalidManagerDirectory(String),
    /// Options document could not be parsed.
    #[error("Invalid report options: {0}")]
    InvalidOptions(String),
    /// Unknown format selector.
    #[error("Unknown report format: {0:?}")]
    InvalidFormat(String),
    /// Workbook rendering or persistence failed.
    #[error(transparent)]
    Write(#[from] XlsxWriteError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
