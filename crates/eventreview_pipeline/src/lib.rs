//! `eventreview_pipeline` v1:
//! Event registration review reports.
//!
//! - `conf`      : column defaults, layout constants, report styles
//! - `spec`      : formats, options, run parameters, errors
//! - `table`     : record table and Polars adapters
//! - `directory` : known-manager directory
//! - `tag`       : management labels
//! - `shape`     : column-range removal
//! - `pivot`     : giving totals by manager / department
//! - `segment`   : manager and department segments
//! - `summary`   : summary metrics
//! - `assemble`  : workbook plans per format
//! - `report`    : run report
//! - `pipeline`  : end-to-end run
pub mod assemble;
pub mod conf;
pub mod directory;
pub mod pipeline;
pub mod pivot;
pub mod report;
pub mod segment;
pub mod shape;
pub mod spec;
pub mod summary;
pub mod table;
pub mod tag;

pub use assemble::{SpecAssembledReport, filter_flagged, plan_workbook};
pub use conf::derive_report_styles;
pub use directory::ManagerDirectory;
pub use pipeline::{plan_event_report, run_event_report};
pub use pivot::{SpecPivotRow, SpecPivotTable, build_pivot_by_department, build_pivot_by_manager};
pub use report::ReportRun;
pub use segment::{
    SpecManagerSegments, is_department_affiliated, relabel_management_to_directory,
    segment_by_department, segment_by_manager, split_department_codes,
};
pub use shape::shape_columns;
pub use spec::{
    EnumReportFormat, ReportError, SpecColumnNames, SpecColumnRange, SpecReportOptions,
    SpecRunParams,
};
pub use summary::{EnumSummaryMetric, SpecSummaryStats, compute_summary_stats};
pub use table::RecordTable;
pub use tag::{apply_management_tags, derive_management_label, label_has_token, split_label_tokens};
