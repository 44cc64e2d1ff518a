//! Run report model.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::EnumReportFormat;

/// Counters and diagnostics for one `run_event_report` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRun {
    /// Format mode of the run.
    pub format: EnumReportFormat,
    /// Written workbook path.
    pub path_output: PathBuf,
    /// Records handed to the pipeline.
    pub cnt_records_in: u64,
    /// Rows on the Full List sheet.
    pub cnt_records_listed: u64,
    /// Records under a known manager (Broad and Full only).
    pub cnt_managed: u64,
    /// Department-affiliated records without a known manager (Broad and Full only).
    pub cnt_unmanaged_affiliated: u64,
    /// Sheets in tab order.
    pub sheets: Vec<String>,
    /// Known managers whose sheet was skipped because no record matched.
    pub managers_skipped: Vec<String>,
    /// Non-fatal warnings from the writer.
    pub warnings: Vec<String>,
}

impl ReportRun {
    /// Number of sheets written.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_records_in".to_string(), self.cnt_records_in);
        dict_counts.insert("cnt_records_listed".to_string(), self.cnt_records_listed);
        dict_counts.insert("cnt_managed".to_string(), self.cnt_managed);
        dict_counts.insert(
            "cnt_unmanaged_affiliated".to_string(),
            self.cnt_unmanaged_affiliated,
        );
        dict_counts.insert("cnt_sheets".to_string(), self.sheet_count() as u64);
        dict_counts.insert(
            "cnt_managers_skipped".to_string(),
            self.managers_skipped.len() as u64,
        );
        dict_counts.insert("cnt_warnings".to_string(), self.warnings.len() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} format={} records={} listed={} managed={} unmanaged_affiliated={} sheets={} skipped_managers={} warnings={} -> {}",
            self.format,
            dict_counts["cnt_records_in"],
            dict_counts["cnt_records_listed"],
            dict_counts["cnt_managed"],
            dict_counts["cnt_unmanaged_affiliated"],
            dict_counts["cnt_sheets"],
            dict_counts["cnt_managers_skipped"],
            dict_counts["cnt_warnings"],
            self.path_output.display()
        )
    }
}

impl fmt::Display for ReportRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[REPORT]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_run_to_dict_and_format() {
        let report = ReportRun {
            format: EnumReportFormat::Full,
            path_output: PathBuf::from("/out/Gala_20240105.xlsx"),
            cnt_records_in: 3,
            cnt_records_listed: 3,
            cnt_managed: 2,
            cnt_unmanaged_affiliated: 1,
            sheets: vec!["Full List".to_string(), "Summary Stats".to_string()],
            managers_skipped: vec!["Nobody".to_string()],
            warnings: vec![],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_sheets"], 2);
        assert_eq!(dict_counts["cnt_managers_skipped"], 1);

        let txt = report.format("[REPORT]");
        assert_eq!(
            txt,
            "[REPORT] format=full records=3 listed=3 managed=2 unmanaged_affiliated=1 sheets=2 skipped_managers=1 warnings=0 -> /out/Gala_20240105.xlsx"
        );
        assert_eq!(report.to_string(), txt);
    }
}
