//! Summary statistics: named metrics, top metro regions, rating distribution.

use std::collections::BTreeMap;

use crate::spec::{ReportError, SpecColumnNames, SpecReportOptions};
use crate::table::RecordTable;

////////////////////////////////////////////////////////////////////////////////
// #region Metrics

/// Headline counts on the Summary Stats sheet, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumSummaryMetric {
    /// Every shaped record.
    TotalRegistrants,
    /// Engineering household giving above zero.
    EngHouseholdDonor,
    /// Department field recorded (the "no degree" sentinel counts).
    EngAlumni,
    /// Rating recorded and strictly below the threshold tier.
    RatedAboveThreshold,
    /// Plan-manager type recorded.
    UnderPlanManager,
}

impl EnumSummaryMetric {
    /// All metrics in display order.
    pub const ALL: [EnumSummaryMetric; 5] = [
        Self::TotalRegistrants,
        Self::EngHouseholdDonor,
        Self::EngAlumni,
        Self::RatedAboveThreshold,
        Self::UnderPlanManager,
    ];

    /// Heading shown above the value.
    pub fn label(self) -> &'static str {
        match self {
            Self::TotalRegistrants => "Total Registrants",
            Self::EngHouseholdDonor => "ENG HH Donor",
            Self::EngAlumni => "ENG Alumni",
            Self::RatedAboveThreshold => "Rated $25K+",
            Self::UnderPlanManager => "Under PM",
        }
    }

    /// Count the records satisfying this metric.
    pub fn evaluate(
        self,
        table: &RecordTable,
        options: &SpecReportOptions,
    ) -> Result<usize, ReportError> {
        let names = &options.column_names;
        let n_count = match self {
            Self::TotalRegistrants => table.height(),
            Self::EngHouseholdDonor => {
                let n_idx = table.require_position(&names.eng_giving)?;
                table
                    .find_rows(|row| row[n_idx].as_f64().is_some_and(|v| v > 0.0))
                    .len()
            }
            Self::EngAlumni => {
                let n_idx = table.require_position(&names.departments)?;
                table.find_rows(|row| !row[n_idx].is_missing()).len()
            }
            Self::RatedAboveThreshold => {
                let n_idx = table.require_position(&names.rating)?;
                let c_threshold = options.rating_threshold.as_str();
                table
                    .find_rows(|row| {
                        row[n_idx]
                            .as_text()
                            .is_some_and(|c_rating| c_rating.as_str() < c_threshold)
                    })
                    .len()
            }
            Self::UnderPlanManager => {
                let n_idx = table.require_position(&names.plan_manager_type)?;
                table.find_rows(|row| !row[n_idx].is_missing()).len()
            }
        };
        Ok(n_count)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Stats

/// Everything the Summary Stats sheet displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSummaryStats {
    /// Headline metrics in display order.
    pub metrics: Vec<(EnumSummaryMetric, usize)>,
    /// Most frequent metro regions, descending; ties keep first appearance.
    pub top_regions: Vec<(String, usize)>,
    /// Record count per rating tier, in tier order.
    pub ratings: Vec<(String, usize)>,
}

/// Compute summary statistics over the shaped record set.
pub fn compute_summary_stats(
    table: &RecordTable,
    options: &SpecReportOptions,
) -> Result<SpecSummaryStats, ReportError> {
    let names: &SpecColumnNames = &options.column_names;

    let metrics = EnumSummaryMetric::ALL
        .iter()
        .map(|&metric| Ok((metric, metric.evaluate(table, options)?)))
        .collect::<Result<Vec<_>, ReportError>>()?;

    let n_idx_region = table.require_position(&names.metro_region)?;
    let mut l_regions: Vec<(String, usize)> = Vec::new();
    for row in table.rows() {
        let Some(c_region) = row[n_idx_region].as_text() else {
            continue;
        };
        match l_regions.iter_mut().find(|(c, _)| *c == c_region) {
            Some((_, n)) => *n += 1,
            None => l_regions.push((c_region, 1)),
        }
    }
    // Stable sort keeps first-appearance order among ties.
    l_regions.sort_by(|a, b| b.1.cmp(&a.1));
    l_regions.truncate(options.n_top_regions);

    let n_idx_rating = table.require_position(&names.rating)?;
    let mut dict_ratings: BTreeMap<String, usize> = BTreeMap::new();
    for row in table.rows() {
        if let Some(c_rating) = row[n_idx_rating].as_text() {
            *dict_ratings.entry(c_rating).or_insert(0) += 1;
        }
    }

    Ok(SpecSummaryStats {
        metrics,
        top_regions: l_regions,
        ratings: dict_ratings.into_iter().collect(),
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
