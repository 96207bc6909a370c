// crates/core/src/history.rs

//! Evaluation history grouped by year and quarter.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::rules::one_decimal;
use crate::types::EvaluationRecord;

/// Evaluations created in one calendar quarter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterSummary {
    pub year: i32,
    /// 1..=4
    pub quarter: u8,
    pub evaluations: Vec<EvaluationRecord>,
}

impl QuarterSummary {
    pub fn average_self_rating(&self) -> f64 {
        if self.evaluations.is_empty() {
            return 0.0;
        }
        let total: f64 = self.evaluations.iter().map(|e| e.overall_rating).sum();
        total / self.evaluations.len() as f64
    }

    /// Mean over the evaluations that carry a manager rating.
    pub fn average_manager_rating(&self) -> Option<f64> {
        let ratings: Vec<f64> = self
            .evaluations
            .iter()
            .filter_map(|e| e.manager_rating)
            .collect();
        if ratings.is_empty() {
            return None;
        }
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }

    pub fn label(&self) -> String {
        format!("Q{} {}", self.quarter, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    /// Present quarters in ascending order.
    pub quarters: Vec<QuarterSummary>,
}

impl YearSummary {
    pub fn evaluation_count(&self) -> usize {
        self.quarters.iter().map(|q| q.evaluations.len()).sum()
    }

    pub fn quarter(&self, quarter: u8) -> Option<&QuarterSummary> {
        self.quarters.iter().find(|q| q.quarter == quarter)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceHistory {
    /// Newest year first.
    pub years: Vec<YearSummary>,
}

impl PerformanceHistory {
    pub fn from_records(records: &[EvaluationRecord]) -> Self {
        let mut grouped: BTreeMap<i32, BTreeMap<u8, Vec<EvaluationRecord>>> = BTreeMap::new();
        for record in records {
            let year = record.created_at.year();
            let quarter = quarter_of(record.created_at.month());
            grouped
                .entry(year)
                .or_default()
                .entry(quarter)
                .or_default()
                .push(record.clone());
        }

        let years = grouped
            .into_iter()
            .rev()
            .map(|(year, quarters)| YearSummary {
                year,
                quarters: quarters
                    .into_iter()
                    .map(|(quarter, evaluations)| QuarterSummary {
                        year,
                        quarter,
                        evaluations,
                    })
                    .collect(),
            })
            .collect();

        Self { years }
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn year(&self, year: i32) -> Option<&YearSummary> {
        self.years.iter().find(|y| y.year == year)
    }

    /// Quarters across all years, oldest first.
    pub fn chronological_quarters(&self) -> impl Iterator<Item = &QuarterSummary> {
        self.years.iter().rev().flat_map(|y| y.quarters.iter())
    }

    /// Self-rating trend of a quarter against the preceding quarter that has data.
    pub fn quarter_trend(&self, year: i32, quarter: u8) -> Option<RatingTrend> {
        let mut previous: Option<&QuarterSummary> = None;
        for q in self.chronological_quarters() {
            if q.year == year && q.quarter == quarter {
                return RatingTrend::between(
                    q.average_self_rating(),
                    previous.map(QuarterSummary::average_self_rating),
                );
            }
            previous = Some(q);
        }
        None
    }
}

fn quarter_of(month: u32) -> u8 {
    month.div_ceil(3) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingTrend {
    pub direction: TrendDirection,
    /// Absolute change.
    pub delta: f64,
}

impl RatingTrend {
    /// `None` when there is no previous rating; a zero rating counts as none.
    pub fn between(current: f64, previous: Option<f64>) -> Option<Self> {
        let previous = previous.filter(|p| *p != 0.0)?;
        let diff = current - previous;
        let direction = if diff > 0.0 {
            TrendDirection::Up
        } else if diff < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };
        Some(Self {
            direction,
            delta: diff.abs(),
        })
    }

    pub fn delta_label(&self) -> String {
        one_decimal(self.delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::types::{timestamp, EvaluationStatus, RecordId};

    fn record(id: i64, created_at: &str, rating: f64, manager: Option<f64>) -> EvaluationRecord {
        EvaluationRecord {
            id: RecordId::Number(id),
            employee_email: "david.chen@company.com".to_string(),
            employee_name: "David Chen".to_string(),
            overall_rating: rating,
            manager_rating: manager,
            competency_ratings: BTreeMap::new(),
            created_at: timestamp::parse(created_at).unwrap(),
            status: EvaluationStatus::Reviewed,
        }
    }

    fn sample() -> PerformanceHistory {
        PerformanceHistory::from_records(&[
            record(1, "2024-11-20T10:00:00", 3.0, Some(3.0)),
            record(2, "2025-02-10T10:00:00", 3.5, None),
            record(3, "2025-03-31T10:00:00", 4.5, Some(4.0)),
            record(4, "2025-07-01T10:00:00", 3.0, None),
        ])
    }

    #[test]
    fn test_groups_newest_year_first() {
        let history = sample();
        let years: Vec<i32> = history.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2025, 2024]);

        let y2025 = history.year(2025).unwrap();
        assert_eq!(y2025.evaluation_count(), 3);
        let quarters: Vec<u8> = y2025.quarters.iter().map(|q| q.quarter).collect();
        assert_eq!(quarters, vec![1, 3]);
        assert_eq!(history.year(2024).unwrap().quarters[0].label(), "Q4 2024");
    }

    #[test]
    fn test_quarter_averages() {
        let history = sample();
        let q1 = history.year(2025).unwrap().quarter(1).unwrap();
        assert_eq!(q1.average_self_rating(), 4.0);
        assert_eq!(q1.average_manager_rating(), Some(4.0));

        let q3 = history.year(2025).unwrap().quarter(3).unwrap();
        assert_eq!(q3.average_manager_rating(), None);
    }

    #[test]
    fn test_quarter_trend_crosses_year_boundary() {
        let history = sample();
        let trend = history.quarter_trend(2025, 1).unwrap();
        assert_eq!(trend.direction, TrendDirection::Up);
        assert_eq!(trend.delta_label(), "1.0");

        let trend = history.quarter_trend(2025, 3).unwrap();
        assert_eq!(trend.direction, TrendDirection::Down);

        assert!(history.quarter_trend(2024, 4).is_none());
        assert!(history.quarter_trend(2023, 1).is_none());
    }

    #[test]
    fn test_trend_between() {
        assert_eq!(RatingTrend::between(3.0, None), None);
        assert_eq!(RatingTrend::between(3.0, Some(0.0)), None);
        let stable = RatingTrend::between(3.0, Some(3.0)).unwrap();
        assert_eq!(stable.direction, TrendDirection::Stable);
        assert_eq!(stable.delta, 0.0);
    }

    #[test]
    fn test_empty_history() {
        let history = PerformanceHistory::from_records(&[]);
        assert!(history.is_empty());
        assert_eq!(history.chronological_quarters().count(), 0);
    }
}
