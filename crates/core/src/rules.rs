// crates/core/src/rules.rs

//! Insight rules.
//!
//! Each [`Rule`] inspects an [`InsightContext`] and reports zero or more
//! [`Finding`]s carrying the values that triggered it. A finding is turned
//! into display text by [`Finding::into_insight`], so detection and wording
//! can be tested separately.

use crate::insight::{Insight, InsightType, Priority};
use crate::types::{EvaluationRecord, TeamAnalytics};

/// Trend magnitude that counts as a real change.
const TREND_THRESHOLD: f64 = 0.5;
/// Competency ratings below this need development.
const WEAK_COMPETENCY_BELOW: f64 = 3.0;
/// Competency ratings at or above this are a strength.
const STRONG_COMPETENCY_FROM: f64 = 4.5;
/// Self/manager disagreement larger than this is surfaced.
const RATING_GAP_ABOVE: f64 = 1.0;
const TEAM_STRUGGLING_BELOW: f64 = 3.0;
const TEAM_EXCELLING_FROM: f64 = 4.0;
const CAREER_READY_FROM: f64 = 4.0;

/// Borrowed inputs shared by every rule.
///
/// `records` must be in ascending `created_at` order.
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    pub records: &'a [EvaluationRecord],
    pub analytics: &'a TeamAnalytics,
    pub is_manager: bool,
}

impl<'a> InsightContext<'a> {
    pub fn new(
        records: &'a [EvaluationRecord],
        analytics: &'a TeamAnalytics,
        is_manager: bool,
    ) -> Self {
        Self {
            records,
            analytics,
            is_manager,
        }
    }

    /// Most recent evaluation.
    pub fn latest(&self) -> Option<&'a EvaluationRecord> {
        self.records.last()
    }
}

/// Which side of an assessment gave the higher rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rater {
    Employee,
    Manager,
}

/// Values matched by a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    PerformanceImproving { delta: f64 },
    /// `delta` is the absolute size of the drop.
    PerformanceDeclining { delta: f64 },
    WeakCompetency { competency: String, rating: f64 },
    StrongCompetency { competency: String, rating: f64 },
    RatingGap { gap: f64, higher: Rater },
    TeamBelowAverage { average: f64 },
    TeamExcelling { average: f64 },
    GoalProjection,
    CareerReady { average: f64 },
}

/// The insight rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Trend,
    CompetencyExtremes,
    RatingGap,
    TeamPerformance,
    GoalProjection,
    CareerAdvancement,
}

impl Rule {
    pub const ALL: [Rule; 6] = [
        Rule::Trend,
        Rule::CompetencyExtremes,
        Rule::RatingGap,
        Rule::TeamPerformance,
        Rule::GoalProjection,
        Rule::CareerAdvancement,
    ];

    /// Run this rule's predicate. Rules whose inputs are missing report nothing.
    pub fn detect(&self, ctx: &InsightContext<'_>) -> Vec<Finding> {
        match self {
            Rule::Trend => detect_trend(ctx).into_iter().collect(),
            Rule::CompetencyExtremes => detect_competency_extremes(ctx),
            Rule::RatingGap => detect_rating_gap(ctx).into_iter().collect(),
            Rule::TeamPerformance => detect_team_performance(ctx).into_iter().collect(),
            Rule::GoalProjection => vec![Finding::GoalProjection],
            Rule::CareerAdvancement => detect_career_advancement(ctx).into_iter().collect(),
        }
    }
}

fn detect_trend(ctx: &InsightContext<'_>) -> Option<Finding> {
    let [.., previous, latest] = ctx.records else {
        return None;
    };
    let trend = latest.overall_rating - previous.overall_rating;

    if trend > TREND_THRESHOLD {
        Some(Finding::PerformanceImproving { delta: trend })
    } else if trend < -TREND_THRESHOLD {
        Some(Finding::PerformanceDeclining { delta: trend.abs() })
    } else {
        None
    }
}

fn detect_competency_extremes(ctx: &InsightContext<'_>) -> Vec<Finding> {
    let Some(latest) = ctx.latest() else {
        return Vec::new();
    };

    // Ties keep the first competency in map order.
    let mut entries = latest.competency_ratings.iter();
    let Some(first) = entries.next() else {
        return Vec::new();
    };
    let (lowest, highest) = entries.fold((first, first), |(min, max), curr| {
        let min = if curr.1 < min.1 { curr } else { min };
        let max = if curr.1 > max.1 { curr } else { max };
        (min, max)
    });

    let mut findings = Vec::new();
    if *lowest.1 < WEAK_COMPETENCY_BELOW {
        findings.push(Finding::WeakCompetency {
            competency: lowest.0.clone(),
            rating: *lowest.1,
        });
    }
    if *highest.1 >= STRONG_COMPETENCY_FROM {
        findings.push(Finding::StrongCompetency {
            competency: highest.0.clone(),
            rating: *highest.1,
        });
    }
    findings
}

fn detect_rating_gap(ctx: &InsightContext<'_>) -> Option<Finding> {
    let latest = ctx.latest()?;
    if !latest.has_both_ratings() {
        return None;
    }
    let manager = latest.manager_rating?;
    let gap = (latest.overall_rating - manager).abs();
    if gap <= RATING_GAP_ABOVE {
        return None;
    }

    let higher = if latest.overall_rating > manager {
        Rater::Employee
    } else {
        Rater::Manager
    };
    Some(Finding::RatingGap { gap, higher })
}

fn detect_team_performance(ctx: &InsightContext<'_>) -> Option<Finding> {
    if !ctx.is_manager {
        return None;
    }
    let average = ctx.analytics.team_average()?;

    if average < TEAM_STRUGGLING_BELOW {
        Some(Finding::TeamBelowAverage { average })
    } else if average >= TEAM_EXCELLING_FROM {
        Some(Finding::TeamExcelling { average })
    } else {
        None
    }
}

fn detect_career_advancement(ctx: &InsightContext<'_>) -> Option<Finding> {
    if ctx.records.is_empty() {
        return None;
    }
    let total: f64 = ctx.records.iter().map(|r| r.overall_rating).sum();
    let average = total / ctx.records.len() as f64;

    (average >= CAREER_READY_FROM).then_some(Finding::CareerReady { average })
}

impl Finding {
    /// Insight kind identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Finding::PerformanceImproving { .. } => "performance_improving",
            Finding::PerformanceDeclining { .. } => "performance_declining",
            Finding::WeakCompetency { .. } => "skill_improvement",
            Finding::StrongCompetency { .. } => "skill_strength",
            Finding::RatingGap { .. } => "assessment_gap",
            Finding::TeamBelowAverage { .. } => "team_performance",
            Finding::TeamExcelling { .. } => "team_excellence",
            Finding::GoalProjection => "goal_prediction",
            Finding::CareerReady { .. } => "career_advancement",
        }
    }

    /// Render the finding as a user-facing insight.
    pub fn into_insight(self) -> Insight {
        let id = self.id().to_string();
        match self {
            Finding::PerformanceImproving { delta } => Insight {
                id,
                insight_type: InsightType::Positive,
                category: "Performance".to_string(),
                title: "Performance Trending Upward".to_string(),
                description: format!(
                    "Your performance has improved by {} points in recent evaluations. Keep up the excellent work!",
                    one_decimal(delta)
                ),
                recommendation: "Continue focusing on your current development areas and consider taking on more challenging projects.".to_string(),
                priority: Priority::Medium,
                confidence: 85,
            },
            Finding::PerformanceDeclining { delta } => Insight {
                id,
                insight_type: InsightType::Warning,
                category: "Performance".to_string(),
                title: "Performance Needs Attention".to_string(),
                description: format!(
                    "Your performance has declined by {} points. This may indicate areas needing focus.",
                    one_decimal(delta)
                ),
                recommendation: "Schedule a 1:1 with your manager to discuss challenges and create an improvement plan.".to_string(),
                priority: Priority::High,
                confidence: 80,
            },
            Finding::WeakCompetency { competency, rating } => {
                let lower = competency.to_lowercase();
                Insight {
                    id,
                    insight_type: InsightType::Improvement,
                    category: "Skills".to_string(),
                    title: format!("{} Needs Development", competency),
                    description: format!(
                        "Your {} rating of {}/5 is below expectations.",
                        lower, rating
                    ),
                    recommendation: format!(
                        "Consider training courses, mentoring, or additional practice in {}.",
                        lower
                    ),
                    priority: Priority::High,
                    confidence: 90,
                }
            }
            Finding::StrongCompetency { competency, rating } => {
                let lower = competency.to_lowercase();
                Insight {
                    id,
                    insight_type: InsightType::Positive,
                    category: "Strengths".to_string(),
                    title: format!("Excellent {} Skills", competency),
                    description: format!(
                        "Your {} rating of {}/5 shows exceptional competency.",
                        lower, rating
                    ),
                    recommendation: format!(
                        "Consider mentoring others or leading initiatives that leverage your {} expertise.",
                        lower
                    ),
                    priority: Priority::Low,
                    confidence: 95,
                }
            }
            Finding::RatingGap { gap, .. } => Insight {
                id,
                insight_type: InsightType::Insight,
                category: "Alignment".to_string(),
                title: "Rating Alignment Opportunity".to_string(),
                description: format!(
                    "There's a {} point difference between your self-assessment and manager rating.",
                    one_decimal(gap)
                ),
                recommendation: "Discuss expectations and performance criteria with your manager to align perspectives.".to_string(),
                priority: Priority::Medium,
                confidence: 75,
            },
            Finding::TeamBelowAverage { average } => Insight {
                id,
                insight_type: InsightType::Warning,
                category: "Team Management".to_string(),
                title: "Team Performance Below Average".to_string(),
                description: format!(
                    "Your team's average rating of {}/5 indicates room for improvement.",
                    average
                ),
                recommendation: "Consider team development initiatives, additional training, or process improvements.".to_string(),
                priority: Priority::High,
                confidence: 85,
            },
            Finding::TeamExcelling { average } => Insight {
                id,
                insight_type: InsightType::Positive,
                category: "Team Management".to_string(),
                title: "High-Performing Team".to_string(),
                description: format!(
                    "Your team's average rating of {}/5 demonstrates excellent leadership.",
                    average
                ),
                recommendation: "Share your successful management practices with other team leads.".to_string(),
                priority: Priority::Low,
                confidence: 90,
            },
            Finding::GoalProjection => Insight {
                id,
                insight_type: InsightType::Insight,
                category: "Goals".to_string(),
                title: "Q4 Performance Projection".to_string(),
                description: "Based on current trends, you're on track to meet 80% of your annual performance goals.".to_string(),
                recommendation: "Focus on the remaining 20% by prioritizing high-impact activities in the next quarter.".to_string(),
                priority: Priority::Medium,
                confidence: 70,
            },
            Finding::CareerReady { average } => Insight {
                id,
                insight_type: InsightType::Opportunity,
                category: "Career".to_string(),
                title: "Ready for Next Level".to_string(),
                description: format!(
                    "Your consistent {}/5 performance indicates readiness for increased responsibilities.",
                    one_decimal(average)
                ),
                recommendation: "Discuss promotion opportunities or stretch assignments with your manager.".to_string(),
                priority: Priority::Medium,
                confidence: 80,
            },
        }
    }
}

/// Format with one decimal place, rounding exact halves up.
///
/// Only odd multiples of 0.25 sit exactly on a tie; `{:.1}` would round
/// those to even.
pub(crate) fn one_decimal(value: f64) -> String {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters.rem_euclid(2.0) == 1.0 {
        return format!("{:.1}", value + 0.05);
    }
    format!("{:.1}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::{Duration, TimeZone, Utc};

    use crate::types::{EvaluationStatus, RecordId};

    fn records(ratings: &[f64]) -> Vec<EvaluationRecord> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        ratings
            .iter()
            .enumerate()
            .map(|(i, rating)| EvaluationRecord {
                id: RecordId::Number(i as i64 + 1),
                employee_email: "john.smith@company.com".to_string(),
                employee_name: "John Smith".to_string(),
                overall_rating: *rating,
                manager_rating: None,
                competency_ratings: BTreeMap::new(),
                created_at: start + Duration::days(90 * i as i64),
                status: EvaluationStatus::Reviewed,
            })
            .collect()
    }

    fn with_competencies(mut rec: EvaluationRecord, pairs: &[(&str, f64)]) -> EvaluationRecord {
        rec.competency_ratings = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        rec
    }

    fn detect(rule: Rule, recs: &[EvaluationRecord]) -> Vec<Finding> {
        let analytics = TeamAnalytics::empty();
        rule.detect(&InsightContext::new(recs, &analytics, false))
    }

    #[test]
    fn test_trend_up() {
        let findings = detect(Rule::Trend, &records(&[3.0, 4.0]));
        assert_eq!(findings, vec![Finding::PerformanceImproving { delta: 1.0 }]);
        let insight = findings[0].clone().into_insight();
        assert_eq!(insight.insight_type, InsightType::Positive);
        assert_eq!(insight.priority, Priority::Medium);
        assert_eq!(insight.confidence, 85);
        assert!(insight.description.contains("improved by 1.0 points"));
    }

    #[test]
    fn test_trend_down_reports_absolute_delta() {
        let findings = detect(Rule::Trend, &records(&[3.0, 2.2]));
        assert_eq!(findings.len(), 1);
        let insight = findings[0].clone().into_insight();
        assert_eq!(insight.id, "performance_declining");
        assert_eq!(insight.priority, Priority::High);
        assert!(insight.description.contains("declined by 0.8 points"));
    }

    #[test]
    fn test_trend_uses_last_two_records_only() {
        assert!(detect(Rule::Trend, &records(&[1.0, 4.0, 4.5])).is_empty());
    }

    #[test]
    fn test_trend_threshold_is_strict() {
        assert!(detect(Rule::Trend, &records(&[3.0, 3.5])).is_empty());
        assert!(detect(Rule::Trend, &records(&[3.5, 3.0])).is_empty());
        assert!(detect(Rule::Trend, &records(&[4.0])).is_empty());
    }

    #[test]
    fn test_competency_extremes_both_fire() {
        let mut recs = records(&[3.0]);
        recs[0] = with_competencies(recs[0].clone(), &[("Communication", 2.0), ("Teamwork", 5.0)]);
        let insights: Vec<Insight> = detect(Rule::CompetencyExtremes, &recs)
            .into_iter()
            .map(Finding::into_insight)
            .collect();

        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].id, "skill_improvement");
        assert_eq!(insights[0].title, "Communication Needs Development");
        assert_eq!(
            insights[0].description,
            "Your communication rating of 2/5 is below expectations."
        );
        assert_eq!(insights[1].id, "skill_strength");
        assert_eq!(insights[1].title, "Excellent Teamwork Skills");
        assert_eq!(insights[1].confidence, 95);
    }

    #[test]
    fn test_competency_extremes_uses_latest_record() {
        let mut recs = records(&[3.0, 3.0]);
        recs[0] = with_competencies(recs[0].clone(), &[("Leadership", 1.0)]);
        recs[1] = with_competencies(recs[1].clone(), &[("Leadership", 3.5)]);
        assert!(detect(Rule::CompetencyExtremes, &recs).is_empty());
    }

    #[test]
    fn test_competency_extremes_skips_empty_map() {
        assert!(detect(Rule::CompetencyExtremes, &records(&[3.0])).is_empty());
        assert!(detect(Rule::CompetencyExtremes, &[]).is_empty());
    }

    #[test]
    fn test_weak_competency_threshold_is_strict() {
        let mut recs = records(&[3.0]);
        recs[0] = with_competencies(recs[0].clone(), &[("Leadership", 3.0), ("Teamwork", 4.0)]);
        let findings = detect(Rule::CompetencyExtremes, &recs);
        assert!(!findings
            .iter()
            .any(|f| matches!(f, Finding::WeakCompetency { .. })));

        recs[0] = with_competencies(recs[0].clone(), &[("Leadership", 2.9)]);
        let findings = detect(Rule::CompetencyExtremes, &recs);
        assert!(matches!(
            findings.as_slice(),
            [Finding::WeakCompetency { .. }]
        ));
    }

    #[test]
    fn test_competency_ties_pick_first_in_name_order() {
        let mut recs = records(&[3.0]);
        recs[0] = with_competencies(recs[0].clone(), &[("Teamwork", 2.0), ("Adaptability", 2.0)]);
        let findings = detect(Rule::CompetencyExtremes, &recs);
        assert_eq!(
            findings,
            vec![Finding::WeakCompetency {
                competency: "Adaptability".to_string(),
                rating: 2.0
            }]
        );
    }

    #[test]
    fn test_single_competency_can_be_both_extremes() {
        let mut recs = records(&[3.0]);
        recs[0] = with_competencies(recs[0].clone(), &[("Leadership", 4.5)]);
        let findings = detect(Rule::CompetencyExtremes, &recs);
        assert_eq!(findings.len(), 1);
        assert!(matches!(findings[0], Finding::StrongCompetency { .. }));
    }

    #[test]
    fn test_rating_gap() {
        let mut recs = records(&[4.5]);
        recs[0].manager_rating = Some(3.0);
        let findings = detect(Rule::RatingGap, &recs);
        assert_eq!(
            findings,
            vec![Finding::RatingGap {
                gap: 1.5,
                higher: Rater::Employee
            }]
        );
        let insight = findings[0].clone().into_insight();
        assert!(insight.description.contains("There's a 1.5 point difference"));
        assert_eq!(insight.confidence, 75);
    }

    #[test]
    fn test_rating_gap_requires_manager_rating_and_strict_gap() {
        let mut recs = records(&[4.0]);
        assert!(detect(Rule::RatingGap, &recs).is_empty());
        recs[0].manager_rating = Some(3.0);
        assert!(detect(Rule::RatingGap, &recs).is_empty());
        recs[0].manager_rating = Some(0.0);
        recs[0].overall_rating = 2.0;
        assert!(detect(Rule::RatingGap, &recs).is_empty());
    }

    #[test]
    fn test_team_performance_gated_on_manager() {
        let analytics = TeamAnalytics {
            average_team_rating: Some(2.5),
        };
        let employee = InsightContext::new(&[], &analytics, false);
        assert!(Rule::TeamPerformance.detect(&employee).is_empty());

        let manager = InsightContext::new(&[], &analytics, true);
        let insights: Vec<Insight> = Rule::TeamPerformance
            .detect(&manager)
            .into_iter()
            .map(Finding::into_insight)
            .collect();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "team_performance");
        assert_eq!(
            insights[0].description,
            "Your team's average rating of 2.5/5 indicates room for improvement."
        );
    }

    #[test]
    fn test_team_performance_bands() {
        let check = |avg: f64| {
            let analytics = TeamAnalytics {
                average_team_rating: Some(avg),
            };
            Rule::TeamPerformance.detect(&InsightContext::new(&[], &analytics, true))
        };
        assert!(check(3.0).is_empty());
        assert!(check(3.99).is_empty());
        assert_eq!(check(4.0), vec![Finding::TeamExcelling { average: 4.0 }]);
    }

    #[test]
    fn test_goal_projection_always_fires() {
        assert_eq!(detect(Rule::GoalProjection, &[]), vec![Finding::GoalProjection]);
        let insight = Finding::GoalProjection.into_insight();
        assert!(insight.description.contains("on track to meet 80% of your annual"));
        assert_eq!(insight.confidence, 70);
    }

    #[test]
    fn test_career_advancement_uses_mean_of_all_records() {
        let findings = detect(Rule::CareerAdvancement, &records(&[4.0, 4.5, 3.5]));
        assert_eq!(findings, vec![Finding::CareerReady { average: 4.0 }]);
        let insight = findings[0].clone().into_insight();
        assert_eq!(
            insight.description,
            "Your consistent 4.0/5 performance indicates readiness for increased responsibilities."
        );
        assert!(detect(Rule::CareerAdvancement, &records(&[4.0, 3.5])).is_empty());
    }

    #[test]
    fn test_one_decimal_rounds_halves_up() {
        assert_eq!(one_decimal(1.0), "1.0");
        assert_eq!(one_decimal(0.25), "0.3");
        assert_eq!(one_decimal(1.75), "1.8");
        assert_eq!(one_decimal(4.125), "4.1");
        assert_eq!(one_decimal(0.7999999999999998), "0.8");
    }
}
