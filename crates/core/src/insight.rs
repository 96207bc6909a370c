// crates/core/src/insight.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tone of an insight, used by renderers to pick an icon and colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Positive,
    Warning,
    Improvement,
    Insight,
    Opportunity,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Positive => "positive",
            InsightType::Warning => "warning",
            InsightType::Improvement => "improvement",
            InsightType::Insight => "insight",
            InsightType::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort ordinal: high = 3, medium = 2, low = 1.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An advisory statement derived from evaluation data.
///
/// `id` names the kind of insight, not the instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub category: String,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub priority: Priority,
    /// Static per-rule percentage in 0..=100.
    pub confidence: u8,
}

/// Header counters for a generated insight list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsightSummary {
    pub total: usize,
    pub high_priority: usize,
    pub positive: usize,
    pub opportunities: usize,
}

impl InsightSummary {
    pub fn from_insights(insights: &[Insight]) -> Self {
        let mut summary = Self {
            total: insights.len(),
            ..Self::default()
        };
        for insight in insights {
            if insight.priority == Priority::High {
                summary.high_priority += 1;
            }
            match insight.insight_type {
                InsightType::Positive => summary.positive += 1,
                InsightType::Opportunity => summary.opportunities += 1,
                _ => {}
            }
        }
        summary
    }
}
