// crates/core/src/engine.rs

//! Insight generation over already-fetched evaluation records.
//!
//! The engine is a pure function of its inputs: it performs no I/O, does not
//! log and never mutates the records it is given.

use std::cmp::Reverse;

use crate::insight::Insight;
use crate::rules::{Finding, InsightContext, Rule};
use crate::types::{EvaluationRecord, TeamAnalytics};

/// An ordered list of rules evaluated against the same inputs.
#[derive(Debug, Clone)]
pub struct InsightEngine {
    rules: Vec<Rule>,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self {
            rules: Rule::ALL.to_vec(),
        }
    }
}

impl InsightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine restricted to the given rules, evaluated in the given order.
    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Generate insights ranked by priority.
    ///
    /// `records` must be sorted by ascending `created_at`; the engine does
    /// not reorder its input. Insights of equal priority keep the order in
    /// which their rules emitted them.
    pub fn generate(
        &self,
        records: &[EvaluationRecord],
        analytics: &TeamAnalytics,
        is_manager: bool,
    ) -> Vec<Insight> {
        let ctx = InsightContext::new(records, analytics, is_manager);

        let mut insights: Vec<Insight> = self
            .rules
            .iter()
            .flat_map(|rule| rule.detect(&ctx))
            .map(Finding::into_insight)
            .collect();

        // sort_by_key is stable
        insights.sort_by_key(|insight| Reverse(insight.priority.rank()));
        insights
    }
}

/// Run every rule over `records`. See [`InsightEngine::generate`].
pub fn generate_insights(
    records: &[EvaluationRecord],
    analytics: &TeamAnalytics,
    is_manager: bool,
) -> Vec<Insight> {
    InsightEngine::default().generate(records, analytics, is_manager)
}
