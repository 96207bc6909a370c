// crates/core/src/pipeline.rs

//! Fetch -> filter -> generate, plus the displayed-state board that guards
//! against overlapping refreshes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::{fetch_team_analytics_for, EvaluationSource};
use crate::competency;
use crate::engine::InsightEngine;
use crate::error::{PortalError, Result};
use crate::insight::{Insight, InsightSummary};
use crate::types::{sort_chronologically, EvaluationRecord, TeamAnalytics, Viewer};

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub viewer_email: String,
    /// Records the insights were derived from, oldest first.
    pub evaluations: Vec<EvaluationRecord>,
    pub analytics: TeamAnalytics,
    pub insights: Vec<Insight>,
    pub generated_at: DateTime<Utc>,
}

impl InsightReport {
    pub fn summary(&self) -> InsightSummary {
        InsightSummary::from_insights(&self.insights)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsightPipeline {
    engine: InsightEngine,
}

impl InsightPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the records `viewer` may see, oldest first.
    pub fn load_records<S>(&self, source: &S, viewer: &Viewer) -> Result<Vec<EvaluationRecord>>
    where
        S: EvaluationSource + ?Sized,
    {
        let fetched = source.fetch_evaluations()?;
        Ok(prepare_records(fetched, viewer))
    }

    /// Fetch evaluations and analytics concurrently, then generate insights.
    ///
    /// Either fetch failing aborts the run; nothing partial is returned.
    pub fn run<S>(&self, source: &S, viewer: &Viewer) -> Result<InsightReport>
    where
        S: EvaluationSource + Sync + ?Sized,
    {
        let (evaluations, analytics) = thread::scope(|scope| {
            let analytics = scope.spawn(|| fetch_team_analytics_for(source, viewer));
            let evaluations = source.fetch_evaluations();
            let analytics = analytics.join().unwrap_or_else(|_| {
                Err(PortalError::fetch(
                    "fetch team analytics",
                    "analytics worker panicked",
                ))
            });
            (evaluations, analytics)
        });

        let evaluations = prepare_records(evaluations?, viewer);
        let analytics = analytics?;

        let insights = self
            .engine
            .generate(&evaluations, &analytics, viewer.is_manager());
        info!(
            email = %viewer.email,
            evaluations = evaluations.len(),
            insights = insights.len(),
            "generated insights"
        );

        Ok(InsightReport {
            viewer_email: viewer.email.clone(),
            evaluations,
            analytics,
            insights,
            generated_at: Utc::now(),
        })
    }
}

/// Narrow to the viewer, canonicalise competency names and sort by creation time.
fn prepare_records(fetched: Vec<EvaluationRecord>, viewer: &Viewer) -> Vec<EvaluationRecord> {
    let total = fetched.len();
    let mut records = viewer.visible_records(fetched);
    if records.len() != total {
        debug!(total, visible = records.len(), "narrowed records to viewer");
    }
    for record in &mut records {
        record.competency_ratings = competency::normalize(&record.competency_ratings);
    }
    sort_chronologically(&mut records);
    records
}

/// Identifies one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Applied,
    /// A newer refresh was started after this one; its result was dropped.
    Stale,
}

/// What is currently on screen.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    pub report: Option<InsightReport>,
    /// Message from the most recent failed refresh, cleared on success.
    pub error: Option<String>,
}

/// Displayed insight state, shared by callers that may refresh concurrently.
/// The latest refresh wins: results from a refresh that has since been
/// superseded are discarded.
#[derive(Debug, Default)]
pub struct InsightBoard {
    latest: AtomicU64,
    state: Mutex<BoardState>,
}

impl InsightBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn publish(&self, ticket: RefreshTicket, result: Result<InsightReport>) -> PublishOutcome {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if ticket.0 != self.latest.load(Ordering::SeqCst) {
            debug!(ticket = ticket.0, "dropping stale refresh");
            return PublishOutcome::Stale;
        }

        match result {
            Ok(report) => {
                state.report = Some(report);
                state.error = None;
            }
            Err(e) => {
                warn!(error = %e, "refresh failed");
                state.error = Some(e.to_string());
            }
        }
        PublishOutcome::Applied
    }

    /// Start a refresh, run `load` and publish its result.
    pub fn refresh<F>(&self, load: F) -> PublishOutcome
    where
        F: FnOnce() -> Result<InsightReport>,
    {
        let ticket = self.begin_refresh();
        self.publish(ticket, load())
    }

    pub fn snapshot(&self) -> BoardState {
        match self.state.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
