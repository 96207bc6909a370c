//! Performance-evaluation insights.
//!
//! Fetches evaluation records from the portal API, derives advisory
//! insights from them with a fixed set of rules and validates new
//! self-evaluations before submission.

pub mod client;
pub mod competency;
pub mod engine;
pub mod error;
pub mod history;
pub mod insight;
pub mod pipeline;
pub mod rules;
pub mod submission;
pub mod types;

pub use client::{
    fetch_team_analytics_for, ApiConfig, EvaluationSource, HttpEvaluationClient, StaticSource,
};
pub use engine::{generate_insights, InsightEngine};
pub use error::{PortalError, Result, ValidationError};
pub use insight::{Insight, InsightSummary, InsightType, Priority};
pub use pipeline::{InsightBoard, InsightPipeline, InsightReport, PublishOutcome};
pub use types::{EvaluationRecord, EvaluationStatus, Role, TeamAnalytics, Viewer};
