// crates/core/src/client.rs

//! Evaluation record accessor.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PortalError, Result};
use crate::submission::EvaluationSubmission;
use crate::types::{EvaluationRecord, TeamAnalytics, Viewer};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8082";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const EVALUATIONS_PATH: &str = "/api/evaluations";
const TEAM_ANALYTICS_PATH: &str = "/api/manager/analytics";

/// Remote source of evaluation data.
///
/// Implementations do not retry; a failed call is reported to the caller.
pub trait EvaluationSource {
    /// All evaluation records visible to the authenticated caller.
    fn fetch_evaluations(&self) -> Result<Vec<EvaluationRecord>>;

    /// Team aggregates. Only call this for managers, see
    /// [`fetch_team_analytics_for`].
    fn fetch_team_analytics(&self) -> Result<TeamAnalytics>;

    fn submit_evaluation(&self, submission: &EvaluationSubmission) -> Result<()>;
}

/// Fetch team analytics if `viewer` holds manager capability.
///
/// Everyone else gets an empty analytics object and no request is made.
pub fn fetch_team_analytics_for<S>(source: &S, viewer: &Viewer) -> Result<TeamAnalytics>
where
    S: EvaluationSource + ?Sized,
{
    if !viewer.is_manager() {
        debug!(email = %viewer.email, "skipping team analytics for non-manager");
        return Ok(TeamAnalytics::empty());
    }
    source.fetch_team_analytics()
}

/// Connection settings for the portal API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read settings from the environment.
    ///
    /// - PORTAL_API_BASE_URL (default "http://localhost:8082")
    /// - PORTAL_API_TOKEN (optional)
    /// - PORTAL_HTTP_TIMEOUT_SECS (default 30)
    pub fn from_env() -> Self {
        let base_url = std::env::var("PORTAL_API_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let token = std::env::var("PORTAL_API_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        let timeout_secs = match std::env::var("PORTAL_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid PORTAL_HTTP_TIMEOUT_SECS, using default");
                DEFAULT_TIMEOUT_SECS
            }),
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            base_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Blocking HTTP client for the portal's REST API.
pub struct HttpEvaluationClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpEvaluationClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortalError::fetch("build http client", e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, operation: &'static str, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, operation, "GET");

        let resp = self
            .authorize(self.client.get(&url))
            .send()
            .map_err(|e| PortalError::fetch(operation, e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            warn!(%url, %status, "request failed");
            return Err(PortalError::http_status(
                operation,
                status.as_u16(),
                format!("HTTP {} - {}", status, truncate(&body, 300)),
            ));
        }

        resp.json()
            .map_err(|e| PortalError::fetch(operation, format!("invalid response body: {}", e)))
    }
}

impl EvaluationSource for HttpEvaluationClient {
    fn fetch_evaluations(&self) -> Result<Vec<EvaluationRecord>> {
        let records: Vec<EvaluationRecord> =
            self.get_json("fetch evaluations", EVALUATIONS_PATH)?;
        debug!(count = records.len(), "fetched evaluations");
        Ok(records)
    }

    fn fetch_team_analytics(&self) -> Result<TeamAnalytics> {
        self.get_json("fetch team analytics", TEAM_ANALYTICS_PATH)
    }

    fn submit_evaluation(&self, submission: &EvaluationSubmission) -> Result<()> {
        const OPERATION: &str = "submit evaluation";
        let url = self.url(EVALUATIONS_PATH);
        debug!(%url, "POST");

        let resp = self
            .authorize(self.client.post(&url))
            .json(submission)
            .send()
            .map_err(|e| PortalError::fetch(OPERATION, e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().unwrap_or_default();
        warn!(%url, %status, "submission rejected");
        Err(PortalError::http_status(
            OPERATION,
            status.as_u16(),
            format!("HTTP {} - {}", status, truncate(&body, 300)),
        ))
    }
}

/// Snapshot of portal data, as stored in an offline export file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSnapshot {
    #[serde(default)]
    pub evaluations: Vec<EvaluationRecord>,
    #[serde(default)]
    pub team_analytics: TeamAnalytics,
}

/// In-memory source serving a fixed snapshot. Submissions are kept in memory.
#[derive(Debug, Default)]
pub struct StaticSource {
    snapshot: PortalSnapshot,
    submissions: Mutex<Vec<EvaluationSubmission>>,
    analytics_calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(evaluations: Vec<EvaluationRecord>, team_analytics: TeamAnalytics) -> Self {
        Self {
            snapshot: PortalSnapshot {
                evaluations,
                team_analytics,
            },
            ..Self::default()
        }
    }

    /// Load a snapshot from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        const OPERATION: &str = "load snapshot";
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| PortalError::fetch(OPERATION, format!("{}: {}", path.display(), e)))?;
        let snapshot: PortalSnapshot = serde_json::from_str(&data)
            .map_err(|e| PortalError::fetch(OPERATION, format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            snapshot,
            ..Self::default()
        })
    }

    /// Number of times team analytics were requested.
    pub fn analytics_calls(&self) -> usize {
        self.analytics_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<EvaluationSubmission> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl EvaluationSource for StaticSource {
    fn fetch_evaluations(&self) -> Result<Vec<EvaluationRecord>> {
        Ok(self.snapshot.evaluations.clone())
    }

    fn fetch_team_analytics(&self) -> Result<TeamAnalytics> {
        self.analytics_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.team_analytics.clone())
    }

    fn submit_evaluation(&self, submission: &EvaluationSubmission) -> Result<()> {
        let mut submissions = self
            .submissions
            .lock()
            .map_err(|_| PortalError::fetch("submit evaluation", "submission store poisoned"))?;
        submissions.push(submission.clone());
        Ok(())
    }
}

/// Truncate a response body for error messages.
fn truncate(s: &str, max: usize) -> String {
    let trimmed = s.trim();
    match trimmed.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
