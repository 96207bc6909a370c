// crates/core/src/types.rs

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of an evaluation record. The backend emits numeric ids, but
/// string ids are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Review state of an evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    #[default]
    Pending,
    Reviewed,
    Draft,
    Submitted,
    Completed,
    #[serde(other)]
    Unknown,
}

/// One submitted performance assessment.
///
/// Records are read-only input to the insight engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub id: RecordId,
    pub employee_email: String,
    #[serde(default)]
    pub employee_name: String,
    /// Self-assessment on the 1-5 scale.
    pub overall_rating: f64,
    #[serde(default)]
    pub manager_rating: Option<f64>,
    /// Competency name -> rating. Ordered by name, which makes the
    /// competency-extremes tie-break deterministic.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub competency_ratings: BTreeMap<String, f64>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: EvaluationStatus,
}

impl EvaluationRecord {
    /// Both ratings present and non-zero.
    pub fn has_both_ratings(&self) -> bool {
        self.overall_rating != 0.0 && self.manager_rating.is_some_and(|m| m != 0.0)
    }
}

/// Order records by ascending `created_at`. Records sharing a timestamp keep
/// their fetched order.
pub fn sort_chronologically(records: &mut [EvaluationRecord]) {
    records.sort_by_key(|r| r.created_at);
}

/// Aggregates only visible to managers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAnalytics {
    #[serde(default)]
    pub average_team_rating: Option<f64>,
}

impl TeamAnalytics {
    /// Analytics object handed to callers without manager capability.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The team average, treating a zero average as absent.
    pub fn team_average(&self) -> Option<f64> {
        self.average_team_rating.filter(|avg| *avg != 0.0)
    }
}

/// Capability held by the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed
            .strip_prefix("ROLE_")
            .unwrap_or(trimmed)
            .to_ascii_uppercase();
        match name.as_str() {
            "EMPLOYEE" => Ok(Role::Employee),
            "MANAGER" => Ok(Role::Manager),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// The caller on whose behalf records are fetched and insights generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub email: String,
    pub roles: Vec<Role>,
}

impl Viewer {
    pub fn new(email: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            email: email.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Gate for team analytics.
    pub fn is_manager(&self) -> bool {
        self.has_role(Role::Manager)
    }

    /// Individual contributors only see their own evaluations.
    pub fn narrows_to_own_records(&self) -> bool {
        !self.is_manager() && !self.has_role(Role::Admin)
    }

    /// Keep the records this viewer may see.
    pub fn visible_records(&self, records: Vec<EvaluationRecord>) -> Vec<EvaluationRecord> {
        if !self.narrows_to_own_records() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| r.employee_email == self.email)
            .collect()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, f64>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `createdAt` arrives either as RFC 3339 or as a zone-less local timestamp.
/// Zone-less values are read as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp {:?}: {}", raw, e))
    }
}
