// crates/core/src/submission.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::competency::canonicalize;
use crate::error::ValidationError;
use crate::types::timestamp;

const MIN_RATING: i64 = 1;
const MAX_RATING: i64 = 5;

/// Payload posted to the evaluations endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSubmission {
    pub ratings: BTreeMap<String, u8>,
    pub feedback: String,
    #[serde(with = "timestamp")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_quarter: Option<u8>,
}

/// A self-evaluation being filled in.
///
/// Competency names are canonicalised on the way in, so `teamwork` and
/// `Teamwork` refer to the same rating.
#[derive(Debug, Clone, Default)]
pub struct EvaluationDraft {
    competencies: Vec<String>,
    ratings: BTreeMap<String, i64>,
    feedback: String,
    project_id: Option<i64>,
    year: Option<i32>,
    quarter: Option<u8>,
}

impl EvaluationDraft {
    /// Start a draft that must rate every one of `competencies`.
    pub fn new<I, S>(competencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut required: Vec<String> = Vec::new();
        for name in competencies {
            let name = canonicalize(name.as_ref());
            if !required.contains(&name) {
                required.push(name);
            }
        }
        Self {
            competencies: required,
            ..Self::default()
        }
    }

    /// Record a rating. Range is checked at submission time.
    pub fn rate(&mut self, competency: &str, rating: i64) -> &mut Self {
        self.ratings.insert(canonicalize(competency), rating);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = feedback.into();
        self
    }

    pub fn for_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn for_period(mut self, year: i32, quarter: u8) -> Self {
        self.year = Some(year);
        self.quarter = Some(quarter);
        self
    }

    /// Share of required competencies already rated, as a whole percentage.
    pub fn progress(&self) -> u8 {
        if self.competencies.is_empty() {
            return 0;
        }
        let rated = self
            .competencies
            .iter()
            .filter(|c| self.ratings.contains_key(*c))
            .count();
        ((rated as f64 / self.competencies.len() as f64) * 100.0).round() as u8
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.competencies.is_empty() {
            return Err(ValidationError::NoCompetencies);
        }

        for (competency, rating) in &self.ratings {
            if !(MIN_RATING..=MAX_RATING).contains(rating) {
                return Err(ValidationError::RatingOutOfRange {
                    competency: competency.clone(),
                    rating: *rating,
                });
            }
        }

        if let Some(missing) = self
            .competencies
            .iter()
            .find(|c| !self.ratings.contains_key(*c))
        {
            return Err(ValidationError::MissingRating {
                competency: missing.clone(),
            });
        }

        if let Some(quarter) = self.quarter {
            if !(1..=4).contains(&quarter) {
                return Err(ValidationError::InvalidQuarter(quarter));
            }
        }

        Ok(())
    }

    /// Validate and build the payload stamped with `submitted_at`.
    pub fn into_submission(
        self,
        submitted_at: DateTime<Utc>,
    ) -> Result<EvaluationSubmission, ValidationError> {
        self.validate()?;

        let ratings = self
            .ratings
            .into_iter()
            .map(|(competency, rating)| (competency, rating as u8))
            .collect();

        Ok(EvaluationSubmission {
            ratings,
            feedback: self.feedback,
            submitted_at,
            project_id: self.project_id,
            evaluation_year: self.year,
            evaluation_quarter: self.quarter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> EvaluationDraft {
        EvaluationDraft::new(["communication", "Teamwork", "problem_solving"])
    }

    #[test]
    fn test_missing_rating_is_reported() {
        let mut d = draft();
        d.rate("Communication", 4).rate("teamwork", 3);
        assert_eq!(d.progress(), 67);
        assert_eq!(
            d.validate(),
            Err(ValidationError::MissingRating {
                competency: "Problem Solving".to_string()
            })
        );
    }

    #[test]
    fn test_out_of_range_rating() {
        let mut d = draft();
        d.rate("communication", 6)
            .rate("teamwork", 3)
            .rate("problem solving", 2);
        assert_eq!(
            d.validate(),
            Err(ValidationError::RatingOutOfRange {
                competency: "Communication".to_string(),
                rating: 6
            })
        );
    }

    #[test]
    fn test_no_competencies() {
        let d = EvaluationDraft::new(Vec::<String>::new());
        assert_eq!(d.validate(), Err(ValidationError::NoCompetencies));
        assert_eq!(d.progress(), 0);
    }

    #[test]
    fn test_invalid_quarter() {
        let mut d = draft().for_period(2025, 5);
        d.rate("communication", 3)
            .rate("teamwork", 3)
            .rate("problem_solving", 3);
        assert_eq!(d.validate(), Err(ValidationError::InvalidQuarter(5)));
    }

    #[test]
    fn test_submission_payload_shape() {
        let mut d = draft()
            .with_feedback("Solid quarter")
            .for_project(12)
            .for_period(2025, 3);
        d.rate("communication", 4)
            .rate("teamwork", 5)
            .rate("problem_solving", 3);
        assert_eq!(d.progress(), 100);

        let at = Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap();
        let submission = d.into_submission(at).unwrap();
        let json = serde_json::to_value(&submission).unwrap();

        assert_eq!(json["ratings"]["Teamwork"], 5);
        assert_eq!(json["ratings"]["Problem Solving"], 3);
        assert_eq!(json["feedback"], "Solid quarter");
        assert_eq!(json["submittedAt"], "2025-09-30T12:00:00+00:00");
        assert_eq!(json["projectId"], 12);
        assert_eq!(json["evaluationQuarter"], 3);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let mut d = EvaluationDraft::new(["Leadership"]);
        d.rate("leadership", 4);
        let submission = d.into_submission(Utc::now()).unwrap();
        let json = serde_json::to_value(&submission).unwrap();
        assert!(json.get("projectId").is_none());
        assert!(json.get("evaluationYear").is_none());
    }
}
