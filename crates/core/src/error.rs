// crates/core/src/error.rs

use thiserror::Error;

/// Errors surfaced to the portal user.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Transport failure, non-success status or undecodable response.
    #[error("{operation} failed: {message}")]
    Fetch {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PortalError {
    pub fn fetch(operation: &'static str, message: impl Into<String>) -> Self {
        PortalError::Fetch {
            operation,
            status: None,
            message: message.into(),
        }
    }

    pub fn http_status(operation: &'static str, status: u16, message: impl Into<String>) -> Self {
        PortalError::Fetch {
            operation,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            PortalError::Fetch { status, .. } => *status,
            PortalError::Validation(_) => None,
        }
    }

    /// The server already holds an evaluation for this project and quarter.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// A submission was rejected before it left the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no competencies to rate")]
    NoCompetencies,

    #[error("missing rating for {competency}")]
    MissingRating { competency: String },

    #[error("rating {rating} for {competency} is outside 1-5")]
    RatingOutOfRange { competency: String, rating: i64 },

    #[error("quarter {0} is outside 1-4")]
    InvalidQuarter(u8),
}

pub type Result<T> = std::result::Result<T, PortalError>;
