//! Error types for the progression engine.
//!
//! Validation errors (bad input from the caller) are kept apart from
//! infrastructure errors (storage, content) so an HTTP layer can map the
//! former to 4xx and the latter to 5xx.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OdysseyError {
    #[error("Mission not found: {0}")]
    MissionNotFound(String),

    #[error("Mission '{mission_id}' already completed by '{user_id}'")]
    AlreadyCompleted { user_id: String, mission_id: String },

    #[error("Invalid skill path: '{0}'")]
    InvalidPath(String),

    #[error("Invalid XP input: {0}")]
    InvalidXpInput(i64),

    #[error("Invalid mission attempt: {0}")]
    InvalidAttempt(String),

    #[error("Invalid user id: '{0}'")]
    InvalidUserId(String),

    #[error("Mission '{mission_id}' is missing prerequisites: {}", missing.join(", "))]
    PrerequisitesNotMet {
        mission_id: String,
        missing: Vec<String>,
    },

    #[error("Stale write for '{user_id}': expected version {expected}, stored version {found}")]
    StaleWrite {
        user_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Progress repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Corrupt progress document for '{user_id}': {reason}")]
    CorruptProgress { user_id: String, reason: String },

    #[error("Invalid content catalog: {0}")]
    InvalidCatalog(String),
}

/// Broad classification used by callers to pick a response family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller supplied bad input; retrying the same request will fail again.
    Validation,
    /// Another writer got there first; reload and retry is meaningful.
    Conflict,
    /// Storage or content failure outside the caller's control.
    Infrastructure,
}

impl OdysseyError {
    pub fn class(&self) -> ErrorClass {
        match self {
            OdysseyError::MissionNotFound(_)
            | OdysseyError::AlreadyCompleted { .. }
            | OdysseyError::InvalidPath(_)
            | OdysseyError::InvalidXpInput(_)
            | OdysseyError::InvalidAttempt(_)
            | OdysseyError::InvalidUserId(_)
            | OdysseyError::PrerequisitesNotMet { .. } => ErrorClass::Validation,
            OdysseyError::StaleWrite { .. } => ErrorClass::Conflict,
            OdysseyError::RepositoryUnavailable(_)
            | OdysseyError::CorruptProgress { .. }
            | OdysseyError::InvalidCatalog(_) => ErrorClass::Infrastructure,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.class() == ErrorClass::Validation
    }

    /// HTTP status an API layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            OdysseyError::MissionNotFound(_) => 404,
            OdysseyError::AlreadyCompleted { .. } | OdysseyError::StaleWrite { .. } => 409,
            OdysseyError::InvalidPath(_)
            | OdysseyError::InvalidXpInput(_)
            | OdysseyError::InvalidAttempt(_)
            | OdysseyError::InvalidUserId(_)
            | OdysseyError::PrerequisitesNotMet { .. } => 400,
            OdysseyError::RepositoryUnavailable(_) => 503,
            OdysseyError::CorruptProgress { .. } | OdysseyError::InvalidCatalog(_) => 500,
        }
    }
}

impl From<std::io::Error> for OdysseyError {
    fn from(err: std::io::Error) -> Self {
        OdysseyError::RepositoryUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OdysseyError>;
