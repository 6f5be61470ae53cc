use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`DutymeError`], compared by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Ambiguous,
    Remote,
    Cancelled,
    Parse,
    Persistence,
    State,
    Prompt,
}

#[derive(Debug, Error)]
pub enum DutymeError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("found more than one {what}: {}", .candidates.join(", "))]
    Ambiguous {
        what: &'static str,
        candidates: Vec<String>,
    },
    #[error("PagerDuty API request failed: {operation}")]
    Remote {
        operation: &'static str,
        #[source]
        source: pagerduty::PagerDutyError,
    },
    #[error("canceled")]
    Cancelled,
    #[error("failed to parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to access config file {}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("override already exists on schedule {schedule_id}. Run 'dutyme end' and finish it first")]
    OverrideAlreadyExists { schedule_id: String },
    #[error("no override exists. Nothing to end")]
    NoActiveOverride,
    #[error("failed to read input")]
    Prompt(#[source] std::io::Error),
}

impl DutymeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Ambiguous { .. } => ErrorKind::Ambiguous,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Persistence { .. } => ErrorKind::Persistence,
            Self::OverrideAlreadyExists { .. } | Self::NoActiveOverride => ErrorKind::State,
            Self::Prompt(_) => ErrorKind::Prompt,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn remote(operation: &'static str) -> impl FnOnce(pagerduty::PagerDutyError) -> Self {
        move |source| Self::Remote { operation, source }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}
