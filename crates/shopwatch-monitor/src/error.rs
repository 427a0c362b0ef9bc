use serde::Serialize;
use shopwatch_core::ClassifyError;
use shopwatch_db::DbError;
use shopwatch_scraper::ScraperError;
use thiserror::Error;

/// Tag attached to a failed cycle for the notifier layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    FetchFailed,
    Inconsistent,
    Unexpected,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::FetchFailed => "fetch_failed",
            FailureKind::Inconsistent => "inconsistent",
            FailureKind::Unexpected => "unexpected",
        }
    }
}

/// Why a reconciliation cycle ended without a report.
///
/// `FetchFailed` and `Inconsistent` abort before any write. `Unexpected`
/// covers storage connectivity loss, which may strike after some writes.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("catalog fetch failed: {message}")]
    FetchFailed { message: String },

    #[error("verification passes disagree: {message}")]
    Inconsistent { message: String },

    #[error("unexpected failure: {message}")]
    Unexpected { message: String },
}

impl CycleError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            CycleError::FetchFailed { .. } => FailureKind::FetchFailed,
            CycleError::Inconsistent { .. } => FailureKind::Inconsistent,
            CycleError::Unexpected { .. } => FailureKind::Unexpected,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            CycleError::FetchFailed { message }
            | CycleError::Inconsistent { message }
            | CycleError::Unexpected { message } => message,
        }
    }

    pub(crate) fn fetch(pass: usize, err: &ScraperError) -> Self {
        CycleError::FetchFailed {
            message: format!("verification pass {pass}: {err}"),
        }
    }

    pub(crate) fn store(stage: &str, err: &DbError) -> Self {
        CycleError::Unexpected {
            message: format!("{stage}: {err}"),
        }
    }
}

impl From<ClassifyError> for CycleError {
    fn from(err: ClassifyError) -> Self {
        match err {
            ClassifyError::Inconsistent { .. } => CycleError::Inconsistent {
                message: err.to_string(),
            },
            ClassifyError::NoFetches | ClassifyError::EmptyFetch { .. } => {
                CycleError::FetchFailed {
                    message: err.to_string(),
                }
            }
        }
    }
}
