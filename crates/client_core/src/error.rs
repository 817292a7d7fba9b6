use std::time::Duration;

use shared::error::{ErrorReport, ProblemDetails};
use thiserror::Error;

use crate::{Operation, SyncPhase};

/// Failures produced at the HTTP boundary, one variant per cause the
/// presentation layer tells apart.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, mid-body).
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The client-side deadline elapsed and the request was dropped.
    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Non-2xx response carrying a parsed problem details body.
    #[error("server rejected the request with status {status}")]
    Problem { status: u16, problem: ProblemDetails },

    /// Non-2xx response without a usable structured body.
    #[error("server returned status {status}: {detail}")]
    Unstructured { status: u16, detail: String },

    /// A success response whose body could not be decoded.
    #[error("unexpected response body: {detail}")]
    UnexpectedBody { detail: String },
}

impl ApiError {
    /// Collapse this failure into the one report shape shown to users.
    ///
    /// Local failures borrow the closest HTTP status: 408 for the add
    /// timeout, 500 for transport and decode problems.
    pub fn report(&self) -> ErrorReport {
        match self {
            ApiError::Transport(source) => ErrorReport {
                title: "Error".to_string(),
                detail: source.to_string(),
                status: 500,
                validation_errors: None,
            },
            ApiError::Timeout { .. } => ErrorReport {
                title: "Request Timeout".to_string(),
                detail: "The request timed out. The server might be overloaded or unavailable."
                    .to_string(),
                status: 408,
                validation_errors: None,
            },
            ApiError::Problem { status, problem } => ErrorReport {
                title: problem
                    .title
                    .clone()
                    .unwrap_or_else(|| "API Error".to_string()),
                detail: problem
                    .detail
                    .clone()
                    .unwrap_or_else(|| format!("Error {status}")),
                status: *status,
                validation_errors: problem.errors.clone(),
            },
            ApiError::Unstructured { status, detail } => ErrorReport {
                title: "API Error".to_string(),
                detail: detail.clone(),
                status: *status,
                validation_errors: None,
            },
            ApiError::UnexpectedBody { detail } => ErrorReport {
                title: "Error".to_string(),
                detail: detail.clone(),
                status: 500,
                validation_errors: None,
            },
        }
    }
}

/// Failures surfaced by [`SquaresClient`](crate::SquaresClient) operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The operation conflicts with the current phase, for example a
    /// second request while one is still in flight. The collection is
    /// untouched and no request was sent.
    #[error("cannot {operation} while {phase}")]
    PhaseConflict {
        operation: Operation,
        phase: SyncPhase,
    },

    /// The client was closed; nothing runs anymore.
    #[error("client is closed")]
    Closed,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SyncError {
    /// The user-facing report, when this failure carries one.
    ///
    /// Phase conflicts and closure are caller mistakes rather than sync
    /// outcomes and produce no report.
    pub fn report(&self) -> Option<ErrorReport> {
        match self {
            SyncError::Api(source) => Some(source.report()),
            SyncError::PhaseConflict { .. } | SyncError::Closed => None,
        }
    }
}
