use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Content type that signals an RFC 7807 problem body.
pub const PROBLEM_JSON_CONTENT_TYPE: &str = "application/problem+json";

/// Structured error body (`application/problem+json`) as sent by the server.
///
/// Every field is optional on the wire; `errors` carries per-field validation
/// messages when the server rejects a request as invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// The single normalized error shape handed to presentation code.
///
/// `status` is the HTTP status when the failure came from a response,
/// otherwise a local analogue (408 for client-side timeouts, 500 for
/// transport and decode failures).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub title: String,
    pub detail: String,
    pub status: u16,
    pub validation_errors: Option<BTreeMap<String, Vec<String>>>,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.title, self.status, self.detail)
    }
}
