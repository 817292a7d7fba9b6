use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;
use shared::domain::Square;
use shared::error::{ProblemDetails, PROBLEM_JSON_CONTENT_TYPE};
use tracing::warn;

use crate::{error::ApiError, SquaresApi};

/// [`SquaresApi`] implementation that talks to the collection resource
/// over HTTP with JSON bodies.
pub struct HttpSquaresApi {
    http: Client,
    base_url: String,
}

impl HttpSquaresApi {
    /// Create an API client for the server at `base_url`, with or without
    /// a trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn squares_url(&self) -> String {
        format!("{}/squares", self.base_url)
    }
}

#[async_trait]
impl SquaresApi for HttpSquaresApi {
    async fn list_squares(&self) -> Result<Vec<Square>, ApiError> {
        let response = self
            .http
            .get(self.squares_url())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::Transport)?;
        let response = check_status(response).await?;
        let body: Value = response.json().await.map_err(|source| {
            ApiError::UnexpectedBody {
                detail: source.to_string(),
            }
        })?;
        if !body.is_array() {
            warn!("http: list response was not a JSON array, treating as empty");
            return Ok(Vec::new());
        }
        serde_json::from_value(body).map_err(|source| ApiError::UnexpectedBody {
            detail: source.to_string(),
        })
    }

    async fn create_square(&self) -> Result<Square, ApiError> {
        let response = self
            .http
            .post(self.squares_url())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::Transport)?;
        let response = check_status(response).await?;
        response.json().await.map_err(|source| ApiError::UnexpectedBody {
            detail: source.to_string(),
        })
    }

    async fn delete_squares(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.squares_url())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::Transport)?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(error_from_response(response).await)
}

/// Turn a non-2xx response into the richest error the body supports:
/// a parsed problem details document when the content type announces one,
/// otherwise a `message`/`error` field fished out of a JSON body, with a
/// bare status line as the last resort.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let is_problem = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains(PROBLEM_JSON_CONTENT_TYPE))
        .unwrap_or(false);
    let body = response.bytes().await.unwrap_or_default();

    if is_problem {
        if let Ok(problem) = serde_json::from_slice::<ProblemDetails>(&body) {
            return ApiError::Problem { status, problem };
        }
        warn!(status, "http: problem content type with undecodable body");
    }

    let detail = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP error! status: {status}"));

    ApiError::Unstructured { status, detail }
}
