//! Blocking HTTP client for the prediction service.
//!
//! Endpoints:
//! - `POST {base}/upload`  multipart, field `file` → `{ "message": "..." }`
//! - `POST {base}/compare` JSON `{ methods, num_predictions }` → `ComparisonResultRaw`

use std::time::Duration;

use reqwest::blocking::{Client, multipart};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{ComparisonRequest, ComparisonResultRaw, DatasetRef, SessionConfig};
use crate::error::{TransportError, WorkflowError};
use crate::service::PredictionService;

const UPLOAD_PATH: &str = "/upload";
const COMPARE_PATH: &str = "/compare";
const UPLOAD_FIELD: &str = "file";

pub struct HttpPredictionService {
    client: Client,
    base_url: String,
}

impl HttpPredictionService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                url: base_url.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, TransportError> {
        Self::new(&config.server_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl PredictionService for HttpPredictionService {
    fn upload(&self, dataset: &DatasetRef) -> Result<String, TransportError> {
        let url = self.url(UPLOAD_PATH);
        let form = multipart::Form::new()
            .file(UPLOAD_FIELD, dataset.path())
            .map_err(|e| TransportError::Dataset {
                path: dataset.path().display().to_string(),
                message: e.to_string(),
            })?;

        debug!(%url, dataset = dataset.name(), "uploading dataset");
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| request_error(&url, e))?;
        let body = read_success_body(&url, resp)?;

        // The server answers with `{ "message": ... }`; fall back to the raw text.
        let message = match serde_json::from_str::<UploadResponse>(&body) {
            Ok(parsed) => parsed.message,
            Err(_) => body.trim().to_string(),
        };
        Ok(message)
    }

    fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResultRaw, WorkflowError> {
        let url = self.url(COMPARE_PATH);
        debug!(
            %url,
            methods = %request.methods.joined(),
            num_predictions = request.horizon.get(),
            "requesting comparison"
        );
        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| request_error(&url, e))?;
        let body = read_success_body(&url, resp)?;

        Ok(ComparisonResultRaw::from_json(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    message: String,
}

fn request_error(url: &str, e: reqwest::Error) -> TransportError {
    TransportError::Request {
        url: url.to_string(),
        message: e.to_string(),
    }
}

fn read_success_body(url: &str, resp: reqwest::blocking::Response) -> Result<String, TransportError> {
    let status = resp.status();
    let body = resp.text().map_err(|e| request_error(url, e))?;
    if !status.is_success() {
        warn!(%url, status = status.as_u16(), "prediction service returned an error status");
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }
    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX).collect();
    out.push('…');
    out
}
