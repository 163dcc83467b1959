//! Prediction-service boundary.
//!
//! The numerical methods live server-side. The workflow only needs two calls,
//! expressed as a trait so the state machine can be driven by the real HTTP
//! client, a worker thread, or a test double.

use crate::domain::{ComparisonRequest, ComparisonResultRaw, DatasetRef};
use crate::error::{TransportError, WorkflowError};

pub mod http;

pub use http::HttpPredictionService;

/// The two network calls the workflow issues.
pub trait PredictionService {
    /// Upload the dataset; returns the server's confirmation message.
    fn upload(&self, dataset: &DatasetRef) -> Result<String, TransportError>;

    /// Request predictions for every selected method.
    ///
    /// Errors are either `WorkflowError::Transport` or, when the body does not
    /// decode, `WorkflowError::Composition`.
    fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResultRaw, WorkflowError>;
}

impl<T: PredictionService + ?Sized> PredictionService for &T {
    fn upload(&self, dataset: &DatasetRef) -> Result<String, TransportError> {
        (**self).upload(dataset)
    }

    fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResultRaw, WorkflowError> {
        (**self).compare(request)
    }
}
