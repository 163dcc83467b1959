//! Error types.
//!
//! Library code returns the typed enums below; the binary converts them into an
//! `AppError` carrying a process exit code.

use thiserror::Error;

/// Broad error category, used by front-ends to pick how a failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file, no method selected, bad horizon text.
    UserInput,
    /// Network or server failure.
    Transport,
    /// Server response does not have the expected cardinality or fields.
    DataShape,
    /// Export requested before a chart exists (or rendering/encoding failed).
    Export,
}

/// Rejected user selections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Por favor, selecciona al menos un método.")]
    EmptySelection,
    #[error("invalid forecast horizon '{0}': expected a non-negative integer")]
    InvalidHorizon(String),
    #[error("forecast horizon must not be negative (got {0})")]
    NegativeHorizon(i64),
    #[error("forecast horizon {value} exceeds the maximum of {max}")]
    HorizonTooLarge { value: u64, max: u32 },
    #[error("unknown method '{0}'")]
    UnknownMethod(String),
}

/// Server results that cannot be turned into a chart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("malformed comparison result: {0}")]
    MalformedComparisonResult(String),
    #[error("series for '{method}' has {actual} points but the x axis has {expected}")]
    SeriesLengthMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
}

/// Failures talking to the prediction service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to read dataset '{path}': {message}")]
    Dataset { path: String, message: String },
}

/// Any failure surfaced by a workflow operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Por favor, selecciona un archivo.")]
    NoFileSelected,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Composition(#[from] CompositionError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("no chart has been rendered yet; run a comparison before exporting")]
    RenderUnavailable,
    #[error("chart rendering failed: {0}")]
    Render(String),
    #[error("report encoding failed: {0}")]
    Encode(String),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NoFileSelected | WorkflowError::Validation(_) => ErrorKind::UserInput,
            WorkflowError::Transport(_) => ErrorKind::Transport,
            WorkflowError::Composition(_) => ErrorKind::DataShape,
            WorkflowError::RenderUnavailable | WorkflowError::Render(_) | WorkflowError::Encode(_) => {
                ErrorKind::Export
            }
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let exit_code = match err.kind() {
            ErrorKind::UserInput => 2,
            ErrorKind::DataShape => 3,
            ErrorKind::Transport => 4,
            ErrorKind::Export => 5,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(AppError::from(WorkflowError::NoFileSelected).exit_code(), 2);
        let shape = WorkflowError::Composition(CompositionError::MalformedComparisonResult("x".into()));
        assert_eq!(AppError::from(shape).exit_code(), 3);
        let transport = WorkflowError::Transport(TransportError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(AppError::from(transport).exit_code(), 4);
        assert_eq!(AppError::from(WorkflowError::RenderUnavailable).exit_code(), 5);
    }
}
