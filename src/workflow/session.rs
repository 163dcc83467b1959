//! Synchronous driver that wires a `WorkflowState` to its collaborators.
//!
//! Used by the headless `compare` command and by tests. The TUI drives the
//! same state machine but runs the transport on a worker thread instead.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{DatasetRef, MethodSelection, SessionConfig};
use crate::error::WorkflowError;
use crate::render::{BitmapChartRenderer, ChartRenderer};
use crate::report::{PdfReportEncoder, ReportEncoder, write_report};
use crate::service::PredictionService;
use crate::workflow::state::{Completion, WorkflowState};

pub struct Session<S: PredictionService> {
    pub state: WorkflowState,
    pub config: SessionConfig,
    service: S,
    renderer: Box<dyn ChartRenderer>,
    encoder: Box<dyn ReportEncoder>,
}

impl<S: PredictionService> Session<S> {
    /// Session with the default bitmap renderer and PDF encoder.
    pub fn new(config: SessionConfig, service: S) -> Self {
        Self {
            state: WorkflowState::from_config(&config),
            config,
            service,
            renderer: Box::new(BitmapChartRenderer::default()),
            encoder: Box::new(PdfReportEncoder::default()),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn ChartRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_encoder(mut self, encoder: Box<dyn ReportEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn select_dataset(&mut self, path: impl Into<PathBuf>) {
        self.state.select_dataset(DatasetRef::new(path));
    }

    pub fn select_methods(&mut self, methods: MethodSelection) {
        self.state.select_methods(methods);
    }

    pub fn set_horizon(&mut self, raw: impl Into<String>) {
        self.state.set_horizon(raw);
    }

    /// Upload the selected dataset.
    ///
    /// Precondition failures (`NoFileSelected`) return `Err` without touching
    /// the network; transport failures come back as `Completion::Failed`.
    pub fn upload(&mut self) -> Result<Completion, WorkflowError> {
        let pending = self.state.begin_upload()?;
        let result = self.service.upload(&pending.dataset);
        Ok(self.state.complete_upload(pending.generation, result))
    }

    /// Run a comparison with the current selections.
    pub fn compare(&mut self) -> Result<Completion, WorkflowError> {
        let pending = self.state.begin_comparison()?;
        let result = self.service.compare(&pending.request);
        Ok(self.state.complete_comparison(pending.generation, result))
    }

    /// Render, compose and encode the report for the chart on display.
    pub fn export(&mut self, path: &Path) -> Result<PathBuf, WorkflowError> {
        let doc = self.state.export_report(self.renderer.as_ref(), &self.config.report_title)?;
        if let Err(err) = write_report(self.encoder.as_ref(), &doc, path) {
            self.state.set_notice_error(err.to_string());
            return Err(err);
        }
        info!(path = %path.display(), "report exported");
        self.state.set_notice_info(format!("Reporte guardado en {}", path.display()));
        Ok(path.to_path_buf())
    }

    /// Export to the configured default path.
    pub fn export_default(&mut self) -> Result<PathBuf, WorkflowError> {
        let path = self.config.report_path.clone();
        self.export(&path)
    }
}
