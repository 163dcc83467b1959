//! The comparison workflow state machine.
//!
//! Two independent sub-machines run side by side:
//!
//! ```text
//! upload:     Empty → FileChosen → Uploading → Uploaded | UploadFailed
//! comparison: Idle → Comparing → Compared | CompareFailed
//! ```
//!
//! Every network call is split into `begin_*` (validates, bumps a generation
//! counter, yields the payload) and `complete_*` (applies the response only if
//! its generation is still current). This keeps the state machine free of I/O
//! and makes overlapping requests resolve as last-request-wins.
//!
//! All mutation goes through `&mut self`; the owner is the single writer.

use tracing::{debug, info, warn};

use crate::compare::{ComparisonRequestBuilder, compose_series};
use crate::domain::{
    ChartDataset, ComparisonRequest, ComparisonResultRaw, DatasetRef, MethodSelection, SessionConfig,
};
use crate::error::{TransportError, ValidationError, WorkflowError};
use crate::render::ChartRenderer;
use crate::report::{ReportDocument, compose_report, legend_entries};

/// Tag attached to each in-flight request.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Empty,
    FileChosen,
    Uploading,
    Uploaded { message: String },
    UploadFailed { error: TransportError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonStatus {
    Idle,
    Comparing,
    Compared,
    CompareFailed { error: WorkflowError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Advisory text for the user. Failures never escape as faults; they end up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Payload for the transport after `begin_upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub generation: Generation,
    pub dataset: DatasetRef,
}

/// Payload for the transport after `begin_comparison`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingComparison {
    pub generation: Generation,
    pub request: ComparisonRequest,
}

/// What a `complete_*` call did with the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The response was current and the state moved to the success state.
    Applied,
    /// The response was current but carried (or produced) an error.
    Failed(WorkflowError),
    /// A newer request superseded this one; the response was ignored.
    Stale,
}

/// The chart on display plus the request that produced it.
///
/// The exported report summarizes `request`, not the form. Methods or a
/// horizon edited after the comparison finished do not reach the PDF until
/// the next comparison is applied, so the summary always matches the image.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedComparison {
    pub request: ComparisonRequest,
    pub chart: ChartDataset,
}

#[derive(Debug, Clone)]
pub struct WorkflowState {
    builder: ComparisonRequestBuilder,

    dataset: Option<DatasetRef>,
    upload: UploadStatus,
    upload_generation: Generation,

    methods: MethodSelection,
    horizon_input: String,

    comparison: ComparisonStatus,
    compare_generation: Generation,
    /// Request issued for `compare_generation`, awaiting its response.
    in_flight: Option<ComparisonRequest>,
    /// Single slot: the last successful comparison, replaced wholesale.
    completed: Option<CompletedComparison>,

    notice: Option<Notice>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new(ComparisonRequestBuilder::default())
    }
}

impl WorkflowState {
    pub fn new(builder: ComparisonRequestBuilder) -> Self {
        Self {
            builder,
            dataset: None,
            upload: UploadStatus::Empty,
            upload_generation: 0,
            methods: MethodSelection::new(),
            horizon_input: "0".to_string(),
            comparison: ComparisonStatus::Idle,
            compare_generation: 0,
            in_flight: None,
            completed: None,
            notice: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(ComparisonRequestBuilder::from_config(config))
    }

    // ---- inputs -------------------------------------------------------------

    /// Replace the dataset reference. Clears any upload failure.
    pub fn select_dataset(&mut self, dataset: DatasetRef) {
        debug!(dataset = dataset.name(), "dataset selected");
        self.dataset = Some(dataset);
        self.upload = UploadStatus::FileChosen;
        // A response for the previous file must not mark the new one as uploaded.
        self.upload_generation += 1;
    }

    /// Replace the method selection, keeping caller order. Empty is accepted here.
    pub fn select_methods(&mut self, methods: MethodSelection) {
        debug!(methods = %methods.joined(), "methods selected");
        self.methods = methods;
    }

    /// Mutable access for incremental pickers (toggle on/off).
    pub fn methods_mut(&mut self) -> &mut MethodSelection {
        &mut self.methods
    }

    /// Store the literal horizon text; parsing happens when a request is built.
    pub fn set_horizon(&mut self, raw: impl Into<String>) {
        self.horizon_input = raw.into();
    }

    // ---- upload sub-machine -------------------------------------------------

    pub fn begin_upload(&mut self) -> Result<PendingUpload, WorkflowError> {
        let Some(dataset) = self.dataset.clone() else {
            let err = WorkflowError::NoFileSelected;
            self.notice = Some(Notice::warning(err.to_string()));
            return Err(err);
        };

        self.upload_generation += 1;
        self.upload = UploadStatus::Uploading;
        info!(generation = self.upload_generation, dataset = dataset.name(), "upload started");
        Ok(PendingUpload {
            generation: self.upload_generation,
            dataset,
        })
    }

    pub fn complete_upload(&mut self, generation: Generation, result: Result<String, TransportError>) -> Completion {
        if generation != self.upload_generation {
            debug!(generation, current = self.upload_generation, "ignoring stale upload response");
            return Completion::Stale;
        }

        match result {
            Ok(message) => {
                info!(generation, %message, "upload finished");
                self.notice = Some(Notice::info(message.clone()));
                self.upload = UploadStatus::Uploaded { message };
                Completion::Applied
            }
            Err(error) => {
                warn!(generation, %error, "upload failed");
                self.notice = Some(Notice::error(format!("Error al cargar el archivo: {error}")));
                self.upload = UploadStatus::UploadFailed { error: error.clone() };
                Completion::Failed(error.into())
            }
        }
    }

    // ---- comparison sub-machine ---------------------------------------------

    /// Validate the current selections and start a comparison.
    ///
    /// On validation failure nothing changes except the notice.
    pub fn begin_comparison(&mut self) -> Result<PendingComparison, WorkflowError> {
        let request = match self.builder.build(&self.methods, &self.horizon_input) {
            Ok(r) => r,
            Err(err) => {
                self.notice = Some(Notice::warning(err.to_string()));
                return Err(err.into());
            }
        };

        self.compare_generation += 1;
        self.comparison = ComparisonStatus::Comparing;
        self.in_flight = Some(request.clone());
        info!(
            generation = self.compare_generation,
            methods = %request.methods.joined(),
            num_predictions = request.horizon.get(),
            "comparison started"
        );
        Ok(PendingComparison {
            generation: self.compare_generation,
            request,
        })
    }

    /// Apply a comparison response.
    ///
    /// Results are matched against the methods of the request issued for
    /// `generation`. On failure the previously displayed chart is kept.
    pub fn complete_comparison(
        &mut self,
        generation: Generation,
        result: Result<ComparisonResultRaw, WorkflowError>,
    ) -> Completion {
        if generation != self.compare_generation {
            debug!(generation, current = self.compare_generation, "ignoring stale comparison response");
            return Completion::Stale;
        }
        let Some(request) = self.in_flight.take() else {
            debug!(generation, "ignoring duplicate comparison response");
            return Completion::Stale;
        };

        let composed = result.and_then(|raw| compose_series(&request.methods, &raw).map_err(WorkflowError::from));
        match composed {
            Ok(chart) => {
                info!(generation, series = chart.series.len(), points = chart.x_labels.len(), "comparison finished");
                self.completed = Some(CompletedComparison { request, chart });
                self.comparison = ComparisonStatus::Compared;
                self.notice = None;
                Completion::Applied
            }
            Err(error) => {
                warn!(generation, %error, "comparison failed; keeping previous chart");
                self.notice = Some(Notice::error(format!("Error al aplicar los métodos: {error}")));
                self.comparison = ComparisonStatus::CompareFailed { error: error.clone() };
                Completion::Failed(error)
            }
        }
    }

    // ---- export -------------------------------------------------------------

    /// Render the chart on display and compose the report for it.
    ///
    /// The summary reflects the request that produced the chart, so the
    /// document never pairs an image with parameters it was not computed from.
    pub fn export_report(&mut self, renderer: &dyn ChartRenderer, title: &str) -> Result<ReportDocument, WorkflowError> {
        let result = match &self.completed {
            None => compose_report(None, &[], &self.methods, Default::default(), title),
            Some(done) => renderer.render(&done.chart).and_then(|img| {
                let legend = legend_entries(&done.chart);
                compose_report(Some(&img), &legend, &done.request.methods, done.request.horizon, title)
            }),
        };
        if let Err(err) = &result {
            warn!(error = %err, "export failed");
            self.notice = Some(Notice::warning(err.to_string()));
        }
        result
    }

    /// Record an advisory notice from outside the state machine (e.g. file write results).
    pub fn set_notice_info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::info(text));
    }

    pub fn set_notice_error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::error(text));
    }

    // ---- renderable state ---------------------------------------------------

    pub fn dataset(&self) -> Option<&DatasetRef> {
        self.dataset.as_ref()
    }

    pub fn upload_status(&self) -> &UploadStatus {
        &self.upload
    }

    pub fn methods(&self) -> &MethodSelection {
        &self.methods
    }

    pub fn methods_chosen(&self) -> bool {
        !self.methods.is_empty()
    }

    pub fn horizon_input(&self) -> &str {
        &self.horizon_input
    }

    /// Live validation of the horizon text, for form hints.
    pub fn horizon_error(&self) -> Option<ValidationError> {
        self.builder.parse_horizon(&self.horizon_input).err()
    }

    pub fn comparison_status(&self) -> &ComparisonStatus {
        &self.comparison
    }

    pub fn is_comparing(&self) -> bool {
        self.comparison == ComparisonStatus::Comparing
    }

    pub fn is_uploading(&self) -> bool {
        self.upload == UploadStatus::Uploading
    }

    pub fn chart(&self) -> Option<&ChartDataset> {
        self.completed.as_ref().map(|c| &c.chart)
    }

    pub fn completed(&self) -> Option<&CompletedComparison> {
        self.completed.as_ref()
    }

    /// Export is only meaningful once a chart exists.
    pub fn can_export(&self) -> bool {
        self.completed.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HorizonPolicy, MethodResult};
    use crate::error::CompositionError;

    fn raw(n_methods: usize, offset: f64) -> ComparisonResultRaw {
        ComparisonResultRaw {
            results: (0..n_methods)
                .map(|i| MethodResult {
                    historical: vec![1.0, 2.0],
                    future: vec![3.0 + offset + i as f64],
                })
                .collect(),
            historical_x: vec![0.0, 1.0],
            future_x: vec![2.0],
        }
    }

    fn state_with(methods: &[&str]) -> WorkflowState {
        let mut s = WorkflowState::default();
        s.select_methods(MethodSelection::parse(methods).unwrap());
        s.set_horizon("1");
        s
    }

    #[test]
    fn starts_empty() {
        let s = WorkflowState::default();
        assert_eq!(s.upload_status(), &UploadStatus::Empty);
        assert_eq!(s.comparison_status(), &ComparisonStatus::Idle);
        assert!(!s.methods_chosen());
        assert!(!s.can_export());
    }

    #[test]
    fn upload_without_file_fails() {
        let mut s = WorkflowState::default();
        assert_eq!(s.begin_upload().unwrap_err(), WorkflowError::NoFileSelected);
        assert_eq!(s.upload_status(), &UploadStatus::Empty);
        assert_eq!(s.notice().unwrap().level, NoticeLevel::Warning);
    }

    #[test]
    fn upload_failure_then_reselect_resets() {
        let mut s = WorkflowState::default();
        s.select_dataset(DatasetRef::new("a.csv"));
        let p = s.begin_upload().unwrap();
        assert!(s.is_uploading());

        let err = TransportError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert!(matches!(s.complete_upload(p.generation, Err(err)), Completion::Failed(_)));
        assert!(matches!(s.upload_status(), UploadStatus::UploadFailed { .. }));

        s.select_dataset(DatasetRef::new("b.csv"));
        assert_eq!(s.upload_status(), &UploadStatus::FileChosen);
        assert_eq!(s.dataset().unwrap().name(), "b.csv");
    }

    #[test]
    fn upload_response_for_replaced_file_is_stale() {
        let mut s = WorkflowState::default();
        s.select_dataset(DatasetRef::new("a.csv"));
        let p = s.begin_upload().unwrap();
        s.select_dataset(DatasetRef::new("b.csv"));
        assert_eq!(s.complete_upload(p.generation, Ok("ok".into())), Completion::Stale);
        assert_eq!(s.upload_status(), &UploadStatus::FileChosen);
    }

    #[test]
    fn empty_selection_leaves_state_untouched() {
        let mut s = WorkflowState::default();
        let err = s.begin_comparison().unwrap_err();
        assert_eq!(err, WorkflowError::Validation(ValidationError::EmptySelection));
        assert_eq!(s.comparison_status(), &ComparisonStatus::Idle);
    }

    #[test]
    fn successful_comparison_stores_chart() {
        let mut s = state_with(&["newton", "lagrange"]);
        let p = s.begin_comparison().unwrap();
        assert!(s.is_comparing());
        assert_eq!(s.complete_comparison(p.generation, Ok(raw(2, 0.0))), Completion::Applied);
        assert_eq!(s.comparison_status(), &ComparisonStatus::Compared);
        let chart = s.chart().unwrap();
        assert_eq!(chart.series[0].label, "Método: newton");
        assert!(s.can_export());
    }

    #[test]
    fn failure_keeps_previous_chart() {
        let mut s = state_with(&["lagrange"]);
        let p = s.begin_comparison().unwrap();
        s.complete_comparison(p.generation, Ok(raw(1, 0.0)));
        let before = s.chart().cloned();

        let p2 = s.begin_comparison().unwrap();
        let err = WorkflowError::Transport(TransportError::Request {
            url: "http://x".into(),
            message: "refused".into(),
        });
        assert!(matches!(s.complete_comparison(p2.generation, Err(err)), Completion::Failed(_)));
        assert!(matches!(s.comparison_status(), ComparisonStatus::CompareFailed { .. }));
        assert_eq!(s.chart().cloned(), before);
    }

    #[test]
    fn shape_error_is_reported_as_failure() {
        let mut s = state_with(&["lagrange", "newton"]);
        let p = s.begin_comparison().unwrap();
        let outcome = s.complete_comparison(p.generation, Ok(raw(1, 0.0)));
        assert!(matches!(
            outcome,
            Completion::Failed(WorkflowError::Composition(CompositionError::MalformedComparisonResult(_)))
        ));
        assert!(s.chart().is_none());
    }

    #[test]
    fn superseded_response_never_overwrites_newer_chart() {
        let mut s = state_with(&["lagrange"]);
        let a = s.begin_comparison().unwrap();
        let b = s.begin_comparison().unwrap();

        assert_eq!(s.complete_comparison(b.generation, Ok(raw(1, 100.0))), Completion::Applied);
        assert_eq!(s.complete_comparison(a.generation, Ok(raw(1, 0.0))), Completion::Stale);

        assert_eq!(s.chart().unwrap().series[0].points, vec![1.0, 2.0, 103.0]);
    }

    #[test]
    fn duplicate_response_for_current_generation_is_stale() {
        let mut s = state_with(&["lagrange"]);
        let p = s.begin_comparison().unwrap();

        assert_eq!(s.complete_comparison(p.generation, Ok(raw(1, 0.0))), Completion::Applied);
        let shown = s.completed().cloned();

        assert_eq!(s.complete_comparison(p.generation, Ok(raw(1, 50.0))), Completion::Stale);
        assert_eq!(s.comparison_status(), &ComparisonStatus::Compared);
        assert_eq!(s.completed().cloned(), shown);
    }

    #[test]
    fn new_chart_replaces_old_one_entirely() {
        let mut s = state_with(&["lagrange", "newton"]);
        let p = s.begin_comparison().unwrap();
        s.complete_comparison(p.generation, Ok(raw(2, 0.0)));

        s.select_methods(MethodSelection::parse(&["cubic_spline"]).unwrap());
        let p = s.begin_comparison().unwrap();
        s.complete_comparison(p.generation, Ok(raw(1, 0.0)));

        let chart = s.chart().unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].label, "Método: cubic_spline");
    }

    #[test]
    fn strict_policy_surfaces_horizon_error() {
        let mut s = WorkflowState::new(ComparisonRequestBuilder::new(HorizonPolicy::Strict));
        s.select_methods(MethodSelection::parse(&["lagrange"]).unwrap());
        s.set_horizon("");
        assert_eq!(s.horizon_error(), Some(ValidationError::InvalidHorizon(String::new())));
        assert!(s.begin_comparison().is_err());
        assert_eq!(s.comparison_status(), &ComparisonStatus::Idle);
    }

    #[test]
    fn export_without_chart_is_rejected() {
        struct NeverCalled;
        impl ChartRenderer for NeverCalled {
            fn render(&self, _: &ChartDataset) -> Result<crate::render::RenderedChart, WorkflowError> {
                panic!("renderer must not run without a chart");
            }
        }
        let mut s = state_with(&["lagrange"]);
        assert_eq!(s.export_report(&NeverCalled, "t").unwrap_err(), WorkflowError::RenderUnavailable);
    }
}
