use std::fs;
use std::io::Read;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::read::ZlibDecoder;
use forecast_compare::domain::{
    ComparisonRequest, ComparisonResultRaw, DatasetRef, HorizonPolicy, Method, MethodResult, MethodSelection,
    SeriesColor, SessionConfig,
};
use forecast_compare::error::{TransportError, ValidationError, WorkflowError};
use forecast_compare::workflow::{ComparisonStatus, Completion, Session, UploadStatus};
use tempfile::TempDir;

/// In-memory service that records every call.
struct Recording {
    uploads: AtomicUsize,
    compares: AtomicUsize,
    last_request: Mutex<Option<ComparisonRequest>>,
    response: Result<ComparisonResultRaw, WorkflowError>,
}

impl Recording {
    fn answering(response: Result<ComparisonResultRaw, WorkflowError>) -> Self {
        Self {
            uploads: AtomicUsize::new(0),
            compares: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            response,
        }
    }

    fn calls(&self) -> (usize, usize) {
        (self.uploads.load(Ordering::SeqCst), self.compares.load(Ordering::SeqCst))
    }
}

impl forecast_compare::service::PredictionService for Recording {
    fn upload(&self, dataset: &DatasetRef) -> Result<String, TransportError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Archivo {} cargado correctamente", dataset.name()))
    }

    fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonResultRaw, WorkflowError> {
        self.compares.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.response.clone()
    }
}

fn lagrange_and_spline() -> ComparisonResultRaw {
    ComparisonResultRaw {
        results: vec![
            MethodResult {
                historical: vec![10.0, 12.0, 11.0],
                future: vec![13.0, 14.0],
            },
            MethodResult {
                historical: vec![10.0, 12.5, 11.2],
                future: vec![12.8, 13.1],
            },
        ],
        historical_x: vec![0.0, 1.0, 2.0],
        future_x: vec![3.0, 4.0],
    }
}

fn session(config: SessionConfig, response: Result<ComparisonResultRaw, WorkflowError>) -> Session<Recording> {
    Session::new(config, Recording::answering(response))
}

#[test]
fn empty_selection_never_reaches_the_server() {
    let mut s = session(SessionConfig::default(), Ok(lagrange_and_spline()));
    s.set_horizon("2");

    let err = s.compare().unwrap_err();
    assert_eq!(err, WorkflowError::Validation(ValidationError::EmptySelection));
    assert_eq!(err.to_string(), "Por favor, selecciona al menos un método.");
    assert_eq!(s.service().calls(), (0, 0));
    assert_eq!(s.state.comparison_status(), &ComparisonStatus::Idle);
}

#[test]
fn upload_without_file_never_reaches_the_server() {
    let mut s = session(SessionConfig::default(), Ok(lagrange_and_spline()));
    assert_eq!(s.upload().unwrap_err(), WorkflowError::NoFileSelected);
    assert_eq!(s.service().calls(), (0, 0));
    assert_eq!(s.state.upload_status(), &UploadStatus::Empty);
}

#[test]
fn upload_reports_server_message() {
    let mut s = session(SessionConfig::default(), Ok(lagrange_and_spline()));
    s.select_dataset("data/consumo.csv");
    assert_eq!(s.upload().unwrap(), Completion::Applied);
    assert_eq!(s.service().calls(), (1, 0));
    assert_eq!(
        s.state.upload_status(),
        &UploadStatus::Uploaded {
            message: "Archivo consumo.csv cargado correctamente".into()
        }
    );
}

#[test]
fn two_method_comparison_builds_ordered_series() {
    let mut s = session(SessionConfig::default(), Ok(lagrange_and_spline()));
    s.select_methods(MethodSelection::from_ordered([Method::Lagrange, Method::CubicSpline]));
    s.set_horizon("2");

    assert_eq!(s.compare().unwrap(), Completion::Applied);

    let sent = s.service().last_request.lock().unwrap().clone().unwrap();
    assert_eq!(
        serde_json::to_value(&sent).unwrap(),
        serde_json::json!({ "methods": ["lagrange", "cubic_spline"], "num_predictions": 2 })
    );

    let chart = s.state.chart().unwrap();
    assert_eq!(chart.x_labels, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(chart.series.len(), 2);
    assert_eq!(chart.series[0].label, "Método: lagrange");
    assert_eq!(chart.series[0].points, vec![10.0, 12.0, 11.0, 13.0, 14.0]);
    assert_eq!(chart.series[0].color, SeriesColor::Blue);
    assert_eq!(chart.series[1].label, "Método: cubic_spline");
    assert_eq!(chart.series[1].color, SeriesColor::Green);
}

#[test]
fn missing_result_is_a_data_shape_failure() {
    let mut raw = lagrange_and_spline();
    raw.results.pop();
    let mut s = session(SessionConfig::default(), Ok(raw));
    s.select_methods(MethodSelection::from_ordered([Method::Lagrange, Method::CubicSpline]));
    s.set_horizon("2");

    let Completion::Failed(err) = s.compare().unwrap() else {
        panic!("expected a failed comparison");
    };
    assert_eq!(err.kind(), forecast_compare::error::ErrorKind::DataShape);
    assert!(s.state.chart().is_none());
    assert!(!s.state.can_export());
}

#[test]
fn lenient_horizon_coerces_empty_text_to_zero() {
    let mut s = session(SessionConfig::default(), Ok(lagrange_and_spline()));
    s.select_methods(MethodSelection::from_ordered([Method::Newton]));
    s.set_horizon("");
    // The stub answers with two results, so only the request matters here.
    let _ = s.compare().unwrap();

    let sent = s.service().last_request.lock().unwrap().clone().unwrap();
    assert_eq!(sent.horizon.get(), 0);
}

#[test]
fn strict_horizon_rejects_empty_text_before_sending() {
    let config = SessionConfig {
        horizon_policy: HorizonPolicy::Strict,
        ..SessionConfig::default()
    };
    let mut s = session(config, Ok(lagrange_and_spline()));
    s.select_methods(MethodSelection::from_ordered([Method::Newton]));
    s.set_horizon("");

    assert!(matches!(
        s.compare().unwrap_err(),
        WorkflowError::Validation(ValidationError::InvalidHorizon(_))
    ));
    assert_eq!(s.service().calls(), (0, 0));
}

#[test]
fn negative_horizon_is_rejected_in_both_modes() {
    for policy in [HorizonPolicy::Lenient, HorizonPolicy::Strict] {
        let config = SessionConfig {
            horizon_policy: policy,
            ..SessionConfig::default()
        };
        let mut s = session(config, Ok(lagrange_and_spline()));
        s.select_methods(MethodSelection::from_ordered([Method::Lagrange]));
        s.set_horizon("-3");
        assert_eq!(
            s.compare().unwrap_err(),
            WorkflowError::Validation(ValidationError::NegativeHorizon(-3))
        );
        assert_eq!(s.service().calls(), (0, 0));
    }
}

#[test]
fn export_without_chart_fails_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reporte.pdf");
    let mut s = session(SessionConfig::default(), Ok(lagrange_and_spline()));

    assert_eq!(s.export(&path).unwrap_err(), WorkflowError::RenderUnavailable);
    assert!(!path.exists());
}

#[test]
fn export_after_comparison_writes_a_pdf() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reporte_predicciones.pdf");
    let mut s = session(SessionConfig::default(), Ok(lagrange_and_spline()));
    s.select_methods(MethodSelection::from_ordered([Method::Lagrange, Method::CubicSpline]));
    s.set_horizon("2");
    s.compare().unwrap();

    // Editing the inputs afterwards must not leak into the report.
    s.set_horizon("9");

    let written = s.export(&path).unwrap();
    assert_eq!(written, path);

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4\n"));
    assert!(bytes.ends_with(b"%%EOF\n"));
    assert!(find(&bytes, b"/Subtype /Image").is_some());

    let content = String::from_utf8_lossy(&page_content(&bytes)).into_owned();
    assert!(content.contains("lagrange, cubic_spline"));
    assert!(content.contains("predicciones futuras: 2"));
    // Every series label reaches the page legend.
    assert!(content.contains("todo: lagrange) Tj"));
    assert!(content.contains("todo: cubic_spline) Tj"));
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Inflated page content stream: the last stream before the info dictionary.
fn page_content(pdf: &[u8]) -> Vec<u8> {
    let info = pdf.windows(8).rposition(|w| w == b"7 0 obj\n").unwrap();
    let end = pdf[..info].windows(10).rposition(|w| w == b"\nendstream").unwrap();
    let start = pdf[..end].windows(7).rposition(|w| w == b"stream\n").unwrap() + 7;
    let mut out = Vec::new();
    ZlibDecoder::new(&pdf[start..end]).read_to_end(&mut out).unwrap();
    out
}
