//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - sent to / received from the prediction service as JSON
//! - held by the workflow state machine between transitions
//! - handed to the renderer and the report encoder

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CompositionError, ValidationError};

/// Default prediction-service base URL.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Default report title.
pub const DEFAULT_REPORT_TITLE: &str = "Reporte de Predicciones de Consumo Energético";

/// Default report output filename.
pub const DEFAULT_REPORT_FILENAME: &str = "reporte_predicciones.pdf";

/// Interpolation / regression technique recognized by the prediction service.
///
/// The serialized form must match the server identifiers exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[value(name = "lagrange")]
    Lagrange,
    #[value(name = "newton")]
    Newton,
    #[value(name = "least_squares_linear")]
    LeastSquaresLinear,
    #[value(name = "least_squares_poly")]
    LeastSquaresPoly,
    #[value(name = "cubic_spline")]
    CubicSpline,
}

impl Method {
    /// Full catalog, in the order the methods are offered to the user.
    pub const ALL: [Method; 5] = [
        Method::Lagrange,
        Method::Newton,
        Method::LeastSquaresLinear,
        Method::LeastSquaresPoly,
        Method::CubicSpline,
    ];

    /// Wire identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Lagrange => "lagrange",
            Method::Newton => "newton",
            Method::LeastSquaresLinear => "least_squares_linear",
            Method::LeastSquaresPoly => "least_squares_poly",
            Method::CubicSpline => "cubic_spline",
        }
    }

    /// Human-readable label for method pickers.
    pub fn display_name(self) -> &'static str {
        match self {
            Method::Lagrange => "Interpolación de Lagrange",
            Method::Newton => "Diferencias Divididas de Newton",
            Method::LeastSquaresLinear => "Mínimos Cuadrados (Lineal)",
            Method::LeastSquaresPoly => "Mínimos Cuadrados (Polinómico)",
            Method::CubicSpline => "Spline Cúbico",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ValidationError::UnknownMethod(s.to_string()))
    }
}

/// Ordered, duplicate-free method selection.
///
/// Order is significant: it decides series order, labels and colors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MethodSelection(Vec<Method>);

impl MethodSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from caller order. Repeated methods keep their first position.
    pub fn from_ordered<I: IntoIterator<Item = Method>>(methods: I) -> Self {
        let mut out = Vec::new();
        for m in methods {
            if !out.contains(&m) {
                out.push(m);
            }
        }
        Self(out)
    }

    /// Parse wire identifiers (e.g. from a CLI or a form), preserving order.
    pub fn parse<S: AsRef<str>>(ids: &[S]) -> Result<Self, ValidationError> {
        let methods = ids
            .iter()
            .map(|s| s.as_ref().parse::<Method>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_ordered(methods))
    }

    /// Add `method` at the end, or remove it if already selected.
    pub fn toggle(&mut self, method: Method) {
        if let Some(pos) = self.0.iter().position(|m| *m == method) {
            self.0.remove(pos);
        } else {
            self.0.push(method);
        }
    }

    pub fn contains(&self, method: Method) -> bool {
        self.0.contains(&method)
    }

    /// Zero-based position of `method` in the selection.
    pub fn position(&self, method: Method) -> Option<usize> {
        self.0.iter().position(|m| *m == method)
    }

    pub fn as_slice(&self) -> &[Method] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }

    /// Comma-joined wire identifiers.
    pub fn joined(&self) -> String {
        self.0.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
    }
}

/// Reference to the dataset the user picked for upload.
///
/// The core never reads the file; it only hands the reference to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRef {
    name: String,
    path: PathBuf,
}

impl DatasetRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Number of future points to predict beyond the historical data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ForecastHorizon(pub u32);

impl ForecastHorizon {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How raw horizon text is turned into a `ForecastHorizon`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HorizonPolicy {
    /// Integer-prefix parsing; input without any digits coerces to 0.
    #[default]
    Lenient,
    /// The whole trimmed input must be a non-negative integer.
    Strict,
}

/// Validated comparison request, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRequest {
    pub methods: MethodSelection,
    #[serde(rename = "num_predictions")]
    pub horizon: ForecastHorizon,
}

/// One method's predicted values as returned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MethodResult {
    pub historical: Vec<f64>,
    pub future: Vec<f64>,
}

/// Raw `/compare` response.
///
/// `results[i]` belongs to `methods[i]` of the request that produced it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComparisonResultRaw {
    pub results: Vec<MethodResult>,
    pub historical_x: Vec<f64>,
    pub future_x: Vec<f64>,
}

impl ComparisonResultRaw {
    /// Decode a response body. Missing or mistyped fields are a data-shape error.
    pub fn from_json(body: &str) -> Result<Self, CompositionError> {
        serde_json::from_str(body).map_err(|e| CompositionError::MalformedComparisonResult(e.to_string()))
    }
}

/// Fixed series palette. Selection index `i` uses `PALETTE[i % 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesColor {
    Blue,
    Green,
    Red,
    Orange,
    Purple,
}

pub const PALETTE: [SeriesColor; 5] = [
    SeriesColor::Blue,
    SeriesColor::Green,
    SeriesColor::Red,
    SeriesColor::Orange,
    SeriesColor::Purple,
];

impl SeriesColor {
    /// Palette entry for a zero-based series index (cycles past the fifth series).
    pub fn for_index(i: usize) -> Self {
        PALETTE[i % PALETTE.len()]
    }

    /// CSS color name.
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesColor::Blue => "blue",
            SeriesColor::Green => "green",
            SeriesColor::Red => "red",
            SeriesColor::Orange => "orange",
            SeriesColor::Purple => "purple",
        }
    }

    /// sRGB triple matching the CSS named color.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            SeriesColor::Blue => (0, 0, 255),
            SeriesColor::Green => (0, 128, 0),
            SeriesColor::Red => (255, 0, 0),
            SeriesColor::Orange => (255, 165, 0),
            SeriesColor::Purple => (128, 0, 128),
        }
    }
}

impl fmt::Display for SeriesColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chart line: a method's historical values followed by its forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<f64>,
    pub color: SeriesColor,
    pub connect_gaps: bool,
}

/// Chart-ready dataset: a shared x axis plus one series per selected method.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataset {
    pub x_labels: Vec<f64>,
    pub series: Vec<ChartSeries>,
}

impl ChartDataset {
    /// `(min, max)` over all finite series values.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in self.series.iter().flat_map(|s| s.points.iter()).copied() {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }

    /// `(min, max)` over the finite x labels.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in &self.x_labels {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }
}

/// A session's configuration as understood by the workflow and its collaborators.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prediction-service base URL (no trailing slash needed).
    pub server_url: String,
    pub horizon_policy: HorizonPolicy,
    /// Optional upper bound on the forecast horizon.
    pub max_horizon: Option<u32>,
    pub report_title: String,
    pub report_path: PathBuf,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            horizon_policy: HorizonPolicy::Lenient,
            max_horizon: None,
            report_title: DEFAULT_REPORT_TITLE.to_string(),
            report_path: PathBuf::from(DEFAULT_REPORT_FILENAME),
            timeout_secs: 30,
        }
    }
}
