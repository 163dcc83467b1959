//! Normalize per-method server results into a multi-series chart dataset.
//!
//! The server contract is positional: `results[i]` belongs to `methods[i]`.
//! We zip the two and fail loudly on any cardinality or length mismatch rather
//! than rendering a chart whose lines do not line up with the x axis.

use crate::domain::{ChartDataset, ChartSeries, ComparisonResultRaw, MethodSelection, SeriesColor};
use crate::error::CompositionError;

/// Prefix of every series label.
pub const SERIES_LABEL_PREFIX: &str = "Método: ";

/// Build the chart dataset for `methods` from the raw comparison response.
pub fn compose_series(methods: &MethodSelection, raw: &ComparisonResultRaw) -> Result<ChartDataset, CompositionError> {
    if raw.results.len() != methods.len() {
        return Err(CompositionError::MalformedComparisonResult(format!(
            "{} result(s) for {} requested method(s)",
            raw.results.len(),
            methods.len()
        )));
    }

    let mut x_labels = Vec::with_capacity(raw.historical_x.len() + raw.future_x.len());
    x_labels.extend_from_slice(&raw.historical_x);
    x_labels.extend_from_slice(&raw.future_x);

    let mut series = Vec::with_capacity(methods.len());
    for (i, (method, result)) in methods.iter().zip(&raw.results).enumerate() {
        let mut points = Vec::with_capacity(result.historical.len() + result.future.len());
        points.extend_from_slice(&result.historical);
        points.extend_from_slice(&result.future);

        if points.len() != x_labels.len() {
            return Err(CompositionError::SeriesLengthMismatch {
                method: method.as_str().to_string(),
                expected: x_labels.len(),
                actual: points.len(),
            });
        }

        series.push(ChartSeries {
            label: format!("{SERIES_LABEL_PREFIX}{method}"),
            points,
            color: SeriesColor::for_index(i),
            connect_gaps: false,
        });
    }

    Ok(ChartDataset { x_labels, series })
}
