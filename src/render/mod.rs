//! Chart rendering boundary.
//!
//! The workflow hands a finished `ChartDataset` to a renderer and gets pixels
//! back; the report composer only ever sees the resulting `RenderedChart`.

use crate::domain::ChartDataset;
use crate::error::WorkflowError;

pub mod bitmap;

pub use bitmap::BitmapChartRenderer;

/// A rasterized chart: tightly packed 8-bit RGB rows, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RenderedChart {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, WorkflowError> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || rgb.len() != expected {
            return Err(WorkflowError::Render(format!(
                "pixel buffer has {} bytes, expected {expected} for {width}x{height}",
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }
}

/// Turns chart data into pixels.
pub trait ChartRenderer {
    fn render(&self, chart: &ChartDataset) -> Result<RenderedChart, WorkflowError>;
}

/// Axis bounds for a chart, padded so lines do not touch the frame.
pub(crate) fn chart_bounds(chart: &ChartDataset) -> ([f64; 2], [f64; 2]) {
    let (mut x0, mut x1) = chart.x_range().unwrap_or((0.0, 1.0));
    if x1 <= x0 {
        x0 -= 0.5;
        x1 += 0.5;
    }

    let (mut y0, mut y1) = chart.y_range().unwrap_or((0.0, 1.0));
    if y1 <= y0 {
        y0 -= 0.5;
        y1 += 0.5;
    }
    let pad = ((y1 - y0).abs() * 0.05).max(1e-12);

    ([x0, x1], [y0 - pad, y1 + pad])
}

/// `(x, y)` pairs for one series, skipping non-finite values.
pub(crate) fn series_points(x_labels: &[f64], points: &[f64]) -> Vec<(f64, f64)> {
    x_labels
        .iter()
        .zip(points)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect()
}
