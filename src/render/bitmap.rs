//! Plotters-powered bitmap renderer used for report export.
//!
//! Draws into an in-memory RGB buffer (`BitMapBackend::with_buffer`) so no
//! image codec or file I/O is involved; the report encoder embeds the raw pixels.

use plotters::prelude::*;
use tracing::debug;

use crate::domain::ChartDataset;
use crate::error::WorkflowError;
use crate::render::{ChartRenderer, RenderedChart, chart_bounds, series_points};

/// Pixel size matching the 180 × 160 mm image slot of the report page.
pub const DEFAULT_WIDTH: u32 = 900;
pub const DEFAULT_HEIGHT: u32 = 800;

const GRID_LINES: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct BitmapChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for BitmapChartRenderer {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl ChartRenderer for BitmapChartRenderer {
    fn render(&self, chart: &ChartDataset) -> Result<RenderedChart, WorkflowError> {
        let (w, h) = (self.width.max(64), self.height.max(64));
        let mut buf = vec![255u8; w as usize * h as usize * 3];

        draw_chart(&mut buf, (w, h), chart).map_err(WorkflowError::Render)?;
        debug!(width = w, height = h, series = chart.series.len(), "rendered chart bitmap");

        RenderedChart::new(w, h, buf)
    }
}

fn draw_chart(buf: &mut [u8], size: (u32, u32), chart: &ChartDataset) -> Result<(), String> {
    let (x_bounds, y_bounds) = chart_bounds(chart);

    let root = BitMapBackend::with_buffer(buf, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let mut cc = ChartBuilder::on(&root)
        .margin(24)
        .build_cartesian_2d(x_bounds[0]..x_bounds[1], y_bounds[0]..y_bounds[1])
        .map_err(|e| e.to_string())?;

    // No font backend is compiled in, so the mesh must not emit any text.
    cc.configure_mesh()
        .x_labels(0)
        .y_labels(0)
        .axis_style(&BLACK)
        .draw()
        .map_err(|e| e.to_string())?;

    let grid = RGBColor(220, 220, 220);
    for i in 1..GRID_LINES {
        let u = i as f64 / GRID_LINES as f64;
        let x = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let y = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        cc.draw_series(std::iter::once(PathElement::new(vec![(x, y_bounds[0]), (x, y_bounds[1])], grid)))
            .map_err(|e| e.to_string())?;
        cc.draw_series(std::iter::once(PathElement::new(vec![(x_bounds[0], y), (x_bounds[1], y)], grid)))
            .map_err(|e| e.to_string())?;
    }

    for s in &chart.series {
        let (r, g, b) = s.color.rgb();
        let style = RGBColor(r, g, b).stroke_width(2);
        let points = series_points(&chart.x_labels, &s.points);
        cc.draw_series(LineSeries::new(points.iter().copied(), style))
            .map_err(|e| e.to_string())?;
        cc.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, RGBColor(r, g, b).filled())))
            .map_err(|e| e.to_string())?;
    }

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}
