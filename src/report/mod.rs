//! Report composition: rendered chart + run parameters → one-page document.
//!
//! The layout is fixed (A4 portrait, millimetres, origin top-left) so the same
//! inputs always produce the same document. Encoding to bytes is a separate
//! step (`pdf`).

use crate::domain::{ChartDataset, ForecastHorizon, MethodSelection, SeriesColor};
use crate::error::WorkflowError;
use crate::render::RenderedChart;

pub mod format;
pub mod pdf;

pub use format::*;
pub use pdf::{PdfReportEncoder, ReportEncoder, write_report};

/// Page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

pub const A4: PageSize = PageSize {
    width_mm: 210.0,
    height_mm: 297.0,
};

pub const TITLE_FONT_PT: f64 = 18.0;
pub const BODY_FONT_PT: f64 = 12.0;
pub const TITLE_POS_MM: (f64, f64) = (20.0, 20.0);
/// Image slot: top-left corner and size.
pub const IMAGE_RECT_MM: (f64, f64, f64, f64) = (15.0, 40.0, 180.0, 160.0);
pub const SUMMARY_POS_MM: (f64, f64) = (20.0, 220.0);
pub const SUMMARY_LINE_STEP_MM: f64 = 10.0;

/// Legend grid under the image: two columns, filled row by row.
pub const LEGEND_FONT_PT: f64 = 9.0;
pub const LEGEND_POS_MM: (f64, f64) = (20.0, 205.0);
pub const LEGEND_COLUMN_STEP_MM: f64 = 90.0;
pub const LEGEND_ROW_STEP_MM: f64 = 5.0;
pub const LEGEND_COLUMNS: usize = 2;
/// Color swatch size; the label starts after the swatch plus a gap.
pub const LEGEND_SWATCH_MM: (f64, f64) = (6.0, 3.0);
pub const LEGEND_LABEL_OFFSET_MM: f64 = 8.0;

/// A positioned element on the page.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportSection {
    /// Single line of text; `y_mm` is the baseline.
    Text {
        x_mm: f64,
        y_mm: f64,
        font_pt: f64,
        text: String,
    },
    /// The chart image, stretched to the given box.
    Image {
        x_mm: f64,
        y_mm: f64,
        width_mm: f64,
        height_mm: f64,
    },
    /// Filled rectangle; `y_mm` is the top edge.
    Swatch {
        x_mm: f64,
        y_mm: f64,
        width_mm: f64,
        height_mm: f64,
        rgb: (u8, u8, u8),
    },
}

/// One legend row: a series label and its line color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: String,
    pub color: SeriesColor,
}

/// Legend entries for every series of `chart`, in series order.
pub fn legend_entries(chart: &ChartDataset) -> Vec<LegendEntry> {
    chart
        .series
        .iter()
        .map(|s| LegendEntry {
            label: s.label.clone(),
            color: s.color,
        })
        .collect()
}

/// Finished report, ready for an encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub image: RenderedChart,
    /// Summary lines joined with `\n`.
    pub parameter_summary: String,
    pub page_size: PageSize,
    pub sections: Vec<ReportSection>,
}

/// Compose the report for a rendered chart.
///
/// The rendered image carries no text, so the series legend is laid out on
/// the page. Fails with `RenderUnavailable` when there is no chart to show.
pub fn compose_report(
    rendered: Option<&RenderedChart>,
    legend: &[LegendEntry],
    methods: &MethodSelection,
    horizon: ForecastHorizon,
    title: &str,
) -> Result<ReportDocument, WorkflowError> {
    let image = rendered.ok_or(WorkflowError::RenderUnavailable)?.clone();

    let summary = summary_lines(methods, horizon);
    let mut sections = Vec::with_capacity(2 + 2 * legend.len() + summary.len());
    sections.push(ReportSection::Text {
        x_mm: TITLE_POS_MM.0,
        y_mm: TITLE_POS_MM.1,
        font_pt: TITLE_FONT_PT,
        text: title.to_string(),
    });
    let (x, y, w, h) = IMAGE_RECT_MM;
    sections.push(ReportSection::Image {
        x_mm: x,
        y_mm: y,
        width_mm: w,
        height_mm: h,
    });
    for (i, entry) in legend.iter().enumerate() {
        let x = LEGEND_POS_MM.0 + LEGEND_COLUMN_STEP_MM * (i % LEGEND_COLUMNS) as f64;
        let y = LEGEND_POS_MM.1 + LEGEND_ROW_STEP_MM * (i / LEGEND_COLUMNS) as f64;
        let (sw, sh) = LEGEND_SWATCH_MM;
        sections.push(ReportSection::Swatch {
            x_mm: x,
            y_mm: y - sh,
            width_mm: sw,
            height_mm: sh,
            rgb: entry.color.rgb(),
        });
        sections.push(ReportSection::Text {
            x_mm: x + LEGEND_LABEL_OFFSET_MM,
            y_mm: y,
            font_pt: LEGEND_FONT_PT,
            text: entry.label.clone(),
        });
    }
    for (i, line) in summary.iter().enumerate() {
        sections.push(ReportSection::Text {
            x_mm: SUMMARY_POS_MM.0,
            y_mm: SUMMARY_POS_MM.1 + SUMMARY_LINE_STEP_MM * i as f64,
            font_pt: BODY_FONT_PT,
            text: line.clone(),
        });
    }

    Ok(ReportDocument {
        title: title.to_string(),
        image,
        parameter_summary: summary.join("\n"),
        page_size: A4,
        sections,
    })
}
