//! Text formatting for reports and terminal output.
//!
//! We keep formatting code in one place so the workflow code stays free of
//! presentation details and wording changes are localized.

use crate::domain::{ChartDataset, ComparisonRequest, ForecastHorizon, MethodSelection};

/// The two parameter-summary lines printed under the chart.
pub fn summary_lines(methods: &MethodSelection, horizon: ForecastHorizon) -> Vec<String> {
    vec![
        format!("Métodos seleccionados: {}", methods.joined()),
        format!("Número de predicciones futuras: {horizon}"),
    ]
}

/// Format a comparison result for the terminal (headless `compare` command).
pub fn format_comparison_summary(request: &ComparisonRequest, chart: &ChartDataset) -> String {
    let mut out = String::new();

    out.push_str("=== fcmp - method comparison ===\n");
    out.push_str(&format!("Methods: {}\n", request.methods.joined()));
    out.push_str(&format!("Future predictions: {}\n", request.horizon));
    out.push_str(&format!(
        "X axis: n={} | {}\n",
        chart.x_labels.len(),
        fmt_range(chart.x_range())
    ));
    out.push('\n');

    out.push_str(
        format!("{:<34} {:<7} {:>6} {:>12} {:>12}\n", "series", "color", "n", "first", "last").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<34} {:-<7} {:->6} {:->12} {:->12}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for s in &chart.series {
        let first = s.points.first().map(|v| format!("{v:.4}")).unwrap_or_default();
        let last = s.points.last().map(|v| format!("{v:.4}")).unwrap_or_default();
        out.push_str(
            format!(
                "{:<34} {:<7} {:>6} {:>12} {:>12}\n",
                truncate(&s.label, 34),
                s.color.as_str(),
                s.points.len(),
                first,
                last
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_range(range: Option<(f64, f64)>) -> String {
    match range {
        Some((lo, hi)) => format!("[{lo}, {hi}]"),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChartSeries, SeriesColor};

    #[test]
    fn summary_lines_use_wire_ids() {
        let methods = MethodSelection::parse(&["least_squares_linear", "newton"]).unwrap();
        let lines = summary_lines(&methods, ForecastHorizon(3));
        assert_eq!(lines[0], "Métodos seleccionados: least_squares_linear, newton");
        assert_eq!(lines[1], "Número de predicciones futuras: 3");
    }

    #[test]
    fn comparison_summary_lists_every_series() {
        let request = ComparisonRequest {
            methods: MethodSelection::parse(&["lagrange"]).unwrap(),
            horizon: ForecastHorizon(1),
        };
        let chart = ChartDataset {
            x_labels: vec![0.0, 1.0],
            series: vec![ChartSeries {
                label: "Método: lagrange".into(),
                points: vec![1.5, 2.5],
                color: SeriesColor::Blue,
                connect_gaps: false,
            }],
        };
        let out = format_comparison_summary(&request, &chart);
        assert!(out.contains("Methods: lagrange"));
        assert!(out.contains("X axis: n=2 | [0, 1]"));
        let row = out.lines().find(|l| l.starts_with("Método: lagrange")).unwrap();
        assert!(row.contains("blue"));
        assert!(row.ends_with("2.5000"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
