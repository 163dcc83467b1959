//! Ratatui-based terminal UI.
//!
//! The TUI mirrors the comparison form: a dataset path with an upload action,
//! an ordered method picker, the forecast horizon, a compare action and a PDF
//! export once a chart is on screen. Network calls run on worker threads; the
//! UI thread is the only writer of the `WorkflowState`.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::domain::{ChartDataset, DatasetRef, Method, SessionConfig};
use crate::error::{AppError, WorkflowError};
use crate::render::{BitmapChartRenderer, chart_bounds, series_points};
use crate::report::{PdfReportEncoder, write_report};
use crate::service::HttpPredictionService;
use crate::workflow::{ComparisonStatus, NoticeLevel, UploadStatus, WorkflowState};

mod plotters_chart;
pub mod worker;

use plotters_chart::{ChartLine, ComparisonPlottersChart};
use worker::{Job, Worker};

/// Start the TUI.
pub fn run(config: SessionConfig) -> Result<(), AppError> {
    let service = HttpPredictionService::from_config(&config).map_err(WorkflowError::from)?;
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, Worker::new(service));
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Dataset,
    Methods,
    Horizon,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Dataset => Field::Methods,
            Field::Methods => Field::Horizon,
            Field::Horizon => Field::Dataset,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Dataset => Field::Horizon,
            Field::Methods => Field::Dataset,
            Field::Horizon => Field::Methods,
        }
    }
}

struct App {
    config: SessionConfig,
    state: WorkflowState,
    worker: Worker<HttpPredictionService>,
    renderer: BitmapChartRenderer,
    encoder: PdfReportEncoder,

    focus: Field,
    editing: bool,
    dataset_input: String,
    method_cursor: usize,
}

impl App {
    fn new(config: SessionConfig, worker: Worker<HttpPredictionService>) -> Self {
        let state = WorkflowState::from_config(&config);
        let dataset_input = String::new();
        Self {
            config,
            state,
            worker,
            renderer: BitmapChartRenderer::default(),
            encoder: PdfReportEncoder::default(),
            focus: Field::Dataset,
            editing: false,
            dataset_input,
            method_cursor: 0,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            while let Some(result) = self.worker.try_recv() {
                result.apply(&mut self.state);
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing {
            self.handle_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Up if self.focus == Field::Methods => {
                self.method_cursor = self.method_cursor.saturating_sub(1);
            }
            KeyCode::Down if self.focus == Field::Methods => {
                if self.method_cursor + 1 < Method::ALL.len() {
                    self.method_cursor += 1;
                }
            }
            KeyCode::Char(' ') if self.focus == Field::Methods => {
                let method = Method::ALL[self.method_cursor];
                self.state.methods_mut().toggle(method);
            }
            KeyCode::Enter => match self.focus {
                Field::Dataset | Field::Horizon => self.editing = true,
                Field::Methods => {
                    let method = Method::ALL[self.method_cursor];
                    self.state.methods_mut().toggle(method);
                }
            },
            KeyCode::Char('u') => self.start_upload(),
            KeyCode::Char('c') => self.start_comparison(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn handle_edit(&mut self, code: KeyCode) {
        match (self.focus, code) {
            (_, KeyCode::Esc) | (Field::Methods, _) => self.editing = false,
            (Field::Dataset, KeyCode::Enter) => {
                self.editing = false;
                let trimmed = self.dataset_input.trim();
                if !trimmed.is_empty() {
                    self.state.select_dataset(DatasetRef::new(trimmed));
                }
            }
            (Field::Dataset, KeyCode::Backspace) => {
                self.dataset_input.pop();
            }
            (Field::Dataset, KeyCode::Char(c)) => self.dataset_input.push(c),
            (Field::Horizon, KeyCode::Enter) => self.editing = false,
            (Field::Horizon, KeyCode::Backspace) => {
                let mut raw = self.state.horizon_input().to_string();
                raw.pop();
                self.state.set_horizon(raw);
            }
            (Field::Horizon, KeyCode::Char(c)) => {
                let mut raw = self.state.horizon_input().to_string();
                raw.push(c);
                self.state.set_horizon(raw);
            }
            _ => {}
        }
    }

    fn start_upload(&mut self) {
        // Precondition failures are already recorded as a notice by the state machine.
        if let Ok(pending) = self.state.begin_upload() {
            self.worker.submit(Job::Upload(pending));
        }
    }

    fn start_comparison(&mut self) {
        if let Ok(pending) = self.state.begin_comparison() {
            self.worker.submit(Job::Compare(pending));
        }
    }

    fn export(&mut self) {
        let Ok(doc) = self.state.export_report(&self.renderer, &self.config.report_title) else {
            return;
        };
        let path = self.config.report_path.clone();
        match write_report(&self.encoder, &doc, &path) {
            Ok(()) => self.state.set_notice_info(format!("Reporte guardado en {}", path.display())),
            Err(err) => self.state.set_notice_error(err.to_string()),
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let upload = match self.state.upload_status() {
            UploadStatus::Empty => "no file".to_string(),
            UploadStatus::FileChosen => "file chosen".to_string(),
            UploadStatus::Uploading => "uploading…".to_string(),
            UploadStatus::Uploaded { .. } => "uploaded".to_string(),
            UploadStatus::UploadFailed { .. } => "upload failed".to_string(),
        };
        let comparison = match self.state.comparison_status() {
            ComparisonStatus::Idle => "idle",
            ComparisonStatus::Comparing => "comparing…",
            ComparisonStatus::Compared => "compared",
            ComparisonStatus::CompareFailed { .. } => "compare failed",
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("fcmp", Style::default().fg(Color::Cyan)),
                Span::raw(" - Predicción de Consumo Energético"),
            ]),
            Line::from(Span::styled(
                format!(
                    "server: {} | upload: {upload} | comparison: {comparison}",
                    self.config.server_url
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(0)])
            .split(area);

        self.draw_form(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(7), Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let dataset_text = if self.editing && self.focus == Field::Dataset {
            format!("{}▏", self.dataset_input)
        } else {
            self.state
                .dataset()
                .map(|d| d.name().to_string())
                .unwrap_or_else(|| "(Enter to type a CSV path)".to_string())
        };
        frame.render_widget(
            Paragraph::new(dataset_text).block(self.field_block("Archivo", Field::Dataset)),
            chunks[0],
        );

        let items: Vec<ListItem> = Method::ALL
            .iter()
            .map(|&m| {
                let marker = match self.state.methods().position(m) {
                    Some(i) => format!("[{}]", i + 1),
                    None => "[ ]".to_string(),
                };
                ListItem::new(format!("{marker} {}", m.display_name()))
            })
            .collect();
        let list = List::new(items)
            .block(self.field_block("Métodos (Space: toggle, order = color)", Field::Methods))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut list_state = ratatui::widgets::ListState::default();
        if self.focus == Field::Methods {
            list_state.select(Some(self.method_cursor));
        }
        frame.render_stateful_widget(list, chunks[1], &mut list_state);

        let horizon = self.state.horizon_input();
        let horizon_text = if self.editing && self.focus == Field::Horizon {
            format!("{horizon}▏")
        } else {
            horizon.to_string()
        };
        let horizon_style = match self.state.horizon_error() {
            Some(_) => Style::default().fg(Color::Red),
            None => Style::default(),
        };
        frame.render_widget(
            Paragraph::new(horizon_text)
                .style(horizon_style)
                .block(self.field_block("Número de Predicciones Futuras", Field::Horizon)),
            chunks[2],
        );

        self.draw_legend(frame, chunks[3]);
    }

    fn field_block(&self, title: &str, field: Field) -> Block<'static> {
        let style = match (self.focus == field, self.editing) {
            (true, true) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(Color::Cyan),
            _ => Style::default(),
        };
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(style)
    }

    fn draw_legend(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Series").borders(Borders::ALL);
        let Some(chart) = self.state.chart() else {
            frame.render_widget(Paragraph::new("-").block(block), area);
            return;
        };

        let lines: Vec<Line> = chart
            .series
            .iter()
            .map(|s| {
                let (r, g, b) = s.color.rgb();
                Line::from(vec![
                    Span::styled("━━ ", Style::default().fg(Color::Rgb(r, g, b))),
                    Span::raw(s.label.clone()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Comparación de Métodos").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(chart) = self.state.chart() else {
            let msg = if self.state.is_comparing() {
                "Comparing…"
            } else {
                "Select methods and press c to compare."
            };
            frame.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Yellow)), inner);
            return;
        };

        let (points, x_bounds, y_bounds) = chart_lines(chart);
        let lines: Vec<ChartLine> = points
            .iter()
            .zip(&chart.series)
            .map(|(pts, s)| ChartLine {
                points: pts,
                rgb: s.color.rgb(),
            })
            .collect();

        let plot = plot_area(inner);
        frame.render_widget(
            ComparisonPlottersChart {
                lines: &lines,
                x_bounds,
                y_bounds,
            },
            plot.unwrap_or(inner),
        );
        if let Some(plot) = plot {
            draw_axes(frame, inner, plot, x_bounds, y_bounds);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = if self.editing {
            "typing… Enter apply  Esc cancel"
        } else if self.state.can_export() {
            "Tab field  Enter edit  u upload  c compare  e export PDF  q quit"
        } else {
            "Tab field  Enter edit  u upload  c compare  q quit"
        };

        let mut spans = vec![Span::styled(help, Style::default().fg(Color::Gray))];
        if let Some(notice) = self.state.notice() {
            let color = match notice.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Warning => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            };
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(notice.text.as_str(), Style::default().fg(color)));
        }

        let p = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Per-series `(x, y)` points plus shared bounds.
fn chart_lines(chart: &ChartDataset) -> (Vec<Vec<(f64, f64)>>, [f64; 2], [f64; 2]) {
    let points = chart
        .series
        .iter()
        .map(|s| series_points(&chart.x_labels, &s.points))
        .collect();
    let (x_bounds, y_bounds) = chart_bounds(chart);
    (points, x_bounds, y_bounds)
}

/// Columns left of the plot for y ticks; rows below it for x ticks and the x title.
const Y_GUTTER: u16 = 8;
const X_GUTTER: u16 = 2;
const TICKS: usize = 5;

const X_TITLE: &str = "período";
const Y_TITLE: &str = "valor";

/// Plot rectangle inside `inner`, or `None` when there is no room for axis text.
fn plot_area(inner: Rect) -> Option<Rect> {
    if inner.width <= Y_GUTTER + 12 || inner.height <= X_GUTTER + 6 {
        return None;
    }
    Some(Rect {
        x: inner.x + Y_GUTTER,
        y: inner.y + 1,
        width: inner.width - Y_GUTTER - 2,
        height: inner.height - 1 - X_GUTTER,
    })
}

/// One piece of axis text at a terminal cell.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AxisText {
    x: u16,
    y: u16,
    text: String,
}

/// Tick values and axis titles laid out around `plot`.
fn axis_texts(inner: Rect, plot: Rect, x_bounds: [f64; 2], y_bounds: [f64; 2]) -> Vec<AxisText> {
    let mut out = Vec::with_capacity(2 * TICKS + 2);
    let step = |i: usize| i as f64 / (TICKS - 1) as f64;
    let last_col = plot.width.saturating_sub(1);
    let last_row = plot.height.saturating_sub(1);

    // Period ticks centered under the plot's bottom edge.
    for i in 0..TICKS {
        let text = fmt_tick(x_bounds[0] + step(i) * (x_bounds[1] - x_bounds[0]));
        let col = plot.x + (f64::from(last_col) * step(i)).round() as u16;
        let half = (text.chars().count() / 2) as u16;
        out.push(AxisText {
            x: col.saturating_sub(half).max(inner.x),
            y: plot.y + plot.height,
            text,
        });
    }

    // Value ticks right-aligned against the gutter, bottom to top.
    for i in 0..TICKS {
        let text = fmt_tick(y_bounds[0] + step(i) * (y_bounds[1] - y_bounds[0]));
        let width = text.chars().count() as u16;
        let row = plot.y + last_row - (f64::from(last_row) * step(i)).round() as u16;
        if width >= Y_GUTTER {
            continue;
        }
        out.push(AxisText {
            x: plot.x - 1 - width,
            y: row,
            text,
        });
    }

    let title_width = X_TITLE.chars().count() as u16;
    out.push(AxisText {
        x: plot.x + plot.width.saturating_sub(title_width) / 2,
        y: plot.y + plot.height + 1,
        text: X_TITLE.to_string(),
    });
    out.push(AxisText {
        x: inner.x,
        y: inner.y,
        text: Y_TITLE.to_string(),
    });
    out
}

fn draw_axes(frame: &mut ratatui::Frame<'_>, inner: Rect, plot: Rect, x_bounds: [f64; 2], y_bounds: [f64; 2]) {
    let style = Style::default().fg(Color::Gray);
    let right = inner.x + inner.width;
    let bottom = inner.y + inner.height;
    for item in axis_texts(inner, plot, x_bounds, y_bounds) {
        if item.y >= bottom || item.x >= right {
            continue;
        }
        let width = (item.text.chars().count() as u16).min(right - item.x);
        frame.render_widget(
            Paragraph::new(item.text).style(style),
            Rect::new(item.x, item.y, width, 1),
        );
    }
}

fn fmt_tick(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
