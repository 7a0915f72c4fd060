use std::collections::VecDeque;

use core_sim::{MetricScope, MetricTable, SimulationStatus};
use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use sim_proto::{Sentiment, SimulationEvent};

use crate::controller::RunController;

pub struct UiState {
    pub logs: VecDeque<String>,
    pub max_logs: usize,
    pub max_metric_rows: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logs: VecDeque::new(),
            max_logs: 8,
            max_metric_rows: 12,
        }
    }
}

impl UiState {
    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }
}

pub fn draw_ui(frame: &mut Frame, controller: &RunController, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(10),
            Constraint::Length(3),
        ])
        .split(frame.size());
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[2]);

    draw_header(frame, rows[0], controller);
    draw_events(frame, middle[0], controller);
    draw_focus(frame, middle[1], controller);
    draw_metrics(frame, bottom[0], controller, state);
    draw_logs(frame, bottom[1], state);
    draw_commands(frame, rows[3]);
}

fn framed(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(
        paragraph,
        area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
    );
}

fn status_span(status: SimulationStatus) -> Span<'static> {
    match status {
        SimulationStatus::Idle => Span::styled("idle", Style::default().fg(Color::Gray)),
        SimulationStatus::Loading => Span::styled("loading", Style::default().fg(Color::Yellow)),
        SimulationStatus::Complete => Span::styled("complete", Style::default().fg(Color::Green)),
    }
}

fn draw_header(frame: &mut Frame, area: Rect, controller: &RunController) {
    let session = controller.session();
    let mut first = vec![
        status_span(session.status()),
        Span::raw(format!(" | run {}", controller.current_run())),
        Span::raw(format!(" | {} events", session.events().len())),
        Span::raw(format!(
            " | {}/{} zones selected",
            session.selection().len(),
            controller.directory().len()
        )),
    ];
    if let Some(count) = session.zones_analyzing() {
        first.push(Span::raw(format!(" | analyzing {count} zones")));
    }
    let second = match (session.summary(), session.progress_message()) {
        (Some(summary), _) => Line::from(Span::styled(
            summary.to_string(),
            Style::default().fg(Color::Green),
        )),
        (None, Some(progress)) => Line::from(Span::raw(progress.to_string())),
        (None, None) => Line::from(Span::raw(format!("prompt: {}", session.prompt()))),
    };
    framed(
        frame,
        area,
        "Policy Simulation Inspector",
        vec![Line::from(first), second],
    );
}

fn draw_events(frame: &mut Frame, area: Rect, controller: &RunController) {
    let session = controller.session();
    let focused = session.focused_id();
    let lines = session
        .events()
        .iter()
        .map(|event| {
            let style = if Some(event.id.as_str()) == focused {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(
                    format!("{:<14}", event.category.as_str()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{} ", event.owning_zone()),
                    Style::default().fg(Color::Magenta),
                ),
                Span::styled(event.title.clone(), style),
            ])
        })
        .collect();
    framed(frame, area, "Events", lines);
}

fn sentiment_color(sentiment: Sentiment) -> Color {
    match sentiment {
        Sentiment::Positive => Color::Green,
        Sentiment::Neutral => Color::Gray,
        Sentiment::Negative => Color::Red,
    }
}

fn focus_lines(event: &SimulationEvent, marker: Option<(f64, f64)>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            event.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "severity {:.2} | positivity {:+.2}",
            event.severity, event.positivity
        )),
    ];
    if let Some((x, y)) = marker {
        lines.push(Line::from(format!("marker lon {x:.5} lat {y:.5}")));
    }
    lines.push(Line::from(event.description.clone()));
    lines.push(Line::from(""));
    lines.extend(event.comments.iter().map(|comment| {
        Line::from(vec![
            Span::styled(
                format!("{}: ", comment.author),
                Style::default().fg(sentiment_color(comment.sentiment)),
            ),
            Span::raw(comment.message.clone()),
        ])
    }));
    lines
}

fn draw_focus(frame: &mut Frame, area: Rect, controller: &RunController) {
    let lines = match controller.session().focused_event() {
        Some(event) => focus_lines(
            event,
            controller.focused_marker().map(|point| (point.x, point.y)),
        ),
        None => vec![Line::from("j/k to focus an event")],
    };
    framed(frame, area, "Focused Event", lines);
}

fn metric_lines(table: &MetricTable, limit: usize) -> Vec<Line<'static>> {
    table
        .iter()
        .take(limit)
        .map(|(field, metric)| {
            let value = metric.value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
            let mut spans = vec![Span::raw(format!("{field:<24} {value:>10}"))];
            if let Some(delta) = metric.delta {
                let color = if delta >= 0.0 { Color::Green } else { Color::Red };
                spans.push(Span::styled(format!(" {delta:+.2}"), Style::default().fg(color)));
            }
            Line::from(spans)
        })
        .collect()
}

fn draw_metrics(frame: &mut Frame, area: Rect, controller: &RunController, state: &UiState) {
    let session = controller.session();
    let (title, scope) = match session.focused_event() {
        Some(event) => (
            format!("Metrics: {}", event.owning_zone()),
            MetricScope::zone(event.owning_zone()),
        ),
        None => ("Metrics: city".to_string(), MetricScope::CityWide),
    };
    let lines = session
        .metrics()
        .table(&scope)
        .map(|table| metric_lines(table, state.max_metric_rows))
        .unwrap_or_default();
    framed(frame, area, &title, lines);
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let lines = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry.clone())))
        .collect();
    framed(frame, area, "Logs", lines);
}

fn draw_commands(frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let line = Line::from(vec![
        key("n"),
        Span::raw(" run  "),
        key("j/k"),
        Span::raw(" focus  "),
        key("c"),
        Span::raw(" ask reactions  "),
        key("esc"),
        Span::raw(" unfocus  "),
        key("r"),
        Span::raw(" reset  "),
        key("q"),
        Span::raw(" exit"),
    ]);
    framed(frame, area, "Commands", vec![line]);
}
