//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! The layout is the terminal version of a floating widget: a help bar at
//! the bottom of the screen and, when open, a centered overlay panel with a
//! body and a one-line footer.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::engine::{Delivery, Mode, StreamStatus};
use crate::source::EarthView;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [_, help_area] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)])
        .areas(frame.area());
    draw_help_bar(app, frame, help_area);

    if app.visible {
        draw_overlay(app, frame, centered(frame.area(), 70, 60));
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn draw_overlay(app: &App, frame: &mut Frame, area: Rect) {
    let title = match app.mode {
        Mode::Image => " NASA EPIC ",
        Mode::Stream => " Earth Live ",
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let [body_area, footer_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    let body = if let Some(report) = &app.error {
        vec![
            Line::from(Span::styled(
                report.reason(),
                Style::default().fg(Color::Red),
            )),
            Line::raw(""),
            Line::from(Span::styled(
                "Press r to retry",
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ]
    } else {
        match &app.delivery {
            Some(Delivery::Image(views)) => match views.first() {
                Some(view) => image_lines(view),
                None => vec![Line::raw("No images")],
            },
            Some(Delivery::Stream(status)) => stream_lines(status),
            None => vec![Line::from(Span::styled(
                "Loading…",
                Style::default().fg(Color::DarkGray),
            ))],
        }
    };
    frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: true }), body_area);

    let footer = Paragraph::new(Line::from(Span::styled(
        &app.status,
        Style::default().fg(Color::Yellow),
    )));
    frame.render_widget(footer, footer_area);
}

fn image_lines(view: &EarthView) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Captured  ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                view.captured_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                Style::default().fg(Color::White),
            ),
        ]),
    ];
    if let Some(centroid) = view.centroid {
        lines.push(Line::from(vec![
            Span::styled("Centroid  ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{:.2}, {:.2}", centroid.lat, centroid.lon)),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Image     ", Style::default().fg(Color::DarkGray)),
        Span::styled(view.image_url(), Style::default().fg(Color::Cyan)),
    ]));
    if !view.caption.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::raw(view.caption.clone()));
    }
    lines
}

fn stream_lines(status: &StreamStatus) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled("Stream    ", Style::default().fg(Color::DarkGray)),
            Span::styled(status.label.clone(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Source    ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("https://www.youtube.com/watch?v={}", status.source_id),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ]
}

/// Render the bottom help bar.
fn draw_help_bar(app: &App, frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", app.mode), Style::default().fg(Color::Green)),
        Span::raw(" Space: show/hide  r: retry  q: quit"),
    ]));
    frame.render_widget(help, area);
}
