//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ```text
//! ┌ Machines ───────┐┌ Mazak H 500 (#1) ─────────────────────┐
//! │▸ ● Mazak H 500  ││ Status        Running                 │
//! │  ○ LT 500       ││ Total Power   12.34 W                 │
//! │                 ││ ...                                   │
//! └─────────────────┘└───────────────────────────────────────┘
//!  Live  updated 14:02:11  q: quit  ↑/↓: machine  r: refresh
//! ```
//!
//! Colours for statuses come from [`crate::presentation`]; nothing here
//! decides what a status means.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::presentation::{fetch_status_presentation, status_presentation, LEGEND};
use crate::source::METRICS;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
    let [list_area, panel_area] =
        Layout::horizontal([Constraint::Length(28), Constraint::Min(1)]).areas(main_area);

    draw_machine_list(app, frame, list_area);
    draw_telemetry_panel(app, frame, panel_area);
    draw_status_bar(app, frame, status_area);
}

/// Render the selectable machine list.
fn draw_machine_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .machines
        .iter()
        .map(|machine| {
            let dot = match app.telemetry_for(machine.id) {
                Some(_) => Span::styled(
                    "● ",
                    Style::default().fg(status_presentation(app.machine_status(machine.id)).color),
                ),
                None => Span::styled("○ ", Style::default().fg(Color::DarkGray)),
            };
            ListItem::new(Line::from(vec![
                dot,
                Span::styled(&machine.name, Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let list = List::new(list_items)
        .block(Block::default().title(" Machines ").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the readings of the selected machine.
fn draw_telemetry_panel(app: &App, frame: &mut Frame, area: Rect) {
    let title = match app.selected_machine() {
        Some(m) => format!(" {} (#{}) ", m.name, m.id),
        None => " No machine ".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let Some(id) = app.selected_id() else {
        frame.render_widget(Paragraph::new("No machines configured").block(block), area);
        return;
    };
    let Some(state) = app.telemetry_for(id) else {
        frame.render_widget(Paragraph::new("Waiting for poller…").block(block), area);
        return;
    };
    if state.loading {
        let line = Line::from(Span::styled("Loading…", Style::default().fg(Color::Yellow)));
        frame.render_widget(Paragraph::new(line).block(block), area);
        return;
    }

    let status = status_presentation(app.machine_status(id));
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:<20}", "Status"), Style::default().fg(Color::DarkGray)),
        Span::styled(status.label, Style::default().fg(status.color).add_modifier(Modifier::BOLD)),
    ])];

    if let Some(error) = &state.error {
        lines.push(Line::from(Span::styled(
            format!("{:<20}{error}", "Error"),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::raw(""));

    // Values stay visible alongside an error; they are the last good reading.
    let reading = state.data.as_ref();
    lines.extend(METRICS.iter().map(|metric| {
        Line::from(vec![
            Span::styled(format!("{:<20}", metric.label), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{:>12}", metric.format(reading)),
                Style::default().fg(Color::White),
            ),
            Span::raw(" "),
            Span::styled(metric.unit, Style::default().fg(Color::Cyan)),
        ])
    }));

    lines.push(Line::raw(""));
    let mut legend = vec![Span::raw("Legend: ")];
    for status in LEGEND {
        let p = status_presentation(status);
        legend.push(Span::styled("● ", Style::default().fg(p.color)));
        legend.push(Span::raw(format!("{}  ", p.label)));
    }
    lines.push(Line::from(legend));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let fetch = fetch_status_presentation(app.telemetry.status, app.telemetry.loading);
    let updated = app
        .telemetry
        .last_updated
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("updated %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "never updated".into());

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(fetch.label, Style::default().fg(fetch.color)),
        Span::raw("  "),
        Span::styled(updated, Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(&app.endpoint, Style::default().fg(Color::DarkGray)),
        Span::raw("  q: quit  ↑/↓: machine  r: refresh"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
