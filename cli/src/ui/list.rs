use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::{magnitude_badge, render_placeholder};
use crate::filter::{ViewFilter, MIN_MAGNITUDE_CEILING, MIN_MAGNITUDE_STEP};
use crate::model::{EventRecord, RefreshState};
use crate::state::DashboardState;

const ROW_HEIGHT: u16 = 2;

/// Sidebar list of the filtered, sorted records plus the filter controls.
pub struct ListView {
    rows_area: Option<Rect>,
    /// Index of the first row in the window.
    offset: usize,
    /// Selected index seen on the last frame.
    last_selected: Option<usize>,
    /// Set by a manual scroll; the window stops following the selection
    /// until the selection moves.
    pinned: bool,
}

impl ListView {
    pub fn new() -> Self {
        Self {
            rows_area: None,
            offset: 0,
            last_selected: None,
            pinned: false,
        }
    }

    /// Scroll the rows window by `delta` rows out of `len`.
    pub fn scroll_by(&mut self, delta: isize, len: usize) {
        self.offset = self.offset.saturating_add_signed(delta).min(len.saturating_sub(1));
        self.pinned = true;
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &DashboardState,
        now: DateTime<Utc>,
        spinner: &str,
    ) {
        self.rows_area = None;

        match state.refresh_state() {
            RefreshState::Loading => {
                render_placeholder(
                    frame,
                    area,
                    "Recent Earthquakes",
                    vec![
                        Line::from(Span::styled(spinner.to_string(), Style::default().fg(Color::Cyan))),
                        Line::from(""),
                        Line::from("Loading earthquakes..."),
                    ],
                );
            }
            RefreshState::Failed(message) => {
                render_placeholder(
                    frame,
                    area,
                    "Recent Earthquakes",
                    vec![
                        Line::from(Span::styled("⚠", Style::default().fg(Color::Red))),
                        Line::from(""),
                        Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
                    ],
                );
            }
            RefreshState::Ready(_) => self.render_ready(frame, area, state, now),
        }
    }

    fn render_ready(&mut self, frame: &mut Frame, area: Rect, state: &DashboardState, now: DateTime<Utc>) {
        let visible = state.visible();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Recent Earthquakes ({}) ", visible.len()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Controls
                Constraint::Min(0),    // Rows
                Constraint::Length(2), // Attribution
            ])
            .split(inner);

        render_controls(frame, chunks[0], state.filter());

        if visible.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from("No earthquakes found"),
                Line::from(Span::styled(
                    "Try adjusting the magnitude filter",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .alignment(ratatui::layout::Alignment::Center);
            frame.render_widget(empty, chunks[1]);
        } else {
            let window = usize::from(chunks[1].height / ROW_HEIGHT).max(1);
            let selected = state.selected_visible_index();
            if selected != self.last_selected {
                self.last_selected = selected;
                self.pinned = false;
            }
            if !self.pinned {
                if let Some(index) = selected {
                    if index < self.offset {
                        self.offset = index;
                    } else if index >= self.offset + window {
                        self.offset = index + 1 - window;
                    }
                }
            }
            self.offset = self.offset.min(visible.len() - 1);

            let rows: Vec<Row> = visible[self.offset..]
                .iter()
                .map(|record| record_row(record, now))
                .collect();
            let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(10)])
                .highlight_style(Style::default().bg(Color::Rgb(0x1e, 0x3a, 0x8a)))
                .highlight_symbol("▍");

            let mut table_state = TableState::default();
            table_state.select(
                selected
                    .and_then(|index| index.checked_sub(self.offset))
                    .filter(|index| *index < window),
            );
            frame.render_stateful_widget(table, chunks[1], &mut table_state);
            self.rows_area = Some(chunks[1]);
        }

        let footer = Paragraph::new(vec![
            Line::from(Span::styled("Data from USGS", Style::default().fg(Color::DarkGray))),
            Line::from(Span::styled("Updates every 5 minutes", Style::default().fg(Color::DarkGray))),
        ])
        .alignment(ratatui::layout::Alignment::Center);
        frame.render_widget(footer, chunks[2]);
    }

    /// Record under a mouse click, given the list it was rendered from.
    pub fn row_at<'r>(&self, column: u16, row: u16, visible: &'r [EventRecord]) -> Option<&'r EventRecord> {
        let area = self.rows_area?;
        if column < area.x || column >= area.x + area.width || row < area.y || row >= area.y + area.height {
            return None;
        }
        let index = self.offset + ((row - area.y) / ROW_HEIGHT) as usize;
        visible.get(index)
    }
}

fn render_controls(frame: &mut Frame, area: Rect, filter: &ViewFilter) {
    let steps = (MIN_MAGNITUDE_CEILING / MIN_MAGNITUDE_STEP) as usize;
    let filled = (filter.min_magnitude / MIN_MAGNITUDE_STEP).round() as usize;
    let slider = format!("{}{}", "━".repeat(filled), "─".repeat(steps.saturating_sub(filled)));

    let lines = vec![
        Line::from(vec![
            Span::styled("Minimum Magnitude: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", filter.min_magnitude),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  [-/+]", Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("0 "),
            Span::styled(slider, Style::default().fg(Color::Cyan)),
            Span::raw(" 8"),
        ]),
        Line::from(vec![
            Span::styled("Sort by: ", Style::default().fg(Color::Gray)),
            Span::styled(
                filter.sort_key.label(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  [s]", Style::default().fg(Color::Yellow)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn record_row(record: &EventRecord, now: DateTime<Utc>) -> Row<'static> {
    let category = record.category();

    let badge = Text::from(vec![
        Line::from(magnitude_badge(record)),
        Line::from(Span::styled(category.label(), Style::default().fg(category.color()))),
    ]);

    let details = Text::from(vec![
        Line::from(Span::styled(
            record.place_label().to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} · {} · {}",
                relative_time(record.time_epoch_millis, now),
                record.depth_label(),
                record.coordinates_label()
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    Row::new(vec![Cell::from(badge), Cell::from(details)]).height(ROW_HEIGHT)
}

/// Age of an event relative to `now`: minutes under an hour, whole hours
/// under a day, then the local calendar date. Future timestamps count as 0m.
pub fn relative_time(time_epoch_millis: i64, now: DateTime<Utc>) -> String {
    let elapsed_minutes = (now.timestamp_millis() - time_epoch_millis).max(0) / 60_000;

    if elapsed_minutes < 60 {
        format!("{}m ago", elapsed_minutes)
    } else if elapsed_minutes < 24 * 60 {
        format!("{}h ago", elapsed_minutes / 60)
    } else {
        match Utc.timestamp_millis_opt(time_epoch_millis).single() {
            Some(at) => at.with_timezone(&Local).format("%x").to_string(),
            None => "N/A".to_string(),
        }
    }
}
