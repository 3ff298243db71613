use anyhow::Result;
use chrono::{Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::api::FeedClient;
use crate::events::{Action, AppEvent};
use crate::filter::SortKey;
use crate::model::{MagnitudeCategory, RefreshState};
use crate::scheduler::{RefreshScheduler, REFRESH_INTERVAL};
use crate::state::DashboardState;
use crate::ui::map::PAN_STEP;
use crate::ui::{spinner_frame, CanvasSurface, ListView, MapView};

const SIDEBAR_WIDTH: u16 = 56;

/// Top-level coordinator: owns the shared dashboard state, both surfaces and
/// the refresh scheduler, and is the only place state gets mutated.
pub struct App {
    feed: Arc<FeedClient>,
    state: DashboardState,
    map_view: MapView<CanvasSurface>,
    list_view: ListView,
    scheduler: Option<RefreshScheduler>,
    started_at: Instant,
    map_area: Rect,
    sidebar_area: Option<Rect>,
    show_sidebar: bool,
    show_help: bool,
    help_scroll: u16,
    should_quit: bool,
    frame_count: u64,
}

impl App {
    pub fn new(feed: FeedClient) -> Self {
        Self {
            feed: Arc::new(feed),
            state: DashboardState::default(),
            map_view: MapView::new(CanvasSurface::default()),
            list_view: ListView::new(),
            scheduler: None,
            started_at: Instant::now(),
            map_area: Rect::default(),
            sidebar_area: None,
            show_sidebar: true,
            show_help: false,
            help_scroll: 0,
            should_quit: false,
            frame_count: 0,
        }
    }

    pub async fn run(&mut self, terminal: &mut ratatui::Terminal<impl ratatui::backend::Backend>) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

        // First cycle fires immediately, then every REFRESH_INTERVAL.
        self.scheduler = Some(RefreshScheduler::start(self.feed.clone(), REFRESH_INTERVAL, event_tx));
        self.started_at = Instant::now();

        loop {
            self.draw_frame(terminal, &mut event_rx)?;

            let timeout = Duration::from_millis(50);
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = self.action_for_key(key.code) {
                            self.apply(action);
                        }
                    }
                    Event::Mouse(mouse) => {
                        if let Some(action) = self.action_for_mouse(mouse) {
                            self.apply(action);
                        }
                    }
                    Event::Resize(width, height) => {
                        tracing::debug!(width, height, "terminal resized");
                        self.map_view.invalidate_layout();
                    }
                    _ => {}
                }
            }

            if self.should_quit {
                break;
            }
        }

        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop();
        }

        Ok(())
    }

    /// Fold in pending refresh results, then draw. Input read after this
    /// call is hit-tested against exactly what is on screen.
    fn draw_frame(
        &mut self,
        terminal: &mut ratatui::Terminal<impl ratatui::backend::Backend>,
        event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    ) -> Result<()> {
        while let Ok(event) = event_rx.try_recv() {
            self.handle_app_event(event);
        }

        self.map_view.surface_mut().tick();
        self.frame_count = self.frame_count.wrapping_add(1);

        terminal.draw(|frame| self.render(frame))?;
        Ok(())
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RefreshStarted => {
                tracing::debug!("refresh started");
                self.state.begin_refresh();
            }
            AppEvent::RefreshFinished(state) => {
                if let RefreshState::Failed(message) = &state {
                    tracing::warn!(%message, "refresh finished with error");
                }
                self.state.finish_refresh(state);
            }
        }
    }

    fn action_for_key(&self, key: KeyCode) -> Option<Action> {
        if self.show_help {
            return match key {
                KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('?') => Some(Action::CloseHelp),
                KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollHelp(-1)),
                KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollHelp(1)),
                _ => None,
            };
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            KeyCode::Char('h') | KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Retry),
            KeyCode::Char('b') | KeyCode::Char('B') => Some(Action::ToggleSidebar),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPreviousInList),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNextInList),
            KeyCode::Left => Some(Action::SelectPreviousOnMap),
            KeyCode::Right => Some(Action::SelectNextOnMap),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::RaiseMinMagnitude),
            KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::LowerMinMagnitude),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::CycleSortKey),
            KeyCode::Char('1') => Some(Action::SetSortKey(SortKey::Time)),
            KeyCode::Char('2') => Some(Action::SetSortKey(SortKey::Magnitude)),
            KeyCode::Char('3') => Some(Action::SetSortKey(SortKey::Depth)),
            KeyCode::Char('z') => Some(Action::ZoomMap(1.0)),
            KeyCode::Char('Z') | KeyCode::Char('x') => Some(Action::ZoomMap(-1.0)),
            KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Char('0') => Some(Action::ResetMapView),
            KeyCode::Char('H') => Some(Action::PanMap { east: -PAN_STEP, north: 0.0 }),
            KeyCode::Char('L') => Some(Action::PanMap { east: PAN_STEP, north: 0.0 }),
            KeyCode::Char('K') => Some(Action::PanMap { east: 0.0, north: PAN_STEP }),
            KeyCode::Char('J') => Some(Action::PanMap { east: 0.0, north: -PAN_STEP }),
            _ => None,
        }
    }

    fn action_for_mouse(&self, mouse: MouseEvent) -> Option<Action> {
        if self.show_help {
            return None;
        }

        let in_sidebar = self
            .sidebar_area
            .is_some_and(|area| contains(area, mouse.column, mouse.row));
        let in_map = contains(self.map_area, mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if in_sidebar => self
                .list_view
                .row_at(mouse.column, mouse.row, self.state.visible())
                .map(|record| Action::Select(record.id.clone())),
            MouseEventKind::Down(MouseButton::Left) if in_map => self
                .map_view
                .surface()
                .marker_at(mouse.column, mouse.row, self.state.records())
                .map(|record| Action::Select(record.id.clone())),
            MouseEventKind::ScrollDown if in_sidebar => Some(Action::ScrollList(1)),
            MouseEventKind::ScrollUp if in_sidebar => Some(Action::ScrollList(-1)),
            MouseEventKind::ScrollUp if in_map => Some(Action::ZoomMapAt {
                column: mouse.column,
                row: mouse.row,
                delta: 1.0,
            }),
            MouseEventKind::ScrollDown if in_map => Some(Action::ZoomMapAt {
                column: mouse.column,
                row: mouse.row,
                delta: -1.0,
            }),
            _ => None,
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Select(id) => {
                if self.state.selection().current() == Some(id.as_str()) {
                    self.map_view.refocus();
                } else if !self.state.select_id(&id) {
                    tracing::debug!(%id, "ignoring selection of unknown id");
                }
            }
            Action::SelectNextInList => self.state.step_list_selection(1),
            Action::SelectPreviousInList => self.state.step_list_selection(-1),
            Action::SelectNextOnMap => self.state.step_map_selection(1),
            Action::SelectPreviousOnMap => self.state.step_map_selection(-1),
            Action::ZoomMap(delta) => self.map_view.surface_mut().zoom_by(delta),
            Action::ZoomMapAt { column, row, delta } => {
                self.map_view.surface_mut().zoom_at(column, row, delta)
            }
            Action::PanMap { east, north } => self.map_view.surface_mut().pan_by(east, north),
            Action::ResetMapView => {
                tracing::debug!("map reset to world view");
                self.map_view.surface_mut().reset_view();
            }
            Action::ScrollList(delta) => self.list_view.scroll_by(delta, self.state.visible().len()),
            Action::RaiseMinMagnitude => self.state.raise_min_magnitude(),
            Action::LowerMinMagnitude => self.state.lower_min_magnitude(),
            Action::SetSortKey(sort_key) => self.state.set_sort_key(sort_key),
            Action::CycleSortKey => {
                let next = self.state.filter().sort_key.next();
                self.state.set_sort_key(next);
            }
            Action::Retry => {
                // Retry lives on the map's error placeholder only.
                if self.state.refresh_state().error_message().is_none() {
                    return;
                }
                match &self.scheduler {
                    Some(scheduler) => {
                        tracing::info!("manual retry requested");
                        scheduler.refresh_now();
                    }
                    None => tracing::warn!("retry requested without a running scheduler"),
                }
            }
            Action::ToggleSidebar => self.show_sidebar = !self.show_sidebar,
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                self.help_scroll = 0;
            }
            Action::ScrollHelp(delta) => {
                self.help_scroll = self.help_scroll.saturating_add_signed(delta);
            }
            Action::CloseHelp => {
                self.show_help = false;
                self.help_scroll = 0;
            }
            Action::Quit => self.should_quit = true,
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(0),    // Map + sidebar
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        self.render_status_bar(frame, chunks[0]);

        let (map_area, sidebar_area) = if self.show_sidebar {
            let sidebar_width = SIDEBAR_WIDTH.min(chunks[1].width / 2);
            let main = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(sidebar_width)])
                .split(chunks[1]);
            (main[0], Some(main[1]))
        } else {
            (chunks[1], None)
        };
        self.map_area = map_area;
        self.sidebar_area = sidebar_area;

        let spinner = spinner_frame(self.frame_count);
        self.map_view.render(frame, map_area, &self.state, spinner);
        if let Some(area) = sidebar_area {
            self.list_view.render(frame, area, &self.state, Utc::now(), spinner);
        }

        self.render_footer(frame, chunks[2]);

        if self.show_help {
            self.render_help(frame);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let connection_indicator = match self.state.refresh_state() {
            RefreshState::Ready(_) => Span::styled("● Live", Style::default().fg(Color::Green)),
            RefreshState::Failed(_) => Span::styled("● Offline", Style::default().fg(Color::Red)),
            RefreshState::Loading => Span::styled("● Loading...", Style::default().fg(Color::Yellow)),
        };

        let events = format!(
            "Events: {} (list {})",
            self.state.records().len(),
            self.state.visible().len()
        );

        let update_time = match self.state.last_success() {
            Some(at) => format!("Updated: {}", at.with_timezone(&Local).format("%H:%M:%S")),
            None => "Updated: --".to_string(),
        };

        let scheduler_running = self.scheduler.as_ref().is_some_and(RefreshScheduler::is_running);
        let next_refresh = if self.state.refresh_state().is_loading() {
            "Next: now".to_string()
        } else if scheduler_running {
            let interval = REFRESH_INTERVAL.as_secs();
            let remaining = interval - self.started_at.elapsed().as_secs() % interval;
            format!("Next: {}:{:02}", remaining / 60, remaining % 60)
        } else {
            "Next: --".to_string()
        };

        let line = Line::from(vec![
            connection_indicator,
            Span::raw("  │  "),
            Span::styled(events, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("  │  "),
            Span::raw(update_time),
            Span::raw("  │  "),
            Span::raw(next_refresh),
        ]);

        let paragraph = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL).title(" 🌍 QUAKEWATCH · Real-time seismic activity worldwide "));

        frame.render_widget(paragraph, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let key = |label: &'static str| Span::styled(label, Style::default().fg(Color::Yellow));
        let footer_text = Line::from(vec![
            key("[↑↓] "),
            Span::raw("List  "),
            key("[←→] "),
            Span::raw("Map  "),
            key("[z/x] "),
            Span::raw("Zoom  "),
            key("[HJKL] "),
            Span::raw("Pan  "),
            key("[w] "),
            Span::raw("World  "),
            key("[+/-] "),
            Span::raw("Min mag  "),
            key("[s] "),
            Span::raw("Sort  "),
            key("[b] "),
            Span::raw("Sidebar  "),
            key("[h/?] "),
            Span::raw("Help  "),
            key("[q] "),
            Span::raw("Quit   "),
            Span::styled("Data: USGS", Style::default().fg(Color::DarkGray)),
        ]);

        let paragraph = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));

        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        use ratatui::widgets::{Clear, Wrap};

        let area = frame.size();
        let popup_width = (u32::from(area.width) * 70 / 100) as u16;
        let popup_height = (u32::from(area.height) * 80 / 100) as u16;
        let popup_area = Rect {
            x: (area.width - popup_width) / 2,
            y: (area.height - popup_height) / 2,
            width: popup_width,
            height: popup_height,
        };

        frame.render_widget(Clear, popup_area);

        let rule = || {
            Line::from(Span::styled(
                "─".repeat((popup_width as usize).saturating_sub(4)),
                Style::default().fg(Color::DarkGray),
            ))
        };
        let heading = |text: &'static str| {
            Line::from(Span::styled(text, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)))
        };
        let shortcut = |keys: &'static str, text: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {:<8}", keys), Style::default().fg(Color::Cyan)),
                Span::raw(text),
            ])
        };

        let mut help_text = vec![
            Line::from(Span::styled(
                "QUAKEWATCH HELP",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            heading("KEYBOARD & MOUSE"),
            Line::from(""),
            shortcut("↑/↓ j/k", "Select previous/next earthquake in the list"),
            shortcut("←/→", "Step through markers on the map (feed order)"),
            shortcut("click", "Select a map marker or a list row"),
            shortcut("z/x", "Zoom the map in/out (or scroll over the map)"),
            shortcut("H/J/K/L", "Pan the map west/south/north/east"),
            shortcut("w/0", "Back to the world view"),
            shortcut("wheel", "Scroll the list without changing the selection"),
            shortcut("+/-", "Raise/lower the list's minimum magnitude (0-8, step 0.5)"),
            shortcut("s", "Cycle sort: Most Recent, Largest Magnitude, Deepest"),
            shortcut("1/2/3", "Sort by time / magnitude / depth"),
            shortcut("b", "Show/hide the list sidebar"),
            shortcut("r", "Retry after a failed refresh"),
            shortcut("h/?", "Toggle this help screen"),
            shortcut("q", "Quit"),
            Line::from(""),
            rule(),
            Line::from(""),
            heading("MAGNITUDE CLASSES"),
            Line::from(""),
        ];

        help_text.extend(MagnitudeCategory::ALL.iter().map(|category| {
            Line::from(vec![
                Span::styled("  ● ", Style::default().fg(category.color())),
                Span::styled(
                    format!("{:<9}", category.label()),
                    Style::default().fg(category.color()).add_modifier(Modifier::BOLD),
                ),
                Span::raw(category.range_label()),
            ])
        }));

        help_text.extend([
            Line::from(""),
            Line::from("  Marker size grows with magnitude. The selected marker is drawn"),
            Line::from("  brighter with a double ring and the map zooms in on it."),
            Line::from(""),
            rule(),
            Line::from(""),
            heading("DATA"),
            Line::from(""),
            Line::from("  All earthquakes of the past day from the USGS summary feed,"),
            Line::from("  refreshed every 5 minutes. The magnitude filter and sort only"),
            Line::from("  affect the list; the map always shows every event."),
            Line::from(""),
            Line::from(Span::styled("Press [ESC] or [h] to close", Style::default().fg(Color::DarkGray))),
        ]);

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" HELP (Use ↑↓ to scroll) ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.help_scroll, 0));

        frame.render_widget(paragraph, popup_area);
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FETCH_FAILED_MESSAGE;
    use crate::model::{record, EventRecord};
    use crate::ui::buffer_text;
    use crate::ui::map::{Viewport, FOCUS_ZOOM};
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        let feed = FeedClient::new("http://127.0.0.1:1/feed.geojson".to_string(), 1).unwrap();
        App::new(feed)
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn quakes() -> RefreshState {
        RefreshState::Ready(vec![
            EventRecord {
                magnitude: Some(2.0),
                time_epoch_millis: 100,
                latitude: 10.0,
                longitude: 10.0,
                ..record("a")
            },
            EventRecord {
                magnitude: Some(6.0),
                time_epoch_millis: 300,
                latitude: -30.0,
                longitude: 150.0,
                ..record("b")
            },
        ])
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        mouse(MouseEventKind::Down(MouseButton::Left), column, row)
    }

    fn press(app: &mut App, key: KeyCode) {
        let action = app.action_for_key(key).unwrap();
        app.apply(action);
    }

    /// Draw once so the map syncs with the selection, then let the
    /// animation finish.
    fn settle(app: &mut App) {
        draw(app);
        for _ in 0..100 {
            app.map_view.surface_mut().tick();
        }
    }

    #[test]
    fn both_surfaces_show_loading_at_startup() {
        let mut app = app();
        let text = draw(&mut app);
        assert!(text.contains("Loading earthquake data..."));
        assert!(text.contains("Loading earthquakes..."));
    }

    #[test]
    fn failed_refresh_offers_retry_on_the_map_only() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshStarted);
        app.handle_app_event(AppEvent::RefreshFinished(RefreshState::Failed(
            FETCH_FAILED_MESSAGE.to_string(),
        )));

        let text = draw(&mut app);
        assert_eq!(text.matches("Retry").count(), 1);
        assert!(text.contains("Error Loading Data"));

        // No scheduler in tests; retry must not panic.
        app.apply(Action::Retry);
    }

    #[test]
    fn retry_key_is_ignored_unless_failed() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshFinished(quakes()));
        assert_eq!(app.action_for_key(KeyCode::Char('r')), Some(Action::Retry));
        app.apply(Action::Retry);
        assert_eq!(app.state.records().len(), 2);
    }

    #[test]
    fn keys_drive_selection_and_filter() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshFinished(quakes()));

        for key in [KeyCode::Down, KeyCode::Down] {
            let action = app.action_for_key(key).unwrap();
            app.apply(action);
        }
        // Newest first: b, then a.
        assert_eq!(app.state.selection().current(), Some("a"));

        app.apply(app.action_for_key(KeyCode::Char('+')).unwrap());
        app.apply(app.action_for_key(KeyCode::Char('+')).unwrap());
        app.apply(app.action_for_key(KeyCode::Char('+')).unwrap());
        assert_eq!(app.state.filter().min_magnitude, 1.5);
        app.apply(app.action_for_key(KeyCode::Char('s')).unwrap());
        assert_eq!(app.state.filter().sort_key, SortKey::Magnitude);

        app.apply(app.action_for_key(KeyCode::Char('3')).unwrap());
        assert_eq!(app.state.filter().sort_key, SortKey::Depth);
    }

    #[test]
    fn help_overlay_captures_navigation_keys() {
        let mut app = app();
        app.apply(Action::ToggleHelp);
        assert_eq!(app.action_for_key(KeyCode::Down), Some(Action::ScrollHelp(1)));
        assert_eq!(app.action_for_key(KeyCode::Esc), Some(Action::CloseHelp));
        assert!(draw(&mut app).contains("QUAKEWATCH HELP"));

        app.apply(Action::ScrollHelp(-3));
        app.apply(Action::CloseHelp);
        assert_eq!(app.action_for_key(KeyCode::Down), Some(Action::SelectNextInList));
    }

    #[test]
    fn sidebar_toggle_resizes_the_map() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshFinished(quakes()));
        draw(&mut app);
        let with_sidebar = app.map_area;
        assert!(app.sidebar_area.is_some());

        app.apply(Action::ToggleSidebar);
        let text = draw(&mut app);
        assert!(app.sidebar_area.is_none());
        assert!(app.map_area.width > with_sidebar.width);
        assert!(!text.contains("Recent Earthquakes"));
    }

    #[test]
    fn clicking_a_list_row_selects_it() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshFinished(quakes()));
        draw(&mut app);

        let sidebar = app.sidebar_area.unwrap();
        // Sidebar border + controls push the first row down four lines.
        let action = app.action_for_mouse(click(sidebar.x + 4, sidebar.y + 4));
        assert_eq!(action, Some(Action::Select("b".to_string())));

        app.apply(action.unwrap());
        let text = draw(&mut app);
        assert!(text.contains("Earthquake Details"));
    }

    #[test]
    fn map_selection_shows_details_and_list_highlight_agrees() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshFinished(quakes()));
        app.apply(Action::SelectNextOnMap);
        assert_eq!(app.state.selection().current(), Some("a"));
        assert_eq!(app.state.selected_visible_index(), Some(1));

        // A refresh without "a" leaves nothing highlighted.
        app.handle_app_event(AppEvent::RefreshStarted);
        app.handle_app_event(AppEvent::RefreshFinished(RefreshState::Ready(vec![record("c")])));
        assert!(app.state.selected_record().is_none());
        assert!(!draw(&mut app).contains("Earthquake Details"));
    }

    #[test]
    fn world_view_can_be_restored_after_a_selection() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshFinished(quakes()));
        app.apply(Action::Select("b".to_string()));
        settle(&mut app);
        assert_eq!(app.map_view.surface().viewport().zoom, FOCUS_ZOOM);

        press(&mut app, KeyCode::Char('w'));
        settle(&mut app);
        for action in [
            Action::ToggleSidebar,
            Action::ToggleSidebar,
            Action::LowerMinMagnitude,
            Action::CycleSortKey,
            Action::Retry,
        ] {
            app.apply(action);
        }
        settle(&mut app);
        assert_eq!(app.map_view.surface().viewport(), Viewport::default());
        assert_eq!(app.state.selection().current(), Some("b"));

        // Choosing the selected record again flies back to it.
        app.apply(Action::Select("b".to_string()));
        settle(&mut app);
        let viewport = app.map_view.surface().viewport();
        assert_eq!(viewport.zoom, FOCUS_ZOOM);
        assert_eq!(viewport.center.longitude, 150.0);
    }

    #[test]
    fn zoom_and_pan_keys_move_the_map() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshFinished(quakes()));
        draw(&mut app);

        press(&mut app, KeyCode::Char('z'));
        press(&mut app, KeyCode::Char('z'));
        settle(&mut app);
        assert_eq!(app.map_view.surface().viewport().zoom, 3.0);

        press(&mut app, KeyCode::Char('x'));
        settle(&mut app);
        assert_eq!(app.map_view.surface().viewport().zoom, 2.0);

        let before = app.map_view.surface().viewport().center;
        press(&mut app, KeyCode::Char('L'));
        press(&mut app, KeyCode::Char('K'));
        settle(&mut app);
        let after = app.map_view.surface().viewport().center;
        assert!(after.longitude > before.longitude);
        assert!(after.latitude > before.latitude);

        press(&mut app, KeyCode::Char('0'));
        settle(&mut app);
        assert_eq!(app.map_view.surface().viewport(), Viewport::default());
    }

    #[test]
    fn wheel_zooms_the_map_and_scrolls_the_list() {
        let mut app = app();
        app.handle_app_event(AppEvent::RefreshFinished(quakes()));
        draw(&mut app);

        let map = app.map_area;
        let (column, row) = (map.x + map.width / 2, map.y + map.height / 2);
        let action = app.action_for_mouse(mouse(MouseEventKind::ScrollUp, column, row));
        assert_eq!(action, Some(Action::ZoomMapAt { column, row, delta: 1.0 }));
        app.apply(action.unwrap());
        settle(&mut app);
        assert_eq!(app.map_view.surface().viewport().zoom, 2.0);

        let sidebar = app.sidebar_area.unwrap();
        let action = app.action_for_mouse(mouse(MouseEventKind::ScrollDown, sidebar.x + 4, sidebar.y + 6));
        assert_eq!(action, Some(Action::ScrollList(1)));
        app.apply(action.unwrap());
        assert_eq!(app.state.selection().current(), None);

        draw(&mut app);
        let first_row = app.action_for_mouse(click(sidebar.x + 4, sidebar.y + 4));
        assert_eq!(first_row, Some(Action::Select("a".to_string())));
    }

    #[test]
    fn clicks_are_mapped_against_the_latest_collection() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        tx.send(AppEvent::RefreshFinished(RefreshState::Failed(
            FETCH_FAILED_MESSAGE.to_string(),
        )))
        .unwrap();
        app.draw_frame(&mut terminal, &mut rx).unwrap();

        tx.send(AppEvent::RefreshStarted).unwrap();
        tx.send(AppEvent::RefreshFinished(quakes())).unwrap();
        app.draw_frame(&mut terminal, &mut rx).unwrap();

        let sidebar = app.sidebar_area.unwrap();
        let action = app.action_for_mouse(click(sidebar.x + 4, sidebar.y + 4));
        assert_eq!(action, Some(Action::Select("b".to_string())));
    }

    #[test]
    fn help_popup_fits_very_wide_terminals() {
        let mut app = app();
        app.apply(Action::ToggleHelp);

        let mut terminal = Terminal::new(TestBackend::new(1000, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("QUAKEWATCH HELP"));
    }
}
