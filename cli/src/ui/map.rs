//! World map surface.
//!
//! [`MapView`] holds the presentation rules: which placeholder to show, when
//! to recenter, when the surface must hear about a new layout. The surface
//! itself sits behind [`MapSurface`] so those rules can be exercised without
//! a terminal. [`CanvasSurface`] is the ratatui implementation.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Map, MapResolution, Points},
        Block, Borders, Clear, Paragraph,
    },
    Frame,
};

use super::{bottom_left, bottom_right, magnitude_badge, render_placeholder};
use crate::model::{Coordinates, EventRecord, MagnitudeCategory, RefreshState};
use crate::selection::Selection;
use crate::state::DashboardState;

pub const DEFAULT_CENTER: Coordinates = Coordinates {
    latitude: 20.0,
    longitude: 0.0,
};
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Zoom used when a selection recenters the map.
pub const FOCUS_ZOOM: f64 = 4.0;
pub const MAX_ZOOM: f64 = 8.0;
/// Share of the visible span moved by one pan step.
pub const PAN_STEP: f64 = 0.25;
const MAX_LATITUDE: f64 = 85.0;

const MIN_MARKER_RADIUS: f64 = 5.0;
const MAX_MARKER_RADIUS: f64 = 20.0;
/// Marker radii are screen pixels; one braille dot stands for 2.5 of them.
const PIXELS_PER_DOT: f64 = 2.5;
/// Fraction of the remaining distance covered per animation tick.
const EASING: f64 = 0.35;

/// Imperative operations of a map surface.
pub trait MapSurface {
    /// Move the view to `coords` at `zoom`. Implementations may animate.
    fn recenter_on(&mut self, coords: Coordinates, zoom: f64);

    /// The surface's container now occupies `area`. Surfaces do not detect
    /// layout changes on their own.
    fn notify_resized(&mut self, area: Rect);
}

/// Marker radius in pixels: three pixels per magnitude unit, kept in 5..=20.
pub fn marker_radius(magnitude: Option<f64>) -> f64 {
    (magnitude.unwrap_or(0.0) * 3.0).clamp(MIN_MARKER_RADIUS, MAX_MARKER_RADIUS)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub category: MagnitudeCategory,
    pub opacity: f64,
    pub fill_opacity: f64,
    pub weight: u16,
}

pub fn marker_style(record: &EventRecord, selected: bool) -> MarkerStyle {
    let (opacity, fill_opacity, weight) = if selected { (1.0, 1.0, 4) } else { (0.8, 0.7, 2) };
    MarkerStyle {
        radius: marker_radius(record.magnitude),
        category: record.category(),
        opacity,
        fill_opacity,
        weight,
    }
}

/// What the map shows instead of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPlaceholder<'a> {
    Loading,
    Failed(&'a str),
    Empty,
}

pub fn placeholder(state: &RefreshState) -> Option<MapPlaceholder<'_>> {
    match state {
        RefreshState::Loading => Some(MapPlaceholder::Loading),
        RefreshState::Failed(message) => Some(MapPlaceholder::Failed(message)),
        RefreshState::Ready(records) if records.is_empty() => Some(MapPlaceholder::Empty),
        RefreshState::Ready(_) => None,
    }
}

pub struct MapView<S: MapSurface = CanvasSurface> {
    surface: S,
    /// Area last reported to the surface; `None` while a placeholder is up.
    layout: Option<Rect>,
    centered_on: Option<String>,
}

impl<S: MapSurface> MapView<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            layout: None,
            centered_on: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Report where the surface is mounted this frame (`None` when a
    /// placeholder replaces it). Mounting and any area change are forwarded
    /// to the surface.
    pub fn sync_layout(&mut self, area: Option<Rect>) {
        match area {
            Some(area) if self.layout != Some(area) => {
                tracing::debug!(?area, mounted = self.layout.is_none(), "map surface resized");
                self.surface.notify_resized(area);
                self.layout = Some(area);
            }
            Some(_) => {}
            None => self.layout = None,
        }
    }

    /// Force the next `sync_layout` to notify the surface, e.g. after the
    /// terminal itself was resized.
    pub fn invalidate_layout(&mut self) {
        self.layout = None;
    }

    /// Let the next `sync_selection` recenter on the current selection
    /// again, e.g. when the already selected record is picked a second time.
    pub fn refocus(&mut self) {
        self.centered_on = None;
    }

    /// Recenter when the selection moved to a record of the current
    /// collection. Orphaned selections leave the view alone, and so does a
    /// selection the view already centered on once.
    pub fn sync_selection(&mut self, state: &DashboardState) {
        let Some(record) = state.selected_record() else {
            return;
        };
        if self.centered_on.as_deref() == Some(record.id.as_str()) {
            return;
        }
        self.surface.recenter_on(record.coordinates(), FOCUS_ZOOM);
        self.centered_on = Some(record.id.clone());
    }
}

impl MapView<CanvasSurface> {
    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &DashboardState, spinner: &str) {
        if let Some(placeholder) = placeholder(state.refresh_state()) {
            self.sync_layout(None);
            render_map_placeholder(frame, area, placeholder, spinner);
            return;
        }

        self.sync_layout(Some(area));
        self.sync_selection(state);

        self.surface
            .render(frame, area, state.records(), state.selection());

        render_legend(frame, area);
        if let Some(record) = state.selected_record() {
            render_details(frame, area, record);
        }
    }
}

fn render_map_placeholder(frame: &mut Frame, area: Rect, placeholder: MapPlaceholder, spinner: &str) {
    let lines = match placeholder {
        MapPlaceholder::Loading => vec![
            Line::from(Span::styled(spinner.to_string(), Style::default().fg(Color::Cyan))),
            Line::from(""),
            Line::from("Loading earthquake data..."),
        ],
        MapPlaceholder::Failed(message) => vec![
            Line::from(Span::styled("⚠", Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(Span::styled(
                "Error Loading Data",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(message.to_string()),
            Line::from(""),
            Line::from(vec![
                Span::styled("[r] ", Style::default().fg(Color::Yellow)),
                Span::styled("Retry", Style::default().fg(Color::White).bg(Color::Blue)),
            ]),
        ],
        MapPlaceholder::Empty => vec![
            Line::from(Span::styled("🌍", Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(Span::styled(
                "No Recent Earthquakes",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("No earthquake data available for the last 24 hours."),
        ],
    };
    render_placeholder(frame, area, "World Map", lines);
}

fn render_legend(frame: &mut Frame, area: Rect) {
    let lines: Vec<Line> = MagnitudeCategory::ALL
        .iter()
        .map(|category| {
            Line::from(vec![
                Span::styled("● ", Style::default().fg(category.color())),
                Span::raw(format!("{} ({})", category.label(), category.range_label())),
            ])
        })
        .collect();

    let legend_area = bottom_right(area, 20, lines.len() as u16);
    frame.render_widget(Clear, legend_area);
    frame.render_widget(Paragraph::new(lines), legend_area);
}

fn render_details(frame: &mut Frame, area: Rect, record: &EventRecord) {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Gray));
    let lines = vec![
        Line::from(vec![label("Magnitude:   "), magnitude_badge(record)]),
        Line::from(vec![label("Location:    "), Span::raw(record.place.clone().unwrap_or_else(|| "Unknown".to_string()))]),
        Line::from(vec![label("Time:        "), Span::raw(record.local_time_label())]),
        Line::from(vec![
            label("Depth:       "),
            Span::raw(match record.depth_km {
                Some(depth) => format!("{:.1} km", depth),
                None => "N/A".to_string(),
            }),
        ]),
        Line::from(vec![label("Coordinates: "), Span::raw(record.coordinates_label())]),
    ];

    let details_area = bottom_left(area, 52, lines.len() as u16 + 2);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(record.category().color()))
        .title(" Earthquake Details ");

    frame.render_widget(Clear, details_area);
    frame.render_widget(Paragraph::new(lines).block(block), details_area);
}

/// Visible region of the map, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinates,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl Viewport {
    /// Longitude span: the whole world at zoom 1, halved per zoom level.
    pub fn lon_span(&self) -> f64 {
        360.0 / 2f64.powf(self.zoom - 1.0)
    }

    /// `(x_bounds, y_bounds)` for a canvas of `width` x `height` cells.
    /// Terminal cells are twice as tall as wide, so a row covers twice the
    /// degrees of a column.
    pub fn bounds(&self, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
        let lon_span = self.lon_span();
        let per_column = lon_span / f64::from(width.max(1));
        let lat_span = per_column * 2.0 * f64::from(height.max(1));
        (
            [
                self.center.longitude - lon_span / 2.0,
                self.center.longitude + lon_span / 2.0,
            ],
            [
                self.center.latitude - lat_span / 2.0,
                self.center.latitude + lat_span / 2.0,
            ],
        )
    }

    fn eased_toward(&self, target: &Viewport) -> Viewport {
        let step = |from: f64, to: f64| {
            let next = from + (to - from) * EASING;
            if (to - next).abs() < 1e-3 {
                to
            } else {
                next
            }
        };
        Viewport {
            center: Coordinates {
                latitude: step(self.center.latitude, target.center.latitude),
                longitude: step(self.center.longitude, target.center.longitude),
            },
            zoom: step(self.zoom, target.zoom),
        }
    }
}

/// Braille canvas world map.
///
/// `recenter_on` only sets a target; [`CanvasSurface::tick`] eases the
/// visible viewport toward it once per frame.
#[derive(Debug, Default)]
pub struct CanvasSurface {
    current: Viewport,
    target: Viewport,
    canvas_area: Rect,
}

impl MapSurface for CanvasSurface {
    fn recenter_on(&mut self, coords: Coordinates, zoom: f64) {
        self.target = Viewport {
            center: coords,
            zoom,
        };
    }

    fn notify_resized(&mut self, area: Rect) {
        self.canvas_area = Block::default().borders(Borders::ALL).inner(area);
    }
}

impl CanvasSurface {
    pub fn viewport(&self) -> Viewport {
        self.current
    }

    pub fn is_animating(&self) -> bool {
        self.current != self.target
    }

    /// Advance the recenter animation by one frame.
    pub fn tick(&mut self) {
        if self.is_animating() {
            self.current = self.current.eased_toward(&self.target);
        }
    }

    /// Zoom the target view by `delta` levels, keeping its center.
    pub fn zoom_by(&mut self, delta: f64) {
        self.target.zoom = (self.target.zoom + delta).clamp(DEFAULT_ZOOM, MAX_ZOOM);
    }

    /// Scroll-wheel zoom: the point under the cell stays put on screen.
    pub fn zoom_at(&mut self, column: u16, row: u16, delta: f64) {
        let Some(anchor) = self.to_geo(column, row) else {
            return;
        };
        let zoom = (self.target.zoom + delta).clamp(DEFAULT_ZOOM, MAX_ZOOM);
        let scale = 2f64.powf(self.target.zoom - zoom);
        let center = self.target.center;

        self.target = Viewport {
            center: clamp_center(Coordinates {
                latitude: anchor.latitude + (center.latitude - anchor.latitude) * scale,
                longitude: anchor.longitude + (center.longitude - anchor.longitude) * scale,
            }),
            zoom,
        };
    }

    /// Move the target view by fractions of its visible span. Positive
    /// values go east and north.
    pub fn pan_by(&mut self, east: f64, north: f64) {
        let ([west, east_edge], [south, north_edge]) = self
            .target
            .bounds(self.canvas_area.width, self.canvas_area.height);
        let center = self.target.center;
        self.target.center = clamp_center(Coordinates {
            latitude: center.latitude + (north_edge - south) * north,
            longitude: center.longitude + (east_edge - west) * east,
        });
    }

    /// Back to the whole-world view.
    pub fn reset_view(&mut self) {
        self.target = Viewport::default();
    }

    fn degrees_per_dot(&self) -> f64 {
        self.current.lon_span() / (f64::from(self.canvas_area.width.max(1)) * 2.0)
    }

    /// Geographic position under the center of a terminal cell.
    pub fn to_geo(&self, column: u16, row: u16) -> Option<Coordinates> {
        let area = self.canvas_area;
        if area.width == 0
            || area.height == 0
            || column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }

        let ([west, east], [south, north]) = self.current.bounds(area.width, area.height);
        let per_column = (east - west) / f64::from(area.width);
        let per_row = (north - south) / f64::from(area.height);

        Some(Coordinates {
            longitude: west + (f64::from(column - area.x) + 0.5) * per_column,
            latitude: north - (f64::from(row - area.y) + 0.5) * per_row,
        })
    }

    /// Marker under a click: the nearest one whose radius (plus a cell of
    /// slack) covers the clicked cell.
    pub fn marker_at<'r>(&self, column: u16, row: u16, records: &'r [EventRecord]) -> Option<&'r EventRecord> {
        let click = self.to_geo(column, row)?;
        let per_dot = self.degrees_per_dot();

        records
            .iter()
            .filter_map(|record| {
                let dx = (record.longitude - click.longitude) / per_dot;
                let dy = (record.latitude - click.latitude) / per_dot;
                let distance = dx.hypot(dy);
                let reach = marker_radius(record.magnitude) / PIXELS_PER_DOT + 2.0;
                (distance <= reach).then_some((record, distance))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(record, _)| record)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, records: &[EventRecord], selection: &Selection) {
        let ([west, east], [south, north]) = self
            .viewport()
            .bounds(self.canvas_area.width, self.canvas_area.height);
        let per_dot = self.degrees_per_dot();
        let selected = records.iter().find(|record| selection.is_selected(record));

        let canvas = Canvas::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" World Map ({} events) ", records.len())),
            )
            .marker(Marker::Braille)
            .x_bounds([west, east])
            .y_bounds([south, north])
            .paint(move |ctx| {
                ctx.draw(&Map {
                    resolution: MapResolution::High,
                    color: Color::DarkGray,
                });
                ctx.layer();

                for record in records.iter().filter(|record| !selection.is_selected(record)) {
                    draw_marker(ctx, record, marker_style(record, false), per_dot);
                }

                if let Some(record) = selected {
                    ctx.layer();
                    let style = marker_style(record, true);
                    draw_marker(ctx, record, style, per_dot);
                    ctx.print(
                        record.longitude,
                        record.latitude,
                        Span::styled(
                            format!(" M{}", record.magnitude_label()),
                            Style::default()
                                .fg(style.category.color())
                                .add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            });

        frame.render_widget(canvas, area);
    }
}

fn clamp_center(center: Coordinates) -> Coordinates {
    Coordinates {
        latitude: center.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE),
        longitude: center.longitude.clamp(-180.0, 180.0),
    }
}

fn draw_marker(ctx: &mut Context, record: &EventRecord, style: MarkerStyle, per_dot: f64) {
    let stroke = shade(style.category.color(), style.opacity);
    let radius = style.radius / PIXELS_PER_DOT * per_dot;

    // Every two units of stroke weight add one ring.
    let rings = (style.weight / 2).max(1);
    for ring in 0..rings {
        ctx.draw(&Circle {
            x: record.longitude,
            y: record.latitude,
            radius: (radius - f64::from(ring) * per_dot).max(per_dot / 2.0),
            color: stroke,
        });
    }

    ctx.draw(&Points {
        coords: &[(record.longitude, record.latitude)],
        color: shade(style.category.color(), style.fill_opacity),
    });
}

/// Terminals have no alpha; darken RGB colors instead.
fn shade(color: Color, opacity: f64) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let scale = |channel: u8| (f64::from(channel) * opacity).round() as u8;
            Color::Rgb(scale(r), scale(g), scale(b))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record;
    use crate::ui::buffer_text;
    use ratatui::{backend::TestBackend, Terminal};

    #[derive(Default)]
    struct RecordingSurface {
        recentered: Vec<(Coordinates, f64)>,
        resized: Vec<Rect>,
    }

    impl MapSurface for RecordingSurface {
        fn recenter_on(&mut self, coords: Coordinates, zoom: f64) {
            self.recentered.push((coords, zoom));
        }

        fn notify_resized(&mut self, area: Rect) {
            self.resized.push(area);
        }
    }

    fn at(id: &str, latitude: f64, longitude: f64, magnitude: Option<f64>) -> EventRecord {
        EventRecord {
            latitude,
            longitude,
            magnitude,
            ..record(id)
        }
    }

    fn ready_state(records: Vec<EventRecord>) -> DashboardState {
        let mut state = DashboardState::default();
        state.finish_refresh(RefreshState::Ready(records));
        state
    }

    #[test]
    fn marker_radius_clamps() {
        assert_eq!(marker_radius(Some(0.0)), 5.0);
        assert_eq!(marker_radius(None), 5.0);
        assert_eq!(marker_radius(Some(1.0)), 5.0);
        assert_eq!(marker_radius(Some(4.0)), 12.0);
        assert_eq!(marker_radius(Some(10.0)), 20.0);
    }

    #[test]
    fn selected_marker_is_opaque_and_heavier() {
        let quake = at("a", 0.0, 0.0, Some(5.5));
        let normal = marker_style(&quake, false);
        let selected = marker_style(&quake, true);

        assert_eq!(normal.category, MagnitudeCategory::Moderate);
        assert_eq!(selected.weight, normal.weight * 2);
        assert_eq!(selected.opacity, 1.0);
        assert_eq!(selected.fill_opacity, 1.0);
        assert!(normal.opacity < 1.0 && normal.fill_opacity < 1.0);
    }

    #[test]
    fn placeholders_follow_refresh_state() {
        assert_eq!(placeholder(&RefreshState::Loading), Some(MapPlaceholder::Loading));
        let failed = RefreshState::Failed("nope".to_string());
        assert_eq!(placeholder(&failed), Some(MapPlaceholder::Failed("nope")));
        assert_eq!(placeholder(&RefreshState::Ready(vec![])), Some(MapPlaceholder::Empty));
        assert_eq!(placeholder(&RefreshState::Ready(vec![record("a")])), None);
    }

    #[test]
    fn recenters_on_selection_change_only() {
        let mut view = MapView::new(RecordingSurface::default());
        let mut state = ready_state(vec![at("a", 10.0, 20.0, None), at("b", -5.0, 100.0, None)]);

        view.sync_selection(&state);
        assert!(view.surface().recentered.is_empty());

        state.select_id("a");
        view.sync_selection(&state);
        view.sync_selection(&state);
        assert_eq!(
            view.surface().recentered,
            vec![(Coordinates { latitude: 10.0, longitude: 20.0 }, FOCUS_ZOOM)]
        );

        state.select_id("b");
        view.sync_selection(&state);
        assert_eq!(view.surface().recentered.len(), 2);
        assert_eq!(view.surface().recentered[1].0.longitude, 100.0);
    }

    #[test]
    fn orphaned_selection_does_not_recenter() {
        let mut view = MapView::new(RecordingSurface::default());
        let mut state = ready_state(vec![at("a", 1.0, 2.0, None)]);
        state.select_id("a");
        view.sync_selection(&state);

        state.finish_refresh(RefreshState::Ready(vec![at("z", 3.0, 4.0, None)]));
        view.sync_selection(&state);
        assert_eq!(view.surface().recentered.len(), 1);
    }

    #[test]
    fn resize_is_forwarded_on_mount_and_area_change() {
        let mut view = MapView::new(RecordingSurface::default());
        let wide = Rect::new(0, 3, 120, 30);
        let narrow = Rect::new(0, 3, 70, 30);

        view.sync_layout(Some(wide));
        view.sync_layout(Some(wide));
        assert_eq!(view.surface().resized, vec![wide]);

        // Sidebar opened.
        view.sync_layout(Some(narrow));
        assert_eq!(view.surface().resized, vec![wide, narrow]);

        // Placeholder shown, then the map mounts again at the same size.
        view.sync_layout(None);
        view.sync_layout(Some(narrow));
        assert_eq!(view.surface().resized.len(), 3);

        view.invalidate_layout();
        view.sync_layout(Some(narrow));
        assert_eq!(view.surface().resized.len(), 4);
    }

    #[test]
    fn canvas_animates_toward_the_recenter_target() {
        let mut surface = CanvasSurface::default();
        surface.notify_resized(Rect::new(0, 0, 82, 42));
        assert_eq!(surface.viewport(), Viewport::default());

        let target = Coordinates { latitude: 35.0, longitude: 139.0 };
        surface.recenter_on(target, FOCUS_ZOOM);
        assert!(surface.is_animating());

        surface.tick();
        let first = surface.viewport();
        assert!(first.center.longitude > 0.0 && first.center.longitude < 139.0);
        assert!(first.zoom > DEFAULT_ZOOM && first.zoom < FOCUS_ZOOM);

        for _ in 0..100 {
            surface.tick();
        }
        assert!(!surface.is_animating());
        assert_eq!(surface.viewport().center, target);
        assert_eq!(surface.viewport().zoom, FOCUS_ZOOM);
    }

    fn settle(surface: &mut CanvasSurface) {
        for _ in 0..100 {
            surface.tick();
        }
    }

    #[test]
    fn zoom_is_clamped_and_eased() {
        let mut surface = CanvasSurface::default();
        surface.notify_resized(Rect::new(0, 0, 82, 42));

        surface.zoom_by(1.0);
        assert!(surface.is_animating());
        settle(&mut surface);
        assert_eq!(surface.viewport().zoom, 2.0);
        assert_eq!(surface.viewport().center, DEFAULT_CENTER);

        surface.zoom_by(-5.0);
        settle(&mut surface);
        assert_eq!(surface.viewport().zoom, DEFAULT_ZOOM);

        surface.zoom_by(20.0);
        settle(&mut surface);
        assert_eq!(surface.viewport().zoom, MAX_ZOOM);
    }

    #[test]
    fn wheel_zoom_keeps_the_point_under_the_cursor() {
        let mut surface = CanvasSurface::default();
        surface.notify_resized(Rect::new(0, 0, 82, 42));
        let before = surface.to_geo(61, 11).unwrap();

        surface.zoom_at(61, 11, 1.0);
        settle(&mut surface);
        let after = surface.to_geo(61, 11).unwrap();
        assert_eq!(surface.viewport().zoom, 2.0);
        // Within half a cell of the new, finer grid.
        assert!((after.longitude - before.longitude).abs() <= 1.125);
        assert!((after.latitude - before.latitude).abs() <= 2.25);

        // Outside the canvas nothing happens.
        surface.zoom_at(0, 0, 1.0);
        assert!(!surface.is_animating());
    }

    #[test]
    fn pan_moves_by_a_share_of_the_visible_span() {
        let mut surface = CanvasSurface::default();
        surface.notify_resized(Rect::new(0, 0, 82, 42));
        surface.zoom_by(1.0);
        settle(&mut surface);

        // Zoom 2 shows 180° of longitude.
        surface.pan_by(PAN_STEP, 0.0);
        settle(&mut surface);
        assert!((surface.viewport().center.longitude - 45.0).abs() < 1e-9);

        surface.pan_by(0.0, 10.0);
        settle(&mut surface);
        assert_eq!(surface.viewport().center.latitude, MAX_LATITUDE);
    }

    #[test]
    fn reset_returns_to_the_world_and_stays_there() {
        let mut view = MapView::new(CanvasSurface::default());
        view.sync_layout(Some(Rect::new(0, 0, 82, 42)));
        let mut state = ready_state(vec![at("tokyo", 35.0, 139.0, Some(6.0))]);
        state.select_id("tokyo");

        view.sync_selection(&state);
        settle(view.surface_mut());
        assert_eq!(view.surface().viewport().zoom, FOCUS_ZOOM);

        view.surface_mut().reset_view();
        for _ in 0..100 {
            view.sync_selection(&state);
            view.surface_mut().tick();
        }
        assert_eq!(view.surface().viewport(), Viewport::default());

        // Picking the same record again flies back to it.
        view.refocus();
        view.sync_selection(&state);
        settle(view.surface_mut());
        assert_eq!(view.surface().viewport().center, Coordinates { latitude: 35.0, longitude: 139.0 });
    }

    #[test]
    fn geo_lookup_needs_a_known_layout() {
        let mut surface = CanvasSurface::default();
        assert!(surface.to_geo(10, 10).is_none());

        // 80x40 canvas inside the border, whole world at zoom 1.
        surface.notify_resized(Rect::new(0, 0, 82, 42));
        // Columns span 4.5° and rows 9°; the view covers lat -160..200.
        let cell = surface.to_geo(41, 21).unwrap();
        assert!((cell.longitude - 2.25).abs() < 1e-9);
        assert!((cell.latitude - 15.5).abs() < 1e-9);

        // Border cells are not part of the canvas.
        assert!(surface.to_geo(0, 5).is_none());
    }

    #[test]
    fn clicks_hit_the_nearest_marker() {
        let mut surface = CanvasSurface::default();
        surface.notify_resized(Rect::new(0, 0, 82, 42));
        let records = vec![
            at("tokyo", 35.7, 139.7, Some(6.0)),
            at("lima", -12.0, -77.0, Some(4.0)),
        ];

        let tokyo_column = 1 + ((139.7 + 180.0) / 4.5) as u16;
        let tokyo_row = 1 + ((200.0 - 35.7) / 9.0) as u16;
        let hit = surface.marker_at(tokyo_column, tokyo_row, &records);
        assert_eq!(hit.map(|r| r.id.as_str()), Some("tokyo"));

        assert!(surface.marker_at(40, 2, &records).is_none());
    }

    #[test]
    fn renders_placeholder_with_retry_when_failed() {
        let mut view = MapView::new(CanvasSurface::default());
        let mut state = DashboardState::default();
        state.finish_refresh(RefreshState::Failed("Failed to fetch".to_string()));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| view.render(frame, frame.size(), &state, "◐"))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Error Loading Data"));
        assert!(text.contains("Retry"));
        assert!(view.layout.is_none());
    }

    #[test]
    fn renders_map_with_details_for_selection() {
        let mut view = MapView::new(CanvasSurface::default());
        let mut state = ready_state(vec![EventRecord {
            place: Some("Near the trench".to_string()),
            ..at("a", 10.0, 20.0, Some(7.2))
        }]);
        state.select_id("a");

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| view.render(frame, frame.size(), &state, "◐"))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("World Map (1 events)"));
        assert!(text.contains("Earthquake Details"));
        assert!(text.contains("Near the trench"));
        assert!(text.contains("Major (M≥7)"));
        assert!(view.surface().is_animating());
    }
}
