use crate::filter::SortKey;
use crate::model::RefreshState;

/// Messages sent from background tasks into the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    /// A refresh cycle began; the dashboard shows its loading state.
    RefreshStarted,

    /// A refresh cycle completed with this state.
    RefreshFinished(RefreshState),
}

/// Intents produced by the views and the input handler. Only the app
/// coordinator applies them to the dashboard state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Select(String),
    SelectNextInList,
    SelectPreviousInList,
    SelectNextOnMap,
    SelectPreviousOnMap,
    /// Zoom the map around its center by this many levels.
    ZoomMap(f64),
    /// Scroll-wheel zoom anchored at a terminal cell.
    ZoomMapAt { column: u16, row: u16, delta: f64 },
    /// Pan by fractions of the visible span; positive is east and north.
    PanMap { east: f64, north: f64 },
    ResetMapView,
    /// Move the list window without touching the selection.
    ScrollList(isize),
    RaiseMinMagnitude,
    LowerMinMagnitude,
    SetSortKey(SortKey),
    CycleSortKey,
    Retry,
    ToggleSidebar,
    ToggleHelp,
    ScrollHelp(i16),
    CloseHelp,
    Quit,
}
