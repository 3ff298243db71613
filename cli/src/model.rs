use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::style::Color;

/// A point on the globe in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One seismic event as reported by the feed. Never mutated after a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    pub time_epoch_millis: i64,
    pub longitude: f64,
    pub latitude: f64,
    pub depth_km: Option<f64>,
}

impl EventRecord {
    /// Magnitude used for filtering, sorting and styling.
    pub fn magnitude_or_zero(&self) -> f64 {
        self.magnitude.unwrap_or(0.0)
    }

    pub fn depth_or_zero(&self) -> f64 {
        self.depth_km.unwrap_or(0.0)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn category(&self) -> MagnitudeCategory {
        MagnitudeCategory::from_magnitude(self.magnitude_or_zero())
    }

    /// Display form of the magnitude; absent values never render as 0.
    pub fn magnitude_label(&self) -> String {
        match self.magnitude {
            Some(mag) => format!("{}", mag),
            None => "N/A".to_string(),
        }
    }

    pub fn place_label(&self) -> &str {
        self.place.as_deref().unwrap_or("Unknown Location")
    }

    pub fn depth_label(&self) -> String {
        match self.depth_km {
            Some(depth) => format!("{:.1}km", depth),
            None => "N/A".to_string(),
        }
    }

    pub fn coordinates_label(&self) -> String {
        format!("{:.3}, {:.3}", self.latitude, self.longitude)
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.time_epoch_millis).single()
    }

    /// Full local timestamp, used by the map's details box.
    pub fn local_time_label(&self) -> String {
        match self.occurred_at() {
            Some(at) => at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => "N/A".to_string(),
        }
    }
}

/// Result of the latest refresh attempt. Exactly one variant holds at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshState {
    Loading,
    Ready(Vec<EventRecord>),
    Failed(String),
}

impl RefreshState {
    /// Records of a `Ready` state; empty otherwise.
    pub fn records(&self) -> &[EventRecord] {
        match self {
            RefreshState::Ready(records) => records,
            _ => &[],
        }
    }

    pub fn find(&self, id: &str) -> Option<&EventRecord> {
        self.records().iter().find(|record| record.id == id)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RefreshState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RefreshState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Magnitude bands shared by the map markers and the list badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnitudeCategory {
    Minor,
    Light,
    Moderate,
    Major,
}

impl MagnitudeCategory {
    pub const ALL: [MagnitudeCategory; 4] = [
        MagnitudeCategory::Minor,
        MagnitudeCategory::Light,
        MagnitudeCategory::Moderate,
        MagnitudeCategory::Major,
    ];

    pub fn from_magnitude(magnitude: f64) -> Self {
        if magnitude >= 7.0 {
            MagnitudeCategory::Major
        } else if magnitude >= 5.0 {
            MagnitudeCategory::Moderate
        } else if magnitude >= 3.0 {
            MagnitudeCategory::Light
        } else {
            MagnitudeCategory::Minor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MagnitudeCategory::Minor => "Minor",
            MagnitudeCategory::Light => "Light",
            MagnitudeCategory::Moderate => "Moderate",
            MagnitudeCategory::Major => "Major",
        }
    }

    /// Range text for the legend.
    pub fn range_label(self) -> &'static str {
        match self {
            MagnitudeCategory::Minor => "M<3",
            MagnitudeCategory::Light => "M3-5",
            MagnitudeCategory::Moderate => "M5-7",
            MagnitudeCategory::Major => "M≥7",
        }
    }

    pub fn color(self) -> Color {
        match self {
            MagnitudeCategory::Minor => Color::Rgb(0x16, 0xa3, 0x4a),
            MagnitudeCategory::Light => Color::Rgb(0xd9, 0x77, 0x06),
            MagnitudeCategory::Moderate => Color::Rgb(0xea, 0x58, 0x0c),
            MagnitudeCategory::Major => Color::Rgb(0xdc, 0x26, 0x26),
        }
    }
}

#[cfg(test)]
pub(crate) fn record(id: &str) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        magnitude: None,
        place: None,
        time_epoch_millis: 0,
        longitude: 0.0,
        latitude: 0.0,
        depth_km: None,
    }
}
