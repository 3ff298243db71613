use serde::{Deserialize, Serialize};

use crate::model::EventRecord;

/// One GeoJSON feature of the USGS summary feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub geometry: Geometry,
    pub properties: Properties,
}

/// `coordinates` is `[longitude, latitude, depth]`; depth may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub coordinates: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub mag: Option<f64>,
    #[serde(default)]
    pub place: Option<String>,
    pub time: i64,
}

impl Feature {
    pub fn longitude(&self) -> Option<f64> {
        self.coordinate(0)
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinate(1)
    }

    pub fn depth_km(&self) -> Option<f64> {
        self.coordinate(2)
    }

    fn coordinate(&self, index: usize) -> Option<f64> {
        self.geometry.coordinates.get(index).copied().flatten()
    }

    /// Flatten into the record the dashboard works with. Features without a
    /// position cannot be drawn and yield `None`.
    pub fn into_record(self) -> Option<EventRecord> {
        let longitude = self.longitude()?;
        let latitude = self.latitude()?;
        let depth_km = self.depth_km();

        Some(EventRecord {
            id: self.id,
            magnitude: self.properties.mag,
            place: self.properties.place,
            time_epoch_millis: self.properties.time,
            longitude,
            latitude,
            depth_km,
        })
    }
}
