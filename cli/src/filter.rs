use std::cmp::Ordering;

use crate::model::EventRecord;

pub const MIN_MAGNITUDE_CEILING: f64 = 8.0;
pub const MIN_MAGNITUDE_STEP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    Time,
    Magnitude,
    Depth,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Time => "Most Recent",
            SortKey::Magnitude => "Largest Magnitude",
            SortKey::Depth => "Deepest",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortKey::Time => SortKey::Magnitude,
            SortKey::Magnitude => SortKey::Depth,
            SortKey::Depth => SortKey::Time,
        }
    }
}

/// List-only view parameters. The map ignores these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewFilter {
    pub min_magnitude: f64,
    pub sort_key: SortKey,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            min_magnitude: 0.0,
            sort_key: SortKey::Time,
        }
    }
}

impl ViewFilter {
    /// Threshold snapped to the slider grid: 0..=8 in 0.5 steps.
    pub fn with_min_magnitude(self, min_magnitude: f64) -> Self {
        let snapped = (min_magnitude / MIN_MAGNITUDE_STEP).round() * MIN_MAGNITUDE_STEP;
        Self {
            min_magnitude: snapped.clamp(0.0, MIN_MAGNITUDE_CEILING),
            ..self
        }
    }

    pub fn raised(self) -> Self {
        self.with_min_magnitude(self.min_magnitude + MIN_MAGNITUDE_STEP)
    }

    pub fn lowered(self) -> Self {
        self.with_min_magnitude(self.min_magnitude - MIN_MAGNITUDE_STEP)
    }

    pub fn with_sort_key(self, sort_key: SortKey) -> Self {
        Self { sort_key, ..self }
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        record.magnitude_or_zero() >= self.min_magnitude
    }
}

/// Filter and order `records` for the list. Always returns a fresh vector,
/// sorted descending by the filter's key; ties keep feed order.
pub fn apply(records: &[EventRecord], filter: &ViewFilter) -> Vec<EventRecord> {
    let mut view: Vec<EventRecord> = records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect();

    view.sort_by(|a, b| compare_descending(a, b, filter.sort_key));
    view
}

fn compare_descending(a: &EventRecord, b: &EventRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Time => b.time_epoch_millis.cmp(&a.time_epoch_millis),
        SortKey::Magnitude => b.magnitude_or_zero().total_cmp(&a.magnitude_or_zero()),
        // Deepest first.
        SortKey::Depth => b.depth_or_zero().total_cmp(&a.depth_or_zero()),
    }
}
