use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::api::FeedClient;
use crate::filter::{self, ViewFilter};
use crate::model::EventRecord;
use crate::ui::list::relative_time;

/// Fetch the feed once and print the filtered, sorted list to stdout.
pub async fn print_list(client: &FeedClient, filter: ViewFilter, limit: usize) -> Result<()> {
    let records = match client.fetch_records().await {
        Ok(records) => records,
        Err(err) => {
            tracing::error!(error = %err, url = client.feed_url(), "feed fetch failed");
            return Err(anyhow!(err.user_message()));
        }
    };

    let visible = filter::apply(&records, &filter);
    tracing::info!(total = records.len(), shown = visible.len(), "listing feed");

    println!(
        "Recent Earthquakes ({} of {}) · min M{} · sorted by {}",
        visible.len().min(limit),
        visible.len(),
        filter.min_magnitude,
        filter.sort_key.label()
    );
    println!();

    if visible.is_empty() {
        println!("No earthquakes found. Try adjusting the magnitude filter.");
        return Ok(());
    }

    let now = Utc::now();
    for record in visible.iter().take(limit) {
        println!("{}", format_row(record, now));
    }

    Ok(())
}

fn format_row(record: &EventRecord, now: DateTime<Utc>) -> String {
    format!(
        "{:<7} {:<9} {:>10}  {:>9}  {:<20}  {}",
        format!("M{}", record.magnitude_label()),
        record.category().label(),
        relative_time(record.time_epoch_millis, now),
        record.depth_label(),
        record.coordinates_label(),
        record.place_label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record;
    use chrono::TimeZone;

    #[test]
    fn row_lists_every_column() {
        let now = Utc.timestamp_millis_opt(10 * 3_600_000).unwrap();
        let quake = EventRecord {
            magnitude: Some(5.1),
            place: Some("Kermadec Islands".to_string()),
            depth_km: Some(33.0),
            latitude: -29.5,
            longitude: -177.25,
            time_epoch_millis: 7 * 3_600_000,
            ..record("us1")
        };

        let row = format_row(&quake, now);
        assert!(row.starts_with("M5.1    Moderate"));
        assert!(row.contains("3h ago"));
        assert!(row.contains("33.0km"));
        assert!(row.contains("-29.500, -177.250"));
        assert!(row.ends_with("Kermadec Islands"));
    }

    #[test]
    fn row_uses_fallbacks_for_missing_fields() {
        let now = Utc.timestamp_millis_opt(60_000).unwrap();
        let row = format_row(&record("x"), now);
        assert!(row.starts_with("MN/A    Minor"));
        assert!(row.contains("1m ago"));
        assert!(row.contains("N/A"));
        assert!(row.ends_with("Unknown Location"));
    }
}
