use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use super::models::Feature;
use crate::error::FeedError;
use crate::model::{EventRecord, RefreshState};

pub const USGS_ALL_DAY_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_day.geojson";

/// Anything that can produce a fresh `RefreshState` on demand.
///
/// Implementations never fail: every error is folded into
/// `RefreshState::Failed`.
pub trait FeedSource: Send + Sync + 'static {
    fn refresh(&self) -> impl Future<Output = RefreshState> + Send;
}

pub struct FeedClient {
    client: Client,
    feed_url: String,
}

impl FeedClient {
    pub fn new(feed_url: String, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, feed_url })
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    pub async fn fetch_records(&self) -> Result<Vec<EventRecord>, FeedError> {
        let response = self.client.get(&self.feed_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let body = response.bytes().await?;
        parse_feed(&body)
    }
}

impl FeedSource for FeedClient {
    fn refresh(&self) -> impl Future<Output = RefreshState> + Send {
        async move {
            match self.fetch_records().await {
                Ok(records) => {
                    tracing::info!(count = records.len(), url = %self.feed_url, "feed refreshed");
                    RefreshState::Ready(records)
                }
                Err(err) => {
                    tracing::warn!(error = %err, url = %self.feed_url, "feed refresh failed");
                    RefreshState::Failed(err.user_message().to_string())
                }
            }
        }
    }
}

/// Decode a GeoJSON feed body.
///
/// A body without a `features` array is a malformed payload. Individual
/// features that cannot be turned into records are skipped, and repeated ids
/// keep their first occurrence.
pub fn parse_feed(body: &[u8]) -> Result<Vec<EventRecord>, FeedError> {
    let document: serde_json::Value = serde_json::from_slice(body)?;

    let features = match document.get("features") {
        Some(serde_json::Value::Array(features)) => features,
        _ => return Err(FeedError::MalformedPayload),
    };

    let mut seen = HashSet::with_capacity(features.len());
    let mut records = Vec::with_capacity(features.len());

    for (index, value) in features.iter().enumerate() {
        let feature = match Feature::deserialize(value) {
            Ok(feature) => feature,
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping undecodable feature");
                continue;
            }
        };

        let id = feature.id.clone();
        let Some(record) = feature.into_record() else {
            tracing::warn!(index, %id, "skipping feature without coordinates");
            continue;
        };

        if !seen.insert(record.id.clone()) {
            tracing::warn!(%id, "skipping duplicate feature id");
            continue;
        }

        records.push(record);
    }

    Ok(records)
}
