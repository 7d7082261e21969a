//! Calendar-aligned time buckets for the activity timeline
//!
//! Bucket boundaries depend only on the calendar, never on the data: two
//! differently-ordered calls over the same events always produce identical
//! buckets.
//! - Day buckets: "YYYY-MM-DD"
//! - Week buckets: "YYYY-Www" (ISO-8601 weeks, Monday-aligned, UTC)

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};

use crate::engagement::models::{ActivityEvent, EntityKind};

use super::models::{ActivityBucket, BucketWidth};

fn to_datetime(timestamp_ms: i64) -> DateTime<Utc> {
    // Out-of-range timestamps clamp to the epoch rather than "now" so the
    // result stays deterministic
    DateTime::from_timestamp_millis(timestamp_ms).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Compute the day bucket string from a Unix timestamp in milliseconds.
pub fn day_bucket(timestamp_ms: i64) -> String {
    let dt = to_datetime(timestamp_ms);
    format!("{:04}-{:02}-{:02}", dt.year(), dt.month(), dt.day())
}

/// Compute the ISO week bucket string from a Unix timestamp in milliseconds.
///
/// Uses the ISO week-numbering year, so days at a year boundary land in the
/// week that owns them (e.g., 2024-12-30 is "2025-W01").
pub fn week_bucket(timestamp_ms: i64) -> String {
    let iso = to_datetime(timestamp_ms).iso_week();
    format!("{:04}-W{:02}", iso.year(), iso.week())
}

/// The bucket key for a timestamp at the given width
pub fn bucket_key(width: BucketWidth, timestamp_ms: i64) -> String {
    match width {
        BucketWidth::Day => day_bucket(timestamp_ms),
        BucketWidth::Week => week_bucket(timestamp_ms),
    }
}

/// Bucket events into ordered per-bucket counts, partitioned by whether the
/// referenced entity is a finding or an asset.
///
/// Output is ordered by bucket key (oldest first). Zero-padded keys sort
/// lexicographically in calendar order.
pub fn bucket_events(events: &[ActivityEvent], width: BucketWidth) -> Vec<ActivityBucket> {
    let mut buckets: BTreeMap<String, ActivityBucket> = BTreeMap::new();
    for event in events {
        let key = bucket_key(width, event.timestamp);
        let bucket = buckets
            .entry(key.clone())
            .or_insert_with(|| ActivityBucket {
                bucket: key,
                ..Default::default()
            });
        match event.entity.as_ref().map(|r| r.kind) {
            Some(EntityKind::Finding) => bucket.finding_events += 1,
            Some(EntityKind::Asset) => bucket.asset_events += 1,
            _ => bucket.other_events += 1,
        }
    }
    buckets.into_values().collect()
}
