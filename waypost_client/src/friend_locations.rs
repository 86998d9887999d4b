use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::models::LocationSample;

/// Collapses a newest-first sample list down to one entry per user.
///
/// The server returns samples ordered by `recorded_at` descending, so a
/// single pass keeping the first occurrence per user id yields the most
/// recent pin for each friend without a secondary sort.
pub fn latest_per_user(samples: Vec<LocationSample>) -> Vec<LocationSample> {
    let mut seen: HashSet<String> = HashSet::with_capacity(samples.len());
    let mut latest = Vec::new();
    for sample in samples {
        if seen.insert(sample.user_id.clone()) {
            latest.push(sample);
        }
    }
    latest
}

/// Case-insensitive substring match over usernames. This is the one
/// filter that deliberately runs client-side; everything else is a
/// server-side predicate.
pub fn search(samples: &[LocationSample], query: &str) -> Vec<LocationSample> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return samples.to_vec();
    }
    samples
        .iter()
        .filter(|s| s.username.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Coarse age buckets for pin labels. Bounds are half-open at the low
/// end: exactly one hour reads "1 hours ago", exactly seven days reads
/// "Over a week ago".
pub fn format_relative_age(age: Duration) -> String {
    if age < Duration::hours(1) {
        "Just now".to_string()
    } else if age < Duration::hours(24) {
        format!("{} hours ago", age.num_hours())
    } else if age < Duration::days(7) {
        format!("{} days ago", age.num_days())
    } else {
        "Over a week ago".to_string()
    }
}

/// Age label for an RFC 3339 timestamp, or `None` when it fails to
/// parse.
pub fn relative_age_at(recorded_at: &str, now: DateTime<Utc>) -> Option<String> {
    let recorded = DateTime::parse_from_rfc3339(recorded_at).ok()?;
    Some(format_relative_age(now - recorded.with_timezone(&Utc)))
}
