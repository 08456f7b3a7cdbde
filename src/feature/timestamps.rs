//! `createdAt`/`updatedAt` maintenance for stores running in tracked mode.

use super::{JsonValue, Properties};

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn numeric(properties: &Properties, key: &str) -> Option<f64> {
    properties.get(key).and_then(JsonValue::as_f64)
}

/// Stamp a freshly created feature. Numeric timestamps already present are kept.
pub(crate) fn stamp_created(properties: &mut Properties, now: i64) {
    for key in [CREATED_AT, UPDATED_AT] {
        if numeric(properties, key).is_none() {
            properties.insert(key.to_string(), JsonValue::from(now));
        }
    }
}

/// Refresh `updatedAt`, never moving it backwards nor below `createdAt`.
pub(crate) fn touch(properties: &mut Properties, now: i64) {
    let floor = [numeric(properties, UPDATED_AT), numeric(properties, CREATED_AT)]
        .into_iter()
        .flatten()
        .map(|timestamp| timestamp.ceil() as i64)
        .fold(now, i64::max);
    properties.insert(UPDATED_AT.to_string(), JsonValue::from(floor));
}
