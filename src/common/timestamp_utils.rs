use chrono::{DateTime, Local, TimeZone, Utc};

// Get current local timestamp as a formatted string
pub fn current_local_timestamp_str(format_str: &str) -> String {
    let now: DateTime<Local> = Local::now();
    now.format(format_str).to_string()
}

/// Fractional seconds since the Unix epoch, as stored in the counts log.
pub fn epoch_seconds(when: &DateTime<Utc>) -> f64 {
    when.timestamp_millis() as f64 / 1000.0
}

/// Local wall-clock rendering of an epoch timestamp; empty when out of range.
pub fn format_epoch_local(ts: f64) -> String {
    Local
        .timestamp_millis_opt((ts * 1000.0) as i64)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
