//! Human-readable travel figures.

use crate::matrix::{Cost, UNREACHABLE};

const METERS_PER_MILE: f64 = 1609.34;

/// `"1h 5m"` from an hour up, `"12 min"` below.
pub fn format_duration(seconds: Cost) -> String {
    if seconds == UNREACHABLE {
        return "unreachable".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{} min", minutes)
    }
}

/// Miles with one decimal, or meters under a tenth of a mile.
pub fn format_distance(meters: Cost) -> String {
    if meters == UNREACHABLE {
        return "unreachable".to_string();
    }
    let miles = meters as f64 / METERS_PER_MILE;
    if miles < 0.1 {
        format!("{} m", meters)
    } else {
        format!("{:.1} mi", miles)
    }
}
