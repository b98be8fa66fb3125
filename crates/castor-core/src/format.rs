//! Time display helpers

/// Format seconds as `m:ss`, or `h:mm:ss` from one hour up.
///
/// Negative and non-finite input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// A duration usable as a denominator: finite and strictly positive
pub fn normalize_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

/// `offset / total * 100`, or `None` when the result would not be a real percentage
pub fn percent_of(offset: f64, total: f64) -> Option<f64> {
    let total = normalize_duration(total)?;
    if !offset.is_finite() {
        return None;
    }
    Some((offset / total * 100.0).clamp(0.0, 100.0))
}
