//! Conversion between seconds and `H:MM:SS` / `M:SS` display strings

/// Format seconds as `H:MM:SS` (when an hour or more) or `M:SS`
///
/// Fractional seconds are truncated. Non-finite input yields `--:--`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "--:--".to_string();
    }

    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Parse `H:MM:SS`, `M:SS` or a plain number of seconds
///
/// Returns `None` for anything else, including negative components.
pub fn parse_timestamp(input: &str) -> Option<f64> {
    let parts = input
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;

    if parts.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return None;
    }

    match parts.as_slice() {
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        [m, s] => Some(m * 60.0 + s),
        [s] => Some(*s),
        _ => None,
    }
}
