//! Human-readable elapsed/total time formatting for progress observers.
//! Kept to the one format actually needed — `H:MM:SS` — since no progress
//! observer here needs sub-second precision.

/// Format a non-negative number of seconds as `H:MM:SS`.
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as i64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero() {
        assert_eq!(format_hms(0.0), "00:00:00");
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_hms(125.4), "00:02:05");
    }

    #[test]
    fn formats_hours() {
        assert_eq!(format_hms(3661.0), "01:01:01");
    }

    #[test]
    fn clamps_negative() {
        assert_eq!(format_hms(-5.0), "00:00:00");
    }
}
