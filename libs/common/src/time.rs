use chrono::Duration;

/// Render a duration as whole hours and minutes, e.g. `"26h 14m"`.
///
/// Sub-minute remainders are floored away; negative durations (clock skew)
/// render as zero.
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_to_whole_minutes() {
        assert_eq!(format_duration(Duration::seconds(0)), "0h 0m");
        assert_eq!(format_duration(Duration::seconds(59)), "0h 0m");
        assert_eq!(format_duration(Duration::seconds(61)), "0h 1m");
        assert_eq!(format_duration(Duration::hours(26) + Duration::minutes(14)), "26h 14m");
    }

    #[test]
    fn negative_durations_render_zero() {
        assert_eq!(format_duration(Duration::minutes(-5)), "0h 0m");
    }
}
