use chrono::{DateTime, Duration, Utc};

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Format how long ago `at` was, e.g. "5m ago", "3h ago", "2d ago".
pub fn age_display(at: DateTime<Utc>) -> String {
    format_age(Utc::now() - at)
}

/// Hours and days round half up; anything under a minute, or in the
/// future, is "just now".
fn format_age(age: Duration) -> String {
    match age.num_minutes() {
        m if m < 1 => "just now".to_string(),
        m if m < MINUTES_PER_HOUR => format!("{}m ago", m),
        m if m < MINUTES_PER_DAY => format!("{}h ago", round_half_up(m, MINUTES_PER_HOUR)),
        m => format!("{}d ago", round_half_up(m, MINUTES_PER_DAY)),
    }
}

fn round_half_up(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}
