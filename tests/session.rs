use std::time::Duration;

use chrono::{Local, TimeZone};
use hrmon::SessionStats;

fn stats(elapsed: Duration) -> SessionStats {
    SessionStats {
        start_time: Local.with_ymd_and_hms(2024, 3, 1, 7, 30, 5).unwrap(),
        elapsed,
        anomaly_count: 2,
    }
}

#[test]
fn start_time_display() {
    assert_eq!(stats(Duration::ZERO).start_time_display(), "07:30:05 [01.03.]");
}

#[test]
fn elapsed_display() {
    assert_eq!(stats(Duration::ZERO).elapsed_display(), "0:00:00");
    assert_eq!(stats(Duration::from_millis(59_999)).elapsed_display(), "0:00:59");
    assert_eq!(stats(Duration::from_secs(3725)).elapsed_display(), "1:02:05");
    assert_eq!(stats(Duration::from_secs(26 * 3600)).elapsed_display(), "26:00:00");
}
