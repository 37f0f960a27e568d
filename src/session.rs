//! Per-connection session state.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// When the current session started.
///
/// Set once per successful subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    /// Wall-clock start, for display.
    pub start_wall_clock: DateTime<Local>,
    /// Monotonic start, for elapsed time.
    pub start_monotonic: Instant,
}

impl SessionInfo {
    pub(crate) fn now() -> Self {
        SessionInfo {
            start_wall_clock: Local::now(),
            start_monotonic: Instant::now(),
        }
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.start_monotonic.elapsed()
    }
}

/// Session start plus the anomaly counter for that session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    info: Option<SessionInfo>,
    anomaly_count: u64,
}

impl Session {
    /// Starts a new session, resetting the anomaly counter.
    pub(crate) fn begin(&mut self) -> SessionInfo {
        let info = SessionInfo::now();
        self.info = Some(info);
        self.anomaly_count = 0;
        info
    }

    pub(crate) fn record_anomaly(&mut self) -> u64 {
        self.anomaly_count += 1;
        self.anomaly_count
    }

    /// Statistics as of now, `None` before the first session.
    pub fn stats(&self) -> Option<SessionStats> {
        self.info.map(|info| SessionStats {
            start_time: info.start_wall_clock,
            elapsed: info.elapsed(),
            anomaly_count: self.anomaly_count,
        })
    }
}

/// Point-in-time session statistics handed to status readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Wall-clock start of the session.
    pub start_time: DateTime<Local>,
    /// Time since the session started.
    pub elapsed: Duration,
    /// Anomalies flagged this session.
    pub anomaly_count: u64,
}

impl SessionStats {
    /// `start_time` as `HH:MM:SS [DD.MM.]`.
    pub fn start_time_display(&self) -> String {
        self.start_time.format("%H:%M:%S [%d.%m.]").to_string()
    }

    /// `elapsed` truncated to whole seconds, as `H:MM:SS`.
    pub fn elapsed_display(&self) -> String {
        let secs = self.elapsed.as_secs();
        format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}
