//! Shared monitor state.
//!
//! The connection manager is the only writer. Readers take copies under a short read lock and never see a partially
//! applied notification.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::buffer::SampleWindow;
use crate::manager::ConnectionState;
use crate::session::{Session, SessionStats};

/// Default capacity of the HR and RR windows.
pub const DEFAULT_CAPACITY: usize = 60;

/// Copy of both sample windows, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BufferSnapshot {
    /// Heart rate samples, beats per minute.
    pub hr_buffer: Vec<u16>,
    /// RR intervals, seconds.
    pub rr_buffer: Vec<f64>,
}

#[derive(Debug)]
pub(crate) struct Telemetry {
    pub(crate) heart_rate: SampleWindow<u16>,
    pub(crate) rr_intervals: SampleWindow<f64>,
    pub(crate) session: Session,
    pub(crate) state: ConnectionState,
}

/// Cloneable handle to the monitor's buffers, session and connection state.
#[derive(Debug, Clone)]
pub struct Status {
    inner: Arc<RwLock<Telemetry>>,
}

impl Default for Status {
    fn default() -> Self {
        Status::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Status {
    /// Creates empty state with windows of `capacity` samples each.
    pub fn with_capacity(capacity: usize) -> Self {
        Status {
            inner: Arc::new(RwLock::new(Telemetry {
                heart_rate: SampleWindow::new(capacity),
                rr_intervals: SampleWindow::new(capacity),
                session: Session::default(),
                state: ConnectionState::Idle,
            })),
        }
    }

    /// Both windows, oldest first.
    pub fn buffers(&self) -> BufferSnapshot {
        let telemetry = self.read();
        BufferSnapshot {
            hr_buffer: telemetry.heart_rate.snapshot(),
            rr_buffer: telemetry.rr_intervals.snapshot(),
        }
    }

    /// Current session statistics, `None` before the first successful connection.
    pub fn stats(&self) -> Option<SessionStats> {
        self.read().session.stats()
    }

    /// The manager's most recently published state.
    pub fn connection_state(&self) -> ConnectionState {
        self.read().state
    }

    fn read(&self) -> RwLockReadGuard<'_, Telemetry> {
        // The writer never leaves the windows half-updated, so a poisoned lock still holds consistent data.
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Telemetry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
