#![warn(missing_docs)]

//! hrmon connects to a Bluetooth LE heart rate sensor, decodes its Heart Rate Measurement notifications, keeps short
//! rolling windows of heart rate and RR interval samples, and flags beats whose RR interval is abnormally short
//! relative to the recent rhythm ("ectopic-like" beats).
//!
//! The flagging rule is a heuristic screen, not a clinical classification.
//!
//! # Usage
//!
//! ```rust,no_run
//!# use hrmon::{ConnectionManager, ManagerConfig, Status};
//!# #[cfg(target_os = "linux")]
//!# #[tokio::main]
//!# async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!let transport = hrmon::bluer::BluezTransport::new().await?;
//!let status = Status::default();
//!let (_stop, shutdown) = tokio::sync::watch::channel(false);
//!let config = ManagerConfig {
//!    target: Some("Polar H10 12345678".into()),
//!    ..Default::default()
//!};
//!
//!let (manager, _controls) = ConnectionManager::new(transport, config, status.clone(), (), shutdown);
//!tokio::spawn(manager.run());
//!
//!tokio::time::sleep(std::time::Duration::from_secs(30)).await;
//!println!("{:?}", status.buffers());
//!#    Ok(())
//!# }
//!# #[cfg(not(target_os = "linux"))]
//!# fn main() {}
//! ```
//!
//! # Overview
//!
//! - [`measurement::decode`] turns a raw `0x2A37` payload into a [`DecodedSample`].
//! - [`ectopic::is_anomalous`] screens one RR interval against the recorded history.
//! - [`SampleWindow`] is the fixed-capacity FIFO behind both windows.
//! - [`ConnectionManager`] runs the discover/connect/subscribe/reconnect state machine over any [`Transport`] and is
//!   the only writer of the shared [`Status`].
//! - [`Status`] hands out snapshots to readers such as the HTTP surface in [`http`].
//!
//! # Platform specifics
//!
//! The only radio transport shipped is BlueZ, through the `bluer` crate, so the binary requires Linux. The rest of
//! the crate is platform independent.

pub mod btuuid;
pub mod buffer;
pub mod config;
pub mod console;
pub mod ectopic;
pub mod error;
pub mod http;
pub mod manager;
pub mod measurement;
pub mod session;
pub mod sink;
pub mod status;
pub mod transport;

#[cfg(target_os = "linux")]
pub mod bluer;

pub use buffer::SampleWindow;
pub use ectopic::EctopicDetector;
pub use error::Error;
pub use manager::{
    Command, ConnectionManager, ConnectionState, Controls, ManagerConfig, MonitorEvent, EVENT_QUEUE_CAPACITY,
};
pub use measurement::DecodedSample;
pub use session::{SessionInfo, SessionStats};
pub use sink::{CsvLog, RrRecord, SampleSink};
pub use status::{BufferSnapshot, Status};
pub use transport::{DeviceCandidate, DeviceId, Link, Notifications, Transport};
pub use uuid::Uuid;

/// Convenience alias for a result with [`Error`]
pub type Result<T, E = Error> = core::result::Result<T, E>;
