//! The radio transport the connection manager drives.
//!
//! The BlueZ implementation lives in the Linux-only `bluer` module; tests substitute scripted doubles.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{Result, Uuid};

/// Opaque, transport-specific device identifier (a Bluetooth address on BlueZ).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub String);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named device seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceCandidate {
    /// Advertised local name.
    pub name: String,
    /// Transport address used to connect.
    pub address: DeviceId,
}

impl std::fmt::Display for DeviceCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.address)
    }
}

/// Stream of raw characteristic values. It ends, or yields an error, when the link drops.
pub type Notifications = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send + 'static>>;

/// Discovery and connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The connection handle produced by [`connect`][Transport::connect].
    type Link: Link;

    /// Scans for `timeout` and returns the named devices seen.
    async fn scan(&self, timeout: Duration) -> Result<Vec<DeviceCandidate>>;

    /// Connects to `candidate`.
    async fn connect(&self, candidate: &DeviceCandidate) -> Result<Self::Link>;
}

/// An established connection to one device.
#[async_trait]
pub trait Link: Send {
    /// Enables notifications on `characteristic` of the primary `service`.
    async fn subscribe(&mut self, service: Uuid, characteristic: Uuid) -> Result<Notifications>;

    /// Disables notifications enabled by [`subscribe`][Link::subscribe].
    async fn unsubscribe(&mut self) -> Result<()>;

    /// Closes the connection.
    async fn disconnect(&mut self) -> Result<()>;
}
