use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use bluer::{AdapterEvent, AdapterProperty, Session};
use futures_lite::StreamExt;
use tracing::{debug, info};

use super::device::BluezLink;
use crate::error::ErrorKind;
use crate::transport::{DeviceCandidate, DeviceId, Transport};
use crate::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// The system's default Bluetooth adapter, driven through BlueZ.
pub struct BluezTransport {
    // Keeps the D-Bus connection alive for as long as the adapter is in use.
    _session: Session,
    inner: bluer::Adapter,
}

impl BluezTransport {
    /// Opens the default adapter and waits until it is powered.
    ///
    /// Fails with [`AdapterUnavailable`][ErrorKind::AdapterUnavailable] if BlueZ or the adapter cannot be reached.
    pub async fn new() -> Result<Self> {
        let session = Session::new().await.map_err(unavailable)?;
        let inner = session.default_adapter().await.map_err(unavailable)?;
        let transport = BluezTransport {
            _session: session,
            inner,
        };
        transport.wait_available().await?;
        info!("using Bluetooth adapter {}", transport.inner.name());
        Ok(transport)
    }

    /// Asynchronously blocks until the adapter is powered
    pub async fn wait_available(&self) -> Result<()> {
        let events = self.inner.events().await.map_err(unavailable)?;
        if !self.inner.is_powered().await.map_err(unavailable)? {
            info!("waiting for adapter {} to power on", self.inner.name());
            let mut events = Box::pin(events);
            loop {
                match events.next().await {
                    Some(AdapterEvent::PropertyChanged(AdapterProperty::Powered(true))) => break,
                    Some(_) => {}
                    None => {
                        return Err(Error::new(
                            ErrorKind::AdapterUnavailable,
                            None,
                            "adapter event stream closed unexpectedly",
                        ))
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for BluezTransport {
    type Link = BluezLink;

    async fn scan(&self, timeout: Duration) -> Result<Vec<DeviceCandidate>> {
        let mut addresses = BTreeSet::new();
        {
            // Discovery stops when the stream is dropped.
            let mut events = Box::pin(self.inner.discover_devices().await?);
            let collect = async {
                while let Some(event) = events.next().await {
                    if let AdapterEvent::DeviceAdded(addr) = event {
                        addresses.insert(addr);
                    }
                }
            };
            let _ = tokio::time::timeout(timeout, collect).await;
        }

        let mut candidates = Vec::new();
        for addr in addresses {
            let device = self.inner.device(addr)?;
            if let Ok(Some(name)) = device.name().await {
                candidates.push(DeviceCandidate {
                    name,
                    address: DeviceId(addr.to_string()),
                });
            }
        }
        debug!("scan saw {} named devices", candidates.len());
        Ok(candidates)
    }

    async fn connect(&self, candidate: &DeviceCandidate) -> Result<BluezLink> {
        let addr: bluer::Address = candidate.address.0.parse().map_err(|err| {
            Error::new(
                ErrorKind::ConnectionFailed,
                Some(Box::new(err)),
                format!("invalid address {}", candidate.address),
            )
        })?;
        let device = self.inner.device(addr)?;

        match tokio::time::timeout(CONNECT_TIMEOUT, device.connect()).await {
            Ok(Ok(())) => Ok(BluezLink::new(device)),
            Ok(Err(err)) => Err(Error::new(
                ErrorKind::ConnectionFailed,
                Some(Box::new(err)),
                candidate.to_string(),
            )),
            Err(_) => Err(Error::new(
                ErrorKind::ConnectionFailed,
                None,
                format!("{} timed out after {:?}", candidate, CONNECT_TIMEOUT),
            )),
        }
    }
}

fn unavailable(err: bluer::Error) -> Error {
    Error::new(ErrorKind::AdapterUnavailable, Some(Box::new(err)), String::new())
}
