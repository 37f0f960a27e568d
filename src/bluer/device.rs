use std::time::Duration;

use async_trait::async_trait;
use bluer::gatt::remote::Characteristic;
use bluer::{DeviceEvent, DeviceProperty};
use futures_lite::StreamExt;
use tracing::debug;

use crate::btuuid;
use crate::error::ErrorKind;
use crate::transport::{Link, Notifications};
use crate::{Error, Result, Uuid};

const SERVICES_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);
const SERVICES_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A connected BlueZ device.
#[derive(Debug)]
pub struct BluezLink {
    inner: bluer::Device,
    characteristic: Option<Characteristic>,
}

impl BluezLink {
    pub(super) fn new(inner: bluer::Device) -> Self {
        BluezLink {
            inner,
            characteristic: None,
        }
    }

    async fn wait_services_resolved(&self) -> Result<()> {
        let resolve = async {
            while !self.inner.is_services_resolved().await? {
                tokio::time::sleep(SERVICES_POLL_INTERVAL).await;
            }
            Ok::<_, Error>(())
        };
        tokio::time::timeout(SERVICES_RESOLVE_TIMEOUT, resolve)
            .await
            .map_err(|_| Error::new(ErrorKind::Timeout, None, "GATT services never resolved"))?
    }

    async fn find_characteristic(&self, service: Uuid, characteristic: Uuid) -> Result<Characteristic> {
        self.wait_services_resolved().await?;
        for candidate in self.inner.services().await? {
            if candidate.uuid().await? != service {
                continue;
            }
            for x in candidate.characteristics().await? {
                if x.uuid().await? == characteristic {
                    return Ok(x);
                }
            }
        }

        Err(Error::new(
            ErrorKind::NotFound,
            None,
            format!(
                "characteristic {} of service {}",
                btuuid::short_name(&characteristic),
                btuuid::short_name(&service)
            ),
        ))
    }
}

#[async_trait]
impl Link for BluezLink {
    async fn subscribe(&mut self, service: Uuid, characteristic: Uuid) -> Result<Notifications> {
        let characteristic = self.find_characteristic(service, characteristic).await?;
        let values = characteristic.notify().await?.map(Ok::<_, Error>);

        // The value stream alone may outlive a silent link loss; surface the disconnect as an error item.
        let dropped = self.inner.events().await?.filter_map(|event| match event {
            DeviceEvent::PropertyChanged(DeviceProperty::Connected(false)) => {
                Some(Err::<Vec<u8>, _>(Error::new(ErrorKind::NotConnected, None, "device disconnected")))
            }
            _ => None,
        });

        self.characteristic = Some(characteristic);
        Ok(values.or(dropped).boxed())
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        // BlueZ stops notifying once the last notify session, i.e. the value stream, is dropped.
        if let Some(characteristic) = self.characteristic.take() {
            if characteristic.notifying().await.ok().flatten().unwrap_or(false) {
                debug!("notifications still enabled by another client");
            }
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.inner.is_connected().await.unwrap_or(false) {
            self.inner.disconnect().await?;
        }
        Ok(())
    }
}
