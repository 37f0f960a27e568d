#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_lite::stream::{self, StreamExt};
use hrmon::error::ErrorKind;
use hrmon::{
    DeviceCandidate, DeviceId, Error, Link, MonitorEvent, Notifications, Result, RrRecord, SampleSink, Transport,
    Uuid,
};
use tokio::sync::{mpsc, watch};

pub fn candidate(name: &str, address: &str) -> DeviceCandidate {
    DeviceCandidate {
        name: name.to_string(),
        address: DeviceId(address.to_string()),
    }
}

/// What the next successful connection does.
#[derive(Debug, Clone, Default)]
pub struct LinkScript {
    pub payloads: Vec<Vec<u8>>,
    /// Keep the link up after the payloads instead of dropping it.
    pub hold_open: bool,
    /// Yield a transport error after the payloads, leaving the stream open.
    pub link_error: bool,
    pub fail_subscribe: bool,
}

/// In-memory radio: fixed scan results, scripted connections, and a log of link operations.
pub struct ScriptedTransport {
    pub seen: Vec<DeviceCandidate>,
    pub scan_errors: Mutex<VecDeque<Error>>,
    pub links: Mutex<VecDeque<LinkScript>>,
    pub connect_failures: AtomicUsize,
    pub connect_delay: Duration,
    pub scans: Arc<AtomicUsize>,
    pub connects: Arc<Mutex<Vec<DeviceCandidate>>>,
    pub ops: Arc<Mutex<Vec<&'static str>>>,
    pub stop_after_scans: Option<(usize, Arc<watch::Sender<bool>>)>,
}

impl ScriptedTransport {
    pub fn new(seen: Vec<DeviceCandidate>) -> Self {
        ScriptedTransport {
            seen,
            scan_errors: Mutex::new(VecDeque::new()),
            links: Mutex::new(VecDeque::new()),
            connect_failures: AtomicUsize::new(0),
            connect_delay: Duration::ZERO,
            scans: Arc::new(AtomicUsize::new(0)),
            connects: Arc::new(Mutex::new(Vec::new())),
            ops: Arc::new(Mutex::new(Vec::new())),
            stop_after_scans: None,
        }
    }

    pub fn with_link(self, script: LinkScript) -> Self {
        self.links.lock().unwrap().push_back(script);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    type Link = ScriptedLink;

    async fn scan(&self, _timeout: Duration) -> Result<Vec<DeviceCandidate>> {
        let n = self.scans.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, stop)) = &self.stop_after_scans {
            if n >= *limit {
                let _ = stop.send(true);
            }
        }
        if let Some(err) = self.scan_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.seen.clone())
    }

    async fn connect(&self, candidate: &DeviceCandidate) -> Result<ScriptedLink> {
        self.connects.lock().unwrap().push(candidate.clone());
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        let failing = self
            .connect_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |x| x.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::new(ErrorKind::ConnectionFailed, None, "refused"));
        }

        let script = self.links.lock().unwrap().pop_front().unwrap_or(LinkScript {
            hold_open: true,
            ..Default::default()
        });
        Ok(ScriptedLink {
            script,
            ops: self.ops.clone(),
        })
    }
}

pub struct ScriptedLink {
    script: LinkScript,
    ops: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Link for ScriptedLink {
    async fn subscribe(&mut self, service: Uuid, characteristic: Uuid) -> Result<Notifications> {
        assert_eq!(service, hrmon::btuuid::services::HEART_RATE);
        assert_eq!(characteristic, hrmon::btuuid::characteristics::HEART_RATE_MEASUREMENT);
        self.ops.lock().unwrap().push("subscribe");
        if self.script.fail_subscribe {
            return Err(Error::new(ErrorKind::NotFound, None, "no heart rate service"));
        }

        let payloads = stream::iter(std::mem::take(&mut self.script.payloads).into_iter().map(Ok::<_, Error>));
        if self.script.link_error {
            let lost = stream::once(Err(Error::new(ErrorKind::NotConnected, None, "link lost")));
            Ok(payloads.chain(lost).chain(stream::pending()).boxed())
        } else if self.script.hold_open {
            Ok(payloads.chain(stream::pending()).boxed())
        } else {
            Ok(payloads.boxed())
        }
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        self.ops.lock().unwrap().push("unsubscribe");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.ops.lock().unwrap().push("disconnect");
        Ok(())
    }
}

/// Sink whose records stay readable after the manager takes ownership.
#[derive(Clone, Default)]
pub struct SharedSink(pub Arc<Mutex<Vec<RrRecord>>>);

impl SampleSink for SharedSink {
    fn append(&mut self, record: &RrRecord) -> Result<()> {
        self.0.lock().unwrap().push(*record);
        Ok(())
    }
}

/// Sink that rejects every record, counting the attempts.
#[derive(Clone, Default)]
pub struct FailingSink(pub Arc<AtomicUsize>);

impl SampleSink for FailingSink {
    fn append(&mut self, _record: &RrRecord) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(Error::new(ErrorKind::Io, None, "disk full"))
    }
}

pub async fn next_event(events: &mut mpsc::Receiver<MonitorEvent>) -> Option<MonitorEvent> {
    tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("timed out waiting for a monitor event")
}

/// Flag byte with the RR bit set, 8-bit heart rate, then each RR in 1/1024 s units.
pub fn rr_payload(heart_rate: u8, rr_units: &[u16]) -> Vec<u8> {
    let mut payload = vec![0x10, heart_rate];
    for rr in rr_units {
        payload.extend_from_slice(&rr.to_le_bytes());
    }
    payload
}
