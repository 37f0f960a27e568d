//! Discovery, connection and reconnection to the heart rate sensor.
//!
//! The manager is a single long-lived task that steps through [`ConnectionState`]s, performing one suspending
//! operation at a time (scan, connect, next notification, backoff, waiting for a device selection). Every suspension
//! point also watches the shutdown signal; on shutdown the subscription and connection are torn down best-effort
//! before [`ConnectionManager::run`] returns.

use std::future::Future;
use std::time::Duration;

use chrono::Local;
use futures_lite::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::btuuid::{self, characteristics, services};
use crate::ectopic::EctopicDetector;
use crate::error::ErrorKind;
use crate::session::SessionInfo;
use crate::sink::{RrRecord, SampleSink};
use crate::status::Status;
use crate::transport::{DeviceCandidate, Link, Transport};
use crate::{measurement, Error, Result};

const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Events buffered in [`Controls::events`]. Once full, further events are dropped until the receiver catches up.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Connection manager states.
#[derive(Debug, displaydoc::Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// idle
    Idle,
    /// discovering
    Discovering,
    /// candidates presented
    CandidatesPresented,
    /// connecting
    Connecting,
    /// subscribed
    Subscribed,
    /// disconnected
    Disconnected,
}

/// Commands accepted from the device-selection collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Make the named device the discovery target.
    Select(String),
    /// Resume scanning with the current target.
    Rescan,
}

/// Events published by the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// The manager entered a new state.
    StateChanged(ConnectionState),
    /// Discovery kept failing; the manager waits for a [`Command`]. Sorted by name.
    CandidatesPresented(Vec<DeviceCandidate>),
    /// Notifications are flowing from a newly subscribed device.
    SessionStarted(SessionInfo),
    /// An RR interval was flagged as ectopic-like.
    Anomaly {
        /// Seconds.
        rr_interval: f64,
        /// Anomalies so far in this session, this one included.
        count: u64,
    },
    /// A notification failed to decode and was dropped.
    PayloadRejected(String),
}

/// Connection policy and detector parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    /// Name of the device to connect to. `None` until one is selected.
    pub target: Option<String>,
    /// Length of each discovery scan.
    pub scan_timeout: Duration,
    /// Pause between unsuccessful discovery rounds.
    pub retry_delay: Duration,
    /// Consecutive unsuccessful rounds before candidates are presented.
    pub candidate_threshold: u32,
    /// Anomaly screening applied to every RR interval.
    pub detector: EctopicDetector,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            target: None,
            scan_timeout: Duration::from_secs(5),
            retry_delay: Duration::from_secs(1),
            candidate_threshold: 5,
            detector: EctopicDetector::default(),
        }
    }
}

/// The collaborator side of a [`ConnectionManager`].
///
/// `events` holds at most [`EVENT_QUEUE_CAPACITY`] unread events; a receiver that is kept but never read only loses
/// events, it never stalls the manager.
#[derive(Debug)]
pub struct Controls {
    /// Device selection commands for the manager.
    pub commands: mpsc::UnboundedSender<Command>,
    /// Events published by the manager.
    pub events: mpsc::Receiver<MonitorEvent>,
}

/// Owns the connection to one heart rate sensor and feeds its measurements into [`Status`] and a [`SampleSink`].
pub struct ConnectionManager<T, S> {
    transport: T,
    sink: S,
    status: Status,
    config: ManagerConfig,
    target: Option<String>,
    failed_rounds: u32,
    state: ConnectionState,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::Sender<MonitorEvent>,
    shutdown: watch::Receiver<bool>,
}

impl<T: Transport, S: SampleSink> ConnectionManager<T, S> {
    /// Creates a manager in the `Idle` state. It stops once `true` is sent on `shutdown`.
    pub fn new(
        transport: T,
        config: ManagerConfig,
        status: Status,
        sink: S,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, Controls) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let manager = ConnectionManager {
            transport,
            sink,
            status,
            target: config.target.clone(),
            config,
            failed_rounds: 0,
            state: ConnectionState::Idle,
            commands: command_rx,
            events: event_tx,
            shutdown,
        };
        let controls = Controls {
            commands: command_tx,
            events: event_rx,
        };
        (manager, controls)
    }

    /// The current state of the state machine.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The device name discovery is currently looking for.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Runs until shutdown (returning `Ok`) or a fatal transport error.
    pub async fn run(mut self) -> Result<()> {
        let res = self.reconnect_loop().await;
        self.set_state(ConnectionState::Idle);
        match res {
            Err(err) if err.kind() == ErrorKind::Cancelled => {
                info!("monitor stopped");
                Ok(())
            }
            res => res,
        }
    }

    async fn reconnect_loop(&mut self) -> Result<()> {
        loop {
            self.set_state(ConnectionState::Discovering);
            let device = self.discover().await?;

            self.set_state(ConnectionState::Connecting);
            info!("connecting to {}", device);
            let link = {
                let mut connecting = self.transport.connect(&device);
                let connected = until_cancelled(&mut self.shutdown, &mut connecting).await;
                match connected {
                    Ok(Ok(link)) => link,
                    Ok(Err(err)) if err.is_fatal() => return Err(err),
                    Ok(Err(err)) => {
                        warn!("connection to {} failed: {}", device, err);
                        continue;
                    }
                    Err(cancelled) => {
                        // Finish an in-flight connect, then close it.
                        if let Ok(Ok(mut link)) = tokio::time::timeout(TEARDOWN_TIMEOUT, connecting).await {
                            disconnect(&mut link).await;
                        }
                        return Err(cancelled);
                    }
                }
            };

            self.stream(link, &device).await?;
        }
    }

    /// Scans until the target shows up, presenting candidates when discovery keeps failing.
    async fn discover(&mut self) -> Result<DeviceCandidate> {
        loop {
            self.drain_commands();

            debug!("scanning for {:?}", self.target);
            let seen = match until_cancelled(&mut self.shutdown, self.transport.scan(self.config.scan_timeout)).await? {
                Ok(seen) => seen,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!("scan failed: {}", err);
                    Vec::new()
                }
            };

            let found = self
                .target
                .as_deref()
                .and_then(|target| seen.iter().find(|x| x.name == target));
            if let Some(device) = found {
                self.failed_rounds = 0;
                return Ok(device.clone());
            }

            self.failed_rounds += 1;
            let err = Error::new(
                ErrorKind::DiscoveryTimeout,
                None,
                format!("round {}, {} named devices seen", self.failed_rounds, seen.len()),
            );
            info!("{}", err);

            if self.failed_rounds >= self.config.candidate_threshold && !seen.is_empty() {
                self.present_candidates(seen).await?;
            } else {
                until_cancelled(&mut self.shutdown, tokio::time::sleep(self.config.retry_delay)).await?;
            }
        }
    }

    async fn present_candidates(&mut self, mut candidates: Vec<DeviceCandidate>) -> Result<()> {
        candidates.sort();
        candidates.dedup();

        self.set_state(ConnectionState::CandidatesPresented);
        self.emit(MonitorEvent::CandidatesPresented(candidates));

        match until_cancelled(&mut self.shutdown, self.commands.recv()).await? {
            Some(command) => self.apply(command),
            None => {
                warn!("no device selector attached, rescanning");
                until_cancelled(&mut self.shutdown, tokio::time::sleep(self.config.retry_delay)).await?;
            }
        }

        self.failed_rounds = 0;
        self.set_state(ConnectionState::Discovering);
        Ok(())
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Select(name) => {
                info!("selected '{}'", name);
                self.target = Some(name);
            }
            Command::Rescan => info!("rescanning"),
        }
    }

    /// Subscribes and handles notifications until the link drops. Returns `Err` only on shutdown.
    async fn stream(&mut self, mut link: T::Link, device: &DeviceCandidate) -> Result<()> {
        let characteristic = characteristics::HEART_RATE_MEASUREMENT;
        let subscribed =
            until_cancelled(&mut self.shutdown, link.subscribe(services::HEART_RATE, characteristic)).await;
        let mut notifications = match subscribed {
            Ok(Ok(notifications)) => notifications,
            Ok(Err(err)) => {
                let err = Error::new(ErrorKind::SubscribeFailed, Some(Box::new(err)), device.to_string());
                warn!("{}", err);
                disconnect(&mut link).await;
                return Ok(());
            }
            Err(cancelled) => {
                disconnect(&mut link).await;
                return Err(cancelled);
            }
        };

        let info = self.status.write().session.begin();
        info!(
            "receiving {} from {} since {}",
            btuuid::short_name(&characteristic),
            device,
            info.start_wall_clock.format("%H:%M:%S")
        );
        self.set_state(ConnectionState::Subscribed);
        self.emit(MonitorEvent::SessionStarted(info));

        let res = loop {
            match until_cancelled(&mut self.shutdown, notifications.next()).await {
                Ok(Some(Ok(payload))) => self.handle_notification(&payload),
                Ok(Some(Err(err))) => {
                    warn!("link to {} failed: {}", device, err);
                    break Ok(());
                }
                Ok(None) => {
                    info!("{} disconnected", device);
                    break Ok(());
                }
                Err(cancelled) => break Err(cancelled),
            }
        };

        self.set_state(ConnectionState::Disconnected);
        drop(notifications);
        best_effort("unsubscribe", link.unsubscribe()).await;
        disconnect(&mut link).await;
        res
    }

    /// Decodes one notification and applies it to the windows and session in a single critical section.
    fn handle_notification(&mut self, payload: &[u8]) {
        let sample = match measurement::decode(payload) {
            Ok(sample) => sample,
            Err(err) => {
                warn!("dropping notification {:02x?}: {}", payload, err);
                self.emit(MonitorEvent::PayloadRejected(err.to_string()));
                return;
            }
        };
        debug!("HR: {} bpm, RR: {:?}", sample.heart_rate, sample.rr_intervals);

        let mut anomalies = Vec::new();
        {
            let mut telemetry = self.status.write();
            telemetry.heart_rate.push(sample.heart_rate);
            for &rr in &sample.rr_intervals {
                if self.config.detector.check(&telemetry.rr_intervals, rr) {
                    let count = telemetry.session.record_anomaly();
                    anomalies.push((rr, count));
                }
                telemetry.rr_intervals.push(rr);
            }
        }

        for (rr_interval, count) in anomalies {
            info!("possible ectopic beat: RR {:.3}s (#{} this session)", rr_interval, count);
            self.emit(MonitorEvent::Anomaly { rr_interval, count });
        }

        for &rr_interval in &sample.rr_intervals {
            let record = RrRecord {
                timestamp: Local::now(),
                heart_rate: sample.heart_rate,
                rr_interval,
            };
            if let Err(err) = self.sink.append(&record) {
                warn!("failed to log sample: {}", err);
            }
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        info!("{} -> {}", self.state, state);
        self.state = state;
        self.status.write().state = state;
        self.emit(MonitorEvent::StateChanged(state));
    }

    fn emit(&self, event: MonitorEvent) {
        match self.events.try_send(event) {
            // Nobody listening is fine.
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => debug!("event queue full, dropping {:?}", event),
        }
    }
}

async fn disconnect<L: Link>(link: &mut L) {
    best_effort("disconnect", link.disconnect()).await
}

/// Bounded teardown step. Failures are logged, never propagated.
async fn best_effort(what: &str, fut: impl Future<Output = Result<()>>) {
    match tokio::time::timeout(TEARDOWN_TIMEOUT, fut).await {
        Ok(Ok(())) => debug!("{} done", what),
        Ok(Err(err)) => warn!("{} failed: {}", what, err),
        Err(_) => warn!("{} timed out", what),
    }
}

pub(crate) async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            // Sender gone without signalling: never cancelled.
            std::future::pending::<()>().await;
        }
    }
}

async fn until_cancelled<F: Future>(shutdown: &mut watch::Receiver<bool>, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancelled(shutdown) => Err(Error::cancelled()),
        out = fut => Ok(out),
    }
}
