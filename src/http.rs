//! Read-only HTTP surface over [`Status`].
//!
//! - `GET /buffer`: both sample windows, oldest first
//! - `GET /stats`: session statistics, `null` before the first connection
//! - `GET /`: the landing page, re-read from disk periodically

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use warp::{Filter, Rejection, Reply};

use crate::error::ErrorKind;
use crate::manager::{cancelled, ConnectionState};
use crate::status::Status;
use crate::{Error, Result};

const PLACEHOLDER_PAGE: &str =
    "<!DOCTYPE html><html><body><p>hrmon is running. See <a href=\"/buffer\">/buffer</a> and \
     <a href=\"/stats\">/stats</a>.</p></body></html>";

/// `GET /stats` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReply {
    /// `HH:MM:SS [DD.MM.]`
    pub start_time: String,
    /// Whole seconds.
    pub elapsed_time: u64,
    /// `H:MM:SS`
    pub elapsed_time_lit: String,
    /// Anomalies flagged this session.
    pub num_ectopics: u64,
    /// Current connection state.
    pub state: ConnectionState,
}

impl StatsReply {
    /// `None` before the first session.
    pub fn from_status(status: &Status) -> Option<Self> {
        let stats = status.stats()?;
        Some(StatsReply {
            start_time: stats.start_time_display(),
            elapsed_time: stats.elapsed.as_secs(),
            elapsed_time_lit: stats.elapsed_display(),
            num_ectopics: stats.anomaly_count,
            state: status.connection_state(),
        })
    }
}

/// The landing page contents, shared with the server and swapped on reload.
#[derive(Debug, Clone)]
pub struct LandingPage(Arc<RwLock<String>>);

impl Default for LandingPage {
    fn default() -> Self {
        LandingPage(Arc::new(RwLock::new(PLACEHOLDER_PAGE.to_string())))
    }
}

impl LandingPage {
    /// Loads `path`, falling back to a placeholder page if it cannot be read.
    pub fn load(path: &Path) -> Self {
        let page = LandingPage::default();
        match std::fs::read_to_string(path) {
            Ok(html) => page.set(html),
            Err(err) => warn!("cannot read {}: {}, serving placeholder page", path.display(), err),
        }
        page
    }

    /// The page currently served at `/`.
    pub fn html(&self) -> String {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, html: String) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = html;
    }

    /// Re-reads `path` every `every` until shutdown. A failed read keeps the previous page.
    pub async fn refresh(self, path: PathBuf, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = cancelled(&mut shutdown) => break,
                _ = interval.tick() => match tokio::fs::read_to_string(&path).await {
                    Ok(html) => self.set(html),
                    Err(err) => debug!("cannot reload {}: {}", path.display(), err),
                },
            }
        }
    }
}

/// All routes, for serving or for `warp::test`.
pub fn routes(status: Status, page: LandingPage) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_status = warp::any().map(move || status.clone());

    let buffer = warp::path("buffer")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_status.clone())
        .map(|status: Status| warp::reply::json(&status.buffers()));

    let stats = warp::path("stats")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_status)
        .map(|status: Status| warp::reply::json(&StatsReply::from_status(&status)));

    let index = warp::path::end()
        .and(warp::get())
        .map(move || warp::reply::html(page.html()));

    buffer.or(stats).or(index)
}

/// Serves [`routes`] on `addr` until shutdown.
pub async fn serve(
    addr: SocketAddr,
    status: Status,
    page: LandingPage,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let (bound, server) = warp::serve(routes(status, page))
        .try_bind_with_graceful_shutdown(addr, async move { cancelled(&mut shutdown).await })
        .map_err(|err| Error::new(ErrorKind::Http, Some(Box::new(err)), format!("cannot bind {addr}")))?;
    info!("status API listening on http://{}", bound);
    server.await;
    Ok(())
}
