//! Command-line configuration.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::ectopic::{EctopicDetector, DEFAULT_RATIO, DEFAULT_WINDOW};
use crate::manager::ManagerConfig;
use crate::status::DEFAULT_CAPACITY;

/// Bluetooth LE heart rate monitor with ectopic-beat screening.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "hrmon", version, about)]
pub struct Config {
    /// Name of the sensor to connect to. Without it, candidates are offered for selection once discovery gives up.
    #[arg(long)]
    pub device: Option<String>,

    /// Length of each discovery scan, in seconds.
    #[arg(long, value_name = "SECS", default_value = "5", value_parser = parse_secs)]
    pub scan_timeout: Duration,

    /// Pause between unsuccessful discovery rounds, in seconds.
    #[arg(long, value_name = "SECS", default_value = "1", value_parser = parse_secs)]
    pub retry_delay: Duration,

    /// Unsuccessful discovery rounds before candidates are offered.
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub candidate_threshold: u32,

    /// Samples kept in each of the HR and RR windows.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CAPACITY, value_parser = parse_capacity)]
    pub buffer_capacity: usize,

    /// RR intervals the reference median is taken over. At most `--buffer-capacity`.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_WINDOW)]
    pub anomaly_window: usize,

    /// Flag an RR interval shorter than the median by more than this fraction of it.
    #[arg(long, value_name = "F", default_value_t = DEFAULT_RATIO, value_parser = parse_ratio)]
    pub anomaly_ratio: f64,

    /// Directory for the per-run CSV sample log.
    #[arg(long, value_name = "DIR", default_value = "./log_data")]
    pub log_dir: PathBuf,

    /// Do not write the CSV sample log.
    #[arg(long)]
    pub no_log: bool,

    /// Address the status API listens on.
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:12080")]
    pub http_addr: SocketAddr,

    /// Landing page served at `/`.
    #[arg(long, value_name = "FILE", default_value = "index.html")]
    pub index: PathBuf,

    /// How often the landing page is re-read, in seconds.
    #[arg(long, value_name = "SECS", default_value = "5", value_parser = parse_secs)]
    pub page_refresh: Duration,
}

impl Config {
    /// Parses the process arguments, exiting with a usage error if they are invalid.
    pub fn load() -> Self {
        match Self::try_load_from(std::env::args_os()) {
            Ok(config) => config,
            Err(err) => err.exit(),
        }
    }

    /// Parses `args` and checks the flags against each other.
    pub fn try_load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::try_parse_from(args)?;
        if config.anomaly_window > config.buffer_capacity {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                format!(
                    "--anomaly-window {} exceeds --buffer-capacity {}; no interval would ever be flagged",
                    config.anomaly_window, config.buffer_capacity
                ),
            ));
        }
        Ok(config)
    }

    /// Detector parameters from `--anomaly-window` and `--anomaly-ratio`.
    pub fn detector(&self) -> EctopicDetector {
        EctopicDetector {
            window: self.anomaly_window,
            ratio: self.anomaly_ratio,
        }
    }

    /// Connection policy for [`ConnectionManager`][crate::ConnectionManager].
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            target: self.device.clone(),
            scan_timeout: self.scan_timeout,
            retry_delay: self.retry_delay,
            candidate_threshold: self.candidate_threshold,
            detector: self.detector(),
        }
    }
}

fn parse_capacity(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(err) => Err(format!("{err}")),
    }
}

fn parse_ratio(s: &str) -> Result<f64, String> {
    let ratio: f64 = s.parse().map_err(|err| format!("{err}"))?;
    if (0.0..1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err("must be at least 0 and less than 1".to_string())
    }
}

fn parse_secs(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|err| format!("{err}"))?;
    Duration::try_from_secs_f64(secs).map_err(|err| format!("{err}"))
}
