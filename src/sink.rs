//! Append-only record of every RR interval received.

use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One logged RR interval together with the heart rate it arrived with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RrRecord {
    /// Local time the notification was handled.
    pub timestamp: DateTime<Local>,
    /// Beats per minute.
    pub heart_rate: u16,
    /// Seconds.
    pub rr_interval: f64,
}

/// Receives decoded samples from the connection manager.
///
/// Errors are logged by the caller and never interrupt the monitor.
pub trait SampleSink: Send {
    /// Appends one record.
    fn append(&mut self, record: &RrRecord) -> Result<()>;
}

/// Discards everything.
impl SampleSink for () {
    fn append(&mut self, _record: &RrRecord) -> Result<()> {
        Ok(())
    }
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn append(&mut self, record: &RrRecord) -> Result<()> {
        (**self).append(record)
    }
}

/// Line-buffered CSV log, one `timestamp, hr,rr` line per interval.
#[derive(Debug)]
pub struct CsvLog {
    path: PathBuf,
    writer: LineWriter<File>,
}

impl CsvLog {
    /// Opens `hr_log_<start time>.csv` in `dir`, creating the directory if needed.
    pub fn create_in(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let name = format!("hr_log_{}.csv", Local::now().format(TIMESTAMP_FORMAT));
        Self::open(dir.join(name))
    }

    /// Opens `path` for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!("logging samples to {}", path.display());
        Ok(CsvLog {
            path,
            writer: LineWriter::new(file),
        })
    }

    /// The file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSink for CsvLog {
    fn append(&mut self, record: &RrRecord) -> Result<()> {
        writeln!(
            self.writer,
            "{}, {},{:?}",
            record.timestamp.format(TIMESTAMP_FORMAT),
            record.heart_rate,
            record.rr_interval
        )?;
        Ok(())
    }
}

impl Drop for CsvLog {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            tracing::warn!("failed to flush {}: {}", self.path.display(), err);
        }
    }
}
