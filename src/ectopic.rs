//! Ectopic-like beat screening.
//!
//! A beat is flagged when its RR interval is more than `ratio` shorter than the median of the recent rhythm, a proxy
//! for a premature beat (see <https://pmc.ncbi.nlm.nih.gov/articles/PMC3232430/#sec2>). This is a heuristic screen,
//! not a classifier.

use crate::buffer::SampleWindow;

/// Default number of recent intervals the median is taken over.
pub const DEFAULT_WINDOW: usize = 15;

/// Default shortening ratio beyond which a beat is flagged.
pub const DEFAULT_RATIO: f64 = 0.2;

/// Returns whether `candidate` is abnormally short relative to `history`, using [`DEFAULT_RATIO`].
///
/// `history` must be the RR window as it stood before `candidate` was appended. Fewer than `window_size` recorded
/// intervals is never anomalous.
pub fn is_anomalous(history: &SampleWindow<f64>, candidate: f64, window_size: usize) -> bool {
    EctopicDetector {
        window: window_size,
        ratio: DEFAULT_RATIO,
    }
    .check(history, candidate)
}

/// Detector parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EctopicDetector {
    /// Number of recent intervals the median is taken over.
    pub window: usize,
    /// Flag when `median - candidate > ratio * median`.
    pub ratio: f64,
}

impl Default for EctopicDetector {
    fn default() -> Self {
        EctopicDetector {
            window: DEFAULT_WINDOW,
            ratio: DEFAULT_RATIO,
        }
    }
}

impl EctopicDetector {
    /// See [`is_anomalous`].
    pub fn check(&self, history: &SampleWindow<f64>, candidate: f64) -> bool {
        match self.reference_median(history) {
            Some(median) => median - candidate > self.ratio * median,
            None => false,
        }
    }

    /// Median of the up to `window` intervals preceding the newest recorded one.
    ///
    /// `None` while the history is shorter than `window`.
    pub fn reference_median(&self, history: &SampleWindow<f64>) -> Option<f64> {
        let len = history.len();
        if self.window == 0 || len < self.window {
            return None;
        }

        let mut recent: Vec<f64> = history
            .iter()
            .rev()
            .skip(1)
            .take(self.window)
            .copied()
            .collect();
        median(&mut recent)
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
