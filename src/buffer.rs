//! Fixed-capacity sample windows.

use std::collections::VecDeque;

/// A fixed-capacity, oldest-first window of samples.
///
/// Pushing into a full window evicts the oldest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> SampleWindow<T> {
    /// Creates an empty window holding at most `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be non-zero");
        SampleWindow {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `value`, returning the evicted sample if the window was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(value);
        evicted
    }

    /// A copy of the window contents, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.samples.iter()
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no sample has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> Extend<T> for SampleWindow<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}
