//! Fixed-capacity ring buffer of recent sensor samples.
//!
//! The buffer keeps the last `N` samples in a fixed backing array. Once full,
//! every push overwrites the oldest slot (write position modulo `N`), so the
//! live contents are always the most recent `N` samples.
//!
//! ```text
//! CircularBuffer<5> after 7 pushes (a..g):
//! ┌───┬───┬───┬───┬───┐
//! │ f │ g │ c │ d │ e │   physical slots
//! └───┴───┴───┴───┴───┘
//!           ↑
//!           write_pos = 2 (oldest live sample)
//!
//! iter(): c, d, e, f, g   (arrival order)
//! ```
//!
//! Statistics are computed over the active view and fail with
//! [`StatsError::EmptyBuffer`] before the first push.

use statrs::statistics::Statistics;
use thiserror::Error;

/// Number of samples retained per machine.
pub const SAMPLE_CAPACITY: usize = 10;

/// Errors raised when querying buffer statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    /// No sample has been pushed yet.
    #[error("buffer is empty: no samples to compute statistics over")]
    EmptyBuffer,
}

/// Fixed-size circular buffer of `f64` samples.
///
/// Invariants:
/// - `write_pos < N`
/// - `len <= N`
///
/// Not synchronised; each buffer is owned by exactly one machine or manager.
#[derive(Debug, Clone)]
pub struct CircularBuffer<const N: usize> {
    data: [f64; N],
    write_pos: usize,
    len: usize,
    pushed: u64,
}

impl<const N: usize> CircularBuffer<N> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            data: [0.0; N],
            write_pos: 0,
            len: 0,
            pushed: 0,
        }
    }

    /// Append a sample, overwriting the oldest one once the buffer is full.
    pub fn push(&mut self, value: f64) {
        if N == 0 {
            return;
        }
        self.data[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % N;
        if self.len < N {
            self.len += 1;
        }
        self.pushed += 1;
    }

    /// Number of valid samples held (never more than `N`).
    pub fn active_count(&self) -> usize {
        self.len
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Total pushes since construction, including overwritten samples.
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    /// The live samples in physical slot order.
    ///
    /// Until the buffer wraps this is also arrival order; afterwards use
    /// [`CircularBuffer::iter`] when order matters.
    pub fn active_slice(&self) -> &[f64] {
        &self.data[..self.len]
    }

    /// Iterate live samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let start = if self.len < N { 0 } else { self.write_pos };
        (0..self.len).map(move |i| self.data[(start + i) % N])
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let idx = if self.write_pos == 0 {
            N - 1
        } else {
            self.write_pos - 1
        };
        Some(self.data[idx])
    }

    /// Minimum and maximum over the live samples.
    ///
    /// NaN samples are skipped as long as one comparable sample exists.
    pub fn min_max(&self) -> Result<(f64, f64), StatsError> {
        let active = self.active_slice();
        let (first, rest) = active.split_first().ok_or(StatsError::EmptyBuffer)?;
        Ok(rest
            .iter()
            .fold((*first, *first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
    }

    /// Arithmetic mean of the live samples.
    pub fn average(&self) -> Result<f64, StatsError> {
        if self.is_empty() {
            return Err(StatsError::EmptyBuffer);
        }
        let sum: f64 = self.active_slice().iter().sum();
        Ok(sum / self.len as f64)
    }

    /// Population standard deviation of the live samples.
    pub fn std_dev(&self) -> Result<f64, StatsError> {
        if self.is_empty() {
            return Err(StatsError::EmptyBuffer);
        }
        Ok(self.active_slice().population_std_dev())
    }

    /// Drop every sample. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }
}

impl<const N: usize> Default for CircularBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_has_no_stats() {
        let buffer: CircularBuffer<5> = CircularBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.active_count(), 0);
        assert_eq!(buffer.min_max(), Err(StatsError::EmptyBuffer));
        assert_eq!(buffer.average(), Err(StatsError::EmptyBuffer));
        assert_eq!(buffer.std_dev(), Err(StatsError::EmptyBuffer));
        assert!(buffer.last().is_none());
    }

    #[test]
    fn push_and_retrieve() {
        let mut buffer = CircularBuffer::<5>::new();
        buffer.push(25.0);

        assert_eq!(buffer.active_count(), 1);
        assert_eq!(buffer.last(), Some(25.0));
        assert_eq!(buffer.min_max(), Ok((25.0, 25.0)));
        assert_eq!(buffer.average(), Ok(25.0));
    }

    #[test]
    fn circular_overwrite_keeps_most_recent() {
        let mut buffer = CircularBuffer::<3>::new();
        for i in 0..5 {
            buffer.push(i as f64);
        }

        assert_eq!(buffer.active_count(), 3);
        assert!(buffer.is_full());
        assert_eq!(buffer.total_pushed(), 5);
        assert_eq!(buffer.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.last(), Some(4.0));
        // Physical order after wrapping: slot 0 holds 3, slot 1 holds 4.
        assert_eq!(buffer.active_slice(), &[3.0, 4.0, 2.0]);
    }

    #[test]
    fn stats_over_active_entries_only() {
        let mut buffer = CircularBuffer::<4>::new();
        buffer.push(10.0);
        buffer.push(30.0);

        assert_eq!(buffer.min_max(), Ok((10.0, 30.0)));
        assert_eq!(buffer.average(), Ok(20.0));
        assert!((buffer.std_dev().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn nan_is_skipped_by_min_max() {
        let mut buffer = CircularBuffer::<4>::new();
        buffer.push(5.0);
        buffer.push(f64::NAN);
        buffer.push(-1.0);

        assert_eq!(buffer.min_max(), Ok((-1.0, 5.0)));
        assert!(buffer.average().unwrap().is_nan());
    }

    #[test]
    fn clear_resets_occupancy() {
        let mut buffer = CircularBuffer::<2>::new();
        buffer.push(1.0);
        buffer.push(2.0);
        buffer.push(3.0);
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.min_max(), Err(StatsError::EmptyBuffer));
        buffer.push(7.0);
        assert_eq!(buffer.iter().collect::<Vec<_>>(), vec![7.0]);
    }
}
