// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Bounded FIFO of compensated samples with cached summary statistics.
//!
//! The summary is computed lazily: `push`, `pop`, `resize` and `clear` only
//! mark it stale, and the `*_high`, `*_low`, `*_average`, `timestart` and
//! `timestop` accessors read whatever [`SlidingWindow::summarize`] last
//! stored. Call `summarize()` after mutating the window to get fresh values.
//!
//! ```
//! use sensor_temp_pressure_humidity_bme280::{CompensatedSample, SlidingWindow};
//!
//! let mut window = SlidingWindow::new(3);
//! for (ts, t) in [(1, 2100), (2, 2300), (3, 2200), (4, 2500)] {
//!     window.push(CompensatedSample { timestamp: ts, temperature: t, pressure: 100000, humidity: 40960 });
//! }
//! window.summarize();
//! assert_eq!(window.size(), 3);
//! assert_eq!(window.temperature_high(), 2500);
//! assert_eq!(window.temperature_low(), 2200);
//! assert_eq!(window.timestart(), 2);
//! ```

use alloc::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::WindowError;
use crate::sample::{CompensatedSample, Timestamp};

/// Capacity of a window created with [`SlidingWindow::default`].
pub const DEFAULT_CAPACITY: usize = 60;

/// High, low and mean of one channel.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelSummary<T> {
    pub high: T,
    pub low: T,
    pub average: f64,
}

/// Statistics over the contents of a window at the time of the last
/// [`SlidingWindow::summarize`].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Summary<T> {
    pub timestart: Timestamp,
    pub timestop: Timestamp,
    pub sample_count: usize,
    pub temperature: ChannelSummary<T>,
    pub pressure: ChannelSummary<T>,
    pub humidity: ChannelSummary<T>,
}

/// Running min/max/sum for one channel while scanning the window.
struct Accumulator<T> {
    high: T,
    low: T,
    sum: f64,
}

impl<T> Accumulator<T>
where
    T: Copy + PartialOrd + Into<f64>,
{
    fn new(first: T) -> Self {
        Accumulator { high: first, low: first, sum: 0.0 }
    }

    fn add(&mut self, value: T) {
        if value > self.high {
            self.high = value;
        }
        if value < self.low {
            self.low = value;
        }
        self.sum += value.into();
    }

    fn finish(self, count: usize) -> ChannelSummary<T> {
        ChannelSummary { high: self.high, low: self.low, average: self.sum / count as f64 }
    }
}

/// Bounded FIFO of compensated samples.
///
/// `T` is `i32` for fixed-point samples and `f64` for floating-point ones.
/// The window never holds more than `capacity()` samples: pushing into a full
/// window first evicts the oldest sample.
///
/// Not synchronised; see [`SharedWindow`](crate::sync::SharedWindow) for a
/// mutex-guarded handle.
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    samples: VecDeque<CompensatedSample<T>>,
    capacity: usize,
    summary: Summary<T>,
    stale: bool,
}

impl<T> Default for SlidingWindow<T>
where
    T: Copy + PartialOrd + Default + Into<f64>,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> SlidingWindow<T>
where
    T: Copy + PartialOrd + Default + Into<f64>,
{
    /// Creates an empty window. A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = Self::clamped_capacity(capacity);
        SlidingWindow {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            summary: Summary::default(),
            stale: false,
        }
    }

    fn clamped_capacity(capacity: usize) -> usize {
        if capacity == 0 {
            log_warn!("window capacity 0 requested, using 1");
            1
        } else {
            capacity
        }
    }

    /// Appends a sample, evicting the oldest one if the window is full.
    pub fn push(&mut self, sample: CompensatedSample<T>) {
        if self.samples.len() >= self.capacity {
            let excess = self.samples.len() + 1 - self.capacity;
            self.samples.drain(..excess);
            log_trace!("window full, evicted {} oldest sample(s)", excess);
        }
        self.samples.push_back(sample);
        self.stale = true;
    }

    /// Removes and returns the oldest sample.
    pub fn pop(&mut self) -> Result<CompensatedSample<T>, WindowError> {
        let sample = self.samples.pop_front().ok_or(WindowError::Empty)?;
        self.stale = true;
        Ok(sample)
    }

    /// Oldest sample, left in place.
    pub fn front(&self) -> Result<CompensatedSample<T>, WindowError> {
        self.samples.front().copied().ok_or(WindowError::Empty)
    }

    /// Newest sample, left in place.
    pub fn back(&self) -> Result<CompensatedSample<T>, WindowError> {
        self.samples.back().copied().ok_or(WindowError::Empty)
    }

    /// Changes the capacity. Shrinking below the current size evicts the
    /// oldest samples until the window fits; a capacity of 0 is raised to 1.
    pub fn resize(&mut self, capacity: usize) {
        let capacity = Self::clamped_capacity(capacity);
        if self.samples.len() > capacity {
            let excess = self.samples.len() - capacity;
            log_debug!("window resized to {}, evicting {} samples", capacity, excess);
            self.samples.drain(..excess);
        }
        self.capacity = capacity;
        self.stale = true;
    }

    /// Removes every sample. The cached summary is left as it was but marked
    /// stale until the next `summarize()`.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.stale = true;
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// True when the window changed since the last `summarize()`.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CompensatedSample<T>> {
        self.samples.iter()
    }

    /// Recomputes the cached summary from the current contents and returns
    /// it. An empty window summarises to `Summary::default()`.
    pub fn summarize(&mut self) -> &Summary<T> {
        self.summary = match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => {
                let mut temperature = Accumulator::new(first.temperature);
                let mut pressure = Accumulator::new(first.pressure);
                let mut humidity = Accumulator::new(first.humidity);
                for sample in &self.samples {
                    temperature.add(sample.temperature);
                    pressure.add(sample.pressure);
                    humidity.add(sample.humidity);
                }
                let count = self.samples.len();
                Summary {
                    timestart: first.timestamp,
                    timestop: last.timestamp,
                    sample_count: count,
                    temperature: temperature.finish(count),
                    pressure: pressure.finish(count),
                    humidity: humidity.finish(count),
                }
            }
            _ => Summary::default(),
        };
        self.stale = false;
        &self.summary
    }

    /// The summary cached by the last `summarize()`.
    pub fn summary(&self) -> &Summary<T> {
        &self.summary
    }

    pub fn timestart(&self) -> Timestamp {
        self.summary.timestart
    }

    pub fn timestop(&self) -> Timestamp {
        self.summary.timestop
    }

    pub fn sample_count(&self) -> usize {
        self.summary.sample_count
    }

    pub fn temperature_high(&self) -> T {
        self.summary.temperature.high
    }

    pub fn temperature_low(&self) -> T {
        self.summary.temperature.low
    }

    pub fn temperature_average(&self) -> f64 {
        self.summary.temperature.average
    }

    pub fn pressure_high(&self) -> T {
        self.summary.pressure.high
    }

    pub fn pressure_low(&self) -> T {
        self.summary.pressure.low
    }

    pub fn pressure_average(&self) -> f64 {
        self.summary.pressure.average
    }

    pub fn humidity_high(&self) -> T {
        self.summary.humidity.high
    }

    pub fn humidity_low(&self) -> T {
        self.summary.humidity.low
    }

    pub fn humidity_average(&self) -> f64 {
        self.summary.humidity.average
    }
}
