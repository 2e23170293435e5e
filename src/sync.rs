// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Mutex-guarded handles for sharing a driver or a window between threads.
//!
//! A poisoned lock is recovered rather than reported: neither the driver nor
//! the window can be left in a torn state by a panicking holder.

use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::compensation::{Fixed, Regime};
use crate::error::{Error, WindowError};
use crate::sample::{Clock, CompensatedSample};
use crate::window::{SlidingWindow, Summary};
use crate::BME280Driver;

/// A [`BME280Driver`] behind a mutex. Every call holds the lock for the whole
/// bus sequence it performs.
#[derive(Debug)]
pub struct SharedDriver<I2C, D, C> {
    inner: Mutex<BME280Driver<I2C, D, C>>,
}

impl<I2C, D, C> SharedDriver<I2C, D, C>
where
    I2C: I2c,
    D: DelayNs,
    C: Clock,
{
    pub fn new(driver: BME280Driver<I2C, D, C>) -> Self {
        SharedDriver { inner: Mutex::new(driver) }
    }

    /// Exclusive access for sequences not covered by the helpers below.
    pub fn lock(&self) -> MutexGuard<'_, BME280Driver<I2C, D, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calibration check, data read and compensation under one lock.
    pub fn measure<R: Regime>(&self) -> Result<CompensatedSample<R::Value>, Error<I2C::Error>> {
        self.lock().measure::<R>()
    }

    pub fn measure_fixed(&self) -> Result<CompensatedSample<i32>, Error<I2C::Error>> {
        self.measure::<Fixed>()
    }

    #[cfg(feature = "fp")]
    pub fn measure_float(&self) -> Result<CompensatedSample<f64>, Error<I2C::Error>> {
        self.measure::<crate::compensation::Float>()
    }

    pub fn into_inner(self) -> BME280Driver<I2C, D, C> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A [`SlidingWindow`] behind a mutex.
#[derive(Debug)]
pub struct SharedWindow<T> {
    inner: Mutex<SlidingWindow<T>>,
}

impl<T> Default for SharedWindow<T>
where
    T: Copy + PartialOrd + Default + Into<f64>,
{
    fn default() -> Self {
        SharedWindow { inner: Mutex::new(SlidingWindow::default()) }
    }
}

impl<T> SharedWindow<T>
where
    T: Copy + PartialOrd + Default + Into<f64>,
{
    pub fn new(capacity: usize) -> Self {
        SharedWindow { inner: Mutex::new(SlidingWindow::new(capacity)) }
    }

    /// Exclusive access, e.g. to pop several samples or to summarise and read
    /// the accessors without another producer interleaving.
    pub fn lock(&self) -> MutexGuard<'_, SlidingWindow<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, sample: CompensatedSample<T>) {
        self.lock().push(sample);
    }

    pub fn pop(&self) -> Result<CompensatedSample<T>, WindowError> {
        self.lock().pop()
    }

    pub fn size(&self) -> usize {
        self.lock().size()
    }

    /// Recomputes the summary and returns a copy of it.
    pub fn summarize(&self) -> Summary<T> {
        *self.lock().summarize()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::sample::Timestamp;

    #[test]
    fn test_concurrent_producers_respect_capacity() {
        let window = Arc::new(SharedWindow::<i32>::new(16));
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let window = Arc::clone(&window);
                thread::spawn(move || {
                    for i in 0..100 {
                        window.push(CompensatedSample {
                            timestamp: (p * 1000 + i) as Timestamp,
                            temperature: i,
                            pressure: 100000,
                            humidity: 40000,
                        });
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(window.size(), 16);
        let summary = window.summarize();
        assert_eq!(summary.sample_count, 16);
        assert_eq!(summary.pressure.high, 100000);
    }

    #[test]
    fn test_lock_gives_consistent_view() {
        let window = SharedWindow::new(3);
        for ts in 1..=4 {
            window.push(CompensatedSample { timestamp: ts, temperature: 1.5, pressure: 1.0e5, humidity: 50.0 });
        }
        let mut guard = window.lock();
        guard.summarize();
        assert_eq!(guard.timestart(), 2);
        assert_eq!(guard.timestop(), 4);
        assert_eq!(guard.pop().map(|s| s.timestamp), Ok(2));
    }
}
