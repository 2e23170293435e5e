// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

use core::fmt::Debug;

use thiserror_no_std::Error;

use crate::sample::Timestamp;

/// Errors returned by the BME280 driver.
///
/// Bus errors are passed through untouched: the driver never retries a
/// transaction, so whatever the `embedded-hal` implementation reports (NACK,
/// arbitration loss, timeout) reaches the caller as `Error::I2c`.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error<E: Debug> {
    /// Error on the I2C bus
    #[error("I2C bus error: {0:?}")]
    I2c(E),
    /// The device at the configured address did not report the BME280 chip id
    #[error("unsupported chip id {0:#04x}")]
    UnsupportedChip(u8),
    /// A pressure or humidity step was given another sample's fine temperature
    #[error("{0}")]
    Compensation(CompensationError),
}

impl<E: Debug> From<CompensationError> for Error<E> {
    fn from(err: CompensationError) -> Self {
        Error::Compensation(err)
    }
}

/// Misuse of the step-by-step compensation API.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum CompensationError {
    /// The fine temperature was computed from a different raw sample than the
    /// one being compensated
    #[error("fine temperature of sample t={origin} used for sample t={sample}")]
    SampleMismatch { origin: Timestamp, sample: Timestamp },
}

/// Errors returned by [`SlidingWindow`](crate::window::SlidingWindow)
/// accessors that need at least one sample.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum WindowError {
    /// `pop`, `front` or `back` called on a window holding no samples
    #[error("empty window")]
    Empty,
}
