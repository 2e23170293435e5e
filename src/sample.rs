// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Raw and compensated measurement samples, and the clock used to stamp them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sample time in whole seconds. The epoch is whatever the [`Clock`] in use
/// counts from; [`SystemClock`] counts from the Unix epoch.
pub type Timestamp = u64;

/// Length of the measurement data block starting at register 0xF7.
pub const RAW_BLOCK_LEN: usize = 8;

const PRESS_MSB: usize = 0;
const PRESS_LSB: usize = 1;
const PRESS_XLSB: usize = 2;
const TEMP_MSB: usize = 3;
const TEMP_LSB: usize = 4;
const TEMP_XLSB: usize = 5;
const HUM_MSB: usize = 6;
const HUM_LSB: usize = 7;

/// Source of timestamps for new samples.
///
/// Any `FnMut() -> Timestamp` closure is a clock, which keeps tests
/// deterministic:
///
/// ```
/// use sensor_temp_pressure_humidity_bme280::{Clock, Timestamp};
///
/// let mut t: Timestamp = 100;
/// let mut clock = move || { t += 1; t };
/// assert_eq!(clock.now(), 101);
/// ```
pub trait Clock {
    fn now(&mut self) -> Timestamp;
}

impl<F> Clock for F
where
    F: FnMut() -> Timestamp,
{
    fn now(&mut self) -> Timestamp {
        self()
    }
}

/// Wall clock, in seconds since the Unix epoch. A system clock set before the
/// epoch reads as 0.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&mut self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Uncompensated ADC output, as read in one burst from the data registers.
///
/// Pressure and temperature carry 20 significant bits, humidity 16.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawSample {
    pub timestamp: Timestamp,
    pub temperature: u32,
    pub pressure: u32,
    pub humidity: u32,
}

impl RawSample {
    /// Assembles the three ADC values from the 8-byte data block
    /// (press_msb .. hum_lsb). Only the top nibble of each xlsb byte is used.
    pub fn from_block(timestamp: Timestamp, block: &[u8; RAW_BLOCK_LEN]) -> Self {
        let pressure = ((block[PRESS_MSB] as u32) << 12)
            | ((block[PRESS_LSB] as u32) << 4)
            | ((block[PRESS_XLSB] as u32) >> 4);
        let temperature = ((block[TEMP_MSB] as u32) << 12)
            | ((block[TEMP_LSB] as u32) << 4)
            | ((block[TEMP_XLSB] as u32) >> 4);
        let humidity = ((block[HUM_MSB] as u32) << 8) | (block[HUM_LSB] as u32);

        RawSample { timestamp, temperature, pressure, humidity }
    }
}

/// A compensated measurement.
///
/// With `T = i32` (fixed-point regime) the units are 1/100 °C, Pa and
/// 1/1024 %RH; with `T = f64` (floating regime) they are °C, Pa and %RH.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompensatedSample<T> {
    pub timestamp: Timestamp,
    pub temperature: T,
    pub pressure: T,
    pub humidity: T,
}

impl CompensatedSample<i32> {
    /// Temperature in °C.
    pub fn celsius(&self) -> f32 {
        self.temperature as f32 / 100.0
    }

    /// Relative humidity in %.
    pub fn rel_hum_percent(&self) -> f32 {
        self.humidity as f32 / 1024.0
    }
}
