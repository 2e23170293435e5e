// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//
#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! This is a rust [`embedded-hal`](https://github.com/rust-embedded/embedded-hal)
//! driver for the Bosch BME280 combined temperature, pressure and
//! relative-humidity sensor.
//!
//! By depending on embedded-hal, this driver is platform-agnostic and can be
//! used with any physical device implementing the embedded-hal traits.
//!
//! The full details about the BME280 sensor can be read in its datasheet:
//! https://www.bosch-sensortec.com/media/boschsensortec/downloads/datasheets/bst-bme280-ds002.pdf
//!
//! Besides reading and compensating measurements, the crate keeps a bounded
//! rolling history of compensated samples with summary statistics (see
//! [`SlidingWindow`]).
//!
//! ## Usage:
//!
//! Import this crate and an `embedded_hal` implementation, then instantiate the
//! driver; For example, assuming you have connected a BME280 sensor to a linux
//! machine and it is detected as an i2c device:
//!
//! ```ignore
//! use linux_embedded_hal as hal;
//!
//! use hal::{I2cdev, Delay};
//! use sensor_temp_pressure_humidity_bme280::{BME280Driver, Config, I2CAddr,
//!                                            SlidingWindow, SystemClock};
//!
//! fn main() {
//!     let i2c_dev = I2cdev::new("/dev/i2c-1").unwrap();
//!     let mut bme280 = BME280Driver::new(i2c_dev, I2CAddr::Primary, Delay, SystemClock);
//!     let mut history = SlidingWindow::default();
//!
//!     bme280.set_config(&Config::default()).unwrap();
//!     bme280.force().unwrap();
//!     // wait for the measurement to complete (~10 ms at 1x oversampling)
//!
//!     if let Ok(m) = bme280.measure_fixed() {
//!         println!("Temp: {temp} C, Pressure: {p} Pa, Relative Humidity: {rh} %",
//!                  temp = m.celsius(),
//!                  p = m.pressure,
//!                  rh = m.rel_hum_percent());
//!         history.push(m);
//!     }
//!     history.summarize();
//! }
//! ```
//!
//! ## Numeric regimes
//!
//! Compensation is available in integer ([`Fixed`]) and, with the `fp`
//! feature, double precision ([`Float`]) form. Both run the temperature step
//! first; see the [`compensation`] module for how its intermediate result is
//! handed to the pressure and humidity steps.

extern crate alloc;

#[macro_use]
mod logging;

pub mod calibration;
pub mod compensation;
pub mod config;
pub mod error;
pub mod sample;
#[cfg(feature = "std")]
pub mod sync;
pub mod window;

use embedded_hal as hal;

use hal::delay::DelayNs;
use hal::i2c::I2c;

pub use calibration::{CalibrationCoefficients, CalibrationStore};
pub use compensation::{FineTemperature, Fixed, Regime, SampleCompensation};
#[cfg(feature = "fp")]
pub use compensation::Float;
pub use config::{Config, Filter, Mode, Oversampling, Standby};
pub use error::{CompensationError, Error, WindowError};
#[cfg(feature = "std")]
pub use sample::SystemClock;
pub use sample::{Clock, CompensatedSample, RawSample, Timestamp};
pub use window::{ChannelSummary, SlidingWindow, Summary};

use calibration::{HUM_BLOCK_LEN, HUM_BLOCK_START, TP_BLOCK_LEN, TP_BLOCK_START};
use sample::RAW_BLOCK_LEN;

const REG_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_STATUS: u8 = 0xF3;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA: u8 = 0xF7;

const CHIP_ID: u8 = 0x60;
const RESET_CMD: u8 = 0xB6;

const STATUS_MEASURING: u8 = 0x08;
const STATUS_IM_UPDATE: u8 = 0x01;

const RESET_DELAY_MS: u32 = 3;
const CONFIG_DELAY_MS: u32 = 43;

// largest register write issued in one transaction (ctrl_hum, config, ctrl_meas)
const MAX_WRITE_PAIRS: usize = 3;

/// I2C addresses for BME280 depend on how the SDO pin is wired: 0x76 when
/// SDO is connected to GND, 0x77 when it is connected to VDDIO.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2CAddr {
    /// SDO to GND
    Primary = 0x76,

    /// SDO to VDDIO
    Secondary = 0x77,
}

/// Contents of the status register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// A conversion is running; cleared once results are in the data registers.
    pub measuring: bool,
    /// The non-volatile calibration memory is being copied into image registers.
    pub im_update: bool,
}

#[derive(Debug)]
pub struct BME280Driver<I2C, Delay, C> {
    i2c: I2C,
    address: u8,
    delay: Delay,
    clock: C,
    calibration: CalibrationStore,
}

impl<I2C, D, C> BME280Driver<I2C, D, C>
where
    I2C: I2c,
    D: DelayNs,
    C: Clock,
{
    pub fn new(i2c: I2C, address: I2CAddr, delay: D, clock: C) -> Self {
        BME280Driver {
            i2c,
            address: address as u8,
            delay,
            clock,
            calibration: CalibrationStore::new(),
        }
    }

    /// Gives back the bus, delay and clock.
    pub fn release(self) -> (I2C, D, C) {
        (self.i2c, self.delay, self.clock)
    }

    fn read_registers(&mut self, start: u8, rx_bytes: &mut [u8])
        -> Result<(), Error<I2C::Error>> {
        self.i2c.write_read(self.address, &[start], rx_bytes)
            .map_err(Error::I2c)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut rx_bytes = [0; 1];
        self.read_registers(reg, &mut rx_bytes)?;
        Ok(rx_bytes[0])
    }

    /// Writes `(register, value)` pairs in a single transaction.
    fn write_registers(&mut self, pairs: &[(u8, u8)]) -> Result<(), Error<I2C::Error>> {
        debug_assert!(pairs.len() <= MAX_WRITE_PAIRS);
        let mut tx_bytes = [0; 2 * MAX_WRITE_PAIRS];
        for (i, (reg, value)) in pairs.iter().enumerate() {
            tx_bytes[2 * i] = *reg;
            tx_bytes[2 * i + 1] = *value;
        }
        self.i2c.write(self.address, &tx_bytes[..2 * pairs.len()])
            .map_err(Error::I2c)
    }

    pub fn chip_id(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_register(REG_ID)
    }

    /// Fails with `Error::UnsupportedChip` unless the device reports the
    /// BME280 id (0x60). A BMP280 (0x56..=0x58) answers at the same addresses
    /// but has no humidity channel.
    pub fn verify_chip_id(&mut self) -> Result<(), Error<I2C::Error>> {
        let id = self.chip_id()?;
        if id != CHIP_ID {
            log_warn!("unexpected chip id {:#04x} at address {:#04x}", id, self.address);
            return Err(Error::UnsupportedChip(id));
        }
        Ok(())
    }

    pub fn status(&mut self) -> Result<Status, Error<I2C::Error>> {
        let status = self.read_register(REG_STATUS)?;
        Ok(Status {
            measuring: status & STATUS_MEASURING != 0,
            im_update: status & STATUS_IM_UPDATE != 0,
        })
    }

    /// Reads both calibration blocks and replaces the stored coefficients.
    ///
    /// The store is only updated once both reads succeeded.
    pub fn load_calibration(&mut self)
        -> Result<CalibrationCoefficients, Error<I2C::Error>> {
        let mut tp_bytes = [0; TP_BLOCK_LEN];
        let mut hum_bytes = [0; HUM_BLOCK_LEN];
        self.read_registers(TP_BLOCK_START, &mut tp_bytes)?;
        self.read_registers(HUM_BLOCK_START, &mut hum_bytes)?;

        let coeffs = *self.calibration.commit(&tp_bytes, &hum_bytes);
        log_debug!("calibration loaded: {:?}", coeffs);
        Ok(coeffs)
    }

    /// Returns the stored coefficients, loading them first if needed.
    pub fn ensure_calibrated(&mut self)
        -> Result<CalibrationCoefficients, Error<I2C::Error>> {
        match self.calibration.get() {
            Some(coeffs) => Ok(*coeffs),
            None => self.load_calibration(),
        }
    }

    pub fn calibration(&self) -> Option<&CalibrationCoefficients> {
        self.calibration.get()
    }

    /// Reads the data registers in one burst and stamps the result with the
    /// driver's clock. This does not start a conversion: in sleep mode call
    /// [`force`](Self::force) first and wait for it to finish.
    pub fn read_raw(&mut self) -> Result<RawSample, Error<I2C::Error>> {
        let mut rx_bytes = [0; RAW_BLOCK_LEN];
        self.read_registers(REG_DATA, &mut rx_bytes)?;
        Ok(RawSample::from_block(self.clock.now(), &rx_bytes))
    }

    /// Temperature step with this device's calibration.
    pub fn temperature<R: Regime>(&mut self, raw: &RawSample)
        -> Result<(R::Value, FineTemperature<R>), Error<I2C::Error>> {
        let coeffs = self.ensure_calibrated()?;
        Ok(compensation::compensate_temperature(raw, &coeffs))
    }

    /// Pressure step. `fine` must come from [`temperature`](Self::temperature)
    /// on the same sample, otherwise this fails with `Error::Compensation`.
    pub fn pressure<R: Regime>(&mut self, raw: &RawSample, fine: &FineTemperature<R>)
        -> Result<R::Value, Error<I2C::Error>> {
        let coeffs = self.ensure_calibrated()?;
        Ok(compensation::compensate_pressure(raw, &coeffs, fine)?)
    }

    /// Humidity step. `fine` must come from [`temperature`](Self::temperature)
    /// on the same sample, otherwise this fails with `Error::Compensation`.
    pub fn humidity<R: Regime>(&mut self, raw: &RawSample, fine: &FineTemperature<R>)
        -> Result<R::Value, Error<I2C::Error>> {
        let coeffs = self.ensure_calibrated()?;
        Ok(compensation::compensate_humidity(raw, &coeffs, fine)?)
    }

    pub fn compensate<R: Regime>(&mut self, raw: &RawSample)
        -> Result<CompensatedSample<R::Value>, Error<I2C::Error>> {
        let coeffs = self.ensure_calibrated()?;
        Ok(compensation::compensate::<R>(raw, &coeffs))
    }

    /// Reads the latest measurement and compensates it in regime `R`.
    pub fn measure<R: Regime>(&mut self)
        -> Result<CompensatedSample<R::Value>, Error<I2C::Error>> {
        let coeffs = self.ensure_calibrated()?;
        let raw = self.read_raw()?;
        Ok(compensation::compensate::<R>(&raw, &coeffs))
    }

    /// Temperature in 1/100 °C, pressure in Pa, humidity in 1/1024 %RH.
    pub fn measure_fixed(&mut self) -> Result<CompensatedSample<i32>, Error<I2C::Error>> {
        self.measure::<Fixed>()
    }

    /// Temperature in °C, pressure in Pa, humidity in %RH.
    #[cfg(feature = "fp")]
    pub fn measure_float(&mut self) -> Result<CompensatedSample<f64>, Error<I2C::Error>> {
        self.measure::<Float>()
    }

    /// Writes ctrl_hum, config and ctrl_meas, in that order. Changes to
    /// ctrl_hum only take effect after ctrl_meas is written.
    pub fn set_config(&mut self, config: &Config) -> Result<(), Error<I2C::Error>> {
        self.write_registers(&[
            (REG_CTRL_HUM, config.ctrl_hum()),
            (REG_CONFIG, config.config()),
            (REG_CTRL_MEAS, config.ctrl_meas()),
        ])?;
        self.delay.delay_ms(CONFIG_DELAY_MS);
        log_debug!("configuration written: {:?}", config);
        Ok(())
    }

    fn set_mode(&mut self, mode: Mode) -> Result<(), Error<I2C::Error>> {
        let ctrl_meas = self.read_register(REG_CTRL_MEAS)?;
        self.write_registers(&[(REG_CTRL_MEAS, (ctrl_meas & !config::MODE_MASK) | mode.bits())])
    }

    /// Starts a single measurement; the device returns to sleep afterwards.
    /// Configure the device before calling this.
    pub fn force(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_mode(Mode::Forced)
    }

    pub fn sleep(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_mode(Mode::Sleep)
    }

    /// Soft reset. Drops the stored calibration so that the next compensation
    /// reads it again, and re-applies `reload` if given.
    pub fn reset(&mut self, reload: Option<&Config>) -> Result<(), Error<I2C::Error>> {
        self.write_registers(&[(REG_RESET, RESET_CMD)])?;
        self.delay.delay_ms(RESET_DELAY_MS);
        self.calibration.invalidate();
        log_info!("device at {:#04x} reset", self.address);

        if let Some(config) = reload {
            self.set_config(config)?;
        }
        Ok(())
    }
}
