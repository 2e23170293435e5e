// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Conversion of raw ADC ticks into physical units.
//!
//! The formulas follow the Bosch BME280 datasheet (BST-BME280-DS002) and come
//! in two numeric regimes selected by a type parameter:
//!
//! - [`Fixed`]: integer arithmetic. Temperature in 1/100 °C, pressure in Pa,
//!   humidity in 1/1024 %RH.
//! - [`Float`] (feature `fp`): double precision. °C, Pa and %RH.
//!
//! Temperature is always compensated first. Besides the temperature itself it
//! yields a [`FineTemperature`], which pressure and humidity compensation of the
//! same sample take as input. The fine temperature is typed by regime, so a
//! fixed-point value can never be fed to the floating-point formulas:
//!
//! ```compile_fail
//! use sensor_temp_pressure_humidity_bme280::compensation::*;
//! use sensor_temp_pressure_humidity_bme280::{CalibrationCoefficients, RawSample};
//!
//! let coeffs = CalibrationCoefficients::default();
//! let raw = RawSample { timestamp: 0, temperature: 519888, pressure: 415148, humidity: 27000 };
//! let (_, fine) = compensate_temperature::<Fixed>(&raw, &coeffs);
//! let _ = compensate_pressure::<Float>(&raw, &coeffs, &fine);
//! ```
//!
//! It also remembers which raw sample it was computed from, and the pressure
//! and humidity steps reject it for any other sample:
//!
//! ```
//! use sensor_temp_pressure_humidity_bme280::compensation::*;
//! use sensor_temp_pressure_humidity_bme280::{CalibrationCoefficients, CompensationError, RawSample};
//!
//! let coeffs = CalibrationCoefficients::default();
//! let first = RawSample { timestamp: 1, temperature: 519888, pressure: 415148, humidity: 27000 };
//! let second = RawSample { timestamp: 2, temperature: 400000, ..first };
//! let (_, fine) = compensate_temperature::<Fixed>(&first, &coeffs);
//! assert_eq!(
//!     compensate_pressure(&second, &coeffs, &fine),
//!     Err(CompensationError::SampleMismatch { origin: 1, sample: 2 })
//! );
//! ```
//!
//! [`SampleCompensation`] keeps the raw sample and its fine temperature
//! together, so its steps cannot fail.

use core::fmt;
use core::marker::PhantomData;

use crate::calibration::CalibrationCoefficients;
use crate::error::CompensationError;
use crate::sample::{CompensatedSample, RawSample, Timestamp};

/// Lower clamp bound for temperature, °C.
pub const TEMPERATURE_MIN: f64 = -40.0;
/// Upper clamp bound for temperature, °C.
pub const TEMPERATURE_MAX: f64 = 85.0;
/// Lower clamp bound for pressure, Pa. Also the result when the pressure
/// divisor degenerates to zero.
pub const PRESSURE_MIN: f64 = 30000.0;
/// Upper clamp bound for pressure, Pa.
pub const PRESSURE_MAX: f64 = 110000.0;
/// Lower clamp bound for relative humidity, %.
pub const HUMIDITY_MIN: f64 = 0.0;
/// Upper clamp bound for relative humidity, %.
pub const HUMIDITY_MAX: f64 = 100.0;

/// A numeric regime for the compensation formulas.
pub trait Regime {
    /// Type of the compensated output values.
    type Value: Copy + PartialOrd + fmt::Debug;
    /// Type of the intermediate fine temperature.
    type Fine: Copy + fmt::Debug;

    fn temperature(raw: u32, coeffs: &CalibrationCoefficients) -> (Self::Value, Self::Fine);
    fn pressure(raw: u32, coeffs: &CalibrationCoefficients, fine: Self::Fine) -> Self::Value;
    fn humidity(raw: u32, coeffs: &CalibrationCoefficients, fine: Self::Fine) -> Self::Value;
}

/// Fine temperature of one sample, in regime `R`.
///
/// Only [`compensate_temperature`] produces one. It records the timestamp and
/// raw temperature of its sample, and is neither `Clone` nor `Copy`: pass it
/// by reference to the pressure and humidity steps of the same sample, then
/// drop it.
pub struct FineTemperature<R: Regime> {
    value: R::Fine,
    timestamp: Timestamp,
    raw_temperature: u32,
    _regime: PhantomData<R>,
}

impl<R: Regime> FineTemperature<R> {
    fn new(value: R::Fine, raw: &RawSample) -> Self {
        FineTemperature {
            value,
            timestamp: raw.timestamp,
            raw_temperature: raw.temperature,
            _regime: PhantomData,
        }
    }

    /// The raw intermediate value (`t_fine` in the datasheet).
    pub fn value(&self) -> R::Fine {
        self.value
    }

    /// Timestamp of the sample this was computed from.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Whether this was computed from `raw`.
    pub fn belongs_to(&self, raw: &RawSample) -> bool {
        self.timestamp == raw.timestamp && self.raw_temperature == raw.temperature
    }

    fn check(&self, raw: &RawSample) -> Result<R::Fine, CompensationError> {
        if !self.belongs_to(raw) {
            log_warn!("fine temperature of t={} offered to sample t={}", self.timestamp, raw.timestamp);
            return Err(CompensationError::SampleMismatch {
                origin: self.timestamp,
                sample: raw.timestamp,
            });
        }
        Ok(self.value)
    }
}

impl<R: Regime> fmt::Debug for FineTemperature<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FineTemperature")
            .field("value", &self.value)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Temperature step. Returns the compensated temperature and the fine
/// temperature needed by the other two steps.
pub fn compensate_temperature<R: Regime>(
    raw: &RawSample,
    coeffs: &CalibrationCoefficients,
) -> (R::Value, FineTemperature<R>) {
    let (value, fine) = R::temperature(raw.temperature, coeffs);
    (value, FineTemperature::new(fine, raw))
}

/// Pressure step. Fails if `fine` was computed from another sample.
pub fn compensate_pressure<R: Regime>(
    raw: &RawSample,
    coeffs: &CalibrationCoefficients,
    fine: &FineTemperature<R>,
) -> Result<R::Value, CompensationError> {
    Ok(R::pressure(raw.pressure, coeffs, fine.check(raw)?))
}

/// Humidity step. Fails if `fine` was computed from another sample.
pub fn compensate_humidity<R: Regime>(
    raw: &RawSample,
    coeffs: &CalibrationCoefficients,
    fine: &FineTemperature<R>,
) -> Result<R::Value, CompensationError> {
    Ok(R::humidity(raw.humidity, coeffs, fine.check(raw)?))
}

/// Runs all three steps on one raw sample.
pub fn compensate<R: Regime>(
    raw: &RawSample,
    coeffs: &CalibrationCoefficients,
) -> CompensatedSample<R::Value> {
    SampleCompensation::<R>::new(raw, coeffs).finish()
}

/// Compensation in progress for one raw sample.
///
/// Creating it runs the temperature step; pressure and humidity are then
/// computed from the same sample's raw values and fine temperature.
#[derive(Debug)]
pub struct SampleCompensation<'a, R: Regime> {
    raw: &'a RawSample,
    coeffs: &'a CalibrationCoefficients,
    temperature: R::Value,
    fine: FineTemperature<R>,
}

impl<'a, R: Regime> SampleCompensation<'a, R> {
    pub fn new(raw: &'a RawSample, coeffs: &'a CalibrationCoefficients) -> Self {
        let (temperature, fine) = compensate_temperature::<R>(raw, coeffs);
        SampleCompensation { raw, coeffs, temperature, fine }
    }

    pub fn temperature(&self) -> R::Value {
        self.temperature
    }

    pub fn fine_temperature(&self) -> &FineTemperature<R> {
        &self.fine
    }

    pub fn pressure(&self) -> R::Value {
        R::pressure(self.raw.pressure, self.coeffs, self.fine.value)
    }

    pub fn humidity(&self) -> R::Value {
        R::humidity(self.raw.humidity, self.coeffs, self.fine.value)
    }

    pub fn finish(self) -> CompensatedSample<R::Value> {
        CompensatedSample {
            timestamp: self.raw.timestamp,
            temperature: self.temperature,
            pressure: self.pressure(),
            humidity: self.humidity(),
        }
    }
}

/// Integer regime.
///
/// Intermediates are evaluated in `i64` but keep the datasheet's 32-bit
/// division order, so results match the datasheet code bit for bit wherever
/// the 32-bit version neither overflows nor wraps. Where its unsigned pressure
/// intermediate wraps (raw pressures near full scale), the result is the low
/// pressure clamp rather than the high one.
#[derive(Debug, Clone, Copy)]
pub struct Fixed;

const FIXED_TEMPERATURE_MIN: i64 = -4000;
const FIXED_TEMPERATURE_MAX: i64 = 8500;
const FIXED_PRESSURE_MIN: i64 = 30000;
const FIXED_PRESSURE_MAX: i64 = 110000;
const FIXED_HUMIDITY_MAX: i64 = 102400;
const FIXED_HUMIDITY_Q22_MAX: i64 = 419430400;

impl Regime for Fixed {
    type Value = i32;
    type Fine = i32;

    fn temperature(raw: u32, coeffs: &CalibrationCoefficients) -> (i32, i32) {
        let raw = raw as i64;
        let t1 = coeffs.t1 as i64;
        let t2 = coeffs.t2 as i64;
        let t3 = coeffs.t3 as i64;

        let v1 = ((raw / 8 - t1 * 2) * t2) / 2048;
        let v2 = raw / 16 - t1;
        let v2 = (((v2 * v2) / 4096) * t3) / 16384;
        let fine = v1 + v2;

        let temperature =
            ((fine * 5 + 128) / 256).clamp(FIXED_TEMPERATURE_MIN, FIXED_TEMPERATURE_MAX);
        (temperature as i32, fine as i32)
    }

    fn pressure(raw: u32, coeffs: &CalibrationCoefficients, fine: i32) -> i32 {
        let raw = raw as i64;
        let p1 = coeffs.p1 as i64;
        let p2 = coeffs.p2 as i64;
        let p3 = coeffs.p3 as i64;
        let p4 = coeffs.p4 as i64;
        let p5 = coeffs.p5 as i64;
        let p6 = coeffs.p6 as i64;
        let p7 = coeffs.p7 as i64;
        let p8 = coeffs.p8 as i64;
        let p9 = coeffs.p9 as i64;

        let v1 = (fine as i64 / 2) - 64000;
        let mut v2 = (((v1 / 4) * (v1 / 4)) / 2048) * p6;
        v2 += (v1 * p5) * 2;
        v2 = (v2 / 4) + p4 * 65536;
        let v3 = (p3 * (((v1 / 4) * (v1 / 4)) / 8192)) / 8;
        let v4 = (p2 * v1) / 2;
        let v1 = (v3 + v4) / 262144;
        let v1 = ((32768 + v1) * p1) / 32768;

        if v1 == 0 {
            log_trace!("pressure divisor is zero, clamping to {} Pa", FIXED_PRESSURE_MIN);
            return FIXED_PRESSURE_MIN as i32;
        }

        // Signed, unlike the datasheet's uint32_t: for raw values near the top
        // of the ADC range (about 1002980 and up with typical coefficients) this
        // goes negative, where the unsigned form wraps to a huge value and clamps
        // to 110000 Pa. Here it clamps to 30000 Pa, as the float regime does.
        let mut pressure = ((1048576 - raw) - (v2 / 4096)) * 3125;
        // keep the 32-bit datasheet's choice of where the factor of two goes
        pressure = if pressure < 0x8000_0000 {
            (pressure * 2) / v1
        } else {
            (pressure / v1) * 2
        };

        let v1 = (p9 * (((pressure / 8) * (pressure / 8)) / 8192)) / 4096;
        let v2 = ((pressure / 4) * p8) / 8192;
        pressure += (v1 + v2 + p7) / 16;

        pressure.clamp(FIXED_PRESSURE_MIN, FIXED_PRESSURE_MAX) as i32
    }

    fn humidity(raw: u32, coeffs: &CalibrationCoefficients, fine: i32) -> i32 {
        let h1 = coeffs.h1 as i64;
        let h2 = coeffs.h2 as i64;
        let h3 = coeffs.h3 as i64;
        let h4 = coeffs.h4 as i64;
        let h5 = coeffs.h5 as i64;
        let h6 = coeffs.h6 as i64;

        let v1 = fine as i64 - 76800;
        let v2 = raw as i64 * 16384;
        let v3 = h4 * 1048576;
        let v4 = h5 * v1;
        let v5 = (((v2 - v3) - v4) + 16384) / 32768;
        let v2 = (v1 * h6) / 1024;
        let v3 = (v1 * h3) / 2048;
        let v4 = ((v2 * (v3 + 32768)) / 1024) + 2097152;
        let v2 = ((v4 * h2) + 8192) / 16384;
        let v3 = v5 * v2;
        let v4 = ((v3 / 32768) * (v3 / 32768)) / 128;
        let v5 = (v3 - ((v4 * h1) / 16)).clamp(0, FIXED_HUMIDITY_Q22_MAX);

        (v5 / 4096).min(FIXED_HUMIDITY_MAX) as i32
    }
}

/// Double precision regime.
#[cfg(feature = "fp")]
#[derive(Debug, Clone, Copy)]
pub struct Float;

#[cfg(feature = "fp")]
impl Regime for Float {
    type Value = f64;
    type Fine = f64;

    fn temperature(raw: u32, coeffs: &CalibrationCoefficients) -> (f64, f64) {
        let raw = raw as f64;
        let t1 = coeffs.t1 as f64;
        let t2 = coeffs.t2 as f64;
        let t3 = coeffs.t3 as f64;

        let v1 = (raw / 16384.0 - t1 / 1024.0) * t2;
        let v2 = raw / 131072.0 - t1 / 8192.0;
        let v2 = (v2 * v2) * t3;
        let fine = v1 + v2;

        ((fine / 5120.0).clamp(TEMPERATURE_MIN, TEMPERATURE_MAX), fine)
    }

    fn pressure(raw: u32, coeffs: &CalibrationCoefficients, fine: f64) -> f64 {
        let p1 = coeffs.p1 as f64;
        let p2 = coeffs.p2 as f64;
        let p3 = coeffs.p3 as f64;
        let p4 = coeffs.p4 as f64;
        let p5 = coeffs.p5 as f64;
        let p6 = coeffs.p6 as f64;
        let p7 = coeffs.p7 as f64;
        let p8 = coeffs.p8 as f64;
        let p9 = coeffs.p9 as f64;

        let v1 = fine / 2.0 - 64000.0;
        let mut v2 = v1 * v1 * p6 / 32768.0;
        v2 += v1 * p5 * 2.0;
        v2 = v2 / 4.0 + p4 * 65536.0;
        let v3 = p3 * v1 * v1 / 524288.0;
        let v1 = (v3 + p2 * v1) / 524288.0;
        let v1 = (1.0 + v1 / 32768.0) * p1;

        if v1 == 0.0 {
            log_trace!("pressure divisor is zero, clamping to {} Pa", PRESSURE_MIN);
            return PRESSURE_MIN;
        }

        let mut pressure = 1048576.0 - raw as f64;
        pressure = (pressure - v2 / 4096.0) * 6250.0 / v1;
        let v1 = p9 * pressure * pressure / 2147483648.0;
        let v2 = pressure * p8 / 32768.0;
        pressure += (v1 + v2 + p7) / 16.0;

        pressure.clamp(PRESSURE_MIN, PRESSURE_MAX)
    }

    fn humidity(raw: u32, coeffs: &CalibrationCoefficients, fine: f64) -> f64 {
        let h1 = coeffs.h1 as f64;
        let h2 = coeffs.h2 as f64;
        let h3 = coeffs.h3 as f64;
        let h4 = coeffs.h4 as f64;
        let h5 = coeffs.h5 as f64;
        let h6 = coeffs.h6 as f64;

        let v1 = fine - 76800.0;
        let v2 = h4 * 64.0 + (h5 / 16384.0) * v1;
        let v3 = raw as f64 - v2;
        let v4 = h2 / 65536.0;
        let v5 = 1.0 + (h3 / 67108864.0) * v1;
        let v6 = 1.0 + (h6 / 67108864.0) * v1 * v5;
        let v6 = v3 * v4 * v5 * v6;
        let humidity = v6 * (1.0 - h1 * v6 / 524288.0);

        // NaN only with degenerate coefficients; report it as dry
        if humidity.is_nan() {
            return HUMIDITY_MIN;
        }
        humidity.clamp(HUMIDITY_MIN, HUMIDITY_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::tests::reference_coefficients;

    const RAW_T: u32 = 519888;
    const RAW_P: u32 = 415148;
    const RAW_H: u32 = 27000;

    fn raw(temperature: u32, pressure: u32, humidity: u32) -> RawSample {
        RawSample { timestamp: 0, temperature, pressure, humidity }
    }

    fn reference_raw() -> RawSample {
        raw(RAW_T, RAW_P, RAW_H)
    }

    #[test]
    fn test_fixed_temperature_reference() {
        let c = reference_coefficients();
        let (t, fine) = compensate_temperature::<Fixed>(&reference_raw(), &c);
        assert_eq!(t, 2508);
        assert_eq!(fine.value(), 128423);
        // the output is derived from the fine temperature
        assert_eq!((fine.value() * 5 + 128) / 256, t);
    }

    #[test]
    fn test_fixed_pressure_reference() {
        let c = reference_coefficients();
        let sample = reference_raw();
        let (_, fine) = compensate_temperature::<Fixed>(&sample, &c);
        assert_eq!(compensate_pressure(&sample, &c, &fine), Ok(100654));
    }

    #[test]
    fn test_fixed_humidity_reference() {
        let c = reference_coefficients();
        let sample = reference_raw();
        let (_, fine) = compensate_temperature::<Fixed>(&sample, &c);
        assert_eq!(compensate_humidity(&sample, &c, &fine), Ok(39190));
        assert_eq!(compensate_humidity(&raw(RAW_T, RAW_P, 30000), &c, &fine), Ok(56317));
    }

    #[test]
    fn test_fixed_temperature_clamps() {
        let c = reference_coefficients();
        assert_eq!(compensate_temperature::<Fixed>(&raw(0, RAW_P, RAW_H), &c).0, -4000);
        assert_eq!(compensate_temperature::<Fixed>(&raw(0xFFFFF, RAW_P, RAW_H), &c).0, 8500);
    }

    #[test]
    fn test_fixed_pressure_clamps() {
        let c = reference_coefficients();
        let (_, fine) = compensate_temperature::<Fixed>(&reference_raw(), &c);
        assert_eq!(compensate_pressure(&raw(RAW_T, 0, RAW_H), &c, &fine), Ok(110000));
        assert_eq!(compensate_pressure(&raw(RAW_T, 0xFFFFF, RAW_H), &c, &fine), Ok(30000));
    }

    #[test]
    fn test_fixed_pressure_near_full_scale_takes_low_clamp() {
        let c = reference_coefficients();
        let (_, fine) = compensate_temperature::<Fixed>(&reference_raw(), &c);
        // the numerator turns negative from here on; it must not wrap to the high clamp
        for raw_p in [1002980, 1010000, 1040000, 0xFFFFF] {
            assert_eq!(compensate_pressure(&raw(RAW_T, raw_p, RAW_H), &c, &fine), Ok(30000), "raw {raw_p}");
        }
    }

    #[test]
    fn test_fixed_humidity_clamps() {
        let c = reference_coefficients();
        let (_, fine) = compensate_temperature::<Fixed>(&reference_raw(), &c);
        assert_eq!(compensate_humidity(&raw(RAW_T, RAW_P, 0), &c, &fine), Ok(0));
        assert_eq!(compensate_humidity(&raw(RAW_T, RAW_P, 0xFFFF), &c, &fine), Ok(102400));
    }

    #[test]
    fn test_fixed_pressure_zero_divisor() {
        let mut c = reference_coefficients();
        c.p1 = 0;
        let sample = reference_raw();
        let (_, fine) = compensate_temperature::<Fixed>(&sample, &c);
        assert_eq!(compensate_pressure(&sample, &c, &fine), Ok(30000));
    }

    #[test]
    fn test_fine_temperature_rejected_for_other_sample() {
        let c = reference_coefficients();
        let warm = RawSample { timestamp: 7, temperature: RAW_T, pressure: RAW_P, humidity: RAW_H };
        let cold = RawSample { timestamp: 8, temperature: 400000, ..warm };

        let (_, warm_fine) = compensate_temperature::<Fixed>(&warm, &c);
        assert!(warm_fine.belongs_to(&warm));
        assert!(!warm_fine.belongs_to(&cold));
        assert_eq!(
            compensate_pressure(&cold, &c, &warm_fine),
            Err(CompensationError::SampleMismatch { origin: 7, sample: 8 })
        );
        assert_eq!(
            compensate_humidity(&cold, &c, &warm_fine),
            Err(CompensationError::SampleMismatch { origin: 7, sample: 8 })
        );

        // same timestamp, different reading
        let reread = RawSample { temperature: 400000, ..warm };
        assert!(compensate_pressure(&reread, &c, &warm_fine).is_err());

        let (_, cold_fine) = compensate_temperature::<Fixed>(&cold, &c);
        assert_eq!(compensate_pressure(&cold, &c, &cold_fine), Ok(94919));
        assert_eq!(compensate_humidity(&cold, &c, &cold_fine), Ok(38993));
    }

    #[test]
    fn test_sample_compensation_uses_own_fine_temperature() {
        let c = reference_coefficients();
        let warm = RawSample { timestamp: 7, temperature: RAW_T, pressure: RAW_P, humidity: RAW_H };
        let cold = RawSample { temperature: 400000, ..warm };

        let warm_step = SampleCompensation::<Fixed>::new(&warm, &c);
        let cold_step = SampleCompensation::<Fixed>::new(&cold, &c);
        assert!(warm_step.fine_temperature().belongs_to(&warm));
        assert!(cold_step.fine_temperature().belongs_to(&cold));
        assert_eq!(cold_step.fine_temperature().value(), -64734);

        assert_eq!(warm_step.pressure(), 100654);
        assert_eq!(cold_step.pressure(), 94919);
        assert_eq!(cold_step.humidity(), 38993);
    }

    #[test]
    fn test_compensate_fixed_sample() {
        let c = reference_coefficients();
        let raw = RawSample { timestamp: 99, temperature: RAW_T, pressure: RAW_P, humidity: RAW_H };
        let sample = compensate::<Fixed>(&raw, &c);
        assert_eq!(
            sample,
            CompensatedSample { timestamp: 99, temperature: 2508, pressure: 100654, humidity: 39190 }
        );
    }

    #[cfg(feature = "fp")]
    mod float {
        use super::*;
        use float_cmp::approx_eq;

        #[test]
        fn test_float_temperature_reference() {
            let c = reference_coefficients();
            let (t, fine) = compensate_temperature::<Float>(&reference_raw(), &c);
            assert!(approx_eq!(f64, t, 25.08, epsilon = 0.01));
            assert!(approx_eq!(f64, fine.value(), 128422.287, epsilon = 0.01));
        }

        #[test]
        fn test_float_pressure_reference() {
            let c = reference_coefficients();
            let sample = reference_raw();
            let (_, fine) = compensate_temperature::<Float>(&sample, &c);
            let p = compensate_pressure(&sample, &c, &fine).unwrap();
            assert!(approx_eq!(f64, p, 100653.27, epsilon = 0.01));
        }

        #[test]
        fn test_float_humidity_reference() {
            let c = reference_coefficients();
            let sample = reference_raw();
            let (_, fine) = compensate_temperature::<Float>(&sample, &c);
            let h = compensate_humidity(&sample, &c, &fine).unwrap();
            assert!(approx_eq!(f64, h, 38.275, epsilon = 0.001));
        }

        #[test]
        fn test_float_clamps() {
            let c = reference_coefficients();
            assert_eq!(compensate_temperature::<Float>(&raw(0, RAW_P, RAW_H), &c).0, -40.0);
            assert_eq!(compensate_temperature::<Float>(&raw(0xFFFFF, RAW_P, RAW_H), &c).0, 85.0);

            let (_, fine) = compensate_temperature::<Float>(&reference_raw(), &c);
            assert_eq!(compensate_pressure(&raw(RAW_T, 0, RAW_H), &c, &fine), Ok(110000.0));
            assert_eq!(compensate_pressure(&raw(RAW_T, 0xFFFFF, RAW_H), &c, &fine), Ok(30000.0));
            assert_eq!(compensate_humidity(&raw(RAW_T, RAW_P, 0), &c, &fine), Ok(0.0));
            assert_eq!(compensate_humidity(&raw(RAW_T, RAW_P, 0xFFFF), &c, &fine), Ok(100.0));
        }

        #[test]
        fn test_float_pressure_zero_divisor() {
            let mut c = reference_coefficients();
            c.p1 = 0;
            let sample = reference_raw();
            let (_, fine) = compensate_temperature::<Float>(&sample, &c);
            assert_eq!(compensate_pressure(&sample, &c, &fine), Ok(30000.0));
        }

        #[test]
        fn test_float_fine_temperature_rejected_for_other_sample() {
            let c = reference_coefficients();
            let first = RawSample { timestamp: 1, ..reference_raw() };
            let second = RawSample { timestamp: 2, ..reference_raw() };
            let (_, fine) = compensate_temperature::<Float>(&first, &c);
            assert_eq!(
                compensate_pressure(&second, &c, &fine),
                Err(CompensationError::SampleMismatch { origin: 1, sample: 2 })
            );
        }

        #[test]
        fn test_regimes_agree() {
            let c = reference_coefficients();
            let sample = reference_raw();
            let fixed = compensate::<Fixed>(&sample, &c);
            let float = compensate::<Float>(&sample, &c);
            assert!(approx_eq!(f64, fixed.temperature as f64 / 100.0, float.temperature, epsilon = 0.01));
            assert!(approx_eq!(f64, fixed.pressure as f64, float.pressure, epsilon = 1.0));
            assert!(approx_eq!(f64, fixed.humidity as f64 / 1024.0, float.humidity, epsilon = 0.01));
        }

        #[test]
        fn test_regimes_agree_near_full_scale_pressure() {
            let c = reference_coefficients();
            for raw_p in [1002980, 0xFFFFF] {
                let sample = raw(RAW_T, raw_p, RAW_H);
                assert_eq!(compensate::<Fixed>(&sample, &c).pressure, 30000);
                assert_eq!(compensate::<Float>(&sample, &c).pressure, 30000.0);
            }
        }
    }
}
