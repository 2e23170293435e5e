// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Measurement configuration: the ctrl_hum (0xF2), ctrl_meas (0xF4) and
//! config (0xF5) registers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mask of the mode bits in ctrl_meas.
pub(crate) const MODE_MASK: u8 = 0x03;

/// Oversampling of one measurement channel. Higher oversampling lowers noise
/// at the cost of measurement time and current. `Skip` disables the channel
/// altogether (its output then reads 0x80000 / 0x8000).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Oversampling {
    Skip,
    #[default]
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Oversampling {
    fn bits(self) -> u8 {
        match self {
            Oversampling::Skip => 0b000,
            Oversampling::X1 => 0b001,
            Oversampling::X2 => 0b010,
            Oversampling::X4 => 0b011,
            Oversampling::X8 => 0b100,
            Oversampling::X16 => 0b101,
        }
    }
}

/// IIR filter coefficient, applied to temperature and pressure only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Filter {
    #[default]
    Off,
    C2,
    C4,
    C8,
    C16,
}

impl Filter {
    fn bits(self) -> u8 {
        match self {
            Filter::Off => 0b000,
            Filter::C2 => 0b001,
            Filter::C4 => 0b010,
            Filter::C8 => 0b011,
            Filter::C16 => 0b100,
        }
    }
}

/// Inactive time between two measurements in normal mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Standby {
    Ms0_5,
    Ms10,
    Ms20,
    Ms62_5,
    Ms125,
    Ms250,
    Ms500,
    #[default]
    Ms1000,
}

impl Standby {
    fn bits(self) -> u8 {
        match self {
            Standby::Ms0_5 => 0b000,
            Standby::Ms62_5 => 0b001,
            Standby::Ms125 => 0b010,
            Standby::Ms250 => 0b011,
            Standby::Ms500 => 0b100,
            Standby::Ms1000 => 0b101,
            Standby::Ms10 => 0b110,
            Standby::Ms20 => 0b111,
        }
    }
}

/// Power mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// No measurements; lowest power. Registers stay accessible.
    #[default]
    Sleep,
    /// One measurement, then back to sleep.
    Forced,
    /// Continuous measurements separated by the standby time.
    Normal,
}

impl Mode {
    pub(crate) fn bits(self) -> u8 {
        match self {
            Mode::Sleep => 0b00,
            Mode::Forced => 0b01,
            Mode::Normal => 0b11,
        }
    }
}

/// Device configuration.
///
/// The default is the datasheet's "weather monitoring" preset: 1x
/// oversampling on every channel, filter off, 1 s standby, starting in sleep
/// mode so that measurements are triggered with
/// [`force`](crate::BME280Driver::force).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub temperature_oversampling: Oversampling,
    pub pressure_oversampling: Oversampling,
    pub humidity_oversampling: Oversampling,
    pub filter: Filter,
    pub standby: Standby,
    pub mode: Mode,
}

impl Config {
    /// ctrl_hum: `osrs_h[2:0]`
    pub fn ctrl_hum(&self) -> u8 {
        self.humidity_oversampling.bits()
    }

    /// ctrl_meas: `osrs_t[7:5] osrs_p[4:2] mode[1:0]`
    pub fn ctrl_meas(&self) -> u8 {
        (self.temperature_oversampling.bits() << 5)
            | (self.pressure_oversampling.bits() << 2)
            | self.mode.bits()
    }

    /// config: `t_sb[7:5] filter[4:2]`, 3-wire SPI left disabled
    pub fn config(&self) -> u8 {
        (self.standby.bits() << 5) | (self.filter.bits() << 2)
    }
}
