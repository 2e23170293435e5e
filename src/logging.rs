// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

// Thin wrappers over the `log` facade; they expand to nothing when the `log`
// feature is disabled so that no_std builds carry no logging code.

#[cfg(feature = "log")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}
