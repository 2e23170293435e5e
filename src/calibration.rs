// Copyright (c) 2022 Lucian Carata <luc@rez.how>
//
// This file is part of the sensor-temp-pressure-humidity-bme280 crate, and is
// dually licensed under Apache License Version 2.0 or the BSD 3-clause License.
//
// For full licensing details, consult the LICENSE file in the root directory
// of the crate.
//

//! Factory calibration coefficients.
//!
//! Every BME280 is trimmed at the factory and the resulting coefficients are
//! stored in non-volatile memory, in two register blocks:
//!
//! - 0x88..=0xA1 (26 bytes): `dig_T1..T3`, `dig_P1..P9` as little-endian 16-bit
//!   pairs, then one reserved byte and `dig_H1` at offset 25.
//! - 0xE1..=0xE7 (7 bytes): `dig_H2..H6`, with `dig_H4` and `dig_H5` packed as
//!   two 12-bit signed values sharing the nibbles of byte 4.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// First register of the temperature/pressure calibration block.
pub const TP_BLOCK_START: u8 = 0x88;
pub const TP_BLOCK_LEN: usize = 26;

/// First register of the humidity calibration block.
pub const HUM_BLOCK_START: u8 = 0xE1;
pub const HUM_BLOCK_LEN: usize = 7;

const H1_INDEX: usize = 25;

/// Calibration coefficients of one device, named after the datasheet's
/// `dig_*` trimming parameters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationCoefficients {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,

    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,

    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    /// 12-bit signed
    pub h4: i16,
    /// 12-bit signed
    pub h5: i16,
    pub h6: i8,
}

fn le_u16(block: &[u8], index: usize) -> u16 {
    u16::from_le_bytes([block[index], block[index + 1]])
}

fn le_i16(block: &[u8], index: usize) -> i16 {
    i16::from_le_bytes([block[index], block[index + 1]])
}

impl CalibrationCoefficients {
    /// Decodes both calibration blocks.
    ///
    /// `dig_H4` takes its upper 8 bits from byte 3 and its low nibble from the
    /// low nibble of byte 4; `dig_H5` takes its upper 8 bits from byte 5 and its
    /// low nibble from the high nibble of byte 4. The dedicated bytes are sign
    /// extended before the nibble is or-ed in.
    pub fn from_registers(tp: &[u8; TP_BLOCK_LEN], hum: &[u8; HUM_BLOCK_LEN]) -> Self {
        let h4 = ((hum[3] as i8 as i16) << 4) | (hum[4] & 0x0F) as i16;
        let h5 = ((hum[5] as i8 as i16) << 4) | (hum[4] >> 4) as i16;

        CalibrationCoefficients {
            t1: le_u16(tp, 0),
            t2: le_i16(tp, 2),
            t3: le_i16(tp, 4),

            p1: le_u16(tp, 6),
            p2: le_i16(tp, 8),
            p3: le_i16(tp, 10),
            p4: le_i16(tp, 12),
            p5: le_i16(tp, 14),
            p6: le_i16(tp, 16),
            p7: le_i16(tp, 18),
            p8: le_i16(tp, 20),
            p9: le_i16(tp, 22),

            h1: tp[H1_INDEX],
            h2: le_i16(hum, 0),
            h3: hum[2],
            h4,
            h5,
            h6: hum[6] as i8,
        }
    }
}

/// Holds the coefficients of one device once they have been read.
///
/// An empty store means "not loaded yet"; the driver fills it lazily on the
/// first compensation and empties it again on a soft reset.
#[derive(Debug, Default, Clone)]
pub struct CalibrationStore {
    coefficients: Option<CalibrationCoefficients>,
}

impl CalibrationStore {
    pub const fn new() -> Self {
        CalibrationStore { coefficients: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.coefficients.is_some()
    }

    pub fn get(&self) -> Option<&CalibrationCoefficients> {
        self.coefficients.as_ref()
    }

    /// Replaces any previously held coefficients with ones decoded from the
    /// two calibration blocks. Both blocks must already have been read in full,
    /// so a failed bus read never leaves a half-updated store behind.
    pub fn commit(
        &mut self,
        tp: &[u8; TP_BLOCK_LEN],
        hum: &[u8; HUM_BLOCK_LEN],
    ) -> &CalibrationCoefficients {
        self.coefficients.insert(CalibrationCoefficients::from_registers(tp, hum))
    }

    pub fn invalidate(&mut self) {
        self.coefficients = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Coefficients from the Bosch reference dataset (datasheet compensation
    /// example), with humidity values typical of a production part.
    pub(crate) fn reference_coefficients() -> CalibrationCoefficients {
        CalibrationCoefficients {
            t1: 27504,
            t2: 26435,
            t3: -1000,
            p1: 36477,
            p2: -10685,
            p3: 3024,
            p4: 2855,
            p5: 140,
            p6: -7,
            p7: 15500,
            p8: -14600,
            p9: 6000,
            h1: 75,
            h2: 362,
            h3: 0,
            h4: 313,
            h5: 50,
            h6: 30,
        }
    }

    /// Register image of `reference_coefficients()`.
    pub(crate) fn reference_blocks() -> ([u8; TP_BLOCK_LEN], [u8; HUM_BLOCK_LEN]) {
        let c = reference_coefficients();
        let mut tp = [0u8; TP_BLOCK_LEN];
        let words: [[u8; 2]; 12] = [
            c.t1.to_le_bytes(),
            c.t2.to_le_bytes(),
            c.t3.to_le_bytes(),
            c.p1.to_le_bytes(),
            c.p2.to_le_bytes(),
            c.p3.to_le_bytes(),
            c.p4.to_le_bytes(),
            c.p5.to_le_bytes(),
            c.p6.to_le_bytes(),
            c.p7.to_le_bytes(),
            c.p8.to_le_bytes(),
            c.p9.to_le_bytes(),
        ];
        for (i, w) in words.iter().enumerate() {
            tp[2 * i] = w[0];
            tp[2 * i + 1] = w[1];
        }
        tp[H1_INDEX] = c.h1;

        let h2 = c.h2.to_le_bytes();
        // h4 = 313 = 0x139 -> 0x13 | nibble 0x9; h5 = 50 = 0x032 -> 0x03 | nibble 0x2
        let hum = [h2[0], h2[1], c.h3, 0x13, 0x29, 0x03, c.h6 as u8];
        (tp, hum)
    }

    #[test]
    fn test_decode_reference_blocks() {
        let (tp, hum) = reference_blocks();
        assert_eq!(CalibrationCoefficients::from_registers(&tp, &hum), reference_coefficients());
    }

    #[test]
    fn test_decode_little_endian_pairs() {
        let (mut tp, hum) = reference_blocks();
        tp[2] = 0x34;
        tp[3] = 0x12;
        tp[6] = 0xFE;
        tp[7] = 0xFF;
        tp[22] = 0x00;
        tp[23] = 0x80;
        let c = CalibrationCoefficients::from_registers(&tp, &hum);
        assert_eq!(c.t2, 0x1234);
        assert_eq!(c.p1, 0xFFFE);
        assert_eq!(c.p9, i16::MIN);
    }

    #[test]
    fn test_decode_packed_humidity_nibbles() {
        let (tp, _) = reference_blocks();
        // byte 4 = 0xA5: low nibble 5 belongs to h4, high nibble 0xA to h5
        let hum = [0x00, 0x00, 0x00, 0x12, 0xA5, 0x34, 0x00];
        let c = CalibrationCoefficients::from_registers(&tp, &hum);
        assert_eq!(c.h4, 0x125);
        assert_eq!(c.h5, 0x34A);
    }

    #[test]
    fn test_decode_negative_packed_humidity() {
        let (tp, _) = reference_blocks();
        // h4 = -100 = 0xF9C (12-bit), h5 = -2048 = 0x800 (12-bit)
        let hum = [0x00, 0x00, 0x00, 0xF9, 0x0C, 0x80, 0xE2];
        let c = CalibrationCoefficients::from_registers(&tp, &hum);
        assert_eq!(c.h4, -100);
        assert_eq!(c.h5, -2048);
        assert_eq!(c.h6, -30);
    }

    #[test]
    fn test_store_commit_and_invalidate() {
        let (tp, hum) = reference_blocks();
        let mut store = CalibrationStore::new();
        assert!(!store.is_loaded());
        assert_eq!(store.get(), None);

        let t1 = store.commit(&tp, &hum).t1;
        assert_eq!(t1, 27504);
        assert!(store.is_loaded());

        let mut refreshed = tp;
        refreshed[0] = 0x00;
        refreshed[1] = 0x00;
        store.commit(&refreshed, &hum);
        assert_eq!(store.get().map(|c| c.t1), Some(0));

        store.invalidate();
        assert!(!store.is_loaded());
    }
}
