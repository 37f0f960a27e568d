//! Heart Rate Measurement (`0x2A37`) payload decoding.
//!
//! Layout, all multi-byte fields little-endian:
//!
//! ```text
//! [flags] [hr: u8 | u16] [energy expended: u16]? [rr: u16]*
//! ```
//!
//! RR intervals are in units of 1/1024 s.

use serde::Serialize;

use crate::{Error, Result};

/// Device units per second for RR intervals.
pub const RR_UNITS_PER_SECOND: f64 = 1024.0;

/// The flag byte at the start of every measurement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    /// Heart rate is a `u16` rather than a `u8` (bit 0).
    pub wide_heart_rate: bool,
    /// Sensor contact status (bits 1-2), carried through but not interpreted.
    pub sensor_contact: u8,
    /// A 2-byte energy expended field follows the heart rate (bit 3).
    pub energy_expended: bool,
    /// RR interval fields fill the rest of the payload (bit 4).
    pub rr_intervals: bool,
}

impl Flags {
    /// Raw transmutation from the flag byte.
    pub fn from_bits(bits: u8) -> Self {
        Flags {
            wide_heart_rate: (bits & (1 << 0)) != 0,
            sensor_contact: (bits >> 1) & 0x03,
            energy_expended: (bits & (1 << 3)) != 0,
            rr_intervals: (bits & (1 << 4)) != 0,
        }
    }

    /// Raw transmutation to the flag byte.
    pub fn to_bits(self) -> u8 {
        u8::from(self.wide_heart_rate)
            | ((self.sensor_contact & 0x03) << 1)
            | (u8::from(self.energy_expended) << 3)
            | (u8::from(self.rr_intervals) << 4)
    }

    /// The shortest payload these flags allow, flag byte included.
    pub fn min_len(self) -> usize {
        let hr = if self.wide_heart_rate { 2 } else { 1 };
        let energy = if self.energy_expended { 2 } else { 0 };
        1 + hr + energy
    }
}

/// One decoded notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedSample {
    /// Beats per minute.
    pub heart_rate: u16,
    /// RR intervals in seconds, in the order received.
    pub rr_intervals: Vec<f64>,
}

/// Decodes a raw measurement payload.
///
/// Fails with [`MalformedPayload`][crate::error::ErrorKind::MalformedPayload] when the payload is empty or shorter
/// than its own flag byte requires. A trailing odd byte after the RR fields is ignored.
pub fn decode(payload: &[u8]) -> Result<DecodedSample> {
    let (&bits, rest) = payload
        .split_first()
        .ok_or_else(|| Error::malformed("empty payload"))?;
    let flags = Flags::from_bits(bits);
    if payload.len() < flags.min_len() {
        return Err(Error::malformed(format!(
            "{} bytes, flags {:#04x} need at least {}",
            payload.len(),
            bits,
            flags.min_len()
        )));
    }

    let (heart_rate, rest) = if flags.wide_heart_rate {
        (u16::from_le_bytes([rest[0], rest[1]]), &rest[2..])
    } else {
        (u16::from(rest[0]), &rest[1..])
    };

    // Energy expended is not modelled downstream.
    let rest = if flags.energy_expended { &rest[2..] } else { rest };

    let rr_intervals = if flags.rr_intervals {
        rest.chunks_exact(2)
            .map(|x| f64::from(u16::from_le_bytes([x[0], x[1]])) / RR_UNITS_PER_SECOND)
            .collect()
    } else {
        Vec::new()
    };

    Ok(DecodedSample {
        heart_rate,
        rr_intervals,
    })
}
