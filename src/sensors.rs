//! One-wire temperature bus types.
//!
//! The bus driver itself lives in the embedding application (it owns the
//! GPIO and the one-wire timing); the core only needs the probe address
//! type, the disconnected sentinel, and the per-probe reading served by
//! status snapshots. The driver is reached through
//! [`SensorBusPort`](crate::app::ports::SensorBusPort).

use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reading the bus driver hands back when a probe is absent or its CRC
/// check failed. Sits far below anything the probes can physically
/// measure, so `<=` comparison is safe against float noise.
pub const DISCONNECTED_C: f32 = -127.0;

/// Maximum probes a single bus enumeration reports.
pub const MAX_PROBES: usize = 8;

/// Returns `true` when `reading` is the disconnected sentinel.
pub fn is_disconnected(reading: f32) -> bool {
    reading <= DISCONNECTED_C
}

// ---------------------------------------------------------------------------
// Probe addresses
// ---------------------------------------------------------------------------

/// 8-byte one-wire ROM address of a temperature probe.
///
/// Travels over the settings and status boundaries as a 16-digit
/// lowercase hex string. The all-zero address means "unconfigured" and
/// never matches a real probe, so reads against it return the
/// disconnected sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SensorAddress(pub [u8; 8]);

impl SensorAddress {
    /// The all-zero "no probe assigned" address.
    pub const UNCONFIGURED: Self = Self([0; 8]);

    pub fn is_unconfigured(&self) -> bool {
        self.0 == [0; 8]
    }

    /// Parse the 16-hex-digit wire form. Returns `None` on any length or
    /// digit mismatch; callers keep their current value in that case.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 16 {
            return None;
        }
        let mut addr = [0u8; 8];
        for (slot, pair) in addr.iter_mut().zip(bytes.chunks_exact(2)) {
            let hi = hex_val(pair[0])?;
            let lo = hex_val(pair[1])?;
            *slot = (hi << 4) | lo;
        }
        Some(Self(addr))
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for SensorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for SensorAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SensorAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AddrVisitor;

        impl Visitor<'_> for AddrVisitor {
            type Value = SensorAddress;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 16-digit hex probe address")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SensorAddress, E> {
                SensorAddress::parse(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(AddrVisitor)
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// A single probe's latest converted reading, as reported by the status
/// snapshot. `temp_c` may be the disconnected sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeReading {
    pub address: SensorAddress,
    pub temp_c: f32,
}
