//! Platform-agnostic driver for the DHT22 / AM2302 humidity and temperature
//! sensor, plus the comfort metrics usually wanted alongside a reading.
//!
//! The sensor answers a wake-up handshake with a 40-bit frame on a single
//! shared line, encoding each bit in how long the line stays high. This crate
//! drives the handshake and samples the line through the `embedded-hal` 1.0
//! [`InputPin`](embedded_hal::digital::InputPin) /
//! [`OutputPin`](embedded_hal::digital::OutputPin) /
//! [`DelayNs`](embedded_hal::delay::DelayNs) traits, so it runs on anything
//! with a GPIO that can switch direction (see [`IoPin`]).
//!
//! A read that fails its checksum (or times out mid-frame) falls back to the
//! last validated reading held in a caller-owned [`ReadingCache`]; only a
//! cold start with no prior success surfaces an error.
//!
//! ```no_run
//! # fn demo<P, D>(pin: P, delay: D) -> Result<(), dht22_line::DhtError>
//! # where
//! #     P: embedded_hal::digital::InputPin
//! #         + embedded_hal::digital::OutputPin
//! #         + dht22_line::IoPin,
//! #     D: embedded_hal::delay::DelayNs,
//! # {
//! use dht22_line::{Dht22, ReadingCache};
//!
//! let mut sensor = Dht22::new(pin, delay);
//! let mut cache = ReadingCache::new();
//!
//! let record = sensor.read(&mut cache)?;
//! // record.temperature_celsius, record.humidity_percent,
//! // record.heat_index_fahrenheit, record.dew_point_fahrenheit ...
//! # Ok(())
//! # }
//! ```
//!
//! The polling loop counts in 1 µs ticks and tolerates no preemption worth a
//! pulse width, so the whole sample window runs inside
//! `critical_section::with`. Leave at least two seconds between reads; the
//! sensor needs that long to recover.

#![cfg_attr(not(test), no_std)]

mod cache;
mod decoder;
mod line;
pub mod metrics;
mod sampler;
mod sensor;

pub use cache::ReadingCache;
pub use line::{IoPin, Level};
pub use metrics::DerivedMetrics;
pub use sensor::{Dht22, Record, Source};

/// Errors on the read path. None of these are fatal: the orchestrator
/// resolves every one of them to a cache fallback, and only an empty cache
/// lets one reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DhtError {
    /// A line state outlasted the 255-tick bound before the frame completed.
    Timeout,
    /// Fewer than 40 data bits were recovered from the transition sequence.
    InsufficientBits,
    /// All 40 bits arrived but the fifth byte is not the sum of the first four.
    ChecksumMismatch,
    /// The frame validated but decodes to a physically implausible value.
    InvalidData,
    /// The underlying GPIO implementation reported an error.
    Pin,
}

/// One validated humidity/temperature pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Relative humidity, percent (0.0 to 100.0).
    pub humidity_percent: f32,
    /// Air temperature, degrees Celsius.
    pub temperature_celsius: f32,
}

impl Reading {
    /// Temperature converted to degrees Fahrenheit.
    pub fn temperature_fahrenheit(&self) -> f32 {
        metrics::celsius_to_fahrenheit(self.temperature_celsius)
    }
}

// Protocol timing, fixed by the sensor family. Not tunable parameters.

/// Output-high hold that wakes the sensor.
pub(crate) const WAKE_HOLD_MS: u32 = 10;
/// Output-low hold that requests a measurement.
pub(crate) const TRIGGER_LOW_MS: u32 = 18;
/// Output-high hold before the line is released to the sensor.
pub(crate) const RELEASE_HIGH_US: u32 = 40;
/// Polling granularity while sampling, one tick.
pub(crate) const POLL_TICK_US: u32 = 1;
/// A state run longer than this many ticks is a timeout.
pub(crate) const STATE_TIMEOUT_TICKS: u8 = 255;
/// A data pulse longer than this many ticks is a '1' bit.
pub(crate) const BIT_ONE_THRESHOLD_TICKS: u8 = 16;
/// Upper bound on transitions per exchange: 2 acknowledgment edges, 2 edges
/// per data bit, and the trailing edge. The sampler never reads past this.
pub(crate) const MAX_TRANSITIONS: usize = 85;
/// Frame length in data bits.
pub(crate) const FRAME_BITS: u8 = 40;

/// Humidity field: high and low byte, tenths of a percent.
pub(crate) fn humidity(high: u8, low: u8) -> f32 {
    f32::from((u16::from(high) << 8) | u16::from(low)) / 10.0
}

/// Temperature field: 15-bit magnitude in tenths of a degree, sign carried
/// in bit 7 of the high byte.
pub(crate) fn temperature(high: u8, low: u8) -> f32 {
    let magnitude = (u16::from(high & 0x7F) << 8) | u16::from(low);
    let celsius = f32::from(magnitude) / 10.0;
    if high & 0x80 != 0 {
        -celsius
    } else {
        celsius
    }
}
