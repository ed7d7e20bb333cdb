//! Reading orchestrator: one `read` runs the whole pipeline and always
//! resolves to a record or, on a cold start with nothing cached, the error
//! that broke the read.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::cache::ReadingCache;
use crate::decoder::{self, RawFrame};
use crate::line::IoPin;
use crate::metrics::DerivedMetrics;
use crate::{humidity, sampler, temperature, DhtError, Reading};

/// Where the values in a [`Record`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    /// Decoded and validated on this invocation.
    Fresh,
    /// This read failed; values are the last validated reading.
    Cached,
}

/// Everything one invocation produces.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Record {
    pub source: Source,
    pub temperature_celsius: f32,
    pub temperature_fahrenheit: f32,
    pub humidity_percent: f32,
    pub heat_index_fahrenheit: f32,
    pub dew_point_fahrenheit: f32,
}

impl Record {
    fn new(source: Source, reading: Reading) -> Self {
        let metrics = DerivedMetrics::compute(reading.temperature_celsius, reading.humidity_percent);
        Self {
            source,
            temperature_celsius: reading.temperature_celsius,
            temperature_fahrenheit: reading.temperature_fahrenheit(),
            humidity_percent: reading.humidity_percent,
            heat_index_fahrenheit: metrics.heat_index_fahrenheit,
            dew_point_fahrenheit: metrics.dew_point_fahrenheit,
        }
    }
}

/// DHT22 driver over a direction-switchable GPIO and a delay source.
pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin + IoPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Trigger the sensor and produce one [`Record`].
    ///
    /// A validated frame updates `cache` and yields a [`Source::Fresh`]
    /// record. Any failure along the pipeline (timeout, short frame, bad
    /// checksum, implausible values) falls back to the cached reading
    /// instead; the failure only escapes as `Err` when the cache has never
    /// been filled.
    pub fn read(&mut self, cache: &mut ReadingCache) -> Result<Record, DhtError> {
        match self.read_reading() {
            Ok(reading) => {
                cache.put(reading);
                Ok(Record::new(Source::Fresh, reading))
            }
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("sensor read failed ({}), using cached reading", err);
                cache
                    .get()
                    .map(|reading| Record::new(Source::Cached, reading))
                    .ok_or(err)
            }
        }
    }

    fn read_reading(&mut self) -> Result<Reading, DhtError> {
        let frame = self.read_frame()?;
        let reading = Reading {
            humidity_percent: humidity(frame.bytes[0], frame.bytes[1]),
            temperature_celsius: temperature(frame.bytes[2], frame.bytes[3]),
        };
        // The checksum is weak; a frame can validate and still be garbage.
        if reading.humidity_percent > 100.0 {
            return Err(DhtError::InvalidData);
        }
        Ok(reading)
    }

    fn read_frame(&mut self) -> Result<RawFrame, DhtError> {
        let samples =
            critical_section::with(|_cs| sampler::sample(&mut self.pin, &mut self.delay))?;
        let frame = decoder::decode(&samples);
        decoder::validate(&frame)?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use float_cmp::approx_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A scripted data line. Levels are a timeline of `(level, duration in
    /// µs)` segments starting the moment the driver switches the pin to
    /// input; the paired delay advances the shared clock. Past the end of
    /// the script the line idles high, like a pulled-up line with a silent
    /// sensor.
    struct LineScript {
        segments: Vec<(bool, u32)>,
        now_us: u32,
    }

    impl LineScript {
        fn level(&self) -> bool {
            let mut t = self.now_us;
            for &(level, duration) in &self.segments {
                if t < duration {
                    return level;
                }
                t -= duration;
            }
            true
        }
    }

    #[derive(Clone)]
    struct SimPin(Rc<RefCell<LineScript>>);

    impl ErrorType for SimPin {
        type Error = Infallible;
    }

    impl InputPin for SimPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0.borrow().level())
        }
        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0.borrow().level())
        }
    }

    impl OutputPin for SimPin {
        fn set_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    impl IoPin for SimPin {
        fn set_input_pullup(&mut self) {
            // The script is timed from the moment the line is released.
            self.0.borrow_mut().now_us = 0;
        }
        fn set_output(&mut self) {}
    }

    struct SimDelay(Rc<RefCell<LineScript>>);

    impl DelayNs for SimDelay {
        fn delay_ns(&mut self, ns: u32) {
            let mut script = self.0.borrow_mut();
            script.now_us = script.now_us.saturating_add(ns / 1_000);
        }
    }

    /// The waveform a healthy sensor puts on the wire for `bytes`: ~40 µs
    /// of residual high, the 80/80 acknowledgment, then per bit a 50 µs low
    /// marker and a high pulse (30 µs for '1', 10 µs for '0'), then a final
    /// 50 µs low before the line idles high.
    fn waveform(bytes: [u8; 5]) -> Vec<(bool, u32)> {
        let mut segments = vec![(true, 40), (false, 80), (true, 80)];
        for byte in bytes {
            for bit in (0..8).rev() {
                segments.push((false, 50));
                segments.push((true, if byte & (1 << bit) != 0 { 30 } else { 10 }));
            }
        }
        segments.push((false, 50));
        segments
    }

    fn sensor_with(segments: Vec<(bool, u32)>) -> Dht22<SimPin, SimDelay> {
        let script = Rc::new(RefCell::new(LineScript {
            segments,
            now_us: 0,
        }));
        Dht22::new(SimPin(script.clone()), SimDelay(script))
    }

    #[test]
    fn reads_known_frame_end_to_end() {
        // 40.0 % / 20.0 C with a valid checksum.
        let mut sensor = sensor_with(waveform([0x01, 0x90, 0x00, 0xC8, 0x59]));
        let mut cache = ReadingCache::new();

        let record = sensor.read(&mut cache).unwrap();
        assert_eq!(record.source, Source::Fresh);
        assert_eq!(record.humidity_percent, 40.0);
        assert_eq!(record.temperature_celsius, 20.0);
        assert_eq!(record.temperature_fahrenheit, 68.0);
        assert!(approx_eq!(
            f32,
            record.heat_index_fahrenheit,
            crate::metrics::heat_index(68.0, 40.0),
            epsilon = 1e-4
        ));
        assert!(approx_eq!(
            f32,
            record.dew_point_fahrenheit,
            crate::metrics::celsius_to_fahrenheit(crate::metrics::dew_point(20.0, 40.0)),
            epsilon = 1e-4
        ));
    }

    #[test]
    fn negative_temperature_end_to_end() {
        // tempHigh 0x80 / tempLow 0x32: sign bit set, magnitude 50 -> -5.0 C.
        let mut sensor = sensor_with(waveform([0x01, 0x90, 0x80, 0x32, 0x43]));
        let mut cache = ReadingCache::new();

        let record = sensor.read(&mut cache).unwrap();
        assert_eq!(record.temperature_celsius, -5.0);
        assert_eq!(record.humidity_percent, 40.0);
    }

    #[test]
    fn checksum_failure_falls_back_to_cache() {
        let mut cache = ReadingCache::new();

        // 55.0 % / 22.0 C, valid: 0x02 + 0x26 + 0x00 + 0xDC = 0x104 -> 0x04.
        let mut sensor = sensor_with(waveform([0x02, 0x26, 0x00, 0xDC, 0x04]));
        let first = sensor.read(&mut cache).unwrap();
        assert_eq!(first.source, Source::Fresh);
        assert_eq!(first.humidity_percent, 55.0);
        assert_eq!(first.temperature_celsius, 22.0);

        // Same frame with a corrupted checksum byte.
        let mut sensor = sensor_with(waveform([0x02, 0x26, 0x00, 0xDC, 0x05]));
        let second = sensor.read(&mut cache).unwrap();
        assert_eq!(second.source, Source::Cached);
        assert_eq!(second.humidity_percent, 55.0);
        assert_eq!(second.temperature_celsius, 22.0);
    }

    #[test]
    fn cold_start_with_bad_frame_reports_no_data() {
        let mut sensor = sensor_with(waveform([0x02, 0x26, 0x00, 0xDC, 0x05]));
        let mut cache = ReadingCache::new();

        assert_eq!(
            sensor.read(&mut cache),
            Err(DhtError::ChecksumMismatch)
        );
        assert!(cache.get().is_none());
    }

    #[test]
    fn silent_sensor_reports_insufficient_bits() {
        // Line never leaves idle high: the first poll saturates and the
        // decoder gets a single transition.
        let mut sensor = sensor_with(vec![(true, u32::MAX)]);
        let mut cache = ReadingCache::new();

        assert_eq!(
            sensor.read(&mut cache),
            Err(DhtError::InsufficientBits)
        );
    }

    #[test]
    fn truncated_frame_falls_back() {
        let mut cache = ReadingCache::new();
        cache.put(Reading {
            humidity_percent: 48.0,
            temperature_celsius: 21.5,
        });

        // Only the first twelve bits before the sensor dies.
        let mut segments = waveform([0x01, 0x90, 0x00, 0xC8, 0x59]);
        segments.truncate(3 + 2 * 12);
        let mut sensor = sensor_with(segments);

        let record = sensor.read(&mut cache).unwrap();
        assert_eq!(record.source, Source::Cached);
        assert_eq!(record.humidity_percent, 48.0);
        assert_eq!(record.temperature_celsius, 21.5);
    }

    #[test]
    fn implausible_humidity_is_rejected() {
        // 0xFF 0xFF humidity (6553.5 %) with a valid checksum.
        let mut sensor = sensor_with(waveform([0xFF, 0xFF, 0x00, 0xC8, 0xC6]));
        let mut cache = ReadingCache::new();

        assert_eq!(sensor.read(&mut cache), Err(DhtError::InvalidData));
    }
}
