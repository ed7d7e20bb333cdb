//! Bit decoder and checksum validation for the 40-bit frame.

use crate::sampler::TransitionSample;
use crate::{DhtError, BIT_ONE_THRESHOLD_TICKS, FRAME_BITS};

/// The raw 5-byte frame rebuilt from a transition sequence, together with
/// how many data bits actually made it in. Transient; built fresh per read
/// and discarded after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawFrame {
    /// `[humidity high, humidity low, temperature high, temperature low,
    /// checksum]`, most significant bit first.
    pub bytes: [u8; 5],
    /// Data bits recovered, 40 for a complete frame.
    pub bits_read: u8,
}

/// Fold a transition sequence into a [`RawFrame`].
///
/// The first two transitions are the sensor's ready acknowledgment and carry
/// no data. After that the line alternates between a fixed-width low marker
/// and the high pulse whose width is the bit, so only every second
/// transition counts: the ones at even ordinals past 2, whose recorded
/// duration is the high pulse. Longer than 16 ticks is a '1'.
pub(crate) fn decode(samples: &[TransitionSample]) -> RawFrame {
    let mut frame = RawFrame {
        bytes: [0; 5],
        bits_read: 0,
    };

    for (ordinal, sample) in samples.iter().enumerate() {
        if ordinal <= 2 || ordinal % 2 != 0 || frame.bits_read >= FRAME_BITS {
            continue;
        }
        let byte = usize::from(frame.bits_read / 8);
        frame.bytes[byte] <<= 1;
        if sample.ticks > BIT_ONE_THRESHOLD_TICKS {
            frame.bytes[byte] |= 1;
        }
        frame.bits_read += 1;
    }

    frame
}

/// Accept a frame only if all 40 bits arrived and the checksum byte equals
/// the truncated sum of the four data bytes.
pub(crate) fn validate(frame: &RawFrame) -> Result<(), DhtError> {
    if frame.bits_read < FRAME_BITS {
        return Err(DhtError::InsufficientBits);
    }
    let sum = u16::from(frame.bytes[0])
        + u16::from(frame.bytes[1])
        + u16::from(frame.bytes[2])
        + u16::from(frame.bytes[3]);
    if frame.bytes[4] == (sum & 0xFF) as u8 {
        Ok(())
    } else {
        Err(DhtError::ChecksumMismatch)
    }
}
