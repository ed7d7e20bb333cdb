//! Signal sampler: wakes the sensor, then records how long the line holds
//! each state until the frame ends or the line goes quiet.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::line::{self, IoPin, Level};
use crate::{
    DhtError, MAX_TRANSITIONS, POLL_TICK_US, RELEASE_HIGH_US, STATE_TIMEOUT_TICKS, TRIGGER_LOW_MS,
    WAKE_HOLD_MS,
};

/// One observed line transition: the level the line settled into and how
/// many poll ticks the previous state lasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransitionSample {
    /// Line level after the transition.
    pub level_after: Level,
    /// Ticks spent in the state that just ended.
    pub ticks: u8,
    /// The run hit the 255-tick bound instead of a real edge. A saturated
    /// run still bounds the bit before it, but it means the sensor has
    /// stopped talking, so sampling ends after emitting it.
    pub saturated: bool,
}

/// Transition sequence of one sensor exchange, in wire order.
pub(crate) type SampleBuf = heapless::Vec<TransitionSample, MAX_TRANSITIONS>;

/// Run the wake-up handshake and sample the sensor's answer.
///
/// Handshake: drive the line high for 10 ms, low for 18 ms, high for 40 µs,
/// then release it to the sensor by switching to input. From there each
/// iteration counts 1 µs ticks while the level holds, up to 255, and emits
/// one [`TransitionSample`]. Sampling stops at 85 transitions or on the
/// first saturated run, whichever comes first.
///
/// The caller is responsible for running this inside a critical section;
/// a scheduling gap longer than a short pulse corrupts the read.
pub(crate) fn sample<P, D>(pin: &mut P, delay: &mut D) -> Result<SampleBuf, DhtError>
where
    P: InputPin + OutputPin + IoPin,
    D: DelayNs,
{
    pin.set_output();
    pin.set_high().map_err(|_| DhtError::Pin)?;
    delay.delay_ms(WAKE_HOLD_MS);
    pin.set_low().map_err(|_| DhtError::Pin)?;
    delay.delay_ms(TRIGGER_LOW_MS);
    pin.set_high().map_err(|_| DhtError::Pin)?;
    delay.delay_us(RELEASE_HIGH_US);

    pin.set_input_pullup();

    let mut samples = SampleBuf::new();
    let mut last = Level::High;

    while samples.len() < MAX_TRANSITIONS {
        let mut ticks: u8 = 0;
        while line::level(pin)? == last && ticks < STATE_TIMEOUT_TICKS {
            ticks += 1;
            delay.delay_us(POLL_TICK_US);
        }
        last = line::level(pin)?;

        let saturated = ticks >= STATE_TIMEOUT_TICKS;
        // Capacity is MAX_TRANSITIONS and the loop condition guards it.
        let _ = samples.push(TransitionSample {
            level_after: last,
            ticks,
            saturated,
        });
        if saturated {
            break;
        }
    }

    Ok(samples)
}
