//! The shared data line, as this driver sees it.

use embedded_hal::digital::InputPin;

use crate::DhtError;

/// Electrical level of the data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// Direction control for the data line.
///
/// The protocol needs the same pin driven as an output for the wake-up
/// handshake and then read as an input for the answer, and `embedded-hal`
/// 1.0 has no trait for switching a pin's direction. Implementations wrap
/// their platform's reconfigurable pin; the input mode should enable a
/// pull-up where the hardware has one, since the idle line level is high.
pub trait IoPin {
    /// Reconfigure the pin as an input, with pull-up if available.
    fn set_input_pullup(&mut self);

    /// Reconfigure the pin as a push-pull output.
    fn set_output(&mut self);
}

/// Current line level, with pin faults mapped onto the crate error.
pub(crate) fn level<P: InputPin>(pin: &mut P) -> Result<Level, DhtError> {
    if pin.is_high().map_err(|_| DhtError::Pin)? {
        Ok(Level::High)
    } else {
        Ok(Level::Low)
    }
}
