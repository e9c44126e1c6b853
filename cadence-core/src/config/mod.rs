//! Configuration types
//!
//! Board-level settings fixed at build or initialization time. The
//! defaults describe the reference board: a 16 MHz ATmega2560 with one
//! extruder and a heated bed.

pub mod analog;
pub mod clock;

pub use analog::*;
pub use clock::*;

/// Samples accumulated per stable analog reading
pub const OVERSAMPLENR: u16 = 16;

/// Supply voltage of the analog reference, in volts
pub const HAL_VOLTAGE: f32 = 5.0;

/// Linear advance sentinel meaning "no advance step scheduled"
pub const ADV_NEVER: u16 = 0xFFFF;

/// Digital pin number of analog input `pin`
pub const fn analog_input_to_digital_pin(pin: u8) -> u16 {
    pin as u16 + 0xA0
}
