//! Analog converter abstractions
//!
//! The reference platform has one successive-approximation converter
//! behind an input multiplexer. Only one conversion can be in flight.

/// Multiplexer input selecting the physical analog pin
pub type AdcMux = u8;

/// Largest raw value of the 10-bit converter
pub const ADC_MAX: u16 = 1023;

/// Single shared analog-to-digital converter
pub trait AdcHardware {
    /// Power the converter and select reference and prescaler
    fn init(&self);

    /// Select `mux` and start a single conversion
    fn start_conversion(&self, mux: AdcMux);

    /// Check whether a conversion is still running
    fn is_converting(&self) -> bool;

    /// Read the result of the last finished conversion
    fn result(&self) -> u16;
}

impl<T: AdcHardware + ?Sized> AdcHardware for &T {
    fn init(&self) {
        (**self).init()
    }

    fn start_conversion(&self, mux: AdcMux) {
        (**self).start_conversion(mux)
    }

    fn is_converting(&self) -> bool {
        (**self).is_converting()
    }

    fn result(&self) -> u16 {
        (**self).result()
    }
}
