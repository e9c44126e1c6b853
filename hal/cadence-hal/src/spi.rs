//! Synchronous serial link abstractions
//!
//! Provides the register-level view of a byte-oriented SPI master: one
//! data register, one transfer-complete flag and a clock divisor.

/// Block size of sector-addressed peripherals (SD cards)
pub const BLOCK_SIZE: usize = 512;

/// Filler byte clocked out while receiving
pub const FILLER: u8 = 0xFF;

/// Supported SPI clock divisors, fastest first
///
/// The link clock is `F_CPU / divisor`. Each step down the ladder halves
/// the clock rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockDivisor {
    Div2 = 2,
    Div4 = 4,
    Div8 = 8,
    Div16 = 16,
    Div32 = 32,
    Div64 = 64,
    Div128 = 128,
}

impl ClockDivisor {
    /// The full divisor ladder, fastest first
    pub const LADDER: [ClockDivisor; 7] = [
        ClockDivisor::Div2,
        ClockDivisor::Div4,
        ClockDivisor::Div8,
        ClockDivisor::Div16,
        ClockDivisor::Div32,
        ClockDivisor::Div64,
        ClockDivisor::Div128,
    ];

    /// Pick the supported divisor closest to `requested` without running
    /// faster than it asks for
    ///
    /// Walks the ladder downward in rate: the result is the smallest
    /// supported divisor that is `>= requested`, saturating at 128.
    pub fn nearest(requested: u8) -> Self {
        Self::LADDER
            .iter()
            .copied()
            .find(|d| d.divisor() >= requested)
            .unwrap_or(ClockDivisor::Div128)
    }

    /// Numeric divisor
    pub const fn divisor(self) -> u8 {
        self as u8
    }

    /// Position on the ladder (0 for /2 up to 6 for /128)
    pub const fn rank(self) -> u8 {
        match self {
            ClockDivisor::Div2 => 0,
            ClockDivisor::Div4 => 1,
            ClockDivisor::Div8 => 2,
            ClockDivisor::Div16 => 3,
            ClockDivisor::Div32 => 4,
            ClockDivisor::Div64 => 5,
            ClockDivisor::Div128 => 6,
        }
    }

    /// Value of the SPR1:SPR0 rate select bits
    pub const fn rate_bits(self) -> u8 {
        self.rank() >> 1
    }

    /// Whether the SPI2X double-speed bit must be set
    ///
    /// Even ranks use double speed with the next slower SPR setting; /128
    /// has no double-speed equivalent.
    pub const fn double_speed(self) -> bool {
        let rank = self.rank();
        rank & 1 == 0 && rank != 6
    }

    /// Resulting link clock in Hz for a given core clock
    pub const fn frequency_hz(self, f_cpu_hz: u32) -> u32 {
        f_cpu_hz / self.divisor() as u32
    }
}

/// SPI master peripheral
///
/// Only the foreground context may drive this peripheral. Transfers are
/// polled; nothing here is interrupt driven.
pub trait SpiHardware {
    /// Configure the link pins (MISO input, MOSI/SCK/SS outputs, SS high)
    fn begin(&self);

    /// Power and enable the peripheral in master mode at the given divisor
    ///
    /// Master mode only holds while SS is an output or held high, so
    /// [`Self::begin`] must have run first.
    fn configure(&self, divisor: ClockDivisor);

    /// Load the data register, starting a transfer
    fn write_data(&self, byte: u8);

    /// Check the transfer-complete flag
    fn transfer_complete(&self) -> bool;

    /// Read the byte shifted in by the last transfer
    fn read_data(&self) -> u8;
}

impl<T: SpiHardware + ?Sized> SpiHardware for &T {
    fn begin(&self) {
        (**self).begin()
    }

    fn configure(&self, divisor: ClockDivisor) {
        (**self).configure(divisor)
    }

    fn write_data(&self, byte: u8) {
        (**self).write_data(byte)
    }

    fn transfer_complete(&self) -> bool {
        (**self).transfer_complete()
    }

    fn read_data(&self) -> u8 {
        (**self).read_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_rounds_down_in_rate() {
        assert_eq!(ClockDivisor::nearest(0), ClockDivisor::Div2);
        assert_eq!(ClockDivisor::nearest(2), ClockDivisor::Div2);
        assert_eq!(ClockDivisor::nearest(3), ClockDivisor::Div4);
        assert_eq!(ClockDivisor::nearest(4), ClockDivisor::Div4);
        assert_eq!(ClockDivisor::nearest(100), ClockDivisor::Div128);
        assert_eq!(ClockDivisor::nearest(255), ClockDivisor::Div128);
    }

    #[test]
    fn test_register_bits_match_ladder() {
        // (divisor, SPR bits, SPI2X) per the ATmega datasheet table
        let expected = [
            (ClockDivisor::Div2, 0, true),
            (ClockDivisor::Div4, 0, false),
            (ClockDivisor::Div8, 1, true),
            (ClockDivisor::Div16, 1, false),
            (ClockDivisor::Div32, 2, true),
            (ClockDivisor::Div64, 2, false),
            (ClockDivisor::Div128, 3, false),
        ];
        for (div, spr, x2) in expected {
            assert_eq!(div.rate_bits(), spr, "{:?}", div);
            assert_eq!(div.double_speed(), x2, "{:?}", div);
        }
    }

    #[test]
    fn test_frequency() {
        assert_eq!(ClockDivisor::Div2.frequency_hz(16_000_000), 8_000_000);
        assert_eq!(ClockDivisor::Div128.frequency_hz(16_000_000), 125_000);
    }
}
