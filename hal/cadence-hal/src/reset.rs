//! Reset cause decoding

/// Flags latched in the MCU status register at reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetSource(u8);

impl ResetSource {
    pub const POWER_ON: u8 = 1 << 0;
    pub const EXTERNAL: u8 = 1 << 1;
    pub const BROWN_OUT: u8 = 1 << 2;
    pub const WATCHDOG: u8 = 1 << 3;
    pub const JTAG: u8 = 1 << 4;

    /// Decode a raw status register value
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x1F)
    }

    /// Raw flag bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn power_on(self) -> bool {
        self.0 & Self::POWER_ON != 0
    }

    pub const fn external(self) -> bool {
        self.0 & Self::EXTERNAL != 0
    }

    pub const fn brown_out(self) -> bool {
        self.0 & Self::BROWN_OUT != 0
    }

    pub const fn watchdog(self) -> bool {
        self.0 & Self::WATCHDOG != 0
    }

    pub const fn jtag(self) -> bool {
        self.0 & Self::JTAG != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flags() {
        let src = ResetSource::from_bits(ResetSource::WATCHDOG | ResetSource::EXTERNAL);
        assert!(src.watchdog());
        assert!(src.external());
        assert!(!src.power_on());
        assert!(!src.brown_out());
    }

    #[test]
    fn test_reserved_bits_masked() {
        assert_eq!(ResetSource::from_bits(0xE1).bits(), ResetSource::POWER_ON);
    }
}
