//! Watchdog reset and memory headroom

/// Watchdog timeout periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogTimeout {
    Ms15,
    Ms30,
    Ms60,
    Ms120,
    Ms250,
    Ms500,
    S1,
    S2,
    S4,
    S8,
}

impl WatchdogTimeout {
    /// WDP3..WDP0 encoding, placed at their WDTCSR bit positions
    pub const fn prescaler_bits(self) -> u8 {
        let wdp = self as u8;
        ((wdp & 0b1000) << 2) | (wdp & 0b0111)
    }

    /// Nominal period in milliseconds
    pub const fn millis(self) -> u16 {
        16 << (self as u8)
    }
}

/// Bytes between the end of static data and the stack pointer
///
/// This is the room left for the stack to grow into; there is no heap.
pub const fn free_ram(data_end: usize, stack_pointer: usize) -> usize {
    stack_pointer.saturating_sub(data_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prescaler_bits() {
        assert_eq!(WatchdogTimeout::Ms15.prescaler_bits(), 0);
        assert_eq!(WatchdogTimeout::S2.prescaler_bits(), 0b0000_0111);
        // WDP3 sits apart from WDP2..0
        assert_eq!(WatchdogTimeout::S4.prescaler_bits(), 0b0010_0000);
        assert_eq!(WatchdogTimeout::S8.prescaler_bits(), 0b0010_0001);
    }

    #[test]
    fn test_periods_double() {
        assert_eq!(WatchdogTimeout::Ms15.millis(), 16);
        assert_eq!(WatchdogTimeout::Ms30.millis(), 32);
        assert_eq!(WatchdogTimeout::S8.millis(), 8192);
    }

    #[test]
    fn test_free_ram() {
        assert_eq!(free_ram(0x0400, 0x21FF), 0x1DFF);
        // Stack already ran into static data
        assert_eq!(free_ram(0x2000, 0x1F00), 0);
    }
}
