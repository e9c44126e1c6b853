//! UART serial console abstractions
//!
//! Provides the register-level view of the console serial port that the
//! byte-stream transport in `cadence-core` wraps.

/// UART peripheral
///
/// Transmit is polled from the foreground. Receive is drained from the
/// receive-complete interrupt through [`UartHardware::try_read`].
pub trait UartHardware {
    /// Apply frame format and baud rate, enabling receiver and transmitter
    fn configure(&self, config: &UartConfig);

    /// Write one byte, busy-waiting for the data register to empty
    fn write_byte(&self, byte: u8);

    /// Block until the last byte has left the shift register
    fn flush(&self);

    /// Take a received byte if one is waiting
    fn try_read(&self) -> Option<u8>;
}

impl<T: UartHardware + ?Sized> UartHardware for &T {
    fn configure(&self, config: &UartConfig) {
        (**self).configure(config)
    }

    fn write_byte(&self, byte: u8) {
        (**self).write_byte(byte)
    }

    fn flush(&self) {
        (**self).flush()
    }

    fn try_read(&self) -> Option<u8> {
        (**self).try_read()
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 250_000,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// 8N1 at the given baud rate
    pub const fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }

    /// Baud rate register value for double-speed mode (U2X set)
    ///
    /// `UBRR = F_CPU / (8 * baud) - 1`, rounded to nearest.
    pub const fn baud_register(&self, f_cpu_hz: u32) -> u16 {
        let divisor = 4 * self.baudrate;
        let ubrr = (f_cpu_hz + divisor) / (2 * divisor);
        if ubrr == 0 {
            0
        } else {
            (ubrr - 1) as u16
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// Status register (UCSRnA) bits
pub mod status {
    pub const RXC: u8 = 1 << 7;
    pub const TXC: u8 = 1 << 6;
    pub const UDRE: u8 = 1 << 5;
    /// Frame error
    pub const FE: u8 = 1 << 4;
    /// Data overrun
    pub const DOR: u8 = 1 << 3;
    /// Parity error
    pub const UPE: u8 = 1 << 2;
    /// Double speed
    pub const U2X: u8 = 1 << 1;

    /// Value to write back to clear TXC, given the current contents
    ///
    /// Keeps the speed mode. The receive error flags must be written as
    /// zero and multi-processor mode stays off.
    pub const fn clear_tx_complete(current: u8) -> u8 {
        (current & U2X) | TXC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_register_16mhz() {
        // Datasheet values for U2X = 1 at 16 MHz
        assert_eq!(UartConfig::with_baudrate(115_200).baud_register(16_000_000), 16);
        assert_eq!(UartConfig::with_baudrate(250_000).baud_register(16_000_000), 7);
        assert_eq!(UartConfig::with_baudrate(9_600).baud_register(16_000_000), 207);
    }

    #[test]
    fn test_clear_tx_complete_zeroes_error_flags() {
        use status::*;

        let current = RXC | UDRE | FE | DOR | UPE | U2X | 1;
        assert_eq!(clear_tx_complete(current), U2X | TXC);
        assert_eq!(clear_tx_complete(TXC), TXC);
        assert_eq!(clear_tx_complete(0), TXC);
    }
}
