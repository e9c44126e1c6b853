//! USART0 console

use core::cell::Cell;

use cadence_hal::uart::status::{clear_tx_complete, RXC, TXC, U2X, UDRE};
use cadence_hal::uart::{DataBits, Parity, StopBits};
use cadence_hal::{UartConfig, UartHardware};

use crate::pac;
use crate::F_CPU;

const RXCIE: u8 = 1 << 7;
const RXEN: u8 = 1 << 4;
const TXEN: u8 = 1 << 3;

/// USART0 in asynchronous double-speed mode
#[derive(Debug)]
pub struct AvrUsart0 {
    written: Cell<bool>,
}

fn usart() -> &'static pac::usart0::RegisterBlock {
    // SAFETY: AvrUsart0 is the single owner of USART0
    unsafe { &*pac::USART0::ptr() }
}

impl AvrUsart0 {
    /// # Safety
    ///
    /// Takes ownership of USART0; at most one instance may exist.
    pub const unsafe fn new() -> Self {
        Self {
            written: Cell::new(false),
        }
    }
}

/// UCSRnC frame format bits
fn frame_bits(config: &UartConfig) -> u8 {
    let size = match config.data_bits {
        DataBits::Seven => 0b010 << 1,
        DataBits::Eight => 0b011 << 1,
    };
    let parity = match config.parity {
        Parity::None => 0,
        Parity::Even => 0b10 << 4,
        Parity::Odd => 0b11 << 4,
    };
    let stop = match config.stop_bits {
        StopBits::One => 0,
        StopBits::Two => 1 << 3,
    };
    size | parity | stop
}

impl UartHardware for AvrUsart0 {
    fn configure(&self, config: &UartConfig) {
        let usart = usart();
        usart.ucsr0b.write(|w| unsafe { w.bits(0) });
        usart.ucsr0a.write(|w| unsafe { w.bits(U2X) });
        usart
            .ubrr0
            .write(|w| unsafe { w.bits(config.baud_register(F_CPU)) });
        usart.ucsr0c.write(|w| unsafe { w.bits(frame_bits(config)) });
        usart
            .ucsr0b
            .write(|w| unsafe { w.bits(RXCIE | RXEN | TXEN) });
    }

    fn write_byte(&self, byte: u8) {
        let usart = usart();
        while usart.ucsr0a.read().bits() & UDRE == 0 {
            core::hint::spin_loop();
        }
        // Writing TXC clears it so flush can wait for this byte
        usart
            .ucsr0a
            .modify(|r, w| unsafe { w.bits(clear_tx_complete(r.bits())) });
        usart.udr0.write(|w| unsafe { w.bits(byte) });
        self.written.set(true);
    }

    fn flush(&self) {
        // TXC never sets if nothing was sent
        if !self.written.get() {
            return;
        }
        let usart = usart();
        while usart.ucsr0a.read().bits() & (UDRE | TXC) != (UDRE | TXC) {
            core::hint::spin_loop();
        }
    }

    fn try_read(&self) -> Option<u8> {
        let usart = usart();
        if usart.ucsr0a.read().bits() & RXC != 0 {
            Some(usart.udr0.read().bits())
        } else {
            None
        }
    }
}
