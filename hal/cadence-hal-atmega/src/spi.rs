//! Hardware SPI master on PORTB

use cadence_hal::{ClockDivisor, SpiHardware};

use crate::pac;

const SS: u8 = 1 << 0;
const SCK: u8 = 1 << 1;
const MOSI: u8 = 1 << 2;
const MISO: u8 = 1 << 3;

const PRSPI: u8 = 1 << 2;

const SPE: u8 = 1 << 6;
const MSTR: u8 = 1 << 4;
const SPIF: u8 = 1 << 7;
const SPI2X: u8 = 1 << 0;

/// SPI master, mode 0, MSB first
#[derive(Debug)]
pub struct AvrSpi {
    _private: (),
}

fn spi() -> &'static pac::spi::RegisterBlock {
    // SAFETY: AvrSpi is the single owner of the SPI block
    unsafe { &*pac::SPI::ptr() }
}

fn portb() -> &'static pac::portb::RegisterBlock {
    // SAFETY: only the SPI pins of PORTB are modified, with read-modify-write
    // from the foreground
    unsafe { &*pac::PORTB::ptr() }
}

impl AvrSpi {
    /// # Safety
    ///
    /// Takes ownership of the SPI block and PB0-PB3; at most one instance
    /// may exist.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl SpiHardware for AvrSpi {
    fn begin(&self) {
        let port = portb();
        // SS must stay high (or be an output) for master mode to stick
        port.portb.modify(|r, w| unsafe { w.bits(r.bits() | SS) });
        port.ddrb
            .modify(|r, w| unsafe { w.bits((r.bits() | SS | SCK | MOSI) & !MISO) });
    }

    fn configure(&self, divisor: ClockDivisor) {
        // SAFETY: PRR0 is only touched here and during single-threaded boot
        let cpu = unsafe { &*pac::CPU::ptr() };
        cpu.prr0.modify(|r, w| unsafe { w.bits(r.bits() & !PRSPI) });

        let spi = spi();
        spi.spcr
            .write(|w| unsafe { w.bits(SPE | MSTR | divisor.rate_bits()) });
        spi.spsr.write(|w| unsafe {
            w.bits(if divisor.double_speed() { SPI2X } else { 0 })
        });
    }

    fn write_data(&self, byte: u8) {
        spi().spdr.write(|w| unsafe { w.bits(byte) });
    }

    fn transfer_complete(&self) -> bool {
        spi().spsr.read().bits() & SPIF != 0
    }

    fn read_data(&self) -> u8 {
        spi().spdr.read().bits()
    }
}
