//! Busy-wait synchronous block transport
//!
//! Full-duplex, master-driven byte transport on top of a polled SPI data
//! register. Every operation busy-waits on the transfer-complete flag with
//! no timeout, so a peripheral that never completes hangs the caller. Call
//! only from foreground code, never from a timer handler.
//!
//! Bulk operations are pipelined: the next outgoing byte is computed while
//! the current transfer is still shifting, and loaded the moment the flag
//! is raised.

use core::convert::Infallible;

use cadence_hal::spi::{BLOCK_SIZE, FILLER};
use cadence_hal::{ClockDivisor, SpiHardware};

/// Synchronous transport over an SPI master
pub struct SyncTransport<S> {
    hw: S,
    divisor: Option<ClockDivisor>,
}

impl<S: SpiHardware> SyncTransport<S> {
    pub const fn new(hw: S) -> Self {
        Self { hw, divisor: None }
    }

    /// Set up the link pins
    pub fn begin(&mut self) {
        self.hw.begin();
    }

    /// Enter master mode at the nearest supported rate not faster than
    /// `F_CPU / requested`
    ///
    /// Sets up the link pins as well, so the link is usable without a
    /// separate [`Self::begin`]. Returns the divisor actually applied.
    pub fn configure(&mut self, requested: u8) -> ClockDivisor {
        let divisor = ClockDivisor::nearest(requested);
        self.hw.begin();
        self.hw.configure(divisor);
        self.divisor = Some(divisor);

        #[cfg(feature = "defmt")]
        if divisor.divisor() != requested {
            defmt::debug!("SPI: divisor {} requested, using {}", requested, divisor.divisor());
        }
        divisor
    }

    /// Divisor applied by the last [`Self::configure`]
    pub fn divisor(&self) -> Option<ClockDivisor> {
        self.divisor
    }

    /// Underlying SPI peripheral
    pub fn hardware(&self) -> &S {
        &self.hw
    }

    /// Send `out` and return the byte received in the same slot
    pub fn exchange_byte(&mut self, out: u8) -> u8 {
        self.hw.write_data(out);
        self.wait();
        self.hw.read_data()
    }

    /// Send one byte, discarding the response
    pub fn send_byte(&mut self, byte: u8) {
        self.exchange_byte(byte);
    }

    /// Receive one byte by clocking out the filler
    pub fn receive_byte(&mut self) -> u8 {
        self.exchange_byte(FILLER)
    }

    /// Send `bytes`, discarding the responses
    pub fn send(&mut self, bytes: &[u8]) {
        let Some((&first, rest)) = bytes.split_first() else {
            return;
        };
        self.hw.write_data(first);
        for &byte in rest {
            self.wait();
            self.hw.write_data(byte);
        }
        self.wait();
    }

    /// Send `token` followed by a full block, discarding the responses
    pub fn send_block(&mut self, token: u8, block: &[u8; BLOCK_SIZE]) {
        self.hw.write_data(token);
        for &byte in block {
            self.wait();
            self.hw.write_data(byte);
        }
        self.wait();
    }

    /// Fill `buf` with received bytes, clocking out the filler
    pub fn receive_block(&mut self, buf: &mut [u8]) {
        let Some((last, head)) = buf.split_last_mut() else {
            return;
        };
        self.hw.write_data(FILLER);
        for slot in head {
            self.wait();
            let byte = self.hw.read_data();
            self.hw.write_data(FILLER);
            *slot = byte;
        }
        self.wait();
        *last = self.hw.read_data();
    }

    fn wait(&self) {
        while !self.hw.transfer_complete() {
            core::hint::spin_loop();
        }
    }
}

impl<S: SpiHardware> embedded_hal::spi::ErrorType for SyncTransport<S> {
    type Error = Infallible;
}

impl<S: SpiHardware> embedded_hal::spi::SpiBus<u8> for SyncTransport<S> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.receive_block(words);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.send(words);
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().max(write.len());
        for i in 0..len {
            let received = self.exchange_byte(write.get(i).copied().unwrap_or(FILLER));
            if let Some(slot) = read.get_mut(i) {
                *slot = received;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.exchange_byte(*word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Every operation waits for its last transfer before returning
        Ok(())
    }
}
