//! Console byte-stream transport
//!
//! Received bytes are moved from the UART into a bounded queue by the
//! receive interrupt and consumed by the foreground. Transmit is polled.

use core::convert::Infallible;

use cadence_hal::{InterruptControl, UartConfig, UartHardware};
use heapless::Deque;

use crate::critical::{free, CriticalSection, IrqCell};

struct RxState<const N: usize> {
    queue: Deque<u8, N>,
    overruns: u32,
}

/// Buffered console port
pub struct SerialTransport<U, I, const N: usize> {
    hw: U,
    irq: I,
    rx: IrqCell<RxState<N>>,
}

impl<U: UartHardware, I: InterruptControl, const N: usize> SerialTransport<U, I, N> {
    pub const fn new(hw: U, irq: I) -> Self {
        Self {
            hw,
            irq,
            rx: IrqCell::new(RxState {
                queue: Deque::new(),
                overruns: 0,
            }),
        }
    }

    /// Apply a full frame configuration
    pub fn configure(&self, config: &UartConfig) {
        self.hw.configure(config);
    }

    /// Switch to 8N1 at `baudrate`
    pub fn set_baudrate(&self, baudrate: u32) {
        self.configure(&UartConfig::with_baudrate(baudrate));
    }

    /// Receive interrupt handler
    ///
    /// Drains the UART into the queue. Bytes that do not fit are dropped
    /// and counted.
    pub fn on_receive(&self) {
        let cs = CriticalSection::enter(&self.irq);
        let mut rx = self.rx.borrow_mut(&cs);
        while let Some(byte) = self.hw.try_read() {
            if rx.queue.push_back(byte).is_err() {
                rx.overruns = rx.overruns.wrapping_add(1);
            }
        }
    }

    /// Number of queued bytes
    pub fn available(&self) -> usize {
        free(&self.irq, |cs| self.rx.borrow(cs).queue.len())
    }

    pub fn byte_available(&self) -> bool {
        self.available() > 0
    }

    /// Take the oldest queued byte
    pub fn read_byte(&self) -> Option<u8> {
        free(&self.irq, |cs| self.rx.borrow_mut(cs).queue.pop_front())
    }

    pub fn write_byte(&self, byte: u8) {
        self.hw.write_byte(byte);
    }

    /// Wait until everything written has been transmitted
    pub fn flush(&self) {
        self.hw.flush();
    }

    /// Bytes dropped because the queue was full
    pub fn overruns(&self) -> u32 {
        free(&self.irq, |cs| self.rx.borrow(cs).overruns)
    }
}

impl<U, I, const N: usize> embedded_io::ErrorType for SerialTransport<U, I, N> {
    type Error = Infallible;
}

impl<U: UartHardware, I: InterruptControl, const N: usize> embedded_io::Read
    for SerialTransport<U, I, N>
{
    /// Blocks until at least one byte is queued
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let cs = CriticalSection::enter(&self.irq);
            let mut rx = self.rx.borrow_mut(&cs);
            let mut count = 0;
            while count < buf.len() {
                match rx.queue.pop_front() {
                    Some(byte) => {
                        buf[count] = byte;
                        count += 1;
                    }
                    None => break,
                }
            }
            if count > 0 {
                return Ok(count);
            }
            drop(rx);
            drop(cs);
            core::hint::spin_loop();
        }
    }
}

impl<U: UartHardware, I: InterruptControl, const N: usize> embedded_io::ReadReady
    for SerialTransport<U, I, N>
{
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.byte_available())
    }
}

impl<U: UartHardware, I: InterruptControl, const N: usize> embedded_io::Write
    for SerialTransport<U, I, N>
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.write_byte(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        SerialTransport::flush(self);
        Ok(())
    }
}

impl<U: UartHardware, I: InterruptControl, const N: usize> core::fmt::Write
    for SerialTransport<U, I, N>
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for &byte in s.as_bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}
