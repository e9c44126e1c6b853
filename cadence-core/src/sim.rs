//! Host simulation doubles for the `cadence-hal` traits
//!
//! These stand in for the microcontroller registers when running on the
//! development host. Each double keeps just enough state to observe the
//! ordering and timing contracts of the primitives in this crate: which
//! bits were flipped in what order, whether a transfer was overrun,
//! whether two conversions overlapped.

use core::cell::{Cell, RefCell};

use cadence_hal::adc::AdcMux;
use cadence_hal::spi::FILLER;
use cadence_hal::{
    AdcHardware, ClockDivisor, CycleDelay, InterruptControl, InterruptMask, SpiHardware,
    TimerChannel, TimerCount, TimerHardware, UartConfig, UartHardware,
};
use heapless::{Deque, Vec};

/// Capacity of the simulated SPI byte logs
pub const SPI_LOG_SIZE: usize = 1024;

/// Status register with a global interrupt enable bit
#[derive(Debug)]
pub struct SimInterrupts {
    sreg: Cell<u8>,
}

impl SimInterrupts {
    /// Start with interrupts enabled or disabled and all other flags clear
    pub const fn new(enabled: bool) -> Self {
        let bits = if enabled { InterruptMask::GLOBAL_ENABLE } else { 0 };
        Self::with_bits(bits)
    }

    /// Start from an arbitrary status register image
    pub const fn with_bits(bits: u8) -> Self {
        Self {
            sreg: Cell::new(bits),
        }
    }
}

impl InterruptControl for SimInterrupts {
    fn save(&self) -> InterruptMask {
        InterruptMask::from_bits(self.sreg.get())
    }

    fn restore(&self, mask: InterruptMask) {
        self.sreg.set(mask.bits());
    }

    fn disable(&self) {
        self.sreg.set(self.sreg.get() & !InterruptMask::GLOBAL_ENABLE);
    }

    fn enable(&self) {
        self.sreg.set(self.sreg.get() | InterruptMask::GLOBAL_ENABLE);
    }
}

/// One write to a timer interrupt-enable bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableWrite {
    pub channel: TimerChannel,
    pub enabled: bool,
    /// Global interrupt flag at the time of the write
    pub irq_enabled: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct SimTimerChannel {
    enabled: bool,
    compare: TimerCount,
    pending: bool,
}

/// Two compare-match timers sharing one global interrupt flag
#[derive(Debug)]
pub struct SimTimers<'a> {
    irq: &'a SimInterrupts,
    limits: [TimerCount; TimerChannel::COUNT],
    channels: RefCell<[SimTimerChannel; TimerChannel::COUNT]>,
    writes: RefCell<Vec<EnableWrite, 32>>,
}

impl<'a> SimTimers<'a> {
    pub fn new(irq: &'a SimInterrupts) -> Self {
        Self::with_limits(irq, [TimerCount::MAX; TimerChannel::COUNT])
    }

    /// Timers whose compare registers hold at most `limits`, by channel
    pub fn with_limits(irq: &'a SimInterrupts, limits: [TimerCount; TimerChannel::COUNT]) -> Self {
        Self {
            irq,
            limits,
            channels: RefCell::new([SimTimerChannel::default(); TimerChannel::COUNT]),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// Latch the channel's compare-match flag
    pub fn raise(&self, channel: TimerChannel) {
        self.channels.borrow_mut()[channel.index()].pending = true;
    }

    /// Interrupt-enable writes in the order they happened
    pub fn enable_writes(&self) -> Vec<EnableWrite, 32> {
        self.writes.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.writes.borrow_mut().clear();
    }
}

impl TimerHardware for SimTimers<'_> {
    fn set_interrupt_enabled(&self, channel: TimerChannel, enabled: bool) {
        self.channels.borrow_mut()[channel.index()].enabled = enabled;
        let _ = self.writes.borrow_mut().push(EnableWrite {
            channel,
            enabled,
            irq_enabled: self.irq.is_enabled(),
        });
    }

    fn interrupt_enabled(&self, channel: TimerChannel) -> bool {
        self.channels.borrow()[channel.index()].enabled
    }

    fn set_compare(&self, channel: TimerChannel, count: TimerCount) {
        self.channels.borrow_mut()[channel.index()].compare = count;
    }

    fn compare(&self, channel: TimerChannel) -> TimerCount {
        self.channels.borrow()[channel.index()].compare
    }

    fn max_count(&self, channel: TimerChannel) -> TimerCount {
        self.limits[channel.index()]
    }

    fn is_pending(&self, channel: TimerChannel) -> bool {
        self.channels.borrow()[channel.index()].pending
    }

    fn clear_pending(&self, channel: TimerChannel) {
        self.channels.borrow_mut()[channel.index()].pending = false;
    }
}

/// Converter with scripted per-input values and a fixed latency
#[derive(Debug)]
pub struct SimAdc {
    values: RefCell<[u16; 16]>,
    latency: u8,
    remaining: Cell<u8>,
    in_flight: Cell<Option<AdcMux>>,
    result: Cell<u16>,
    initialized: Cell<bool>,
    starts: Cell<u32>,
    overlaps: Cell<u32>,
}

impl SimAdc {
    /// `latency` is the number of busy polls before a conversion finishes
    pub fn new(latency: u8) -> Self {
        Self {
            values: RefCell::new([0; 16]),
            latency,
            remaining: Cell::new(0),
            in_flight: Cell::new(None),
            result: Cell::new(0),
            initialized: Cell::new(false),
            starts: Cell::new(0),
            overlaps: Cell::new(0),
        }
    }

    /// Set the voltage (as a raw reading) present on an input
    pub fn set_value(&self, mux: AdcMux, raw: u16) {
        self.values.borrow_mut()[mux as usize & 0x0F] = raw;
    }

    /// Input currently being converted
    pub fn in_flight(&self) -> Option<AdcMux> {
        self.in_flight.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Total conversions started
    pub fn starts(&self) -> u32 {
        self.starts.get()
    }

    /// Conversions started while another was still running
    pub fn overlaps(&self) -> u32 {
        self.overlaps.get()
    }

    fn finish(&self) {
        if let Some(mux) = self.in_flight.take() {
            self.result.set(self.values.borrow()[mux as usize & 0x0F]);
        }
    }
}

impl AdcHardware for SimAdc {
    fn init(&self) {
        self.initialized.set(true);
    }

    fn start_conversion(&self, mux: AdcMux) {
        if self.in_flight.get().is_some() && self.remaining.get() > 0 {
            self.overlaps.set(self.overlaps.get() + 1);
        }
        self.starts.set(self.starts.get() + 1);
        self.in_flight.set(Some(mux));
        self.remaining.set(self.latency);
    }

    fn is_converting(&self) -> bool {
        let remaining = self.remaining.get();
        if remaining > 0 {
            self.remaining.set(remaining - 1);
            return true;
        }
        self.finish();
        false
    }

    fn result(&self) -> u16 {
        self.finish();
        self.result.get()
    }
}

/// SPI peripheral with a one-transfer shift register
///
/// With nothing scripted it answers every byte with the byte written on the
/// previous transfer, like a device echoing its input one slot late.
/// Writing the data register while a transfer is still running counts as a
/// write collision.
#[derive(Debug)]
pub struct SimSpi {
    latency: u8,
    remaining: Cell<u8>,
    in_flight: Cell<bool>,
    previous: Cell<u8>,
    data: Cell<u8>,
    divisor: Cell<Option<ClockDivisor>>,
    begun: Cell<bool>,
    master: Cell<bool>,
    collisions: Cell<u32>,
    polls: Cell<u32>,
    sent: RefCell<Vec<u8, SPI_LOG_SIZE>>,
    script: RefCell<Deque<u8, SPI_LOG_SIZE>>,
}

impl SimSpi {
    /// `latency` is the number of busy polls each transfer takes
    pub fn new(latency: u8) -> Self {
        Self {
            latency,
            remaining: Cell::new(0),
            in_flight: Cell::new(false),
            previous: Cell::new(FILLER),
            data: Cell::new(FILLER),
            divisor: Cell::new(None),
            begun: Cell::new(false),
            master: Cell::new(false),
            collisions: Cell::new(0),
            polls: Cell::new(0),
            sent: RefCell::new(Vec::new()),
            script: RefCell::new(Deque::new()),
        }
    }

    /// Queue bytes for the peripheral to answer with
    pub fn script(&self, bytes: &[u8]) {
        let mut script = self.script.borrow_mut();
        for &b in bytes {
            let _ = script.push_back(b);
        }
    }

    /// Feed everything written so far, minus the first `skip` bytes, back
    /// as the answers to the next transfers
    pub fn loop_back(&self, skip: usize) {
        let sent = core::mem::take(&mut *self.sent.borrow_mut());
        self.script(sent.get(skip..).unwrap_or(&[]));
    }

    /// Bytes written to the data register
    pub fn sent(&self) -> Vec<u8, SPI_LOG_SIZE> {
        self.sent.borrow().clone()
    }

    pub fn divisor(&self) -> Option<ClockDivisor> {
        self.divisor.get()
    }

    pub fn is_begun(&self) -> bool {
        self.begun.get()
    }

    /// Whether master mode was entered with the SS pin already set up
    pub fn is_master(&self) -> bool {
        self.master.get()
    }

    pub fn collisions(&self) -> u32 {
        self.collisions.get()
    }

    /// Transfer-complete polls that found the link busy
    pub fn busy_polls(&self) -> u32 {
        self.polls.get()
    }

    pub fn is_idle(&self) -> bool {
        !self.in_flight.get()
    }
}

impl SpiHardware for SimSpi {
    fn begin(&self) {
        self.begun.set(true);
    }

    fn configure(&self, divisor: ClockDivisor) {
        self.divisor.set(Some(divisor));
        self.master.set(self.begun.get());
    }

    fn write_data(&self, byte: u8) {
        if self.in_flight.get() {
            self.collisions.set(self.collisions.get() + 1);
        }
        let answer = self
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.previous.get());
        self.data.set(answer);
        self.previous.set(byte);
        let _ = self.sent.borrow_mut().push(byte);
        self.in_flight.set(true);
        self.remaining.set(self.latency);
    }

    fn transfer_complete(&self) -> bool {
        let remaining = self.remaining.get();
        if remaining > 0 {
            self.polls.set(self.polls.get() + 1);
            self.remaining.set(remaining - 1);
            return false;
        }
        self.in_flight.set(false);
        true
    }

    fn read_data(&self) -> u8 {
        self.data.get()
    }
}

/// Console port with host-side byte queues
#[derive(Debug, Default)]
pub struct SimUart {
    config: Cell<Option<UartConfig>>,
    incoming: RefCell<Deque<u8, 64>>,
    transmitted: RefCell<Vec<u8, 256>>,
    flushes: Cell<u32>,
}

impl SimUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes arriving on the wire
    pub fn inject(&self, bytes: &[u8]) {
        let mut incoming = self.incoming.borrow_mut();
        for &b in bytes {
            let _ = incoming.push_back(b);
        }
    }

    pub fn transmitted(&self) -> Vec<u8, 256> {
        self.transmitted.borrow().clone()
    }

    pub fn config(&self) -> Option<UartConfig> {
        self.config.get()
    }

    pub fn flushes(&self) -> u32 {
        self.flushes.get()
    }
}

impl UartHardware for SimUart {
    fn configure(&self, config: &UartConfig) {
        self.config.set(Some(*config));
    }

    fn write_byte(&self, byte: u8) {
        let _ = self.transmitted.borrow_mut().push(byte);
    }

    fn flush(&self) {
        self.flushes.set(self.flushes.get() + 1);
    }

    fn try_read(&self) -> Option<u8> {
        self.incoming.borrow_mut().pop_front()
    }
}

/// Busy loop that only counts the cycles it was asked to burn
#[derive(Debug)]
pub struct SimCycles {
    f_cpu_hz: u32,
    total: Cell<u64>,
    calls: Cell<u32>,
}

impl SimCycles {
    pub fn new(f_cpu_hz: u32) -> Self {
        Self {
            f_cpu_hz,
            total: Cell::new(0),
            calls: Cell::new(0),
        }
    }

    /// Cycles burnt so far
    pub fn total(&self) -> u64 {
        self.total.get()
    }

    /// Busy loop invocations
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl CycleDelay for SimCycles {
    fn f_cpu_hz(&self) -> u32 {
        self.f_cpu_hz
    }

    fn delay_cycles(&self, cycles: u32) {
        self.total.set(self.total.get() + cycles as u64);
        self.calls.set(self.calls.get() + 1);
    }
}
