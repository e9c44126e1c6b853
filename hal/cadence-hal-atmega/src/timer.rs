//! TC1 (stepper) and TC0 (temperature) compare-match timers

use cadence_hal::{TimerChannel, TimerCount, TimerHardware};

use crate::pac;

// TCCR0A / TCCR0B: fast PWM, clk/64. TC0 also runs the millisecond clock
// from its overflow, so it free-runs over the full 8-bit range.
const TC0_FAST_PWM: u8 = 0b0000_0011;
const TC0_CLK_64: u8 = 0b0000_0011;
const TOIE0: u8 = 1 << 0;
const OCIE0B: u8 = 1 << 2;
const OCF0B: u8 = 1 << 2;

// TCCR1B: CTC on OCR1A, clk/8
const TC1_CTC_CLK_8: u8 = (1 << 3) | (1 << 1);
const OCIE1A: u8 = 1 << 1;
const OCF1A: u8 = 1 << 1;

/// Temperature compare point, half way through the TC0 period so it
/// interleaves with the overflow interrupt
pub const TEMP_COMPARE: u8 = 128;

/// Initial stepper compare (about 122 Hz) so the first tick comes quickly
pub const STEPPER_INITIAL_COUNT: u16 = 0x4000;

/// Stepper and temperature timers
#[derive(Debug)]
pub struct AvrTimers {
    _private: (),
}

fn tc0() -> &'static pac::tc0::RegisterBlock {
    // SAFETY: AvrTimers is the single owner of TC0
    unsafe { &*pac::TC0::ptr() }
}

fn tc1() -> &'static pac::tc1::RegisterBlock {
    // SAFETY: AvrTimers is the single owner of TC1
    unsafe { &*pac::TC1::ptr() }
}

impl AvrTimers {
    /// # Safety
    ///
    /// Takes ownership of TC0 and TC1; at most one instance may exist and
    /// nothing else may touch those peripherals.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    /// Start both timers with their interrupts masked
    ///
    /// The TC0 overflow interrupt is enabled for the millisecond clock.
    pub fn init(&self) {
        let tc1 = tc1();
        tc1.timsk1.write(|w| unsafe { w.bits(0) });
        tc1.tccr1a.write(|w| unsafe { w.bits(0) });
        tc1.tccr1b.write(|w| unsafe { w.bits(TC1_CTC_CLK_8) });
        tc1.ocr1a.write(|w| unsafe { w.bits(STEPPER_INITIAL_COUNT) });
        tc1.tcnt1.write(|w| unsafe { w.bits(0) });

        let tc0 = tc0();
        tc0.tccr0a.write(|w| unsafe { w.bits(TC0_FAST_PWM) });
        tc0.tccr0b.write(|w| unsafe { w.bits(TC0_CLK_64) });
        tc0.ocr0b.write(|w| unsafe { w.bits(TEMP_COMPARE) });
        tc0.timsk0.write(|w| unsafe { w.bits(TOIE0) });
    }
}

impl TimerHardware for AvrTimers {
    fn set_interrupt_enabled(&self, channel: TimerChannel, enabled: bool) {
        match channel {
            TimerChannel::Stepper => tc1().timsk1.modify(|r, w| unsafe {
                w.bits(if enabled { r.bits() | OCIE1A } else { r.bits() & !OCIE1A })
            }),
            TimerChannel::Temperature => tc0().timsk0.modify(|r, w| unsafe {
                w.bits(if enabled { r.bits() | OCIE0B } else { r.bits() & !OCIE0B })
            }),
        }
    }

    fn interrupt_enabled(&self, channel: TimerChannel) -> bool {
        match channel {
            TimerChannel::Stepper => tc1().timsk1.read().bits() & OCIE1A != 0,
            TimerChannel::Temperature => tc0().timsk0.read().bits() & OCIE0B != 0,
        }
    }

    fn set_compare(&self, channel: TimerChannel, count: TimerCount) {
        match channel {
            // The 16-bit write goes through the shared TEMP byte; the caller
            // holds a critical section
            TimerChannel::Stepper => tc1().ocr1a.write(|w| unsafe { w.bits(count) }),
            TimerChannel::Temperature => tc0().ocr0b.write(|w| unsafe { w.bits(count as u8) }),
        }
    }

    fn compare(&self, channel: TimerChannel) -> TimerCount {
        match channel {
            TimerChannel::Stepper => tc1().ocr1a.read().bits(),
            TimerChannel::Temperature => TimerCount::from(tc0().ocr0b.read().bits()),
        }
    }

    fn max_count(&self, channel: TimerChannel) -> TimerCount {
        match channel {
            TimerChannel::Stepper => TimerCount::MAX,
            TimerChannel::Temperature => TimerCount::from(u8::MAX),
        }
    }

    fn is_pending(&self, channel: TimerChannel) -> bool {
        match channel {
            TimerChannel::Stepper => tc1().tifr1.read().bits() & OCF1A != 0,
            TimerChannel::Temperature => tc0().tifr0.read().bits() & OCF0B != 0,
        }
    }

    fn clear_pending(&self, channel: TimerChannel) {
        // Interrupt flags clear by writing a one
        match channel {
            TimerChannel::Stepper => tc1().tifr1.write(|w| unsafe { w.bits(OCF1A) }),
            TimerChannel::Temperature => tc0().tifr0.write(|w| unsafe { w.bits(OCF0B) }),
        }
    }
}
