//! Millisecond time source
//!
//! Counts milliseconds from the overflow interrupt of a free-running 8-bit
//! timer prescaled by 64. One overflow is rarely a whole number of
//! milliseconds (1.024 ms at 16 MHz), so the remainder is carried in a
//! fractional counter in units of 8 µs.

use cadence_hal::{InterruptControl, Millis, MonotonicClock};

use crate::critical::{free, CriticalSection, IrqCell};

/// Prescaler of the overflow timer
const PRESCALE: u64 = 64;

/// Fractional counter resolution in microseconds
const FRACT_UNIT_US: u32 = 8;

/// Fractional counter value worth one millisecond
const FRACT_MAX: u16 = (1000 / FRACT_UNIT_US) as u16;

#[derive(Debug, Clone, Copy)]
struct Ticks {
    millis: Millis,
    fract: u16,
    overflows: u32,
}

/// Overflow-driven monotonic millisecond counter
pub struct MillisClock<I> {
    irq: I,
    millis_inc: Millis,
    fract_inc: u16,
    ticks: IrqCell<Ticks>,
}

impl<I: InterruptControl> MillisClock<I> {
    /// Clock for a core running at `f_cpu_hz`
    pub const fn new(irq: I, f_cpu_hz: u32) -> Self {
        let micros_per_overflow = (PRESCALE * 256 * 1_000_000 / f_cpu_hz as u64) as u32;
        Self {
            irq,
            millis_inc: micros_per_overflow / 1000,
            fract_inc: ((micros_per_overflow % 1000) / FRACT_UNIT_US) as u16,
            ticks: IrqCell::new(Ticks {
                millis: 0,
                fract: 0,
                overflows: 0,
            }),
        }
    }

    /// Timer overflow interrupt handler
    pub fn on_overflow(&self) {
        let cs = CriticalSection::enter(&self.irq);
        let mut ticks = self.ticks.borrow_mut(&cs);

        let mut millis = ticks.millis.wrapping_add(self.millis_inc);
        let mut fract = ticks.fract + self.fract_inc;
        if fract >= FRACT_MAX {
            fract -= FRACT_MAX;
            millis = millis.wrapping_add(1);
        }

        ticks.millis = millis;
        ticks.fract = fract;
        ticks.overflows = ticks.overflows.wrapping_add(1);
    }

    /// Overflow interrupts seen since boot
    pub fn overflows(&self) -> u32 {
        free(&self.irq, |cs| self.ticks.get(cs).overflows)
    }
}

impl<I: InterruptControl> MonotonicClock for MillisClock<I> {
    fn millis(&self) -> Millis {
        // 32-bit load is not atomic on an 8-bit core
        free(&self.irq, |cs| self.ticks.get(cs).millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimInterrupts;

    #[test]
    fn test_increments_at_16mhz() {
        let irq = SimInterrupts::new(true);
        let clock = MillisClock::new(&irq, 16_000_000);
        assert_eq!(clock.millis_inc, 1);
        assert_eq!(clock.fract_inc, 3);
    }

    #[test]
    fn test_counts_milliseconds() {
        let irq = SimInterrupts::new(true);
        let clock = MillisClock::new(&irq, 16_000_000);
        assert_eq!(clock.millis(), 0);

        // 1000 overflows of 1.024 ms each
        for _ in 0..1000 {
            clock.on_overflow();
        }
        assert_eq!(clock.millis(), 1024);
        assert_eq!(clock.overflows(), 1000);
        assert!(irq.is_enabled());
    }

    #[test]
    fn test_slower_clock_has_longer_overflow() {
        let irq = SimInterrupts::new(true);
        let clock = MillisClock::new(&irq, 8_000_000);
        for _ in 0..125 {
            clock.on_overflow();
        }
        // 2.048 ms per overflow
        assert_eq!(clock.millis(), 256);
    }

    #[test]
    fn test_elapsed_wraps() {
        let irq = SimInterrupts::new(true);
        let clock = MillisClock::new(&irq, 16_000_000);
        {
            let cs = CriticalSection::enter(&irq);
            clock.ticks.borrow_mut(&cs).millis = Millis::MAX - 1;
        }
        clock.on_overflow();
        clock.on_overflow();
        assert_eq!(clock.millis(), 0);
        assert_eq!(clock.elapsed_since(Millis::MAX - 1), 2);
    }
}
