//! Blocking delays
//!
//! Durations are converted to core cycles, rounding up, and burnt on the
//! platform's calibrated busy loop. Interrupts stay enabled and their
//! handlers add to the wait.

use cadence_hal::CycleDelay;
use embedded_hal::delay::DelayNs;

/// Busy-wait delay provider for `embedded-hal` drivers
pub struct BusyDelay<C> {
    hw: C,
}

impl<C: CycleDelay> BusyDelay<C> {
    pub const fn new(hw: C) -> Self {
        Self { hw }
    }

    /// Underlying busy loop
    pub fn hardware(&self) -> &C {
        &self.hw
    }

    fn wait(&self, amount: u32, per_second: u64) {
        let cycles = (amount as u64 * self.hw.f_cpu_hz() as u64).div_ceil(per_second);
        let mut remaining = cycles;
        while remaining > 0 {
            let chunk = remaining.min(u32::MAX as u64) as u32;
            self.hw.delay_cycles(chunk);
            remaining -= chunk as u64;
        }
    }
}

impl<C: CycleDelay> DelayNs for BusyDelay<C> {
    fn delay_ns(&mut self, ns: u32) {
        self.wait(ns, 1_000_000_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.wait(us, 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait(ms, 1_000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimCycles;

    #[test]
    fn test_microseconds_at_16mhz() {
        let cycles = SimCycles::new(16_000_000);
        let mut delay = BusyDelay::new(&cycles);

        delay.delay_us(10);
        assert_eq!(cycles.total(), 160);

        delay.delay_ms(2);
        assert_eq!(cycles.total(), 160 + 32_000);
    }

    #[test]
    fn test_short_delays_round_up() {
        let cycles = SimCycles::new(16_000_000);
        let mut delay = BusyDelay::new(&cycles);

        // 62.5 ns per cycle
        delay.delay_ns(1);
        assert_eq!(cycles.total(), 1);
        delay.delay_ns(100);
        assert_eq!(cycles.total(), 1 + 2);
    }

    #[test]
    fn test_zero_does_not_spin() {
        let cycles = SimCycles::new(16_000_000);
        let mut delay = BusyDelay::new(&cycles);
        delay.delay_ns(0);
        delay.delay_ms(0);
        assert_eq!(cycles.calls(), 0);
    }

    #[test]
    fn test_long_delay_is_chunked() {
        let cycles = SimCycles::new(16_000_000);
        let mut delay = BusyDelay::new(&cycles);

        // 4.8e9 cycles do not fit one loop count
        delay.delay_ms(300_000);
        assert_eq!(cycles.total(), 4_800_000_000);
        assert_eq!(cycles.calls(), 2);
    }
}
