//! Calibrated busy waiting

/// Cycle-counted busy loop
///
/// The loop may overshoot but never undershoots: drivers built on it rely
/// on minimum setup and hold times.
pub trait CycleDelay {
    /// Core clock in Hz
    fn f_cpu_hz(&self) -> u32;

    /// Spin for at least `cycles` core clock cycles
    fn delay_cycles(&self, cycles: u32);
}

impl<T: CycleDelay + ?Sized> CycleDelay for &T {
    fn f_cpu_hz(&self) -> u32 {
        (**self).f_cpu_hz()
    }

    fn delay_cycles(&self, cycles: u32) {
        (**self).delay_cycles(cycles)
    }
}
