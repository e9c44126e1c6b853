//! Busy loop for the core clock

use cadence_hal::CycleDelay;

use crate::F_CPU;

/// Lower bound on the cycles one loop iteration takes (nop, 32-bit
/// decrement, branch)
const CYCLES_PER_ITERATION: u32 = 4;

/// Cycle-counted busy loop at [`F_CPU`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AvrCycleDelay;

impl CycleDelay for AvrCycleDelay {
    fn f_cpu_hz(&self) -> u32 {
        F_CPU
    }

    fn delay_cycles(&self, cycles: u32) {
        let mut iterations = cycles.div_ceil(CYCLES_PER_ITERATION);
        while iterations > 0 {
            avr_device::asm::nop();
            iterations -= 1;
        }
    }
}
