//! SREG-based interrupt control

use cadence_hal::{InterruptControl, InterruptMask};

use crate::pac;

/// Global interrupt flag of the AVR core
///
/// Saving and restoring reads and writes the whole status register, so the
/// arithmetic flags captured with the I bit come back too. That is harmless:
/// the compiler never keeps a flag live across a call.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvrInterrupts;

impl AvrInterrupts {
    pub const fn new() -> Self {
        Self
    }
}

fn cpu() -> &'static pac::cpu::RegisterBlock {
    // SAFETY: SREG is only ever accessed as a whole register with single
    // volatile loads and stores.
    unsafe { &*pac::CPU::ptr() }
}

impl InterruptControl for AvrInterrupts {
    fn save(&self) -> InterruptMask {
        InterruptMask::from_bits(cpu().sreg.read().bits())
    }

    fn restore(&self, mask: InterruptMask) {
        cpu().sreg.write(|w| unsafe { w.bits(mask.bits()) });
    }

    fn disable(&self) {
        avr_device::interrupt::disable();
    }

    fn enable(&self) {
        // SAFETY: every shared value in this crate lives in an IrqCell and
        // is only borrowed with interrupts masked.
        unsafe { avr_device::interrupt::enable() };
    }
}
