//! MCUSR reset cause

use cadence_hal::ResetSource;

use crate::pac;

fn cpu() -> &'static pac::cpu::RegisterBlock {
    // SAFETY: MCUSR is read and cleared once during boot
    unsafe { &*pac::CPU::ptr() }
}

/// Cause of the last reset
pub fn reset_source() -> ResetSource {
    ResetSource::from_bits(cpu().mcusr.read().bits())
}

/// Clear the latched reset flags
pub fn clear_reset_source() {
    cpu().mcusr.write(|w| unsafe { w.bits(0) });
}
