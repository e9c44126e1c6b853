//! Watchdog-forced reset and free memory

use cadence_hal::system;
use cadence_hal::WatchdogTimeout;

use crate::pac;

const WDCE: u8 = 1 << 4;
const WDE: u8 = 1 << 3;

extern "C" {
    /// End of .data/.bss, provided by the linker script
    static __heap_start: u8;
}

/// Reset the whole chip through the watchdog
///
/// Masks interrupts, arms the watchdog at its shortest period and spins
/// until it bites.
pub fn reset_hardware() -> ! {
    avr_device::interrupt::disable();

    // SAFETY: interrupts are masked and nothing runs after this
    let wdt = unsafe { &*pac::WDT::ptr() };
    // Timed sequence: the new configuration must follow WDCE within four cycles
    wdt.wdtcsr.write(|w| unsafe { w.bits(WDCE | WDE) });
    wdt.wdtcsr
        .write(|w| unsafe { w.bits(WDE | WatchdogTimeout::Ms15.prescaler_bits()) });

    loop {
        core::hint::spin_loop();
    }
}

/// Bytes between the end of static data and the current stack frame
pub fn free_ram() -> usize {
    let marker = 0u8;
    let stack_pointer = core::ptr::addr_of!(marker) as usize;
    // SAFETY: only the address of the linker symbol is taken
    let data_end = unsafe { core::ptr::addr_of!(__heap_start) } as usize;
    system::free_ram(data_end, stack_pointer)
}
