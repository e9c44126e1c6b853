//! ATmega2560 HAL for the Cadence timing substrate
//!
//! Implements the `cadence-hal` register traits on the ATmega2560 and wires
//! the `cadence-core` primitives to the interrupt vectors:
//!
//! | Vector | Source | Drives |
//! |--------|--------|--------|
//! | `TIMER1_COMPA` | TC1 compare A, /8 | stepper channel |
//! | `TIMER0_COMPB` | TC0 compare B, /64 | analog polling, temperature channel |
//! | `TIMER0_OVF` | TC0 overflow | millisecond clock |
//! | `USART0_RX` | USART0 receive | console queue |
//!
//! TC1 sits before TC0 in the vector table, so a stepper compare latched
//! together with a temperature compare is always taken first.
//!
//! Register handles are zero-sized and reach their peripheral through the
//! PAC pointer; each one must have a single owner, which [`board`] is.

#![no_std]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod adc;
pub mod board;
pub mod delay;
pub mod irq;
pub mod reset;
pub mod spi;
pub mod system;
pub mod timer;
pub mod usart;

pub use avr_device::atmega2560 as pac;

pub use adc::AvrAdc;
pub use delay::AvrCycleDelay;
pub use irq::AvrInterrupts;
pub use reset::{clear_reset_source, reset_source};
pub use spi::AvrSpi;
pub use system::{free_ram, reset_hardware};
pub use timer::AvrTimers;
pub use usart::AvrUsart0;

/// Core clock of the reference board
pub const F_CPU: u32 = 16_000_000;
