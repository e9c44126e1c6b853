//! Cadence Hardware Abstraction Layer
//!
//! This crate defines the register-level traits that a chip-specific HAL
//! implements so the timing primitives in `cadence-core` can run on it.
//! Every trait here is a thin view of one hardware block: reading a flag,
//! writing a data register, flipping an interrupt-enable bit. All policy
//! (ordering, pipelining, oversampling) lives in `cadence-core`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Firmware (planner, heaters, parser)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cadence-core (critical sections,       │
//! │  timers, sampler, transports)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cadence-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           ┌───────────────────┐
//!           │ cadence-hal-atmega│
//!           └───────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`irq::InterruptControl`] - Global interrupt flag save/restore
//! - [`timer::TimerHardware`] - Stepper and temperature compare timers
//! - [`adc::AdcHardware`] - Single shared analog converter
//! - [`spi::SpiHardware`] - Byte-synchronous serial link (master)
//! - [`uart::UartHardware`] - Console serial port
//! - [`clock::MonotonicClock`] - Millisecond time source
//! - [`delay::CycleDelay`] - Calibrated busy loop
//!
//! Plus the fixed-point multiply helpers in [`math`] and the watchdog and
//! free memory helpers in [`system`].

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod clock;
pub mod delay;
pub mod irq;
pub mod math;
pub mod reset;
pub mod spi;
pub mod system;
pub mod timer;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use adc::AdcHardware;
pub use clock::{Millis, MonotonicClock};
pub use delay::CycleDelay;
pub use irq::{InterruptControl, InterruptMask};
pub use reset::ResetSource;
pub use spi::{ClockDivisor, SpiHardware};
pub use system::WatchdogTimeout;
pub use timer::{TimerChannel, TimerCount, TimerHardware};
pub use uart::{UartConfig, UartHardware};
