//! Board-agnostic timing substrate for motion and temperature firmware
//!
//! This crate contains the concurrency and timing primitives that the
//! motion planner, heater control and command parser build on, written
//! against the register-level traits of `cadence-hal`:
//!
//! - Scoped interrupt masking with save/restore nesting
//! - Stepper and temperature timer interrupt scheduling
//! - Round-robin oversampled analog sampling
//! - Busy-wait synchronous block transport
//! - Console byte-stream transport
//! - Millisecond time source
//! - Busy-wait delays for `embedded-hal` drivers
//! - Board configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod analog;
pub mod clock;
pub mod config;
pub mod critical;
pub mod delay;
pub mod serial;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod timer;
pub mod transport;

pub use analog::{AnalogError, AnalogSampler};
pub use clock::MillisClock;
pub use critical::{free, CriticalSection, IrqCell};
pub use delay::BusyDelay;
pub use serial::SerialTransport;
pub use timer::{ChannelState, TimerError, TimerHandler, TimerSubsystem};
pub use transport::SyncTransport;
