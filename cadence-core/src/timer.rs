//! Stepper and temperature timer interrupt scheduling
//!
//! Two periodic compare-match interrupts drive the firmware: the stepper
//! timer (pulse generation, timing critical) and the temperature timer
//! (sensor sampling and heater control). Each channel carries one handler
//! bound at initialization; foreground code owns only the control surface
//! (enable, disable, compare count) and never the per-tick logic.
//!
//! Per-channel lifecycle:
//!
//! ```text
//! Unbound ──bind──▶ Disabled ──enable──▶ Enabled
//!                      ▲                    │
//!                      └──────disable───────┘
//! ```
//!
//! # Priority
//!
//! The stepper channel strictly outranks the temperature channel. On the
//! reference platform the vector table already services the stepper first
//! when both flags are latched. On top of that, a temperature dispatch
//! first checks for a latched stepper tick and runs it before its own
//! handler, so the ordering holds even where the interrupt controller has
//! no priorities.

use cadence_hal::{InterruptControl, TimerChannel, TimerCount, TimerHardware};

use crate::critical::{free, CriticalSection, IrqCell};

/// Parameterless interrupt-context callback
///
/// Handlers run with interrupts masked (except under
/// [`TimerSubsystem::dispatch_nested`]) and must not block.
pub type TimerHandler = fn();

/// Timer configuration errors
///
/// All of these indicate a build-time misconfiguration and are expected
/// to be caught during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Channel has no handler bound
    Unbound(TimerChannel),
    /// Channel already has a different handler bound
    HandlerConflict(TimerChannel),
    /// Count does not fit the compare register
    CountOutOfRange { channel: TimerChannel, count: u32 },
}

/// Lifecycle state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// No handler bound yet
    Unbound,
    /// Handler bound, interrupt masked
    Disabled,
    /// Handler bound, interrupt armed
    Enabled,
}

#[derive(Clone, Copy)]
struct ChannelSlot {
    handler: Option<TimerHandler>,
    enabled: bool,
    count: TimerCount,
}

impl ChannelSlot {
    const UNBOUND: Self = Self {
        handler: None,
        enabled: false,
        count: 0,
    };

    fn state(&self) -> ChannelState {
        match (self.handler, self.enabled) {
            (None, _) => ChannelState::Unbound,
            (Some(_), false) => ChannelState::Disabled,
            (Some(_), true) => ChannelState::Enabled,
        }
    }
}

/// Owner of both timer channels
pub struct TimerSubsystem<H, I> {
    hw: H,
    irq: I,
    slots: IrqCell<[ChannelSlot; TimerChannel::COUNT]>,
}

impl<H: TimerHardware, I: InterruptControl> TimerSubsystem<H, I> {
    /// Create the subsystem with both channels unbound
    pub const fn new(hw: H, irq: I) -> Self {
        Self {
            hw,
            irq,
            slots: IrqCell::new([ChannelSlot::UNBOUND; TimerChannel::COUNT]),
        }
    }

    /// Underlying timer hardware
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Install the handler for a channel
    ///
    /// Binding the same handler again is a no-op; binding a different one
    /// is a configuration error.
    pub fn bind(&self, channel: TimerChannel, handler: TimerHandler) -> Result<(), TimerError> {
        let cs = CriticalSection::enter(&self.irq);
        let mut slots = self.slots.borrow_mut(&cs);
        let slot = &mut slots[channel.index()];

        match slot.handler {
            Some(bound) if bound as usize == handler as usize => Ok(()),
            Some(_) => {
                #[cfg(feature = "defmt")]
                defmt::error!("Timer {:?}: conflicting handler bind", channel);
                Err(TimerError::HandlerConflict(channel))
            }
            None => {
                slot.handler = Some(handler);
                Ok(())
            }
        }
    }

    /// Arm the channel's interrupt
    pub fn enable(&self, channel: TimerChannel) -> Result<(), TimerError> {
        let cs = CriticalSection::enter(&self.irq);
        if self.slots.borrow(&cs)[channel.index()].handler.is_none() {
            #[cfg(feature = "defmt")]
            defmt::error!("Timer {:?}: enable before bind", channel);
            return Err(TimerError::Unbound(channel));
        }
        self.arm(&cs, channel, true);
        Ok(())
    }

    /// Mask the channel's interrupt
    ///
    /// Takes effect before returning. A handler already running completes,
    /// and a tick latched before the call is dropped at dispatch.
    pub fn disable(&self, channel: TimerChannel) {
        let cs = CriticalSection::enter(&self.irq);
        self.arm(&cs, channel, false);
    }

    /// Program the channel's next-trigger threshold
    pub fn set_count(&self, channel: TimerChannel, count: u32) -> Result<(), TimerError> {
        let value = match TimerCount::try_from(count) {
            Ok(value) if value <= self.hw.max_count(channel) => value,
            _ => {
                #[cfg(feature = "defmt")]
                defmt::error!("Timer {:?}: count {} exceeds register width", channel, count);
                return Err(TimerError::CountOutOfRange { channel, count });
            }
        };

        // 16-bit register writes go through a shared temp byte on 8-bit parts
        let cs = CriticalSection::enter(&self.irq);
        self.hw.set_compare(channel, value);
        self.slots.borrow_mut(&cs)[channel.index()].count = value;
        Ok(())
    }

    /// Last programmed count
    pub fn count(&self, channel: TimerChannel) -> TimerCount {
        free(&self.irq, |cs| self.slots.borrow(cs)[channel.index()].count)
    }

    pub fn state(&self, channel: TimerChannel) -> ChannelState {
        free(&self.irq, |cs| self.slots.borrow(cs)[channel.index()].state())
    }

    pub fn is_enabled(&self, channel: TimerChannel) -> bool {
        self.state(channel) == ChannelState::Enabled
    }

    pub fn is_bound(&self, channel: TimerChannel) -> bool {
        self.state(channel) != ChannelState::Unbound
    }

    /// Arm both channels for coordinated startup
    ///
    /// Masks globally, arms temperature then stepper, then unmasks. Fails
    /// without touching any register if either channel is unbound.
    pub fn enable_all(&self) -> Result<(), TimerError> {
        for channel in TimerChannel::ALL {
            if !self.is_bound(channel) {
                #[cfg(feature = "defmt")]
                defmt::error!("Timer {:?}: enable_all before bind", channel);
                return Err(TimerError::Unbound(channel));
            }
        }

        self.irq.disable();
        {
            let cs = CriticalSection::enter(&self.irq);
            self.arm(&cs, TimerChannel::Temperature, true);
            self.arm(&cs, TimerChannel::Stepper, true);
        }
        self.irq.enable();
        Ok(())
    }

    /// Disarm both channels for coordinated shutdown
    ///
    /// Temperature goes first so a stepper tick in progress is never cut
    /// short by the slower channel being silenced. Global interrupts are
    /// unmasked afterwards. Programmed counts are left untouched.
    pub fn disable_all(&self) {
        {
            let cs = CriticalSection::enter(&self.irq);
            self.arm(&cs, TimerChannel::Temperature, false);
            self.arm(&cs, TimerChannel::Stepper, false);
        }
        self.irq.enable();
    }

    /// Interrupt entry point for `channel`
    ///
    /// Runs the bound handler if the channel is armed. A temperature
    /// dispatch first services a latched stepper tick.
    pub fn dispatch(&self, channel: TimerChannel) {
        self.run(channel);
    }

    /// Interrupt entry point that lets the stepper preempt the handler
    ///
    /// Masks this channel's own interrupt, unmasks globally for the
    /// duration of the handler, then restores the entry mask and re-arms
    /// the channel unless it was disabled meanwhile.
    pub fn dispatch_nested(&self, channel: TimerChannel) {
        self.yield_to_higher(channel);
        let Some(handler) = self.armed_handler(channel) else {
            return;
        };

        self.hw.set_interrupt_enabled(channel, false);
        let cs = CriticalSection::enter_later(&self.irq);
        self.irq.enable();
        handler();
        cs.protect();

        if self.slots.borrow(&cs)[channel.index()].enabled {
            self.hw.set_interrupt_enabled(channel, true);
        }
    }

    /// Service every latched channel, highest priority first
    ///
    /// Latches of disarmed channels are cleared and dropped. Returns how
    /// many handlers ran.
    pub fn service_pending(&self) -> usize {
        let mut serviced = 0;
        for channel in TimerChannel::ALL {
            if self.hw.is_pending(channel) {
                self.hw.clear_pending(channel);
                if self.run(channel) {
                    serviced += 1;
                }
            }
        }
        serviced
    }

    fn run(&self, channel: TimerChannel) -> bool {
        self.yield_to_higher(channel);
        match self.armed_handler(channel) {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    fn yield_to_higher(&self, channel: TimerChannel) {
        for other in TimerChannel::ALL {
            if other.outranks(channel)
                && self.hw.is_pending(other)
                && self.armed_handler(other).is_some()
            {
                self.hw.clear_pending(other);
                self.dispatch(other);
            }
        }
    }

    fn armed_handler(&self, channel: TimerChannel) -> Option<TimerHandler> {
        let cs = CriticalSection::enter(&self.irq);
        let slot = self.slots.borrow(&cs)[channel.index()];
        if slot.enabled {
            slot.handler
        } else {
            None
        }
    }

    fn arm<J: InterruptControl + ?Sized>(
        &self,
        cs: &CriticalSection<'_, J>,
        channel: TimerChannel,
        enabled: bool,
    ) {
        self.slots.borrow_mut(cs)[channel.index()].enabled = enabled;
        self.hw.set_interrupt_enabled(channel, enabled);
    }
}
