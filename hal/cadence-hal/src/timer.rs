//! Periodic timer interrupt abstractions
//!
//! The firmware runs on exactly two compare-match interrupt sources: a
//! high-rate stepper timer and a lower-rate temperature timer.

/// Width of the compare register on the reference platform (16-bit)
pub type TimerCount = u16;

/// One of the two periodic interrupt sources
///
/// Variants are declared in priority order: when both are pending at the
/// same instant, [`TimerChannel::Stepper`] is serviced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TimerChannel {
    /// Step pulse generation timer (highest priority)
    Stepper = 0,
    /// Temperature sampling timer
    Temperature = 1,
}

impl TimerChannel {
    /// Number of timer channels
    pub const COUNT: usize = 2;

    /// All channels, highest priority first
    pub const ALL: [TimerChannel; Self::COUNT] = [TimerChannel::Stepper, TimerChannel::Temperature];

    /// Slot index of this channel
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this channel preempts `other` when both are pending
    pub fn outranks(self, other: TimerChannel) -> bool {
        self < other
    }
}

/// Compare-match timer hardware for both channels
///
/// Implementations map each channel to its interrupt-enable bit, compare
/// register and interrupt flag. They must not perform any ordering of
/// their own; `cadence-core` sequences these calls.
pub trait TimerHardware {
    /// Set or clear the channel's interrupt-enable bit
    fn set_interrupt_enabled(&self, channel: TimerChannel, enabled: bool);

    /// Read the channel's interrupt-enable bit
    fn interrupt_enabled(&self, channel: TimerChannel) -> bool;

    /// Program the channel's compare register
    fn set_compare(&self, channel: TimerChannel, count: TimerCount);

    /// Read the channel's compare register
    fn compare(&self, channel: TimerChannel) -> TimerCount;

    /// Largest count the channel's compare register holds
    fn max_count(&self, _channel: TimerChannel) -> TimerCount {
        TimerCount::MAX
    }

    /// Check whether the channel's interrupt flag is latched
    fn is_pending(&self, channel: TimerChannel) -> bool;

    /// Clear the channel's latched interrupt flag
    fn clear_pending(&self, channel: TimerChannel);
}

impl<T: TimerHardware + ?Sized> TimerHardware for &T {
    fn set_interrupt_enabled(&self, channel: TimerChannel, enabled: bool) {
        (**self).set_interrupt_enabled(channel, enabled)
    }

    fn interrupt_enabled(&self, channel: TimerChannel) -> bool {
        (**self).interrupt_enabled(channel)
    }

    fn set_compare(&self, channel: TimerChannel, count: TimerCount) {
        (**self).set_compare(channel, count)
    }

    fn compare(&self, channel: TimerChannel) -> TimerCount {
        (**self).compare(channel)
    }

    fn max_count(&self, channel: TimerChannel) -> TimerCount {
        (**self).max_count(channel)
    }

    fn is_pending(&self, channel: TimerChannel) -> bool {
        (**self).is_pending(channel)
    }

    fn clear_pending(&self, channel: TimerChannel) {
        (**self).clear_pending(channel)
    }
}
