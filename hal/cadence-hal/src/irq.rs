//! Global interrupt flag abstractions
//!
//! On 8-bit cores the global interrupt enable is one bit of the status
//! register. Saving and restoring the whole register image (rather than
//! re-enabling blindly) is what makes nested critical sections work.

/// Snapshot of the status register taken at critical section entry
///
/// The value is opaque to callers: it is only ever handed back to
/// [`InterruptControl::restore`]. Implementations must map their global
/// interrupt enable onto [`InterruptMask::GLOBAL_ENABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptMask(u8);

impl InterruptMask {
    /// Global interrupt enable bit (the I flag of SREG on AVR)
    pub const GLOBAL_ENABLE: u8 = 1 << 7;

    /// A mask with interrupts enabled and all other flags clear
    pub const ENABLED: Self = Self(Self::GLOBAL_ENABLE);

    /// A mask with interrupts disabled and all other flags clear
    pub const DISABLED: Self = Self(0);

    /// Wrap a raw status register value
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw status register value
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether this snapshot had global interrupts enabled
    pub const fn interrupts_enabled(self) -> bool {
        self.0 & Self::GLOBAL_ENABLE != 0
    }
}

/// Processor global interrupt control
///
/// Implementations touch a single hardware register and must not block.
/// All methods take `&self` because the register is a shared resource that
/// every critical section in the program reaches through the same handle.
pub trait InterruptControl {
    /// Read the current status register image
    fn save(&self) -> InterruptMask;

    /// Write back a previously saved status register image
    fn restore(&self, mask: InterruptMask);

    /// Clear the global interrupt enable (`cli`)
    fn disable(&self);

    /// Set the global interrupt enable (`sei`)
    fn enable(&self);

    /// Check whether interrupts are currently enabled
    fn is_enabled(&self) -> bool {
        self.save().interrupts_enabled()
    }
}

impl<T: InterruptControl + ?Sized> InterruptControl for &T {
    fn save(&self) -> InterruptMask {
        (**self).save()
    }

    fn restore(&self, mask: InterruptMask) {
        (**self).restore(mask)
    }

    fn disable(&self) {
        (**self).disable()
    }

    fn enable(&self) {
        (**self).enable()
    }
}
