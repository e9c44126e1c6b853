//! Scoped interrupt masking
//!
//! A [`CriticalSection`] captures the status register on entry and writes
//! the same image back when it goes out of scope. Because the exit restores
//! the captured value instead of unconditionally re-enabling interrupts,
//! guards nest: an inner guard entered while an outer one is active finds
//! interrupts already disabled and leaves them disabled on exit.
//!
//! Shared foreground/ISR state lives in an [`IrqCell`], which can only be
//! borrowed through a live guard.

use core::cell::{Ref, RefCell, RefMut};

use cadence_hal::{InterruptControl, InterruptMask};

/// Interrupt-masking guard
///
/// Restores the captured interrupt mask exactly once, when dropped, on
/// every exit path out of the enclosing scope.
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub struct CriticalSection<'a, I: InterruptControl + ?Sized> {
    irq: &'a I,
    saved: InterruptMask,
}

impl<'a, I: InterruptControl + ?Sized> CriticalSection<'a, I> {
    /// Capture the interrupt mask, then disable interrupts
    pub fn enter(irq: &'a I) -> Self {
        let cs = Self::enter_later(irq);
        irq.disable();
        cs
    }

    /// Capture the interrupt mask without disabling yet
    ///
    /// Call [`CriticalSection::protect`] once the caller has decided the
    /// region needs masking. The captured mask is still restored on drop.
    pub fn enter_later(irq: &'a I) -> Self {
        Self {
            irq,
            saved: irq.save(),
        }
    }

    /// Disable interrupts now
    pub fn protect(&self) {
        self.irq.disable();
    }

    /// Restore the captured mask before the guard is dropped
    pub fn unprotect(&self) {
        self.irq.restore(self.saved);
    }

    /// Mask captured at entry
    pub fn saved(&self) -> InterruptMask {
        self.saved
    }

    /// Whether interrupts are currently masked
    pub fn is_protected(&self) -> bool {
        !self.irq.is_enabled()
    }

    /// Interrupt controller this guard was entered on
    pub fn interrupts(&self) -> &'a I {
        self.irq
    }
}

impl<I: InterruptControl + ?Sized> Drop for CriticalSection<'_, I> {
    fn drop(&mut self) {
        self.irq.restore(self.saved);
    }
}

/// Run `f` with interrupts masked
pub fn free<I, R, F>(irq: &I, f: F) -> R
where
    I: InterruptControl + ?Sized,
    F: FnOnce(&CriticalSection<'_, I>) -> R,
{
    let cs = CriticalSection::enter(irq);
    f(&cs)
}

/// Cell for data shared between foreground code and interrupt handlers
///
/// The contents are reachable only through a [`CriticalSection`] borrowed
/// for at least as long as the returned reference. This makes every
/// multi-byte read or write of the shared value atomic with respect to
/// the interrupt handlers that also touch it.
#[derive(Debug)]
pub struct IrqCell<T> {
    inner: RefCell<T>,
}

impl<T> IrqCell<T> {
    /// Create a cell holding `value`
    pub const fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }

    /// Shared access under a critical section
    pub fn borrow<'cs, I: InterruptControl + ?Sized>(
        &'cs self,
        cs: &'cs CriticalSection<'_, I>,
    ) -> Ref<'cs, T> {
        debug_assert!(cs.is_protected(), "IrqCell borrowed with interrupts enabled");
        self.inner.borrow()
    }

    /// Exclusive access under a critical section
    pub fn borrow_mut<'cs, I: InterruptControl + ?Sized>(
        &'cs self,
        cs: &'cs CriticalSection<'_, I>,
    ) -> RefMut<'cs, T> {
        debug_assert!(cs.is_protected(), "IrqCell borrowed with interrupts enabled");
        self.inner.borrow_mut()
    }

    /// Copy the value out
    pub fn get<I: InterruptControl + ?Sized>(&self, cs: &CriticalSection<'_, I>) -> T
    where
        T: Copy,
    {
        *self.borrow(cs)
    }

    /// Replace the value, returning the old one
    pub fn replace<I: InterruptControl + ?Sized>(&self, cs: &CriticalSection<'_, I>, value: T) -> T {
        core::mem::replace(&mut *self.borrow_mut(cs), value)
    }

    /// Consume the cell, returning the value
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimInterrupts;
    use proptest::prelude::*;

    #[test]
    fn test_enter_disables_and_drop_restores() {
        let irq = SimInterrupts::new(true);
        {
            let cs = CriticalSection::enter(&irq);
            assert!(!irq.is_enabled());
            assert!(cs.saved().interrupts_enabled());
        }
        assert!(irq.is_enabled());
    }

    #[test]
    fn test_inner_exit_keeps_outer_masked() {
        let irq = SimInterrupts::new(true);
        let outer = CriticalSection::enter(&irq);
        {
            let _inner = CriticalSection::enter(&irq);
        }
        // Restoring the inner snapshot must not re-enable
        assert!(!irq.is_enabled());
        drop(outer);
        assert!(irq.is_enabled());
    }

    #[test]
    fn test_restores_other_status_flags() {
        let irq = SimInterrupts::with_bits(InterruptMask::GLOBAL_ENABLE | 0x03);
        {
            let _cs = CriticalSection::enter(&irq);
            irq.restore(InterruptMask::from_bits(0x40));
        }
        assert_eq!(irq.save().bits(), InterruptMask::GLOBAL_ENABLE | 0x03);
    }

    #[test]
    fn test_enter_later_defers_disable() {
        let irq = SimInterrupts::new(true);
        let cs = CriticalSection::enter_later(&irq);
        assert!(irq.is_enabled());
        cs.protect();
        assert!(!irq.is_enabled());
        cs.unprotect();
        assert!(irq.is_enabled());
        cs.protect();
        drop(cs);
        assert!(irq.is_enabled());
    }

    #[test]
    fn test_early_return_restores() {
        fn bail(irq: &SimInterrupts, early: bool) -> u8 {
            let _cs = CriticalSection::enter(irq);
            if early {
                return 1;
            }
            2
        }

        let irq = SimInterrupts::new(true);
        assert_eq!(bail(&irq, true), 1);
        assert!(irq.is_enabled());
        assert_eq!(bail(&irq, false), 2);
        assert!(irq.is_enabled());
    }

    #[test]
    fn test_unwinding_restores() {
        let irq = SimInterrupts::new(true);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _cs = CriticalSection::enter(&irq);
            panic!("fault inside critical section");
        }));
        assert!(result.is_err());
        assert!(irq.is_enabled());
    }

    #[test]
    fn test_free_returns_value() {
        let irq = SimInterrupts::new(true);
        let cell = IrqCell::new(41u16);
        let v = free(&irq, |cs| {
            *cell.borrow_mut(cs) += 1;
            cell.get(cs)
        });
        assert_eq!(v, 42);
        assert!(irq.is_enabled());
    }

    #[test]
    fn test_irq_cell_replace() {
        let irq = SimInterrupts::new(false);
        let cell = IrqCell::new(7u32);
        let cs = CriticalSection::enter(&irq);
        assert_eq!(cell.replace(&cs, 9), 7);
        assert_eq!(cell.get(&cs), 9);
    }

    /// Enter `plan.len()` nested guards; `true` entries use deferred disable
    /// and protect halfway through. The body toggles the global flag to
    /// mimic a handler that re-enables interrupts.
    fn nest(irq: &SimInterrupts, plan: &[(bool, bool)]) {
        let Some((&(later, toggle), rest)) = plan.split_first() else {
            return;
        };
        let cs = if later {
            CriticalSection::enter_later(irq)
        } else {
            CriticalSection::enter(irq)
        };
        if toggle {
            irq.enable();
        }
        if later {
            cs.protect();
        }
        nest(irq, rest);
        let before_exit = cs.saved();
        drop(cs);
        assert_eq!(irq.save(), before_exit);
    }

    proptest! {
        #[test]
        fn prop_nested_sections_restore_outer_state(
            initial in any::<u8>(),
            plan in prop::collection::vec((any::<bool>(), any::<bool>()), 0..12),
        ) {
            let irq = SimInterrupts::with_bits(initial);
            nest(&irq, &plan);
            prop_assert_eq!(irq.save().bits(), initial);
        }
    }
}
