//! Monotonic time source

/// Milliseconds since boot; wraps after ~49 days
pub type Millis = u32;

/// Read-only millisecond counter
///
/// The counter is advanced by platform timer hardware; consumers only
/// ever read it.
pub trait MonotonicClock {
    /// Current time in milliseconds
    fn millis(&self) -> Millis;

    /// Milliseconds elapsed since `earlier`, correct across wraparound
    fn elapsed_since(&self, earlier: Millis) -> Millis {
        self.millis().wrapping_sub(earlier)
    }
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn millis(&self) -> Millis {
        (**self).millis()
    }
}
