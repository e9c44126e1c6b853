//! CPU clock and derived timer rates

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::OVERSAMPLENR;

/// Prescaler of the stepper timer
pub const STEPPER_TIMER_PRESCALE: u32 = 8;

/// Prescaler of the temperature timer
pub const TEMP_TIMER_PRESCALE: u32 = 64;

/// Cycles spent by the stepper handler outside the pulse itself
pub const CYCLES_EATEN_BY_CODE: u32 = 240;

/// Extra cycles per step when the extruder is also pulsed
pub const CYCLES_EATEN_BY_E: u32 = 60;

/// CPU clock configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockConfig {
    /// Core clock in Hz
    pub f_cpu_hz: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::new(16_000_000)
    }
}

impl ClockConfig {
    pub const fn new(f_cpu_hz: u32) -> Self {
        Self { f_cpu_hz }
    }

    /// Tick rate of the stepper timer in Hz
    pub const fn stepper_timer_rate(&self) -> u32 {
        self.f_cpu_hz / STEPPER_TIMER_PRESCALE
    }

    /// Stepper timer ticks per microsecond
    pub const fn stepper_ticks_per_us(&self) -> u32 {
        self.stepper_timer_rate() / 1_000_000
    }

    /// Interrupt rate of the temperature timer in Hz
    ///
    /// The timer free-runs over its 8-bit range, so one compare match
    /// fires per overflow period.
    pub fn temp_timer_frequency(&self) -> f32 {
        self.f_cpu_hz as f32 / TEMP_TIMER_PRESCALE as f32 / 256.0
    }

    pub const fn cycles_per_us(&self) -> u32 {
        self.f_cpu_hz / 1_000_000
    }

    /// Core cycles in a step pulse of `min_pulse_us`
    pub const fn step_pulse_cycles(&self, min_pulse_us: u32) -> u32 {
        min_pulse_us * self.cycles_per_us()
    }

    /// Busy cycles still needed to hold a step pulse of `min_pulse_us`
    ///
    /// Cycles the stepper handler already spends between edges are
    /// subtracted; zero means no explicit delay is needed.
    pub const fn step_pulse_delay_cycles(&self, min_pulse_us: u32, with_extruder: bool) -> u32 {
        let eaten = if with_extruder {
            CYCLES_EATEN_BY_CODE + CYCLES_EATEN_BY_E
        } else {
            CYCLES_EATEN_BY_CODE
        };
        self.step_pulse_cycles(min_pulse_us).saturating_sub(eaten)
    }

    /// Temperature control sample period in seconds
    ///
    /// One stable reading per sensor takes `OVERSAMPLENR` temperature
    /// interrupts for each of the ten sampling states. `factor` scales the
    /// period for controllers that only run every few readings.
    pub fn pid_dt(&self, factor: u8) -> f32 {
        (OVERSAMPLENR as f32 * 10.0) / (self.temp_timer_frequency() * factor.max(1) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_board_rates() {
        let clock = ClockConfig::default();
        assert_eq!(clock.stepper_timer_rate(), 2_000_000);
        assert_eq!(clock.stepper_ticks_per_us(), 2);
        assert_eq!(clock.cycles_per_us(), 16);
        assert!((clock.temp_timer_frequency() - 976.5625).abs() < 1e-3);
    }

    #[test]
    fn test_pid_dt() {
        let clock = ClockConfig::default();
        assert!((clock.pid_dt(1) - 0.16384).abs() < 1e-5);
        assert!((clock.pid_dt(2) - 0.08192).abs() < 1e-5);
        // Zero factor is treated as one
        assert_eq!(clock.pid_dt(0), clock.pid_dt(1));
    }

    #[test]
    fn test_step_pulse_cycles() {
        let clock = ClockConfig::default();
        assert_eq!(clock.step_pulse_cycles(2), 32);
        assert_eq!(clock.step_pulse_cycles(20), 320);
        assert_eq!(ClockConfig::new(20_000_000).step_pulse_cycles(2), 40);
    }

    #[test]
    fn test_step_pulse_delay_cycles() {
        let clock = ClockConfig::default();
        assert_eq!(clock.step_pulse_delay_cycles(2, false), 0);
        assert_eq!(clock.step_pulse_delay_cycles(20, false), 320 - 240);
        assert_eq!(clock.step_pulse_delay_cycles(20, true), 320 - 300);
    }

    #[test]
    fn test_slower_clock() {
        let clock = ClockConfig::new(8_000_000);
        assert_eq!(clock.stepper_timer_rate(), 1_000_000);
        assert_eq!(clock.cycles_per_us(), 8);
    }
}
