//! Analog sensor inputs
//!
//! Every sensor is optional. The sampled channel set is built from the
//! sensors present, always in the same order: extruders 0-3, bed,
//! chamber, cooler, filament width, power sense.

use cadence_hal::adc::AdcMux;
use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum extruder temperature sensors
pub const MAX_EXTRUDERS: usize = 4;

/// Maximum sampled analog inputs (four extruders plus five board sensors)
pub const MAX_ANALOG_INPUTS: usize = MAX_EXTRUDERS + 5;

/// What an analog input measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorRole {
    /// Hotend thermistor of extruder `n`
    Extruder(u8),
    Bed,
    Chamber,
    Cooler,
    /// Filament width sensor
    FilamentWidth,
    /// Supply voltage/current sense
    PowerSense,
}

/// One sampled input: its role and the multiplexer channel it sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalogInput {
    pub role: SensorRole,
    pub mux: AdcMux,
}

/// Sensor presence and wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalogInputConfig {
    /// Number of extruders fitted (0-4); pins beyond this are ignored
    pub extruders: u8,
    /// Thermistor input of each extruder
    pub extruder_pins: [Option<AdcMux>; MAX_EXTRUDERS],
    pub bed: Option<AdcMux>,
    pub chamber: Option<AdcMux>,
    pub cooler: Option<AdcMux>,
    pub filament_width: Option<AdcMux>,
    pub power_sense: Option<AdcMux>,
}

impl Default for AnalogInputConfig {
    /// RAMPS wiring: one hotend on A13, bed on A14
    fn default() -> Self {
        Self {
            extruders: 1,
            extruder_pins: [Some(13), Some(15), None, None],
            bed: Some(14),
            chamber: None,
            cooler: None,
            filament_width: None,
            power_sense: None,
        }
    }
}

impl AnalogInputConfig {
    /// Configuration with no analog sensors at all
    pub const fn none() -> Self {
        Self {
            extruders: 0,
            extruder_pins: [None; MAX_EXTRUDERS],
            bed: None,
            chamber: None,
            cooler: None,
            filament_width: None,
            power_sense: None,
        }
    }

    /// Ordered list of sampled inputs
    pub fn channels(&self) -> Vec<AnalogInput, MAX_ANALOG_INPUTS> {
        let mut channels = Vec::new();
        let extruders = (self.extruders as usize).min(MAX_EXTRUDERS);

        let extruder_inputs = self.extruder_pins[..extruders]
            .iter()
            .enumerate()
            .filter_map(|(n, pin)| {
                pin.map(|mux| AnalogInput {
                    role: SensorRole::Extruder(n as u8),
                    mux,
                })
            });

        let board_inputs = [
            (SensorRole::Bed, self.bed),
            (SensorRole::Chamber, self.chamber),
            (SensorRole::Cooler, self.cooler),
            (SensorRole::FilamentWidth, self.filament_width),
            (SensorRole::PowerSense, self.power_sense),
        ]
        .into_iter()
        .filter_map(|(role, pin)| pin.map(|mux| AnalogInput { role, mux }));

        for input in extruder_inputs.chain(board_inputs) {
            // Capacity covers every role
            let _ = channels.push(input);
        }
        channels
    }

    /// Logical channel index of `role`, if that sensor is present
    pub fn sensor_index(&self, role: SensorRole) -> Option<usize> {
        self.channels().iter().position(|input| input.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_channels() {
        let channels = AnalogInputConfig::default().channels();
        assert_eq!(
            channels.as_slice(),
            [
                AnalogInput {
                    role: SensorRole::Extruder(0),
                    mux: 13
                },
                AnalogInput {
                    role: SensorRole::Bed,
                    mux: 14
                },
            ]
        );
    }

    #[test]
    fn test_no_sensors() {
        assert!(AnalogInputConfig::none().channels().is_empty());
    }

    #[test]
    fn test_full_set_order() {
        let config = AnalogInputConfig {
            extruders: 4,
            extruder_pins: [Some(0), Some(1), Some(2), Some(3)],
            bed: Some(4),
            chamber: Some(5),
            cooler: Some(6),
            filament_width: Some(7),
            power_sense: Some(8),
        };
        let channels = config.channels();
        assert_eq!(channels.len(), MAX_ANALOG_INPUTS);
        for (i, input) in channels.iter().enumerate() {
            assert_eq!(input.mux as usize, i);
        }
        assert_eq!(config.sensor_index(SensorRole::Extruder(3)), Some(3));
        assert_eq!(config.sensor_index(SensorRole::PowerSense), Some(8));
    }

    #[test]
    fn test_extruder_count_limits_pins() {
        let config = AnalogInputConfig {
            extruders: 1,
            extruder_pins: [Some(13), Some(15), None, None],
            ..AnalogInputConfig::none()
        };
        assert_eq!(config.channels().len(), 1);
        assert_eq!(config.sensor_index(SensorRole::Extruder(1)), None);
    }

    #[test]
    fn test_sensor_index_skips_absent() {
        let config = AnalogInputConfig {
            cooler: Some(9),
            ..AnalogInputConfig::default()
        };
        assert_eq!(config.sensor_index(SensorRole::Bed), Some(1));
        assert_eq!(config.sensor_index(SensorRole::Chamber), None);
        assert_eq!(config.sensor_index(SensorRole::Cooler), Some(2));
    }
}
