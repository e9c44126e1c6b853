//! Round-robin oversampled analog sampling
//!
//! A single converter is cycled across the configured inputs. Each
//! completed conversion is added to the current input's accumulator and
//! the converter moves on to the next input. After [`OVERSAMPLENR`]
//! samples an input's sum is averaged into its stable reading.
//!
//! Conversions are strictly sequential: the next one is started only from
//! the completion path of the previous one, so at most one is ever in
//! flight.

use core::sync::atomic::Ordering;

use cadence_hal::{AdcHardware, InterruptControl};
use heapless::Vec;
use portable_atomic::AtomicBool;

use crate::config::{AnalogInput, AnalogInputConfig, SensorRole, OVERSAMPLENR};
use crate::critical::{free, CriticalSection, IrqCell};

/// Analog sampler configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogError {
    /// More inputs than the sampler has slots for
    TooManyChannels { requested: usize, capacity: usize },
}

#[derive(Debug, Clone, Copy)]
struct ChannelSlot {
    accumulator: u32,
    samples: u16,
    converting: bool,
    reading: Option<u16>,
}

impl ChannelSlot {
    const EMPTY: Self = Self {
        accumulator: 0,
        samples: 0,
        converting: false,
        reading: None,
    };
}

#[derive(Debug)]
struct SamplerState<const N: usize> {
    slots: [ChannelSlot; N],
    /// Input the converter is currently on
    position: usize,
    /// Inputs with at least one stable reading
    completed: usize,
}

/// Multi-input sampler over one shared converter
///
/// `N` is the slot capacity; the number of sampled inputs is fixed at
/// construction and may be smaller.
pub struct AnalogSampler<A, I, const N: usize> {
    adc: A,
    irq: I,
    channels: Vec<AnalogInput, N>,
    state: IrqCell<SamplerState<N>>,
    started: AtomicBool,
    ready: AtomicBool,
}

impl<A: AdcHardware, I: InterruptControl, const N: usize> AnalogSampler<A, I, N> {
    /// Create a sampler over `inputs`, sampled in the given order
    pub fn new(adc: A, irq: I, inputs: &[AnalogInput]) -> Result<Self, AnalogError> {
        let channels = Vec::from_slice(inputs).map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::error!("Analog: {} inputs exceed {} slots", inputs.len(), N);
            AnalogError::TooManyChannels {
                requested: inputs.len(),
                capacity: N,
            }
        })?;

        Ok(Self {
            adc,
            irq,
            channels,
            state: IrqCell::new(SamplerState {
                slots: [ChannelSlot::EMPTY; N],
                position: 0,
                completed: 0,
            }),
            started: AtomicBool::new(false),
            ready: AtomicBool::new(false),
        })
    }

    /// Create a sampler over every sensor present in `config`
    pub fn from_config(adc: A, irq: I, config: &AnalogInputConfig) -> Result<Self, AnalogError> {
        Self::new(adc, irq, &config.channels())
    }

    /// Begin continuous sampling
    ///
    /// Only the first call has any effect. With no inputs configured
    /// nothing is started.
    pub fn start(&self) {
        if self.channels.is_empty() || self.started.swap(true, Ordering::AcqRel) {
            return;
        }

        self.adc.init();
        let cs = CriticalSection::enter(&self.irq);
        self.begin_conversion(&cs, 0);

        #[cfg(feature = "defmt")]
        defmt::info!("Analog sampling started on {} inputs", self.channels.len());
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Whether every input has produced a stable reading
    ///
    /// Vacuously true with no inputs. Once true it stays true.
    pub fn is_ready(&self) -> bool {
        self.channels.is_empty() || self.ready.load(Ordering::Acquire)
    }

    /// Converter completion handler
    ///
    /// Called from the converter's interrupt, or from [`Self::poll`].
    /// Ignored if no conversion was in flight.
    pub fn on_conversion_complete(&self) {
        if !self.is_started() {
            return;
        }

        let cs = CriticalSection::enter(&self.irq);
        let next = {
            let mut state = self.state.borrow_mut(&cs);
            let position = state.position;
            let slot = &mut state.slots[position];
            if !slot.converting {
                return;
            }

            slot.converting = false;
            slot.accumulator += u32::from(self.adc.result());
            slot.samples += 1;

            if slot.samples >= OVERSAMPLENR {
                let first = slot.reading.is_none();
                slot.reading = Some((slot.accumulator / u32::from(OVERSAMPLENR)) as u16);
                slot.accumulator = 0;
                slot.samples = 0;

                if first {
                    state.completed += 1;
                    if state.completed == self.channels.len() {
                        self.ready.store(true, Ordering::Release);
                    }
                }
            }

            (position + 1) % self.channels.len()
        };

        self.begin_conversion(&cs, next);
    }

    /// Process a finished conversion, if there is one
    ///
    /// Returns whether a conversion was processed.
    pub fn poll(&self) -> bool {
        if !self.is_started() || self.adc.is_converting() {
            return false;
        }
        self.on_conversion_complete();
        true
    }

    /// Last stable reading of input `index`
    ///
    /// `None` until every input is ready, or if `index` is out of range.
    pub fn read(&self, index: usize) -> Option<u16> {
        if index >= self.channels.len() || !self.is_ready() {
            return None;
        }
        free(&self.irq, |cs| self.state.borrow(cs).slots[index].reading)
    }

    /// Last stable reading of the sensor with `role`
    pub fn read_role(&self, role: SensorRole) -> Option<u16> {
        let index = self.channels.iter().position(|input| input.role == role)?;
        self.read(index)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Input metadata for logical channel `index`
    pub fn channel(&self, index: usize) -> Option<&AnalogInput> {
        self.channels.get(index)
    }

    fn begin_conversion<J: InterruptControl + ?Sized>(
        &self,
        cs: &CriticalSection<'_, J>,
        position: usize,
    ) {
        let mut state = self.state.borrow_mut(cs);
        state.position = position;
        state.slots[position].converting = true;
        self.adc.start_conversion(self.channels[position].mux);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_ANALOG_INPUTS;
    use crate::sim::{SimAdc, SimInterrupts};
    use proptest::prelude::*;
    use std::vec::Vec as StdVec;

    type Sampler<'a> = AnalogSampler<&'a SimAdc, &'a SimInterrupts, MAX_ANALOG_INPUTS>;

    fn inputs(count: usize) -> StdVec<AnalogInput> {
        (0..count)
            .map(|i| AnalogInput {
                role: SensorRole::Extruder(i as u8),
                mux: i as u8,
            })
            .collect()
    }

    /// Poll until `conversions` have been processed
    fn run(sampler: &Sampler<'_>, conversions: usize) {
        let mut done = 0;
        let mut polls = 0;
        while done < conversions {
            if sampler.poll() {
                done += 1;
            }
            polls += 1;
            assert!(polls < 100_000, "converter never finished");
        }
    }

    #[test]
    fn test_zero_channels_vacuously_ready() {
        let adc = SimAdc::new(0);
        let irq = SimInterrupts::new(true);
        let sampler: Sampler<'_> = AnalogSampler::new(&adc, &irq, &[]).unwrap();

        assert!(sampler.is_ready());
        sampler.start();
        assert!(!sampler.is_started());
        assert!(!adc.is_initialized());
        assert_eq!(adc.starts(), 0);
        assert!(!sampler.poll());
        assert_eq!(sampler.read(0), None);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let adc = SimAdc::new(0);
        let irq = SimInterrupts::new(true);
        let sampler: Sampler<'_> = AnalogSampler::new(&adc, &irq, &inputs(2)).unwrap();

        sampler.start();
        sampler.start();
        assert!(adc.is_initialized());
        assert_eq!(adc.starts(), 1);
        assert_eq!(adc.in_flight(), Some(0));
        assert!(irq.is_enabled());
    }

    #[test]
    fn test_not_ready_until_every_channel_cycles() {
        let adc = SimAdc::new(1);
        let irq = SimInterrupts::new(true);
        let sampler: Sampler<'_> = AnalogSampler::new(&adc, &irq, &inputs(3)).unwrap();
        adc.set_value(0, 100);
        adc.set_value(1, 200);
        adc.set_value(2, 300);
        sampler.start();

        let full = OVERSAMPLENR as usize * 3;
        run(&sampler, full - 1);
        assert!(!sampler.is_ready());
        assert_eq!(sampler.read(0), None);

        run(&sampler, 1);
        assert!(sampler.is_ready());
        assert_eq!(sampler.read(0), Some(100));
        assert_eq!(sampler.read(1), Some(200));
        assert_eq!(sampler.read(2), Some(300));

        // Readings keep updating and the set stays ready
        adc.set_value(1, 0);
        for _ in 0..4 {
            run(&sampler, full);
            assert!(sampler.is_ready());
        }
        assert_eq!(sampler.read(1), Some(0));
        assert_eq!(adc.overlaps(), 0);
    }

    #[test]
    fn test_oversampling_averages() {
        let adc = SimAdc::new(0);
        let irq = SimInterrupts::new(true);
        let sampler: Sampler<'_> = AnalogSampler::new(&adc, &irq, &inputs(1)).unwrap();
        adc.set_value(0, 100);
        sampler.start();

        run(&sampler, OVERSAMPLENR as usize / 2);
        adc.set_value(0, 200);
        run(&sampler, OVERSAMPLENR as usize / 2);
        assert_eq!(sampler.read(0), Some(150));
    }

    #[test]
    fn test_round_robin_order() {
        let adc = SimAdc::new(0);
        let irq = SimInterrupts::new(true);
        let sampler: Sampler<'_> = AnalogSampler::new(&adc, &irq, &inputs(3)).unwrap();
        sampler.start();

        let mut order = StdVec::new();
        for _ in 0..7 {
            order.push(adc.in_flight().unwrap());
            run(&sampler, 1);
        }
        assert_eq!(order, [0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_interrupt_driven_completion() {
        let adc = SimAdc::new(3);
        let irq = SimInterrupts::new(true);
        let sampler: Sampler<'_> = AnalogSampler::new(&adc, &irq, &inputs(2)).unwrap();
        adc.set_value(1, 512);

        // Ignored before start
        sampler.on_conversion_complete();
        assert_eq!(adc.starts(), 0);

        sampler.start();
        for _ in 0..OVERSAMPLENR * 2 {
            // Completion interrupt fires once the latency has elapsed
            while adc.is_converting() {}
            sampler.on_conversion_complete();
        }
        assert!(sampler.is_ready());
        assert_eq!(sampler.read(1), Some(512));
        assert_eq!(adc.overlaps(), 0);
    }

    #[test]
    fn test_read_out_of_range() {
        let adc = SimAdc::new(0);
        let irq = SimInterrupts::new(true);
        let sampler: Sampler<'_> = AnalogSampler::new(&adc, &irq, &inputs(1)).unwrap();
        sampler.start();
        run(&sampler, OVERSAMPLENR as usize);
        assert!(sampler.read(0).is_some());
        assert_eq!(sampler.read(1), None);
    }

    #[test]
    fn test_from_config_roles() {
        let adc = SimAdc::new(0);
        let irq = SimInterrupts::new(true);
        let config = AnalogInputConfig::default();
        adc.set_value(13, 900);
        adc.set_value(14, 40);

        let sampler: Sampler<'_> = AnalogSampler::from_config(&adc, &irq, &config).unwrap();
        assert_eq!(sampler.channel_count(), 2);
        assert_eq!(sampler.channel(1).map(|c| c.role), Some(SensorRole::Bed));
        assert_eq!(sampler.channel(2), None);

        sampler.start();
        run(&sampler, OVERSAMPLENR as usize * 2);
        assert_eq!(sampler.read_role(SensorRole::Extruder(0)), Some(900));
        assert_eq!(sampler.read_role(SensorRole::Bed), Some(40));
        assert_eq!(sampler.read_role(SensorRole::Chamber), None);
    }

    #[test]
    fn test_too_many_channels() {
        let adc = SimAdc::new(0);
        let irq = SimInterrupts::new(true);
        let result: Result<AnalogSampler<_, _, 2>, _> = AnalogSampler::new(&adc, &irq, &inputs(3));
        assert_eq!(
            result.err(),
            Some(AnalogError::TooManyChannels {
                requested: 3,
                capacity: 2
            })
        );
    }

    proptest! {
        #[test]
        fn prop_constant_signal_is_lossless(
            values in prop::collection::vec(0u16..=cadence_hal::adc::ADC_MAX, 1..=MAX_ANALOG_INPUTS),
            latency in 0u8..4,
        ) {
            let adc = SimAdc::new(latency);
            let irq = SimInterrupts::new(true);
            let sampler: Sampler<'_> = AnalogSampler::new(&adc, &irq, &inputs(values.len())).unwrap();
            for (mux, &raw) in values.iter().enumerate() {
                adc.set_value(mux as u8, raw);
            }
            sampler.start();

            run(&sampler, OVERSAMPLENR as usize * values.len());
            prop_assert!(sampler.is_ready());
            for (index, &raw) in values.iter().enumerate() {
                prop_assert_eq!(sampler.read(index), Some(raw));
            }
            prop_assert_eq!(adc.overlaps(), 0);
        }
    }
}
