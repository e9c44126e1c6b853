//! Successive-approximation converter

use cadence_hal::adc::AdcMux;
use cadence_hal::AdcHardware;

use crate::pac;

const ADEN: u8 = 1 << 7;
const ADSC: u8 = 1 << 6;
/// clk/128: 125 kHz converter clock at 16 MHz
const ADPS_128: u8 = 0b111;
/// AVCC reference
const REFS0: u8 = 1 << 6;
const MUX5: u8 = 1 << 3;

/// Single-conversion ADC with AVCC reference
#[derive(Debug)]
pub struct AvrAdc {
    _private: (),
}

fn adc() -> &'static pac::adc::RegisterBlock {
    // SAFETY: AvrAdc is the single owner of the ADC
    unsafe { &*pac::ADC::ptr() }
}

impl AvrAdc {
    /// # Safety
    ///
    /// Takes ownership of the ADC; at most one instance may exist.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl AdcHardware for AvrAdc {
    fn init(&self) {
        adc().adcsra.write(|w| unsafe { w.bits(ADEN | ADPS_128) });
    }

    fn start_conversion(&self, mux: AdcMux) {
        let adc = adc();
        // Inputs 8-15 are selected through MUX5 in ADCSRB
        adc.adcsrb.modify(|r, w| unsafe {
            w.bits(if mux & 0x08 != 0 { r.bits() | MUX5 } else { r.bits() & !MUX5 })
        });
        adc.admux.write(|w| unsafe { w.bits(REFS0 | (mux & 0x07)) });
        adc.adcsra.modify(|r, w| unsafe { w.bits(r.bits() | ADSC) });
    }

    fn is_converting(&self) -> bool {
        adc().adcsra.read().bits() & ADSC != 0
    }

    fn result(&self) -> u16 {
        adc().adc.read().bits()
    }
}
