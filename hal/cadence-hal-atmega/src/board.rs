//! Board wiring
//!
//! Owns one instance of every register handle, shares the interrupt-driven
//! primitives with the vectors below, and brings the system up in the
//! order the timers need.

use core::cell::{Cell, OnceCell};
use core::ops::Deref;

use avr_device::interrupt::Mutex;
use cadence_core::config::{AnalogInputConfig, ClockConfig, MAX_ANALOG_INPUTS};
use cadence_core::{
    AnalogError, AnalogSampler, BusyDelay, MillisClock, SerialTransport, SyncTransport,
    TimerError, TimerHandler, TimerSubsystem,
};
use cadence_hal::{InterruptControl, Millis, MonotonicClock, TimerChannel, UartConfig};

use crate::timer::{STEPPER_INITIAL_COUNT, TEMP_COMPARE};
use crate::{AvrAdc, AvrCycleDelay, AvrInterrupts, AvrSpi, AvrTimers, AvrUsart0, F_CPU};

/// Console receive queue size
pub const CONSOLE_RX_SIZE: usize = 128;

/// Clock configuration of this board
pub const CLOCK_CONFIG: ClockConfig = ClockConfig::new(F_CPU);

pub type Timers = TimerSubsystem<AvrTimers, AvrInterrupts>;
pub type Analog = AnalogSampler<AvrAdc, AvrInterrupts, MAX_ANALOG_INPUTS>;
pub type Console = SerialTransport<AvrUsart0, AvrInterrupts, CONSOLE_RX_SIZE>;
pub type Clock = MillisClock<AvrInterrupts>;
pub type Spi = SyncTransport<AvrSpi>;
pub type Delay = BusyDelay<AvrCycleDelay>;

/// Value reachable from both the foreground and interrupt handlers
pub struct IsrShared<T>(T);

// SAFETY: the target is single core. The shared types keep their mutable
// state in IrqCells that are only borrowed with interrupts masked, in
// atomics, or in cells written once before the interrupt that reads them
// is enabled.
unsafe impl<T: Send> Sync for IsrShared<T> {}

impl<T> IsrShared<T> {
    pub const fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> Deref for IsrShared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

// SAFETY (all statics below): each register handle is constructed exactly
// once, here.
pub static TIMERS: IsrShared<Timers> = IsrShared::new(TimerSubsystem::new(
    unsafe { AvrTimers::new() },
    AvrInterrupts::new(),
));

pub static CLOCK: IsrShared<Clock> =
    IsrShared::new(MillisClock::new(AvrInterrupts::new(), CLOCK_CONFIG.f_cpu_hz));

pub static CONSOLE: IsrShared<Console> = IsrShared::new(SerialTransport::new(
    unsafe { AvrUsart0::new() },
    AvrInterrupts::new(),
));

static ANALOG: IsrShared<OnceCell<Analog>> = IsrShared::new(OnceCell::new());

static SPI_TAKEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// Board bring-up errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardError {
    Timer(TimerError),
    Analog(AnalogError),
    /// [`init`] was already called
    AlreadyInitialized,
}

impl From<TimerError> for BoardError {
    fn from(e: TimerError) -> Self {
        BoardError::Timer(e)
    }
}

impl From<AnalogError> for BoardError {
    fn from(e: AnalogError) -> Self {
        BoardError::Analog(e)
    }
}

/// Board bring-up settings
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardConfig {
    pub analog: AnalogInputConfig,
    pub console: UartConfig,
}

/// Bring the board up and enable interrupts
///
/// Binds the two timer handlers, starts the timers, console and analog
/// sampling, then arms both timer channels together.
pub fn init(
    config: &BoardConfig,
    stepper: TimerHandler,
    temperature: TimerHandler,
) -> Result<(), BoardError> {
    if ANALOG.get().is_some() {
        return Err(BoardError::AlreadyInitialized);
    }

    let irq = AvrInterrupts::new();
    irq.disable();

    TIMERS.hardware().init();
    TIMERS.bind(TimerChannel::Stepper, stepper)?;
    TIMERS.bind(TimerChannel::Temperature, temperature)?;
    TIMERS.set_count(TimerChannel::Stepper, u32::from(STEPPER_INITIAL_COUNT))?;
    TIMERS.set_count(TimerChannel::Temperature, u32::from(TEMP_COMPARE))?;

    CONSOLE.configure(&config.console);

    // SAFETY: guarded by the ANALOG check above, so this is the only AvrAdc
    let adc = unsafe { AvrAdc::new() };
    let sampler = Analog::from_config(adc, irq, &config.analog)?;
    let analog = ANALOG.get_or_init(|| sampler);
    analog.start();

    TIMERS.enable_all()?;

    #[cfg(feature = "defmt")]
    defmt::info!(
        "Board up: {} analog inputs, console {} baud",
        analog.channel_count(),
        config.console.baudrate
    );
    Ok(())
}

/// [`init`], halting on any configuration error
pub fn init_or_halt(config: &BoardConfig, stepper: TimerHandler, temperature: TimerHandler) {
    if let Err(_e) = init(config, stepper, temperature) {
        #[cfg(feature = "defmt")]
        defmt::error!("Board init failed: {:?}", _e);
        halt();
    }
}

/// Stop with interrupts masked
pub fn halt() -> ! {
    avr_device::interrupt::disable();
    loop {
        core::hint::spin_loop();
    }
}

/// Analog sampler, once [`init`] has run
pub fn analog() -> Option<&'static Analog> {
    ANALOG.get()
}

/// Milliseconds since the timers were started
pub fn millis() -> Millis {
    CLOCK.millis()
}

/// Busy-wait delay for `embedded-hal` drivers
pub fn delay() -> Delay {
    BusyDelay::new(AvrCycleDelay)
}

/// Take the SPI transport; `None` after the first call
pub fn take_spi() -> Option<Spi> {
    avr_device::interrupt::free(|cs| {
        if SPI_TAKEN.borrow(cs).replace(true) {
            None
        } else {
            // SAFETY: SPI_TAKEN admits a single AvrSpi
            Some(SyncTransport::new(unsafe { AvrSpi::new() }))
        }
    })
}

#[cfg(target_arch = "avr")]
#[allow(non_snake_case)]
mod vectors {
    use super::*;

    #[avr_device::interrupt(atmega2560)]
    fn TIMER1_COMPA() {
        TIMERS.dispatch(TimerChannel::Stepper);
    }

    #[avr_device::interrupt(atmega2560)]
    fn TIMER0_COMPB() {
        if let Some(analog) = analog() {
            analog.poll();
        }
        TIMERS.dispatch_nested(TimerChannel::Temperature);
    }

    #[avr_device::interrupt(atmega2560)]
    fn TIMER0_OVF() {
        CLOCK.on_overflow();
    }

    #[avr_device::interrupt(atmega2560)]
    fn USART0_RX() {
        CONSOLE.on_receive();
    }
}
