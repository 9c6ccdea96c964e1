#![no_std]
#![no_main]

use cyw43_pio::{DEFAULT_CLOCK_DIVIDER, PioSpi};
use defmt::{info, unwrap};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::{
    bind_interrupts,
    gpio::{Level, Output},
    peripherals::PIO0,
    pio::{InterruptHandler, Pio},
};
use embassy_time::{Duration, Ticker};
use panic_probe as _;
use pico_common::{
    blink::{self, BlinkSequencer, BlinkTiming},
    board::{OnboardLed, init_radio},
};

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let peripherals = embassy_rp::init(Default::default());
    info!("Device started");

    // The LED of the Pico W is not connected to the RP2040, it is
    // connected to GPIO 0 of the CYW43439 WiFi chip. We have to start
    // the WiFi chip before we can use the LED.

    // The WiFi chip is powered through PIN_23 and uses a SPI bus
    // implemented with the PIO: CS is PIN_25, DIO is PIN_24 and
    // CLK is PIN_29. CS is active LOW, we start with the chip not selected.
    let pwr = Output::new(peripherals.PIN_23, Level::Low);
    let cs = Output::new(peripherals.PIN_25, Level::High);
    let mut pio = Pio::new(peripherals.PIO0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        peripherals.PIN_24,
        peripherals.PIN_29,
        peripherals.DMA_CH0,
    );

    // This exercise does not use the network, so the network
    // device returned by `init_radio` is not used.
    let (_net_device, mut control) = unwrap!(init_radio(spawner, pwr, spi).await);
    let mut led = OnboardLed::new(&mut control).await;

    let timing = BlinkTiming::DEFAULT;
    info!("Bursts every {} ms, toggling every {} ms", timing.period_ms, timing.flash_ms);

    // The slow timer fires every 5 seconds. Every time it fires, the
    // sequencer receives a new fast timer that toggles the LED
    // every 100 ms. After three toggles the sequencer drops the fast
    // timer and turns the LED off.
    //
    // Dropping a `Ticker` stops it, so a fast timer only exists while
    // a burst is in progress.
    let mut period = Ticker::every(Duration::from_millis(timing.period_ms));
    let mut sequencer = BlinkSequencer::new();

    blink::run(&mut sequencer, &mut led, &mut period, || {
        Ticker::every(Duration::from_millis(timing.flash_ms))
    })
    .await
}
