#![no_std]
#![no_main]

use cyw43_pio::{DEFAULT_CLOCK_DIVIDER, PioSpi};
use defmt::{Display2Format, error, info, unwrap, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::{
    bind_interrupts,
    gpio::{Level, Output},
    peripherals::PIO0,
    pio::{InterruptHandler, Pio},
};
use embassy_time::{Delay, Timer};
use panic_probe as _;
use pico_common::{
    board::{Cyw43Station, TcpProbe, init_radio, init_stack},
    probe::{self, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_MS},
    wifi::{self, DEFAULT_RETRY},
};

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

// The credentials are read at compile time from the `[env]` section
// of `.cargo/config.toml`.
const WIFI_SSID: &str = env!("WIFI_SSID");
const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");

/// Number of connection status reports before disconnecting
const STATUS_REPORTS: u32 = 3;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let peripherals = embassy_rp::init(Default::default());
    info!("Device started");

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

    let (net_device, mut control) = unwrap!(init_radio(spawner, pwr, spi).await);
    // The network stack runs in its own task and asks for an
    // IP address using DHCP once the WiFi link is up.
    let stack = unwrap!(init_stack(spawner, net_device));

    // `Delay` implements the `DelayNs` trait using the embassy timer.
    let mut delay = Delay;
    let mut station = Cyw43Station::new(&mut control, stack);

    match wifi::connect(
        &mut station,
        &mut delay,
        WIFI_SSID,
        WIFI_PASSWORD,
        DEFAULT_RETRY,
    )
    .await
    {
        Ok(config) => info!("IP configuration: {}", config),
        Err(err) => {
            error!("{}", err);
            // Nothing left to do without a network.
            loop {
                Timer::after_secs(60).await;
            }
        }
    }

    if let Some(ip) = wifi::get_ip(&station) {
        info!("IP address: {}", Display2Format(&ip));
    }

    let mut tcp_probe = TcpProbe::new(stack);
    if probe::test_internet(
        &mut tcp_probe,
        &mut delay,
        DEFAULT_HOST,
        DEFAULT_PORT,
        DEFAULT_TIMEOUT_MS,
    )
    .await
    {
        info!("Internet is reachable");
    } else {
        warn!("Internet is not reachable");
    }

    for _ in 0..STATUS_REPORTS {
        Timer::after_secs(10).await;
        info!("Connected: {}", wifi::is_connected(&station));
    }

    wifi::disconnect(&mut station).await;
    info!("Connected: {}", wifi::is_connected(&station));

    loop {
        Timer::after_secs(60).await;
    }
}
