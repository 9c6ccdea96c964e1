//! Pico W board support.
//!
//! The Pico W LED and WiFi both live on the CYW43439 radio, which the
//! RP2040 drives over a PIO based SPI bus. The lessons wire the bus in
//! their `main` and hand it to [`init_radio`]:
//!
//! | signal | pin     |
//! |--------|---------|
//! | PWR    | GPIO 23 |
//! | DIO    | GPIO 24 |
//! | CS     | GPIO 25 |
//! | CLK    | GPIO 29 |
//!
//! The radio firmware is not part of this repository, copy the blobs from
//! the embassy `cyw43-firmware` directory into `cyw43-firmware/`.

use core::net::Ipv4Addr;

use cyw43::{Control, JoinOptions, NetDriver, PowerManagementMode};
use cyw43_pio::PioSpi;
use embassy_executor::{SpawnError, Spawner};
use embassy_net::tcp::{self, TcpSocket};
use embassy_net::{Config, IpAddress, IpEndpoint, Stack, StackResources};
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::{DMA_CH0, PIO0};
use static_cell::StaticCell;

use crate::blink::Led;
use crate::probe::Connect;
use crate::wifi::{IfConfig, LinkStatus, Station};

/// The SPI bus between the RP2040 and the CYW43439
pub type RadioSpi = PioSpi<'static, PIO0, 0, DMA_CH0>;

/// The on-board LED is wired to GPIO 0 of the CYW43439
const LED_GPIO: u8 = 0;

/// Seed of the network stack's random generator
const NET_SEED: u64 = 0x1234_5678_9abc_def0;

/// Sockets available to the network stack (DHCP, DNS and the probe)
const NET_SOCKETS: usize = 5;

/// TCP buffer size of [`TcpProbe`], the probe never transfers data
const PROBE_BUFFER_SIZE: usize = 256;

#[embassy_executor::task]
async fn cyw43_task(runner: cyw43::Runner<'static, Output<'static>, RadioSpi>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Load the firmware into the radio and start its driver task.
///
/// Returns the network device, used by [`init_stack`], and the control
/// handle used to join networks and drive the LED.
pub async fn init_radio(
    spawner: Spawner,
    pwr: Output<'static>,
    spi: RadioSpi,
) -> Result<(NetDriver<'static>, Control<'static>), SpawnError> {
    let fw = include_bytes!("../../cyw43-firmware/43439A0.bin");
    let clm = include_bytes!("../../cyw43-firmware/43439A0_clm.bin");

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(cyw43_task(runner))?;

    control.init(clm).await;
    control
        .set_power_management(PowerManagementMode::PowerSave)
        .await;
    info!("CYW43 ready");

    Ok((net_device, control))
}

/// Create a DHCPv4 network stack on top of the radio and start its task.
pub fn init_stack(
    spawner: Spawner,
    net_device: NetDriver<'static>,
) -> Result<Stack<'static>, SpawnError> {
    static RESOURCES: StaticCell<StackResources<NET_SOCKETS>> = StaticCell::new();
    let config = Config::dhcpv4(Default::default());
    let (stack, runner) = embassy_net::new(
        net_device,
        config,
        RESOURCES.init(StackResources::new()),
        NET_SEED,
    );
    spawner.spawn(net_task(runner))?;
    Ok(stack)
}

/// The Pico W on-board LED.
pub struct OnboardLed<'a> {
    control: &'a mut Control<'static>,
    on: bool,
}

impl<'a> OnboardLed<'a> {
    /// Takes control of the LED and switches it off.
    pub async fn new(control: &'a mut Control<'static>) -> OnboardLed<'a> {
        control.gpio_set(LED_GPIO, false).await;
        OnboardLed { control, on: false }
    }
}

impl Led for OnboardLed<'_> {
    async fn set(&mut self, on: bool) {
        self.control.gpio_set(LED_GPIO, on).await;
        self.on = on;
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

/// The CYW43439 in station mode.
///
/// The station counts as connected once it joined a network and DHCP
/// configured the interface. The driver never reports the link down after
/// leaving a network, so the join state is tracked here.
pub struct Cyw43Station<'a> {
    control: &'a mut Control<'static>,
    stack: Stack<'static>,
    active: bool,
    associated: bool,
    status: LinkStatus,
}

impl<'a> Cyw43Station<'a> {
    pub fn new(control: &'a mut Control<'static>, stack: Stack<'static>) -> Cyw43Station<'a> {
        Cyw43Station {
            control,
            stack,
            active: false,
            associated: false,
            status: LinkStatus::Idle,
        }
    }
}

impl Station for Cyw43Station<'_> {
    async fn set_active(&mut self, active: bool) {
        let mode = if active {
            PowerManagementMode::PowerSave
        } else {
            PowerManagementMode::SuperSave
        };
        self.control.set_power_management(mode).await;
        self.active = active;
        if !active {
            self.associated = false;
            self.status = LinkStatus::Idle;
        }
    }

    async fn associate(&mut self, ssid: &str, password: &str) {
        self.status = LinkStatus::Connecting;
        self.associated = false;
        let options = if password.is_empty() {
            JoinOptions::new_open()
        } else {
            JoinOptions::new(password.as_bytes())
        };
        match self.control.join(ssid, options).await {
            Ok(()) => self.associated = true,
            Err(error) => {
                warn!("join failed: status {}", error.status);
                self.status = LinkStatus::from_join_failure(error.status);
            }
        }
    }

    async fn leave(&mut self) {
        self.control.leave().await;
        self.associated = false;
        self.status = LinkStatus::Idle;
    }

    fn status(&self) -> LinkStatus {
        if !self.active {
            LinkStatus::Idle
        } else if self.is_connected() {
            LinkStatus::GotIp
        } else {
            self.status
        }
    }

    fn is_connected(&self) -> bool {
        self.associated && self.stack.is_config_up()
    }

    fn ifconfig(&self) -> Option<IfConfig> {
        if !self.associated {
            return None;
        }
        let config = self.stack.config_v4()?;
        Some(IfConfig {
            address: config.address.address(),
            netmask: config.address.netmask(),
            gateway: config.gateway.unwrap_or(Ipv4Addr::UNSPECIFIED),
            dns: config
                .dns_servers
                .first()
                .copied()
                .unwrap_or(Ipv4Addr::UNSPECIFIED),
        })
    }
}

/// Opens TCP connections through the network stack.
pub struct TcpProbe {
    stack: Stack<'static>,
    rx: [u8; PROBE_BUFFER_SIZE],
    tx: [u8; PROBE_BUFFER_SIZE],
}

impl TcpProbe {
    pub fn new(stack: Stack<'static>) -> TcpProbe {
        TcpProbe {
            stack,
            rx: [0; PROBE_BUFFER_SIZE],
            tx: [0; PROBE_BUFFER_SIZE],
        }
    }
}

impl Connect for TcpProbe {
    type Error = tcp::ConnectError;

    async fn connect(&mut self, host: Ipv4Addr, port: u16) -> Result<(), Self::Error> {
        let mut socket = TcpSocket::new(self.stack, &mut self.rx, &mut self.tx);
        let result = socket
            .connect(IpEndpoint::new(IpAddress::Ipv4(host), port))
            .await;
        socket.abort();
        result
    }
}
