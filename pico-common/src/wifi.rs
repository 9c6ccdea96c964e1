//! WiFi station mode helpers.
//!
//! [`connect`] joins a network and waits for the interface to be
//! configured, polling its status once per [`POLL_INTERVAL_MS`] for a
//! bounded number of attempts. [`disconnect`], [`is_connected`] and
//! [`get_ip`] are thin wrappers over the [`Station`].

use core::fmt;
use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;
use heapless::String;

/// Default number of status polls performed by [`connect`].
pub const DEFAULT_RETRY: u32 = 20;

/// Delay between two status polls.
pub const POLL_INTERVAL_MS: u32 = 1000;

/// Delay between enabling the interface and requesting association.
pub const SETTLE_MS: u32 = 1000;

/// Maximum SSID length in bytes (IEEE 802.11).
pub const SSID_MAX: usize = 32;

/// WPA2 passphrases are 8 to 63 characters, raw PSKs 64 hex digits.
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 64;

/// The state of the station interface.
///
/// Every variant maps to the numeric status code reported by the
/// interface, see [`LinkStatus::code`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    Idle,
    Connecting,
    GotIp,
    WrongPassword,
    NoApFound,
    AuthFail,
    AssocFail,
    HandshakeTimeout,
    Unknown(i32),
}

impl LinkStatus {
    /// Decode a numeric status code.
    pub const fn from_code(code: i32) -> LinkStatus {
        match code {
            1000 => LinkStatus::Idle,
            1001 => LinkStatus::Connecting,
            1010 => LinkStatus::GotIp,
            202 => LinkStatus::WrongPassword,
            201 => LinkStatus::NoApFound,
            200 => LinkStatus::AuthFail,
            204 => LinkStatus::AssocFail,
            205 => LinkStatus::HandshakeTimeout,
            code => LinkStatus::Unknown(code),
        }
    }

    /// Decode the status of a failed CYW43 join (`WLC_E_STATUS_*`).
    ///
    /// Codes without a matching status are kept as [`LinkStatus::Unknown`],
    /// saturated to `i32::MAX`.
    pub fn from_join_failure(status: u32) -> LinkStatus {
        match status {
            // WLC_E_STATUS_FAIL
            1 => LinkStatus::AuthFail,
            // WLC_E_STATUS_TIMEOUT
            2 => LinkStatus::HandshakeTimeout,
            // WLC_E_STATUS_NO_NETWORKS
            3 => LinkStatus::NoApFound,
            // WLC_E_STATUS_NO_ACK
            5 => LinkStatus::AssocFail,
            status => LinkStatus::Unknown(i32::try_from(status).unwrap_or(i32::MAX)),
        }
    }

    /// The numeric status code.
    pub const fn code(self) -> i32 {
        match self {
            LinkStatus::Idle => 1000,
            LinkStatus::Connecting => 1001,
            LinkStatus::GotIp => 1010,
            LinkStatus::WrongPassword => 202,
            LinkStatus::NoApFound => 201,
            LinkStatus::AuthFail => 200,
            LinkStatus::AssocFail => 204,
            LinkStatus::HandshakeTimeout => 205,
            LinkStatus::Unknown(code) => code,
        }
    }

    /// Human readable name of the status.
    pub const fn description(self) -> &'static str {
        match self {
            LinkStatus::Idle => "IDLE - idle",
            LinkStatus::Connecting => "CONNECTING - connecting",
            LinkStatus::GotIp => "GOT_IP - got an IP address",
            LinkStatus::WrongPassword => "WRONG_PASSWORD - wrong password",
            LinkStatus::NoApFound => "NO_AP_FOUND - SSID not found",
            LinkStatus::AuthFail => "AUTH_FAIL - authentication failed",
            LinkStatus::AssocFail => "ASSOC_FAIL - association failed",
            LinkStatus::HandshakeTimeout => "HANDSHAKE_TIMEOUT - handshake timed out",
            LinkStatus::Unknown(_) => "unknown status code",
        }
    }

    /// Best guess of why a connection that ended in this status failed.
    pub const fn likely_cause(self) -> &'static str {
        match self {
            LinkStatus::NoApFound => "network not found (wrong SSID or weak signal)",
            LinkStatus::WrongPassword => "wrong WiFi password",
            LinkStatus::AssocFail => {
                "could not associate with the router (weak signal or rejected by the router)"
            }
            LinkStatus::HandshakeTimeout => "handshake timed out (unstable signal)",
            _ => "check the SSID, the password, the signal strength and the distance",
        }
    }
}

impl From<i32> for LinkStatus {
    fn from(code: i32) -> Self {
        LinkStatus::from_code(code)
    }
}

impl From<LinkStatus> for i32 {
    fn from(status: LinkStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Unknown(code) => write!(f, "{}: {}", self.description(), code),
            _ => f.write_str(self.description()),
        }
    }
}

/// The IPv4 configuration of a connected interface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IfConfig {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub dns: Ipv4Addr,
}

impl fmt::Display for IfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "address {} netmask {} gateway {} dns {}",
            self.address, self.netmask, self.gateway, self.dns
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IfConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", defmt::Display2Format(self))
    }
}

/// A WiFi interface in station (client) mode.
///
/// Implementations must report [`Station::ifconfig`] as `Some` whenever
/// [`Station::is_connected`] returns `true`.
pub trait Station {
    /// Power the interface up (`true`) or down (`false`).
    async fn set_active(&mut self, active: bool);

    /// Request association with a network.
    ///
    /// The outcome is observed through [`Station::status`] and
    /// [`Station::is_connected`].
    async fn associate(&mut self, ssid: &str, password: &str);

    /// Leave the current network.
    async fn leave(&mut self);

    /// The current state of the interface.
    fn status(&self) -> LinkStatus;

    /// Returns `true` when associated and configured.
    fn is_connected(&self) -> bool;

    /// The interface configuration, if one was obtained.
    fn ifconfig(&self) -> Option<IfConfig>;
}

/// The reasons [`connect`] can fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectError {
    /// The SSID is empty or longer than [`SSID_MAX`] bytes
    InvalidSsid,

    /// The password is neither empty nor 8 to 64 bytes long
    InvalidPassword,

    /// The retry budget ran out before the interface was connected
    Timeout {
        ssid: String<SSID_MAX>,
        status: LinkStatus,
    },
}

impl ConnectError {
    /// The interface status when the attempt was abandoned.
    pub fn status(&self) -> Option<LinkStatus> {
        match self {
            ConnectError::Timeout { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Best guess of the failure cause.
    pub fn cause(&self) -> &'static str {
        match self {
            ConnectError::InvalidSsid => "the SSID must be 1 to 32 bytes long",
            ConnectError::InvalidPassword => "the password must be empty or 8 to 64 bytes long",
            ConnectError::Timeout { status, .. } => status.likely_cause(),
        }
    }
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Timeout { ssid, status } => write!(
                f,
                "WiFi connection failed (status code: {})\n   SSID: {}\n   likely cause: {}",
                status.code(),
                ssid,
                self.cause()
            ),
            _ => write!(f, "WiFi connection failed: {}", self.cause()),
        }
    }
}

impl core::error::Error for ConnectError {}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", defmt::Display2Format(self))
    }
}

/// Connect `station` to the `ssid` network.
///
/// Returns the current configuration right away if the station is already
/// connected. Otherwise the station is enabled and asked to associate,
/// then polled up to `retry` times, waiting [`POLL_INTERVAL_MS`] after
/// every unsuccessful poll.
pub async fn connect<S, D>(
    station: &mut S,
    delay: &mut D,
    ssid: &str,
    password: &str,
    retry: u32,
) -> Result<IfConfig, ConnectError>
where
    S: Station,
    D: DelayNs,
{
    if let Some(config) = current_config(station) {
        info!("already connected: {}", config);
        return Ok(config);
    }

    let mut ssid_buf: String<SSID_MAX> = String::new();
    if ssid.is_empty() || ssid_buf.push_str(ssid).is_err() {
        return Err(ConnectError::InvalidSsid);
    }
    if !password.is_empty() && !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password.len()) {
        return Err(ConnectError::InvalidPassword);
    }

    info!("enabling WLAN");
    station.set_active(true).await;
    delay.delay_ms(SETTLE_MS).await;

    info!("joining SSID {}", ssid);
    station.associate(ssid, password).await;

    for attempt in 1..=retry {
        if let Some(config) = current_config(station) {
            info!("WiFi connected: {}", config);
            return Ok(config);
        }

        let status = station.status();
        info!(
            "connecting... ({}/{}) [status: {} ({})]",
            attempt,
            retry,
            status.description(),
            status.code()
        );
        delay.delay_ms(POLL_INTERVAL_MS).await;
    }

    let status = station.status();
    let error = ConnectError::Timeout {
        ssid: ssid_buf,
        status,
    };
    warn!("{}", error);
    Err(error)
}

/// Leave the network and power the interface down.
///
/// Returns `false` if the station was not connected.
pub async fn disconnect<S: Station>(station: &mut S) -> bool {
    if station.is_connected() {
        station.leave().await;
        station.set_active(false).await;
        info!("disconnected");
        true
    } else {
        info!("no WiFi connection");
        false
    }
}

/// Returns `true` when the station is connected.
pub fn is_connected<S: Station>(station: &S) -> bool {
    station.is_connected()
}

/// The station's IP address, `None` if not connected.
pub fn get_ip<S: Station>(station: &S) -> Option<Ipv4Addr> {
    current_config(station).map(|config| config.address)
}

fn current_config<S: Station>(station: &S) -> Option<IfConfig> {
    if station.is_connected() {
        station.ifconfig()
    } else {
        None
    }
}
