//! Internet reachability check.
//!
//! Opens a TCP connection to a well known host and reports whether it
//! succeeded in time. The default target is the Google public DNS server.

use core::net::Ipv4Addr;

use embassy_futures::select::{Either, select};
use embedded_hal_async::delay::DelayNs;

/// Google public DNS
pub const DEFAULT_HOST: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);

/// DNS port, open for TCP on [`DEFAULT_HOST`]
pub const DEFAULT_PORT: u16 = 53;

/// How long [`test_internet`] waits for the connection
pub const DEFAULT_TIMEOUT_MS: u32 = 3000;

/// Something that can open a connection to a remote host.
pub trait Connect {
    type Error;

    /// Connect to `host:port` and close the connection.
    async fn connect(&mut self, host: Ipv4Addr, port: u16) -> Result<(), Self::Error>;
}

/// Returns `true` if a connection to `host:port` is established within
/// `timeout_ms`.
///
/// Errors and timeouts both count as unreachable.
pub async fn test_internet<C, D>(
    socket: &mut C,
    delay: &mut D,
    host: Ipv4Addr,
    port: u16,
    timeout_ms: u32,
) -> bool
where
    C: Connect,
    D: DelayNs,
{
    match select(socket.connect(host, port), delay.delay_ms(timeout_ms)).await {
        Either::First(Ok(())) => true,
        Either::First(Err(_)) => {
            debug!("connection to {}:{} failed", host.octets(), port);
            false
        }
        Either::Second(()) => {
            debug!("connection to {}:{} timed out", host.octets(), port);
            false
        }
    }
}
