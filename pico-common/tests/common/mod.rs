//! Mock hardware shared by the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::net::Ipv4Addr;
use std::rc::Rc;

use embedded_hal_async::delay::DelayNs;
use pico_common::blink::{Led, PeriodicTimer};
use pico_common::probe::Connect;
use pico_common::wifi::{IfConfig, LinkStatus, Station};

/// Records every state written to it.
#[derive(Default)]
pub struct MockLed {
    pub on: bool,
    pub history: Vec<bool>,
}

impl MockLed {
    pub fn starting_on() -> MockLed {
        MockLed {
            on: true,
            history: Vec::new(),
        }
    }
}

impl Led for MockLed {
    async fn set(&mut self, on: bool) {
        self.on = on;
        self.history.push(on);
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

/// Counts ticks and drops through shared counters, so they can be read
/// after the sequencer took ownership of the timer.
///
/// After `limit` ticks the timer never fires again.
pub struct MockTimer {
    pub ticks: Rc<Cell<u32>>,
    pub drops: Rc<Cell<u32>>,
    pub limit: Option<u32>,
}

impl MockTimer {
    pub fn new() -> MockTimer {
        MockTimer {
            ticks: Rc::new(Cell::new(0)),
            drops: Rc::new(Cell::new(0)),
            limit: None,
        }
    }

    /// A timer sharing the counters of `self`.
    pub fn sibling(&self) -> MockTimer {
        MockTimer {
            ticks: self.ticks.clone(),
            drops: self.drops.clone(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> MockTimer {
        self.limit = Some(limit);
        self
    }
}

impl PeriodicTimer for MockTimer {
    async fn tick(&mut self) {
        if self.limit.is_some_and(|limit| self.ticks.get() >= limit) {
            core::future::pending::<()>().await;
        }
        self.ticks.set(self.ticks.get() + 1);
    }
}

impl Drop for MockTimer {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

/// Returns immediately and records every millisecond delay.
#[derive(Default)]
pub struct MockDelay {
    pub delays_ms: Vec<u32>,
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

pub const CONFIG: IfConfig = IfConfig {
    address: Ipv4Addr::new(192, 168, 1, 42),
    netmask: Ipv4Addr::new(255, 255, 255, 0),
    gateway: Ipv4Addr::new(192, 168, 1, 1),
    dns: Ipv4Addr::new(192, 168, 1, 1),
};

/// A station that connects after a scripted number of checks.
///
/// `connect_after` is the number of `is_connected` calls that return
/// `false` before the station reports connected, `None` never connects.
/// `statuses` is indexed by the number of checks made so far, the last
/// status repeats.
pub struct MockStation {
    pub active: bool,
    pub associations: Vec<(String, String)>,
    pub leaves: u32,
    pub connect_after: Option<u32>,
    pub statuses: Vec<LinkStatus>,
    checks: Cell<u32>,
}

impl MockStation {
    pub fn new(connect_after: Option<u32>, statuses: &[LinkStatus]) -> MockStation {
        MockStation {
            active: false,
            associations: Vec::new(),
            leaves: 0,
            connect_after,
            statuses: statuses.to_vec(),
            checks: Cell::new(0),
        }
    }

    /// Already connected, stays connected until `leave`.
    pub fn connected() -> MockStation {
        let mut station = MockStation::new(Some(0), &[LinkStatus::GotIp]);
        station.active = true;
        station
    }

    /// Never connects.
    pub fn unreachable(statuses: &[LinkStatus]) -> MockStation {
        MockStation::new(None, statuses)
    }

    pub fn checks(&self) -> u32 {
        self.checks.get()
    }

    fn connected_now(&self) -> bool {
        self.leaves == 0
            && self
                .connect_after
                .is_some_and(|after| self.checks.get() > after)
    }
}

impl Station for MockStation {
    async fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    async fn associate(&mut self, ssid: &str, password: &str) {
        self.associations
            .push((ssid.to_string(), password.to_string()));
    }

    async fn leave(&mut self) {
        self.leaves += 1;
    }

    fn status(&self) -> LinkStatus {
        if self.connected_now() {
            return LinkStatus::GotIp;
        }
        let index = (self.checks.get().saturating_sub(1) as usize)
            .min(self.statuses.len().saturating_sub(1));
        self.statuses
            .get(index)
            .copied()
            .unwrap_or(LinkStatus::Idle)
    }

    fn is_connected(&self) -> bool {
        self.checks.set(self.checks.get() + 1);
        self.connected_now()
    }

    fn ifconfig(&self) -> Option<IfConfig> {
        self.connected_now().then_some(CONFIG)
    }
}

/// How a [`MockConnector`] answers.
#[derive(Copy, Clone)]
pub enum Outcome {
    Accept,
    Refuse,
    Hang,
}

pub struct MockConnector {
    pub outcome: Outcome,
    pub attempts: Vec<(Ipv4Addr, u16)>,
}

impl MockConnector {
    pub fn new(outcome: Outcome) -> MockConnector {
        MockConnector {
            outcome,
            attempts: Vec::new(),
        }
    }
}

impl Connect for MockConnector {
    type Error = ();

    async fn connect(&mut self, host: Ipv4Addr, port: u16) -> Result<(), ()> {
        self.attempts.push((host, port));
        match self.outcome {
            Outcome::Accept => Ok(()),
            Outcome::Refuse => Err(()),
            Outcome::Hang => core::future::pending().await,
        }
    }
}
