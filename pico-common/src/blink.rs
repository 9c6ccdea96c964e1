//! Timer driven LED burst.
//!
//! A slow periodic timer fires every [`BlinkTiming::period_ms`]. Each time
//! it fires it arms a fast timer that ticks every [`BlinkTiming::flash_ms`].
//! The fast timer toggles the LED [`FLASH_TOGGLES`] times, then disarms
//! itself and forces the LED off.
//!
//! With the LED starting off, one burst looks like this:
//!
//! ```text
//! tick     1    2    3    4
//! LED   ___|‾‾‾‾|____|‾‾‾‾|____
//!          on   off  on   off (disarm)
//! ```

/// Number of LED toggles in one burst.
pub const FLASH_TOGGLES: u8 = 3;

/// The periods of the two timers, in milliseconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkTiming {
    /// Period of the slow timer that starts a burst
    pub period_ms: u64,

    /// Period of the fast timer that toggles the LED
    pub flash_ms: u64,
}

impl BlinkTiming {
    /// One burst every 5 seconds, toggling every 100 ms.
    pub const DEFAULT: BlinkTiming = BlinkTiming {
        period_ms: 5000,
        flash_ms: 100,
    };
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// An LED that can be switched and whose state can be read back.
pub trait Led {
    /// Switch the LED on (`true`) or off (`false`).
    async fn set(&mut self, on: bool);

    /// Returns the last state written to the LED.
    fn is_on(&self) -> bool;
}

/// A periodic timer.
///
/// The timer starts when it is created and is cancelled when it is dropped.
pub trait PeriodicTimer {
    /// Wait for the next period to elapse.
    async fn tick(&mut self);
}

#[cfg(feature = "rp2040")]
impl PeriodicTimer for embassy_time::Ticker {
    async fn tick(&mut self) {
        self.next().await
    }
}

/// The burst state machine.
///
/// `T` is the fast timer. The sequencer owns it while a burst is in
/// progress and drops it when the burst ends.
pub struct BlinkSequencer<T> {
    /// Toggles performed in the current burst
    flash_count: u8,

    /// The armed fast timer, `None` between bursts
    flash_timer: Option<T>,
}

impl<T> Default for BlinkSequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlinkSequencer<T> {
    /// Create an idle sequencer.
    pub const fn new() -> BlinkSequencer<T> {
        BlinkSequencer {
            flash_count: 0,
            flash_timer: None,
        }
    }

    /// Toggles performed so far in the current burst.
    pub fn flash_count(&self) -> u8 {
        self.flash_count
    }

    /// Returns `true` while a burst is in progress.
    pub fn is_flashing(&self) -> bool {
        self.flash_timer.is_some()
    }

    /// Slow timer callback: start a new burst driven by `flash_timer`.
    ///
    /// A burst that is still running is replaced and its timer dropped.
    pub fn on_period(&mut self, flash_timer: T) {
        self.flash_count = 0;
        self.flash_timer = Some(flash_timer);
    }

    /// Fast timer callback.
    ///
    /// Toggles the LED until [`FLASH_TOGGLES`] toggles were made. The call
    /// after that drops the fast timer and switches the LED off.
    pub async fn on_flash<L: Led>(&mut self, led: &mut L) {
        if self.flash_count < FLASH_TOGGLES {
            let on = !led.is_on();
            led.set(on).await;
            self.flash_count += 1;
        } else {
            self.flash_timer = None;
            self.flash_count = 0;
            led.set(false).await;
        }
    }
}

impl<T: PeriodicTimer> BlinkSequencer<T> {
    /// Run the fast timer until the burst ends.
    ///
    /// Returns immediately if no burst is in progress.
    pub async fn run_burst<L: Led>(&mut self, led: &mut L) {
        while let Some(flash_timer) = self.flash_timer.as_mut() {
            flash_timer.tick().await;
            self.on_flash(led).await;
        }
    }
}

/// Blink `led` forever.
///
/// Every `period` tick starts a burst on a fast timer created by `arm`.
pub async fn run<L, T, P, F>(
    sequencer: &mut BlinkSequencer<T>,
    led: &mut L,
    period: &mut P,
    mut arm: F,
) -> !
where
    L: Led,
    T: PeriodicTimer,
    P: PeriodicTimer,
    F: FnMut() -> T,
{
    loop {
        period.tick().await;
        debug!("burst start");
        sequencer.on_period(arm());
        sequencer.run_burst(led).await;
    }
}
