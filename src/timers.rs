//! Re-armable timer wheel.
//!
//! One slot per [`TimerId`]; arming a slot that is already armed replaces
//! its deadline (cancel-and-replace).  The wheel itself is plain data and
//! knows nothing about what a timer means: [`TimerWheel::poll`] returns
//! the ids that came due and the caller decides what to do with them.
//!
//! A single hardware tick drives the wheel:
//!
//! ```text
//!  esp_timer (timer_tick_us) ──▶ Timers::poll(now) ──▶ [IdleTimeout, EchoTimeout, TriggerTicker]
//! ```
//!
//! Resolution is therefore one tick; a deadline fires on the first tick
//! at or after it.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Vec;

/// Every timer the controller uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerId {
    /// One-shot: blank the display after a quiet period.
    IdleTimeout = 0,
    /// One-shot: sample the echo line at the detection-distance mark.
    EchoTimeout = 1,
    /// Periodic: ultrasonic trigger pulse (and LED flash while triggered).
    TriggerTicker = 2,
}

impl TimerId {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::IdleTimeout, Self::EchoTimeout, Self::TriggerTicker];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    deadline_us: u64,
    /// `Some` for periodic timers.
    period_us: Option<u64>,
}

/// Timer bookkeeping.  Not synchronized; see [`Timers`].
#[derive(Debug, Default)]
pub struct TimerWheel {
    slots: [Option<Slot>; TimerId::COUNT],
}

impl TimerWheel {
    pub const fn new() -> Self {
        Self {
            slots: [None; TimerId::COUNT],
        }
    }

    /// Fire once at `now_us + delay_us`, replacing any pending deadline.
    pub fn arm_once(&mut self, id: TimerId, now_us: u64, delay_us: u64) {
        self.slots[id as usize] = Some(Slot {
            deadline_us: now_us.saturating_add(delay_us),
            period_us: None,
        });
    }

    /// Fire every `period_us`, first at `now_us + period_us`.
    pub fn arm_periodic(&mut self, id: TimerId, now_us: u64, period_us: u64) {
        let period_us = period_us.max(1);
        self.slots[id as usize] = Some(Slot {
            deadline_us: now_us.saturating_add(period_us),
            period_us: Some(period_us),
        });
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.slots[id as usize] = None;
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slots[id as usize].is_some()
    }

    pub fn deadline(&self, id: TimerId) -> Option<u64> {
        self.slots[id as usize].map(|s| s.deadline_us)
    }

    /// Collect every timer due at `now_us`.  One-shots are disarmed;
    /// periodics move to their next deadline (missed periods are skipped,
    /// not replayed).
    pub fn poll(&mut self, now_us: u64) -> Vec<TimerId, { TimerId::COUNT }> {
        let mut fired = Vec::new();
        for id in TimerId::ALL {
            let slot = &mut self.slots[id as usize];
            let Some(s) = slot else { continue };
            if s.deadline_us > now_us {
                continue;
            }
            match s.period_us {
                Some(period) => {
                    let mut next = s.deadline_us.saturating_add(period);
                    if next <= now_us {
                        next = now_us.saturating_add(period);
                    }
                    s.deadline_us = next;
                }
                None => *slot = None,
            }
            // Capacity equals the slot count.
            let _ = fired.push(id);
        }
        fired
    }
}

/// [`TimerWheel`] behind a critical-section mutex so both the tick ISR
/// and the threads can arm and poll it.
pub struct Timers {
    wheel: Mutex<CriticalSectionRawMutex, RefCell<TimerWheel>>,
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

impl Timers {
    pub const fn new() -> Self {
        Self {
            wheel: Mutex::new(RefCell::new(TimerWheel::new())),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut TimerWheel) -> R) -> R {
        self.wheel.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn arm_once(&self, id: TimerId, now_us: u64, delay_us: u64) {
        self.with(|w| w.arm_once(id, now_us, delay_us));
    }

    pub fn arm_periodic(&self, id: TimerId, now_us: u64, period_us: u64) {
        self.with(|w| w.arm_periodic(id, now_us, period_us));
    }

    pub fn cancel(&self, id: TimerId) {
        self.with(|w| w.cancel(id));
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.with(|w| w.is_armed(id))
    }

    pub fn deadline(&self, id: TimerId) -> Option<u64> {
        self.with(|w| w.deadline(id))
    }

    pub fn poll(&self, now_us: u64) -> Vec<TimerId, { TimerId::COUNT }> {
        self.with(|w| w.poll(now_us))
    }
}
