//! Interrupt → thread handoff for blocking work.
//!
//! ISRs must not take the system lock, write to the LCD or sleep.  When
//! they need any of that they post a [`DeferredWork`] item here and
//! return; the deferred worker thread polls the queue and runs each item
//! under the lock.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐
//! │ GPIO ISR    │────▶│ ISR lane         │──┐
//! │ (mic edge)  │     │ (atomic counts)  │  │   ┌──────────────────┐
//! └─────────────┘     └──────────────────┘  ├──▶│ deferred worker  │
//! ┌─────────────┐     ┌──────────────────┐  │   │ (polls, sleeps)  │
//! │ timer task  │────▶│ task lane        │──┘   └──────────────────┘
//! │ (echo/idle) │     │ (embassy chan)   │
//! └─────────────┘     └──────────────────┘
//! ```
//!
//! Nothing on either lane wakes the worker.  The ISR lane is a pending
//! count per work kind, touched only with atomic read-modify-write; the
//! task lane is only ever used through `try_send` / `try_receive`, so no
//! waker is registered and posting never reaches an OS primitive.
//!
//! Posting never blocks.  A full lane drops the item and bumps a counter.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Task-lane depth.  Sensor gating and the breach claim keep the
/// steady-state population at one or two items.
pub const DEFERRED_QUEUE_CAP: usize = 8;

/// Pending items of one kind the ISR lane holds before dropping.
pub const ISR_PENDING_CAP: u32 = 4;

/// Work items posted from interrupt context.  Plain data only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeferredWork {
    /// Microphone edge seen; the gate is already low.
    MicrophoneBreach = 0,
    /// Echo ended inside the detection window while armed.
    UltrasonicBreach = 1,
    /// Idle timer expired with the display on.
    BlankDisplay = 2,
}

impl DeferredWork {
    const ALL: [Self; 3] = [
        Self::MicrophoneBreach,
        Self::UltrasonicBreach,
        Self::BlankDisplay,
    ];
}

pub struct DeferredQueue {
    isr_pending: [AtomicU32; DeferredWork::ALL.len()],
    channel: Channel<CriticalSectionRawMutex, DeferredWork, DEFERRED_QUEUE_CAP>,
    dropped: AtomicU32,
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredQueue {
    pub const fn new() -> Self {
        Self {
            isr_pending: [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)],
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue from a GPIO interrupt.  Lock-free: a single atomic
    /// read-modify-write, no critical section.  Returns `false` if the
    /// item was dropped.
    pub fn post_from_isr(&self, work: DeferredWork) -> bool {
        let slot = &self.isr_pending[work as usize];
        let queued = slot
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < ISR_PENDING_CAP).then_some(n + 1)
            })
            .is_ok();
        if !queued {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queued
    }

    /// Enqueue from task context (threads, the esp_timer task).  Returns
    /// `false` if the item was dropped.
    pub fn post(&self, work: DeferredWork) -> bool {
        if self.channel.try_send(work).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Next item, if any.  The ISR lane is served first.
    pub fn try_next(&self) -> Option<DeferredWork> {
        self.take_isr().or_else(|| self.channel.try_receive().ok())
    }

    fn take_isr(&self) -> Option<DeferredWork> {
        DeferredWork::ALL.into_iter().find(|&work| {
            self.isr_pending[work as usize]
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .is_ok()
        })
    }

    /// Hand every queued item to `handler`.
    pub fn drain(&self, mut handler: impl FnMut(DeferredWork)) {
        while let Some(work) = self.try_next() {
            handler(work);
        }
    }

    pub fn len(&self) -> usize {
        let isr: u32 = self
            .isr_pending
            .iter()
            .map(|n| n.load(Ordering::Acquire))
            .sum();
        isr as usize + self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items lost to a full lane since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}
