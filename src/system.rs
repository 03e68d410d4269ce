//! Runtime wiring: the system lock, interrupt entry points and the three
//! long-running loops.
//!
//! ```text
//!            ┌──────────── interrupt context ────────────┐
//!            │ column edges   mic edge   echo edges  tick │
//!            └──────┬────────────┬──────────┬────────┬───┘
//!                   ▼            ▼          ▼        ▼
//!            InterruptState   DeferredQueue   Timers (critical section)
//!                   │            │
//!   ┌───────────────┼────────────┼──────────────────────────────┐
//!   │ row scanner   │ key dispatcher        deferred worker     │
//!   └───────────────┴─────── Mutex<AlarmService> ───────────────┘
//! ```
//!
//! `AlarmSystem` holds no board: every entry point takes the board as a
//! parameter so the same instance can be driven by the firmware adapter
//! or by a test mock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::app::events::BreachSource;
use crate::app::ports::{ClockPort, DelayPort, DigitalIo, DisplayPort, EventSink, WatchdogPort};
use crate::app::service::AlarmService;
use crate::config::AlarmConfig;
use crate::deferred::{DeferredQueue, DeferredWork};
use crate::fsm::SystemMode;
use crate::isr::InterruptState;
use crate::pins::Pin;
use crate::timers::{TimerId, Timers};

pub struct AlarmSystem<D, S> {
    service: Mutex<AlarmService<D, S>>,
    irq: InterruptState,
    deferred: DeferredQueue,
    timers: Timers,
    config: AlarmConfig,
}

impl<D: DisplayPort, S: EventSink> AlarmSystem<D, S> {
    pub fn new(config: AlarmConfig, display: D, sink: S) -> Self {
        Self {
            service: Mutex::new(AlarmService::new(&config, display, sink)),
            irq: InterruptState::new(),
            deferred: DeferredQueue::new(),
            timers: Timers::new(),
            config,
        }
    }

    /// Show the Setup prompt and arm the idle timer and the trigger ticker.
    /// Call once, before interrupts are enabled.
    pub fn start(&self, board: &(impl DigitalIo + DelayPort + ClockPort)) {
        let mut svc = self.lock();
        svc.start(board);
        self.irq.publish_mode(svc.mode());
        drop(svc);

        let now = board.now_us();
        self.timers
            .arm_once(TimerId::IdleTimeout, now, self.config.idle_timeout_us());
        self.timers
            .arm_periodic(TimerId::TriggerTicker, now, self.config.trigger_period_us());
        info!(
            "timers armed: idle {} ms, trigger every {} ms",
            self.config.idle_timeout_ms, self.config.trigger_period_ms
        );
    }

    // ═══════════════════════════════════════════════════════════
    //  Thread steps
    // ═══════════════════════════════════════════════════════════

    /// One row-scanner iteration, then the watchdog heartbeat.
    pub fn row_scan_step(&self, board: &(impl DigitalIo + WatchdogPort)) {
        {
            let mut svc = self.lock();
            if !self.irq.key_pressed() {
                svc.scan_next_row(board);
            }
        }
        board.kick();
    }

    /// One dispatcher iteration.  Returns `true` if a key reached a mode
    /// handler.
    ///
    /// The lock is held across the settle delay so the scanner cannot move
    /// off the pressed key's row while it debounces.
    pub fn key_dispatch_step(&self, board: &(impl DigitalIo + DelayPort + ClockPort)) -> bool {
        let mut svc = self.lock();
        if !self.irq.key_pressed() || self.irq.debounced() {
            return false;
        }

        board.delay_ms(self.config.debounce_ms);
        if !self.irq.key_pressed() {
            return false;
        }
        self.irq.mark_debounced();

        // Re-arm before looking at the flag: an expiry that already fired
        // is then undone below and its queued blank is skipped.
        self.timers
            .arm_once(TimerId::IdleTimeout, board.now_us(), self.config.idle_timeout_us());
        if !self.irq.display_on() {
            self.irq.set_display_on(true);
            svc.wake_display();
        }

        let dispatched = svc.handle_key(board).is_some();
        self.irq.publish_mode(svc.mode());
        dispatched
    }

    /// Run one deferred item under the lock.
    pub fn run_deferred(&self, work: DeferredWork, board: &(impl DigitalIo + DelayPort)) {
        let mut svc = self.lock();
        match work {
            DeferredWork::MicrophoneBreach => {
                if !svc.trigger_breach(BreachSource::Microphone, board) {
                    board.write(Pin::MicrophoneEnable, true);
                }
            }
            DeferredWork::UltrasonicBreach => {
                svc.trigger_breach(BreachSource::Ultrasonic, board);
                self.irq.clear_breach();
            }
            DeferredWork::BlankDisplay => {
                // A keypress between expiry and now wins.
                if !self.irq.display_on() {
                    svc.blank_display(board);
                }
            }
        }
        self.irq.publish_mode(svc.mode());
    }

    /// Drain whatever is queued without blocking.  Returns the item count.
    pub fn deferred_step(&self, board: &(impl DigitalIo + DelayPort)) -> usize {
        let mut n = 0;
        self.deferred.drain(|work| {
            self.run_deferred(work, board);
            n += 1;
        });
        n
    }

    // ═══════════════════════════════════════════════════════════
    //  Interrupt entry points (no locks, no logging, no blocking)
    // ═══════════════════════════════════════════════════════════

    /// Any column line went high.
    pub fn on_column_rise(&self) {
        self.irq.press();
    }

    /// Any column line went low.
    pub fn on_column_fall(&self) {
        self.irq.release();
    }

    /// Microphone line went high.  Gate the line off first so the edge
    /// cannot re-fire, then hand the decision to the worker through the
    /// lock-free ISR lane.
    pub fn on_microphone_rise(&self, io: &impl DigitalIo) {
        io.write(Pin::MicrophoneEnable, false);
        self.deferred.post_from_isr(DeferredWork::MicrophoneBreach);
    }

    /// Echo pulse started: open the detection window.
    pub fn on_echo_rise(&self, clock: &impl ClockPort) {
        self.irq.set_echo_active(true);
        self.timers.arm_once(
            TimerId::EchoTimeout,
            clock.now_us(),
            u64::from(self.config.echo_timeout_us),
        );
    }

    /// Echo pulse ended.
    pub fn on_echo_fall(&self) {
        self.irq.set_echo_active(false);
    }

    /// Hardware tick: fire every timer that has come due.
    pub fn on_timer_tick(&self, board: &(impl DigitalIo + DelayPort + ClockPort)) {
        for id in self.timers.poll(board.now_us()) {
            match id {
                TimerId::IdleTimeout => self.on_idle_timeout(),
                TimerId::EchoTimeout => self.on_echo_timeout(),
                TimerId::TriggerTicker => self.on_trigger_tick(board),
            }
        }
    }

    fn on_idle_timeout(&self) {
        if self.irq.take_display_on() && !self.deferred.post(DeferredWork::BlankDisplay) {
            // Queue full: stay lit; the next keypress re-arms the timer.
            self.irq.set_display_on(true);
        }
    }

    fn on_echo_timeout(&self) {
        // Echo already back before the mark: the object is inside the threshold.
        if self.irq.echo_active() || self.irq.mode() != SystemMode::Armed {
            return;
        }
        if self.irq.claim_breach() && !self.deferred.post(DeferredWork::UltrasonicBreach) {
            self.irq.clear_breach();
        }
    }

    fn on_trigger_tick(&self, board: &(impl DigitalIo + DelayPort)) {
        if self.irq.echo_active() {
            return;
        }
        board.write(Pin::UltrasonicTrigger, true);
        board.delay_us(self.config.trigger_pulse_us);
        board.write(Pin::UltrasonicTrigger, false);
        if self.irq.mode() == SystemMode::Triggered {
            board.toggle(Pin::AlarmLeds);
        }
    }

    // ═══════════════════════════════════════════════════════════
    //  Accessors
    // ═══════════════════════════════════════════════════════════

    /// Run `f` with the system lock held.
    pub fn with_service<R>(&self, f: impl FnOnce(&mut AlarmService<D, S>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn mode(&self) -> SystemMode {
        self.lock().mode()
    }

    pub fn current_row(&self) -> usize {
        self.lock().row()
    }

    pub fn irq(&self) -> &InterruptState {
        &self.irq
    }

    pub fn deferred(&self) -> &DeferredQueue {
        &self.deferred
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    /// Acquire the system lock, recovering from a poisoned mutex: the
    /// service state stays consistent between method calls.
    fn lock(&self) -> MutexGuard<'_, AlarmService<D, S>> {
        self.service.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ═══════════════════════════════════════════════════════════
    //  Long-running loops
    // ═══════════════════════════════════════════════════════════

    /// Row scanner thread.  Subscribes itself to the watchdog: this loop
    /// is the only heartbeat.
    pub fn run_row_scanner(&self, board: &(impl DigitalIo + DelayPort + WatchdogPort)) -> ! {
        board.subscribe();
        info!("row scanner running");
        loop {
            self.row_scan_step(board);
            board.delay_us(self.config.row_scan_interval_us);
        }
    }

    /// Key dispatcher thread.
    pub fn run_key_dispatcher(&self, board: &(impl DigitalIo + DelayPort + ClockPort)) -> ! {
        info!("key dispatcher running");
        loop {
            if !self.key_dispatch_step(board) {
                board.delay_us(self.config.key_poll_interval_us);
            }
        }
    }

    /// Deferred worker.  Polls the queue, sleeping `deferred_poll_ms`
    /// whenever it comes up empty; producers never wake it.
    pub fn run_deferred_worker(&self, board: &(impl DigitalIo + DelayPort)) -> ! {
        info!("deferred worker running (poll {} ms)", self.config.deferred_poll_ms);
        let mut reported = 0;
        loop {
            if self.deferred_step(board) == 0 {
                board.delay_ms(self.config.deferred_poll_ms);
            }
            let dropped = self.deferred.dropped();
            if dropped != reported {
                warn!("deferred queue overflowed ({} items dropped since boot)", dropped);
                reported = dropped;
            }
        }
    }
}
