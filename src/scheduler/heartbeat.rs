//! One-minute heartbeat that turns the cadence policy into poll triggers
//!
//! The heartbeat wakes on every wall-clock minute boundary, re-evaluates the
//! active cadence, and triggers a poll when the minute is a poll slot. Because
//! the decision is remade every minute, a day/night boundary is picked up on
//! the first tick after it is crossed and no timer drift accumulates.
//!
//! At most one poll cycle runs at a time: a trigger that arrives while a cycle
//! is still in flight is skipped.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, Timelike};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::cadence::{Cadence, CadencePolicy};

// ============================================================================
// Clock
// ============================================================================

/// Source of local wall-clock time
pub trait Clock: Send + Sync {
    /// Current local time
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

// ============================================================================
// Poll Cycle State
// ============================================================================

/// Process-wide polling state, re-derived on every tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollCycleState {
    /// Cadence decided on the last tick
    pub cadence: Option<Cadence>,

    /// Interval of the cadence currently in effect
    pub current_interval: Duration,

    /// Minute of the most recent triggered poll; never moves backwards
    pub last_run_at: Option<NaiveDateTime>,
}

/// Pure tick logic, separated from the async loop so it can be driven by a simulated clock
#[derive(Debug, Clone)]
pub struct Heartbeat {
    policy: CadencePolicy,
    state: PollCycleState,
    last_slot: Option<NaiveDateTime>,
}

impl Heartbeat {
    /// Create a heartbeat for a cadence policy
    pub fn new(policy: CadencePolicy) -> Self {
        Self {
            policy,
            state: PollCycleState::default(),
            last_slot: None,
        }
    }

    /// Current polling state
    pub fn state(&self) -> &PollCycleState {
        &self.state
    }

    /// Cadence policy in use
    pub fn policy(&self) -> &CadencePolicy {
        &self.policy
    }

    /// Evaluate one tick; returns the cadence when a poll should start
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<Cadence> {
        let cadence = self.refresh_cadence(now);
        let minute = truncate_to_minute(now);

        if !self.policy.is_poll_slot(minute) || self.last_slot == Some(minute) {
            return None;
        }

        self.record_run(minute);
        Some(cadence)
    }

    /// Record a poll started outside the slot schedule (e.g. on startup)
    pub fn record_manual_run(&mut self, now: NaiveDateTime) {
        self.refresh_cadence(now);
        self.record_run(truncate_to_minute(now));
    }

    fn refresh_cadence(&mut self, now: NaiveDateTime) -> Cadence {
        let cadence = self.policy.cadence_at(now.time());

        if self.state.cadence != Some(cadence) {
            let interval = self.policy.interval(cadence);
            tracing::info!(
                cadence = %cadence,
                interval_minutes = interval.as_secs() / 60,
                at = %now.format("%H:%M"),
                "Polling cadence changed"
            );
            self.state.cadence = Some(cadence);
            self.state.current_interval = interval;
        }

        cadence
    }

    fn record_run(&mut self, minute: NaiveDateTime) {
        self.last_slot = Some(minute);
        self.state.last_run_at = Some(match self.state.last_run_at {
            Some(previous) => previous.max(minute),
            None => minute,
        });
    }
}

fn truncate_to_minute(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Time left until the next multiple of `period` past midnight
pub fn duration_until_next_check(now: NaiveDateTime, period: Duration) -> Duration {
    let period_ms = period.as_millis().max(1) as u64;
    let elapsed_ms = u64::from(now.num_seconds_from_midnight()) * 1000
        + u64::from(now.nanosecond() / 1_000_000);
    let remainder = elapsed_ms % period_ms;

    if remainder == 0 {
        period
    } else {
        Duration::from_millis(period_ms - remainder)
    }
}

// ============================================================================
// Scheduler Loop
// ============================================================================

/// Work triggered by the scheduler
#[async_trait]
pub trait PollJob: Send + Sync + 'static {
    /// Run one poll cycle to completion
    async fn poll(&self);
}

/// Async driver that ticks the heartbeat and launches poll cycles
pub struct HeartbeatScheduler {
    heartbeat: Heartbeat,
    clock: Arc<dyn Clock>,
    job: Arc<dyn PollJob>,
    check_period: Duration,
    cycle_timeout: Duration,
    poll_on_startup: bool,
    in_flight: Arc<Mutex<()>>,
}

impl HeartbeatScheduler {
    /// Create a scheduler using the system clock
    pub fn new(policy: CadencePolicy, job: Arc<dyn PollJob>) -> Self {
        Self {
            heartbeat: Heartbeat::new(policy),
            clock: Arc::new(SystemClock),
            job,
            check_period: Duration::from_secs(60),
            cycle_timeout: Duration::from_secs(300),
            poll_on_startup: true,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Use a custom clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set how often the cadence is re-evaluated
    pub fn with_check_period(mut self, period: Duration) -> Self {
        self.check_period = period;
        self
    }

    /// Set the upper bound on one poll cycle
    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    /// Set whether a cycle runs immediately on start
    pub fn with_poll_on_startup(mut self, value: bool) -> Self {
        self.poll_on_startup = value;
        self
    }

    /// Current polling state
    pub fn state(&self) -> &PollCycleState {
        self.heartbeat.state()
    }

    /// Run until `shutdown` resolves, then wait for any in-flight cycle
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.poll_on_startup {
            self.heartbeat.record_manual_run(self.clock.now());
            self.trigger();
        }

        loop {
            let wait = duration_until_next_check(self.clock.now(), self.check_period);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if self.heartbeat.tick(self.clock.now()).is_some() {
                        self.trigger();
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested; stopping scheduler");
                    break;
                }
            }
        }

        let _drain = self.in_flight.lock().await;
    }

    /// Launch a poll cycle unless one is already running
    ///
    /// Returns `false` when the trigger was skipped.
    pub fn trigger(&self) -> bool {
        let guard = match self.in_flight.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("Previous poll cycle still running; skipping this trigger");
                return false;
            }
        };

        let job = Arc::clone(&self.job);
        let timeout = self.cycle_timeout;

        tokio::spawn(async move {
            let _guard = guard;
            if tokio::time::timeout(timeout, job.poll()).await.is_err() {
                tracing::error!(
                    timeout_secs = timeout.as_secs(),
                    "Poll cycle exceeded its time limit and was abandoned"
                );
            }
        });

        true
    }
}
