//! Per-UE bounded-retry timers: T3413 (paging), T3460 (authentication /
//! security-mode retransmission) and T3470 (identity-request
//! retransmission), each parameterized by `(duration, max_count)`.
//!
//! Expiry is delivered to the FSM as an [`crate::events::EmmTimerTick`]
//! event. Because the scheduling of the actual `sleep` lives outside this
//! crate (in the daemon's dispatcher), a timer that is stopped or re-armed
//! after its sleep was scheduled but before it fires must not be allowed to
//! act on a stale expiry. Every arm/stop bumps a `generation` counter; the
//! stored generation travels with the scheduled wakeup and `on_expiry`
//! discards anything that doesn't match (stop-before-fire).

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// The three NAS timers this crate's FSM arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerId {
    T3413,
    T3460,
    T3470,
}

/// Static `(duration, max_count)` parameters for one timer, loaded from
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub duration_ms: u64,
    pub max_count: u32,
}

impl TimerConfig {
    pub fn duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.duration_ms)
    }
}

/// One running (or stopped) instance of a timer for one UE.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    pub running: bool,
    pub retry_count: u32,
    pub generation: u64,
    pub deadline: Option<Instant>,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            running: false,
            retry_count: 0,
            generation: 0,
            deadline: None,
        }
    }
}

impl Timer {
    /// Arms (or re-arms) the timer, resetting `retry_count` to 0 and
    /// bumping the generation. Returns the new generation so the caller
    /// can schedule a matching wakeup.
    pub fn start(&mut self, cfg: &TimerConfig, now: Instant) -> u64 {
        self.running = true;
        self.retry_count = 0;
        self.generation += 1;
        self.deadline = Some(now + cfg.duration());
        self.generation
    }

    /// Re-arms for a retransmission: increments `retry_count` (the caller
    /// must have already checked it against `max_count`) without resetting
    /// it, and bumps the generation the same way `start` does.
    pub fn retransmit(&mut self, cfg: &TimerConfig, now: Instant) -> u64 {
        self.running = true;
        self.retry_count += 1;
        self.generation += 1;
        self.deadline = Some(now + cfg.duration());
        self.generation
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.deadline = None;
    }

    pub fn is_exhausted(&self, cfg: &TimerConfig) -> bool {
        self.retry_count >= cfg.max_count
    }

    /// Applies the stop-before-fire check: an expiry is only live if the
    /// timer is still running and the generation it was scheduled under is
    /// still current.
    pub fn is_live_expiry(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}

/// The three timer records owned by one UE context.
#[derive(Debug, Clone, Default)]
pub struct TimerSet {
    pub t3413: Timer,
    pub t3460: Timer,
    pub t3470: Timer,
}

impl TimerSet {
    pub fn get(&self, id: TimerId) -> &Timer {
        match id {
            TimerId::T3413 => &self.t3413,
            TimerId::T3460 => &self.t3460,
            TimerId::T3470 => &self.t3470,
        }
    }

    pub fn get_mut(&mut self, id: TimerId) -> &mut Timer {
        match id {
            TimerId::T3413 => &mut self.t3413,
            TimerId::T3460 => &mut self.t3460,
            TimerId::T3470 => &mut self.t3470,
        }
    }

    /// Stops every timer for this UE. Invoked atomically on entry to
    /// De-Registered and Exception.
    pub fn clear_all(&mut self) {
        self.t3413.stop();
        self.t3460.stop();
        self.t3470.stop();
    }

    pub fn any_running(&self) -> bool {
        self.t3413.running || self.t3460.running || self.t3470.running
    }
}

/// The full timer configuration table, loaded from `Config`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimerTable {
    pub t3413: TimerConfig,
    pub t3460: TimerConfig,
    pub t3470: TimerConfig,
}

impl TimerTable {
    pub fn get(&self, id: TimerId) -> &TimerConfig {
        match id {
            TimerId::T3413 => &self.t3413,
            TimerId::T3460 => &self.t3460,
            TimerId::T3470 => &self.t3470,
        }
    }
}

impl Default for TimerTable {
    /// 3GPP TS 24.301 Annex defaults where a carrier hasn't overridden
    /// them: T3413 paging repeats a handful of times at several seconds,
    /// T3460/T3470 retransmit NAS a handful of times subsecond-to-second.
    fn default() -> Self {
        Self {
            t3413: TimerConfig {
                duration_ms: 6_000,
                max_count: 4,
            },
            t3460: TimerConfig {
                duration_ms: 6_000,
                max_count: 4,
            },
            t3470: TimerConfig {
                duration_ms: 6_000,
                max_count: 4,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TimerConfig {
        TimerConfig {
            duration_ms: 1_000,
            max_count: 2,
        }
    }

    #[test]
    fn start_resets_retry_count_and_bumps_generation() {
        let mut t = Timer::default();
        let now = Instant::now();
        t.retransmit(&cfg(), now);
        t.retransmit(&cfg(), now);
        assert_eq!(t.retry_count, 2);
        let gen_before = t.generation;
        let gen = t.start(&cfg(), now);
        assert_eq!(t.retry_count, 0);
        assert_eq!(gen, gen_before + 1);
        assert!(t.running);
    }

    #[test]
    fn stop_clears_running_and_deadline() {
        let mut t = Timer::default();
        t.start(&cfg(), Instant::now());
        t.stop();
        assert!(!t.running);
        assert!(t.deadline.is_none());
    }

    #[test]
    fn stale_generation_is_not_a_live_expiry() {
        let mut t = Timer::default();
        let gen1 = t.start(&cfg(), Instant::now());
        let _gen2 = t.start(&cfg(), Instant::now());
        assert!(!t.is_live_expiry(gen1));
    }

    #[test]
    fn stopped_timer_has_no_live_expiry_even_with_matching_generation() {
        let mut t = Timer::default();
        let gen = t.start(&cfg(), Instant::now());
        t.stop();
        assert!(!t.is_live_expiry(gen));
    }

    #[test]
    fn exhaustion_is_measured_against_configured_max() {
        let c = cfg();
        let mut t = Timer::default();
        assert!(!t.is_exhausted(&c));
        t.retransmit(&c, Instant::now());
        assert!(!t.is_exhausted(&c));
        t.retransmit(&c, Instant::now());
        assert!(t.is_exhausted(&c));
    }

    #[test]
    fn clear_all_stops_every_timer() {
        let mut set = TimerSet::default();
        set.t3413.start(&cfg(), Instant::now());
        set.t3460.start(&cfg(), Instant::now());
        set.t3470.start(&cfg(), Instant::now());
        set.clear_all();
        assert!(!set.any_running());
    }
}
