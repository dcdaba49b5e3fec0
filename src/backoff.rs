//! Retry policy and poll bookkeeping.
//!
//! The poll loop is a two-state machine:
//!
//! ```text
//! Polling --success--> Polling
//! Polling --failure--> Backoff(delay) --sleep--> Polling
//! ```
//!
//! [`PollState`] owns the transition; the loop only sleeps on the
//! `Backoff` edge. Nothing here touches the network or the clock.

use std::time::Duration;

/// Default first retry delay.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(5_000);

/// Default growth factor per consecutive failure.
pub const DEFAULT_BACKOFF_MULTIPLIER: u32 = 2;

/// Default retry delay ceiling.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_millis(300_000);

/// Exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay after the first failure.
    pub base: Duration,
    /// Growth factor per further failure.
    pub multiplier: u32,
    /// Delay ceiling.
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max: DEFAULT_BACKOFF_MAX,
        }
    }
}

impl Backoff {
    /// Returns the delay after `failures` consecutive failures.
    ///
    /// Zero failures means no delay. Otherwise the delay is
    /// `base * multiplier^(failures - 1)`, capped at `max`. Growth stops as
    /// soon as the cap is reached, so large counts cannot overflow.
    #[must_use]
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }

        let mut delay = self.base;
        for _ in 1..failures {
            if delay >= self.max {
                break;
            }
            delay = delay.saturating_mul(self.multiplier);
        }

        delay.min(self.max)
    }
}

/// Next step of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Poll again after the steady-state interval.
    Polling,
    /// Sleep for the given delay, then poll again.
    Backoff(Duration),
}

/// Poller-owned acknowledgment and failure state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    last_acked_id: i64,
    consecutive_failures: u32,
}

impl PollState {
    /// Creates a fresh state: nothing acknowledged, no failures.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_acked_id: 0,
            consecutive_failures: 0,
        }
    }

    /// Highest update id acknowledged so far.
    #[must_use]
    pub const fn last_acked_id(&self) -> i64 {
        self.last_acked_id
    }

    /// Number of failed cycles since the last success.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Offset for the next `getUpdates` call.
    #[must_use]
    pub const fn next_offset(&self) -> i64 {
        self.last_acked_id.saturating_add(1)
    }

    /// Records `update_id` as seen. Never moves backwards.
    pub fn acknowledge(&mut self, update_id: i64) {
        self.last_acked_id = self.last_acked_id.max(update_id);
    }

    /// Records a successful cycle and returns the next phase.
    pub fn record_success(&mut self) -> PollPhase {
        if self.consecutive_failures > 0 {
            tracing::info!(
                "poll recovered after {} failures",
                self.consecutive_failures
            );
            self.consecutive_failures = 0;
        }
        PollPhase::Polling
    }

    /// Records a failed cycle and returns the next phase.
    pub fn record_failure(&mut self, backoff: &Backoff) -> PollPhase {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        PollPhase::Backoff(backoff.delay(self.consecutive_failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_delay_sequence() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(0), Duration::ZERO);
        assert_eq!(backoff.delay(1), ms(5_000));
        assert_eq!(backoff.delay(2), ms(10_000));
        assert_eq!(backoff.delay(6), ms(160_000));
        assert_eq!(backoff.delay(7), ms(300_000));
        assert_eq!(backoff.delay(20), ms(300_000));
        assert_eq!(backoff.delay(u32::MAX), ms(300_000));
    }

    #[test]
    fn test_delay_matches_closed_form() {
        let backoff = Backoff::default();
        for failures in 1..=40u32 {
            let uncapped = 5_000u128 * 2u128.pow(failures - 1);
            let expected = uncapped.min(300_000) as u64;
            assert_eq!(backoff.delay(failures), ms(expected), "failures={failures}");
        }
    }

    #[test]
    fn test_acknowledge_is_monotonic() {
        let mut state = PollState::new();
        let mut max_seen = 0;
        for id in [3, 9, 4, 9, 15, 1] {
            state.acknowledge(id);
            max_seen = max_seen.max(id);
            assert_eq!(state.last_acked_id(), max_seen);
        }
        assert_eq!(state.next_offset(), 16);
    }

    #[test]
    fn test_phase_transitions() {
        let backoff = Backoff::default();
        let mut state = PollState::new();

        assert_eq!(state.record_failure(&backoff), PollPhase::Backoff(ms(5_000)));
        assert_eq!(state.record_failure(&backoff), PollPhase::Backoff(ms(10_000)));
        assert_eq!(state.consecutive_failures(), 2);

        assert_eq!(state.record_success(), PollPhase::Polling);
        assert_eq!(state.consecutive_failures(), 0);

        assert_eq!(state.record_failure(&backoff), PollPhase::Backoff(ms(5_000)));
    }
}
