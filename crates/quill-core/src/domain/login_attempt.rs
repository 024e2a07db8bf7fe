use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Denial;

/// Failed password attempts allowed before the account locks.
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Length of a lockout, in minutes.
pub const LOCKOUT_WINDOW_MINUTES: f64 = 30.0;

/// Per-username throttle record, stored under the username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginAttemptState {
    pub username: String,
    pub login_attempts: u32,
    /// Time of the most recent failed attempt.
    pub last_login_attempt: Option<DateTime<Utc>>,
    /// Remaining lockout in minutes, 0 when not locked out.
    pub timeout: f64,
}

impl LoginAttemptState {
    /// The zero-value record used when storage has nothing for `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            login_attempts: 0,
            last_login_attempt: None,
            timeout: 0.0,
        }
    }

    pub fn is_capped(&self) -> bool {
        self.login_attempts >= MAX_LOGIN_ATTEMPTS
    }

    pub fn attempts_remaining(&self) -> u32 {
        MAX_LOGIN_ATTEMPTS.saturating_sub(self.login_attempts)
    }

    /// Fractional minutes since the last failed attempt.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_login_attempt
            .map(|last| (now - last).num_milliseconds() as f64 / 60_000.0)
    }

    /// Whether the record is capped and still inside its lockout window.
    pub fn lockout_active(&self, now: DateTime<Utc>) -> bool {
        self.is_capped()
            && self
                .elapsed_minutes(now)
                .is_some_and(|elapsed| elapsed < LOCKOUT_WINDOW_MINUTES)
    }

    /// Clear a lockout whose window has run out. Returns whether anything changed.
    pub fn expire_lockout(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_capped() || self.lockout_active(now) {
            return false;
        }
        self.reset();
        true
    }

    /// Count a failed attempt at `now` and work out how it is reported.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> Denial {
        if self.login_attempts < MAX_LOGIN_ATTEMPTS {
            self.login_attempts += 1;
            self.last_login_attempt = Some(now);
        }

        if self.is_capped() {
            match self.elapsed_minutes(now) {
                Some(elapsed) if elapsed < LOCKOUT_WINDOW_MINUTES => {
                    self.timeout = LOCKOUT_WINDOW_MINUTES - elapsed;
                }
                // Window already over: start clean, but this attempt still fails.
                _ => self.reset(),
            }
        }

        if self.is_capped() {
            Denial::LockedOut {
                retry_in_minutes: self.timeout,
            }
        } else {
            Denial::InvalidCredentials {
                attempts_remaining: self.attempts_remaining(),
            }
        }
    }

    fn reset(&mut self) {
        self.login_attempts = 0;
        self.timeout = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_failures_count_down_then_lock() {
        let mut state = LoginAttemptState::new("owner");

        assert_eq!(
            state.record_failure(t0()),
            Denial::InvalidCredentials {
                attempts_remaining: 2
            }
        );
        assert_eq!(
            state.record_failure(t0() + Duration::seconds(10)),
            Denial::InvalidCredentials {
                attempts_remaining: 1
            }
        );

        let denial = state.record_failure(t0() + Duration::seconds(20));

        assert!(matches!(denial, Denial::LockedOut { retry_in_minutes } if retry_in_minutes == 30.0));
        assert_eq!(state.login_attempts, 3);
        assert_eq!(state.last_login_attempt, Some(t0() + Duration::seconds(20)));
    }

    #[test]
    fn test_locked_failure_does_not_restamp() {
        let mut state = LoginAttemptState::new("owner");
        for _ in 0..3 {
            state.record_failure(t0());
        }

        let denial = state.record_failure(t0() + Duration::minutes(12));

        assert_eq!(state.login_attempts, 3);
        assert_eq!(state.last_login_attempt, Some(t0()));
        assert_eq!(denial.retry_in_whole_minutes(), Some(18));
    }

    #[test]
    fn test_capped_record_past_window_resets_but_still_fails() {
        let mut state = LoginAttemptState {
            username: "owner".into(),
            login_attempts: 3,
            last_login_attempt: Some(t0()),
            timeout: 30.0,
        };

        let denial = state.record_failure(t0() + Duration::minutes(45));

        assert_eq!(
            denial,
            Denial::InvalidCredentials {
                attempts_remaining: 3
            }
        );
        assert_eq!(state.login_attempts, 0);
        assert_eq!(state.timeout, 0.0);
    }

    #[test]
    fn test_expire_lockout_only_after_window() {
        let mut state = LoginAttemptState::new("owner");
        for _ in 0..3 {
            state.record_failure(t0());
        }

        assert!(!state.expire_lockout(t0() + Duration::minutes(29)));
        assert!(state.is_capped());

        assert!(state.expire_lockout(t0() + Duration::minutes(30)));
        assert_eq!(state.login_attempts, 0);
        assert_eq!(state.timeout, 0.0);
    }

    #[test]
    fn test_lockout_active_tracks_the_window() {
        let mut state = LoginAttemptState::new("owner");
        state.record_failure(t0());
        assert!(!state.lockout_active(t0()));

        state.record_failure(t0());
        state.record_failure(t0());
        assert!(state.lockout_active(t0() + Duration::minutes(29)));
        assert!(!state.lockout_active(t0() + Duration::minutes(30)));
    }

    #[test]
    fn test_expire_lockout_ignores_uncapped_records() {
        let mut state = LoginAttemptState::new("owner");
        state.record_failure(t0());

        assert!(!state.expire_lockout(t0() + Duration::hours(5)));
        assert_eq!(state.login_attempts, 1);
    }
}
