//! Login attempt tracking and account lockout
//!
//! Failed password logins are counted per `(email, ip_address)` pair.
//! Once the count reaches the configured threshold the pair is locked for
//! a fixed duration; a lapsed lock reads as unlocked and is reset by the
//! lockout service through an explicit repository mutation.
//!
//! The model deliberately separates the *pure* questions (`is_locked_at`,
//! `lock_expired`, `remaining_lock_minutes`) from the mutations that act
//! on their answers. Reading a record never changes it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A per-`(email, ip_address)` failed-login counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub id: i64,
    /// Lowercased email the attempts were made against.
    pub email: String,
    pub ip_address: String,
    /// User agent of the most recent failed attempt.
    pub user_agent: Option<String>,
    /// Count of consecutive failed attempts.
    pub attempts: u32,
    pub is_locked: bool,
    /// Set when the pair crosses the attempt threshold; always a future
    /// instant at the time of locking.
    pub locked_until: Option<DateTime<Utc>>,
    /// Timestamp of the most recent failed attempt.
    pub last_attempt: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoginAttempt {
    /// Whether the lock is in force at `now`.
    ///
    /// A record whose `locked_until` has passed is *not* considered locked
    /// even if `is_locked` is still stored as true; the caller is expected
    /// to follow up with an explicit reset.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_locked {
            return false;
        }
        match self.locked_until {
            Some(until) => until > now,
            None => false,
        }
    }

    /// Whether a previously applied lock has lapsed by `now`.
    pub fn lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_locked && self.locked_until.is_some_and(|until| until <= now)
    }

    /// Minutes until the lock lapses, rounded up, 0 once it has passed.
    pub fn remaining_lock_minutes(&self, now: DateTime<Utc>) -> i64 {
        let Some(until) = self.locked_until else {
            return 0;
        };
        if !self.is_locked || until <= now {
            return 0;
        }
        let seconds = (until - now).num_seconds();
        (seconds as u64).div_ceil(60) as i64
    }
}

/// Lockout thresholds, sourced from `Settings.security` at decision time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failed attempts before the pair is locked.
    pub max_attempts: u32,
    /// How long a lock stays in force.
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration: Duration::minutes(30),
        }
    }
}

/// The lockout state reported to callers of the lockout service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutStatus {
    pub email: String,
    pub ip_address: String,
    pub failed_attempts: u32,
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutStatus {
    /// An unlocked status with no recorded attempts.
    pub fn clear(email: &str, ip_address: &str) -> Self {
        Self {
            email: email.to_lowercase(),
            ip_address: ip_address.to_string(),
            failed_attempts: 0,
            is_locked: false,
            locked_until: None,
        }
    }

    /// Minutes until the lock lapses, rounded up, 0 when unlocked.
    pub fn retry_after_minutes(&self) -> i64 {
        if !self.is_locked {
            return 0;
        }
        match self.locked_until {
            Some(until) => {
                let seconds = (until - Utc::now()).num_seconds();
                (seconds.max(0) as u64).div_ceil(60) as i64
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(attempts: u32, locked_until: Option<DateTime<Utc>>) -> LoginAttempt {
        let now = Utc::now();
        LoginAttempt {
            id: 1,
            email: "bob@example.com".to_string(),
            ip_address: "1.2.3.4".to_string(),
            user_agent: None,
            attempts,
            is_locked: locked_until.is_some(),
            locked_until,
            last_attempt: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_unlocked_record() {
        let now = Utc::now();
        let record = attempt(3, None);
        assert!(!record.is_locked_at(now));
        assert!(!record.lock_expired(now));
        assert_eq!(record.remaining_lock_minutes(now), 0);
    }

    #[test]
    fn test_active_lock() {
        let now = Utc::now();
        let record = attempt(5, Some(now + Duration::minutes(30)));
        assert!(record.is_locked_at(now));
        assert!(!record.lock_expired(now));
    }

    #[test]
    fn test_lapsed_lock_reads_unlocked() {
        let now = Utc::now();
        let record = attempt(5, Some(now - Duration::seconds(1)));
        assert!(!record.is_locked_at(now));
        assert!(record.lock_expired(now));
        assert_eq!(record.remaining_lock_minutes(now), 0);
    }

    #[test]
    fn test_remaining_minutes_rounds_up() {
        let now = Utc::now();
        let record = attempt(5, Some(now + Duration::seconds(61)));
        assert_eq!(record.remaining_lock_minutes(now), 2);

        let record = attempt(5, Some(now + Duration::seconds(60)));
        assert_eq!(record.remaining_lock_minutes(now), 1);
    }

    #[test]
    fn test_remaining_minutes_non_increasing() {
        let now = Utc::now();
        let record = attempt(5, Some(now + Duration::minutes(20)));
        let at_lock = record.remaining_lock_minutes(now);
        let later = record.remaining_lock_minutes(now + Duration::minutes(10));
        let after = record.remaining_lock_minutes(now + Duration::minutes(31));
        assert!(at_lock >= later);
        assert_eq!(at_lock, 20);
        assert_eq!(later, 10);
        assert_eq!(after, 0);
    }

    #[test]
    fn test_status_retry_after() {
        let status = LockoutStatus {
            email: "bob@example.com".to_string(),
            ip_address: "1.2.3.4".to_string(),
            failed_attempts: 5,
            is_locked: true,
            locked_until: Some(Utc::now() + Duration::minutes(20)),
        };
        assert_eq!(status.retry_after_minutes(), 20);

        assert_eq!(
            LockoutStatus::clear("bob@example.com", "1.2.3.4").retry_after_minutes(),
            0
        );
    }
}
