//! Repository trait for login attempt tracking.
//!
//! One row exists per `(email, ip_address)` pair. The repository only
//! moves data; the decision logic (thresholds, expiry) lives in the
//! lockout service, and every mutation here is an explicit call. Reads
//! never change a record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, lockout::LoginAttempt};

/// Repository for per-pair failed-login counters.
#[async_trait]
pub trait LockoutRepository: Send + Sync + 'static {
    /// Find the counter for an `(email, ip_address)` pair.
    ///
    /// Emails are matched lowercased.
    async fn find(&self, email: &str, ip_address: &str) -> Result<Option<LoginAttempt>, Error>;

    /// Record one failed attempt for the pair, creating the counter on
    /// first failure. Increments `attempts`, updates `last_attempt` and
    /// `user_agent`, and returns the updated record.
    async fn record_failure(
        &self,
        email: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<LoginAttempt, Error>;

    /// Apply a lock to the pair until the given instant.
    async fn lock(
        &self,
        email: &str,
        ip_address: &str,
        locked_until: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Reset the pair to its unlocked defaults: zero attempts, no lock.
    ///
    /// A no-op if no counter exists for the pair.
    async fn reset(&self, email: &str, ip_address: &str) -> Result<(), Error>;

    /// Delete counters for unlocked pairs whose `last_attempt` predates
    /// `before`, returning the number removed. Locked pairs are kept so
    /// cleanup can never unlock an account early.
    async fn cleanup_stale(&self, before: DateTime<Utc>) -> Result<u64, Error>;
}
