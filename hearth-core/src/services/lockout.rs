//! Login lockout service.
//!
//! Tracks failed password logins per `(email, ip_address)` pair and locks
//! a pair once it crosses the configured attempt threshold. Thresholds are
//! read from the settings singleton on every decision, so an admin change
//! takes effect immediately.
//!
//! Checking the lockout state never mutates a record implicitly: the
//! service consults the model's pure `lock_expired` predicate and, when a
//! lock has lapsed, issues an explicit `reset` through the repository
//! before reporting the pair unlocked.
//!
//! # Example
//!
//! ```rust,ignore
//! use hearth_core::services::LockoutService;
//!
//! let lockout = LockoutService::new(lockout_repo, settings_repo);
//!
//! // Check before authenticating
//! let status = lockout.status("user@example.com", "192.168.1.1").await?;
//! if status.is_locked {
//!     // Reject with retry_after_minutes()
//! }
//!
//! // Record after an authentication failure
//! lockout.record_failure("user@example.com", "192.168.1.1", None).await?;
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    Error,
    lockout::{LockoutPolicy, LockoutStatus},
    repositories::{LockoutRepository, SettingsRepository},
};

/// How long inactive, unlocked counters are retained before cleanup.
const STALE_RETENTION_DAYS: i64 = 7;

/// Service coordinating failed-login bookkeeping and lockout decisions.
///
/// Thread-safe; can be shared across tasks.
pub struct LockoutService<L: LockoutRepository, S: SettingsRepository> {
    repository: Arc<L>,
    settings: Arc<S>,
}

impl<L: LockoutRepository, S: SettingsRepository> LockoutService<L, S> {
    /// Create a new LockoutService.
    pub fn new(repository: Arc<L>, settings: Arc<S>) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// The lockout policy currently configured in settings.
    pub async fn policy(&self) -> Result<LockoutPolicy, Error> {
        let settings = self.settings.get_or_create().await?;
        Ok(settings.security.lockout_policy())
    }

    /// Record a failed login attempt for the pair.
    ///
    /// Increments the counter and applies a lock when the attempt count
    /// reaches the configured threshold. Pure bookkeeping: crossing the
    /// threshold is not an error, the caller decides how to respond to
    /// the returned status.
    pub async fn record_failure(
        &self,
        email: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<LockoutStatus, Error> {
        let policy = self.policy().await?;
        let email = email.to_lowercase();

        let record = self
            .repository
            .record_failure(&email, ip_address, user_agent)
            .await?;

        if record.attempts >= policy.max_attempts && !record.is_locked_at(Utc::now()) {
            let locked_until = Utc::now() + policy.lockout_duration;
            self.repository
                .lock(&email, ip_address, locked_until)
                .await?;

            tracing::info!(
                email = %email,
                ip_address = %ip_address,
                attempts = record.attempts,
                "Login pair locked after repeated failures"
            );

            return Ok(LockoutStatus {
                email,
                ip_address: ip_address.to_string(),
                failed_attempts: record.attempts,
                is_locked: true,
                locked_until: Some(locked_until),
            });
        }

        Ok(LockoutStatus {
            email,
            ip_address: ip_address.to_string(),
            failed_attempts: record.attempts,
            is_locked: record.is_locked_at(Utc::now()),
            locked_until: record.locked_until.filter(|_| record.is_locked),
        })
    }

    /// The current lockout status for the pair.
    ///
    /// A lapsed lock is reset through the repository before an unlocked
    /// status is returned, so expiry is observable exactly once and the
    /// stored record always matches what callers were told.
    pub async fn status(&self, email: &str, ip_address: &str) -> Result<LockoutStatus, Error> {
        let email = email.to_lowercase();

        let Some(record) = self.repository.find(&email, ip_address).await? else {
            return Ok(LockoutStatus::clear(&email, ip_address));
        };

        let now = Utc::now();

        if record.lock_expired(now) {
            self.repository.reset(&email, ip_address).await?;
            return Ok(LockoutStatus::clear(&email, ip_address));
        }

        Ok(LockoutStatus {
            email,
            ip_address: ip_address.to_string(),
            failed_attempts: record.attempts,
            is_locked: record.is_locked_at(now),
            locked_until: record.locked_until.filter(|_| record.is_locked_at(now)),
        })
    }

    /// Whether the pair is currently locked (convenience method).
    pub async fn is_locked(&self, email: &str, ip_address: &str) -> Result<bool, Error> {
        Ok(self.status(email, ip_address).await?.is_locked)
    }

    /// Minutes until the pair unlocks, rounded up, 0 when unlocked.
    pub async fn remaining_lock_minutes(
        &self,
        email: &str,
        ip_address: &str,
    ) -> Result<i64, Error> {
        Ok(self.status(email, ip_address).await?.retry_after_minutes())
    }

    /// Clear the pair's counter after a successful login or admin unlock.
    pub async fn reset(&self, email: &str, ip_address: &str) -> Result<(), Error> {
        self.repository.reset(&email.to_lowercase(), ip_address).await
    }

    /// Start the background cleanup task.
    ///
    /// Periodically removes counters for unlocked pairs that have been
    /// inactive longer than the retention window. Locked pairs are never
    /// touched, so cleanup cannot unlock an account early.
    pub fn start_cleanup_task(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        let repository = Arc::clone(&self.repository);

        // Cleanup runs hourly
        const CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = Utc::now() - Duration::days(STALE_RETENTION_DAYS);
                        match repository.cleanup_stale(before).await {
                            Ok(count) if count > 0 => {
                                tracing::info!(
                                    count = count,
                                    "Cleaned up stale login attempt counters"
                                );
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    "Failed to clean up login attempt counters"
                                );
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("Shutting down lockout cleanup task");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockout::LoginAttempt;
    use crate::settings::{HeroSettings, Settings};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock repository keyed by `(email, ip)`.
    #[derive(Default)]
    struct MockLockoutRepository {
        records: Mutex<HashMap<(String, String), LoginAttempt>>,
    }

    impl MockLockoutRepository {
        /// Rewind a stored lock so tests can observe expiry without sleeping.
        fn expire_lock(&self, email: &str, ip: &str) {
            let mut records = self.records.lock().unwrap();
            let record = records
                .get_mut(&(email.to_string(), ip.to_string()))
                .unwrap();
            record.locked_until = Some(Utc::now() - Duration::seconds(1));
        }
    }

    #[async_trait]
    impl LockoutRepository for MockLockoutRepository {
        async fn find(&self, email: &str, ip: &str) -> Result<Option<LoginAttempt>, Error> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .get(&(email.to_string(), ip.to_string()))
                .cloned())
        }

        async fn record_failure(
            &self,
            email: &str,
            ip: &str,
            user_agent: Option<&str>,
        ) -> Result<LoginAttempt, Error> {
            let mut records = self.records.lock().unwrap();
            let now = Utc::now();
            let key = (email.to_string(), ip.to_string());
            let record = records.entry(key).or_insert_with(|| LoginAttempt {
                id: 1,
                email: email.to_string(),
                ip_address: ip.to_string(),
                user_agent: None,
                attempts: 0,
                is_locked: false,
                locked_until: None,
                last_attempt: now,
                created_at: now,
                updated_at: now,
            });
            record.attempts += 1;
            record.user_agent = user_agent.map(|s| s.to_string());
            record.last_attempt = now;
            record.updated_at = now;
            Ok(record.clone())
        }

        async fn lock(
            &self,
            email: &str,
            ip: &str,
            locked_until: DateTime<Utc>,
        ) -> Result<(), Error> {
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.get_mut(&(email.to_string(), ip.to_string())) {
                record.is_locked = true;
                record.locked_until = Some(locked_until);
            }
            Ok(())
        }

        async fn reset(&self, email: &str, ip: &str) -> Result<(), Error> {
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.get_mut(&(email.to_string(), ip.to_string())) {
                record.attempts = 0;
                record.is_locked = false;
                record.locked_until = None;
            }
            Ok(())
        }

        async fn cleanup_stale(&self, before: DateTime<Utc>) -> Result<u64, Error> {
            let mut records = self.records.lock().unwrap();
            let before_len = records.len();
            records.retain(|_, r| r.is_locked || r.last_attempt >= before);
            Ok((before_len - records.len()) as u64)
        }
    }

    struct MockSettingsRepository {
        settings: Mutex<Settings>,
    }

    impl MockSettingsRepository {
        fn with_lockout(max_attempts: u32, lockout_minutes: u32) -> Self {
            let mut settings = Settings::default();
            settings.security.max_login_attempts = max_attempts;
            settings.security.lockout_duration_minutes = lockout_minutes;
            Self {
                settings: Mutex::new(settings),
            }
        }
    }

    #[async_trait]
    impl SettingsRepository for MockSettingsRepository {
        async fn get_or_create(&self) -> Result<Settings, Error> {
            Ok(self.settings.lock().unwrap().clone())
        }

        async fn update(&self, settings: &Settings) -> Result<Settings, Error> {
            *self.settings.lock().unwrap() = settings.clone();
            Ok(settings.clone())
        }

        async fn get_or_create_hero(&self) -> Result<HeroSettings, Error> {
            Ok(HeroSettings::default())
        }

        async fn update_hero(&self, hero: &HeroSettings) -> Result<HeroSettings, Error> {
            Ok(hero.clone())
        }
    }

    fn service(
        max_attempts: u32,
        lockout_minutes: u32,
    ) -> (
        Arc<MockLockoutRepository>,
        LockoutService<MockLockoutRepository, MockSettingsRepository>,
    ) {
        let repo = Arc::new(MockLockoutRepository::default());
        let settings = Arc::new(MockSettingsRepository::with_lockout(
            max_attempts,
            lockout_minutes,
        ));
        let service = LockoutService::new(repo.clone(), settings);
        (repo, service)
    }

    #[tokio::test]
    async fn test_below_threshold_never_locked() {
        let (_, service) = service(5, 30);

        for _ in 0..4 {
            let status = service
                .record_failure("bob@example.com", "1.2.3.4", None)
                .await
                .unwrap();
            assert!(!status.is_locked);
        }

        assert!(!service.is_locked("bob@example.com", "1.2.3.4").await.unwrap());
    }

    #[tokio::test]
    async fn test_lock_applied_at_threshold() {
        let (_, service) = service(5, 30);

        let before = Utc::now();
        let mut last = None;
        for _ in 0..5 {
            last = Some(
                service
                    .record_failure("bob@example.com", "1.2.3.4", Some("curl/8"))
                    .await
                    .unwrap(),
            );
        }

        let status = last.unwrap();
        assert!(status.is_locked);
        assert_eq!(status.failed_attempts, 5);
        // The lock expiry is strictly after the triggering attempt
        assert!(status.locked_until.unwrap() > before);

        let minutes = service
            .remaining_lock_minutes("bob@example.com", "1.2.3.4")
            .await
            .unwrap();
        assert!(minutes > 0 && minutes <= 30);
    }

    #[tokio::test]
    async fn test_expired_lock_resets_on_read() {
        let (repo, service) = service(3, 30);

        for _ in 0..3 {
            service
                .record_failure("bob@example.com", "1.2.3.4", None)
                .await
                .unwrap();
        }
        assert!(service.is_locked("bob@example.com", "1.2.3.4").await.unwrap());

        // Simulate the lock window passing
        repo.expire_lock("bob@example.com", "1.2.3.4");

        let status = service.status("bob@example.com", "1.2.3.4").await.unwrap();
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);

        // The reset was persisted, not just reported
        let stored = repo.find("bob@example.com", "1.2.3.4").await.unwrap().unwrap();
        assert_eq!(stored.attempts, 0);
        assert!(!stored.is_locked);
        assert!(stored.locked_until.is_none());

        assert_eq!(
            service
                .remaining_lock_minutes("bob@example.com", "1.2.3.4")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_pairs_tracked_separately() {
        let (_, service) = service(2, 30);

        for _ in 0..2 {
            service
                .record_failure("bob@example.com", "1.2.3.4", None)
                .await
                .unwrap();
        }

        assert!(service.is_locked("bob@example.com", "1.2.3.4").await.unwrap());
        // Same email from another address is unaffected
        assert!(!service.is_locked("bob@example.com", "5.6.7.8").await.unwrap());
        // Another email from the same address is unaffected
        assert!(!service.is_locked("alice@example.com", "1.2.3.4").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_clears_counter() {
        let (repo, service) = service(5, 30);

        for _ in 0..3 {
            service
                .record_failure("bob@example.com", "1.2.3.4", None)
                .await
                .unwrap();
        }

        service.reset("bob@example.com", "1.2.3.4").await.unwrap();

        let stored = repo.find("bob@example.com", "1.2.3.4").await.unwrap().unwrap();
        assert_eq!(stored.attempts, 0);
    }

    #[tokio::test]
    async fn test_email_case_insensitive() {
        let (_, service) = service(2, 30);

        service
            .record_failure("Bob@Example.COM", "1.2.3.4", None)
            .await
            .unwrap();
        service
            .record_failure("bob@example.com", "1.2.3.4", None)
            .await
            .unwrap();

        assert!(service.is_locked("BOB@EXAMPLE.COM", "1.2.3.4").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_pair_is_clear() {
        let (_, service) = service(5, 30);
        let status = service.status("nobody@example.com", "9.9.9.9").await.unwrap();
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);
        assert_eq!(status.retry_after_minutes(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_locked_pairs() {
        let (repo, service) = service(2, 30);

        for _ in 0..2 {
            service
                .record_failure("locked@example.com", "1.2.3.4", None)
                .await
                .unwrap();
        }
        service
            .record_failure("idle@example.com", "1.2.3.4", None)
            .await
            .unwrap();

        // Everything is younger than the cutoff except in the future
        let removed = repo.cleanup_stale(Utc::now() + Duration::days(1)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(
            repo.find("locked@example.com", "1.2.3.4")
                .await
                .unwrap()
                .is_some()
        );
    }
}
