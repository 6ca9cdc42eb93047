//! Settings service.
//!
//! Thin wrapper over the singleton configuration rows; the interesting
//! part, the get-or-create contract, lives in the repository so both
//! singletons initialize on first access.

use std::sync::Arc;

use crate::{
    Error,
    error::ValidationError,
    repositories::SettingsRepository,
    settings::{HeroSettings, Settings},
};

/// Service for the global configuration singletons.
pub struct SettingsService<R: SettingsRepository> {
    repository: Arc<R>,
}

impl<R: SettingsRepository> SettingsService<R> {
    /// Create a new SettingsService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Fetch the settings singleton, creating it with defaults on first access
    pub async fn get(&self) -> Result<Settings, Error> {
        self.repository.get_or_create().await
    }

    /// Replace the settings singleton
    pub async fn update(&self, settings: &Settings) -> Result<Settings, Error> {
        if settings.security.max_login_attempts == 0 {
            return Err(ValidationError::InvalidField(
                "max_login_attempts must be at least 1".to_string(),
            )
            .into());
        }
        if settings.security.lockout_duration_minutes == 0 {
            return Err(ValidationError::InvalidField(
                "lockout_duration_minutes must be at least 1".to_string(),
            )
            .into());
        }
        self.repository.update(settings).await
    }

    /// Fetch the hero singleton, creating it with defaults on first access
    pub async fn get_hero(&self) -> Result<HeroSettings, Error> {
        self.repository.get_or_create_hero().await
    }

    /// Replace the hero singleton
    pub async fn update_hero(&self, hero: &HeroSettings) -> Result<HeroSettings, Error> {
        if hero.headline.trim().is_empty() {
            return Err(
                ValidationError::MissingField("Hero headline is required".to_string()).into(),
            );
        }
        self.repository.update_hero(hero).await
    }
}
