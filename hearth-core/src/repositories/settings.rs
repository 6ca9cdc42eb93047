use async_trait::async_trait;

use crate::{
    Error,
    settings::{HeroSettings, Settings},
};

/// Repository for the singleton configuration documents.
///
/// Both records live under a fixed key; `get_or_create` is the
/// initialization-on-first-access contract, so callers never observe a
/// missing row.
#[async_trait]
pub trait SettingsRepository: Send + Sync + 'static {
    /// Fetch the settings singleton, inserting the defaults on first access
    async fn get_or_create(&self) -> Result<Settings, Error>;

    /// Replace the settings singleton
    async fn update(&self, settings: &Settings) -> Result<Settings, Error>;

    /// Fetch the hero singleton, inserting the defaults on first access
    async fn get_or_create_hero(&self) -> Result<HeroSettings, Error>;

    /// Replace the hero singleton
    async fn update_hero(&self, hero: &HeroSettings) -> Result<HeroSettings, Error>;
}
