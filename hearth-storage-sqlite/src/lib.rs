//! SQLite storage backend for Hearth.
//!
//! Implements every `hearth-core` repository trait on top of a sqlx
//! `SqlitePool`. Timestamps are stored as unix seconds; JSON columns hold
//! the structures SQLite has no natural shape for (dynamic listing
//! attributes, field definitions, statistics snapshots).
//!
//! The entry point is [`SqliteRepositoryProvider`], which owns one
//! repository per domain and implements the unified
//! `RepositoryProvider` trait with migrations and health checks.

pub mod migrations;
pub mod repositories;

pub use repositories::SqliteRepositoryProvider;

use chrono::{DateTime, Utc};
use hearth_core::{
    Error,
    error::StorageError,
};

/// Convert a stored unix timestamp into a `DateTime<Utc>`.
pub(crate) fn datetime_from_timestamp(ts: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| Error::Storage(StorageError::Database(format!("Invalid timestamp: {ts}"))))
}

/// Convert an optional stored unix timestamp into an optional `DateTime<Utc>`.
pub(crate) fn optional_datetime_from_timestamp(
    ts: Option<i64>,
) -> Result<Option<DateTime<Utc>>, Error> {
    ts.map(datetime_from_timestamp).transpose()
}

/// Map a sqlx error to a storage error, logging the original.
pub(crate) fn storage_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| {
        tracing::error!(error = %e, context, "SQLite query failed");
        Error::Storage(StorageError::Database(context.to_string()))
    }
}
