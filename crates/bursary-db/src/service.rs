//! Service layer owning the database, clock, and pipeline settings.
//!
//! `BursaryService` wraps `BursaryDb` (raw database access) together with the
//! time source and the validator settings. The audit recorder, notifier, and
//! orchestrator are implemented as `impl BursaryService` blocks.

use std::sync::Arc;

use chrono_tz::Tz;

use bursary_config::{BursaryConfig, GeneralConfig};
use bursary_core::clock::{Clock, SystemClock};
use bursary_core::response::MessageTable;
use bursary_core::validation::{DateBounds, ValidationContext};

use crate::BursaryDb;
use crate::error::DatabaseError;
use crate::store::EntityStore;

/// Validator and pipeline knobs resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub default_timezone: Tz,
    pub bounds: DateBounds,
    /// Record rejected submissions as `validation_error` audit entries.
    pub audit_validation_failures: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_timezone: Tz::UTC,
            bounds: DateBounds::default(),
            audit_validation_failures: false,
        }
    }
}

impl PipelineSettings {
    /// # Errors
    ///
    /// Returns `DatabaseError::Config` if the configured timezone is unknown.
    pub fn from_config(general: &GeneralConfig) -> Result<Self, DatabaseError> {
        Ok(Self {
            default_timezone: general.timezone()?,
            bounds: DateBounds {
                horizon_years: general.deadline_horizon_years,
            },
            audit_validation_failures: general.audit_validation_failures,
        })
    }
}

/// Runs entity mutations with audit and notification side effects.
///
/// Every mutation goes through [`BursaryService::execute`]:
/// 1. Validate the payload
/// 2. Fetch the before-state (update/delete)
/// 3. Begin transaction, write, commit
/// 4. Append the audit record
/// 5. Emit the notification
pub struct BursaryService {
    db: BursaryDb,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
    messages: MessageTable,
    /// Serializes mutations; the connection is shared and transactions must not interleave.
    pub(crate) mutation_gate: tokio::sync::Mutex<()>,
}

impl BursaryService {
    /// Wrap an open database.
    #[must_use]
    pub fn from_db(db: BursaryDb, clock: Arc<dyn Clock>, settings: PipelineSettings) -> Self {
        Self {
            db,
            clock,
            settings,
            messages: MessageTable::build(),
            mutation_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Open (or create) a local database and wrap it with the system clock.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or migrated.
    pub async fn new_local(path: &str, settings: PipelineSettings) -> Result<Self, DatabaseError> {
        let db = BursaryDb::open_local(path).await?;
        Ok(Self::from_db(db, Arc::new(SystemClock), settings))
    }

    /// Build the service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on invalid settings or if the database cannot be opened.
    pub async fn from_config(config: &BursaryConfig) -> Result<Self, DatabaseError> {
        let settings = PipelineSettings::from_config(&config.general)?;
        Self::new_local(&config.database.path, settings).await
    }

    /// Re-run the idempotent schema setup. Safe on an already initialized store.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` if a statement fails.
    pub async fn init(&self) -> Result<(), DatabaseError> {
        self.db.run_migrations().await
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &BursaryDb {
        &self.db
    }

    /// Entity store over the service connection (outside any transaction).
    #[must_use]
    pub const fn store(&self) -> EntityStore<'_> {
        EntityStore::new(self.db.conn())
    }

    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    #[must_use]
    pub const fn messages(&self) -> &MessageTable {
        &self.messages
    }

    /// Current instant from the injected clock.
    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Validator environment for a request handled at `now`.
    #[must_use]
    pub const fn validation_context(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> ValidationContext {
        ValidationContext {
            now,
            tz: self.settings.default_timezone,
            bounds: self.settings.bounds,
        }
    }
}
