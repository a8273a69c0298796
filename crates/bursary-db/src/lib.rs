//! # bursary-db
//!
//! libSQL persistence and the entity-mutation pipeline for Bursary.
//!
//! Holds the relational state (stipends, tags, organizations, users, bots and
//! their associations), the append-only audit log, and notifications. The
//! [`orchestrator`] runs validate → persist → audit → notify for every
//! administrative mutation and returns an outcome report for the resolver.

pub mod error;
pub mod helpers;
mod migrations;
pub mod orchestrator;
pub mod repos;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for all Bursary state.
pub struct BursaryDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl BursaryDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let bursary_db = Self { db, conn };
        bursary_db.run_migrations().await?;
        Ok(bursary_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
