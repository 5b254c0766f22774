//! # csl-db
//!
//! libSQL state store for Consilium.
//!
//! Holds all mutable shared state: scans, review records, assistive
//! outputs, final aggregates, and the audit ledger. Every read and
//! mutation goes through [`service::ReviewService`], which evaluates the
//! access gate before touching storage.
//!
//! Uses the `libsql` crate with a local database file (`":memory:"` in
//! tests). All statements funnel through one connection, so writes
//! serialize; the transition and finalization writes are additionally
//! guarded (affected-rows checks) so records never take two different
//! terminal states and finalization runs exactly once.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for all Consilium state operations.
pub struct CslDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl CslDb {
    /// Open a local database at the given path (`":memory:"` for tests).
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

        // Must be per-connection in SQLite
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let csl_db = Self { db, conn };
        csl_db.run_migrations().await?;
        Ok(csl_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
