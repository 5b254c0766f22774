//! Audit ledger repository.
//!
//! Append-only. Every successful state-changing operation appends exactly
//! one entry; nothing is ever mutated or removed. The AUTOINCREMENT
//! sequence is the ordering guarantee — timestamps are informational, so
//! clock skew cannot reorder the compliance view.

use chrono::{DateTime, Utc};

use csl_core::access;
use csl_core::entities::AuditEntry;
use csl_core::enums::{ActorRole, AuditAction};
use csl_core::errors::ReviewError;
use csl_core::identity::Identity;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::service::ReviewService;

impl ReviewService {
    /// Append a ledger entry. Called by every successful mutation.
    ///
    /// Returns the assigned sequence number.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails (storage
    /// unavailability — the only way a ledger write can fail).
    pub(crate) async fn append_audit(
        &self,
        actor_role: ActorRole,
        actor_id: &str,
        action: AuditAction,
        scan_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO audit_log (ts, actor_role, actor_id, action, scan_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    timestamp.to_rfc3339(),
                    actor_role.as_str(),
                    actor_id,
                    action.as_str(),
                    scan_id
                ],
            )
            .await?;
        Ok(self.db().conn().last_insert_rowid())
    }

    /// The ledger for a scan, in exact append order.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Forbidden` unless the caller is an admin.
    pub async fn admin_audit(
        &self,
        identity: &Identity,
        scan_id: &str,
    ) -> Result<Vec<AuditEntry>, ReviewError> {
        access::require_admin(identity)?;
        Ok(self.audit_by_scan(scan_id).await?)
    }

    pub(crate) async fn audit_by_scan(
        &self,
        scan_id: &str,
    ) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT seq, ts, actor_role, actor_id, action, scan_id
                 FROM audit_log WHERE scan_id = ?1 ORDER BY seq",
                [scan_id],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(AuditEntry {
                seq: row.get::<i64>(0)?,
                timestamp: parse_datetime(&row.get::<String>(1)?)?,
                actor_role: parse_enum(&row.get::<String>(2)?)?,
                actor_id: row.get::<String>(3)?,
                action: parse_enum(&row.get::<String>(4)?)?,
                scan_id: row.get::<String>(5)?,
            });
        }
        Ok(entries)
    }
}
