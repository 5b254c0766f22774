//! Scan repository.
//!
//! Scans arrive from the external ingestion system and are immutable
//! afterwards; the store only ever references them. Ingestion is
//! idempotent on `scan_id`.

use chrono::Utc;

use csl_core::access;
use csl_core::entities::{ReviewCompletion, Scan};
use csl_core::enums::{ActorRole, AuditAction};
use csl_core::errors::ReviewError;
use csl_core::identity::Identity;
use csl_core::responses::ScanSummary;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::service::{ReviewService, SYSTEM_ACTOR};

const SCAN_COLUMNS: &str = "scan_id, source_user_id, image_ref, created_at";

fn row_to_scan(row: &libsql::Row) -> Result<Scan, DatabaseError> {
    Ok(Scan {
        scan_id: row.get::<String>(0)?,
        source_user_id: row.get::<String>(1)?,
        image_ref: get_opt_string(row, 2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

impl ReviewService {
    /// Record a scan handed over by the external ingestion system and
    /// append a `scan_ingested` ledger entry.
    ///
    /// Idempotent: re-ingesting a known `scan_id` is a no-op returning
    /// the stored scan, with no duplicate ledger entry.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Unavailable` on storage failure.
    pub async fn ingest_scan(
        &self,
        scan_id: &str,
        source_user_id: &str,
        image_ref: Option<&str>,
    ) -> Result<Scan, ReviewError> {
        let now = Utc::now();
        let changed = self
            .db()
            .conn()
            .execute(
                "INSERT INTO scans (scan_id, source_user_id, image_ref, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(scan_id) DO NOTHING",
                libsql::params![scan_id, source_user_id, image_ref, now.to_rfc3339()],
            )
            .await
            .map_err(DatabaseError::from)?;

        if changed == 0 {
            tracing::debug!(scan_id, "scan already ingested");
            return self.require_scan(scan_id).await;
        }

        self.append_audit(
            ActorRole::System,
            SYSTEM_ACTOR,
            AuditAction::ScanIngested,
            scan_id,
            now,
        )
        .await?;
        tracing::info!(scan_id, source_user_id, "scan ingested");

        Ok(Scan {
            scan_id: scan_id.to_string(),
            source_user_id: source_user_id.to_string(),
            image_ref: image_ref.map(String::from),
            created_at: now,
        })
    }

    /// Read a scan. Both roles are authorized: doctors load the scan they
    /// are assessing, admins load it for the summary views.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` for an unknown scan.
    pub async fn get_scan(&self, identity: &Identity, scan_id: &str) -> Result<Scan, ReviewError> {
        tracing::debug!(user_id = %identity.user_id, scan_id, "scan read");
        self.require_scan(scan_id).await
    }

    /// Admin scan list with per-scan quorum progress.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Forbidden` unless the caller is an admin.
    pub async fn admin_scans(&self, identity: &Identity) -> Result<Vec<ScanSummary>, ReviewError> {
        access::require_admin(identity)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT s.scan_id, s.source_user_id, s.image_ref, s.created_at,
                        COUNT(r.doctor_id) AS locked
                 FROM scans s
                 LEFT JOIN reviews r ON r.scan_id = s.scan_id AND r.status = 'locked'
                 GROUP BY s.scan_id, s.source_user_id, s.image_ref, s.created_at
                 ORDER BY s.created_at, s.scan_id",
                (),
            )
            .await
            .map_err(DatabaseError::from)?;

        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await.map_err(DatabaseError::from)? {
            let scan = row_to_scan(&row)?;
            let locked = u32::try_from(row.get::<i64>(4).map_err(DatabaseError::from)?)
                .map_err(|e| DatabaseError::Query(format!("locked count: {e}")))?;
            let completion = ReviewCompletion::new(locked);
            summaries.push(ScanSummary {
                scan,
                review_completion: completion.to_string(),
                is_complete: completion.is_complete(),
            });
        }

        Ok(summaries)
    }

    /// Fetch a scan row if present.
    pub(crate) async fn fetch_scan(&self, scan_id: &str) -> Result<Option<Scan>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SCAN_COLUMNS} FROM scans WHERE scan_id = ?1"),
                [scan_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_scan(&row)?)),
            None => Ok(None),
        }
    }

    /// Fetch a scan or fail with `NotFound`.
    pub(crate) async fn require_scan(&self, scan_id: &str) -> Result<Scan, ReviewError> {
        self.fetch_scan(scan_id)
            .await?
            .ok_or_else(|| ReviewError::NotFound {
                entity: "scan",
                id: scan_id.to_string(),
            })
    }
}
