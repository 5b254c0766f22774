//! Assistive output repository.
//!
//! The AI pipeline is external; the store only records its output text,
//! exactly once per scan. Presence is independent of review quorum —
//! exposure is not: the output is only ever served inside the completed
//! admin bundle.

use chrono::Utc;

use csl_core::entities::AssistiveOutput;
use csl_core::enums::{ActorRole, AuditAction};
use csl_core::errors::ReviewError;

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::service::{ReviewService, SYSTEM_ACTOR};

impl ReviewService {
    /// Store the assistive output for a scan and append an `ai_executed`
    /// ledger entry.
    ///
    /// Idempotent: the first write wins, a repeat is a no-op returning
    /// the stored output with no duplicate ledger entry.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` for a scan that was never
    /// ingested, `ReviewError::Unavailable` on storage failure.
    pub async fn record_ai_output(
        &self,
        scan_id: &str,
        output_text: &str,
    ) -> Result<AssistiveOutput, ReviewError> {
        self.require_scan(scan_id).await?;

        let now = Utc::now();
        let changed = self
            .db()
            .conn()
            .execute(
                "INSERT INTO assistive_outputs (scan_id, output_text, executed_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(scan_id) DO NOTHING",
                libsql::params![scan_id, output_text, now.to_rfc3339()],
            )
            .await
            .map_err(DatabaseError::from)?;

        if changed == 0 {
            tracing::debug!(scan_id, "assistive output already recorded");
            return Ok(self
                .find_assistive_output(scan_id)
                .await?
                .ok_or(DatabaseError::NoResult)?);
        }

        self.append_audit(
            ActorRole::System,
            SYSTEM_ACTOR,
            AuditAction::AiExecuted,
            scan_id,
            now,
        )
        .await?;
        tracing::info!(scan_id, "assistive output recorded");

        Ok(AssistiveOutput {
            scan_id: scan_id.to_string(),
            output_text: output_text.to_string(),
            executed_at: now,
        })
    }

    /// Fetch the assistive output if one has been recorded.
    pub(crate) async fn find_assistive_output(
        &self,
        scan_id: &str,
    ) -> Result<Option<AssistiveOutput>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT scan_id, output_text, executed_at
                 FROM assistive_outputs WHERE scan_id = ?1",
                [scan_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(AssistiveOutput {
                scan_id: row.get::<String>(0)?,
                output_text: row.get::<String>(1)?,
                executed_at: parse_datetime(&row.get::<String>(2)?)?,
            })),
            None => Ok(None),
        }
    }
}
