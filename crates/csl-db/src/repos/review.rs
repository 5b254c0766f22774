//! Review record repository.
//!
//! One record per `(scan_id, doctor_id)`, created implicitly on first
//! draft save. The state machine is `draft → submitted → locked`;
//! `submitted` is a transient hop and a valid submit advances straight to
//! `locked` without waiting on the other reviewers. Every transition is a
//! guarded write (`WHERE status = 'draft'` plus an affected-rows check)
//! so concurrent calls on the same key can never produce two different
//! terminal states.

use chrono::Utc;

use csl_core::access;
use csl_core::entities::{DraftFields, ReviewRecord};
use csl_core::enums::{ActorRole, AuditAction, Confidence, ConditionTier1, ReviewStatus};
use csl_core::errors::ReviewError;
use csl_core::identity::Identity;

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_string, parse_datetime, parse_enum, parse_optional_datetime, parse_optional_enum,
};
use crate::service::ReviewService;

const REVIEW_COLUMNS: &str = "scan_id, doctor_id, status, condition_tier1, confidence_level, \
                              notes, submitted_at, locked_at, created_at, updated_at";

fn row_to_review(row: &libsql::Row) -> Result<ReviewRecord, DatabaseError> {
    Ok(ReviewRecord {
        scan_id: row.get::<String>(0)?,
        doctor_id: row.get::<String>(1)?,
        status: parse_enum(&row.get::<String>(2)?)?,
        condition_tier1: parse_optional_enum(get_opt_string(row, 3)?.as_deref())?,
        confidence_level: parse_optional_enum(get_opt_string(row, 4)?.as_deref())?,
        notes: get_opt_string(row, 5)?,
        submitted_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
        locked_at: parse_optional_datetime(get_opt_string(row, 7)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl ReviewService {
    /// All review records owned by the calling doctor.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Forbidden` unless the caller is a doctor.
    pub async fn my_reviews(&self, identity: &Identity) -> Result<Vec<ReviewRecord>, ReviewError> {
        access::require_doctor(identity)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews
                     WHERE doctor_id = ?1 ORDER BY created_at, scan_id"
                ),
                [identity.user_id.as_str()],
            )
            .await
            .map_err(DatabaseError::from)?;

        let mut reviews = Vec::new();
        while let Some(row) = rows.next().await.map_err(DatabaseError::from)? {
            reviews.push(row_to_review(&row)?);
        }
        Ok(reviews)
    }

    /// The calling doctor's review of a scan, or the default empty draft
    /// shape if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Forbidden` unless the caller is a doctor.
    pub async fn get_own_review(
        &self,
        identity: &Identity,
        scan_id: &str,
    ) -> Result<ReviewRecord, ReviewError> {
        let doctor_id = identity.user_id.clone();
        self.get_review(identity, scan_id, &doctor_id).await
    }

    /// A review addressed by doctor id. Blinding applies: a doctor may
    /// only name themselves; anyone else gets `Forbidden` regardless of
    /// whether the record exists or the scan is complete.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Forbidden` on a blinding violation.
    pub async fn get_review(
        &self,
        identity: &Identity,
        scan_id: &str,
        doctor_id: &str,
    ) -> Result<ReviewRecord, ReviewError> {
        access::require_review_owner(identity, doctor_id)?;

        match self.find_review(scan_id, doctor_id).await? {
            Some(record) => Ok(record),
            None => Ok(ReviewRecord::empty_draft(
                scan_id.to_string(),
                doctor_id.to_string(),
                Utc::now(),
            )),
        }
    }

    /// Create-or-update the calling doctor's draft.
    ///
    /// If the record has already been submitted it can never be edited
    /// again: the call is a no-op returning the existing record unchanged
    /// (the conflict case, deliberately not surfaced as a failure). A
    /// `draft_saved` ledger entry is appended only on an actual field
    /// change.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Forbidden` unless the caller is a doctor,
    /// `ReviewError::NotFound` for a scan that was never ingested.
    pub async fn save_draft(
        &self,
        identity: &Identity,
        scan_id: &str,
        fields: DraftFields,
    ) -> Result<ReviewRecord, ReviewError> {
        access::require_doctor(identity)?;
        self.require_scan(scan_id).await?;

        let doctor_id = identity.user_id.as_str();
        let now = Utc::now();

        if let Some(existing) = self.find_review(scan_id, doctor_id).await? {
            if !existing.status.is_editable() {
                tracing::debug!(
                    scan_id,
                    doctor_id,
                    status = %existing.status,
                    "draft save on a non-draft record is a no-op"
                );
                return Ok(existing);
            }
            if !existing.differs_from(&fields) {
                tracing::debug!(scan_id, doctor_id, "draft save changed nothing");
                return Ok(existing);
            }
        }

        // Upsert guarded on status so a raced submit can never be
        // overwritten; first saves under the same key collapse onto the
        // primary key instead of creating duplicates.
        let changed = self
            .db()
            .conn()
            .execute(
                "INSERT INTO reviews (scan_id, doctor_id, status, condition_tier1,
                                      confidence_level, notes, created_at, updated_at)
                 VALUES (?1, ?2, 'draft', ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(scan_id, doctor_id) DO UPDATE SET
                     condition_tier1 = excluded.condition_tier1,
                     confidence_level = excluded.confidence_level,
                     notes = excluded.notes,
                     updated_at = excluded.updated_at
                 WHERE reviews.status = 'draft'",
                libsql::params![
                    scan_id,
                    doctor_id,
                    fields.condition_tier1.map(ConditionTier1::as_str),
                    fields.confidence_level.map(Confidence::as_str),
                    fields.notes.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await
            .map_err(DatabaseError::from)?;

        if changed == 0 {
            // Lost the race against this doctor's own submit; the record
            // is immutable now.
            return Ok(self
                .find_review(scan_id, doctor_id)
                .await?
                .ok_or(DatabaseError::NoResult)?);
        }

        self.append_audit(
            ActorRole::Doctor,
            doctor_id,
            AuditAction::DraftSaved,
            scan_id,
            now,
        )
        .await?;
        tracing::debug!(scan_id, doctor_id, "draft saved");

        Ok(self
            .find_review(scan_id, doctor_id)
            .await?
            .ok_or(DatabaseError::NoResult)?)
    }

    /// Submit the calling doctor's review.
    ///
    /// Requires a draft with both required fields populated. On success
    /// the record passes through `submitted` and lands `locked` in the
    /// same transition — locking never waits on the other doctors — and
    /// the quorum check runs inline before the call returns. Submitting
    /// an already-final record is an idempotent no-op returning it.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Validation` naming the missing field(s),
    /// `ReviewError::Forbidden` unless the caller is a doctor,
    /// `ReviewError::NotFound` for a scan that was never ingested.
    pub async fn submit(
        &self,
        identity: &Identity,
        scan_id: &str,
    ) -> Result<ReviewRecord, ReviewError> {
        access::require_doctor(identity)?;
        self.require_scan(scan_id).await?;

        let doctor_id = identity.user_id.as_str();
        let now = Utc::now();

        let current = match self.find_review(scan_id, doctor_id).await? {
            Some(record) => record,
            None => ReviewRecord::empty_draft(scan_id.to_string(), doctor_id.to_string(), now),
        };

        if !current.status.can_transition_to(ReviewStatus::Submitted) {
            tracing::debug!(
                scan_id,
                doctor_id,
                status = %current.status,
                "submit on a final record is a no-op"
            );
            return Ok(current);
        }

        let missing = current.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(
                scan_id,
                doctor_id,
                fields = ?missing,
                "submit rejected: required fields missing"
            );
            return Err(ReviewError::missing(&missing));
        }

        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE reviews SET status = 'locked', submitted_at = ?1,
                                    locked_at = ?1, updated_at = ?1
                 WHERE scan_id = ?2 AND doctor_id = ?3 AND status = 'draft'",
                libsql::params![now.to_rfc3339(), scan_id, doctor_id],
            )
            .await
            .map_err(DatabaseError::from)?;

        if changed == 0 {
            // A concurrent submit on the same key won; return its result.
            return Ok(self
                .find_review(scan_id, doctor_id)
                .await?
                .ok_or(DatabaseError::NoResult)?);
        }

        self.append_audit(
            ActorRole::Doctor,
            doctor_id,
            AuditAction::ReviewSubmitted,
            scan_id,
            now,
        )
        .await?;
        tracing::info!(scan_id, doctor_id, "review locked");

        self.finalize_if_complete(scan_id, now).await?;

        Ok(self
            .find_review(scan_id, doctor_id)
            .await?
            .ok_or(DatabaseError::NoResult)?)
    }

    /// Fetch a review row if present.
    pub(crate) async fn find_review(
        &self,
        scan_id: &str,
        doctor_id: &str,
    ) -> Result<Option<ReviewRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews
                     WHERE scan_id = ?1 AND doctor_id = ?2"
                ),
                libsql::params![scan_id, doctor_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_review(&row)?)),
            None => Ok(None),
        }
    }

    /// All locked reviews for a scan, in lock order.
    pub(crate) async fn locked_reviews(
        &self,
        scan_id: &str,
    ) -> Result<Vec<ReviewRecord>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews
                     WHERE scan_id = ?1 AND status = 'locked'
                     ORDER BY locked_at, doctor_id"
                ),
                [scan_id],
            )
            .await?;

        let mut reviews = Vec::new();
        while let Some(row) = rows.next().await? {
            reviews.push(row_to_review(&row)?);
        }
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use csl_core::entities::DraftFields;
    use csl_core::enums::{AuditAction, Confidence, ConditionTier1, ReviewStatus, Role};
    use csl_core::errors::ReviewError;
    use csl_core::identity::Identity;
    use pretty_assertions::assert_eq;

    use crate::service::ReviewService;

    const SCAN: &str = "SCN-2024-001";

    async fn service() -> ReviewService {
        let svc = ReviewService::new_local(":memory:").await.unwrap();
        svc.ingest_scan(SCAN, "USR-1", None).await.unwrap();
        svc
    }

    fn doctor(id: &str) -> Identity {
        Identity::new(id.into(), Role::Doctor)
    }

    fn admin() -> Identity {
        Identity::new("ADMIN-1".into(), Role::Admin)
    }

    fn acne_high() -> DraftFields {
        DraftFields {
            condition_tier1: Some(ConditionTier1::AcneVulgaris),
            confidence_level: Some(Confidence::High),
            notes: None,
        }
    }

    async fn audit_count(svc: &ReviewService, action: AuditAction) -> usize {
        svc.admin_audit(&admin(), SCAN)
            .await
            .unwrap()
            .iter()
            .filter(|e| e.action == action)
            .count()
    }

    #[tokio::test]
    async fn first_save_creates_a_draft() {
        let svc = service().await;
        let record = svc
            .save_draft(&doctor("DOCTOR-1"), SCAN, acne_high())
            .await
            .unwrap();
        assert_eq!(record.status, ReviewStatus::Draft);
        assert_eq!(record.condition_tier1, Some(ConditionTier1::AcneVulgaris));
        assert_eq!(record.confidence_level, Some(Confidence::High));
        assert!(record.submitted_at.is_none());
        assert_eq!(audit_count(&svc, AuditAction::DraftSaved).await, 1);
    }

    #[tokio::test]
    async fn draft_save_is_forbidden_for_admins() {
        let svc = service().await;
        assert!(matches!(
            svc.save_draft(&admin(), SCAN, acne_high()).await,
            Err(ReviewError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn draft_save_against_unknown_scan_is_not_found() {
        let svc = service().await;
        assert!(matches!(
            svc.save_draft(&doctor("DOCTOR-1"), "SCN-ghost", acne_high())
                .await,
            Err(ReviewError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn unchanged_draft_save_appends_no_audit() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        svc.save_draft(&d1, SCAN, acne_high()).await.unwrap();
        svc.save_draft(&d1, SCAN, acne_high()).await.unwrap();
        assert_eq!(audit_count(&svc, AuditAction::DraftSaved).await, 1);
    }

    #[tokio::test]
    async fn empty_submit_names_both_missing_fields() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        svc.save_draft(&d1, SCAN, DraftFields::default())
            .await
            .unwrap();

        let err = svc.submit(&d1, SCAN).await.unwrap_err();
        match err {
            ReviewError::Validation { fields } => {
                assert_eq!(fields, vec!["condition_tier1", "confidence_level"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_without_any_draft_fails_validation() {
        let svc = service().await;
        assert!(matches!(
            svc.submit(&doctor("DOCTOR-1"), SCAN).await,
            Err(ReviewError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn partial_draft_names_only_the_missing_field() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        svc.save_draft(
            &d1,
            SCAN,
            DraftFields {
                condition_tier1: Some(ConditionTier1::Rosacea),
                confidence_level: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        let err = svc.submit(&d1, SCAN).await.unwrap_err();
        match err {
            ReviewError::Validation { fields } => {
                assert_eq!(fields, vec!["confidence_level"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_submit_locks_immediately() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        svc.save_draft(&d1, SCAN, acne_high()).await.unwrap();

        let record = svc.submit(&d1, SCAN).await.unwrap();
        assert_eq!(record.status, ReviewStatus::Locked);
        assert!(record.submitted_at.is_some());
        assert!(record.locked_at.is_some());

        let bundle = svc.admin_final(&admin(), SCAN).await.unwrap();
        assert_eq!(bundle.review_completion, "1/3");
        assert!(!bundle.is_complete);
    }

    #[tokio::test]
    async fn repeated_submit_is_an_idempotent_noop() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        svc.save_draft(&d1, SCAN, acne_high()).await.unwrap();
        let first = svc.submit(&d1, SCAN).await.unwrap();
        let second = svc.submit(&d1, SCAN).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(audit_count(&svc, AuditAction::ReviewSubmitted).await, 1);
    }

    #[tokio::test]
    async fn locked_record_ignores_further_draft_saves() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        svc.save_draft(&d1, SCAN, acne_high()).await.unwrap();
        let locked = svc.submit(&d1, SCAN).await.unwrap();
        let audits_before = audit_count(&svc, AuditAction::DraftSaved).await;

        let after = svc
            .save_draft(
                &d1,
                SCAN,
                DraftFields {
                    condition_tier1: Some(ConditionTier1::Normal),
                    confidence_level: Some(Confidence::Low),
                    notes: Some("changed my mind".into()),
                },
            )
            .await
            .unwrap();

        // Unchanged record, no new ledger entry
        assert_eq!(after, locked);
        assert_eq!(audit_count(&svc, AuditAction::DraftSaved).await, audits_before);
    }

    #[tokio::test]
    async fn locked_fields_are_stable_across_reads() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        svc.save_draft(&d1, SCAN, acne_high()).await.unwrap();
        svc.submit(&d1, SCAN).await.unwrap();

        let first = svc.get_own_review(&d1, SCAN).await.unwrap();
        let second = svc.get_own_review(&d1, SCAN).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.condition_tier1, Some(ConditionTier1::AcneVulgaris));
        assert_eq!(first.confidence_level, Some(Confidence::High));
    }

    #[tokio::test]
    async fn get_own_review_defaults_to_an_empty_draft() {
        let svc = service().await;
        let record = svc
            .get_own_review(&doctor("DOCTOR-1"), SCAN)
            .await
            .unwrap();
        assert_eq!(record.status, ReviewStatus::Draft);
        assert!(record.condition_tier1.is_none());
        assert!(record.confidence_level.is_none());
    }

    #[tokio::test]
    async fn doctors_cannot_read_each_others_reviews() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        svc.save_draft(&d1, SCAN, acne_high()).await.unwrap();
        svc.submit(&d1, SCAN).await.unwrap();

        assert!(matches!(
            svc.get_review(&doctor("DOCTOR-2"), SCAN, "DOCTOR-1").await,
            Err(ReviewError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn my_reviews_lists_only_the_callers_records() {
        let svc = service().await;
        let d1 = doctor("DOCTOR-1");
        let d2 = doctor("DOCTOR-2");
        svc.save_draft(&d1, SCAN, acne_high()).await.unwrap();
        svc.save_draft(&d2, SCAN, acne_high()).await.unwrap();

        let mine = svc.my_reviews(&d1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].doctor_id, "DOCTOR-1");

        assert!(matches!(
            svc.my_reviews(&admin()).await,
            Err(ReviewError::Forbidden)
        ));
    }
}
