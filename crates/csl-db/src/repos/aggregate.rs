//! Quorum and finalization engine.
//!
//! Runs inline after every lock transition. When the locked count first
//! reaches quorum, the engine computes the agreement summary and the
//! verdict, persists the final aggregate through a compare-and-set, and
//! appends the system-attributed ledger entry. The scan-keyed primary
//! key makes the computation exactly-once even under concurrent
//! finalizing submits.

use chrono::{DateTime, Utc};

use csl_core::access;
use csl_core::entities::{FinalAggregate, QUORUM, ReviewCompletion};
use csl_core::enums::{ActorRole, AuditAction};
use csl_core::errors::ReviewError;
use csl_core::identity::Identity;
use csl_core::policy;
use csl_core::responses::FinalBundle;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::service::{ReviewService, SYSTEM_ACTOR};

impl ReviewService {
    /// The per-scan bundle served to admins.
    ///
    /// Before quorum the bundle carries only the scan and the completion
    /// counter — the in-progress panel, the assistive output, and the
    /// verdict all read as pending.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Forbidden` unless the caller is an admin,
    /// `ReviewError::NotFound` for an unknown scan.
    pub async fn admin_final(
        &self,
        identity: &Identity,
        scan_id: &str,
    ) -> Result<FinalBundle, ReviewError> {
        access::require_admin(identity)?;
        let scan = self.require_scan(scan_id).await?;

        let completion = self.completion(scan_id).await?;
        let is_complete = completion.is_complete();

        let (reviews, ai, final_aggregate) = if is_complete {
            (
                self.locked_reviews(scan_id).await?,
                self.find_assistive_output(scan_id).await?,
                self.find_final(scan_id).await?,
            )
        } else {
            (Vec::new(), None, None)
        };

        Ok(FinalBundle {
            scan,
            reviews,
            ai,
            final_aggregate,
            is_complete,
            review_completion: completion.to_string(),
        })
    }

    /// Progress of a scan's review set toward quorum. The numerator is
    /// the count of locked records and nothing else.
    pub(crate) async fn completion(
        &self,
        scan_id: &str,
    ) -> Result<ReviewCompletion, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM reviews WHERE scan_id = ?1 AND status = 'locked'",
                [scan_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let locked = u32::try_from(row.get::<i64>(0)?)
            .map_err(|e| DatabaseError::Query(format!("locked count: {e}")))?;
        Ok(ReviewCompletion::new(locked))
    }

    /// Fetch the final aggregate if it has been generated.
    pub(crate) async fn find_final(
        &self,
        scan_id: &str,
    ) -> Result<Option<FinalAggregate>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT scan_id, result, agreement_summary, generated_at
                 FROM final_aggregates WHERE scan_id = ?1",
                [scan_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(FinalAggregate {
                scan_id: row.get::<String>(0)?,
                result: parse_enum(&row.get::<String>(1)?)?,
                agreement_summary: row.get::<String>(2)?,
                generated_at: parse_datetime(&row.get::<String>(3)?)?,
            })),
            None => Ok(None),
        }
    }

    /// Recompute quorum after a lock transition and freeze the final
    /// aggregate when the third review has locked.
    ///
    /// Returns the aggregate when this call was the one that generated
    /// it; `None` when quorum is not yet reached or another call already
    /// finalized the scan.
    pub(crate) async fn finalize_if_complete(
        &self,
        scan_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<FinalAggregate>, DatabaseError> {
        let locked = self.locked_reviews(scan_id).await?;
        if locked.len() < QUORUM as usize {
            return Ok(None);
        }

        let panel = &locked[..QUORUM as usize];
        let agreement_summary = policy::agreement_summary(panel);
        let result = self.policy().verdict(panel);

        // Compare-and-set on "final aggregate absent": the first
        // finalizer wins, every later lock is a no-op here.
        let changed = self
            .db()
            .conn()
            .execute(
                "INSERT INTO final_aggregates (scan_id, result, agreement_summary, generated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(scan_id) DO NOTHING",
                libsql::params![
                    scan_id,
                    result.as_str(),
                    agreement_summary.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        if changed == 0 {
            tracing::debug!(scan_id, "final aggregate already generated");
            return Ok(None);
        }

        self.append_audit(
            ActorRole::System,
            SYSTEM_ACTOR,
            AuditAction::FinalResultGenerated,
            scan_id,
            now,
        )
        .await?;
        tracing::info!(scan_id, %result, "final result generated");

        Ok(Some(FinalAggregate {
            scan_id: scan_id.to_string(),
            result,
            agreement_summary,
            generated_at: now,
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use csl_core::entities::{DraftFields, ReviewRecord};
    use csl_core::enums::{AuditAction, Confidence, ConditionTier1, FinalResult, Role};
    use csl_core::errors::ReviewError;
    use csl_core::identity::Identity;
    use csl_core::policy::VerdictPolicy;
    use pretty_assertions::assert_eq;

    use crate::CslDb;
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

    async fn lock_review(
        svc: &ReviewService,
        doctor_id: &str,
        condition: ConditionTier1,
        confidence: Confidence,
    ) {
        let identity = doctor(doctor_id);
        svc.save_draft(
            &identity,
            SCAN,
            DraftFields {
                condition_tier1: Some(condition),
                confidence_level: Some(confidence),
                notes: None,
            },
        )
        .await
        .unwrap();
        svc.submit(&identity, SCAN).await.unwrap();
    }

    #[tokio::test]
    async fn third_lock_completes_the_scan() {
        let svc = service().await;
        lock_review(&svc, "DOCTOR-1", ConditionTier1::AcneVulgaris, Confidence::High).await;
        lock_review(&svc, "DOCTOR-2", ConditionTier1::AcneVulgaris, Confidence::Medium).await;

        let pending = svc.admin_final(&admin(), SCAN).await.unwrap();
        assert!(!pending.is_complete);
        assert_eq!(pending.review_completion, "2/3");

        lock_review(&svc, "DOCTOR-3", ConditionTier1::Rosacea, Confidence::Low).await;

        let bundle = svc.admin_final(&admin(), SCAN).await.unwrap();
        assert!(bundle.is_complete);
        assert_eq!(bundle.review_completion, "3/3");
        assert_eq!(bundle.reviews.len(), 3);

        let aggregate = bundle.final_aggregate.expect("final aggregate generated");
        assert_eq!(aggregate.result, FinalResult::Match);
        assert_eq!(aggregate.agreement_summary, "Acne Vulgaris (2/3 agree)");

        let finals = svc
            .admin_audit(&admin(), SCAN)
            .await
            .unwrap()
            .iter()
            .filter(|e| e.action == AuditAction::FinalResultGenerated)
            .count();
        assert_eq!(finals, 1);
    }

    #[tokio::test]
    async fn finalization_runs_exactly_once() {
        let svc = service().await;
        lock_review(&svc, "DOCTOR-1", ConditionTier1::Eczema, Confidence::High).await;
        lock_review(&svc, "DOCTOR-2", ConditionTier1::Eczema, Confidence::High).await;
        lock_review(&svc, "DOCTOR-3", ConditionTier1::Eczema, Confidence::High).await;

        // The compare-and-set makes a second pass a no-op.
        let again = svc.finalize_if_complete(SCAN, Utc::now()).await.unwrap();
        assert!(again.is_none());

        let finals = svc
            .admin_audit(&admin(), SCAN)
            .await
            .unwrap()
            .iter()
            .filter(|e| e.action == AuditAction::FinalResultGenerated)
            .count();
        assert_eq!(finals, 1);
    }

    #[tokio::test]
    async fn pending_bundle_hides_the_panel() {
        let svc = service().await;
        lock_review(&svc, "DOCTOR-1", ConditionTier1::Psoriasis, Confidence::High).await;
        svc.record_ai_output(SCAN, "possible psoriasis").await.unwrap();

        let bundle = svc.admin_final(&admin(), SCAN).await.unwrap();
        assert!(!bundle.is_complete);
        assert!(bundle.reviews.is_empty());
        assert!(bundle.ai.is_none());
        assert!(bundle.final_aggregate.is_none());
        assert_eq!(bundle.review_completion, "1/3");
    }

    #[tokio::test]
    async fn completed_bundle_includes_the_assistive_output() {
        let svc = service().await;
        svc.record_ai_output(SCAN, "possible acne vulgaris")
            .await
            .unwrap();
        lock_review(&svc, "DOCTOR-1", ConditionTier1::AcneVulgaris, Confidence::High).await;
        lock_review(&svc, "DOCTOR-2", ConditionTier1::AcneVulgaris, Confidence::High).await;
        lock_review(&svc, "DOCTOR-3", ConditionTier1::AcneVulgaris, Confidence::High).await;

        let bundle = svc.admin_final(&admin(), SCAN).await.unwrap();
        assert!(bundle.is_complete);
        assert_eq!(
            bundle.ai.map(|ai| ai.output_text),
            Some("possible acne vulgaris".to_string())
        );
    }

    #[tokio::test]
    async fn admin_final_is_forbidden_for_doctors() {
        let svc = service().await;
        assert!(matches!(
            svc.admin_final(&doctor("DOCTOR-1"), SCAN).await,
            Err(ReviewError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn no_majority_panel_reports_no_match() {
        let svc = service().await;
        lock_review(&svc, "DOCTOR-1", ConditionTier1::AcneVulgaris, Confidence::High).await;
        lock_review(&svc, "DOCTOR-2", ConditionTier1::Rosacea, Confidence::High).await;
        lock_review(&svc, "DOCTOR-3", ConditionTier1::Eczema, Confidence::High).await;

        let bundle = svc.admin_final(&admin(), SCAN).await.unwrap();
        let aggregate = bundle.final_aggregate.unwrap();
        assert_eq!(aggregate.result, FinalResult::NoMatch);
        assert_eq!(aggregate.agreement_summary, "No majority");
    }

    #[tokio::test]
    async fn verdict_comes_from_the_injected_policy() {
        struct AlwaysMatch;
        impl VerdictPolicy for AlwaysMatch {
            fn verdict(&self, _reviews: &[ReviewRecord]) -> FinalResult {
                FinalResult::Match
            }
        }

        let db = CslDb::open_local(":memory:").await.unwrap();
        let svc = ReviewService::with_policy(db, Box::new(AlwaysMatch));
        svc.ingest_scan(SCAN, "USR-1", None).await.unwrap();

        // A panel the default policy would reject
        lock_review(&svc, "DOCTOR-1", ConditionTier1::Normal, Confidence::High).await;
        lock_review(&svc, "DOCTOR-2", ConditionTier1::Normal, Confidence::High).await;
        lock_review(&svc, "DOCTOR-3", ConditionTier1::Normal, Confidence::High).await;

        let bundle = svc.admin_final(&admin(), SCAN).await.unwrap();
        assert_eq!(bundle.final_aggregate.unwrap().result, FinalResult::Match);
    }
}
