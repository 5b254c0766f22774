//! Verdict policy and agreement computation for finalization.
//!
//! The agreement summary is a fixed, deterministic comparison of the three
//! locked reviews. The match verdict is a business rule that sites tune,
//! so it is an injectable trait; [`WeightedMajorityPolicy`] is the default.

use crate::entities::ReviewRecord;
use crate::enums::{Confidence, ConditionTier1, FinalResult};

/// The condition named by at least two of the reviews, with its vote
/// count. `None` when all reviews disagree.
#[must_use]
pub fn majority_condition(reviews: &[ReviewRecord]) -> Option<(ConditionTier1, usize)> {
    let mut counts: Vec<(ConditionTier1, usize)> = Vec::new();
    for review in reviews {
        let Some(condition) = review.condition_tier1 else {
            continue;
        };
        match counts.iter_mut().find(|(c, _)| *c == condition) {
            Some((_, n)) => *n += 1,
            None => counts.push((condition, 1)),
        }
    }
    counts
        .into_iter()
        .filter(|&(_, n)| n >= 2)
        .max_by_key(|&(_, n)| n)
}

/// Deterministic summary of the panel's agreement: the majority label and
/// how many reviewers carried it, or `"No majority"`.
#[must_use]
pub fn agreement_summary(reviews: &[ReviewRecord]) -> String {
    majority_condition(reviews).map_or_else(
        || "No majority".to_string(),
        |(condition, n)| format!("{} ({n}/{} agree)", condition.label(), reviews.len()),
    )
}

/// The business predicate deciding `match` vs `no_match` from the locked
/// panel. Injected into the finalization engine so deployments can swap
/// the rule without touching the quorum machinery.
pub trait VerdictPolicy: Send + Sync {
    fn verdict(&self, reviews: &[ReviewRecord]) -> FinalResult;
}

/// Default verdict: a majority condition exists, it is not `Normal`, and
/// the agreeing reviewers' summed confidence weight strictly exceeds the
/// dissenters'.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMajorityPolicy;

impl VerdictPolicy for WeightedMajorityPolicy {
    fn verdict(&self, reviews: &[ReviewRecord]) -> FinalResult {
        let Some((majority, _)) = majority_condition(reviews) else {
            return FinalResult::NoMatch;
        };
        if majority == ConditionTier1::Normal {
            return FinalResult::NoMatch;
        }

        let mut agree = 0u32;
        let mut dissent = 0u32;
        for review in reviews {
            let weight = review.confidence_level.map_or(0, Confidence::weight);
            if review.condition_tier1 == Some(majority) {
                agree += weight;
            } else {
                dissent += weight;
            }
        }

        if agree > dissent {
            FinalResult::Match
        } else {
            FinalResult::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ReviewStatus;
    use chrono::Utc;

    fn locked(doctor: &str, condition: ConditionTier1, confidence: Confidence) -> ReviewRecord {
        let now = Utc::now();
        ReviewRecord {
            scan_id: "SCN-1".into(),
            doctor_id: doctor.into(),
            status: ReviewStatus::Locked,
            condition_tier1: Some(condition),
            confidence_level: Some(confidence),
            notes: None,
            submitted_at: Some(now),
            locked_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn unanimous_panel_matches() {
        let panel = vec![
            locked("DOCTOR-1", ConditionTier1::AcneVulgaris, Confidence::High),
            locked("DOCTOR-2", ConditionTier1::AcneVulgaris, Confidence::Medium),
            locked("DOCTOR-3", ConditionTier1::AcneVulgaris, Confidence::Low),
        ];
        assert_eq!(
            WeightedMajorityPolicy.verdict(&panel),
            FinalResult::Match
        );
        assert_eq!(agreement_summary(&panel), "Acne Vulgaris (3/3 agree)");
    }

    #[test]
    fn two_to_one_majority_with_enough_weight_matches() {
        let panel = vec![
            locked("DOCTOR-1", ConditionTier1::Rosacea, Confidence::High),
            locked("DOCTOR-2", ConditionTier1::Rosacea, Confidence::Medium),
            locked("DOCTOR-3", ConditionTier1::Eczema, Confidence::High),
        ];
        assert_eq!(
            WeightedMajorityPolicy.verdict(&panel),
            FinalResult::Match
        );
        assert_eq!(agreement_summary(&panel), "Rosacea (2/3 agree)");
    }

    #[test]
    fn low_confidence_majority_loses_to_a_confident_dissenter() {
        // agree weight 1 + 1 = 2, dissent weight 3 — not strictly greater
        let panel = vec![
            locked("DOCTOR-1", ConditionTier1::Psoriasis, Confidence::Low),
            locked("DOCTOR-2", ConditionTier1::Psoriasis, Confidence::Low),
            locked("DOCTOR-3", ConditionTier1::Dermatitis, Confidence::High),
        ];
        assert_eq!(
            WeightedMajorityPolicy.verdict(&panel),
            FinalResult::NoMatch
        );
    }

    #[test]
    fn normal_majority_never_matches() {
        let panel = vec![
            locked("DOCTOR-1", ConditionTier1::Normal, Confidence::High),
            locked("DOCTOR-2", ConditionTier1::Normal, Confidence::High),
            locked("DOCTOR-3", ConditionTier1::AcneVulgaris, Confidence::Low),
        ];
        assert_eq!(
            WeightedMajorityPolicy.verdict(&panel),
            FinalResult::NoMatch
        );
    }

    #[test]
    fn full_disagreement_has_no_majority() {
        let panel = vec![
            locked("DOCTOR-1", ConditionTier1::AcneVulgaris, Confidence::High),
            locked("DOCTOR-2", ConditionTier1::Rosacea, Confidence::High),
            locked("DOCTOR-3", ConditionTier1::Eczema, Confidence::High),
        ];
        assert!(majority_condition(&panel).is_none());
        assert_eq!(agreement_summary(&panel), "No majority");
        assert_eq!(
            WeightedMajorityPolicy.verdict(&panel),
            FinalResult::NoMatch
        );
    }
}
