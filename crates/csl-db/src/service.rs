//! Service facade orchestrating storage, the access gate, and the
//! finalization engine.
//!
//! `ReviewService` wraps [`CslDb`] and the injected verdict policy. All
//! repo methods are implemented as `impl ReviewService` blocks in
//! `repos/`. Every public operation follows the same protocol:
//!
//! 1. Evaluate the access gate for the supplied identity
//! 2. Execute the guarded SQL read/write
//! 3. Append the audit entry for successful mutations
//! 4. For lock transitions, run the quorum check inline

use csl_core::policy::{VerdictPolicy, WeightedMajorityPolicy};

use crate::CslDb;
use crate::error::DatabaseError;

/// Actor id recorded on system-attributed audit entries (ingestion, AI
/// execution, finalization).
pub(crate) const SYSTEM_ACTOR: &str = "system";

/// Orchestrates review lifecycle mutations with auditing and
/// finalization.
pub struct ReviewService {
    db: CslDb,
    policy: Box<dyn VerdictPolicy>,
}

impl ReviewService {
    /// Open a service over a local database with the default verdict
    /// policy.
    ///
    /// # Arguments
    ///
    /// * `db_path` — Path to the libSQL database file, or `":memory:"`
    ///   for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        Ok(Self::from_db(CslDb::open_local(db_path).await?))
    }

    /// Create from an existing database handle with the default policy.
    #[must_use]
    pub fn from_db(db: CslDb) -> Self {
        Self {
            db,
            policy: Box::new(WeightedMajorityPolicy),
        }
    }

    /// Create with a custom verdict policy. The match predicate is a
    /// deployment decision, so it is injected rather than fixed here.
    #[must_use]
    pub fn with_policy(db: CslDb, policy: Box<dyn VerdictPolicy>) -> Self {
        Self { db, policy }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &CslDb {
        &self.db
    }

    pub(crate) fn policy(&self) -> &dyn VerdictPolicy {
        &*self.policy
    }
}
