//! Shared HTTP adapter state.
//!
//! Handlers depend on domain services and ports through this bundle; the
//! server wiring decides which adapters back them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{
    DeliveryChannel, LoginHistoryRepository, LoginService, UserRepository,
};
use crate::domain::{
    CodeGenerator, OneTimeCode, PasswordResetService, PointsLedger, SnapshotReceiver,
    SubmissionService, UploadGrant, UserId, VerificationGate, VerifyError, VoteCounter,
};

/// At most one pending verification gate per user.
///
/// The gate itself is a per-flow value; this registry is only the place a
/// stateless HTTP flow parks it between the issue, verify, and submit
/// requests. Taking the grant (or abandoning the flow) removes the entry,
/// so a second guarded action always starts from a fresh challenge.
#[derive(Default)]
pub struct VerificationRegistry {
    gates: Mutex<HashMap<Uuid, VerificationGate>>,
}

impl VerificationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue (or re-issue) a code for the user's pending flow.
    pub fn issue(
        &self,
        user: &UserId,
        generator: &dyn CodeGenerator,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Option<OneTimeCode> {
        let mut gates = self
            .gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let gate = gates.entry(*user.as_uuid()).or_default();
        match gate.issue(generator, now) {
            Ok(code) => Some(code),
            Err(_) => {
                // A spent or verified gate cannot be re-armed; replace it.
                let mut fresh = VerificationGate::new();
                let code = fresh.issue(generator, now).ok();
                gates.insert(*user.as_uuid(), fresh);
                code
            }
        }
    }

    /// Verify a candidate code for the user's pending flow.
    pub fn verify(
        &self,
        user: &UserId,
        candidate: &OneTimeCode,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), VerifyError> {
        let mut gates = self
            .gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(gate) = gates.get_mut(user.as_uuid()) else {
            return Err(VerifyError::NotIssued);
        };
        let result = gate.verify(candidate, now);
        if result == Err(VerifyError::Expired) {
            // Terminal; drop the gate so the next issue starts clean.
            gates.remove(user.as_uuid());
        }
        result
    }

    /// Take the user's single-use grant, discarding the gate.
    pub fn take_grant(&self, user: &UserId) -> Option<UploadGrant> {
        let mut gates = self
            .gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut gate = gates.remove(user.as_uuid())?;
        match gate.take_grant() {
            Ok(grant) => Some(grant),
            Err(_) => None,
        }
    }

    /// Drop any pending gate for the user (flow abandoned).
    pub fn discard(&self, user: &UserId) {
        self.gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(user.as_uuid());
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Identity provider port.
    pub login: Arc<dyn LoginService>,
    /// User account lookups and profile updates.
    pub users: Arc<dyn UserRepository>,
    /// Sign-in audit trail.
    pub login_history: Arc<dyn LoginHistoryRepository>,
    /// Points transfers.
    pub ledger: Arc<PointsLedger>,
    /// Password-reset requests.
    pub password_reset: Arc<PasswordResetService>,
    /// Question and answer submission.
    pub submissions: Arc<SubmissionService>,
    /// Upvotes.
    pub votes: Arc<VoteCounter>,
    /// Current board snapshot, fed by the reconciler.
    pub board: SnapshotReceiver,
    /// Pending verification gates.
    pub gates: Arc<VerificationRegistry>,
    /// One-time code source.
    pub code_generator: Arc<dyn CodeGenerator>,
    /// Opaque secret delivery.
    pub delivery: Arc<dyn DeliveryChannel>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
}
