//! One-time-code challenge gating a single video attachment.
//!
//! A [`VerificationGate`] is created per upload flow, passed through it, and
//! discarded when the flow completes or is abandoned. It is never shared
//! between concurrent actions and never persisted.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// How long an issued code stays valid, in seconds.
pub const CODE_EXPIRY_SECONDS: i64 = 5 * 60;

/// How long an issued code stays valid.
pub fn code_expiry() -> Duration {
    Duration::seconds(CODE_EXPIRY_SECONDS)
}

/// A six-digit one-time code.
///
/// Zeroised on drop; the raw digits only leave this type through the opaque
/// delivery channel and the constant-length comparison below.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct OneTimeCode(String);

impl OneTimeCode {
    /// Validate and wrap candidate digits, e.g. user input.
    pub fn new(digits: impl Into<String>) -> Option<Self> {
        let digits = digits.into();
        if digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(digits))
        } else {
            None
        }
    }

    /// The raw digits, for delivery only.
    pub fn digits(&self) -> &str {
        self.0.as_str()
    }

    fn matches(&self, candidate: &Self) -> bool {
        // Same length by construction; compare every byte regardless.
        self.0
            .bytes()
            .zip(candidate.0.bytes())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Source of fresh one-time codes.
pub trait CodeGenerator: Send + Sync {
    /// Draw a new code.
    fn generate(&self) -> OneTimeCode;
}

/// Uniformly random six-digit codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> OneTimeCode {
        let mut rng = SmallRng::from_entropy();
        let value: u32 = rng.gen_range(0..1_000_000);
        OneTimeCode(format!("{value:06}"))
    }
}

/// Failures reported by [`VerificationGate::verify`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The code lapsed; the gate is now terminal and a new one must be
    /// issued.
    #[error("verification code expired; request a new one")]
    Expired,
    /// Wrong digits. The stored code is untouched, so the caller may retry
    /// while the expiry window lasts.
    #[error("verification code does not match")]
    Mismatch,
    /// `verify` was called while no code is outstanding (never issued,
    /// already verified, or already expired). A caller logic error.
    #[error("no verification code is outstanding")]
    NotIssued,
}

/// Failures reported by [`VerificationGate::take_grant`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantError {
    /// The gate has not been verified (or its grant was already taken).
    #[error("verification has not been completed")]
    NotVerified,
}

/// Proof that one verification succeeded. Consuming APIs take this by value,
/// so a single challenge can authorise at most one guarded action.
#[derive(Debug)]
pub struct UploadGrant(());

#[derive(Debug)]
enum GateState {
    Idle,
    Issued {
        code: OneTimeCode,
        issued_at: DateTime<Utc>,
    },
    Verified,
    Expired,
    Spent,
}

impl GateState {
    const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Issued { .. } => "issued",
            Self::Verified => "verified",
            Self::Expired => "expired",
            Self::Spent => "spent",
        }
    }
}

/// Challenge state machine: `Idle -> Issued -> {Verified, Expired}` with a
/// single grant taken from `Verified`.
///
/// Re-issuing while `Issued` replaces the outstanding code; there is never
/// more than one valid code per gate.
#[derive(Debug)]
pub struct VerificationGate {
    state: GateState,
}

impl Default for VerificationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationGate {
    /// A fresh, idle gate.
    pub const fn new() -> Self {
        Self {
            state: GateState::Idle,
        }
    }

    /// Issue a code, invalidating any prior one. Returns a copy of the code
    /// for the delivery channel.
    ///
    /// Issuing after the grant was consumed or after verification is a logic
    /// error: a second guarded action needs a new gate.
    pub fn issue(
        &mut self,
        generator: &dyn CodeGenerator,
        now: DateTime<Utc>,
    ) -> Result<OneTimeCode, GrantError> {
        match self.state {
            GateState::Idle | GateState::Issued { .. } | GateState::Expired => {
                let code = generator.generate();
                self.state = GateState::Issued {
                    code: code.clone(),
                    issued_at: now,
                };
                Ok(code)
            }
            GateState::Verified | GateState::Spent => Err(GrantError::NotVerified),
        }
    }

    /// Check a candidate code against the outstanding one.
    ///
    /// Expiry is evaluated first; past the bound the gate becomes terminal.
    /// A mismatch leaves the stored code in place for a retry.
    pub fn verify(&mut self, candidate: &OneTimeCode, now: DateTime<Utc>) -> Result<(), VerifyError> {
        let GateState::Issued { code, issued_at } = &self.state else {
            return Err(VerifyError::NotIssued);
        };

        if now - *issued_at >= code_expiry() {
            self.state = GateState::Expired;
            return Err(VerifyError::Expired);
        }

        if !code.matches(candidate) {
            return Err(VerifyError::Mismatch);
        }

        self.state = GateState::Verified;
        Ok(())
    }

    /// Consume the single permitted grant.
    pub fn take_grant(&mut self) -> Result<UploadGrant, GrantError> {
        match self.state {
            GateState::Verified => {
                self.state = GateState::Spent;
                Ok(UploadGrant(()))
            }
            _ => Err(GrantError::NotVerified),
        }
    }

    /// Whether a successful verification is waiting to be consumed.
    pub const fn is_verified(&self) -> bool {
        matches!(self.state, GateState::Verified)
    }

    /// Current state name, for logs and tests.
    pub const fn state_label(&self) -> &'static str {
        self.state.label()
    }
}
