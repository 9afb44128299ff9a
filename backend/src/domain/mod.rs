//! Domain layer: entities, value types, the engagement-core services, and
//! the ports they consume.
//!
//! The components with real invariants live here:
//!
//! - [`clock_policy`] — pure time-of-day window checks.
//! - [`verification`] — the per-flow one-time-code gate.
//! - [`password_reset`] — the once-per-period reset throttle and password
//!   generation.
//! - [`points_service`] — atomic, overdraft-safe points transfers.
//! - [`reconciler`] — background snapshot reconciliation with coalesced
//!   reloads.
//! - [`vote_service`] — idempotent-per-request upvote increments.
//!
//! Everything infrastructure-shaped is reached through [`ports`].

pub mod answer;
pub mod auth;
pub mod board;
pub mod clock_policy;
pub mod error;
pub mod language;
pub mod login_history;
pub mod password_reset;
pub mod points;
pub mod points_service;
pub mod ports;
pub mod question;
pub mod reconciler;
pub mod submission;
pub mod subject_lock;
pub mod user;
pub mod verification;
pub mod vote_service;

pub use self::answer::{Answer, AnswerId, AnswerValidationError};
pub use self::auth::{ContactIdentifier, ContactMethod, CredentialsValidationError, LoginCredentials};
pub use self::board::{
    AnswerWithAuthor, BoardSnapshot, BoardSource, QuestionThread, QuestionWithAuthor,
};
pub use self::clock_policy::{MOBILE_ACCESS_WINDOW, VIDEO_UPLOAD_WINDOW, WindowPolicy};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::language::{ParseLanguageError, PreferredLanguage};
pub use self::login_history::{ClientInfo, DeviceClass, LoginHistoryEntry};
pub use self::password_reset::{
    GeneratedPassword, PasswordResetService, ResetDecision, ResetRateLimiter, ResetRequestError,
    ThrottleUnavailable,
};
pub use self::points::{
    Points, PointsTransfer, TRANSFER_STANDING_MINIMUM, TransferAmount, TransferError, TransferId,
};
pub use self::points_service::{PointsLedger, TransferReceipt};
pub use self::question::{
    Question, QuestionId, QuestionValidationError, VideoReference, VideoUpload,
    VideoValidationError,
};
pub use self::reconciler::{
    BoardReconciler, ReconcilerHandle, ReconcilerStartError, SnapshotReceiver,
};
pub use self::submission::{SubmissionError, SubmissionService, VideoAttachment};
pub use self::subject_lock::SubjectLocks;
pub use self::user::{EmailAddress, PhoneNumber, User, UserId, UserValidationError};
pub use self::verification::{
    CodeGenerator, GrantError, OneTimeCode, RandomCodeGenerator, UploadGrant, VerificationGate,
    VerifyError,
};
pub use self::vote_service::{VoteCounter, VoteError};
