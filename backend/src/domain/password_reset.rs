//! Password-reset requests: the once-per-day throttle and the generated
//! replacement password.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use mockable::Clock;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::auth::ContactIdentifier;
use crate::domain::ports::{
    DeliveryChannel, ResetThrottleRepository, ResetThrottleRepositoryError, ResetThrottleState,
    UserRepository,
};
use crate::domain::subject_lock::SubjectLocks;
use crate::domain::user::{User, UserId};

/// Rolling window within which the allowance applies.
pub const RESET_PERIOD_HOURS: i64 = 24;

/// Resets permitted per subject per period.
pub const RESET_LIMIT: u32 = 1;

/// Length of a generated replacement password.
pub const GENERATED_PASSWORD_LENGTH: usize = 12;

fn reset_period() -> Duration {
    Duration::hours(RESET_PERIOD_HOURS)
}

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// A freshly generated replacement password.
///
/// Letters only (no digits or specials), first character uppercase, second
/// lowercase. Zeroised on drop.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct GeneratedPassword(String);

impl GeneratedPassword {
    /// Draw a new password.
    pub fn generate() -> Self {
        let mut rng = SmallRng::from_entropy();
        let mut password = String::with_capacity(GENERATED_PASSWORD_LENGTH);
        password.push(char::from(UPPER[rng.gen_range(0..UPPER.len())]));
        password.push(char::from(LOWER[rng.gen_range(0..LOWER.len())]));
        while password.len() < GENERATED_PASSWORD_LENGTH {
            let pool = if rng.r#gen::<bool>() { UPPER } else { LOWER };
            password.push(char::from(pool[rng.gen_range(0..pool.len())]));
        }
        Self(password)
    }

    /// Expose the secret for delivery and for the caller's one-time display.
    pub fn reveal(&self) -> &str {
        self.0.as_str()
    }
}

/// Outcome of one throttle consumption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDecision {
    /// The allowance was available and has now been consumed.
    Allowed,
    /// The allowance is exhausted for the current period.
    Denied {
        /// Remaining wait until the period rolls over.
        retry_after: StdDuration,
    },
}

/// Failure of the throttle itself, as opposed to a denial.
///
/// Must be treated by callers as "blocked, retry later" — never as an
/// implicit allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("reset throttle store unavailable: {message}")]
pub struct ThrottleUnavailable {
    /// Adapter-provided context.
    pub message: String,
}

/// Enforces "at most [`RESET_LIMIT`] password resets per rolling
/// [`RESET_PERIOD_HOURS`]-hour period" per subject.
///
/// The read-check-write sequence runs under the subject's keyed lock, so two
/// simultaneous attempts cannot both observe a spendable counter.
pub struct ResetRateLimiter {
    repo: Arc<dyn ResetThrottleRepository>,
    locks: SubjectLocks,
    clock: Arc<dyn Clock>,
}

impl ResetRateLimiter {
    /// Build a limiter over the given throttle store.
    pub fn new(repo: Arc<dyn ResetThrottleRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            locks: SubjectLocks::new(),
            clock,
        }
    }

    /// Try to consume the subject's allowance.
    ///
    /// A subject whose last reset lies a full period in the past (or who
    /// never reset) is re-armed to a fresh counter before evaluation, so
    /// long-idle subjects are never denied on stale state.
    pub async fn try_consume(
        &self,
        subject: &UserId,
    ) -> Result<ResetDecision, ThrottleUnavailable> {
        let _guard = self.locks.acquire(subject).await;
        let now = self.clock.utc();

        let loaded = self.repo.load(subject).await.map_err(map_store_error)?;
        let mut state = if loaded
            .last_reset
            .is_none_or(|last| now - last >= reset_period())
        {
            ResetThrottleState {
                count: 0,
                last_reset: Some(now),
            }
        } else {
            loaded
        };

        if state.count < RESET_LIMIT {
            state.count += 1;
            state.last_reset = Some(now);
            self.repo
                .store(subject, state)
                .await
                .map_err(map_store_error)?;
            return Ok(ResetDecision::Allowed);
        }

        let period_start = state.last_reset.unwrap_or(now);
        let retry_after = (period_start + reset_period() - now)
            .to_std()
            .unwrap_or_default();
        Ok(ResetDecision::Denied { retry_after })
    }
}

fn map_store_error(error: ResetThrottleRepositoryError) -> ThrottleUnavailable {
    ThrottleUnavailable {
        message: error.to_string(),
    }
}

/// Failures of the whole reset request flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResetRequestError {
    /// No account matches the submitted contact.
    #[error("no account matches that contact")]
    UserNotFound,
    /// The once-per-period allowance is spent.
    #[error("you can only request a password reset once per day")]
    RateLimited {
        /// Remaining wait until the period rolls over.
        retry_after: StdDuration,
    },
    /// The store could not be consulted. Blocks the reset; retryable.
    #[error("reset store unavailable: {message}")]
    StoreUnavailable {
        /// Adapter-provided context.
        message: String,
    },
}

/// Orchestrates a password-reset request end to end: resolve the account,
/// consume the throttle, generate the replacement password, hand it to the
/// opaque delivery channel.
pub struct PasswordResetService {
    users: Arc<dyn UserRepository>,
    limiter: ResetRateLimiter,
    delivery: Arc<dyn DeliveryChannel>,
}

impl PasswordResetService {
    /// Build the service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        limiter: ResetRateLimiter,
        delivery: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            users,
            limiter,
            delivery,
        }
    }

    /// Handle one reset request.
    ///
    /// The generated password is returned so the boundary can display it,
    /// exactly once, to the requester.
    pub async fn request(
        &self,
        contact: &ContactIdentifier,
    ) -> Result<GeneratedPassword, ResetRequestError> {
        let user = self.resolve(contact).await?;

        match self.limiter.try_consume(&user.id).await {
            Ok(ResetDecision::Allowed) => {}
            Ok(ResetDecision::Denied { retry_after }) => {
                info!(user = %user.id, "password reset denied by throttle");
                return Err(ResetRequestError::RateLimited { retry_after });
            }
            Err(ThrottleUnavailable { message }) => {
                warn!(user = %user.id, %message, "password reset blocked: throttle store unavailable");
                return Err(ResetRequestError::StoreUnavailable { message });
            }
        }

        let password = GeneratedPassword::generate();
        self.delivery.deliver_password(&user.id, &password).await;
        info!(user = %user.id, "password reset granted");
        Ok(password)
    }

    async fn resolve(&self, contact: &ContactIdentifier) -> Result<User, ResetRequestError> {
        let found = match contact {
            ContactIdentifier::Email(email) => self.users.find_by_email(email).await,
            ContactIdentifier::Phone(phone) => self.users.find_by_phone(phone).await,
        }
        .map_err(|err| ResetRequestError::StoreUnavailable {
            message: err.to_string(),
        })?;
        found.ok_or(ResetRequestError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::language::PreferredLanguage;
    use crate::domain::points::Points;
    use crate::domain::ports::{
        MockDeliveryChannel, MockResetThrottleRepository, MockUserRepository,
        ResetThrottleRepository, ResetThrottleRepositoryError, ResetThrottleState,
    };
    use crate::domain::user::EmailAddress;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use mockable::MockClock;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Store-backed double with real memory, for concurrency behaviour.
    #[derive(Default)]
    struct InMemoryThrottleStore {
        states: Mutex<HashMap<Uuid, ResetThrottleState>>,
    }

    #[async_trait]
    impl ResetThrottleRepository for InMemoryThrottleStore {
        async fn load(
            &self,
            subject: &UserId,
        ) -> Result<ResetThrottleState, ResetThrottleRepositoryError> {
            Ok(self
                .states
                .lock()
                .expect("store mutex")
                .get(subject.as_uuid())
                .copied()
                .unwrap_or_default())
        }

        async fn store(
            &self,
            subject: &UserId,
            state: ResetThrottleState,
        ) -> Result<(), ResetThrottleRepositoryError> {
            self.states
                .lock()
                .expect("store mutex")
                .insert(*subject.as_uuid(), state);
            Ok(())
        }
    }

    fn fixed_clock(at: DateTime<Utc>) -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock.expect_utc().returning(move || at);
        Arc::new(clock)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single().expect("valid instant")
    }

    #[tokio::test]
    async fn rapid_double_consume_allows_exactly_one() {
        let store = Arc::new(InMemoryThrottleStore::default());
        let limiter = Arc::new(ResetRateLimiter::new(store, fixed_clock(t0())));
        let subject = UserId::random();

        let first = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.try_consume(&subject).await })
        };
        let second = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.try_consume(&subject).await })
        };

        let outcomes = [
            first.await.expect("task").expect("no store fault"),
            second.await.expect("task").expect("no store fault"),
        ];
        let allowed = outcomes
            .iter()
            .filter(|o| matches!(o, ResetDecision::Allowed))
            .count();
        assert_eq!(allowed, 1, "exactly one caller wins: {outcomes:?}");
    }

    #[tokio::test]
    async fn denied_carries_remaining_wait() {
        let store = Arc::new(InMemoryThrottleStore::default());
        let mut clock = MockClock::new();
        let mut calls = 0_u32;
        clock.expect_utc().returning(move || {
            calls += 1;
            if calls == 1 {
                t0()
            } else {
                t0() + Duration::hours(1)
            }
        });
        let limiter = ResetRateLimiter::new(store, Arc::new(clock));
        let subject = UserId::random();

        assert_eq!(
            limiter.try_consume(&subject).await.expect("store ok"),
            ResetDecision::Allowed
        );
        let denied = limiter.try_consume(&subject).await.expect("store ok");
        let ResetDecision::Denied { retry_after } = denied else {
            panic!("expected denial, got {denied:?}");
        };
        assert_eq!(retry_after, StdDuration::from_secs(23 * 3600));
    }

    #[tokio::test]
    async fn allowance_rearms_after_the_period() {
        let store = Arc::new(InMemoryThrottleStore::default());
        let mut clock = MockClock::new();
        let mut calls = 0_u32;
        clock.expect_utc().returning(move || {
            calls += 1;
            if calls == 1 {
                t0()
            } else {
                t0() + Duration::hours(RESET_PERIOD_HOURS)
            }
        });
        let limiter = ResetRateLimiter::new(store, Arc::new(clock));
        let subject = UserId::random();

        assert_eq!(
            limiter.try_consume(&subject).await.expect("store ok"),
            ResetDecision::Allowed
        );
        assert_eq!(
            limiter.try_consume(&subject).await.expect("store ok"),
            ResetDecision::Allowed,
            "a fresh period grants a fresh allowance"
        );
    }

    #[tokio::test]
    async fn store_failure_blocks_instead_of_allowing() {
        let mut repo = MockResetThrottleRepository::new();
        repo.expect_load()
            .returning(|_| Err(ResetThrottleRepositoryError::connection("socket closed")));
        let limiter = ResetRateLimiter::new(Arc::new(repo), fixed_clock(t0()));

        let err = limiter
            .try_consume(&UserId::random())
            .await
            .expect_err("store fault must surface");
        assert!(err.message.contains("socket closed"));
    }

    fn account(email: &str) -> User {
        User::new(
            UserId::random(),
            EmailAddress::new(email).expect("valid email"),
            None,
            PreferredLanguage::default(),
            Points::new(0),
        )
    }

    fn service_with(users: MockUserRepository, delivery: MockDeliveryChannel) -> PasswordResetService {
        let limiter = ResetRateLimiter::new(
            Arc::new(InMemoryThrottleStore::default()),
            fixed_clock(t0()),
        );
        PasswordResetService::new(Arc::new(users), limiter, Arc::new(delivery))
    }

    #[tokio::test]
    async fn request_resolves_generates_and_delivers() {
        let user = account("ada@example.org");
        let user_id = user.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        let mut delivery = MockDeliveryChannel::new();
        delivery
            .expect_deliver_password()
            .withf(move |recipient, _| *recipient == user_id)
            .times(1)
            .return_const(());

        let service = service_with(users, delivery);
        let contact =
            ContactIdentifier::Email(EmailAddress::new("ada@example.org").expect("email"));
        let password = service.request(&contact).await.expect("reset granted");

        let secret = password.reveal();
        assert_eq!(secret.len(), GENERATED_PASSWORD_LENGTH);
        assert!(secret.chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[tokio::test]
    async fn request_for_unknown_contact_fails_without_generation() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        let mut delivery = MockDeliveryChannel::new();
        delivery.expect_deliver_password().times(0);

        let service = service_with(users, delivery);
        let contact =
            ContactIdentifier::Email(EmailAddress::new("ghost@example.org").expect("email"));
        let err = service.request(&contact).await.expect_err("unknown user");
        assert_eq!(err, ResetRequestError::UserNotFound);
    }

    #[test]
    fn generated_passwords_follow_the_letter_rules() {
        for _ in 0..32 {
            let password = GeneratedPassword::generate();
            let secret = password.reveal();
            assert_eq!(secret.len(), GENERATED_PASSWORD_LENGTH);
            assert!(secret.chars().all(|c| c.is_ascii_alphabetic()));
            let mut chars = secret.chars();
            assert!(chars.next().is_some_and(|c| c.is_ascii_uppercase()));
            assert!(chars.next().is_some_and(|c| c.is_ascii_lowercase()));
        }
    }
}
